//! Rolling history kept inside the persisted document

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::schema::{DailyDocument, HistoryEntry, PersistedState};

/// Newest-first entries kept in `history`.
pub const MAX_HISTORY: usize = 7;

pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Prior history, empty when the file is absent or unreadable.
    /// Entries that no longer deserialize are dropped one by one.
    pub fn load(&self) -> Vec<HistoryEntry> {
        if !self.path.exists() {
            return Vec::new();
        }

        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read {:?}, starting with empty history: {}", self.path, e);
                return Vec::new();
            }
        };

        let value: serde_json::Value = match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(e) => {
                warn!("Malformed JSON in {:?}, starting with empty history: {}", self.path, e);
                return Vec::new();
            }
        };

        let Some(entries) = value.get("history").and_then(|h| h.as_array()) else {
            return Vec::new();
        };

        entries
            .iter()
            .enumerate()
            .filter_map(|(i, entry)| {
                match serde_json::from_value::<HistoryEntry>(entry.clone()) {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        warn!("Skipping malformed history entry {}: {}", i, e);
                        None
                    }
                }
            })
            .collect()
    }

    /// Writes to a sibling temp file, then renames over the target.
    pub fn save(&self, state: &PersistedState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {:?}", parent))?;
            }
        }

        let json = serde_json::to_string_pretty(state)
            .context("Failed to serialize persisted state")?;

        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = std::fs::File::create(&tmp)
                .with_context(|| format!("Failed to create {:?}", tmp))?;
            file.write_all(json.as_bytes())
                .with_context(|| format!("Failed to write {:?}", tmp))?;
            file.sync_all().ok();
        }
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to move {:?} into place", tmp))?;

        info!(
            "Wrote {:?} date={} items={} history={}",
            self.path,
            state.date,
            state.items.len(),
            state.history.len()
        );
        Ok(())
    }
}

/// Fold `today` into `prior`: drop any entry with the same date, put today
/// first, keep at most [`MAX_HISTORY`].
pub fn merge(prior: Vec<HistoryEntry>, today: DailyDocument) -> PersistedState {
    let mut history: Vec<HistoryEntry> = prior
        .into_iter()
        .filter(|entry| entry.date != today.date)
        .collect();
    history.insert(0, today.clone());
    history.truncate(MAX_HISTORY);

    PersistedState {
        date: today.date,
        items: today.items,
        history,
    }
}
