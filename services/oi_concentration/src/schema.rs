//! Persisted data model for `docs/futures_data.json`

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ExtractError;
use crate::text::value::coerce_int;

/// A configured ticker to report on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub ticker: String,
    #[serde(alias = "display_name")]
    pub name: String,
}

impl Target {
    pub fn new(ticker: &str, name: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            name: name.to_string(),
        }
    }
}

/// Parsed numeric tuple of the "all contracts" row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateRow {
    pub buy_top5: i64,
    pub sell_top5: i64,
    pub buy_top10: i64,
    pub sell_top10: i64,
    pub open_interest: i64,
}

/// One side-by-side band (top 5 or top 10 traders)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    #[serde(deserialize_with = "lenient_int")]
    pub buy: i64,
    #[serde(deserialize_with = "lenient_int")]
    pub sell: i64,
    #[serde(deserialize_with = "lenient_int")]
    pub net: i64,
}

impl Band {
    pub fn new(buy: i64, sell: i64) -> Self {
        Self {
            buy,
            sell,
            net: buy - sell,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedData {
    pub top5: Band,
    pub top10: Band,
    #[serde(deserialize_with = "lenient_int")]
    pub oi: i64,
}

/// Either populated figures or the reason they are missing, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotData {
    Normalized(NormalizedData),
    Error { error: String },
}

impl SnapshotData {
    pub fn error(reason: impl Into<String>) -> Self {
        SnapshotData::Error {
            error: reason.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SnapshotData::Error { .. })
    }

    pub fn normalized(&self) -> Option<&NormalizedData> {
        match self {
            SnapshotData::Normalized(data) => Some(data),
            SnapshotData::Error { .. } => None,
        }
    }
}

impl From<ExtractError> for SnapshotData {
    fn from(err: ExtractError) -> Self {
        SnapshotData::error(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractSnapshot {
    pub name: String,
    #[serde(rename = "stock", alias = "ticker")]
    pub ticker: String,
    #[serde(default)]
    pub code: Option<String>,
    pub data: SnapshotData,
}

impl ContractSnapshot {
    pub fn new(target: &Target, code: Option<String>, data: SnapshotData) -> Self {
        Self {
            name: target.name.clone(),
            ticker: target.ticker.clone(),
            code,
            data,
        }
    }
}

/// One day's snapshot; also the shape of every history entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyDocument {
    pub date: String,
    pub items: Vec<ContractSnapshot>,
}

pub type HistoryEntry = DailyDocument;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    pub date: String,
    pub items: Vec<ContractSnapshot>,
    pub history: Vec<HistoryEntry>,
}

// Older documents stored some counts as strings such as "100,000".
fn lenient_int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| serde::de::Error::custom(format!("not an integer: {}", n))),
        serde_json::Value::String(s) => Ok(coerce_int(&s)),
        other => Err(serde::de::Error::custom(format!(
            "expected integer or string, got {}",
            other
        ))),
    }
}
