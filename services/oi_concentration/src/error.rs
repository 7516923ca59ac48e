use thiserror::Error;

/// Why one target could not be turned into figures.
///
/// The `Display` text is what ends up in the `{"error": ...}` slot of the
/// persisted document, so it is written for a human reading the JSON.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("no contract code found for ticker {ticker} (no listed single-stock future)")]
    CodeMissing { ticker: String },

    #[error("report fetch failed: {0}")]
    Fetch(String),

    #[error("empty response from exchange")]
    EmptyResponse,

    #[error("exchange has no data for this contract yet")]
    NoData,

    #[error("aggregate row \"{label}\" not found (page layout changed or no data today)")]
    LabelNotFound { label: String },

    #[error("aggregate row has too few columns (len={count}): {cells:?}")]
    TooFewColumns { count: usize, cells: Vec<String> },
}

impl ExtractError {
    pub fn fetch(err: impl std::fmt::Display) -> Self {
        ExtractError::Fetch(err.to_string())
    }
}
