use thiserror::Error;

/// Failures surfaced by the analysis pipeline.
///
/// Client mistakes map to HTTP 400, `Internal` maps to HTTP 500.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AnalysisError {
    #[error("invalid target letter: {letter:?}")]
    InvalidLetter {
        letter: Option<String>,
        supported: Vec<String>,
    },

    #[error("image data is required")]
    MissingPayload,

    #[error("image data could not be decoded: {0}")]
    InvalidPayload(String),

    #[error("analysis failed: {0}")]
    Internal(String),
}

impl AnalysisError {
    pub fn is_client_error(&self) -> bool {
        !matches!(self, AnalysisError::Internal(_))
    }
}

/// Problems loading the embedded letter data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("letter data file not found: {0}")]
    Missing(String),

    #[error("letter data file {0} is not valid utf-8")]
    Encoding(String),

    #[error("unable to deserialize {file}: {source}")]
    Malformed {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("inconsistent letter data: {0}")]
    Inconsistent(String),
}
