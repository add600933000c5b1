use thiserror::Error;

/// Errors raised while dispatching or fetching pages.
///
/// Missing or malformed fields inside a fetched page are not errors; they
/// surface as [`crate::models::Value::Null`] in the record.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("invalid operation name: '{0}'")]
    InvalidOperation(String),

    #[error("invalid date: '{0}'")]
    InvalidDate(String),

    #[error("invalid stadium code: '{0}' (expected 1-24)")]
    InvalidStadiumCode(String),

    #[error("invalid race number: '{0}' (expected 1-12)")]
    InvalidRaceNumber(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} for {url}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ScraperError {
    /// True for caller mistakes that are rejected before any request is sent.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ScraperError::InvalidOperation(_)
                | ScraperError::InvalidDate(_)
                | ScraperError::InvalidStadiumCode(_)
                | ScraperError::InvalidRaceNumber(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ScraperError>;
