use thiserror::Error;

/// Failure of a single external-service call.
///
/// None of these reach the caller of the enrichment pipeline; each stage
/// folds them into its own placeholder value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StageError {
    #[error("upstream returned status {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for StageError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StageError::Timeout
        } else if err.is_decode() {
            StageError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            StageError::Status(status.as_u16())
        } else {
            StageError::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("trip ends on {end} before it starts on {start}")]
pub struct DateRangeError {
    pub start: chrono::NaiveDate,
    pub end: chrono::NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TripError {
    #[error("trip {0} does not exist")]
    NotFound(u64),
}
