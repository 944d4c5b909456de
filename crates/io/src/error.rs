use slipgen_engine::NormalizeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON that failed to parse. `snippet` is the input around the error.
    #[error("invalid JSON at line {line}, column {column}: {message} (near `{snippet}`)")]
    InvalidJson {
        line: usize,
        column: usize,
        message: String,
        snippet: String,
    },

    #[error("cannot write JSON: {0}")]
    Json(#[source] serde_json::Error),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

impl IoError {
    pub fn is_empty_input(&self) -> bool {
        matches!(self, Self::Normalize(NormalizeError::EmptyInput))
    }
}
