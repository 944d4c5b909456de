use thiserror::Error;

use crate::model::SourceSystem;

/// Fatal detection / mapping failures.
///
/// Every variant is reported to the caller as a value; none of them
/// panic or get swallowed inside the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// No top-level data at all (null, `{}`, `[]`, blank text, empty table).
    #[error("no data provided")]
    EmptyInput,

    /// No detection clause matched.
    #[error("unknown format: {reason}. Accepted formats: {}", SourceSystem::accepted_list())]
    UnknownFormat { reason: String },

    /// A clause matched but required nested structure is missing.
    #[error("invalid {format} data: {message}")]
    InvalidFormat { format: SourceSystem, message: String },

    /// CSV lacks a column resolving to a required canonical field.
    #[error("CSV is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// CSV header names still collide after suffixing.
    #[error("duplicate columns found: {}", .0.join(", "))]
    DuplicateColumns(Vec<String>),
}

impl NormalizeError {
    /// Source format the failure belongs to, when one was identified.
    pub fn format(&self) -> Option<SourceSystem> {
        match self {
            Self::InvalidFormat { format, .. } => Some(*format),
            Self::MissingColumns(_) | Self::DuplicateColumns(_) => Some(SourceSystem::Csv),
            Self::EmptyInput | Self::UnknownFormat { .. } => None,
        }
    }

    /// Stable machine-readable tag for the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyInput => "empty_input",
            Self::UnknownFormat { .. } => "unknown_format",
            Self::InvalidFormat { .. } => "invalid_format",
            Self::MissingColumns(_) => "missing_columns",
            Self::DuplicateColumns(_) => "duplicate_columns",
        }
    }

    pub(crate) fn invalid(format: SourceSystem, message: impl Into<String>) -> Self {
        Self::InvalidFormat { format, message: message.into() }
    }
}
