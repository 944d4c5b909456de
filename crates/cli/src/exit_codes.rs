//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                                 |
//! |---------|------------------|---------------------------------------------|
//! | 0       | Universal        | Success                                     |
//! | 1       | Universal        | General error (unspecified)                 |
//! | 2       | Universal        | CLI usage error (bad args, bad settings)    |
//! | 3       | Universal        | I/O error (unreadable input, unwritable out)|
//! | 10-19   | normalize        | Input could not be turned into records      |
//! | 50-59   | fetch            | Remote transfer download                    |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use slipgen_engine::NormalizeError;
use slipgen_io::IoError;

// =============================================================================
// Universal (0-3)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, invalid settings values.
pub const EXIT_USAGE: u8 = 2;

/// I/O error - cannot read input or write output.
pub const EXIT_IO: u8 = 3;

// =============================================================================
// Normalize (10-19)
// =============================================================================

/// Input was empty (no bytes, `null`, `{}`, `[]`, blank string).
pub const EXIT_EMPTY_INPUT: u8 = 10;

/// Input matched none of the accepted formats.
pub const EXIT_UNKNOWN_FORMAT: u8 = 11;

/// Input was recognized but structurally broken (e.g. Cultivera without
/// `data.manifest`), or was not parseable JSON.
pub const EXIT_INVALID_FORMAT: u8 = 12;

/// CSV lacks a product name or barcode column.
pub const EXIT_MISSING_COLUMNS: u8 = 13;

/// CSV still has colliding column names after renaming.
pub const EXIT_DUPLICATE_COLUMNS: u8 = 14;

/// Normalization succeeded but produced zero records.
pub const EXIT_NO_RECORDS: u8 = 15;

// =============================================================================
// Fetch (50-59): remote transfer download
// =============================================================================

/// `--token` given but blank. A missing token is allowed; requests go
/// out unauthenticated.
pub const EXIT_FETCH_EMPTY_TOKEN: u8 = 50;

/// Auth rejected by upstream (401/403).
pub const EXIT_FETCH_AUTH: u8 = 51;

/// Bad request rejected by upstream (400).
pub const EXIT_FETCH_VALIDATION: u8 = 52;

/// Rate limited after retries (429).
pub const EXIT_FETCH_RATE_LIMIT: u8 = 53;

/// Upstream error (5xx), non-JSON body or network failure after retries.
pub const EXIT_FETCH_UPSTREAM: u8 = 54;

// =============================================================================
// Error mapping
// =============================================================================

/// Map a normalization error to its exit code.
pub fn normalize_exit_code(err: &NormalizeError) -> u8 {
    match err {
        NormalizeError::EmptyInput => EXIT_EMPTY_INPUT,
        NormalizeError::UnknownFormat { .. } => EXIT_UNKNOWN_FORMAT,
        NormalizeError::InvalidFormat { .. } => EXIT_INVALID_FORMAT,
        NormalizeError::MissingColumns(_) => EXIT_MISSING_COLUMNS,
        NormalizeError::DuplicateColumns(_) => EXIT_DUPLICATE_COLUMNS,
    }
}

/// Map an input/output error to its exit code.
pub fn io_exit_code(err: &IoError) -> u8 {
    match err {
        IoError::Io(_) | IoError::Json(_) => EXIT_IO,
        IoError::Csv(_) | IoError::InvalidJson { .. } => EXIT_INVALID_FORMAT,
        IoError::Normalize(e) => normalize_exit_code(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slipgen_engine::SourceSystem;

    #[test]
    fn test_normalize_codes_in_range() {
        let errors = [
            NormalizeError::EmptyInput,
            NormalizeError::UnknownFormat { reason: "x".into() },
            NormalizeError::InvalidFormat { format: SourceSystem::Cultivera, message: "x".into() },
            NormalizeError::MissingColumns(vec!["Barcode".into()]),
            NormalizeError::DuplicateColumns(vec!["Vendor".into()]),
        ];
        let codes: Vec<u8> = errors.iter().map(normalize_exit_code).collect();
        assert!(codes.iter().all(|c| (10..20).contains(c)));
        let mut unique = codes.clone();
        unique.dedup();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn test_io_wraps_normalize() {
        let err = IoError::Normalize(NormalizeError::EmptyInput);
        assert_eq!(io_exit_code(&err), EXIT_EMPTY_INPUT);
        let err = IoError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(io_exit_code(&err), EXIT_IO);
    }
}
