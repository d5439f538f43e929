//! Error types for report extraction.

use thiserror::Error;

/// Result type alias using [`ExtractError`].
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Fatal failures of the extraction pipeline.
///
/// Numeric fields that do not parse are not errors; they normalize to zero.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// Fewer than header + open + close rows survived decoding.
    #[error("insufficient data: expected at least 3 rows, decoded {rows}")]
    InsufficientData { rows: usize },

    /// A kept line could not be decoded as a 9-field record.
    #[error("malformed input at line {line}: {reason}")]
    MalformedInput { line: u64, reason: String },

    /// The assembler needs exactly one opening and one closing row.
    #[error("shape error: expected 2 snapshot rows, got {rows}")]
    Shape { rows: usize },

    /// The business date is not an 8-digit `YYYYMMDD` calendar date.
    #[error("invalid business date {value:?}, expected YYYYMMDD")]
    InvalidBusinessDate { value: String },
}

impl ExtractError {
    /// Create a malformed input error.
    pub fn malformed(line: u64, reason: impl Into<String>) -> Self {
        ExtractError::MalformedInput {
            line,
            reason: reason.into(),
        }
    }

    /// Create an invalid business date error.
    pub fn invalid_date(value: impl Into<String>) -> Self {
        ExtractError::InvalidBusinessDate {
            value: value.into(),
        }
    }
}
