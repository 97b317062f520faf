//! Error types for the ddtx-core library.

use thiserror::Error;

/// Main error type for the ddtx library.
///
/// Only caller-contract violations are surfaced as errors. Everything
/// document-content related (missing fields, malformed addresses,
/// unverifiable totals) degrades to a warning on [`crate::models::document::ParsedDocument`]
/// so that one noisy document never aborts a batch.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The caller passed an empty text blob.
    #[error("input text is empty")]
    EmptyInput,

    /// The caller passed data that is not plain text.
    #[error("input is not plain text: {0}")]
    NotText(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for the ddtx library.
pub type Result<T> = std::result::Result<T, ParseError>;
