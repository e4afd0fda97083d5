//! Error types for statement tokenization.
//!
//! Lineage extraction itself is deliberately infallible: malformed token
//! structure results in under-extraction (a record with a missing target or
//! missing sources), never an error. The only fallible step in this crate is
//! turning raw statement text into tokens, which surfaces lexer failures
//! from `sqlparser`.

use thiserror::Error;

/// Error raised when statement text cannot be tokenized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("tokenize error at line {line}, column {column}: {message}")]
pub struct TokenizeError {
    /// Human-readable lexer message.
    pub message: String,
    /// Line number (1-indexed).
    pub line: u64,
    /// Column number (1-indexed).
    pub column: u64,
}

impl From<sqlparser::tokenizer::TokenizerError> for TokenizeError {
    fn from(err: sqlparser::tokenizer::TokenizerError) -> Self {
        Self {
            message: err.message,
            line: err.location.line,
            column: err.location.column,
        }
    }
}
