//! Error types for matchdeck-core.

use thiserror::Error;

/// Result type alias using ParseError.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors that can occur while importing notes from text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("text before the first field at line {line}")]
    OrphanText { line: usize },

    #[error("note at line {line} has no fields")]
    EmptyNote { line: usize },

    #[error("invalid ID format at line {line}: {value}")]
    InvalidId { line: usize, value: String },

    #[error("duplicate ID {id} at line {line}")]
    DuplicateId { id: i64, line: usize },

    #[error("note type has no fields")]
    NoFields,
}

/// Errors raised by the matching session engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no valid vocabulary/meaning pairs found")]
    EmptyPool,

    #[error("page size must be between {min} and {max}, got {value}")]
    InvalidPageSize { value: usize, min: usize, max: usize },

    #[error("column count must be at least 1")]
    InvalidColumns,

    #[error("time limit must be between 1 and {max} seconds for countdown modes, got {value}")]
    InvalidTimeLimit { value: u32, max: u32 },

    #[error("tile {0} does not exist on this page")]
    UnknownTile(usize),

    #[error("the session is finished")]
    Finished,

    #[error("time is up for all cards")]
    TimeUp,
}
