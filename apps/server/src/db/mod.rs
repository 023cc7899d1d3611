//! SQLite collection storage.

pub mod date_utils;
pub mod error;
pub mod repository;
pub mod schema;

pub use error::DbError;
pub use repository::{
    CardRepository, DeckRepository, ImportSummary, MatchSource, NoteRepository,
    ReviewLogEntry, ReviewRepository, SettingsRepository, SqliteRepository, StateRepository,
};
