//! Core library for the matchdeck matching game.
//!
//! Provides:
//! - Collection types (notes, cards, card state, settings)
//! - SM-2 scheduler used to write match results back to the collection
//! - Card selection policies (all cards, due cards, daily limits)
//! - Plain-text note importer
//! - Timers and the page-based matching session engine

pub mod error;
pub mod import;
pub mod media;
pub mod scheduler;
pub mod selection;
pub mod session;
pub mod timer;
pub mod types;

pub use error::{ParseError, Result, SessionError};
pub use import::parse_notes;
pub use scheduler::{Scheduler, SchedulingResult, Sm2};
pub use selection::{select_cards, CandidateCard, DailyCounts, Selection, StudyDay};
pub use session::{
    MatchConfig, MatchHit, MatchPair, MatchSession, PageChange, PageView, Score, SelectOutcome,
    SessionView, TickEvent, TileKind, TileView,
};
pub use types::{
    Card, CardState, CardStatus, Deck, DeckSettings, EffectiveSettings, GlobalSettings, Note,
    NoteType, Rating, RawNote, SelectionMode, TimekeepingMode,
};
