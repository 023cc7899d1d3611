//! Spaced repetition scheduling used when a match is written back.

pub mod sm2;

pub use sm2::Sm2;

use crate::types::{CardState, Rating};
use chrono::{DateTime, Utc};

/// Result of scheduling a card after review.
#[derive(Debug, Clone)]
pub struct SchedulingResult {
    pub new_state: CardState,
    pub next_due: DateTime<Utc>,
}

/// Trait for spaced repetition schedulers.
pub trait Scheduler: Send + Sync {
    /// Scheduler identifier, stored with every review log entry.
    fn name(&self) -> &'static str;

    /// Calculate next state after a review.
    fn schedule(&self, state: &CardState, rating: Rating, now: DateTime<Utc>) -> SchedulingResult;

    /// Initial state for a new card.
    fn initial_state(&self) -> CardState;
}
