//! API route handlers

pub mod cards;
pub mod decks;
pub mod matches;
pub mod note_types;
pub mod notes;
pub mod settings;

use matchdeck_core::Deck;

use crate::error::{ApiError, Result};

/// Deck path from a request in canonical form. Empty paths are rejected.
pub(crate) fn deck_path(raw: &str) -> Result<String> {
    let path = Deck::normalize_path(raw);
    if path.is_empty() {
        return Err(ApiError::BadRequest("deck path is empty".into()));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deck_path_is_normalized() {
        assert_eq!(deck_path("/spanish/verbs/").unwrap(), "spanish/verbs");
        assert!(matches!(deck_path(" / "), Err(ApiError::BadRequest(_))));
    }
}
