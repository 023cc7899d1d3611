//! Grade write-back for correct matches.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use matchdeck_core::types::{CardState, Rating};
use matchdeck_core::{Scheduler, Sm2};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::db::{
    CardRepository, DbError, ReviewLogEntry, ReviewRepository, SettingsRepository,
    SqliteRepository, StateRepository,
};
use crate::services::sessions::SessionStore;

/// Schedule a card with SM-2 and store the new state and a review log row.
pub fn grade_card(
    repo: &SqliteRepository,
    card_id: i64,
    rating: Rating,
    now: DateTime<Utc>,
) -> Result<CardState, DbError> {
    let card = repo
        .get_card(card_id)?
        .ok_or(DbError::CardNotFound(card_id))?;
    let settings = repo.get_effective_settings(Some(&card.deck_path))?;
    let before = repo.get_card_state(card_id)?.unwrap_or_default();

    let scheduler = Sm2::with_steps(settings.learning_steps);
    let result = scheduler.schedule(&before, rating, now);

    repo.save_card_state(card_id, &result.new_state)?;
    repo.insert_review(&ReviewLogEntry {
        card_id,
        reviewed_at: now,
        rating: rating.to_value(),
        status_before: before.status,
        interval_before: before.interval_days,
        interval_after: result.new_state.interval_days,
        ease_before: before.ease_factor,
        ease_after: result.new_state.ease_factor,
        scheduler: scheduler.name().to_string(),
    })?;

    Ok(result.new_state)
}

/// Grade a card off the request path and report the outcome to the session.
pub fn spawn_write_back(
    repository: Arc<Mutex<SqliteRepository>>,
    sessions: Arc<SessionStore>,
    session_id: Uuid,
    card_id: i64,
    rating: Rating,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = tokio::task::spawn_blocking(move || {
            let repo = repository
                .lock()
                .map_err(|_| DbError::InvalidData("repository lock poisoned".into()))?;
            grade_card(&repo, card_id, rating, Utc::now())
        })
        .await;

        let outcome = match result {
            Ok(Ok(state)) => {
                tracing::debug!(card_id, status = state.status.as_str(), "graded card");
                Ok(())
            }
            Ok(Err(e)) => {
                tracing::warn!(card_id, error = %e, "failed to grade card");
                Err(format!("could not save the grade for card {card_id}: {e}"))
            }
            Err(e) => {
                tracing::error!(card_id, error = %e, "grade task panicked");
                Err(format!("could not save the grade for card {card_id}"))
            }
        };
        sessions.record_grade(session_id, outcome);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::NoteRepository;
    use chrono::TimeZone;
    use matchdeck_core::types::{CardStatus, RawNote};
    use pretty_assertions::assert_eq;

    fn setup() -> (SqliteRepository, i64) {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let fields = ["Word", "Meaning"].map(String::from);
        let nt = repo.create_note_type("Vocab", &fields).unwrap();
        repo.import_notes(
            "spanish",
            nt.id,
            &[RawNote {
                id: None,
                fields: vec!["gato".into(), "cat".into()],
                line_number: 1,
            }],
        )
        .unwrap();
        let card_id = repo.get_candidate_cards("spanish").unwrap()[0].card_id;
        (repo, card_id)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_hard_grade_on_new_card_starts_learning() {
        let (repo, card_id) = setup();
        let state = grade_card(&repo, card_id, Rating::Hard, now()).unwrap();

        assert_eq!(state.status, CardStatus::Learning);
        assert_eq!(state.reviews_count, 1);
        assert_eq!(repo.get_card_state(card_id).unwrap(), Some(state));

        let day = matchdeck_core::StudyDay::containing(&now(), 0);
        let counts = repo.get_daily_counts(&day).unwrap();
        assert_eq!(counts.new_today, 1);
    }

    #[test]
    fn test_unknown_card_is_an_error() {
        let (repo, _) = setup();
        let result = grade_card(&repo, 999, Rating::Hard, now());
        assert!(matches!(result, Err(DbError::CardNotFound(999))));
    }

    #[tokio::test]
    async fn test_background_write_back_stores_grade() {
        let (repo, card_id) = setup();
        let repository = Arc::new(Mutex::new(repo));
        let sessions = Arc::new(SessionStore::new());

        // Unknown session ids are ignored; the grade is still stored.
        spawn_write_back(
            repository.clone(),
            sessions,
            Uuid::new_v4(),
            card_id,
            Rating::Hard,
        )
        .await
        .unwrap();

        let state = repository
            .lock()
            .unwrap()
            .get_card_state(card_id)
            .unwrap()
            .unwrap();
        assert_eq!(state.reviews_count, 1);
    }

    fn live_session(sessions: &SessionStore, card_id: i64) -> Uuid {
        use crate::services::sessions::SessionEntry;
        use matchdeck_core::{MatchConfig, MatchPair, MatchSession, Selection, SelectionMode};
        use std::time::Instant;

        let pairs = ["uno", "dos", "tres"]
            .iter()
            .map(|word| MatchPair {
                vocab: word.to_string(),
                meaning: format!("{word} meaning"),
                audio: String::new(),
                card_id,
            })
            .collect();
        let engine = MatchSession::with_seed(pairs, MatchConfig::default(), 7).unwrap();
        sessions.insert(SessionEntry::new(
            engine,
            "spanish".into(),
            SelectionMode::All,
            Selection::default(),
            Instant::now(),
        ))
    }

    fn write_back_status(sessions: &SessionStore, id: Uuid) -> (u32, Option<String>) {
        sessions
            .with_session(id, std::time::Instant::now(), |entry, _| {
                (entry.graded, entry.last_error.clone())
            })
            .unwrap()
    }

    #[tokio::test]
    async fn test_write_back_success_is_counted() {
        let (repo, card_id) = setup();
        let sessions = Arc::new(SessionStore::new());
        let id = live_session(&sessions, card_id);

        spawn_write_back(
            Arc::new(Mutex::new(repo)),
            sessions.clone(),
            id,
            card_id,
            Rating::Hard,
        )
        .await
        .unwrap();

        assert_eq!(write_back_status(&sessions, id), (1, None));
    }

    #[tokio::test]
    async fn test_write_back_failure_becomes_session_notice() {
        let (repo, card_id) = setup();
        let sessions = Arc::new(SessionStore::new());
        let id = live_session(&sessions, card_id);

        spawn_write_back(
            Arc::new(Mutex::new(repo)),
            sessions.clone(),
            id,
            999,
            Rating::Hard,
        )
        .await
        .unwrap();

        let (graded, error) = write_back_status(&sessions, id);
        assert_eq!(graded, 0);
        let error = error.unwrap();
        assert!(error.starts_with("could not save the grade for card 999"));
    }
}
