//! Builds the pair pool for a new matching session.

use std::collections::HashSet;

use chrono::{DateTime, TimeZone};
use matchdeck_core::media::strip_sound_tags;
use matchdeck_core::types::NoteType;
use matchdeck_core::{select_cards, MatchPair, Selection, SelectionMode};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::db::date_utils::study_day;
use crate::db::{
    CardRepository, MatchSource, NoteRepository, ReviewRepository, SettingsRepository,
    SqliteRepository,
};
use crate::error::{ApiError, Result};

/// Which deck, note type and fields feed the session.
#[derive(Debug, Clone)]
pub struct PoolRequest {
    pub deck_path: String,
    pub note_type_id: i64,
    pub vocab_field: String,
    pub meaning_field: String,
    pub audio_field: Option<String>,
    pub mode: SelectionMode,
}

/// Pairs for the session and the selection they came from.
#[derive(Debug, Clone)]
pub struct Pool {
    pub pairs: Vec<MatchPair>,
    pub selection: Selection,
}

/// Field positions resolved against the chosen note type.
struct FieldMap<'a> {
    note_type: &'a NoteType,
    vocab: &'a str,
    meaning: &'a str,
    audio: Option<&'a str>,
}

impl<'a> FieldMap<'a> {
    fn resolve(note_type: &'a NoteType, request: &'a PoolRequest) -> Result<Self> {
        let check = |name: &str| {
            note_type.field_index(name).map(|_| ()).ok_or_else(|| {
                ApiError::BadRequest(format!(
                    "note type '{}' has no field '{}'",
                    note_type.name, name
                ))
            })
        };

        check(&request.vocab_field)?;
        check(&request.meaning_field)?;
        if let Some(audio) = &request.audio_field {
            check(audio)?;
        }

        Ok(Self {
            note_type,
            vocab: &request.vocab_field,
            meaning: &request.meaning_field,
            audio: request.audio_field.as_deref(),
        })
    }

    /// Pair for a card, or `None` when its note can't form one.
    fn pair(&self, source: &MatchSource) -> Option<MatchPair> {
        let note = &source.note;
        if note.note_type_id != self.note_type.id {
            return None;
        }

        let raw_vocab = note.field(self.vocab)?;
        let vocab = strip_sound_tags(raw_vocab);
        let meaning = strip_sound_tags(note.field(self.meaning)?);
        if vocab.is_empty() || meaning.is_empty() {
            return None;
        }

        // Without an audio field, sound tags in the vocab field still play.
        let audio = match self.audio {
            Some(field) => note.field(field).unwrap_or_default(),
            None => raw_vocab,
        };

        Some(MatchPair {
            vocab,
            meaning,
            audio: audio.to_string(),
            card_id: source.card.id,
        })
    }
}

/// Select cards from the deck and turn them into shuffled pairs.
///
/// Daily-limit pools keep queue order (learn, review, new). Cards of other
/// note types or with an empty vocab or meaning are skipped, and each note
/// contributes at most one pair.
pub fn build_pool<Tz: TimeZone, R: Rng + ?Sized>(
    repo: &SqliteRepository,
    request: &PoolRequest,
    now: &DateTime<Tz>,
    rng: &mut R,
) -> Result<Pool> {
    let note_type = repo.get_note_type(request.note_type_id)?.ok_or_else(|| {
        ApiError::NotFound(format!("note type {}", request.note_type_id))
    })?;
    let fields = FieldMap::resolve(&note_type, request)?;

    let settings = repo.get_effective_settings(Some(&request.deck_path))?;
    let day = study_day(now, settings.daily_reset_hour);
    let counts = repo.get_daily_counts(&day)?;
    let candidates = repo.get_candidate_cards(&request.deck_path)?;

    let selection = select_cards(request.mode, &candidates, &settings, counts, day);
    let sources = repo.get_match_sources(&selection.card_ids)?;

    let mut seen_notes = HashSet::new();
    let mut pairs: Vec<MatchPair> = sources
        .iter()
        .filter(|source| seen_notes.insert(source.note.id))
        .filter_map(|source| fields.pair(source))
        .collect();

    if request.mode != SelectionMode::DailyLimit {
        pairs.shuffle(rng);
    }

    tracing::debug!(
        deck = %request.deck_path,
        mode = ?request.mode,
        selected = selection.card_ids.len(),
        pairs = pairs.len(),
        "built match pool"
    );

    Ok(Pool { pairs, selection })
}
