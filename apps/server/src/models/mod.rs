//! API request and response types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

// Re-export shared types from matchdeck-core
pub use matchdeck_core::types::{
    CardState, Deck, DeckSettings, GlobalSettings, NoteType, SelectionMode,
};
pub use matchdeck_core::{MatchConfig, PageChange, SelectOutcome, SessionView, TickEvent};

pub use crate::db::ImportSummary;

// === Collection ===

#[derive(Debug, Serialize)]
pub struct DeckListResponse {
    pub decks: Vec<Deck>,
}

#[derive(Debug, Serialize)]
pub struct NoteTypeListResponse {
    pub note_types: Vec<NoteType>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateNoteTypeRequest {
    pub name: String,
    pub fields: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct NoteTypeFieldsResponse {
    pub id: i64,
    pub name: String,
    pub fields: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportRequest {
    pub note_type_id: i64,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub deck_path: String,
    pub imported: usize,
    #[serde(flatten)]
    pub summary: ImportSummary,
}

#[derive(Debug, Serialize)]
pub struct CardStateResponse {
    pub card_id: i64,
    pub state: CardState,
}

// === Settings ===

#[derive(Debug, Serialize)]
pub struct AllSettingsResponse {
    pub global: GlobalSettings,
    pub decks: HashMap<String, DeckSettings>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateGlobalSettingsRequest {
    pub new_cards_per_day: Option<u32>,
    pub reviews_per_day: Option<u32>,
    pub daily_reset_hour: Option<u32>,
    pub learning_steps: Option<Vec<u32>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateDeckSettingsRequest {
    pub new_cards_per_day: Option<u32>,
    pub reviews_per_day: Option<u32>,
}

// === Matching sessions ===

#[derive(Debug, Serialize, Deserialize)]
pub struct StartMatchRequest {
    pub deck_path: String,
    pub note_type_id: i64,
    pub vocab_field: String,
    pub meaning_field: String,
    #[serde(default)]
    pub audio_field: Option<String>,
    #[serde(default)]
    pub mode: SelectionMode,
    #[serde(flatten)]
    pub config: MatchConfig,
}

/// Where the session's cards came from.
#[derive(Debug, Serialize)]
pub struct SelectionSummary {
    pub mode: SelectionMode,
    pub learn: usize,
    pub review: usize,
    pub new: usize,
    pub pairs: usize,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub id: Uuid,
    pub deck_path: String,
    pub selection: SelectionSummary,
    #[serde(flatten)]
    pub view: SessionView,
    /// Expiries that happened since the last request.
    pub events: Vec<TickEvent>,
    pub update_stats: bool,
    pub graded: u32,
    pub write_back_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SelectResponse {
    pub result: SelectOutcome,
    pub session: MatchResponse,
}

#[derive(Debug, Serialize)]
pub struct NextPageResponse {
    pub change: PageChange,
    pub session: MatchResponse,
}
