//! Core types for the matchdeck collection and game.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Card learning status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    #[default]
    New,
    Learning,
    Review,
    Relearning,
}

impl CardStatus {
    /// Storage name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Learning => "learning",
            Self::Review => "review",
            Self::Relearning => "relearning",
        }
    }

    /// Parse from storage name. Unknown values read as `New`.
    pub fn parse(s: &str) -> Self {
        match s {
            "learning" => Self::Learning,
            "review" => Self::Review,
            "relearning" => Self::Relearning,
            _ => Self::New,
        }
    }

    /// Whether the card sits in the intraday learning queue.
    pub fn is_learning(self) -> bool {
        matches!(self, Self::Learning | Self::Relearning)
    }
}

/// Rating for a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl Rating {
    /// Convert to 4-point numeric value (1-4).
    pub fn to_value(self) -> u8 {
        match self {
            Self::Again => 1,
            Self::Hard => 2,
            Self::Good => 3,
            Self::Easy => 4,
        }
    }

    /// Map a host ease button to a rating.
    ///
    /// Anything outside 1-3 is treated as Easy.
    pub fn from_ease(ease: u8) -> Self {
        match ease {
            1 => Self::Again,
            2 => Self::Hard,
            3 => Self::Good,
            _ => Self::Easy,
        }
    }
}

/// Card scheduling state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardState {
    pub status: CardStatus,
    pub interval_days: f64,
    pub ease_factor: f64,
    pub lapses: u32,
    pub reviews_count: u32,
    /// Index into the learning steps while learning or relearning.
    pub learning_step: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Utc>>,
}

impl Default for CardState {
    fn default() -> Self {
        Self {
            status: CardStatus::New,
            interval_days: 0.0,
            ease_factor: 2.5,
            lapses: 0,
            reviews_count: 0,
            learning_step: 0,
            due: None,
        }
    }
}

/// Note type: an ordered list of field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteType {
    pub id: i64,
    pub name: String,
    pub fields: Vec<String>,
}

impl NoteType {
    /// Position of a field, if the note type has it.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }
}

/// Note parsed from an import file (may not have an ID yet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawNote {
    pub id: Option<i64>,
    /// Field values in note type order. Missing fields are empty.
    pub fields: Vec<String>,
    pub line_number: usize,
}

/// Note stored in the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub note_type_id: i64,
    pub deck_path: String,
    pub fields: Vec<(String, String)>,
}

impl Note {
    /// Value of a field by name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Card generated from a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: i64,
    pub note_id: i64,
    pub deck_path: String,
    /// Order in which new cards are introduced.
    pub position: i64,
}

/// Deck with card counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deck {
    pub path: String,
    pub name: String,
    pub card_count: usize,
    pub new_count: usize,
    pub learning_count: usize,
    pub due_count: usize,
}

impl Deck {
    /// Display name: the last segment of a `/`-separated deck path.
    pub fn name_from_path(path: &str) -> String {
        path.rsplit('/').next().unwrap_or(path).to_string()
    }

    /// Canonical form of a deck path: segments trimmed, empty segments and
    /// leading or trailing `/` removed. `"/Spanish//Verbs/"` becomes
    /// `"Spanish/Verbs"`.
    pub fn normalize_path(path: &str) -> String {
        path.split('/')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Which cards of a deck populate a matching session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Every card in the deck.
    #[default]
    All,
    /// Learning and review cards that are due today.
    Due,
    /// Learn, review and new queues capped by today's limits.
    DailyLimit,
}

/// How the session clocks behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimekeepingMode {
    /// Count-up per page and for the whole session.
    #[default]
    Informational,
    /// Countdown on every page, count-up for the session.
    CountdownPerPage,
    /// One countdown for the session, count-up per page.
    CountdownForAllCards,
}

impl TimekeepingMode {
    pub fn is_countdown(self) -> bool {
        !matches!(self, Self::Informational)
    }
}

/// Global settings configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalSettings {
    pub new_cards_per_day: u32,
    pub reviews_per_day: u32,
    pub daily_reset_hour: u32,
    /// Learning steps in minutes.
    pub learning_steps: Vec<u32>,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            new_cards_per_day: 20,
            reviews_per_day: 200,
            daily_reset_hour: 0,
            learning_steps: vec![1, 10],
        }
    }
}

/// Per-deck settings (all fields optional for overrides).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckSettings {
    pub deck_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_cards_per_day: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews_per_day: Option<u32>,
}

impl DeckSettings {
    /// Create new deck settings with only the path set.
    pub fn new(deck_path: String) -> Self {
        Self {
            deck_path,
            new_cards_per_day: None,
            reviews_per_day: None,
        }
    }
}

/// Effective settings (global merged with deck overrides).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveSettings {
    pub new_cards_per_day: u32,
    pub reviews_per_day: u32,
    pub daily_reset_hour: u32,
    pub learning_steps: Vec<u32>,
}

impl EffectiveSettings {
    /// Merge global settings with optional deck settings.
    pub fn merge(global: &GlobalSettings, deck: Option<&DeckSettings>) -> Self {
        Self {
            new_cards_per_day: deck
                .and_then(|d| d.new_cards_per_day)
                .unwrap_or(global.new_cards_per_day),
            reviews_per_day: deck
                .and_then(|d| d.reviews_per_day)
                .unwrap_or(global.reviews_per_day),
            daily_reset_hour: global.daily_reset_hour,
            learning_steps: global.learning_steps.clone(),
        }
    }
}
