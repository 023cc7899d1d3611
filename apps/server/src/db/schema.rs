//! SQLite schema definitions.

/// Current schema version for migrations.
pub const SCHEMA_VERSION: i32 = 1;

/// Complete schema for the collection database.
pub const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

-- Note types: ordered field names stored as a JSON array
CREATE TABLE IF NOT EXISTS note_types (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    fields TEXT NOT NULL
);

-- Notes: field values stored as a JSON array in note type order
CREATE TABLE IF NOT EXISTS notes (
    id INTEGER PRIMARY KEY,
    note_type_id INTEGER NOT NULL REFERENCES note_types(id),
    deck_path TEXT NOT NULL,
    fields TEXT NOT NULL,
    modified_at TEXT NOT NULL
);

-- One card per note
CREATE TABLE IF NOT EXISTS cards (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    note_id INTEGER NOT NULL UNIQUE REFERENCES notes(id),
    deck_path TEXT NOT NULL,
    position INTEGER NOT NULL
);

-- Card learning state
CREATE TABLE IF NOT EXISTS card_states (
    card_id INTEGER PRIMARY KEY REFERENCES cards(id),
    status TEXT NOT NULL DEFAULT 'new',
    interval_days REAL NOT NULL DEFAULT 0,
    ease_factor REAL NOT NULL DEFAULT 2.5,
    learning_step INTEGER NOT NULL DEFAULT 0,
    due_date TEXT,
    lapses INTEGER NOT NULL DEFAULT 0,
    reviews_count INTEGER NOT NULL DEFAULT 0
);

-- Every grade written to a card
CREATE TABLE IF NOT EXISTS review_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    card_id INTEGER NOT NULL REFERENCES cards(id),
    reviewed_at TEXT NOT NULL,
    rating INTEGER NOT NULL,
    status_before TEXT NOT NULL,
    interval_before REAL NOT NULL,
    interval_after REAL NOT NULL,
    ease_before REAL NOT NULL,
    ease_after REAL NOT NULL,
    scheduler TEXT NOT NULL
);

-- Deck settings overrides
CREATE TABLE IF NOT EXISTS deck_settings (
    deck_path TEXT PRIMARY KEY,
    new_cards_per_day INTEGER,
    reviews_per_day INTEGER
);

-- Global settings
CREATE TABLE IF NOT EXISTS global_settings (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    new_cards_per_day INTEGER NOT NULL DEFAULT 20,
    reviews_per_day INTEGER NOT NULL DEFAULT 200,
    daily_reset_hour INTEGER NOT NULL DEFAULT 0,
    learning_steps TEXT NOT NULL DEFAULT '[1,10]'
);

-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_notes_deck ON notes(deck_path);
CREATE INDEX IF NOT EXISTS idx_cards_deck ON cards(deck_path);
CREATE INDEX IF NOT EXISTS idx_card_states_due ON card_states(due_date);
CREATE INDEX IF NOT EXISTS idx_review_log_time ON review_log(reviewed_at);
"#;

/// Initialize global settings if not exists.
pub const INIT_GLOBAL_SETTINGS: &str = r#"
INSERT OR IGNORE INTO global_settings (id) VALUES (1);
"#;
