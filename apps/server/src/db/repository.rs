//! Repository pattern for database access.

use crate::db::date_utils::{parse_db_time, to_db_time};
use crate::db::error::DbError;
use chrono::{DateTime, Utc};
use matchdeck_core::types::{
    Card, CardState, CardStatus, Deck, DeckSettings, EffectiveSettings, GlobalSettings, Note,
    NoteType, RawNote,
};
use matchdeck_core::{CandidateCard, DailyCounts, StudyDay};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::path::Path;

type Result<T> = std::result::Result<T, DbError>;

/// Repository for note types and notes.
pub trait NoteRepository {
    fn create_note_type(&self, name: &str, fields: &[String]) -> Result<NoteType>;
    fn get_note_type(&self, id: i64) -> Result<Option<NoteType>>;
    fn list_note_types(&self) -> Result<Vec<NoteType>>;
    fn get_note(&self, id: i64) -> Result<Option<Note>>;
    fn import_notes(
        &self,
        deck_path: &str,
        note_type_id: i64,
        notes: &[RawNote],
    ) -> Result<ImportSummary>;
}

/// Repository for card operations.
pub trait CardRepository {
    fn get_card(&self, id: i64) -> Result<Option<Card>>;
    /// Scheduling facts for every card of a deck and its subdecks.
    fn get_candidate_cards(&self, deck_path: &str) -> Result<Vec<CandidateCard>>;
    /// Card and note for each id, in the given order. Unknown ids are skipped.
    fn get_match_sources(&self, card_ids: &[i64]) -> Result<Vec<MatchSource>>;
}

/// Repository for card state operations.
pub trait StateRepository {
    fn get_card_state(&self, card_id: i64) -> Result<Option<CardState>>;
    fn save_card_state(&self, card_id: i64, state: &CardState) -> Result<()>;
}

/// Repository for deck operations.
pub trait DeckRepository {
    fn get_all_decks(&self, day: &StudyDay) -> Result<Vec<Deck>>;
    /// Note types used by a deck and its subdecks.
    fn get_deck_note_types(&self, deck_path: &str) -> Result<Vec<NoteType>>;
}

/// Repository for the review log.
pub trait ReviewRepository {
    fn insert_review(&self, entry: &ReviewLogEntry) -> Result<i64>;
    fn get_daily_counts(&self, day: &StudyDay) -> Result<DailyCounts>;
}

/// Repository for settings operations.
pub trait SettingsRepository {
    fn get_global_settings(&self) -> Result<GlobalSettings>;
    fn save_global_settings(&self, settings: &GlobalSettings) -> Result<()>;
    fn get_deck_settings(&self, deck_path: &str) -> Result<Option<DeckSettings>>;
    fn get_all_deck_settings(&self) -> Result<Vec<DeckSettings>>;
    fn save_deck_settings(&self, settings: &DeckSettings) -> Result<()>;
    fn delete_deck_settings(&self, deck_path: &str) -> Result<bool>;
    fn get_effective_settings(&self, deck_path: Option<&str>) -> Result<EffectiveSettings>;
}

/// Outcome of importing notes into a deck.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub note_ids: Vec<i64>,
    pub cards_created: usize,
    pub cards_updated: usize,
}

/// A card together with the note it was generated from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSource {
    pub card: Card,
    pub note: Note,
}

/// One row of the review log.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewLogEntry {
    pub card_id: i64,
    pub reviewed_at: DateTime<Utc>,
    pub rating: u8,
    pub status_before: CardStatus,
    pub interval_before: f64,
    pub interval_after: f64,
    pub ease_before: f64,
    pub ease_after: f64,
    pub scheduler: String,
}

/// SQLite implementation of repositories.
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Open database at path, creating if necessary.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let repo = Self { conn };
        repo.initialize()?;
        Ok(repo)
    }

    /// Open in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let repo = Self { conn };
        repo.initialize()?;
        Ok(repo)
    }

    fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(super::schema::SCHEMA)?;
        self.conn.execute_batch(super::schema::INIT_GLOBAL_SETTINGS)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
            params![super::schema::SCHEMA_VERSION],
        )?;
        Ok(())
    }

    fn row_to_note_type(row: &rusqlite::Row) -> rusqlite::Result<(i64, String, String)> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?))
    }

    fn decode_note_type((id, name, fields): (i64, String, String)) -> Result<NoteType> {
        Ok(NoteType {
            id,
            name,
            fields: serde_json::from_str(&fields)?,
        })
    }

    fn row_to_state(row: &rusqlite::Row) -> rusqlite::Result<CardState> {
        let status: String = row.get(0)?;
        let due: Option<String> = row.get(4)?;
        Ok(CardState {
            status: CardStatus::parse(&status),
            interval_days: row.get(1)?,
            ease_factor: row.get(2)?,
            learning_step: row.get(3)?,
            due: due.as_deref().and_then(parse_db_time),
            lapses: row.get(5)?,
            reviews_count: row.get(6)?,
        })
    }

    /// Zip a note type's field names with stored values.
    fn named_fields(names: Vec<String>, values: Vec<String>) -> Vec<(String, String)> {
        let mut values = values.into_iter();
        names
            .into_iter()
            .map(|name| (name, values.next().unwrap_or_default()))
            .collect()
    }
}

/// SQL predicate matching a deck and its subdecks on column `deck_path`.
const IN_DECK: &str = "(deck_path = ?1 OR substr(deck_path, 1, length(?1) + 1) = ?1 || '/')";

impl NoteRepository for SqliteRepository {
    fn create_note_type(&self, name: &str, fields: &[String]) -> Result<NoteType> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DbError::InvalidData("note type name is empty".into()));
        }
        if fields.is_empty() || fields.iter().any(|f| f.trim().is_empty()) {
            return Err(DbError::InvalidData("a note type needs at least one named field".into()));
        }

        let exists: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM note_types WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(DbError::DuplicateNoteType(name.to_string()));
        }

        let fields: Vec<String> = fields.iter().map(|f| f.trim().to_string()).collect();
        self.conn.execute(
            "INSERT INTO note_types (name, fields) VALUES (?1, ?2)",
            params![name, serde_json::to_string(&fields)?],
        )?;

        Ok(NoteType {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            fields,
        })
    }

    fn get_note_type(&self, id: i64) -> Result<Option<NoteType>> {
        self.conn
            .query_row(
                "SELECT id, name, fields FROM note_types WHERE id = ?1",
                params![id],
                Self::row_to_note_type,
            )
            .optional()?
            .map(Self::decode_note_type)
            .transpose()
    }

    fn list_note_types(&self) -> Result<Vec<NoteType>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, fields FROM note_types ORDER BY name")?;

        let rows = stmt
            .query_map([], Self::row_to_note_type)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter().map(Self::decode_note_type).collect()
    }

    fn get_note(&self, id: i64) -> Result<Option<Note>> {
        let row = self
            .conn
            .query_row(
                "SELECT n.id, n.note_type_id, n.deck_path, n.fields, t.fields
                FROM notes n
                JOIN note_types t ON t.id = n.note_type_id
                WHERE n.id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, note_type_id, deck_path, values, names)) = row else {
            return Ok(None);
        };
        Ok(Some(Note {
            id,
            note_type_id,
            deck_path,
            fields: Self::named_fields(
                serde_json::from_str(&names)?,
                serde_json::from_str(&values)?,
            ),
        }))
    }

    fn import_notes(
        &self,
        deck_path: &str,
        note_type_id: i64,
        notes: &[RawNote],
    ) -> Result<ImportSummary> {
        if self.get_note_type(note_type_id)?.is_none() {
            return Err(DbError::NoteTypeNotFound(note_type_id));
        }

        let tx = self.conn.unchecked_transaction()?;
        let now = to_db_time(Utc::now());
        let mut summary = ImportSummary::default();

        for raw in notes {
            let values = serde_json::to_string(&raw.fields)?;
            let note_id = if let Some(id) = raw.id {
                tx.execute(
                    "INSERT INTO notes (id, note_type_id, deck_path, fields, modified_at)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    ON CONFLICT(id) DO UPDATE SET
                        note_type_id = excluded.note_type_id,
                        deck_path = excluded.deck_path,
                        fields = excluded.fields,
                        modified_at = excluded.modified_at",
                    params![id, note_type_id, deck_path, values, now],
                )?;
                id
            } else {
                tx.execute(
                    "INSERT INTO notes (note_type_id, deck_path, fields, modified_at)
                    VALUES (?1, ?2, ?3, ?4)",
                    params![note_type_id, deck_path, values, now],
                )?;
                tx.last_insert_rowid()
            };
            summary.note_ids.push(note_id);

            let card_id: Option<i64> = tx
                .query_row(
                    "SELECT id FROM cards WHERE note_id = ?1",
                    params![note_id],
                    |row| row.get(0),
                )
                .optional()?;

            match card_id {
                Some(card_id) => {
                    tx.execute(
                        "UPDATE cards SET deck_path = ?1 WHERE id = ?2",
                        params![deck_path, card_id],
                    )?;
                    summary.cards_updated += 1;
                }
                None => {
                    tx.execute(
                        "INSERT INTO cards (note_id, deck_path, position)
                        VALUES (?1, ?2, (SELECT COALESCE(MAX(position), 0) + 1 FROM cards))",
                        params![note_id, deck_path],
                    )?;
                    tx.execute(
                        "INSERT OR IGNORE INTO card_states (card_id) VALUES (?1)",
                        params![tx.last_insert_rowid()],
                    )?;
                    summary.cards_created += 1;
                }
            }
        }

        tx.commit()?;
        Ok(summary)
    }
}

impl CardRepository for SqliteRepository {
    fn get_card(&self, id: i64) -> Result<Option<Card>> {
        self.conn
            .query_row(
                "SELECT id, note_id, deck_path, position FROM cards WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Card {
                        id: row.get(0)?,
                        note_id: row.get(1)?,
                        deck_path: row.get(2)?,
                        position: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    fn get_candidate_cards(&self, deck_path: &str) -> Result<Vec<CandidateCard>> {
        let sql = format!(
            "SELECT c.id, cs.status, cs.due_date, c.position
            FROM cards c
            LEFT JOIN card_states cs ON c.id = cs.card_id
            WHERE {}
            ORDER BY c.position",
            IN_DECK.replace("deck_path", "c.deck_path")
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let cards = stmt
            .query_map(params![deck_path], |row| {
                let status: Option<String> = row.get(1)?;
                let due: Option<String> = row.get(2)?;
                Ok(CandidateCard {
                    card_id: row.get(0)?,
                    status: status.as_deref().map(CardStatus::parse).unwrap_or_default(),
                    due: due.as_deref().and_then(parse_db_time),
                    position: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(cards)
    }

    fn get_match_sources(&self, card_ids: &[i64]) -> Result<Vec<MatchSource>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.note_id, c.deck_path, c.position, n.note_type_id, n.deck_path, n.fields, t.fields
            FROM cards c
            JOIN notes n ON n.id = c.note_id
            JOIN note_types t ON t.id = n.note_type_id
            WHERE c.id = ?1",
        )?;

        let mut sources = Vec::with_capacity(card_ids.len());
        for &card_id in card_ids {
            let row = stmt
                .query_row(params![card_id], |row| {
                    Ok((
                        Card {
                            id: row.get(0)?,
                            note_id: row.get(1)?,
                            deck_path: row.get(2)?,
                            position: row.get(3)?,
                        },
                        row.get::<_, i64>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, String>(7)?,
                    ))
                })
                .optional()?;

            if let Some((card, note_type_id, note_deck, values, names)) = row {
                let note = Note {
                    id: card.note_id,
                    note_type_id,
                    deck_path: note_deck,
                    fields: Self::named_fields(
                        serde_json::from_str(&names)?,
                        serde_json::from_str(&values)?,
                    ),
                };
                sources.push(MatchSource { card, note });
            }
        }

        Ok(sources)
    }
}

impl StateRepository for SqliteRepository {
    fn get_card_state(&self, card_id: i64) -> Result<Option<CardState>> {
        self.conn
            .query_row(
                "SELECT status, interval_days, ease_factor, learning_step, due_date, lapses, reviews_count
                FROM card_states WHERE card_id = ?1",
                params![card_id],
                Self::row_to_state,
            )
            .optional()
            .map_err(Into::into)
    }

    fn save_card_state(&self, card_id: i64, state: &CardState) -> Result<()> {
        let due = state.due.map(to_db_time);

        self.conn.execute(
            "INSERT OR REPLACE INTO card_states (card_id, status, interval_days, ease_factor, learning_step, due_date, lapses, reviews_count)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                card_id,
                state.status.as_str(),
                state.interval_days,
                state.ease_factor,
                state.learning_step,
                due,
                state.lapses,
                state.reviews_count,
            ],
        )?;
        Ok(())
    }
}

impl DeckRepository for SqliteRepository {
    fn get_all_decks(&self, day: &StudyDay) -> Result<Vec<Deck>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.deck_path, COUNT(*) as total,
                SUM(CASE WHEN COALESCE(cs.status, 'new') = 'new' THEN 1 ELSE 0 END) as new_count,
                SUM(CASE WHEN cs.status IN ('learning', 'relearning') THEN 1 ELSE 0 END) as learning_count,
                SUM(CASE WHEN cs.status = 'review' AND cs.due_date <= ?1 THEN 1 ELSE 0 END) as due_count
            FROM cards c
            LEFT JOIN card_states cs ON c.id = cs.card_id
            GROUP BY c.deck_path
            ORDER BY c.deck_path",
        )?;

        let decks = stmt
            .query_map(params![to_db_time(day.end)], |row| {
                let path: String = row.get(0)?;
                Ok(Deck {
                    name: Deck::name_from_path(&path),
                    path,
                    card_count: row.get(1)?,
                    new_count: row.get(2)?,
                    learning_count: row.get(3)?,
                    due_count: row.get(4)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(decks)
    }

    fn get_deck_note_types(&self, deck_path: &str) -> Result<Vec<NoteType>> {
        let sql = format!(
            "SELECT id, name, fields FROM note_types
            WHERE id IN (SELECT note_type_id FROM notes WHERE {IN_DECK})
            ORDER BY name"
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let rows = stmt
            .query_map(params![deck_path], Self::row_to_note_type)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter().map(Self::decode_note_type).collect()
    }
}

impl ReviewRepository for SqliteRepository {
    fn insert_review(&self, entry: &ReviewLogEntry) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO review_log (card_id, reviewed_at, rating, status_before, interval_before, interval_after, ease_before, ease_after, scheduler)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                entry.card_id,
                to_db_time(entry.reviewed_at),
                entry.rating,
                entry.status_before.as_str(),
                entry.interval_before,
                entry.interval_after,
                entry.ease_before,
                entry.ease_after,
                entry.scheduler,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_daily_counts(&self, day: &StudyDay) -> Result<DailyCounts> {
        self.conn
            .query_row(
                "SELECT
                    COUNT(DISTINCT CASE WHEN status_before = 'new' THEN card_id END),
                    COALESCE(SUM(CASE WHEN status_before = 'review' THEN 1 ELSE 0 END), 0)
                FROM review_log
                WHERE reviewed_at >= ?1 AND reviewed_at < ?2",
                params![to_db_time(day.start), to_db_time(day.end)],
                |row| {
                    Ok(DailyCounts {
                        new_today: row.get(0)?,
                        reviews_today: row.get(1)?,
                    })
                },
            )
            .map_err(Into::into)
    }
}

impl SettingsRepository for SqliteRepository {
    fn get_global_settings(&self) -> Result<GlobalSettings> {
        let (new_cards_per_day, reviews_per_day, daily_reset_hour, steps) = self.conn.query_row(
            "SELECT new_cards_per_day, reviews_per_day, daily_reset_hour, learning_steps FROM global_settings WHERE id = 1",
            [],
            |row| {
                Ok((
                    row.get::<_, u32>(0)?,
                    row.get::<_, u32>(1)?,
                    row.get::<_, u32>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )?;

        Ok(GlobalSettings {
            new_cards_per_day,
            reviews_per_day,
            daily_reset_hour,
            learning_steps: serde_json::from_str(&steps)?,
        })
    }

    fn save_global_settings(&self, settings: &GlobalSettings) -> Result<()> {
        if settings.daily_reset_hour > 23 {
            return Err(DbError::InvalidData(format!(
                "daily reset hour must be 0-23, got {}",
                settings.daily_reset_hour
            )));
        }

        self.conn.execute(
            "UPDATE global_settings SET new_cards_per_day = ?1, reviews_per_day = ?2, daily_reset_hour = ?3, learning_steps = ?4 WHERE id = 1",
            params![
                settings.new_cards_per_day,
                settings.reviews_per_day,
                settings.daily_reset_hour,
                serde_json::to_string(&settings.learning_steps)?,
            ],
        )?;

        Ok(())
    }

    fn get_deck_settings(&self, deck_path: &str) -> Result<Option<DeckSettings>> {
        self.conn
            .query_row(
                "SELECT deck_path, new_cards_per_day, reviews_per_day FROM deck_settings WHERE deck_path = ?1",
                params![deck_path],
                |row| {
                    Ok(DeckSettings {
                        deck_path: row.get(0)?,
                        new_cards_per_day: row.get(1)?,
                        reviews_per_day: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    fn get_all_deck_settings(&self) -> Result<Vec<DeckSettings>> {
        let mut stmt = self.conn.prepare(
            "SELECT deck_path, new_cards_per_day, reviews_per_day FROM deck_settings ORDER BY deck_path",
        )?;

        let settings = stmt
            .query_map([], |row| {
                Ok(DeckSettings {
                    deck_path: row.get(0)?,
                    new_cards_per_day: row.get(1)?,
                    reviews_per_day: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(settings)
    }

    fn save_deck_settings(&self, settings: &DeckSettings) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO deck_settings (deck_path, new_cards_per_day, reviews_per_day) VALUES (?1, ?2, ?3)",
            params![
                settings.deck_path,
                settings.new_cards_per_day,
                settings.reviews_per_day,
            ],
        )?;

        Ok(())
    }

    fn delete_deck_settings(&self, deck_path: &str) -> Result<bool> {
        let count = self.conn.execute(
            "DELETE FROM deck_settings WHERE deck_path = ?1",
            params![deck_path],
        )?;
        Ok(count > 0)
    }

    fn get_effective_settings(&self, deck_path: Option<&str>) -> Result<EffectiveSettings> {
        let global = self.get_global_settings()?;
        let deck = match deck_path {
            Some(path) => self.get_deck_settings(path)?,
            None => None,
        };
        Ok(EffectiveSettings::merge(&global, deck.as_ref()))
    }
}
