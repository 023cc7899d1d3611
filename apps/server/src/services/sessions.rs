//! In-memory store of running matching sessions.
//!
//! The engine's clocks advance in whole-second ticks. Each entry keeps a
//! wall-clock anchor and, whenever the session is touched, converts the
//! time elapsed since the anchor into ticks.
//!
//! Sessions nobody has touched within the idle timeout are dropped the next
//! time the store is used.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use matchdeck_core::{MatchSession, Selection, SelectionMode, TickEvent};
use uuid::Uuid;

/// A running session plus its server-side bookkeeping.
pub struct SessionEntry {
    pub engine: MatchSession,
    pub deck_path: String,
    pub mode: SelectionMode,
    pub selection: Selection,
    /// Grades written back successfully.
    pub graded: u32,
    /// Most recent write-back failure, shown to the player.
    pub last_error: Option<String>,
    anchor: Instant,
    last_touched: Instant,
}

impl SessionEntry {
    pub fn new(
        engine: MatchSession,
        deck_path: String,
        mode: SelectionMode,
        selection: Selection,
        now: Instant,
    ) -> Self {
        Self {
            engine,
            deck_path,
            mode,
            selection,
            graded: 0,
            last_error: None,
            anchor: now,
            last_touched: now,
        }
    }

    /// Tick the engine once per whole second elapsed since the last sync.
    pub fn sync_clock(&mut self, now: Instant) -> Vec<TickEvent> {
        let secs = now.saturating_duration_since(self.anchor).as_secs();
        if secs == 0 {
            return Vec::new();
        }

        self.anchor += Duration::from_secs(secs);
        let secs = u32::try_from(secs).unwrap_or(u32::MAX);
        self.engine.advance(secs)
    }
}

/// Idle timeout used when none is configured.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, SessionEntry>>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_idle_timeout(DEFAULT_IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// Drop every session idle for longer than the timeout at `now`.
    fn evict_idle(&self, sessions: &mut HashMap<Uuid, SessionEntry>, now: Instant) {
        let before = sessions.len();
        sessions.retain(|_, entry| {
            now.saturating_duration_since(entry.last_touched) <= self.idle_timeout
        });

        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::info!(evicted, remaining = sessions.len(), "dropped idle match sessions");
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, SessionEntry>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert(&self, entry: SessionEntry) -> Uuid {
        let id = Uuid::new_v4();
        let mut sessions = self.lock();
        self.evict_idle(&mut sessions, entry.last_touched);
        sessions.insert(id, entry);
        id
    }

    /// Sync the session's clocks to `now`, then run `f` on it.
    ///
    /// Returns `None` for an unknown or expired id.
    pub fn with_session<R>(
        &self,
        id: Uuid,
        now: Instant,
        f: impl FnOnce(&mut SessionEntry, Vec<TickEvent>) -> R,
    ) -> Option<R> {
        let mut sessions = self.lock();
        self.evict_idle(&mut sessions, now);
        let entry = sessions.get_mut(&id)?;
        entry.last_touched = now;
        let events = entry.sync_clock(now);
        Some(f(entry, events))
    }

    /// Record the outcome of a background grade write-back.
    pub fn record_grade(&self, id: Uuid, outcome: Result<(), String>) {
        if let Some(entry) = self.lock().get_mut(&id) {
            match outcome {
                Ok(()) => entry.graded += 1,
                Err(message) => entry.last_error = Some(message),
            }
        }
    }

    pub fn remove(&self, id: Uuid) -> bool {
        self.lock().remove(&id).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
