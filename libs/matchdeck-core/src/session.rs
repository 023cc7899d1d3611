//! Matching session engine.
//!
//! A session splits a pool of vocab/meaning pairs into pages. Each page lays
//! its vocab and meaning tiles out at random grid positions; the learner
//! picks one of each and the engine scores the attempt. Clocks are driven
//! by [`MatchSession::tick`].

use crate::error::SessionError;
use crate::media;
use crate::timer::{ClockView, Countdown, CountdownTick, Stopwatch};
use crate::types::{Rating, TimekeepingMode};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

pub const MIN_PAGE_SIZE: usize = 3;
pub const MAX_PAGE_SIZE: usize = 50;
/// Time limits must stay below one hour.
pub const MAX_TIME_LIMIT_SECS: u32 = 3599;
/// Ease written back for a correct match when stats are updated.
pub const WRITE_BACK_EASE: u8 = 2;

fn default_page_size() -> usize {
    5
}

fn default_columns() -> usize {
    3
}

/// Options chosen before a session starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_columns")]
    pub columns: usize,
    #[serde(default)]
    pub update_stats: bool,
    #[serde(default)]
    pub timekeeping: TimekeepingMode,
    #[serde(default)]
    pub time_limit_secs: u32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            columns: default_columns(),
            update_stats: false,
            timekeeping: TimekeepingMode::default(),
            time_limit_secs: 0,
        }
    }
}

impl MatchConfig {
    pub fn validate(&self) -> Result<(), SessionError> {
        if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(SessionError::InvalidPageSize {
                value: self.page_size,
                min: MIN_PAGE_SIZE,
                max: MAX_PAGE_SIZE,
            });
        }
        if self.columns == 0 {
            return Err(SessionError::InvalidColumns);
        }

        let limit_ok = if self.timekeeping.is_countdown() {
            (1..=MAX_TIME_LIMIT_SECS).contains(&self.time_limit_secs)
        } else {
            self.time_limit_secs <= MAX_TIME_LIMIT_SECS
        };
        if !limit_ok {
            return Err(SessionError::InvalidTimeLimit {
                value: self.time_limit_secs,
                max: MAX_TIME_LIMIT_SECS,
            });
        }
        Ok(())
    }
}

/// One vocab/meaning pair drawn from a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPair {
    pub vocab: String,
    pub meaning: String,
    /// Raw audio field; may hold `[sound:...]` tags.
    pub audio: String,
    pub card_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    Vocab,
    Meaning,
}

#[derive(Debug, Clone)]
struct Tile {
    /// Index into the page's pairs.
    pair: usize,
    text: String,
    row: usize,
    col: usize,
    matched: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Picked {
    Idle,
    Vocab(usize),
    Meaning(usize),
}

/// Details of a correct match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchHit {
    pub card_id: i64,
    pub vocab: String,
    pub meaning: String,
    pub sounds: Vec<String>,
    /// Grade to write back, present when the session updates stats.
    pub grade: Option<Rating>,
    pub page_complete: bool,
}

/// Result of clicking a tile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SelectOutcome {
    Ignored,
    Selected,
    Deselected,
    Correct(MatchHit),
    Wrong,
}

/// Expiry reported by a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TickEvent {
    PageTimeUp,
    AllCardsTimeUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageChange {
    Loaded,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Score {
    pub tries: u32,
    pub correct: u32,
    pub wrong: u32,
    pub accuracy: f64,
}

impl Score {
    fn new(correct: u32, wrong: u32) -> Self {
        let tries = correct + wrong;
        let accuracy = if tries == 0 {
            0.0
        } else {
            (f64::from(correct) / f64::from(tries) * 10_000.0).round() / 100.0
        };
        Self {
            tries,
            correct,
            wrong,
            accuracy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileView {
    pub id: usize,
    pub kind: TileKind,
    pub text: String,
    pub row: usize,
    pub col: usize,
    pub matched: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageView {
    /// 1-based.
    pub number: usize,
    pub total_pages: usize,
    pub rows: usize,
    pub columns: usize,
    pub vocab: Vec<TileView>,
    pub meanings: Vec<TileView>,
    pub locked: bool,
    pub complete: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub page: Option<PageView>,
    pub score: Score,
    pub page_clock: ClockView,
    pub session_clock: ClockView,
    pub next_available: bool,
    pub finished: bool,
}

#[derive(Debug, Clone)]
enum Clock {
    Up(Stopwatch),
    Down(Countdown),
}

impl Clock {
    fn start(&mut self) {
        match self {
            Clock::Up(watch) => watch.start(),
            Clock::Down(countdown) => countdown.start(),
        }
    }

    fn freeze(&mut self) {
        match self {
            Clock::Up(watch) => watch.freeze(),
            Clock::Down(countdown) => countdown.stop(),
        }
    }

    fn tick(&mut self) -> CountdownTick {
        match self {
            Clock::Up(watch) => {
                watch.tick();
                if watch.is_running() {
                    CountdownTick::Running
                } else {
                    CountdownTick::Idle
                }
            }
            Clock::Down(countdown) => countdown.tick(),
        }
    }

    fn view(&self) -> ClockView {
        match self {
            Clock::Up(watch) => watch.into(),
            Clock::Down(countdown) => countdown.into(),
        }
    }
}

pub struct MatchSession {
    config: MatchConfig,
    pairs: Vec<MatchPair>,
    rng: StdRng,
    page_index: usize,
    vocab: Vec<Tile>,
    meanings: Vec<Tile>,
    picked: Picked,
    correct: u32,
    wrong: u32,
    locked: bool,
    next_disabled: bool,
    finished: bool,
    page_clock: Clock,
    session_clock: Clock,
}

impl MatchSession {
    pub fn new(pairs: Vec<MatchPair>, config: MatchConfig) -> Result<Self, SessionError> {
        Self::with_rng(pairs, config, StdRng::from_os_rng())
    }

    pub fn with_seed(
        pairs: Vec<MatchPair>,
        config: MatchConfig,
        seed: u64,
    ) -> Result<Self, SessionError> {
        Self::with_rng(pairs, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        pairs: Vec<MatchPair>,
        config: MatchConfig,
        rng: StdRng,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        if pairs.is_empty() {
            return Err(SessionError::EmptyPool);
        }

        let limit = config.time_limit_secs;
        let (page_clock, session_clock) = match config.timekeeping {
            TimekeepingMode::Informational => {
                (Clock::Up(Stopwatch::new()), Clock::Up(Stopwatch::new()))
            }
            TimekeepingMode::CountdownPerPage => {
                (Clock::Down(Countdown::new(limit)), Clock::Up(Stopwatch::new()))
            }
            TimekeepingMode::CountdownForAllCards => {
                (Clock::Up(Stopwatch::new()), Clock::Down(Countdown::new(limit)))
            }
        };

        let mut session = Self {
            config,
            pairs,
            rng,
            page_index: 0,
            vocab: Vec::new(),
            meanings: Vec::new(),
            picked: Picked::Idle,
            correct: 0,
            wrong: 0,
            locked: false,
            next_disabled: false,
            finished: false,
            page_clock,
            session_clock,
        };
        session.session_clock.start();
        session.load_page();
        Ok(session)
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }

    pub fn total_pages(&self) -> usize {
        self.pairs.len().div_ceil(self.config.page_size)
    }

    /// 1-based page number.
    pub fn current_page(&self) -> usize {
        self.page_index + 1
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn score(&self) -> Score {
        Score::new(self.correct, self.wrong)
    }

    fn page_pairs(&self) -> &[MatchPair] {
        let start = self.page_index * self.config.page_size;
        let end = (start + self.config.page_size).min(self.pairs.len());
        &self.pairs[start..end]
    }

    fn is_last_page(&self) -> bool {
        self.page_index + 1 >= self.total_pages()
    }

    fn page_complete(&self) -> bool {
        !self.vocab.is_empty() && self.vocab.iter().all(|t| t.matched)
    }

    fn load_page(&mut self) {
        let count = self.page_pairs().len();
        let columns = self.config.columns;

        let mut vocab_order: Vec<usize> = (0..count).collect();
        let mut meaning_order: Vec<usize> = (0..count).collect();
        vocab_order.shuffle(&mut self.rng);
        meaning_order.shuffle(&mut self.rng);

        let mut positions: Vec<usize> = (0..self.config.page_size * 2).collect();
        positions.shuffle(&mut self.rng);

        let pairs = self.page_pairs();
        let place = |pair: usize, text: &str, pos: usize| Tile {
            pair,
            text: text.to_string(),
            row: pos / columns,
            col: pos % columns,
            matched: false,
        };
        let vocab: Vec<Tile> = vocab_order
            .iter()
            .zip(&positions)
            .map(|(&p, &pos)| place(p, &pairs[p].vocab, pos))
            .collect();
        let meanings: Vec<Tile> = meaning_order
            .iter()
            .zip(&positions[count..])
            .map(|(&p, &pos)| place(p, &pairs[p].meaning, pos))
            .collect();

        self.vocab = vocab;
        self.meanings = meanings;
        self.picked = Picked::Idle;
        self.locked = false;
        self.page_clock.start();
    }

    pub fn select_vocab(&mut self, tile: usize) -> Result<SelectOutcome, SessionError> {
        let target = self.check_tile(TileKind::Vocab, tile)?;
        if target.matched || self.locked {
            return Ok(SelectOutcome::Ignored);
        }

        Ok(match self.picked {
            Picked::Vocab(current) if current == tile => {
                self.picked = Picked::Idle;
                SelectOutcome::Deselected
            }
            Picked::Vocab(_) => self.miss(),
            Picked::Meaning(meaning) => self.resolve(tile, meaning),
            Picked::Idle => {
                self.picked = Picked::Vocab(tile);
                SelectOutcome::Selected
            }
        })
    }

    pub fn select_meaning(&mut self, tile: usize) -> Result<SelectOutcome, SessionError> {
        let target = self.check_tile(TileKind::Meaning, tile)?;
        if target.matched || self.locked {
            return Ok(SelectOutcome::Ignored);
        }

        Ok(match self.picked {
            Picked::Meaning(current) if current == tile => {
                self.picked = Picked::Idle;
                SelectOutcome::Deselected
            }
            Picked::Meaning(_) => self.miss(),
            Picked::Vocab(vocab) => self.resolve(vocab, tile),
            Picked::Idle => {
                self.picked = Picked::Meaning(tile);
                SelectOutcome::Selected
            }
        })
    }

    fn check_tile(&self, kind: TileKind, tile: usize) -> Result<&Tile, SessionError> {
        if self.finished {
            return Err(SessionError::Finished);
        }
        let tiles = match kind {
            TileKind::Vocab => &self.vocab,
            TileKind::Meaning => &self.meanings,
        };
        tiles.get(tile).ok_or(SessionError::UnknownTile(tile))
    }

    fn miss(&mut self) -> SelectOutcome {
        self.wrong += 1;
        self.picked = Picked::Idle;
        SelectOutcome::Wrong
    }

    fn resolve(&mut self, vocab: usize, meaning: usize) -> SelectOutcome {
        let pair = self.page_pairs()[self.vocab[vocab].pair].clone();
        if self.meanings[meaning].text != pair.meaning {
            return self.miss();
        }

        self.vocab[vocab].matched = true;
        self.meanings[meaning].matched = true;
        self.correct += 1;
        self.picked = Picked::Idle;

        let page_complete = self.page_complete();
        if page_complete {
            self.page_clock.freeze();
            if self.is_last_page() {
                self.session_clock.freeze();
            }
        }

        SelectOutcome::Correct(MatchHit {
            card_id: pair.card_id,
            sounds: media::sound_tags(&pair.audio),
            grade: self
                .config
                .update_stats
                .then(|| Rating::from_ease(WRITE_BACK_EASE)),
            vocab: pair.vocab,
            meaning: pair.meaning,
            page_complete,
        })
    }

    /// Move to the next page, finishing the session after the last one.
    pub fn next_page(&mut self) -> Result<PageChange, SessionError> {
        if self.next_disabled {
            return Err(SessionError::TimeUp);
        }
        if self.finished {
            return Err(SessionError::Finished);
        }

        if self.is_last_page() {
            self.finished = true;
            self.vocab.clear();
            self.meanings.clear();
            self.picked = Picked::Idle;
            self.page_clock.freeze();
            self.session_clock.freeze();
            return Ok(PageChange::Finished);
        }

        self.page_index += 1;
        self.load_page();
        Ok(PageChange::Loaded)
    }

    /// Advance every clock by one second.
    pub fn tick(&mut self) -> Vec<TickEvent> {
        let mut events = Vec::new();

        // Both clocks count this second before either expiry takes effect.
        let page = self.page_clock.tick();
        let session = self.session_clock.tick();

        if page == CountdownTick::Expired {
            self.lock_page();
            if self.is_last_page() {
                self.session_clock.freeze();
            }
            events.push(TickEvent::PageTimeUp);
        }

        if session == CountdownTick::Expired {
            self.lock_page();
            self.next_disabled = true;
            self.page_clock.freeze();
            events.push(TickEvent::AllCardsTimeUp);
        }

        events
    }

    /// Run `secs` ticks, collecting every event.
    pub fn advance(&mut self, secs: u32) -> Vec<TickEvent> {
        (0..secs).flat_map(|_| self.tick()).collect()
    }

    fn lock_page(&mut self) {
        self.locked = true;
        self.picked = Picked::Idle;
    }

    pub fn page_view(&self) -> Option<PageView> {
        if self.finished {
            return None;
        }

        let picked = self.picked;
        let view = |kind: TileKind, tiles: &[Tile]| -> Vec<TileView> {
            tiles
                .iter()
                .enumerate()
                .map(|(id, tile)| TileView {
                    id,
                    kind,
                    text: tile.text.clone(),
                    row: tile.row,
                    col: tile.col,
                    matched: tile.matched,
                    selected: match kind {
                        TileKind::Vocab => picked == Picked::Vocab(id),
                        TileKind::Meaning => picked == Picked::Meaning(id),
                    },
                })
                .collect()
        };

        Some(PageView {
            number: self.current_page(),
            total_pages: self.total_pages(),
            rows: (self.config.page_size * 2).div_ceil(self.config.columns),
            columns: self.config.columns,
            vocab: view(TileKind::Vocab, &self.vocab),
            meanings: view(TileKind::Meaning, &self.meanings),
            locked: self.locked,
            complete: self.page_complete(),
        })
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            page: self.page_view(),
            score: self.score(),
            page_clock: self.page_clock.view(),
            session_clock: self.session_clock.view(),
            next_available: !self.finished && !self.next_disabled,
            finished: self.finished,
        }
    }
}
