//! Card selection policies for a matching session.
//!
//! The daily-limit policy mirrors the reviewer's queues: intraday learning
//! cards first, then due reviews up to the review limit, then new cards up
//! to the new-card limit.

use crate::types::{CardStatus, EffectiveSettings, SelectionMode};
use chrono::{DateTime, Duration, NaiveTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Scheduling facts about one card, as needed for selection.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateCard {
    pub card_id: i64,
    pub status: CardStatus,
    pub due: Option<DateTime<Utc>>,
    pub position: i64,
}

/// What has already been studied during the current study day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCounts {
    /// New cards introduced today.
    pub new_today: u32,
    /// Reviews of non-new cards done today.
    pub reviews_today: u32,
}

/// Boundaries of the study day, which begins at the daily reset hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudyDay {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl StudyDay {
    /// The study day containing `now` in the timezone of `now`.
    ///
    /// Before the reset hour the previous calendar day is still current.
    pub fn containing<Tz: TimeZone>(now: &DateTime<Tz>, reset_hour: u32) -> Self {
        let reset_hour = reset_hour.min(23);
        let mut date = now.date_naive();
        if now.hour() < reset_hour {
            date = date.pred_opt().unwrap_or(date);
        }

        let reset = NaiveTime::from_hms_opt(reset_hour, 0, 0).unwrap_or(NaiveTime::MIN);
        let naive_start = date.and_time(reset);
        let start = now
            .timezone()
            .from_local_datetime(&naive_start)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| naive_start.and_utc());

        Self {
            start,
            end: start + Duration::days(1),
        }
    }
}

/// Ordered card ids picked for a session and where they came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub card_ids: Vec<i64>,
    pub learn_count: usize,
    pub review_count: usize,
    pub new_count: usize,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.card_ids.is_empty()
    }
}

/// Pick the cards of a deck for a matching session.
pub fn select_cards(
    mode: SelectionMode,
    candidates: &[CandidateCard],
    settings: &EffectiveSettings,
    counts: DailyCounts,
    day: StudyDay,
) -> Selection {
    match mode {
        SelectionMode::All => select_all(candidates),
        SelectionMode::Due => {
            let learn = learn_queue(candidates, day);
            let review = review_queue(candidates, day);
            assemble(learn, review, Vec::new())
        }
        SelectionMode::DailyLimit => {
            let review_left = settings.reviews_per_day.saturating_sub(counts.reviews_today) as usize;
            let new_left = settings.new_cards_per_day.saturating_sub(counts.new_today) as usize;

            let learn = learn_queue(candidates, day);
            let mut review = review_queue(candidates, day);
            review.truncate(review_left);
            let mut new = new_queue(candidates);
            new.truncate(new_left);
            assemble(learn, review, new)
        }
    }
}

fn select_all(candidates: &[CandidateCard]) -> Selection {
    let mut cards: Vec<&CandidateCard> = candidates.iter().collect();
    cards.sort_by_key(|c| (c.position, c.card_id));

    let mut selection = Selection::default();
    for card in cards {
        match card.status {
            CardStatus::New => selection.new_count += 1,
            CardStatus::Learning | CardStatus::Relearning => selection.learn_count += 1,
            CardStatus::Review => selection.review_count += 1,
        }
        selection.card_ids.push(card.card_id);
    }
    selection
}

/// Learning cards due before the study day ends, soonest first.
/// A learning card without a due time is due immediately.
fn learn_queue(candidates: &[CandidateCard], day: StudyDay) -> Vec<&CandidateCard> {
    let mut queue: Vec<&CandidateCard> = candidates
        .iter()
        .filter(|c| c.status.is_learning())
        .filter(|c| c.due.map_or(true, |due| due < day.end))
        .collect();
    queue.sort_by_key(|c| (c.due.unwrap_or(day.start), c.card_id));
    queue
}

/// Review cards due on or before the end of the study day, most overdue
/// first.
fn review_queue(candidates: &[CandidateCard], day: StudyDay) -> Vec<&CandidateCard> {
    let mut queue: Vec<&CandidateCard> = candidates
        .iter()
        .filter(|c| c.status == CardStatus::Review)
        .filter(|c| c.due.map_or(true, |due| due <= day.end))
        .collect();
    queue.sort_by_key(|c| (c.due.unwrap_or(day.start), c.card_id));
    queue
}

/// New cards in introduction order.
fn new_queue(candidates: &[CandidateCard]) -> Vec<&CandidateCard> {
    let mut queue: Vec<&CandidateCard> = candidates
        .iter()
        .filter(|c| c.status == CardStatus::New)
        .collect();
    queue.sort_by_key(|c| (c.position, c.card_id));
    queue
}

fn assemble(
    learn: Vec<&CandidateCard>,
    review: Vec<&CandidateCard>,
    new: Vec<&CandidateCard>,
) -> Selection {
    let learn_count = learn.len();
    let review_count = review.len();
    let new_count = new.len();
    let card_ids = learn
        .into_iter()
        .chain(review)
        .chain(new)
        .map(|c| c.card_id)
        .collect();

    Selection {
        card_ids,
        learn_count,
        review_count,
        new_count,
    }
}
