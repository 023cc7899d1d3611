//! SM-2 scheduler with intraday learning steps.
//!
//! New and lapsed cards walk through `learning_steps` (minutes) before they
//! graduate to day-based review intervals.

use super::{SchedulingResult, Scheduler};
use crate::types::{CardState, CardStatus, Rating};
use chrono::{DateTime, Duration, Utc};

const FALLBACK_STEPS: [u32; 1] = [1];

/// SM-2 scheduler with configurable parameters.
///
/// Review intervals are whole days.
#[derive(Debug, Clone)]
pub struct Sm2 {
    pub learning_steps: Vec<u32>,
    pub initial_ease: f64,
    pub minimum_ease: f64,
    pub easy_bonus: f64,
    pub hard_multiplier: f64,
    pub lapse_multiplier: f64,
    pub graduating_interval: f64,
    pub easy_interval: f64,
}

impl Default for Sm2 {
    fn default() -> Self {
        Self {
            learning_steps: vec![1, 10],
            initial_ease: 2.5,
            minimum_ease: 1.3,
            easy_bonus: 1.3,
            hard_multiplier: 1.2,
            lapse_multiplier: 0.5,
            graduating_interval: 1.0,
            easy_interval: 4.0,
        }
    }
}

impl Sm2 {
    /// Default parameters with custom learning steps.
    pub fn with_steps(learning_steps: Vec<u32>) -> Self {
        Self {
            learning_steps,
            ..Self::default()
        }
    }

    fn steps(&self) -> &[u32] {
        if self.learning_steps.is_empty() {
            &FALLBACK_STEPS
        } else {
            &self.learning_steps
        }
    }

    fn step_due(&self, step: usize, now: DateTime<Utc>) -> DateTime<Utc> {
        let steps = self.steps();
        let minutes = steps[step.min(steps.len() - 1)];
        now + Duration::minutes(i64::from(minutes))
    }

    fn day_due(interval: f64, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::days(interval.ceil() as i64)
    }

    fn schedule_learning(&self, state: &CardState, rating: Rating, now: DateTime<Utc>) -> CardState {
        let relearning = state.status == CardStatus::Relearning;
        let learning_status = if relearning {
            CardStatus::Relearning
        } else {
            CardStatus::Learning
        };
        let step = state.learning_step as usize;
        let mut next = state.clone();

        let graduate = |next: &mut CardState, interval: f64| {
            next.status = CardStatus::Review;
            next.learning_step = 0;
            next.interval_days = interval;
            next.due = Some(Self::day_due(interval, now));
        };

        match rating {
            Rating::Again => {
                next.status = learning_status;
                next.learning_step = 0;
                next.due = Some(self.step_due(0, now));
            }
            Rating::Hard => {
                let step = step.min(self.steps().len() - 1);
                next.status = learning_status;
                next.learning_step = step as u32;
                next.due = Some(self.step_due(step, now));
            }
            Rating::Good => {
                if step + 1 < self.steps().len() {
                    next.status = learning_status;
                    next.learning_step = (step + 1) as u32;
                    next.due = Some(self.step_due(step + 1, now));
                } else if relearning {
                    graduate(&mut next, state.interval_days.max(1.0));
                } else {
                    graduate(&mut next, self.graduating_interval);
                }
            }
            Rating::Easy => {
                if relearning {
                    graduate(&mut next, state.interval_days.max(1.0) + 1.0);
                } else {
                    graduate(&mut next, self.easy_interval);
                }
            }
        }

        next
    }

    fn schedule_review(&self, state: &CardState, rating: Rating, now: DateTime<Utc>) -> CardState {
        let mut next = state.clone();
        let interval = state.interval_days.max(1.0);

        match rating {
            Rating::Again => {
                next.status = CardStatus::Relearning;
                next.lapses += 1;
                next.learning_step = 0;
                next.ease_factor = (state.ease_factor - 0.2).max(self.minimum_ease);
                next.interval_days = (interval * self.lapse_multiplier).round().max(1.0);
                next.due = Some(self.step_due(0, now));
                return next;
            }
            Rating::Hard => {
                next.ease_factor = (state.ease_factor - 0.15).max(self.minimum_ease);
                next.interval_days = (interval * self.hard_multiplier).round().max(1.0);
            }
            Rating::Good => {
                next.interval_days = (interval * state.ease_factor).round().max(interval + 1.0);
            }
            Rating::Easy => {
                next.ease_factor = state.ease_factor + 0.15;
                next.interval_days = (interval * state.ease_factor * self.easy_bonus)
                    .round()
                    .max(interval + 1.0);
            }
        }

        next.status = CardStatus::Review;
        next.due = Some(Self::day_due(next.interval_days, now));
        next
    }
}

impl Scheduler for Sm2 {
    fn name(&self) -> &'static str {
        "sm2"
    }

    fn initial_state(&self) -> CardState {
        CardState {
            ease_factor: self.initial_ease,
            ..CardState::default()
        }
    }

    fn schedule(&self, state: &CardState, rating: Rating, now: DateTime<Utc>) -> SchedulingResult {
        let mut new_state = match state.status {
            CardStatus::New | CardStatus::Learning | CardStatus::Relearning => {
                self.schedule_learning(state, rating, now)
            }
            CardStatus::Review => self.schedule_review(state, rating, now),
        };
        new_state.reviews_count = state.reviews_count + 1;

        // Both arms always set a due date.
        let next_due = new_state.due.unwrap_or(now);

        SchedulingResult {
            new_state,
            next_due,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    fn review_state(interval: f64, ease: f64) -> CardState {
        CardState {
            status: CardStatus::Review,
            interval_days: interval,
            ease_factor: ease,
            reviews_count: 5,
            ..Default::default()
        }
    }

    #[test]
    fn new_card_good_moves_to_second_step() {
        let sm2 = Sm2::default();
        let result = sm2.schedule(&sm2.initial_state(), Rating::Good, now());
        assert_eq!(result.new_state.status, CardStatus::Learning);
        assert_eq!(result.new_state.learning_step, 1);
        assert_eq!(result.next_due, now() + Duration::minutes(10));
        assert_eq!(result.new_state.reviews_count, 1);
    }

    #[test]
    fn new_card_hard_repeats_first_step() {
        let sm2 = Sm2::default();
        let result = sm2.schedule(&sm2.initial_state(), Rating::Hard, now());
        assert_eq!(result.new_state.status, CardStatus::Learning);
        assert_eq!(result.new_state.learning_step, 0);
        assert_eq!(result.next_due, now() + Duration::minutes(1));
    }

    #[test]
    fn good_on_last_step_graduates() {
        let sm2 = Sm2::default();
        let state = CardState {
            status: CardStatus::Learning,
            learning_step: 1,
            ..Default::default()
        };
        let result = sm2.schedule(&state, Rating::Good, now());
        assert_eq!(result.new_state.status, CardStatus::Review);
        assert_eq!(result.new_state.interval_days, 1.0);
        assert_eq!(result.next_due, now() + Duration::days(1));
    }

    #[test]
    fn easy_graduates_immediately() {
        let sm2 = Sm2::default();
        let result = sm2.schedule(&sm2.initial_state(), Rating::Easy, now());
        assert_eq!(result.new_state.status, CardStatus::Review);
        assert_eq!(result.new_state.interval_days, 4.0);
    }

    #[test]
    fn empty_steps_fall_back_to_one_minute() {
        let sm2 = Sm2::with_steps(vec![]);
        let result = sm2.schedule(&sm2.initial_state(), Rating::Again, now());
        assert_eq!(result.next_due, now() + Duration::minutes(1));
    }

    #[test]
    fn review_again_lapses_into_relearning() {
        let sm2 = Sm2::default();
        let result = sm2.schedule(&review_state(10.0, 2.5), Rating::Again, now());
        assert_eq!(result.new_state.status, CardStatus::Relearning);
        assert_eq!(result.new_state.lapses, 1);
        assert_eq!(result.new_state.interval_days, 5.0);
        assert!((result.new_state.ease_factor - 2.3).abs() < 1e-9);
        assert_eq!(result.next_due, now() + Duration::minutes(1));
    }

    #[test]
    fn relearning_good_restores_review_interval() {
        let sm2 = Sm2::default();
        let lapsed = sm2
            .schedule(&review_state(10.0, 2.5), Rating::Again, now())
            .new_state;
        let after_first = sm2.schedule(&lapsed, Rating::Good, now()).new_state;
        assert_eq!(after_first.status, CardStatus::Relearning);
        let graduated = sm2.schedule(&after_first, Rating::Good, now()).new_state;
        assert_eq!(graduated.status, CardStatus::Review);
        assert_eq!(graduated.interval_days, 5.0);
    }

    #[test]
    fn review_hard_grows_slowly_and_lowers_ease() {
        let sm2 = Sm2::default();
        let result = sm2.schedule(&review_state(10.0, 2.5), Rating::Hard, now());
        assert_eq!(result.new_state.status, CardStatus::Review);
        assert_eq!(result.new_state.interval_days, 12.0);
        assert!((result.new_state.ease_factor - 2.35).abs() < 1e-9);
        assert_eq!(result.next_due, now() + Duration::days(12));
    }

    #[test]
    fn review_good_always_grows_by_a_day() {
        let sm2 = Sm2::default();
        let result = sm2.schedule(&review_state(1.0, 1.3), Rating::Good, now());
        assert_eq!(result.new_state.interval_days, 2.0);
    }

    #[test]
    fn ease_factor_never_below_minimum() {
        let sm2 = Sm2::default();
        let result = sm2.schedule(&review_state(10.0, 1.4), Rating::Again, now());
        assert!(result.new_state.ease_factor >= sm2.minimum_ease);
    }
}
