use chrono::{Days, NaiveDate};

use crate::models::{Outcome, ReviewState};

pub const INITIAL_EASE: f64 = 2.5;
pub const MIN_EASE: f64 = 1.3;
pub const PASSING_QUALITY: u8 = 3;
pub const SECOND_INTERVAL_DAYS: u32 = 3;
pub const DEFAULT_HISTORY_LIMIT: usize = 50;
/// Longest interval handed out, about a century.
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewLog {
    pub quality: u8,
    pub scheduled_days: u32,
    /// Set when an exam date shortened the interval.
    pub capped: bool,
}

/// SM-2 variant with binary grading and an optional exam-date cap.
#[derive(Debug, Clone)]
pub struct Sm2Scheduler {
    history_limit: usize,
}

impl Default for Sm2Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sm2Scheduler {
    pub fn new() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn with_history_limit(history_limit: usize) -> Self {
        Self {
            history_limit: history_limit.max(1),
        }
    }

    pub fn initial_state(&self, today: NaiveDate) -> ReviewState {
        ReviewState::new(today)
    }

    /// New state after one review. Pure: the caller persists the result.
    pub fn schedule(
        &self,
        state: &ReviewState,
        outcome: Outcome,
        today: NaiveDate,
        deadline: Option<NaiveDate>,
    ) -> (ReviewState, ReviewLog) {
        let quality = outcome.quality();
        let (repetition, interval) = self.calculate_interval(state, quality);
        let ease = Self::updated_ease(state.ease, quality);

        let (interval, capped) = match deadline {
            Some(exam) => {
                let cap = Self::deadline_cap(today, exam);
                (interval.min(cap), interval > cap)
            }
            None => (interval, false),
        };

        let mut history = state.history.clone();
        history.push(outcome);
        if history.len() > self.history_limit {
            let excess = history.len() - self.history_limit;
            history.drain(..excess);
        }

        let updated = ReviewState {
            ease,
            interval,
            repetition,
            next_review: Some(
                today
                    .checked_add_days(Days::new(u64::from(interval)))
                    .unwrap_or(NaiveDate::MAX),
            ),
            history,
        };

        let log = ReviewLog {
            quality,
            scheduled_days: interval,
            capped,
        };

        (updated, log)
    }

    fn calculate_interval(&self, state: &ReviewState, quality: u8) -> (u32, u32) {
        if quality < PASSING_QUALITY {
            return (0, 1);
        }

        let repetition = state.repetition.saturating_add(1);
        let interval = match repetition {
            1 => 1,
            2 => SECOND_INTERVAL_DAYS,
            _ => (f64::from(state.interval) * state.ease).round() as u32,
        };
        (repetition, interval.clamp(1, MAX_INTERVAL_DAYS))
    }

    fn updated_ease(ease: f64, quality: u8) -> f64 {
        let penalty = f64::from(5 - quality.min(5));
        (ease + (0.1 - penalty * (0.08 + penalty * 0.02))).max(MIN_EASE)
    }

    /// Longest interval that still lands on or before the exam, never below a day.
    pub fn deadline_cap(today: NaiveDate, exam: NaiveDate) -> u32 {
        let days_left = (exam - today).num_days().max(1);
        u32::try_from(days_left).unwrap_or(u32::MAX)
    }
}
