//! Per learner and card scheduling record ("progress row").
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_EASINESS_FACTOR: f64 = 2.5;
pub const MIN_EASINESS_FACTOR: f64 = 1.3;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchedulingState {
    pub easiness_factor: f64,
    pub interval_days: u32,
    pub repetitions: u32,
    pub next_review_date: NaiveDate,
}

impl SchedulingState {
    /// State of a card the learner has never rated. It is due on `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            easiness_factor: DEFAULT_EASINESS_FACTOR,
            interval_days: 1,
            repetitions: 0,
            next_review_date: today,
        }
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.next_review_date <= today
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_due_today() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let state = SchedulingState::new(today);

        assert_eq!(state.easiness_factor, 2.5);
        assert_eq!(state.interval_days, 1);
        assert_eq!(state.repetitions, 0);
        assert!(state.is_due(today));
        assert!(!state.is_due(today.pred_opt().unwrap()));
    }
}
