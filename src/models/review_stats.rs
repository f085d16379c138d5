//! Aggregate review figures for one learner
use super::{DEFAULT_EASINESS_FACTOR, SchedulingState};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewStats {
    pub total_cards: usize,
    pub cards_due_today: usize,
    pub cards_learned: usize,
    pub average_ef: f64,
}

impl Default for ReviewStats {
    fn default() -> Self {
        Self {
            total_cards: 0,
            cards_due_today: 0,
            cards_learned: 0,
            average_ef: DEFAULT_EASINESS_FACTOR,
        }
    }
}

impl ReviewStats {
    /// Builds stats from the card catalogue size and the learner's rated states.
    ///
    /// Cards without a state are due today; the average EF covers rated cards only.
    pub fn from_states<'a, I>(
        total_cards: usize,
        states: I,
        today: NaiveDate,
        learned_threshold: u32,
    ) -> Self
    where
        I: IntoIterator<Item = &'a SchedulingState>,
    {
        let mut rated = 0usize;
        let mut due_rated = 0usize;
        let mut learned = 0usize;
        let mut ef_sum = 0.0;

        for state in states {
            rated += 1;
            ef_sum += state.easiness_factor;
            if state.is_due(today) {
                due_rated += 1;
            }
            if state.repetitions >= learned_threshold {
                learned += 1;
            }
        }

        let average_ef = if rated == 0 {
            DEFAULT_EASINESS_FACTOR
        } else {
            ef_sum / rated as f64
        };

        Self {
            total_cards,
            cards_due_today: due_rated + total_cards.saturating_sub(rated),
            cards_learned: learned,
            average_ef,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(ef: f64, repetitions: u32, next: NaiveDate) -> SchedulingState {
        SchedulingState {
            easiness_factor: ef,
            interval_days: 1,
            repetitions,
            next_review_date: next,
        }
    }

    #[test]
    fn test_average_over_rated_cards_only() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let later = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
        let states = vec![
            state(2.0, 0, today),
            state(2.5, 2, later),
            state(3.0, 5, later),
        ];

        let stats = ReviewStats::from_states(5, &states, today, 2);
        assert_eq!(stats.total_cards, 5);
        assert!((stats.average_ef - 2.5).abs() < 1e-9);
        assert_eq!(stats.cards_learned, 2);
        // one rated card due plus two unrated
        assert_eq!(stats.cards_due_today, 3);
    }

    #[test]
    fn test_no_rated_cards_uses_default_ef() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let stats = ReviewStats::from_states(4, std::iter::empty(), today, 2);

        assert_eq!(stats.average_ef, DEFAULT_EASINESS_FACTOR);
        assert_eq!(stats.cards_due_today, 4);
        assert_eq!(stats.cards_learned, 0);
    }
}
