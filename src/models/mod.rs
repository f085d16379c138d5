pub mod card;
pub mod deck;
pub mod review_stats;
pub mod scheduling_state;
pub mod sm2;
pub mod study_session;

pub use card::{Card, CardId, LearnerId, NewCard, SetId};
pub use deck::Deck;
pub use review_stats::ReviewStats;
pub use scheduling_state::{DEFAULT_EASINESS_FACTOR, MIN_EASINESS_FACTOR, SchedulingState};
pub use study_session::{Decision, HistoryEntry, Marked, StudySession};
