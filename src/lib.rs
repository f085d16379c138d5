pub mod clock;
pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod models;
pub mod review_queue;

pub use database::{MemoryStore, ProgressStore, SqliteStore};
pub use models::{Card, Decision, Deck, Marked, ReviewStats, SchedulingState, StudySession};
pub use review_queue::ReviewQueue;
