//! Progress storage.
//!
//! The engine talks to persistence only through [`ProgressStore`]. Two
//! implementations ship with the crate: SQLite for the binary and an
//! in-memory map for tests and embedding.

pub mod db;
pub mod memory;

pub use db::SqliteStore;
pub use memory::MemoryStore;

use crate::error::StoreResult;
use crate::models::{Card, CardId, LearnerId, ReviewStats, SchedulingState, SetId};
use chrono::NaiveDate;

/// Boundary contract between the scheduling engine and durable storage.
///
/// At most one state is kept per `(learner, card)`; `upsert_progress` replaces it.
pub trait ProgressStore {
    /// `None` means the learner has never rated the card.
    fn get_progress(&self, learner: LearnerId, card: CardId)
    -> StoreResult<Option<SchedulingState>>;

    fn upsert_progress(
        &self,
        learner: LearnerId,
        card: CardId,
        state: &SchedulingState,
    ) -> StoreResult<()>;

    /// Cards due on or before `today`, oldest due date first, ties by card id.
    /// Never-rated cards are returned with a default state due `today`.
    fn list_due(
        &self,
        learner: LearnerId,
        set_id: Option<SetId>,
        today: NaiveDate,
        limit: usize,
    ) -> StoreResult<Vec<(Card, SchedulingState)>>;

    fn aggregate(
        &self,
        learner: LearnerId,
        today: NaiveDate,
        learned_threshold: u32,
    ) -> StoreResult<ReviewStats>;
}
