//! Review queue: which cards are due, how a learner is doing, and the single
//! write path that applies SM-2 to a rating.

use crate::clock::{Clock, SystemClock};
use crate::config::QueueConfig;
use crate::database::ProgressStore;
use crate::error::ReviewError;
use crate::models::sm2::{self, validate_quality};
use crate::models::{
    Card, CardId, LearnerId, ReviewStats, SchedulingState, SetId, StudySession,
};
use chrono::NaiveDate;
use log::{debug, warn};

pub struct ReviewQueue<S> {
    store: S,
    clock: Box<dyn Clock + Send + Sync>,
    config: QueueConfig,
}

impl<S: ProgressStore> ReviewQueue<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            clock: Box::new(SystemClock),
            config: QueueConfig::default(),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_config(mut self, config: QueueConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Cards due today, at most one page of them.
    ///
    /// Store failures are logged and yield an empty queue.
    pub fn due_cards(&self, learner: LearnerId, set_id: Option<SetId>) -> Vec<(Card, SchedulingState)> {
        let today = self.today();
        match self
            .store
            .list_due(learner, set_id, today, self.config.page_size)
        {
            Ok(due) => {
                debug!("{} cards due for learner {} on {}", due.len(), learner, today);
                due
            }
            Err(e) => {
                warn!("Could not load due cards for learner {}: {}", learner, e);
                Vec::new()
            }
        }
    }

    /// Store failures are logged and yield default stats.
    pub fn stats(&self, learner: LearnerId) -> ReviewStats {
        self.store
            .aggregate(learner, self.today(), self.config.learned_threshold)
            .unwrap_or_else(|e| {
                warn!("Could not compute stats for learner {}: {}", learner, e);
                ReviewStats::default()
            })
    }

    /// Applies a 0-5 rating to the learner's state for `card` and persists it.
    ///
    /// The quality is checked before the store is read. Store failures are
    /// returned, never swallowed.
    pub fn rate(
        &self,
        learner: LearnerId,
        card: CardId,
        quality: u8,
    ) -> Result<SchedulingState, ReviewError> {
        let quality = validate_quality(quality)?;
        let today = self.today();

        let prior = self
            .store
            .get_progress(learner, card)?
            .unwrap_or_else(|| SchedulingState::new(today));
        let next = sm2::schedule(quality, &prior, today)?;
        self.store.upsert_progress(learner, card, &next)?;

        debug!(
            "Learner {} rated card {} with {}: EF {:.2}, next review {} ({} days)",
            learner, card, quality, next.easiness_factor, next.next_review_date, next.interval_days
        );
        Ok(next)
    }

    /// Starts a study session over the cards due today.
    pub fn start_session(&self, learner: LearnerId, set_id: Option<SetId>) -> StudySession<'_, S> {
        let cards = self
            .due_cards(learner, set_id)
            .into_iter()
            .map(|(card, _)| card)
            .collect();
        StudySession::start(self, learner, cards)
    }
}
