//! In-process progress store backed by maps.

use super::ProgressStore;
use crate::error::{StoreError, StoreResult};
use crate::models::{Card, CardId, LearnerId, ReviewStats, SchedulingState, SetId};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Inner {
    cards: BTreeMap<CardId, Card>,
    progress: HashMap<(LearnerId, CardId), SchedulingState>,
    offline: bool,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cards(cards: impl IntoIterator<Item = Card>) -> Self {
        let store = Self::new();
        if let Ok(mut inner) = store.inner.lock() {
            inner.cards.extend(cards.into_iter().map(|card| (card.id, card)));
        }
        store
    }

    /// While offline every call fails with [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.offline = offline;
        }
    }

    fn inner(&self) -> StoreResult<MutexGuard<'_, Inner>> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        if inner.offline {
            return Err(StoreError::Unavailable("memory store is offline".to_string()));
        }
        Ok(inner)
    }
}

impl ProgressStore for MemoryStore {
    fn get_progress(
        &self,
        learner: LearnerId,
        card: CardId,
    ) -> StoreResult<Option<SchedulingState>> {
        Ok(self.inner()?.progress.get(&(learner, card)).cloned())
    }

    fn upsert_progress(
        &self,
        learner: LearnerId,
        card: CardId,
        state: &SchedulingState,
    ) -> StoreResult<()> {
        let mut inner = self.inner()?;
        if !inner.cards.contains_key(&card) {
            return Err(StoreError::CardNotFound(card));
        }
        inner.progress.insert((learner, card), state.clone());
        Ok(())
    }

    fn list_due(
        &self,
        learner: LearnerId,
        set_id: Option<SetId>,
        today: NaiveDate,
        limit: usize,
    ) -> StoreResult<Vec<(Card, SchedulingState)>> {
        let inner = self.inner()?;
        let mut due: Vec<(Card, SchedulingState)> = inner
            .cards
            .values()
            .filter(|card| set_id.is_none_or(|set| card.set_id == set))
            .map(|card| {
                let state = inner
                    .progress
                    .get(&(learner, card.id))
                    .cloned()
                    .unwrap_or_else(|| SchedulingState::new(today));
                (card.clone(), state)
            })
            .filter(|(_, state)| state.is_due(today))
            .collect();

        due.sort_by(|(a, sa), (b, sb)| {
            sa.next_review_date
                .cmp(&sb.next_review_date)
                .then(a.id.cmp(&b.id))
        });
        due.truncate(limit);
        Ok(due)
    }

    fn aggregate(
        &self,
        learner: LearnerId,
        today: NaiveDate,
        learned_threshold: u32,
    ) -> StoreResult<ReviewStats> {
        let inner = self.inner()?;
        let states = inner
            .progress
            .iter()
            .filter(|((owner, card), _)| *owner == learner && inner.cards.contains_key(card))
            .map(|(_, state)| state);

        Ok(ReviewStats::from_states(
            inner.cards.len(),
            states,
            today,
            learned_threshold,
        ))
    }
}
