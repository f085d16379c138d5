//! Interactive study session state machine.
//!
//! A session presents its active cards one at a time. Each card the learner
//! classifies moves into the known or unknown set and is rated through the
//! review queue (known → quality 4, unknown → quality 1). Classifications can
//! be undone, and the unknown cards can be studied again in a retry pass
//! without losing what was decided about the rest of the deck.
//!
//! Only `mark` touches the store. Undo, retry and reset are purely in-memory,
//! so an undone classification keeps its already persisted SM-2 update.

use super::{Card, CardId, LearnerId, SchedulingState};
use crate::database::ProgressStore;
use crate::error::{ReviewError, TransitionError};
use crate::review_queue::ReviewQueue;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    Known,
    Unknown,
}

impl Decision {
    /// SM-2 quality sent to the scheduler for this decision
    pub fn quality(self) -> u8 {
        match self {
            Decision::Known => 4,
            Decision::Unknown => 1,
        }
    }
}

/// One classification, with what the card was classified as before it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HistoryEntry {
    pub card_id: CardId,
    pub decision: Decision,
    pub previous: Option<Decision>,
}

/// Result of a successful `mark`.
///
/// The in-memory classification has already happened. `persisted` reports
/// whether the scheduling update reached the store; a failure there is not
/// rolled back in the session. The store call is synchronous, so `persisted`
/// is already resolved when `mark` returns.
#[derive(Debug)]
pub struct Marked {
    pub card_id: CardId,
    pub decision: Decision,
    pub persisted: Result<SchedulingState, ReviewError>,
}

struct RetryPass {
    cards: Vec<Card>,
    parent_index: usize,
}

pub struct StudySession<'q, S> {
    queue: &'q ReviewQueue<S>,
    learner: LearnerId,
    cards: Vec<Card>,
    retry: Option<RetryPass>,
    current_index: usize,
    known: BTreeSet<CardId>,
    unknown: BTreeSet<CardId>,
    history: Vec<HistoryEntry>,
}

impl<'q, S: ProgressStore> StudySession<'q, S> {
    /// Starts a session over `cards`. Repeated card ids keep their first position.
    pub fn start(queue: &'q ReviewQueue<S>, learner: LearnerId, cards: Vec<Card>) -> Self {
        let mut seen = HashSet::new();
        let cards: Vec<Card> = cards
            .into_iter()
            .filter(|card| seen.insert(card.id))
            .collect();

        info!("Starting study session for learner {} with {} cards", learner, cards.len());

        Self {
            queue,
            learner,
            cards,
            retry: None,
            current_index: 0,
            known: BTreeSet::new(),
            unknown: BTreeSet::new(),
            history: Vec::new(),
        }
    }

    pub fn learner(&self) -> LearnerId {
        self.learner
    }

    /// Cards of the current pass: the whole deck, or the retry subset.
    pub fn active_cards(&self) -> &[Card] {
        match &self.retry {
            Some(pass) => &pass.cards,
            None => &self.cards,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// The card currently presented, `None` once the pass is exhausted.
    pub fn current(&self) -> Option<&Card> {
        self.active_cards().get(self.current_index)
    }

    pub fn is_exhausted(&self) -> bool {
        self.current_index >= self.active_cards().len()
    }

    pub fn is_retry_mode(&self) -> bool {
        self.retry.is_some()
    }

    pub fn known(&self) -> &BTreeSet<CardId> {
        &self.known
    }

    pub fn unknown(&self) -> &BTreeSet<CardId> {
        &self.unknown
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn classification(&self, card_id: CardId) -> Option<Decision> {
        if self.known.contains(&card_id) {
            Some(Decision::Known)
        } else if self.unknown.contains(&card_id) {
            Some(Decision::Unknown)
        } else {
            None
        }
    }

    pub fn known_count(&self) -> usize {
        self.known.len()
    }

    pub fn unknown_count(&self) -> usize {
        self.unknown.len()
    }

    pub fn total_count(&self) -> usize {
        self.active_cards().len()
    }

    pub fn remaining_count(&self) -> usize {
        self.total_count().saturating_sub(self.current_index)
    }

    pub fn phase_message(&self) -> String {
        if self.is_retry_mode() {
            format!("Retry: {} cards to go over again", self.total_count())
        } else {
            format!("Review: {} cards", self.total_count())
        }
    }

    /// Classifies the presented card and rates it.
    pub fn mark(&mut self, decision: Decision) -> Result<Marked, TransitionError> {
        let card_id = self.current().ok_or(TransitionError::Exhausted)?.id;
        self.mark_card(card_id, decision)
    }

    /// Classifies `card_id`, which must be the presented card, and rates it.
    pub fn mark_card(
        &mut self,
        card_id: CardId,
        decision: Decision,
    ) -> Result<Marked, TransitionError> {
        let current = self.current().ok_or(TransitionError::Exhausted)?.id;
        if current != card_id {
            return Err(TransitionError::NotCurrent {
                requested: card_id,
                current,
            });
        }

        let previous = self.classification(card_id);
        self.classify(card_id, Some(decision));
        self.history.push(HistoryEntry {
            card_id,
            decision,
            previous,
        });
        self.current_index += 1;
        debug!("Marked card {} as {:?}", card_id, decision);

        let persisted = self.queue.rate(self.learner, card_id, decision.quality());
        if let Err(e) = &persisted {
            warn!("Scheduling update for card {} was not saved: {}", card_id, e);
        }

        Ok(Marked {
            card_id,
            decision,
            persisted,
        })
    }

    /// Reverts the last classification of the current pass and steps back to
    /// that card. The persisted scheduling update is left in place.
    pub fn undo(&mut self) -> Result<HistoryEntry, TransitionError> {
        let entry = self.history.pop().ok_or(TransitionError::EmptyHistory)?;
        self.classify(entry.card_id, entry.previous);
        self.current_index = self.current_index.saturating_sub(1);
        debug!("Undid {:?} for card {}", entry.decision, entry.card_id);
        Ok(entry)
    }

    /// Starts a pass over the cards currently classified unknown.
    ///
    /// Classifications are kept, so marking a card known during the retry
    /// moves it out of the unknown set. Undo history starts empty.
    pub fn enter_retry(&mut self) -> Result<(), TransitionError> {
        if self.unknown.is_empty() {
            return Err(TransitionError::NothingToRetry);
        }

        let retry_cards: Vec<Card> = self
            .cards
            .iter()
            .filter(|card| self.unknown.contains(&card.id))
            .cloned()
            .collect();
        let parent_index = match self.retry.take() {
            Some(pass) => pass.parent_index,
            None => self.current_index,
        };

        info!("Entering retry with {} cards", retry_cards.len());
        self.retry = Some(RetryPass {
            cards: retry_cards,
            parent_index,
        });
        self.current_index = 0;
        self.history.clear();
        Ok(())
    }

    /// Returns to the full deck at the position retry was entered from.
    pub fn exit_retry(&mut self) -> Result<(), TransitionError> {
        let pass = self.retry.take().ok_or(TransitionError::NotInRetry)?;
        self.current_index = pass.parent_index;
        self.history.clear();
        info!("Left retry, back at card {} of {}", self.current_index, self.cards.len());
        Ok(())
    }

    /// Starts the whole deck over. Persisted scheduling state is untouched.
    pub fn reset_all(&mut self) {
        self.known.clear();
        self.unknown.clear();
        self.history.clear();
        self.retry = None;
        self.current_index = 0;
    }

    fn classify(&mut self, card_id: CardId, decision: Option<Decision>) {
        self.known.remove(&card_id);
        self.unknown.remove(&card_id);
        match decision {
            Some(Decision::Known) => {
                self.known.insert(card_id);
            }
            Some(Decision::Unknown) => {
                self.unknown.insert(card_id);
            }
            None => {}
        }
    }
}
