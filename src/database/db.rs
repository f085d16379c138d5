//! SQLite progress store
//!
//! Handles database initialization, deck and card content used to seed reviews,
//! per-learner SM-2 progress rows, and the simulated current date.

use super::ProgressStore;
use crate::error::{StoreError, StoreResult};
use crate::models::{
    Card, CardId, Deck, LearnerId, NewCard, ReviewStats, SchedulingState, SetId,
};
use chrono::{Local, NaiveDate};
use log::{debug, info};
use rusqlite::{Connection, OptionalExtension, Result, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

/// Creates tables for decks, cards, SM-2 progress, and app state.
/// Sets current date to today if not already initialized.
fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS decks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS cards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            deck_id INTEGER NOT NULL,
            front TEXT NOT NULL,
            back TEXT NOT NULL,
            FOREIGN KEY (deck_id) REFERENCES decks(id) ON DELETE CASCADE,
            UNIQUE(deck_id, front)
        );

        CREATE TABLE IF NOT EXISTS progress (
            learner_id INTEGER NOT NULL,
            card_id INTEGER NOT NULL,
            easiness_factor REAL NOT NULL DEFAULT 2.5,
            interval_days INTEGER NOT NULL DEFAULT 1,
            repetitions INTEGER NOT NULL DEFAULT 0,
            next_review_date TEXT NOT NULL,
            PRIMARY KEY (learner_id, card_id),
            FOREIGN KEY (card_id) REFERENCES cards(id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS app_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );",
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO app_state (key, value) VALUES ('current_date', ?1)",
        params![Local::now().date_naive()],
    )?;

    Ok(())
}

fn state_from_row(row: &rusqlite::Row<'_>, offset: usize) -> Result<SchedulingState> {
    Ok(SchedulingState {
        easiness_factor: row.get(offset)?,
        interval_days: row.get(offset + 1)?,
        repetitions: row.get(offset + 2)?,
        next_review_date: row.get(offset + 3)?,
    })
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        info!("Opened progress database at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("database connection lock poisoned".to_string()))
    }

    /// Retrieves the simulated current date
    pub fn current_date(&self) -> StoreResult<NaiveDate> {
        let conn = self.conn()?;
        let date = conn.query_row(
            "SELECT value FROM app_state WHERE key = 'current_date'",
            [],
            |row| row.get(0),
        )?;
        Ok(date)
    }

    /// Advances the simulated date by one day (for trying out spaced repetition)
    pub fn advance_day(&self) -> StoreResult<NaiveDate> {
        let next_day = self
            .current_date()?
            .succ_opt()
            .ok_or_else(|| StoreError::Unavailable("simulated date is at the calendar end".to_string()))?;
        self.conn()?.execute(
            "UPDATE app_state SET value = ?1 WHERE key = 'current_date'",
            params![next_day],
        )?;
        Ok(next_day)
    }

    /// Creates a new deck and returns its id
    pub fn create_deck(&self, name: &str) -> StoreResult<SetId> {
        let conn = self.conn()?;
        conn.execute("INSERT INTO decks (name) VALUES (?1)", params![name])?;
        let id = conn.last_insert_rowid();
        debug!("Created deck '{}' ({})", name, id);
        Ok(id)
    }

    /// Adds a card to a deck and returns its id.
    ///
    /// A card with the same front in the same deck is not duplicated; the
    /// existing id is returned instead.
    pub fn add_card(&self, set_id: SetId, front: &str, back: &str) -> StoreResult<CardId> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO cards (deck_id, front, back) VALUES (?1, ?2, ?3)",
            params![set_id, front, back],
        )?;

        let id = conn.query_row(
            "SELECT id FROM cards WHERE deck_id = ?1 AND front = ?2",
            params![set_id, front],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Creates a deck holding all cards of `deck`
    pub fn import_deck(&self, deck: &Deck) -> StoreResult<SetId> {
        let set_id = self.create_deck(&deck.name)?;
        for card in &deck.cards {
            self.add_card(set_id, &card.front, &card.back)?;
        }
        info!("Imported deck '{}' with {} cards", deck.name, deck.cards.len());
        Ok(set_id)
    }

    /// Retrieves all deck ids and names
    pub fn list_decks(&self) -> StoreResult<Vec<(SetId, String)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, name FROM decks ORDER BY id")?;
        let decks = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>>>()?;
        Ok(decks)
    }

    /// Retrieves all cards of a deck, in insertion order
    pub fn cards_for_deck(&self, set_id: SetId) -> StoreResult<Vec<Card>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, deck_id, front, back FROM cards WHERE deck_id = ?1 ORDER BY id")?;
        let cards = stmt
            .query_map(params![set_id], |row| {
                Ok(Card {
                    id: row.get(0)?,
                    set_id: row.get(1)?,
                    front: row.get(2)?,
                    back: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>>>()?;
        Ok(cards)
    }

    /// Loads a deck with its card content, without ids or progress
    pub fn load_deck(&self, set_id: SetId) -> StoreResult<Deck> {
        let name: Option<String> = self
            .conn()?
            .query_row(
                "SELECT name FROM decks WHERE id = ?1",
                params![set_id],
                |row| row.get(0),
            )
            .optional()?;
        let name = name.ok_or(StoreError::DeckNotFound(set_id))?;

        let cards = self
            .cards_for_deck(set_id)?
            .iter()
            .map(Card::content)
            .collect::<Vec<NewCard>>();

        Ok(Deck { name, cards })
    }
}

impl ProgressStore for SqliteStore {
    fn get_progress(
        &self,
        learner: LearnerId,
        card: CardId,
    ) -> StoreResult<Option<SchedulingState>> {
        let conn = self.conn()?;
        let state = conn
            .query_row(
                "SELECT easiness_factor, interval_days, repetitions, next_review_date
                 FROM progress WHERE learner_id = ?1 AND card_id = ?2",
                params![learner, card],
                |row| state_from_row(row, 0),
            )
            .optional()?;
        Ok(state)
    }

    fn upsert_progress(
        &self,
        learner: LearnerId,
        card: CardId,
        state: &SchedulingState,
    ) -> StoreResult<()> {
        let conn = self.conn()?;
        let known: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM cards WHERE id = ?1)",
            params![card],
            |row| row.get(0),
        )?;
        if !known {
            return Err(StoreError::CardNotFound(card));
        }

        conn.execute(
            "INSERT INTO progress
                (learner_id, card_id, easiness_factor, interval_days, repetitions, next_review_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(learner_id, card_id) DO UPDATE SET
                easiness_factor = excluded.easiness_factor,
                interval_days = excluded.interval_days,
                repetitions = excluded.repetitions,
                next_review_date = excluded.next_review_date",
            params![
                learner,
                card,
                state.easiness_factor,
                state.interval_days,
                state.repetitions,
                state.next_review_date
            ],
        )?;
        Ok(())
    }

    fn list_due(
        &self,
        learner: LearnerId,
        set_id: Option<SetId>,
        today: NaiveDate,
        limit: usize,
    ) -> StoreResult<Vec<(Card, SchedulingState)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT c.id, c.deck_id, c.front, c.back,
                    COALESCE(p.easiness_factor, 2.5),
                    COALESCE(p.interval_days, 1),
                    COALESCE(p.repetitions, 0),
                    COALESCE(p.next_review_date, ?3) AS due
             FROM cards c
             LEFT JOIN progress p ON p.card_id = c.id AND p.learner_id = ?1
             WHERE (?2 IS NULL OR c.deck_id = ?2) AND COALESCE(p.next_review_date, ?3) <= ?3
             ORDER BY due ASC, c.id ASC
             LIMIT ?4",
        )?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let due = stmt
            .query_map(params![learner, set_id, today, limit], |row| {
                Ok((
                    Card {
                        id: row.get(0)?,
                        set_id: row.get(1)?,
                        front: row.get(2)?,
                        back: row.get(3)?,
                    },
                    state_from_row(row, 4)?,
                ))
            })?
            .collect::<Result<Vec<_>>>()?;
        Ok(due)
    }

    fn aggregate(
        &self,
        learner: LearnerId,
        today: NaiveDate,
        learned_threshold: u32,
    ) -> StoreResult<ReviewStats> {
        let conn = self.conn()?;
        let total_cards: i64 = conn.query_row("SELECT COUNT(*) FROM cards", [], |row| row.get(0))?;

        let (rated, due_rated, learned, average_ef): (i64, i64, i64, Option<f64>) = conn
            .query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(CASE WHEN next_review_date <= ?2 THEN 1 ELSE 0 END), 0),
                        COALESCE(SUM(CASE WHEN repetitions >= ?3 THEN 1 ELSE 0 END), 0),
                        AVG(easiness_factor)
                 FROM progress WHERE learner_id = ?1",
                params![learner, today, learned_threshold],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;

        let total_cards = total_cards as usize;
        Ok(ReviewStats {
            total_cards,
            cards_due_today: due_rated as usize + total_cards.saturating_sub(rated as usize),
            cards_learned: learned as usize,
            average_ef: average_ef.unwrap_or(ReviewStats::default().average_ef),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn seeded() -> (SqliteStore, SetId, Vec<CardId>) {
        let store = SqliteStore::open_in_memory().unwrap();
        let set_id = store.create_deck("Polish Vocabulary").unwrap();
        let ids = ["cześć", "dziękuję", "proszę"]
            .iter()
            .map(|front| store.add_card(set_id, front, "meaning").unwrap())
            .collect();
        (store, set_id, ids)
    }

    fn state(ef: f64, repetitions: u32, next: NaiveDate) -> SchedulingState {
        SchedulingState {
            easiness_factor: ef,
            interval_days: 1,
            repetitions,
            next_review_date: next,
        }
    }

    #[test]
    fn test_add_card_is_idempotent_per_front() {
        let (store, set_id, ids) = seeded();
        let again = store.add_card(set_id, "cześć", "hi").unwrap();
        assert_eq!(again, ids[0]);
        assert_eq!(store.cards_for_deck(set_id).unwrap().len(), 3);
    }

    #[test]
    fn test_upsert_keeps_one_row_per_learner_and_card() {
        let (store, _, ids) = seeded();
        store.upsert_progress(1, ids[0], &state(2.5, 1, date(2))).unwrap();
        store.upsert_progress(1, ids[0], &state(2.6, 2, date(8))).unwrap();

        let stored = store.get_progress(1, ids[0]).unwrap().unwrap();
        assert_eq!(stored.repetitions, 2);
        assert_eq!(stored.next_review_date, date(8));
        assert!(store.get_progress(2, ids[0]).unwrap().is_none());

        let rows: i64 = store
            .conn()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM progress", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_upsert_unknown_card() {
        let (store, _, _) = seeded();
        let result = store.upsert_progress(1, 999, &state(2.5, 0, date(1)));
        assert!(matches!(result, Err(StoreError::CardNotFound(999))));
    }

    #[test]
    fn test_list_due_orders_by_date_then_id() {
        let (store, set_id, ids) = seeded();
        store.upsert_progress(1, ids[0], &state(2.5, 1, date(5))).unwrap();
        store.upsert_progress(1, ids[1], &state(2.5, 1, date(1))).unwrap();
        store.upsert_progress(1, ids[2], &state(2.5, 1, date(20))).unwrap();

        let due = store.list_due(1, Some(set_id), date(10), 50).unwrap();
        let due_ids: Vec<CardId> = due.iter().map(|(card, _)| card.id).collect();
        assert_eq!(due_ids, vec![ids[1], ids[0]]);

        // another learner has rated nothing, so every card is due today
        let fresh = store.list_due(2, None, date(10), 50).unwrap();
        assert_eq!(fresh.len(), 3);
        assert!(fresh.iter().all(|(_, s)| s.next_review_date == date(10)));
        assert_eq!(store.list_due(2, None, date(10), 2).unwrap().len(), 2);
    }

    #[test]
    fn test_list_due_filters_by_set() {
        let (store, _, _) = seeded();
        let other = store.create_deck("Spanish").unwrap();
        let hola = store.add_card(other, "hola", "hello").unwrap();

        let due = store.list_due(1, Some(other), date(1), 50).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].0.id, hola);
    }

    #[test]
    fn test_aggregate() {
        let (store, set_id, ids) = seeded();
        let extra = store.add_card(set_id, "tak", "yes").unwrap();
        store.add_card(set_id, "nie", "no").unwrap();
        store.upsert_progress(1, ids[0], &state(2.0, 0, date(1))).unwrap();
        store.upsert_progress(1, ids[1], &state(2.5, 2, date(20))).unwrap();
        store.upsert_progress(1, extra, &state(3.0, 4, date(30))).unwrap();

        let stats = store.aggregate(1, date(10), 2).unwrap();
        assert_eq!(stats.total_cards, 5);
        assert!((stats.average_ef - 2.5).abs() < 1e-9);
        assert_eq!(stats.cards_learned, 2);
        assert_eq!(stats.cards_due_today, 3);

        let empty = store.aggregate(7, date(10), 2).unwrap();
        assert_eq!(empty.average_ef, 2.5);
        assert_eq!(empty.cards_due_today, 5);
    }

    #[test]
    fn test_advance_day() {
        let store = SqliteStore::open_in_memory().unwrap();
        let today = store.current_date().unwrap();
        let tomorrow = store.advance_day().unwrap();
        assert_eq!(tomorrow, today + chrono::Duration::days(1));
        assert_eq!(store.current_date().unwrap(), tomorrow);
    }

    #[test]
    fn test_import_and_load_deck() {
        let store = SqliteStore::open_in_memory().unwrap();
        let deck = Deck {
            name: "Colors".to_string(),
            cards: vec![
                NewCard {
                    front: "czerwony".to_string(),
                    back: "red".to_string(),
                },
                NewCard {
                    front: "zielony".to_string(),
                    back: "green".to_string(),
                },
            ],
        };

        let set_id = store.import_deck(&deck).unwrap();
        let loaded = store.load_deck(set_id).unwrap();
        assert_eq!(loaded.name, "Colors");
        assert_eq!(loaded.cards, deck.cards);
        assert_eq!(store.list_decks().unwrap(), vec![(set_id, "Colors".to_string())]);
    }

    #[test]
    fn test_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.sqlite3");

        let card = {
            let store = SqliteStore::open(&path).unwrap();
            let set_id = store.create_deck("Persisted").unwrap();
            let card = store.add_card(set_id, "front", "back").unwrap();
            store.upsert_progress(1, card, &state(2.2, 3, date(4))).unwrap();
            card
        };

        let reopened = SqliteStore::open(&path).unwrap();
        let stored = reopened.get_progress(1, card).unwrap().unwrap();
        assert_eq!(stored.repetitions, 3);
        assert_eq!(stored.next_review_date, date(4));
    }
}
