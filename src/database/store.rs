//! SQLite persistence for decks, cards, and review scheduling state.
//!
//! `CardStore` owns the connection and is constructed explicitly (tests use
//! [`CardStore::open_in_memory`] for fresh state per test). It also keeps a
//! simulated current date in the `app_state` table so review intervals can be
//! exercised day by day without waiting on the wall clock; the scheduler
//! itself never reads this, it is handed in as the explicit "now".

use crate::models::{Card, Deck, DeckSet};
use crate::scheduler::{DifficultyBucket, INITIAL_EASINESS, ReviewState};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("corrupt timestamp in database: {0}")]
    CorruptTimestamp(i64),
    #[error("unknown difficulty label in database: {0}")]
    UnknownDifficulty(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Per-deck scheduling breakdown shown on the main screen.
///
/// A card counts as new until its first passing review, as mature once its
/// interval reaches 21 days, and as learning in between.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeckStats {
    pub total: usize,
    pub due: usize,
    pub new: usize,
    pub learning: usize,
    pub mature: usize,
}

const MATURE_INTERVAL_DAYS: i64 = 21;

pub struct CardStore {
    conn: Connection,
}

fn to_timestamp(date: DateTime<Utc>) -> i64 {
    date.timestamp()
}

fn from_timestamp(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0).ok_or(StoreError::CorruptTimestamp(secs))
}

impl CardStore {
    /// Opens (creating if necessary) the store at the given path.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Opens a fresh in-memory store; used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS decks (
                name TEXT PRIMARY KEY
            )",
            (),
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS cards (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                deck_name TEXT NOT NULL,
                front TEXT NOT NULL,
                back TEXT NOT NULL,
                FOREIGN KEY (deck_name) REFERENCES decks(name),
                UNIQUE(deck_name, front)
            )",
            (),
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS review_state (
                card_id INTEGER PRIMARY KEY,
                easiness_factor REAL NOT NULL DEFAULT 2.5,
                interval_days INTEGER NOT NULL DEFAULT 1,
                repetition_count INTEGER NOT NULL DEFAULT 0,
                difficulty TEXT NOT NULL DEFAULT 'medium',
                last_reviewed_at INTEGER,
                next_review_at INTEGER NOT NULL,
                FOREIGN KEY (card_id) REFERENCES cards(id) ON DELETE CASCADE
            )",
            (),
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS app_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            (),
        )?;

        // Simulated date starts at the wall clock on first run
        conn.execute(
            "INSERT OR IGNORE INTO app_state (key, value) VALUES ('current_date', ?1)",
            params![Utc::now().timestamp().to_string()],
        )?;

        Ok(Self { conn })
    }

    /// Current simulated date.
    pub fn current_date(&self) -> Result<DateTime<Utc>> {
        let value: String = self.conn.query_row(
            "SELECT value FROM app_state WHERE key = 'current_date'",
            [],
            |row| row.get(0),
        )?;
        let secs = value
            .parse::<i64>()
            .map_err(|_| StoreError::CorruptTimestamp(0))?;
        from_timestamp(secs)
    }

    /// Advances the simulated date by 24 hours.
    pub fn advance_day(&self) -> Result<DateTime<Utc>> {
        let next = self.current_date()? + Duration::days(1);
        self.conn.execute(
            "UPDATE app_state SET value = ?1 WHERE key = 'current_date'",
            params![to_timestamp(next).to_string()],
        )?;
        Ok(next)
    }

    pub fn add_deck(&self, name: &str) -> Result<()> {
        self.conn
            .execute("INSERT INTO decks (name) VALUES (?1)", params![name])?;
        log::info!("deck '{name}' created");
        Ok(())
    }

    pub fn deck_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT name FROM decks ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }

    /// Adds a card to a deck and seeds its review state as immediately due.
    ///
    /// Returns the card ID. A duplicate (same deck + front) is ignored and the
    /// existing ID is returned.
    pub fn add_card(&self, deck_name: &str, front: &str, back: &str) -> Result<i64> {
        self.conn.execute(
            "INSERT OR IGNORE INTO cards (deck_name, front, back) VALUES (?1, ?2, ?3)",
            params![deck_name, front, back],
        )?;

        let card_id: i64 = self.conn.query_row(
            "SELECT id FROM cards WHERE deck_name = ?1 AND front = ?2",
            params![deck_name, front],
            |row| row.get(0),
        )?;

        let now = self.current_date()?;
        self.conn.execute(
            "INSERT OR IGNORE INTO review_state
                (card_id, easiness_factor, interval_days, repetition_count, difficulty, next_review_at)
             VALUES (?1, ?2, 1, 0, 'medium', ?3)",
            params![card_id, INITIAL_EASINESS, to_timestamp(now)],
        )?;

        Ok(card_id)
    }

    /// All cards of a deck as (card_id, Card) pairs.
    pub fn cards_for_deck(&self, deck_name: &str) -> Result<Vec<(i64, Card)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, front, back FROM cards WHERE deck_name = ?1")?;

        let cards = stmt
            .query_map(params![deck_name], |row| {
                Ok((
                    row.get(0)?,
                    Card {
                        front: row.get(1)?,
                        back: row.get(2)?,
                    },
                ))
            })?
            .collect::<rusqlite::Result<Vec<(i64, Card)>>>()?;

        Ok(cards)
    }

    /// Writes a scheduler result back for one card.
    pub fn update_review_state(&self, card_id: i64, state: &ReviewState) -> Result<()> {
        self.conn.execute(
            "UPDATE review_state
             SET easiness_factor = ?1, interval_days = ?2, repetition_count = ?3,
                 difficulty = ?4, last_reviewed_at = ?5, next_review_at = ?6
             WHERE card_id = ?7",
            params![
                state.easiness_factor,
                state.interval_days,
                state.repetition_count,
                state.difficulty.label(),
                state.last_reviewed_at.map(to_timestamp),
                to_timestamp(state.next_review_at),
                card_id
            ],
        )?;
        Ok(())
    }

    /// Cards of a deck due at the simulated date, oldest due date first.
    pub fn due_cards(&self, deck_name: &str) -> Result<Vec<(i64, Card, ReviewState)>> {
        let now = to_timestamp(self.current_date()?);

        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.front, c.back, r.easiness_factor, r.interval_days,
                    r.repetition_count, r.difficulty, r.last_reviewed_at, r.next_review_at
             FROM cards c
             JOIN review_state r ON c.id = r.card_id
             WHERE c.deck_name = ?1 AND r.next_review_at <= ?2
             ORDER BY r.next_review_at ASC",
        )?;

        let rows = stmt
            .query_map(params![deck_name, now], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    Card {
                        front: row.get(1)?,
                        back: row.get(2)?,
                    },
                    row.get::<_, f64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, Option<i64>>(7)?,
                    row.get::<_, i64>(8)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut cards = Vec::with_capacity(rows.len());
        for (id, card, ef, interval, reps, difficulty, last, next) in rows {
            cards.push((
                id,
                card,
                ReviewState {
                    easiness_factor: ef,
                    interval_days: interval,
                    repetition_count: reps,
                    difficulty: parse_difficulty(&difficulty)?,
                    last_reviewed_at: last.map(from_timestamp).transpose()?,
                    next_review_at: from_timestamp(next)?,
                },
            ));
        }

        Ok(cards)
    }

    /// Scheduling breakdown for one deck.
    pub fn deck_stats(&self, deck_name: &str) -> Result<DeckStats> {
        let now = to_timestamp(self.current_date()?);

        let mut stmt = self.conn.prepare(
            "SELECT r.interval_days, r.repetition_count, r.next_review_at
             FROM cards c
             JOIN review_state r ON c.id = r.card_id
             WHERE c.deck_name = ?1",
        )?;

        let rows = stmt
            .query_map(params![deck_name], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stats = DeckStats::default();
        for (interval, repetitions, next_review) in rows {
            stats.total += 1;
            if next_review <= now {
                stats.due += 1;
            }
            if repetitions == 0 {
                stats.new += 1;
            } else if interval < MATURE_INTERVAL_DAYS {
                stats.learning += 1;
            } else {
                stats.mature += 1;
            }
        }

        Ok(stats)
    }

    /// Loads all decks with their cards into memory.
    ///
    /// Review state is not loaded here; it is fetched when a study session
    /// starts.
    pub fn load_all_decks(&self) -> Result<DeckSet> {
        let mut decks = Vec::new();

        for deck_name in self.deck_names()? {
            let cards = self
                .cards_for_deck(&deck_name)?
                .into_iter()
                .map(|(_, card)| card)
                .collect();
            decks.push(Deck {
                name: deck_name,
                cards,
            });
        }

        Ok(DeckSet { decks })
    }

    /// True when no decks exist yet (first run).
    pub fn is_empty(&self) -> Result<bool> {
        let any: Option<String> = self
            .conn
            .query_row("SELECT name FROM decks LIMIT 1", [], |row| row.get(0))
            .optional()?;
        Ok(any.is_none())
    }
}

fn parse_difficulty(label: &str) -> Result<DifficultyBucket> {
    match label {
        "easy" => Ok(DifficultyBucket::Easy),
        "medium" => Ok(DifficultyBucket::Medium),
        "hard" => Ok(DifficultyBucket::Hard),
        other => Err(StoreError::UnknownDifficulty(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::schedule;

    fn store_with_deck() -> CardStore {
        let store = CardStore::open_in_memory().unwrap();
        store.add_deck("Pharmacology").unwrap();
        store
    }

    #[test]
    fn test_new_cards_are_immediately_due() {
        let store = store_with_deck();
        store
            .add_card("Pharmacology", "Warfarin antidote", "Vitamin K")
            .unwrap();
        store
            .add_card("Pharmacology", "Heparin antidote", "Protamine sulfate")
            .unwrap();

        let due = store.due_cards("Pharmacology").unwrap();
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].2.repetition_count, 0);
        assert!(due[0].2.last_reviewed_at.is_none());
    }

    #[test]
    fn test_duplicate_card_is_ignored() {
        let store = store_with_deck();
        let first = store
            .add_card("Pharmacology", "Warfarin antidote", "Vitamin K")
            .unwrap();
        let second = store
            .add_card("Pharmacology", "Warfarin antidote", "Vitamin K")
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(store.cards_for_deck("Pharmacology").unwrap().len(), 1);
    }

    #[test]
    fn test_reviewed_card_leaves_due_set_until_interval_passes() {
        let store = store_with_deck();
        let id = store
            .add_card("Pharmacology", "Digoxin antidote", "Digoxin immune fab")
            .unwrap();

        let (_, _, state) = store.due_cards("Pharmacology").unwrap().remove(0);
        let now = store.current_date().unwrap();
        let next = schedule(&state, 4, now).unwrap();
        store.update_review_state(id, &next).unwrap();

        assert!(store.due_cards("Pharmacology").unwrap().is_empty());

        // First pass schedules one day out
        store.advance_day().unwrap();
        let due = store.due_cards("Pharmacology").unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].2.repetition_count, 1);
    }

    #[test]
    fn test_due_cards_ordered_by_next_review_date() {
        let store = store_with_deck();
        let early = store.add_card("Pharmacology", "a", "1").unwrap();
        let late = store.add_card("Pharmacology", "b", "2").unwrap();

        let now = store.current_date().unwrap();
        let mut state = ReviewState::new(now);
        state.next_review_at = now - Duration::days(3);
        store.update_review_state(late, &state).unwrap();

        let due = store.due_cards("Pharmacology").unwrap();
        assert_eq!(due[0].0, late);
        assert_eq!(due[1].0, early);
    }

    #[test]
    fn test_round_trip_preserves_state() {
        let store = store_with_deck();
        let id = store.add_card("Pharmacology", "a", "1").unwrap();

        let now = store.current_date().unwrap();
        let graded = schedule(&ReviewState::new(now), 2, now).unwrap();
        store.update_review_state(id, &graded).unwrap();

        store.advance_day().unwrap();
        let (_, _, loaded) = store.due_cards("Pharmacology").unwrap().remove(0);
        assert_eq!(loaded.interval_days, graded.interval_days);
        assert_eq!(loaded.repetition_count, 0);
        assert_eq!(loaded.difficulty, DifficultyBucket::Hard);
        assert_eq!(loaded.last_reviewed_at, Some(now));
        assert!((loaded.easiness_factor - graded.easiness_factor).abs() < 1e-9);
    }

    #[test]
    fn test_deck_stats() {
        let store = store_with_deck();
        let learning = store.add_card("Pharmacology", "a", "1").unwrap();
        let mature = store.add_card("Pharmacology", "b", "2").unwrap();
        store.add_card("Pharmacology", "c", "3").unwrap();

        let now = store.current_date().unwrap();
        let mut state = ReviewState::new(now);
        state.repetition_count = 2;
        state.interval_days = 6;
        state.next_review_at = now + Duration::days(6);
        store.update_review_state(learning, &state).unwrap();

        state.repetition_count = 5;
        state.interval_days = 40;
        state.next_review_at = now + Duration::days(40);
        store.update_review_state(mature, &state).unwrap();

        let stats = store.deck_stats("Pharmacology").unwrap();
        assert_eq!(
            stats,
            DeckStats {
                total: 3,
                due: 1,
                new: 1,
                learning: 1,
                mature: 1,
            }
        );
    }

    #[test]
    fn test_advance_day_moves_simulated_date() {
        let store = store_with_deck();
        let before = store.current_date().unwrap();
        let after = store.advance_day().unwrap();
        assert_eq!(after - before, Duration::days(1));
        assert_eq!(store.current_date().unwrap(), after);
    }

    #[test]
    fn test_load_all_decks() {
        let store = store_with_deck();
        store.add_deck("Fundamentals").unwrap();
        store.add_card("Pharmacology", "a", "1").unwrap();

        let deck_set = store.load_all_decks().unwrap();
        assert_eq!(deck_set.decks.len(), 2);
        let pharm = deck_set
            .decks
            .iter()
            .find(|d| d.name == "Pharmacology")
            .unwrap();
        assert_eq!(pharm.cards.len(), 1);
        assert!(!store.is_empty().unwrap());
    }
}
