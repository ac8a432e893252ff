//! Study session management for spaced repetition practice.
//! Handles multi-round card review driven by the review scheduler.

use super::{Card, StudyCard};
use crate::database::store::{CardStore, StoreError};
use crate::scheduler::{self, DifficultyBucket, InvalidQuality, PASSING_QUALITY, ReviewState};
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GradeError {
    #[error(transparent)]
    Quality(#[from] InvalidQuality),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Manages a study session with multiple review rounds.
/// Cards graded below the passing threshold are repeated in later rounds.
pub struct StudySession {
    pub deck_name: String,
    pub all_cards: Vec<(i64, StudyCard, ReviewState)>,
    pub current_round_cards: Vec<usize>,
    pub current_index: usize,
    pub show_back: bool,
    pub store: Arc<Mutex<CardStore>>,
    pub round_number: usize,
    pub last_difficulty: Option<DifficultyBucket>,
}

impl StudySession {
    /// Creates a new session from the cards that are due for review.
    pub fn new_from_due_cards(
        deck_name: String,
        cards: Vec<(i64, Card, ReviewState)>,
        store: Arc<Mutex<CardStore>>,
    ) -> Self {
        let study_cards: Vec<_> = cards
            .into_iter()
            .map(|(id, card, state)| (id, StudyCard::new(card), state))
            .collect();

        let indices: Vec<usize> = (0..study_cards.len()).collect();

        Self {
            deck_name,
            all_cards: study_cards,
            current_round_cards: indices,
            current_index: 0,
            show_back: false,
            store,
            round_number: 1,
            last_difficulty: None,
        }
    }

    pub fn current_card(&self) -> Option<&StudyCard> {
        self.current_round_cards
            .get(self.current_index)
            .and_then(|&idx| self.all_cards.get(idx).map(|(_, card, _)| card))
    }

    pub fn toggle_back(&mut self) {
        self.show_back = !self.show_back;
    }

    pub fn next_card(&mut self) {
        if self.current_index < self.current_round_cards.len() - 1 {
            self.current_index += 1;
            self.show_back = false;
        } else {
            self.start_next_round();
        }
    }

    /// Starts a new round with the cards that weren't recalled. If every card
    /// passed, the session is complete.
    fn start_next_round(&mut self) {
        let failed_indices: Vec<usize> = self
            .current_round_cards
            .iter()
            .copied()
            .filter(|&idx| {
                self.all_cards
                    .get(idx)
                    .map(|(_, card, _)| !card.is_recalled)
                    .unwrap_or(false)
            })
            .collect();

        if !failed_indices.is_empty() {
            self.current_round_cards = failed_indices;
            self.current_index = 0;
            self.show_back = false;
            self.round_number += 1;

            // These cards come around again, so clear their session flag
            for &idx in &self.current_round_cards {
                if let Some((_, card, _)) = self.all_cards.get_mut(idx) {
                    card.is_recalled = false;
                }
            }
        }
    }

    /// Grades the current card: runs the scheduler at the store's simulated
    /// date, persists the new state, then updates the in-memory copy.
    ///
    /// Nothing is applied if scheduling or the store write fails, so a failed
    /// grade leaves the card exactly as it was.
    pub fn grade_current_card(&mut self, quality: u8) -> Result<(), GradeError> {
        let Some(&actual_idx) = self.current_round_cards.get(self.current_index) else {
            return Ok(());
        };
        let Some((card_id, card, state)) = self.all_cards.get_mut(actual_idx) else {
            return Ok(());
        };

        let store = self.store.lock().unwrap();
        let now = store.current_date()?;
        let new_state = scheduler::schedule(state, quality, now)?;
        store.update_review_state(*card_id, &new_state)?;
        drop(store);

        if quality >= PASSING_QUALITY {
            card.mark_recalled(now);
        } else {
            card.is_recalled = false; // repeated in the next round
        }

        self.last_difficulty = Some(new_state.difficulty);
        *state = new_state;
        Ok(())
    }

    pub fn recalled_count(&self) -> usize {
        self.current_round_cards
            .iter()
            .filter(|&&idx| {
                self.all_cards
                    .get(idx)
                    .map(|(_, card, _)| card.is_recalled)
                    .unwrap_or(false)
            })
            .count()
    }

    pub fn total_count(&self) -> usize {
        self.current_round_cards.len()
    }

    pub fn remaining_count(&self) -> usize {
        self.total_count() - self.recalled_count()
    }

    /// True when every card in the current round has been recalled.
    pub fn is_completed(&self) -> bool {
        self.current_round_cards.is_empty() || self.recalled_count() == self.total_count()
    }

    pub fn phase_message(&self) -> String {
        if self.round_number == 1 {
            format!("Round {}: {} cards", self.round_number, self.total_count())
        } else {
            format!(
                "Round {} (Review): {} cards to retry",
                self.round_number,
                self.total_count()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with_cards(fronts: &[(&str, &str)]) -> StudySession {
        let store = CardStore::open_in_memory().unwrap();
        store.add_deck("Fundamentals").unwrap();
        for (front, back) in fronts {
            store.add_card("Fundamentals", front, back).unwrap();
        }
        let due = store.due_cards("Fundamentals").unwrap();
        StudySession::new_from_due_cards(
            "Fundamentals".to_string(),
            due,
            Arc::new(Mutex::new(store)),
        )
    }

    #[test]
    fn test_passing_grade_completes_single_card_session() {
        let mut session = session_with_cards(&[("Normal adult pulse", "60-100 bpm")]);
        assert!(!session.is_completed());

        session.grade_current_card(4).unwrap();
        assert!(session.is_completed());
        assert_eq!(session.recalled_count(), 1);
        assert_eq!(session.last_difficulty, Some(DifficultyBucket::Medium));

        // Persisted: no longer due today
        let store = session.store.lock().unwrap();
        assert!(store.due_cards("Fundamentals").unwrap().is_empty());
    }

    #[test]
    fn test_failed_card_comes_back_in_next_round() {
        let mut session = session_with_cards(&[
            ("Normal adult pulse", "60-100 bpm"),
            ("Normal body temperature", "36.5-37.5 C"),
        ]);

        session.grade_current_card(2).unwrap();
        session.next_card();
        session.grade_current_card(5).unwrap();
        session.next_card();

        // Second round holds only the failed card
        assert_eq!(session.round_number, 2);
        assert_eq!(session.total_count(), 1);
        assert_eq!(session.current_card().unwrap().card.front, "Normal adult pulse");
        assert!(!session.is_completed());

        session.grade_current_card(4).unwrap();
        assert!(session.is_completed());
    }

    #[test]
    fn test_failed_grade_still_persists_scheduler_result() {
        let mut session = session_with_cards(&[("a", "1")]);
        session.grade_current_card(1).unwrap();

        assert_eq!(session.all_cards[0].2.repetition_count, 0);
        assert_eq!(session.all_cards[0].2.interval_days, 1);
        assert_eq!(session.last_difficulty, Some(DifficultyBucket::Hard));

        // Due again after one simulated day
        let store = session.store.lock().unwrap();
        assert!(store.due_cards("Fundamentals").unwrap().is_empty());
        store.advance_day().unwrap();
        assert_eq!(store.due_cards("Fundamentals").unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_quality_changes_nothing() {
        let mut session = session_with_cards(&[("a", "1")]);
        let before = session.all_cards[0].2.clone();

        let err = session.grade_current_card(6).unwrap_err();
        assert!(matches!(err, GradeError::Quality(InvalidQuality(6))));
        assert_eq!(session.all_cards[0].2, before);
        assert!(!session.all_cards[0].1.is_recalled);

        let store = session.store.lock().unwrap();
        assert_eq!(store.due_cards("Fundamentals").unwrap().len(), 1);
    }

    #[test]
    fn test_toggle_and_navigation() {
        let mut session = session_with_cards(&[("a", "1"), ("b", "2")]);
        assert!(!session.show_back);
        session.toggle_back();
        assert!(session.show_back);

        session.grade_current_card(4).unwrap();
        session.next_card();
        assert!(!session.show_back);
        assert_eq!(session.current_card().unwrap().card.front, "b");
    }
}
