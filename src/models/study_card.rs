//! Wrapper for cards that tracks recall within a single study session.
use super::Card;
use chrono::{DateTime, Utc};

#[derive(Clone)]
pub struct StudyCard {
    pub card: Card,
    pub is_recalled: bool,
    pub last_graded_at: Option<DateTime<Utc>>,
}

impl StudyCard {
    pub fn new(card: Card) -> Self {
        Self {
            card,
            is_recalled: false,
            last_graded_at: None,
        }
    }

    pub fn mark_recalled(&mut self, now: DateTime<Utc>) {
        self.is_recalled = true;
        self.last_graded_at = Some(now);
    }
}
