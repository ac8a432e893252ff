//! Spaced repetition review scheduling (adapted SuperMemo 2).
//!
//! The scheduler computes the next review date for a card from a single
//! quality rating of the just-completed recall attempt:
//! - Each card carries an easiness factor (EF) that adjusts with performance
//!   and never falls below 1.3
//! - Quality 1-2 fails the review: the interval resets to 1 day and the
//!   repetition streak restarts
//! - Quality 3-5 passes: intervals grow 1 day → 6 days → previous interval
//!   multiplied by the EF
//!
//! `schedule` is a pure function: "now" is an explicit argument, there is no
//! I/O, and the caller owns persistence of the returned state.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lower bound on the easiness factor.
pub const MIN_EASINESS: f64 = 1.3;

/// Easiness factor assigned to a card that has never been reviewed.
pub const INITIAL_EASINESS: f64 = 2.5;

/// Lowest quality rating that counts as a successful recall.
pub const PASSING_QUALITY: u8 = 3;

/// Raised when a quality rating falls outside the 1-5 scale.
/// Ratings are never clamped; the caller must re-prompt for a valid one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("quality rating {0} is out of range (expected 1-5)")]
pub struct InvalidQuality(pub u8);

/// Coarse recall-difficulty label derived from the latest quality rating.
/// Advisory only; the interval math never reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyBucket {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl DifficultyBucket {
    fn from_quality(quality: u8) -> Self {
        match quality {
            1 | 2 => DifficultyBucket::Hard,
            3 | 4 => DifficultyBucket::Medium,
            _ => DifficultyBucket::Easy,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DifficultyBucket::Easy => "easy",
            DifficultyBucket::Medium => "medium",
            DifficultyBucket::Hard => "hard",
        }
    }
}

/// Scheduling fields of a single card.
///
/// Invariants: `easiness_factor >= 1.3`, `interval_days >= 1`. A card is due
/// once `now >= next_review_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewState {
    pub easiness_factor: f64,
    pub interval_days: i64,
    pub repetition_count: i64,
    pub difficulty: DifficultyBucket,
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub next_review_at: DateTime<Utc>,
}

impl ReviewState {
    /// State for a freshly created card: due immediately, never reviewed.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            easiness_factor: INITIAL_EASINESS,
            interval_days: 1,
            repetition_count: 0,
            difficulty: DifficultyBucket::Medium,
            last_reviewed_at: None,
            next_review_at: now,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.next_review_at
    }
}

/// Computes the post-review scheduling state for one card.
///
/// `quality` rates the recall attempt from 1 (total failure) to 5 (perfect,
/// effortless); out-of-range values fail with [`InvalidQuality`]. The input
/// state is not modified; callers persist the returned state themselves.
pub fn schedule(
    state: &ReviewState,
    quality: u8,
    now: DateTime<Utc>,
) -> Result<ReviewState, InvalidQuality> {
    if !(1..=5).contains(&quality) {
        return Err(InvalidQuality(quality));
    }

    // EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)), floored at 1.3.
    // Updated on every review, failing ones included.
    let q = quality as f64;
    let new_easiness =
        (state.easiness_factor + 0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02)).max(MIN_EASINESS);

    let (new_interval, new_repetitions) = if quality < PASSING_QUALITY {
        // Failed recall: back to tomorrow, streak restarts
        (1, 0)
    } else {
        let interval = match state.repetition_count {
            0 => 1,
            1 => 6,
            _ => (state.interval_days as f64 * new_easiness).round() as i64,
        };
        (interval, state.repetition_count + 1)
    };

    Ok(ReviewState {
        easiness_factor: new_easiness,
        interval_days: new_interval,
        repetition_count: new_repetitions,
        difficulty: DifficultyBucket::from_quality(quality),
        last_reviewed_at: Some(now),
        next_review_at: now + Duration::days(new_interval),
    })
}
