pub mod database;
pub mod export;
pub mod models;
pub mod scheduler;

pub use models::{Card, Deck, DeckSet, StudyCard, StudySession};
