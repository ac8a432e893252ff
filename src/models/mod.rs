pub mod card;
pub mod deck;
pub mod deck_set;
pub mod study_card;
pub mod study_session;

pub use card::Card;
pub use deck::Deck;
pub use deck_set::DeckSet;
pub use study_card::StudyCard;
pub use study_session::StudySession;
