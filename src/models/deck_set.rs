//! Container for all available decks
use super::Deck;

#[derive(Clone, Default)]
pub struct DeckSet {
    pub decks: Vec<Deck>,
}
