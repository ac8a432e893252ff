//! Card is a pair <front, back>. Only text is used on either side
use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize, Deserialize)]
pub struct Card {
    pub front: String,
    pub back: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_creation() {
        let card = Card {
            front: "Normal adult respiratory rate".to_string(),
            back: "12-20 breaths per minute".to_string(),
        };

        assert_eq!(card.front, "Normal adult respiratory rate");
        assert_eq!(card.back, "12-20 breaths per minute");
    }

    #[test]
    fn test_card_clone() {
        let card1 = Card {
            front: "Hypokalemia threshold".to_string(),
            back: "Serum potassium below 3.5 mEq/L".to_string(),
        };

        let card2 = card1.clone();
        assert_eq!(card1.front, card2.front);
        assert_eq!(card1.back, card2.back);
    }
}
