//! Card is a pair <front, back> owned by a set. The engine never mutates cards.
use serde::{Deserialize, Serialize};

pub type CardId = i64;
pub type SetId = i64;
pub type LearnerId = i64;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub set_id: SetId,
    pub front: String,
    pub back: String,
}

/// Card content before the store has assigned it an id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCard {
    pub front: String,
    pub back: String,
}

impl Card {
    pub fn content(&self) -> NewCard {
        NewCard {
            front: self.front.clone(),
            back: self.back.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_content() {
        let card = Card {
            id: 3,
            set_id: 1,
            front: "cześć".to_string(),
            back: "hello".to_string(),
        };

        let content = card.content();
        assert_eq!(content.front, "cześć");
        assert_eq!(content.back, "hello");
    }

    #[test]
    fn test_card_serializes_ids() {
        let card = Card {
            id: 3,
            set_id: 1,
            front: "proszę".to_string(),
            back: "please".to_string(),
        };

        let json = serde_json::to_value(&card).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["set_id"], 1);
    }
}
