//! Deck is a named set of cards, the unit of import and export
use super::NewCard;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Deck {
    pub name: String,
    pub cards: Vec<NewCard>,
}
