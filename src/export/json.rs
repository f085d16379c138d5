//! JSON import/export module for decks.
//! Provides functionality to save and load Deck structures to/from JSON files.

use crate::error::FileError;
use crate::models::Deck;
use log::info;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

/// Exports a deck to a JSON file at the specified path.
pub fn export_json_to_path(deck: &Deck, path: impl AsRef<Path>) -> Result<(), FileError> {
    let path = path.as_ref();
    let json_string = serde_json::to_string_pretty(deck)?;
    let mut file = File::create(path)?;
    file.write_all(json_string.as_bytes())?;
    info!("Deck '{}' exported to '{}'", deck.name, path.display());
    Ok(())
}

/// Imports a deck from a JSON file.
/// Returns an error if the file doesn't exist or contains invalid JSON.
pub fn import_json(path: impl AsRef<Path>) -> Result<Deck, FileError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let deck: Deck = serde_json::from_reader(BufReader::new(file))?;

    info!("Deck '{}' imported from '{}'", deck.name, path.display());
    Ok(deck)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewCard;
    use std::fs;

    fn create_test_deck() -> Deck {
        Deck {
            name: "Test Deck".to_string(),
            cards: vec![
                NewCard {
                    front: "hello".to_string(),
                    back: "cześć".to_string(),
                },
                NewCard {
                    front: "goodbye".to_string(),
                    back: "do widzenia".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_export_json_to_path() {
        let dir = tempfile::tempdir().unwrap();
        let test_file = dir.path().join("test_export.json");

        export_json_to_path(&create_test_deck(), &test_file).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&test_file).unwrap()).unwrap();
        assert_eq!(written["name"], "Test Deck");
        assert_eq!(written["cards"][1]["back"], "do widzenia");
    }

    #[test]
    fn test_import_json() {
        let json_content = r#"{
  "name": "Import Test Deck",
  "cards": [
    {
      "front": "test front",
      "back": "test back"
    }
  ]
}"#;

        let dir = tempfile::tempdir().unwrap();
        let test_file = dir.path().join("test_import.json");
        fs::write(&test_file, json_content).unwrap();

        let deck = import_json(&test_file).unwrap();
        assert_eq!(deck.name, "Import Test Deck");
        assert_eq!(deck.cards.len(), 1);
        assert_eq!(deck.cards[0].front, "test front");
        assert_eq!(deck.cards[0].back, "test back");
    }

    #[test]
    fn test_import_nonexistent_file() {
        let result = import_json("nonexistent_file_xyz123.json");
        assert!(matches!(result, Err(FileError::Io(_))));
    }

    #[test]
    fn test_import_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let test_file = dir.path().join("test_invalid.json");
        fs::write(&test_file, "{ this is not valid json }").unwrap();

        assert!(matches!(import_json(&test_file), Err(FileError::Json(_))));
    }
}
