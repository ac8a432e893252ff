//! JSON import/export module for card decks.
//! Provides functionality to save and load Deck structures to/from JSON files.

use crate::models::Deck;
use std::fs::File;
use std::io::{Read, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid deck JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Exports a deck to a JSON file at the specified path.
pub fn export_json_to_path(deck: &Deck, path: &str) -> Result<(), ExportError> {
    let json_string = serde_json::to_string_pretty(deck)?;
    let mut file = File::create(path)?;
    file.write_all(json_string.as_bytes())?;
    Ok(())
}

/// Imports a deck from a JSON file.
/// Fails if the file doesn't exist or contains invalid JSON.
pub fn import_json(filename: &str) -> Result<Deck, ExportError> {
    let mut file = File::open(filename)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let deck: Deck = serde_json::from_str(&contents)?;

    log::info!("deck '{}' imported from '{}'", deck.name, filename);
    Ok(deck)
}
