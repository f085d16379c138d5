//! Review queue configuration.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::FileError;

fn default_page_size() -> usize {
    50
}

fn default_learned_threshold() -> u32 {
    2
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum number of cards handed to one session
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Repetitions at which a card counts as learned
    #[serde(default = "default_learned_threshold")]
    pub learned_threshold: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            learned_threshold: default_learned_threshold(),
        }
    }
}

impl QueueConfig {
    /// Reads a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FileError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}
