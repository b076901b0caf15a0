// Persistable tokenizer state.
//
// The oracle handle is a live resource and cannot be saved. What is saved is
// its language tag, so the oracle can be rebuilt on restore, and the caches
// that make re-tokenizing a corpus cheap.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::morphology::traits::Analysis;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenizerState {
    /// Language tag of the oracle the caches were built with
    pub language: String,
    pub error_threshold: f64,
    /// Lowercase word -> stem
    pub stems: HashMap<String, String>,
    /// Words whose stem is the word itself because the oracle could not
    /// resolve them; each occurrence counts as a spelling error
    #[serde(default)]
    pub unresolved: HashSet<String>,
    /// Lowercase word -> oracle readings
    pub analyses: HashMap<String, Vec<Analysis>>,
}

impl TokenizerState {
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string(self).context("Failed to serialize tokenizer state")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write tokenizer state to {}", path.display()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tokenizer state from {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse tokenizer state {}", path.display()))
    }
}
