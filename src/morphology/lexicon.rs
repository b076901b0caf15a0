// Lexicon-backed morphology oracle.
//
// A plain dictionary of inflected forms to their readings, plus a table of
// known misspellings to their corrections. It stands in for a full
// morphological analyzer when one is not available, and is what the CLI
// loads from disk.
//
// File format (JSON):
//
//   {
//     "language": "fi",
//     "entries": { "koirat": [{ "baseform": "koira", "class": "nimisana" }] },
//     "suggestions": { "koirta": ["koirat"] }
//   }

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{Analysis, MorphologyOracle};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LexiconOracle {
    language: String,
    #[serde(default)]
    entries: HashMap<String, Vec<Analysis>>,
    #[serde(default)]
    suggestions: HashMap<String, Vec<String>>,
}

impl LexiconOracle {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            ..Default::default()
        }
    }

    /// Load a lexicon from a JSON file. Keys are lowercased on load so that
    /// lookups are case-insensitive.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read lexicon from {}", path.display()))?;
        let lexicon: LexiconOracle = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse lexicon {}", path.display()))?;
        let lexicon = lexicon.normalized();

        debug!(
            language = %lexicon.language,
            entries = lexicon.entries.len(),
            suggestions = lexicon.suggestions.len(),
            "Loaded lexicon from {}",
            path.display()
        );

        Ok(lexicon)
    }

    /// Add a reading for an inflected form.
    pub fn with_entry(mut self, word: &str, analysis: Analysis) -> Self {
        self.entries
            .entry(word.to_lowercase())
            .or_default()
            .push(analysis);
        self
    }

    /// Add a ranked list of corrections for a misspelled form.
    pub fn with_suggestions(mut self, word: &str, candidates: &[&str]) -> Self {
        self.suggestions.insert(
            word.to_lowercase(),
            candidates.iter().map(|c| c.to_string()).collect(),
        );
        self
    }

    fn normalized(self) -> Self {
        let mut entries: HashMap<String, Vec<Analysis>> = HashMap::new();
        for (word, analyses) in self.entries {
            entries
                .entry(word.to_lowercase())
                .or_default()
                .extend(analyses);
        }
        let suggestions = self
            .suggestions
            .into_iter()
            .map(|(word, candidates)| (word.to_lowercase(), candidates))
            .collect();
        Self {
            language: self.language,
            entries,
            suggestions,
        }
    }
}

impl MorphologyOracle for LexiconOracle {
    fn language(&self) -> &str {
        &self.language
    }

    fn analyze(&self, word: &str) -> Result<Vec<Analysis>> {
        Ok(self
            .entries
            .get(&word.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }

    fn suggest(&self, word: &str) -> Result<Vec<String>> {
        Ok(self
            .suggestions
            .get(&word.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }
}
