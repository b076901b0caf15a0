use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::tokenizer::DEFAULT_ERROR_THRESHOLD;

/// Default number of topics of the trained model.
pub const DEFAULT_NUMBER_TOPICS: usize = 50;

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. Every value
/// has a default, so `Config::load` only fails on malformed numbers.
#[derive(Debug, Clone)]
pub struct Config {
    /// Language tag of the morphology oracle (ANALYTICA_LANG, default "fi")
    pub language: String,
    /// Number of topics the model was trained with (ANALYTICA_NUMBER_TOPICS)
    pub number_topics: usize,
    /// Root of trained artifacts (ANALYTICA_INSTANCE_DIR)
    pub instance_dir: PathBuf,
    /// Trained topic model JSON (ANALYTICA_MODEL_PATH)
    pub model_path: PathBuf,
    /// Lexicon JSON for the morphology oracle (ANALYTICA_LEXICON_PATH)
    pub lexicon_path: PathBuf,
    /// Saved tokenizer caches (ANALYTICA_TOKENIZER_STATE), optional
    pub tokenizer_state_path: Option<PathBuf>,
    /// Share of unresolved words tolerated per paragraph (ANALYTICA_ERROR_THRESHOLD)
    pub error_threshold: f64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let language = env::var("ANALYTICA_LANG").unwrap_or_else(|_| "fi".to_string());

        let number_topics = match env::var("ANALYTICA_NUMBER_TOPICS") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("ANALYTICA_NUMBER_TOPICS is not a number: {raw:?}"))?,
            Err(_) => DEFAULT_NUMBER_TOPICS,
        };

        let error_threshold = match env::var("ANALYTICA_ERROR_THRESHOLD") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("ANALYTICA_ERROR_THRESHOLD is not a number: {raw:?}"))?,
            Err(_) => DEFAULT_ERROR_THRESHOLD,
        };

        let instance_dir = env::var("ANALYTICA_INSTANCE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_instance_dir());

        let model_path = env::var("ANALYTICA_MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                instance_dir
                    .join("lda")
                    .join(number_topics.to_string())
                    .join("model.json")
            });

        let lexicon_path = env::var("ANALYTICA_LEXICON_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| instance_dir.join(format!("lexicon.{language}.json")));

        Ok(Self {
            language,
            number_topics,
            instance_dir,
            model_path,
            lexicon_path,
            tokenizer_state_path: env::var("ANALYTICA_TOKENIZER_STATE").ok().map(PathBuf::from),
            error_threshold,
        })
    }

    /// Check that the trained topic model exists.
    /// Call this before any operation that compares collections.
    pub fn require_model(&self) -> Result<()> {
        if !self.model_path.exists() {
            anyhow::bail!(
                "Topic model not found at {}\n\
                 Train a model with {} topics and save it there, or set ANALYTICA_MODEL_PATH.",
                self.model_path.display(),
                self.number_topics
            );
        }
        Ok(())
    }

    /// Check that the lexicon for the morphology oracle exists.
    pub fn require_lexicon(&self) -> Result<()> {
        if !self.lexicon_path.exists() {
            anyhow::bail!(
                "Lexicon not found at {}\n\
                 Set ANALYTICA_LEXICON_PATH to a lexicon JSON file for language {:?}.",
                self.lexicon_path.display(),
                self.language
            );
        }
        Ok(())
    }
}

/// Returns the default instance directory.
/// Uses the platform data directory: ~/.local/share/analytica/ on Linux.
pub fn default_instance_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("analytica")
}
