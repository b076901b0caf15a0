// Spell-tolerant, morphology-aware tokenizer.
//
// Raw text is split into paragraphs (lines), paragraphs into word candidates,
// and each candidate is reduced to a stem with the help of a morphology
// oracle:
//
//   1. A word seen before resolves from the stem cache without touching the
//      oracle.
//   2. Otherwise the first reading whose class is not a stopword class gives
//      the stem (its lowercased base form). If every reading is a stopword
//      class, the word itself is the stem.
//   3. A word the oracle does not know counts as a spelling error. Its best
//      suggestion is tokenized in its place (one level only, the suggestion
//      is never corrected again), which may yield several stems. With no
//      suggestion the word itself is the stem, and the cache remembers it
//      as unresolved so every later occurrence still counts as an error.
//
// A paragraph with more errors than `error_threshold` times its stem count
// is presumed to be in the wrong language or garbage, and yields nothing.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use tracing::debug;

use super::state::TokenizerState;
use super::words::extract_words;
use crate::memo::Memo;
use crate::morphology::traits::{Analysis, MorphologyOracle};

/// Default share of unresolved words tolerated in a paragraph.
pub const DEFAULT_ERROR_THRESHOLD: f64 = 0.5;

/// Stems of one paragraph together with the number of unresolved words.
struct ParagraphStems {
    stems: Vec<String>,
    errors: usize,
}

/// Lowercase word -> stem. Grows monotonically; an entry never changes.
#[derive(Default)]
struct StemCache {
    stems: HashMap<String, String>,
    /// Words the oracle could neither analyze nor correct. Their stem is the
    /// word itself.
    unresolved: HashSet<String>,
}

pub struct Tokenizer {
    oracle: Arc<dyn MorphologyOracle>,
    cache: Mutex<StemCache>,
    /// Lowercase word -> the oracle's readings.
    analyses: Memo<String, Vec<Analysis>>,
    error_threshold: f64,
}

impl Tokenizer {
    pub fn new(oracle: Arc<dyn MorphologyOracle>) -> Self {
        Self {
            oracle,
            cache: Mutex::new(StemCache::default()),
            analyses: Memo::new(),
            error_threshold: DEFAULT_ERROR_THRESHOLD,
        }
    }

    pub fn with_error_threshold(mut self, error_threshold: f64) -> Self {
        self.error_threshold = error_threshold;
        self
    }

    pub fn error_threshold(&self) -> f64 {
        self.error_threshold
    }

    pub fn language(&self) -> &str {
        self.oracle.language()
    }

    /// Lazily tokenize `text`, paragraph by paragraph.
    ///
    /// The returned iterator borrows the text; call `tokenize` again to start
    /// over. Stems are cached, so a second pass costs no oracle calls.
    pub fn tokenize<'a>(&'a self, text: &'a str) -> Tokens<'a> {
        Tokens {
            tokenizer: self,
            paragraphs: text.lines(),
            pending: Vec::new().into_iter(),
        }
    }

    /// Tokenize `text` eagerly into a single stem sequence.
    pub fn tokenize_all(&self, text: &str) -> Result<Vec<String>> {
        self.tokenize(text).collect()
    }

    /// Tokenize one paragraph, correcting unknown words from suggestions.
    pub fn tokenize_paragraph(&self, paragraph: &str) -> Result<Vec<String>> {
        self.tokenize_paragraph_with(paragraph, true)
    }

    /// Tokenize one paragraph and apply the noise rule.
    pub fn tokenize_paragraph_with(
        &self,
        paragraph: &str,
        use_suggestions: bool,
    ) -> Result<Vec<String>> {
        let ParagraphStems { stems, errors } = self.stem_paragraph(paragraph, use_suggestions)?;

        if errors as f64 > self.error_threshold * stems.len() as f64 {
            debug!(
                errors = errors,
                stems = stems.len(),
                "Too many spelling errors, disregarding paragraph"
            );
            return Ok(Vec::new());
        }

        Ok(stems)
    }

    /// Readings of `word` from the oracle, memoized per lowercase word.
    pub fn analyze(&self, word: &str) -> Result<Vec<Analysis>> {
        let key = word.to_lowercase();
        self.analyses
            .get_or_try_insert_with(&key, || self.oracle.analyze(&key))
    }

    /// Cached stem for `word`, if it has been stemmed before.
    pub fn cached_stem(&self, word: &str) -> Result<Option<String>> {
        Ok(self.lookup(word)?.map(|(stem, _)| stem))
    }

    /// Number of words in the stem cache.
    pub fn stem_cache_len(&self) -> Result<usize> {
        Ok(self.lock_cache()?.stems.len())
    }

    fn lock_cache(&self) -> Result<MutexGuard<'_, StemCache>> {
        self.cache
            .lock()
            .map_err(|e| anyhow::anyhow!("Stem cache lock poisoned: {}", e))
    }

    /// Cached stem and whether it stands for an unresolved word.
    fn lookup(&self, word: &str) -> Result<Option<(String, bool)>> {
        let key = word.to_lowercase();
        let cache = self.lock_cache()?;
        Ok(cache
            .stems
            .get(&key)
            .map(|stem| (stem.clone(), cache.unresolved.contains(&key))))
    }

    fn stem_paragraph(&self, paragraph: &str, use_suggestions: bool) -> Result<ParagraphStems> {
        let mut errors = 0;
        let mut stems = Vec::new();

        for word in extract_words(paragraph) {
            for stem in self.stem(&word, use_suggestions, &mut errors)? {
                if !stem.is_empty() {
                    stems.push(stem);
                }
            }
        }

        Ok(ParagraphStems { stems, errors })
    }

    fn stem(&self, word: &str, use_suggestions: bool, errors: &mut usize) -> Result<Vec<String>> {
        if let Some((stem, unresolved)) = self.lookup(word)? {
            if unresolved {
                *errors += 1;
            }
            return Ok(vec![stem]);
        }

        let analyses = self.analyze(word)?;

        if analyses.is_empty() {
            *errors += 1;

            if use_suggestions {
                let suggested = self.oracle.suggest(word)?.into_iter().next();
                debug!(
                    word = word,
                    suggested = ?suggested,
                    "Word not found by morphology oracle"
                );

                return match suggested {
                    // A suggestion may be several words. Its own unknown words
                    // fall back to themselves; the original word already
                    // counted as the paragraph's error.
                    Some(suggested) => Ok(self.stem_paragraph(&suggested, false)?.stems),
                    None => self.remember(word, word.to_lowercase(), true),
                };
            }

            // Not cached: with suggestions on, a later call may still correct it.
            return Ok(vec![word.to_lowercase()]);
        }

        match analyses
            .iter()
            .find(|a| !a.class.as_ref().is_some_and(|c| c.is_stopword_class()))
        {
            Some(reading) => self.remember(word, reading.baseform.to_lowercase(), false),
            None => self.remember(word, word.to_lowercase(), false),
        }
    }

    fn remember(&self, word: &str, stem: String, unresolved: bool) -> Result<Vec<String>> {
        let key = word.to_lowercase();
        let mut cache = self.lock_cache()?;
        if unresolved && !cache.stems.contains_key(&key) {
            cache.unresolved.insert(key.clone());
        }
        let stored = cache.stems.entry(key).or_insert(stem);
        Ok(vec![stored.clone()])
    }

    /// Capture the caches and the oracle's language tag. The oracle itself is
    /// not part of the state.
    pub fn export(&self) -> Result<TokenizerState> {
        let (stems, unresolved) = {
            let cache = self.lock_cache()?;
            (cache.stems.clone(), cache.unresolved.clone())
        };

        Ok(TokenizerState {
            language: self.language().to_string(),
            error_threshold: self.error_threshold,
            stems,
            unresolved,
            analyses: self.analyses.snapshot().into_iter().collect(),
        })
    }

    /// Rebuild a tokenizer from exported state. `build_oracle` receives the
    /// saved language tag and must return a fresh oracle for it.
    pub fn restore<F>(state: TokenizerState, build_oracle: F) -> Result<Self>
    where
        F: FnOnce(&str) -> Result<Arc<dyn MorphologyOracle>>,
    {
        let oracle = build_oracle(&state.language)?;
        if oracle.language() != state.language {
            anyhow::bail!(
                "Restored oracle speaks {:?} but the tokenizer state was saved for {:?}",
                oracle.language(),
                state.language
            );
        }

        Ok(Self {
            oracle,
            cache: Mutex::new(StemCache {
                stems: state.stems,
                unresolved: state.unresolved,
            }),
            analyses: Memo::from_entries(state.analyses),
            error_threshold: state.error_threshold,
        })
    }
}

/// Lazy stem stream over a text, produced by [`Tokenizer::tokenize`].
pub struct Tokens<'a> {
    tokenizer: &'a Tokenizer,
    paragraphs: std::str::Lines<'a>,
    pending: std::vec::IntoIter<String>,
}

impl Iterator for Tokens<'_> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(stem) = self.pending.next() {
                return Some(Ok(stem));
            }
            let paragraph = self.paragraphs.next()?;
            match self.tokenizer.tokenize_paragraph(paragraph) {
                Ok(stems) => self.pending = stems.into_iter(),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morphology::lexicon::LexiconOracle;
    use crate::morphology::traits::WordClass;

    fn tokenizer() -> Tokenizer {
        let lexicon = LexiconOracle::new("fi")
            .with_entry("koirat", Analysis::new("koira", WordClass::Noun))
            .with_entry("kissa", Analysis::new("kissa", WordClass::Noun))
            .with_entry("ja", Analysis::new("ja", WordClass::Conjunction));
        Tokenizer::new(Arc::new(lexicon))
    }

    #[test]
    fn test_paragraphs_are_concatenated_in_order() {
        let t = tokenizer();
        let stems = t.tokenize_all("koirat\n\nkissa ja koirat").unwrap();
        assert_eq!(stems, vec!["koira", "kissa", "ja", "koira"]);
    }

    #[test]
    fn test_tokenize_is_restartable() {
        let t = tokenizer();
        let text = "koirat ja kissa";
        let first: Vec<String> = t.tokenize(text).collect::<Result<_>>().unwrap();
        let second: Vec<String> = t.tokenize(text).collect::<Result<_>>().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_stem_cache_keys_are_lowercase() {
        let t = tokenizer();
        t.tokenize_paragraph("KOIRAT").unwrap();
        assert_eq!(t.cached_stem("koirat").unwrap().as_deref(), Some("koira"));
        assert_eq!(t.cached_stem("Koirat").unwrap().as_deref(), Some("koira"));
    }

    #[test]
    fn test_rejected_paragraph_stays_rejected() {
        let t = tokenizer();
        let text = "kissa abcx defx ghix";
        assert!(t.tokenize_paragraph(text).unwrap().is_empty());
        assert!(t.tokenize_paragraph(text).unwrap().is_empty());

        let first: Vec<String> = t.tokenize(text).collect::<Result<_>>().unwrap();
        let second: Vec<String> = t.tokenize(text).collect::<Result<_>>().unwrap();
        assert!(first.is_empty() && second.is_empty());
    }

    #[test]
    fn test_unknown_word_without_suggestions_is_not_cached() {
        let t = tokenizer();
        assert_eq!(
            t.tokenize_paragraph_with("kissa qwxz", false).unwrap(),
            vec!["kissa", "qwxz"]
        );
        assert_eq!(t.cached_stem("qwxz").unwrap(), None);

        t.tokenize_paragraph("kissa qwxz").unwrap();
        assert_eq!(t.cached_stem("qwxz").unwrap().as_deref(), Some("qwxz"));
    }

    #[test]
    fn test_restore_can_take_a_new_threshold() {
        let t = tokenizer().with_error_threshold(0.9);
        let state = t.export().unwrap();
        let restored = Tokenizer::restore(state, |_| {
            let handle: Arc<dyn MorphologyOracle> = Arc::new(LexiconOracle::new("fi"));
            Ok(handle)
        })
        .unwrap();
        assert_eq!(restored.error_threshold(), 0.9);
        assert_eq!(restored.with_error_threshold(0.3).error_threshold(), 0.3);
    }

    #[test]
    fn test_custom_threshold() {
        // One unknown word out of two stems: rejected at 0.4, kept at 0.5.
        let strict = tokenizer().with_error_threshold(0.4);
        assert!(strict.tokenize_paragraph("kissa qwxz").unwrap().is_empty());

        let default = tokenizer();
        assert_eq!(
            default.tokenize_paragraph("kissa qwxz").unwrap(),
            vec!["kissa", "qwxz"]
        );
    }
}
