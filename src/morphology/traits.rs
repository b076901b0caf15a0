// Morphology oracle trait: the swap-ready abstraction.
//
// The tokenizer never analyzes words itself. It asks an oracle for the base
// forms of a word (with grammatical class tags) and, for unknown words, for
// ranked spelling suggestions. Any analyzer that can answer those two
// questions for a language can be plugged in here.

use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Grammatical class of an analysis, decoded from the Finnish morphology tag
/// set. Tags the crate does not need to reason about are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WordClass {
    /// "nimisana"
    Noun,
    /// "nimi"
    ProperNoun,
    /// "teonsana"
    Verb,
    /// "laatusana"
    Adjective,
    /// "seikkasana"
    Adverb,
    /// "huudahdussana"
    Interjection,
    /// "lukusana"
    Numeral,
    /// "asemosana"
    Pronoun,
    /// "sidesana"
    Conjunction,
    /// "suhdesana"
    Adposition,
    /// "kieltosana"
    NegationVerb,
    Other(String),
}

impl WordClass {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "nimisana" => WordClass::Noun,
            "nimi" => WordClass::ProperNoun,
            "teonsana" => WordClass::Verb,
            "laatusana" => WordClass::Adjective,
            "seikkasana" => WordClass::Adverb,
            "huudahdussana" => WordClass::Interjection,
            "lukusana" => WordClass::Numeral,
            "asemosana" => WordClass::Pronoun,
            "sidesana" => WordClass::Conjunction,
            "suhdesana" => WordClass::Adposition,
            "kieltosana" => WordClass::NegationVerb,
            other => WordClass::Other(other.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            WordClass::Noun => "nimisana",
            WordClass::ProperNoun => "nimi",
            WordClass::Verb => "teonsana",
            WordClass::Adjective => "laatusana",
            WordClass::Adverb => "seikkasana",
            WordClass::Interjection => "huudahdussana",
            WordClass::Numeral => "lukusana",
            WordClass::Pronoun => "asemosana",
            WordClass::Conjunction => "sidesana",
            WordClass::Adposition => "suhdesana",
            WordClass::NegationVerb => "kieltosana",
            WordClass::Other(tag) => tag,
        }
    }

    /// Classes that carry no topical meaning. An analysis with one of these
    /// classes is never used as a stem.
    pub fn is_stopword_class(&self) -> bool {
        matches!(
            self,
            WordClass::Interjection
                | WordClass::Adverb
                | WordClass::Numeral
                | WordClass::Pronoun
                | WordClass::Conjunction
                | WordClass::Adposition
                | WordClass::NegationVerb
        )
    }

    /// Only nouns may name a topic.
    pub fn is_noun(&self) -> bool {
        matches!(self, WordClass::Noun | WordClass::ProperNoun)
    }
}

impl From<String> for WordClass {
    fn from(tag: String) -> Self {
        WordClass::from_tag(&tag)
    }
}

impl From<WordClass> for String {
    fn from(class: WordClass) -> Self {
        class.tag().to_string()
    }
}

impl fmt::Display for WordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One morphological reading of a word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    /// Dictionary form of the word
    pub baseform: String,
    /// Grammatical class; absent when the analyzer did not report one
    #[serde(default)]
    pub class: Option<WordClass>,
}

impl Analysis {
    pub fn new(baseform: impl Into<String>, class: WordClass) -> Self {
        Self {
            baseform: baseform.into(),
            class: Some(class),
        }
    }
}

/// Trait for a morphological analyzer with spelling suggestions.
///
/// Both operations are pure functions of the word and the oracle's language.
/// An empty analysis list means the word is unknown; an empty suggestion list
/// means there is nothing better to offer.
pub trait MorphologyOracle: Send + Sync {
    /// Language tag the oracle was built for (e.g. "fi"). Used to rebuild the
    /// oracle when a tokenizer is restored from saved state.
    fn language(&self) -> &str;

    /// All readings of `word`, in the analyzer's preferred order.
    fn analyze(&self, word: &str) -> Result<Vec<Analysis>>;

    /// Ranked spelling corrections for `word`, best first.
    fn suggest(&self, word: &str) -> Result<Vec<String>>;
}
