// Topic divergence between two document collections.
//
// Each collection is reduced to its mean topic mixture. The topic whose
// share grows the most from target to source is the source's distinguishing
// topic, and the one that shrinks the most is the target's. Each side's
// topic is then named by a single word:
//
//   score(w) = ln(local count of w in the collection) * relevance(topic, w)
//
// so a word must both occur in the collection and be characteristic of the
// topic across the whole model. The best-scoring noun wins.
//
// Every step is memoized by its inputs: mixtures by collection, topic words
// by (collection, topic), rankings by topic, and noun checks by word.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use super::collection::DocumentCollection;
use super::error::TopicError;
use super::ranking::{argmax, argmin, mean_mixture, top_words, topic_word_ranking};
use super::traits::TopicModel;
use crate::memo::Memo;
use crate::tokenizer::Tokenizer;

/// How many of the best-scoring candidates are logged while picking a word.
const LOGGED_CANDIDATES: usize = 10;

/// A topic and the word chosen to name it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicWord {
    pub topic: usize,
    pub word: String,
}

/// Result of comparing a source collection against a target collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    /// Topic most over-represented in the source
    pub source: TopicWord,
    /// Topic most over-represented in the target
    pub target: TopicWord,
}

pub struct TopicComparator {
    tokenizer: Arc<Tokenizer>,
    model: Arc<dyn TopicModel>,
    mixtures: Memo<DocumentCollection, Vec<f64>>,
    topic_words: Memo<(DocumentCollection, usize), String>,
    rankings: Memo<usize, Arc<HashMap<String, f64>>>,
    suitable: Memo<String, bool>,
}

impl TopicComparator {
    pub fn new(tokenizer: Arc<Tokenizer>, model: Arc<dyn TopicModel>) -> Self {
        Self {
            tokenizer,
            model,
            mixtures: Memo::new(),
            topic_words: Memo::new(),
            rankings: Memo::new(),
            suitable: Memo::new(),
        }
    }

    pub fn tokenizer(&self) -> &Arc<Tokenizer> {
        &self.tokenizer
    }

    pub fn model(&self) -> &Arc<dyn TopicModel> {
        &self.model
    }

    /// Find the most distinguishing topic of each collection relative to the
    /// other, and name each with a representative word.
    pub fn compare(
        &self,
        source: &DocumentCollection,
        target: &DocumentCollection,
    ) -> Result<Comparison> {
        let source_topics = self.mean_topic_mixture(source)?;
        let target_topics = self.mean_topic_mixture(target)?;

        let diffs: Vec<f64> = source_topics
            .iter()
            .zip(&target_topics)
            .map(|(s, t)| s - t)
            .collect();

        let (Some(topic_max), Some(topic_min)) = (argmax(&diffs), argmin(&diffs)) else {
            anyhow::bail!("Topic mixtures have no comparable topics");
        };

        debug!(
            topic_max = topic_max,
            diff_max = diffs[topic_max],
            topic_min = topic_min,
            diff_min = diffs[topic_min],
            "Largest topic differences"
        );

        let source_word = self.find_topic_word(source, topic_max)?;
        let target_word = self.find_topic_word(target, topic_min)?;

        Ok(Comparison {
            source: TopicWord {
                topic: topic_max,
                word: source_word,
            },
            target: TopicWord {
                topic: topic_min,
                word: target_word,
            },
        })
    }

    /// Mean topic mixture over the documents of a collection.
    pub fn mean_topic_mixture(&self, collection: &DocumentCollection) -> Result<Vec<f64>> {
        self.mixtures.get_or_try_insert_with(collection, || {
            if collection.is_empty() {
                anyhow::bail!("Cannot compute the topic mixture of an empty collection");
            }

            let documents = collection
                .documents()
                .iter()
                .map(|doc| self.tokenizer.tokenize_all(doc))
                .collect::<Result<Vec<_>>>()?;

            let counts = self.model.vectorize(&documents)?;
            let rows = self.model.topic_mixture(&counts)?;
            mean_mixture(&rows, self.model.number_topics())
        })
    }

    /// The word that best represents `topic` within `collection`.
    ///
    /// Fails with [`TopicError::NoSuitableTopicWord`] if no candidate is a
    /// noun.
    pub fn find_topic_word(&self, collection: &DocumentCollection, topic: usize) -> Result<String> {
        let key = (collection.clone(), topic);
        self.topic_words.get_or_try_insert_with(&key, || {
            let ranking = self.topic_word_ranking(topic)?;
            let candidates = self.score_candidates(collection, &ranking)?;

            let best: Vec<&(String, f64)> = candidates.iter().take(LOGGED_CANDIDATES).collect();
            debug!(topic = topic, candidates = ?best, "Best topic word candidates");

            for (word, _score) in &candidates {
                if self.is_suitable_topic_word(word)? {
                    return Ok(word.clone());
                }
            }

            Err(TopicError::NoSuitableTopicWord { topic }.into())
        })
    }

    /// Candidate words of a collection ordered best first. Only words the
    /// ranking knows are scored. Equal scores keep alphabetical order.
    fn score_candidates(
        &self,
        collection: &DocumentCollection,
        ranking: &HashMap<String, f64>,
    ) -> Result<Vec<(String, f64)>> {
        let mut local_freq: HashMap<String, usize> = HashMap::new();
        for stem in self.tokenizer.tokenize(&collection.joined()) {
            *local_freq.entry(stem?).or_insert(0) += 1;
        }

        let mut scored: Vec<(String, f64)> = local_freq
            .into_iter()
            .filter_map(|(word, count)| {
                let relevance = ranking.get(&word)?;
                Some((word, (count as f64).ln() * relevance))
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });

        Ok(scored)
    }

    /// Relevance of every vocabulary word for `topic`, computed once.
    pub fn topic_word_ranking(&self, topic: usize) -> Result<Arc<HashMap<String, f64>>> {
        self.rankings.get_or_try_insert_with(&topic, || {
            let ranking =
                topic_word_ranking(self.model.components(), self.model.vocabulary(), topic)?;
            Ok(Arc::new(ranking))
        })
    }

    /// The `n` most relevant words of a topic.
    pub fn top_words(&self, topic: usize, n: usize) -> Result<Vec<(String, f64)>> {
        let ranking = self.topic_word_ranking(topic)?;
        Ok(top_words(&ranking, n))
    }

    /// A word can name a topic only if one of its readings is a noun.
    pub fn is_suitable_topic_word(&self, word: &str) -> Result<bool> {
        self.suitable.get_or_try_insert_with(&word.to_string(), || {
            let analyses = self.tokenizer.analyze(word)?;
            Ok(analyses
                .iter()
                .any(|a| a.class.as_ref().is_some_and(|c| c.is_noun())))
        })
    }
}
