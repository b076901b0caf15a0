// Topic model trait: swap-ready abstraction.
//
// The comparator only needs four things from a trained topic model: its
// vocabulary, its per-topic word weights, a way to turn token sequences into
// count vectors, and a way to turn count vectors into topic mixtures. The
// default implementation is a persisted LDA model (see `lda.rs`), but any
// trained model exposing these can be used.

use std::collections::BTreeMap;

use anyhow::Result;

/// Sparse bag of words: vocabulary index -> occurrence count.
pub type CountVector = BTreeMap<usize, u32>;

/// Trait for a trained topic model and its vectorizer.
pub trait TopicModel: Send + Sync {
    /// Vocabulary in column order of the component matrix.
    fn vocabulary(&self) -> &[String];

    /// `number_topics x vocabulary_size` non-negative word weights.
    fn components(&self) -> &[Vec<f64>];

    fn number_topics(&self) -> usize {
        self.components().len()
    }

    /// Count the in-vocabulary tokens of each document.
    fn vectorize(&self, documents: &[Vec<String>]) -> Result<Vec<CountVector>>;

    /// Topic mixture of each document, one row per document and one column
    /// per topic. Rows sum to roughly 1.
    fn topic_mixture(&self, counts: &[CountVector]) -> Result<Vec<Vec<f64>>>;
}
