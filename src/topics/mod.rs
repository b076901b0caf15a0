// Topic divergence: model interface, trained LDA model, and the comparator
// that names the topics separating two collections.

pub mod collection;
pub mod comparator;
pub mod error;
pub mod lda;
pub mod ranking;
pub mod traits;
