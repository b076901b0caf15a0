// Morphological analysis: the oracle interface and a lexicon-backed oracle.

pub mod lexicon;
pub mod traits;
