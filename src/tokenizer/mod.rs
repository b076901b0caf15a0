// Tokenization: word extraction, oracle-backed stemming, and saved state.

pub mod state;
pub mod stemmer;
pub mod words;

pub use stemmer::{Tokenizer, Tokens, DEFAULT_ERROR_THRESHOLD};
pub use state::TokenizerState;
