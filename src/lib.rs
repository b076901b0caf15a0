// Analytica: spell-tolerant stemming and topic divergence for free text.
//
// This is the library root. Each module corresponds to a major subsystem:
// morphology feeds the tokenizer, the tokenizer feeds the topic comparator.

pub mod config;
pub mod memo;
pub mod morphology;
pub mod output;
pub mod tokenizer;
pub mod topics;
