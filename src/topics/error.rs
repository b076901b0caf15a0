// Topic selection errors surfaced to callers.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopicError {
    /// Every candidate word for the topic was rejected by the noun filter.
    /// Either the topic is degenerate or the collection has too little in
    /// common with it.
    #[error("could not find a suitable topic word for topic {topic}")]
    NoSuitableTopicWord { topic: usize },

    #[error("topic {topic} is out of range for a model with {number_topics} topics")]
    TopicOutOfRange { topic: usize, number_topics: usize },
}
