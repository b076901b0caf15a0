// DocumentCollection: one side of a comparison.
//
// An immutable, ordered list of raw text entries. Missing entries are dropped
// on construction. Collections are cheap to clone and hash by content, so
// they double as cache keys for every memoized step of a comparison.

use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentCollection(Arc<[String]>);

impl DocumentCollection {
    /// Build a collection from entries that may be missing.
    pub fn from_optional<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        entries.into_iter().flatten().collect()
    }

    pub fn documents(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All documents as one text, separated by blank lines.
    pub fn joined(&self) -> String {
        self.0.join("\n\n")
    }
}

impl<S: Into<String>> FromIterator<S> for DocumentCollection {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let documents: Vec<String> = iter.into_iter().map(Into::into).collect();
        Self(documents.into())
    }
}
