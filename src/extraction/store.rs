//! Dual-indexed extraction result store.
//!
//! All facts of a run live in one vector, in the order they were produced.
//! The forward index (document key → fact positions) is always built; the
//! inverted index (value → fact positions) only when the caller opts in.
//! Both are postings lists over the same vector, so a fact can never be
//! present in one index and missing from the other.
//!
//! Buckets hold positions in ascending order, which is extraction order.
//! Key listings follow first-seen order, so no hash order is observable.

use std::collections::HashMap;

use crate::error::CapabilityError;

use super::Fact;

/// Postings lists keyed by a string field of the facts.
#[derive(Debug, Clone, Default)]
struct Postings {
    buckets: HashMap<String, Vec<usize>>,
    /// Keys in first-seen order.
    order: Vec<String>,
}

impl Postings {
    fn build<P>(facts: &[Fact<P>], key: impl Fn(&Fact<P>) -> &str) -> Self {
        let mut postings = Postings::default();
        for (idx, fact) in facts.iter().enumerate() {
            let k = key(fact);
            match postings.buckets.get_mut(k) {
                Some(bucket) => bucket.push(idx),
                None => {
                    postings.buckets.insert(k.to_string(), vec![idx]);
                    postings.order.push(k.to_string());
                }
            }
        }
        postings
    }

    fn get(&self, key: &str) -> &[usize] {
        self.buckets.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Facts of one extraction run, indexed by document and optionally by value.
///
/// Built once with [`ResultStore::build`] and read-only afterwards. The store
/// is `Send + Sync` whenever the payload is, so it can be shared by any
/// number of concurrent readers.
#[derive(Debug, Clone)]
pub struct ResultStore<P> {
    facts: Vec<Fact<P>>,
    by_document: Postings,
    by_value: Option<Postings>,
}

impl<P> ResultStore<P> {
    /// Build the indexes over `facts`.
    ///
    /// The inverted index costs a second pass and one more postings table;
    /// it is built only when `needs_inverted_index` is set.
    pub fn build(facts: Vec<Fact<P>>, needs_inverted_index: bool) -> Self {
        let by_document = Postings::build(&facts, |f| f.document_key());
        let by_value = needs_inverted_index.then(|| Postings::build(&facts, |f| f.value()));
        Self {
            facts,
            by_document,
            by_value,
        }
    }

    /// An empty store.
    pub fn empty(needs_inverted_index: bool) -> Self {
        Self::build(Vec::new(), needs_inverted_index)
    }

    /// All facts of a document, in extraction order.
    ///
    /// Unknown documents have no facts; that is not an error.
    pub fn by_document(&self, document_key: &str) -> Vec<&Fact<P>> {
        self.resolve(self.by_document.get(document_key))
    }

    /// All facts with the given value, across documents, in extraction order.
    ///
    /// Fails if the store was built without the inverted index.
    pub fn by_value(&self, value: &str) -> Result<Vec<&Fact<P>>, CapabilityError> {
        let index = self
            .by_value
            .as_ref()
            .ok_or(CapabilityError::InvertedIndexNotBuilt)?;
        Ok(self.resolve(index.get(value)))
    }

    /// Uniform paths of documents with at least one fact, in first-seen order.
    pub fn documents(&self) -> impl Iterator<Item = &str> {
        self.by_document.order.iter().map(String::as_str)
    }

    /// Distinct values in first-seen order.
    pub fn values(&self) -> Result<impl Iterator<Item = &str>, CapabilityError> {
        let index = self
            .by_value
            .as_ref()
            .ok_or(CapabilityError::InvertedIndexNotBuilt)?;
        Ok(index.order.iter().map(String::as_str))
    }

    pub fn has_inverted_index(&self) -> bool {
        self.by_value.is_some()
    }

    /// All facts in input order.
    pub fn facts(&self) -> &[Fact<P>] {
        &self.facts
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn document_count(&self) -> usize {
        self.by_document.order.len()
    }

    fn resolve(&self, positions: &[usize]) -> Vec<&Fact<P>> {
        positions.iter().map(|&idx| &self.facts[idx]).collect()
    }
}
