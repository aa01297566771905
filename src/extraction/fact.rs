//! Extracted facts and the text region payload.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One unit of information a phase extracted from a document.
///
/// The store indexes a fact by `document_key` and, when asked to, by
/// `value`. The payload is never inspected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "RawFact<P>",
    bound(deserialize = "P: Deserialize<'de>")
)]
pub struct Fact<P> {
    document_key: String,
    value: String,
    payload: P,
}

/// Wire form of a [`Fact`], checked by [`Fact::new`] on the way in.
#[derive(Deserialize)]
struct RawFact<P> {
    document_key: String,
    value: String,
    payload: P,
}

impl<P> TryFrom<RawFact<P>> for Fact<P> {
    type Error = String;

    fn try_from(raw: RawFact<P>) -> Result<Self, Self::Error> {
        Fact::new(raw.document_key, raw.value, raw.payload)
            .ok_or_else(|| "fact has an empty document_key".to_string())
    }
}

impl<P> Fact<P> {
    /// Create a fact.
    ///
    /// Returns `None` if `document_key` is empty: every fact must be
    /// attributable to a document.
    pub fn new(document_key: impl Into<String>, value: impl Into<String>, payload: P) -> Option<Self> {
        let document_key = document_key.into();
        if document_key.is_empty() {
            return None;
        }
        Some(Self {
            document_key,
            value: value.into(),
            payload,
        })
    }

    /// Uniform path of the document that produced this fact.
    pub fn document_key(&self) -> &str {
        &self.document_key
    }

    /// Key for inverted lookups.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn into_payload(self) -> P {
        self.payload
    }
}

/// A region of a source document.
///
/// Offsets are 0-based byte offsets, lines are 1-based. `end_offset` is the
/// start offset of the last token in the region.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRegion {
    pub uniform_path: String,
    pub start_offset: usize,
    pub end_offset: usize,
    pub start_line: usize,
    pub end_line: usize,
}

impl TextRegion {
    /// Number of lines the region touches.
    pub fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

impl fmt::Display for TextRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start_line == self.end_line {
            write!(f, "{}:{}", self.uniform_path, self.start_line)
        } else {
            write!(f, "{}:{}-{}", self.uniform_path, self.start_line, self.end_line)
        }
    }
}
