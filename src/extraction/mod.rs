//! Extraction phases and their indexed results.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌────────────────┐     ┌──────────────┐
//! │ DocumentContext  │────▶│ ExtractionPhase│────▶│ Fact<P>      │
//! │ (path, entities) │     │ (per document) │     │ (key, value, │
//! └──────────────────┘     └────────────────┘     │  payload)    │
//!                                                 └──────────────┘
//!                                                        │
//!                                                        ▼
//!                          ┌────────────────┐     ┌──────────────┐
//!                          │ Rules          │◀────│ ResultStore  │
//!                          │ (by document,  │     │ (forward +   │
//!                          │  by value)     │     │  inverted)   │
//!                          └────────────────┘     └──────────────┘
//! ```
//!
//! [`ExtractionRunner`] drives a phase over a corpus and builds the store.
//! Whether the inverted index is built is decided by the phase's
//! [`ExtractionPhase::needs_inverted_index`] declaration.

mod context;
mod fact;
mod phase;
mod runner;
mod store;

pub use context::{
    entities_of_kind, subtypes, CodeView, DocumentContext, EntityKind, ShallowEntity, Token,
};
pub use fact::{Fact, TextRegion};
pub use phase::{ExtractionPhase, FnPhase, PhaseDeclaration};
pub use runner::{CancellationToken, DocumentFailure, ExtractionRunner, RunOutput};
pub use store::ResultStore;
