//! declindex - class declaration index for source trees.
//!
//! declindex runs extraction phases over a corpus of parsed documents and
//! keeps each phase's facts in a [`ResultStore`] that answers two questions
//! without rescanning the corpus: which facts a document produced, and which
//! documents produced a fact with a given value.
//!
//! # Architecture
//!
//! - `corpus`: Document discovery, loading and text filters
//! - `parser`: Tree-sitter based shallow parsers
//! - `extraction`: Phase trait, runner and the dual-indexed result store
//! - `phases`: Concrete phases (class declarations)
//! - `config`: YAML scan configuration
//! - `report`: Output formatting (text, JSON)
//!
//! # Adding a Phase
//!
//! Implement [`ExtractionPhase`] (or wrap a closure in [`FnPhase`]) and hand
//! it to an [`ExtractionRunner`].

pub mod cli;
pub mod config;
pub mod corpus;
pub mod error;
pub mod extraction;
pub mod language;
pub mod parser;
pub mod phases;
pub mod report;

pub use config::ScanConfig;
pub use corpus::{Corpus, TextFilter};
pub use error::{CapabilityError, ConfigurationError, ExtractionError, RunError};
pub use extraction::{
    CancellationToken, CodeView, DocumentContext, ExtractionPhase, ExtractionRunner, Fact,
    FnPhase, ResultStore, RunOutput, ShallowEntity, TextRegion,
};
pub use language::Language;
pub use phases::{ClassDeclaration, ClassDeclarationPhase};
