//! Error taxonomy for extraction runs.
//!
//! - [`ExtractionError`]: one document could not be analyzed; the runner
//!   records it and moves on.
//! - [`CapabilityError`]: a query was made that the store was not built for.
//! - [`ConfigurationError`]: a phase or configuration file is unusable; raised
//!   before any document is touched.
//! - [`RunError`]: the run as a whole produced no store.

use thiserror::Error;

use crate::extraction::CodeView;
use crate::language::Language;

/// A single document could not be analyzed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("{uniform_path}: no syntax tree for the {view} view{}", reason_suffix(.reason))]
    MissingSyntaxTree {
        uniform_path: String,
        view: CodeView,
        reason: Option<String>,
    },
    #[error("{uniform_path}: entity `{entity}` has no own tokens")]
    EmptyEntity { uniform_path: String, entity: String },
    #[error("{uniform_path}: {message}")]
    Failed { uniform_path: String, message: String },
}

fn reason_suffix(reason: &Option<String>) -> String {
    match reason {
        Some(r) => format!(" ({})", r),
        None => String::new(),
    }
}

impl ExtractionError {
    /// Uniform path of the document the failure belongs to.
    pub fn uniform_path(&self) -> &str {
        match self {
            ExtractionError::MissingSyntaxTree { uniform_path, .. }
            | ExtractionError::EmptyEntity { uniform_path, .. }
            | ExtractionError::Failed { uniform_path, .. } => uniform_path,
        }
    }
}

/// A query was made against a capability the store does not have.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityError {
    #[error("inverted index was not built; the phase must declare needs_inverted_index to query by value")]
    InvertedIndexNotBuilt,
}

/// A phase or configuration is unusable.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("phase `{phase}` declares no document languages")]
    NoLanguages { phase: String },
    #[error("phase `{phase}` does not apply to {language} documents")]
    UnsupportedLanguage { phase: String, language: Language },
    #[error("unknown language `{0}`")]
    UnknownLanguage(String),
    #[error("conflicting options: {0}")]
    ConflictingOptions(String),
    #[error("invalid glob pattern {pattern:?}: {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
    #[error("invalid text filter pattern {pattern:?}: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// The run produced no store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    #[error("extraction run was cancelled")]
    Cancelled,
}
