//! Corpus-wide extraction runner.

use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{ConfigurationError, ExtractionError, RunError};
use crate::language::Language;

use super::{DocumentContext, ExtractionPhase, Fact, ResultStore};

/// Shared flag to abandon a run.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A document whose extraction failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFailure {
    pub uniform_path: String,
    pub error: ExtractionError,
}

/// Result of a completed run.
#[derive(Debug)]
pub struct RunOutput<P> {
    pub store: ResultStore<P>,
    /// Failed documents in corpus order.
    pub failures: Vec<DocumentFailure>,
    /// Documents the phase was applied to (including failures).
    pub processed: usize,
    /// Documents of languages the phase does not apply to.
    pub skipped: usize,
}

impl<P> RunOutput<P> {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Applies one extraction phase across a corpus and builds its store.
pub struct ExtractionRunner<E> {
    phase: E,
    languages: Vec<Language>,
    needs_inverted_index: bool,
    parallel: bool,
    cancellation: Option<CancellationToken>,
}

impl<E: ExtractionPhase> ExtractionRunner<E> {
    /// Create a runner for `phase`.
    ///
    /// Fails if the phase declares no language to run on.
    pub fn new(phase: E) -> Result<Self, ConfigurationError> {
        if phase.languages().is_empty() {
            return Err(ConfigurationError::NoLanguages {
                phase: phase.name().to_string(),
            });
        }
        Ok(Self {
            languages: phase.languages().to_vec(),
            needs_inverted_index: phase.needs_inverted_index(),
            phase,
            parallel: true,
            cancellation: None,
        })
    }

    /// Restrict the run to a subset of the phase's languages.
    pub fn restrict_languages(mut self, languages: &[Language]) -> Result<Self, ConfigurationError> {
        if languages.is_empty() {
            return Ok(self);
        }
        for lang in languages {
            if !self.phase.languages().contains(lang) {
                return Err(ConfigurationError::UnsupportedLanguage {
                    phase: self.phase.name().to_string(),
                    language: *lang,
                });
            }
        }
        self.languages = languages.to_vec();
        Ok(self)
    }

    /// Override whether the inverted index is built.
    ///
    /// Disabling it for a phase whose consumers query by value is rejected.
    pub fn inverted_index(mut self, enabled: Option<bool>) -> Result<Self, ConfigurationError> {
        match enabled {
            Some(false) if self.phase.needs_inverted_index() => {
                Err(ConfigurationError::ConflictingOptions(format!(
                    "phase `{}` needs the inverted index but configuration disables it",
                    self.phase.name()
                )))
            }
            Some(flag) => {
                self.needs_inverted_index = flag;
                Ok(self)
            }
            None => Ok(self),
        }
    }

    /// Extract documents in parallel (default) or one after another.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn phase(&self) -> &E {
        &self.phase
    }

    /// Languages the run extracts.
    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    pub fn builds_inverted_index(&self) -> bool {
        self.needs_inverted_index
    }

    /// Run the phase over `documents`.
    ///
    /// Documents are extracted independently; the merged fact sequence is in
    /// corpus order, then source order within a document, whatever order the
    /// workers finish in. A failing document is reported in
    /// [`RunOutput::failures`] and contributes no facts.
    pub fn run(&self, documents: &[DocumentContext]) -> Result<RunOutput<E::Payload>, RunError> {
        let selected: Vec<&DocumentContext> = documents
            .iter()
            .filter(|doc| self.applies_to(doc))
            .collect();
        let skipped = documents.len() - selected.len();

        debug!(
            phase = self.phase.name(),
            documents = selected.len(),
            skipped,
            parallel = self.parallel,
            "starting extraction"
        );

        let outcomes: Vec<Option<Result<Vec<Fact<E::Payload>>, ExtractionError>>> = if self.parallel {
            selected.par_iter().map(|doc| self.extract_one(doc)).collect()
        } else {
            selected.iter().map(|doc| self.extract_one(doc)).collect()
        };

        if self.is_cancelled() {
            info!(phase = self.phase.name(), "extraction cancelled");
            return Err(RunError::Cancelled);
        }

        let mut facts = Vec::new();
        let mut failures = Vec::new();
        for (doc, outcome) in selected.iter().zip(outcomes) {
            match outcome {
                Some(Ok(doc_facts)) => facts.extend(doc_facts),
                Some(Err(error)) => {
                    warn!(
                        phase = self.phase.name(),
                        document = doc.uniform_path(),
                        %error,
                        "extraction failed"
                    );
                    failures.push(DocumentFailure {
                        uniform_path: doc.uniform_path().to_string(),
                        error,
                    });
                }
                None => return Err(RunError::Cancelled),
            }
        }

        let store = ResultStore::build(facts, self.needs_inverted_index);
        info!(
            phase = self.phase.name(),
            facts = store.len(),
            documents = store.document_count(),
            failures = failures.len(),
            "extraction finished"
        );

        Ok(RunOutput {
            store,
            failures,
            processed: selected.len(),
            skipped,
        })
    }

    fn applies_to(&self, doc: &DocumentContext) -> bool {
        doc.language().is_some_and(|l| self.languages.contains(&l))
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation.as_ref().is_some_and(|t| t.is_cancelled())
    }

    /// `None` if the run was cancelled before this document started.
    fn extract_one(
        &self,
        doc: &DocumentContext,
    ) -> Option<Result<Vec<Fact<E::Payload>>, ExtractionError>> {
        if self.is_cancelled() {
            return None;
        }
        let result = self.phase.extract(doc).and_then(|facts| {
            match facts.iter().find(|f| f.document_key() != doc.uniform_path()) {
                Some(foreign) => Err(ExtractionError::Failed {
                    uniform_path: doc.uniform_path().to_string(),
                    message: format!(
                        "phase `{}` attributed a fact to `{}`",
                        self.phase.name(),
                        foreign.document_key()
                    ),
                }),
                None => Ok(facts),
            }
        });
        Some(result)
    }
}
