//! Extraction phase capability.

use serde::Serialize;

use crate::error::ExtractionError;
use crate::language::Language;

use super::{CodeView, DocumentContext, Fact};

/// What a phase declares to the host pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseDeclaration {
    pub name: String,
    pub languages: Vec<Language>,
    pub needs_inverted_index: bool,
}

/// A per-document analysis producing facts.
///
/// Implementations are stateless with respect to documents: `extract` sees
/// one read-only context and returns that document's facts in source order.
/// A failure aborts this document only.
pub trait ExtractionPhase: Send + Sync {
    /// Payload attached to every fact this phase produces.
    type Payload: Send + Sync;

    /// Phase name, used in logs and error messages.
    fn name(&self) -> &str;

    /// Document languages this phase runs on.
    fn languages(&self) -> &[Language];

    /// Whether consumers query this phase's results by value.
    fn needs_inverted_index(&self) -> bool {
        false
    }

    /// Syntax tree view the phase reads.
    fn code_view(&self) -> CodeView {
        CodeView::Filtered
    }

    /// Extract facts from one document.
    fn extract(&self, ctx: &DocumentContext) -> Result<Vec<Fact<Self::Payload>>, ExtractionError>;

    fn declaration(&self) -> PhaseDeclaration {
        PhaseDeclaration {
            name: self.name().to_string(),
            languages: self.languages().to_vec(),
            needs_inverted_index: self.needs_inverted_index(),
        }
    }
}

/// A phase backed by a plain function.
pub struct FnPhase<F> {
    name: String,
    languages: Vec<Language>,
    needs_inverted_index: bool,
    extract: F,
}

impl<F> FnPhase<F> {
    pub fn new(name: impl Into<String>, languages: Vec<Language>, extract: F) -> Self {
        Self {
            name: name.into(),
            languages,
            needs_inverted_index: false,
            extract,
        }
    }

    /// Declare that consumers need lookups by value.
    pub fn with_inverted_index(mut self) -> Self {
        self.needs_inverted_index = true;
        self
    }
}

impl<F, P> ExtractionPhase for FnPhase<F>
where
    F: Fn(&DocumentContext) -> Result<Vec<Fact<P>>, ExtractionError> + Send + Sync,
    P: Send + Sync,
{
    type Payload = P;

    fn name(&self) -> &str {
        &self.name
    }

    fn languages(&self) -> &[Language] {
        &self.languages
    }

    fn needs_inverted_index(&self) -> bool {
        self.needs_inverted_index
    }

    fn extract(&self, ctx: &DocumentContext) -> Result<Vec<Fact<P>>, ExtractionError> {
        (self.extract)(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_phase_declaration() {
        let phase = FnPhase::new(
            "names",
            vec![Language::Java],
            |ctx: &DocumentContext| -> Result<Vec<Fact<()>>, ExtractionError> {
                Ok(vec![Fact::new(ctx.uniform_path(), "x", ()).unwrap()])
            },
        )
        .with_inverted_index();

        let decl = phase.declaration();
        assert_eq!(decl.name, "names");
        assert_eq!(decl.languages, vec![Language::Java]);
        assert!(decl.needs_inverted_index);

        let ctx = DocumentContext::parsed("A.java", Some(Language::Java), vec![]);
        let facts = phase.extract(&ctx).unwrap();
        assert_eq!(facts[0].document_key(), "A.java");
    }
}
