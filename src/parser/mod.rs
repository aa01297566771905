//! Shallow parsers that turn source text into entity trees.
//!
//! Parsers are looked up by [`Language`]. Documents of a language without a
//! parser still get a context, but it carries no syntax tree.

mod java;

pub use java::JavaParser;

use once_cell::sync::OnceCell;

use crate::extraction::ShallowEntity;
use crate::language::Language;

/// Language-specific shallow parser.
pub trait ShallowParser: Send + Sync {
    fn language(&self) -> Language;

    /// Parse a whole document.
    ///
    /// Fails on syntax errors: a partial tree would shift entity boundaries
    /// and yield facts with wrong regions.
    fn parse(&self, source: &[u8]) -> anyhow::Result<Vec<ShallowEntity>>;
}

static JAVA_PARSER: OnceCell<JavaParser> = OnceCell::new();

/// Get the parser for `language`, if one exists.
pub fn for_language(language: Language) -> Option<&'static dyn ShallowParser> {
    match language {
        Language::Java => Some(JAVA_PARSER.get_or_init(JavaParser::new) as &'static dyn ShallowParser),
        _ => None,
    }
}

/// Languages with a registered parser.
pub fn supported_languages() -> Vec<Language> {
    Language::ALL
        .iter()
        .copied()
        .filter(|l| for_language(*l).is_some())
        .collect()
}
