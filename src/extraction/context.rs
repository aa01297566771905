//! Read-only document context handed to extraction phases.
//!
//! A context carries a document's uniform path, its language, and the
//! shallow entity tree the parser produced for each code view. Phases query
//! it; they never own or mutate it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ExtractionError;
use crate::language::Language;

/// Which rendition of a document's syntax tree to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeView {
    /// Every entity the parser found.
    Raw,
    /// Entities inside configured text-filter regions removed.
    Filtered,
}

impl fmt::Display for CodeView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeView::Raw => write!(f, "raw"),
            CodeView::Filtered => write!(f, "filtered"),
        }
    }
}

/// Coarse classification of a shallow entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Module,
    Type,
    Method,
    Attribute,
    Statement,
}

/// Well-known subtype names.
pub mod subtypes {
    pub const CLASS: &str = "class";
    pub const INTERFACE: &str = "interface";
    pub const ENUM: &str = "enum";
    pub const RECORD: &str = "record";
    pub const ANNOTATION: &str = "annotation";
    pub const METHOD: &str = "method";
    pub const CONSTRUCTOR: &str = "constructor";
    pub const ATTRIBUTE: &str = "attribute";
    pub const PACKAGE: &str = "package";
}

/// A lexical token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    /// Byte offset of the token start (0-indexed).
    pub offset: usize,
    /// Line of the token start (1-indexed).
    pub line: usize,
}

/// A syntactic entity with its own tokens and nested children.
///
/// `own_start_tokens` covers the entity's header up to (and including) the
/// opening of its body; `own_end_tokens` covers the closing of the body.
/// Tokens of nested children belong to the children only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShallowEntity {
    pub kind: EntityKind,
    pub subtype: String,
    pub name: String,
    pub own_start_tokens: Vec<Token>,
    pub own_end_tokens: Vec<Token>,
    pub children: Vec<ShallowEntity>,
}

impl ShallowEntity {
    pub fn is(&self, kind: EntityKind, subtype: &str) -> bool {
        self.kind == kind && self.subtype == subtype
    }

    pub fn first_own_token(&self) -> Option<&Token> {
        self.own_start_tokens.first()
    }

    pub fn last_own_start_token(&self) -> Option<&Token> {
        self.own_start_tokens.last()
    }
}

/// Collect all entities of `kind` in pre-order (source order, parents
/// before their nested children).
pub fn entities_of_kind(entities: &[ShallowEntity], kind: EntityKind) -> Vec<&ShallowEntity> {
    let mut out = Vec::new();
    collect_of_kind(entities, kind, &mut out);
    out
}

fn collect_of_kind<'a>(
    entities: &'a [ShallowEntity],
    kind: EntityKind,
    out: &mut Vec<&'a ShallowEntity>,
) {
    for entity in entities {
        if entity.kind == kind {
            out.push(entity);
        }
        collect_of_kind(&entity.children, kind, out);
    }
}

/// Syntax trees for one document, or the reason there are none.
#[derive(Debug, Clone)]
enum SyntaxTrees {
    Parsed {
        raw: Vec<ShallowEntity>,
        filtered: Option<Vec<ShallowEntity>>,
    },
    Unavailable(String),
}

/// Everything a phase may know about one document.
#[derive(Debug, Clone)]
pub struct DocumentContext {
    uniform_path: String,
    language: Option<Language>,
    trees: SyntaxTrees,
}

impl DocumentContext {
    /// Context for a parsed document with only a raw view.
    pub fn parsed(
        uniform_path: impl Into<String>,
        language: Option<Language>,
        entities: Vec<ShallowEntity>,
    ) -> Self {
        Self {
            uniform_path: uniform_path.into(),
            language,
            trees: SyntaxTrees::Parsed {
                raw: entities,
                filtered: None,
            },
        }
    }

    /// Context for a document that could not be parsed.
    pub fn unparsed(
        uniform_path: impl Into<String>,
        language: Option<Language>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            uniform_path: uniform_path.into(),
            language,
            trees: SyntaxTrees::Unavailable(reason.into()),
        }
    }

    /// Attach a filtered view. No-op for unparsed documents.
    pub fn with_filtered(mut self, entities: Vec<ShallowEntity>) -> Self {
        if let SyntaxTrees::Parsed { filtered, .. } = &mut self.trees {
            *filtered = Some(entities);
        }
        self
    }

    pub fn uniform_path(&self) -> &str {
        &self.uniform_path
    }

    pub fn language(&self) -> Option<Language> {
        self.language
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self.trees, SyntaxTrees::Parsed { .. })
    }

    /// Entity tree for the requested view.
    ///
    /// A document parsed without text filters serves its raw tree for the
    /// filtered view as well: with no filter, nothing is removed.
    pub fn syntax_tree(&self, view: CodeView) -> Result<&[ShallowEntity], ExtractionError> {
        match &self.trees {
            SyntaxTrees::Parsed { raw, filtered } => match view {
                CodeView::Raw => Ok(raw),
                CodeView::Filtered => Ok(filtered.as_deref().unwrap_or(raw)),
            },
            SyntaxTrees::Unavailable(reason) => Err(ExtractionError::MissingSyntaxTree {
                uniform_path: self.uniform_path.clone(),
                view,
                reason: Some(reason.clone()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(kind: EntityKind, subtype: &str, name: &str, children: Vec<ShallowEntity>) -> ShallowEntity {
        ShallowEntity {
            kind,
            subtype: subtype.to_string(),
            name: name.to_string(),
            own_start_tokens: vec![],
            own_end_tokens: vec![],
            children,
        }
    }

    #[test]
    fn test_entities_of_kind_is_preorder() {
        let tree = vec![
            entity(
                EntityKind::Type,
                subtypes::CLASS,
                "Outer",
                vec![
                    entity(EntityKind::Method, subtypes::METHOD, "run", vec![]),
                    entity(EntityKind::Type, subtypes::CLASS, "Inner", vec![]),
                ],
            ),
            entity(EntityKind::Type, subtypes::INTERFACE, "Api", vec![]),
        ];

        let names: Vec<_> = entities_of_kind(&tree, EntityKind::Type)
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["Outer", "Inner", "Api"]);
    }

    #[test]
    fn test_filtered_view_falls_back_to_raw() {
        let ctx = DocumentContext::parsed(
            "A.java",
            Some(Language::Java),
            vec![entity(EntityKind::Type, subtypes::CLASS, "A", vec![])],
        );
        assert_eq!(ctx.syntax_tree(CodeView::Filtered).unwrap().len(), 1);

        let ctx = ctx.with_filtered(vec![]);
        assert_eq!(ctx.syntax_tree(CodeView::Filtered).unwrap().len(), 0);
        assert_eq!(ctx.syntax_tree(CodeView::Raw).unwrap().len(), 1);
    }

    #[test]
    fn test_unparsed_context_reports_path() {
        let ctx = DocumentContext::unparsed("bad/B.java", Some(Language::Java), "syntax error");
        assert!(!ctx.is_parsed());
        let err = ctx.syntax_tree(CodeView::Raw).unwrap_err();
        assert_eq!(err.uniform_path(), "bad/B.java");
    }
}
