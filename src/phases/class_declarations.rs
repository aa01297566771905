//! Class declaration extraction.
//!
//! Records every class declared in a Java file, inner and local classes
//! included, so rules can ask which classes a file declares and which files
//! declare a class of a given simple name:
//!
//! ```text
//! "src/A.java" -> "A"     (region of `class A {`)
//! "src/A.java" -> "Inner" (region of `class Inner {`)
//! "src/B.java" -> "B"
//! "src/B.java" -> "Inner"
//! ```
//!
//! Lookup by name needs the inverted index, so the phase declares it.

use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;
use crate::extraction::{
    entities_of_kind, subtypes, CodeView, DocumentContext, EntityKind, ExtractionPhase, Fact,
    ShallowEntity, TextRegion,
};
use crate::language::Language;

/// Name and location of one class declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDeclaration {
    /// Simple name of the declared class.
    pub class_name: String,
    /// Region of the declaration header.
    pub location: TextRegion,
}

impl ClassDeclaration {
    /// Rebuild a declaration from a stored (path, value, payload) triple.
    pub fn from_parts(uniform_path: &str, value: &str, mut location: TextRegion) -> Self {
        location.uniform_path = uniform_path.to_string();
        Self {
            class_name: value.to_string(),
            location,
        }
    }

    pub fn uniform_path(&self) -> &str {
        &self.location.uniform_path
    }

    /// Convert into a fact keyed by the declaring file and the class name.
    pub fn into_fact(self) -> Option<Fact<TextRegion>> {
        Fact::new(self.location.uniform_path.clone(), self.class_name, self.location)
    }
}

impl From<&Fact<TextRegion>> for ClassDeclaration {
    fn from(fact: &Fact<TextRegion>) -> Self {
        ClassDeclaration::from_parts(fact.document_key(), fact.value(), fact.payload().clone())
    }
}

const LANGUAGES: &[Language] = &[Language::Java];

/// Extracts class declarations from Java documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassDeclarationPhase;

impl ClassDeclarationPhase {
    pub const NAME: &'static str = "class-declarations";

    pub fn new() -> Self {
        Self
    }

    /// Declarations of one document, in source order.
    pub fn declarations(&self, ctx: &DocumentContext) -> Result<Vec<ClassDeclaration>, ExtractionError> {
        let entities = ctx.syntax_tree(self.code_view())?;

        entities_of_kind(entities, EntityKind::Type)
            .into_iter()
            .filter(|entity| entity.subtype == subtypes::CLASS)
            .map(|entity| {
                Ok(ClassDeclaration {
                    class_name: entity.name.clone(),
                    location: header_region(ctx.uniform_path(), entity)?,
                })
            })
            .collect()
    }
}

/// Region from the first to the last own start token of `entity`.
fn header_region(uniform_path: &str, entity: &ShallowEntity) -> Result<TextRegion, ExtractionError> {
    let (Some(start), Some(end)) = (entity.first_own_token(), entity.last_own_start_token()) else {
        return Err(ExtractionError::EmptyEntity {
            uniform_path: uniform_path.to_string(),
            entity: entity.name.clone(),
        });
    };
    Ok(TextRegion {
        uniform_path: uniform_path.to_string(),
        start_offset: start.offset,
        end_offset: end.offset,
        start_line: start.line,
        end_line: end.line,
    })
}

impl ExtractionPhase for ClassDeclarationPhase {
    type Payload = TextRegion;

    fn name(&self) -> &str {
        Self::NAME
    }

    fn languages(&self) -> &[Language] {
        LANGUAGES
    }

    fn needs_inverted_index(&self) -> bool {
        true
    }

    fn extract(&self, ctx: &DocumentContext) -> Result<Vec<Fact<TextRegion>>, ExtractionError> {
        self.declarations(ctx)?
            .into_iter()
            .map(|decl| {
                let name = decl.class_name.clone();
                decl.into_fact().ok_or_else(|| ExtractionError::Failed {
                    uniform_path: ctx.uniform_path().to_string(),
                    message: format!("class `{}` has no document key", name),
                })
            })
            .collect()
    }
}
