//! Concrete extraction phases.

mod class_declarations;

pub use class_declarations::{ClassDeclaration, ClassDeclarationPhase};
