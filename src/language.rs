//! Document classification by language.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Language of a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Java,
    Kotlin,
    Scala,
    Go,
    Rust,
    Python,
    JavaScript,
    TypeScript,
    C,
    Cpp,
}

impl Language {
    pub const ALL: &'static [Language] = &[
        Language::Java,
        Language::Kotlin,
        Language::Scala,
        Language::Go,
        Language::Rust,
        Language::Python,
        Language::JavaScript,
        Language::TypeScript,
        Language::C,
        Language::Cpp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Java => "java",
            Language::Kotlin => "kotlin",
            Language::Scala => "scala",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::C => "c",
            Language::Cpp => "cpp",
        }
    }

    /// File extensions (without dot) classified as this language.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Java => &["java"],
            Language::Kotlin => &["kt", "kts"],
            Language::Scala => &["scala", "sc"],
            Language::Go => &["go"],
            Language::Rust => &["rs"],
            Language::Python => &["py"],
            Language::JavaScript => &["js", "jsx", "mjs"],
            Language::TypeScript => &["ts", "tsx", "mts"],
            Language::C => &["c", "h"],
            Language::Cpp => &["cpp", "cc", "cxx", "hpp", "hh"],
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        Language::ALL
            .iter()
            .copied()
            .find(|lang| lang.extensions().contains(&ext))
    }

    /// Classify a path by its extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension().and_then(|e| e.to_str())?;
        Self::from_extension(ext)
    }

    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.to_lowercase();
        Language::ALL.iter().copied().find(|l| l.as_str() == lower)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
