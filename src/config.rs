//! Scan configuration.
//!
//! A YAML file tunes how the corpus is collected and how the phase runs:
//!
//! ```yaml
//! version: "1"
//! name: "my-project"
//! languages: [java]
//! inverted_index: true
//! excluded_paths:
//!   - "**/generated/**"
//! text_filters:
//!   - begin: "@generated-begin"
//!     end: "@generated-end"
//! ```

use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::corpus::TextFilter;
use crate::error::ConfigurationError;
use crate::language::Language;

/// File names searched for when no configuration is given.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["declindex.yaml", ".declindex.yaml"];

fn default_true() -> bool {
    true
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScanConfig {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub name: String,
    /// Restrict the run to these languages (default: every language the phase supports).
    #[serde(default)]
    pub languages: Vec<String>,
    /// Override the phase's inverted index declaration.
    #[serde(default)]
    pub inverted_index: Option<bool>,
    /// Load and extract documents in parallel (default: true).
    #[serde(default = "default_true")]
    pub parallel: bool,
    /// Whether to include test sources (default: false).
    #[serde(default)]
    pub include_test_files: bool,
    /// Glob patterns, matched against uniform paths, of documents to leave out.
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    /// Regions removed from the filtered code view.
    #[serde(default)]
    pub text_filters: Vec<TextFilterConfig>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            version: String::new(),
            name: String::new(),
            languages: Vec::new(),
            inverted_index: None,
            parallel: true,
            include_test_files: false,
            excluded_paths: Vec::new(),
            text_filters: Vec::new(),
        }
    }
}

/// A region filter: from a line matching `begin` through a line matching `end`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TextFilterConfig {
    pub begin: String,
    pub end: String,
}

impl ScanConfig {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigurationError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse_str(&content)
    }

    pub fn parse_str(content: &str) -> Result<Self, ConfigurationError> {
        let config: ScanConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Configured language restriction.
    pub fn languages(&self) -> Result<Vec<Language>, ConfigurationError> {
        let mut languages = Vec::new();
        for name in &self.languages {
            let lang = Language::parse(name)
                .ok_or_else(|| ConfigurationError::UnknownLanguage(name.clone()))?;
            if languages.contains(&lang) {
                return Err(ConfigurationError::ConflictingOptions(format!(
                    "language `{}` is listed more than once",
                    lang
                )));
            }
            languages.push(lang);
        }
        Ok(languages)
    }

    /// Compiled matcher for `excluded_paths`.
    pub fn excluded_matcher(&self) -> Result<GlobSet, ConfigurationError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.excluded_paths {
            let glob = Glob::new(pattern).map_err(|source| ConfigurationError::InvalidGlob {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        builder.build().map_err(|source| ConfigurationError::InvalidGlob {
            pattern: self.excluded_paths.join(", "),
            source,
        })
    }

    /// Compiled text filters.
    pub fn text_filters(&self) -> Result<Vec<TextFilter>, ConfigurationError> {
        self.text_filters
            .iter()
            .map(|f| Ok(TextFilter::new(compile(&f.begin)?, compile(&f.end)?)))
            .collect()
    }

    /// Check every pattern and language name.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.languages()?;
        self.excluded_matcher()?;
        self.text_filters()?;
        Ok(())
    }
}

fn compile(pattern: &str) -> Result<Regex, ConfigurationError> {
    Regex::new(pattern).map_err(|source| ConfigurationError::InvalidRegex {
        pattern: pattern.to_string(),
        source,
    })
}
