//! Corpus collection and document loading.
//!
//! Walks a directory, assigns each file its uniform path, and turns files
//! into [`DocumentContext`]s by running the language's shallow parser.

use globset::GlobSet;
use rayon::prelude::*;
use regex::Regex;
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::ScanConfig;
use crate::extraction::{DocumentContext, ShallowEntity};
use crate::language::Language;
use crate::parser;

/// Directories never descended into.
const SKIPPED_DIRS: &[&str] = &["node_modules", "vendor", "target", "build", "out", "bin"];

/// Directories holding test sources.
const TEST_DIRS: &[&str] = &["test", "tests", "testdata", "test_data", "__tests__"];

/// One file of the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub uniform_path: String,
    pub path: PathBuf,
    pub language: Option<Language>,
}

/// Ordered set of documents under one root.
#[derive(Debug, Clone)]
pub struct Corpus {
    root: PathBuf,
    documents: Vec<Document>,
}

/// Corpus-relative, `/`-separated path of `path` under `root`.
///
/// `.` components are dropped and `..` pops the previous component, so the
/// same file always gets the same key.
pub fn uniform_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut parts: Vec<String> = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().to_string()),
            Component::ParentDir => {
                parts.pop();
            }
            _ => {}
        }
    }
    parts.join("/")
}

fn is_test_file(name: &str) -> bool {
    name.ends_with("Test.java") || name.ends_with("Tests.java") || name.ends_with("_test.go")
}

impl Corpus {
    /// Collect the documents under `root` (a directory or a single file).
    ///
    /// Documents are ordered by uniform path so runs are reproducible.
    pub fn collect(root: &Path, config: &ScanConfig) -> anyhow::Result<Self> {
        let excluded = config.excluded_matcher()?;

        if root.is_file() {
            let base = root.parent().unwrap_or(Path::new(""));
            let document = Document {
                uniform_path: uniform_path(base, root),
                path: root.to_path_buf(),
                language: Language::from_path(root),
            };
            return Ok(Self {
                root: base.to_path_buf(),
                documents: vec![document],
            });
        }

        let include_tests = config.include_test_files;
        let mut documents = Vec::new();

        for entry in WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if e.depth() == 0 || !e.file_type().is_dir() {
                    return true;
                }
                let lossy = e.file_name().to_string_lossy();
                let name: &str = &lossy;
                if name.starts_with('.') || SKIPPED_DIRS.contains(&name) {
                    return false;
                }
                include_tests || !TEST_DIRS.contains(&name)
            })
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "cannot walk entry");
                    // A broken source file is kept so loading reports it as a failure.
                    if let Some(path) = e.path().filter(|p| Language::from_path(p).is_some()) {
                        documents.extend(candidate(root, path, include_tests, &excluded));
                    }
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            documents.extend(candidate(root, entry.path(), include_tests, &excluded));
        }

        documents.sort_by(|a, b| a.uniform_path.cmp(&b.uniform_path));
        debug!(root = %root.display(), documents = documents.len(), "collected corpus");

        Ok(Self {
            root: root.to_path_buf(),
            documents,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Build contexts for every document, in corpus order.
    ///
    /// Only documents of `languages` are read and parsed; the rest get a
    /// context without a syntax tree. Read and parse failures become
    /// unparsed contexts carrying the reason. With `parallel` unset the
    /// documents are read one after another.
    pub fn load(&self, languages: &[Language], filters: &[TextFilter], parallel: bool) -> Vec<DocumentContext> {
        let load = |doc: &Document| load_document(doc, languages, filters);
        if parallel {
            self.documents.par_iter().map(load).collect()
        } else {
            self.documents.iter().map(load).collect()
        }
    }
}

/// Document for the file at `path`, unless test or exclusion rules drop it.
fn candidate(root: &Path, path: &Path, include_tests: bool, excluded: &GlobSet) -> Option<Document> {
    let name = path.file_name()?.to_string_lossy();
    if !include_tests && is_test_file(&name) {
        return None;
    }
    let uniform = uniform_path(root, path);
    if is_excluded(excluded, &uniform) {
        debug!(document = %uniform, "excluded by configuration");
        return None;
    }
    Some(Document {
        uniform_path: uniform,
        path: path.to_path_buf(),
        language: Language::from_path(path),
    })
}

fn is_excluded(excluded: &GlobSet, uniform_path: &str) -> bool {
    !excluded.is_empty() && excluded.is_match(uniform_path)
}

fn load_document(doc: &Document, languages: &[Language], filters: &[TextFilter]) -> DocumentContext {
    let Some(language) = doc.language.filter(|l| languages.contains(l)) else {
        return DocumentContext::unparsed(&doc.uniform_path, doc.language, "language not analyzed");
    };
    let Some(shallow) = parser::for_language(language) else {
        return DocumentContext::unparsed(
            &doc.uniform_path,
            Some(language),
            format!("no parser for {}", language),
        );
    };

    let source = match fs::read(&doc.path) {
        Ok(source) => source,
        Err(e) => {
            warn!(document = %doc.uniform_path, error = %e, "cannot read document");
            return DocumentContext::unparsed(&doc.uniform_path, Some(language), e.to_string());
        }
    };

    match shallow.parse(&source) {
        Ok(entities) => build_context(&doc.uniform_path, language, &source, entities, filters),
        Err(e) => {
            debug!(document = %doc.uniform_path, error = %e, "parse failed");
            DocumentContext::unparsed(&doc.uniform_path, Some(language), e.to_string())
        }
    }
}

/// Context for parsed `entities`, with a filtered view when filters apply.
pub fn build_context(
    uniform_path: &str,
    language: Language,
    source: &[u8],
    entities: Vec<ShallowEntity>,
    filters: &[TextFilter],
) -> DocumentContext {
    let text = String::from_utf8_lossy(source);
    let regions: Vec<_> = filters.iter().flat_map(|f| f.filtered_lines(&text)).collect();

    if regions.is_empty() {
        return DocumentContext::parsed(uniform_path, Some(language), entities);
    }
    let filtered = filter_entities(&entities, &regions);
    DocumentContext::parsed(uniform_path, Some(language), entities).with_filtered(filtered)
}

/// Removes regions of a document from the filtered code view.
#[derive(Debug, Clone)]
pub struct TextFilter {
    begin: Regex,
    end: Regex,
}

impl TextFilter {
    pub fn new(begin: Regex, end: Regex) -> Self {
        Self { begin, end }
    }

    /// 1-based inclusive line ranges covered by this filter.
    ///
    /// A region opened by `begin` and never closed runs to the last line.
    pub fn filtered_lines(&self, text: &str) -> Vec<RangeInclusive<usize>> {
        let mut regions = Vec::new();
        let mut open: Option<usize> = None;
        let mut last = 0;

        for (idx, line) in text.lines().enumerate() {
            let number = idx + 1;
            last = number;
            match open {
                None => {
                    let Some(begin) = self.begin.find(line) else {
                        continue;
                    };
                    if self.end.find_at(line, begin.end()).is_some() {
                        regions.push(number..=number);
                    } else {
                        open = Some(number);
                    }
                }
                Some(start) if self.end.is_match(line) => {
                    regions.push(start..=number);
                    open = None;
                }
                _ => {}
            }
        }
        if let Some(start) = open {
            regions.push(start..=last);
        }
        regions
    }
}

/// Drop entities starting inside a filtered region, with their children.
fn filter_entities(entities: &[ShallowEntity], regions: &[RangeInclusive<usize>]) -> Vec<ShallowEntity> {
    entities
        .iter()
        .filter(|e| {
            e.first_own_token()
                .map(|t| !regions.iter().any(|r| r.contains(&t.line)))
                .unwrap_or(true)
        })
        .map(|e| ShallowEntity {
            children: filter_entities(&e.children, regions),
            ..e.clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::{CodeView, EntityKind, Token};
    use tempfile::TempDir;

    #[test]
    fn test_uniform_path() {
        let root = Path::new("/repo");
        assert_eq!(uniform_path(root, Path::new("/repo/src/main/A.java")), "src/main/A.java");
        assert_eq!(uniform_path(root, Path::new("/repo/./src/../lib/B.java")), "lib/B.java");
        assert_eq!(uniform_path(Path::new("/other"), Path::new("rel/C.java")), "rel/C.java");
    }

    #[test]
    fn test_filtered_lines() {
        let filter = TextFilter::new(
            Regex::new("BEGIN-GEN").unwrap(),
            Regex::new("END-GEN").unwrap(),
        );
        let text = "a\n// BEGIN-GEN\nb\n// END-GEN\nc\n// BEGIN-GEN // END-GEN\n// BEGIN-GEN\nd\n";
        assert_eq!(filter.filtered_lines(text), vec![2..=4, 6..=6, 7..=8]);
    }

    fn entity(name: &str, line: usize, children: Vec<ShallowEntity>) -> ShallowEntity {
        ShallowEntity {
            kind: EntityKind::Type,
            subtype: "class".to_string(),
            name: name.to_string(),
            own_start_tokens: vec![Token {
                text: "class".to_string(),
                offset: line * 10,
                line,
            }],
            own_end_tokens: vec![],
            children,
        }
    }

    #[test]
    fn test_filter_entities_drops_subtrees() {
        let tree = vec![
            entity("Keep", 1, vec![entity("Generated", 3, vec![entity("Deep", 4, vec![])])]),
            entity("AlsoKeep", 10, vec![]),
        ];
        let filtered = filter_entities(&tree, &[3..=5]);
        assert_eq!(filtered.len(), 2);
        assert!(filtered[0].children.is_empty());
    }

    #[test]
    fn test_collect_skips_tests_and_exclusions() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("src/main/java/pkg")).unwrap();
        fs::create_dir_all(root.join("src/test/java/pkg")).unwrap();
        fs::create_dir_all(root.join("src/generated")).unwrap();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::write(root.join("src/main/java/pkg/B.java"), "class B {}").unwrap();
        fs::write(root.join("src/main/java/pkg/A.java"), "class A {}").unwrap();
        fs::write(root.join("src/main/java/pkg/ATest.java"), "class ATest {}").unwrap();
        fs::write(root.join("src/test/java/pkg/T.java"), "class T {}").unwrap();
        fs::write(root.join("src/generated/G.java"), "class G {}").unwrap();
        fs::write(root.join(".git/config"), "").unwrap();
        fs::write(root.join("README.md"), "# readme").unwrap();

        let config = ScanConfig {
            excluded_paths: vec!["**/generated/**".to_string()],
            ..Default::default()
        };
        let corpus = Corpus::collect(root, &config).unwrap();
        let paths: Vec<_> = corpus.documents().iter().map(|d| d.uniform_path.as_str()).collect();
        assert_eq!(paths, vec!["README.md", "src/main/java/pkg/A.java", "src/main/java/pkg/B.java"]);
        assert_eq!(corpus.documents()[0].language, None);

        let with_tests = ScanConfig {
            include_test_files: true,
            ..Default::default()
        };
        let corpus = Corpus::collect(root, &with_tests).unwrap();
        assert!(corpus.documents().iter().any(|d| d.uniform_path == "src/test/java/pkg/T.java"));
        assert!(corpus.documents().iter().any(|d| d.uniform_path == "src/main/java/pkg/ATest.java"));
    }

    #[test]
    fn test_load_parses_selected_languages() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("A.java"), "class A {}").unwrap();
        fs::write(root.join("Broken.java"), "class Broken {").unwrap();
        fs::write(root.join("main.go"), "package main").unwrap();

        let corpus = Corpus::collect(root, &ScanConfig::default()).unwrap();
        let contexts = corpus.load(&[Language::Java], &[], true);
        let sequential = corpus.load(&[Language::Java], &[], false);
        let paths = |cs: &[DocumentContext]| cs.iter().map(|c| c.uniform_path().to_string()).collect::<Vec<_>>();
        assert_eq!(paths(&contexts), paths(&sequential));

        assert_eq!(contexts.len(), 3);
        assert_eq!(contexts[0].uniform_path(), "A.java");
        assert!(contexts[0].is_parsed());
        assert_eq!(contexts[1].uniform_path(), "Broken.java");
        assert!(contexts[1].syntax_tree(CodeView::Raw).is_err());
        assert_eq!(contexts[2].language(), Some(Language::Go));
        assert!(!contexts[2].is_parsed());
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_does_not_abort_collection() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("A.java"), "class A {}").unwrap();
        std::os::unix::fs::symlink(root.join("gone.java"), root.join("dangling.java")).unwrap();

        let corpus = Corpus::collect(root, &ScanConfig::default()).unwrap();
        let paths: Vec<_> = corpus.documents().iter().map(|d| d.uniform_path.as_str()).collect();
        assert_eq!(paths, vec!["A.java", "dangling.java"]);

        let contexts = corpus.load(&[Language::Java], &[], false);
        assert!(contexts[0].is_parsed());
        assert!(!contexts[1].is_parsed());
        assert!(contexts[1].syntax_tree(CodeView::Raw).is_err());
    }

    #[test]
    fn test_single_file_root() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("Only.java");
        fs::write(&file, "class Only {}").unwrap();

        let corpus = Corpus::collect(&file, &ScanConfig::default()).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.documents()[0].uniform_path, "Only.java");
    }
}
