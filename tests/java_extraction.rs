//! End-to-end tests: collect a Java corpus from disk, parse it, and index
//! its class declarations.

use std::fs;
use std::path::Path;

use declindex::config::TextFilterConfig;
use declindex::{
    ClassDeclaration, ClassDeclarationPhase, Corpus, ExtractionError, ExtractionRunner, RunOutput,
    ScanConfig, TextRegion,
};
use tempfile::TempDir;

const FIXTURES: &str = "testdata/java";

fn scan(root: &Path, config: &ScanConfig) -> RunOutput<TextRegion> {
    let runner = ExtractionRunner::new(ClassDeclarationPhase::new())
        .unwrap()
        .parallel(config.parallel);
    let corpus = Corpus::collect(root, config).unwrap();
    let contexts = corpus.load(runner.languages(), &config.text_filters().unwrap(), config.parallel);
    runner.run(&contexts).unwrap()
}

fn names<'a>(output: &'a RunOutput<TextRegion>, document: &str) -> Vec<&'a str> {
    output
        .store
        .by_document(document)
        .iter()
        .map(|f| f.value())
        .collect()
}

#[test]
fn test_fixture_corpus() {
    let output = scan(Path::new(FIXTURES), &ScanConfig::default());

    assert_eq!(names(&output, "com/example/Foo.java"), vec!["Foo", "Bar"]);
    assert_eq!(names(&output, "com/example/Outer.java"), vec!["Outer", "Inner", "Local"]);
    assert_eq!(names(&output, "other/Foo.java"), vec!["Foo"]);
    assert_eq!(names(&output, "Generated.java"), vec!["Generated", "Hidden", "Visible"]);

    let documents: Vec<_> = output.store.documents().collect();
    assert_eq!(
        documents,
        vec![
            "Generated.java",
            "com/example/Foo.java",
            "com/example/Outer.java",
            "other/Foo.java"
        ]
    );

    // notes.txt is not Java
    assert_eq!(output.skipped, 1);
    assert_eq!(output.processed, 5);
}

#[test]
fn test_lookup_by_simple_name() {
    let output = scan(Path::new(FIXTURES), &ScanConfig::default());

    let foo: Vec<_> = output
        .store
        .by_value("Foo")
        .unwrap()
        .iter()
        .map(|f| f.document_key())
        .collect();
    assert_eq!(foo, vec!["com/example/Foo.java", "other/Foo.java"]);

    // Records, interfaces and enums are not classes.
    assert!(output.store.by_value("Point").unwrap().is_empty());
    assert!(output.store.by_value("Callback").unwrap().is_empty());
    assert!(output.store.by_value("State").unwrap().is_empty());
}

#[test]
fn test_region_covers_header() {
    let output = scan(Path::new(FIXTURES), &ScanConfig::default());
    let source = fs::read_to_string(Path::new(FIXTURES).join("com/example/Foo.java")).unwrap();

    let bar = ClassDeclaration::from(output.store.by_document("com/example/Foo.java")[1]);
    assert_eq!(bar.class_name, "Bar");
    assert_eq!(bar.uniform_path(), "com/example/Foo.java");
    assert_eq!(bar.location.start_line, 6);
    assert_eq!(bar.location.end_line, 7);
    assert_eq!(bar.location.start_offset, source.find("final class Bar").unwrap());
    assert_eq!(bar.location.end_offset, source.rfind("Foo {").unwrap() + 4);
}

#[test]
fn test_broken_file_is_reported() {
    let output = scan(Path::new(FIXTURES), &ScanConfig::default());

    assert_eq!(output.failures.len(), 1);
    let failure = &output.failures[0];
    assert_eq!(failure.uniform_path, "Broken.java");
    match &failure.error {
        ExtractionError::MissingSyntaxTree { reason, .. } => {
            assert!(reason.as_deref().unwrap_or("").contains("syntax error"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(output.store.by_document("Broken.java").is_empty());
}

#[test]
fn test_text_filters_hide_generated_classes() {
    let config = ScanConfig {
        text_filters: vec![TextFilterConfig {
            begin: "@generated-begin".to_string(),
            end: "@generated-end".to_string(),
        }],
        ..Default::default()
    };
    let output = scan(Path::new(FIXTURES), &config);

    assert_eq!(names(&output, "Generated.java"), vec!["Generated", "Visible"]);
    assert!(output.store.by_value("Hidden").unwrap().is_empty());
}

#[test]
fn test_excluded_paths() {
    let config = ScanConfig {
        excluded_paths: vec!["other/**".to_string()],
        ..Default::default()
    };
    let output = scan(Path::new(FIXTURES), &config);

    let foo = output.store.by_value("Foo").unwrap();
    assert_eq!(foo.len(), 1);
    assert_eq!(foo[0].document_key(), "com/example/Foo.java");
}

#[test]
fn test_sequential_matches_parallel() {
    let parallel = scan(Path::new(FIXTURES), &ScanConfig::default());
    let sequential = scan(
        Path::new(FIXTURES),
        &ScanConfig {
            parallel: false,
            ..Default::default()
        },
    );

    let collect = |o: &RunOutput<TextRegion>| -> Vec<(String, String, usize)> {
        o.store
            .facts()
            .iter()
            .map(|f| (f.document_key().to_string(), f.value().to_string(), f.payload().start_offset))
            .collect()
    };
    assert_eq!(collect(&parallel), collect(&sequential));
}

#[test]
fn test_test_sources_are_opt_in() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("src/main/java")).unwrap();
    fs::create_dir_all(dir.path().join("src/test/java")).unwrap();
    fs::write(dir.path().join("src/main/java/App.java"), "class App {}\n").unwrap();
    fs::write(dir.path().join("src/main/java/AppTest.java"), "class AppTest {}\n").unwrap();
    fs::write(dir.path().join("src/test/java/Helper.java"), "class Helper {}\n").unwrap();

    let output = scan(dir.path(), &ScanConfig::default());
    assert_eq!(output.store.len(), 1);
    assert_eq!(names(&output, "src/main/java/App.java"), vec!["App"]);

    let output = scan(
        dir.path(),
        &ScanConfig {
            include_test_files: true,
            ..Default::default()
        },
    );
    assert_eq!(output.store.len(), 3);
    assert_eq!(names(&output, "src/test/java/Helper.java"), vec!["Helper"]);
}
