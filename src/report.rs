//! Output formatting for scan results.
//!
//! Supports two output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption

use colored::*;
use serde::{Deserialize, Serialize};

use crate::error::CapabilityError;
use crate::extraction::{RunOutput, TextRegion};

/// JSON report structure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScanReport {
    pub version: String,
    pub path: String,
    pub phase: String,
    pub inverted_index: bool,
    pub documents_scanned: usize,
    pub documents_skipped: usize,
    pub class_count: usize,
    pub documents: Vec<DocumentEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lookups: Vec<LookupEntry>,
    pub failures: Vec<FailureEntry>,
}

/// Declarations of one document.
#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub uniform_path: String,
    pub classes: Vec<ClassEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClassEntry {
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
    pub start_offset: usize,
    pub end_offset: usize,
}

/// Answer to one lookup by simple name.
#[derive(Debug, Serialize, Deserialize)]
pub struct LookupEntry {
    pub value: String,
    pub declarations: Vec<LocatedEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LocatedEntry {
    pub uniform_path: String,
    pub start_line: usize,
    pub end_line: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FailureEntry {
    pub uniform_path: String,
    pub reason: String,
}

fn class_entry(name: &str, region: &TextRegion) -> ClassEntry {
    ClassEntry {
        name: name.to_string(),
        start_line: region.start_line,
        end_line: region.end_line,
        start_offset: region.start_offset,
        end_offset: region.end_offset,
    }
}

/// Assemble a report from a finished run.
///
/// Each of `lookups` is answered from the inverted index; this fails if the
/// run did not build one.
pub fn build_report(
    path: &str,
    phase: &str,
    output: &RunOutput<TextRegion>,
    lookups: &[String],
) -> Result<ScanReport, CapabilityError> {
    let store = &output.store;

    let documents = store
        .documents()
        .map(|doc| DocumentEntry {
            uniform_path: doc.to_string(),
            classes: store
                .by_document(doc)
                .iter()
                .map(|f| class_entry(f.value(), f.payload()))
                .collect(),
        })
        .collect();

    let lookups = lookups
        .iter()
        .map(|value| {
            let declarations = store
                .by_value(value)?
                .iter()
                .map(|f| LocatedEntry {
                    uniform_path: f.document_key().to_string(),
                    start_line: f.payload().start_line,
                    end_line: f.payload().end_line,
                })
                .collect();
            Ok(LookupEntry {
                value: value.clone(),
                declarations,
            })
        })
        .collect::<Result<Vec<_>, CapabilityError>>()?;

    let failures = output
        .failures
        .iter()
        .map(|f| FailureEntry {
            uniform_path: f.uniform_path.clone(),
            reason: f.error.to_string(),
        })
        .collect();

    Ok(ScanReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: path.to_string(),
        phase: phase.to_string(),
        inverted_index: store.has_inverted_index(),
        documents_scanned: output.processed,
        documents_skipped: output.skipped,
        class_count: store.len(),
        documents,
        lookups,
        failures,
    })
}

/// Write results in JSON format.
pub fn write_json(report: &ScanReport) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{}", json);
    Ok(())
}

/// Write results in pretty format with colors.
pub fn write_pretty(report: &ScanReport) {
    // Header
    println!();
    print!("  ");
    print!("{}", "declindex".cyan().bold());
    println!(" v{}", report.version);
    println!();

    print!("  {}", "Scanning: ".dimmed());
    println!("{}", report.path);
    print!("  {}", "Phase:    ".dimmed());
    let inverted = if report.inverted_index { "by document, by value" } else { "by document" };
    println!("{} {}", report.phase, format!("({})", inverted).dimmed());
    println!();

    if !report.documents.is_empty() {
        write_documents(&report.documents);
        println!();
    }

    for lookup in &report.lookups {
        write_lookup(lookup);
        println!();
    }

    if !report.failures.is_empty() {
        write_failures(&report.failures);
        println!();
    }

    write_summary(report);
    println!();
}

fn write_documents(documents: &[DocumentEntry]) {
    for doc in documents {
        println!("  {}", doc.uniform_path.bold());
        let width = doc.classes.iter().map(|c| c.name.len()).max().unwrap_or(0);
        for class in &doc.classes {
            print!("    {:<width$}  ", class.name, width = width);
            println!("{}", line_span(class.start_line, class.end_line).dimmed());
        }
    }
}

fn write_lookup(lookup: &LookupEntry) {
    print!("  {} ", "Lookup".cyan());
    println!("{}", format!("\"{}\"", lookup.value).bold());
    if lookup.declarations.is_empty() {
        println!("    {}", "no declarations".dimmed());
        return;
    }
    for decl in &lookup.declarations {
        println!("    {}:{}", decl.uniform_path, decl.start_line);
    }
}

fn write_failures(failures: &[FailureEntry]) {
    println!("  {}", format!("Failures ({})", failures.len()).red().bold());
    for failure in failures {
        print!("    {} ", "✗".red());
        println!("{}", failure.reason);
    }
}

fn write_summary(report: &ScanReport) {
    if report.failures.is_empty() {
        print!("  {}", "✓ OK".green());
    } else {
        print!("  {}", "✗ PARTIAL".yellow());
    }
    print!(
        "  {} documents, {} classes",
        report.documents_scanned, report.class_count
    );
    if !report.failures.is_empty() {
        print!(", {}", format!("{} failed", report.failures.len()).red());
    }
    if report.documents_skipped > 0 {
        print!(
            "  {}",
            format!("({} skipped)", report.documents_skipped).dimmed()
        );
    }
    println!();
}

fn line_span(start: usize, end: usize) -> String {
    if start == end {
        format!("line {}", start)
    } else {
        format!("lines {}-{}", start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractionError;
    use crate::extraction::{CodeView, DocumentFailure, Fact, ResultStore};

    fn region(path: &str, line: usize) -> TextRegion {
        TextRegion {
            uniform_path: path.to_string(),
            start_offset: line * 10,
            end_offset: line * 10 + 8,
            start_line: line,
            end_line: line,
        }
    }

    fn output(inverted: bool) -> RunOutput<TextRegion> {
        let facts = vec![
            Fact::new("A.java", "Foo", region("A.java", 1)).unwrap(),
            Fact::new("A.java", "Bar", region("A.java", 4)).unwrap(),
            Fact::new("B.java", "Foo", region("B.java", 2)).unwrap(),
        ];
        RunOutput {
            store: ResultStore::build(facts, inverted),
            failures: vec![DocumentFailure {
                uniform_path: "C.java".to_string(),
                error: ExtractionError::MissingSyntaxTree {
                    uniform_path: "C.java".to_string(),
                    view: CodeView::Filtered,
                    reason: None,
                },
            }],
            processed: 3,
            skipped: 1,
        }
    }

    #[test]
    fn test_build_report() {
        let report = build_report(".", "class-declarations", &output(true), &["Foo".to_string()]).unwrap();

        assert_eq!(report.documents.len(), 2);
        assert_eq!(report.documents[0].uniform_path, "A.java");
        let names: Vec<_> = report.documents[0].classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Foo", "Bar"]);

        assert_eq!(report.lookups.len(), 1);
        let paths: Vec<_> = report.lookups[0]
            .declarations
            .iter()
            .map(|d| d.uniform_path.as_str())
            .collect();
        assert_eq!(paths, vec!["A.java", "B.java"]);

        assert_eq!(report.failures[0].uniform_path, "C.java");
        assert_eq!(report.class_count, 3);
        assert_eq!(report.documents_skipped, 1);
    }

    #[test]
    fn test_lookup_without_inverted_index_fails() {
        let err = build_report(".", "p", &output(false), &["Foo".to_string()]).unwrap_err();
        assert_eq!(err, CapabilityError::InvertedIndexNotBuilt);

        let report = build_report(".", "p", &output(false), &[]).unwrap();
        assert!(!report.inverted_index);
    }

    #[test]
    fn test_json_shape() {
        let report = build_report(".", "class-declarations", &output(true), &[]).unwrap();
        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["phase"], "class-declarations");
        assert_eq!(json["documents"][1]["classes"][0]["name"], "Foo");
        assert!(json.get("lookups").is_none());
        assert_eq!(json["failures"][0]["uniform_path"], "C.java");
    }

    #[test]
    fn test_line_span() {
        assert_eq!(line_span(3, 3), "line 3");
        assert_eq!(line_span(3, 5), "lines 3-5");
    }
}
