//! Command-line interface for declindex.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::{ScanConfig, DEFAULT_CONFIG_NAMES};
use crate::corpus::Corpus;
use crate::error::ConfigurationError;
use crate::extraction::{ExtractionPhase, ExtractionRunner};
use crate::phases::ClassDeclarationPhase;
use crate::report;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Index class declarations across a source tree.
///
/// declindex parses every Java file under a path, records the classes each
/// file declares, and answers lookups by file and by simple class name.
#[derive(Parser)]
#[command(name = "declindex")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log verbosity (overridden by RUST_LOG)
    #[arg(long, global = true, value_enum, default_value = "warn")]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract class declarations and print the index
    #[command(visible_alias = "extract")]
    Scan(ScanArgs),
    /// Create a new declindex configuration from a template
    Init(InitArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
}

/// Arguments for the scan command.
#[derive(Parser)]
pub struct ScanArgs {
    /// Path to scan (file or directory)
    pub path: PathBuf,

    /// Path to configuration YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,

    /// Look up the files declaring a class of this simple name (repeatable)
    #[arg(long = "by-value", value_name = "NAME")]
    pub by_value: Vec<String>,

    /// Load and extract documents one after another
    #[arg(long)]
    pub sequential: bool,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "declindex.yaml")]
    pub output: PathBuf,

    /// Template to use
    #[arg(short, long, default_value = "minimal")]
    pub template: String,

    /// List available templates
    #[arg(short, long)]
    pub list: bool,
}

/// Available configuration templates.
struct Template {
    name: &'static str,
    description: &'static str,
    content: &'static str,
}

static TEMPLATES: &[Template] = &[
    Template {
        name: "minimal",
        description: "Java sources, default settings",
        content: include_str!("templates/minimal.yaml"),
    },
    Template {
        name: "filtered",
        description: "Excluded paths and generated-code text filters",
        content: include_str!("templates/filtered.yaml"),
    },
];

/// Discover a configuration file in the current directory or under `root`.
fn discover_config(root: &Path) -> Option<PathBuf> {
    let dirs = [PathBuf::new(), root.to_path_buf()];
    dirs.iter()
        .flat_map(|dir| DEFAULT_CONFIG_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

fn load_config(args: &ScanArgs) -> Result<ScanConfig, ConfigurationError> {
    let path = match &args.config {
        Some(p) => Some(p.clone()),
        None => discover_config(&args.path),
    };
    let config = match path {
        Some(path) => {
            debug!(config = %path.display(), "loading configuration");
            ScanConfig::parse_file(&path)?
        }
        None => ScanConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

/// Whether loading and extraction fan out over threads.
fn parallel(args: &ScanArgs, scan: &ScanConfig) -> bool {
    scan.parallel && !args.sequential
}

/// Runner for the class declaration phase, as configured.
fn build_runner(
    args: &ScanArgs,
    scan: &ScanConfig,
) -> Result<ExtractionRunner<ClassDeclarationPhase>, ConfigurationError> {
    let runner = ExtractionRunner::new(ClassDeclarationPhase::new())?
        .restrict_languages(&scan.languages()?)?
        .inverted_index(scan.inverted_index)?
        .parallel(parallel(args, scan));

    if !args.by_value.is_empty() && !runner.builds_inverted_index() {
        return Err(ConfigurationError::ConflictingOptions(
            "--by-value needs the inverted index, which configuration disables".to_string(),
        ));
    }
    Ok(runner)
}

/// Run the scan command.
pub fn run_scan(args: &ScanArgs) -> anyhow::Result<i32> {
    let config = match load_config(args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: invalid configuration: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let runner = match build_runner(args, &config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    if !args.path.exists() {
        eprintln!("Error: cannot access path {:?}", args.path);
        return Ok(EXIT_ERROR);
    }

    let corpus = Corpus::collect(&args.path, &config)?;
    if corpus.is_empty() {
        eprintln!("Warning: no files to scan");
    }

    let filters = config.text_filters()?;
    let contexts = corpus.load(runner.languages(), &filters, parallel(args, &config));
    info!(documents = contexts.len(), "corpus loaded");

    let output = runner.run(&contexts)?;

    let path_str = args.path.to_string_lossy().to_string();
    let report = report::build_report(&path_str, runner.phase().name(), &output, &args.by_value)?;

    match args.format {
        OutputFormat::Json => report::write_json(&report)?,
        OutputFormat::Pretty => report::write_pretty(&report),
    }

    if output.has_failures() {
        Ok(EXIT_FAILED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    if args.list {
        return list_templates();
    }

    let template = match TEMPLATES.iter().find(|t| t.name == args.template) {
        Some(t) => t,
        None => {
            eprintln!("Error: unknown template {:?}", args.template);
            eprintln!("Run 'declindex init --list' to see available templates");
            return Ok(EXIT_ERROR);
        }
    };

    if args.output.exists() {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&args.output, template.content) {
        eprintln!("Error: failed to write configuration: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {} from template '{}'", args.output.display(), template.name);
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to customize for your project", args.output.display());
    println!("  2. Run: declindex scan . --config {}", args.output.display());

    Ok(EXIT_SUCCESS)
}

fn list_templates() -> anyhow::Result<i32> {
    println!("Available templates:");
    println!();

    for template in TEMPLATES {
        let name = if template.name == "minimal" {
            format!("{} (default)", template.name)
        } else {
            template.name.to_string()
        };
        println!("  {:<20} {}", name, template.description);
    }

    println!();
    println!("Usage:");
    println!("  declindex init --template <name>");

    Ok(EXIT_SUCCESS)
}
