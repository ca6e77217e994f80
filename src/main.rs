//! Document PII CLI Application.
//!
//! This binary provides a command-line interface for the docredact library:
//! text extraction from PDFs and legacy Office files, PII matching over text,
//! and detection and secure redaction of PII in PDFs. Results are printed as
//! JSON on stdout; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use docredact::{
    extract_document, EngineConfig, FillColor, MatchEngine, MatchRequest, PatternMatcher,
    RedactionBox, RedactionService, RedactorError, RuleTable, ValidationOptions,
};

/// Document PII Tool
///
/// Extract text from PDF, .doc, .xls and .ppt files, find personal data in
/// it, and securely redact that data from PDFs.
#[derive(Parser)]
#[command(name = "docredact")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Engine configuration file (JSON)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text from a document
    Extract {
        /// Input file path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output JSON file (optional, defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Find PII in text or in the text of a document
    Match {
        /// Document to extract and scan
        #[arg(short, long, value_name = "FILE", conflicts_with = "text")]
        input: Option<PathBuf>,

        /// Text to scan
        #[arg(short, long, value_name = "TEXT")]
        text: Option<String>,

        /// Rules to run (comma separated, defaults to all)
        #[arg(short, long, value_delimiter = ',')]
        rules: Vec<String>,

        /// Validation options as JSON, e.g. '{"rrn_checksum": true}'
        #[arg(long, value_name = "JSON")]
        options: Option<String>,

        /// Match the text as given instead of normalizing it first
        #[arg(long)]
        no_normalize: bool,
    },

    /// Locate PII in a PDF and print the redaction boxes
    Detect {
        /// Input PDF file path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Rules to run (comma separated, defaults to all)
        #[arg(short, long, value_delimiter = ',')]
        rules: Vec<String>,

        /// Output JSON file (optional, defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Redact PII from a PDF
    Redact {
        /// Input PDF file path
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output PDF file path
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Rules to run (comma separated, defaults to all)
        #[arg(short, long, value_delimiter = ',', conflicts_with = "boxes")]
        rules: Vec<String>,

        /// Apply boxes from a detect report or a JSON list instead of detecting
        #[arg(long, value_name = "FILE")]
        boxes: Option<PathBuf>,

        /// Fill colour of the redaction boxes
        #[arg(long, value_parser = parse_fill)]
        fill: Option<FillColor>,
    },

    /// List the available rules
    Rules,
}

fn parse_fill(s: &str) -> std::result::Result<FillColor, String> {
    match s.to_ascii_lowercase().as_str() {
        "black" => Ok(FillColor::Black),
        "white" => Ok(FillColor::White),
        other => Err(format!("unknown fill colour '{}' (black or white)", other)),
    }
}

/// Command handler holding the shared configuration.
struct CommandHandler {
    config: Arc<EngineConfig>,
}

impl CommandHandler {
    fn new(config: EngineConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    fn extract(&self, input: &Path, output: Option<&Path>) -> Result<()> {
        let bytes = read_input(input)?;
        let extracted =
            extract_document(&bytes, &self.config).with_context(|| "Text extraction failed")?;
        tracing::info!(
            pages = extracted.pages.len(),
            chars = extracted.full_text.chars().count(),
            "extraction finished"
        );
        write_json(&extracted, output)
    }

    fn match_text(
        &self,
        input: Option<&Path>,
        text: Option<&str>,
        rules: Vec<String>,
        options: Option<&str>,
        normalize: bool,
    ) -> Result<()> {
        let text = match (input, text) {
            (Some(path), _) => {
                let bytes = read_input(path)?;
                extract_document(&bytes, &self.config)
                    .with_context(|| "Text extraction failed")?
                    .full_text
            }
            (None, Some(text)) => text.to_string(),
            (None, None) => {
                return Err(RedactorError::InvalidInput {
                    parameter: "text".to_string(),
                    reason: "give --text or --input".to_string(),
                }
                .into())
            }
        };

        let options = options
            .map(serde_json::from_str::<ValidationOptions>)
            .transpose()
            .map_err(RedactorError::from)?;

        let request = MatchRequest {
            text,
            rules: (!rules.is_empty()).then_some(rules),
            options,
            normalize,
        };
        let report =
            MatchEngine::from_config(&self.config).handle(&request, &self.config.validation)?;
        tracing::info!(items = report.items.len(), "matching finished");
        write_json(&report, None)
    }

    fn detect(&self, input: &Path, rules: Vec<String>, output: Option<&Path>) -> Result<()> {
        let bytes = read_input(input)?;
        let service = RedactionService::with_secure_strategy(Arc::clone(&self.config));
        let report = service.detect(&bytes, selection(&rules))?;
        write_json(&report, output)
    }

    fn redact(
        &self,
        input: &Path,
        output: &Path,
        rules: Vec<String>,
        boxes: Option<&Path>,
        fill: Option<FillColor>,
    ) -> Result<()> {
        let bytes = read_input(input)?;

        let mut config = (*self.config).clone();
        if let Some(fill) = fill {
            config.redaction.fill = fill;
        }
        let service = RedactionService::with_secure_strategy(Arc::new(config));

        let redacted = match boxes {
            Some(path) => service.apply(&bytes, &read_boxes(path)?)?,
            None => service.redact(&bytes, selection(&rules))?,
        };

        std::fs::write(output, &redacted.bytes)
            .with_context(|| format!("Failed to write to {}", output.display()))?;

        let result = &redacted.result;
        if result.has_redactions() {
            eprintln!(
                "✓ Successfully redacted {} instance(s) on {} page(s) → {}",
                result.instances_redacted,
                result.pages_modified,
                output.display()
            );
        } else {
            eprintln!("⚠ No instances found to redact");
        }
        write_json(result, None)
    }

    fn rules(&self) -> Result<()> {
        let rules: Vec<_> = RuleTable::global()
            .iter()
            .map(|r| {
                serde_json::json!({
                    "id": r.id,
                    "priority": r.priority_rank,
                    "description": r.id.description(),
                    "pattern": r.pattern().as_str(),
                })
            })
            .collect();
        write_json(&rules, None)
    }
}

fn selection(rules: &[String]) -> Option<&[String]> {
    (!rules.is_empty()).then_some(rules)
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        RedactorError::Io {
            path: path.to_path_buf(),
            source: e,
        }
        .into()
    })
}

/// Reads boxes from either a detect report or a bare JSON list.
fn read_boxes(path: &Path) -> Result<Vec<RedactionBox>> {
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum BoxFile {
        Report { boxes: Vec<RedactionBox> },
        List(Vec<RedactionBox>),
    }

    let raw = read_input(path)?;
    let parsed: BoxFile = serde_json::from_slice(&raw).map_err(RedactorError::from)?;
    Ok(match parsed {
        BoxFile::Report { boxes } | BoxFile::List(boxes) => boxes,
    })
}

fn write_json<T: serde::Serialize + ?Sized>(value: &T, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("Failed to write to {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    Ok(match path {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    })
}

fn run(cli: Cli) -> Result<()> {
    let handler = CommandHandler::new(load_config(cli.config.as_deref())?);

    match cli.command {
        Commands::Extract { input, output } => handler.extract(&input, output.as_deref()),
        Commands::Match {
            input,
            text,
            rules,
            options,
            no_normalize,
        } => handler.match_text(
            input.as_deref(),
            text.as_deref(),
            rules,
            options.as_deref(),
            !no_normalize,
        ),
        Commands::Detect {
            input,
            rules,
            output,
        } => handler.detect(&input, rules, output.as_deref()),
        Commands::Redact {
            input,
            output,
            rules,
            boxes,
            fill,
        } => handler.redact(&input, &output, rules, boxes.as_deref(), fill),
        Commands::Rules => handler.rules(),
    }
}

/// Client errors (bad input) exit with 2, everything else with 1.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<RedactorError>() {
        Some(e) if e.is_client_error() => 2,
        _ => 1,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}
