#![deny(warnings)]

//! Headless CLI: load a round's feedback input, validate it, and print the
//! generated feedback as JSON.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use feedback_core::{validate_input, validate_round_result, FeedbackInput, GeneratedFeedback};
use feedback_engine::{Clock, FeedbackEngine, FixedClock, SystemClock};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str =
    "usage: round-feedback --input <file.json|file.yaml> [--fallback] [--now <rfc3339>] [--compact]";

#[derive(Debug, Default, PartialEq)]
struct Args {
    input: Option<PathBuf>,
    fallback: bool,
    now: Option<DateTime<Utc>>,
    compact: bool,
    version: bool,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Args> {
    let mut out = Args::default();
    let mut it = args.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--input" => out.input = it.next().map(PathBuf::from),
            "--fallback" => out.fallback = true,
            "--compact" => out.compact = true,
            "--version" => out.version = true,
            "--now" => {
                let raw = it.next().context("--now needs a timestamp")?;
                let ts = DateTime::parse_from_rfc3339(&raw)
                    .with_context(|| format!("invalid --now timestamp `{raw}`"))?;
                out.now = Some(ts.with_timezone(&Utc));
            }
            other => bail!("unknown argument `{other}`\n{USAGE}"),
        }
    }
    Ok(out)
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum DocFormat {
    Json,
    Yaml,
}

impl DocFormat {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => DocFormat::Yaml,
            _ => DocFormat::Json,
        }
    }
}

fn parse_document(text: &str, format: DocFormat) -> Result<FeedbackInput> {
    let input: FeedbackInput = match format {
        DocFormat::Json => serde_json::from_str(text).context("parsing JSON input")?,
        DocFormat::Yaml => serde_yaml::from_str(text).context("parsing YAML input")?,
    };
    Ok(input)
}

fn load_input(path: &Path) -> Result<FeedbackInput> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    parse_document(&text, DocFormat::from_path(path))
        .with_context(|| format!("loading {}", path.display()))
}

fn generate<C: Clock>(
    engine: &FeedbackEngine<C>,
    input: &FeedbackInput,
    fallback: bool,
) -> Result<GeneratedFeedback> {
    if fallback {
        validate_round_result(&input.current_result).context("invalid currentResult")?;
        Ok(engine.fallback_feedback(
            &input.current_result,
            input.round_number,
            input.team_name.as_deref(),
        ))
    } else {
        validate_input(input).context("invalid feedback input")?;
        Ok(engine.round_feedback(input))
    }
}

fn main() -> Result<()> {
    // Logging setup; stdout is reserved for the JSON result.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    if args.version {
        println!(
            "round-feedback {} ({} {})",
            env!("CARGO_PKG_VERSION"),
            env!("GIT_SHA"),
            env!("BUILD_DATE")
        );
        return Ok(());
    }
    let path = args.input.as_deref().context(USAGE)?;
    info!(input = %path.display(), fallback = args.fallback, "starting CLI");

    let input = load_input(path)?;
    let feedback = match args.now {
        Some(now) => generate(&FeedbackEngine::with_clock(FixedClock(now)), &input, args.fallback)?,
        None => generate(&FeedbackEngine::with_clock(SystemClock), &input, args.fallback)?,
    };

    let out = if args.compact {
        serde_json::to_string(&feedback)?
    } else {
        serde_json::to_string_pretty(&feedback)?
    };
    println!("{out}");
    Ok(())
}
