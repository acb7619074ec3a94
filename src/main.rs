//! valdiff command-line interface.
//!
//! Loads two JSON, YAML or TOML documents, diffs them structurally and prints
//! the result. Exit code 0 means no differences, 1 means differences, 2 means
//! an error.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;
use valdiff::{
    diff, format_delta, is_equal, parse_file, patch, unpatch, Delta, DiffOptions, OutputFormat,
    OutputOptions, PathPattern, Value,
};

/// valdiff - structural diff for structured data
///
/// Compares two documents key by key, aligns lists with an optimal edit
/// script, and reports only meaningful changes.
#[derive(Parser)]
#[command(name = "valdiff")]
#[command(version)]
#[command(about = "Structural diff for JSON, YAML and TOML documents", long_about = None)]
struct Cli {
    /// Expected (old) document
    #[arg(value_name = "FILE1")]
    file1: PathBuf,

    /// Actual (new) document
    #[arg(value_name = "FILE2")]
    file2: PathBuf,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value = "terminal")]
    format: OutputFormatArg,

    /// Exact dotted key path to ignore, may be repeated
    #[arg(short, long = "ignore", value_name = "PATH")]
    ignore: Vec<String>,

    /// Key path glob to ignore, may be repeated (`*` and `**` are wildcards)
    #[arg(short = 'g', long = "ignore-glob", value_name = "PATTERN")]
    ignore_glob: Vec<String>,

    /// Also list unchanged list elements
    #[arg(long)]
    full: bool,

    /// Show full values instead of previews
    #[arg(long)]
    show_values: bool,

    /// Maximum length for displayed values
    #[arg(long, default_value = "80")]
    max_value_length: usize,

    /// Check that patch and unpatch reproduce both documents
    #[arg(long, conflicts_with_all = ["ignore", "ignore_glob"])]
    verify: bool,

    /// Verbose output (log progress to stderr)
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode (only show changes, suppress summary)
    #[arg(short, long)]
    quiet: bool,
}

/// Output format argument for clap
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormatArg {
    /// Colored terminal output
    Terminal,
    /// Plain text (no colors)
    Plain,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Terminal => OutputFormat::Terminal,
            OutputFormatArg::Plain => OutputFormat::Plain,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(exit_code) => process::exit(exit_code),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            process::exit(2);
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "valdiff=debug" } else { "valdiff=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<i32> {
    let mut options = DiffOptions::new();
    for path in &cli.ignore {
        options.ignore_paths.push(PathPattern::try_literal(path)?);
    }
    for pattern in &cli.ignore_glob {
        options.ignore_paths.push(PathPattern::try_parse(pattern)?);
    }

    tracing::info!(path = %cli.file1.display(), "parsing first file");
    let old = parse_file(&cli.file1)
        .with_context(|| format!("Failed to parse first file: {}", cli.file1.display()))?;

    tracing::info!(path = %cli.file2.display(), "parsing second file");
    let new = parse_file(&cli.file2)
        .with_context(|| format!("Failed to parse second file: {}", cli.file2.display()))?;

    tracing::info!(ignored = options.ignore_paths.len(), "computing diff");
    let delta = diff(&old, &new, &options);

    if cli.verify {
        if let Some(delta) = &delta {
            verify_round_trip(&old, &new, delta)?;
        }
    }

    let output_options = OutputOptions {
        compact: !cli.full,
        show_values: cli.show_values,
        max_value_length: cli.max_value_length,
    };
    let output = format_delta(delta.as_ref(), &cli.format.into(), &output_options);

    if !cli.quiet {
        println!("{}", output);
    } else {
        for line in output.lines() {
            if !line.starts_with("Summary:") && !line.trim().is_empty() {
                println!("{}", line);
            }
        }
    }

    Ok(if delta.is_none() { 0 } else { 1 })
}

fn verify_round_trip(old: &Value, new: &Value, delta: &Delta) -> Result<()> {
    let patched = patch(old, delta).context("Failed to patch the first document")?;
    if !is_equal(&patched, new) {
        bail!("Patching the first document did not reproduce the second");
    }

    let restored = unpatch(new, delta).context("Failed to unpatch the second document")?;
    if !is_equal(&restored, old) {
        bail!("Unpatching the second document did not reproduce the first");
    }

    tracing::info!("patch and unpatch round trips verified");
    Ok(())
}
