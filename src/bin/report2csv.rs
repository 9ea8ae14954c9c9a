use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use report_to_csv::{ConversionSummary, convert_report, load_options};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "report2csv",
    version,
    about = "Convert tabular PDF reports to CSV"
)]
struct Cli {
    /// Path to the yaml conversion profile.
    options: PathBuf,

    /// Report PDFs to convert.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Suppress per-row diagnostics.
    #[arg(short, long)]
    quiet: bool,

    /// Increase log verbosity. Repeatable.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to the tabula-java jar driving table extraction.
    #[arg(long, default_value = "tabula.jar")]
    tabula_jar: PathBuf,
}

fn default_filter(cli: &Cli) -> &'static str {
    if cli.quiet {
        return "report_to_csv=error";
    }
    match cli.verbose {
        0 => "report_to_csv=warn",
        1 => "report_to_csv=info",
        _ => "report_to_csv=debug",
    }
}

fn log_summary(input: &Path, summary: &ConversionSummary, quiet: bool) {
    eprintln!(
        "{}: {} row(s) from {} page(s)",
        input.display(),
        summary.rows,
        summary.pages
    );
    if summary.warnings.is_empty() || quiet {
        return;
    }

    eprintln!("warning: {} row(s) dropped or skipped", summary.warnings.len());
    for warning in &summary.warnings {
        eprintln!("  - {warning}");
    }
}

fn run(cli: &Cli) -> Result<usize> {
    let options = load_options(&cli.options)
        .with_context(|| format!("failed to load profile '{}'", cli.options.display()))?;

    let mut total_rows = 0;
    let mut failures = 0;
    for input in &cli.inputs {
        match convert_report(input, &options, &cli.tabula_jar) {
            Ok(summary) => {
                total_rows += summary.rows;
                log_summary(input, &summary, cli.quiet);
            }
            Err(error) => {
                failures += 1;
                eprintln!("error: failed to convert '{}': {error}", input.display());
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{failures} of {} input(s) failed", cli.inputs.len());
    }
    Ok(total_rows)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(&cli)));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    match run(&cli) {
        Ok(rows) if rows > 0 => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(2),
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(1)
        }
    }
}
