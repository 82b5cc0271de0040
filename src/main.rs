//! CLI shell: parse arguments, enforce the toolchain precondition, run
//! the analysis pipeline, print the report.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;

use smaug::logging;
use smaug::options::{AnalysisOptions, DemangleMode, OutputFormat, RowLimit};
use smaug::toolchain::{ToolchainGuard, VersionProbe};

#[derive(Debug, Parser)]
#[command(
    name = "smaug",
    version,
    about = "Analyze how a compiled binary's size is distributed across packages, compile units, sections, and symbols."
)]
struct Cli {
    /// Binaries to analyze.
    #[arg(value_name = "BINARY", required = true)]
    binaries: Vec<PathBuf>,

    /// Hierarchy of data sources, outermost first
    /// (sections, symbols, compileunits, packages).
    #[arg(
        short = 'd',
        long,
        value_name = "SOURCES",
        value_delimiter = ',',
        default_value = "sections,symbols"
    )]
    data_sources: Vec<String>,

    /// Demangling applied to symbol names: none, short, full.
    #[arg(long, value_name = "MODE", default_value = "short", value_parser = parse_demangle)]
    demangle: DemangleMode,

    /// Rows to keep per hierarchy level; 0 keeps every row.
    #[arg(short = 'n', long, value_name = "ROWS", default_value_t = 0)]
    max_rows: u64,

    /// Output format: text, csv, json.
    #[arg(short = 'f', long, value_name = "FORMAT", default_value = "text", value_parser = parse_format)]
    format: OutputFormat,

    /// Dump the engine's raw range map instead of a formatted report.
    #[arg(long)]
    raw_map: bool,

    /// Write the report to a file instead of stdout.
    #[arg(short = 'o', long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Verbose logging.
    #[arg(long)]
    verbose: bool,
}

fn parse_demangle(value: &str) -> Result<DemangleMode, String> {
    match value {
        "none" => Ok(DemangleMode::None),
        "short" => Ok(DemangleMode::Short),
        "full" => Ok(DemangleMode::Full),
        other => Err(format!("unknown demangle mode: {other}")),
    }
}

fn parse_format(value: &str) -> Result<OutputFormat, String> {
    match value {
        "text" => Ok(OutputFormat::Text),
        "csv" => Ok(OutputFormat::Csv),
        "json" => Ok(OutputFormat::Json),
        other => Err(format!("unknown output format: {other}")),
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if matches!(
                err.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            ) {
                let _ = err.print();
                return ExitCode::SUCCESS;
            }
            eprintln!("{err}");
            return ExitCode::from(1);
        }
    };
    logging::init_tracing(if cli.verbose { "debug" } else { "warn" });

    // Startup precondition, checked before any input file is opened.
    let guard = VersionProbe::golang();
    if !guard.check_available() {
        eprintln!("{} toolchain not found", guard.describe());
        return ExitCode::from(1);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("smaug: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let max_rows = match cli.max_rows {
        0 => RowLimit::Unlimited,
        n => RowLimit::Limit(n),
    };
    let options = AnalysisOptions::builder()
        .inputs(cli.binaries)
        .data_sources(cli.data_sources)
        .demangle(cli.demangle)
        .max_rows(max_rows)
        .format(cli.format)
        .dump_raw_map(cli.raw_map)
        .build()?;
    let report = smaug::run(&options)?;
    match &cli.output {
        Some(path) => std::fs::write(path, report.as_str())
            .with_context(|| format!("writing report to {}", path.display()))?,
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(report.as_str().as_bytes())
                .context("writing report to stdout")?;
        }
    }
    Ok(())
}
