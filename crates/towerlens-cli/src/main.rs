//! towerlens CLI - construction progress reports
//!
//! Reads tracker workbooks from a directory-backed store, rolls cell fills
//! up into per-tower percentages and writes the results as text, JSON or
//! formatted workbooks.

mod commands;
mod config;
mod diagnostics;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context as _, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use towerlens_core::{Diagnostic, DiagnosticCode, DiagnosticEmitter, DirectoryStore, Renderer, Report};
use towerlens_render::{ExcelReportWriter, TextRenderer};

use crate::commands::Context;
use crate::config::Config;
use crate::diagnostics::{DiagnosticConfig, JsonEmitter, TerminalEmitter};

#[derive(Parser)]
#[command(name = "towerlens")]
#[command(author, version, about = "Construction progress reports from tracker workbooks", long_about = None)]
struct Cli {
    /// Config file (defaults to ./towerlens.toml when present)
    #[arg(long, global = true, env = "TOWERLENS_CONFIG")]
    config: Option<PathBuf>,

    /// Directory used as the blob store (overrides `[store] root`)
    #[arg(long, global = true, env = "TOWERLENS_STORE")]
    store: Option<PathBuf>,

    /// Output format for the report and diagnostics
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Also write the report as a formatted workbook
    #[arg(short, long, global = true, value_name = "XLSX")]
    output: Option<PathBuf>,

    /// Write percentages as numbers instead of text
    #[arg(long, global = true)]
    percent_numbers: bool,

    /// Treat warnings as errors
    #[arg(long, global = true)]
    strict: bool,

    /// Show errors only
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose logging (-v debug, -vv trace) when RUST_LOG is unset
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Skip the completion endpoint even when configured
    #[arg(long, global = true)]
    no_llm: bool,

    /// Report date (YYYY-MM-DD); defaults to the local date
    #[arg(long, global = true, hide = true, env = "TOWERLENS_TODAY")]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List tracker files in the store
    Files(commands::files::FilesArgs),

    /// Upload a tracker workbook into a store folder
    Upload(commands::upload::UploadArgs),

    /// Structure progress per tower from fill colors
    Structure(commands::structure::StructureArgs),

    /// Monthly slab-cycle counts per tower
    Slab(commands::slab::SlabArgs),

    /// Overall project report: structure, finishing and keyword progress
    Overall(commands::overall::OverallArgs),

    /// Finishing activities counted by finish month
    Activity(commands::activity::ActivityArgs),

    /// Finishing activity counts per name and month, with verified totals
    Schedule(commands::schedule::ScheduleArgs),

    /// Activities delayed more than once between two snapshots
    Delay(commands::delay::DelayArgs),

    /// Merge written report workbooks into one
    Combine(commands::combine::CombineArgs),
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "error",
            1 => "debug",
            _ => "trace",
        })
    });
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<process::ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(cli.config.as_deref())?;
    let layouts = config.layouts().context("Invalid layouts")?;
    let root = cli.store.clone().unwrap_or_else(|| config.store.root.clone());
    let today = cli.today.unwrap_or_else(|| chrono::Local::now().date_naive());
    info!(store = %root.display(), %today, "starting");

    let mut ctx = Context::new(config, layouts, Box::new(DirectoryStore::new(&root)), today);
    if !cli.no_llm {
        ctx = ctx.with_endpoint();
    }

    let report = match &cli.command {
        Commands::Files(args) => commands::files::run(&mut ctx, args),
        Commands::Upload(args) => commands::upload::run(&mut ctx, args)?,
        Commands::Structure(args) => commands::structure::run(&mut ctx, args),
        Commands::Slab(args) => commands::slab::run(&mut ctx, args),
        Commands::Overall(args) => commands::overall::run(&mut ctx, args),
        Commands::Activity(args) => commands::activity::run(&mut ctx, args),
        Commands::Schedule(args) => commands::schedule::run(&mut ctx, args),
        Commands::Delay(args) => commands::delay::run(&mut ctx, args),
        Commands::Combine(args) => commands::combine::run(&mut ctx, args),
    };

    if let Some(path) = &cli.output {
        write_workbook(&mut ctx, &report, path, cli.percent_numbers);
    }

    let diagnostic_config = DiagnosticConfig {
        strict: cli.strict,
        quiet: cli.quiet,
        base_path: Some(root.display().to_string()),
    };
    let diagnostics = ctx.take_diagnostics();
    let exit = match cli.format {
        OutputFormat::Text => {
            let text = TextRenderer::new().render(&report)?;
            print!("{text}");
            std::io::stdout().flush().ok();

            let quiet = diagnostic_config.quiet;
            let mut emitter = TerminalEmitter::new(std::io::stderr(), diagnostic_config);
            for diagnostic in diagnostics {
                emitter.emit(diagnostic);
            }
            let (errors, warnings) = (emitter.error_count(), emitter.warning_count());
            if !quiet && errors + warnings > 0 {
                eprintln!("towerlens: {errors} error(s), {warnings} warning(s)");
            }
            emitter.exit_code()
        }
        OutputFormat::Json => {
            let mut emitter = JsonEmitter::new(diagnostic_config);
            for diagnostic in diagnostics {
                emitter.emit(diagnostic);
            }
            let document = serde_json::json!({
                "report": report,
                "diagnostics": emitter.to_json_value(),
            });
            println!("{}", serde_json::to_string_pretty(&document)?);
            emitter.exit_code()
        }
    };
    info!(success = exit.is_success(), code = exit.code(), "done");
    Ok(exit.into())
}

/// Render and save the report; failures become diagnostics
fn write_workbook(ctx: &mut Context, report: &Report, path: &Path, percent_numbers: bool) {
    let mut writer = ExcelReportWriter::new();
    if percent_numbers {
        writer = writer.percent_as_number();
    }
    let written = writer
        .render(report)
        .map_err(|e| e.to_string())
        .and_then(|bytes| std::fs::write(path, bytes).map_err(|e| e.to_string()));
    let file = path.display().to_string();
    match written {
        Ok(()) => {
            info!(path = %file, "report written");
            ctx.emit(
                Diagnostic::new(DiagnosticCode::I003ReportWritten, format!("wrote {file}"))
                    .with_file(file),
            );
        }
        Err(message) => ctx.emit(
            Diagnostic::new(DiagnosticCode::E005OutputFailed, format!("cannot write report: {message}"))
                .with_file(file),
        ),
    }
}
