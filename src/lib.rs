//! dupesweep - content-based duplicate file finder
//!
//! Walks a directory tree, fingerprints every regular file with SHA-256 read
//! in fixed-size blocks, groups files with equal fingerprints, and can delete
//! all but one file of every group once the caller asks for it.
//!
//! The library entry points are
//! [`DuplicateFinder::find_duplicates`](duplicates::DuplicateFinder::find_duplicates)
//! and [`delete_duplicates`](actions::delete_duplicates); [`run_app`] wires
//! them to the command line.

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{self, IsTerminal, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use bytesize::ByteSize;

use crate::actions::{delete_duplicates, DeleteConfig, DeleteProgressCallback, ResolveReport};
use crate::cli::{Cli, Commands, OutputFormat, ScanArgs};
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, FinderConfig, ScanReport};
use crate::error::ExitCode;
use crate::output::{write_resolve, JsonOutput, TextOutput};
use crate::progress::{Phase, Progress, ProgressCallback};
use crate::scanner::WalkerConfig;
use crate::signal::ShutdownHandler;

/// Run the parsed command line and return the process exit code.
///
/// # Errors
///
/// Returns an error for invalid roots or configuration, output failures,
/// a declined precondition for deletion, or an interrupted scan. Per-file
/// problems are not errors: they show up in the report and as
/// [`ExitCode::PartialSuccess`].
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    let handler = signal::install_handler().context("Failed to install Ctrl+C handler")?;

    match cli.command {
        Commands::Scan(args) => run_scan(&args, cli.quiet, &handler),
    }
}

fn run_scan(args: &ScanArgs, quiet: bool, handler: &ShutdownHandler) -> Result<ExitCode> {
    let mut config = match args.config {
        Some(ref path) => Config::load_from_path(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load(None),
    };
    config.apply_cli(args);
    config.validate().context("Invalid settings")?;

    let json = args.output == OutputFormat::Json;
    if args.delete && json && !args.yes {
        bail!("Refusing to delete with --output json unless --yes is given");
    }

    let progress = Arc::new(Progress::new(quiet || json));
    let finder_config = FinderConfig::default()
        .with_io_threads(config.io_threads)
        .with_block_size(config.block_size)
        .with_walker_config(WalkerConfig::new(
            config.follow_symlinks,
            config.skip_hidden,
            config.ignore_patterns.clone(),
        ))
        .with_shutdown_flag(handler.get_flag())
        .with_progress_callback(progress.clone());

    let report = DuplicateFinder::new(finder_config)
        .find_duplicates(&args.path)
        .with_context(|| format!("Failed to scan {}", args.path.display()))?;
    let scan_code = scan_exit_code(&report);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if !args.delete || report.is_empty() {
        if json {
            JsonOutput::new(&args.path, &report, scan_code).write_to(&mut out, true)?;
        } else {
            TextOutput::new(&report).write_to(&mut out)?;
        }
        return Ok(scan_code);
    }

    if !json {
        TextOutput::new(&report).write_to(&mut out)?;
        out.flush()?;
        if !args.yes && !confirm_delete(&report, config.use_trash)? {
            writeln!(out, "Nothing deleted")?;
            return Ok(scan_code);
        }
    }

    if json {
        // stdout stays a single document; the plan goes to the log first
        for line in deletion_plan(&report) {
            log::info!("{}", line);
        }
    }

    let delete_config = if config.use_trash {
        DeleteConfig::trash()
    } else {
        DeleteConfig::permanent()
    }
    .with_verify_content(config.verify_content)
    .with_shutdown_flag(handler.get_flag());

    progress.on_phase_start(Phase::Resolving, report.summary.duplicate_files);
    let callback: &dyn DeleteProgressCallback = progress.as_ref();
    let resolved = delete_duplicates(&report.groups, &delete_config, Some(callback));
    log::debug!("Phase {}", Phase::Done);

    let code = resolve_exit_code(scan_code, &resolved, handler);
    if json {
        JsonOutput::new(&args.path, &report, code)
            .with_resolve(&resolved)
            .write_to(&mut out, true)?;
    } else {
        write_resolve(&mut out, &resolved)?;
    }

    Ok(code)
}

/// Ask the user before deleting anything.
fn confirm_delete(report: &ScanReport, use_trash: bool) -> Result<bool> {
    if !io::stdin().is_terminal() {
        bail!("Confirmation needs an interactive terminal; pass --yes to delete without asking");
    }

    let action = if use_trash {
        "Move to trash"
    } else {
        "Permanently delete"
    };
    dialoguer::Confirm::new()
        .with_prompt(format!(
            "{} {} files ({}), keeping the first file of each group?",
            action,
            report.summary.duplicate_files,
            ByteSize(report.summary.reclaimable_space)
        ))
        .default(false)
        .interact()
        .context("Failed to read confirmation")
}

/// One line per group naming the file kept and the files about to go.
fn deletion_plan(report: &ScanReport) -> Vec<String> {
    report
        .groups
        .iter()
        .map(|group| {
            let doomed: Vec<String> = group
                .duplicates()
                .iter()
                .map(|f| f.path.display().to_string())
                .collect();
            format!(
                "Keeping {}, deleting {}",
                group.kept().path.display(),
                doomed.join(", ")
            )
        })
        .collect()
}

/// Exit code for a scan that was not followed by deletion.
#[must_use]
pub fn scan_exit_code(report: &ScanReport) -> ExitCode {
    if !report.skipped.is_empty() {
        ExitCode::PartialSuccess
    } else if report.is_empty() {
        ExitCode::NoDuplicates
    } else {
        ExitCode::Success
    }
}

fn resolve_exit_code(
    scan_code: ExitCode,
    resolved: &ResolveReport,
    handler: &ShutdownHandler,
) -> ExitCode {
    if handler.is_shutdown_requested() {
        ExitCode::Interrupted
    } else if !resolved.all_succeeded() {
        ExitCode::PartialSuccess
    } else {
        scan_code
    }
}
