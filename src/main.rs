//! wincopies - Pausable copy, delete and recycle with a retryable error queue.
//!
//! Usage:
//!   wincopies copy <SOURCES>... --to <DEST>   Copy into a directory
//!   wincopies delete <TARGETS>...             Delete permanently
//!   wincopies recycle <TARGETS>...            Move to the trash
//!   wincopies size <PATHS>...                 Estimate what a process would touch
//!   wincopies --help                          Show help

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::Level;
use tracing::subscriber::set_global_default;
use tracing_subscriber::EnvFilter;

use wincopies_core::{EnumerationOrder, ProcessErrorItem, ProcessOptions, ProcessStatus};
use wincopies_ops::{Process, ProcessEvent, ProcessKind, ProcessProgress};
use wincopies_scan::PathCollection;

#[derive(Parser)]
#[command(
    name = "wincopies",
    version,
    about = "Pausable, resumable file operations with a retryable error queue",
    long_about = "wincopies copies, deletes or recycles files as a process: failed items \
                  are queued instead of aborting the run, and can be retried or ignored."
)]
struct Cli {
    /// Process options file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Ignore every failed item and finish
    #[arg(long, global = true)]
    ignore_errors: bool,

    /// Retry failed items up to this many rounds
    #[arg(long, global = true, default_value = "0")]
    retries: u32,

    /// Print a JSON summary to stdout
    #[arg(long, global = true)]
    json: bool,

    /// More log output (repeatable)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Less log output (repeatable)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    quiet: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Copy files and directories into a destination directory
    Copy {
        /// Sources sharing one parent directory
        #[arg(required = true)]
        sources: Vec<PathBuf>,

        /// Destination directory (created if missing)
        #[arg(short, long)]
        to: PathBuf,

        /// Replace existing files at the destination
        #[arg(long)]
        overwrite: bool,

        /// Enumeration order
        #[arg(long)]
        order: Option<OrderArg>,
    },

    /// Permanently delete files and directories
    Delete {
        /// Targets sharing one parent directory
        #[arg(required = true)]
        targets: Vec<PathBuf>,
    },

    /// Move files and directories to the trash
    Recycle {
        /// Targets sharing one parent directory
        #[arg(required = true)]
        targets: Vec<PathBuf>,
    },

    /// Estimate the files and bytes under each path
    Size {
        /// Paths to measure
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OrderArg {
    /// Depth-first, in directory-read order
    None,
    /// Files of a directory before its subdirectories
    FilesFirst,
}

impl From<OrderArg> for EnumerationOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::None => EnumerationOrder::None,
            OrderArg::FilesFirst => EnumerationOrder::FilesThenDirectories,
        }
    }
}

/// How a finished run is reported.
#[derive(Serialize)]
struct Summary {
    kind: ProcessKind,
    status: ProcessStatus,
    rounds: u32,
    progress: ProcessProgress,
    errors: Vec<ProcessErrorItem>,
    warnings: Vec<String>,
}

fn init_tracing(verbosity: i16) {
    // Default WARN so progress lines stay readable
    let level = match verbosity {
        i16::MIN..=-1 => Level::ERROR,
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .compact()
        .finish();

    let _ = set_global_default(subscriber);
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(i16::from(cli.verbose) - i16::from(cli.quiet));

    let mut options = load_options(cli.config.as_deref())?;

    let process = match &cli.command {
        Command::Copy {
            sources,
            to,
            overwrite,
            order,
        } => {
            if *overwrite {
                options.overwrite = true;
            }
            if let Some(order) = order {
                options.order = (*order).into();
            }
            let collection = collect(sources)?;
            Process::copy(collection, to, options).context("Cannot set up copy")?
        }
        Command::Delete { targets } => {
            Process::delete(collect(targets)?, options).context("Cannot set up delete")?
        }
        Command::Recycle { targets } => {
            Process::recycle(collect(targets)?, options).context("Cannot set up recycle")?
        }
        Command::Size { paths } => {
            run_size(paths, options.follow_symlinks)?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    run_process(&process, &cli)
}

/// Read process options from a TOML file, or use the defaults.
fn load_options(path: Option<&Path>) -> Result<ProcessOptions> {
    let Some(path) = path else {
        return Ok(ProcessOptions::default());
    };

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
}

/// Build a path collection from command-line paths.
fn collect(paths: &[PathBuf]) -> Result<PathCollection> {
    let paths = paths
        .iter()
        .map(|path| {
            absolute_path(path).with_context(|| format!("Invalid path: {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(PathCollection::from_sources(&paths)?)
}

/// Make a path absolute, resolving its parent but never a final symlink.
///
/// `delete links/shortcut` must select the link, not the directory it
/// points at.
fn absolute_path(path: &Path) -> std::io::Result<PathBuf> {
    let resolved = match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            parent.canonicalize()?.join(name)
        }
        // `.`, `..` and roots name real directories
        _ => path.canonicalize()?,
    };

    std::fs::symlink_metadata(&resolved)?;
    Ok(resolved)
}

/// Run the process to the end, applying the retry and ignore policy.
fn run_process(process: &Process, cli: &Cli) -> Result<ExitCode> {
    let mut events = process.subscribe();
    let mut rounds = 0;

    eprintln!(
        "{} {} item(s) in {}...",
        process.kind(),
        process.collection().roots().len(),
        process.source_path().display()
    );

    loop {
        process.start().context("Failed to start process")?;
        watch(process, &mut events);
        let status = process.join().context("Process failed")?;

        if status != ProcessStatus::Erred {
            break;
        }

        if rounds < cli.retries {
            rounds += 1;
            eprintln!(
                "Retrying {} failed item(s) (round {rounds}/{})",
                process.error_count(),
                cli.retries
            );
            while process.error_count() > 0 {
                process.retry()?;
            }
        } else if cli.ignore_errors {
            let ignored = process.error_count();
            while process.error_count() > 0 {
                process.ignore()?;
            }
            eprintln!("Ignored {ignored} failed item(s)");
            if process.status() != ProcessStatus::Paused {
                break;
            }
        } else {
            break;
        }
    }

    let summary = Summary {
        kind: process.kind(),
        status: process.status(),
        rounds,
        progress: process.progress(),
        errors: process.error_paths(),
        warnings: process.warnings().iter().map(ToString::to_string).collect(),
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    Ok(match summary.status {
        ProcessStatus::Completed => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

/// Print progress until the worker stops.
fn watch(process: &Process, events: &mut tokio::sync::broadcast::Receiver<ProcessEvent>) {
    let mut last_percentage = None;
    // Events queued by error resolution precede this run.
    let mut running = false;

    loop {
        match events.blocking_recv() {
            Ok(ProcessEvent::Loaded {
                item_count,
                total_size,
                skipped,
            }) => {
                eprintln!(
                    "Found {item_count} item(s), {}{}",
                    format_size(total_size),
                    if skipped > 0 {
                        format!(" ({skipped} skipped)")
                    } else {
                        String::new()
                    }
                );
            }
            Ok(ProcessEvent::Progress(progress)) => {
                let percentage = progress.percentage();
                if last_percentage != Some(percentage) {
                    last_percentage = Some(percentage);
                    eprintln!(
                        "[{percentage:>3}%] {} of {}",
                        format_size(progress.processed_size),
                        format_size(progress.initial_total_size)
                    );
                }
            }
            Ok(ProcessEvent::ItemFailed(item)) => {
                eprintln!("  failed: {item}");
            }
            Ok(ProcessEvent::StatusChanged(ProcessStatus::Running)) => running = true,
            Ok(ProcessEvent::StatusChanged(_)) => {
                if run_has_stopped(running, process.status()) {
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "progress display lagged");
                if run_has_stopped(running, process.status()) {
                    break;
                }
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Whether a stop event ends the current run rather than an earlier one.
///
/// Once `Running` is seen, every later status change belongs to this run.
/// Before that, only a process that is no longer running has stopped.
fn run_has_stopped(seen_running: bool, status: ProcessStatus) -> bool {
    seen_running || status != ProcessStatus::Running
}

fn print_summary(summary: &Summary) {
    let progress = &summary.progress;

    println!();
    println!("{}", "─".repeat(60));
    println!(
        " {} {} item(s), {} in {:.2}s ({}/s)",
        summary.kind.past_tense(),
        progress.processed_item_count,
        format_size(progress.processed_size),
        progress.elapsed.as_secs_f64(),
        format_size(progress.bytes_per_second() as u64)
    );
    if progress.ignored_item_count > 0 {
        println!(" Ignored {} item(s)", progress.ignored_item_count);
    }
    println!(" Status: {}", summary.status);
    println!("{}", "─".repeat(60));

    if !summary.errors.is_empty() {
        println!();
        println!(" {} failed item(s):", summary.errors.len());
        for item in &summary.errors {
            println!("   {item}");
        }
    }

    if !summary.warnings.is_empty() {
        println!();
        println!("{} warning(s) during enumeration", summary.warnings.len());
    }
}

/// Estimate each path on its own.
fn run_size(paths: &[PathBuf], follow_symlinks: bool) -> Result<()> {
    let mut total = 0u64;

    for path in paths {
        let collection = collect(std::slice::from_ref(path))?;
        let estimate = collection.estimate_size(follow_symlinks);
        total += estimate.bytes;

        println!(
            "{:>12}  {} files, {} directories  {}",
            format_size(estimate.bytes),
            estimate.files,
            estimate.directories,
            path.display()
        );
        if estimate.skipped > 0 {
            println!("{:>12}  {} entries skipped", "", estimate.skipped);
        }
    }

    if paths.len() > 1 {
        println!("{:>12}  total", format_size(total));
    }
    Ok(())
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_stop_event_does_not_end_watch() {
        // A Paused left over from resolving errors, read while the new run goes on
        assert!(!run_has_stopped(false, ProcessStatus::Running));
        assert!(run_has_stopped(false, ProcessStatus::Completed));
        assert!(run_has_stopped(true, ProcessStatus::Running));
    }

    #[test]
    fn test_collect_relative_path() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("a.txt"), b"a").unwrap();
        std::fs::create_dir(temp.path().join("sub")).unwrap();

        let collection = collect(&[temp.path().join("sub/../a.txt")]).unwrap();
        assert_eq!(collection.entries(), &[PathBuf::from("a.txt")]);
        assert!(collect(&[temp.path().join("missing")]).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_collect_keeps_symlink_selected() {
        let temp = tempfile::tempdir().unwrap();
        let precious = temp.path().join("precious");
        std::fs::create_dir(&precious).unwrap();
        std::fs::write(precious.join("keep.txt"), b"keep").unwrap();
        let links = temp.path().join("links");
        std::fs::create_dir(&links).unwrap();
        std::os::unix::fs::symlink(&precious, links.join("shortcut")).unwrap();

        let collection = collect(&[links.join("shortcut")]).unwrap();
        assert_eq!(collection.base(), links.canonicalize().unwrap());
        assert_eq!(collection.entries(), &[PathBuf::from("shortcut")]);

        let process = Process::delete(collection, ProcessOptions::default()).unwrap();
        process.start().unwrap();
        assert_eq!(process.join().unwrap(), ProcessStatus::Completed);

        assert!(std::fs::symlink_metadata(links.join("shortcut")).is_err());
        assert!(precious.join("keep.txt").exists());
    }
}
