//! CLI entry point for clipfetch.

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use clipfetch_core::transfer::{NoProgress, ProgressSink};
use clipfetch_core::{
    ArtifactFinalizer, CancelSignal, DescriptionService, FileSink, HttpDescriber, HttpSource,
    TransferSession, TransferStatus,
};
use tracing::{debug, info, warn};

mod cli;
mod config;
mod progress_bar;

use cli::Args;
use config::Settings;
use progress_bar::BarProgress;

/// Exit code for a usage or configuration problem.
const EXIT_USAGE: u8 = 2;
/// Conventional exit code after SIGINT.
const EXIT_CANCELLED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();
    init_tracing(&args);

    debug!(?args, "CLI arguments parsed");

    match run(args).await {
        Ok(status) => exit_code_for(status),
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(EXIT_USAGE)
        }
    }
}

fn init_tracing(args: &Args) {
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(args: Args) -> Result<TransferStatus> {
    let file_config = config::load_file_config(args.config.as_deref())?;
    let settings = Settings::merge(&args, file_config.as_ref());
    debug!(?settings, "settings resolved");

    let mut cancel = CancelSignal::new();
    if let Some(deadline) = settings.deadline {
        cancel = cancel.with_deadline(deadline);
    }
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let describer = match &settings.describe_endpoint {
        Some(endpoint) => DescriptionService::new(Box::new(
            HttpDescriber::new(endpoint.clone()).context("Failed to build describer client")?,
        )),
        None => DescriptionService::disabled(),
    };
    let description = describer.describe(&args.url).await;
    if !args.quiet {
        println!("{}", description.title);
        println!("{}", description.summary);
    }
    let display_name = args.name.clone().unwrap_or(description.title);

    let source = HttpSource::with_timeouts(settings.connect_timeout_secs, settings.read_timeout_secs)
        .context("Failed to build HTTP client")?;
    let sink = FileSink::new(&settings.output_dir);
    let mut session = TransferSession::new(args.url.clone())
        .with_finalizer(ArtifactFinalizer::new(settings.mime_type.clone()))
        .with_cancel_signal(cancel);

    info!(session_id = session.id(), url = %args.url, "transfer starting");

    let mut progress: Box<dyn ProgressSink + Send> = if progress_bar::should_draw(
        io::stderr().is_terminal(),
        args.quiet,
        args.no_progress,
    ) {
        Box::new(BarProgress::new())
    } else {
        Box::new(NoProgress)
    };

    let status = session
        .run(&source, &sink, &display_name, progress.as_mut())
        .await;

    report(&session, args.quiet);
    Ok(status)
}

fn report(session: &TransferSession, quiet: bool) {
    let session_id = session.id();
    match session.status() {
        TransferStatus::Completed => {
            if let Some(warning) = session.length_mismatch() {
                warn!(session_id, %warning, "saved artifact may be incomplete");
            }
            if !quiet
                && let Some(location) = session.delivery().and_then(|d| d.location.as_ref())
            {
                println!("Saved: {}", location.display());
            }
        }
        TransferStatus::Failed => {
            let message = session
                .last_error()
                .map_or_else(|| "unknown error".to_string(), ToString::to_string);
            let is_save = session.last_error().is_some_and(|e| e.is_save_failure());
            if is_save {
                eprintln!("Could not save: {message}");
            } else {
                eprintln!("Could not fetch: {message}");
            }
        }
        TransferStatus::Cancelled => {
            eprintln!(
                "Transfer cancelled after {} bytes; nothing was saved.",
                session.received_bytes()
            );
        }
        other => warn!(session_id, status = %other, "session ended in a non-terminal state"),
    }
}

fn exit_code_for(status: TransferStatus) -> ExitCode {
    ExitCode::from(exit_status_byte(status))
}

fn exit_status_byte(status: TransferStatus) -> u8 {
    match status {
        TransferStatus::Completed => 0,
        TransferStatus::Cancelled => EXIT_CANCELLED,
        _ => 1,
    }
}
