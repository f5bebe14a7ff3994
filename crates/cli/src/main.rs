mod cli;

use std::io::IsTerminal;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use alac2flac_core::{
    load_config, validate_config, BatchProcessor, ConfigError, Converter, FfmpegConverter,
    FileScanner, RunStatus,
};

use cli::{Args, UsageError};

/// EX_CONFIG from sysexits.h
const EXIT_CONFIG: u8 = 78;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Clap prints usage errors, help and version itself, then exits.
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal())
                .with_writer(std::io::stderr),
        )
        .init();

    match run(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Fatal error: {:#}", e);
            exit_code_for(&e)
        }
    }
}

async fn run(args: Args) -> Result<RunStatus> {
    let scan = args.scan_config()?;

    let mut config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply_overrides(&mut config);
    validate_config(&config).context("Configuration validation failed")?;

    let converter = FfmpegConverter::new(config.converter.clone());
    if let Err(e) = converter.validate().await {
        warn!("Media tools not usable, every file will be skipped or fail: {}", e);
    }

    let files = FileScanner::new(&scan.root, config.scan.pattern.as_str())
        .scan()
        .context("Failed to start scan")?;

    let cancel = CancellationToken::new();
    spawn_interrupt_listener(cancel.clone());

    info!(
        root = %scan.root.display(),
        pattern = %config.scan.pattern,
        dry_run = scan.dry_run,
        "Scanning"
    );

    let processor = BatchProcessor::new(converter, &scan);
    let report = processor.run(files, &cancel).await;

    Ok(report.status)
}

/// Turns Ctrl+C (and SIGTERM) into an exit request honoured between files.
///
/// The running ffmpeg is not interrupted; the loop stops after the
/// current file has been converted and cleaned up.
fn spawn_interrupt_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        loop {
            if !wait_for_interrupt().await {
                warn!("Could not listen for interrupts; Ctrl+C will not stop the run cleanly");
                return;
            }
            info!("CTRL+C caught, will exit after cleanup...");
            cancel.cancel();
        }
    });
}

/// Waits for Ctrl+C or SIGTERM. Returns false if no handler could be installed.
async fn wait_for_interrupt() -> bool {
    let ctrl_c = async { signal::ctrl_c().await.is_ok() };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => stream.recv().await.is_some(),
            Err(_) => std::future::pending::<bool>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<bool>();

    tokio::select! {
        ok = ctrl_c => ok,
        ok = terminate => ok,
    }
}

fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    if let Some(usage) = err.downcast_ref::<UsageError>() {
        return usage.exit_code();
    }
    if err.chain().any(|cause| cause.is::<ConfigError>()) {
        return ExitCode::from(EXIT_CONFIG);
    }
    ExitCode::FAILURE
}
