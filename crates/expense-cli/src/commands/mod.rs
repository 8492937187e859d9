//! CLI subcommands and the analysis plumbing they share.

pub mod config;
pub mod export;
pub mod fields;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::task::JoinHandle;
use tracing::debug;

use expense_core::models::config::ExpenseConfig;
use expense_core::{
    AnalysisJobWaiter, CancelToken, DocumentLocation, ExpenseDocument, RecordedAnalysisService,
    StoredObject,
};

/// Where the analysis result comes from and how long to wait for it.
#[derive(Args)]
pub struct AnalysisArgs {
    /// Recorded analysis service response (JSON object or array of poll responses)
    #[arg(required = true)]
    pub input: PathBuf,

    /// Submit as an inline payload (synchronous analysis, no polling)
    #[arg(long)]
    pub inline: bool,

    /// Delay before each status check, in milliseconds
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Give up after this many seconds (0 = wait indefinitely)
    #[arg(long)]
    pub max_wait_secs: Option<u64>,
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("expense")
        .join("config.json")
}

/// Load the explicit config file, else the default one if present, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<ExpenseConfig> {
    if let Some(path) = config_path {
        return Ok(ExpenseConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using configuration from {}", default_path.display());
        Ok(ExpenseConfig::from_file(&default_path)?)
    } else {
        Ok(ExpenseConfig::default())
    }
}

/// Run the analysis job for `args.input` and return its documents.
///
/// The wait runs on a blocking thread; Ctrl-C cancels it.
pub async fn analyze(
    args: &AnalysisArgs,
    config: &ExpenseConfig,
) -> anyhow::Result<Vec<ExpenseDocument>> {
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let service = RecordedAnalysisService::from_file(&args.input)?;

    let mut analysis = config.analysis.clone();
    if let Some(ms) = args.poll_interval_ms {
        analysis.poll_interval_ms = ms;
    }
    if let Some(secs) = args.max_wait_secs {
        analysis.max_wait_secs = secs;
    }
    debug!(
        "Polling every {:?} in region {}",
        analysis.poll_interval(),
        analysis.region
    );
    let waiter = AnalysisJobWaiter::new(service, &analysis);

    let location = if args.inline {
        DocumentLocation::Inline(std::fs::read(&args.input)?)
    } else {
        let key = args
            .input
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .to_string();
        let bucket = if analysis.bucket.is_empty() {
            "local".to_string()
        } else {
            analysis.bucket.clone()
        };
        DocumentLocation::Stored(StoredObject::new(bucket, key))
    };

    let cancel = CancelToken::new();
    let interrupt = relay_interrupt(tokio::signal::ctrl_c(), cancel.clone());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Waiting for analysis...");

    let result =
        tokio::task::spawn_blocking(move || waiter.submit_and_await(&location, &cancel)).await;
    interrupt.abort();
    // The signal handler stays installed, so later interrupts must exit explicitly
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });
    let result = result?;

    match result {
        Ok(documents) => {
            pb.finish_with_message(format!("Analysis returned {} documents", documents.len()));
            Ok(documents)
        }
        Err(e) => {
            pb.finish_with_message(format!("{} Analysis failed", style("✗").red()));
            Err(e.into())
        }
    }
}

/// Cancel `cancel` when `signal` fires, unless the returned task is aborted first.
fn relay_interrupt<F>(signal: F, cancel: CancelToken) -> JoinHandle<()>
where
    F: Future<Output = std::io::Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        if signal.await.is_ok() {
            debug!("Interrupted, cancelling analysis wait");
            cancel.cancel();
        }
    })
}
