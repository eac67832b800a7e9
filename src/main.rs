//! # Inference Bench - Runner
//!
//! Benchmarks a set of containerized inference deployments by:
//!
//! 1. Cleaning leftover logs from the previous run
//! 2. Streaming every deployment family's pod logs for a fixed window
//! 3. Running the hardware probe on the remote physical host in parallel
//! 4. Extracting per-deployment metrics from the captured text
//! 5. Appending the results to the single or combined CSV report

use clap::Parser;
use color_eyre::Result;
use futures::future::join_all;
use inference_bench_capture::{
    capture_family_logs,
    clean_logs,
    run_hardware_probe,
    RemoteHost,
};
use inference_bench_reporter::{
    process_and_write_results,
    summary,
    DeploymentFamily,
};
use std::path::PathBuf;
use tracing::{
    error,
    info,
};
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
    Layer,
};

const SINGLE_RESULTS_FILE: &str = "single_results.csv";
const COMBO_RESULTS_FILE: &str = "combo_results.csv";

#[derive(Parser, Debug)]
#[command(name = "inference-bench")]
#[command(about = "Benchmark harness for multi-deployment inference workloads")]
#[command(version)]
struct Cli {
    /// Observation window length (e.g. "60s", "5m")
    #[arg(long, env = "DURATION", default_value = "60s")]
    duration: String,

    /// Directory for captured logs and report files
    #[arg(long, env = "LOG_DIR", default_value = "/var/log/inference-bench")]
    log_dir: PathBuf,

    /// User on the physical host carrying the inference hardware
    #[arg(long, env = "REMOTE_USER")]
    remote_user: String,

    /// Address of the physical host
    #[arg(long, env = "REMOTE_IP")]
    remote_ip: String,

    /// SSH password for the physical host
    #[arg(long, env = "SSH_PASSWORD")]
    ssh_password: String,

    /// Local path of the hardware probe script shipped to the remote host
    #[arg(long, env = "HW_SCRIPT", default_value = "scripts/hw.sh")]
    hw_script: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) -> Result<()> {
    color_eyre::install()?;
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_filter(filter))
        .with(tracing_error::ErrorLayer::default())
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let duration = humantime::parse_duration(&cli.duration)
        .map_err(|err| eyre::eyre!("invalid duration '{}': {err}", cli.duration))?;

    clean_logs(&cli.log_dir)?;
    info!(secs = duration.as_secs(), dir = %cli.log_dir.display(), "starting benchmark window");

    let mut workers = Vec::new();
    for family in DeploymentFamily::all() {
        let log_dir = cli.log_dir.clone();
        workers.push(tokio::spawn(async move {
            if let Err(err) = capture_family_logs(family, duration, &log_dir).await {
                error!(family = %family, %err, "log capture worker failed");
            }
        }));
    }

    let host = RemoteHost {
        user: cli.remote_user,
        ip: cli.remote_ip,
        password: cli.ssh_password,
        script: cli.hw_script,
    };
    {
        let log_dir = cli.log_dir.clone();
        workers.push(tokio::spawn(async move {
            if let Err(err) = run_hardware_probe(&log_dir, duration, &host).await {
                error!(%err, "hardware probe failed");
            }
        }));
    }

    join_all(workers).await;
    info!("capture workers finished, processing metrics");

    let single_results = cli.log_dir.join(SINGLE_RESULTS_FILE);
    let combo_results = cli.log_dir.join(COMBO_RESULTS_FILE);
    let output = process_and_write_results(&cli.log_dir, &single_results, &combo_results)?;

    if let Some(rendered) = summary::render(&output) {
        println!("{rendered}");
    }

    info!("cleaning up captured logs");
    clean_logs(&cli.log_dir)?;
    Ok(())
}
