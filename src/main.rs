use anyhow::{Context, Result};
use metergate::{driver::SimulatedDriver, BatchMessage, BatchRequest, Gateway, GatewayConfig};
use std::{env, fs, process};
use tokio_stream::StreamExt;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

/// Dry run: read the batch job named on the command line against the simulated
/// driver and print each result as a JSON line.
#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) config + logging ─────────────────────────────────────────
    let config = GatewayConfig::from_env()?;
    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    info!(pool = config.max_concurrency, "startup");

    // ─── 2) load the job ─────────────────────────────────────────────
    let job_path = env::args()
        .nth(1)
        .context("usage: metergate <job.yaml>")?;
    let text = fs::read_to_string(&job_path).with_context(|| format!("reading job {}", job_path))?;
    let request: BatchRequest =
        serde_yaml::from_str(&text).with_context(|| format!("parsing job {}", job_path))?;
    info!(job = %job_path, class = %request.data_class, targets = request.targets.len(), "job loaded");

    // ─── 3) run the batch and print results as they arrive ───────────
    let gateway = Gateway::new(SimulatedDriver::new(), config)?;
    let mut stream = gateway.stream_batch(request)?;
    let mut failed = false;
    while let Some(msg) = stream.next().await {
        match msg {
            BatchMessage::Reading(reading) => println!("{}", serde_json::to_string(&reading)?),
            BatchMessage::Failed(err) => {
                error!(error = %err, "batch finished with failures");
                failed = true;
            }
            BatchMessage::Completed(summary) => {
                info!(
                    succeeded = summary.succeeded,
                    failed = summary.failed,
                    elapsed_ms = summary.elapsed_ms,
                    "all done"
                );
            }
        }
    }

    if failed {
        process::exit(1);
    }
    Ok(())
}
