//! Flag-less cleanup sweep.
//!
//! Reads its scope from the environment (`PROJECT_ID`, `BUCKET`, `APP_NAME`,
//! optional `REGION`/`PIPELINE_NAME`, and `PLATFORM_ACCESS_TOKEN` for
//! authentication), sweeps every phase, and exits zero even when individual
//! deletions fail — failures are printed, not fatal.

use std::sync::Arc;

use anyhow::Context;
use vertexflow::config::PipelineConfig;
use vertexflow::platform::RestPlatformClient;
use vertexflow::reclaim::{PhaseSet, Reclaimer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    vertexflow::observability::init();

    let config = PipelineConfig::from_env().context("reading pipeline configuration")?;
    let token = std::env::var("PLATFORM_ACCESS_TOKEN")
        .context("PLATFORM_ACCESS_TOKEN is not set")?;

    let client = Arc::new(
        RestPlatformClient::new(&config, token).context("building platform client")?,
    );
    let reclaimer = Reclaimer::new(
        config,
        client.clone(),
        client.clone(),
        client.clone(),
        client.clone(),
        client,
    );

    let report = reclaimer.sweep(&PhaseSet::all()).await;
    for outcome in &report.phases {
        println!(
            "{}: {} deleted, {} failed",
            outcome.phase.label(),
            outcome.deleted,
            outcome.failed
        );
        for error in &outcome.errors {
            println!("  {error}");
        }
    }
    println!(
        "sweep finished: {} deleted, {} failed",
        report.total_deleted(),
        report.total_failed()
    );
    Ok(())
}
