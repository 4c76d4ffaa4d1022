//! Rebind entry point.
//!
//! One invocation is one reconciliation pass: discover the cluster's live
//! task IPs and the zone's address records, rebind freed record names to
//! uncovered IPs, submit the change batch, exit. Scheduling repeated
//! passes is the invoker's job (cron, a systemd timer, an event trigger).

use log::info;

mod config;
mod dns;
mod error;
mod pass;
mod reconcile;
mod runtime;
mod types;

use config::Config;
use dns::Rfc2136Backend;
use runtime::DockerTaskSource;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::init();

    // Load configuration
    let cfg = Config::load()?;
    info!("Starting reconciliation pass with config: {:?}", cfg);

    let tasks = DockerTaskSource::new();
    let zone = Rfc2136Backend::new(cfg.dns_server);

    // A failed pass propagates here and exits non-zero; the no-op pass is
    // a success like any other.
    let summary = pass::run(&cfg, &tasks, &zone).await?;
    info!("Pass complete: {}", summary);

    Ok(())
}
