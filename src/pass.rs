//! One reconciliation pass, discovery to patch.
//!
//! The two discovery queries have no ordering dependency and run
//! concurrently; the reconciler waits on both. The only mutating call is
//! the single batch submission at the end, so an aborted pass leaves the
//! zone untouched.

use std::fmt;

use anyhow::Context;
use log::{info, warn};

use crate::config::Config;
use crate::dns::{self, ZoneBackend};
use crate::reconcile;
use crate::runtime::{self, TaskSource};
use crate::types::TaskScope;

/// What a completed pass did, for the final log line and for wrappers that
/// want to alert on shortfall without parsing logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassSummary {
    pub live_ips: usize,
    pub records: usize,
    pub changes: usize,
    pub uncovered_ips: usize,
    pub stale_names: usize,
}

impl fmt::Display for PassSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} live IPs, {} records, {} changes submitted, {} IPs uncovered, {} records stale",
            self.live_ips, self.records, self.changes, self.uncovered_ips, self.stale_names
        )
    }
}

/// Run one pass against the given collaborators.
pub async fn run(
    cfg: &Config,
    tasks: &dyn TaskSource,
    zone: &dyn ZoneBackend,
) -> anyhow::Result<PassSummary> {
    let scope = TaskScope {
        cluster: cfg.cluster.clone(),
        service: cfg.service.clone(),
    };

    let (live_ips, records) = tokio::try_join!(
        async {
            runtime::collect_task_ips(tasks, &scope)
                .await
                .context("task discovery failed")
        },
        async {
            dns::collect_records(zone, &cfg.zone)
                .await
                .context("record discovery failed")
        },
    )?;

    info!(
        "Discovered {} live task IPs and {} address records in zone {}",
        live_ips.len(),
        records.len(),
        cfg.zone
    );

    let live_count = live_ips.len();
    let plan = reconcile::plan(live_ips, &records, cfg.record_ttl);

    for ip in &plan.uncovered_ips {
        warn!(
            "No invalid record left to reuse for live IP {}; it stays unreachable by name until a future pass",
            ip
        );
    }
    if !plan.stale_names.is_empty() {
        warn!(
            "{} invalid records keep their stale IP, no orphan available: {:?}",
            plan.stale_names.len(),
            plan.stale_names
        );
    }

    dns::apply_changes(zone, &cfg.zone, &plan.upserts)
        .await
        .context("change batch submission failed")?;

    Ok(PassSummary {
        live_ips: live_count,
        records: records.len(),
        changes: plan.upserts.len(),
        uncovered_ips: plan.uncovered_ips.len(),
        stale_names: plan.stale_names.len(),
    })
}

#[cfg(test)]
#[path = "pass_tests.rs"]
mod pass_tests;
