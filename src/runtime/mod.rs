use std::net::Ipv4Addr;

use async_trait::async_trait;
use log::warn;

use crate::error::ComputeError;
use crate::types::{TaskDetail, TaskScope};

pub mod docker;
pub use docker::DockerTaskSource;

/// Attachment type tag identifying a task's elastic network interface.
pub const ENI_ATTACHMENT_KIND: &str = "ElasticNetworkInterface";

/// Attachment property carrying the task's private IPv4 address.
pub const PRIVATE_IPV4_DETAIL: &str = "privateIPv4Address";

/// The compute-layer boundary: list the running tasks in a scope, then
/// describe them. Providers normalize their backend's network data into
/// the attachment vocabulary above so the extraction below stays
/// provider-independent.
#[async_trait]
pub trait TaskSource {
    /// Handles of all tasks currently running in the scope.
    async fn list_running_tasks(&self, scope: &TaskScope) -> Result<Vec<String>, ComputeError>;

    /// Full descriptions, including network attachments, for the given
    /// handles.
    async fn describe_tasks(
        &self,
        scope: &TaskScope,
        handles: &[String],
    ) -> Result<Vec<TaskDetail>, ComputeError>;
}

/// Collect the private IPv4 address of every running task in the scope.
///
/// Tasks without a usable network interface attachment are skipped with a
/// warning rather than failing the pass. Duplicate addresses are preserved;
/// each copy participates in reconciliation independently.
pub async fn collect_task_ips(
    source: &dyn TaskSource,
    scope: &TaskScope,
) -> Result<Vec<Ipv4Addr>, ComputeError> {
    let handles = source.list_running_tasks(scope).await?;
    if handles.is_empty() {
        return Ok(Vec::new());
    }

    let tasks = source.describe_tasks(scope, &handles).await?;

    let mut ips = Vec::new();
    for task in tasks {
        let Some(eni) = task
            .attachments
            .iter()
            .find(|a| a.kind == ENI_ATTACHMENT_KIND)
        else {
            warn!(
                "Task {} has no network interface attachment, skipping",
                task.handle
            );
            continue;
        };

        let Some(raw) = eni.detail(PRIVATE_IPV4_DETAIL) else {
            warn!(
                "Task {} attachment has no {} property, skipping",
                task.handle, PRIVATE_IPV4_DETAIL
            );
            continue;
        };

        match raw.parse::<Ipv4Addr>() {
            Ok(ip) => ips.push(ip),
            Err(e) => warn!(
                "Task {} reports unparsable address '{}': {}, skipping",
                task.handle, raw, e
            ),
        }
    }

    Ok(ips)
}
