use std::collections::HashMap;

use async_trait::async_trait;
use bollard::container::ListContainersOptions;
use bollard::models::ContainerInspectResponse;
use bollard::Docker;
use log::debug;

use super::{TaskSource, ENI_ATTACHMENT_KIND, PRIVATE_IPV4_DETAIL};
use crate::error::ComputeError;
use crate::types::{Attachment, AttachmentDetail, TaskDetail, TaskScope};

/// Label set by the orchestrator on every container of a service; used to
/// narrow a pass to one service's tasks.
const SERVICE_NAME_LABEL: &str = "com.docker.swarm.service.name";

/// Compute provider backed by the local Docker daemon.
///
/// The cluster identifier names the container network whose members count
/// as tasks; the optional service scope matches the orchestrator's
/// service-name label.
pub struct DockerTaskSource;

impl DockerTaskSource {
    pub fn new() -> Self {
        Self
    }

    fn connect() -> Result<Docker, ComputeError> {
        // Connect to the local Docker daemon using default settings.
        // This handles unix socket on Linux.
        Docker::connect_with_local_defaults().map_err(|e| ComputeError::Connection {
            reason: e.to_string(),
        })
    }
}

impl Default for DockerTaskSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskSource for DockerTaskSource {
    async fn list_running_tasks(&self, scope: &TaskScope) -> Result<Vec<String>, ComputeError> {
        let docker = Self::connect()?;

        let mut filters: HashMap<String, Vec<String>> = HashMap::new();
        filters.insert("status".into(), vec!["running".into()]);
        filters.insert("network".into(), vec![scope.cluster.clone()]);
        if let Some(service) = &scope.service {
            filters.insert(
                "label".into(),
                vec![format!("{SERVICE_NAME_LABEL}={service}")],
            );
        }

        let opts = ListContainersOptions::<String> {
            all: false,
            filters,
            ..Default::default()
        };

        let containers =
            docker
                .list_containers(Some(opts))
                .await
                .map_err(|e| ComputeError::ListTasks {
                    cluster: scope.cluster.clone(),
                    reason: e.to_string(),
                })?;

        let handles: Vec<String> = containers.into_iter().filter_map(|c| c.id).collect();
        debug!(
            "Found {} running tasks on network {}",
            handles.len(),
            scope.cluster
        );
        Ok(handles)
    }

    async fn describe_tasks(
        &self,
        scope: &TaskScope,
        handles: &[String],
    ) -> Result<Vec<TaskDetail>, ComputeError> {
        let docker = Self::connect()?;

        let mut tasks = Vec::with_capacity(handles.len());
        for handle in handles {
            let detail = docker.inspect_container(handle, None).await.map_err(|e| {
                ComputeError::DescribeTask {
                    cluster: scope.cluster.clone(),
                    handle: handle.clone(),
                    reason: e.to_string(),
                }
            })?;

            tasks.push(TaskDetail {
                handle: handle.clone(),
                attachments: network_attachments(&detail, &scope.cluster),
            });
        }

        Ok(tasks)
    }
}

/// Build the attachment list for a container's endpoint on the scoped
/// network. A container with no endpoint there, or one without an address
/// yet, yields no attachment or an attachment without the address property;
/// the locator skips either case with a warning.
fn network_attachments(detail: &ContainerInspectResponse, network_name: &str) -> Vec<Attachment> {
    let Some(endpoint) = detail
        .network_settings
        .as_ref()
        .and_then(|s| s.networks.as_ref())
        .and_then(|networks| networks.get(network_name))
    else {
        return Vec::new();
    };

    let mut details = Vec::new();
    if let Some(ip) = endpoint.ip_address.as_deref().filter(|ip| !ip.is_empty()) {
        details.push(AttachmentDetail::new(PRIVATE_IPV4_DETAIL, ip));
    }
    if let Some(mac) = endpoint.mac_address.as_deref().filter(|m| !m.is_empty()) {
        details.push(AttachmentDetail::new("macAddress", mac));
    }

    vec![Attachment {
        kind: ENI_ATTACHMENT_KIND.into(),
        details,
    }]
}

#[cfg(test)]
#[path = "docker_tests.rs"]
mod docker_tests;
