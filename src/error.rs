use thiserror::Error;

/// Failures raised by the compute-layer collaborator.
///
/// These are never recovered locally; they propagate to the invoker as a
/// pass-level failure. Skippable per-task anomalies are not errors and are
/// handled (with a warning) where they occur.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("failed to reach the container runtime: {reason}")]
    Connection { reason: String },

    #[error("listing running tasks in cluster '{cluster}' failed: {reason}")]
    ListTasks { cluster: String, reason: String },

    #[error("describing task '{handle}' in cluster '{cluster}' failed: {reason}")]
    DescribeTask {
        cluster: String,
        handle: String,
        reason: String,
    },
}

/// Failures raised by the DNS-layer collaborator.
#[derive(Debug, Error)]
pub enum DnsError {
    #[error("invalid DNS name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("failed to connect to DNS server {server}: {reason}")]
    Connection { server: String, reason: String },

    #[error("zone transfer for '{zone}' from {server} failed: {reason}")]
    Transfer {
        zone: String,
        server: String,
        reason: String,
    },

    #[error("submitting the change batch for zone '{zone}' to {server} failed: {reason}")]
    Submit {
        zone: String,
        server: String,
        reason: String,
    },

    /// The server answered the batch with a non-success response code. The
    /// batch is atomic, so nothing was applied.
    #[error("change batch for zone '{zone}' rejected by {server}: {code}")]
    ChangeRejected {
        zone: String,
        server: String,
        code: String,
    },
}
