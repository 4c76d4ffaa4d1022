use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use async_trait::async_trait;
use hickory_proto::rr::RecordType;
use log::{debug, info, warn};

use crate::error::DnsError;
use crate::types::{Upsert, ZoneRecord};

pub mod rfc2136;
pub use rfc2136::Rfc2136Backend;

/// The DNS-layer boundary: enumerate a zone's record sets and submit one
/// batched change. The batch is all-or-nothing at the server's discretion;
/// partial failure within it is never inspected here.
#[async_trait]
pub trait ZoneBackend {
    /// Every record set currently published in the zone, all types.
    async fn list_records(&self, zone: &str) -> Result<Vec<ZoneRecord>, DnsError>;

    /// Submit the upserts as one atomic batch. Callers never pass an empty
    /// batch.
    async fn submit_change_batch(&self, zone: &str, changes: &[Upsert])
        -> Result<(), DnsError>;
}

/// Build the name→IP map of the zone's single-value address records.
///
/// Non-address types are expected and skipped silently. Address records
/// with zero or several values are ambiguous, skipped with a warning, and
/// never reconciled. Record names are unique within a well-formed zone; a
/// duplicate would overwrite its predecessor.
pub async fn collect_records(
    backend: &dyn ZoneBackend,
    zone: &str,
) -> Result<BTreeMap<String, Ipv4Addr>, DnsError> {
    let sets = backend.list_records(zone).await?;

    let mut bindings = BTreeMap::new();
    for set in sets {
        if set.kind != RecordType::A {
            continue;
        }

        if set.values.len() != 1 {
            warn!(
                "Record {} has {} values, cannot treat as a single-IP binding, skipping",
                set.name,
                set.values.len()
            );
            continue;
        }

        match set.values[0].parse::<Ipv4Addr>() {
            Ok(ip) => {
                bindings.insert(set.name, ip);
            }
            Err(e) => warn!(
                "Record {} holds unparsable address '{}': {}, skipping",
                set.name, set.values[0], e
            ),
        }
    }

    Ok(bindings)
}

/// Submit the computed changes, or do nothing at all for an empty plan.
pub async fn apply_changes(
    backend: &dyn ZoneBackend,
    zone: &str,
    changes: &[Upsert],
) -> Result<(), DnsError> {
    if changes.is_empty() {
        debug!("Zone {} already converged, no batch submitted", zone);
        return Ok(());
    }

    info!("Submitting {} upserts to zone {}", changes.len(), zone);
    backend.submit_change_batch(zone, changes).await
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod mod_tests;
