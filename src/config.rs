use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Cluster identifier; for the Docker provider, the container network
    /// whose members count as tasks.
    pub cluster: String,
    /// Optional service scope narrowing the pass to one service's tasks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// FQDN of the zone to reconcile; a missing trailing dot is added on
    /// load.
    pub zone: String,
    /// Authoritative server accepting zone transfers and dynamic updates.
    pub dns_server: SocketAddr,
    /// TTL stamped on every rewritten record.
    pub record_ttl: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cluster: String::new(),
            service: None,
            zone: String::new(),
            dns_server: "127.0.0.1:53".parse().unwrap(),
            record_ttl: 300,
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let mut config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("rebind.toml"))
            .merge(Json::file("rebind.json"))
            .merge(Env::prefixed("REBIND_"))
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        if config.cluster.is_empty() {
            anyhow::bail!("No cluster configured; set REBIND_CLUSTER or the 'cluster' key");
        }
        if config.zone.is_empty() {
            anyhow::bail!("No zone configured; set REBIND_ZONE or the 'zone' key");
        }

        // The zone is used as an FQDN everywhere; normalize it once here.
        if !config.zone.ends_with('.') {
            config.zone.push('.');
        }

        Ok(config)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
