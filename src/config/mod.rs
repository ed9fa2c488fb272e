//! Runtime configuration
//!
//! Discovery and client timeouts with defaults matching the device firmware's
//! responsiveness, overridable through `U64_*` environment variables.

pub mod credentials;

pub use credentials::{normalize_base_url, Credentials};

use crate::error::{RemoteError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Service type advertised by the device's web server
pub const DEFAULT_SERVICE_TYPE: &str = "_http._tcp.local.";

/// Discovery tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// mDNS service type to browse
    pub service_type: String,

    /// How long to listen for multicast answers
    #[serde(with = "humantime_serde")]
    pub multicast_budget: Duration,

    /// Per-host probe timeout during the subnet scan
    #[serde(with = "humantime_serde")]
    pub host_timeout: Duration,

    /// Upper bound on probed addresses per interface
    pub max_hosts_per_interface: usize,

    /// Timeout of the probe that validates a cached address
    #[serde(with = "humantime_serde")]
    pub validation_timeout: Duration,

    /// Cache file location, `None` for the per-user default
    pub cache_path: Option<PathBuf>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            service_type: DEFAULT_SERVICE_TYPE.to_string(),
            multicast_budget: Duration::from_millis(800),
            host_timeout: Duration::from_millis(250),
            max_hosts_per_interface: 512,
            validation_timeout: Duration::from_millis(1500),
            cache_path: None,
        }
    }
}

/// Device HTTP client tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Total request timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// TCP connect timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_millis(5000),
            connect_timeout: Duration::from_millis(1500),
        }
    }
}

/// Complete runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub discovery: DiscoveryConfig,
    pub client: ClientConfig,
}

impl RemoteConfig {
    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(service_type) = env::var("U64_SERVICE_TYPE") {
            config.discovery.service_type = service_type;
        }
        if let Some(budget) = millis_var("U64_MDNS_TIMEOUT_MS")? {
            config.discovery.multicast_budget = budget;
        }
        if let Some(timeout) = millis_var("U64_SCAN_TIMEOUT_MS")? {
            config.discovery.host_timeout = timeout;
        }
        if let Ok(max_hosts) = env::var("U64_SCAN_MAX_HOSTS") {
            config.discovery.max_hosts_per_interface = max_hosts
                .trim()
                .parse()
                .map_err(|e| RemoteError::config(format!("Invalid U64_SCAN_MAX_HOSTS: {}", e)))?;
        }
        if let Some(timeout) = millis_var("U64_VALIDATE_TIMEOUT_MS")? {
            config.discovery.validation_timeout = timeout;
        }
        if let Ok(path) = env::var("U64_CACHE_PATH") {
            if !path.trim().is_empty() {
                config.discovery.cache_path = Some(PathBuf::from(path));
            }
        }

        if let Some(timeout) = millis_var("U64_REQUEST_TIMEOUT_MS")? {
            config.client.request_timeout = timeout;
        }
        if let Some(timeout) = millis_var("U64_CONNECT_TIMEOUT_MS")? {
            config.client.connect_timeout = timeout;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let discovery = &self.discovery;

        if !discovery.service_type.ends_with(".local.") {
            return Err(RemoteError::config(format!(
                "Service type '{}' must end with '.local.'",
                discovery.service_type
            )));
        }

        let timeouts = [
            ("multicast budget", discovery.multicast_budget),
            ("scan host timeout", discovery.host_timeout),
            ("validation timeout", discovery.validation_timeout),
            ("request timeout", self.client.request_timeout),
            ("connect timeout", self.client.connect_timeout),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, value)| value.is_zero()) {
            return Err(RemoteError::config(format!("The {} must be non-zero", name)));
        }

        if discovery.max_hosts_per_interface == 0 {
            return Err(RemoteError::config(
                "Max hosts per interface must be at least 1",
            ));
        }

        Ok(())
    }
}

fn millis_var(name: &str) -> Result<Option<Duration>> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|e| RemoteError::config(format!("Invalid {}: {}", name, e))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn env_with(overrides: &[(&'static str, &'static str)]) -> Vec<(&'static str, Option<&'static str>)> {
        [
            "U64_SERVICE_TYPE",
            "U64_MDNS_TIMEOUT_MS",
            "U64_SCAN_TIMEOUT_MS",
            "U64_SCAN_MAX_HOSTS",
            "U64_VALIDATE_TIMEOUT_MS",
            "U64_CACHE_PATH",
            "U64_REQUEST_TIMEOUT_MS",
            "U64_CONNECT_TIMEOUT_MS",
        ]
        .into_iter()
        .map(|name| {
            let value = overrides
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| *value);
            (name, value)
        })
        .collect()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = RemoteConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.discovery.multicast_budget, Duration::from_millis(800));
        assert_eq!(config.discovery.max_hosts_per_interface, 512);
        assert_eq!(config.client.request_timeout, Duration::from_secs(5));
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        let vars = env_with(&[
            ("U64_MDNS_TIMEOUT_MS", "1200"),
            ("U64_SCAN_MAX_HOSTS", "64"),
            ("U64_CACHE_PATH", "/tmp/u64/device.json"),
        ]);
        temp_env::with_vars(vars, || {
            let config = RemoteConfig::from_env().unwrap();
            assert_eq!(
                config.discovery.multicast_budget,
                Duration::from_millis(1200)
            );
            assert_eq!(config.discovery.max_hosts_per_interface, 64);
            assert_eq!(
                config.discovery.cache_path,
                Some(PathBuf::from("/tmp/u64/device.json"))
            );
            assert_eq!(config.discovery.host_timeout, Duration::from_millis(250));
        });
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_garbage() {
        temp_env::with_vars(env_with(&[("U64_SCAN_TIMEOUT_MS", "fast")]), || {
            let err = RemoteConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("U64_SCAN_TIMEOUT_MS"));
        });
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_zero_timeout() {
        temp_env::with_vars(env_with(&[("U64_MDNS_TIMEOUT_MS", "0")]), || {
            assert!(matches!(
                RemoteConfig::from_env(),
                Err(RemoteError::Config(_))
            ));
        });
    }

    #[test]
    fn test_validate_rejects_zero_cap() {
        let mut config = RemoteConfig::default();
        config.discovery.max_hosts_per_interface = 0;
        assert!(matches!(config.validate(), Err(RemoteError::Config(_))));
    }

    #[test]
    fn test_durations_use_humantime() {
        let json = serde_json::to_value(DiscoveryConfig::default()).unwrap();
        assert_eq!(json["multicast_budget"], "800ms");
        assert_eq!(json["host_timeout"], "250ms");
    }
}
