//! Discovery module for locating a device on the local network
//!
//! Three strategies feed the [`DiscoveryCoordinator`]: the last-known-good
//! address in the [`AddressCache`], mDNS browsing and a brute-force subnet
//! scan. They are tried strictly in that order and never merged.

pub mod address_cache;
pub mod coordinator;
pub mod mdns;
pub mod network;
pub mod probe;

// Re-export main types for convenience
pub use address_cache::{AddressCache, AddressStore, CacheEntry};
pub use coordinator::{DiscoveryCoordinator, DiscoverySource, Resolution, SelectedDevice};
#[cfg(feature = "mdns")]
pub use mdns::BrowseHandle;
pub use mdns::MulticastDiscovery;
pub use network::{InterfaceAddr, InterfaceSource, SubnetScanner, SystemInterfaces};
pub use probe::{HttpProbe, ProbeResponse, ReqwestProbe, VERSION_PATH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A device found by one discovery run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredDevice {
    /// Advertised host name, empty when the strategy cannot learn it
    pub hostname: String,
    /// Dotted quad or resolved host
    pub address: String,
    /// Service port, 0 when unknown
    pub port: u16,
}

impl DiscoveredDevice {
    pub fn new<H: Into<String>, A: Into<String>>(hostname: H, address: A, port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            address: address.into(),
            port,
        }
    }

    /// Base URL used for every request to this device
    pub fn base_url(&self) -> String {
        match self.port {
            0 | 80 => format!("http://{}", self.address),
            port => format!("http://{}:{}", self.address, port),
        }
    }
}

impl fmt::Display for DiscoveredDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hostname.is_empty() {
            write!(f, "{}", self.base_url())
        } else {
            write!(f, "{} ({})", self.base_url(), self.hostname)
        }
    }
}

/// A discovery strategy producing an ordered list of devices
///
/// Implementations absorb every failure and report it as an empty list.
#[async_trait]
pub trait DeviceSource: Send + Sync {
    /// Short name used in log output
    fn name(&self) -> &'static str;

    /// Run one discovery pass
    async fn discover(&self) -> Vec<DiscoveredDevice>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_omits_default_port() {
        assert_eq!(
            DiscoveredDevice::new("", "10.0.0.5", 80).base_url(),
            "http://10.0.0.5"
        );
        assert_eq!(
            DiscoveredDevice::new("", "10.0.0.5", 0).base_url(),
            "http://10.0.0.5"
        );
        assert_eq!(
            DiscoveredDevice::new("u64", "10.0.0.5", 8080).base_url(),
            "http://10.0.0.5:8080"
        );
    }

    #[test]
    fn test_display_includes_hostname() {
        let device = DiscoveredDevice::new("c64u.local", "192.168.1.64", 80);
        assert_eq!(device.to_string(), "http://192.168.1.64 (c64u.local)");
    }
}
