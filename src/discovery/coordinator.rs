//! Discovery orchestration
//!
//! Strategies run in a fixed order and the first non-empty one wins:
//!
//! 1. cached address, if a live probe still reaches it
//! 2. mDNS browse
//! 3. subnet scan, only when mDNS found nothing
//!
//! A single device is selected automatically. Several are handed back to the
//! caller, who picks one by index through [`DiscoveryCoordinator::select`].
//! Every selection is written to the cache.

use super::address_cache::{AddressCache, AddressStore, CacheEntry};
use super::mdns::MulticastDiscovery;
use super::network::SubnetScanner;
use super::probe::{HttpProbe, ReqwestProbe};
use super::{DeviceSource, DiscoveredDevice};
use crate::config::DiscoveryConfig;
use crate::error::{RemoteError, Result};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Which strategy produced a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoverySource {
    Cache,
    Multicast,
    SubnetScan,
}

impl fmt::Display for DiscoverySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiscoverySource::Cache => "cache",
            DiscoverySource::Multicast => "mDNS",
            DiscoverySource::SubnetScan => "subnet scan",
        };
        f.write_str(name)
    }
}

/// The device chosen for this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedDevice {
    /// Base URL, e.g. `http://192.168.1.64`
    pub address: String,
    pub hostname: String,
    pub source: DiscoverySource,
}

/// Outcome of [`DiscoveryCoordinator::resolve`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A single device was found (or the cache was still valid)
    Selected(SelectedDevice),
    /// Several devices answered; the caller must choose
    Choose {
        source: DiscoverySource,
        devices: Vec<DiscoveredDevice>,
    },
}

/// Runs the discovery strategies against one address cache
pub struct DiscoveryCoordinator {
    cache: Arc<dyn AddressStore>,
    probe: Arc<dyn HttpProbe>,
    multicast: Arc<dyn DeviceSource>,
    scanner: Arc<dyn DeviceSource>,
    validation_timeout: Duration,
}

impl DiscoveryCoordinator {
    pub fn new(
        cache: Arc<dyn AddressStore>,
        probe: Arc<dyn HttpProbe>,
        multicast: Arc<dyn DeviceSource>,
        scanner: Arc<dyn DeviceSource>,
        validation_timeout: Duration,
    ) -> Self {
        Self {
            cache,
            probe,
            multicast,
            scanner,
            validation_timeout,
        }
    }

    /// Coordinator over the real cache file, mDNS and this machine's interfaces
    pub fn from_config(config: &DiscoveryConfig) -> Result<Self> {
        let cache = match &config.cache_path {
            Some(path) => AddressCache::new(path.clone()),
            None => AddressCache::default(),
        };
        let probe: Arc<dyn HttpProbe> = Arc::new(ReqwestProbe::new()?);
        let multicast = MulticastDiscovery::from_config(config);
        let scanner = SubnetScanner::from_config(Arc::clone(&probe), config);
        debug!(
            "Device cache at {}, browsing {}",
            cache.path().display(),
            multicast.service_type()
        );

        Ok(Self::new(
            Arc::new(cache),
            probe,
            Arc::new(multicast),
            Arc::new(scanner),
            config.validation_timeout,
        ))
    }

    /// Find a device, optionally starting from the cached address
    pub async fn resolve(&self, use_cache: bool) -> Result<Resolution> {
        if use_cache {
            if let Some(entry) = self.validated_cache_entry().await {
                info!("✅ Using cached device {}", entry.address);
                return Ok(Resolution::Selected(SelectedDevice {
                    address: entry.address,
                    hostname: entry.hostname,
                    source: DiscoverySource::Cache,
                }));
            }
        }

        let (source, mut devices) = self.discover_devices().await?;
        if devices.len() == 1 {
            let device = devices.remove(0);
            info!("✅ Found a single device via {}: {}", source, device);
            return Ok(Resolution::Selected(self.remember(&device, source).await));
        }

        info!("Found {} devices via {}", devices.len(), source);
        Ok(Resolution::Choose { source, devices })
    }

    /// Select `devices[index]` and cache it
    pub async fn select(
        &self,
        devices: &[DiscoveredDevice],
        index: usize,
        source: DiscoverySource,
    ) -> Result<SelectedDevice> {
        let device = devices.get(index).ok_or(RemoteError::InvalidSelection {
            index,
            count: devices.len(),
        })?;
        Ok(self.remember(device, source).await)
    }

    /// Every device the first successful strategy finds; the cache is untouched
    pub async fn list_devices(&self) -> Result<Vec<DiscoveredDevice>> {
        let (_, devices) = self.discover_devices().await?;
        Ok(devices)
    }

    /// The cached entry, if it passes one connectivity probe
    pub async fn validated_cache_entry(&self) -> Option<CacheEntry> {
        let entry = self.cache.read().await?;

        match self
            .probe
            .probe(&entry.address, self.validation_timeout)
            .await
        {
            Some(response) if response.is_reachable() => Some(entry),
            Some(response) => {
                info!(
                    "Cached device {} answered HTTP {}, rediscovering",
                    entry.address, response.status
                );
                None
            }
            None => {
                info!("Cached device {} is not reachable, rediscovering", entry.address);
                None
            }
        }
    }

    /// mDNS first, subnet scan only when mDNS is empty; never merged
    async fn discover_devices(&self) -> Result<(DiscoverySource, Vec<DiscoveredDevice>)> {
        let strategies = [
            (DiscoverySource::Multicast, &self.multicast),
            (DiscoverySource::SubnetScan, &self.scanner),
        ];

        for (source, strategy) in strategies {
            info!("🔍 Trying {} discovery...", strategy.name());
            let devices = strategy.discover().await;
            if !devices.is_empty() {
                return Ok((source, devices));
            }
            info!("⏭️  No devices via {}", strategy.name());
        }

        Err(RemoteError::NoDevicesFound)
    }

    async fn remember(&self, device: &DiscoveredDevice, source: DiscoverySource) -> SelectedDevice {
        let entry = CacheEntry::new(device.base_url(), device.hostname.clone());

        match self.cache.write(&entry).await {
            Ok(()) => debug!("Remembered {} for next time", entry.address),
            Err(e) => warn!("Could not cache device {}: {}", entry.address, e),
        }

        SelectedDevice {
            address: entry.address,
            hostname: entry.hostname,
            source,
        }
    }
}
