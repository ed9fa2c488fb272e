//! Last-known-good device address
//!
//! One JSON record in the per-user configuration directory. There is no expiry;
//! the coordinator re-validates the address with a live probe before use.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Persisted selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Full base URL of the device
    pub address: String,
    /// Host name, empty when the device came from the subnet scan
    #[serde(default)]
    pub hostname: String,
}

impl CacheEntry {
    pub fn new<A: Into<String>, H: Into<String>>(address: A, hostname: H) -> Self {
        Self {
            address: address.into(),
            hostname: hostname.into(),
        }
    }
}

/// Storage for the single cached selection
#[async_trait]
pub trait AddressStore: Send + Sync {
    /// Read the entry; every failure reads as absent
    async fn read(&self) -> Option<CacheEntry>;

    /// Overwrite the entry
    async fn write(&self, entry: &CacheEntry) -> Result<()>;
}

/// File-backed [`AddressStore`]
#[derive(Debug, Clone)]
pub struct AddressCache {
    path: PathBuf,
}

impl AddressCache {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// `{config_dir}/u64-remote/device.json`, falling back to the home directory
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("u64-remote")
            .join("device.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for AddressCache {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

#[async_trait]
impl AddressStore for AddressCache {
    async fn read(&self) -> Option<CacheEntry> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) => {
                debug!("No cached device at {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<CacheEntry>(&contents) {
            Ok(entry) if !entry.address.trim().is_empty() => Some(entry),
            Ok(_) => {
                debug!("Cached device at {} has no address", self.path.display());
                None
            }
            Err(e) => {
                debug!("Ignoring malformed cache {}: {}", self.path.display(), e);
                None
            }
        }
    }

    async fn write(&self, entry: &CacheEntry) -> Result<()> {
        let serialized = serde_json::to_string_pretty(entry)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&self.path, serialized).await?;
        debug!("Cached device {} at {}", entry.address, self.path.display());
        Ok(())
    }
}
