//! In-memory stand-ins for the discovery seams

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use u64_remote::discovery::{
    AddressStore, CacheEntry, DeviceSource, DiscoveredDevice, HttpProbe, InterfaceAddr,
    InterfaceSource, ProbeResponse,
};
use u64_remote::{RemoteError, Result};

/// Address store backed by a mutex, recording every write
#[derive(Default)]
pub struct MemoryStore {
    entry: Mutex<Option<CacheEntry>>,
    writes: Mutex<Vec<CacheEntry>>,
    reads: AtomicUsize,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn with_entry(entry: CacheEntry) -> Self {
        Self {
            entry: Mutex::new(Some(entry)),
            ..Self::default()
        }
    }

    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn writes(&self) -> Vec<CacheEntry> {
        self.writes.lock().unwrap().clone()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AddressStore for MemoryStore {
    async fn read(&self) -> Option<CacheEntry> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.entry.lock().unwrap().clone()
    }

    async fn write(&self, entry: &CacheEntry) -> Result<()> {
        if self.fail_writes {
            return Err(RemoteError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only cache",
            )));
        }
        self.writes.lock().unwrap().push(entry.clone());
        *self.entry.lock().unwrap() = Some(entry.clone());
        Ok(())
    }
}

/// Probe answering from a fixed table keyed by base URL
#[derive(Default)]
pub struct TableProbe {
    responses: HashMap<String, ProbeResponse>,
    calls: Mutex<Vec<(String, Duration)>>,
}

impl TableProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(mut self, base_url: &str, status: u16, body: &str) -> Self {
        self.responses
            .insert(base_url.to_string(), ProbeResponse::new(status, body.as_bytes()));
        self
    }

    pub fn calls(&self) -> Vec<(String, Duration)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn probed_urls(&self) -> Vec<String> {
        self.calls().into_iter().map(|(url, _)| url).collect()
    }
}

#[async_trait]
impl HttpProbe for TableProbe {
    async fn probe(&self, base_url: &str, timeout: Duration) -> Option<ProbeResponse> {
        self.calls
            .lock()
            .unwrap()
            .push((base_url.to_string(), timeout));
        self.responses.get(base_url).cloned()
    }
}

/// Discovery strategy returning a canned list
pub struct FixedSource {
    name: &'static str,
    devices: Vec<DiscoveredDevice>,
    calls: AtomicUsize,
}

impl FixedSource {
    pub fn new(name: &'static str, devices: Vec<DiscoveredDevice>) -> Self {
        Self {
            name,
            devices,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty(name: &'static str) -> Self {
        Self::new(name, Vec::new())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviceSource for FixedSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn discover(&self) -> Vec<DiscoveredDevice> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.devices.clone()
    }
}

/// Interface list fixed at construction
pub struct FixedInterfaces(pub Vec<InterfaceAddr>);

impl InterfaceSource for FixedInterfaces {
    fn ipv4_interfaces(&self) -> Vec<InterfaceAddr> {
        self.0.clone()
    }
}
