//! mDNS browsing for devices advertising their web server
//!
//! A dedicated listener thread drains the mdns-sd event channel and forwards
//! every resolved service through a std channel. The caller sleeps for the
//! whole budget, then stops the browse, joins the thread and collects what
//! arrived. Nothing here returns an error: a missing backend is an empty list.

use super::{DeviceSource, DiscoveredDevice};
use crate::config::DiscoveryConfig;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

#[cfg(feature = "mdns")]
use mdns_sd::{Receiver, ServiceDaemon, ServiceEvent, ServiceInfo};
#[cfg(feature = "mdns")]
use std::net::IpAddr;
#[cfg(feature = "mdns")]
use std::sync::atomic::{AtomicBool, Ordering};
#[cfg(feature = "mdns")]
use std::sync::{mpsc, Arc};
#[cfg(feature = "mdns")]
use std::thread::{self, JoinHandle};
#[cfg(feature = "mdns")]
use tracing::{trace, warn};

/// Upper bound on how long the listener waits before re-checking the stop flag
#[cfg(feature = "mdns")]
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Multicast discovery strategy
#[derive(Debug, Clone)]
pub struct MulticastDiscovery {
    service_type: String,
    budget: Duration,
}

impl MulticastDiscovery {
    pub fn new<S: Into<String>>(service_type: S, budget: Duration) -> Self {
        Self {
            service_type: service_type.into(),
            budget,
        }
    }

    pub fn from_config(config: &DiscoveryConfig) -> Self {
        Self::new(config.service_type.clone(), config.multicast_budget)
    }

    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    /// Start browsing in the background
    ///
    /// Returns `None` when the daemon, the browse or the listener thread cannot
    /// be set up. Nothing keeps running in that case.
    #[cfg(feature = "mdns")]
    pub fn start(&self) -> Option<BrowseHandle> {
        let daemon = match ServiceDaemon::new() {
            Ok(daemon) => daemon,
            Err(e) => {
                warn!("mDNS backend unavailable: {}", e);
                return None;
            }
        };

        let events = match daemon.browse(&self.service_type) {
            Ok(events) => events,
            Err(e) => {
                warn!("Cannot browse {}: {}", self.service_type, e);
                shutdown_daemon(&daemon);
                return None;
            }
        };

        let stop = Arc::new(AtomicBool::new(false));
        let (sink, results) = mpsc::channel();
        let listener_stop = Arc::clone(&stop);
        let spawned = thread::Builder::new()
            .name("u64-mdns-listener".to_string())
            .spawn(move || listen(events, listener_stop, sink));

        match spawned {
            Ok(listener) => Some(BrowseHandle {
                daemon,
                service_type: self.service_type.clone(),
                stop,
                listener: Some(listener),
                results,
            }),
            Err(e) => {
                warn!("Cannot start mDNS listener thread: {}", e);
                shutdown_daemon(&daemon);
                None
            }
        }
    }

    /// Browse for exactly `budget`, then return every device resolved so far
    pub async fn discover_within(&self, budget: Duration) -> Vec<DiscoveredDevice> {
        info!(
            "📡 Browsing {} for {}ms",
            self.service_type,
            budget.as_millis()
        );

        #[cfg(feature = "mdns")]
        {
            let Some(handle) = self.start() else {
                return Vec::new();
            };

            tokio::time::sleep(budget).await;

            match tokio::task::spawn_blocking(move || handle.stop()).await {
                Ok(devices) => {
                    debug!("mDNS browse resolved {} device(s)", devices.len());
                    devices
                }
                Err(e) => {
                    warn!("mDNS listener shutdown failed: {}", e);
                    Vec::new()
                }
            }
        }

        #[cfg(not(feature = "mdns"))]
        {
            let _ = budget;
            debug!("Built without the mdns feature, skipping multicast discovery");
            Vec::new()
        }
    }
}

#[async_trait]
impl DeviceSource for MulticastDiscovery {
    fn name(&self) -> &'static str {
        "mdns"
    }

    async fn discover(&self) -> Vec<DiscoveredDevice> {
        self.discover_within(self.budget).await
    }
}

/// A running browse, owned by one discovery call
#[cfg(feature = "mdns")]
pub struct BrowseHandle {
    daemon: ServiceDaemon,
    service_type: String,
    stop: Arc<AtomicBool>,
    listener: Option<JoinHandle<()>>,
    results: mpsc::Receiver<DiscoveredDevice>,
}

#[cfg(feature = "mdns")]
impl BrowseHandle {
    /// Stop browsing and return devices in resolution order
    ///
    /// Blocks until the listener thread has exited.
    pub fn stop(mut self) -> Vec<DiscoveredDevice> {
        if let Some(listener) = self.listener.take() {
            self.signal();
            if listener.join().is_err() {
                warn!("mDNS listener thread panicked");
            }
            shutdown_daemon(&self.daemon);
        }
        self.results.try_iter().collect()
    }

    fn signal(&self) {
        self.stop.store(true, Ordering::Release);
        if let Err(e) = self.daemon.stop_browse(&self.service_type) {
            debug!("stop_browse({}) failed: {}", self.service_type, e);
        }
    }
}

#[cfg(feature = "mdns")]
impl Drop for BrowseHandle {
    // Runs on an async worker when a browse future is cancelled, so never join.
    // The detached listener exits within one poll interval.
    fn drop(&mut self) {
        if self.listener.take().is_some() {
            self.signal();
            shutdown_daemon(&self.daemon);
        }
    }
}

#[cfg(feature = "mdns")]
fn shutdown_daemon(daemon: &ServiceDaemon) {
    if let Err(e) = daemon.shutdown() {
        debug!("mDNS daemon shutdown failed: {}", e);
    }
}

/// One wait on the browse event channel
#[cfg(feature = "mdns")]
enum Polled {
    Event(ServiceEvent),
    Idle,
    Closed,
}

/// The part of the mdns-sd receiver the listener relies on
#[cfg(feature = "mdns")]
trait EventQueue {
    fn poll(&self, timeout: Duration) -> Polled;

    /// Events already queued, oldest first, without waiting
    fn pending(&self) -> Vec<ServiceEvent>;
}

#[cfg(feature = "mdns")]
impl EventQueue for Receiver<ServiceEvent> {
    fn poll(&self, timeout: Duration) -> Polled {
        match self.recv_timeout(timeout) {
            Ok(event) => Polled::Event(event),
            Err(_) if self.is_disconnected() => Polled::Closed,
            Err(_) => Polled::Idle,
        }
    }

    fn pending(&self) -> Vec<ServiceEvent> {
        self.try_iter().collect()
    }
}

#[cfg(feature = "mdns")]
fn listen<Q: EventQueue>(
    events: Q,
    stop: Arc<AtomicBool>,
    sink: mpsc::Sender<DiscoveredDevice>,
) {
    while !stop.load(Ordering::Acquire) {
        match events.poll(POLL_INTERVAL) {
            Polled::Event(event) => {
                if !forward(event, &sink) {
                    return;
                }
            }
            Polled::Closed => return,
            Polled::Idle => {}
        }
    }

    // Resolutions that landed between the last poll and the stop signal
    for event in events.pending() {
        if !forward(event, &sink) {
            return;
        }
    }
}

/// Returns false once the listener should exit
#[cfg(feature = "mdns")]
fn forward(event: ServiceEvent, sink: &mpsc::Sender<DiscoveredDevice>) -> bool {
    match event {
        ServiceEvent::ServiceResolved(info) => match device_from_service(&info) {
            Some(device) => {
                debug!("Resolved {} -> {}", info.get_fullname(), device);
                sink.send(device).is_ok()
            }
            None => {
                debug!("Resolved {} without an IPv4 address", info.get_fullname());
                true
            }
        },
        ServiceEvent::SearchStopped(service_type) => {
            trace!("Search for {} stopped", service_type);
            false
        }
        other => {
            trace!("mDNS event: {:?}", other);
            true
        }
    }
}

/// One device per resolution, using the lowest IPv4 address of the service
#[cfg(feature = "mdns")]
pub fn device_from_service(info: &ServiceInfo) -> Option<DiscoveredDevice> {
    let address = info
        .get_addresses()
        .iter()
        .filter_map(|ip| match ip {
            IpAddr::V4(v4) => Some(*v4),
            IpAddr::V6(_) => None,
        })
        .min()?;

    Some(DiscoveredDevice::new(
        info.get_hostname().trim_end_matches('.'),
        address.to_string(),
        info.get_port(),
    ))
}
