//! Brute-force subnet scan
//!
//! Fallback when nothing answers on mDNS: every usable IPv4 host of every
//! non-loopback interface is probed in ascending order, capped per interface,
//! one probe at a time.

use super::probe::HttpProbe;
use super::{DeviceSource, DiscoveredDevice};
use crate::config::DiscoveryConfig;
use async_trait::async_trait;
use pnet::ipnetwork::IpNetwork;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Port the probe talks to; the base URL carries no explicit port
const HTTP_PORT: u16 = 80;

/// An IPv4 address assigned to a local interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceAddr {
    pub name: String,
    pub ip: Ipv4Addr,
    pub netmask: Ipv4Addr,
}

impl InterfaceAddr {
    pub fn new<S: Into<String>>(name: S, ip: Ipv4Addr, netmask: Ipv4Addr) -> Self {
        Self {
            name: name.into(),
            ip,
            netmask,
        }
    }
}

/// Source of local IPv4 interface addresses, in OS enumeration order
pub trait InterfaceSource: Send + Sync {
    fn ipv4_interfaces(&self) -> Vec<InterfaceAddr>;
}

/// Interfaces of this machine via pnet
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInterfaces;

impl InterfaceSource for SystemInterfaces {
    fn ipv4_interfaces(&self) -> Vec<InterfaceAddr> {
        pnet::datalink::interfaces()
            .into_iter()
            .flat_map(|interface| {
                let name = interface.name;
                interface
                    .ips
                    .into_iter()
                    .filter_map(|network| match network {
                        IpNetwork::V4(v4) => Some(v4),
                        IpNetwork::V6(_) => None,
                    })
                    .map(move |v4| InterfaceAddr::new(name.clone(), v4.ip(), v4.mask()))
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

/// Lowest `cap` usable hosts of the network `ip`/`netmask`, ascending
///
/// Usable means strictly between the network and broadcast addresses, so /31
/// and /32 networks have none. Loopback addresses yield nothing.
pub fn candidate_hosts(ip: Ipv4Addr, netmask: Ipv4Addr, cap: usize) -> Vec<Ipv4Addr> {
    if ip.is_loopback() {
        return Vec::new();
    }

    let mask = u32::from(netmask);
    let network = u32::from(ip) & mask;
    let broadcast = network | !mask;
    if network == broadcast {
        return Vec::new();
    }

    let first = network + 1;
    let last = broadcast - 1;
    if first > last {
        return Vec::new();
    }

    (first..=last)
        .map(Ipv4Addr::from)
        .filter(|host| !host.is_loopback())
        .take(cap)
        .collect()
}

/// Subnet scan strategy
pub struct SubnetScanner {
    probe: Arc<dyn HttpProbe>,
    interfaces: Arc<dyn InterfaceSource>,
    host_timeout: Duration,
    max_hosts: usize,
}

impl SubnetScanner {
    pub fn new(
        probe: Arc<dyn HttpProbe>,
        interfaces: Arc<dyn InterfaceSource>,
        host_timeout: Duration,
        max_hosts: usize,
    ) -> Self {
        Self {
            probe,
            interfaces,
            host_timeout,
            max_hosts,
        }
    }

    /// Scanner over this machine's interfaces with the configured limits
    pub fn from_config(probe: Arc<dyn HttpProbe>, config: &DiscoveryConfig) -> Self {
        Self::new(
            probe,
            Arc::new(SystemInterfaces),
            config.host_timeout,
            config.max_hosts_per_interface,
        )
    }

    /// Probe every candidate host and collect the ones that answer
    pub async fn scan(&self, host_timeout: Duration, max_hosts: usize) -> Vec<DiscoveredDevice> {
        let mut devices = Vec::new();

        for interface in self.interfaces.ipv4_interfaces() {
            if interface.ip.is_loopback() {
                debug!("Skipping loopback interface {}", interface.name);
                continue;
            }

            let hosts = candidate_hosts(interface.ip, interface.netmask, max_hosts);
            if hosts.is_empty() {
                debug!(
                    "No usable hosts on {} ({}/{})",
                    interface.name, interface.ip, interface.netmask
                );
                continue;
            }

            info!(
                "🔎 Scanning {} host(s) on {} ({}/{})",
                hosts.len(),
                interface.name,
                interface.ip,
                interface.netmask
            );

            for host in hosts {
                let base_url = format!("http://{}", host);
                match self.probe.probe(&base_url, host_timeout).await {
                    Some(response) if response.is_device_hit() => {
                        info!("✅ {} answered HTTP {}", host, response.status);
                        devices.push(DiscoveredDevice::new("", host.to_string(), HTTP_PORT));
                    }
                    Some(response) => {
                        debug!("{} answered HTTP {} but is not a device", host, response.status)
                    }
                    None => {}
                }
            }
        }

        devices
    }
}

#[async_trait]
impl DeviceSource for SubnetScanner {
    fn name(&self) -> &'static str {
        "subnet scan"
    }

    async fn discover(&self) -> Vec<DiscoveredDevice> {
        self.scan(self.host_timeout, self.max_hosts).await
    }
}
