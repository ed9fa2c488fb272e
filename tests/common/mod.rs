//! Common test utilities

#![allow(dead_code)]

pub mod device_mock;
pub mod stubs;

pub use device_mock::MockDevice;
pub use stubs::{FixedInterfaces, FixedSource, MemoryStore, TableProbe};

use u64_remote::discovery::DiscoveredDevice;

/// A device as mDNS would report it
pub fn mdns_device(last_octet: u8) -> DiscoveredDevice {
    DiscoveredDevice::new(
        format!("c64u-{}.local", last_octet),
        format!("192.168.1.{}", last_octet),
        80,
    )
}
