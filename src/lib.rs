//! Find an Ultimate 64 / C64 Ultimate on the local network and run programs on it
//!
//! The device exposes a small REST API. This crate locates it and talks to it:
//!
//! - Discovery through a cached last-known address, mDNS browsing and a
//!   capped subnet scan, tried in that order
//! - PRG upload plus raw memory reads and writes
//! - Flat JSON credentials compatible with the device's companion tools

pub mod client;
pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod utils;

// Re-export main types for convenience
pub use client::DeviceClient;
pub use config::{Credentials, RemoteConfig};
pub use discovery::{DiscoveredDevice, DiscoveryCoordinator, Resolution};
pub use error::{RemoteError, Result};
