//! Device REST client

pub mod http_client;

pub use http_client::{DeviceClient, DeviceResponse};
