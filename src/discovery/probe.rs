//! Connectivity probe against the device's version endpoint

use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::trace;

/// Relative path of the connectivity-check endpoint
pub const VERSION_PATH: &str = "/v1/version";

/// Status and body of a completed probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ProbeResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Anything short of a server error proves a live device, 401/403 included
    pub fn is_reachable(&self) -> bool {
        self.status > 0 && self.status < 500
    }

    /// Reachable and answered with a body
    pub fn is_device_hit(&self) -> bool {
        self.is_reachable() && !self.body.is_empty()
    }
}

/// Bounded-time GET of `{base_url}/v1/version`
///
/// `None` means the transport never completed (refused, unroutable, timed out).
#[async_trait]
pub trait HttpProbe: Send + Sync {
    async fn probe(&self, base_url: &str, timeout: Duration) -> Option<ProbeResponse>;
}

/// URL of the version endpoint under `base_url`
pub fn version_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), VERSION_PATH)
}

/// [`HttpProbe`] backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestProbe {
    client: Client,
}

impl ReqwestProbe {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("u64-remote/{}", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpProbe for ReqwestProbe {
    async fn probe(&self, base_url: &str, timeout: Duration) -> Option<ProbeResponse> {
        let url = version_url(base_url);

        let response = match self.client.get(&url).timeout(timeout).send().await {
            Ok(response) => response,
            Err(e) => {
                trace!("Probe {} failed: {}", url, e);
                return None;
            }
        };

        let status = response.status().as_u16();
        match response.bytes().await {
            Ok(body) => {
                trace!("Probe {} answered HTTP {} ({} bytes)", url, status, body.len());
                Some(ProbeResponse::new(status, body.to_vec()))
            }
            Err(e) => {
                trace!("Probe {} body read failed: {}", url, e);
                None
            }
        }
    }
}
