//! WireMock-based device API mocking
//!
//! Simulates the REST endpoints of an Ultimate 64 so the client and the probe
//! can be exercised without hardware.

use serde_json::json;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

/// Mock device for testing
pub struct MockDevice {
    pub server: MockServer,
    pub base_url: String,
}

impl MockDevice {
    /// Start a mock device that answers the version endpoint
    pub async fn start() -> Self {
        let device = Self::start_bare().await;
        device.mock_version(200).await;
        device
    }

    /// Start a mock device with no endpoints mounted
    pub async fn start_bare() -> Self {
        let server = MockServer::start().await;
        let base_url = server.uri();
        Self { server, base_url }
    }

    /// Mount `GET /v1/version` answering with `status`
    pub async fn mock_version(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path("/v1/version"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "version": "0.1",
                "errors": []
            })))
            .mount(&self.server)
            .await;
    }
}
