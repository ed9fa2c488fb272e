//! HTTP client for the device's REST API
//!
//! Every request carries the `X-Password` header. Bodies are raw bytes; the
//! device answers with plain text or JSON that this client passes through.

use crate::config::{ClientConfig, Credentials};
use crate::discovery::VERSION_PATH;
use crate::error::{RemoteError, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, ClientBuilder, Method};
use tracing::{debug, info};
use url::Url;

const PASSWORD_HEADER: &str = "X-Password";
const OCTET_STREAM: &str = "application/octet-stream";

const RUN_PRG_PATH: &str = "/v1/runners:run_prg";
const READ_MEMORY_PATH: &str = "/v1/machine:readmem";
const WRITE_MEMORY_PATH: &str = "/v1/machine:writemem";

/// Raw status and body of a device response
#[derive(Debug, Clone)]
pub struct DeviceResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl DeviceResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Client bound to one device
#[derive(Debug, Clone)]
pub struct DeviceClient {
    client: Client,
    base_url: Url,
    password: String,
}

impl DeviceClient {
    /// Build a client without contacting the device
    pub fn new(credentials: &Credentials, config: &ClientConfig) -> Result<Self> {
        if !credentials.has_address() {
            return Err(RemoteError::config(
                "No address set. Provide --address, set address in creds.json, or use --discover.",
            ));
        }

        let mut base_url = Url::parse(&credentials.address).map_err(|e| {
            RemoteError::config(format!("Invalid device address {}: {}", credentials.address, e))
        })?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = ClientBuilder::new()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(format!("u64-remote/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            password: credentials.password.clone(),
        })
    }

    /// Build a client and check that the device answers at all
    ///
    /// Any HTTP status passes the check; only a failed transport is an error.
    pub async fn connect(credentials: &Credentials, config: &ClientConfig) -> Result<Self> {
        let client = Self::new(credentials, config)?;
        info!("Connecting to device at {}", client.base_url);

        let response = client
            .send(Method::GET, VERSION_PATH, &[], None)
            .await
            .map_err(|e| {
                RemoteError::connection(format!(
                    "Connectivity check failed for {}: {}",
                    client.base_url, e
                ))
            })?;
        debug!("Connectivity check answered HTTP {}", response.status);

        Ok(client)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Body of `GET /v1/version`
    pub async fn version(&self) -> Result<String> {
        let response = self.expect_success("version", Method::GET, VERSION_PATH, &[], None).await?;
        Ok(response.body_text())
    }

    /// Upload a program image and start it
    pub async fn run_prg(&self, program: &[u8]) -> Result<DeviceResponse> {
        info!("📤 Uploading program ({} bytes) to {}", program.len(), self.base_url);
        self.expect_success(
            "runPRG",
            Method::POST,
            RUN_PRG_PATH,
            &[],
            Some(program.to_vec()),
        )
        .await
    }

    /// Read `length` bytes of machine memory starting at `address`
    pub async fn peek_memory(&self, address: u16, length: u32) -> Result<Vec<u8>> {
        let query = [
            ("address", format_address(address)),
            ("length", length.to_string()),
        ];
        let response = self
            .expect_success("peekMemory", Method::GET, READ_MEMORY_PATH, &query, None)
            .await?;
        Ok(response.body)
    }

    /// Write `data` into machine memory starting at `address`
    pub async fn poke_memory(&self, address: u16, data: &[u8]) -> Result<()> {
        let query = [("address", format_address(address))];
        self.expect_success(
            "pokeMemory",
            Method::POST,
            WRITE_MEMORY_PATH,
            &query,
            Some(data.to_vec()),
        )
        .await?;
        Ok(())
    }

    fn build_url(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let mut url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| RemoteError::config(format!("Invalid URL path {path}: {e}")))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(key, value)| (*key, value.as_str())));
        }
        Ok(url)
    }

    async fn expect_success(
        &self,
        operation: &str,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Vec<u8>>,
    ) -> Result<DeviceResponse> {
        let response = self.send(method, path, query, body).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(RemoteError::device_request(
                operation.to_string(),
                response.status,
                response.body_text(),
            ))
        }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Vec<u8>>,
    ) -> Result<DeviceResponse> {
        let url = self.build_url(path, query)?;
        debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method, url)
            .header(PASSWORD_HEADER, &self.password);
        if let Some(body) = body {
            request = request.header(CONTENT_TYPE, OCTET_STREAM).body(body);
        }

        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_transport_error)?.to_vec();
        debug!("HTTP {} ({} bytes)", status, body.len());

        Ok(DeviceResponse { status, body })
    }
}

/// Four lower-case hex digits, as the memory endpoints expect
fn format_address(address: u16) -> String {
    format!("{:04x}", address)
}

fn map_transport_error(e: reqwest::Error) -> RemoteError {
    if e.is_timeout() {
        RemoteError::timeout(format!("HTTP request timed out: {e}"))
    } else if e.is_connect() {
        RemoteError::connection(format!("HTTP request failed: {e}"))
    } else {
        RemoteError::Http(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(address: &str) -> DeviceClient {
        let credentials = Credentials {
            address: address.to_string(),
            password: String::new(),
            enable_message_box: false,
        };
        DeviceClient::new(&credentials, &ClientConfig::default()).unwrap()
    }

    #[test]
    fn test_format_address() {
        assert_eq!(format_address(0x0400), "0400");
        assert_eq!(format_address(0xd020), "d020");
        assert_eq!(format_address(0x1), "0001");
    }

    #[test]
    fn test_build_url_keeps_colon_paths() {
        let client = client_for("http://10.0.0.5");
        let url = client.build_url(RUN_PRG_PATH, &[]).unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.5/v1/runners:run_prg");
    }

    #[test]
    fn test_build_url_with_query_and_prefix() {
        let client = client_for("http://10.0.0.5/api");
        let url = client
            .build_url(
                READ_MEMORY_PATH,
                &[("address", format_address(0xc000)), ("length", "2".to_string())],
            )
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://10.0.0.5/api/v1/machine:readmem?address=c000&length=2"
        );
    }

    #[test]
    fn test_new_requires_address() {
        let err = DeviceClient::new(&Credentials::default(), &ClientConfig::default()).unwrap_err();
        assert!(matches!(err, RemoteError::Config(_)));
    }
}
