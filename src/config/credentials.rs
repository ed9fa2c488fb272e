//! Device credentials file
//!
//! A flat JSON object written by hand next to the tool:
//!
//! ```json
//! { "address": "192.168.1.64", "password": "secret", "enableMessageBox": false }
//! ```

use crate::error::{RemoteError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Places searched for a credentials file when none is given explicitly
pub const DEFAULT_CREDENTIAL_PATHS: [&str; 3] = [
    "creds.json",
    "../json_examples/creds.json",
    "json_examples/creds.json",
];

/// Address and password used to talk to a device
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// Device base URL (normalized on load)
    #[serde(default)]
    pub address: String,

    /// Value of the `X-Password` header
    #[serde(default)]
    pub password: String,

    /// Show a message box on the device after upload
    #[serde(default)]
    pub enable_message_box: bool,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("address", &self.address)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .field("enable_message_box", &self.enable_message_box)
            .finish()
    }
}

impl Credentials {
    /// Parse a credentials document, normalizing the address
    pub fn parse(contents: &str) -> Result<Self> {
        let mut credentials: Credentials = serde_json::from_str(contents)?;
        credentials.address = normalize_base_url(&credentials.address);
        Ok(credentials)
    }

    /// Load credentials from a file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RemoteError::credentials(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&contents).map_err(|e| {
            RemoteError::credentials(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Find credentials the way the CLI does
    ///
    /// An explicit path must load. Otherwise the default locations are tried in
    /// order and the first one that parses wins. A file that exists but does
    /// not parse is skipped with a warning. None at all yields empty
    /// credentials.
    pub fn locate(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            let credentials = Self::load(path).map_err(|e| {
                RemoteError::credentials(format!(
                    "Failed to load creds from: {} ({})",
                    path.display(),
                    e
                ))
            })?;
            info!("🔑 Loaded credentials from {}", path.display());
            return Ok(credentials);
        }

        for candidate in DEFAULT_CREDENTIAL_PATHS.iter().map(PathBuf::from) {
            if !candidate.is_file() {
                debug!("No credentials at {}", candidate.display());
                continue;
            }
            match Self::load(&candidate) {
                Ok(credentials) => {
                    info!("🔑 Loaded credentials from {}", candidate.display());
                    return Ok(credentials);
                }
                Err(e) => warn!("⚠️  Ignoring unusable credentials file: {}", e),
            }
        }

        debug!("No credentials file found, continuing without one");
        Ok(Self::default())
    }

    /// Replace the address, normalizing it
    pub fn set_address(&mut self, address: &str) {
        self.address = normalize_base_url(address);
    }

    /// Whether an address is known
    pub fn has_address(&self) -> bool {
        !self.address.is_empty()
    }
}

/// Turn a bare host into a base URL
///
/// Prepends `http://` unless an `http://` or `https://` scheme is present and
/// strips a trailing `/`. Empty input stays empty.
pub fn normalize_base_url(address: &str) -> String {
    let address = address.trim();
    if address.is_empty() {
        return String::new();
    }

    let with_scheme = if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    };

    with_scheme.trim_end_matches('/').to_string()
}
