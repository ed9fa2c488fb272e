//! Error types for device discovery and upload
//!
//! Expected absence (no cache file, no multicast backend, a silent host) never
//! becomes an error. Only end-to-end failures cross the library boundary.

use thiserror::Error;

/// Result type alias for u64-remote operations
pub type Result<T> = std::result::Result<T, RemoteError>;

/// Error types for discovery, credentials and device requests
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Connection errors
    #[error("Connection error: {0}")]
    Connection(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing errors
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential file errors
    #[error("Credential error: {0}")]
    Credentials(String),

    /// Every discovery strategy came back empty
    #[error("No C64U devices discovered. Provide --address or set address in creds.json.")]
    NoDevicesFound,

    /// A device index outside the discovered list
    #[error("Invalid selection: index {index} is out of range for {count} device(s)")]
    InvalidSelection { index: usize, count: usize },

    /// The interactive prompt got no usable answer
    #[error("No device selected.")]
    NoSelection,

    /// The device answered with a non-2xx status
    #[error("{operation} failed HTTP {status} body: {body}")]
    DeviceRequest {
        operation: String,
        status: u16,
        body: String,
    },

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Timeout errors
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl RemoteError {
    /// Create a connection error
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a credentials error
    pub fn credentials<S: Into<String>>(msg: S) -> Self {
        Self::Credentials(msg.into())
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a device request error from a rejected response
    pub fn device_request<S: Into<String>>(operation: S, status: u16, body: S) -> Self {
        Self::DeviceRequest {
            operation: operation.into(),
            status,
            body: body.into(),
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteError::Connection(_) | RemoteError::Timeout(_) | RemoteError::Http(_) => true,
            RemoteError::DeviceRequest { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Check if error came out of device discovery or selection
    pub fn is_discovery_error(&self) -> bool {
        matches!(
            self,
            RemoteError::NoDevicesFound
                | RemoteError::InvalidSelection { .. }
                | RemoteError::NoSelection
        )
    }

    /// What the user can do about this error, if anything obvious
    pub fn hint(&self) -> Option<&'static str> {
        if self.is_discovery_error() {
            Some("pass --address http://<ip> or run with --list to see what answers")
        } else if self.is_retryable() {
            Some("the device may be busy or rebooting, try again")
        } else {
            None
        }
    }
}
