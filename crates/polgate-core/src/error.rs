//! Shared error type across polgate crates.

use thiserror::Error;

/// Which side of the bridge a failure belongs to (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorTier {
    /// Malformed input, invalid enum value, policy text failing validation.
    Client,
    /// Admin service connection/RPC failure, serialization failure.
    Service,
}

impl ErrorTier {
    /// HTTP status code used when the error reaches a client.
    pub fn status_code(self) -> u16 {
        match self {
            ErrorTier::Client => 400,
            ErrorTier::Service => 500,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorTier::Client => "CLIENT",
            ErrorTier::Service => "SERVICE",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Unified error type used by core and gateway.
///
/// `Display` is the bare message: HTTP error bodies carry the raw text.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Upstream(String),
    #[error("{0}")]
    Internal(String),
    #[error("{0}")]
    Config(String),
}

impl GatewayError {
    pub fn tier(&self) -> ErrorTier {
        match self {
            GatewayError::BadRequest(_) => ErrorTier::Client,
            GatewayError::Upstream(_) | GatewayError::Internal(_) | GatewayError::Config(_) => {
                ErrorTier::Service
            }
        }
    }

    pub fn status_code(&self) -> u16 {
        self.tier().status_code()
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        GatewayError::Internal(e.to_string())
    }
}
