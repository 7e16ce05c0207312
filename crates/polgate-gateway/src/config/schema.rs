use std::net::SocketAddr;

use serde::Deserialize;
use polgate_core::error::{GatewayError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub admin: AdminSection,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            version: 1,
            gateway: GatewaySection::default(),
            admin: AdminSection::default(),
        }
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(GatewayError::Config(format!(
                "unsupported config version: {}",
                self.version
            )));
        }

        self.gateway.validate()?;
        self.admin.validate()?;

        Ok(())
    }

    /// Replace the admin host when `host` is set and non-empty.
    pub fn with_host_override(mut self, host: Option<String>) -> Self {
        if let Some(h) = host.filter(|h| !h.is_empty()) {
            self.admin.host = h;
        }
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Directory served for every path the API does not claim.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    /// Number of access-log entries requested by `/auditlog`.
    #[serde(default = "default_audit_tail")]
    pub audit_tail: u32,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            static_dir: default_static_dir(),
            audit_tail: default_audit_tail(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if !(1..=1000).contains(&self.audit_tail) {
            return Err(GatewayError::Config(
                "gateway.audit_tail must be between 1 and 1000".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            GatewayError::Config(format!(
                "gateway.listen must be a valid SocketAddr ({}): {e}",
                self.listen
            ))
        })
    }
}

fn default_listen() -> String {
    "0.0.0.0:8090".into()
}
fn default_static_dir() -> String {
    "./client/dist".into()
}
fn default_audit_tail() -> u32 {
    100
}

/// Where and how to reach the policy admin service.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdminSection {
    #[serde(default = "default_admin_host")]
    pub host: String,

    #[serde(default = "default_admin_port")]
    pub port: u16,

    #[serde(default = "default_admin_username")]
    pub username: String,

    /// Placeholder credential; set a real one in the config file.
    #[serde(default = "default_admin_password")]
    pub password: String,

    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,
}

impl Default for AdminSection {
    fn default() -> Self {
        Self {
            host: default_admin_host(),
            port: default_admin_port(),
            username: default_admin_username(),
            password: default_admin_password(),
            connect_timeout_ms: None,
        }
    }
}

impl AdminSection {
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(GatewayError::Config("admin.host must not be empty".into()));
        }
        if self.port == 0 {
            return Err(GatewayError::Config("admin.port must not be 0".into()));
        }
        if self.connect_timeout_ms == Some(0) {
            return Err(GatewayError::Config(
                "admin.connect_timeout_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Plaintext gRPC target, e.g. `http://cerbos:3593`.
    pub fn target_uri(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

fn default_admin_host() -> String {
    "cerbos".into()
}
fn default_admin_port() -> u16 {
    3593
}
fn default_admin_username() -> String {
    "cerbos".into()
}
fn default_admin_password() -> String {
    "randomHash".into()
}
