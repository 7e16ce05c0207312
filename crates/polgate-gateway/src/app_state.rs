//! Shared application state for the polgate gateway.
//!
//! Holds the validated config and the admin-service collaborator. Nothing
//! in here is mutated after startup; requests share no other state.

use std::sync::Arc;

use polgate_core::error::Result;

use crate::admin::{GrpcPolicyAdmin, PolicyAdmin};
use crate::config::GatewayConfig;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    admin: Arc<dyn PolicyAdmin>,
}

impl AppState {
    /// Build state backed by the gRPC admin client described in `cfg.admin`.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        let admin = GrpcPolicyAdmin::new(&cfg.admin)?;
        tracing::info!(target_uri = %cfg.admin.target_uri(), user = %cfg.admin.username, "admin client configured");
        Ok(Self::with_admin(cfg, Arc::new(admin)))
    }

    /// Build state around any `PolicyAdmin` (fakes in tests).
    pub fn with_admin(cfg: GatewayConfig, admin: Arc<dyn PolicyAdmin>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { cfg, admin }),
        }
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn admin(&self) -> Arc<dyn PolicyAdmin> {
        Arc::clone(&self.inner.admin)
    }
}
