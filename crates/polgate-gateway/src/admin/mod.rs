//! Policy admin service collaborator.
//!
//! Handlers only see the `PolicyAdmin` trait; production wires in the gRPC
//! client, tests a fake.

pub mod grpc;

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use polgate_core::audit::AccessLogEntry;
use polgate_core::error::Result;
use polgate_core::policy::{Policy, PolicySet};

pub use grpc::GrpcPolicyAdmin;

/// Access-log entries in the order the service produces them.
pub type AuditLogStream = BoxStream<'static, Result<AccessLogEntry>>;

/// Remote operations the gateway needs. Every call is attempted exactly once.
#[async_trait]
pub trait PolicyAdmin: Send + Sync {
    /// All policy ids known to the service, in service order.
    async fn list_policy_ids(&self) -> Result<Vec<String>>;

    async fn get_policies(&self, ids: &[String]) -> Result<Vec<Policy>>;

    /// Create or replace every policy in `set`.
    async fn add_or_update_policies(&self, set: &PolicySet) -> Result<()>;

    /// Most recent `tail` access-log entries.
    async fn access_logs(&self, tail: u32) -> Result<AuditLogStream>;
}
