//! Admin service request/response messages (`cerbos.svc.v1` / `cerbos.request.v1`).
//!
//! Hand-maintained prost definitions for the four admin RPCs the gateway
//! calls. Only the fields the gateway reads or writes are declared; prost
//! skips the rest on decode.

use crate::audit::AccessLogEntry;
use crate::policy::Policy;

/// Fully-qualified gRPC service name.
pub const ADMIN_SERVICE: &str = "cerbos.svc.v1.CerbosAdminService";

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListPoliciesRequest {
    #[prost(bool, tag = "1")]
    pub include_disabled: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListPoliciesResponse {
    #[prost(string, repeated, tag = "1")]
    pub policy_ids: Vec<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetPolicyRequest {
    #[prost(string, repeated, tag = "1")]
    pub id: Vec<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct GetPolicyResponse {
    #[prost(message, repeated, tag = "1")]
    pub policies: Vec<Policy>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct AddOrUpdatePolicyRequest {
    #[prost(message, repeated, tag = "1")]
    pub policies: Vec<Policy>,
}

/// Carries a `google.protobuf.Empty` on success; nothing to read.
#[derive(Clone, PartialEq, prost::Message)]
pub struct AddOrUpdatePolicyResponse {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListAuditLogEntriesRequest {
    #[prost(enumeration = "AuditLogKind", tag = "1")]
    pub kind: i32,
    #[prost(oneof = "AuditLogFilter", tags = "2")]
    pub filter: Option<AuditLogFilter>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum AuditLogKind {
    Unspecified = 0,
    Access = 1,
    Decision = 2,
}

#[derive(Clone, PartialEq, prost::Oneof)]
pub enum AuditLogFilter {
    #[prost(uint32, tag = "2")]
    Tail(u32),
}

impl ListAuditLogEntriesRequest {
    /// Last `tail` access-log entries.
    pub fn access_tail(tail: u32) -> Self {
        Self {
            kind: AuditLogKind::Access as i32,
            filter: Some(AuditLogFilter::Tail(tail)),
        }
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListAuditLogEntriesResponse {
    /// `None` for decision-log entries, which the gateway never requests.
    #[prost(oneof = "AuditLogEntryKind", tags = "1")]
    pub entry: Option<AuditLogEntryKind>,
}

#[derive(Clone, PartialEq, prost::Oneof)]
pub enum AuditLogEntryKind {
    #[prost(message, tag = "1")]
    AccessLogEntry(AccessLogEntry),
}
