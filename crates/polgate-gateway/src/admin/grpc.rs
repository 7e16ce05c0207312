//! gRPC client for the policy admin service (tonic, plaintext).
//!
//! - One fresh channel per call; nothing is pooled or shared across requests.
//! - Basic credentials ride on every call as `authorization` metadata.
//! - Failures of any kind surface as `GatewayError::Upstream`.

use std::error::Error as StdError;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures_util::StreamExt;
use tonic::client::Grpc;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::metadata::AsciiMetadataValue;
use tonic::service::interceptor::{InterceptedService, Interceptor};
use tonic::transport::{Channel, Endpoint};
use tonic::{GrpcMethod, Request, Status};

use polgate_core::error::{GatewayError, Result};
use polgate_core::policy::{Policy, PolicySet};
use polgate_core::proto::{
    AddOrUpdatePolicyRequest, AddOrUpdatePolicyResponse, AuditLogEntryKind, GetPolicyRequest,
    GetPolicyResponse, ListAuditLogEntriesRequest, ListAuditLogEntriesResponse,
    ListPoliciesRequest, ListPoliciesResponse, ADMIN_SERVICE,
};

use super::{AuditLogStream, PolicyAdmin};
use crate::config::AdminSection;

#[derive(Clone, Copy)]
struct Rpc {
    method: &'static str,
    path: &'static str,
}

const LIST_POLICIES: Rpc = Rpc {
    method: "ListPolicies",
    path: "/cerbos.svc.v1.CerbosAdminService/ListPolicies",
};
const GET_POLICY: Rpc = Rpc {
    method: "GetPolicy",
    path: "/cerbos.svc.v1.CerbosAdminService/GetPolicy",
};
const ADD_OR_UPDATE_POLICY: Rpc = Rpc {
    method: "AddOrUpdatePolicy",
    path: "/cerbos.svc.v1.CerbosAdminService/AddOrUpdatePolicy",
};
const LIST_AUDIT_LOG_ENTRIES: Rpc = Rpc {
    method: "ListAuditLogEntries",
    path: "/cerbos.svc.v1.CerbosAdminService/ListAuditLogEntries",
};

/// Attaches `authorization: Basic base64(user:pass)` to every request.
#[derive(Clone)]
pub struct BasicAuth {
    header: AsciiMetadataValue,
}

impl BasicAuth {
    pub fn new(username: &str, password: &str) -> Result<Self> {
        let token = STANDARD.encode(format!("{username}:{password}"));
        let header = format!("Basic {token}")
            .parse::<AsciiMetadataValue>()
            .map_err(|e| GatewayError::Config(format!("invalid admin credentials: {e}")))?;
        Ok(Self { header })
    }
}

impl Interceptor for BasicAuth {
    fn call(&mut self, mut req: Request<()>) -> std::result::Result<Request<()>, Status> {
        req.metadata_mut()
            .insert("authorization", self.header.clone());
        Ok(req)
    }
}

type AdminChannel = InterceptedService<Channel, BasicAuth>;

pub struct GrpcPolicyAdmin {
    endpoint: Endpoint,
    auth: BasicAuth,
}

impl GrpcPolicyAdmin {
    pub fn new(cfg: &AdminSection) -> Result<Self> {
        let target = cfg.target_uri();
        let mut endpoint = Endpoint::from_shared(target.clone()).map_err(|e| {
            GatewayError::Config(format!("invalid admin endpoint {target}: {}", describe(&e)))
        })?;
        if let Some(ms) = cfg.connect_timeout_ms {
            endpoint = endpoint.connect_timeout(Duration::from_millis(ms));
        }

        Ok(Self {
            endpoint,
            auth: BasicAuth::new(&cfg.username, &cfg.password)?,
        })
    }

    async fn connect(&self, rpc: Rpc) -> Result<Grpc<AdminChannel>> {
        let channel = self.endpoint.connect().await.map_err(|e| {
            let msg = describe(&e);
            tracing::warn!(rpc = rpc.method, uri = %self.endpoint.uri(), error = %msg, "admin connect failed");
            GatewayError::Upstream(msg)
        })?;

        let mut grpc = Grpc::new(InterceptedService::new(channel, self.auth.clone()));
        grpc.ready()
            .await
            .map_err(|e| GatewayError::Upstream(format!("admin service was not ready: {e}")))?;
        Ok(grpc)
    }

    fn request<M>(rpc: Rpc, msg: M) -> Request<M> {
        let mut req = Request::new(msg);
        req.extensions_mut()
            .insert(GrpcMethod::new(ADMIN_SERVICE, rpc.method));
        req
    }

    async fn unary<Req, Resp>(&self, rpc: Rpc, msg: Req) -> Result<Resp>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        tracing::debug!(rpc = rpc.method, "admin call");
        let mut grpc = self.connect(rpc).await?;
        let resp = grpc
            .unary(
                Self::request(rpc, msg),
                PathAndQuery::from_static(rpc.path),
                ProstCodec::<Req, Resp>::default(),
            )
            .await
            .map_err(|s| status_error(rpc, s))?;
        Ok(resp.into_inner())
    }
}

#[async_trait]
impl PolicyAdmin for GrpcPolicyAdmin {
    async fn list_policy_ids(&self) -> Result<Vec<String>> {
        let resp: ListPoliciesResponse = self
            .unary(LIST_POLICIES, ListPoliciesRequest::default())
            .await?;
        Ok(resp.policy_ids)
    }

    async fn get_policies(&self, ids: &[String]) -> Result<Vec<Policy>> {
        let resp: GetPolicyResponse = self
            .unary(GET_POLICY, GetPolicyRequest { id: ids.to_vec() })
            .await?;
        Ok(resp.policies)
    }

    async fn add_or_update_policies(&self, set: &PolicySet) -> Result<()> {
        let req = AddOrUpdatePolicyRequest {
            policies: set.policies().to_vec(),
        };
        let _: AddOrUpdatePolicyResponse = self.unary(ADD_OR_UPDATE_POLICY, req).await?;
        Ok(())
    }

    async fn access_logs(&self, tail: u32) -> Result<AuditLogStream> {
        let rpc = LIST_AUDIT_LOG_ENTRIES;
        tracing::debug!(rpc = rpc.method, tail, "admin call");
        let mut grpc = self.connect(rpc).await?;
        let resp = grpc
            .server_streaming(
                Self::request(rpc, ListAuditLogEntriesRequest::access_tail(tail)),
                PathAndQuery::from_static(rpc.path),
                ProstCodec::<ListAuditLogEntriesRequest, ListAuditLogEntriesResponse>::default(),
            )
            .await
            .map_err(|s| status_error(rpc, s))?;

        let entries = resp.into_inner().map(move |item| match item {
            Ok(ListAuditLogEntriesResponse {
                entry: Some(AuditLogEntryKind::AccessLogEntry(entry)),
            }) => Ok(entry),
            Ok(_) => Err(GatewayError::Upstream(
                "admin service sent a non-access log entry".into(),
            )),
            Err(s) => Err(status_error(rpc, s)),
        });
        Ok(entries.boxed())
    }
}

fn status_error(rpc: Rpc, status: Status) -> GatewayError {
    let msg = format!(
        "rpc error: code = {:?} desc = {}",
        status.code(),
        status.message()
    );
    tracing::warn!(rpc = rpc.method, error = %msg, "admin call failed");
    GatewayError::Upstream(msg)
}

/// Error text including its source chain (`transport error: ...: connection refused`).
fn describe(e: &dyn StdError) -> String {
    let mut msg = e.to_string();
    let mut source = e.source();
    while let Some(s) = source {
        msg.push_str(": ");
        msg.push_str(&s.to_string());
        source = s.source();
    }
    msg
}
