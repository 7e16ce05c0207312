//! HTTP contract of the gateway, driven through the router with an
//! in-memory admin service.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use futures_util::{stream, StreamExt};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use polgate_core::audit::AccessLogEntry;
use polgate_core::error::{GatewayError, Result};
use polgate_core::policy::{Effect, Policy, PolicySet, PolicyType, ResourceRule};
use polgate_gateway::admin::{AuditLogStream, PolicyAdmin};
use polgate_gateway::app_state::AppState;
use polgate_gateway::config::GatewayConfig;
use polgate_gateway::router::build_router;

// ── Fake admin service ─────────────────────────────────────────

#[derive(Default)]
struct FakeAdmin {
    store: Mutex<Vec<Policy>>,
    calls: Mutex<Vec<&'static str>>,
    audit: Mutex<Vec<Result<AccessLogEntry>>>,
    unavailable: bool,
}

impl FakeAdmin {
    fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    fn with_audit(entries: Vec<Result<AccessLogEntry>>) -> Self {
        Self {
            audit: Mutex::new(entries),
            ..Default::default()
        }
    }

    fn seed(&self, policy: Policy) {
        self.store.lock().unwrap().push(policy);
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.unavailable {
            return Err(GatewayError::Upstream(
                "rpc error: code = Unavailable desc = connection refused".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl PolicyAdmin for FakeAdmin {
    async fn list_policy_ids(&self) -> Result<Vec<String>> {
        self.record("list_policy_ids")?;
        Ok(self.store.lock().unwrap().iter().map(Policy::key).collect())
    }

    async fn get_policies(&self, ids: &[String]) -> Result<Vec<Policy>> {
        self.record("get_policies")?;
        let store = self.store.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| store.iter().find(|p| &p.key() == id).cloned())
            .collect())
    }

    async fn add_or_update_policies(&self, set: &PolicySet) -> Result<()> {
        self.record("add_or_update_policies")?;
        let mut store = self.store.lock().unwrap();
        for p in set.policies() {
            store.retain(|old| old.key() != p.key());
            store.push(p.clone());
        }
        Ok(())
    }

    async fn access_logs(&self, tail: u32) -> Result<AuditLogStream> {
        self.record("access_logs")?;
        assert_eq!(tail, 100);
        let entries = std::mem::take(&mut *self.audit.lock().unwrap());
        Ok(stream::iter(entries).boxed())
    }
}

// ── Helpers ────────────────────────────────────────────────────

fn app(admin: &Arc<FakeAdmin>) -> Router {
    let admin: Arc<dyn PolicyAdmin> = admin.clone();
    build_router(AppState::with_admin(GatewayConfig::default(), admin))
}

async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> Response {
    let body = match body {
        Some(v) => Body::from(v.to_string()),
        None => Body::empty(),
    };
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(body)
        .unwrap();
    app.oneshot(req).await.unwrap()
}

async fn body_text(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn content_type(resp: &Response) -> &str {
    resp.headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap())
        .unwrap_or_default()
}

fn leave_request_policy() -> Policy {
    let mut p = Policy::resource("leave_request", "").with_scope("acme");
    if let Some(PolicyType::ResourcePolicy(rp)) = &mut p.policy_type {
        rp.rules.push(ResourceRule {
            actions: vec!["view".into()],
            roles: vec!["employee".into()],
            effect: Effect::Allow as i32,
            ..Default::default()
        });
    }
    p
}

const ALBUM_POLICY: &str = r#"
apiVersion: api.cerbos.dev/v1
resourcePolicy:
  resource: album
  version: default
  rules:
    - actions: ["view"]
      roles: ["user"]
      effect: EFFECT_ALLOW
"#;

// ── Tests ──────────────────────────────────────────────────────

#[tokio::test]
async fn list_then_get_round_trips() {
    let admin = Arc::new(FakeAdmin::default());
    admin.seed(leave_request_policy());

    let resp = send(app(&admin), "GET", "/policies", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(content_type(&resp), "application/json");
    let listed: Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(listed, json!({ "policyIds": ["resource.leave_request.vdefault/acme"] }));

    let id = listed["policyIds"][0].as_str().unwrap();
    let resp = send(app(&admin), "GET", &format!("/policy?id={id}"), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let got: Value = serde_json::from_str(&body_text(resp).await).unwrap();
    let docs = got["policies"].as_array().unwrap();
    assert_eq!(docs.len(), 1);
    let yaml = docs[0].as_str().unwrap();
    assert!(yaml.contains("resource: leave_request"), "{yaml}");
    assert!(yaml.contains("effect: EFFECT_ALLOW"), "{yaml}");

    assert_eq!(admin.calls(), ["list_policy_ids", "get_policies"]);
}

#[tokio::test]
async fn get_keeps_requested_order() {
    let admin = Arc::new(FakeAdmin::default());
    admin.seed(Policy::derived_roles("common_roles"));
    admin.seed(leave_request_policy());

    let uri = "/policy?id=resource.leave_request.vdefault%2Facme&id=derivedRole.common_roles";
    let resp = send(app(&admin), "GET", uri, None).await;
    let got: Value = serde_json::from_str(&body_text(resp).await).unwrap();
    let docs = got["policies"].as_array().unwrap();
    assert!(docs[0].as_str().unwrap().contains("resourcePolicy:"));
    assert!(docs[1].as_str().unwrap().contains("derivedRoles:"));
}

#[tokio::test]
async fn get_without_id_is_empty_and_skips_admin() {
    let admin = Arc::new(FakeAdmin::default());
    let resp = send(app(&admin), "GET", "/policy", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(content_type(&resp), "application/json");
    assert_eq!(body_text(resp).await, "");
    assert!(admin.calls().is_empty());
}

#[tokio::test]
async fn get_with_no_matches_is_an_empty_array() {
    let admin = Arc::new(FakeAdmin::default());
    let resp = send(app(&admin), "GET", "/policy?id=resource.nope.vdefault", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, r#"{"policies":[]}"#);
    assert_eq!(admin.calls(), ["get_policies"]);
}

#[tokio::test]
async fn create_rejects_unknown_kind() {
    let admin = Arc::new(FakeAdmin::default());
    let body = json!({ "policyKind": "role", "name": "x" });
    let resp = send(app(&admin), "POST", "/policy", Some(body)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_text(resp).await,
        "`policyKind` must be one of: resource, principal, derivedRole\n"
    );
    assert!(admin.calls().is_empty());
}

#[tokio::test]
async fn create_rejects_missing_name() {
    let admin = Arc::new(FakeAdmin::default());
    let body = json!({ "policyKind": "principal" });
    let resp = send(app(&admin), "POST", "/policy", Some(body)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(content_type(&resp), "text/plain; charset=utf-8");
    assert_eq!(body_text(resp).await, "missing params: name\n");
    assert!(admin.calls().is_empty());
}

#[tokio::test]
async fn create_treats_null_name_as_missing() {
    let admin = Arc::new(FakeAdmin::default());
    let body = json!({ "policyKind": "resource", "name": null, "scope": null });
    let resp = send(app(&admin), "POST", "/policy", Some(body)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(resp).await, "missing params: name\n");
    assert!(admin.calls().is_empty());
}

#[tokio::test]
async fn create_rejects_malformed_json() {
    let admin = Arc::new(FakeAdmin::default());
    let req = Request::builder()
        .method("POST")
        .uri("/policy")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app(&admin).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(admin.calls().is_empty());
}

#[tokio::test]
async fn create_upserts_and_returns_key() {
    let admin = Arc::new(FakeAdmin::default());
    let body = json!({
        "policyKind": "resource",
        "name": "leave_request",
        "version": "v2",
        "scope": "acme"
    });
    let resp = send(app(&admin), "POST", "/policy", Some(body)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(content_type(&resp), "application/json");
    let got: Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(got, json!({ "id": "resource.leave_request.v2/acme" }));
    assert_eq!(admin.calls(), ["add_or_update_policies"]);

    let stored = admin.store.lock().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].api_version, "api.cerbos.dev/v1");
}

#[tokio::test]
async fn create_derived_role_ignores_version_and_scope() {
    let admin = Arc::new(FakeAdmin::default());
    let body = json!({
        "policyKind": "derivedRole",
        "name": "admin_perms",
        "version": "v3",
        "scope": "acme"
    });
    let resp = send(app(&admin), "POST", "/policy", Some(body)).await;
    let got: Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(got, json!({ "id": "derivedRole.admin_perms" }));
}

#[tokio::test]
async fn validate_never_contacts_admin() {
    let admin = Arc::new(FakeAdmin::default());

    let bad = json!({ "id": "ignored", "policy": "resourcePolicy: [unclosed" });
    let resp = send(app(&admin), "POST", "/validate", Some(bad)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(resp).await.starts_with("failed to read policy"));

    let good = json!({ "id": "ignored", "policy": ALBUM_POLICY });
    let resp = send(app(&admin), "POST", "/validate", Some(good)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "");

    assert!(admin.calls().is_empty());
}

#[tokio::test]
async fn update_upserts_and_returns_first_key() {
    let admin = Arc::new(FakeAdmin::default());
    let body = json!({ "id": "whatever", "policy": ALBUM_POLICY });
    let resp = send(app(&admin), "PATCH", "/policy", Some(body)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let got: Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(got, json!({ "id": "resource.album.vdefault" }));
    assert_eq!(admin.calls(), ["add_or_update_policies"]);
}

#[tokio::test]
async fn update_with_invalid_policy_skips_admin() {
    let admin = Arc::new(FakeAdmin::default());
    let body = json!({ "policy": "apiVersion: api.cerbos.dev/v1\nresourcePolicy:\n  resource: album\n" });
    let resp = send(app(&admin), "PATCH", "/policy", Some(body)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(resp).await.contains("resourcePolicy.version: must not be empty"));
    assert!(admin.calls().is_empty());
}

#[tokio::test]
async fn admin_failures_are_500_with_raw_text() {
    let admin = Arc::new(FakeAdmin::unavailable());

    let resp = send(app(&admin), "GET", "/policies", None).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_text(resp).await,
        "rpc error: code = Unavailable desc = connection refused\n"
    );

    let body = json!({ "policyKind": "principal", "name": "alice" });
    let resp = send(app(&admin), "POST", "/policy", Some(body)).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let resp = send(app(&admin), "GET", "/auditlog", None).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

fn entry(call_id: &str) -> AccessLogEntry {
    AccessLogEntry {
        call_id: call_id.into(),
        method: "/cerbos.svc.v1.CerbosService/CheckResources".into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn audit_log_streams_one_line_per_entry() {
    let admin = Arc::new(FakeAdmin::with_audit(vec![
        Ok(entry("a")),
        Ok(entry("b")),
        Err(GatewayError::Upstream("stream reset".into())),
        Ok(entry("never")),
    ]));

    let resp = send(app(&admin), "GET", "/auditlog", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(content_type(&resp), "application/json");

    let text = body_text(resp).await;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3, "{text}");
    assert!(lines[0].contains(r#""callId":"a""#));
    assert!(lines[1].contains(r#""callId":"b""#));
    assert_eq!(lines[2], "stream reset");
}

#[tokio::test]
async fn audit_log_error_on_first_entry_is_500() {
    let admin = Arc::new(FakeAdmin::with_audit(vec![Err(GatewayError::Upstream(
        "permission denied".into(),
    ))]));
    let resp = send(app(&admin), "GET", "/auditlog", None).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(resp).await, "permission denied\n");
}

#[tokio::test]
async fn audit_log_with_no_entries_is_empty_200() {
    let admin = Arc::new(FakeAdmin::with_audit(Vec::new()));
    let resp = send(app(&admin), "GET", "/auditlog", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "");
}

#[tokio::test]
async fn unsupported_method_on_policy() {
    let admin = Arc::new(FakeAdmin::default());
    let resp = send(app(&admin), "DELETE", "/policy", None).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body_text(resp).await, "Method not supported: DELETE\n");

    // HEAD is not a read alias here; the body is stripped but the status stays
    let resp = send(app(&admin), "HEAD", "/policy?id=resource.album.vdefault", None).await;
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert!(admin.calls().is_empty(), "{:?}", admin.calls());
}

#[tokio::test]
async fn healthz_is_ok() {
    let admin = Arc::new(FakeAdmin::default());
    let resp = send(app(&admin), "GET", "/healthz", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_text(resp).await, "ok");
    assert!(admin.calls().is_empty());
}
