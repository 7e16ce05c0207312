//! Decode-once codec for the HTTP API.
//!
//! - JSON request bodies => payload structs (missing or null fields default to "")
//! - Query string => repeated `id` values
//! - Responses => JSON bodies, or raw-text errors

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};

use polgate_core::error::{GatewayError, Result};
use polgate_core::policy::{Policy, PolicyKind, PolicySet};

pub const APPLICATION_JSON: &str = "application/json";

// --------------------
// Requests
// --------------------

/// `POST /policy` body.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CreatePolicyPayload {
    #[serde(deserialize_with = "null_as_empty")]
    pub policy_kind: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub version: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub scope: String,
}

impl CreatePolicyPayload {
    /// Check the payload in request order and build the new policy.
    ///
    /// The kind is checked before missing params, so an empty `policyKind`
    /// is reported as an invalid kind and the `policyType` entry below never fires.
    pub fn into_policy(self) -> Result<Policy> {
        let kind: PolicyKind = self.policy_kind.parse()?;

        let mut missing = Vec::new();
        if self.policy_kind.is_empty() {
            missing.push("policyType");
        }
        if self.name.is_empty() {
            missing.push("name");
        }
        if !missing.is_empty() {
            return Err(GatewayError::BadRequest(format!(
                "missing params: {}",
                missing.join(", ")
            )));
        }

        let policy = match kind {
            PolicyKind::Resource => Policy::resource(self.name, self.version).with_scope(self.scope),
            PolicyKind::Principal => {
                Policy::principal(self.name, self.version).with_scope(self.scope)
            }
            PolicyKind::DerivedRole => Policy::derived_roles(self.name),
        };
        Ok(policy)
    }
}

/// `PATCH /policy` and `POST /validate` body. `id` is accepted but unused.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PolicyTextPayload {
    #[serde(deserialize_with = "null_as_empty")]
    pub id: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub policy: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

pub fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| GatewayError::BadRequest(e.to_string()))
}

/// Every `id` query value, or `None` when the parameter is absent altogether.
pub fn query_ids(query: Option<&str>) -> Option<Vec<String>> {
    let ids: Vec<String> = url::form_urlencoded::parse(query?.as_bytes())
        .filter(|(k, _)| k == "id")
        .map(|(_, v)| v.into_owned())
        .collect();
    if ids.is_empty() {
        None
    } else {
        Some(ids)
    }
}

// --------------------
// Responses
// --------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPolicyIdsResponse {
    pub policy_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct GetPoliciesResponse {
    pub policies: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PolicyKeyResponse {
    pub id: String,
}

impl PolicyKeyResponse {
    /// Key of the first policy in `set`; empty when the set is empty.
    pub fn for_first(set: &PolicySet) -> Self {
        Self {
            id: set.first().map(Policy::key).unwrap_or_default(),
        }
    }
}

pub fn json_response<T: Serialize>(value: &T) -> Result<Response> {
    let body = serde_json::to_vec(value)?;
    Ok(([(header::CONTENT_TYPE, APPLICATION_JSON)], body).into_response())
}

/// 200 with no body, still labelled as JSON.
pub fn empty_json_response() -> Response {
    ([(header::CONTENT_TYPE, APPLICATION_JSON)], ()).into_response()
}

/// Client-visible error: status from the error tier, raw message as body.
#[derive(Debug)]
pub struct ApiError(pub GatewayError);

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        tracing::warn!(status = status.as_u16(), error = %self.0, "request failed");
        text_error(status, &self.0.to_string())
    }
}

/// Plain-text error body terminated by a newline.
pub fn text_error(status: StatusCode, msg: &str) -> Response {
    let mut resp = (status, format!("{msg}\n")).into_response();
    let headers = resp.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    resp
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(kind: &str, name: &str) -> CreatePolicyPayload {
        CreatePolicyPayload {
            policy_kind: kind.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_kind_is_reported_as_invalid_kind() {
        let err = create("", "").into_policy().unwrap_err();
        assert_eq!(
            err.to_string(),
            "`policyKind` must be one of: resource, principal, derivedRole"
        );
    }

    #[test]
    fn missing_name_is_listed() {
        let err = create("principal", "").into_policy().unwrap_err();
        assert_eq!(err.to_string(), "missing params: name");
    }

    #[test]
    fn null_fields_decode_as_empty() {
        let p: CreatePolicyPayload =
            decode_json(br#"{"policyKind":"resource","name":null,"version":null}"#).unwrap();
        assert_eq!(p.name, "");
        assert_eq!(p.into_policy().unwrap_err().to_string(), "missing params: name");

        let t: PolicyTextPayload = decode_json(br#"{"id":null,"policy":null}"#).unwrap();
        assert_eq!(t.policy, "");
    }

    #[test]
    fn version_defaults_and_scope_is_kept() {
        let mut p = create("resource", "leave_request");
        p.scope = "acme".into();
        assert_eq!(
            p.into_policy().unwrap().key(),
            "resource.leave_request.vdefault/acme"
        );
    }

    #[test]
    fn query_ids_distinguishes_absent_from_empty() {
        assert_eq!(query_ids(None), None);
        assert_eq!(query_ids(Some("foo=1")), None);
        assert_eq!(query_ids(Some("id=")), Some(vec![String::new()]));
        assert_eq!(
            query_ids(Some("id=resource.a.vdefault&x=1&id=derivedRole.b")),
            Some(vec!["resource.a.vdefault".into(), "derivedRole.b".into()])
        );
    }

    #[test]
    fn query_ids_are_percent_decoded() {
        assert_eq!(
            query_ids(Some("id=resource.a.v1%2Facme")),
            Some(vec!["resource.a.v1/acme".into()])
        );
    }
}
