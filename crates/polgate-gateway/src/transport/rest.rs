//! API handlers.
//!
//! Each handler is one straight line: decode, one admin call, encode.
//! Client errors (bad JSON, bad kind, invalid policy text) are 400 and
//! never reach the admin service; admin failures are 500.

use std::convert::Infallible;

use axum::{
    body::Body,
    extract::{RawQuery, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures_util::{future, stream, StreamExt};

use polgate_core::error::Result;
use polgate_core::policy::{load_and_validate, to_yaml, PolicySet};

use crate::app_state::AppState;
use crate::transport::codec::{
    decode_json, empty_json_response, json_response, query_ids, text_error, ApiError,
    CreatePolicyPayload, GetPoliciesResponse, ListPolicyIdsResponse, PolicyKeyResponse,
    PolicyTextPayload, APPLICATION_JSON,
};

type ApiResult = std::result::Result<Response, ApiError>;

/// `GET /policies`
pub async fn list_policies(State(app): State<AppState>) -> ApiResult {
    let policy_ids = app.admin().list_policy_ids().await?;
    Ok(json_response(&ListPolicyIdsResponse { policy_ids })?)
}

/// `GET /policy?id=..&id=..`
///
/// No `id` parameter at all: empty 200 and no admin call.
pub async fn get_policy(State(app): State<AppState>, RawQuery(query): RawQuery) -> ApiResult {
    let Some(ids) = query_ids(query.as_deref()) else {
        return Ok(empty_json_response());
    };

    let policies = app.admin().get_policies(&ids).await?;
    let docs = policies.iter().map(to_yaml).collect::<Result<Vec<_>>>()?;
    Ok(json_response(&GetPoliciesResponse { policies: docs })?)
}

/// `POST /policy`
pub async fn create_policy(State(app): State<AppState>, body: Bytes) -> ApiResult {
    let payload: CreatePolicyPayload = decode_json(&body)?;
    let set = PolicySet::new().add(payload.into_policy()?);

    app.admin().add_or_update_policies(&set).await?;
    let resp = PolicyKeyResponse::for_first(&set);
    tracing::info!(id = %resp.id, "policy created");
    Ok(json_response(&resp)?)
}

/// `PATCH /policy`
pub async fn update_policy(State(app): State<AppState>, body: Bytes) -> ApiResult {
    let payload: PolicyTextPayload = decode_json(&body)?;
    let set = load_and_validate(&payload.policy)?;

    app.admin().add_or_update_policies(&set).await?;
    let resp = PolicyKeyResponse::for_first(&set);
    tracing::info!(id = %resp.id, count = set.len(), "policy updated");
    Ok(json_response(&resp)?)
}

/// `POST /validate` (local only)
pub async fn validate_policy(body: Bytes) -> ApiResult {
    let payload: PolicyTextPayload = decode_json(&body)?;
    load_and_validate(&payload.policy)?;
    Ok(empty_json_response())
}

/// `GET /auditlog`
///
/// Streams one line per access-log entry as the admin service produces
/// them. The first entry is awaited before the response starts so an
/// immediate failure is still a 500; a later failure is appended as a final
/// line and ends the body.
pub async fn audit_log(State(app): State<AppState>) -> ApiResult {
    let mut entries = app.admin().access_logs(app.cfg().gateway.audit_tail).await?;

    let first = match entries.next().await {
        Some(Err(e)) => return Err(e.into()),
        other => other,
    };

    let lines = stream::iter(first)
        .chain(entries)
        .scan(false, |failed, item| {
            let line = if *failed {
                None
            } else {
                match item {
                    Ok(entry) => Some(Bytes::from(entry.render_line() + "\n")),
                    Err(e) => {
                        *failed = true;
                        tracing::warn!(error = %e, "audit log stream aborted");
                        Some(Bytes::from(format!("{e}\n")))
                    }
                }
            };
            future::ready(line)
        })
        .map(Ok::<_, Infallible>);

    Ok((
        [(header::CONTENT_TYPE, APPLICATION_JSON)],
        Body::from_stream(lines),
    )
        .into_response())
}

/// Any method on `/policy` other than GET, POST, PATCH.
pub async fn method_not_supported(method: Method) -> Response {
    text_error(
        StatusCode::METHOD_NOT_ALLOWED,
        &format!("Method not supported: {method}"),
    )
}
