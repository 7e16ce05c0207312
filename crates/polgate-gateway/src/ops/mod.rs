//! Operational HTTP endpoints.
//!
//! - `/healthz` : liveness (does not touch the admin service)

use axum::{http::StatusCode, response::IntoResponse};

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
