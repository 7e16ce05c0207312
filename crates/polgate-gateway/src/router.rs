//! Axum router wiring.
//!
//! API routes first; every other path falls through to the static asset
//! directory (`gateway.static_dir`).

use axum::{
    routing::{any, get},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{app_state::AppState, ops, transport::rest};

pub fn build_router(state: AppState) -> Router {
    let assets = ServeDir::new(&state.cfg().gateway.static_dir);

    Router::new()
        .route("/policies", any(rest::list_policies))
        .route(
            "/policy",
            get(rest::get_policy)
                .head(rest::method_not_supported)
                .post(rest::create_policy)
                .patch(rest::update_policy)
                .fallback(rest::method_not_supported),
        )
        .route("/validate", any(rest::validate_policy))
        .route("/auditlog", any(rest::audit_log))
        .route("/healthz", get(ops::healthz))
        .fallback_service(assets)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
