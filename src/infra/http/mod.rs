pub mod api;
mod middleware;

pub use api::{ApiState, build_api_router};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router, middleware as axum_middleware};
use tracing::warn;

use crate::application::error::ErrorReport;
use crate::infra::cache::CacheBinding;

use self::api::models::HealthReport;
use self::middleware::{log_responses, set_request_context};

/// Full application router: the `/api` surface plus `/health`.
pub fn build_router(state: ApiState) -> Router {
    build_api_router(state.clone())
        .route("/health", get(health))
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

/// Database reachability decides the status; the cache is reported but optional.
async fn health(State(state): State<ApiState>) -> Response {
    let cache = match &state.cache {
        CacheBinding::Disabled => "disabled",
        CacheBinding::Unavailable { .. } => "unavailable",
        CacheBinding::Ready(store) => match store.ping().await {
            Ok(()) => "ok",
            Err(err) => {
                warn!(
                    target = "socialfeed::http::health",
                    error = %err,
                    "cache ping failed"
                );
                "unavailable"
            }
        },
    };

    match state.database.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthReport {
                database: "ok",
                cache,
            }),
        )
            .into_response(),
        Err(err) => {
            let mut response = (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthReport {
                    database: "unavailable",
                    cache,
                }),
            )
                .into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
