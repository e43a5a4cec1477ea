use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use crate::application::error::AppError;
use crate::application::sessions::SessionError;

use super::error::ApiError;
use super::state::ApiState;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

/// Resolve the caller's session and expose it to handlers as an [`Actor`] extension.
///
/// [`Actor`]: crate::application::sessions::Actor
pub async fn require_session(
    State(state): State<ApiState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = match extract_token(request.headers()) {
        Some(value) => value,
        None => return ApiError::unauthorized().into_response(),
    };

    let actor = match state.sessions.authenticate(&token).await {
        Ok(actor) => actor,
        Err(SessionError::Missing) | Err(SessionError::Invalid) => {
            return ApiError::unauthorized().into_response();
        }
        Err(SessionError::Repo(err)) => {
            warn!(
                target = "socialfeed::http::session",
                error = %err,
                "session lookup failed"
            );
            return ApiError::from(AppError::from(err)).into_response();
        }
    };

    request.extensions_mut().insert(actor);
    next.run(request).await
}

/// Bearer header first, then the `accessToken` cookie.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| raw.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(ACCESS_TOKEN_COOKIE)
        .map(|cookie| cookie.value().trim().to_string())
        .filter(|token| !token.is_empty())
}
