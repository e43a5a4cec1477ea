//! User handlers

use axum::Json;
use axum::extract::{Extension, Query, State};
use axum::response::IntoResponse;

use crate::application::pagination::ListParams;
use crate::application::sessions::Actor;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::extract::ApiPath;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn current_user(
    State(state): State<ApiState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.users.current_user(actor).await?;
    Ok(Json(Envelope::sourced("User retrieved successfully", user)))
}

pub async fn list_users(
    State(state): State<ApiState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state.users.list_users(&params).await?;
    Ok(Json(Envelope::sourced("Users retrieved successfully", page)))
}

pub async fn get_user(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.users.get_user(id).await?;
    Ok(Json(Envelope::sourced("User retrieved successfully", user)))
}
