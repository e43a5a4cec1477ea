//! Saved-post handlers

use axum::Json;
use axum::extract::{Extension, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::pagination::ListParams;
use crate::application::sessions::Actor;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::extract::{ApiJson, ApiPath};
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn save_post(
    State(state): State<ApiState>,
    Extension(actor): Extension<Actor>,
    ApiJson(payload): ApiJson<SavePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let saved = state.saved_posts.save_post(actor, payload.post_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::plain("Post saved successfully", saved)),
    ))
}

pub async fn list_user_saved(
    State(state): State<ApiState>,
    ApiPath(user_id): ApiPath<i64>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state.saved_posts.list_saved(user_id, &params).await?;
    Ok(Json(Envelope::sourced(
        "Saved posts retrieved successfully",
        page,
    )))
}

pub async fn list_my_saved(
    State(state): State<ApiState>,
    Extension(actor): Extension<Actor>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state.saved_posts.list_my_saved(actor, &params).await?;
    Ok(Json(Envelope::sourced(
        "Your saved posts retrieved successfully",
        page,
    )))
}

pub async fn remove_saved(
    State(state): State<ApiState>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.saved_posts.remove_saved(actor, id).await?;
    Ok(Json(Envelope::plain("Saved post removed successfully", ())))
}
