//! Posts handlers

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

pub async fn list_posts(
    State(state): State<ApiState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state.posts.list_posts(&params).await?;
    Ok(Json(Envelope::sourced("Posts retrieved successfully", page)))
}

pub async fn get_post(
    State(state): State<ApiState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.posts.get_post(id).await?;
    Ok(Json(Envelope::sourced("Post retrieved successfully", post)))
}

pub async fn list_user_posts(
    State(state): State<ApiState>,
    ApiPath(user_id): ApiPath<i64>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state.posts.list_user_posts(user_id, &params).await?;
    Ok(Json(Envelope::sourced(
        "User posts retrieved successfully",
        page,
    )))
}

pub async fn list_my_posts(
    State(state): State<ApiState>,
    Extension(actor): Extension<Actor>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state.posts.list_my_posts(actor, &params).await?;
    Ok(Json(Envelope::sourced(
        "Your posts retrieved successfully",
        page,
    )))
}

pub async fn my_post_stats(
    State(state): State<ApiState>,
    Extension(actor): Extension<Actor>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = state.posts.stats(actor).await?;
    Ok(Json(Envelope::sourced(
        "Post stats retrieved successfully",
        stats,
    )))
}

pub async fn create_post(
    State(state): State<ApiState>,
    Extension(actor): Extension<Actor>,
    ApiJson(payload): ApiJson<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state.posts.create_post(actor, &payload.captions).await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::plain("Post created successfully", post)),
    ))
}

pub async fn update_post(
    State(state): State<ApiState>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let post = state
        .posts
        .update_post(actor, id, &payload.captions)
        .await?;
    Ok(Json(Envelope::plain("Post updated successfully", post)))
}

pub async fn delete_post(
    State(state): State<ApiState>,
    Extension(actor): Extension<Actor>,
    ApiPath(id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.posts.delete_post(actor, id).await?;
    Ok(Json(Envelope::plain("Post deleted successfully", ())))
}
