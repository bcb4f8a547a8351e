//! Post Routes
//!
//! - GET /api/v1/posts - Reconciled posts, newest first
//! - POST /api/v1/posts - Submit a new post

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{CreatePostRequest, CreatePostResponse, PostDto, PostListResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// GET /api/v1/posts
pub async fn list_posts(State(state): State<Arc<AppState>>) -> Json<PostListResponse> {
    let snapshot = state.timeline.snapshot().await;
    let posts: Vec<PostDto> = snapshot.posts.iter().map(PostDto::from).collect();

    Json(PostListResponse {
        timeline_id: snapshot.timeline_id,
        total: posts.len(),
        posts,
    })
}

/// POST /api/v1/posts
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreatePostResponse>)> {
    let Json(req) = payload?;
    let digest = state.timeline.create_post(&req.content).await?;
    let snapshot = state.timeline.snapshot().await;

    Ok((
        StatusCode::CREATED,
        Json(CreatePostResponse {
            digest,
            posts: snapshot.posts.iter().map(PostDto::from).collect(),
        }),
    ))
}
