//! Timeline Routes
//!
//! - GET /api/v1/timeline - Current timeline state
//! - POST /api/v1/timeline - Create a new timeline
//! - DELETE /api/v1/timeline - Forget the current timeline
//! - POST /api/v1/timeline/refresh - Re-run reconciliation

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::{CreateTimelineResponse, TimelineResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;

/// GET /api/v1/timeline
pub async fn get_timeline(State(state): State<Arc<AppState>>) -> Json<TimelineResponse> {
    Json(state.timeline.snapshot().await.into())
}

/// POST /api/v1/timeline
pub async fn create_timeline(
    State(state): State<Arc<AppState>>,
) -> ApiResult<(StatusCode, Json<CreateTimelineResponse>)> {
    let timeline_id = state.timeline.create_timeline().await?;
    let digest = state.timeline.snapshot().await.last_digest;

    Ok((
        StatusCode::CREATED,
        Json(CreateTimelineResponse {
            timeline_id,
            digest,
        }),
    ))
}

/// DELETE /api/v1/timeline
pub async fn clear_timeline(State(state): State<Arc<AppState>>) -> ApiResult<StatusCode> {
    state.timeline.clear_timeline().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/timeline/refresh
///
/// Failures are returned as errors; the published state also carries the
/// message so pollers of GET /api/v1/timeline see it.
pub async fn refresh_timeline(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<TimelineResponse>> {
    state.timeline.fetch_posts().await?;
    Ok(Json(state.timeline.snapshot().await.into()))
}
