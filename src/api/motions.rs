//! Motion endpoints.

use axum::extract::{Path, State};

use super::{error, success, written, ApiJson, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateMotionRequest, Motion, MotionAction};
use crate::AppState;

/// GET /api/meetings/{id}/motions - Motions in the order they were made.
pub async fn list_motions(
    State(state): State<AppState>,
    Path(meeting_id): Path<String>,
) -> ApiResult<Vec<Motion>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_motions(&meeting_id).await {
        Ok(motions) => success(motions, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/meetings/{id}/motions
pub async fn create_motion(
    State(state): State<AppState>,
    Path(meeting_id): Path<String>,
    ApiJson(request): ApiJson<CreateMotionRequest>,
) -> ApiResult<Motion> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.create_motion(&meeting_id, &request).await;
    written(&state, result, revision_id).await
}

/// GET /api/motions/{id}
pub async fn get_motion(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Motion> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_motion(&id).await {
        Ok(Some(motion)) => success(motion, revision_id),
        Ok(None) => error(AppError::not_found("Motion", &id), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/motions/{id}/actions - Second, withdraw, table, take from table or vote.
pub async fn apply_motion_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(action): ApiJson<MotionAction>,
) -> ApiResult<Motion> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.apply_motion_action(&id, &action).await;
    written(&state, result, revision_id).await
}
