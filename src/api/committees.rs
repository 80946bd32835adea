//! Committee endpoints.

use axum::extract::{Path, State};

use super::{error, success, written, ApiJson, ApiResult};
use crate::errors::AppError;
use crate::models::{Committee, CreateCommitteeRequest, UpdateCommitteeRequest};
use crate::AppState;

/// GET /api/committees
pub async fn list_committees(State(state): State<AppState>) -> ApiResult<Vec<Committee>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_committees().await {
        Ok(committees) => success(committees, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/committees/{id}
pub async fn get_committee(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Committee> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_committee(&id).await {
        Ok(Some(committee)) => success(committee, revision_id),
        Ok(None) => error(AppError::not_found("Committee", &id), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/committees
pub async fn create_committee(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateCommitteeRequest>,
) -> ApiResult<Committee> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.create_committee(&request).await;
    written(&state, result, revision_id).await
}

/// PUT /api/committees/{id}
pub async fn update_committee(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateCommitteeRequest>,
) -> ApiResult<Committee> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.update_committee(&id, &request).await;
    written(&state, result, revision_id).await
}

/// DELETE /api/committees/{id} - Meetings of the committee are kept and detached.
pub async fn delete_committee(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.delete_committee(&id).await;
    written(&state, result, revision_id).await
}
