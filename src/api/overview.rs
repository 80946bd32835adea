//! Revision and dashboard endpoints.

use axum::extract::State;

use super::{error, success, ApiResult};
use crate::models::{Overview, RevisionInfo};
use crate::AppState;

/// GET /api/datastore/revision - Current revision only.
///
/// Cheap polling endpoint for clients that cache data locally.
pub async fn get_revision(State(state): State<AppState>) -> ApiResult<RevisionInfo> {
    match state.repo.get_revision_info().await {
        Ok(info) => {
            let revision_id = info.revision_id;
            success(info, revision_id)
        }
        Err(e) => error(e, 0),
    }
}

/// GET /api/overview - Dashboard counts.
pub async fn get_overview(State(state): State<AppState>) -> ApiResult<Overview> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_overview().await {
        Ok(overview) => success(overview, revision_id),
        Err(e) => error(e, revision_id),
    }
}
