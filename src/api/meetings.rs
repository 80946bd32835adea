//! Meeting, lifecycle, minutes and agenda endpoints.

use axum::extract::{Path, Query, State};

use super::{error, success, written, ApiJson, ApiResult};
use crate::errors::AppError;
use crate::models::{
    AgendaItem, CreateAgendaItemRequest, CreateMeetingRequest, Meeting, MeetingFilter,
    MeetingTransition, ReorderAgendaRequest, UpdateAgendaItemRequest, UpdateMeetingRequest,
    UpdateMinutesRequest,
};
use crate::AppState;

/// GET /api/meetings - List meetings, optionally filtered by `?committeeId=`.
pub async fn list_meetings(
    State(state): State<AppState>,
    Query(filter): Query<MeetingFilter>,
) -> ApiResult<Vec<Meeting>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_meetings(&filter).await {
        Ok(meetings) => success(meetings, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/meetings/{id}
pub async fn get_meeting(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Meeting> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_meeting(&id).await {
        Ok(Some(meeting)) => success(meeting, revision_id),
        Ok(None) => error(AppError::not_found("Meeting", &id), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/meetings
pub async fn create_meeting(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateMeetingRequest>,
) -> ApiResult<Meeting> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.create_meeting(&request).await;
    written(&state, result, revision_id).await
}

/// PUT /api/meetings/{id}
pub async fn update_meeting(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateMeetingRequest>,
) -> ApiResult<Meeting> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.update_meeting(&id, &request).await;
    written(&state, result, revision_id).await
}

/// DELETE /api/meetings/{id} - Also deletes its agenda and motions.
pub async fn delete_meeting(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.delete_meeting(&id).await;
    written(&state, result, revision_id).await
}

async fn transition(state: AppState, id: String, to: MeetingTransition) -> ApiResult<Meeting> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.transition_meeting(&id, to).await;
    written(&state, result, revision_id).await
}

/// POST /api/meetings/{id}/start
pub async fn start_meeting(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Meeting> {
    transition(state, id, MeetingTransition::Start).await
}

/// POST /api/meetings/{id}/adjourn
pub async fn adjourn_meeting(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Meeting> {
    transition(state, id, MeetingTransition::Adjourn).await
}

/// POST /api/meetings/{id}/cancel
pub async fn cancel_meeting(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Meeting> {
    transition(state, id, MeetingTransition::Cancel).await
}

/// PUT /api/meetings/{id}/minutes
pub async fn update_minutes(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateMinutesRequest>,
) -> ApiResult<Meeting> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.update_minutes(&id, &request).await;
    written(&state, result, revision_id).await
}

/// GET /api/meetings/{id}/agenda - Items ordered by position.
pub async fn list_agenda(
    State(state): State<AppState>,
    Path(meeting_id): Path<String>,
) -> ApiResult<Vec<AgendaItem>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_agenda(&meeting_id).await {
        Ok(items) => success(items, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/meetings/{id}/agenda - Append an item.
pub async fn create_agenda_item(
    State(state): State<AppState>,
    Path(meeting_id): Path<String>,
    ApiJson(request): ApiJson<CreateAgendaItemRequest>,
) -> ApiResult<AgendaItem> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.create_agenda_item(&meeting_id, &request).await;
    written(&state, result, revision_id).await
}

/// PUT /api/meetings/{id}/agenda/order
pub async fn reorder_agenda(
    State(state): State<AppState>,
    Path(meeting_id): Path<String>,
    ApiJson(request): ApiJson<ReorderAgendaRequest>,
) -> ApiResult<Vec<AgendaItem>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.reorder_agenda(&meeting_id, &request).await;
    written(&state, result, revision_id).await
}

/// PUT /api/agenda/{id}
pub async fn update_agenda_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateAgendaItemRequest>,
) -> ApiResult<AgendaItem> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.update_agenda_item(&id, &request).await;
    written(&state, result, revision_id).await
}

/// DELETE /api/agenda/{id}
pub async fn delete_agenda_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.delete_agenda_item(&id).await;
    written(&state, result, revision_id).await
}
