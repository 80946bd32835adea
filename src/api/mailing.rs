//! Mailing list and batch endpoints.

use axum::extract::{Path, State};

use super::{error, success, written, ApiJson, ApiResult};
use crate::errors::AppError;
use crate::models::{
    BatchDetail, BatchRecipient, Contact, CreateBatchRequest, CreateMailingListRequest,
    MailingBatch, MailingList, SubscribeRequest, UpdateMailingListRequest, UpdateRecipientRequest,
};
use crate::AppState;

/// GET /api/lists
pub async fn list_mailing_lists(State(state): State<AppState>) -> ApiResult<Vec<MailingList>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_mailing_lists().await {
        Ok(lists) => success(lists, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/lists/{id}
pub async fn get_mailing_list(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<MailingList> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_mailing_list(&id).await {
        Ok(Some(list)) => success(list, revision_id),
        Ok(None) => error(AppError::not_found("Mailing list", &id), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/lists
pub async fn create_mailing_list(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateMailingListRequest>,
) -> ApiResult<MailingList> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.create_mailing_list(&request).await;
    written(&state, result, revision_id).await
}

/// PUT /api/lists/{id}
pub async fn update_mailing_list(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateMailingListRequest>,
) -> ApiResult<MailingList> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.update_mailing_list(&id, &request).await;
    written(&state, result, revision_id).await
}

/// DELETE /api/lists/{id} - Batches made from the list keep their recipients.
pub async fn delete_mailing_list(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.delete_mailing_list(&id).await;
    written(&state, result, revision_id).await
}

/// GET /api/lists/{id}/members
pub async fn list_members(
    State(state): State<AppState>,
    Path(list_id): Path<String>,
) -> ApiResult<Vec<Contact>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_members(&list_id).await {
        Ok(members) => success(members, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/lists/{id}/members
pub async fn subscribe(
    State(state): State<AppState>,
    Path(list_id): Path<String>,
    ApiJson(request): ApiJson<SubscribeRequest>,
) -> ApiResult<MailingList> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.subscribe(&list_id, &request.contact_id).await;
    written(&state, result, revision_id).await
}

/// DELETE /api/lists/{id}/members/{contact_id}
pub async fn unsubscribe(
    State(state): State<AppState>,
    Path((list_id, contact_id)): Path<(String, String)>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.unsubscribe(&list_id, &contact_id).await;
    written(&state, result, revision_id).await
}

/// GET /api/batches - Newest first.
pub async fn list_batches(State(state): State<AppState>) -> ApiResult<Vec<MailingBatch>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_batches().await {
        Ok(batches) => success(batches, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/batches - Snapshot a list's members into a prepared batch.
pub async fn create_batch(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateBatchRequest>,
) -> ApiResult<BatchDetail> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.create_batch(&request).await;
    written(&state, result, revision_id).await
}

/// GET /api/batches/{id} - Batch, recipients and report.
pub async fn get_batch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<BatchDetail> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_batch_detail(&id).await {
        Ok(Some(detail)) => success(detail, revision_id),
        Ok(None) => error(AppError::not_found("Batch", &id), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/batches/{id}/send
pub async fn send_batch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<BatchDetail> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.send_batch(&id).await;
    written(&state, result, revision_id).await
}

/// POST /api/batches/{id}/close
pub async fn close_batch(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<BatchDetail> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.close_batch(&id).await;
    written(&state, result, revision_id).await
}

/// PUT /api/batches/{id}/recipients/{recipient_id}
pub async fn update_recipient(
    State(state): State<AppState>,
    Path((batch_id, recipient_id)): Path<(String, String)>,
    ApiJson(request): ApiJson<UpdateRecipientRequest>,
) -> ApiResult<BatchRecipient> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state
        .repo
        .update_recipient(&batch_id, &recipient_id, &request)
        .await;
    written(&state, result, revision_id).await
}
