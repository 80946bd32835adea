//! Contact (CRM) endpoints, including search, duplicate check and import.

use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use super::{error, success, written, ApiJson, ApiResult};
use crate::errors::AppError;
use crate::models::{
    Contact, CreateContactRequest, DuplicateMatch, ImportContactsRequest, ImportOutcome,
    ImportReport, UpdateContactRequest,
};
use crate::search::{MAX_SEARCH_LIMIT, MAX_SEARCH_OFFSET};
use crate::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    /// Maximum number of results (default: 20).
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    20
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSearchResponse {
    pub results: Vec<ContactSearchItem>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSearchItem {
    pub contact: Contact,
    pub score: f32,
}

/// GET /api/contacts - List all contacts.
pub async fn list_contacts(State(state): State<AppState>) -> ApiResult<Vec<Contact>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_contacts().await {
        Ok(contacts) => success(contacts, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/contacts/{id} - Get a single contact.
pub async fn get_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Contact> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_contact(&id).await {
        Ok(Some(contact)) => success(contact, revision_id),
        Ok(None) => error(AppError::not_found("Contact", &id), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/contacts - Create a contact.
pub async fn create_contact(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateContactRequest>,
) -> ApiResult<Contact> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let result = state.repo.create_contact(&request).await;
    if let Ok(contact) = &result {
        if let Err(e) = state.search.index_contact(contact).await {
            tracing::warn!("Failed to index contact: {}", e);
        }
    }
    written(&state, result, revision_id).await
}

/// PUT /api/contacts/{id} - Update a contact.
pub async fn update_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateContactRequest>,
) -> ApiResult<Contact> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let result = state.repo.update_contact(&id, &request).await;
    if let Ok(contact) = &result {
        if let Err(e) = state.search.index_contact(contact).await {
            tracing::warn!("Failed to re-index contact: {}", e);
        }
    }
    written(&state, result, revision_id).await
}

/// DELETE /api/contacts/{id} - Delete a contact.
pub async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let result = state.repo.delete_contact(&id).await;
    if result.is_ok() {
        if let Err(e) = state.search.remove_contact(&id).await {
            tracing::warn!("Failed to remove contact from index: {}", e);
        }
    }
    written(&state, result, revision_id).await
}

/// GET /api/contacts/search - Full-text contact search.
pub async fn search_contacts(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<ContactSearchResponse> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let limit = params.limit.clamp(1, MAX_SEARCH_LIMIT);
    if params.offset > MAX_SEARCH_OFFSET {
        return error(
            AppError::Validation(format!("offset must not exceed {}", MAX_SEARCH_OFFSET)),
            revision_id,
        );
    }

    let hits = match state.search.search(&params.q, limit, params.offset) {
        Ok(hits) => hits,
        Err(e) => return error(e, revision_id),
    };

    let ids: Vec<String> = hits.iter().map(|h| h.contact_id.clone()).collect();
    let contacts = match state.repo.get_contacts_by_ids(&ids).await {
        Ok(contacts) => contacts,
        Err(e) => return error(e, revision_id),
    };

    // Hits whose contact vanished since indexing are dropped.
    let results: Vec<ContactSearchItem> = hits
        .into_iter()
        .filter_map(|hit| {
            contacts
                .iter()
                .find(|c| c.id == hit.contact_id)
                .map(|contact| ContactSearchItem {
                    contact: contact.clone(),
                    score: hit.score,
                })
        })
        .collect();

    let total = results.len();
    success(
        ContactSearchResponse {
            results,
            total,
            limit,
            offset: params.offset,
        },
        revision_id,
    )
}

/// POST /api/contacts/duplicates - Possible duplicates of a candidate.
pub async fn find_duplicates(
    State(state): State<AppState>,
    ApiJson(candidate): ApiJson<CreateContactRequest>,
) -> ApiResult<Vec<DuplicateMatch>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state
        .repo
        .find_duplicates(&candidate, state.config.duplicate_threshold)
        .await
    {
        Ok(matches) => success(matches, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/contacts/import - Preview or commit a contact import.
pub async fn import_contacts(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ImportContactsRequest>,
) -> ApiResult<ImportReport> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if request.contacts.is_empty() {
        return error(
            AppError::Validation("No contacts provided".to_string()),
            revision_id,
        );
    }

    let result = state
        .repo
        .import_contacts(
            &request.contacts,
            request.commit,
            state.config.duplicate_threshold,
        )
        .await;

    if let Ok(report) = &result {
        if report.committed {
            let created: Vec<Contact> = report
                .outcomes
                .iter()
                .filter_map(|o| match o {
                    ImportOutcome::Created { contact, .. } => Some(contact.clone()),
                    _ => None,
                })
                .collect();
            if let Err(e) = state.search.index_contacts(&created).await {
                tracing::warn!("Failed to index imported contacts: {}", e);
            }
        }
    }
    written(&state, result, revision_id).await
}
