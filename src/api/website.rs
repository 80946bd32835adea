//! Admin endpoints for the website CMS: pages, posts, menus and contact submissions.

use axum::extract::{Path, State};

use super::{error, success, written, ApiJson, ApiResult};
use crate::errors::AppError;
use crate::models::{
    BlogPost, ContactSubmission, CreateMenuRequest, CreatePageRequest, CreatePostRequest, Menu,
    SitePage, UpdateMenuRequest, UpdatePageRequest, UpdatePostRequest, UpdateSubmissionRequest,
};
use crate::AppState;

// ==================== PAGES ====================

/// GET /api/pages
pub async fn list_pages(State(state): State<AppState>) -> ApiResult<Vec<SitePage>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_pages().await {
        Ok(pages) => success(pages, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/pages/{id}
pub async fn get_page(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<SitePage> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_page(&id).await {
        Ok(Some(page)) => success(page, revision_id),
        Ok(None) => error(AppError::not_found("Page", &id), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/pages
pub async fn create_page(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreatePageRequest>,
) -> ApiResult<SitePage> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.create_page(&request).await;
    written(&state, result, revision_id).await
}

/// PUT /api/pages/{id}
pub async fn update_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdatePageRequest>,
) -> ApiResult<SitePage> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.update_page(&id, &request).await;
    written(&state, result, revision_id).await
}

/// DELETE /api/pages/{id}
pub async fn delete_page(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.delete_page(&id).await;
    written(&state, result, revision_id).await
}

// ==================== POSTS ====================

/// GET /api/posts - All posts, drafts included.
pub async fn list_posts(State(state): State<AppState>) -> ApiResult<Vec<BlogPost>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_posts().await {
        Ok(posts) => success(posts, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/posts/{id}
pub async fn get_post(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<BlogPost> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_post(&id).await {
        Ok(Some(post)) => success(post, revision_id),
        Ok(None) => error(AppError::not_found("Post", &id), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/posts - New posts start as drafts.
pub async fn create_post(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreatePostRequest>,
) -> ApiResult<BlogPost> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.create_post(&request).await;
    written(&state, result, revision_id).await
}

/// PUT /api/posts/{id}
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdatePostRequest>,
) -> ApiResult<BlogPost> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.update_post(&id, &request).await;
    written(&state, result, revision_id).await
}

/// POST /api/posts/{id}/publish
pub async fn publish_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<BlogPost> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.set_post_published(&id, true).await;
    written(&state, result, revision_id).await
}

/// POST /api/posts/{id}/unpublish
pub async fn unpublish_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<BlogPost> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.set_post_published(&id, false).await;
    written(&state, result, revision_id).await
}

/// DELETE /api/posts/{id}
pub async fn delete_post(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.delete_post(&id).await;
    written(&state, result, revision_id).await
}

// ==================== MENUS ====================

/// GET /api/menus
pub async fn list_menus(State(state): State<AppState>) -> ApiResult<Vec<Menu>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_menus().await {
        Ok(menus) => success(menus, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/menus/{id}
pub async fn get_menu(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Menu> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_menu(&id).await {
        Ok(Some(menu)) => success(menu, revision_id),
        Ok(None) => error(AppError::not_found("Menu", &id), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/menus
pub async fn create_menu(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateMenuRequest>,
) -> ApiResult<Menu> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.create_menu(&request).await;
    written(&state, result, revision_id).await
}

/// PUT /api/menus/{id}
pub async fn update_menu(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateMenuRequest>,
) -> ApiResult<Menu> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.update_menu(&id, &request).await;
    written(&state, result, revision_id).await
}

/// DELETE /api/menus/{id}
pub async fn delete_menu(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.delete_menu(&id).await;
    written(&state, result, revision_id).await
}

// ==================== CONTACT SUBMISSIONS ====================

/// GET /api/submissions - Unhandled first.
pub async fn list_submissions(State(state): State<AppState>) -> ApiResult<Vec<ContactSubmission>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_submissions().await {
        Ok(submissions) => success(submissions, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/submissions/{id} - Mark handled or unhandled.
pub async fn update_submission(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateSubmissionRequest>,
) -> ApiResult<ContactSubmission> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.set_submission_handled(&id, request.handled).await;
    written(&state, result, revision_id).await
}

/// DELETE /api/submissions/{id}
pub async fn delete_submission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.delete_submission(&id).await;
    written(&state, result, revision_id).await
}
