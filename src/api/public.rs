//! Unauthenticated endpoints serving the public website.
//!
//! Only published content is visible here; drafts answer 404 like missing content.

use axum::extract::{Path, State};

use super::{error, success, written, ApiJson, ApiResult};
use crate::errors::AppError;
use crate::models::{BlogPost, ContactFormRequest, ContactSubmission, PublicMenu, SitePage};
use crate::AppState;

/// GET /public/pages/{slug}
pub async fn public_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<SitePage> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_published_page(&slug).await {
        Ok(Some(page)) => success(page, revision_id),
        Ok(None) => error(AppError::not_found("Page", &slug), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /public/posts - Published posts, newest first.
pub async fn public_posts(State(state): State<AppState>) -> ApiResult<Vec<BlogPost>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_published_posts().await {
        Ok(posts) => success(posts, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /public/posts/{slug}
pub async fn public_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<BlogPost> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_published_post(&slug).await {
        Ok(Some(post)) => success(post, revision_id),
        Ok(None) => error(AppError::not_found("Post", &slug), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /public/menus/{name}
pub async fn public_menu(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<PublicMenu> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_public_menu(&name).await {
        Ok(Some(menu)) => success(menu, revision_id),
        Ok(None) => error(AppError::not_found("Menu", &name), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /public/contact - Contact form.
pub async fn submit_contact_form(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<ContactFormRequest>,
) -> ApiResult<ContactSubmission> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.create_submission(&form).await;
    if let Ok(submission) = &result {
        tracing::info!(submission = %submission.id, "Contact form received");
    }
    written(&state, result, revision_id).await
}
