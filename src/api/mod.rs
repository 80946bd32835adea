//! REST API module.
//!
//! Handlers are grouped by area. Every response, success or error, is wrapped in
//! an envelope carrying the current `revisionId`.

mod committees;
mod contacts;
mod events;
mod mailing;
mod meetings;
mod motions;
mod overview;
mod public;
mod website;

pub use committees::*;
pub use contacts::*;
pub use events::*;
pub use mailing::*;
pub use meetings::*;
pub use motions::*;
pub use overview::*;
pub use public::*;
pub use website::*;

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};

use crate::errors::{AppError, AppErrorWithRevision};
use crate::AppState;

/// Success response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub revision_id: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T, revision_id: i64) -> Self {
        Self {
            success: true,
            data,
            revision_id,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppErrorWithRevision>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T, revision_id: i64) -> ApiResult<T> {
    Ok(ApiResponse::new(data, revision_id))
}

/// Create an error API response.
pub fn error<T: Serialize>(err: AppError, revision_id: i64) -> ApiResult<T> {
    Err(AppErrorWithRevision {
        error: err,
        revision_id,
    })
}

/// Finish a write: report the revision after it, or the one before it on failure.
pub async fn written<T: Serialize>(
    state: &AppState,
    result: Result<T, AppError>,
    revision_before: i64,
) -> ApiResult<T> {
    match result {
        Ok(data) => {
            let revision_id = state
                .repo
                .get_revision_id()
                .await
                .unwrap_or(revision_before);
            success(data, revision_id)
        }
        Err(e) => error(e, revision_before),
    }
}

/// JSON body extractor whose rejections use the error envelope.
pub struct ApiJson<T>(pub T);

impl<T: DeserializeOwned + Send> FromRequest<AppState> for ApiJson<T> {
    type Rejection = AppErrorWithRevision;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let error = match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => return Ok(ApiJson(value)),
            Err(rejection) => rejection_error(&rejection),
        };
        Err(AppErrorWithRevision {
            error,
            revision_id: state.repo.get_revision_id().await.unwrap_or(0),
        })
    }
}

fn rejection_error(rejection: &JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonDataError(e) => AppError::Validation(e.body_text()),
        other => AppError::BadRequest(other.body_text()),
    }
}
