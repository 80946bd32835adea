//! Event and budget scenario endpoints.

use axum::extract::{Path, Query, State};

use super::{error, success, written, ApiJson, ApiResult};
use crate::errors::AppError;
use crate::metrics::{self, ScenarioMetrics};
use crate::models::{
    BudgetScenario, CreateEventRequest, CreateScenarioRequest, Event, EventFilter,
    UpdateEventRequest, UpdateScenarioRequest,
};
use crate::AppState;

/// GET /api/events - List events, optionally filtered by `?status=`.
pub async fn list_events(
    State(state): State<AppState>,
    Query(filter): Query<EventFilter>,
) -> ApiResult<Vec<Event>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_events(&filter).await {
        Ok(events) => success(events, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/events/{id}
pub async fn get_event(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Event> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_event(&id).await {
        Ok(Some(event)) => success(event, revision_id),
        Ok(None) => error(AppError::not_found("Event", &id), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/events
pub async fn create_event(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateEventRequest>,
) -> ApiResult<Event> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.create_event(&request).await;
    written(&state, result, revision_id).await
}

/// PUT /api/events/{id}
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateEventRequest>,
) -> ApiResult<Event> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.update_event(&id, &request).await;
    written(&state, result, revision_id).await
}

/// DELETE /api/events/{id} - Delete an event together with its scenarios.
pub async fn delete_event(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.delete_event(&id).await;
    written(&state, result, revision_id).await
}

/// GET /api/events/{id}/scenarios
pub async fn list_scenarios(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> ApiResult<Vec<BudgetScenario>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_event(&event_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return error(AppError::not_found("Event", &event_id), revision_id),
        Err(e) => return error(e, revision_id),
    }

    match state.repo.list_scenarios(&event_id).await {
        Ok(scenarios) => success(scenarios, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/events/{id}/scenarios
pub async fn create_scenario(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    ApiJson(request): ApiJson<CreateScenarioRequest>,
) -> ApiResult<BudgetScenario> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.create_scenario(&event_id, &request).await;
    written(&state, result, revision_id).await
}

/// GET /api/scenarios/{id}
pub async fn get_scenario(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<BudgetScenario> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_scenario(&id).await {
        Ok(Some(scenario)) => success(scenario, revision_id),
        Ok(None) => error(AppError::not_found("Scenario", &id), revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/scenarios/{id}
pub async fn update_scenario(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateScenarioRequest>,
) -> ApiResult<BudgetScenario> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.update_scenario(&id, &request).await;
    written(&state, result, revision_id).await
}

/// DELETE /api/scenarios/{id}
pub async fn delete_scenario(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.delete_scenario(&id).await;
    written(&state, result, revision_id).await
}

/// POST /api/scenarios/{id}/duplicate - Copy a scenario under "<name> (copy)".
pub async fn duplicate_scenario(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<BudgetScenario> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);
    let result = state.repo.duplicate_scenario(&id).await;
    written(&state, result, revision_id).await
}

/// GET /api/scenarios/{id}/metrics - Profit table over all price/occupancy combinations.
pub async fn get_scenario_metrics(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ScenarioMetrics> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.get_scenario(&id).await {
        Ok(Some(scenario)) => success(metrics::compute(&scenario), revision_id),
        Ok(None) => error(AppError::not_found("Scenario", &id), revision_id),
        Err(e) => error(e, revision_id),
    }
}
