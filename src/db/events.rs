//! Event and budget scenario persistence.

use sqlx::Row;

use super::repository::{
    bump_revision, check_version, concurrent_modification, new_id, now, parse_json, to_json,
    Repository,
};
use crate::errors::AppError;
use crate::models::{
    validate_schedule, BudgetScenario, CreateEventRequest, CreateScenarioRequest, Event,
    EventFilter, EventStatus, UpdateEventRequest, UpdateScenarioRequest,
};

const EVENT_COLUMNS: &str =
    "id, name, description, venue, starts_at, ends_at, capacity, status, created_at, updated_at, version";
const SCENARIO_COLUMNS: &str = "id, event_id, name, ticket_prices, staff_prices, occupancy_levels, capacity, staff_count, line_items, notes, created_at, updated_at, version";

impl Repository {
    // ==================== EVENT OPERATIONS ====================

    /// List events by start time, optionally filtered by status.
    pub async fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>, AppError> {
        let rows = match filter.status {
            Some(status) => {
                sqlx::query(&format!(
                    "SELECT {} FROM events WHERE status = ? ORDER BY starts_at, name",
                    EVENT_COLUMNS
                ))
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {} FROM events ORDER BY starts_at, name",
                    EVENT_COLUMNS
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.iter().map(event_from_row).collect())
    }

    pub async fn get_event(&self, id: &str) -> Result<Option<Event>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM events WHERE id = ?", EVENT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(event_from_row))
    }

    pub async fn create_event(&self, request: &CreateEventRequest) -> Result<Event, AppError> {
        if request.name.trim().is_empty() {
            return Err(AppError::Validation("Event name is required".to_string()));
        }
        validate_schedule(
            &request.starts_at,
            request.ends_at.as_deref(),
            request.capacity,
        )
        .map_err(AppError::Validation)?;

        let timestamp = now();
        let event = Event {
            id: new_id(),
            name: request.name.trim().to_string(),
            description: request.description.clone(),
            venue: request.venue.clone(),
            starts_at: request.starts_at.clone(),
            ends_at: request.ends_at.clone(),
            capacity: request.capacity,
            status: request.status,
            created_at: timestamp.clone(),
            updated_at: timestamp,
            version: 1,
        };

        sqlx::query(
            "INSERT INTO events (id, name, description, venue, starts_at, ends_at, capacity, status, created_at, updated_at, version) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1)",
        )
        .bind(&event.id)
        .bind(&event.name)
        .bind(&event.description)
        .bind(&event.venue)
        .bind(&event.starts_at)
        .bind(&event.ends_at)
        .bind(event.capacity)
        .bind(event.status.as_str())
        .bind(&event.created_at)
        .bind(&event.updated_at)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;
        Ok(event)
    }

    pub async fn update_event(
        &self,
        id: &str,
        request: &UpdateEventRequest,
    ) -> Result<Event, AppError> {
        let existing = self
            .get_event(id)
            .await?
            .ok_or_else(|| AppError::not_found("Event", id))?;
        check_version(request.expected_version, existing.version)?;

        let merged = Event {
            name: request.name.clone().unwrap_or_else(|| existing.name.clone()),
            description: request
                .description
                .clone()
                .or_else(|| existing.description.clone()),
            venue: request.venue.clone().or_else(|| existing.venue.clone()),
            starts_at: request
                .starts_at
                .clone()
                .unwrap_or_else(|| existing.starts_at.clone()),
            ends_at: request.ends_at.clone().or_else(|| existing.ends_at.clone()),
            capacity: request.capacity.or(existing.capacity),
            status: request.status.unwrap_or(existing.status),
            updated_at: now(),
            version: existing.version + 1,
            ..existing.clone()
        };
        if merged.name.trim().is_empty() {
            return Err(AppError::Validation("Event name is required".to_string()));
        }
        validate_schedule(&merged.starts_at, merged.ends_at.as_deref(), merged.capacity)
            .map_err(AppError::Validation)?;

        let result = sqlx::query(
            "UPDATE events SET name = ?, description = ?, venue = ?, starts_at = ?, ends_at = ?, capacity = ?, status = ?, updated_at = ?, version = ? WHERE id = ? AND version = ?",
        )
        .bind(&merged.name)
        .bind(&merged.description)
        .bind(&merged.venue)
        .bind(&merged.starts_at)
        .bind(&merged.ends_at)
        .bind(merged.capacity)
        .bind(merged.status.as_str())
        .bind(&merged.updated_at)
        .bind(merged.version)
        .bind(id)
        .bind(existing.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current = self.get_event(id).await?;
            return Err(concurrent_modification(current.map(|e| e.version)));
        }

        self.increment_revision().await?;
        Ok(merged)
    }

    /// Delete an event together with its scenarios.
    pub async fn delete_event(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Event", id));
        }

        self.increment_revision().await?;
        Ok(())
    }

    // ==================== SCENARIO OPERATIONS ====================

    pub async fn list_scenarios(&self, event_id: &str) -> Result<Vec<BudgetScenario>, AppError> {
        if self.get_event(event_id).await?.is_none() {
            return Err(AppError::not_found("Event", event_id));
        }
        let rows = sqlx::query(&format!(
            "SELECT {} FROM budget_scenarios WHERE event_id = ? ORDER BY created_at, name",
            SCENARIO_COLUMNS
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(scenario_from_row).collect())
    }

    pub async fn get_scenario(&self, id: &str) -> Result<Option<BudgetScenario>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM budget_scenarios WHERE id = ?",
            SCENARIO_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(scenario_from_row))
    }

    /// Create a scenario; its capacity defaults to the event's capacity.
    pub async fn create_scenario(
        &self,
        event_id: &str,
        request: &CreateScenarioRequest,
    ) -> Result<BudgetScenario, AppError> {
        let event = self
            .get_event(event_id)
            .await?
            .ok_or_else(|| AppError::not_found("Event", event_id))?;

        let capacity = request.capacity.or(event.capacity).ok_or_else(|| {
            AppError::Validation(
                "Capacity is required when the event has no capacity".to_string(),
            )
        })?;

        let timestamp = now();
        let scenario = BudgetScenario {
            id: new_id(),
            event_id: event.id,
            name: request.name.trim().to_string(),
            ticket_prices: request.ticket_prices.clone(),
            staff_prices: request.staff_prices.clone(),
            occupancy_levels: request.occupancy_levels.clone(),
            capacity,
            staff_count: request.staff_count,
            line_items: request.line_items.clone(),
            notes: request.notes.clone(),
            created_at: timestamp.clone(),
            updated_at: timestamp,
            version: 1,
        };
        scenario.validate().map_err(AppError::Validation)?;

        self.insert_scenario(&scenario).await?;
        Ok(scenario)
    }

    pub async fn update_scenario(
        &self,
        id: &str,
        request: &UpdateScenarioRequest,
    ) -> Result<BudgetScenario, AppError> {
        let existing = self
            .get_scenario(id)
            .await?
            .ok_or_else(|| AppError::not_found("Scenario", id))?;
        check_version(request.expected_version, existing.version)?;

        let merged = BudgetScenario {
            name: request.name.clone().unwrap_or_else(|| existing.name.clone()),
            ticket_prices: request
                .ticket_prices
                .clone()
                .unwrap_or_else(|| existing.ticket_prices.clone()),
            staff_prices: request
                .staff_prices
                .clone()
                .unwrap_or_else(|| existing.staff_prices.clone()),
            occupancy_levels: request
                .occupancy_levels
                .clone()
                .unwrap_or_else(|| existing.occupancy_levels.clone()),
            capacity: request.capacity.unwrap_or(existing.capacity),
            staff_count: request.staff_count.unwrap_or(existing.staff_count),
            line_items: request
                .line_items
                .clone()
                .unwrap_or_else(|| existing.line_items.clone()),
            notes: request.notes.clone().or_else(|| existing.notes.clone()),
            updated_at: now(),
            version: existing.version + 1,
            ..existing.clone()
        };
        merged.validate().map_err(AppError::Validation)?;

        let result = sqlx::query(
            "UPDATE budget_scenarios SET name = ?, ticket_prices = ?, staff_prices = ?, occupancy_levels = ?, capacity = ?, staff_count = ?, line_items = ?, notes = ?, updated_at = ?, version = ? WHERE id = ? AND version = ?",
        )
        .bind(&merged.name)
        .bind(to_json(&merged.ticket_prices)?)
        .bind(to_json(&merged.staff_prices)?)
        .bind(to_json(&merged.occupancy_levels)?)
        .bind(merged.capacity)
        .bind(merged.staff_count)
        .bind(to_json(&merged.line_items)?)
        .bind(&merged.notes)
        .bind(&merged.updated_at)
        .bind(merged.version)
        .bind(id)
        .bind(existing.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current = self.get_scenario(id).await?;
            return Err(concurrent_modification(current.map(|s| s.version)));
        }

        self.increment_revision().await?;
        Ok(merged)
    }

    pub async fn delete_scenario(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM budget_scenarios WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Scenario", id));
        }

        self.increment_revision().await?;
        Ok(())
    }

    /// Copy a scenario under the name "`<name>` (copy)".
    pub async fn duplicate_scenario(&self, id: &str) -> Result<BudgetScenario, AppError> {
        let source = self
            .get_scenario(id)
            .await?
            .ok_or_else(|| AppError::not_found("Scenario", id))?;

        let timestamp = now();
        let copy = BudgetScenario {
            id: new_id(),
            name: format!("{} (copy)", source.name),
            created_at: timestamp.clone(),
            updated_at: timestamp,
            version: 1,
            ..source
        };

        self.insert_scenario(&copy).await?;
        Ok(copy)
    }

    async fn insert_scenario(&self, scenario: &BudgetScenario) -> Result<(), AppError> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query(
            "INSERT INTO budget_scenarios (id, event_id, name, ticket_prices, staff_prices, occupancy_levels, capacity, staff_count, line_items, notes, created_at, updated_at, version) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&scenario.id)
        .bind(&scenario.event_id)
        .bind(&scenario.name)
        .bind(to_json(&scenario.ticket_prices)?)
        .bind(to_json(&scenario.staff_prices)?)
        .bind(to_json(&scenario.occupancy_levels)?)
        .bind(scenario.capacity)
        .bind(scenario.staff_count)
        .bind(to_json(&scenario.line_items)?)
        .bind(&scenario.notes)
        .bind(&scenario.created_at)
        .bind(&scenario.updated_at)
        .bind(scenario.version)
        .execute(&mut *conn)
        .await?;
        bump_revision(&mut conn).await
    }
}

fn event_from_row(row: &sqlx::sqlite::SqliteRow) -> Event {
    let status: String = row.get("status");
    Event {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        venue: row.get("venue"),
        starts_at: row.get("starts_at"),
        ends_at: row.get("ends_at"),
        capacity: row.get("capacity"),
        status: EventStatus::parse(&status).unwrap_or_default(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        version: row.get("version"),
    }
}

fn scenario_from_row(row: &sqlx::sqlite::SqliteRow) -> BudgetScenario {
    BudgetScenario {
        id: row.get("id"),
        event_id: row.get("event_id"),
        name: row.get("name"),
        ticket_prices: parse_json(row.get("ticket_prices")),
        staff_prices: parse_json(row.get("staff_prices")),
        occupancy_levels: parse_json(row.get("occupancy_levels")),
        capacity: row.get("capacity"),
        staff_count: row.get("staff_count"),
        line_items: parse_json(row.get("line_items")),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        version: row.get("version"),
    }
}
