//! Event and budget scenario models.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Planning status of an event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum EventStatus {
    #[default]
    Planned,
    Confirmed,
    Cancelled,
    Completed,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Planned => "planned",
            EventStatus::Confirmed => "confirmed",
            EventStatus::Cancelled => "cancelled",
            EventStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "planned" => Some(EventStatus::Planned),
            "confirmed" => Some(EventStatus::Confirmed),
            "cancelled" => Some(EventStatus::Cancelled),
            "completed" => Some(EventStatus::Completed),
            _ => None,
        }
    }
}

/// A club event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
    pub starts_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<i64>,
    pub status: EventStatus,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub version: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
    pub starts_at: String,
    #[serde(default)]
    pub ends_at: Option<String>,
    #[serde(default)]
    pub capacity: Option<i64>,
    #[serde(default)]
    pub status: EventStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub starts_at: Option<String>,
    #[serde(default)]
    pub ends_at: Option<String>,
    #[serde(default)]
    pub capacity: Option<i64>,
    #[serde(default)]
    pub status: Option<EventStatus>,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// Query parameters for listing events.
#[derive(Debug, Default, Deserialize)]
pub struct EventFilter {
    #[serde(default)]
    pub status: Option<EventStatus>,
}

/// Validate the schedule of an event: RFC 3339 timestamps, end not before start.
/// Largest capacity or staff count a scenario may plan for.
pub const MAX_HEADCOUNT: i64 = 1_000_000;
/// Values allowed in each of the price and occupancy lists.
pub const MAX_LIST_VALUES: usize = 100;
/// Upper bound on ticket x staff x occupancy combinations of one scenario.
pub const MAX_COMBINATIONS: usize = 10_000;
pub const MAX_LINE_ITEMS: usize = 200;

pub fn validate_schedule(
    starts_at: &str,
    ends_at: Option<&str>,
    capacity: Option<i64>,
) -> Result<(), String> {
    let start = parse_timestamp(starts_at, "startsAt")?;
    if let Some(end) = ends_at {
        let end = parse_timestamp(end, "endsAt")?;
        if end < start {
            return Err("endsAt must not be before startsAt".to_string());
        }
    }
    if capacity.is_some_and(|c| c < 0) {
        return Err("Capacity must not be negative".to_string());
    }
    if capacity.is_some_and(|c| c > MAX_HEADCOUNT) {
        return Err(format!("Capacity must not exceed {}", MAX_HEADCOUNT));
    }
    Ok(())
}

pub fn parse_timestamp(value: &str, field: &str) -> Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(value)
        .map_err(|_| format!("{} must be an RFC 3339 timestamp, got {:?}", field, value))
}

/// Whether a line item is a cost or an income.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum LineItemKind {
    Cost,
    Income,
}

/// How a line item scales with attendance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum LineItemBasis {
    #[default]
    Fixed,
    PerAttendee,
}

/// A single budget position of a scenario.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub kind: LineItemKind,
    #[serde(default)]
    pub basis: LineItemBasis,
    pub amount: f64,
}

/// A named set of budget inputs for projecting an event's profitability.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetScenario {
    pub id: String,
    pub event_id: String,
    pub name: String,
    pub ticket_prices: Vec<f64>,
    pub staff_prices: Vec<f64>,
    /// Occupancy levels in percent of capacity.
    pub occupancy_levels: Vec<f64>,
    pub capacity: i64,
    pub staff_count: i64,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub version: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScenarioRequest {
    pub name: String,
    pub ticket_prices: Vec<f64>,
    pub staff_prices: Vec<f64>,
    pub occupancy_levels: Vec<f64>,
    /// Defaults to the event's capacity.
    #[serde(default)]
    pub capacity: Option<i64>,
    #[serde(default)]
    pub staff_count: i64,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScenarioRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ticket_prices: Option<Vec<f64>>,
    #[serde(default)]
    pub staff_prices: Option<Vec<f64>>,
    #[serde(default)]
    pub occupancy_levels: Option<Vec<f64>>,
    #[serde(default)]
    pub capacity: Option<i64>,
    #[serde(default)]
    pub staff_count: Option<i64>,
    #[serde(default)]
    pub line_items: Option<Vec<LineItem>>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

impl BudgetScenario {
    /// Check the inputs the metrics computation relies on.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Scenario name is required".to_string());
        }
        check_amounts("ticketPrices", &self.ticket_prices)?;
        check_amounts("staffPrices", &self.staff_prices)?;
        check_amounts("occupancyLevels", &self.occupancy_levels)?;
        if self.occupancy_levels.iter().any(|o| *o > 100.0) {
            return Err("occupancyLevels must be between 0 and 100".to_string());
        }
        let combinations = self
            .ticket_prices
            .len()
            .saturating_mul(self.staff_prices.len())
            .saturating_mul(self.occupancy_levels.len());
        if combinations > MAX_COMBINATIONS {
            return Err(format!(
                "Scenario has {} price/occupancy combinations, at most {} are allowed",
                combinations, MAX_COMBINATIONS
            ));
        }
        if !(0..=MAX_HEADCOUNT).contains(&self.capacity) {
            return Err(format!("Capacity must be between 0 and {}", MAX_HEADCOUNT));
        }
        if !(0..=MAX_HEADCOUNT).contains(&self.staff_count) {
            return Err(format!("Staff count must be between 0 and {}", MAX_HEADCOUNT));
        }
        if self.line_items.len() > MAX_LINE_ITEMS {
            return Err(format!("At most {} line items are allowed", MAX_LINE_ITEMS));
        }
        for item in &self.line_items {
            if item.label.trim().is_empty() {
                return Err("Line item label is required".to_string());
            }
            if !item.amount.is_finite() || item.amount < 0.0 {
                return Err(format!(
                    "Line item {:?} must have a non-negative amount",
                    item.label
                ));
            }
        }
        Ok(())
    }
}

fn check_amounts(field: &str, values: &[f64]) -> Result<(), String> {
    if values.is_empty() {
        return Err(format!("{} must contain at least one value", field));
    }
    if values.len() > MAX_LIST_VALUES {
        return Err(format!("{} must not have more than {} values", field, MAX_LIST_VALUES));
    }
    if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return Err(format!("{} must only contain non-negative numbers", field));
    }
    Ok(())
}
