//! Committee, meeting and agenda models.

use serde::{Deserialize, Serialize};

/// A standing or ad-hoc committee of the club.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Committee {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chair_contact_id: Option<String>,
    #[serde(default)]
    pub member_contact_ids: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub version: i64,
}

impl Committee {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Committee name is required".to_string());
        }
        if let Some(chair) = &self.chair_contact_id {
            if !self.member_contact_ids.is_empty() && !self.member_contact_ids.contains(chair) {
                return Err("The chair must be a member of the committee".to_string());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommitteeRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub chair_contact_id: Option<String>,
    #[serde(default)]
    pub member_contact_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommitteeRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub chair_contact_id: Option<String>,
    #[serde(default)]
    pub member_contact_ids: Option<Vec<String>>,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// Lifecycle of a meeting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum MeetingStatus {
    #[default]
    Scheduled,
    InProgress,
    Adjourned,
    Cancelled,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingStatus::Scheduled => "scheduled",
            MeetingStatus::InProgress => "inProgress",
            MeetingStatus::Adjourned => "adjourned",
            MeetingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(MeetingStatus::Scheduled),
            "inProgress" => Some(MeetingStatus::InProgress),
            "adjourned" => Some(MeetingStatus::Adjourned),
            "cancelled" => Some(MeetingStatus::Cancelled),
            _ => None,
        }
    }
}

/// Chair-driven transitions of a meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingTransition {
    Start,
    Adjourn,
    Cancel,
}

impl MeetingTransition {
    /// Status after applying the transition, or an explanation why it is not allowed.
    pub fn apply(self, from: MeetingStatus) -> Result<MeetingStatus, String> {
        match (self, from) {
            (MeetingTransition::Start, MeetingStatus::Scheduled) => Ok(MeetingStatus::InProgress),
            (MeetingTransition::Adjourn, MeetingStatus::InProgress) => Ok(MeetingStatus::Adjourned),
            (MeetingTransition::Cancel, MeetingStatus::Scheduled) => Ok(MeetingStatus::Cancelled),
            (transition, status) => Err(format!(
                "Cannot {} a meeting that is {}",
                transition.verb(),
                status.as_str()
            )),
        }
    }

    fn verb(self) -> &'static str {
        match self {
            MeetingTransition::Start => "start",
            MeetingTransition::Adjourn => "adjourn",
            MeetingTransition::Cancel => "cancel",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub committee_id: Option<String>,
    pub title: String,
    pub scheduled_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub status: MeetingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quorum: Option<i64>,
    #[serde(default)]
    pub attendee_contact_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub called_to_order_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjourned_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub version: i64,
}

impl Meeting {
    /// Quorum is met when no quorum is set or enough attendees are recorded.
    pub fn has_quorum(&self) -> bool {
        self.quorum
            .is_none_or(|q| self.attendee_contact_ids.len() as i64 >= q)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeetingRequest {
    #[serde(default)]
    pub committee_id: Option<String>,
    pub title: String,
    pub scheduled_at: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub quorum: Option<i64>,
    #[serde(default)]
    pub attendee_contact_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeetingRequest {
    #[serde(default)]
    pub committee_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub scheduled_at: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub quorum: Option<i64>,
    #[serde(default)]
    pub attendee_contact_ids: Option<Vec<String>>,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMinutesRequest {
    pub minutes: String,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

/// Query parameters for listing meetings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingFilter {
    #[serde(default)]
    pub committee_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum AgendaItemStatus {
    #[default]
    Pending,
    Discussed,
    Deferred,
}

impl AgendaItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgendaItemStatus::Pending => "pending",
            AgendaItemStatus::Discussed => "discussed",
            AgendaItemStatus::Deferred => "deferred",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(AgendaItemStatus::Pending),
            "discussed" => Some(AgendaItemStatus::Discussed),
            "deferred" => Some(AgendaItemStatus::Deferred),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgendaItem {
    pub id: String,
    pub meeting_id: String,
    pub position: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presenter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
    pub status: AgendaItemStatus,
    #[serde(default)]
    pub version: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgendaItemRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub presenter: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAgendaItemRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub presenter: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<i64>,
    #[serde(default)]
    pub status: Option<AgendaItemStatus>,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderAgendaRequest {
    pub item_ids: Vec<String>,
}
