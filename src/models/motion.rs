//! Motion model for parliamentary procedure.

use serde::{Deserialize, Serialize};

/// Kind of motion, following Robert's Rules of Order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum MotionKind {
    #[default]
    Main,
    Amendment,
    Refer,
    Postpone,
    Table,
    PreviousQuestion,
    Reconsider,
}

impl MotionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MotionKind::Main => "main",
            MotionKind::Amendment => "amendment",
            MotionKind::Refer => "refer",
            MotionKind::Postpone => "postpone",
            MotionKind::Table => "table",
            MotionKind::PreviousQuestion => "previousQuestion",
            MotionKind::Reconsider => "reconsider",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "main" => Some(MotionKind::Main),
            "amendment" => Some(MotionKind::Amendment),
            "refer" => Some(MotionKind::Refer),
            "postpone" => Some(MotionKind::Postpone),
            "table" => Some(MotionKind::Table),
            "previousQuestion" => Some(MotionKind::PreviousQuestion),
            "reconsider" => Some(MotionKind::Reconsider),
            _ => None,
        }
    }

    /// Vote required when none is given explicitly.
    pub fn default_threshold(&self) -> VoteThreshold {
        match self {
            MotionKind::PreviousQuestion => VoteThreshold::TwoThirds,
            _ => VoteThreshold::Majority,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum VoteThreshold {
    Majority,
    TwoThirds,
    Unanimous,
}

impl VoteThreshold {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteThreshold::Majority => "majority",
            VoteThreshold::TwoThirds => "twoThirds",
            VoteThreshold::Unanimous => "unanimous",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "majority" => Some(VoteThreshold::Majority),
            "twoThirds" => Some(VoteThreshold::TwoThirds),
            "unanimous" => Some(VoteThreshold::Unanimous),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum MotionStatus {
    #[default]
    Moved,
    Seconded,
    Adopted,
    Failed,
    Withdrawn,
    Tabled,
}

impl MotionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MotionStatus::Moved => "moved",
            MotionStatus::Seconded => "seconded",
            MotionStatus::Adopted => "adopted",
            MotionStatus::Failed => "failed",
            MotionStatus::Withdrawn => "withdrawn",
            MotionStatus::Tabled => "tabled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "moved" => Some(MotionStatus::Moved),
            "seconded" => Some(MotionStatus::Seconded),
            "adopted" => Some(MotionStatus::Adopted),
            "failed" => Some(MotionStatus::Failed),
            "withdrawn" => Some(MotionStatus::Withdrawn),
            "tabled" => Some(MotionStatus::Tabled),
            _ => None,
        }
    }

    /// Still before the assembly: moved or seconded.
    pub fn is_pending(&self) -> bool {
        matches!(self, MotionStatus::Moved | MotionStatus::Seconded)
    }

    pub fn is_decided(&self) -> bool {
        matches!(self, MotionStatus::Adopted | MotionStatus::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Motion {
    pub id: String,
    pub meeting_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agenda_item_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_motion_id: Option<String>,
    pub kind: MotionKind,
    pub text: String,
    pub moved_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconded_by: Option<String>,
    pub status: MotionStatus,
    pub threshold: VoteThreshold,
    pub votes_for: i64,
    pub votes_against: i64,
    pub votes_abstain: i64,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<String>,
    #[serde(default)]
    pub version: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMotionRequest {
    #[serde(default)]
    pub kind: MotionKind,
    pub text: String,
    pub moved_by: String,
    #[serde(default)]
    pub agenda_item_id: Option<String>,
    #[serde(default)]
    pub parent_motion_id: Option<String>,
    #[serde(default)]
    pub threshold: Option<VoteThreshold>,
}

/// Chair actions on a motion.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "action")]
pub enum MotionAction {
    #[serde(rename_all = "camelCase")]
    Second { contact_id: String },
    Withdraw,
    Table,
    TakeFromTable,
    Vote {
        #[serde(rename = "for")]
        votes_for: i64,
        #[serde(rename = "against")]
        votes_against: i64,
        #[serde(default, rename = "abstain")]
        votes_abstain: i64,
    },
}
