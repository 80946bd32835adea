//! Revision info and dashboard overview.

use serde::{Deserialize, Serialize};

/// Revision information for change detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionInfo {
    pub revision_id: i64,
    pub generated_at: String,
}

/// Counts shown on the admin dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub schema_version: i32,
    pub contacts: i64,
    pub events: i64,
    pub upcoming_events: i64,
    pub committees: i64,
    pub meetings: i64,
    pub open_motions: i64,
    pub mailing_lists: i64,
    pub pages: i64,
    pub published_posts: i64,
    pub unhandled_submissions: i64,
}
