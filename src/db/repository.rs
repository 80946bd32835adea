//! Database repository for CRUD operations.
//!
//! The repository is split by area (`contacts`, `events`, `meetings`,
//! `mailing`, `website`); this file holds the shared core: revision
//! tracking, the dashboard overview and row/JSON helpers.

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::db::SCHEMA_VERSION;
use crate::errors::AppError;
use crate::models::{parse_timestamp, Overview, RevisionInfo};

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pub(super) pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the current revision ID.
    pub async fn get_revision_id(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("revision_id"))
    }

    /// Get revision info.
    pub async fn get_revision_info(&self) -> Result<RevisionInfo, AppError> {
        let row = sqlx::query("SELECT revision_id, generated_at FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(RevisionInfo {
            revision_id: row.get("revision_id"),
            generated_at: row.get("generated_at"),
        })
    }

    /// Increment the revision ID and return the new value.
    pub async fn increment_revision(&self) -> Result<i64, AppError> {
        let mut conn = self.pool.acquire().await?;
        bump_revision(&mut conn).await?;
        drop(conn);
        self.get_revision_id().await
    }

    /// Counts for the admin dashboard.
    pub async fn get_overview(&self) -> Result<Overview, AppError> {
        let counts = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM contacts) AS contacts,
                (SELECT COUNT(*) FROM events) AS events,
                (SELECT COUNT(*) FROM committees) AS committees,
                (SELECT COUNT(*) FROM meetings) AS meetings,
                (SELECT COUNT(*) FROM motions WHERE status IN ('moved', 'seconded')) AS open_motions,
                (SELECT COUNT(*) FROM mailing_lists) AS mailing_lists,
                (SELECT COUNT(*) FROM site_pages) AS pages,
                (SELECT COUNT(*) FROM blog_posts WHERE published_at IS NOT NULL) AS published_posts,
                (SELECT COUNT(*) FROM contact_submissions WHERE handled = 0) AS unhandled_submissions
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        // Timestamps may carry any offset, so compare parsed values instead of strings.
        let starts = sqlx::query("SELECT starts_at FROM events WHERE status != 'cancelled'")
            .fetch_all(&self.pool)
            .await?;
        let now = Utc::now();
        let upcoming_events = starts
            .iter()
            .filter_map(|row| parse_timestamp(row.get::<&str, _>("starts_at"), "startsAt").ok())
            .filter(|start| *start > now)
            .count() as i64;

        Ok(Overview {
            schema_version: SCHEMA_VERSION,
            contacts: counts.get("contacts"),
            events: counts.get("events"),
            upcoming_events,
            committees: counts.get("committees"),
            meetings: counts.get("meetings"),
            open_motions: counts.get("open_motions"),
            mailing_lists: counts.get("mailing_lists"),
            pages: counts.get("pages"),
            published_posts: counts.get("published_posts"),
            unhandled_submissions: counts.get("unhandled_submissions"),
        })
    }
}

/// Bump the global revision on an open connection or transaction.
pub(super) async fn bump_revision(conn: &mut SqliteConnection) -> Result<(), AppError> {
    let now = Utc::now().to_rfc3339();
    sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
        .bind(&now)
        .execute(conn)
        .await?;
    Ok(())
}

/// Reject an update whose `expectedVersion` no longer matches.
pub(super) fn check_version(expected: Option<i64>, current: i64) -> Result<(), AppError> {
    match expected {
        Some(expected) if expected != current => Err(AppError::Conflict {
            message: format!(
                "Version mismatch: expected {}, current {}",
                expected, current
            ),
            current_version: current,
        }),
        _ => Ok(()),
    }
}

/// Error for a conditional UPDATE that matched no row.
pub(super) fn concurrent_modification(current_version: Option<i64>) -> AppError {
    AppError::Conflict {
        message: "Concurrent modification detected".to_string(),
        current_version: current_version.unwrap_or(0),
    }
}

/// Map a UNIQUE constraint violation to `Duplicate`, anything else to a database error.
pub(super) fn unique_violation(err: sqlx::Error, message: impl FnOnce() -> String) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Duplicate(message()),
        _ => AppError::from(err),
    }
}

pub(super) fn now() -> String {
    Utc::now().to_rfc3339()
}

pub(super) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub(super) fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, AppError> {
    serde_json::to_string(value)
        .map_err(|e| AppError::Internal(format!("Could not encode column: {}", e)))
}

pub(super) fn parse_json_array(s: Option<&str>) -> Vec<String> {
    s.and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default()
}

/// Decode a JSON column, falling back to the default for malformed data.
pub(super) fn parse_json<T: DeserializeOwned + Default>(s: &str) -> T {
    match serde_json::from_str(s) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Ignoring malformed JSON column: {}", e);
            T::default()
        }
    }
}
