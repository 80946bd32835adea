//! Database module for SQLite persistence.
//!
//! SQLite is the source of truth for all application data.

mod contacts;
mod events;
mod mailing;
mod meetings;
mod repository;
mod website;

pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;

/// Current schema version, reported by the overview endpoint.
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    if let Some(parent) = db_path.parent() {
        if let Err(e) = tokio::fs::create_dir_all(parent).await {
            tracing::warn!("Could not create database directory {:?}: {}", parent, e);
        }
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

/// Idempotent schema statements, applied in order at startup.
const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS meta (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        schema_version INTEGER NOT NULL DEFAULT 1,
        revision_id INTEGER NOT NULL DEFAULT 0,
        generated_at TEXT NOT NULL DEFAULT (datetime('now'))
    )
    "#,
    r#"
    INSERT OR IGNORE INTO meta (id, schema_version, revision_id, generated_at)
    VALUES (1, 1, 0, datetime('now'))
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS contacts (
        id TEXT PRIMARY KEY,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT,
        phone TEXT,
        organization TEXT,
        street TEXT,
        postal_code TEXT,
        city TEXT,
        country TEXT,
        notes TEXT,
        tags TEXT,
        source TEXT NOT NULL DEFAULT 'manual',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        version INTEGER NOT NULL DEFAULT 1
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS events (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT,
        venue TEXT,
        starts_at TEXT NOT NULL,
        ends_at TEXT,
        capacity INTEGER,
        status TEXT NOT NULL DEFAULT 'planned',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        version INTEGER NOT NULL DEFAULT 1
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS budget_scenarios (
        id TEXT PRIMARY KEY,
        event_id TEXT NOT NULL REFERENCES events(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        ticket_prices TEXT NOT NULL,
        staff_prices TEXT NOT NULL,
        occupancy_levels TEXT NOT NULL,
        capacity INTEGER NOT NULL,
        staff_count INTEGER NOT NULL,
        line_items TEXT NOT NULL,
        notes TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        version INTEGER NOT NULL DEFAULT 1
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS committees (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL COLLATE NOCASE UNIQUE,
        description TEXT,
        chair_contact_id TEXT,
        member_contact_ids TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        version INTEGER NOT NULL DEFAULT 1
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS meetings (
        id TEXT PRIMARY KEY,
        committee_id TEXT REFERENCES committees(id) ON DELETE SET NULL,
        title TEXT NOT NULL,
        scheduled_at TEXT NOT NULL,
        location TEXT,
        status TEXT NOT NULL DEFAULT 'scheduled',
        quorum INTEGER,
        attendee_contact_ids TEXT NOT NULL,
        minutes TEXT,
        called_to_order_at TEXT,
        adjourned_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        version INTEGER NOT NULL DEFAULT 1
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS agenda_items (
        id TEXT PRIMARY KEY,
        meeting_id TEXT NOT NULL REFERENCES meetings(id) ON DELETE CASCADE,
        position INTEGER NOT NULL,
        title TEXT NOT NULL,
        description TEXT,
        presenter TEXT,
        duration_minutes INTEGER,
        status TEXT NOT NULL DEFAULT 'pending',
        version INTEGER NOT NULL DEFAULT 1
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS motions (
        id TEXT PRIMARY KEY,
        meeting_id TEXT NOT NULL REFERENCES meetings(id) ON DELETE CASCADE,
        agenda_item_id TEXT REFERENCES agenda_items(id) ON DELETE SET NULL,
        parent_motion_id TEXT REFERENCES motions(id) ON DELETE SET NULL,
        kind TEXT NOT NULL,
        text TEXT NOT NULL,
        moved_by TEXT NOT NULL,
        seconded_by TEXT,
        status TEXT NOT NULL,
        threshold TEXT NOT NULL,
        votes_for INTEGER NOT NULL DEFAULT 0,
        votes_against INTEGER NOT NULL DEFAULT 0,
        votes_abstain INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        decided_at TEXT,
        version INTEGER NOT NULL DEFAULT 1
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS mailing_lists (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL COLLATE NOCASE UNIQUE,
        description TEXT,
        channel TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        version INTEGER NOT NULL DEFAULT 1
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS list_subscriptions (
        list_id TEXT NOT NULL REFERENCES mailing_lists(id) ON DELETE CASCADE,
        contact_id TEXT NOT NULL REFERENCES contacts(id) ON DELETE CASCADE,
        subscribed_at TEXT NOT NULL,
        PRIMARY KEY (list_id, contact_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS mailing_batches (
        id TEXT PRIMARY KEY,
        list_id TEXT REFERENCES mailing_lists(id) ON DELETE SET NULL,
        list_name TEXT NOT NULL,
        channel TEXT NOT NULL,
        name TEXT NOT NULL,
        status TEXT NOT NULL,
        recipient_count INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        sent_at TEXT,
        closed_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS batch_recipients (
        id TEXT PRIMARY KEY,
        batch_id TEXT NOT NULL REFERENCES mailing_batches(id) ON DELETE CASCADE,
        contact_id TEXT REFERENCES contacts(id) ON DELETE SET NULL,
        position INTEGER NOT NULL,
        name TEXT NOT NULL,
        email TEXT,
        street TEXT,
        postal_code TEXT,
        city TEXT,
        country TEXT,
        status TEXT NOT NULL,
        note TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS site_pages (
        id TEXT PRIMARY KEY,
        slug TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        body TEXT NOT NULL,
        published INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        version INTEGER NOT NULL DEFAULT 1
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS blog_posts (
        id TEXT PRIMARY KEY,
        slug TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        excerpt TEXT,
        body TEXT NOT NULL,
        author TEXT,
        tags TEXT,
        published_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        version INTEGER NOT NULL DEFAULT 1
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS menus (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        items TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        version INTEGER NOT NULL DEFAULT 1
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS contact_submissions (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        subject TEXT,
        message TEXT NOT NULL,
        created_at TEXT NOT NULL,
        handled INTEGER NOT NULL DEFAULT 0
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_contacts_name ON contacts(last_name, first_name)",
    "CREATE INDEX IF NOT EXISTS idx_scenarios_event ON budget_scenarios(event_id)",
    "CREATE INDEX IF NOT EXISTS idx_meetings_committee ON meetings(committee_id)",
    "CREATE INDEX IF NOT EXISTS idx_agenda_meeting ON agenda_items(meeting_id, position)",
    "CREATE INDEX IF NOT EXISTS idx_motions_meeting ON motions(meeting_id)",
    "CREATE INDEX IF NOT EXISTS idx_motions_parent ON motions(parent_motion_id)",
    "CREATE INDEX IF NOT EXISTS idx_subscriptions_contact ON list_subscriptions(contact_id)",
    "CREATE INDEX IF NOT EXISTS idx_recipients_batch ON batch_recipients(batch_id, position)",
];

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in MIGRATIONS {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::debug!("Applied {} schema statements", MIGRATIONS.len());
    Ok(())
}
