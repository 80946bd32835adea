//! Committees, meetings, agendas and motions.
//!
//! Agenda positions are kept dense (1..=n) per meeting. Motion actions load the
//! motion, its meeting and pending amendments inside one transaction and apply
//! the ruling from [`crate::procedure`].

use sqlx::{Row, SqliteConnection};

use super::repository::{
    bump_revision, check_version, concurrent_modification, new_id, now, parse_json_array,
    to_json, unique_violation, Repository,
};
use crate::errors::AppError;
use crate::models::{
    parse_timestamp, AgendaItem, AgendaItemStatus, Committee, CreateAgendaItemRequest,
    CreateCommitteeRequest, CreateMeetingRequest, CreateMotionRequest, Meeting, MeetingFilter,
    MeetingStatus, MeetingTransition, Motion, MotionAction, MotionKind, MotionStatus,
    ReorderAgendaRequest, UpdateAgendaItemRequest, UpdateCommitteeRequest, UpdateMeetingRequest,
    UpdateMinutesRequest, VoteThreshold,
};
use crate::procedure::{self, Floor};

const COMMITTEE_COLUMNS: &str =
    "id, name, description, chair_contact_id, member_contact_ids, created_at, updated_at, version";
const MEETING_COLUMNS: &str = "id, committee_id, title, scheduled_at, location, status, quorum, attendee_contact_ids, minutes, called_to_order_at, adjourned_at, created_at, updated_at, version";
const AGENDA_COLUMNS: &str =
    "id, meeting_id, position, title, description, presenter, duration_minutes, status, version";
const MOTION_COLUMNS: &str = "id, meeting_id, agenda_item_id, parent_motion_id, kind, text, moved_by, seconded_by, status, threshold, votes_for, votes_against, votes_abstain, created_at, decided_at, version";

impl Repository {
    // ==================== COMMITTEE OPERATIONS ====================

    pub async fn list_committees(&self) -> Result<Vec<Committee>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM committees ORDER BY name",
            COMMITTEE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(committee_from_row).collect())
    }

    pub async fn get_committee(&self, id: &str) -> Result<Option<Committee>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM committees WHERE id = ?",
            COMMITTEE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(committee_from_row))
    }

    pub async fn create_committee(
        &self,
        request: &CreateCommitteeRequest,
    ) -> Result<Committee, AppError> {
        let timestamp = now();
        let committee = Committee {
            id: new_id(),
            name: request.name.trim().to_string(),
            description: request.description.clone(),
            chair_contact_id: request.chair_contact_id.clone(),
            member_contact_ids: request.member_contact_ids.clone(),
            created_at: timestamp.clone(),
            updated_at: timestamp,
            version: 1,
        };
        committee.validate().map_err(AppError::Validation)?;

        sqlx::query(
            "INSERT INTO committees (id, name, description, chair_contact_id, member_contact_ids, created_at, updated_at, version) VALUES (?, ?, ?, ?, ?, ?, ?, 1)",
        )
        .bind(&committee.id)
        .bind(&committee.name)
        .bind(&committee.description)
        .bind(&committee.chair_contact_id)
        .bind(to_json(&committee.member_contact_ids)?)
        .bind(&committee.created_at)
        .bind(&committee.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_committee(e, &committee.name))?;

        self.increment_revision().await?;
        Ok(committee)
    }

    pub async fn update_committee(
        &self,
        id: &str,
        request: &UpdateCommitteeRequest,
    ) -> Result<Committee, AppError> {
        let existing = self
            .get_committee(id)
            .await?
            .ok_or_else(|| AppError::not_found("Committee", id))?;
        check_version(request.expected_version, existing.version)?;

        let merged = Committee {
            name: request
                .name
                .as_deref()
                .map(|n| n.trim().to_string())
                .unwrap_or_else(|| existing.name.clone()),
            description: request
                .description
                .clone()
                .or_else(|| existing.description.clone()),
            chair_contact_id: request
                .chair_contact_id
                .clone()
                .or_else(|| existing.chair_contact_id.clone()),
            member_contact_ids: request
                .member_contact_ids
                .clone()
                .unwrap_or_else(|| existing.member_contact_ids.clone()),
            updated_at: now(),
            version: existing.version + 1,
            ..existing.clone()
        };
        merged.validate().map_err(AppError::Validation)?;

        let result = sqlx::query(
            "UPDATE committees SET name = ?, description = ?, chair_contact_id = ?, member_contact_ids = ?, updated_at = ?, version = ? WHERE id = ? AND version = ?",
        )
        .bind(&merged.name)
        .bind(&merged.description)
        .bind(&merged.chair_contact_id)
        .bind(to_json(&merged.member_contact_ids)?)
        .bind(&merged.updated_at)
        .bind(merged.version)
        .bind(id)
        .bind(existing.version)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_committee(e, &merged.name))?;

        if result.rows_affected() == 0 {
            let current = self.get_committee(id).await?;
            return Err(concurrent_modification(current.map(|c| c.version)));
        }

        self.increment_revision().await?;
        Ok(merged)
    }

    /// Delete a committee; its meetings stay, detached.
    pub async fn delete_committee(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM committees WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Committee", id));
        }

        self.increment_revision().await?;
        Ok(())
    }

    // ==================== MEETING OPERATIONS ====================

    pub async fn list_meetings(&self, filter: &MeetingFilter) -> Result<Vec<Meeting>, AppError> {
        let rows = match &filter.committee_id {
            Some(committee_id) => {
                sqlx::query(&format!(
                    "SELECT {} FROM meetings WHERE committee_id = ? ORDER BY scheduled_at, title",
                    MEETING_COLUMNS
                ))
                .bind(committee_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {} FROM meetings ORDER BY scheduled_at, title",
                    MEETING_COLUMNS
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.iter().map(meeting_from_row).collect())
    }

    pub async fn get_meeting(&self, id: &str) -> Result<Option<Meeting>, AppError> {
        let mut conn = self.pool.acquire().await?;
        fetch_meeting(&mut conn, id).await
    }

    pub async fn create_meeting(&self, request: &CreateMeetingRequest) -> Result<Meeting, AppError> {
        if request.title.trim().is_empty() {
            return Err(AppError::Validation("Meeting title is required".to_string()));
        }
        parse_timestamp(&request.scheduled_at, "scheduledAt").map_err(AppError::Validation)?;
        check_quorum(request.quorum)?;
        if let Some(committee_id) = &request.committee_id {
            self.require_committee(committee_id).await?;
        }

        let timestamp = now();
        let meeting = Meeting {
            id: new_id(),
            committee_id: request.committee_id.clone(),
            title: request.title.trim().to_string(),
            scheduled_at: request.scheduled_at.clone(),
            location: request.location.clone(),
            status: MeetingStatus::Scheduled,
            quorum: request.quorum,
            attendee_contact_ids: request.attendee_contact_ids.clone(),
            minutes: None,
            called_to_order_at: None,
            adjourned_at: None,
            created_at: timestamp.clone(),
            updated_at: timestamp,
            version: 1,
        };

        sqlx::query(
            "INSERT INTO meetings (id, committee_id, title, scheduled_at, location, status, quorum, attendee_contact_ids, created_at, updated_at, version) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1)",
        )
        .bind(&meeting.id)
        .bind(&meeting.committee_id)
        .bind(&meeting.title)
        .bind(&meeting.scheduled_at)
        .bind(&meeting.location)
        .bind(meeting.status.as_str())
        .bind(meeting.quorum)
        .bind(to_json(&meeting.attendee_contact_ids)?)
        .bind(&meeting.created_at)
        .bind(&meeting.updated_at)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;
        Ok(meeting)
    }

    pub async fn update_meeting(
        &self,
        id: &str,
        request: &UpdateMeetingRequest,
    ) -> Result<Meeting, AppError> {
        let existing = self
            .get_meeting(id)
            .await?
            .ok_or_else(|| AppError::not_found("Meeting", id))?;
        check_version(request.expected_version, existing.version)?;

        if let Some(scheduled_at) = &request.scheduled_at {
            parse_timestamp(scheduled_at, "scheduledAt").map_err(AppError::Validation)?;
        }
        check_quorum(request.quorum)?;
        if let Some(committee_id) = &request.committee_id {
            self.require_committee(committee_id).await?;
        }

        let merged = Meeting {
            committee_id: request
                .committee_id
                .clone()
                .or_else(|| existing.committee_id.clone()),
            title: request.title.clone().unwrap_or_else(|| existing.title.clone()),
            scheduled_at: request
                .scheduled_at
                .clone()
                .unwrap_or_else(|| existing.scheduled_at.clone()),
            location: request.location.clone().or_else(|| existing.location.clone()),
            quorum: request.quorum.or(existing.quorum),
            attendee_contact_ids: request
                .attendee_contact_ids
                .clone()
                .unwrap_or_else(|| existing.attendee_contact_ids.clone()),
            updated_at: now(),
            version: existing.version + 1,
            ..existing.clone()
        };
        if merged.title.trim().is_empty() {
            return Err(AppError::Validation("Meeting title is required".to_string()));
        }

        let result = sqlx::query(
            "UPDATE meetings SET committee_id = ?, title = ?, scheduled_at = ?, location = ?, quorum = ?, attendee_contact_ids = ?, updated_at = ?, version = ? WHERE id = ? AND version = ?",
        )
        .bind(&merged.committee_id)
        .bind(&merged.title)
        .bind(&merged.scheduled_at)
        .bind(&merged.location)
        .bind(merged.quorum)
        .bind(to_json(&merged.attendee_contact_ids)?)
        .bind(&merged.updated_at)
        .bind(merged.version)
        .bind(id)
        .bind(existing.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current = self.get_meeting(id).await?;
            return Err(concurrent_modification(current.map(|m| m.version)));
        }

        self.increment_revision().await?;
        Ok(merged)
    }

    /// Delete a meeting with its agenda and motions.
    pub async fn delete_meeting(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM meetings WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Meeting", id));
        }

        self.increment_revision().await?;
        Ok(())
    }

    /// Start, adjourn or cancel a meeting.
    pub async fn transition_meeting(
        &self,
        id: &str,
        transition: MeetingTransition,
    ) -> Result<Meeting, AppError> {
        let mut tx = self.pool.begin().await?;
        let existing = fetch_meeting(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("Meeting", id))?;
        let status = transition
            .apply(existing.status)
            .map_err(AppError::InvalidState)?;

        if transition == MeetingTransition::Adjourn {
            let open: i64 = sqlx::query(
                "SELECT COUNT(*) AS n FROM motions WHERE meeting_id = ? AND status IN ('moved', 'seconded')",
            )
            .bind(id)
            .fetch_one(&mut *tx)
            .await?
            .get("n");
            if open > 0 {
                return Err(AppError::InvalidState(format!(
                    "{} motion(s) are still pending; decide, table or withdraw them first",
                    open
                )));
            }
        }

        let timestamp = now();
        let meeting = Meeting {
            status,
            called_to_order_at: match transition {
                MeetingTransition::Start => Some(timestamp.clone()),
                _ => existing.called_to_order_at.clone(),
            },
            adjourned_at: match transition {
                MeetingTransition::Adjourn => Some(timestamp.clone()),
                _ => existing.adjourned_at.clone(),
            },
            updated_at: timestamp,
            version: existing.version + 1,
            ..existing.clone()
        };

        let result = sqlx::query(
            "UPDATE meetings SET status = ?, called_to_order_at = ?, adjourned_at = ?, updated_at = ?, version = ? WHERE id = ? AND version = ?",
        )
        .bind(meeting.status.as_str())
        .bind(&meeting.called_to_order_at)
        .bind(&meeting.adjourned_at)
        .bind(&meeting.updated_at)
        .bind(meeting.version)
        .bind(id)
        .bind(existing.version)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(concurrent_modification(Some(existing.version)));
        }

        bump_revision(&mut tx).await?;
        tx.commit().await?;
        tracing::info!(meeting = %id, status = status.as_str(), "Meeting transitioned");
        Ok(meeting)
    }

    pub async fn update_minutes(
        &self,
        id: &str,
        request: &UpdateMinutesRequest,
    ) -> Result<Meeting, AppError> {
        let existing = self
            .get_meeting(id)
            .await?
            .ok_or_else(|| AppError::not_found("Meeting", id))?;
        check_version(request.expected_version, existing.version)?;
        if existing.status == MeetingStatus::Cancelled {
            return Err(AppError::InvalidState(
                "A cancelled meeting has no minutes".to_string(),
            ));
        }

        let meeting = Meeting {
            minutes: Some(request.minutes.clone()),
            updated_at: now(),
            version: existing.version + 1,
            ..existing.clone()
        };

        let result = sqlx::query(
            "UPDATE meetings SET minutes = ?, updated_at = ?, version = ? WHERE id = ? AND version = ?",
        )
        .bind(&meeting.minutes)
        .bind(&meeting.updated_at)
        .bind(meeting.version)
        .bind(id)
        .bind(existing.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current = self.get_meeting(id).await?;
            return Err(concurrent_modification(current.map(|m| m.version)));
        }

        self.increment_revision().await?;
        Ok(meeting)
    }

    async fn require_committee(&self, committee_id: &str) -> Result<(), AppError> {
        match self.get_committee(committee_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::Validation(format!(
                "Committee {} does not exist",
                committee_id
            ))),
        }
    }

    // ==================== AGENDA OPERATIONS ====================

    pub async fn list_agenda(&self, meeting_id: &str) -> Result<Vec<AgendaItem>, AppError> {
        let mut conn = self.pool.acquire().await?;
        if fetch_meeting(&mut conn, meeting_id).await?.is_none() {
            return Err(AppError::not_found("Meeting", meeting_id));
        }
        fetch_agenda(&mut conn, meeting_id).await
    }

    pub async fn get_agenda_item(&self, id: &str) -> Result<Option<AgendaItem>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM agenda_items WHERE id = ?",
            AGENDA_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(agenda_item_from_row))
    }

    /// Append an item to the end of a meeting's agenda.
    pub async fn create_agenda_item(
        &self,
        meeting_id: &str,
        request: &CreateAgendaItemRequest,
    ) -> Result<AgendaItem, AppError> {
        if request.title.trim().is_empty() {
            return Err(AppError::Validation("Agenda item title is required".to_string()));
        }
        check_duration(request.duration_minutes)?;

        let mut tx = self.pool.begin().await?;
        if fetch_meeting(&mut tx, meeting_id).await?.is_none() {
            return Err(AppError::not_found("Meeting", meeting_id));
        }
        let position: i64 = sqlx::query(
            "SELECT COALESCE(MAX(position), 0) + 1 AS next FROM agenda_items WHERE meeting_id = ?",
        )
        .bind(meeting_id)
        .fetch_one(&mut *tx)
        .await?
        .get("next");

        let item = AgendaItem {
            id: new_id(),
            meeting_id: meeting_id.to_string(),
            position,
            title: request.title.trim().to_string(),
            description: request.description.clone(),
            presenter: request.presenter.clone(),
            duration_minutes: request.duration_minutes,
            status: AgendaItemStatus::Pending,
            version: 1,
        };

        sqlx::query(
            "INSERT INTO agenda_items (id, meeting_id, position, title, description, presenter, duration_minutes, status, version) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1)",
        )
        .bind(&item.id)
        .bind(&item.meeting_id)
        .bind(item.position)
        .bind(&item.title)
        .bind(&item.description)
        .bind(&item.presenter)
        .bind(item.duration_minutes)
        .bind(item.status.as_str())
        .execute(&mut *tx)
        .await?;

        bump_revision(&mut tx).await?;
        tx.commit().await?;
        Ok(item)
    }

    pub async fn update_agenda_item(
        &self,
        id: &str,
        request: &UpdateAgendaItemRequest,
    ) -> Result<AgendaItem, AppError> {
        let existing = self
            .get_agenda_item(id)
            .await?
            .ok_or_else(|| AppError::not_found("Agenda item", id))?;
        check_version(request.expected_version, existing.version)?;
        check_duration(request.duration_minutes)?;

        let merged = AgendaItem {
            title: request.title.clone().unwrap_or_else(|| existing.title.clone()),
            description: request
                .description
                .clone()
                .or_else(|| existing.description.clone()),
            presenter: request
                .presenter
                .clone()
                .or_else(|| existing.presenter.clone()),
            duration_minutes: request.duration_minutes.or(existing.duration_minutes),
            status: request.status.unwrap_or(existing.status),
            version: existing.version + 1,
            ..existing.clone()
        };
        if merged.title.trim().is_empty() {
            return Err(AppError::Validation("Agenda item title is required".to_string()));
        }

        let result = sqlx::query(
            "UPDATE agenda_items SET title = ?, description = ?, presenter = ?, duration_minutes = ?, status = ?, version = ? WHERE id = ? AND version = ?",
        )
        .bind(&merged.title)
        .bind(&merged.description)
        .bind(&merged.presenter)
        .bind(merged.duration_minutes)
        .bind(merged.status.as_str())
        .bind(merged.version)
        .bind(id)
        .bind(existing.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current = self.get_agenda_item(id).await?;
            return Err(concurrent_modification(current.map(|i| i.version)));
        }

        self.increment_revision().await?;
        Ok(merged)
    }

    /// Delete an agenda item and close the gap it leaves.
    pub async fn delete_agenda_item(&self, id: &str) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query("SELECT meeting_id, position FROM agenda_items WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found("Agenda item", id))?;
        let meeting_id: String = row.get("meeting_id");
        let position: i64 = row.get("position");

        sqlx::query("DELETE FROM agenda_items WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "UPDATE agenda_items SET position = position - 1, version = version + 1 WHERE meeting_id = ? AND position > ?",
        )
        .bind(&meeting_id)
        .bind(position)
        .execute(&mut *tx)
        .await?;

        bump_revision(&mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Reorder a meeting's agenda; `item_ids` must name every item exactly once.
    pub async fn reorder_agenda(
        &self,
        meeting_id: &str,
        request: &ReorderAgendaRequest,
    ) -> Result<Vec<AgendaItem>, AppError> {
        let mut tx = self.pool.begin().await?;
        if fetch_meeting(&mut tx, meeting_id).await?.is_none() {
            return Err(AppError::not_found("Meeting", meeting_id));
        }
        let current = fetch_agenda(&mut tx, meeting_id).await?;

        let mut wanted: Vec<&str> = request.item_ids.iter().map(String::as_str).collect();
        let mut have: Vec<&str> = current.iter().map(|i| i.id.as_str()).collect();
        wanted.sort_unstable();
        have.sort_unstable();
        if wanted != have {
            return Err(AppError::Validation(
                "itemIds must list every agenda item of the meeting exactly once".to_string(),
            ));
        }

        for (index, item_id) in request.item_ids.iter().enumerate() {
            sqlx::query(
                "UPDATE agenda_items SET position = ?, version = version + 1 WHERE id = ? AND position != ?",
            )
            .bind(index as i64 + 1)
            .bind(item_id)
            .bind(index as i64 + 1)
            .execute(&mut *tx)
            .await?;
        }

        let reordered = fetch_agenda(&mut tx, meeting_id).await?;
        bump_revision(&mut tx).await?;
        tx.commit().await?;
        Ok(reordered)
    }

    // ==================== MOTION OPERATIONS ====================

    /// Motions of a meeting in the order they were made.
    pub async fn list_motions(&self, meeting_id: &str) -> Result<Vec<Motion>, AppError> {
        let mut conn = self.pool.acquire().await?;
        if fetch_meeting(&mut conn, meeting_id).await?.is_none() {
            return Err(AppError::not_found("Meeting", meeting_id));
        }
        let rows = sqlx::query(&format!(
            "SELECT {} FROM motions WHERE meeting_id = ? ORDER BY created_at, rowid",
            MOTION_COLUMNS
        ))
        .bind(meeting_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows.iter().map(motion_from_row).collect())
    }

    pub async fn get_motion(&self, id: &str) -> Result<Option<Motion>, AppError> {
        let mut conn = self.pool.acquire().await?;
        fetch_motion(&mut conn, id).await
    }

    /// Put a new motion before a meeting.
    pub async fn create_motion(
        &self,
        meeting_id: &str,
        request: &CreateMotionRequest,
    ) -> Result<Motion, AppError> {
        let mut tx = self.pool.begin().await?;
        let meeting = fetch_meeting(&mut tx, meeting_id)
            .await?
            .ok_or_else(|| AppError::not_found("Meeting", meeting_id))?;
        let parent = match &request.parent_motion_id {
            Some(parent_id) => Some(fetch_motion(&mut tx, parent_id).await?.ok_or_else(|| {
                AppError::Validation(format!("Parent motion {} does not exist", parent_id))
            })?),
            None => None,
        };
        procedure::check_new_motion(&meeting, parent.as_ref(), request)?;

        if let Some(item_id) = &request.agenda_item_id {
            let on_agenda = sqlx::query("SELECT 1 FROM agenda_items WHERE id = ? AND meeting_id = ?")
                .bind(item_id)
                .bind(meeting_id)
                .fetch_optional(&mut *tx)
                .await?
                .is_some();
            if !on_agenda {
                return Err(AppError::Validation(format!(
                    "Agenda item {} is not on this meeting's agenda",
                    item_id
                )));
            }
        }

        let motion = Motion {
            id: new_id(),
            meeting_id: meeting.id.clone(),
            agenda_item_id: request.agenda_item_id.clone(),
            parent_motion_id: request.parent_motion_id.clone(),
            kind: request.kind,
            text: request.text.trim().to_string(),
            moved_by: request.moved_by.clone(),
            seconded_by: None,
            status: MotionStatus::Moved,
            threshold: request
                .threshold
                .unwrap_or_else(|| request.kind.default_threshold()),
            votes_for: 0,
            votes_against: 0,
            votes_abstain: 0,
            created_at: now(),
            decided_at: None,
            version: 1,
        };

        sqlx::query(
            "INSERT INTO motions (id, meeting_id, agenda_item_id, parent_motion_id, kind, text, moved_by, status, threshold, created_at, version) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1)",
        )
        .bind(&motion.id)
        .bind(&motion.meeting_id)
        .bind(&motion.agenda_item_id)
        .bind(&motion.parent_motion_id)
        .bind(motion.kind.as_str())
        .bind(&motion.text)
        .bind(&motion.moved_by)
        .bind(motion.status.as_str())
        .bind(motion.threshold.as_str())
        .bind(&motion.created_at)
        .execute(&mut *tx)
        .await?;

        bump_revision(&mut tx).await?;
        tx.commit().await?;
        Ok(motion)
    }

    /// Apply a chair action (second, withdraw, table, vote) to a motion.
    pub async fn apply_motion_action(
        &self,
        id: &str,
        action: &MotionAction,
    ) -> Result<Motion, AppError> {
        let mut tx = self.pool.begin().await?;
        let motion = fetch_motion(&mut tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("Motion", id))?;
        let meeting = fetch_meeting(&mut tx, &motion.meeting_id)
            .await?
            .ok_or_else(|| AppError::not_found("Meeting", &motion.meeting_id))?;
        let pending_amendments: i64 = sqlx::query(
            "SELECT COUNT(*) AS n FROM motions WHERE parent_motion_id = ? AND kind = 'amendment' AND status IN ('moved', 'seconded')",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?
        .get("n");

        let ruling = procedure::rule(
            &motion,
            action,
            Floor::of(&meeting, pending_amendments as usize),
        )?;

        let (votes_for, votes_against, votes_abstain) = ruling.votes.unwrap_or((
            motion.votes_for,
            motion.votes_against,
            motion.votes_abstain,
        ));
        let updated = Motion {
            status: ruling.status,
            seconded_by: ruling.seconded_by,
            votes_for,
            votes_against,
            votes_abstain,
            decided_at: if ruling.status.is_decided() {
                Some(now())
            } else {
                motion.decided_at.clone()
            },
            version: motion.version + 1,
            ..motion.clone()
        };

        let result = sqlx::query(
            "UPDATE motions SET status = ?, seconded_by = ?, votes_for = ?, votes_against = ?, votes_abstain = ?, decided_at = ?, version = ? WHERE id = ? AND version = ?",
        )
        .bind(updated.status.as_str())
        .bind(&updated.seconded_by)
        .bind(updated.votes_for)
        .bind(updated.votes_against)
        .bind(updated.votes_abstain)
        .bind(&updated.decided_at)
        .bind(updated.version)
        .bind(id)
        .bind(motion.version)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(concurrent_modification(Some(motion.version)));
        }

        bump_revision(&mut tx).await?;
        tx.commit().await?;
        tracing::info!(motion = %id, status = updated.status.as_str(), "Motion updated");
        Ok(updated)
    }
}

fn duplicate_committee(err: sqlx::Error, name: &str) -> AppError {
    unique_violation(err, || format!("A committee named {:?} already exists", name))
}

fn check_quorum(quorum: Option<i64>) -> Result<(), AppError> {
    if quorum.is_some_and(|q| q < 0) {
        return Err(AppError::Validation("Quorum must not be negative".to_string()));
    }
    Ok(())
}

fn check_duration(minutes: Option<i64>) -> Result<(), AppError> {
    if minutes.is_some_and(|m| m < 0) {
        return Err(AppError::Validation(
            "Duration must not be negative".to_string(),
        ));
    }
    Ok(())
}

async fn fetch_meeting(conn: &mut SqliteConnection, id: &str) -> Result<Option<Meeting>, AppError> {
    let row = sqlx::query(&format!("SELECT {} FROM meetings WHERE id = ?", MEETING_COLUMNS))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row.as_ref().map(meeting_from_row))
}

async fn fetch_motion(conn: &mut SqliteConnection, id: &str) -> Result<Option<Motion>, AppError> {
    let row = sqlx::query(&format!("SELECT {} FROM motions WHERE id = ?", MOTION_COLUMNS))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row.as_ref().map(motion_from_row))
}

async fn fetch_agenda(
    conn: &mut SqliteConnection,
    meeting_id: &str,
) -> Result<Vec<AgendaItem>, AppError> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM agenda_items WHERE meeting_id = ? ORDER BY position",
        AGENDA_COLUMNS
    ))
    .bind(meeting_id)
    .fetch_all(conn)
    .await?;
    Ok(rows.iter().map(agenda_item_from_row).collect())
}

fn committee_from_row(row: &sqlx::sqlite::SqliteRow) -> Committee {
    Committee {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        chair_contact_id: row.get("chair_contact_id"),
        member_contact_ids: parse_json_array(row.get("member_contact_ids")),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        version: row.get("version"),
    }
}

fn meeting_from_row(row: &sqlx::sqlite::SqliteRow) -> Meeting {
    let status: String = row.get("status");
    Meeting {
        id: row.get("id"),
        committee_id: row.get("committee_id"),
        title: row.get("title"),
        scheduled_at: row.get("scheduled_at"),
        location: row.get("location"),
        status: MeetingStatus::parse(&status).unwrap_or_default(),
        quorum: row.get("quorum"),
        attendee_contact_ids: parse_json_array(row.get("attendee_contact_ids")),
        minutes: row.get("minutes"),
        called_to_order_at: row.get("called_to_order_at"),
        adjourned_at: row.get("adjourned_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        version: row.get("version"),
    }
}

fn agenda_item_from_row(row: &sqlx::sqlite::SqliteRow) -> AgendaItem {
    let status: String = row.get("status");
    AgendaItem {
        id: row.get("id"),
        meeting_id: row.get("meeting_id"),
        position: row.get("position"),
        title: row.get("title"),
        description: row.get("description"),
        presenter: row.get("presenter"),
        duration_minutes: row.get("duration_minutes"),
        status: AgendaItemStatus::parse(&status).unwrap_or_default(),
        version: row.get("version"),
    }
}

fn motion_from_row(row: &sqlx::sqlite::SqliteRow) -> Motion {
    let kind: String = row.get("kind");
    let status: String = row.get("status");
    let threshold: String = row.get("threshold");
    let kind = MotionKind::parse(&kind).unwrap_or_default();
    Motion {
        id: row.get("id"),
        meeting_id: row.get("meeting_id"),
        agenda_item_id: row.get("agenda_item_id"),
        parent_motion_id: row.get("parent_motion_id"),
        kind,
        text: row.get("text"),
        moved_by: row.get("moved_by"),
        seconded_by: row.get("seconded_by"),
        status: MotionStatus::parse(&status).unwrap_or_default(),
        threshold: VoteThreshold::parse(&threshold).unwrap_or_else(|| kind.default_threshold()),
        votes_for: row.get("votes_for"),
        votes_against: row.get("votes_against"),
        votes_abstain: row.get("votes_abstain"),
        created_at: row.get("created_at"),
        decided_at: row.get("decided_at"),
        version: row.get("version"),
    }
}
