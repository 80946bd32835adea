//! Mailing lists, subscriptions and mailing batches.

use sqlx::Row;

use super::contacts::contact_from_row;
use super::repository::{
    bump_revision, check_version, concurrent_modification, new_id, now, unique_violation,
    Repository,
};
use crate::errors::AppError;
use crate::models::{
    check_recipient_transition, BatchDetail, BatchRecipient, BatchReport, BatchStatus, Contact,
    CreateBatchRequest, CreateMailingListRequest, MailingBatch, MailingChannel, MailingList,
    RecipientStatus, UpdateMailingListRequest, UpdateRecipientRequest,
};

const LIST_SELECT: &str = "SELECT l.id, l.name, l.description, l.channel, l.created_at, l.updated_at, l.version, (SELECT COUNT(*) FROM list_subscriptions s WHERE s.list_id = l.id) AS member_count FROM mailing_lists l";
const BATCH_COLUMNS: &str =
    "id, list_id, list_name, channel, name, status, recipient_count, created_at, sent_at, closed_at";
const RECIPIENT_COLUMNS: &str =
    "id, batch_id, contact_id, name, email, street, postal_code, city, country, status, note";

impl Repository {
    // ==================== MAILING LIST OPERATIONS ====================

    pub async fn list_mailing_lists(&self) -> Result<Vec<MailingList>, AppError> {
        let rows = sqlx::query(&format!("{} ORDER BY l.name", LIST_SELECT))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(list_from_row).collect())
    }

    pub async fn get_mailing_list(&self, id: &str) -> Result<Option<MailingList>, AppError> {
        let row = sqlx::query(&format!("{} WHERE l.id = ?", LIST_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(list_from_row))
    }

    pub async fn create_mailing_list(
        &self,
        request: &CreateMailingListRequest,
    ) -> Result<MailingList, AppError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("List name is required".to_string()));
        }

        let timestamp = now();
        let list = MailingList {
            id: new_id(),
            name: name.to_string(),
            description: request.description.clone(),
            channel: request.channel,
            member_count: 0,
            created_at: timestamp.clone(),
            updated_at: timestamp,
            version: 1,
        };

        sqlx::query(
            "INSERT INTO mailing_lists (id, name, description, channel, created_at, updated_at, version) VALUES (?, ?, ?, ?, ?, ?, 1)",
        )
        .bind(&list.id)
        .bind(&list.name)
        .bind(&list.description)
        .bind(list.channel.as_str())
        .bind(&list.created_at)
        .bind(&list.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_list(e, &list.name))?;

        self.increment_revision().await?;
        Ok(list)
    }

    /// Rename or re-describe a list. The channel is fixed at creation.
    pub async fn update_mailing_list(
        &self,
        id: &str,
        request: &UpdateMailingListRequest,
    ) -> Result<MailingList, AppError> {
        let existing = self
            .get_mailing_list(id)
            .await?
            .ok_or_else(|| AppError::not_found("Mailing list", id))?;
        check_version(request.expected_version, existing.version)?;

        let merged = MailingList {
            name: request
                .name
                .as_deref()
                .map(|n| n.trim().to_string())
                .unwrap_or_else(|| existing.name.clone()),
            description: request
                .description
                .clone()
                .or_else(|| existing.description.clone()),
            updated_at: now(),
            version: existing.version + 1,
            ..existing.clone()
        };
        if merged.name.is_empty() {
            return Err(AppError::Validation("List name is required".to_string()));
        }

        let result = sqlx::query(
            "UPDATE mailing_lists SET name = ?, description = ?, updated_at = ?, version = ? WHERE id = ? AND version = ?",
        )
        .bind(&merged.name)
        .bind(&merged.description)
        .bind(&merged.updated_at)
        .bind(merged.version)
        .bind(id)
        .bind(existing.version)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_list(e, &merged.name))?;

        if result.rows_affected() == 0 {
            let current = self.get_mailing_list(id).await?;
            return Err(concurrent_modification(current.map(|l| l.version)));
        }

        self.increment_revision().await?;
        Ok(merged)
    }

    /// Delete a list and its subscriptions. Batches keep their snapshot.
    pub async fn delete_mailing_list(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM mailing_lists WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Mailing list", id));
        }

        self.increment_revision().await?;
        Ok(())
    }

    /// Contacts subscribed to a list, ordered like the contact list.
    pub async fn list_members(&self, list_id: &str) -> Result<Vec<Contact>, AppError> {
        if self.get_mailing_list(list_id).await?.is_none() {
            return Err(AppError::not_found("Mailing list", list_id));
        }
        let rows = sqlx::query(
            "SELECT c.* FROM contacts c JOIN list_subscriptions s ON s.contact_id = c.id WHERE s.list_id = ? ORDER BY c.last_name COLLATE NOCASE, c.first_name COLLATE NOCASE",
        )
        .bind(list_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(contact_from_row).collect())
    }

    /// Subscribe a contact. Subscribing twice is a no-op.
    pub async fn subscribe(&self, list_id: &str, contact_id: &str) -> Result<MailingList, AppError> {
        let list = self
            .get_mailing_list(list_id)
            .await?
            .ok_or_else(|| AppError::not_found("Mailing list", list_id))?;
        let contact = self
            .get_contact(contact_id)
            .await?
            .ok_or_else(|| AppError::not_found("Contact", contact_id))?;
        check_reachable(&contact, list.channel)?;

        let result = sqlx::query(
            "INSERT OR IGNORE INTO list_subscriptions (list_id, contact_id, subscribed_at) VALUES (?, ?, ?)",
        )
        .bind(list_id)
        .bind(contact_id)
        .bind(now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            self.increment_revision().await?;
        }
        self.get_mailing_list(list_id)
            .await?
            .ok_or_else(|| AppError::not_found("Mailing list", list_id))
    }

    pub async fn unsubscribe(&self, list_id: &str, contact_id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM list_subscriptions WHERE list_id = ? AND contact_id = ?")
            .bind(list_id)
            .bind(contact_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Contact {} is not subscribed to list {}",
                contact_id, list_id
            )));
        }

        self.increment_revision().await?;
        Ok(())
    }

    // ==================== BATCH OPERATIONS ====================

    pub async fn list_batches(&self) -> Result<Vec<MailingBatch>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM mailing_batches ORDER BY created_at DESC",
            BATCH_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(batch_from_row).collect())
    }

    pub async fn get_batch(&self, id: &str) -> Result<Option<MailingBatch>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM mailing_batches WHERE id = ?",
            BATCH_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(batch_from_row))
    }

    /// Batch with its recipients and status counts.
    pub async fn get_batch_detail(&self, id: &str) -> Result<Option<BatchDetail>, AppError> {
        let Some(batch) = self.get_batch(id).await? else {
            return Ok(None);
        };
        let rows = sqlx::query(&format!(
            "SELECT {} FROM batch_recipients WHERE batch_id = ? ORDER BY position",
            RECIPIENT_COLUMNS
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        let recipients: Vec<BatchRecipient> = rows.iter().map(recipient_from_row).collect();
        let report = BatchReport::tally(&recipients);

        Ok(Some(BatchDetail {
            batch,
            recipients,
            report,
        }))
    }

    /// Freeze the reachable members of a list into a new batch.
    pub async fn create_batch(&self, request: &CreateBatchRequest) -> Result<BatchDetail, AppError> {
        if request.name.trim().is_empty() {
            return Err(AppError::Validation("Batch name is required".to_string()));
        }
        let list = self
            .get_mailing_list(&request.list_id)
            .await?
            .ok_or_else(|| AppError::not_found("Mailing list", &request.list_id))?;

        let mut tx = self.pool.begin().await?;
        let rows = sqlx::query(
            "SELECT c.* FROM contacts c JOIN list_subscriptions s ON s.contact_id = c.id WHERE s.list_id = ? ORDER BY c.last_name COLLATE NOCASE, c.first_name COLLATE NOCASE",
        )
        .bind(&list.id)
        .fetch_all(&mut *tx)
        .await?;
        let members: Vec<Contact> = rows
            .iter()
            .map(contact_from_row)
            .filter(|c| check_reachable(c, list.channel).is_ok())
            .collect();
        if members.is_empty() {
            return Err(AppError::InvalidState(format!(
                "Mailing list {:?} has no reachable members",
                list.name
            )));
        }

        let batch = MailingBatch {
            id: new_id(),
            list_id: Some(list.id.clone()),
            list_name: list.name.clone(),
            channel: list.channel,
            name: request.name.trim().to_string(),
            status: BatchStatus::Prepared,
            recipient_count: members.len() as i64,
            created_at: now(),
            sent_at: None,
            closed_at: None,
        };
        sqlx::query(
            "INSERT INTO mailing_batches (id, list_id, list_name, channel, name, status, recipient_count, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&batch.id)
        .bind(&batch.list_id)
        .bind(&batch.list_name)
        .bind(batch.channel.as_str())
        .bind(&batch.name)
        .bind(batch.status.as_str())
        .bind(batch.recipient_count)
        .bind(&batch.created_at)
        .execute(&mut *tx)
        .await?;

        let mut recipients = Vec::with_capacity(members.len());
        for (position, contact) in members.iter().enumerate() {
            let recipient = BatchRecipient {
                id: new_id(),
                batch_id: batch.id.clone(),
                contact_id: Some(contact.id.clone()),
                name: contact.display_name(),
                email: contact.email.clone(),
                street: contact.street.clone(),
                postal_code: contact.postal_code.clone(),
                city: contact.city.clone(),
                country: contact.country.clone(),
                status: RecipientStatus::Pending,
                note: None,
            };
            sqlx::query(
                "INSERT INTO batch_recipients (id, batch_id, contact_id, position, name, email, street, postal_code, city, country, status) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&recipient.id)
            .bind(&recipient.batch_id)
            .bind(&recipient.contact_id)
            .bind(position as i64)
            .bind(&recipient.name)
            .bind(&recipient.email)
            .bind(&recipient.street)
            .bind(&recipient.postal_code)
            .bind(&recipient.city)
            .bind(&recipient.country)
            .bind(recipient.status.as_str())
            .execute(&mut *tx)
            .await?;
            recipients.push(recipient);
        }

        bump_revision(&mut tx).await?;
        tx.commit().await?;
        tracing::info!(batch = %batch.id, recipients = recipients.len(), "Mailing batch prepared");

        let report = BatchReport::tally(&recipients);
        Ok(BatchDetail {
            batch,
            recipients,
            report,
        })
    }

    /// Mark a prepared batch as sent; all its recipients become mailed.
    pub async fn send_batch(&self, id: &str) -> Result<BatchDetail, AppError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "UPDATE mailing_batches SET status = 'sent', sent_at = ? WHERE id = ? AND status = 'prepared'",
        )
        .bind(now())
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            drop(tx);
            return Err(self.batch_state_error(id, "send", BatchStatus::Prepared).await);
        }
        sqlx::query("UPDATE batch_recipients SET status = 'mailed' WHERE batch_id = ? AND status = 'pending'")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        bump_revision(&mut tx).await?;
        tx.commit().await?;
        self.require_batch_detail(id).await
    }

    /// Close a sent batch; its recipients are frozen from then on.
    pub async fn close_batch(&self, id: &str) -> Result<BatchDetail, AppError> {
        let result = sqlx::query(
            "UPDATE mailing_batches SET status = 'closed', closed_at = ? WHERE id = ? AND status = 'sent'",
        )
        .bind(now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(self.batch_state_error(id, "close", BatchStatus::Sent).await);
        }

        self.increment_revision().await?;
        self.require_batch_detail(id).await
    }

    /// Record delivery feedback for one recipient of a sent batch.
    pub async fn update_recipient(
        &self,
        batch_id: &str,
        recipient_id: &str,
        request: &UpdateRecipientRequest,
    ) -> Result<BatchRecipient, AppError> {
        let batch = self
            .get_batch(batch_id)
            .await?
            .ok_or_else(|| AppError::not_found("Batch", batch_id))?;
        if batch.status != BatchStatus::Sent {
            return Err(AppError::InvalidState(format!(
                "Recipients can only be updated while the batch is sent (batch is {})",
                batch.status.as_str()
            )));
        }

        let row = sqlx::query(&format!(
            "SELECT {} FROM batch_recipients WHERE id = ? AND batch_id = ?",
            RECIPIENT_COLUMNS
        ))
        .bind(recipient_id)
        .bind(batch_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Recipient", recipient_id))?;
        let existing = recipient_from_row(&row);

        check_recipient_transition(existing.status, request.status)
            .map_err(AppError::InvalidState)?;

        let updated = BatchRecipient {
            status: request.status,
            note: request.note.clone().or_else(|| existing.note.clone()),
            ..existing.clone()
        };
        let result = sqlx::query(
            "UPDATE batch_recipients SET status = ?, note = ? WHERE id = ? AND status = ?",
        )
        .bind(updated.status.as_str())
        .bind(&updated.note)
        .bind(recipient_id)
        .bind(existing.status.as_str())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::Conflict {
                message: "Recipient was changed concurrently".to_string(),
                current_version: 0,
            });
        }

        self.increment_revision().await?;
        Ok(updated)
    }

    async fn require_batch_detail(&self, id: &str) -> Result<BatchDetail, AppError> {
        self.get_batch_detail(id)
            .await?
            .ok_or_else(|| AppError::not_found("Batch", id))
    }

    async fn batch_state_error(&self, id: &str, verb: &str, required: BatchStatus) -> AppError {
        match self.get_batch(id).await {
            Ok(Some(batch)) => AppError::InvalidState(format!(
                "Cannot {} a batch that is {} (must be {})",
                verb,
                batch.status.as_str(),
                required.as_str()
            )),
            Ok(None) => AppError::not_found("Batch", id),
            Err(e) => e,
        }
    }
}

/// A contact can only join a list whose channel can reach it.
fn check_reachable(contact: &Contact, channel: MailingChannel) -> Result<(), AppError> {
    let reachable = match channel {
        MailingChannel::Email => contact.has_email(),
        MailingChannel::Postal => contact.has_postal_address(),
    };
    if reachable {
        Ok(())
    } else {
        Err(AppError::Validation(match channel {
            MailingChannel::Email => format!("{} has no email address", contact.display_name()),
            MailingChannel::Postal => format!(
                "{} has no complete postal address (street, postal code, city)",
                contact.display_name()
            ),
        }))
    }
}

fn duplicate_list(err: sqlx::Error, name: &str) -> AppError {
    unique_violation(err, || format!("A mailing list named {:?} already exists", name))
}

fn list_from_row(row: &sqlx::sqlite::SqliteRow) -> MailingList {
    let channel: String = row.get("channel");
    MailingList {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        channel: MailingChannel::parse(&channel).unwrap_or_default(),
        member_count: row.get("member_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        version: row.get("version"),
    }
}

fn batch_from_row(row: &sqlx::sqlite::SqliteRow) -> MailingBatch {
    let channel: String = row.get("channel");
    let status: String = row.get("status");
    MailingBatch {
        id: row.get("id"),
        list_id: row.get("list_id"),
        list_name: row.get("list_name"),
        channel: MailingChannel::parse(&channel).unwrap_or_default(),
        name: row.get("name"),
        status: BatchStatus::parse(&status).unwrap_or(BatchStatus::Closed),
        recipient_count: row.get("recipient_count"),
        created_at: row.get("created_at"),
        sent_at: row.get("sent_at"),
        closed_at: row.get("closed_at"),
    }
}

fn recipient_from_row(row: &sqlx::sqlite::SqliteRow) -> BatchRecipient {
    let status: String = row.get("status");
    BatchRecipient {
        id: row.get("id"),
        batch_id: row.get("batch_id"),
        contact_id: row.get("contact_id"),
        name: row.get("name"),
        email: row.get("email"),
        street: row.get("street"),
        postal_code: row.get("postal_code"),
        city: row.get("city"),
        country: row.get("country"),
        status: RecipientStatus::parse(&status).unwrap_or(RecipientStatus::Pending),
        note: row.get("note"),
    }
}

#[cfg(test)]
mod tests {
    use super::super::repository::tests::test_repo;
    use super::*;
    use crate::models::{CreateContactRequest, UpdateContactRequest};

    async fn postal_contact(repo: &Repository, last: &str) -> Contact {
        repo.create_contact(&CreateContactRequest {
            first_name: "Kim".to_string(),
            last_name: last.to_string(),
            street: Some("Bahnhofstrasse 1".to_string()),
            postal_code: Some("8001".to_string()),
            city: Some("Zürich".to_string()),
            ..Default::default()
        })
        .await
        .unwrap()
    }

    async fn postal_list(repo: &Repository) -> MailingList {
        repo.create_mailing_list(&CreateMailingListRequest {
            name: "Newsletter (print)".to_string(),
            description: None,
            channel: MailingChannel::Postal,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_postal_list_requires_address() {
        let (repo, _dir) = test_repo().await;
        let list = postal_list(&repo).await;
        let no_address = repo
            .create_contact(&CreateContactRequest {
                last_name: "Nomad".to_string(),
                email: Some("nomad@example.org".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(matches!(
            repo.subscribe(&list.id, &no_address.id).await,
            Err(AppError::Validation(_))
        ));

        let resident = postal_contact(&repo, "Huber").await;
        repo.subscribe(&list.id, &resident.id).await.unwrap();
        let again = repo.subscribe(&list.id, &resident.id).await.unwrap();
        assert_eq!(again.member_count, 1);
    }

    #[tokio::test]
    async fn test_batch_snapshot_survives_contact_edits() {
        let (repo, _dir) = test_repo().await;
        let list = postal_list(&repo).await;
        let huber = postal_contact(&repo, "Huber").await;
        let frei = postal_contact(&repo, "Frei").await;
        repo.subscribe(&list.id, &huber.id).await.unwrap();
        repo.subscribe(&list.id, &frei.id).await.unwrap();

        let detail = repo
            .create_batch(&CreateBatchRequest {
                list_id: list.id.clone(),
                name: "Spring letter".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(detail.batch.recipient_count, 2);
        assert_eq!(detail.recipients[0].name, "Kim Frei");

        repo.update_contact(
            &frei.id,
            &UpdateContactRequest {
                city: Some("Winterthur".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        repo.delete_contact(&huber.id).await.unwrap();

        let stored = repo.get_batch_detail(&detail.batch.id).await.unwrap().unwrap();
        assert_eq!(stored.recipients.len(), 2);
        assert_eq!(stored.recipients[0].city.as_deref(), Some("Zürich"));
        assert!(stored.recipients[1].contact_id.is_none());
    }

    #[tokio::test]
    async fn test_batch_lifecycle_and_report() {
        let (repo, _dir) = test_repo().await;
        let list = postal_list(&repo).await;
        for last in ["Aebi", "Brunner", "Caduff"] {
            let contact = postal_contact(&repo, last).await;
            repo.subscribe(&list.id, &contact.id).await.unwrap();
        }
        let batch_id = repo
            .create_batch(&CreateBatchRequest {
                list_id: list.id.clone(),
                name: "Invitations".to_string(),
            })
            .await
            .unwrap()
            .batch
            .id;

        assert!(matches!(
            repo.close_batch(&batch_id).await,
            Err(AppError::InvalidState(_))
        ));

        let sent = repo.send_batch(&batch_id).await.unwrap();
        assert_eq!(sent.batch.status, BatchStatus::Sent);
        assert_eq!(sent.report.mailed, 3);

        let returned = UpdateRecipientRequest {
            status: RecipientStatus::Returned,
            note: Some("Moved away".to_string()),
        };
        repo.update_recipient(&batch_id, &sent.recipients[0].id, &returned)
            .await
            .unwrap();
        let delivered = UpdateRecipientRequest {
            status: RecipientStatus::Delivered,
            note: None,
        };
        repo.update_recipient(&batch_id, &sent.recipients[1].id, &delivered)
            .await
            .unwrap();
        assert!(matches!(
            repo.update_recipient(&batch_id, &sent.recipients[0].id, &delivered)
                .await,
            Err(AppError::InvalidState(_))
        ));

        let closed = repo.close_batch(&batch_id).await.unwrap();
        assert_eq!(closed.batch.status, BatchStatus::Closed);
        assert_eq!(
            closed.report,
            BatchReport {
                total: 3,
                pending: 0,
                mailed: 1,
                delivered: 1,
                returned: 1,
            }
        );
        assert!(matches!(
            repo.update_recipient(&batch_id, &sent.recipients[2].id, &delivered)
                .await,
            Err(AppError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_list_cannot_be_batched() {
        let (repo, _dir) = test_repo().await;
        let list = postal_list(&repo).await;
        assert!(matches!(
            repo.create_batch(&CreateBatchRequest {
                list_id: list.id,
                name: "Nothing".to_string(),
            })
            .await,
            Err(AppError::InvalidState(_))
        ));
    }
}
