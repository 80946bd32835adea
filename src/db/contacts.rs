//! Contact persistence, duplicate lookup and the import pipeline.

use sqlx::Row;

use super::repository::{
    bump_revision, check_version, concurrent_modification, new_id, now, parse_json_array,
    to_json, Repository,
};
use crate::dedup::DuplicateIndex;
use crate::errors::AppError;
use crate::models::{
    Contact, ContactSource, CreateContactRequest, DuplicateMatch, ImportOutcome, ImportReport,
    UpdateContactRequest,
};

const CONTACT_COLUMNS: &str = "id, first_name, last_name, email, phone, organization, street, postal_code, city, country, notes, tags, source, created_at, updated_at, version";

impl Repository {
    /// List all contacts ordered by last name, then first name.
    pub async fn list_contacts(&self) -> Result<Vec<Contact>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM contacts ORDER BY last_name COLLATE NOCASE, first_name COLLATE NOCASE",
            CONTACT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(contact_from_row).collect())
    }

    /// Get a contact by ID.
    pub async fn get_contact(&self, id: &str) -> Result<Option<Contact>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM contacts WHERE id = ?", CONTACT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(contact_from_row))
    }

    /// Fetch contacts in the order of the given IDs, skipping unknown ones.
    pub async fn get_contacts_by_ids(&self, ids: &[String]) -> Result<Vec<Contact>, AppError> {
        let mut contacts = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(contact) = self.get_contact(id).await? {
                contacts.push(contact);
            }
        }
        Ok(contacts)
    }

    /// Create a new contact.
    pub async fn create_contact(&self, request: &CreateContactRequest) -> Result<Contact, AppError> {
        request.validate().map_err(AppError::Validation)?;
        let contact = new_contact(request, ContactSource::Manual);
        let mut conn = self.pool.acquire().await?;
        insert_contact(&mut conn, &contact).await?;
        bump_revision(&mut conn).await?;
        Ok(contact)
    }

    /// Update a contact with optimistic concurrency control.
    pub async fn update_contact(
        &self,
        id: &str,
        request: &UpdateContactRequest,
    ) -> Result<Contact, AppError> {
        let existing = self
            .get_contact(id)
            .await?
            .ok_or_else(|| AppError::not_found("Contact", id))?;
        check_version(request.expected_version, existing.version)?;

        let merged = Contact {
            first_name: request
                .first_name
                .clone()
                .unwrap_or_else(|| existing.first_name.clone()),
            last_name: request
                .last_name
                .clone()
                .unwrap_or_else(|| existing.last_name.clone()),
            email: request.email.clone().or_else(|| existing.email.clone()),
            phone: request.phone.clone().or_else(|| existing.phone.clone()),
            organization: request
                .organization
                .clone()
                .or_else(|| existing.organization.clone()),
            street: request.street.clone().or_else(|| existing.street.clone()),
            postal_code: request
                .postal_code
                .clone()
                .or_else(|| existing.postal_code.clone()),
            city: request.city.clone().or_else(|| existing.city.clone()),
            country: request.country.clone().or_else(|| existing.country.clone()),
            notes: request.notes.clone().or_else(|| existing.notes.clone()),
            tags: request.tags.clone().unwrap_or_else(|| existing.tags.clone()),
            updated_at: now(),
            version: existing.version + 1,
            ..existing.clone()
        };
        as_request(&merged).validate().map_err(AppError::Validation)?;

        let result = sqlx::query(
            "UPDATE contacts SET first_name = ?, last_name = ?, email = ?, phone = ?, organization = ?, street = ?, postal_code = ?, city = ?, country = ?, notes = ?, tags = ?, updated_at = ?, version = ? WHERE id = ? AND version = ?",
        )
        .bind(&merged.first_name)
        .bind(&merged.last_name)
        .bind(&merged.email)
        .bind(&merged.phone)
        .bind(&merged.organization)
        .bind(&merged.street)
        .bind(&merged.postal_code)
        .bind(&merged.city)
        .bind(&merged.country)
        .bind(&merged.notes)
        .bind(to_json(&merged.tags)?)
        .bind(&merged.updated_at)
        .bind(merged.version)
        .bind(id)
        .bind(existing.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current = self.get_contact(id).await?;
            return Err(concurrent_modification(current.map(|c| c.version)));
        }

        self.increment_revision().await?;
        Ok(merged)
    }

    /// Delete a contact. List subscriptions go with it; batch snapshots keep the recipient.
    pub async fn delete_contact(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Contact", id));
        }

        self.increment_revision().await?;
        Ok(())
    }

    /// Ranked possible duplicates of a candidate among stored contacts.
    pub async fn find_duplicates(
        &self,
        candidate: &CreateContactRequest,
        threshold: f64,
    ) -> Result<Vec<DuplicateMatch>, AppError> {
        let existing = self.list_contacts().await?;
        Ok(DuplicateIndex::new(&existing, threshold).find(candidate))
    }

    /// Classify import records and, when `commit` is set, create the new ones in one transaction.
    pub async fn import_contacts(
        &self,
        records: &[CreateContactRequest],
        commit: bool,
        threshold: f64,
    ) -> Result<ImportReport, AppError> {
        let existing = self.list_contacts().await?;
        let mut index = DuplicateIndex::new(&existing, threshold);
        let mut outcomes = Vec::with_capacity(records.len());
        let mut to_create = Vec::new();

        for (i, record) in records.iter().enumerate() {
            if let Err(reason) = record.validate() {
                outcomes.push(ImportOutcome::Skipped { index: i, reason });
                continue;
            }
            if let Some(best_match) = index.best(record) {
                outcomes.push(ImportOutcome::Duplicate {
                    index: i,
                    record: record.clone(),
                    best_match,
                });
                continue;
            }
            index.add_batch_record(i, record);
            let contact = new_contact(record, ContactSource::Import);
            to_create.push(contact.clone());
            outcomes.push(ImportOutcome::Created { index: i, contact });
        }

        if commit && !to_create.is_empty() {
            // Dropping the transaction on error rolls back every insert of this run.
            let mut tx = self.pool.begin().await?;
            for contact in &to_create {
                insert_contact(&mut tx, contact).await?;
            }
            bump_revision(&mut tx).await?;
            tx.commit().await?;
            tracing::info!("Imported {} contacts", to_create.len());
        }

        let count = |pred: fn(&ImportOutcome) -> bool| outcomes.iter().filter(|o| pred(*o)).count();
        Ok(ImportReport {
            committed: commit,
            total: records.len(),
            created: count(|o| matches!(o, ImportOutcome::Created { .. })),
            duplicates: count(|o| matches!(o, ImportOutcome::Duplicate { .. })),
            skipped: count(|o| matches!(o, ImportOutcome::Skipped { .. })),
            outcomes,
        })
    }
}

fn new_contact(request: &CreateContactRequest, source: ContactSource) -> Contact {
    let timestamp = now();
    Contact {
        id: new_id(),
        first_name: request.first_name.trim().to_string(),
        last_name: request.last_name.trim().to_string(),
        email: non_blank(&request.email),
        phone: non_blank(&request.phone),
        organization: non_blank(&request.organization),
        street: non_blank(&request.street),
        postal_code: non_blank(&request.postal_code),
        city: non_blank(&request.city),
        country: non_blank(&request.country),
        notes: non_blank(&request.notes),
        tags: request.tags.clone(),
        source,
        created_at: timestamp.clone(),
        updated_at: timestamp,
        version: 1,
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn as_request(contact: &Contact) -> CreateContactRequest {
    CreateContactRequest {
        first_name: contact.first_name.clone(),
        last_name: contact.last_name.clone(),
        email: contact.email.clone(),
        ..Default::default()
    }
}

async fn insert_contact(conn: &mut sqlx::SqliteConnection, contact: &Contact) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO contacts (id, first_name, last_name, email, phone, organization, street, postal_code, city, country, notes, tags, source, created_at, updated_at, version) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&contact.id)
    .bind(&contact.first_name)
    .bind(&contact.last_name)
    .bind(&contact.email)
    .bind(&contact.phone)
    .bind(&contact.organization)
    .bind(&contact.street)
    .bind(&contact.postal_code)
    .bind(&contact.city)
    .bind(&contact.country)
    .bind(&contact.notes)
    .bind(to_json(&contact.tags)?)
    .bind(contact.source.as_str())
    .bind(&contact.created_at)
    .bind(&contact.updated_at)
    .bind(contact.version)
    .execute(conn)
    .await?;
    Ok(())
}

pub(super) fn contact_from_row(row: &sqlx::sqlite::SqliteRow) -> Contact {
    let source: String = row.get("source");
    Contact {
        id: row.get("id"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        email: row.get("email"),
        phone: row.get("phone"),
        organization: row.get("organization"),
        street: row.get("street"),
        postal_code: row.get("postal_code"),
        city: row.get("city"),
        country: row.get("country"),
        notes: row.get("notes"),
        tags: parse_json_array(row.get::<Option<&str>, _>("tags")),
        source: ContactSource::parse(&source).unwrap_or_default(),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        version: row.get("version"),
    }
}
