//! Mailing list and mailing batch models.

use serde::{Deserialize, Serialize};

/// How a list reaches its members.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum MailingChannel {
    #[default]
    Email,
    Postal,
}

impl MailingChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            MailingChannel::Email => "email",
            MailingChannel::Postal => "postal",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "email" => Some(MailingChannel::Email),
            "postal" => Some(MailingChannel::Postal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailingList {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub channel: MailingChannel,
    /// Number of subscribed contacts (derived)
    #[serde(default)]
    pub member_count: i64,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub version: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMailingListRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub channel: MailingChannel,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMailingListRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub expected_version: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    pub contact_id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum BatchStatus {
    Prepared,
    Sent,
    Closed,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Prepared => "prepared",
            BatchStatus::Sent => "sent",
            BatchStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "prepared" => Some(BatchStatus::Prepared),
            "sent" => Some(BatchStatus::Sent),
            "closed" => Some(BatchStatus::Closed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RecipientStatus {
    Pending,
    Mailed,
    Delivered,
    Returned,
}

impl RecipientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipientStatus::Pending => "pending",
            RecipientStatus::Mailed => "mailed",
            RecipientStatus::Delivered => "delivered",
            RecipientStatus::Returned => "returned",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RecipientStatus::Pending),
            "mailed" => Some(RecipientStatus::Mailed),
            "delivered" => Some(RecipientStatus::Delivered),
            "returned" => Some(RecipientStatus::Returned),
            _ => None,
        }
    }
}

/// A frozen copy of a mailing list's members at the time the batch was prepared.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailingBatch {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_id: Option<String>,
    pub list_name: String,
    pub channel: MailingChannel,
    pub name: String,
    pub status: BatchStatus,
    pub recipient_count: i64,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRecipient {
    pub id: String,
    pub batch_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub status: RecipientStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBatchRequest {
    pub list_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecipientRequest {
    pub status: RecipientStatus,
    #[serde(default)]
    pub note: Option<String>,
}

/// Recipient counts per status.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub total: i64,
    pub pending: i64,
    pub mailed: i64,
    pub delivered: i64,
    pub returned: i64,
}

impl BatchReport {
    pub fn tally(recipients: &[BatchRecipient]) -> Self {
        recipients.iter().fold(Self::default(), |mut report, r| {
            report.total += 1;
            match r.status {
                RecipientStatus::Pending => report.pending += 1,
                RecipientStatus::Mailed => report.mailed += 1,
                RecipientStatus::Delivered => report.delivered += 1,
                RecipientStatus::Returned => report.returned += 1,
            }
            report
        })
    }
}

/// Batch with its recipients, as returned by the detail endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDetail {
    pub batch: MailingBatch,
    pub recipients: Vec<BatchRecipient>,
    pub report: BatchReport,
}

/// Recipient changes allowed once the batch has gone out.
pub fn check_recipient_transition(
    from: RecipientStatus,
    to: RecipientStatus,
) -> Result<(), String> {
    match (from, to) {
        (RecipientStatus::Mailed, RecipientStatus::Delivered | RecipientStatus::Returned) => Ok(()),
        (RecipientStatus::Delivered, RecipientStatus::Returned) => Ok(()),
        (from, to) if from == to => Ok(()),
        (from, to) => Err(format!(
            "Recipient cannot move from {} to {}",
            from.as_str(),
            to.as_str()
        )),
    }
}
