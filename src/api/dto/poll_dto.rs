//! Poll-message DTOs for list and ack operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::service::poll_queue::QueueItem;

/// One queued message as seen by a registrar.
#[derive(Debug, Serialize, ToSchema)]
pub struct QueueItemDto {
    /// External message id (`<class>-<number>-<suffix>-<revision>-<serial>-<year>`).
    pub id: String,
    /// Event time of the message instance.
    pub event_time: DateTime<Utc>,
    /// Human-readable message body.
    pub message: String,
}

impl From<QueueItem> for QueueItemDto {
    fn from(item: QueueItem) -> Self {
        Self {
            id: item.id.to_string(),
            event_time: item.event_time,
            message: item.message,
        }
    }
}

/// Response body for `GET /registrars/{registrar_id}/messages`.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageListResponse {
    /// Queued messages, oldest first.
    pub data: Vec<QueueItemDto>,
    /// Number of queued messages (always `data.len()`).
    pub count: usize,
}

/// Request body for `POST /registrars/{registrar_id}/messages/ack`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AckRequest {
    /// External id of the message to acknowledge.
    pub message_id: Option<String>,
    /// When true, run every check but leave the queue untouched.
    #[serde(default)]
    pub dry_run: bool,
}

/// Response body for a successful acknowledgement.
#[derive(Debug, Serialize, ToSchema)]
pub struct AckResponse {
    /// The acknowledged message id, echoed back.
    pub acked_id: String,
    /// Messages still queued for the registrar.
    pub remaining_count: usize,
    /// Whether this was a dry run.
    pub dry_run: bool,
}
