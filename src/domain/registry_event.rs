//! Domain events reflecting registry state mutations.
//!
//! Every committed mutation emits a [`RegistryEvent`] through the
//! [`super::EventBus`]. External delivery channels (out of scope here)
//! subscribe to forward notifications; tests subscribe to observe the
//! engine.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::RegistrarId;
use super::history::RepoId;
use super::transfer::TransferStatus;

/// Domain event emitted after every committed state mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum RegistryEvent {
    /// Emitted when a transfer negotiation is opened.
    TransferRequested {
        /// Repo id of the domain under transfer.
        repo_id: RepoId,
        /// Registrar requesting sponsorship.
        gaining_registrar: RegistrarId,
        /// Current sponsoring registrar.
        losing_registrar: RegistrarId,
        /// Deadline at which the transfer self-approves.
        automatic_resolve_time: DateTime<Utc>,
        /// Request timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted when a transfer reaches a terminal status, whether by
    /// explicit action or by the deadline passing.
    TransferResolved {
        /// Repo id of the domain.
        repo_id: RepoId,
        /// Terminal status the negotiation reached.
        status: TransferStatus,
        /// Gaining side of the negotiation.
        gaining_registrar: RegistrarId,
        /// Losing side of the negotiation.
        losing_registrar: RegistrarId,
        /// When the transfer resolved (the deadline itself for lazy
        /// resolution, even if observed later).
        timestamp: DateTime<Utc>,
    },

    /// Emitted after a poll message is acknowledged.
    PollMessageAcked {
        /// Registrar that acknowledged.
        registrar_id: RegistrarId,
        /// External id of the acknowledged message.
        message_id: String,
        /// Messages still queued for the registrar.
        remaining_count: usize,
        /// Ack timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl RegistryEvent {
    /// Returns the event type discriminator string.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::TransferRequested { .. } => "transfer_requested",
            Self::TransferResolved { .. } => "transfer_resolved",
            Self::PollMessageAcked { .. } => "poll_message_acked",
        }
    }
}
