//! Transfer negotiation state attached to a domain.
//!
//! [`TransferData`] tracks one transfer negotiation between a gaining
//! and a losing registrar. While the transfer is `Pending` it carries
//! speculative server-approve data: the values the registry will commit
//! if the transfer completes. Those fields are nulled out on resolution
//! so that a resolved record never leaks stale projections; the status
//! and timestamps stay behind as the historical record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RegistrarId;
use super::poll_message::PollMessageKey;

/// Status of a transfer negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    /// No transfer has ever been requested.
    None,
    /// Requested and awaiting resolution.
    Pending,
    /// Approved explicitly by the losing registrar.
    ClientApproved,
    /// Rejected by the losing registrar.
    ClientRejected,
    /// Cancelled before resolution.
    ClientCancelled,
    /// Approved by the registry: explicit gaining-side approval or the
    /// automatic-resolve deadline passing.
    ServerApproved,
    /// Cancelled by the registry (e.g. the domain was deleted).
    ServerCancelled,
}

impl TransferStatus {
    /// Whether the negotiation is awaiting resolution.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Whether the status commits the transfer to the gaining registrar.
    #[must_use]
    pub const fn is_approved(self) -> bool {
        matches!(self, Self::ClientApproved | Self::ServerApproved)
    }

    /// Canonical wire encoding of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Pending => "PENDING",
            Self::ClientApproved => "CLIENT_APPROVED",
            Self::ClientRejected => "CLIENT_REJECTED",
            Self::ClientCancelled => "CLIENT_CANCELLED",
            Self::ServerApproved => "SERVER_APPROVED",
            Self::ServerCancelled => "SERVER_CANCELLED",
        }
    }
}

/// Speculative values committed onto the domain if the transfer is
/// approved. Populated only while the transfer is `Pending`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerApproveData {
    /// Registration expiration the domain will have after approval.
    pub new_expiration_time: DateTime<Utc>,
    /// Transfer fee charged to the gaining registrar on approval.
    pub fee_cents: u64,
    /// When the fee becomes billable (the automatic-resolve deadline).
    pub fee_billing_time: DateTime<Utc>,
    /// Keys of the implicit-approval notices scheduled at the deadline,
    /// so an explicit resolution can withdraw the unfired ones.
    pub scheduled_notice_keys: Vec<PollMessageKey>,
}

/// Transfer negotiation record, attached 1:1 to a domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferData {
    /// Current status.
    pub status: TransferStatus,
    /// When the transfer was requested.
    pub request_time: Option<DateTime<Utc>>,
    /// Deadline at which a pending transfer self-approves (inclusive).
    pub automatic_resolve_time: Option<DateTime<Utc>>,
    /// When the transfer reached a terminal status.
    pub resolution_time: Option<DateTime<Utc>>,
    /// Registrar that would gain (or gained) sponsorship.
    pub gaining_registrar: Option<RegistrarId>,
    /// Registrar that would lose (or lost) sponsorship.
    pub losing_registrar: Option<RegistrarId>,
    /// Speculative commit data; `Some` exactly while `Pending`.
    pub server_approve: Option<ServerApproveData>,
}

impl TransferData {
    /// Record for a domain that has never been transferred.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            status: TransferStatus::None,
            request_time: None,
            automatic_resolve_time: None,
            resolution_time: None,
            gaining_registrar: None,
            losing_registrar: None,
            server_approve: None,
        }
    }
}

impl Default for TransferData {
    fn default() -> Self {
        Self::none()
    }
}
