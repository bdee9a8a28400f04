//! Domain entry combining registration state with server-side metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RegistrarId;
use super::history::{HistoryEntry, RepoId};
use super::transfer::TransferData;

/// A registered domain as stored by the registry core.
///
/// Each domain in the store is one `DomainEntry`. The `transfer_data`
/// field holds the live transfer negotiation (or its frozen historical
/// record); `history` is the append-only mutation log that poll
/// messages and billing events reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEntry {
    /// Repository id (immutable after creation).
    pub repo_id: RepoId,

    /// Fully-qualified domain name (immutable after creation).
    pub fqdn: String,

    /// Current sponsoring registrar. Changes only on transfer approval.
    pub sponsor_registrar: RegistrarId,

    /// Current registration expiration.
    pub registration_expiration: DateTime<Utc>,

    /// Creation timestamp (immutable after creation).
    pub created_at: DateTime<Utc>,

    /// Timestamp of last state mutation.
    pub last_modified_at: DateTime<Utc>,

    /// Transfer negotiation state.
    pub transfer_data: TransferData,

    /// Append-only mutation log.
    pub history: Vec<HistoryEntry>,
}

impl DomainEntry {
    /// Latest history revision number of this domain.
    ///
    /// Domains always carry at least the creation entry, so this falls
    /// back to zero only for synthetically constructed records.
    #[must_use]
    pub fn latest_revision(&self) -> u64 {
        self.history.last().map_or(0, |entry| entry.revision)
    }
}

/// Lightweight summary of a domain for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct DomainSummary {
    /// Repository id.
    pub repo_id: RepoId,
    /// Fully-qualified domain name.
    pub fqdn: String,
    /// Current sponsoring registrar.
    pub sponsor_registrar: RegistrarId,
    /// Current registration expiration.
    pub registration_expiration: DateTime<Utc>,
}

impl From<&DomainEntry> for DomainSummary {
    fn from(entry: &DomainEntry) -> Self {
        Self {
            repo_id: entry.repo_id.clone(),
            fqdn: entry.fqdn.clone(),
            sponsor_registrar: entry.sponsor_registrar.clone(),
            registration_expiration: entry.registration_expiration,
        }
    }
}
