//! In-memory transactional store.
//!
//! [`MemoryStore`] guards a single [`StoreState`] behind a
//! [`tokio::sync::RwLock`]. Mutations run against a copy of the state
//! and the copy is installed only when the closure succeeds, so a
//! failing operation observes no partial application — the rollback
//! guarantee the poll-ack and transfer flows rely on. The write lock
//! also serializes conflicting acks: the first committer wins and the
//! second observes the already-mutated state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::billing::{BillingEvent, BillingEventId, BillingReason, RecurringBillingEvent};
use crate::domain::domain_entry::DomainEntry;
use crate::domain::history::{HistoryEntry, HistoryKey, HistoryType, RepoId, ResourceClass};
use crate::domain::poll_message::{
    AutorenewMessage, OneTimeMessage, PollMessage, PollMessageKey, end_of_time,
};
use crate::domain::transfer::TransferData;
use crate::domain::RegistrarId;
use crate::error::RegistryError;

/// Complete registry state: domains, poll messages, billing events, and
/// the serial counters backing history revisions and message numbers.
#[derive(Debug, Clone, Default)]
pub struct StoreState {
    /// Registered domains by repo id.
    pub domains: HashMap<RepoId, DomainEntry>,
    /// Poll message records by storage key.
    pub poll_messages: HashMap<PollMessageKey, PollMessage>,
    /// Billing events, append-only.
    pub billing_events: Vec<BillingEvent>,
    /// Next history revision number (store-wide).
    pub next_history_revision: u64,
    /// Next poll message serial number (store-wide).
    pub next_message_num: u64,
}

impl StoreState {
    /// Empty state with counters starting at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            domains: HashMap::new(),
            poll_messages: HashMap::new(),
            billing_events: Vec::new(),
            next_history_revision: 1,
            next_message_num: 1,
        }
    }

    /// Allocates the next history revision number.
    pub fn allocate_history_revision(&mut self) -> u64 {
        let revision = self.next_history_revision;
        self.next_history_revision += 1;
        revision
    }

    /// Allocates the next poll message serial number.
    pub fn allocate_message_num(&mut self) -> u64 {
        let num = self.next_message_num;
        self.next_message_num += 1;
        num
    }

    /// Looks up a domain or fails with [`RegistryError::DomainNotFound`].
    ///
    /// # Errors
    ///
    /// Returns `DomainNotFound` when no domain has the given repo id.
    pub fn domain(&self, repo_id: &RepoId) -> Result<&DomainEntry, RegistryError> {
        self.domains
            .get(repo_id)
            .ok_or_else(|| RegistryError::DomainNotFound(repo_id.to_string()))
    }

    /// Mutable variant of [`StoreState::domain`].
    ///
    /// # Errors
    ///
    /// Returns `DomainNotFound` when no domain has the given repo id.
    pub fn domain_mut(&mut self, repo_id: &RepoId) -> Result<&mut DomainEntry, RegistryError> {
        self.domains
            .get_mut(repo_id)
            .ok_or_else(|| RegistryError::DomainNotFound(repo_id.to_string()))
    }

    /// Inserts a one-time poll message under a fresh serial number and
    /// returns its key.
    pub fn enqueue_one_time(
        &mut self,
        parent: HistoryKey,
        registrar_id: RegistrarId,
        event_time: DateTime<Utc>,
        message: impl Into<String>,
    ) -> PollMessageKey {
        let key = PollMessageKey {
            history: parent,
            message_num: self.allocate_message_num(),
        };
        self.poll_messages.insert(
            key.clone(),
            PollMessage::OneTime(OneTimeMessage {
                key: key.clone(),
                registrar_id,
                event_time,
                message: message.into(),
            }),
        );
        key
    }

    /// Inserts an autorenew series descriptor under a fresh serial
    /// number and returns its key.
    pub fn enqueue_autorenew(
        &mut self,
        parent: HistoryKey,
        registrar_id: RegistrarId,
        first_event_time: DateTime<Utc>,
        autorenew_end_time: DateTime<Utc>,
        target_id: impl Into<String>,
    ) -> PollMessageKey {
        let key = PollMessageKey {
            history: parent,
            message_num: self.allocate_message_num(),
        };
        self.poll_messages.insert(
            key.clone(),
            PollMessage::Autorenew(AutorenewMessage {
                key: key.clone(),
                registrar_id,
                event_time: first_event_time,
                autorenew_end_time,
                target_id: target_id.into(),
                message: "Domain was auto-renewed.".to_string(),
            }),
        );
        key
    }

    /// End-dates the domain's active autorenew poll series and its
    /// linked recurring billing event. No-op if neither is active.
    pub fn end_date_autorenew(&mut self, fqdn: &str, end: DateTime<Utc>) {
        let open = end_of_time();
        for message in self.poll_messages.values_mut() {
            if let PollMessage::Autorenew(series) = message
                && series.target_id == fqdn
                && series.autorenew_end_time == open
            {
                series.autorenew_end_time = end;
            }
        }
        for event in &mut self.billing_events {
            if let BillingEvent::Recurring(recurring) = event
                && recurring.target_id == fqdn
                && recurring.recurrence_end_time == open
            {
                recurring.recurrence_end_time = end;
            }
        }
    }

    /// Registers a domain with its initial auto-renewing regime: the
    /// creation history entry, the sponsor's autorenew poll series, and
    /// the linked recurring billing event.
    ///
    /// Registration flows proper (pricing, contacts, DNS) live outside
    /// this crate; embedding code and tests call this to seed state.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if a domain with the repo id exists.
    pub fn register_domain(
        &mut self,
        repo_id: RepoId,
        fqdn: impl Into<String>,
        sponsor: RegistrarId,
        created_at: DateTime<Utc>,
        registration_expiration: DateTime<Utc>,
    ) -> Result<RepoId, RegistryError> {
        if self.domains.contains_key(&repo_id) {
            return Err(RegistryError::InvalidRequest(format!(
                "domain {repo_id} already exists"
            )));
        }
        let fqdn = fqdn.into();
        let revision = self.allocate_history_revision();
        let create_history = HistoryKey {
            resource_class: ResourceClass::Domain,
            repo_id: repo_id.clone(),
            revision,
        };

        let entry = DomainEntry {
            repo_id: repo_id.clone(),
            fqdn: fqdn.clone(),
            sponsor_registrar: sponsor.clone(),
            registration_expiration,
            created_at,
            last_modified_at: created_at,
            transfer_data: TransferData::none(),
            history: vec![HistoryEntry {
                revision,
                entry_type: HistoryType::DomainCreate,
                modification_time: created_at,
                acting_registrar: sponsor.clone(),
            }],
        };
        self.domains.insert(repo_id.clone(), entry);

        self.enqueue_autorenew(
            create_history.clone(),
            sponsor.clone(),
            registration_expiration,
            end_of_time(),
            fqdn.clone(),
        );
        self.billing_events
            .push(BillingEvent::Recurring(RecurringBillingEvent {
                id: BillingEventId::new(),
                reason: BillingReason::Renew,
                registrar_id: sponsor,
                target_id: fqdn,
                event_time: registration_expiration,
                recurrence_end_time: end_of_time(),
                parent: create_history,
            }));

        Ok(repo_id)
    }
}

/// Transactional in-memory store.
///
/// # Concurrency
///
/// - Reads run concurrently under the shared lock.
/// - Transactions serialize under the exclusive lock; each sees the
///   state left by the previous committer.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState::new()),
        }
    }

    /// Creates a store seeded with the given state.
    #[must_use]
    pub fn with_state(state: StoreState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// Runs a read-only closure against the current state.
    ///
    /// # Errors
    ///
    /// Propagates the closure's error unchanged.
    pub async fn read<T>(
        &self,
        f: impl FnOnce(&StoreState) -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
        let guard = self.state.read().await;
        f(&guard)
    }

    /// Runs a mutation closure as one atomic transaction.
    ///
    /// The closure operates on a copy of the state; the copy replaces
    /// the live state only when the closure returns `Ok`. On `Err` the
    /// copy is dropped and no mutation is observable.
    ///
    /// # Errors
    ///
    /// Propagates the closure's error unchanged.
    pub async fn transact<T>(
        &self,
        f: impl FnOnce(&mut StoreState) -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
        let mut guard = self.state.write().await;
        let mut draft = guard.clone();
        let result = f(&mut draft)?;
        *guard = draft;
        Ok(result)
    }
}
