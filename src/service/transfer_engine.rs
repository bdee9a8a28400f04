//! Transfer lifecycle engine: owns a domain's transfer negotiation.
//!
//! The engine has no scheduler. A pending transfer whose
//! automatic-resolve deadline has passed is committed lazily, the first
//! time any caller reads or mutates the transfer state. Every public
//! operation runs as one atomic store transaction; events are published
//! only after the transaction commits, and a failed resolution leaves
//! the transfer `Pending` for the next observer.

use std::sync::Arc;

use chrono::{DateTime, Months, Utc};
use serde::Serialize;

use crate::clock::Clock;
use crate::config::TransferPolicy;
use crate::domain::billing::{
    BillingEvent, BillingEventId, BillingReason, OneTimeBillingEvent, RecurringBillingEvent,
};
use crate::domain::history::{HistoryEntry, HistoryKey, HistoryType, RepoId, ResourceClass};
use crate::domain::poll_message::{PollMessage, end_of_time};
use crate::domain::transfer::{ServerApproveData, TransferData, TransferStatus};
use crate::domain::{EventBus, RegistrarId, RegistryEvent};
use crate::error::RegistryError;
use crate::store::{MemoryStore, StoreState};

const TRANSFER_REQUESTED_MSG: &str = "Transfer requested.";
const TRANSFER_APPROVED_MSG: &str = "Transfer approved.";
const TRANSFER_REJECTED_MSG: &str = "Transfer rejected.";
const TRANSFER_CANCELLED_MSG: &str = "Transfer cancelled.";

/// Snapshot of a domain's transfer state returned by engine operations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferView {
    /// Repo id of the domain.
    pub repo_id: RepoId,
    /// Fully-qualified domain name.
    pub fqdn: String,
    /// Current sponsoring registrar.
    pub sponsor_registrar: RegistrarId,
    /// Current registration expiration.
    pub registration_expiration: DateTime<Utc>,
    /// Transfer status.
    pub status: TransferStatus,
    /// Gaining side, if a transfer was ever requested.
    pub gaining_registrar: Option<RegistrarId>,
    /// Losing side, if a transfer was ever requested.
    pub losing_registrar: Option<RegistrarId>,
    /// When the transfer was requested.
    pub request_time: Option<DateTime<Utc>>,
    /// Deadline at which a pending transfer self-approves.
    pub automatic_resolve_time: Option<DateTime<Utc>>,
    /// When the transfer reached a terminal status.
    pub resolution_time: Option<DateTime<Utc>>,
}

impl TransferView {
    fn of(state: &StoreState, repo_id: &RepoId) -> Result<Self, RegistryError> {
        let domain = state.domain(repo_id)?;
        let transfer = &domain.transfer_data;
        Ok(Self {
            repo_id: domain.repo_id.clone(),
            fqdn: domain.fqdn.clone(),
            sponsor_registrar: domain.sponsor_registrar.clone(),
            registration_expiration: domain.registration_expiration,
            status: transfer.status,
            gaining_registrar: transfer.gaining_registrar.clone(),
            losing_registrar: transfer.losing_registrar.clone(),
            request_time: transfer.request_time,
            automatic_resolve_time: transfer.automatic_resolve_time,
            resolution_time: transfer.resolution_time,
        })
    }
}

/// State machine owning domain transfer negotiations.
#[derive(Debug, Clone)]
pub struct TransferEngine {
    store: Arc<MemoryStore>,
    clock: Arc<dyn Clock>,
    event_bus: EventBus,
    policy: TransferPolicy,
}

impl TransferEngine {
    /// Creates a new `TransferEngine`.
    #[must_use]
    pub fn new(
        store: Arc<MemoryStore>,
        clock: Arc<dyn Clock>,
        event_bus: EventBus,
        policy: TransferPolicy,
    ) -> Self {
        Self {
            store,
            clock,
            event_bus,
            policy,
        }
    }

    /// Opens a transfer negotiation: the domain enters `Pending`, the
    /// losing registrar is notified immediately, and implicit-approval
    /// notices are scheduled at the automatic-resolve deadline for both
    /// registrars.
    ///
    /// # Errors
    ///
    /// `DomainNotFound`, `TransferAlreadyPending` while a negotiation is
    /// open, or `InvalidRequest` when the gaining registrar already
    /// sponsors the domain.
    pub async fn request(
        &self,
        repo_id: &RepoId,
        gaining: &RegistrarId,
    ) -> Result<TransferView, RegistryError> {
        let now = self.clock.now();
        let policy = self.policy.clone();
        let repo = repo_id.clone();
        let gaining = gaining.clone();

        let (view, events) = self
            .store
            .transact(move |state| {
                let mut events = Vec::new();
                if let Some(event) = resolve_if_due(state, &repo, now)? {
                    events.push(event);
                }

                let domain = state.domain(&repo)?;
                if domain.transfer_data.status.is_pending() {
                    return Err(RegistryError::TransferAlreadyPending(repo.to_string()));
                }
                if domain.sponsor_registrar == gaining {
                    return Err(RegistryError::InvalidRequest(format!(
                        "domain {repo} is already sponsored by {gaining}"
                    )));
                }
                let losing = domain.sponsor_registrar.clone();
                let current_expiration = domain.registration_expiration;

                let automatic_resolve_time = now + policy.automatic_transfer_length;
                let new_expiration_time = current_expiration
                    .checked_add_months(Months::new(12 * policy.extension_years))
                    .ok_or_else(|| {
                        RegistryError::Internal("expiration overflow on transfer".to_string())
                    })?;

                let revision = state.allocate_history_revision();
                let history = HistoryKey {
                    resource_class: ResourceClass::Domain,
                    repo_id: repo.clone(),
                    revision,
                };

                state.enqueue_one_time(
                    history.clone(),
                    losing.clone(),
                    now,
                    TRANSFER_REQUESTED_MSG,
                );
                let gaining_notice = state.enqueue_one_time(
                    history.clone(),
                    gaining.clone(),
                    automatic_resolve_time,
                    TRANSFER_APPROVED_MSG,
                );
                let losing_notice = state.enqueue_one_time(
                    history.clone(),
                    losing.clone(),
                    automatic_resolve_time,
                    TRANSFER_APPROVED_MSG,
                );

                let domain = state.domain_mut(&repo)?;
                domain.transfer_data = TransferData {
                    status: TransferStatus::Pending,
                    request_time: Some(now),
                    automatic_resolve_time: Some(automatic_resolve_time),
                    resolution_time: None,
                    gaining_registrar: Some(gaining.clone()),
                    losing_registrar: Some(losing.clone()),
                    server_approve: Some(ServerApproveData {
                        new_expiration_time,
                        fee_cents: policy.fee_cents,
                        fee_billing_time: automatic_resolve_time,
                        scheduled_notice_keys: vec![gaining_notice, losing_notice],
                    }),
                };
                domain.last_modified_at = now;
                domain.history.push(HistoryEntry {
                    revision,
                    entry_type: HistoryType::TransferRequest,
                    modification_time: now,
                    acting_registrar: gaining.clone(),
                });

                events.push(RegistryEvent::TransferRequested {
                    repo_id: repo.clone(),
                    gaining_registrar: gaining,
                    losing_registrar: losing,
                    automatic_resolve_time,
                    timestamp: now,
                });
                Ok((TransferView::of(state, &repo)?, events))
            })
            .await?;

        tracing::info!(repo_id = %repo_id, "transfer requested");
        self.publish_all(events);
        Ok(view)
    }

    /// Explicitly approves the pending transfer.
    ///
    /// Approval by the gaining registrar commits `ServerApproved`;
    /// approval by the losing registrar commits `ClientApproved`. Both
    /// run the same commit path.
    ///
    /// # Errors
    ///
    /// `DomainNotFound`, `NoPendingTransfer` (including when the
    /// deadline already auto-resolved it), or
    /// `NotAuthorizedForTransfer` for third parties.
    pub async fn approve(
        &self,
        repo_id: &RepoId,
        acting: &RegistrarId,
    ) -> Result<TransferView, RegistryError> {
        let now = self.clock.now();
        let repo = repo_id.clone();
        let acting = acting.clone();

        let (view, events) = self
            .store
            .transact(move |state| {
                let mut events = Vec::new();
                if let Some(event) = resolve_if_due(state, &repo, now)? {
                    events.push(event);
                }

                let transfer = pending_transfer(state, &repo)?;
                let status = if Some(&acting) == transfer.gaining_registrar.as_ref() {
                    TransferStatus::ServerApproved
                } else if Some(&acting) == transfer.losing_registrar.as_ref() {
                    TransferStatus::ClientApproved
                } else {
                    return Err(RegistryError::NotAuthorizedForTransfer(acting.to_string()));
                };

                events.push(commit_approved(state, &repo, status, now, true, now, &acting)?);
                Ok((TransferView::of(state, &repo)?, events))
            })
            .await?;

        tracing::info!(repo_id = %repo_id, status = ?view.status, "transfer approved");
        self.publish_all(events);
        Ok(view)
    }

    /// Rejects the pending transfer (losing registrar only). The domain
    /// is left untouched apart from its history.
    ///
    /// # Errors
    ///
    /// `DomainNotFound`, `NoPendingTransfer`, or
    /// `NotAuthorizedForTransfer` when `acting` is not the losing side.
    pub async fn reject(
        &self,
        repo_id: &RepoId,
        acting: &RegistrarId,
    ) -> Result<TransferView, RegistryError> {
        self.void(repo_id, acting, TransferStatus::ClientRejected)
            .await
    }

    /// Cancels the pending transfer before resolution (losing registrar
    /// only); symmetric to [`TransferEngine::reject`].
    ///
    /// # Errors
    ///
    /// Same failure modes as [`TransferEngine::reject`].
    pub async fn cancel(
        &self,
        repo_id: &RepoId,
        acting: &RegistrarId,
    ) -> Result<TransferView, RegistryError> {
        self.void(repo_id, acting, TransferStatus::ClientCancelled)
            .await
    }

    /// Returns the current transfer state, committing a lazy resolution
    /// first if the deadline has passed. Re-observing an
    /// already-resolved transfer is a no-op.
    ///
    /// # Errors
    ///
    /// `DomainNotFound`.
    pub async fn current(&self, repo_id: &RepoId) -> Result<TransferView, RegistryError> {
        let now = self.clock.now();
        let repo = repo_id.clone();

        let (view, events) = self
            .store
            .transact(move |state| {
                let mut events = Vec::new();
                if let Some(event) = resolve_if_due(state, &repo, now)? {
                    events.push(event);
                }
                Ok((TransferView::of(state, &repo)?, events))
            })
            .await?;

        self.publish_all(events);
        Ok(view)
    }

    async fn void(
        &self,
        repo_id: &RepoId,
        acting: &RegistrarId,
        status: TransferStatus,
    ) -> Result<TransferView, RegistryError> {
        let now = self.clock.now();
        let repo = repo_id.clone();
        let acting = acting.clone();

        let (view, events) = self
            .store
            .transact(move |state| {
                let mut events = Vec::new();
                if let Some(event) = resolve_if_due(state, &repo, now)? {
                    events.push(event);
                }

                let transfer = pending_transfer(state, &repo)?;
                if Some(&acting) != transfer.losing_registrar.as_ref() {
                    return Err(RegistryError::NotAuthorizedForTransfer(acting.to_string()));
                }

                events.push(void_pending(state, &repo, status, now, &acting)?);
                Ok((TransferView::of(state, &repo)?, events))
            })
            .await?;

        tracing::info!(repo_id = %repo_id, status = ?status, "transfer voided");
        self.publish_all(events);
        Ok(view)
    }

    fn publish_all(&self, events: Vec<RegistryEvent>) {
        for event in events {
            self.event_bus.publish(event);
        }
    }
}

/// Returns the pending transfer data or fails with `NoPendingTransfer`.
fn pending_transfer<'a>(
    state: &'a StoreState,
    repo_id: &RepoId,
) -> Result<&'a TransferData, RegistryError> {
    let domain = state.domain(repo_id)?;
    if !domain.transfer_data.status.is_pending() {
        return Err(RegistryError::NoPendingTransfer(repo_id.to_string()));
    }
    Ok(&domain.transfer_data)
}

/// Observe-and-possibly-resolve: commits `ServerApproved` when a
/// pending transfer's deadline has been reached (boundary inclusive).
/// Idempotent — resolved transfers pass through untouched.
fn resolve_if_due(
    state: &mut StoreState,
    repo_id: &RepoId,
    now: DateTime<Utc>,
) -> Result<Option<RegistryEvent>, RegistryError> {
    let Some(domain) = state.domains.get(repo_id) else {
        return Ok(None);
    };
    let transfer = &domain.transfer_data;
    if !transfer.status.is_pending() {
        return Ok(None);
    }
    let Some(deadline) = transfer.automatic_resolve_time else {
        return Ok(None);
    };
    if now < deadline {
        return Ok(None);
    }
    let acting = transfer
        .gaining_registrar
        .clone()
        .ok_or_else(|| RegistryError::Internal("pending transfer without parties".to_string()))?;
    // The transfer completed itself at the deadline, regardless of when
    // it was observed; the scheduled notices have fired and stand as
    // the notification.
    let event = commit_approved(
        state,
        repo_id,
        TransferStatus::ServerApproved,
        deadline,
        false,
        now,
        &acting,
    )?;
    Ok(Some(event))
}

/// Commits an approved transfer: sponsorship, expiration, autorenew
/// regime handover, billing, notices, and the frozen transfer record.
#[allow(clippy::too_many_arguments)]
fn commit_approved(
    state: &mut StoreState,
    repo_id: &RepoId,
    status: TransferStatus,
    resolved_at: DateTime<Utc>,
    explicit: bool,
    now: DateTime<Utc>,
    acting: &RegistrarId,
) -> Result<RegistryEvent, RegistryError> {
    let domain = state.domain(repo_id)?;
    let fqdn = domain.fqdn.clone();
    let transfer = domain.transfer_data.clone();
    let (Some(gaining), Some(losing)) = (
        transfer.gaining_registrar.clone(),
        transfer.losing_registrar.clone(),
    ) else {
        return Err(RegistryError::Internal(
            "pending transfer without parties".to_string(),
        ));
    };
    let speculative = transfer.server_approve.ok_or_else(|| {
        RegistryError::Internal("pending transfer without speculative data".to_string())
    })?;

    let revision = state.allocate_history_revision();
    let history = HistoryKey {
        resource_class: ResourceClass::Domain,
        repo_id: repo_id.clone(),
        revision,
    };

    // Hand the auto-renewing regime over to the gaining registrar.
    state.end_date_autorenew(&fqdn, resolved_at);
    state.enqueue_autorenew(
        history.clone(),
        gaining.clone(),
        speculative.new_expiration_time,
        end_of_time(),
        fqdn.clone(),
    );
    state
        .billing_events
        .push(BillingEvent::Recurring(RecurringBillingEvent {
            id: BillingEventId::new(),
            reason: BillingReason::Renew,
            registrar_id: gaining.clone(),
            target_id: fqdn.clone(),
            event_time: speculative.new_expiration_time,
            recurrence_end_time: end_of_time(),
            parent: history.clone(),
        }));
    state
        .billing_events
        .push(BillingEvent::OneTime(OneTimeBillingEvent {
            id: BillingEventId::new(),
            reason: BillingReason::Transfer,
            registrar_id: gaining.clone(),
            target_id: fqdn.clone(),
            event_time: resolved_at,
            billing_time: speculative.fee_billing_time,
            cost_cents: speculative.fee_cents,
            parent: history.clone(),
        }));

    if explicit {
        withdraw_unfired_notices(state, &speculative.scheduled_notice_keys, now);
        state.enqueue_one_time(history.clone(), gaining.clone(), now, TRANSFER_APPROVED_MSG);
        state.enqueue_one_time(history.clone(), losing.clone(), now, TRANSFER_APPROVED_MSG);
    }

    let domain = state.domain_mut(repo_id)?;
    domain.sponsor_registrar = gaining.clone();
    domain.registration_expiration = speculative.new_expiration_time;
    domain.last_modified_at = now;
    domain.transfer_data.status = status;
    domain.transfer_data.resolution_time = Some(resolved_at);
    domain.transfer_data.server_approve = None;
    domain.history.push(HistoryEntry {
        revision,
        entry_type: HistoryType::TransferApproved,
        modification_time: resolved_at,
        acting_registrar: acting.clone(),
    });

    Ok(RegistryEvent::TransferResolved {
        repo_id: repo_id.clone(),
        status,
        gaining_registrar: gaining,
        losing_registrar: losing,
        timestamp: resolved_at,
    })
}

/// Voids a pending transfer: speculative data discarded, unfired
/// notices withdrawn, counterparty notified, domain otherwise untouched.
fn void_pending(
    state: &mut StoreState,
    repo_id: &RepoId,
    status: TransferStatus,
    now: DateTime<Utc>,
    acting: &RegistrarId,
) -> Result<RegistryEvent, RegistryError> {
    let domain = state.domain(repo_id)?;
    let transfer = domain.transfer_data.clone();
    let (Some(gaining), Some(losing)) = (
        transfer.gaining_registrar.clone(),
        transfer.losing_registrar.clone(),
    ) else {
        return Err(RegistryError::Internal(
            "pending transfer without parties".to_string(),
        ));
    };
    let speculative = transfer.server_approve.ok_or_else(|| {
        RegistryError::Internal("pending transfer without speculative data".to_string())
    })?;

    let revision = state.allocate_history_revision();
    let history = HistoryKey {
        resource_class: ResourceClass::Domain,
        repo_id: repo_id.clone(),
        revision,
    };

    withdraw_unfired_notices(state, &speculative.scheduled_notice_keys, now);
    let notice = match status {
        TransferStatus::ClientCancelled => TRANSFER_CANCELLED_MSG,
        _ => TRANSFER_REJECTED_MSG,
    };
    state.enqueue_one_time(history, gaining.clone(), now, notice);

    let entry_type = match status {
        TransferStatus::ClientCancelled => HistoryType::TransferCancelled,
        _ => HistoryType::TransferRejected,
    };
    let domain = state.domain_mut(repo_id)?;
    domain.last_modified_at = now;
    domain.transfer_data.status = status;
    domain.transfer_data.resolution_time = Some(now);
    domain.transfer_data.server_approve = None;
    domain.history.push(HistoryEntry {
        revision,
        entry_type,
        modification_time: now,
        acting_registrar: acting.clone(),
    });

    Ok(RegistryEvent::TransferResolved {
        repo_id: repo_id.clone(),
        status,
        gaining_registrar: gaining,
        losing_registrar: losing,
        timestamp: now,
    })
}

/// Deletes scheduled notices that have not become visible yet.
fn withdraw_unfired_notices(
    state: &mut StoreState,
    keys: &[crate::domain::poll_message::PollMessageKey],
    now: DateTime<Utc>,
) {
    for key in keys {
        let unfired = matches!(
            state.poll_messages.get(key),
            Some(PollMessage::OneTime(notice)) if notice.event_time > now
        );
        if unfired {
            state.poll_messages.remove(key);
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use chrono::Duration;

    const REQUEST_TIME: &str = "2000-06-06T22:00:00Z";
    const EXPIRATION: &str = "2001-09-08T22:00:00Z";

    fn ts(s: &str) -> DateTime<Utc> {
        let Ok(dt) = s.parse::<DateTime<Utc>>() else {
            panic!("valid timestamp: {s}");
        };
        dt
    }

    fn gaining() -> RegistrarId {
        RegistrarId::from("NewRegistrar")
    }

    fn losing() -> RegistrarId {
        RegistrarId::from("TheRegistrar")
    }

    fn setup() -> (TransferEngine, Arc<MemoryStore>, Arc<FakeClock>, RepoId) {
        let mut state = StoreState::new();
        let repo = RepoId::new(3, "EXAMPLE");
        let Ok(_) = state.register_domain(
            repo.clone(),
            "test.example",
            losing(),
            ts("1999-04-03T22:00:00Z"),
            ts(EXPIRATION),
        ) else {
            panic!("seed domain");
        };
        let store = Arc::new(MemoryStore::with_state(state));
        let clock = Arc::new(FakeClock::new(ts(REQUEST_TIME)));
        let engine = TransferEngine::new(
            Arc::clone(&store),
            Arc::clone(&clock) as Arc<dyn Clock>,
            EventBus::new(100),
            TransferPolicy::default(),
        );
        (engine, store, clock, repo)
    }

    async fn poll_message_count(store: &MemoryStore) -> usize {
        let Ok(count) = store.read(|state| Ok(state.poll_messages.len())).await else {
            panic!("read store");
        };
        count
    }

    #[tokio::test]
    async fn request_creates_pending_with_speculative_data() {
        let (engine, store, _, repo) = setup();
        let Ok(view) = engine.request(&repo, &gaining()).await else {
            panic!("request failed");
        };
        assert_eq!(view.status, TransferStatus::Pending);
        assert_eq!(view.request_time, Some(ts(REQUEST_TIME)));
        assert_eq!(
            view.automatic_resolve_time,
            Some(ts(REQUEST_TIME) + Duration::days(5))
        );
        // Domain itself is untouched while pending.
        assert_eq!(view.sponsor_registrar, losing());
        assert_eq!(view.registration_expiration, ts(EXPIRATION));

        let Ok(speculative) = store
            .read(|state| {
                Ok(state
                    .domain(&repo)?
                    .transfer_data
                    .server_approve
                    .clone())
            })
            .await
        else {
            panic!("read store");
        };
        let Some(speculative) = speculative else {
            panic!("pending transfer must carry speculative data");
        };
        assert_eq!(speculative.new_expiration_time, ts("2002-09-08T22:00:00Z"));
        assert_eq!(speculative.scheduled_notice_keys.len(), 2);

        // Initial autorenew series + request notice + two scheduled notices.
        assert_eq!(poll_message_count(&store).await, 4);
    }

    #[tokio::test]
    async fn request_emits_event() {
        let (engine, _, _, repo) = setup();
        let mut rx = engine.event_bus.subscribe();
        let Ok(_) = engine.request(&repo, &gaining()).await else {
            panic!("request failed");
        };
        let Ok(event) = rx.recv().await else {
            panic!("expected event");
        };
        assert_eq!(event.event_type_str(), "transfer_requested");
    }

    #[tokio::test]
    async fn request_while_pending_is_rejected() {
        let (engine, _, _, repo) = setup();
        let Ok(_) = engine.request(&repo, &gaining()).await else {
            panic!("request failed");
        };
        let second = engine.request(&repo, &RegistrarId::from("ClientZ")).await;
        assert!(matches!(
            second,
            Err(RegistryError::TransferAlreadyPending(_))
        ));
    }

    #[tokio::test]
    async fn request_by_current_sponsor_is_invalid() {
        let (engine, _, _, repo) = setup();
        let result = engine.request(&repo, &losing()).await;
        assert!(matches!(result, Err(RegistryError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn gaining_side_approve_commits_server_approved() {
        let (engine, store, clock, repo) = setup();
        let Ok(_) = engine.request(&repo, &gaining()).await else {
            panic!("request failed");
        };
        clock.advance(Duration::days(3));

        let Ok(view) = engine.approve(&repo, &gaining()).await else {
            panic!("approve failed");
        };
        assert_eq!(view.status, TransferStatus::ServerApproved);
        assert_eq!(view.sponsor_registrar, gaining());
        assert_eq!(view.registration_expiration, ts("2002-09-08T22:00:00Z"));
        assert_eq!(view.resolution_time, Some(clock.now()));

        let Ok((speculative_cleared, fee, old_series_end, gaining_series)) = store
            .read(|state| {
                let domain = state.domain(&repo)?;
                let fee = state.billing_events.iter().find_map(|event| match event {
                    BillingEvent::OneTime(one_time) => Some(one_time.clone()),
                    BillingEvent::Recurring(_) => None,
                });
                let mut old_end = None;
                let mut gaining_series = false;
                for message in state.poll_messages.values() {
                    if let PollMessage::Autorenew(series) = message {
                        if series.registrar_id == RegistrarId::from("TheRegistrar") {
                            old_end = Some(series.autorenew_end_time);
                        } else {
                            gaining_series = series.autorenew_end_time == end_of_time();
                        }
                    }
                }
                Ok((
                    domain.transfer_data.server_approve.is_none(),
                    fee,
                    old_end,
                    gaining_series,
                ))
            })
            .await
        else {
            panic!("read store");
        };
        assert!(speculative_cleared, "speculative fields must be nulled");
        let Some(fee) = fee else {
            panic!("transfer fee billing event must exist");
        };
        assert_eq!(fee.reason, BillingReason::Transfer);
        assert_eq!(fee.registrar_id, gaining());
        // Fee bills at the original deadline even when approved early.
        assert_eq!(fee.billing_time, ts(REQUEST_TIME) + Duration::days(5));
        // Prior regime end-dated at the approval time (earlier than the
        // deadline), new open-ended series activated for the gaining side.
        assert_eq!(old_series_end, Some(clock.now()));
        assert!(gaining_series);

        // Unfired scheduled notices were withdrawn and replaced by two
        // immediate approval notices; plus the new autorenew series:
        // old series + request notice + 2 approvals + new series.
        assert_eq!(poll_message_count(&store).await, 5);
    }

    #[tokio::test]
    async fn losing_side_approve_commits_client_approved() {
        let (engine, _, clock, repo) = setup();
        let Ok(_) = engine.request(&repo, &gaining()).await else {
            panic!("request failed");
        };
        clock.advance(Duration::days(1));
        let Ok(view) = engine.approve(&repo, &losing()).await else {
            panic!("approve failed");
        };
        assert_eq!(view.status, TransferStatus::ClientApproved);
        assert_eq!(view.sponsor_registrar, gaining());
    }

    #[tokio::test]
    async fn third_party_approve_is_not_authorized() {
        let (engine, _, _, repo) = setup();
        let Ok(_) = engine.request(&repo, &gaining()).await else {
            panic!("request failed");
        };
        let result = engine.approve(&repo, &RegistrarId::from("ClientZ")).await;
        assert!(matches!(
            result,
            Err(RegistryError::NotAuthorizedForTransfer(_))
        ));
    }

    #[tokio::test]
    async fn reject_discards_speculative_state_and_leaves_domain() {
        let (engine, store, clock, repo) = setup();
        let Ok(_) = engine.request(&repo, &gaining()).await else {
            panic!("request failed");
        };
        clock.advance(Duration::days(2));

        let Ok(view) = engine.reject(&repo, &losing()).await else {
            panic!("reject failed");
        };
        assert_eq!(view.status, TransferStatus::ClientRejected);
        assert_eq!(view.sponsor_registrar, losing());
        assert_eq!(view.registration_expiration, ts(EXPIRATION));
        assert_eq!(view.resolution_time, Some(clock.now()));

        let Ok((speculative_cleared, billing_count)) = store
            .read(|state| {
                Ok((
                    state.domain(&repo)?.transfer_data.server_approve.is_none(),
                    state.billing_events.len(),
                ))
            })
            .await
        else {
            panic!("read store");
        };
        assert!(speculative_cleared);
        // Only the registration-time recurring event; no transfer fee.
        assert_eq!(billing_count, 1);

        // Old series + request notice + rejection notice; scheduled
        // notices withdrawn.
        assert_eq!(poll_message_count(&store).await, 3);
    }

    #[tokio::test]
    async fn cancel_is_symmetric_to_reject() {
        let (engine, _, _, repo) = setup();
        let Ok(_) = engine.request(&repo, &gaining()).await else {
            panic!("request failed");
        };
        let Ok(view) = engine.cancel(&repo, &losing()).await else {
            panic!("cancel failed");
        };
        assert_eq!(view.status, TransferStatus::ClientCancelled);
        assert_eq!(view.sponsor_registrar, losing());
    }

    #[tokio::test]
    async fn reject_by_gaining_side_is_not_authorized() {
        let (engine, _, _, repo) = setup();
        let Ok(_) = engine.request(&repo, &gaining()).await else {
            panic!("request failed");
        };
        let result = engine.reject(&repo, &gaining()).await;
        assert!(matches!(
            result,
            Err(RegistryError::NotAuthorizedForTransfer(_))
        ));
    }

    #[tokio::test]
    async fn pending_transfer_resolves_lazily_at_the_deadline() {
        let (engine, store, clock, repo) = setup();
        let Ok(requested) = engine.request(&repo, &gaining()).await else {
            panic!("request failed");
        };
        let Some(deadline) = requested.automatic_resolve_time else {
            panic!("pending transfer must carry a deadline");
        };

        // One millisecond before the deadline: still pending.
        clock.set(deadline - Duration::milliseconds(1));
        let Ok(still_pending) = engine.current(&repo).await else {
            panic!("current failed");
        };
        assert_eq!(still_pending.status, TransferStatus::Pending);

        // Exactly at the deadline: boundary is inclusive.
        clock.set(deadline);
        let Ok(resolved) = engine.current(&repo).await else {
            panic!("current failed");
        };
        assert_eq!(resolved.status, TransferStatus::ServerApproved);
        assert_eq!(resolved.resolution_time, Some(deadline));
        assert_eq!(resolved.sponsor_registrar, gaining());

        // Scheduled notices stand as the notification; nothing new is
        // queued: old series + request notice + 2 fired notices + new
        // series.
        assert_eq!(poll_message_count(&store).await, 5);
    }

    #[tokio::test]
    async fn reobserving_a_resolved_transfer_is_a_noop() {
        let (engine, store, clock, repo) = setup();
        let Ok(_) = engine.request(&repo, &gaining()).await else {
            panic!("request failed");
        };
        clock.advance(Duration::days(7));

        let Ok(first) = engine.current(&repo).await else {
            panic!("current failed");
        };
        let Ok(billing_after_first) = store.read(|state| Ok(state.billing_events.len())).await
        else {
            panic!("read store");
        };

        clock.advance(Duration::days(30));
        let Ok(second) = engine.current(&repo).await else {
            panic!("current failed");
        };
        let Ok(billing_after_second) = store.read(|state| Ok(state.billing_events.len())).await
        else {
            panic!("read store");
        };

        assert_eq!(first, second);
        assert_eq!(billing_after_first, billing_after_second);
    }

    #[tokio::test]
    async fn explicit_action_after_deadline_finds_no_pending_transfer() {
        let (engine, _, clock, repo) = setup();
        let Ok(_) = engine.request(&repo, &gaining()).await else {
            panic!("request failed");
        };
        clock.advance(Duration::days(6));

        // The deadline already auto-resolved the transfer; the explicit
        // approval arrives too late.
        let result = engine.approve(&repo, &gaining()).await;
        assert!(matches!(result, Err(RegistryError::NoPendingTransfer(_))));
    }

    #[tokio::test]
    async fn terminal_states_are_absorbing() {
        let (engine, _, _, repo) = setup();
        let Ok(_) = engine.request(&repo, &gaining()).await else {
            panic!("request failed");
        };
        let Ok(_) = engine.reject(&repo, &losing()).await else {
            panic!("reject failed");
        };
        for result in [
            engine.approve(&repo, &gaining()).await,
            engine.reject(&repo, &losing()).await,
            engine.cancel(&repo, &losing()).await,
        ] {
            assert!(matches!(result, Err(RegistryError::NoPendingTransfer(_))));
        }
    }
}
