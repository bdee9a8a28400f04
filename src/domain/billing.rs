//! Billing events emitted by transfer resolution and renewal flows.
//!
//! One-time events record a single charge (e.g. the transfer fee);
//! recurring events describe the annual autorenewal charge series and
//! are linked 1:1 with the domain's current autorenew poll series.
//! Billing events are never mutated after creation, except that a
//! recurring event is end-dated when a later series supersedes it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::RegistrarId;
use super::history::HistoryKey;

/// Unique identifier for a billing event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BillingEventId(Uuid);

impl BillingEventId {
    /// Creates a new random `BillingEventId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BillingEventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BillingEventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a billing event was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingReason {
    /// Charge for a completed transfer.
    Transfer,
    /// Annual renewal charge (autorenew series).
    Renew,
}

/// A single charge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneTimeBillingEvent {
    /// Event identifier.
    pub id: BillingEventId,
    /// Why the charge exists.
    pub reason: BillingReason,
    /// Registrar that will be billed.
    pub registrar_id: RegistrarId,
    /// Fully-qualified name of the charged domain.
    pub target_id: String,
    /// When the billable event happened.
    pub event_time: DateTime<Utc>,
    /// When the charge becomes billable (may trail the event).
    pub billing_time: DateTime<Utc>,
    /// Charge amount in cents.
    pub cost_cents: u64,
    /// History record the event hangs off.
    pub parent: HistoryKey,
}

/// Descriptor for an annual autorenewal charge series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringBillingEvent {
    /// Event identifier.
    pub id: BillingEventId,
    /// Why the series exists; always a renewal reason today.
    pub reason: BillingReason,
    /// Registrar that will be billed each year.
    pub registrar_id: RegistrarId,
    /// Fully-qualified name of the charged domain.
    pub target_id: String,
    /// First charge of the series.
    pub event_time: DateTime<Utc>,
    /// End of the recurrence; `end_of_time()` while active.
    pub recurrence_end_time: DateTime<Utc>,
    /// History record the event hangs off.
    pub parent: HistoryKey,
}

/// A billing record: single charge or annual series descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BillingEvent {
    /// A single charge.
    OneTime(OneTimeBillingEvent),
    /// An annual charge series.
    Recurring(RecurringBillingEvent),
}

impl BillingEvent {
    /// Registrar that will be billed.
    #[must_use]
    pub fn registrar_id(&self) -> &RegistrarId {
        match self {
            Self::OneTime(e) => &e.registrar_id,
            Self::Recurring(e) => &e.registrar_id,
        }
    }

    /// Fully-qualified name of the charged domain.
    #[must_use]
    pub fn target_id(&self) -> &str {
        match self {
            Self::OneTime(e) => &e.target_id,
            Self::Recurring(e) => &e.target_id,
        }
    }
}
