//! Poll-message queue: per-registrar view of pending notifications.
//!
//! The queue merges materialized one-time messages with virtual
//! instances computed from autorenew descriptors. Nothing is cached:
//! each enumeration recomputes the visible instances, which stays cheap
//! because a descriptor contributes at most one instance per elapsed
//! year. The free functions operate on [`StoreState`] so that the ack
//! handler can reuse them inside its own transaction; [`PollQueue`] is
//! the read-side service wrapper.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use crate::clock::Clock;
use crate::domain::message_id::MessageId;
use crate::domain::poll_message::{PollMessage, PollMessageKey};
use crate::domain::RegistrarId;
use crate::error::RegistryError;
use crate::store::{MemoryStore, StoreState};

/// One visible queue entry: a materialized message or a virtual
/// autorenew instance.
#[derive(Debug, Clone, Serialize)]
pub struct QueueItem {
    /// External id addressing exactly this instance.
    pub id: MessageId,
    /// Event time of the instance.
    pub event_time: DateTime<Utc>,
    /// Human-readable body.
    pub message: String,
}

/// Enumerates every message visible to `registrar_id` at `as_of`,
/// sorted ascending by event time with a stable `(serial, year)`
/// tiebreak.
///
/// Finite for any fixed `as_of`: one-time messages are filtered by
/// event time and each autorenew series contributes at most one
/// instance per elapsed year.
#[must_use]
pub fn enumerate(
    state: &StoreState,
    registrar_id: &RegistrarId,
    as_of: DateTime<Utc>,
) -> Vec<QueueItem> {
    let mut items = Vec::new();
    for message in state.poll_messages.values() {
        if message.registrar_id() != registrar_id {
            continue;
        }
        match message {
            PollMessage::OneTime(one_time) => {
                if one_time.event_time <= as_of {
                    items.push(QueueItem {
                        id: MessageId::new(
                            one_time.key.history.clone(),
                            one_time.key.message_num,
                            one_time.event_time.year(),
                        ),
                        event_time: one_time.event_time,
                        message: one_time.message.clone(),
                    });
                }
            }
            PollMessage::Autorenew(series) => {
                for occurrence in series.occurrences_up_to(as_of) {
                    items.push(QueueItem {
                        id: MessageId::new(
                            series.key.history.clone(),
                            series.key.message_num,
                            occurrence.year(),
                        ),
                        event_time: occurrence,
                        message: series.message.clone(),
                    });
                }
            }
        }
    }
    items.sort_by(|a, b| {
        (a.event_time, a.id.message_num, a.id.year).cmp(&(b.event_time, b.id.message_num, b.id.year))
    });
    items
}

/// Counts the messages visible to `registrar_id` at `as_of`.
///
/// Always equals `enumerate(..).len()`.
#[must_use]
pub fn count(state: &StoreState, registrar_id: &RegistrarId, as_of: DateTime<Utc>) -> usize {
    enumerate(state, registrar_id, as_of).len()
}

/// Resolves an external id to the concrete message record it addresses.
///
/// For a one-time message the id's year must match the event-time year;
/// for an autorenew series the year must select an instance inside
/// `[first_event, min(now, end)]`. Ownership is *not* checked here —
/// the caller distinguishes authorization failures from absence.
///
/// # Errors
///
/// Returns [`RegistryError::MessageDoesNotExist`] (with the original id
/// embedded) when no matching instance is addressable.
pub fn resolve(
    state: &StoreState,
    id: &MessageId,
    now: DateTime<Utc>,
) -> Result<PollMessage, RegistryError> {
    let missing = || RegistryError::MessageDoesNotExist(id.to_string());
    let key = PollMessageKey {
        history: id.history.clone(),
        message_num: id.message_num,
    };
    let message = state.poll_messages.get(&key).ok_or_else(missing)?;
    match message {
        PollMessage::OneTime(one_time) => {
            if one_time.event_time.year() != id.year {
                return Err(missing());
            }
        }
        PollMessage::Autorenew(series) => {
            if series.occurrence_in_year(id.year, now).is_none() {
                return Err(missing());
            }
        }
    }
    Ok(message.clone())
}

/// Acknowledges the instance addressed by `id`.
///
/// A one-time message is deleted. A virtual autorenew instance needs no
/// storage change: it was never materialized, and later occurrences of
/// the same series keep appearing in subsequent enumerations.
pub fn acknowledge(state: &mut StoreState, id: &MessageId) {
    let key = PollMessageKey {
        history: id.history.clone(),
        message_num: id.message_num,
    };
    if matches!(state.poll_messages.get(&key), Some(PollMessage::OneTime(_))) {
        state.poll_messages.remove(&key);
    }
}

/// Read-side queue service.
#[derive(Debug, Clone)]
pub struct PollQueue {
    store: Arc<MemoryStore>,
    clock: Arc<dyn Clock>,
}

impl PollQueue {
    /// Creates a new `PollQueue`.
    #[must_use]
    pub fn new(store: Arc<MemoryStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Lists the registrar's visible messages, at `as_of` or now.
    ///
    /// # Errors
    ///
    /// Currently infallible beyond store access; kept fallible for
    /// parity with durable store implementations.
    pub async fn list(
        &self,
        registrar_id: &RegistrarId,
        as_of: Option<DateTime<Utc>>,
    ) -> Result<Vec<QueueItem>, RegistryError> {
        let as_of = as_of.unwrap_or_else(|| self.clock.now());
        self.store
            .read(|state| Ok(enumerate(state, registrar_id, as_of)))
            .await
    }

    /// Counts the registrar's visible messages, at `as_of` or now.
    ///
    /// # Errors
    ///
    /// Currently infallible beyond store access; see [`PollQueue::list`].
    pub async fn count(
        &self,
        registrar_id: &RegistrarId,
        as_of: Option<DateTime<Utc>>,
    ) -> Result<usize, RegistryError> {
        let as_of = as_of.unwrap_or_else(|| self.clock.now());
        self.store
            .read(|state| Ok(count(state, registrar_id, as_of)))
            .await
    }
}
