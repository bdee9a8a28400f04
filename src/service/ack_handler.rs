//! Poll-message acknowledgement protocol.
//!
//! Validation runs in a fixed order so that each failure maps to one
//! protocol error: missing id, malformed id, unresolvable id, then
//! ownership. Only after all checks pass is the message consumed, and
//! the whole ack runs as one store transaction — a failing step leaves
//! the queue exactly as it was.

use std::sync::Arc;

use serde::Serialize;

use crate::clock::Clock;
use crate::domain::message_id::MessageId;
use crate::domain::poll_message::PollMessage;
use crate::domain::{EventBus, RegistrarId, RegistryEvent};
use crate::error::RegistryError;
use crate::service::poll_queue;
use crate::store::{MemoryStore, StoreState};

/// Result of a successful acknowledgement.
#[derive(Debug, Clone, Serialize)]
pub struct AckOutcome {
    /// The id that was acknowledged, echoed back.
    pub acked_id: MessageId,
    /// Messages still visible to the registrar after this ack.
    pub remaining_count: usize,
}

/// Acknowledgement service.
#[derive(Debug, Clone)]
pub struct AckHandler {
    store: Arc<MemoryStore>,
    clock: Arc<dyn Clock>,
    event_bus: EventBus,
}

impl AckHandler {
    /// Creates a new `AckHandler`.
    #[must_use]
    pub fn new(store: Arc<MemoryStore>, clock: Arc<dyn Clock>, event_bus: EventBus) -> Self {
        Self {
            store,
            clock,
            event_bus,
        }
    }

    /// Acknowledges the message addressed by `raw_id` on behalf of
    /// `registrar_id` and reports how many messages remain queued.
    ///
    /// A one-time message is deleted; a virtual autorenew instance is
    /// consumed without a storage write (the series keeps producing
    /// later years). The remaining count never includes the instance
    /// just acknowledged.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::MissingMessageId`] when `raw_id` is absent
    ///   or empty.
    /// - [`RegistryError::InvalidMessageId`] when it does not parse.
    /// - [`RegistryError::MessageDoesNotExist`] when no instance is
    ///   addressable by the id at the current time.
    /// - [`RegistryError::NotAuthorizedToAckMessage`] when the message
    ///   belongs to another registrar.
    pub async fn acknowledge(
        &self,
        registrar_id: &RegistrarId,
        raw_id: Option<&str>,
    ) -> Result<AckOutcome, RegistryError> {
        let now = self.clock.now();
        let registrar = registrar_id.clone();
        let raw_id = raw_id.map(str::to_string);

        let outcome = self
            .store
            .transact(move |state| {
                let id = validate(state, &registrar, raw_id.as_deref(), now)?;
                poll_queue::acknowledge(state, &id);
                let remaining_count = remaining_after(state, &registrar, &id, now);
                Ok(AckOutcome {
                    acked_id: id,
                    remaining_count,
                })
            })
            .await?;

        tracing::info!(
            registrar_id = %registrar_id,
            message_id = %outcome.acked_id,
            remaining = outcome.remaining_count,
            "poll message acknowledged"
        );
        self.event_bus.publish(RegistryEvent::PollMessageAcked {
            registrar_id: registrar_id.clone(),
            message_id: outcome.acked_id.to_string(),
            remaining_count: outcome.remaining_count,
            timestamp: now,
        });
        Ok(outcome)
    }

    /// Runs every acknowledgement check without consuming the message.
    ///
    /// The reported remaining count is what a real ack would leave
    /// behind.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`AckHandler::acknowledge`].
    pub async fn dry_run(
        &self,
        registrar_id: &RegistrarId,
        raw_id: Option<&str>,
    ) -> Result<AckOutcome, RegistryError> {
        let now = self.clock.now();
        let registrar = registrar_id.clone();
        let raw_id = raw_id.map(str::to_string);

        self.store
            .read(move |state| {
                let id = validate(state, &registrar, raw_id.as_deref(), now)?;
                let remaining_count = remaining_after(state, &registrar, &id, now);
                Ok(AckOutcome {
                    acked_id: id,
                    remaining_count,
                })
            })
            .await
    }
}

/// Runs the acknowledgement checks in protocol order and returns the
/// parsed id on success.
fn validate(
    state: &StoreState,
    registrar_id: &RegistrarId,
    raw_id: Option<&str>,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<MessageId, RegistryError> {
    // An absent and an empty id are the same protocol failure, caught
    // before any format validation.
    let raw = raw_id.ok_or(RegistryError::MissingMessageId)?;
    if raw.is_empty() {
        return Err(RegistryError::MissingMessageId);
    }
    let id: MessageId = raw.parse()?;
    let message = poll_queue::resolve(state, &id, now)?;
    if message.registrar_id() != registrar_id {
        return Err(RegistryError::NotAuthorizedToAckMessage);
    }
    // A message scheduled in the future is not visible yet and cannot
    // be acknowledged, same as one that never existed.
    if let PollMessage::OneTime(one_time) = &message
        && one_time.event_time > now
    {
        return Err(RegistryError::MessageDoesNotExist(id.to_string()));
    }
    Ok(id)
}

/// Counts the registrar's visible messages excluding the instance just
/// acknowledged. One-time deletions are already reflected in `state`;
/// the exclusion matters for virtual autorenew instances, which remain
/// enumerable until their year is past.
fn remaining_after(
    state: &StoreState,
    registrar_id: &RegistrarId,
    acked: &MessageId,
    now: chrono::DateTime<chrono::Utc>,
) -> usize {
    poll_queue::enumerate(state, registrar_id, now)
        .iter()
        .filter(|item| item.id != *acked)
        .count()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::domain::history::{HistoryKey, RepoId, ResourceClass};
    use chrono::{DateTime, Utc};

    fn ts(s: &str) -> DateTime<Utc> {
        let Ok(dt) = s.parse::<DateTime<Utc>>() else {
            panic!("valid timestamp: {s}");
        };
        dt
    }

    fn registrar() -> RegistrarId {
        RegistrarId::from("NewRegistrar")
    }

    /// Queue at 2011-01-02: the domain's 2010 autorenew instance, two
    /// plain notifications, and the target message `1-3-EXAMPLE-4-3-2011`.
    fn seeded_state() -> StoreState {
        let mut state = StoreState::new();
        let Ok(repo) = state.register_domain(
            RepoId::new(3, "EXAMPLE"),
            "test.example",
            registrar(),
            ts("1999-04-03T22:00:00Z"),
            ts("2010-09-08T22:00:00Z"),
        ) else {
            panic!("seed domain");
        };
        let history = |revision| HistoryKey {
            resource_class: ResourceClass::Domain,
            repo_id: repo.clone(),
            revision,
        };
        state.enqueue_one_time(
            history(2),
            registrar(),
            ts("2010-12-01T00:00:00Z"),
            "Some poll message.",
        );
        // Burn message num 3 onto history revision 4 so the target id
        // reads 1-3-EXAMPLE-4-3-2011.
        state.next_message_num = 3;
        state.enqueue_one_time(
            history(4),
            registrar(),
            ts("2011-01-01T00:00:00Z"),
            "Domain transferred.",
        );
        state.enqueue_one_time(
            history(5),
            registrar(),
            ts("2011-01-01T12:00:00Z"),
            "Some other poll message.",
        );
        state
    }

    fn handler(state: StoreState) -> (AckHandler, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_state(state));
        let clock = Arc::new(FakeClock::new(ts("2011-01-02T01:01:01Z")));
        let handler = AckHandler::new(
            Arc::clone(&store),
            clock as Arc<dyn Clock>,
            EventBus::new(100),
        );
        (handler, store)
    }

    async fn message_count(store: &MemoryStore) -> usize {
        let Ok(count) = store.read(|state| Ok(state.poll_messages.len())).await else {
            panic!("read store");
        };
        count
    }

    #[tokio::test]
    async fn ack_deletes_message_and_reports_remaining() {
        let (handler, store) = handler(seeded_state());
        let before = message_count(&store).await;

        let Ok(outcome) = handler
            .acknowledge(&registrar(), Some("1-3-EXAMPLE-4-3-2011"))
            .await
        else {
            panic!("ack failed");
        };
        assert_eq!(outcome.acked_id.to_string(), "1-3-EXAMPLE-4-3-2011");
        // Two one-time messages and the 2010 autorenew instance remain.
        assert_eq!(outcome.remaining_count, 3);
        assert_eq!(message_count(&store).await, before - 1);
    }

    #[tokio::test]
    async fn ack_requires_an_id() {
        let (handler, _) = handler(seeded_state());
        // Absent and empty ids are the same failure, distinct from a
        // malformed id.
        for raw_id in [None, Some("")] {
            let result = handler.acknowledge(&registrar(), raw_id).await;
            assert!(matches!(result, Err(RegistryError::MissingMessageId)));
        }
    }

    #[tokio::test]
    async fn ack_rejects_malformed_ids() {
        let (handler, _) = handler(seeded_state());
        for raw in ["1-3-EXAMPLE", "ABC-12345", "1-3-EXAMPLE-4-3-2011-7"] {
            let result = handler.acknowledge(&registrar(), Some(raw)).await;
            assert!(
                matches!(result, Err(RegistryError::InvalidMessageId(_))),
                "{raw} should be malformed"
            );
        }
    }

    #[tokio::test]
    async fn ack_of_unknown_message_embeds_the_id() {
        let (handler, _) = handler(seeded_state());
        let result = handler
            .acknowledge(&registrar(), Some("1-3-EXAMPLE-99-99-2011"))
            .await;
        let Err(RegistryError::MessageDoesNotExist(id)) = result else {
            panic!("expected MessageDoesNotExist");
        };
        assert_eq!(id, "1-3-EXAMPLE-99-99-2011");
    }

    #[tokio::test]
    async fn ack_with_wrong_year_does_not_match() {
        let (handler, store) = handler(seeded_state());
        let before = message_count(&store).await;
        let result = handler
            .acknowledge(&registrar(), Some("1-3-EXAMPLE-4-3-1999"))
            .await;
        assert!(matches!(
            result,
            Err(RegistryError::MessageDoesNotExist(_))
        ));
        assert_eq!(message_count(&store).await, before);
    }

    #[tokio::test]
    async fn ack_by_non_owner_is_not_authorized() {
        let (handler, store) = handler(seeded_state());
        let before = message_count(&store).await;
        let result = handler
            .acknowledge(&RegistrarId::from("TheRegistrar"), Some("1-3-EXAMPLE-4-3-2011"))
            .await;
        assert!(matches!(
            result,
            Err(RegistryError::NotAuthorizedToAckMessage)
        ));
        assert_eq!(message_count(&store).await, before);
    }

    #[tokio::test]
    async fn ack_of_future_message_fails_and_mutates_nothing() {
        let mut state = seeded_state();
        let history = HistoryKey {
            resource_class: ResourceClass::Domain,
            repo_id: RepoId::new(3, "EXAMPLE"),
            revision: 6,
        };
        let key = state.enqueue_one_time(
            history,
            registrar(),
            ts("2011-06-01T00:00:00Z"),
            "Not yet.",
        );
        let (handler, store) = handler(state);
        let before = message_count(&store).await;

        let raw = MessageId::new(key.history, key.message_num, 2011).to_string();
        let result = handler.acknowledge(&registrar(), Some(&raw)).await;
        assert!(matches!(
            result,
            Err(RegistryError::MessageDoesNotExist(_))
        ));
        assert_eq!(message_count(&store).await, before);
    }

    #[tokio::test]
    async fn ack_of_autorenew_instance_leaves_the_series() {
        let (handler, store) = handler(seeded_state());
        let before = message_count(&store).await;

        // The registration autorenew series is 1-3-EXAMPLE-1-1, and its
        // 2010 occurrence has elapsed.
        let Ok(outcome) = handler
            .acknowledge(&registrar(), Some("1-3-EXAMPLE-1-1-2010"))
            .await
        else {
            panic!("ack failed");
        };
        // The three one-time messages remain; the series descriptor was
        // not deleted.
        assert_eq!(outcome.remaining_count, 3);
        assert_eq!(message_count(&store).await, before);
    }

    #[tokio::test]
    async fn double_ack_of_one_time_message_fails() {
        let (handler, _) = handler(seeded_state());
        let Ok(_) = handler
            .acknowledge(&registrar(), Some("1-3-EXAMPLE-4-3-2011"))
            .await
        else {
            panic!("first ack failed");
        };
        let second = handler
            .acknowledge(&registrar(), Some("1-3-EXAMPLE-4-3-2011"))
            .await;
        assert!(matches!(
            second,
            Err(RegistryError::MessageDoesNotExist(_))
        ));
    }

    #[tokio::test]
    async fn dry_run_reports_without_consuming() {
        let (handler, store) = handler(seeded_state());
        let before = message_count(&store).await;

        let Ok(outcome) = handler
            .dry_run(&registrar(), Some("1-3-EXAMPLE-4-3-2011"))
            .await
        else {
            panic!("dry run failed");
        };
        assert_eq!(outcome.remaining_count, 3);
        assert_eq!(message_count(&store).await, before);

        // The real ack afterwards sees the message untouched.
        let Ok(real) = handler
            .acknowledge(&registrar(), Some("1-3-EXAMPLE-4-3-2011"))
            .await
        else {
            panic!("ack failed");
        };
        assert_eq!(real.remaining_count, 3);
    }

    #[tokio::test]
    async fn ack_emits_event() {
        let (handler, _) = handler(seeded_state());
        let mut rx = handler.event_bus.subscribe();
        let Ok(_) = handler
            .acknowledge(&registrar(), Some("1-3-EXAMPLE-4-3-2011"))
            .await
        else {
            panic!("ack failed");
        };
        let Ok(event) = rx.recv().await else {
            panic!("expected event");
        };
        let RegistryEvent::PollMessageAcked {
            message_id,
            remaining_count,
            ..
        } = event
        else {
            panic!("expected PollMessageAcked");
        };
        assert_eq!(message_id, "1-3-EXAMPLE-4-3-2011");
        assert_eq!(remaining_count, 3);
    }
}
