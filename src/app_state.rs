//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::clock::Clock;
use crate::domain::EventBus;
use crate::service::{AckHandler, PollQueue, TransferEngine};
use crate::store::MemoryStore;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Transactional store backing every service.
    pub store: Arc<MemoryStore>,
    /// Registry clock; swapped for a fake one in tests.
    pub clock: Arc<dyn Clock>,
    /// Read-side poll message queue.
    pub poll_queue: PollQueue,
    /// Poll acknowledgement protocol handler.
    pub ack_handler: AckHandler,
    /// Domain transfer state machine.
    pub transfer_engine: TransferEngine,
    /// Event bus for registry event subscriptions.
    pub event_bus: EventBus,
}
