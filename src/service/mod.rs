//! Service layer: the protocol-facing operations of the registry core.
//!
//! Each service wraps the shared store and clock:
//! - [`PollQueue`] — read-side enumeration of a registrar's messages.
//! - [`AckHandler`] — the acknowledgement protocol.
//! - [`TransferEngine`] — the domain transfer state machine.

pub mod ack_handler;
pub mod poll_queue;
pub mod transfer_engine;

pub use ack_handler::{AckHandler, AckOutcome};
pub use poll_queue::{PollQueue, QueueItem};
pub use transfer_engine::{TransferEngine, TransferView};
