//! Domain layer: core registry types, identifiers, and the event system.
//!
//! This module contains the registry's domain model: registrar and
//! resource identity, the external poll-message id codec, poll message
//! and billing records, transfer negotiation state, and the event bus
//! broadcasting committed mutations.

pub mod billing;
pub mod domain_entry;
pub mod event_bus;
pub mod history;
pub mod message_id;
pub mod poll_message;
pub mod registrar_id;
pub mod registry_event;
pub mod transfer;

pub use billing::BillingEvent;
pub use domain_entry::DomainEntry;
pub use event_bus::EventBus;
pub use history::{HistoryKey, RepoId, ResourceClass};
pub use message_id::MessageId;
pub use poll_message::{PollMessage, end_of_time};
pub use registrar_id::RegistrarId;
pub use registry_event::RegistryEvent;
pub use transfer::{TransferData, TransferStatus};
