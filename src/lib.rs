//! # registry-core
//!
//! Stateful protocol core of an EPP domain registry: the poll-message
//! queue, the message-id codec, the domain transfer state machine, and
//! the acknowledgement protocol, exposed over a REST API.
//!
//! Two design points shape everything here:
//!
//! - **Virtual autorenew messages.** Yearly autorenew notifications are
//!   never materialized. The store holds one series descriptor per
//!   domain and the queue computes the elapsed occurrences at read
//!   time, so an untouched queue costs one record per domain rather
//!   than one per year.
//! - **Lazy transfer resolution.** There is no scheduler. A pending
//!   transfer that crosses its automatic-resolve deadline is committed
//!   by whichever operation observes it next, with the resolution
//!   timestamped at the deadline itself.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── PollQueue / AckHandler / TransferEngine (service/)
//!     ├── EventBus (domain/)
//!     │
//!     └── MemoryStore (store/)
//! ```

pub mod api;
pub mod app_state;
pub mod clock;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod store;
