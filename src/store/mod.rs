//! Storage collaborator: transactional in-memory state.
//!
//! The core never talks to a concrete database; it runs every public
//! operation inside one atomic transaction against a [`MemoryStore`].
//! A durable backend would implement the same `read`/`transact`
//! surface over its own transaction manager.

pub mod memory;

pub use memory::{MemoryStore, StoreState};
