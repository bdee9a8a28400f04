//! Data Transfer Objects for REST request/response serialization.
//!
//! Identifiers (repo ids, message ids, registrar ids) cross the wire as
//! their canonical string encodings; handlers parse them back into
//! domain types and reject malformed values before touching the store.

pub mod domain_dto;
pub mod poll_dto;

pub use domain_dto::*;
pub use poll_dto::*;
