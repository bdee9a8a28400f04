//! Type-safe registrar identifier.
//!
//! [`RegistrarId`] is a newtype wrapper around the registrar's account
//! name (e.g. `"NewRegistrar"`) providing type safety so that registrar
//! identifiers cannot be confused with other strings such as domain
//! names or repo ids.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a registrar account.
///
/// Assigned out of band when the registrar is accredited and immutable
/// thereafter. Used as the ownership discriminator on poll messages,
/// billing events, and both sides of a transfer negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegistrarId(String);

impl RegistrarId {
    /// Creates a `RegistrarId` from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegistrarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RegistrarId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RegistrarId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
