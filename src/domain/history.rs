//! Resource repo ids and history records.
//!
//! Every mutation of a registry resource appends a [`HistoryEntry`] to
//! that resource. Poll messages and billing events hang off a specific
//! history record, addressed by [`HistoryKey`]. These keys are also the
//! backbone of the external poll-message id format.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RegistrarId;
use crate::error::RegistryError;

/// Closed set of resource classes a history record can belong to.
///
/// The numeric codes are wire-visible: they form the first component of
/// the external poll-message id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceClass {
    /// A registered domain name.
    Domain,
    /// A registrant/admin/tech contact.
    Contact,
    /// A nameserver host.
    Host,
}

impl ResourceClass {
    /// Returns the numeric code used in external message ids.
    #[must_use]
    pub const fn code(self) -> u64 {
        match self {
            Self::Domain => 1,
            Self::Contact => 2,
            Self::Host => 3,
        }
    }

    /// Looks up a resource class from its numeric code.
    ///
    /// Returns `None` for codes outside the closed set.
    #[must_use]
    pub const fn from_code(code: u64) -> Option<Self> {
        match code {
            1 => Some(Self::Domain),
            2 => Some(Self::Contact),
            3 => Some(Self::Host),
            _ => None,
        }
    }
}

/// Repository id of a registry resource, e.g. `3-EXAMPLE`.
///
/// The numeric part is unique within the suffix namespace; the suffix
/// identifies the repository partition (conventionally derived from the
/// TLD). Immutable for the life of the resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
    /// Numeric part of the repo id.
    pub number: u64,
    /// Partition suffix, e.g. `EXAMPLE`.
    pub suffix: String,
}

impl RepoId {
    /// Creates a repo id from its parts.
    #[must_use]
    pub fn new(number: u64, suffix: impl Into<String>) -> Self {
        Self {
            number,
            suffix: suffix.into(),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.number, self.suffix)
    }
}

impl FromStr for RepoId {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (number, suffix) = s
            .split_once('-')
            .ok_or_else(|| RegistryError::InvalidRequest(format!("malformed repo id: {s}")))?;
        let number: u64 = number
            .parse()
            .map_err(|_| RegistryError::InvalidRequest(format!("malformed repo id: {s}")))?;
        if suffix.is_empty() {
            return Err(RegistryError::InvalidRequest(format!(
                "malformed repo id: {s}"
            )));
        }
        Ok(Self::new(number, suffix))
    }
}

impl Serialize for RepoId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RepoId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Fully qualified reference to one history record of one resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistoryKey {
    /// Class of the resource the history record belongs to.
    pub resource_class: ResourceClass,
    /// Repo id of the resource.
    pub repo_id: RepoId,
    /// Revision number of the history record, unique store-wide.
    pub revision: u64,
}

/// Kind of mutation a history entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryType {
    /// Initial registration of the resource.
    DomainCreate,
    /// A transfer was requested.
    TransferRequest,
    /// A pending transfer was approved (explicitly or by the server).
    TransferApproved,
    /// A pending transfer was rejected by the losing registrar.
    TransferRejected,
    /// A pending transfer was cancelled.
    TransferCancelled,
}

/// Append-only record of one mutation of a resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Store-wide revision number; forms part of [`HistoryKey`].
    pub revision: u64,
    /// What kind of mutation happened.
    pub entry_type: HistoryType,
    /// When the mutation happened (registry clock, not wall clock).
    pub modification_time: DateTime<Utc>,
    /// Registrar on whose behalf the mutation ran.
    pub acting_registrar: RegistrarId,
}
