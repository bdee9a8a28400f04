//! External poll-message id codec.
//!
//! Registrars address a specific poll-message instance with a six
//! component `-`-joined id such as `1-3-EXAMPLE-4-3-2011`:
//!
//! ```text
//! <resource-class>-<repo-number>-<repo-suffix>-<history-revision>-<message-num>-<year>
//! ```
//!
//! The year component selects one yearly instance of an autorenew
//! series; for one-time messages it must match the year of the event
//! time. Decoding is strict: anything other than exactly six components
//! with numeric values in the numeric slots and a known resource-class
//! code is rejected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::history::{HistoryKey, RepoId, ResourceClass};
use crate::error::RegistryError;

/// Decoded form of an external poll-message id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId {
    /// History record the message hangs off.
    pub history: HistoryKey,
    /// Per-store serial number of the message.
    pub message_num: u64,
    /// Year of the addressed instance.
    pub year: i32,
}

impl MessageId {
    /// Creates a message id from its decoded parts.
    #[must_use]
    pub fn new(history: HistoryKey, message_num: u64, year: i32) -> Self {
        Self {
            history,
            message_num,
            year,
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}-{}-{}",
            self.history.resource_class.code(),
            self.history.repo_id.number,
            self.history.repo_id.suffix,
            self.history.revision,
            self.message_num,
            self.year
        )
    }
}

impl FromStr for MessageId {
    type Err = RegistryError;

    /// Strict decode; every deviation maps to
    /// [`RegistryError::InvalidMessageId`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RegistryError::InvalidMessageId(s.to_string());

        let parts: Vec<&str> = s.split('-').collect();
        let [class, repo_num, repo_suffix, revision, message_num, year] = parts.as_slice() else {
            return Err(invalid());
        };

        let class_code: u64 = class.parse().map_err(|_| invalid())?;
        let resource_class = ResourceClass::from_code(class_code).ok_or_else(invalid)?;
        let repo_number: u64 = repo_num.parse().map_err(|_| invalid())?;
        if repo_suffix.is_empty() {
            return Err(invalid());
        }
        let revision: u64 = revision.parse().map_err(|_| invalid())?;
        let message_num: u64 = message_num.parse().map_err(|_| invalid())?;
        let year: i32 = year.parse().map_err(|_| invalid())?;

        Ok(Self {
            history: HistoryKey {
                resource_class,
                repo_id: RepoId::new(repo_number, *repo_suffix),
                revision,
            },
            message_num,
            year,
        })
    }
}

impl Serialize for MessageId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MessageId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
