//! Poll messages: one-time notifications and virtual autorenew series.
//!
//! A one-time message is a single materialized notification, deleted
//! when acknowledged. An autorenew message is a compact descriptor for
//! an unbounded series of yearly notifications; individual instances
//! are never stored — they are computed on demand, bounded by the query
//! time, and addressed by the year component of the external id.

use chrono::{DateTime, Months, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::RegistrarId;
use super::history::HistoryKey;

/// Sentinel for open-ended recurrences, far beyond any real event time.
///
/// An autorenew series with this end time is still active.
#[must_use]
pub fn end_of_time() -> DateTime<Utc> {
    // Matches the registry-wide END_OF_TIME convention.
    match Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59) {
        chrono::LocalResult::Single(dt) => dt,
        _ => DateTime::<Utc>::MAX_UTC,
    }
}

/// Storage key of a poll message: parent history record plus serial.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PollMessageKey {
    /// History record the message hangs off.
    pub history: HistoryKey,
    /// Per-store serial number.
    pub message_num: u64,
}

/// A single materialized notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneTimeMessage {
    /// Storage key.
    pub key: PollMessageKey,
    /// Registrar the message targets; only this registrar may ack it.
    pub registrar_id: RegistrarId,
    /// Instant at/after which the message becomes visible.
    pub event_time: DateTime<Utc>,
    /// Human-readable body.
    pub message: String,
}

/// Descriptor of a yearly autorenew notification series.
///
/// Invariant: `autorenew_end_time >= event_time`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutorenewMessage {
    /// Storage key.
    pub key: PollMessageKey,
    /// Registrar the series targets.
    pub registrar_id: RegistrarId,
    /// First event of the series.
    pub event_time: DateTime<Utc>,
    /// End of the recurrence; [`end_of_time`] when open-ended.
    pub autorenew_end_time: DateTime<Utc>,
    /// Fully-qualified name of the auto-renewing domain.
    pub target_id: String,
    /// Human-readable body, reused for every instance.
    pub message: String,
}

impl AutorenewMessage {
    /// Computes all instances visible at `as_of`: yearly occurrences
    /// with `event_time <= occurrence <= min(as_of, autorenew_end_time)`.
    ///
    /// Finite for any fixed `as_of` — the count is bounded by elapsed
    /// years since the first event.
    #[must_use]
    pub fn occurrences_up_to(&self, as_of: DateTime<Utc>) -> Vec<DateTime<Utc>> {
        let cutoff = as_of.min(self.autorenew_end_time);
        let mut occurrences = Vec::new();
        let mut k: u32 = 0;
        loop {
            let Some(occurrence) = self.event_time.checked_add_months(Months::new(12 * k)) else {
                break;
            };
            if occurrence > cutoff {
                break;
            }
            occurrences.push(occurrence);
            k += 1;
        }
        occurrences
    }

    /// Returns the instance whose calendar year is `year`, if it is
    /// visible at `as_of`.
    #[must_use]
    pub fn occurrence_in_year(&self, year: i32, as_of: DateTime<Utc>) -> Option<DateTime<Utc>> {
        use chrono::Datelike;
        self.occurrences_up_to(as_of)
            .into_iter()
            .find(|occ| occ.year() == year)
    }
}

/// A poll message record: either a single notification or a compact
/// autorenew series descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PollMessage {
    /// Single notification, deleted on ack.
    OneTime(OneTimeMessage),
    /// Yearly series descriptor; instances are virtual.
    Autorenew(AutorenewMessage),
}

impl PollMessage {
    /// Storage key of the record.
    #[must_use]
    pub fn key(&self) -> &PollMessageKey {
        match self {
            Self::OneTime(m) => &m.key,
            Self::Autorenew(m) => &m.key,
        }
    }

    /// Registrar the record targets.
    #[must_use]
    pub fn registrar_id(&self) -> &RegistrarId {
        match self {
            Self::OneTime(m) => &m.registrar_id,
            Self::Autorenew(m) => &m.registrar_id,
        }
    }

    /// First (or only) event time of the record.
    #[must_use]
    pub fn event_time(&self) -> DateTime<Utc> {
        match self {
            Self::OneTime(m) => m.event_time,
            Self::Autorenew(m) => m.event_time,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::history::{HistoryKey, RepoId, ResourceClass};
    use chrono::Duration;

    fn make_series(first: DateTime<Utc>, end: DateTime<Utc>) -> AutorenewMessage {
        AutorenewMessage {
            key: PollMessageKey {
                history: HistoryKey {
                    resource_class: ResourceClass::Domain,
                    repo_id: RepoId::new(3, "EXAMPLE"),
                    revision: 1,
                },
                message_num: 1,
            },
            registrar_id: RegistrarId::from("TheRegistrar"),
            event_time: first,
            autorenew_end_time: end,
            target_id: "test.example".to_string(),
            message: "Domain was auto-renewed.".to_string(),
        }
    }

    fn ts(s: &str) -> DateTime<Utc> {
        let Ok(dt) = s.parse::<DateTime<Utc>>() else {
            panic!("valid timestamp: {s}");
        };
        dt
    }

    #[test]
    fn open_ended_series_yields_one_instance_per_elapsed_year() {
        let first = ts("2010-04-03T22:00:00Z");
        let series = make_series(first, end_of_time());
        // 6.5 years later: years 0..=6 have elapsed.
        let as_of = ts("2016-10-03T22:00:00Z");
        let occurrences = series.occurrences_up_to(as_of);
        assert_eq!(occurrences.len(), 7);
        assert_eq!(occurrences.first().copied(), Some(first));
        assert_eq!(occurrences.last().copied(), Some(ts("2016-04-03T22:00:00Z")));
    }

    #[test]
    fn end_time_bounds_the_series_inclusively() {
        let first = ts("2010-04-03T22:00:00Z");
        let end = ts("2012-04-03T22:00:00Z");
        let series = make_series(first, end);
        // Query far past the end: only instances up to the end remain.
        let occurrences = series.occurrences_up_to(ts("2020-01-01T00:00:00Z"));
        assert_eq!(occurrences.len(), 3);
        assert_eq!(occurrences.last().copied(), Some(end));
    }

    #[test]
    fn series_before_first_event_is_empty() {
        let first = ts("2010-04-03T22:00:00Z");
        let series = make_series(first, end_of_time());
        assert!(
            series
                .occurrences_up_to(first - Duration::seconds(1))
                .is_empty()
        );
        // Exactly at the first event: one instance.
        assert_eq!(series.occurrences_up_to(first).len(), 1);
    }

    #[test]
    fn occurrence_in_year_honors_visibility_window() {
        let first = ts("2009-01-02T01:01:01Z");
        let series = make_series(first, end_of_time());
        let now = ts("2011-01-02T01:01:01Z");
        assert!(series.occurrence_in_year(2009, now).is_some());
        assert!(series.occurrence_in_year(2010, now).is_some());
        assert!(series.occurrence_in_year(2011, now).is_some());
        // Not yet elapsed.
        assert!(series.occurrence_in_year(2012, now).is_none());
        // Before the series started.
        assert!(series.occurrence_in_year(2008, now).is_none());
    }
}
