//! # Receipt Timestamps
//!
//! `Timestamp` records when a journal receipt was committed. It is
//! informational only and never enters a digest. Whole seconds, UTC,
//! rendered with a `Z` suffix; inputs carrying an explicit offset are
//! refused so two renderings of one instant cannot differ.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Whole-second UTC instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current second.
    pub fn now() -> Self {
        Self::at(Utc::now())
    }

    /// `instant` with its sub-second part dropped.
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self(DateTime::from_timestamp(instant.timestamp(), 0).unwrap_or(instant))
    }

    /// Seconds since the Unix epoch.
    pub fn unix_seconds(&self) -> i64 {
        self.0.timestamp()
    }

    /// Parse `YYYY-MM-DDTHH:MM:SS[.fff]Z`.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: String| ValidationError::InvalidTimestamp {
            value: s.to_string(),
            reason,
        };
        if !s.ends_with('Z') {
            return Err(invalid("expected a Z suffix".to_string()));
        }
        DateTime::parse_from_rfc3339(s)
            .map(|parsed| Self::at(parsed.with_timezone(&Utc)))
            .map_err(|e| invalid(e.to_string()))
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
