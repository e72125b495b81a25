//! Revision label type

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A `"major.minor"` revision label.
///
/// `major` is at least 1 and is fixed when the owning record is created.
/// `minor` starts at 0 and counts edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RevisionLabel {
    major: u64,
    minor: u64,
}

/// Strict parse failure for a revision label
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RevisionParseError {
    #[error("Revision label is empty")]
    Empty,

    #[error("Invalid major revision: '{0}'")]
    InvalidMajor(String),

    #[error("Invalid minor revision: '{0}'")]
    InvalidMinor(String),

    #[error("Revision label must have exactly two components: '{0}'")]
    WrongShape(String),
}

impl RevisionLabel {
    /// The label of a record that was the first of its form type.
    pub const FIRST: RevisionLabel = RevisionLabel { major: 1, minor: 0 };

    /// Label every malformed stored revision restarts from on edit.
    pub const RESET: RevisionLabel = RevisionLabel { major: 1, minor: 1 };

    /// Create a label. A zero major is lifted to 1.
    pub fn new(major: u64, minor: u64) -> Self {
        Self {
            major: major.max(1),
            minor,
        }
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    /// Same major, minor + 1
    pub fn bumped(&self) -> Self {
        Self {
            major: self.major,
            minor: self.minor.saturating_add(1),
        }
    }
}

impl fmt::Display for RevisionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for RevisionLabel {
    type Err = RevisionParseError;

    /// Strict parsing: exactly `<major>.<minor>` with `major >= 1`.
    ///
    /// The edit path does not use this; see [`super::next_label_for_update`]
    /// for the lenient rules applied to stored labels.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(RevisionParseError::Empty);
        }

        let mut parts = trimmed.split('.');
        let (major, minor) = match (parts.next(), parts.next(), parts.next()) {
            (Some(major), Some(minor), None) => (major, minor),
            _ => return Err(RevisionParseError::WrongShape(trimmed.to_string())),
        };

        let major: u64 = major
            .parse()
            .map_err(|_| RevisionParseError::InvalidMajor(major.to_string()))?;
        if major < 1 {
            return Err(RevisionParseError::InvalidMajor(major.to_string()));
        }
        let minor: u64 = minor
            .parse()
            .map_err(|_| RevisionParseError::InvalidMinor(minor.to_string()))?;

        Ok(Self { major, minor })
    }
}

impl Serialize for RevisionLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RevisionLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
