//! Core identifiers shared across the console: channels, cue numbers, statuses.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Identifier of a dimmer channel. Positive, not necessarily contiguous.
pub type ChannelId = u32;

/// Identifier of a cue list.
pub type ListId = u32;

/// An 8-bit intensity.
pub type Level = u8;

/// Position of a cue inside its list.
///
/// Cue numbers are finite, non-negative decimals so that a cue can be
/// inserted between two existing ones (cue 1.5 sorts between 1 and 2).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(try_from = "f64", into = "f64")]
pub struct CueNumber(f64);

/// Error returned when a value cannot be used as a cue number.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid cue number {0}: must be finite and non-negative")]
pub struct InvalidCueNumber(pub f64);

impl CueNumber {
    /// Create a cue number, rejecting NaN, infinities and negative values.
    pub fn new(value: f64) -> Result<Self, InvalidCueNumber> {
        if value.is_finite() && value >= 0.0 {
            // Normalise -0.0 so that equality and ordering agree.
            Ok(Self(value + 0.0))
        } else {
            Err(InvalidCueNumber(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for CueNumber {
    type Error = InvalidCueNumber;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<u32> for CueNumber {
    fn from(value: u32) -> Self {
        Self(f64::from(value))
    }
}

impl From<CueNumber> for f64 {
    fn from(number: CueNumber) -> Self {
        number.0
    }
}

impl PartialEq for CueNumber {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CueNumber {}

impl PartialOrd for CueNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CueNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for CueNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.fract() == 0.0 {
            write!(f, "{}", self.0 as u64)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Where a channel's live value comes from.
///
/// Exactly one status holds per channel at any instant. Serialized as the
/// lowercase variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Hand-set by the operator, or never touched by any cue.
    Manual,
    /// Moved up by the last fade (or higher than the previous cue).
    Raised,
    /// Moved down by the last fade (or lower than the previous cue).
    Lowered,
    /// Inherited from an earlier cue.
    Tracked,
    /// Frozen by a block marker.
    Blocked,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Manual => "manual",
            Status::Raised => "raised",
            Status::Lowered => "lowered",
            Status::Tracked => "tracked",
            Status::Blocked => "blocked",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cue_number_rejects_invalid() {
        assert!(CueNumber::new(-1.0).is_err());
        assert!(CueNumber::new(f64::NAN).is_err());
        assert!(CueNumber::new(f64::INFINITY).is_err());
        assert!(CueNumber::new(0.0).is_ok());
    }

    #[test]
    fn test_cue_number_ordering_allows_insertion() {
        let one = CueNumber::from(1);
        let half = CueNumber::new(1.5).unwrap();
        let two = CueNumber::from(2);
        assert!(one < half && half < two);
        assert_eq!(CueNumber::new(2.0).unwrap(), two);
    }

    #[test]
    fn test_cue_number_display() {
        assert_eq!(CueNumber::from(7).to_string(), "7");
        assert_eq!(CueNumber::new(7.25).unwrap().to_string(), "7.25");
    }

    #[test]
    fn test_cue_number_deserialize_validates() {
        let ok: CueNumber = serde_json::from_str("3.5").unwrap();
        assert_eq!(ok.value(), 3.5);
        assert!(serde_json::from_str::<CueNumber>("-2").is_err());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&Status::Tracked).unwrap();
        assert_eq!(json, "\"tracked\"");
        assert_eq!(Status::Blocked.to_string(), "blocked");
    }
}
