//! Unix timestamp utilities for B402 authorization validity windows.
//!
//! An authorization is executable only inside the half-open interval
//! `[validAfter, validBefore)`. Both bounds are seconds since the Unix epoch.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::ops::Add;
use std::time::SystemTime;

/// A Unix timestamp representing seconds since the Unix epoch.
///
/// # Serialization
///
/// Serialized as a stringified integer to avoid loss of precision in JSON.
/// Deserialization also accepts a plain JSON number, since wallet-side
/// tooling commonly emits `Math.floor(Date.now() / 1000)` unquoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnixTimestamp(u64);

impl Serialize for UnixTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for UnixTimestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(secs) => Ok(Self(secs)),
            Raw::Text(s) => s.parse::<u64>().map(Self).map_err(|_| {
                serde::de::Error::custom("timestamp must be a non-negative integer")
            }),
        }
    }
}

impl Display for UnixTimestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add<u64> for UnixTimestamp {
    type Output = Self;

    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl UnixTimestamp {
    /// Creates a new [`UnixTimestamp`] from a raw seconds value.
    #[must_use]
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Returns the current system time as a [`UnixTimestamp`].
    ///
    /// # Panics
    ///
    /// Panics if the system clock is set to a time before the Unix epoch,
    /// which should never happen on properly configured systems.
    #[must_use]
    pub fn now() -> Self {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .expect("SystemTime before UNIX epoch?!?")
            .as_secs();
        Self(now)
    }

    /// Returns the timestamp as raw seconds since the Unix epoch.
    #[must_use]
    pub const fn as_secs(&self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_as_string() {
        let ts = UnixTimestamp::from_secs(1699999999);
        let serialized = serde_json::to_string(&ts).unwrap();
        assert_eq!(serialized, "\"1699999999\"");
    }

    #[test]
    fn test_deserialize_from_string() {
        let ts: UnixTimestamp = serde_json::from_str("\"1699999999\"").unwrap();
        assert_eq!(ts.as_secs(), 1699999999);
    }

    #[test]
    fn test_deserialize_from_number() {
        let ts: UnixTimestamp = serde_json::from_str("1699999999").unwrap();
        assert_eq!(ts.as_secs(), 1699999999);
    }

    #[test]
    fn test_deserialize_rejects_garbage() {
        let result: Result<UnixTimestamp, _> = serde_json::from_str("\"not-a-number\"");
        assert!(result.is_err());
        let result: Result<UnixTimestamp, _> = serde_json::from_str("-5");
        assert!(result.is_err());
    }

    #[test]
    fn test_ordering_and_add() {
        let a = UnixTimestamp::from_secs(100);
        let b = a + 50;
        assert!(a < b);
        assert_eq!(b.as_secs(), 150);
    }
}
