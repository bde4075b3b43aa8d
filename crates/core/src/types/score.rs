//! Review score (star rating).

use core::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when constructing a [`Score`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoreError {
    /// The value is outside 1..=5.
    #[error("score must be between {min} and {max} (got {0})", min = Score::MIN, max = Score::MAX)]
    OutOfRange(i64),
    /// The value is not an integer.
    #[error("score must be a whole number: {0}")]
    NotANumber(String),
}

/// A 1–5 review score.
///
/// The ratings endpoints exchange the score as a string (`"4"`), so that is
/// the wire form. Plain numbers are accepted on input as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Score(u8);

impl Score {
    /// Lowest allowed score.
    pub const MIN: u8 = 1;
    /// Highest allowed score.
    pub const MAX: u8 = 5;

    /// Create a score, validating the range.
    ///
    /// # Errors
    ///
    /// Returns `ScoreError::OutOfRange` unless `1 <= value <= 5`.
    pub fn new(value: i64) -> Result<Self, ScoreError> {
        u8::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
            .ok_or(ScoreError::OutOfRange(value))
    }

    /// Returns the score as an integer.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Score {
    type Err = ScoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<i64>()
            .map_err(|_| ScoreError::NotANumber(s.to_string()))?;
        Self::new(value)
    }
}

impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Score {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ScoreVisitor)
    }
}

struct ScoreVisitor;

impl Visitor<'_> for ScoreVisitor {
    type Value = Score;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a score from 1 to 5")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Score, E> {
        i64::try_from(v)
            .map_err(|_| E::custom(ScoreError::OutOfRange(i64::MAX)))
            .and_then(|v| Score::new(v).map_err(E::custom))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Score, E> {
        Score::new(v).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Score, E> {
        v.parse().map_err(E::custom)
    }
}
