use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Authenticated identity of a call participant.
///
/// On the wire it always travels as a decimal string (`"from": "12"`).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl UserId {
    /// Parses a wire-format recipient.
    ///
    /// Only the canonical decimal form matches, so `"07"` or `"+7"` never
    /// address user 7.
    pub fn parse_wire(s: &str) -> Option<Self> {
        let id = s.parse::<u64>().ok()?;
        (id.to_string() == s).then_some(Self(id))
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl FromStr for UserId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
