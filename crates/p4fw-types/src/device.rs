//! P4Runtime device identifier type.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A P4Runtime device identifier.
///
/// Assigned once when a switch connection is established and immutable
/// for the lifetime of that connection. Operator commands reference
/// switches by this identifier.
///
/// # Examples
///
/// ```
/// use p4fw_types::DeviceId;
///
/// let id: DeviceId = "2".parse().unwrap();
/// assert_eq!(id, DeviceId::new(2));
/// assert_eq!(id.to_string(), "2");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DeviceId(u64);

impl DeviceId {
    /// Creates a device identifier from its raw value.
    pub const fn new(id: u64) -> Self {
        DeviceId(id)
    }

    /// Returns the raw identifier value.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DeviceId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(DeviceId)
            .map_err(|_| ParseError::InvalidDeviceId(s.to_string()))
    }
}

impl From<u64> for DeviceId {
    fn from(id: u64) -> Self {
        DeviceId(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse() {
        assert_eq!("0".parse::<DeviceId>().unwrap(), DeviceId::new(0));
        assert_eq!("42".parse::<DeviceId>().unwrap(), DeviceId::new(42));
    }

    #[test]
    fn test_parse_invalid() {
        assert!("s1".parse::<DeviceId>().is_err());
        assert!("-1".parse::<DeviceId>().is_err());
        assert!("".parse::<DeviceId>().is_err());
    }

    #[test]
    fn test_ordering() {
        let mut ids = vec![DeviceId::new(2), DeviceId::new(0), DeviceId::new(1)];
        ids.sort();
        assert_eq!(ids, vec![DeviceId::new(0), DeviceId::new(1), DeviceId::new(2)]);
    }
}
