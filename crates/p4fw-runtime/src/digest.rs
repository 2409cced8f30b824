//! Digest notification messages.

use p4fw_types::DeviceId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An asynchronous notification emitted by the data-plane program,
/// out of band from table operations.
///
/// Digests are best-effort telemetry. They carry no ordering guarantee
/// relative to command processing and must never be used as a
/// synchronization signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestMessage {
    /// The device that emitted the digest.
    pub device: DeviceId,
    /// The digest list identifier from the P4 program.
    pub list_id: u32,
    /// Raw digest payload bytes.
    pub payload: Vec<u8>,
}

impl fmt::Display for DigestMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "digest list {} from device {} ({} bytes)",
            self.list_id,
            self.device,
            self.payload.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let msg = DigestMessage {
            device: DeviceId::new(2),
            list_id: 1,
            payload: vec![0xde, 0xad],
        };
        assert_eq!(msg.to_string(), "digest list 1 from device 2 (2 bytes)");
    }
}
