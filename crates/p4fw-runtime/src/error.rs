//! Error types for P4Runtime device operations.
//!
//! All errors implement `std::error::Error` via `thiserror`.

use p4fw_types::DeviceId;
use thiserror::Error;

/// Result type alias for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur when talking to a managed switch.
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    /// RPC-level failure (connection lost, remote rejected the request).
    #[error("transport failure during {operation}: {message}")]
    Transport {
        /// The operation that failed (e.g., "write", "delete").
        operation: String,
        /// Error message from the transport layer.
        message: String,
    },

    /// A write or delete was attempted before master arbitration.
    #[error("controller is not the primary writer for device {device}")]
    NotPrimary {
        /// The device that rejected the request.
        device: DeviceId,
    },

    /// A table operation was attempted before pipeline installation.
    #[error("forwarding pipeline not installed on device {device}")]
    PipelineNotSet {
        /// The device that rejected the request.
        device: DeviceId,
    },

    /// A delete referenced a handle with no matching table row.
    #[error("no table entry with index {index} on device {device}")]
    EntryNotFound {
        /// The device the delete was issued against.
        device: DeviceId,
        /// The handle index that did not resolve.
        index: u64,
    },

    /// The connection to the device has been released.
    #[error("connection to device {device} is closed")]
    ConnectionClosed {
        /// The device whose connection is gone.
        device: DeviceId,
    },
}

impl RuntimeError {
    /// Creates a transport error.
    pub fn transport(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error indicates the device connection is
    /// unusable rather than a single rejected request.
    pub fn is_fatal_for_device(&self) -> bool {
        matches!(self, RuntimeError::ConnectionClosed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_display() {
        let err = RuntimeError::transport("write", "connection reset");
        assert_eq!(
            err.to_string(),
            "transport failure during write: connection reset"
        );
    }

    #[test]
    fn test_not_primary_display() {
        let err = RuntimeError::NotPrimary {
            device: DeviceId::new(1),
        };
        assert!(err.to_string().contains("device 1"));
        assert!(!err.is_fatal_for_device());
    }

    #[test]
    fn test_connection_closed_is_fatal() {
        let err = RuntimeError::ConnectionClosed {
            device: DeviceId::new(0),
        };
        assert!(err.is_fatal_for_device());
    }
}
