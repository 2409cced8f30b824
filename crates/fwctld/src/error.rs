//! Error types for the controller.
//!
//! Three failure classes with distinct handling:
//!
//! - transport failures are reported to the operator and the command
//!   loop continues, except during the startup phases where they abort
//!   the daemon;
//! - policy conditions (unknown switch id) are handled locally as
//!   no-ops with a user-visible message;
//! - configuration problems (missing artifact, no forwarding path) are
//!   fatal at startup only.

use p4fw_runtime::RuntimeError;
use p4fw_types::DeviceId;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for controller operations.
pub type FwResult<T> = Result<T, FwError>;

/// Errors that can occur in the controller.
#[derive(Debug, Error)]
pub enum FwError {
    /// RPC failure from the device transport.
    #[error(transparent)]
    Transport(#[from] RuntimeError),

    /// An operator command referenced a device id that is not managed.
    #[error("unknown switch id {0}")]
    UnknownSwitch(DeviceId),

    /// The topology table has no row for a switch pair. Fatal at
    /// startup; the switch set is fixed for the session.
    #[error("no forwarding path from switch {src} to switch {dst}")]
    NoForwardingPath {
        /// Source switch id.
        src: DeviceId,
        /// Destination switch id.
        dst: DeviceId,
    },

    /// A required compiled artifact is missing from the filesystem.
    #[error("{role} file not found: {} (have you run 'make'?)", path.display())]
    MissingArtifact {
        /// Which artifact ("p4info" or "BMv2 JSON").
        role: &'static str,
        /// The path that was checked.
        path: PathBuf,
    },

    /// A command was issued before startup completed.
    #[error("controller is not ready for commands (state: {state})")]
    NotReady {
        /// Name of the current dispatcher state.
        state: &'static str,
    },

    /// Failure reading operator input.
    #[error("input error: {0}")]
    Io(#[from] io::Error),
}

impl FwError {
    /// Creates a missing-artifact error.
    pub fn missing_artifact(role: &'static str, path: impl Into<PathBuf>) -> Self {
        Self::MissingArtifact {
            role,
            path: path.into(),
        }
    }

    /// Returns true if this error class is fatal during the startup
    /// phases (everything except policy no-op conditions is).
    pub fn is_fatal_at_startup(&self) -> bool {
        !matches!(self, FwError::UnknownSwitch(_))
    }
}
