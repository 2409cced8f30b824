//! P4Runtime device capability interface for the p4fw control plane.
//!
//! This crate defines the narrow surface through which the controller
//! talks to a managed switch:
//!
//! - [`TableEntry`]: match-action table entry descriptors and the opaque
//!   [`EntryHandle`] returned by a successful write
//! - [`SwitchHandle`]: the per-device capability trait (arbitration,
//!   pipeline installation, table read/write/delete, digest stream)
//! - [`DigestMessage`]: asynchronous data-plane notifications
//! - [`SimSwitch`]: an in-process switch simulator backing the daemon
//!   and the test suite
//!
//! The gRPC transport itself (connection setup, protobuf encoding) is an
//! external collaborator; everything here is expressed against this
//! trait so the controller logic stays transport-agnostic.

mod digest;
mod entry;
pub mod error;
pub mod sim;
mod switch;

pub use digest::DigestMessage;
pub use entry::{ActionParam, EntryHandle, MatchField, MatchValue, ParamValue, TableEntry};
pub use error::{RuntimeError, RuntimeResult};
pub use sim::SimSwitch;
pub use switch::{SwitchHandle, SwitchInfo};
