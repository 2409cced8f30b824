//! P4Runtime firewall controller.
//!
//! This crate implements the `fwctld` daemon, a small control plane that
//! maintains a matrix of "which switch may forward traffic to which
//! other switch" and pushes that matrix into each device's flow tables.
//!
//! # Components
//!
//! - [`topology`]: static forwarding parameters per switch pair
//! - [`matrix`]: the controller's record of installed accept edges
//! - [`policy`]: idempotent accept/revoke/default-drop operations
//! - [`command`] / [`dispatcher`]: the interactive operator loop and its
//!   startup state machine
//! - [`digest`]: one background listener task per switch for data-plane
//!   digest notifications
//! - [`config`]: daemon arguments and artifact validation
//!
//! # Control flow
//!
//! The dispatcher thread is the sole mutator of the rule matrix. Digest
//! listeners run concurrently but only observe; they never touch shared
//! rule state. Startup performs arbitration, pipeline installation and
//! default-drop priming on every managed switch, in that order, before
//! the first command is read.

pub mod command;
pub mod config;
pub mod digest;
pub mod dispatcher;
pub mod error;
pub mod matrix;
pub mod policy;
pub mod topology;

pub use command::Command;
pub use config::ControllerArgs;
pub use dispatcher::{ControllerState, Dispatcher};
pub use error::{FwError, FwResult};
pub use matrix::RuleMatrix;
pub use policy::{AcceptOutcome, PolicyEngine, RevokeOutcome};
pub use topology::{ForwardingParams, SwitchSpec, Topology};
