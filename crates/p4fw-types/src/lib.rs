//! Common types for the p4fw control plane.
//!
//! This crate provides type-safe representations of the primitives shared
//! by the runtime and controller crates:
//!
//! - [`DeviceId`]: P4Runtime device identifiers
//! - [`MacAddress`]: 48-bit Ethernet MAC addresses

mod device;
mod mac;

pub use device::DeviceId;
pub use mac::MacAddress;

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("invalid device identifier: {0}")]
    InvalidDeviceId(String),
}
