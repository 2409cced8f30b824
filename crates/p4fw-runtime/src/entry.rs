//! Table entry descriptors and handles.
//!
//! A [`TableEntry`] describes one match-action row (or a table's default
//! action) in the form the transport layer serializes onto the wire. A
//! successful write returns an [`EntryHandle`], which is the only way to
//! delete the row later.

use p4fw_types::{DeviceId, MacAddress};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// A match-field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchValue {
    /// Exact match on a raw byte string.
    Exact(Vec<u8>),
    /// Longest-prefix match on an IPv4 address.
    Lpm {
        /// Address to match.
        addr: Ipv4Addr,
        /// Prefix length in bits.
        prefix_len: u8,
    },
}

impl fmt::Display for MatchValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchValue::Exact(bytes) => {
                for b in bytes {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
            MatchValue::Lpm { addr, prefix_len } => write!(f, "{}/{}", addr, prefix_len),
        }
    }
}

/// One match-field assignment of a table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchField {
    /// Fully qualified field name (e.g., "hdr.ipv4.dstAddr").
    pub field: String,
    /// The value to match.
    pub value: MatchValue,
}

/// An action parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamValue {
    /// A MAC address parameter.
    Mac(MacAddress),
    /// An egress port number.
    Port(u32),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Mac(mac) => write!(f, "{}", mac),
            ParamValue::Port(port) => write!(f, "{}", port),
        }
    }
}

/// One action-parameter assignment of a table entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionParam {
    /// Parameter name (e.g., "dstAddr", "port").
    pub name: String,
    /// Parameter value.
    pub value: ParamValue,
}

/// A match-action table entry descriptor.
///
/// Immutable once built; construct via [`TableEntry::builder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    /// Fully qualified table name.
    pub table: String,
    /// Ordered match-field assignments. Empty for a default action.
    pub matches: Vec<MatchField>,
    /// Fully qualified action name.
    pub action: String,
    /// Ordered action-parameter assignments.
    pub params: Vec<ActionParam>,
    /// True if this entry sets the table's default action.
    pub default_action: bool,
}

impl TableEntry {
    /// Starts building an entry for the named table.
    pub fn builder(table: impl Into<String>) -> TableEntryBuilder {
        TableEntryBuilder {
            table: table.into(),
            matches: Vec::new(),
            action: String::new(),
            params: Vec::new(),
            default_action: false,
        }
    }
}

impl fmt::Display for TableEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.table)?;
        if self.default_action {
            write!(f, " (default)")?;
        }
        for m in &self.matches {
            write!(f, " {} {}", m.field, m.value)?;
        }
        write!(f, " -> {}", self.action)?;
        for p in &self.params {
            write!(f, " {}={}", p.name, p.value)?;
        }
        Ok(())
    }
}

/// Builder for [`TableEntry`].
#[derive(Debug)]
pub struct TableEntryBuilder {
    table: String,
    matches: Vec<MatchField>,
    action: String,
    params: Vec<ActionParam>,
    default_action: bool,
}

impl TableEntryBuilder {
    /// Adds an LPM match on an IPv4 destination field.
    pub fn match_lpm(mut self, field: impl Into<String>, addr: Ipv4Addr, prefix_len: u8) -> Self {
        self.matches.push(MatchField {
            field: field.into(),
            value: MatchValue::Lpm { addr, prefix_len },
        });
        self
    }

    /// Sets the action name.
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    /// Adds a MAC address action parameter.
    pub fn param_mac(mut self, name: impl Into<String>, mac: MacAddress) -> Self {
        self.params.push(ActionParam {
            name: name.into(),
            value: ParamValue::Mac(mac),
        });
        self
    }

    /// Adds an egress-port action parameter.
    pub fn param_port(mut self, name: impl Into<String>, port: u32) -> Self {
        self.params.push(ActionParam {
            name: name.into(),
            value: ParamValue::Port(port),
        });
        self
    }

    /// Marks this entry as the table's default action.
    pub fn default_action(mut self) -> Self {
        self.default_action = true;
        self
    }

    /// Finalizes the entry.
    pub fn build(self) -> TableEntry {
        TableEntry {
            table: self.table,
            matches: self.matches,
            action: self.action,
            params: self.params,
            default_action: self.default_action,
        }
    }
}

/// Opaque handle to an installed table row.
///
/// Returned by a successful write; required by a later delete. The
/// handle's lifetime ends exactly when a delete using it succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryHandle {
    /// The device the row is installed on.
    pub device: DeviceId,
    /// Device-local row index.
    pub index: u64,
}

impl EntryHandle {
    /// Creates a handle for a row on a device.
    pub const fn new(device: DeviceId, index: u64) -> Self {
        EntryHandle { device, index }
    }
}
