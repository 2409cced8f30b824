//! Static topology table.
//!
//! Maps a (source, destination) switch pair to the forwarding parameters
//! needed to build an accept entry: destination MAC, egress port and
//! destination IP. Populated once at startup from a declarative row
//! list; read-only afterwards. A lookup miss is a configuration error,
//! not a runtime condition to recover from, since the switch set is
//! fixed for the session.

use once_cell::sync::Lazy;
use p4fw_runtime::SwitchInfo;
use p4fw_types::{DeviceId, MacAddress};
use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;

use crate::error::{FwError, FwResult};

/// Forwarding parameters for one directed switch pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardingParams {
    /// Destination hardware address.
    pub dst_mac: MacAddress,
    /// Egress port on the source switch.
    pub egress_port: u32,
    /// Destination network address (host route, /32).
    pub dst_ip: Ipv4Addr,
}

/// Connection parameters for one managed switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchSpec {
    /// Human-readable name.
    pub name: &'static str,
    /// RPC endpoint address.
    pub address: &'static str,
    /// Device identifier.
    pub device_id: DeviceId,
}

impl SwitchSpec {
    /// Builds the runtime identity record for this switch.
    pub fn to_info(&self) -> SwitchInfo {
        SwitchInfo::new(self.name, self.address, self.device_id)
    }
}

/// The fixed three-switch deployment of the firewall exercise.
pub const BUILTIN_SWITCHES: &[SwitchSpec] = &[
    SwitchSpec {
        name: "s1",
        address: "127.0.0.1:50051",
        device_id: DeviceId::new(0),
    },
    SwitchSpec {
        name: "s2",
        address: "127.0.0.1:50052",
        device_id: DeviceId::new(1),
    },
    SwitchSpec {
        name: "s3",
        address: "127.0.0.1:50053",
        device_id: DeviceId::new(2),
    },
];

/// Declarative (src, dst, dst_mac, egress_port, dst_ip) rows for the
/// builtin deployment: every ordered pair including self-loops, where a
/// self-loop forwards to the switch's directly attached host.
const BUILTIN_EDGES: &[(u64, u64, [u8; 6], u32, [u8; 4])] = &[
    (0, 0, [0x00, 0x00, 0x00, 0x00, 0x01, 0x01], 1, [10, 0, 1, 1]),
    (0, 1, [0x00, 0x00, 0x00, 0x02, 0x02, 0x00], 2, [10, 0, 2, 2]),
    (0, 2, [0x00, 0x00, 0x00, 0x03, 0x03, 0x00], 3, [10, 0, 3, 3]),
    (1, 0, [0x00, 0x00, 0x00, 0x01, 0x01, 0x00], 2, [10, 0, 1, 1]),
    (1, 1, [0x00, 0x00, 0x00, 0x00, 0x02, 0x02], 1, [10, 0, 2, 2]),
    (1, 2, [0x00, 0x00, 0x00, 0x03, 0x03, 0x00], 3, [10, 0, 3, 3]),
    (2, 0, [0x00, 0x00, 0x00, 0x01, 0x01, 0x00], 2, [10, 0, 1, 1]),
    (2, 1, [0x00, 0x00, 0x00, 0x02, 0x02, 0x00], 3, [10, 0, 2, 2]),
    (2, 2, [0x00, 0x00, 0x00, 0x00, 0x03, 0x03], 1, [10, 0, 3, 3]),
];

static BUILTIN: Lazy<Topology> = Lazy::new(|| Topology::from_rows(BUILTIN_EDGES));

/// Static lookup table from switch pair to forwarding parameters.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    edges: BTreeMap<(DeviceId, DeviceId), ForwardingParams>,
    devices: BTreeSet<DeviceId>,
}

impl Topology {
    /// Builds a topology from declarative rows. The node count is
    /// whatever the rows mention.
    pub fn from_rows(rows: &[(u64, u64, [u8; 6], u32, [u8; 4])]) -> Self {
        let mut edges = BTreeMap::new();
        let mut devices = BTreeSet::new();
        for &(src, dst, mac, port, ip) in rows {
            let src = DeviceId::new(src);
            let dst = DeviceId::new(dst);
            devices.insert(src);
            devices.insert(dst);
            edges.insert(
                (src, dst),
                ForwardingParams {
                    dst_mac: MacAddress::new(mac),
                    egress_port: port,
                    dst_ip: Ipv4Addr::from(ip),
                },
            );
        }
        Topology { edges, devices }
    }

    /// Returns the builtin three-switch topology.
    pub fn builtin() -> &'static Topology {
        &BUILTIN
    }

    /// Looks up the forwarding parameters for a directed pair.
    pub fn forwarding(&self, src: DeviceId, dst: DeviceId) -> FwResult<&ForwardingParams> {
        self.edges
            .get(&(src, dst))
            .ok_or(FwError::NoForwardingPath { src, dst })
    }

    /// Returns the managed device ids in ascending order.
    pub fn devices(&self) -> Vec<DeviceId> {
        self.devices.iter().copied().collect()
    }

    /// Returns every directed pair in deterministic order
    /// (source ascending, then destination ascending).
    pub fn pairs(&self) -> Vec<(DeviceId, DeviceId)> {
        self.edges.keys().copied().collect()
    }

    /// Returns true if the device appears in the topology.
    pub fn contains(&self, device: DeviceId) -> bool {
        self.devices.contains(&device)
    }

    /// Number of directed edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Returns true if the topology has no edges.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}
