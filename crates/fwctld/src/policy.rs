//! Policy engine: builds table entries from topology data and issues
//! them through switch handles, keeping the rule matrix in lockstep
//! with confirmed device state.
//!
//! All high-level operations are idempotent. `install_accept` on an
//! already-tracked edge and `revoke_accept` on an absent edge perform
//! zero RPCs.

use p4fw_runtime::{SwitchHandle, TableEntry};
use p4fw_types::DeviceId;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{FwError, FwResult};
use crate::matrix::RuleMatrix;
use crate::topology::Topology;

/// The firewall program's match-action table.
pub const TABLE_NAME: &str = "MyIngress.ipv4_lpm";
/// Forwarding action with `dstAddr` and `port` parameters.
pub const ACTION_FORWARD: &str = "MyIngress.ipv4_forward";
/// Parameterless drop action.
pub const ACTION_DROP: &str = "MyIngress.drop";
/// Destination-address match field.
pub const MATCH_DST_ADDR: &str = "hdr.ipv4.dstAddr";

/// Result of an `install_accept` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptOutcome {
    /// A new accept row was written and recorded.
    Installed,
    /// The edge was already tracked; no RPC was issued.
    AlreadyAllowed,
}

/// Result of a `revoke_accept` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeOutcome {
    /// The row was deleted and the matrix entry removed.
    Revoked,
    /// No edge was tracked; no RPC was issued.
    NothingToRevoke,
}

/// Builds and issues table mutations against the managed switches.
///
/// Owned by the dispatcher thread, which is the sole mutator of the
/// rule matrix.
pub struct PolicyEngine {
    topology: Topology,
    matrix: RuleMatrix,
    switches: BTreeMap<DeviceId, Arc<dyn SwitchHandle>>,
}

impl PolicyEngine {
    /// Creates a policy engine over a topology and a set of connected
    /// switch handles.
    pub fn new(topology: Topology, switches: BTreeMap<DeviceId, Arc<dyn SwitchHandle>>) -> Self {
        PolicyEngine {
            topology,
            matrix: RuleMatrix::new(),
            switches,
        }
    }

    /// Returns the managed device ids in ascending order.
    pub fn devices(&self) -> Vec<DeviceId> {
        self.switches.keys().copied().collect()
    }

    /// Returns the switch handles in device-id order.
    pub fn switches(&self) -> impl Iterator<Item = &Arc<dyn SwitchHandle>> {
        self.switches.values()
    }

    /// Resolves a device id to its handle.
    pub fn switch(&self, device: DeviceId) -> FwResult<&Arc<dyn SwitchHandle>> {
        self.switches
            .get(&device)
            .ok_or(FwError::UnknownSwitch(device))
    }

    /// Read-only view of the rule matrix.
    pub fn matrix(&self) -> &RuleMatrix {
        &self.matrix
    }

    /// Writes (or overwrites) the table's default action to drop.
    ///
    /// Orthogonal to accept tracking; does not touch the matrix.
    pub async fn install_default_drop(&self, device: DeviceId) -> FwResult<()> {
        let switch = self.switch(device)?;
        let entry = TableEntry::builder(TABLE_NAME)
            .action(ACTION_DROP)
            .default_action()
            .build();
        switch.write_table_entry(&entry).await?;
        debug!(device = %device, "default action set to drop");
        Ok(())
    }

    /// Installs an accept entry for traffic from `src` destined to
    /// `dst`'s network address.
    ///
    /// Idempotent: an already-tracked edge is a side-effect-free no-op.
    /// On write failure the matrix entry stays absent.
    pub async fn install_accept(
        &mut self,
        src: DeviceId,
        dst: DeviceId,
    ) -> FwResult<AcceptOutcome> {
        let switch = Arc::clone(self.switch(src)?);
        if !self.switches.contains_key(&dst) {
            return Err(FwError::UnknownSwitch(dst));
        }
        if self.matrix.contains(src, dst) {
            return Ok(AcceptOutcome::AlreadyAllowed);
        }

        let params = self.topology.forwarding(src, dst)?;
        let entry = TableEntry::builder(TABLE_NAME)
            .match_lpm(MATCH_DST_ADDR, params.dst_ip, 32)
            .action(ACTION_FORWARD)
            .param_mac("dstAddr", params.dst_mac)
            .param_port("port", params.egress_port)
            .build();

        let handle = switch.write_table_entry(&entry).await?;
        self.matrix.insert(src, dst, handle);
        info!(src = %src, dst = %dst, "accept rule installed");
        Ok(AcceptOutcome::Installed)
    }

    /// Revokes the accept entry for (src, dst), if one is tracked.
    ///
    /// The matrix entry is removed strictly after the delete succeeds;
    /// on delete failure it is retained so local and remote state never
    /// diverge.
    pub async fn revoke_accept(
        &mut self,
        src: DeviceId,
        dst: DeviceId,
    ) -> FwResult<RevokeOutcome> {
        let switch = Arc::clone(self.switch(src)?);
        if !self.switches.contains_key(&dst) {
            return Err(FwError::UnknownSwitch(dst));
        }
        let Some(handle) = self.matrix.get(src, dst) else {
            return Ok(RevokeOutcome::NothingToRevoke);
        };

        switch.delete_table_entry(handle).await?;
        self.matrix.remove(src, dst);
        info!(src = %src, dst = %dst, "accept rule revoked");
        Ok(RevokeOutcome::Revoked)
    }

    /// Installs accept entries for every topology pair, in
    /// deterministic order (source ascending, then destination
    /// ascending). Safe to repeat; already-installed edges are
    /// skipped without RPCs.
    pub async fn accept_all(&mut self) -> FwResult<Vec<(DeviceId, DeviceId, AcceptOutcome)>> {
        let mut report = Vec::new();
        for (src, dst) in self.topology.pairs() {
            let outcome = self.install_accept(src, dst).await?;
            report.push((src, dst, outcome));
        }
        Ok(report)
    }

    /// The bare `drop` command: revokes every tracked accept edge, then
    /// installs default-drop on every switch. Returns the number of
    /// edges revoked.
    ///
    /// Revoking first keeps the matrix truthful: it never claims an
    /// edge is accepted while the device policy is drop-everything.
    pub async fn lockdown(&mut self) -> FwResult<usize> {
        let edges: Vec<_> = self
            .matrix
            .edges()
            .into_iter()
            .map(|(src, dst, _)| (src, dst))
            .collect();
        let revoked = edges.len();
        for (src, dst) in edges {
            self.revoke_accept(src, dst).await?;
        }
        for device in self.devices() {
            self.install_default_drop(device).await?;
        }
        info!(revoked, "lockdown complete, default action is drop everywhere");
        Ok(revoked)
    }

    /// Reads back every installed row on a switch. No effect on the
    /// matrix.
    pub async fn list_entries(&self, device: DeviceId) -> FwResult<Vec<TableEntry>> {
        let switch = self.switch(device)?;
        Ok(switch.read_table_entries().await?)
    }
}
