//! The rule matrix: the controller's authoritative view of installed
//! accept entries.
//!
//! Keyed by (source switch, destination switch). Invariant: a present
//! entry for (src, dst) implies exactly one corresponding accept row on
//! switch src's flow table for traffic destined to dst. Entries move in
//! lockstep with confirmed RPC effects — recorded only after a write
//! succeeds, removed only after a delete succeeds, never speculatively.
//!
//! The matrix is mutated only by the dispatcher thread; digest listener
//! tasks never read or write it.

use p4fw_runtime::EntryHandle;
use p4fw_types::DeviceId;
use std::collections::BTreeMap;

/// Mapping from source switch to destination switch to the handle of
/// the installed accept entry.
#[derive(Debug, Clone, Default)]
pub struct RuleMatrix {
    entries: BTreeMap<DeviceId, BTreeMap<DeviceId, EntryHandle>>,
}

impl RuleMatrix {
    /// Creates an empty matrix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the handle for an installed (src, dst) edge, if present.
    pub fn get(&self, src: DeviceId, dst: DeviceId) -> Option<EntryHandle> {
        self.entries.get(&src).and_then(|row| row.get(&dst)).copied()
    }

    /// Returns true if an accept edge is tracked for (src, dst).
    pub fn contains(&self, src: DeviceId, dst: DeviceId) -> bool {
        self.get(src, dst).is_some()
    }

    /// Records the handle of a freshly installed edge.
    ///
    /// Callers check [`contains`] first; a present edge is a policy
    /// no-op upstream, so insert never silently replaces a handle.
    ///
    /// [`contains`]: RuleMatrix::contains
    pub fn insert(&mut self, src: DeviceId, dst: DeviceId, handle: EntryHandle) {
        self.entries.entry(src).or_default().insert(dst, handle);
    }

    /// Removes a tracked edge, returning its handle.
    pub fn remove(&mut self, src: DeviceId, dst: DeviceId) -> Option<EntryHandle> {
        let row = self.entries.get_mut(&src)?;
        let handle = row.remove(&dst);
        if row.is_empty() {
            self.entries.remove(&src);
        }
        handle
    }

    /// Returns every tracked edge in deterministic order (source
    /// ascending, then destination ascending).
    pub fn edges(&self) -> Vec<(DeviceId, DeviceId, EntryHandle)> {
        self.entries
            .iter()
            .flat_map(|(src, row)| row.iter().map(|(dst, h)| (*src, *dst, *h)))
            .collect()
    }

    /// Returns the destinations currently accepted from one source, in
    /// ascending order.
    pub fn installed_from(&self, src: DeviceId) -> Vec<DeviceId> {
        self.entries
            .get(&src)
            .map(|row| row.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Total number of tracked edges.
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    /// Returns true if no edges are tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn handle(device: u64, index: u64) -> EntryHandle {
        EntryHandle::new(DeviceId::new(device), index)
    }

    #[test]
    fn test_insert_get_remove() {
        let mut matrix = RuleMatrix::new();
        assert!(matrix.is_empty());

        matrix.insert(DeviceId::new(0), DeviceId::new(1), handle(0, 5));
        assert!(matrix.contains(DeviceId::new(0), DeviceId::new(1)));
        assert_eq!(
            matrix.get(DeviceId::new(0), DeviceId::new(1)),
            Some(handle(0, 5))
        );
        assert_eq!(matrix.len(), 1);

        let removed = matrix.remove(DeviceId::new(0), DeviceId::new(1));
        assert_eq!(removed, Some(handle(0, 5)));
        assert!(matrix.is_empty());
    }

    #[test]
    fn test_remove_absent() {
        let mut matrix = RuleMatrix::new();
        assert_eq!(matrix.remove(DeviceId::new(0), DeviceId::new(1)), None);
    }

    #[test]
    fn test_edges_ordering() {
        let mut matrix = RuleMatrix::new();
        matrix.insert(DeviceId::new(2), DeviceId::new(0), handle(2, 1));
        matrix.insert(DeviceId::new(0), DeviceId::new(2), handle(0, 2));
        matrix.insert(DeviceId::new(0), DeviceId::new(1), handle(0, 1));

        let edges: Vec<(DeviceId, DeviceId)> =
            matrix.edges().into_iter().map(|(s, d, _)| (s, d)).collect();
        assert_eq!(
            edges,
            vec![
                (DeviceId::new(0), DeviceId::new(1)),
                (DeviceId::new(0), DeviceId::new(2)),
                (DeviceId::new(2), DeviceId::new(0)),
            ]
        );
    }

    #[test]
    fn test_installed_from() {
        let mut matrix = RuleMatrix::new();
        matrix.insert(DeviceId::new(1), DeviceId::new(2), handle(1, 0));
        matrix.insert(DeviceId::new(1), DeviceId::new(0), handle(1, 1));

        assert_eq!(
            matrix.installed_from(DeviceId::new(1)),
            vec![DeviceId::new(0), DeviceId::new(2)]
        );
        assert!(matrix.installed_from(DeviceId::new(0)).is_empty());
    }
}
