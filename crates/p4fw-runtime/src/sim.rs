//! In-process switch simulator.
//!
//! [`SimSwitch`] implements [`SwitchHandle`] against an in-memory flow
//! table. It enforces the same call-ordering contract a real device
//! would (arbitration before writes, pipeline before table operations),
//! records every RPC for sequence assertions, and supports one-shot
//! failure injection so transport-error paths can be exercised.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use crate::digest::DigestMessage;
use crate::entry::{EntryHandle, TableEntry};
use crate::error::{RuntimeError, RuntimeResult};
use crate::switch::{SwitchHandle, SwitchInfo};

/// Capacity of the simulated digest channel.
const DIGEST_CHANNEL_CAPACITY: usize = 64;

/// One RPC issued against the simulator, in issue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimOp {
    /// `master_arbitration_update`
    Arbitrate,
    /// `set_forwarding_pipeline_config`
    SetPipeline,
    /// `write_table_entry`
    Write,
    /// `delete_table_entry`
    Delete,
    /// `read_table_entries`
    Read,
    /// `shutdown`
    Shutdown,
}

#[derive(Debug, Default)]
struct SimState {
    arbitrated: bool,
    pipeline_set: bool,
    shut_down: bool,
    next_index: u64,
    /// Installed rows by handle index, in install order.
    rows: BTreeMap<u64, TableEntry>,
    /// Default action per table name.
    default_actions: BTreeMap<String, TableEntry>,
    /// Every RPC issued, including rejected ones.
    calls: Vec<SimOp>,
    /// One-shot failure injection per operation kind.
    fail_next: Vec<SimOp>,
}

/// An in-memory switch used by the daemon binary and the test suite in
/// place of the external gRPC transport.
pub struct SimSwitch {
    info: SwitchInfo,
    state: Mutex<SimState>,
    digest_tx: Mutex<Option<mpsc::Sender<DigestMessage>>>,
    digest_rx: Mutex<Option<mpsc::Receiver<DigestMessage>>>,
}

impl SimSwitch {
    /// Creates a simulator for the given device identity.
    pub fn new(info: SwitchInfo) -> Self {
        let (tx, rx) = mpsc::channel(DIGEST_CHANNEL_CAPACITY);
        SimSwitch {
            info,
            state: Mutex::new(SimState::default()),
            digest_tx: Mutex::new(Some(tx)),
            digest_rx: Mutex::new(Some(rx)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Arranges for the next RPC of the given kind to fail with a
    /// transport error.
    pub fn fail_next(&self, op: SimOp) {
        self.lock().fail_next.push(op);
    }

    /// Returns a sender for injecting digest notifications, or `None`
    /// once the connection has been shut down.
    pub fn digest_sender(&self) -> Option<mpsc::Sender<DigestMessage>> {
        self.digest_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns every RPC issued so far, in order.
    pub fn calls(&self) -> Vec<SimOp> {
        self.lock().calls.clone()
    }

    /// Returns the number of issued RPCs of one kind.
    pub fn call_count(&self, op: SimOp) -> usize {
        self.lock().calls.iter().filter(|c| **c == op).count()
    }

    /// Returns the installed (non-default) rows in install order.
    pub fn installed_rows(&self) -> Vec<TableEntry> {
        self.lock().rows.values().cloned().collect()
    }

    /// Returns the current default action for a table, if one was set.
    pub fn default_action(&self, table: &str) -> Option<TableEntry> {
        self.lock().default_actions.get(table).cloned()
    }

    fn check_open(state: &SimState, device: p4fw_types::DeviceId) -> RuntimeResult<()> {
        if state.shut_down {
            return Err(RuntimeError::ConnectionClosed { device });
        }
        Ok(())
    }

    fn take_injected_failure(state: &mut SimState, op: SimOp, name: &str) -> RuntimeResult<()> {
        if let Some(pos) = state.fail_next.iter().position(|f| *f == op) {
            state.fail_next.remove(pos);
            return Err(RuntimeError::transport(name, "injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl SwitchHandle for SimSwitch {
    fn info(&self) -> &SwitchInfo {
        &self.info
    }

    async fn master_arbitration_update(&self) -> RuntimeResult<()> {
        let mut state = self.lock();
        state.calls.push(SimOp::Arbitrate);
        Self::check_open(&state, self.info.device_id)?;
        Self::take_injected_failure(&mut state, SimOp::Arbitrate, "arbitration")?;
        state.arbitrated = true;
        debug!(device = %self.info.device_id, "arbitration complete");
        Ok(())
    }

    async fn set_forwarding_pipeline_config(
        &self,
        p4info: &Path,
        pipeline: &Path,
    ) -> RuntimeResult<()> {
        let mut state = self.lock();
        state.calls.push(SimOp::SetPipeline);
        Self::check_open(&state, self.info.device_id)?;
        if !state.arbitrated {
            return Err(RuntimeError::NotPrimary {
                device: self.info.device_id,
            });
        }
        Self::take_injected_failure(&mut state, SimOp::SetPipeline, "pipeline install")?;
        state.pipeline_set = true;
        debug!(
            device = %self.info.device_id,
            p4info = %p4info.display(),
            pipeline = %pipeline.display(),
            "pipeline installed"
        );
        Ok(())
    }

    async fn write_table_entry(&self, entry: &TableEntry) -> RuntimeResult<EntryHandle> {
        let mut state = self.lock();
        state.calls.push(SimOp::Write);
        Self::check_open(&state, self.info.device_id)?;
        if !state.arbitrated {
            return Err(RuntimeError::NotPrimary {
                device: self.info.device_id,
            });
        }
        if !state.pipeline_set {
            return Err(RuntimeError::PipelineNotSet {
                device: self.info.device_id,
            });
        }
        Self::take_injected_failure(&mut state, SimOp::Write, "write")?;

        let index = state.next_index;
        state.next_index += 1;
        if entry.default_action {
            state
                .default_actions
                .insert(entry.table.clone(), entry.clone());
        } else {
            state.rows.insert(index, entry.clone());
        }
        Ok(EntryHandle::new(self.info.device_id, index))
    }

    async fn delete_table_entry(&self, handle: EntryHandle) -> RuntimeResult<()> {
        let mut state = self.lock();
        state.calls.push(SimOp::Delete);
        Self::check_open(&state, self.info.device_id)?;
        if !state.arbitrated {
            return Err(RuntimeError::NotPrimary {
                device: self.info.device_id,
            });
        }
        Self::take_injected_failure(&mut state, SimOp::Delete, "delete")?;
        if state.rows.remove(&handle.index).is_none() {
            return Err(RuntimeError::EntryNotFound {
                device: self.info.device_id,
                index: handle.index,
            });
        }
        Ok(())
    }

    async fn read_table_entries(&self) -> RuntimeResult<Vec<TableEntry>> {
        let mut state = self.lock();
        state.calls.push(SimOp::Read);
        Self::check_open(&state, self.info.device_id)?;
        Self::take_injected_failure(&mut state, SimOp::Read, "read")?;
        let mut entries: Vec<TableEntry> = state.default_actions.values().cloned().collect();
        entries.extend(state.rows.values().cloned());
        Ok(entries)
    }

    async fn take_digest_stream(&self) -> Option<mpsc::Receiver<DigestMessage>> {
        self.digest_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    async fn shutdown(&self) -> RuntimeResult<()> {
        let mut state = self.lock();
        state.calls.push(SimOp::Shutdown);
        if state.shut_down {
            return Ok(());
        }
        state.shut_down = true;
        drop(state);
        // Closing the sender ends the digest stream, unblocking any
        // listener task parked on it.
        self.digest_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        debug!(device = %self.info.device_id, "connection released");
        Ok(())
    }
}
