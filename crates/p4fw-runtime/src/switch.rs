//! The per-device capability trait consumed by the controller.

use async_trait::async_trait;
use p4fw_types::DeviceId;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::mpsc;

use crate::digest::DigestMessage;
use crate::entry::{EntryHandle, TableEntry};
use crate::error::RuntimeResult;

/// Identity attributes of a managed switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchInfo {
    /// Human-readable name (e.g., "s1").
    pub name: String,
    /// Network address of the device's RPC endpoint.
    pub address: String,
    /// Unique device identifier, immutable once connected.
    pub device_id: DeviceId,
}

impl SwitchInfo {
    /// Creates switch identity attributes.
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        device_id: DeviceId,
    ) -> Self {
        SwitchInfo {
            name: name.into(),
            address: address.into(),
            device_id,
        }
    }
}

/// Capability interface to one managed device.
///
/// Call ordering contract: [`master_arbitration_update`] must complete
/// before any write or delete, and
/// [`set_forwarding_pipeline_config`] must follow arbitration and
/// precede any table write. Implementations are responsible for making
/// the underlying channel safe under concurrent use (control-plane
/// writes from the dispatcher vs. digest reads from a listener task).
///
/// [`master_arbitration_update`]: SwitchHandle::master_arbitration_update
/// [`set_forwarding_pipeline_config`]: SwitchHandle::set_forwarding_pipeline_config
#[async_trait]
pub trait SwitchHandle: Send + Sync {
    /// Returns the device's identity attributes.
    fn info(&self) -> &SwitchInfo;

    /// Establishes this controller as the device's primary writer.
    async fn master_arbitration_update(&self) -> RuntimeResult<()>;

    /// Installs the compiled data-plane program and its metadata.
    async fn set_forwarding_pipeline_config(
        &self,
        p4info: &Path,
        pipeline: &Path,
    ) -> RuntimeResult<()>;

    /// Writes a table entry; returns the handle required to delete it.
    async fn write_table_entry(&self, entry: &TableEntry) -> RuntimeResult<EntryHandle>;

    /// Deletes the table row identified by a previously returned handle.
    async fn delete_table_entry(&self, handle: EntryHandle) -> RuntimeResult<()>;

    /// Reads back all installed rows; one finite pass per call.
    async fn read_table_entries(&self) -> RuntimeResult<Vec<TableEntry>>;

    /// Takes the device's digest stream.
    ///
    /// The stream is lazy, infinite and non-restartable: the first call
    /// returns the receiver, every later call returns `None`. The
    /// receiver yields `None` once the remote closes the stream.
    async fn take_digest_stream(&self) -> Option<mpsc::Receiver<DigestMessage>>;

    /// Releases the connection. Idempotent.
    async fn shutdown(&self) -> RuntimeResult<()>;
}
