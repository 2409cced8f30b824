//! Per-switch digest listener tasks.
//!
//! One task per managed switch, started after startup completes and
//! before the first command is read. Each task drains its switch's
//! digest stream and surfaces notifications through the log. Listeners
//! hold no reference to the rule matrix; digests are best-effort
//! telemetry, not a synchronization signal, and a listener's death is
//! not fatal to the dispatcher.

use p4fw_runtime::SwitchHandle;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Spawns one listener task per switch handle.
pub fn spawn_digest_listeners(
    switches: impl IntoIterator<Item = Arc<dyn SwitchHandle>>,
) -> Vec<JoinHandle<()>> {
    switches.into_iter().map(spawn_digest_listener).collect()
}

/// Spawns the listener task for one switch. The task runs until the
/// digest stream closes (remote shutdown or process teardown).
pub fn spawn_digest_listener(switch: Arc<dyn SwitchHandle>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let name = switch.info().name.clone();
        let Some(mut stream) = switch.take_digest_stream().await else {
            warn!(switch = %name, "digest stream already taken, listener not started");
            return;
        };
        info!(switch = %name, "digest listener started");
        while let Some(msg) = stream.recv().await {
            info!(switch = %name, "{msg}");
        }
        info!(switch = %name, "digest stream closed, listener exiting");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use p4fw_runtime::{DigestMessage, SimSwitch, SwitchInfo};
    use p4fw_types::DeviceId;

    fn sim() -> Arc<SimSwitch> {
        Arc::new(SimSwitch::new(SwitchInfo::new(
            "s1",
            "127.0.0.1:50051",
            DeviceId::new(0),
        )))
    }

    #[tokio::test]
    async fn test_listener_exits_on_stream_close() {
        let sw = sim();
        let handle = spawn_digest_listener(Arc::clone(&sw) as Arc<dyn SwitchHandle>);

        let tx = sw.digest_sender().unwrap();
        tx.send(DigestMessage {
            device: DeviceId::new(0),
            list_id: 1,
            payload: vec![1, 2, 3],
        })
        .await
        .unwrap();

        // Shutdown closes the stream; the task must unblock and finish.
        sw.shutdown().await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_second_listener_declines() {
        let sw = sim();
        let first = spawn_digest_listener(Arc::clone(&sw) as Arc<dyn SwitchHandle>);
        // Give the first task a chance to take the stream.
        tokio::task::yield_now().await;
        let second = spawn_digest_listener(Arc::clone(&sw) as Arc<dyn SwitchHandle>);
        second.await.unwrap();

        sw.shutdown().await.unwrap();
        first.await.unwrap();
    }
}
