//! Command dispatcher and startup state machine.
//!
//! The dispatcher is a single-reader interactive loop and the sole
//! mutator of the rule matrix. Startup walks
//! `Initializing → Arbitrating → InstallingPipeline → Ready`; any
//! failure in the arbitration or pipeline phases is fatal and moves
//! directly to `ShuttingDown` — commands are never served against a
//! partially configured device set.

use std::io::Write as _;
use std::path::Path;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{error, info, warn};

use crate::command::Command;
use crate::error::{FwError, FwResult};
use crate::policy::{AcceptOutcome, PolicyEngine, RevokeOutcome};

/// Dispatcher lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Created, startup not yet begun.
    Initializing,
    /// Establishing primary-writer status on every switch.
    Arbitrating,
    /// Installing the compiled pipeline on every switch.
    InstallingPipeline,
    /// Serving operator commands.
    Ready,
    /// Releasing connections.
    ShuttingDown,
    /// All connections released.
    Terminated,
}

impl ControllerState {
    /// State name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            ControllerState::Initializing => "initializing",
            ControllerState::Arbitrating => "arbitrating",
            ControllerState::InstallingPipeline => "installing-pipeline",
            ControllerState::Ready => "ready",
            ControllerState::ShuttingDown => "shutting-down",
            ControllerState::Terminated => "terminated",
        }
    }
}

/// The interactive control loop.
pub struct Dispatcher {
    policy: PolicyEngine,
    state: ControllerState,
}

impl Dispatcher {
    /// Creates a dispatcher over a policy engine.
    pub fn new(policy: PolicyEngine) -> Self {
        Dispatcher {
            policy,
            state: ControllerState::Initializing,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Read access to the policy engine (inspection and tests).
    pub fn policy(&self) -> &PolicyEngine {
        &self.policy
    }

    /// Runs the startup sequence: arbitration on every switch, then
    /// pipeline installation, then rule priming (default-drop
    /// everywhere). Must succeed before [`run`] will serve commands.
    ///
    /// [`run`]: Dispatcher::run
    pub async fn startup(&mut self, p4info: &Path, pipeline: &Path) -> FwResult<()> {
        match self.startup_phases(p4info, pipeline).await {
            Ok(()) => {
                self.state = ControllerState::Ready;
                info!("startup complete, accepting commands");
                Ok(())
            }
            Err(e) => {
                self.state = ControllerState::ShuttingDown;
                Err(e)
            }
        }
    }

    async fn startup_phases(&mut self, p4info: &Path, pipeline: &Path) -> FwResult<()> {
        self.state = ControllerState::Arbitrating;
        for switch in self.policy.switches() {
            switch.master_arbitration_update().await?;
            info!(switch = %switch.info().name, "established as primary writer");
        }

        self.state = ControllerState::InstallingPipeline;
        for switch in self.policy.switches() {
            switch
                .set_forwarding_pipeline_config(p4info, pipeline)
                .await?;
            info!(switch = %switch.info().name, "installed forwarding pipeline");
        }

        // Rule priming: traffic is dropped by default until the
        // operator installs accept edges.
        for device in self.policy.devices() {
            self.policy.install_default_drop(device).await?;
        }
        Ok(())
    }

    /// Runs the command loop over a line source until end of input.
    ///
    /// Unrecognized input is ignored with a diagnostic; transport
    /// failures inside a command are printed and the loop continues.
    /// After every recognized command the current table state of every
    /// switch is read back and printed.
    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, reader: R) -> FwResult<()> {
        if self.state != ControllerState::Ready {
            return Err(FwError::NotReady {
                state: self.state.name(),
            });
        }

        let mut lines = reader.lines();
        loop {
            prompt();
            let Some(line) = lines.next_line().await? else {
                info!("end of input");
                break;
            };
            if line.trim().is_empty() {
                continue;
            }
            self.handle_command(Command::parse(&line)).await;
        }
        Ok(())
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::AcceptAll => match self.policy.accept_all().await {
                Ok(report) => {
                    for (src, dst, outcome) in report {
                        match outcome {
                            AcceptOutcome::Installed => {
                                println!("Allowed traffic from switch {src} to switch {dst}");
                            }
                            AcceptOutcome::AlreadyAllowed => {
                                println!(
                                    "Already allowing traffic from switch {src} to switch {dst}"
                                );
                            }
                        }
                    }
                }
                Err(e) => report_failure("accept", &e),
            },
            Command::DropAll => match self.policy.lockdown().await {
                Ok(revoked) => {
                    println!(
                        "Revoked {revoked} accept rule(s); default action is now drop on every switch"
                    );
                }
                Err(e) => report_failure("drop", &e),
            },
            Command::DropEdge { src, dst } => match self.policy.revoke_accept(src, dst).await {
                Ok(RevokeOutcome::Revoked) => {
                    println!("Connection from {src} to {dst} dropped");
                }
                Ok(RevokeOutcome::NothingToRevoke) => {
                    println!("There's no allowed traffic from switch {src} to {dst}");
                }
                Err(e) => report_failure("drop", &e),
            },
            Command::Unknown => {
                println!("Unrecognized command (expected: accept | drop | drop <src> <dst>)");
                return;
            }
        }
        self.report_tables().await;
    }

    /// Reads back and prints every switch's table state. Diagnostic
    /// only; has no effect on the rule matrix.
    async fn report_tables(&self) {
        for device in self.policy.devices() {
            let name = match self.policy.switch(device) {
                Ok(switch) => switch.info().name.clone(),
                Err(_) => continue,
            };
            println!("----- Table entries for {name} (device {device}) -----");
            match self.policy.list_entries(device).await {
                Ok(entries) => {
                    for entry in entries {
                        println!("{entry}");
                    }
                }
                Err(e) => {
                    warn!(device = %device, "table readback failed: {e}");
                    println!("(readback failed: {e})");
                }
            }
        }
    }

    /// Releases every switch connection. Idempotent; listener tasks
    /// unblock from their closed digest streams as a side effect.
    pub async fn shutdown(&mut self) {
        self.state = ControllerState::ShuttingDown;
        for switch in self.policy.switches() {
            if let Err(e) = switch.shutdown().await {
                warn!(switch = %switch.info().name, "shutdown failed: {e}");
            }
        }
        self.state = ControllerState::Terminated;
        info!("all switch connections released");
    }
}

fn prompt() {
    print!("# Please enter a command: ");
    let _ = std::io::stdout().flush();
}

fn report_failure(command: &str, err: &FwError) {
    error!(command, "command failed: {err}");
    println!("Command failed: {err}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use p4fw_runtime::sim::{SimOp, SimSwitch};
    use p4fw_runtime::{DigestMessage, SwitchHandle};
    use p4fw_types::DeviceId;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use tokio::io::BufReader;

    use crate::policy::{ACTION_DROP, TABLE_NAME};
    use crate::topology::{Topology, BUILTIN_SWITCHES};

    fn fabric() -> (Dispatcher, Vec<Arc<SimSwitch>>) {
        let mut switches: BTreeMap<DeviceId, Arc<dyn SwitchHandle>> = BTreeMap::new();
        let mut sims = Vec::new();
        for spec in BUILTIN_SWITCHES {
            let sim = Arc::new(SimSwitch::new(spec.to_info()));
            sims.push(Arc::clone(&sim));
            switches.insert(spec.device_id, sim);
        }
        let engine = PolicyEngine::new(Topology::builtin().clone(), switches);
        (Dispatcher::new(engine), sims)
    }

    async fn run_script(dispatcher: &mut Dispatcher, script: &str) {
        let input = script.as_bytes().to_vec();
        dispatcher
            .run(BufReader::new(&input[..]))
            .await
            .unwrap();
    }

    fn paths() -> (&'static Path, &'static Path) {
        (Path::new("fw.p4info"), Path::new("fw.json"))
    }

    #[tokio::test]
    async fn test_startup_sequence() {
        let (mut dispatcher, sims) = fabric();
        let (p4info, pipeline) = paths();

        assert_eq!(dispatcher.state(), ControllerState::Initializing);
        dispatcher.startup(p4info, pipeline).await.unwrap();
        assert_eq!(dispatcher.state(), ControllerState::Ready);

        for sim in &sims {
            // Arbitration, pipeline, then the priming default-drop.
            assert_eq!(
                sim.calls(),
                vec![SimOp::Arbitrate, SimOp::SetPipeline, SimOp::Write]
            );
            assert_eq!(
                sim.default_action(TABLE_NAME).unwrap().action,
                ACTION_DROP
            );
        }
    }

    #[tokio::test]
    async fn test_startup_gating_on_pipeline_failure() {
        let (mut dispatcher, sims) = fabric();
        let (p4info, pipeline) = paths();

        sims[1].fail_next(SimOp::SetPipeline);
        assert!(dispatcher.startup(p4info, pipeline).await.is_err());
        assert_eq!(dispatcher.state(), ControllerState::ShuttingDown);

        // Never READY, zero table writes anywhere.
        for sim in &sims {
            assert_eq!(sim.call_count(SimOp::Write), 0);
        }
        assert!(dispatcher
            .run(BufReader::new(&b"accept\n"[..]))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_startup_gating_on_arbitration_failure() {
        let (mut dispatcher, sims) = fabric();
        let (p4info, pipeline) = paths();

        sims[2].fail_next(SimOp::Arbitrate);
        assert!(dispatcher.startup(p4info, pipeline).await.is_err());
        assert_eq!(dispatcher.state(), ControllerState::ShuttingDown);
        for sim in &sims {
            assert_eq!(sim.call_count(SimOp::SetPipeline), 0);
            assert_eq!(sim.call_count(SimOp::Write), 0);
        }
    }

    #[tokio::test]
    async fn test_run_requires_ready() {
        let (mut dispatcher, _sims) = fabric();
        let err = dispatcher
            .run(BufReader::new(&b"accept\n"[..]))
            .await
            .unwrap_err();
        assert!(matches!(err, FwError::NotReady { state: "initializing" }));
    }

    #[tokio::test]
    async fn test_accept_then_drop_edge() {
        let (mut dispatcher, sims) = fabric();
        let (p4info, pipeline) = paths();
        dispatcher.startup(p4info, pipeline).await.unwrap();

        run_script(&mut dispatcher, "accept\n").await;
        assert_eq!(dispatcher.policy().matrix().len(), 9);
        assert_eq!(sims[0].installed_rows().len(), 3);

        run_script(&mut dispatcher, "drop 0 1\n").await;
        assert_eq!(dispatcher.policy().matrix().len(), 8);
        assert_eq!(sims[0].installed_rows().len(), 2);
        assert!(!dispatcher
            .policy()
            .matrix()
            .contains(DeviceId::new(0), DeviceId::new(1)));
    }

    #[tokio::test]
    async fn test_bad_input_keeps_loop_alive() {
        let (mut dispatcher, _sims) = fabric();
        let (p4info, pipeline) = paths();
        dispatcher.startup(p4info, pipeline).await.unwrap();

        run_script(
            &mut dispatcher,
            "bogus\ndrop 9 9\n\n   \naccept extra tokens\naccept\n",
        )
        .await;
        // The loop survived everything and the final accept ran.
        assert_eq!(dispatcher.policy().matrix().len(), 9);
        assert_eq!(dispatcher.state(), ControllerState::Ready);
    }

    #[tokio::test]
    async fn test_transport_error_does_not_kill_loop() {
        let (mut dispatcher, sims) = fabric();
        let (p4info, pipeline) = paths();
        dispatcher.startup(p4info, pipeline).await.unwrap();

        sims[0].fail_next(SimOp::Write);
        run_script(&mut dispatcher, "accept\naccept\n").await;

        // First accept failed on s1's first write, second repaired it.
        assert_eq!(dispatcher.policy().matrix().len(), 9);
        assert_eq!(dispatcher.state(), ControllerState::Ready);
    }

    #[tokio::test]
    async fn test_digest_noninterference() {
        let (mut dispatcher, sims) = fabric();
        let (p4info, pipeline) = paths();
        dispatcher.startup(p4info, pipeline).await.unwrap();

        // Digests arriving around command processing must not perturb
        // the matrix.
        let tx = sims[0].digest_sender().unwrap();
        for i in 0..10 {
            tx.send(DigestMessage {
                device: DeviceId::new(0),
                list_id: i,
                payload: vec![0xab; 4],
            })
            .await
            .unwrap();
        }
        run_script(&mut dispatcher, "accept\n").await;
        assert_eq!(dispatcher.policy().matrix().len(), 9);
        for sim in &sims {
            // Priming write plus three accepts, nothing extra.
            assert_eq!(sim.call_count(SimOp::Write), 4);
        }
    }

    #[tokio::test]
    async fn test_shutdown_is_orderly() {
        let (mut dispatcher, sims) = fabric();
        let (p4info, pipeline) = paths();
        dispatcher.startup(p4info, pipeline).await.unwrap();

        dispatcher.shutdown().await;
        assert_eq!(dispatcher.state(), ControllerState::Terminated);
        for sim in &sims {
            assert!(sim.digest_sender().is_none());
        }
    }
}
