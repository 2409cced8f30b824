//! fwctld daemon entry point.
//!
//! Wires the managed switch set, runs the startup sequence
//! (arbitration → pipeline install → rule priming), spawns one digest
//! listener per switch, then serves the interactive command loop until
//! end of input or interrupt.

use std::collections::BTreeMap;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use tokio::io::BufReader;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use fwctld::digest::spawn_digest_listeners;
use fwctld::{ControllerArgs, Dispatcher, PolicyEngine, Topology};
use p4fw_runtime::{SimSwitch, SwitchHandle};
use p4fw_types::DeviceId;

/// Initializes tracing/logging.
fn init_logging(level: &str) {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = ControllerArgs::parse();
    init_logging(&args.log_level);

    if let Err(e) = args.validate() {
        let _ = ControllerArgs::command().print_help();
        eprintln!("\n{e}");
        return ExitCode::FAILURE;
    }

    info!("--- Starting fwctld ---");

    // The switch set is fixed for the session; handles are owned here
    // and referenced everywhere else by device id.
    let mut switches: BTreeMap<DeviceId, Arc<dyn SwitchHandle>> = BTreeMap::new();
    for spec in fwctld::topology::BUILTIN_SWITCHES {
        let switch = Arc::new(SimSwitch::new(spec.to_info()));
        info!(
            switch = spec.name,
            address = spec.address,
            device = %spec.device_id,
            "connected"
        );
        switches.insert(spec.device_id, switch);
    }
    let listener_handles: Vec<Arc<dyn SwitchHandle>> = switches.values().cloned().collect();

    let policy = PolicyEngine::new(Topology::builtin().clone(), switches);
    let mut dispatcher = Dispatcher::new(policy);

    if let Err(e) = dispatcher.startup(&args.p4info, &args.bmv2_json).await {
        error!("startup failed: {e}");
        dispatcher.shutdown().await;
        return ExitCode::FAILURE;
    }

    // Listeners start only after the device set is fully configured.
    let listeners = spawn_digest_listeners(listener_handles);

    let stdin = BufReader::new(tokio::io::stdin());
    let result = tokio::select! {
        res = dispatcher.run(stdin) => res,
        _ = tokio::signal::ctrl_c() => {
            println!();
            info!("interrupt received, shutting down");
            Ok(())
        }
    };

    dispatcher.shutdown().await;
    for listener in listeners {
        let _ = listener.await;
    }

    match result {
        Ok(()) => {
            info!("fwctld exiting normally");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("fwctld error: {e}");
            ExitCode::FAILURE
        }
    }
}
