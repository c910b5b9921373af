use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use log::info;
use teleop::{ControlLoop, KeyStateTracker, LogSink, VehicleSink};
use tokio::sync::watch;

mod app;
mod cli;
mod flight_axis;
mod input;

use cli::{Args, SinkKind};
use flight_axis::FlightAxis;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let bindings = args.key_bindings()?;
    let config = args.control_config()?;
    let keys = Arc::new(KeyStateTracker::new(bindings));

    let mut flight_axis = None;
    let sink: Box<dyn VehicleSink> = match args.sink {
        SinkKind::Log => Box::new(LogSink::new()),
        SinkKind::FlightAxis => {
            let mut link = FlightAxis::new(args.flight_axis_url.clone());
            link.start();
            let sink = Box::new(link.sink());
            flight_axis = Some(link);
            sink
        }
    };
    let telemetry = flight_axis.as_ref().map(FlightAxis::shared_state);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_time()
        .build()
        .context("Failed to start control runtime")?;
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let control = ControlLoop::new(keys.clone(), sink, config)?;
    let session = runtime.spawn(control.run(cancel_rx));

    // the window must own the main thread; the control loop runs on the runtime meanwhile
    let window = eframe::run_native(
        "DucPilot Teleop",
        eframe::NativeOptions::default(),
        Box::new(move |cc| Ok(Box::new(app::TeleopApp::new(cc, keys, telemetry)))),
    );

    // closing the window ends the session at the next tick boundary
    let _ = cancel_tx.send(true);
    let report = runtime
        .block_on(session)
        .context("Control loop task failed")?;
    info!(
        "Session finished: {:?}, {} commands, {} directives",
        report.exit, report.ticks, report.directives
    );

    if let Some(mut link) = flight_axis {
        let state = link.state();
        info!(
            "RealFlight link {} at exit, altitude {:.1} m",
            if state.connected { "up" } else { "down" },
            state.altitude
        );
        link.stop();
    }
    window.map_err(|e| anyhow::anyhow!("Teleop window failed: {}", e))
}
