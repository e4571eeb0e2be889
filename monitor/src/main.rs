use anyhow::Context;
use clap::Parser;
use generator::profile::SyntheticTransport;
use generator::replay::{RecordingTransport, ReplayTransport};
use log::{info, warn};
use radarcore::sensor::Transport;
use status_bridge::bridge::StatusBridge;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::MonitorConfig;
use workflow::runner::Runner;

mod generator;
mod status_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Radar speed trap: estimate, track and capture speeding targets")]
struct Args {
    /// Load a monitor config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Replay frames from a JSON-lines capture instead of the synthetic target
    #[arg(long)]
    replay: Option<PathBuf>,
    /// Record every frame read to a JSON-lines capture
    #[arg(long)]
    record: Option<PathBuf>,
    /// Sensor index
    #[arg(long)]
    sensor: Option<u32>,
    /// Speed limit in the configured unit
    #[arg(long)]
    speed_limit: Option<f64>,
    /// Directory receiving the report files
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Stop after this many frames
    #[arg(long)]
    frames: Option<u64>,
    /// Serve the live status over HTTP
    #[arg(long, default_value_t = false)]
    serve: bool,
    #[arg(long, default_value = "127.0.0.1:9000")]
    bind: SocketAddr,
    /// Increase logging verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn build_transport(args: &Args, config: &MonitorConfig) -> anyhow::Result<Box<dyn Transport>> {
    let transport: Box<dyn Transport> = match &args.replay {
        Some(path) => Box::new(ReplayTransport::new(path)),
        None => Box::new(SyntheticTransport::new(config.generator.clone())),
    };
    match &args.record {
        Some(path) => {
            let recording = RecordingTransport::create(transport, path)
                .with_context(|| format!("creating capture file {}", path.display()))?;
            Ok(Box::new(recording))
        }
        None => Ok(transport),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let monitor_config = match &args.config {
        Some(path) => MonitorConfig::load(path)?,
        None => MonitorConfig::default(),
    }
    .with_overrides(args.sensor, args.speed_limit, args.output_dir.clone());
    info!("radarcat starting with config {:?}", monitor_config);

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating runtime for capture actions")?;

    let stop = Arc::new(AtomicBool::new(false));
    let stop_on_signal = stop.clone();
    runtime.spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, ending session");
                stop_on_signal.store(true, Ordering::Relaxed);
            }
            Err(err) => warn!("unable to listen for Ctrl+C: {}", err),
        }
    });

    let bridge = if args.serve {
        let bridge = StatusBridge::new();
        bridge.serve(runtime.handle(), args.bind);
        Some(bridge)
    } else {
        None
    };

    let runner = Runner::new(monitor_config.clone());
    let transport = build_transport(&args, &monitor_config)?;
    println!("Press Ctrl-C to end session");
    let summary = runner.execute(
        transport,
        None,
        runtime.handle(),
        &stop,
        args.frames,
        bridge.as_ref(),
    )?;

    println!(
        "Session ended -> frames {}, detections {}, skipped {}, captures {}",
        summary.frames,
        summary.metrics.detections,
        summary.metrics.skipped,
        summary.metrics.captures
    );
    Ok(())
}
