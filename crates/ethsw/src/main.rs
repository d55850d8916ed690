//! ethswd - virtual switch driver
//!
//! Builds a switch from configuration, attaches a recording node to every
//! egress port and replays a short learning scenario through the selected
//! transport discipline. Useful for checking a configuration and for
//! watching the monitor banners a co-simulation run would produce.

use anyhow::{ensure, Context};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use ethsw::{
    EthSwitch, Frame, MacAddress, Phase, PortIndex, RecordingEndpoint, SwitchConfig, SwitchError,
    WallClock,
};

/// Transport discipline used to inject the scenario frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    Blocking,
    NonBlocking,
}

/// Virtual learning Ethernet switch driver
#[derive(Parser, Debug)]
#[command(name = "ethswd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Override the number of ports
    #[arg(short = 'p', long)]
    ports: Option<usize>,

    /// Enable the monitoring tap
    #[arg(short = 'm', long)]
    monitor: bool,

    /// Transport discipline for the scenario
    #[arg(short = 't', long, value_enum, default_value = "blocking")]
    transport: Transport,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,
}

/// Initializes tracing/logging subsystem
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

fn load_config(args: &Args) -> anyhow::Result<SwitchConfig> {
    let mut config = match &args.config {
        Some(path) => SwitchConfig::load_or_default(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SwitchConfig::default(),
    };
    if let Some(ports) = args.ports {
        config.num_ports = ports;
    }
    if args.monitor {
        config.monitor.enabled = true;
    }
    config.validate()?;
    Ok(config)
}

async fn inject(
    switch: &EthSwitch,
    transport: Transport,
    ingress: PortIndex,
    dest: MacAddress,
    src: MacAddress,
) -> ethsw::Result<()> {
    let mut frame = Frame::ethernet(dest, src, 0x88b5, b"ethswd");
    let mut delay = Duration::ZERO;
    match transport {
        Transport::Blocking => switch.b_transport(ingress, &mut frame, &mut delay).await,
        Transport::NonBlocking => {
            let mut phase = Phase::BeginReq;
            let status = switch.nb_transport_fw(ingress, &mut frame, &mut phase, &mut delay)?;
            info!(?status, "non-blocking transport returned");
            Ok(())
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    ensure!(
        config.num_ports >= 3,
        "the scenario needs at least 3 ports, got {}",
        config.num_ports
    );

    let switch = EthSwitch::with_clock(config, Arc::new(WallClock::new()))?;

    let mut nodes = Vec::with_capacity(switch.num_ports());
    for i in 0..switch.num_ports() as u32 {
        let node = RecordingEndpoint::shared(format!("node{i}"));
        switch.bind_tx(PortIndex::new(i), node.clone())?;
        nodes.push(node);
    }

    let monitor = switch.monitor().is_enabled().then(|| {
        let mut events = switch.subscribe_monitor();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                info!(kind = %event.kind, len = event.data.len(), "{}", event.banner);
            }
        })
    });

    let a: MacAddress = "aa:bb:cc:00:00:01".parse()?;
    let b: MacAddress = "aa:bb:cc:00:00:02".parse()?;

    info!("frame {} -> {} on port 0 (destination unknown)", a, b);
    inject(&switch, args.transport, PortIndex::new(0), b, a).await?;

    info!("frame {} -> {} on port 1 (destination learned)", b, a);
    inject(&switch, args.transport, PortIndex::new(1), a, b).await?;

    info!("frame claiming {} on port 2 (spoofed source)", a);
    match inject(&switch, args.transport, PortIndex::new(2), b, a).await {
        Err(err @ SwitchError::InconsistentBinding { .. }) => {
            warn!(error = %err, "rejected as expected");
        }
        other => other?,
    }

    for (key, port) in switch.learning_table().snapshot() {
        info!(%key, %port, "learned");
    }
    for node in &nodes {
        info!(node = node.name(), frames = node.delivery_count(), "delivered");
    }
    info!(stats = ?switch.stats(), "scenario complete");

    // Dropping the last handle closes the monitor channel; drain what is left.
    drop(switch);
    if let Some(handle) = monitor {
        handle.await.context("monitor drain task")?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    info!("--- Starting ethswd ---");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("ethswd failed: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
