use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use netscenario::builders::mobility;
use netscenario::entry::{self, Entry};
use netscenario::model::{Mobility, MobilityKind, Network};
use netscenario::{BuildContext, BuildError, Domain, ScenarioHelper};
use std::fs;
use std::path::{Path, PathBuf};

/// Mobility type tag for nodes whose trajectory is driven by an external
/// Gazebo simulation
const GAZEBO_TAG: &str = "gazebo";

/// Build a network simulation scenario from JSON/YAML documents
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the root scenario document
    #[arg(short, long)]
    config: PathBuf,

    /// Write the built network here (YAML for .yaml/.yml, JSON otherwise)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log the scheduled timeline after building
    #[arg(long)]
    timeline: bool,
}

/// Gazebo-driven nodes start at their declared position; waypoints are
/// pushed at run time.
fn build_gazebo_mobility(entry: &Entry, ctx: &mut BuildContext<'_>) -> std::result::Result<(), BuildError> {
    let node = entry::node_id(entry)?;
    let position = mobility::initial_position(entry)?;
    ctx.network_mut().install_mobility(
        node,
        Mobility {
            kind: MobilityKind::Waypoint,
            position,
            waypoints: Vec::new(),
        },
    )?;
    Ok(())
}

fn write_network(network: &Network, path: &Path) -> Result<()> {
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    let content = if is_yaml {
        serde_yaml::to_string(network).wrap_err("Failed to serialize network to YAML")?
    } else {
        serde_json::to_string_pretty(network).wrap_err("Failed to serialize network to JSON")?
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("Failed to create output directory '{}'", parent.display()))?;
    }
    fs::write(path, content).wrap_err_with(|| format!("Failed to write network to '{}'", path.display()))?;
    Ok(())
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Starting netscenario");
    info!("Configuration file: {:?}", args.config);

    let mut helper = ScenarioHelper::with_default_builders();
    helper.register(Domain::Mobility, GAZEBO_TAG, build_gazebo_mobility);

    let network = helper
        .build(&args.config)
        .wrap_err_with(|| format!("Failed to build scenario from '{}'", args.config.display()))?;

    let control = network.run_control();
    if let Some(name) = &control.sim_name {
        info!("Simulation: {}", name);
    }
    if let Some(stop) = control.stop_time {
        info!("Stop time: {}", stop);
    }
    info!("Packet captures: {}", control.pcap.len());

    if args.timeline {
        for event in network.timeline().in_order() {
            info!("  at {}: {}", event.at, event.event);
        }
    }

    if let Some(output) = &args.output {
        write_network(&network, output)?;
        info!("Wrote network to: {:?}", output);
    }

    info!("Scenario build completed successfully");
    Ok(())
}
