//! Binary to run a cellflow simulation from a JSON configuration file.

mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{info, warn};

use cellflow_core::SimRng;
use cellflow_demand::DemandCurve;
use cellflow_net::Network;
use cellflow_output::CsvRecorder;
use cellflow_sim::SimulationBuilder;

use config::Config;

/// cellflow: a discrete-time cellular-automaton urban traffic simulator.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to the JSON configuration file
    #[arg(required = true)]
    config: PathBuf,

    /// Override the master RNG seed from the configuration
    #[arg(long)]
    seed: Option<u64>,

    /// Override the output directory from the configuration
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Write the constructed network as JSON to this path and continue
    #[arg(long)]
    dump_network: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let text = std::fs::read_to_string(&args.config)
        .with_context(|| format!("reading {}", args.config.display()))?;
    let mut config = Config::from_json(&text)?;
    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }

    let params = config.sim_params();

    // The topology draws its light de-synchronization from a child stream so
    // the scheduler's own stream is untouched by network construction.
    let mut root_rng = SimRng::new(params.seed);
    let mut topo_rng = root_rng.child(1);
    let net = config.build_network(&mut topo_rng)?;

    log_startup_banner(&config, &params, &net);

    if let Some(path) = &args.dump_network {
        dump_network_json(&net, path)?;
        info!("network written to {}", path.display());
    }

    let curve = DemandCurve::from_csv_path(&config.demand.curve_file)
        .with_context(|| format!("loading demand curve {}", config.demand.curve_file.display()))?;
    info!("demand curve: {} time-of-day entries", curve.len());

    let mut sim = SimulationBuilder::new(params, net, curve)
        .path_finder(config.path_finder())
        .trip_policy(config.trip_policy())
        .build()?;

    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("creating {}", config.output_dir.display()))?;
    let recorder = CsvRecorder::new(&config.output_dir)?.with_background_flush();

    info!("---------------- simulation start ----------------");
    sim.run(&recorder)?;
    if let Some(e) = recorder.take_error() {
        warn!("record sink reported: {e}");
    }
    info!("---------------- simulation complete ----------------");
    Ok(())
}

fn log_startup_banner(config: &Config, params: &cellflow_sim::SimParams, net: &Network) {
    info!(
        "simulation: {} steps/day x {} days, seed {}",
        params.steps_per_day, params.sim_days, params.seed
    );
    info!(
        "network: {} cells, {} edges, {} lights, avg capacity {:.2}",
        net.cell_count(),
        net.edge_count(),
        net.lights().len(),
        net.avg_capacity()
    );
    info!("network strongly connected: {}", net.is_strongly_connected());
    info!(
        "demand: multiplier {:.2}, fixed {:.2}, day noise {:.2}, tick noise {:.2}",
        params.demand_multiplier, params.demand_fixed, params.day_noise, params.tick_noise
    );
    info!(
        "vehicles: {} closed-loop, trace interval {}",
        params.num_closed, params.trace_interval
    );
    info!(
        "traffic lights: initial period {}, {} scheduled changes",
        config.traffic_light.init_phase_interval,
        params.light_changes.len()
    );
    for change in &params.light_changes {
        info!(
            "  light change: day {} multiplier {:.2}",
            change.day, change.multiplier
        );
    }
    info!(
        "workers: {}, movement: {}",
        params
            .num_threads
            .map(|n| n.to_string())
            .unwrap_or_else(|| "auto".into()),
        if params.serial_movement { "serial" } else { "parallel" }
    );
}

/// Write the network structure (cells with light timing, plus edges) as JSON.
fn dump_network_json(net: &Network, path: &std::path::Path) -> Result<()> {
    let nodes: Vec<serde_json::Value> = net
        .cells()
        .map(|cell| {
            let mut node = serde_json::json!({
                "id": cell.id().0,
                "type": if cell.is_light() { "traffic_light" } else { "common" },
                "max_speed": cell.max_speed(),
                "capacity": cell.capacity(),
            });
            if let Some(light) = cell.light() {
                let (lo, hi) = light.green_window();
                node["period"] = light.period().into();
                node["green_window"] = serde_json::json!([lo, hi]);
            }
            node
        })
        .collect();

    let edges: Vec<serde_json::Value> = net
        .cells()
        .flat_map(|cell| {
            net.successors(cell.id())
                .iter()
                .map(move |to| serde_json::json!({ "from": cell.id().0, "to": to.0 }))
        })
        .collect();

    let doc = serde_json::json!({ "nodes": nodes, "edges": edges });
    std::fs::write(path, serde_json::to_string_pretty(&doc)?)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
