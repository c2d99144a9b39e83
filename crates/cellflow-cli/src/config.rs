//! Configuration file loading and mapping into engine parameters.
//!
//! The configuration is a single JSON document; unknown fields are rejected
//! so typos fail loudly at startup rather than silently falling back to
//! defaults.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use cellflow_core::SimRng;
use cellflow_net::{topology, Network};
use cellflow_routing::{
    KShortestPathFinder, PathFinder, PathSelection, RandomPathFinder, ShortestPathFinder,
    TripDistancePolicy,
};
use cellflow_sim::{LightChange, SimParams};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub simulation: SimulationConfig,
    pub graph: GraphConfig,
    #[serde(default)]
    pub traffic_light: TrafficLightConfig,
    pub demand: DemandConfig,
    #[serde(default)]
    pub vehicle: VehicleConfig,
    #[serde(default)]
    pub trip_distance: TripDistanceConfig,
    #[serde(default)]
    pub path: PathConfig,
    #[serde(default)]
    pub movement: MovementConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    pub one_day_time_steps: u64,
    pub sim_days: u64,
    #[serde(default)]
    pub num_threads: Option<usize>,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_seed() -> u64 {
    42
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphType {
    Cycle,
    StarRing,
}

impl Default for GraphType {
    fn default() -> Self {
        GraphType::Cycle
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphConfig {
    #[serde(rename = "type", default)]
    pub graph_type: GraphType,
    #[serde(default)]
    pub cycle: CycleGraphConfig,
    #[serde(default)]
    pub star_ring: StarRingGraphConfig,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CycleGraphConfig {
    pub num_cells: usize,
    pub light_interval: usize,
}

impl Default for CycleGraphConfig {
    fn default() -> Self {
        Self {
            num_cells: 8000,
            light_interval: 800,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StarRingGraphConfig {
    pub ring_cells: usize,
    pub star_cells: usize,
}

impl Default for StarRingGraphConfig {
    fn default() -> Self {
        Self {
            ring_cells: 100,
            star_cells: 80,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrafficLightConfig {
    pub init_phase_interval: u32,
    #[serde(default)]
    pub changes: Vec<TrafficLightChange>,
}

impl Default for TrafficLightConfig {
    fn default() -> Self {
        Self {
            init_phase_interval: 120,
            changes: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrafficLightChange {
    pub day: u64,
    pub multiplier: f64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DemandConfig {
    pub curve_file: PathBuf,
    #[serde(default = "default_one")]
    pub multiplier: f64,
    #[serde(default)]
    pub fixed_num: f64,
    #[serde(default)]
    pub day_random_dis_range: f64,
    #[serde(default)]
    pub random_dis_range: f64,
}

fn default_one() -> f64 {
    1.0
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct VehicleConfig {
    #[serde(default)]
    pub num_closed: usize,
    #[serde(default)]
    pub trace_interval: u64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TripDistanceConfig {
    #[serde(default = "default_true")]
    pub enable_limit: bool,
    #[serde(default = "TripDistanceConfig::default_prob_short")]
    pub prob_short: f64,
    #[serde(default = "TripDistanceConfig::default_prob_medium")]
    pub prob_medium: f64,
    #[serde(default = "TripDistanceConfig::default_prob_long")]
    pub prob_long: f64,
    #[serde(default = "TripDistanceConfig::default_prob_very_long")]
    pub prob_very_long: f64,
    #[serde(default = "TripDistanceConfig::default_prob_extreme")]
    pub prob_extreme: f64,
    #[serde(default = "default_one")]
    pub min_dist_multiplier: f64,
    #[serde(default = "default_one")]
    pub max_dist_multiplier: f64,
}

fn default_true() -> bool {
    true
}

impl TripDistanceConfig {
    fn default_prob_short() -> f64 {
        0.51
    }
    fn default_prob_medium() -> f64 {
        0.71
    }
    fn default_prob_long() -> f64 {
        0.81
    }
    fn default_prob_very_long() -> f64 {
        0.92
    }
    fn default_prob_extreme() -> f64 {
        0.95
    }
}

impl Default for TripDistanceConfig {
    fn default() -> Self {
        Self {
            enable_limit: true,
            prob_short: Self::default_prob_short(),
            prob_medium: Self::default_prob_medium(),
            prob_long: Self::default_prob_long(),
            prob_very_long: Self::default_prob_very_long(),
            prob_extreme: Self::default_prob_extreme(),
            min_dist_multiplier: 1.0,
            max_dist_multiplier: 1.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathMethod {
    Shortest,
    Random,
    KShortest,
}

impl Default for PathMethod {
    fn default() -> Self {
        PathMethod::Shortest
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PathConfig {
    #[serde(default)]
    pub method: PathMethod,
    #[serde(default)]
    pub k_shortest: KShortestConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    Random,
    Weighted,
}

impl Default for SelectionStrategy {
    fn default() -> Self {
        SelectionStrategy::Random
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KShortestConfig {
    pub k: usize,
    #[serde(default)]
    pub selection: SelectionStrategy,
    #[serde(default = "default_one")]
    pub length_weight_factor: f64,
}

impl Default for KShortestConfig {
    fn default() -> Self {
        Self {
            k: 3,
            selection: SelectionStrategy::Random,
            length_weight_factor: 1.0,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct MovementConfig {
    #[serde(default)]
    pub serial: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    pub interval_log: u64,
    pub interval_other_data: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            interval_log: 600,
            interval_other_data: 1800,
        }
    }
}

impl Config {
    /// Parse and sanity-check a configuration document.
    pub fn from_json(text: &str) -> Result<Config> {
        let config: Config = serde_json::from_str(text).context("parsing configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.traffic_light.init_phase_interval == 0 {
            bail!("traffic_light.init_phase_interval must be positive");
        }
        if self.path_config_k() == 0 {
            bail!("path.k_shortest.k must be positive");
        }
        let td = &self.trip_distance;
        let cumulative = [
            td.prob_short,
            td.prob_medium,
            td.prob_long,
            td.prob_very_long,
            td.prob_extreme,
        ];
        if cumulative.windows(2).any(|w| w[0] > w[1]) || td.prob_extreme > 1.0 {
            bail!("trip_distance probabilities must be cumulative and at most 1");
        }
        if td.min_dist_multiplier <= 0.0 || td.max_dist_multiplier <= 0.0 {
            bail!("trip_distance multipliers must be positive");
        }
        Ok(())
    }

    fn path_config_k(&self) -> usize {
        self.path.k_shortest.k
    }

    /// Scheduler parameters derived from this configuration.  Domain checks
    /// the scheduler cares about happen again in `SimParams::validate`.
    pub fn sim_params(&self) -> SimParams {
        SimParams {
            steps_per_day: self.simulation.one_day_time_steps,
            sim_days: self.simulation.sim_days,
            seed: self.simulation.seed,
            num_threads: self.simulation.num_threads,
            num_closed: self.vehicle.num_closed,
            trace_interval: self.vehicle.trace_interval,
            demand_multiplier: self.demand.multiplier,
            demand_fixed: self.demand.fixed_num,
            day_noise: self.demand.day_random_dis_range,
            tick_noise: self.demand.random_dis_range,
            light_changes: self
                .traffic_light
                .changes
                .iter()
                .map(|c| LightChange {
                    day: c.day,
                    multiplier: c.multiplier,
                })
                .collect(),
            serial_movement: self.movement.serial,
            log_interval: self.logging.interval_log,
            flush_interval: self.logging.interval_other_data,
        }
    }

    /// Build the configured network topology.
    pub fn build_network(&self, rng: &mut SimRng) -> Result<Network> {
        let period = self.traffic_light.init_phase_interval;
        let net = match self.graph.graph_type {
            GraphType::Cycle => topology::cycle(
                self.graph.cycle.num_cells,
                self.graph.cycle.light_interval,
                period,
                rng,
            ),
            GraphType::StarRing => topology::star_ring(
                self.graph.star_ring.ring_cells,
                self.graph.star_ring.star_cells,
                period,
                rng,
            ),
        }?;
        Ok(net)
    }

    pub fn trip_policy(&self) -> TripDistancePolicy {
        let td = &self.trip_distance;
        TripDistancePolicy {
            enable_limit: td.enable_limit,
            prob_short: td.prob_short,
            prob_medium: td.prob_medium,
            prob_long: td.prob_long,
            prob_very_long: td.prob_very_long,
            prob_extreme: td.prob_extreme,
            min_dist_multiplier: td.min_dist_multiplier,
            max_dist_multiplier: td.max_dist_multiplier,
        }
    }

    pub fn path_finder(&self) -> Box<dyn PathFinder> {
        match self.path.method {
            PathMethod::Shortest => Box::new(ShortestPathFinder),
            PathMethod::Random => Box::new(RandomPathFinder),
            PathMethod::KShortest => Box::new(KShortestPathFinder {
                k: self.path.k_shortest.k,
                selection: match self.path.k_shortest.selection {
                    SelectionStrategy::Random => PathSelection::Random,
                    SelectionStrategy::Weighted => PathSelection::Weighted,
                },
                length_weight_factor: self.path.k_shortest.length_weight_factor,
            }),
        }
    }
}
