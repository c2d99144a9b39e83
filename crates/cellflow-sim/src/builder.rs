//! Fluent builder for constructing a [`Simulation`].

use log::info;

use cellflow_core::{DayClock, SimRng, Tick};
use cellflow_demand::DemandCurve;
use cellflow_net::Network;
use cellflow_routing::{PathFinder, ShortestPathFinder, TripDistancePolicy, TripSampler};

use crate::error::{SimError, SimResult};
use crate::params::SimParams;
use crate::sim::Simulation;

/// Fluent builder for [`Simulation`].
///
/// # Required inputs
///
/// - [`SimParams`] — validated at `build()`
/// - [`Network`] — the frozen cell graph
/// - [`DemandCurve`] — the raw daily curve
///
/// # Optional inputs (have defaults)
///
/// | Method           | Default                        |
/// |------------------|--------------------------------|
/// | `.path_finder(f)`| [`ShortestPathFinder`]         |
/// | `.trip_policy(p)`| [`TripDistancePolicy::default`]|
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimulationBuilder::new(params, network, curve)
///     .path_finder(Box::new(ShortestPathFinder))
///     .build()?;
/// sim.run(&NoopRecorder)?;
/// ```
pub struct SimulationBuilder {
    params: SimParams,
    net: Network,
    curve: DemandCurve,
    finder: Option<Box<dyn PathFinder>>,
    policy: Option<TripDistancePolicy>,
}

impl SimulationBuilder {
    /// Create a builder with all required inputs.
    pub fn new(params: SimParams, net: Network, curve: DemandCurve) -> Self {
        Self {
            params,
            net,
            curve,
            finder: None,
            policy: None,
        }
    }

    /// Supply the path finder used for all trip setup.
    pub fn path_finder(mut self, finder: Box<dyn PathFinder>) -> Self {
        self.finder = Some(finder);
        self
    }

    /// Supply the trip-distance policy for destination sampling.
    pub fn trip_policy(mut self, policy: TripDistancePolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Validate inputs, build the worker pool, and seed the closed fleet.
    ///
    /// Closed-loop recycling re-dispatches vehicles from arbitrary arrival
    /// cells, so a configuration with closed vehicles requires a strongly
    /// connected network; construction fails otherwise, naming the number
    /// of unreachable pairs.
    pub fn build(self) -> SimResult<Simulation> {
        self.params.validate()?;
        if self.curve.is_empty() {
            return Err(SimError::Config("demand curve is empty".into()));
        }
        if self.net.is_empty() {
            return Err(SimError::Config("network has no cells".into()));
        }
        if self.params.num_closed > 0 && !self.net.is_strongly_connected() {
            return Err(SimError::NotStronglyConnected {
                pairs: self.net.unreachable_pairs().len(),
            });
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.params.num_threads.unwrap_or(0))
            .build()
            .map_err(|e| SimError::Config(format!("worker pool: {e}")))?;

        let clock = DayClock::new(self.params.steps_per_day);
        let rng = SimRng::new(self.params.seed);
        let sampler = TripSampler::new(self.policy.unwrap_or_default());
        let finder = self.finder.unwrap_or_else(|| Box::new(ShortestPathFinder));

        let mut sim = Simulation {
            curve: self.curve.clone(),
            raw_curve: self.curve,
            params: self.params,
            net: self.net,
            fleet: Default::default(),
            sampler,
            finder,
            clock,
            now: Tick::ZERO,
            rng,
            pool,
        };

        // Seed the closed fleet into origin buffers at tick 0.  Setup
        // failures (no destination in range, no path) drop the vehicle.
        let mut seeded = 0usize;
        for _ in 0..sim.params.num_closed {
            if sim.spawn_vehicle(Tick::ZERO, true)? {
                seeded += 1;
            }
        }
        if sim.params.num_closed > 0 {
            info!(
                "seeded {seeded}/{} closed vehicles",
                sim.params.num_closed
            );
        }

        Ok(sim)
    }
}
