//! The `Simulation` struct and its tick loop.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use log::{debug, info};
use rayon::prelude::*;

use cellflow_core::{CellId, DayClock, SimRng, Tick, VehicleId};
use cellflow_demand::DemandCurve;
use cellflow_fleet::Fleet;
use cellflow_net::Network;
use cellflow_routing::{PathFinder, TripSampler};
use cellflow_vehicle::Vehicle;

use crate::error::SimResult;
use crate::params::SimParams;
use crate::recorder::{Recorder, SystemRecord, TraceRecord, VehicleRecord};
use crate::state::TickStats;

/// The simulation engine.
///
/// Owns the network, the vehicle registry, the demand model and the worker
/// pool, and drives the six-phase tick protocol.  Create via
/// [`SimulationBuilder`][crate::SimulationBuilder].
pub struct Simulation {
    pub(crate) params: SimParams,
    pub(crate) net: Network,
    pub(crate) fleet: Fleet,
    pub(crate) raw_curve: DemandCurve,
    pub(crate) curve: DemandCurve,
    pub(crate) sampler: TripSampler,
    pub(crate) finder: Box<dyn PathFinder>,
    pub(crate) clock: DayClock,
    pub(crate) now: Tick,
    pub(crate) rng: SimRng,
    pub(crate) pool: rayon::ThreadPool,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("now", &self.now)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    // ── Public API ────────────────────────────────────────────────────────

    #[inline]
    pub fn network(&self) -> &Network {
        &self.net
    }

    #[inline]
    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    #[inline]
    pub fn current_tick(&self) -> Tick {
        self.now
    }

    /// Run the full configured horizon, then drain the last completions and
    /// finish the recorder.
    pub fn run<R: Recorder>(&mut self, recorder: &R) -> SimResult<()> {
        let total = self.params.total_ticks();
        while self.now.0 < total {
            self.process_tick(recorder)?;
        }

        // Vehicles completing on the final tick never see another reclaim
        // phase; emit their records before closing the sinks.
        for handle in self.fleet.snapshot_completed() {
            let vehicle = handle.lock().unwrap();
            emit_vehicle_records(recorder, &vehicle);
        }
        recorder.flush(self.now);
        recorder.finish();
        Ok(())
    }

    /// Run exactly `n` ticks from the current position (ignores the horizon).
    ///
    /// Useful for tests and incremental stepping; does not drain final
    /// completions or finish the recorder.
    pub fn run_ticks<R: Recorder>(&mut self, n: u64, recorder: &R) -> SimResult<()> {
        for _ in 0..n {
            self.process_tick(recorder)?;
        }
        Ok(())
    }

    // ── Core tick processing ──────────────────────────────────────────────

    fn process_tick<R: Recorder>(&mut self, recorder: &R) -> SimResult<()> {
        let now = self.now;

        if self.clock.is_day_start(now) {
            self.start_of_day(now)?;
        }

        self.reclaim_completed(now, recorder)?; // P1
        self.advance_lights(); // P2
        self.generate_vehicles(now)?; // P3
        self.promote_buffered(); // P4
        self.move_active(now); // P5
        self.aggregate(now, recorder); // P6

        self.now = now + 1;
        Ok(())
    }

    /// Day-boundary work: refresh the working demand curve and apply any
    /// traffic-light interval change scheduled for this day.
    fn start_of_day(&mut self, now: Tick) -> SimResult<()> {
        self.curve = self.raw_curve.adjusted(
            self.params.demand_multiplier,
            self.params.demand_fixed,
            self.params.day_noise,
            &mut self.rng,
        );

        let day = self.clock.day(now);
        for change in &self.params.light_changes {
            if change.day != day {
                continue;
            }
            for &light_id in self.net.lights() {
                self.net
                    .cell(light_id)
                    .light()
                    .expect("light registry entry without light state")
                    .change_interval(change.multiplier)?;
            }
            info!(
                "day {day}: traffic light intervals scaled by {:.2}",
                change.multiplier
            );
        }
        Ok(())
    }

    /// P1 — emit records for completed vehicles; recycle closed ones from
    /// their arrival cell, retire open ones.
    ///
    /// A closed vehicle whose new trip cannot be set up (no destination in
    /// range, no path) stays in the completed set and is retried next tick;
    /// its records are only emitted once the recycle succeeds, so nothing is
    /// double-reported.
    fn reclaim_completed<R: Recorder>(&mut self, now: Tick, recorder: &R) -> SimResult<()> {
        for handle in self.fleet.snapshot_completed() {
            let mut vehicle = handle.lock().unwrap();
            if !vehicle.is_closed() {
                emit_vehicle_records(recorder, &vehicle);
                self.fleet.retire(vehicle.id());
                continue;
            }

            let origin = vehicle.destination();
            let Some(destination) = self.sampler.sample_destination(&self.net, origin, &mut self.rng)
            else {
                debug!("vehicle {}: no destination in range of cell {origin}", vehicle.id());
                continue;
            };
            let path = match self.finder.find_path(&self.net, origin, destination, &mut self.rng) {
                Ok(path) => path,
                Err(e) => {
                    debug!("vehicle {}: {e}", vehicle.id());
                    continue;
                }
            };

            emit_vehicle_records(recorder, &vehicle);
            vehicle.reset_for_next_trip()?;
            vehicle.set_od(origin, destination)?;
            vehicle.set_cell_path(path, &self.net)?;
            vehicle.buffer_in(now, &self.net)?;
            self.fleet.reclaim_to_waiting(vehicle.id());
        }
        Ok(())
    }

    /// P2 — advance every light by one counter step.
    ///
    /// A sequential sweep: light state is tiny and the phase store is the
    /// only write other threads ever observe.
    fn advance_lights(&self) {
        for &light_id in self.net.lights() {
            self.net
                .cell(light_id)
                .light()
                .expect("light registry entry without light state")
                .cycle();
        }
    }

    /// P3 — inject demand-driven open vehicles into origin buffers.
    fn generate_vehicles(&mut self, now: Tick) -> SimResult<()> {
        let time_of_day = self.clock.time_of_day(now) as usize;
        let count = self
            .curve
            .generate_count(time_of_day, self.params.tick_noise, &mut self.rng);
        for _ in 0..count {
            self.spawn_vehicle(now, false)?;
        }
        Ok(())
    }

    /// Create one vehicle with a random origin, ranged destination and
    /// random kinematics, and buffer it at its origin.
    ///
    /// Returns `Ok(false)` when the trip was dropped (no reachable
    /// destination or no path); those failures are expected under tight
    /// distance policies and only logged at debug.
    pub(crate) fn spawn_vehicle(&mut self, now: Tick, closed: bool) -> SimResult<bool> {
        let origin = CellId(self.rng.index(self.net.cell_count()) as u32);
        let Some(destination) = self.sampler.sample_destination(&self.net, origin, &mut self.rng)
        else {
            debug!("no destination in range of cell {origin}, vehicle dropped");
            return Ok(false);
        };
        let path = match self.finder.find_path(&self.net, origin, destination, &mut self.rng) {
            Ok(path) => path,
            Err(e) => {
                debug!("vehicle dropped: {e}");
                return Ok(false);
            }
        };

        let id = self.fleet.reserve_id();
        let velocity = self.rng.between(1, 3);
        let acceleration = self.rng.between(1, 3);
        let slowing_prob = self.rng.unit() * 0.5;
        let mut vehicle = Vehicle::new(
            id,
            velocity,
            acceleration,
            1.0,
            slowing_prob,
            closed,
            self.params.seed,
            self.params.trace_interval,
        );
        vehicle.set_od(origin, destination)?;
        vehicle.set_cell_path(path, &self.net)?;
        vehicle.buffer_in(now, &self.net)?;
        self.fleet.register_waiting(Arc::new(Mutex::new(vehicle)));
        Ok(true)
    }

    /// P4 — re-evaluate FIFO admission for every waiting vehicle and move
    /// the admitted ones onto the network.
    ///
    /// Parallel across vehicles; per-cell buffer and container locks
    /// serialize same-origin admissions.  Registry set transitions happen
    /// after the join.
    fn promote_buffered(&self) {
        let waiting = self.fleet.snapshot_waiting();
        if waiting.is_empty() {
            return;
        }

        let net = &self.net;
        let activated: Vec<VehicleId> = self.pool.install(|| {
            waiting
                .par_iter()
                .filter_map(|handle| {
                    let mut vehicle = handle.lock().unwrap();
                    if !vehicle.update_active_state(net) {
                        return None;
                    }
                    match vehicle.enter_network(net) {
                        Ok(()) => Some(vehicle.id()),
                        Err(e) => {
                            debug!("vehicle {} entry failed: {e}", vehicle.id());
                            None
                        }
                    }
                })
                .collect()
        });

        for id in activated {
            self.fleet.promote_to_active(id);
        }
    }

    /// P5 — advance every active vehicle by one movement step.
    ///
    /// The active set is shuffled into a tick-local order from the
    /// scheduler's RNG stream, then partitioned into near-equal worker
    /// slices.  Completions drain through a channel after the join; the
    /// scheduler then moves them into the completed set.
    fn move_active(&mut self, now: Tick) {
        let mut active = self.fleet.snapshot_active();
        if active.is_empty() {
            return;
        }
        self.rng.shuffle(&mut active);

        let net = &self.net;
        let completed: Vec<VehicleId> = if self.params.serial_movement {
            active
                .iter()
                .filter_map(|handle| {
                    let mut vehicle = handle.lock().unwrap();
                    if vehicle.advance(now, net) {
                        Some(vehicle.id())
                    } else {
                        None
                    }
                })
                .collect()
        } else {
            let workers = self.pool.current_num_threads().max(1);
            let chunk = active.len().div_ceil(workers);
            let (tx, rx) = mpsc::channel();
            self.pool.install(|| {
                active.par_chunks(chunk).for_each_with(tx, |tx, slice| {
                    for handle in slice {
                        let mut vehicle = handle.lock().unwrap();
                        if vehicle.advance(now, net) {
                            let _ = tx.send(vehicle.id());
                        }
                    }
                });
            });
            rx.into_iter().collect()
        };

        for id in completed {
            self.fleet.mark_completed(id);
        }
    }

    /// P6 — compute aggregates, emit the system record and log at the
    /// configured intervals.
    fn aggregate<R: Recorder>(&self, now: Tick, recorder: &R) {
        let stats = TickStats::collect(&self.net, &self.fleet);
        let counts = self.fleet.counts();

        recorder.record_system(&SystemRecord {
            time_step: now.0,
            generated: counts.generated,
            active: counts.active,
            waiting: counts.waiting,
            completed: counts.completed,
            average_speed: stats.average_speed,
            density: stats.density,
        });

        let time_of_day = self.clock.time_of_day(now);
        if time_of_day % self.params.log_interval == 0 {
            let (hour, minute) = self.clock.hhmm(now);
            info!(
                "day {} {:02}:{:02} | speed {:.2} density {:.4} | generated {} active {} \
                 on-road {} waiting {} completed {}",
                self.clock.day(now),
                hour,
                minute,
                stats.average_speed,
                stats.density,
                counts.generated,
                counts.active,
                stats.on_road,
                counts.waiting,
                counts.completed,
            );
        }
        if time_of_day % self.params.flush_interval == 0 {
            recorder.flush(now);
        }
    }
}

/// Emit the vehicle record and trace records for one completed journey.
fn emit_vehicle_records<R: Recorder>(recorder: &R, vehicle: &Vehicle) {
    recorder.record_vehicle(&VehicleRecord {
        vehicle_id: vehicle.id().0,
        acceleration: vehicle.acceleration(),
        slowing_prob: vehicle.slowing_prob(),
        origin: vehicle.origin().0,
        destination: vehicle.destination().0,
        in_time: vehicle.in_time().0,
        out_time: vehicle
            .out_time()
            .expect("completed vehicle carries an out time")
            .0,
        tag: vehicle.tag(),
        closed: vehicle.is_closed(),
        path_length: vehicle.path_length(),
        path_cells: vehicle.route().iter().map(|c| c.0).collect(),
    });

    let points: Vec<TraceRecord> = vehicle
        .trace()
        .points()
        .iter()
        .map(|p| TraceRecord {
            vehicle_id: vehicle.id().0,
            time: p.time.0,
            cell: p.cell.0,
        })
        .collect();
    if !points.is_empty() {
        recorder.record_trace(&points);
    }
}
