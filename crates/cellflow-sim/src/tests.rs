//! Integration tests for the scheduler.

use std::sync::Mutex;

use cellflow_core::Tick;
use cellflow_demand::DemandCurve;
use cellflow_net::{Network, NetworkBuilder};
use cellflow_routing::TripDistancePolicy;

use crate::builder::SimulationBuilder;
use crate::params::{LightChange, SimParams};
use crate::recorder::{NoopRecorder, Recorder, SystemRecord, TraceRecord, VehicleRecord};
use crate::sim::Simulation;

// ── Helpers ───────────────────────────────────────────────────────────────────

/// A ring 0 → 1 → … → n-1 → 0 of unit-capacity cells.
fn ring(n: usize) -> Network {
    let mut b = NetworkBuilder::new();
    let ids: Vec<_> = (0..n).map(|_| b.add_cell(5, 1.0)).collect();
    for pair in ids.windows(2) {
        b.add_edge(pair[0], pair[1]);
    }
    b.add_edge(ids[n - 1], ids[0]);
    b.build()
}

/// A ring with one traffic light at cell 0.
fn ring_with_light(n: usize, period: u32) -> Network {
    let mut b = NetworkBuilder::new();
    let first = b.add_light(5, 1.0, period, (0, period / 2)).unwrap();
    let mut ids = vec![first];
    for _ in 1..n {
        ids.push(b.add_cell(5, 1.0));
    }
    for pair in ids.windows(2) {
        b.add_edge(pair[0], pair[1]);
    }
    b.add_edge(ids[n - 1], ids[0]);
    b.build()
}

fn flat_curve(steps: usize, value: f64) -> DemandCurve {
    DemandCurve::new(vec![value; steps])
}

fn unlimited_policy() -> TripDistancePolicy {
    TripDistancePolicy {
        enable_limit: false,
        ..TripDistancePolicy::default()
    }
}

fn test_params() -> SimParams {
    SimParams {
        num_threads: Some(1),
        ..SimParams::default()
    }
}

fn build_sim(params: SimParams, net: Network, curve: DemandCurve) -> Simulation {
    SimulationBuilder::new(params, net, curve)
        .trip_policy(unlimited_policy())
        .build()
        .unwrap()
}

/// A recorder that captures everything for assertions.
#[derive(Default)]
struct CaptureRecorder {
    systems: Mutex<Vec<SystemRecord>>,
    vehicles: Mutex<Vec<VehicleRecord>>,
    traces: Mutex<Vec<TraceRecord>>,
    finished: Mutex<bool>,
}

impl Recorder for CaptureRecorder {
    fn record_system(&self, record: &SystemRecord) {
        self.systems.lock().unwrap().push(*record);
    }
    fn record_vehicle(&self, record: &VehicleRecord) {
        self.vehicles.lock().unwrap().push(record.clone());
    }
    fn record_trace(&self, points: &[TraceRecord]) {
        self.traces.lock().unwrap().extend_from_slice(points);
    }
    fn finish(&self) {
        *self.finished.lock().unwrap() = true;
    }
}

/// Assert the universal tick-boundary invariants.
fn assert_invariants(sim: &Simulation) {
    let counts = sim.fleet().counts();
    assert_eq!(
        counts.generated,
        counts.waiting + counts.active + counts.completed,
        "population balance broken: {counts:?}"
    );
    assert_eq!(counts.waiting as usize, sim.fleet().waiting_len());
    assert_eq!(counts.active as usize, sim.fleet().active_len());
    assert_eq!(counts.completed as usize, sim.fleet().completed_len());

    // Occupancy bookkeeping: every container entry occupies 1.0 here.
    let mut on_road = 0usize;
    for cell in sim.network().cells() {
        let vehicles = cell.vehicle_count();
        let occupation = cell.occupation();
        assert!(
            (occupation - vehicles as f64).abs() < 1e-9,
            "cell {} occupation {occupation} vs {vehicles} vehicles",
            cell.id()
        );
        assert!(occupation <= cell.capacity() + 1e-9);
        on_road += vehicles;
    }
    // Every active vehicle owns exactly one container slot.
    assert_eq!(on_road, counts.active as usize);
}

// ── Builder validation ────────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;
    use crate::error::SimError;

    #[test]
    fn builds_with_defaults() {
        let sim = build_sim(test_params(), ring(10), flat_curve(100, 0.0));
        assert_eq!(sim.current_tick(), Tick::ZERO);
        assert_eq!(sim.network().cell_count(), 10);
    }

    #[test]
    fn rejects_zero_steps_per_day() {
        let params = SimParams {
            steps_per_day: 0,
            ..test_params()
        };
        let err = SimulationBuilder::new(params, ring(4), flat_curve(10, 0.0))
            .build()
            .unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
    }

    #[test]
    fn rejects_empty_curve() {
        let err = SimulationBuilder::new(test_params(), ring(4), DemandCurve::new(vec![]))
            .build()
            .unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
    }

    #[test]
    fn rejects_out_of_range_noise() {
        let params = SimParams {
            tick_noise: 1.5,
            ..test_params()
        };
        let err = SimulationBuilder::new(params, ring(4), flat_curve(10, 0.0))
            .build()
            .unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
    }

    #[test]
    fn closed_vehicles_require_strong_connectivity() {
        // A line is not strongly connected.
        let mut b = NetworkBuilder::new();
        let a = b.add_cell(5, 1.0);
        let c = b.add_cell(5, 1.0);
        b.add_edge(a, c);
        let net = b.build();

        let params = SimParams {
            num_closed: 1,
            ..test_params()
        };
        let err = SimulationBuilder::new(params, net, flat_curve(10, 0.0))
            .trip_policy(unlimited_policy())
            .build()
            .unwrap_err();
        assert!(matches!(err, SimError::NotStronglyConnected { pairs: 1 }));
    }

    #[test]
    fn seeds_closed_fleet_into_waiting() {
        let params = SimParams {
            num_closed: 5,
            ..test_params()
        };
        let sim = build_sim(params, ring(30), flat_curve(100, 0.0));
        let counts = sim.fleet().counts();
        assert_eq!(counts.generated, 5);
        assert_eq!(counts.waiting, 5);
        assert_eq!(counts.active, 0);
        assert_invariants(&sim);
    }
}

// ── Tick protocol ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod tick_tests {
    use super::*;

    #[test]
    fn invariants_hold_at_every_tick_boundary() {
        let params = SimParams {
            num_closed: 3,
            sim_days: 1,
            steps_per_day: 40,
            ..test_params()
        };
        let mut sim = build_sim(params, ring(40), flat_curve(40, 0.5));
        for _ in 0..40 {
            sim.run_ticks(1, &NoopRecorder).unwrap();
            assert_invariants(&sim);
        }
    }

    #[test]
    fn demand_injects_expected_count() {
        let params = SimParams {
            steps_per_day: 10,
            ..test_params()
        };
        let mut sim = build_sim(params, ring(50), flat_curve(10, 2.0));
        sim.run_ticks(1, &NoopRecorder).unwrap();
        // Integer demand with zero noise: exactly 2 vehicles registered.
        assert_eq!(sim.fleet().counts().generated, 2);
    }

    #[test]
    fn system_record_emitted_every_tick() {
        let recorder = CaptureRecorder::default();
        let mut sim = build_sim(test_params(), ring(20), flat_curve(100, 1.0));
        sim.run_ticks(7, &recorder).unwrap();

        let systems = recorder.systems.lock().unwrap();
        assert_eq!(systems.len(), 7);
        let steps: Vec<u64> = systems.iter().map(|r| r.time_step).collect();
        assert_eq!(steps, vec![0, 1, 2, 3, 4, 5, 6]);
        for r in systems.iter() {
            assert_eq!(r.generated, r.waiting + r.active + r.completed);
        }
    }

    #[test]
    fn buffered_vehicles_promote_and_move() {
        let params = SimParams {
            num_closed: 1,
            ..test_params()
        };
        let mut sim = build_sim(params, ring(30), flat_curve(100, 0.0));
        assert_eq!(sim.fleet().counts().waiting, 1);

        sim.run_ticks(1, &NoopRecorder).unwrap();
        let counts = sim.fleet().counts();
        // The lone vehicle entered the network during P4 of the first tick.
        assert_eq!(counts.waiting, 0);
        assert!(counts.active + counts.completed == 1);
    }

    #[test]
    fn scheduled_light_change_applies_at_day_start() {
        let params = SimParams {
            steps_per_day: 5,
            sim_days: 2,
            light_changes: vec![LightChange {
                day: 2,
                multiplier: 2.0,
            }],
            ..test_params()
        };
        let net = ring_with_light(10, 8);
        let mut sim = build_sim(params, net, flat_curve(5, 0.0));

        sim.run_ticks(5, &NoopRecorder).unwrap(); // day 1
        let light_id = sim.network().lights()[0];
        assert_eq!(sim.network().cell(light_id).light().unwrap().period(), 8);

        sim.run_ticks(1, &NoopRecorder).unwrap(); // first tick of day 2
        assert_eq!(sim.network().cell(light_id).light().unwrap().period(), 16);
    }
}

// ── Closed-loop recycling ─────────────────────────────────────────────────────

#[cfg(test)]
mod recycling_tests {
    use super::*;

    #[test]
    fn closed_vehicle_is_recycled_with_identity_preserved() {
        let params = SimParams {
            num_closed: 1,
            steps_per_day: 200,
            trace_interval: 1,
            ..test_params()
        };
        let recorder = CaptureRecorder::default();
        let mut sim = build_sim(params, ring(20), flat_curve(200, 0.0));

        sim.run_ticks(200, &recorder).unwrap();

        let vehicles = recorder.vehicles.lock().unwrap();
        assert!(
            vehicles.len() >= 2,
            "expected multiple journeys, got {}",
            vehicles.len()
        );

        // One identity across all journeys; each new origin is the previous
        // destination; the population never grows.
        let id = vehicles[0].vehicle_id;
        for pair in vehicles.windows(2) {
            assert_eq!(pair[0].vehicle_id, id);
            assert_eq!(pair[1].vehicle_id, id);
            assert_eq!(pair[1].origin, pair[0].destination);
            assert!(pair[1].in_time > pair[0].out_time);
            assert!(pair[0].closed);
        }
        assert_eq!(sim.fleet().counts().generated, 1);
        assert_invariants(&sim);

        // Traces were flushed per journey and include both endpoints.
        let traces = recorder.traces.lock().unwrap();
        let first = &vehicles[0];
        assert!(traces
            .iter()
            .any(|t| t.vehicle_id == id && t.time == first.in_time && t.cell == first.origin));
        assert!(traces
            .iter()
            .any(|t| t.vehicle_id == id && t.time == first.out_time && t.cell == first.destination));
    }

    #[test]
    fn recycle_swaps_completed_for_waiting_same_tick() {
        let params = SimParams {
            num_closed: 1,
            steps_per_day: 500,
            ..test_params()
        };
        let mut sim = build_sim(params, ring(12), flat_curve(500, 0.0));

        // Step until the vehicle has completed a journey, then one more tick
        // for the reclaim phase.
        let mut saw_completion = false;
        for _ in 0..500 {
            sim.run_ticks(1, &NoopRecorder).unwrap();
            let counts = sim.fleet().counts();
            if counts.completed == 1 {
                saw_completion = true;
                sim.run_ticks(1, &NoopRecorder).unwrap();
                let after = sim.fleet().counts();
                assert_eq!(after.generated, 1, "identity preserved");
                assert_eq!(after.completed, 0, "completed drained by reclaim");
                // The vehicle is waiting again or already back on the road.
                assert_eq!(after.waiting + after.active, 1);
                break;
            }
        }
        assert!(saw_completion, "vehicle never completed a journey");
    }

    #[test]
    fn open_vehicles_retire_after_completion() {
        let params = SimParams {
            steps_per_day: 300,
            ..test_params()
        };
        // Single-shot demand: inject on the first tick only.
        let mut values = vec![0.0; 300];
        values[0] = 3.0;
        let mut sim = build_sim(params, ring(15), DemandCurve::new(values));

        sim.run_ticks(300, &NoopRecorder).unwrap();
        let counts = sim.fleet().counts();
        // Every open vehicle eventually completed and left the registry.
        assert_eq!(counts.generated, 0);
        assert_eq!(counts.completed, 0);
        assert_eq!(counts.active, 0);
        assert_eq!(counts.waiting, 0);
    }
}

// ── Determinism and parallel movement ─────────────────────────────────────────

#[cfg(test)]
mod determinism_tests {
    use super::*;

    fn run_and_capture(serial: bool, threads: Option<usize>) -> Vec<SystemRecord> {
        let params = SimParams {
            num_closed: 4,
            steps_per_day: 60,
            sim_days: 1,
            serial_movement: serial,
            num_threads: threads,
            ..SimParams::default()
        };
        let recorder = CaptureRecorder::default();
        let mut sim = build_sim(params, ring(60), flat_curve(60, 0.8));
        sim.run(&recorder).unwrap();
        recorder.systems.into_inner().unwrap()
    }

    #[test]
    fn serial_runs_are_reproducible() {
        let a = run_and_capture(true, Some(1));
        let b = run_and_capture(true, Some(1));
        assert_eq!(a, b);
    }

    #[test]
    fn parallel_movement_preserves_invariants() {
        let params = SimParams {
            num_closed: 10,
            steps_per_day: 50,
            serial_movement: false,
            num_threads: Some(4),
            ..SimParams::default()
        };
        let mut sim = build_sim(params, ring(50), flat_curve(50, 1.0));
        for _ in 0..50 {
            sim.run_ticks(1, &NoopRecorder).unwrap();
            assert_invariants(&sim);
        }
    }
}

// ── Run completion ────────────────────────────────────────────────────────────

#[cfg(test)]
mod run_tests {
    use super::*;

    #[test]
    fn run_covers_horizon_and_finishes_recorder() {
        let params = SimParams {
            steps_per_day: 20,
            sim_days: 2,
            ..test_params()
        };
        let recorder = CaptureRecorder::default();
        let mut sim = build_sim(params, ring(20), flat_curve(20, 0.5));
        sim.run(&recorder).unwrap();

        assert_eq!(sim.current_tick(), Tick(40));
        assert_eq!(recorder.systems.lock().unwrap().len(), 40);
        assert!(*recorder.finished.lock().unwrap());
    }

    #[test]
    fn final_drain_reports_last_tick_completions() {
        // One closed vehicle, tiny ring: journeys finish frequently, so with
        // high probability at least one journey record exists even though
        // closed vehicles never retire.
        let params = SimParams {
            num_closed: 1,
            steps_per_day: 120,
            sim_days: 1,
            ..test_params()
        };
        let recorder = CaptureRecorder::default();
        let mut sim = build_sim(params, ring(10), flat_curve(120, 0.0));
        sim.run(&recorder).unwrap();
        assert!(!recorder.vehicles.lock().unwrap().is_empty());
    }
}
