//! Unit tests for the vehicle registry.

use std::sync::{Arc, Mutex};

use cellflow_core::VehicleId;
use cellflow_vehicle::Vehicle;

use crate::registry::Fleet;

fn shared(fleet: &Fleet, closed: bool) -> (VehicleId, crate::SharedVehicle) {
    let id = fleet.reserve_id();
    let v = Arc::new(Mutex::new(Vehicle::new(id, 1, 1, 1.0, 0.0, closed, 0, 0)));
    (id, v)
}

#[cfg(test)]
mod counter_tests {
    use super::*;

    /// `generated = waiting + active + completed` after every transition.
    fn assert_balanced(fleet: &Fleet) {
        let c = fleet.counts();
        assert_eq!(c.generated, c.waiting + c.active + c.completed, "{c:?}");
    }

    #[test]
    fn lifecycle_keeps_counters_balanced() {
        let fleet = Fleet::new();
        let (id, v) = shared(&fleet, false);

        fleet.register_waiting(v);
        assert_eq!(fleet.counts().generated, 1);
        assert_eq!(fleet.counts().waiting, 1);
        assert_balanced(&fleet);

        fleet.promote_to_active(id);
        assert_eq!(fleet.counts().waiting, 0);
        assert_eq!(fleet.counts().active, 1);
        assert_balanced(&fleet);

        fleet.mark_completed(id);
        assert_eq!(fleet.counts().active, 0);
        assert_eq!(fleet.counts().completed, 1);
        assert_balanced(&fleet);

        fleet.retire(id);
        assert_eq!(fleet.counts().completed, 0);
        assert!(fleet.vehicle(id).is_none());
        assert_balanced(&fleet);
    }

    #[test]
    fn reclaim_preserves_generated() {
        let fleet = Fleet::new();
        let (id, v) = shared(&fleet, true);
        fleet.register_waiting(v);
        fleet.promote_to_active(id);
        fleet.mark_completed(id);

        let before = fleet.counts();
        fleet.reclaim_to_waiting(id);
        let after = fleet.counts();

        assert_eq!(after.generated, before.generated);
        assert_eq!(after.completed, before.completed - 1);
        assert_eq!(after.waiting, before.waiting + 1);
        assert!(fleet.vehicle(id).is_some(), "identity survives recycling");
        assert_balanced(&fleet);
    }

    #[test]
    fn counters_match_set_sizes() {
        let fleet = Fleet::new();
        let ids: Vec<_> = (0..5)
            .map(|_| {
                let (id, v) = shared(&fleet, false);
                fleet.register_waiting(v);
                id
            })
            .collect();
        fleet.promote_to_active(ids[0]);
        fleet.promote_to_active(ids[1]);
        fleet.mark_completed(ids[0]);

        let c = fleet.counts();
        assert_eq!(c.waiting as usize, fleet.waiting_len());
        assert_eq!(c.active as usize, fleet.active_len());
        assert_eq!(c.completed as usize, fleet.completed_len());
        assert_balanced(&fleet);
    }

    #[test]
    fn transitions_on_wrong_set_are_inert() {
        let fleet = Fleet::new();
        let (id, v) = shared(&fleet, false);
        fleet.register_waiting(v);

        // Not completed yet: reclaim and completed-marking must not fire.
        fleet.reclaim_to_waiting(id);
        fleet.mark_completed(id);
        let c = fleet.counts();
        assert_eq!(c.waiting, 1);
        assert_eq!(c.active, 0);
        assert_eq!(c.completed, 0);
        assert_balanced(&fleet);
    }
}

#[cfg(test)]
mod snapshot_tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_ascending() {
        let fleet = Fleet::new();
        let a = fleet.reserve_id();
        let b = fleet.reserve_id();
        assert!(b > a);
    }

    #[test]
    fn snapshots_follow_sets() {
        let fleet = Fleet::new();
        let (id1, v1) = shared(&fleet, false);
        let (_id2, v2) = shared(&fleet, false);
        fleet.register_waiting(v1);
        fleet.register_waiting(v2);

        assert_eq!(fleet.snapshot_waiting().len(), 2);
        assert!(fleet.snapshot_active().is_empty());

        fleet.promote_to_active(id1);
        assert_eq!(fleet.snapshot_waiting().len(), 1);
        assert_eq!(fleet.snapshot_active().len(), 1);
        let active = fleet.snapshot_active();
        assert_eq!(active[0].lock().unwrap().id(), id1);
    }

    #[test]
    fn concurrent_registration_is_consistent() {
        let fleet = Arc::new(Fleet::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let fleet = Arc::clone(&fleet);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        let id = fleet.reserve_id();
                        let v = Arc::new(Mutex::new(Vehicle::new(
                            id, 1, 1, 1.0, 0.0, false, 0, 0,
                        )));
                        fleet.register_waiting(v);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let c = fleet.counts();
        assert_eq!(c.generated, 400);
        assert_eq!(c.waiting, 400);
        assert_eq!(fleet.waiting_len(), 400);
    }
}
