//! The partitioned vehicle registry.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use cellflow_core::VehicleId;
use cellflow_vehicle::Vehicle;

/// Shared handle to one vehicle.  Workers lock individual vehicles during
/// the parallel phases; the registry itself is never held across a vehicle
/// lock.
pub type SharedVehicle = Arc<Mutex<Vehicle>>;

/// Atomic snapshot of the population counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FleetCounts {
    /// Total vehicles ever registered.  Monotone.
    pub generated: i64,
    /// Vehicles buffered at their origin (state 3).
    pub waiting: i64,
    /// Vehicles on the network (state 4).
    pub active: i64,
    /// Vehicles arrived and not yet reclaimed (state 5).
    pub completed: i64,
}

/// The vehicle registry.
///
/// `generated == waiting + active + completed` holds at every phase
/// boundary: registration is the only way in, retirement the only way out,
/// and every transition moves a vehicle between exactly two sets.
#[derive(Default)]
pub struct Fleet {
    vehicles: RwLock<HashMap<VehicleId, SharedVehicle>>,

    waiting: Mutex<HashSet<VehicleId>>,
    active: Mutex<HashSet<VehicleId>>,
    completed: Mutex<HashSet<VehicleId>>,

    generated: AtomicI64,
    waiting_count: AtomicI64,
    active_count: AtomicI64,
    completed_count: AtomicI64,

    next_id: AtomicU64,
}

impl Fleet {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Identity ──────────────────────────────────────────────────────────

    /// Reserve a fresh vehicle id.
    ///
    /// Reserving does not touch the `generated` counter — a vehicle whose
    /// trip setup fails is never registered, so counters stay consistent
    /// with set membership.  Unused ids leave harmless gaps.
    pub fn reserve_id(&self) -> VehicleId {
        VehicleId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    // ── Transitions ───────────────────────────────────────────────────────

    /// Register a fully set-up vehicle into the waiting set.
    pub fn register_waiting(&self, vehicle: SharedVehicle) {
        let id = vehicle.lock().unwrap().id();
        self.vehicles.write().unwrap().insert(id, vehicle);
        self.waiting.lock().unwrap().insert(id);
        self.generated.fetch_add(1, Ordering::Relaxed);
        self.waiting_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Waiting → active, after a successful network entry.
    pub fn promote_to_active(&self, id: VehicleId) {
        if self.waiting.lock().unwrap().remove(&id) {
            self.waiting_count.fetch_sub(1, Ordering::Relaxed);
            self.active.lock().unwrap().insert(id);
            self.active_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Active → completed, after the vehicle arrives.
    pub fn mark_completed(&self, id: VehicleId) {
        if self.active.lock().unwrap().remove(&id) {
            self.active_count.fetch_sub(1, Ordering::Relaxed);
            self.completed.lock().unwrap().insert(id);
            self.completed_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Completed → waiting, for a recycled closed vehicle.  The vehicle's
    /// identity is preserved and `generated` does not change.
    pub fn reclaim_to_waiting(&self, id: VehicleId) {
        if self.completed.lock().unwrap().remove(&id) {
            self.completed_count.fetch_sub(1, Ordering::Relaxed);
            self.waiting.lock().unwrap().insert(id);
            self.waiting_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Drop a completed open vehicle from the registry entirely.
    pub fn retire(&self, id: VehicleId) {
        if self.completed.lock().unwrap().remove(&id) {
            self.completed_count.fetch_sub(1, Ordering::Relaxed);
            self.generated.fetch_sub(1, Ordering::Relaxed);
        }
        self.vehicles.write().unwrap().remove(&id);
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    /// Handle to one vehicle, if registered.
    pub fn vehicle(&self, id: VehicleId) -> Option<SharedVehicle> {
        self.vehicles.read().unwrap().get(&id).cloned()
    }

    /// Snapshot handles of the waiting set, in ascending id order.
    pub fn snapshot_waiting(&self) -> Vec<SharedVehicle> {
        self.snapshot(&self.waiting)
    }

    /// Snapshot handles of the active set, in ascending id order.
    pub fn snapshot_active(&self) -> Vec<SharedVehicle> {
        self.snapshot(&self.active)
    }

    /// Snapshot handles of the completed set, in ascending id order.
    pub fn snapshot_completed(&self) -> Vec<SharedVehicle> {
        self.snapshot(&self.completed)
    }

    /// Snapshots come out id-sorted so scheduler phases see a deterministic
    /// order regardless of hash-set iteration.
    fn snapshot(&self, set: &Mutex<HashSet<VehicleId>>) -> Vec<SharedVehicle> {
        let mut ids: Vec<VehicleId> = set.lock().unwrap().iter().copied().collect();
        ids.sort_unstable();
        let vehicles = self.vehicles.read().unwrap();
        ids.iter()
            .filter_map(|id| vehicles.get(id).cloned())
            .collect()
    }

    pub fn waiting_len(&self) -> usize {
        self.waiting.lock().unwrap().len()
    }

    pub fn active_len(&self) -> usize {
        self.active.lock().unwrap().len()
    }

    pub fn completed_len(&self) -> usize {
        self.completed.lock().unwrap().len()
    }

    /// Atomic counter snapshot.
    pub fn counts(&self) -> FleetCounts {
        FleetCounts {
            generated: self.generated.load(Ordering::Relaxed),
            waiting: self.waiting_count.load(Ordering::Relaxed),
            active: self.active_count.load(Ordering::Relaxed),
            completed: self.completed_count.load(Ordering::Relaxed),
        }
    }
}
