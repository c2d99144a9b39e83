//! The capacity-bounded occupancy cell.
//!
//! A cell is the atomic unit of road: a container of vehicles bounded by a
//! real-valued capacity, plus a FIFO buffer of vehicles waiting to enter the
//! network at this cell as their origin.
//!
//! # Invariant
//!
//! `occupation == Σ occupy over the container`, and `occupation ≤ capacity`
//! at all times.  Both are maintained under the container mutex: `load` is
//! the only operation that adds occupancy and it re-checks the capacity bound
//! under the lock, so two racing loads serialize and the loser fails cleanly.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use cellflow_core::{CellId, VehicleId};

use crate::error::{NetError, NetResult};
use crate::light::TrafficLight;

/// One entry in a cell's waiting buffer.
///
/// The occupy value is duplicated here (it is immutable per vehicle) so the
/// FIFO admission scan never needs to reach into vehicle state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferEntry {
    pub vehicle: VehicleId,
    pub occupy: f64,
}

/// Container + occupation, guarded together by one mutex.
#[derive(Debug, Default)]
struct CellState {
    occupation: f64,
    container: HashMap<VehicleId, f64>,
}

/// A unit of road with bounded occupancy.
///
/// Cells live in the network arena for the whole simulation; all mutation
/// goes through `&self` methods so the arena can be shared across workers.
pub struct Cell {
    id: CellId,
    max_speed: u32,
    capacity: f64,
    light: Option<TrafficLight>,
    state: Mutex<CellState>,
    buffer: Mutex<VecDeque<BufferEntry>>,
}

impl Cell {
    /// Create a common (non-signalized) cell.
    pub(crate) fn common(id: CellId, max_speed: u32, capacity: f64) -> Self {
        assert!(capacity > 0.0, "cell capacity must be positive");
        Self {
            id,
            max_speed,
            capacity,
            light: None,
            state: Mutex::new(CellState::default()),
            buffer: Mutex::new(VecDeque::new()),
        }
    }

    /// Create a signalized cell.
    pub(crate) fn signalized(
        id: CellId,
        max_speed: u32,
        capacity: f64,
        light: TrafficLight,
    ) -> Self {
        let mut cell = Self::common(id, max_speed, capacity);
        cell.light = Some(light);
        cell
    }

    // ── Immutable attributes ──────────────────────────────────────────────

    #[inline]
    pub fn id(&self) -> CellId {
        self.id
    }

    #[inline]
    pub fn max_speed(&self) -> u32 {
        self.max_speed
    }

    #[inline]
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    #[inline]
    pub fn is_light(&self) -> bool {
        self.light.is_some()
    }

    /// The traffic light controlling this cell, if any.
    #[inline]
    pub fn light(&self) -> Option<&TrafficLight> {
        self.light.as_ref()
    }

    // ── Occupancy ─────────────────────────────────────────────────────────

    /// Current occupation in occupancy units.
    pub fn occupation(&self) -> f64 {
        self.state.lock().unwrap().occupation
    }

    /// Number of vehicles currently on the cell.
    pub fn vehicle_count(&self) -> usize {
        self.state.lock().unwrap().container.len()
    }

    /// Would a vehicle of the given occupy fit right now?
    ///
    /// For signalized cells a red phase makes the cell inadmissible
    /// regardless of spare capacity.  This is a pure read; the authoritative
    /// re-check happens inside [`load`](Self::load).
    pub fn loadable(&self, occupy: f64) -> bool {
        if let Some(light) = &self.light {
            if !light.phase() {
                return false;
            }
        }
        self.state.lock().unwrap().occupation + occupy <= self.capacity
    }

    /// Commit a vehicle onto the cell.
    ///
    /// Re-checks the capacity bound under the container lock, so concurrent
    /// loads serialize: whichever wins commits its occupy first and the other
    /// observes the updated occupation and fails with `CapacityExceeded`.
    pub fn load(&self, vehicle: VehicleId, occupy: f64) -> NetResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.occupation + occupy > self.capacity {
            return Err(NetError::CapacityExceeded {
                cell: self.id,
                occupation: state.occupation,
                occupy,
                capacity: self.capacity,
            });
        }
        let prev = state.container.insert(vehicle, occupy);
        debug_assert!(
            prev.is_none(),
            "vehicle {vehicle} double-loaded on cell {}",
            self.id
        );
        state.occupation += occupy;
        Ok(())
    }

    /// Remove a vehicle from the cell, releasing its occupancy.
    pub fn unload(&self, vehicle: VehicleId) -> NetResult<()> {
        let mut state = self.state.lock().unwrap();
        match state.container.remove(&vehicle) {
            Some(occupy) => {
                state.occupation -= occupy;
                Ok(())
            }
            None => Err(NetError::NotPresent {
                cell: self.id,
                vehicle,
            }),
        }
    }

    /// `true` if the vehicle is currently on the cell.
    pub fn contains(&self, vehicle: VehicleId) -> bool {
        self.state.lock().unwrap().container.contains_key(&vehicle)
    }

    /// Snapshot of the vehicles currently on the cell.
    pub fn container(&self) -> Vec<VehicleId> {
        self.state.lock().unwrap().container.keys().copied().collect()
    }

    // ── Entry buffer ──────────────────────────────────────────────────────

    /// Append a vehicle to the back of the FIFO entry buffer.
    pub fn buffer_push(&self, entry: BufferEntry) {
        self.buffer.lock().unwrap().push_back(entry);
    }

    /// Remove the first matching entry from the buffer.
    pub fn buffer_remove(&self, vehicle: VehicleId) -> NetResult<()> {
        let mut buffer = self.buffer.lock().unwrap();
        match buffer.iter().position(|e| e.vehicle == vehicle) {
            Some(idx) => {
                buffer.remove(idx);
                Ok(())
            }
            None => Err(NetError::NotInBuffer {
                cell: self.id,
                vehicle,
            }),
        }
    }

    /// Snapshot of the buffer in FIFO order.
    pub fn buffer_snapshot(&self) -> Vec<BufferEntry> {
        self.buffer.lock().unwrap().iter().copied().collect()
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.lock().unwrap().len()
    }
}
