//! The vehicle: identity, state machine, and the Nagel–Schreckenberg rule.

use cellflow_core::{CellId, LinkId, Tick, VehicleId, VehicleRng};
use cellflow_net::{BufferEntry, Network};

use crate::error::{VehicleError, VehicleResult};
use crate::trace::TraceLog;

/// Probability that a vehicle is allowed past an intersection cell
/// (in-degree above one) during a single gap-scan step.
const PASS_PROB: f64 = 0.8;

/// Lifecycle states.  The numeric codes 1–5 are the wire representation used
/// in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleState {
    /// Freshly constructed or reset; no trip assigned yet.
    New,
    /// Origin and destination set.
    OdAssigned,
    /// Route expanded and attached.
    PathAssigned,
    /// Enqueued in the origin cell's entry buffer; `in_time` assigned.
    Buffered,
    /// On the network, owning a slot in exactly one cell.
    OnRoad,
    /// Arrived; `out_time` assigned.
    Completed,
}

impl VehicleState {
    /// Numeric state code (0 for `New`, 1–5 for the live states).
    pub fn code(self) -> u8 {
        match self {
            VehicleState::New => 0,
            VehicleState::OdAssigned => 1,
            VehicleState::PathAssigned => 2,
            VehicleState::Buffered => 3,
            VehicleState::OnRoad => 4,
            VehicleState::Completed => 5,
        }
    }
}

/// One element of a trip plan: either a concrete cell or a whole link to be
/// flattened into its cell chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathNode {
    Cell(CellId),
    Link(LinkId),
}

/// A single vehicle.
///
/// Vehicles are long-lived: closed vehicles are reset in place between
/// journeys, preserving identity, kinematic parameters and the RNG stream.
/// All mutation goes through `&mut self`; during the parallel movement phase
/// each vehicle is reached through its own lock, so methods here never touch
/// another vehicle's state.
pub struct Vehicle {
    // Immutable attributes.
    id: VehicleId,
    acceleration: u32,
    occupy: f64,
    slowing_prob: f64,
    tag: f64,
    closed: bool,

    // Mutable state.
    state: VehicleState,
    velocity: u32,
    position: CellId,
    origin: CellId,
    destination: CellId,
    simple_path: Vec<PathNode>,
    /// Expanded cell route; `route[cursor..]` is the residual path.
    route: Vec<CellId>,
    cursor: usize,
    path_length: usize,
    in_time: Tick,
    out_time: Option<Tick>,
    activated: bool,
    trace: TraceLog,
    rng: VehicleRng,
}

impl Vehicle {
    /// Create a vehicle.
    ///
    /// `master_seed` seeds the vehicle's private RNG stream; `trace_interval`
    /// of zero disables trajectory recording.
    ///
    /// # Panics
    /// Panics on out-of-domain parameters (`occupy ≤ 0`,
    /// `slowing_prob ∉ [0, 1]`); configuration validation keeps these
    /// unreachable in normal operation.
    pub fn new(
        id: VehicleId,
        velocity: u32,
        acceleration: u32,
        occupy: f64,
        slowing_prob: f64,
        closed: bool,
        master_seed: u64,
        trace_interval: u64,
    ) -> Self {
        assert!(occupy > 0.0, "occupy must be positive");
        assert!(
            (0.0..=1.0).contains(&slowing_prob),
            "slowing probability must be within [0, 1]"
        );
        let mut rng = VehicleRng::new(master_seed, id);
        let tag = rng.unit();
        Self {
            id,
            acceleration,
            occupy,
            slowing_prob,
            tag,
            closed,
            state: VehicleState::New,
            velocity,
            position: CellId::INVALID,
            origin: CellId::INVALID,
            destination: CellId::INVALID,
            simple_path: Vec::new(),
            route: Vec::new(),
            cursor: 0,
            path_length: 0,
            in_time: Tick::ZERO,
            out_time: None,
            activated: false,
            trace: TraceLog::new(trace_interval),
            rng,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn id(&self) -> VehicleId {
        self.id
    }

    #[inline]
    pub fn state(&self) -> VehicleState {
        self.state
    }

    #[inline]
    pub fn velocity(&self) -> u32 {
        self.velocity
    }

    #[inline]
    pub fn acceleration(&self) -> u32 {
        self.acceleration
    }

    #[inline]
    pub fn occupy(&self) -> f64 {
        self.occupy
    }

    #[inline]
    pub fn slowing_prob(&self) -> f64 {
        self.slowing_prob
    }

    #[inline]
    pub fn tag(&self) -> f64 {
        self.tag
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Current cell, or `CellId::INVALID` when not on the network.
    #[inline]
    pub fn position(&self) -> CellId {
        self.position
    }

    #[inline]
    pub fn origin(&self) -> CellId {
        self.origin
    }

    #[inline]
    pub fn destination(&self) -> CellId {
        self.destination
    }

    #[inline]
    pub fn in_time(&self) -> Tick {
        self.in_time
    }

    #[inline]
    pub fn out_time(&self) -> Option<Tick> {
        self.out_time
    }

    /// Initial cell count of the expanded route.
    #[inline]
    pub fn path_length(&self) -> usize {
        self.path_length
    }

    /// The trip plan as supplied to [`set_path`](Self::set_path), before
    /// link expansion.
    #[inline]
    pub fn plan(&self) -> &[PathNode] {
        &self.simple_path
    }

    /// The full expanded cell route (origin through destination).
    #[inline]
    pub fn route(&self) -> &[CellId] {
        &self.route
    }

    /// Cells still ahead of the vehicle.
    #[inline]
    pub fn residual_len(&self) -> usize {
        self.route.len() - self.cursor
    }

    #[inline]
    pub fn is_activated(&self) -> bool {
        self.activated
    }

    #[inline]
    pub fn trace(&self) -> &TraceLog {
        &self.trace
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Assign the trip endpoints.  `New → OdAssigned`.
    pub fn set_od(&mut self, origin: CellId, destination: CellId) -> VehicleResult<()> {
        self.require(VehicleState::New)?;
        if origin == destination {
            return Err(VehicleError::SameEndpoints(origin));
        }
        self.origin = origin;
        self.destination = destination;
        self.state = VehicleState::OdAssigned;
        Ok(())
    }

    /// Attach a trip plan, expanding link nodes into their cell chains.
    /// `OdAssigned → PathAssigned`.
    ///
    /// The expanded route must start at the origin and end at the
    /// destination.
    pub fn set_path(&mut self, path: Vec<PathNode>, net: &Network) -> VehicleResult<()> {
        self.require(VehicleState::OdAssigned)?;
        if path.is_empty() {
            return Err(VehicleError::EmptyPath);
        }

        let mut route = Vec::with_capacity(path.len());
        for node in &path {
            match *node {
                PathNode::Cell(cell) => route.push(cell),
                PathNode::Link(link) => route.extend_from_slice(net.link(link).cells()),
            }
        }

        let first = route[0];
        if first != self.origin {
            return Err(VehicleError::PathOriginMismatch {
                expected: self.origin,
                got: first,
            });
        }
        let last = *route.last().expect("non-empty route");
        if last != self.destination {
            return Err(VehicleError::PathDestinationMismatch {
                expected: self.destination,
                got: last,
            });
        }

        self.path_length = route.len();
        self.simple_path = path;
        self.route = route;
        self.cursor = 0;
        self.state = VehicleState::PathAssigned;
        Ok(())
    }

    /// Convenience for cell-level plans from the path finders.
    pub fn set_cell_path(&mut self, cells: Vec<CellId>, net: &Network) -> VehicleResult<()> {
        self.set_path(cells.into_iter().map(PathNode::Cell).collect(), net)
    }

    /// Join the origin cell's entry buffer.  `PathAssigned → Buffered`.
    ///
    /// Records `in_time` and the origin trace endpoint.
    pub fn buffer_in(&mut self, now: Tick, net: &Network) -> VehicleResult<()> {
        self.require(VehicleState::PathAssigned)?;
        net.cell(self.origin).buffer_push(BufferEntry {
            vehicle: self.id,
            occupy: self.occupy,
        });
        self.in_time = now;
        self.trace.record_endpoint(now, self.origin);
        self.state = VehicleState::Buffered;
        Ok(())
    }

    /// Re-evaluate FIFO admission at the origin.
    ///
    /// Scans the origin buffer in order, accumulating a rolling occupancy
    /// total on top of the cell's current occupation.  The vehicle activates
    /// only if it is reached before the total exceeds capacity — a queued
    /// predecessor that does not fit blocks everyone behind it.
    pub fn update_active_state(&mut self, net: &Network) -> bool {
        if self.state != VehicleState::Buffered {
            return false;
        }
        let cell = net.cell(self.origin);
        let mut total = cell.occupation();
        for entry in cell.buffer_snapshot() {
            total += entry.occupy;
            if total > cell.capacity() {
                self.activated = false;
                return false;
            }
            if entry.vehicle == self.id {
                self.activated = true;
                return true;
            }
        }
        self.activated = false;
        false
    }

    /// Move from the origin buffer into the origin cell.
    /// `Buffered → OnRoad`; requires activation.
    ///
    /// The container load happens before the buffer removal, so a concurrent
    /// admission scan can count this vehicle twice but never miss it — the
    /// capacity bound stays conservative throughout the handoff.
    pub fn enter_network(&mut self, net: &Network) -> VehicleResult<()> {
        self.require(VehicleState::Buffered)?;
        if !self.activated {
            return Err(VehicleError::NotActivated);
        }
        let cell = net.cell(self.origin);
        cell.load(self.id, self.occupy)?;
        cell.buffer_remove(self.id)?;
        self.position = self.origin;
        // The origin itself is consumed on entry.
        self.cursor = 1;
        self.state = VehicleState::OnRoad;
        Ok(())
    }

    /// Reset a completed closed vehicle for its next journey, preserving
    /// identity, velocity, acceleration, occupy and slowing probability.
    /// `Completed → New`.
    pub fn reset_for_next_trip(&mut self) -> VehicleResult<()> {
        self.require(VehicleState::Completed)?;
        self.state = VehicleState::New;
        self.position = CellId::INVALID;
        self.simple_path.clear();
        self.route.clear();
        self.cursor = 0;
        self.path_length = 0;
        self.in_time = Tick::ZERO;
        self.out_time = None;
        self.activated = false;
        self.trace.clear();
        Ok(())
    }

    // ── Movement ──────────────────────────────────────────────────────────

    /// Apply one tick of the Nagel–Schreckenberg rule.
    ///
    /// Returns `true` exactly when the vehicle arrives this tick.  On
    /// arrival the vehicle unloads itself from its final cell, records
    /// `out_time` and transitions to `Completed` — the caller only moves it
    /// across registry sets.
    ///
    /// The commit step claims the target cell *before* releasing the current
    /// one: the target's `load` is the authoritative capacity check, so a
    /// scan-to-commit race ends with a clean failure and a bounded retry
    /// from the acceleration step, never with an oversubscribed cell or a
    /// vehicle outside any container.
    pub fn advance(&mut self, now: Tick, net: &Network) -> bool {
        if self.state != VehicleState::OnRoad {
            return false;
        }

        let max_retries = net.cell(self.position).max_speed() + 1;
        for _ in 0..max_retries {
            self.accelerate(net);
            let gap = self.scan_gap(net);
            self.velocity = self.velocity.min(gap);
            self.random_slow();

            if self.velocity == 0 {
                break;
            }

            self.velocity = (self.velocity as usize).min(self.residual_len()) as u32;
            let target_id = self.route[self.cursor + self.velocity as usize - 1];
            let target = net.cell(target_id);
            if target.load(self.id, self.occupy).is_err() {
                // Another worker filled the target after the gap scan.
                continue;
            }
            net.cell(self.position)
                .unload(self.id)
                .expect("moving vehicle must own its current cell");

            self.position = target_id;
            self.cursor += self.velocity as usize;

            if self.cursor >= self.route.len() {
                self.out_time = Some(now);
                self.state = VehicleState::Completed;
                self.trace.record_endpoint(now, self.position);
                net.cell(self.position)
                    .unload(self.id)
                    .expect("completed vehicle must own its final cell");
                self.position = CellId::INVALID;
                return true;
            }
            self.trace.record_if_due(now, self.position);
            return false;
        }

        self.trace.record_if_due(now, self.position);
        false
    }

    /// Step 1: accelerate up to the current cell's speed limit.
    fn accelerate(&mut self, net: &Network) {
        let limit = net.cell(self.position).max_speed();
        self.velocity = (self.velocity + self.acceleration).min(limit);
    }

    /// Step 2: count consecutively admissible cells ahead, up to the current
    /// velocity.
    ///
    /// Scanning stops at the first non-admissible cell.  At an intersection
    /// cell (in-degree above one) the scan aborts with probability
    /// `1 - PASS_PROB`, yielding the gap accumulated so far.
    pub(crate) fn scan_gap(&mut self, net: &Network) -> u32 {
        let mut gap = 0u32;
        let max_check = (self.velocity as usize).min(self.residual_len());
        for i in 0..max_check {
            let cell_id = self.route[self.cursor + i];
            if !net.cell(cell_id).loadable(self.occupy) {
                break;
            }
            if net.in_degree(cell_id) > 1 && !self.rng.chance(PASS_PROB) {
                return gap;
            }
            gap += 1;
        }
        gap
    }

    /// Step 3: random slow-down by one.
    fn random_slow(&mut self) {
        if self.rng.chance(self.slowing_prob) {
            self.velocity = self.velocity.saturating_sub(1);
        }
    }

    fn require(&self, expected: VehicleState) -> VehicleResult<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(VehicleError::InvalidState {
                expected,
                actual: self.state,
            })
        }
    }
}
