//! Random streams for the simulation.
//!
//! Two kinds of randomness drive a run, and they must stay independent:
//!
//! - every vehicle rolls its own movement dice — the random-slowing draw
//!   and the intersection yield — out of a private [`VehicleRng`];
//! - the scheduler draws demand counts, origins, destinations, path choices
//!   and the tick-local move order from a single [`SimRng`].
//!
//! Both derive from the one master seed.  A vehicle's stream is keyed by
//! its id through a SplitMix64 finalizer, so the dice a vehicle sees depend
//! only on `(master seed, vehicle id)` — never on which worker thread runs
//! it, how the active set was partitioned, or how many other vehicles
//! exist.  Re-running with the same seed replays every per-vehicle decision
//! exactly.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::VehicleId;

/// SplitMix64 finalizer over a `(seed, stream)` pair.
///
/// Spreads even adjacent stream keys across the full 64-bit space, so
/// consecutively numbered vehicles start from unrelated generator states.
fn mix_stream(seed: u64, stream: u64) -> u64 {
    let mut z = seed ^ stream.wrapping_mul(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

// ── VehicleRng ────────────────────────────────────────────────────────────────

/// The movement dice of one vehicle.
///
/// Owned by the vehicle for its whole lifetime, including recycled
/// journeys, and only ever reached through the vehicle's own lock during
/// the parallel movement phase — the stream needs no synchronisation of its
/// own.
pub struct VehicleRng(SmallRng);

impl VehicleRng {
    /// Derive the stream for `vehicle` from the run's master seed.
    pub fn new(master_seed: u64, vehicle: VehicleId) -> Self {
        VehicleRng(SmallRng::seed_from_u64(mix_stream(master_seed, vehicle.0)))
    }

    /// Uniform draw from `[0, 1)`.
    #[inline]
    pub fn unit(&mut self) -> f64 {
        self.0.r#gen()
    }

    /// Roll a die: `true` with probability `p`.
    #[inline]
    pub fn chance(&mut self, p: f64) -> bool {
        self.unit() < p
    }
}

// ── SimRng ────────────────────────────────────────────────────────────────────

/// The scheduler's random stream.
///
/// Everything tick-global draws from here: demand counts, origin and
/// destination sampling, path selection, and the per-tick shuffle of the
/// active set.  Touched only from the sequential phases of the tick
/// protocol; anything needing randomness off the scheduler thread gets an
/// independent stream via [`child`](Self::child) instead of sharing this
/// one.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    /// Split off an independent stream keyed by `tag`.
    ///
    /// Used for network construction, so topology randomness never perturbs
    /// the scheduler's own sequence.
    pub fn child(&mut self, tag: u64) -> SimRng {
        let state: u64 = self.0.r#gen();
        SimRng(SmallRng::seed_from_u64(mix_stream(state, tag)))
    }

    /// Uniform draw from `[0, 1)`.
    #[inline]
    pub fn unit(&mut self) -> f64 {
        self.0.r#gen()
    }

    /// Roll a die: `true` with probability `p`.
    #[inline]
    pub fn chance(&mut self, p: f64) -> bool {
        self.unit() < p
    }

    /// Uniform index into a collection of `len` elements.
    ///
    /// # Panics
    /// Panics if `len` is zero.
    #[inline]
    pub fn index(&mut self, len: usize) -> usize {
        self.0.gen_range(0..len)
    }

    /// Uniform integer from the inclusive range `[lo, hi]`.
    #[inline]
    pub fn between(&mut self, lo: u32, hi: u32) -> u32 {
        self.0.gen_range(lo..=hi)
    }

    /// Uniform pick from a slice; `None` when empty.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            Some(&items[self.index(items.len())])
        }
    }

    /// Permute a slice uniformly in place.
    #[inline]
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.0);
    }
}
