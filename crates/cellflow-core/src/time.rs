//! Discrete simulation time.
//!
//! A run is a sequence of [`Tick`]s grouped into simulated days by
//! [`DayClock`]:
//!
//!   day         = tick / steps_per_day + 1        (1-based)
//!   time_of_day = tick % steps_per_day
//!
//! The demand curve is indexed by time-of-day, and day boundaries trigger
//! the daily hooks (demand refresh, scheduled traffic-light changes).

// ── Tick ─────────────────────────────────────────────────────────────────────

/// One step of discrete simulation time.
///
/// A tick is the unit everything advances by: per tick, every traffic light
/// counts once and every active vehicle applies one movement step.  Plain
/// `u64` counters keep all schedule arithmetic exact and overflow out of
/// reach for any realistic horizon.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Ticks elapsed since `earlier`.
    ///
    /// Used by the trace sampler to gate interior points; `earlier` is
    /// always a previously observed tick.
    ///
    /// # Panics
    /// Panics in debug builds when `earlier` is in the future.
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0 - earlier.0
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

// ── DayClock ──────────────────────────────────────────────────────────────────

/// Converts between absolute ticks and (day, time-of-day) pairs.
///
/// `DayClock` is cheap to copy and holds no heap data.
#[derive(Clone, Copy, Debug)]
pub struct DayClock {
    /// Number of ticks in one simulated day.
    steps_per_day: u64,
}

impl DayClock {
    /// Create a clock with the given day length.
    ///
    /// # Panics
    /// Panics if `steps_per_day` is zero (validated configuration never is).
    pub fn new(steps_per_day: u64) -> Self {
        assert!(steps_per_day > 0, "steps_per_day must be positive");
        Self { steps_per_day }
    }

    #[inline]
    pub fn steps_per_day(&self) -> u64 {
        self.steps_per_day
    }

    /// 1-based simulated day containing `tick`.
    #[inline]
    pub fn day(&self, tick: Tick) -> u64 {
        tick.0 / self.steps_per_day + 1
    }

    /// Position of `tick` within its day, in `[0, steps_per_day)`.
    #[inline]
    pub fn time_of_day(&self, tick: Tick) -> u64 {
        tick.0 % self.steps_per_day
    }

    /// `true` exactly at the first tick of each day.
    #[inline]
    pub fn is_day_start(&self, tick: Tick) -> bool {
        self.time_of_day(tick) == 0
    }

    /// Total ticks spanned by `days` whole days.
    #[inline]
    pub fn ticks_for_days(&self, days: u64) -> u64 {
        days * self.steps_per_day
    }

    /// Break `time_of_day` into (hour, minute) for human-readable logging,
    /// assuming the day is divided evenly into 24 hours.
    pub fn hhmm(&self, tick: Tick) -> (u32, u32) {
        let tod = self.time_of_day(tick);
        let ticks_per_hour = (self.steps_per_day / 24).max(1);
        let hour = (tod / ticks_per_hour).min(23) as u32;
        let minute = ((tod % ticks_per_hour) * 60 / ticks_per_hour) as u32;
        (hour, minute)
    }
}
