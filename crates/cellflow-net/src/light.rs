//! Cyclic traffic-light timing attached to a cell.
//!
//! A light runs a counter over `[1, period]`; the phase is green exactly when
//! `green_lo < counter ≤ green_hi`.  The counter is advanced once per tick by
//! the scheduler's light sweep; admissibility checks only read the phase
//! flag, which is lock-free so the hot gap-scan path never contends with the
//! sweep.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::error::{NetError, NetResult};

#[derive(Debug, Clone, Copy)]
struct LightTiming {
    period: u32,
    green_lo: u32,
    green_hi: u32,
    counter: u32,
}

impl LightTiming {
    #[inline]
    fn is_green(&self) -> bool {
        self.green_lo < self.counter && self.counter <= self.green_hi
    }
}

/// The timing state of one traffic light.
pub struct TrafficLight {
    phase: AtomicBool,
    timing: Mutex<LightTiming>,
}

impl TrafficLight {
    /// Create a light with the given period and green window `(lo, hi]`.
    ///
    /// Requires `period > 0` and `0 ≤ lo < hi ≤ period`.  The counter starts
    /// at `period`, so the first `cycle()` wraps it to 1.
    pub fn new(period: u32, green_window: (u32, u32)) -> NetResult<Self> {
        let (lo, hi) = green_window;
        if period == 0 || lo >= hi || hi > period {
            return Err(NetError::InvalidGreenWindow { lo, hi, period });
        }
        let timing = LightTiming {
            period,
            green_lo: lo,
            green_hi: hi,
            counter: period,
        };
        Ok(Self {
            phase: AtomicBool::new(timing.is_green()),
            timing: Mutex::new(timing),
        })
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    /// `true` while the light is green.  Lock-free.
    #[inline]
    pub fn phase(&self) -> bool {
        self.phase.load(Ordering::Relaxed)
    }

    pub fn period(&self) -> u32 {
        self.timing.lock().unwrap().period
    }

    pub fn green_window(&self) -> (u32, u32) {
        let t = self.timing.lock().unwrap();
        (t.green_lo, t.green_hi)
    }

    pub fn counter(&self) -> u32 {
        self.timing.lock().unwrap().counter
    }

    // ── Mutations ─────────────────────────────────────────────────────────

    /// Advance the counter by one, wrapping `counter > period` back to 1,
    /// then refresh the phase flag.  Called exactly once per tick per light.
    pub fn cycle(&self) {
        let mut t = self.timing.lock().unwrap();
        t.counter += 1;
        if t.counter > t.period {
            t.counter = 1;
        }
        self.phase.store(t.is_green(), Ordering::Relaxed);
    }

    /// Pin the counter to a specific position in `[1, period]`.
    ///
    /// Used by topology generators to de-synchronize lights at startup.
    pub fn set_counter(&self, counter: u32) -> NetResult<()> {
        let mut t = self.timing.lock().unwrap();
        if counter == 0 || counter > t.period {
            return Err(NetError::CounterOutOfRange {
                counter,
                period: t.period,
            });
        }
        t.counter = counter;
        self.phase.store(t.is_green(), Ordering::Relaxed);
        Ok(())
    }

    /// Scale the period, green window and counter by a positive multiplier,
    /// clamping the counter into `[1, period]`.  Atomic with respect to
    /// concurrent phase reads: the new phase is published in one store.
    pub fn change_interval(&self, multiplier: f64) -> NetResult<()> {
        if multiplier <= 0.0 {
            return Err(NetError::InvalidMultiplier(multiplier));
        }
        let mut t = self.timing.lock().unwrap();
        let period = (t.period as f64 * multiplier) as u32;
        let lo = (t.green_lo as f64 * multiplier) as u32;
        let hi = (t.green_hi as f64 * multiplier) as u32;
        if period == 0 || lo >= hi || hi > period {
            return Err(NetError::InvalidGreenWindow { lo, hi, period });
        }
        t.period = period;
        t.green_lo = lo;
        t.green_hi = hi;
        t.counter = ((t.counter as f64 * multiplier) as u32).clamp(1, period);
        self.phase.store(t.is_green(), Ordering::Relaxed);
        Ok(())
    }
}
