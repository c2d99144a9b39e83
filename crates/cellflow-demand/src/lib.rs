//! `cellflow-demand` — traffic demand as a daily curve.
//!
//! A [`DemandCurve`] holds one real value per time-of-day step.  Each
//! simulated day the raw curve is re-derived with
//! [`DemandCurve::adjusted`] (affine transform plus one shared daily noise
//! factor); each tick [`DemandCurve::generate_count`] turns the current
//! value into an integer vehicle count with a Bernoulli draw on the
//! fractional part, so long-run injection matches the curve in expectation.

pub mod curve;
pub mod error;
pub mod loader;

#[cfg(test)]
mod tests;

pub use curve::DemandCurve;
pub use error::{DemandError, DemandResult};
