//! Emission-rate curves — grams of gas per kilogram of substrate per hour.
//!
//! Pure and total over any elapsed time: the day argument is clamped into the
//! nominal cycle before evaluation, so no input produces NaN. Callers that
//! care about inputs past the cycle end check [`beyond_model_support`] and
//! flag the sample instead.

use crate::types::EmissionCurve;

/// Nominal rearing cycle length in days. Both fitted curves are
/// parameterized on it.
pub const CYCLE_DAYS: f64 = 8.0;

/// Hours per process day.
pub const HOURS_PER_DAY: f64 = 24.0;

/// Emission rate at `elapsed_hours` into the batch.
///
/// `SineLobe`: `avg * (0.3 + 2.7 * sin(pi * d/8)^1.8)` with `d` in days.
/// Peaks at day 4 at exactly `3.0 * avg`; never drops below `0.3 * avg`
/// inside the cycle.
///
/// `RampExp`: `base * (1 + 0.5 * d/3.6)` before day 4, then
/// `base * 1.5 * exp(2.6 * (d/8 - 0.45))`. The limbs do not meet at day 4;
/// that jump is part of the documented model and is preserved, not smoothed.
pub fn emission_rate(curve: &EmissionCurve, elapsed_hours: f64) -> f64 {
    let day = (elapsed_hours / HOURS_PER_DAY).clamp(0.0, CYCLE_DAYS);
    match curve {
        EmissionCurve::SineLobe { avg_rate_g_kg_h } => {
            // sin argument stays in [0, pi], so the fractional power is safe.
            let lobe = (std::f64::consts::PI * day / CYCLE_DAYS).sin().powf(1.8);
            avg_rate_g_kg_h * (0.3 + 2.7 * lobe)
        }
        EmissionCurve::RampExp { base_rate_g_kg_h } => {
            if day < CYCLE_DAYS / 2.0 {
                base_rate_g_kg_h * (1.0 + 0.5 * day / 3.6)
            } else {
                base_rate_g_kg_h * 1.5 * (2.6 * (day / CYCLE_DAYS - 0.45)).exp()
            }
        }
        EmissionCurve::Constant { rate_g_kg_h } => *rate_g_kg_h,
    }
}

/// True when `elapsed_hours` lies past the fitted cycle. The rate is still
/// computed (with the clamped day); the sample just carries the flag.
pub fn beyond_model_support(elapsed_hours: f64) -> bool {
    elapsed_hours / HOURS_PER_DAY > CYCLE_DAYS
}
