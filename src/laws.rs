//! Inert gas exchange equations shared by decompression strategies.
//!
//! Pressures are in bar (atmospheres), times in minutes and rates in bar per
//! minute. Both equations are pure: identical inputs give bit-identical
//! outputs.

/// Metres of seawater per atmosphere.
pub const UNITS_FACTOR: f64 = 10.1325;

/// Water vapour pressure in the lungs (bar), at 37°C.
pub const P_WATER_VAPOR: f64 = 0.0627;

/// Ambient pressure (bar) at `depth` metres below a surface of
/// `atmospheric_pressure` metres seawater equivalent.
#[inline]
pub fn ambient_pressure(depth: f64, atmospheric_pressure: f64) -> f64 {
    (depth + atmospheric_pressure) / UNITS_FACTOR
}

/// Compartment time constant `k` for a half-time in minutes.
#[inline]
pub fn time_constant(half_time: f64) -> f64 {
    std::f64::consts::LN_2 / half_time
}

/// Haldane equation for intervals at constant depth.
///
/// - `initial`: compartment inert gas pressure at the start.
/// - `inspired`: inspired inert gas pressure.
/// - `k`: compartment time constant.
/// - `t`: time spent at depth.
pub fn haldane(initial: f64, inspired: f64, k: f64, t: f64) -> f64 {
    initial + (inspired - initial) * (1.0 - (-k * t).exp())
}

/// Schreiner equation for intervals where the inspired pressure changes at a
/// constant rate, such as ascents and descents.
///
/// - `p0`: inspired inert gas pressure at the start of the interval.
/// - `rate`: rate of change of the inspired pressure.
/// - `t`: length of the interval.
/// - `k`: compartment time constant.
/// - `pc0`: compartment inert gas pressure at the start.
pub fn schreiner(p0: f64, rate: f64, t: f64, k: f64, pc0: f64) -> f64 {
    p0 + rate * (t - 1.0 / k) - (p0 - pc0 - rate / k) * (-k * t).exp()
}
