//! Bühlmann ZHL-16C decompression with gradient factors.
//!
//! Tracks inert gas loading in 16 tissue compartments. Descents use the
//! Schreiner equation and flats the Haldane equation. On each ascent the
//! ceiling at the current gradient factor decides whether the diver can go
//! straight to the target or must stop first. Stops are held in whole
//! `min_stop` increments until the tissues allow the next stop.

use tracing::{debug, trace};

use super::{finish_direct_ascent, resolved, travel_time, DecoStrategy};
use crate::error::{PlanError, SettingsError};
use crate::gas::Gas;
use crate::laws::{ambient_pressure, haldane, schreiner, time_constant, P_WATER_VAPOR, UNITS_FACTOR};
use crate::plan::DivePlan;
use crate::planner::track_gas_used;
use crate::point::{AlgoState, Origin, PlanPoint};
use crate::settings::DiveSettings;

// ============================================================================
// Physical Constants
// ============================================================================

/// Fraction of N2 in air.
const AIR_FN2: f64 = 0.7902;

/// Longest stop the planner will schedule before giving up (min).
const MAX_STOP_MINUTES: f64 = 24.0 * 60.0;

// ============================================================================
// ZHL-16C Compartment Constants (Bühlmann / Baker)
// ============================================================================

/// Number of tissue compartments.
pub const NUM_COMPARTMENTS: usize = 16;

/// N2 half-times in minutes for compartments 1–16 (ZHL-16C).
const N2_HALF_TIMES: [f64; NUM_COMPARTMENTS] = [
    5.0, 8.0, 12.5, 18.5, 27.0, 38.3, 54.3, 77.0, 109.0, 146.0, 187.0, 239.0, 305.0, 390.0, 498.0,
    635.0,
];

/// He half-times in minutes for compartments 1–16 (ZHL-16C).
const HE_HALF_TIMES: [f64; NUM_COMPARTMENTS] = [
    1.88, 3.02, 4.72, 6.99, 10.21, 14.48, 20.53, 29.11, 41.20, 55.19, 70.69, 90.34, 115.29, 147.42,
    188.24, 240.03,
];

/// N2 'a' coefficients (bar) for ZHL-16C.
const A_N2: [f64; NUM_COMPARTMENTS] = [
    1.1696, 1.0000, 0.8618, 0.7562, 0.6200, 0.5043, 0.4410, 0.4000, 0.3750, 0.3500, 0.3295, 0.3065,
    0.2835, 0.2610, 0.2480, 0.2327,
];

/// N2 'b' coefficients (dimensionless) for ZHL-16C.
const B_N2: [f64; NUM_COMPARTMENTS] = [
    0.5578, 0.6514, 0.7222, 0.7825, 0.8126, 0.8434, 0.8693, 0.8910, 0.9092, 0.9222, 0.9319, 0.9403,
    0.9477, 0.9544, 0.9602, 0.9653,
];

/// He 'a' coefficients (bar) for ZHL-16C.
const A_HE: [f64; NUM_COMPARTMENTS] = [
    1.6189, 1.3830, 1.1919, 1.0458, 0.9220, 0.8205, 0.7305, 0.6502, 0.5950, 0.5545, 0.5333, 0.5189,
    0.5181, 0.5176, 0.5172, 0.5119,
];

/// He 'b' coefficients (dimensionless) for ZHL-16C.
const B_HE: [f64; NUM_COMPARTMENTS] = [
    0.4770, 0.5747, 0.6527, 0.7223, 0.7582, 0.7957, 0.8279, 0.8553, 0.8757, 0.8903, 0.8997, 0.9073,
    0.9122, 0.9171, 0.9217, 0.9267,
];

// ============================================================================
// Tissue State
// ============================================================================

/// State of the 16 tissue compartments at a plan point.
#[derive(Debug, Clone, PartialEq)]
pub struct TissueState {
    /// N2 partial pressure in each compartment (bar).
    p_n2: [f64; NUM_COMPARTMENTS],
    /// He partial pressure in each compartment (bar).
    p_he: [f64; NUM_COMPARTMENTS],
    /// Depth of the first decompression stop, once one has been scheduled.
    first_stop: Option<f64>,
    deco: bool,
}

impl AlgoState for TissueState {
    fn is_deco(&self) -> bool {
        self.deco
    }
}

/// Inspired inert gas pressures (N2, He) for `gas` at `depth`.
fn inspired(depth: f64, gas: &Gas, atmospheric_pressure: f64) -> (f64, f64) {
    let alveolar = ambient_pressure(depth, atmospheric_pressure) - P_WATER_VAPOR;
    (alveolar * gas.n2(), alveolar * gas.he())
}

impl TissueState {
    /// Tissues at surface equilibrium breathing air.
    pub fn surface_equilibrium(atmospheric_pressure: f64) -> Self {
        let p_n2_surface = (ambient_pressure(0.0, atmospheric_pressure) - P_WATER_VAPOR) * AIR_FN2;
        TissueState {
            p_n2: [p_n2_surface; NUM_COMPARTMENTS],
            p_he: [0.0; NUM_COMPARTMENTS],
            first_stop: None,
            deco: false,
        }
    }

    pub fn p_n2(&self) -> &[f64; NUM_COMPARTMENTS] {
        &self.p_n2
    }

    pub fn p_he(&self) -> &[f64; NUM_COMPARTMENTS] {
        &self.p_he
    }

    pub fn first_stop(&self) -> Option<f64> {
        self.first_stop
    }

    /// Load the compartments for `minutes` at a constant `depth`.
    pub fn constant_depth(&mut self, depth: f64, gas: &Gas, minutes: f64, atmospheric_pressure: f64) {
        if minutes <= 0.0 {
            return;
        }
        let (p_n2, p_he) = inspired(depth, gas, atmospheric_pressure);
        for i in 0..NUM_COMPARTMENTS {
            self.p_n2[i] = haldane(self.p_n2[i], p_n2, time_constant(N2_HALF_TIMES[i]), minutes);
            self.p_he[i] = haldane(self.p_he[i], p_he, time_constant(HE_HALF_TIMES[i]), minutes);
        }
    }

    /// Load the compartments for a linear depth change lasting `minutes`.
    pub fn changing_depth(
        &mut self,
        from: f64,
        to: f64,
        gas: &Gas,
        minutes: f64,
        atmospheric_pressure: f64,
    ) {
        if minutes <= 0.0 {
            return;
        }
        let (start_n2, start_he) = inspired(from, gas, atmospheric_pressure);
        let (end_n2, end_he) = inspired(to, gas, atmospheric_pressure);
        let rate_n2 = (end_n2 - start_n2) / minutes;
        let rate_he = (end_he - start_he) / minutes;
        for i in 0..NUM_COMPARTMENTS {
            let k_n2 = time_constant(N2_HALF_TIMES[i]);
            let k_he = time_constant(HE_HALF_TIMES[i]);
            self.p_n2[i] = schreiner(start_n2, rate_n2, minutes, k_n2, self.p_n2[i]);
            self.p_he[i] = schreiner(start_he, rate_he, minutes, k_he, self.p_he[i]);
        }
    }

    /// Shallowest depth (m) the tissues tolerate at gradient factor `gf`.
    /// Zero means the diver may surface.
    pub fn ceiling(&self, gf: f64, atmospheric_pressure: f64) -> f64 {
        let mut tolerated: f64 = 0.0;
        for i in 0..NUM_COMPARTMENTS {
            let p_total = self.p_n2[i] + self.p_he[i];
            let (a, b) = self.coefficients(i);
            let p_tol = (p_total - a * gf) / (gf / b + 1.0 - gf);
            tolerated = tolerated.max(p_tol);
        }
        (tolerated * UNITS_FACTOR - atmospheric_pressure).max(0.0)
    }

    /// Surface gradient factor (%) and the index of the leading compartment.
    ///
    /// This is the gradient factor the tissues would reach on an immediate
    /// ascent to the surface.
    pub fn surface_gf(&self, atmospheric_pressure: f64) -> (f64, usize) {
        let surface = ambient_pressure(0.0, atmospheric_pressure);
        let mut max_gf: f64 = 0.0;
        let mut leading: usize = 0;
        for i in 0..NUM_COMPARTMENTS {
            let gf = self.compartment_gf(i, surface);
            if gf > max_gf {
                max_gf = gf;
                leading = i;
            }
        }
        (max_gf, leading)
    }

    /// Gradient factor (%) for a single compartment at the given ambient pressure.
    fn compartment_gf(&self, i: usize, ambient_pressure: f64) -> f64 {
        let p_total = self.p_n2[i] + self.p_he[i];
        let (a, b) = self.coefficients(i);

        // M-value at ambient: M = a + P / b
        let m_value = a + ambient_pressure / b;
        let denom = m_value - ambient_pressure;

        if denom > 1e-10 {
            ((p_total - ambient_pressure) / denom) * 100.0
        } else {
            0.0
        }
    }

    /// Workman/Baker weighted a and b for a mixed N2/He load.
    fn coefficients(&self, i: usize) -> (f64, f64) {
        let p_total = self.p_n2[i] + self.p_he[i];
        if p_total > 1e-10 {
            let a = (A_N2[i] * self.p_n2[i] + A_HE[i] * self.p_he[i]) / p_total;
            let b = (B_N2[i] * self.p_n2[i] + B_HE[i] * self.p_he[i]) / p_total;
            (a, b)
        } else {
            (A_N2[i], B_N2[i])
        }
    }
}

// ============================================================================
// Strategy
// ============================================================================

/// ZHL-16C with gradient factors.
#[derive(Debug, Clone, PartialEq)]
pub struct BuhlmannStrategy {
    gf_low: f64,
    gf_high: f64,
}

impl Default for BuhlmannStrategy {
    fn default() -> Self {
        Self {
            gf_low: 0.40,
            gf_high: 0.85,
        }
    }
}

impl BuhlmannStrategy {
    /// Gradient factors as fractions, e.g. `new(0.3, 0.7)` for GF 30/70.
    pub fn new(gf_low: f64, gf_high: f64) -> Result<Self, SettingsError> {
        let in_range = |gf: f64| gf.is_finite() && gf > 0.0 && gf <= 1.0;
        if !in_range(gf_low) || !in_range(gf_high) || gf_low > gf_high {
            return Err(SettingsError::GradientFactors {
                low: gf_low,
                high: gf_high,
            });
        }
        Ok(Self { gf_low, gf_high })
    }

    pub fn gf_low(&self) -> f64 {
        self.gf_low
    }

    pub fn gf_high(&self) -> f64 {
        self.gf_high
    }

    /// Gradient factor allowed at `depth`.
    ///
    /// Before the first stop this is GF low. Afterwards it slides linearly
    /// from GF low at the first stop to GF high at the surface.
    pub fn gradient_factor(&self, state: &TissueState, depth: f64) -> f64 {
        match state.first_stop {
            Some(first) if first > 0.0 => {
                let fraction = (depth / first).clamp(0.0, 1.0);
                self.gf_high + (self.gf_low - self.gf_high) * fraction
            }
            _ => self.gf_low,
        }
    }

    /// The depth to stop at on the way from `from` to `to`, or `None` if the
    /// diver can ascend directly.
    fn next_stop(&self, state: &TissueState, from: f64, to: f64, settings: &DiveSettings) -> Option<f64> {
        let step = settings.step_size;
        let gf = self.gradient_factor(state, from);
        let ceiling = state.ceiling(gf, settings.atmospheric_pressure);
        if ceiling <= 0.0 {
            return None;
        }

        let mut stop = ((ceiling / step).ceil() * step).max(settings.last_stop_depth);
        if state.first_stop.is_some() {
            // Move up one step at a time, but only once the tissues allow
            // it. `from` may be a waypoint rather than a stop just held.
            let below = stop_below(from, step);
            let clear_depth = if below < settings.last_stop_depth {
                to
            } else {
                below.max(to)
            };
            let gf = self.gradient_factor(state, clear_depth);
            if state.ceiling(gf, settings.atmospheric_pressure) <= clear_depth {
                if below < settings.last_stop_depth {
                    return None;
                }
                stop = stop.min(below);
            }
        }
        let stop = stop.min(from);
        (stop > to).then_some(stop)
    }

    /// Minutes to hold at `depth` until the tissues allow `clear_depth`, or
    /// `None` if that takes longer than a day.
    ///
    /// `state` is the state on arrival and is left at the end of the stop.
    /// If `stop_gas` differs from `gas`, the switch is paid on `gas` first.
    fn stop_length(
        &self,
        state: &mut TissueState,
        depth: f64,
        clear_depth: f64,
        gas: &Gas,
        stop_gas: &Gas,
        settings: &DiveSettings,
    ) -> Option<f64> {
        let atm = settings.atmospheric_pressure;
        let mut minutes = 0.0;
        if stop_gas != gas {
            state.constant_depth(depth, gas, settings.switch_time, atm);
            minutes += settings.switch_time;
        }
        loop {
            let gf = self.gradient_factor(state, clear_depth);
            if minutes >= settings.min_stop && state.ceiling(gf, atm) <= clear_depth {
                return Some(minutes);
            }
            if minutes > MAX_STOP_MINUTES {
                return None;
            }
            state.constant_depth(depth, stop_gas, settings.min_stop, atm);
            minutes += settings.min_stop;
        }
    }
}

/// The next stop shallower than `depth` on a `step` grid.
fn stop_below(depth: f64, step: f64) -> f64 {
    ((depth / step).ceil() - 1.0) * step
}

impl DecoStrategy for BuhlmannStrategy {
    type State = TissueState;

    fn name(&self) -> &'static str {
        "buhlmann-zhl16c"
    }

    fn initialise(
        &self,
        settings: &DiveSettings,
        start: &mut PlanPoint<TissueState>,
    ) -> Result<(), PlanError> {
        start.state = Some(TissueState::surface_equilibrium(settings.atmospheric_pressure));
        Ok(())
    }

    fn descending_segment(
        &self,
        settings: &DiveSettings,
        points: &mut [PlanPoint<TissueState>],
        last: usize,
        next: usize,
    ) -> Result<(), PlanError> {
        let (gas, mut state) = resolved(points, last)?;
        let minutes = points[next].time - points[last].time;
        state.changing_depth(
            points[last].depth,
            points[next].depth,
            &gas,
            minutes,
            settings.atmospheric_pressure,
        );
        points[next].state = Some(state);
        Ok(())
    }

    fn flat_segment(
        &self,
        settings: &DiveSettings,
        points: &mut [PlanPoint<TissueState>],
        last: usize,
        next: usize,
    ) -> Result<(), PlanError> {
        let (gas, mut state) = resolved(points, last)?;
        state.constant_depth(
            points[last].depth,
            &gas,
            points[next].time - points[last].time,
            settings.atmospheric_pressure,
        );
        points[next].state = Some(state);
        Ok(())
    }

    fn ascending(
        &self,
        plan: &mut DivePlan<TissueState>,
        last: usize,
        next: usize,
    ) -> Result<(), PlanError> {
        let DivePlan {
            settings,
            gases,
            result_points: points,
            ..
        } = plan;
        let atm = settings.atmospheric_pressure;
        let (gas, mut state) = resolved(points, last)?;
        let from = points[last].depth;
        let to = points[next].depth;

        let Some(stop) = self.next_stop(&state, from, to, settings) else {
            trace!(from, to, "direct ascent");
            state.changing_depth(from, to, &gas, travel_time(from, to, settings), atm);
            return finish_direct_ascent(settings, points, last, next, state);
        };

        let travel = travel_time(from, stop, settings);
        state.changing_depth(from, stop, &gas, travel, atm);
        state.deco = true;
        state.first_stop.get_or_insert(stop);

        let stop_gas = match Gas::pick_best(stop, settings, gases.iter()) {
            Some(best)
                if best != gas && (best.o2() > gas.o2() || !gas.is_breathable(stop, settings)) =>
            {
                best
            }
            _ => gas,
        };
        let after = stop_below(stop, settings.step_size);
        let clear_depth = if after < settings.last_stop_depth {
            to
        } else {
            after.max(to)
        };

        let mut held = state.clone();
        let minutes = self
            .stop_length(&mut held, stop, clear_depth, &gas, &stop_gas, settings)
            .ok_or(PlanError::AscentNotFound {
                index: next,
                depth: stop,
            })?;
        debug!(depth = stop, minutes, gas = %stop_gas, "decompression stop");

        let mut arrival = PlanPoint::inserted(stop, points[last].time + travel, gas, Origin::Arrival);
        arrival.state = Some(state);
        points.insert(
            next,
            PlanPoint::inserted_for(stop, minutes, stop_gas, Origin::Stop),
        );
        points.insert(next, arrival);
        track_gas_used(settings, points, last, next)
    }
}

// ============================================================================
// Tests
// ============================================================================
