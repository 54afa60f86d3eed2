//! Decompression strategies plugged into the planner.
//!
//! A strategy owns the physiological model: how tissue state evolves over
//! each segment and how an ascent is broken into stops. The planner owns the
//! geometry of descents, flats and gas switches.

pub mod buhlmann;
pub mod no_deco;

pub use buhlmann::{BuhlmannStrategy, TissueState};
pub use no_deco::{NoDecoState, NoDecoStrategy};

use crate::error::PlanError;
use crate::gas::Gas;
use crate::plan::DivePlan;
use crate::planner::{place_arrival, track_gas_used};
use crate::point::{AlgoState, PlanPoint};
use crate::settings::DiveSettings;

/// Hooks the planner calls while resolving a dive plan.
///
/// Every hook works on the segment from `last` to `next`, where
/// `next == last + 1`. By the time a hook runs, `next` already has a gas and
/// a copy of `last`'s state.
pub trait DecoStrategy {
    type State: AlgoState;

    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// State of the first point of the first dive in a series, e.g. tissues
    /// saturated at surface pressure.
    fn initialise(
        &self,
        settings: &DiveSettings,
        start: &mut PlanPoint<Self::State>,
    ) -> Result<(), PlanError>;

    /// State of the first point of a repetitive dive, after `interval`
    /// minutes at the surface following `previous`.
    ///
    /// Surface off-gassing is model specific, so there is no default model.
    fn surface_interval(
        &self,
        _settings: &DiveSettings,
        _previous: &DivePlan<Self::State>,
        _interval: f64,
        _start: &mut PlanPoint<Self::State>,
    ) -> Result<(), PlanError> {
        Err(PlanError::SurfaceIntervalUnsupported)
    }

    /// Update `points[next]`'s state for a descent from `points[last]`.
    fn descending_segment(
        &self,
        settings: &DiveSettings,
        points: &mut [PlanPoint<Self::State>],
        last: usize,
        next: usize,
    ) -> Result<(), PlanError>;

    /// Update `points[next]`'s state for time spent at `points[last]`'s
    /// depth.
    fn flat_segment(
        &self,
        settings: &DiveSettings,
        points: &mut [PlanPoint<Self::State>],
        last: usize,
        next: usize,
    ) -> Result<(), PlanError>;

    /// Resolve an ascent from `last` towards `next`.
    ///
    /// The strategy may insert points at index `next`; afterwards the point
    /// at `next` must have its time, gas, state and gas usage resolved
    /// (see [`crate::planner::track_gas_used`]). Later points up to the
    /// original target are resolved by the planner.
    fn ascending(
        &self,
        plan: &mut DivePlan<Self::State>,
        last: usize,
        next: usize,
    ) -> Result<(), PlanError>;
}

/// Ascend from `points[last]` straight to `points[next]` at the ascent rate,
/// on `last`'s gas.
///
/// `state` is the strategy's state on arrival. Anchors are handled as for a
/// descent: an arrival point is inserted unless `next` can be reached no
/// earlier than its requested time.
pub fn finish_direct_ascent<S: AlgoState>(
    settings: &DiveSettings,
    points: &mut Vec<PlanPoint<S>>,
    last: usize,
    next: usize,
    state: S,
) -> Result<(), PlanError> {
    let (gas, _) = resolved(points, last)?;
    let arrival = points[last].time + travel_time(points[last].depth, points[next].depth, settings);
    points[next].gas.get_or_insert(gas);
    place_arrival(points, next, arrival, gas);
    points[next].state = Some(state);
    track_gas_used(settings, points, last, next)
}

/// Minutes to ascend from `from` to `to` at the ascent rate.
pub(crate) fn travel_time(from: f64, to: f64, settings: &DiveSettings) -> f64 {
    (from - to) / settings.ascent_rate
}

/// The gas and state of an already resolved point.
pub(crate) fn resolved<S: AlgoState>(
    points: &[PlanPoint<S>],
    index: usize,
) -> Result<(Gas, S), PlanError> {
    let point = &points[index];
    let gas = point.gas.ok_or(PlanError::UnresolvedPoint {
        index,
        missing: "gas",
    })?;
    let state = point.state.clone().ok_or(PlanError::UnresolvedPoint {
        index,
        missing: "state",
    })?;
    Ok((gas, state))
}
