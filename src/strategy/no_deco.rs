//! A no-stop policy: tissues are not modelled, ascents are direct apart from
//! a safety stop.

use tracing::debug;

use super::{finish_direct_ascent, resolved, travel_time, DecoStrategy};
use crate::error::PlanError;
use crate::gas::Gas;
use crate::plan::DivePlan;
use crate::planner::track_gas_used;
use crate::point::{AlgoState, Origin, PlanPoint};
use crate::settings::DiveSettings;

/// State of a no-stop dive. There is nothing to track.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NoDecoState;

impl AlgoState for NoDecoState {
    fn is_deco(&self) -> bool {
        false
    }
}

/// Recreational no-stop planning with a safety stop.
#[derive(Debug, Clone, PartialEq)]
pub struct NoDecoStrategy {
    /// Ascents starting deeper than this get a safety stop (m).
    pub trigger_depth: f64,
    /// Depth of the safety stop (m).
    pub stop_depth: f64,
    /// Length of the safety stop (min).
    pub stop_duration: f64,
}

impl Default for NoDecoStrategy {
    fn default() -> Self {
        Self {
            trigger_depth: 10.0,
            stop_depth: 6.0,
            stop_duration: 3.0,
        }
    }
}

impl DecoStrategy for NoDecoStrategy {
    type State = NoDecoState;

    fn name(&self) -> &'static str {
        "no-deco"
    }

    fn initialise(
        &self,
        _settings: &DiveSettings,
        start: &mut PlanPoint<NoDecoState>,
    ) -> Result<(), PlanError> {
        start.state = Some(NoDecoState);
        Ok(())
    }

    fn descending_segment(
        &self,
        _settings: &DiveSettings,
        _points: &mut [PlanPoint<NoDecoState>],
        _last: usize,
        _next: usize,
    ) -> Result<(), PlanError> {
        Ok(())
    }

    fn flat_segment(
        &self,
        _settings: &DiveSettings,
        _points: &mut [PlanPoint<NoDecoState>],
        _last: usize,
        _next: usize,
    ) -> Result<(), PlanError> {
        Ok(())
    }

    fn ascending(
        &self,
        plan: &mut DivePlan<NoDecoState>,
        last: usize,
        next: usize,
    ) -> Result<(), PlanError> {
        let DivePlan {
            settings,
            gases,
            result_points: points,
            ..
        } = plan;
        let (gas, state) = resolved(points, last)?;
        let from = points[last].depth;
        let to = points[next].depth;

        if from <= self.trigger_depth || to >= self.stop_depth {
            return finish_direct_ascent(settings, points, last, next, state);
        }

        let arrival = points[last].time + travel_time(from, self.stop_depth, settings);
        let stop_gas = Gas::pick_best(self.stop_depth, settings, gases.iter()).unwrap_or(gas);
        debug!(
            depth = self.stop_depth,
            minutes = self.stop_duration,
            gas = %stop_gas,
            "safety stop"
        );

        let mut stop_arrival =
            PlanPoint::inserted(self.stop_depth, arrival, gas, Origin::Arrival);
        stop_arrival.state = Some(state);
        points.insert(
            next,
            PlanPoint::inserted_for(self.stop_depth, self.stop_duration, stop_gas, Origin::Stop),
        );
        points.insert(next, stop_arrival);
        track_gas_used(settings, points, last, next)
    }
}
