//! The dive plan container: waypoints in, resolved itinerary out.

use crate::gas::Gas;
use crate::point::{AlgoState, GasUsage, Origin, PlanPoint};
use crate::settings::DiveSettings;

/// A planned dive.
///
/// Callers fill `user_points`, `gases` and `settings`; the planner fills
/// `result_points` and `final_state`.
#[derive(Debug, Clone)]
pub struct DivePlan<S> {
    pub user_points: Vec<PlanPoint<S>>,
    pub gases: Vec<Gas>,
    pub settings: DiveSettings,
    pub result_points: Vec<PlanPoint<S>>,
    pub final_state: Option<S>,
    /// Minutes spent at the surface since `last_plan` ended.
    pub surface_interval: f64,
    /// The previous dive in a repetitive series.
    pub last_plan: Option<Box<DivePlan<S>>>,
}

/// One line of a dive table. Move points never produce a row.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRow {
    pub depth: f64,
    /// Minutes since the previous row.
    pub duration: f64,
    /// Minutes since the start of the dive.
    pub runtime: f64,
    pub gas: Option<Gas>,
    pub origin: Origin,
}

impl<S> DivePlan<S> {
    pub fn new(settings: DiveSettings) -> Self {
        Self {
            user_points: Vec::new(),
            gases: Vec::new(),
            settings,
            result_points: Vec::new(),
            final_state: None,
            surface_interval: 0.0,
            last_plan: None,
        }
    }

    pub fn with_gases(mut self, gases: impl IntoIterator<Item = Gas>) -> Self {
        self.set_gases(gases.into_iter().collect());
        self
    }

    pub fn with_point(mut self, point: PlanPoint<S>) -> Self {
        self.user_points.push(point);
        self
    }

    pub fn with_points(mut self, points: impl IntoIterator<Item = PlanPoint<S>>) -> Self {
        self.user_points.extend(points);
        self
    }

    /// Chain this plan after `previous`, with `surface_interval` minutes
    /// spent at the surface in between.
    pub fn after(mut self, previous: DivePlan<S>, surface_interval: f64) -> Self {
        self.last_plan = Some(Box::new(previous));
        self.surface_interval = surface_interval;
        self
    }

    /// Replace the gas list. User points that named a gas no longer in the
    /// list fall back to letting the planner choose.
    pub fn set_gases(&mut self, gases: Vec<Gas>) {
        for point in &mut self.user_points {
            if point.gas.is_some_and(|gas| !gases.contains(&gas)) {
                point.gas = None;
            }
        }
        self.gases = gases;
    }

    pub fn clear_result_points(&mut self) {
        self.result_points.clear();
        self.final_state = None;
    }

    pub fn is_resolved(&self) -> bool {
        !self.result_points.is_empty()
    }

    /// Human-facing rows, skipping move points.
    pub fn rows(&self) -> Vec<PlanRow> {
        let mut previous_time = 0.0;
        self.result_points
            .iter()
            .filter(|point| !point.is_move_point())
            .map(|point| {
                let row = PlanRow {
                    depth: point.depth,
                    duration: point.time - previous_time,
                    runtime: point.time,
                    gas: point.gas,
                    origin: point.origin,
                };
                previous_time = point.time;
                row
            })
            .collect()
    }

    /// Total gas used over the whole dive.
    pub fn gas_used(&self) -> Option<&GasUsage> {
        self.result_points
            .last()
            .and_then(|point| point.gas_used.as_ref())
    }

    /// Runtime at the final surfacing, in minutes.
    pub fn runtime(&self) -> f64 {
        self.result_points.last().map_or(0.0, |point| point.time)
    }

    pub fn max_depth(&self) -> f64 {
        self.result_points
            .iter()
            .map(|point| point.depth)
            .fold(0.0_f64, f64::max)
    }
}

impl<S: AlgoState> DivePlan<S> {
    /// Whether any part of the resolved plan is spent decompressing.
    pub fn deco_required(&self) -> bool {
        self.result_points.iter().any(PlanPoint::is_deco)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Unit;

    impl AlgoState for Unit {
        fn is_deco(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_set_gases_drops_unknown_point_gases() {
        let mut plan: DivePlan<Unit> = DivePlan::new(DiveSettings::default())
            .with_point(PlanPoint::at_time(10.0, 1.0).with_gas(Gas::EAN50))
            .with_point(PlanPoint::at_time(30.0, 5.0).with_gas(Gas::AIR));
        plan.set_gases(vec![Gas::AIR]);
        assert_eq!(plan.user_points[0].gas, None);
        assert_eq!(plan.user_points[1].gas, Some(Gas::AIR));
    }

    #[test]
    fn test_rows_skip_move_points() {
        let mut plan: DivePlan<Unit> = DivePlan::new(DiveSettings::default());
        plan.result_points = vec![
            PlanPoint::surface_move(),
            PlanPoint::inserted(30.0, 1.5, Gas::AIR, Origin::Arrival),
            PlanPoint::at_time(30.0, 20.0).with_gas(Gas::AIR),
            PlanPoint::inserted(0.0, 23.0, Gas::AIR, Origin::Move),
        ];

        let rows = plan.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].origin, Origin::Arrival);
        assert_eq!(rows[0].duration, 1.5);
        assert_eq!(rows[1].runtime, 20.0);
        assert_eq!(rows[1].duration, 18.5);
        assert_eq!(plan.runtime(), 23.0);
        assert_eq!(plan.max_depth(), 30.0);
    }
}
