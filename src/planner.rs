//! The segment builder.
//!
//! Turns a sparse list of waypoints into a dense, time ordered itinerary:
//! descents are run at the maximum descent rate, gas switches are inserted
//! where a gas runs out of its operating range, and every segment is gas
//! accounted. Ascents are handed to the [`DecoStrategy`].
//!
//! The result sequence is a `Vec` walked with an index cursor. Handlers only
//! insert points between `last` and the original `next`; the cursor resolves
//! each inserted point in order and then moves past the original `next`.

use tracing::{debug, trace, warn};

use crate::error::PlanError;
use crate::gas::Gas;
use crate::laws::ambient_pressure;
use crate::plan::DivePlan;
use crate::point::{AlgoState, Anchor, GasUsage, Origin, PlanPoint};
use crate::settings::DiveSettings;
use crate::strategy::DecoStrategy;

/// Smallest time difference (minutes) treated as a separate event.
pub const MIN_TIME_INTERVAL: f64 = 0.1;

/// Tolerance for comparing runtimes.
const TIME_EPSILON: f64 = 1e-9;

/// Computes dive plans with a pluggable decompression strategy.
#[derive(Debug, Clone, Default)]
pub struct Planner<A> {
    strategy: A,
}

impl<A: DecoStrategy> Planner<A> {
    pub fn new(strategy: A) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> &A {
        &self.strategy
    }

    /// Resolve `plan`'s waypoints into a complete itinerary.
    ///
    /// Either every result point ends up with a gas, a state and a gas usage
    /// entry for every plan gas, or an error is returned.
    pub fn compute_dive(
        &self,
        mut plan: DivePlan<A::State>,
    ) -> Result<DivePlan<A::State>, PlanError> {
        validate_input(&plan)?;
        debug!(
            strategy = self.strategy.name(),
            waypoints = plan.user_points.len(),
            gases = plan.gases.len(),
            "computing dive plan"
        );

        let settings = plan.settings.clone();
        init_result_points(&mut plan);

        match plan.last_plan.as_deref() {
            None => self
                .strategy
                .initialise(&settings, &mut plan.result_points[0])?,
            Some(previous) => self.strategy.surface_interval(
                &settings,
                previous,
                plan.surface_interval,
                &mut plan.result_points[0],
            )?,
        }
        plan.result_points[0].gas_used = Some(GasUsage::seeded(&plan.gases));

        let mut cursor = 1;
        while cursor < plan.result_points.len() {
            cursor = self.resolve_span(&mut plan, &settings, cursor)? + 1;
        }

        verify(&plan)?;
        plan.final_state = plan
            .result_points
            .last()
            .and_then(|point| point.state.clone());

        debug!(
            points = plan.result_points.len(),
            runtime = plan.runtime(),
            "dive plan resolved"
        );
        Ok(plan)
    }

    /// Resolve every segment from `next - 1` up to the point currently at
    /// `next`, including points inserted in between. Returns the final index
    /// of that point.
    fn resolve_span(
        &self,
        plan: &mut DivePlan<A::State>,
        settings: &DiveSettings,
        next: usize,
    ) -> Result<usize, PlanError> {
        let mut target = next;
        let mut index = next;
        loop {
            let before = plan.result_points.len();
            self.resolve_segment(plan, settings, index)?;
            let inserted = plan.result_points.len() - before;
            if inserted > 0 {
                trace!(index, inserted, "points inserted");
            }
            target += inserted;
            if index >= target {
                return Ok(target);
            }
            index += 1;
        }
    }

    fn resolve_segment(
        &self,
        plan: &mut DivePlan<A::State>,
        settings: &DiveSettings,
        next: usize,
    ) -> Result<(), PlanError> {
        let from = plan.result_points[next - 1].depth;
        let to = plan.result_points[next].depth;
        if to > from {
            trace!(next, from, to, "descending");
            self.descending(plan, settings, next)
        } else if to == from {
            trace!(next, depth = to, "flat");
            self.flat(plan, settings, next)
        } else {
            trace!(next, from, to, "ascending");
            self.ascending(plan, settings, next)
        }
    }

    fn descending(
        &self,
        plan: &mut DivePlan<A::State>,
        settings: &DiveSettings,
        next: usize,
    ) -> Result<(), PlanError> {
        let last = next - 1;
        let gases = &plan.gases;
        let points = &mut plan.result_points;

        let last_depth = points[last].depth;
        let last_time = points[last].time;
        let target_depth = points[next].depth;
        let start_gas = resolve_gas(points, last, target_depth, settings, gases)?;
        let arrival_at = |depth: f64| last_time + (depth - last_depth) / settings.descent_rate;

        if !start_gas.is_breathable(target_depth, settings) {
            let end_gas = Gas::pick_best(target_depth, settings, gases).ok_or(
                PlanError::NoBreathableGas {
                    index: next,
                    depth: target_depth,
                },
            )?;
            if points[next].gas.is_some_and(|gas| gas != end_gas) {
                warn!(
                    index = next,
                    depth = target_depth,
                    gas = %end_gas,
                    "requested gas replaced by the best gas for the depth"
                );
            }
            points[next].gas = Some(end_gas);

            // Descend as far as the start gas allows, then switch there.
            let clip = start_gas
                .mod_depth(settings)
                .min(target_depth)
                .max(last_depth);
            let switch_start = arrival_at(clip);
            debug!(
                from = %start_gas,
                to = %end_gas,
                depth = clip,
                "gas switch forced on descent"
            );
            let switch = PlanPoint::inserted(
                clip,
                switch_start + settings.switch_time,
                end_gas,
                Origin::GasSwitch,
            );
            if clip <= last_depth {
                points.insert(next, switch);
                return self.flat(plan, settings, next);
            }
            points.insert(next, switch);
            points.insert(
                next,
                PlanPoint::inserted(clip, switch_start, start_gas, Origin::Arrival),
            );
        } else {
            let end_gas = *points[next].gas.get_or_insert(start_gas);
            let arrival = arrival_at(target_depth);

            if end_gas != start_gas {
                debug!(from = %start_gas, to = %end_gas, depth = target_depth, "gas switch at target depth");
                points.insert(
                    next,
                    PlanPoint::inserted(
                        target_depth,
                        arrival + settings.switch_time,
                        end_gas,
                        Origin::GasSwitch,
                    ),
                );
                points.insert(
                    next,
                    PlanPoint::inserted(target_depth, arrival, start_gas, Origin::Arrival),
                );
                let held = &mut points[next + 2];
                if let Some(duration) = held.duration() {
                    held.set_duration((duration - settings.switch_time).max(0.0));
                }
            } else {
                place_arrival(points, next, arrival, start_gas);
            }
        }

        carry_state(points, next);
        self.strategy
            .descending_segment(settings, points, last, next)?;
        track_gas_used(settings, points, last, next)
    }

    fn flat(
        &self,
        plan: &mut DivePlan<A::State>,
        settings: &DiveSettings,
        next: usize,
    ) -> Result<(), PlanError> {
        let last = next - 1;
        let gases = &plan.gases;
        let points = &mut plan.result_points;

        let depth = points[last].depth;
        let last_time = points[last].time;
        let last_gas = resolve_gas(points, last, depth, settings, gases)?;

        let point = &mut points[next];
        match point.anchor {
            Anchor::Duration(duration) => point.time = last_time + duration,
            Anchor::Time(_) if point.time < last_time => {
                warn!(
                    index = next,
                    requested = point.time,
                    clamped = last_time,
                    "waypoint time earlier than previous point, clamping"
                );
                point.time = last_time;
            }
            Anchor::Time(_) => {}
        }

        match point.gas {
            None => point.gas = Some(last_gas),
            Some(gas) if gas != last_gas && point.origin != Origin::GasSwitch => {
                let switch_end = last_time + settings.switch_time;
                debug!(from = %last_gas, to = %gas, depth, "gas switch on flat segment");
                let separate = match point.anchor {
                    Anchor::Duration(duration) => {
                        point.set_duration((duration - settings.switch_time).max(0.0));
                        duration > settings.switch_time
                    }
                    Anchor::Time(_) => point.time - switch_end >= MIN_TIME_INTERVAL,
                };
                if !separate {
                    // The point itself ends the switch.
                    point.time = point.time.max(switch_end);
                } else {
                    points.insert(
                        next,
                        PlanPoint::inserted(depth, switch_end, gas, Origin::GasSwitch),
                    );
                }
            }
            Some(_) => {}
        }

        carry_state(points, next);
        self.strategy.flat_segment(settings, points, last, next)?;
        track_gas_used(settings, points, last, next)
    }

    fn ascending(
        &self,
        plan: &mut DivePlan<A::State>,
        settings: &DiveSettings,
        next: usize,
    ) -> Result<(), PlanError> {
        let last = next - 1;
        let target_depth = plan.result_points[next].depth;
        resolve_gas(
            &mut plan.result_points,
            last,
            target_depth,
            settings,
            &plan.gases,
        )?;
        carry_state(&mut plan.result_points, next);
        self.strategy.ascending(plan, last, next)
    }
}

/// Finish travel towards `points[next]`, arriving at runtime `arrival`.
///
/// A duration point gets a separate arrival point and its hold starts on
/// arrival. A time point that cannot be reached before `arrival` is pushed
/// back to `arrival`; one that can gets a separate arrival point so the
/// travel stays at the maximum rate. Either way `points[next]` afterwards
/// ends the travel segment.
pub fn place_arrival<S>(points: &mut Vec<PlanPoint<S>>, next: usize, arrival: f64, gas: Gas) {
    let point = &mut points[next];
    let depth = point.depth;
    match point.anchor {
        Anchor::Duration(duration) => point.time = arrival + duration,
        Anchor::Time(_) if point.time - arrival < MIN_TIME_INTERVAL => {
            point.time = arrival;
            return;
        }
        Anchor::Time(_) => {}
    }
    points.insert(
        next,
        PlanPoint::inserted(depth, arrival, gas, Origin::Arrival),
    );
}

/// Add the gas breathed between `points[last]` and `points[next]` to
/// `points[next]`'s running totals.
///
/// When the two points carry different gases the segment is a switch, and
/// its volume is charged to both gases.
pub fn track_gas_used<S: AlgoState>(
    settings: &DiveSettings,
    points: &mut [PlanPoint<S>],
    last: usize,
    next: usize,
) -> Result<(), PlanError> {
    let (head, tail) = points.split_at_mut(next);
    let from = &head[last];
    let to = &mut tail[0];

    let last_gas = from.gas.ok_or(PlanError::UnresolvedPoint {
        index: last,
        missing: "gas",
    })?;
    let next_gas = to.gas.ok_or(PlanError::UnresolvedPoint {
        index: next,
        missing: "gas",
    })?;
    let mut usage = from.gas_used.clone().ok_or(PlanError::UnresolvedPoint {
        index: last,
        missing: "gas usage",
    })?;

    let sac = if to.is_deco() {
        settings.deco_sac
    } else {
        settings.bottom_sac
    };
    let litres = breathed(from.depth, to.depth, to.time - from.time, sac, settings);
    usage.add(last_gas, litres);
    if next_gas != last_gas {
        usage.add(next_gas, litres);
    }
    to.gas_used = Some(usage);
    Ok(())
}

/// Litres of surface gas breathed over a straight segment.
fn breathed(start_depth: f64, end_depth: f64, minutes: f64, sac: f64, settings: &DiveSettings) -> f64 {
    let avg_depth = (start_depth + end_depth) / 2.0;
    ambient_pressure(avg_depth, settings.atmospheric_pressure) * sac * minutes
}

/// The gas to start a segment from `current` to `target` depth on.
///
/// Prefer the best gas for the end of the segment if it can already be
/// breathed here, to avoid a switch; otherwise the best gas for here.
pub fn pick_start_gas(
    current: f64,
    target: f64,
    settings: &DiveSettings,
    gases: &[Gas],
) -> Option<Gas> {
    match Gas::pick_best(target, settings, gases) {
        Some(gas) if gas.is_breathable(current, settings) => Some(gas),
        _ => Gas::pick_best(current, settings, gases),
    }
}

/// `points[index]`'s gas, choosing a start gas if it has none yet.
///
/// A gas requested on the following point wins if it can be breathed both
/// here and at `target`.
fn resolve_gas<S>(
    points: &mut [PlanPoint<S>],
    index: usize,
    target: f64,
    settings: &DiveSettings,
    gases: &[Gas],
) -> Result<Gas, PlanError> {
    let requested = points.get(index + 1).and_then(|point| point.gas);
    let point = &mut points[index];
    if let Some(gas) = point.gas {
        return Ok(gas);
    }
    let gas = requested
        .filter(|gas| {
            gas.is_breathable(point.depth, settings) && gas.is_breathable(target, settings)
        })
        .or_else(|| pick_start_gas(point.depth, target, settings, gases))
        .ok_or(PlanError::NoBreathableGas {
            index,
            depth: point.depth,
        })?;
    point.gas = Some(gas);
    Ok(gas)
}

/// Default `points[next]`'s state to its predecessor's.
fn carry_state<S: Clone>(points: &mut [PlanPoint<S>], next: usize) {
    points[next].state = points[next - 1].state.clone();
}

fn validate_input<S>(plan: &DivePlan<S>) -> Result<(), PlanError> {
    if plan.user_points.is_empty() {
        return Err(PlanError::NoWaypoints);
    }
    if plan.gases.is_empty() {
        return Err(PlanError::NoGases);
    }
    plan.settings.validate()?;

    for (index, point) in plan.user_points.iter().enumerate() {
        if !(point.depth.is_finite() && point.depth >= 0.0) {
            return Err(PlanError::InvalidWaypoint {
                index,
                reason: format!("depth {} is not a non-negative number", point.depth),
            });
        }
        let (kind, value) = match point.anchor {
            Anchor::Time(t) => ("time", t),
            Anchor::Duration(d) => ("duration", d),
        };
        if !(value.is_finite() && value >= 0.0) {
            return Err(PlanError::InvalidWaypoint {
                index,
                reason: format!("{kind} {value} is not a non-negative number"),
            });
        }
        if let Some(gas) = point.gas.filter(|gas| !plan.gases.contains(gas)) {
            return Err(PlanError::InvalidWaypoint {
                index,
                reason: format!("gas {gas} is not in the plan's gas list"),
            });
        }
    }
    Ok(())
}

/// Copy the waypoints into the result sequence, making it start and end at
/// the surface.
fn init_result_points<S: Clone>(plan: &mut DivePlan<S>) {
    plan.result_points = plan
        .user_points
        .iter()
        .cloned()
        .map(|mut point| {
            point.time = match point.anchor {
                Anchor::Time(t) => t,
                Anchor::Duration(_) => 0.0,
            };
            point.state = None;
            point.gas_used = None;
            point
        })
        .collect();
    plan.final_state = None;

    if plan.result_points.last().is_some_and(|point| point.depth != 0.0) {
        plan.result_points.push(PlanPoint::surface_move());
    }
    if plan.result_points.first().is_some_and(|point| point.depth != 0.0) {
        plan.result_points.insert(0, PlanPoint::surface_move());
    }
}

fn verify<S: AlgoState>(plan: &DivePlan<S>) -> Result<(), PlanError> {
    let mut previous_time = f64::NEG_INFINITY;
    for (index, point) in plan.result_points.iter().enumerate() {
        if point.gas.is_none() {
            return Err(PlanError::UnresolvedPoint {
                index,
                missing: "gas",
            });
        }
        if point.state.is_none() {
            return Err(PlanError::UnresolvedPoint {
                index,
                missing: "state",
            });
        }
        let usage = point.gas_used.as_ref().ok_or(PlanError::UnresolvedPoint {
            index,
            missing: "gas usage",
        })?;
        if plan.gases.iter().any(|gas| !usage.contains(gas)) {
            return Err(PlanError::UnresolvedPoint {
                index,
                missing: "gas usage",
            });
        }
        if point.time < previous_time - TIME_EPSILON {
            return Err(PlanError::TimeReversal { index });
        }
        if usage.iter().any(|(_, litres)| *litres < 0.0) {
            return Err(PlanError::NegativeVolume { index });
        }
        previous_time = point.time;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{NoDecoState, NoDecoStrategy};

    const EPS: f64 = 1e-9;

    fn planner() -> Planner<NoDecoStrategy> {
        Planner::new(NoDecoStrategy::default())
    }

    fn plan(gases: &[Gas], points: Vec<PlanPoint<NoDecoState>>) -> DivePlan<NoDecoState> {
        DivePlan::new(DiveSettings::default())
            .with_gases(gases.iter().copied())
            .with_points(points)
    }

    fn hypoxic() -> Gas {
        Gas::from_percent(10, 60).unwrap()
    }

    #[test]
    fn test_descent_slowed_to_descent_rate() {
        let result = planner()
            .compute_dive(plan(&[Gas::AIR], vec![PlanPoint::at_time(40.0, 0.0)]))
            .unwrap();
        let points = &result.result_points;
        assert_eq!(points[1].depth, 40.0);
        assert!((points[1].time - 2.0).abs() < EPS);
        assert_eq!(points[1].origin, Origin::User);
        assert!(points.iter().all(|p| p.gas.is_some()));
    }

    #[test]
    fn test_descent_faster_inserts_arrival() {
        let result = planner()
            .compute_dive(plan(&[Gas::AIR], vec![PlanPoint::at_time(40.0, 5.0)]))
            .unwrap();
        let points = &result.result_points;
        assert_eq!(points[1].origin, Origin::Arrival);
        assert_eq!(points[1].depth, 40.0);
        assert!((points[1].time - 2.0).abs() < EPS);
        assert_eq!(points[2].time, 5.0);
    }

    #[test]
    fn test_duration_point_slower_than_travel() {
        let result = planner()
            .compute_dive(plan(&[Gas::AIR], vec![PlanPoint::for_duration(40.0, 1.0)]))
            .unwrap();
        let points = &result.result_points;
        assert!((points[1].time - 2.0).abs() < EPS);
        assert_eq!(points[1].depth, 40.0);
        assert!((points[2].time - 3.0).abs() < EPS);
        assert!(points.iter().all(|p| p.gas.is_some()));
    }

    #[test]
    fn test_duration_point_faster_than_travel() {
        let result = planner()
            .compute_dive(plan(&[Gas::AIR], vec![PlanPoint::for_duration(40.0, 5.0)]))
            .unwrap();
        let points = &result.result_points;
        assert!((points[1].time - 2.0).abs() < EPS);
        assert!((points[2].time - 7.0).abs() < EPS);
    }

    #[test]
    fn test_gas_switch_forced_on_descent() {
        let settings = DiveSettings::default();
        let result = planner()
            .compute_dive(plan(
                &[Gas::EAN50, Gas::AIR],
                vec![
                    PlanPoint::at_time(0.0, 0.0).with_gas(Gas::EAN50),
                    PlanPoint::at_time(40.0, 1.0),
                ],
            ))
            .unwrap();
        let points = &result.result_points;
        let mod_depth = Gas::EAN50.mod_depth(&settings);
        let switch_start = mod_depth / settings.descent_rate;

        assert_eq!(points[1].depth, mod_depth);
        assert!((points[1].time - switch_start).abs() < EPS);
        assert_eq!(points[1].gas, Some(Gas::EAN50));

        assert_eq!(points[2].depth, mod_depth);
        assert_eq!(points[2].origin, Origin::GasSwitch);
        assert!((points[2].time - (switch_start + settings.switch_time)).abs() < EPS);
        assert_eq!(points[2].gas, Some(Gas::AIR));

        let bottom = switch_start + settings.switch_time + (40.0 - mod_depth) / settings.descent_rate;
        assert_eq!(points[3].depth, 40.0);
        assert!((points[3].time - bottom).abs() < EPS);
        assert_eq!(points[3].gas, Some(Gas::AIR));
    }

    #[test]
    fn test_requested_gas_beyond_mod_is_switched() {
        let settings = DiveSettings::default();
        let result = planner()
            .compute_dive(plan(
                &[Gas::EAN50, Gas::AIR],
                vec![
                    PlanPoint::at_time(0.0, 0.0).with_gas(Gas::EAN50),
                    PlanPoint::at_time(40.0, 1.0).with_gas(Gas::EAN50),
                ],
            ))
            .unwrap();
        let points = &result.result_points;
        let mod_depth = Gas::EAN50.mod_depth(&settings);

        assert_eq!(points[1].depth, mod_depth);
        assert_eq!(points[1].gas, Some(Gas::EAN50));
        assert_eq!(points[2].origin, Origin::GasSwitch);
        assert_eq!(points[2].gas, Some(Gas::AIR));

        let bottom = &points[3];
        assert_eq!(bottom.depth, 40.0);
        assert!(bottom.is_user_point());
        assert_eq!(bottom.gas, Some(Gas::AIR));
    }

    #[test]
    fn test_requested_start_gas_must_suit_target() {
        let settings = DiveSettings::default();
        let gases = [Gas::AIR, Gas::EAN50];
        let mut points: Vec<PlanPoint<NoDecoState>> = vec![
            PlanPoint::at_time(0.0, 0.0),
            PlanPoint::at_time(40.0, 5.0).with_gas(Gas::EAN50),
        ];
        assert_eq!(resolve_gas(&mut points, 0, 40.0, &settings, &gases), Ok(Gas::AIR));

        let mut points: Vec<PlanPoint<NoDecoState>> = vec![
            PlanPoint::at_time(0.0, 0.0),
            PlanPoint::at_time(15.0, 5.0).with_gas(Gas::AIR),
        ];
        assert_eq!(resolve_gas(&mut points, 0, 15.0, &settings, &gases), Ok(Gas::AIR));
    }

    #[test]
    fn test_gas_switch_to_hypoxic_mix() {
        let settings = DiveSettings::default();
        let mix = hypoxic();
        let result = planner()
            .compute_dive(plan(&[Gas::EAN50, mix], vec![PlanPoint::at_time(80.0, 1.0)]))
            .unwrap();
        let points = &result.result_points;
        let mod_depth = Gas::EAN50.mod_depth(&settings);

        assert_eq!(points[0].gas, Some(Gas::EAN50));
        assert_eq!(points[1].depth, mod_depth);
        assert_eq!(points[1].gas, Some(Gas::EAN50));
        assert_eq!(points[2].gas, Some(mix));
        assert!((points[3].time - (settings.switch_time + 80.0 / settings.descent_rate)).abs() < EPS);
        assert_eq!(points[3].gas, Some(mix));
    }

    #[test]
    fn test_manual_gas_switch_on_duration_point() {
        let settings = DiveSettings::default();
        let mix = hypoxic();
        let result = planner()
            .compute_dive(plan(
                &[Gas::EAN50, mix],
                vec![
                    PlanPoint::for_duration(10.0, 5.0).with_gas(mix),
                    PlanPoint::at_time(80.0, 6.0),
                ],
            ))
            .unwrap();
        let points = &result.result_points;
        let arrival = 10.0 / settings.descent_rate;

        assert_eq!(points[1].depth, 10.0);
        assert!((points[1].time - arrival).abs() < EPS);
        assert_eq!(points[1].gas, Some(Gas::EAN50));

        assert_eq!(points[2].depth, 10.0);
        assert!((points[2].time - (arrival + settings.switch_time)).abs() < EPS);
        assert_eq!(points[2].gas, Some(mix));

        assert_eq!(points[3].depth, 10.0);
        assert!((points[3].time - (arrival + 5.0)).abs() < EPS);
        assert_eq!(points[3].gas, Some(mix));

        assert_eq!(points[4].depth, 80.0);
        assert!((points[4].time - (80.0 / settings.descent_rate + 5.0)).abs() < EPS);
        assert_eq!(points[4].gas, Some(mix));
    }

    #[test]
    fn test_flat_gas_switch_inserts_switch_point() {
        let settings = DiveSettings::default();
        let result = planner()
            .compute_dive(plan(
                &[Gas::AIR, Gas::EAN50],
                vec![
                    PlanPoint::for_duration(15.0, 10.0).with_gas(Gas::AIR),
                    PlanPoint::for_duration(15.0, 4.0).with_gas(Gas::EAN50),
                ],
            ))
            .unwrap();
        let points = &result.result_points;
        let held = 15.0 / settings.descent_rate + 10.0;

        assert_eq!(points[2].time, held);
        assert_eq!(points[3].origin, Origin::GasSwitch);
        assert!((points[3].time - (held + settings.switch_time)).abs() < EPS);
        assert_eq!(points[3].gas, Some(Gas::EAN50));
        assert_eq!(points[4].duration(), Some(3.0));
        assert!((points[4].time - (held + 4.0)).abs() < EPS);
    }

    #[test]
    fn test_flat_time_clamped_forward() {
        let result = planner()
            .compute_dive(plan(
                &[Gas::AIR],
                vec![PlanPoint::at_time(20.0, 10.0), PlanPoint::at_time(20.0, 4.0)],
            ))
            .unwrap();
        let points = &result.result_points;
        assert_eq!(points[2].time, 10.0);
        assert_eq!(points[3].time, 10.0);
    }

    #[test]
    fn test_gas_volumes_across_switch() {
        let settings = DiveSettings::default();
        let result = planner()
            .compute_dive(plan(
                &[Gas::EAN50, Gas::AIR],
                vec![
                    PlanPoint::at_time(0.0, 0.0).with_gas(Gas::EAN50),
                    PlanPoint::at_time(10.0, 0.0).with_gas(Gas::AIR),
                    PlanPoint::for_duration(40.0, 1.0),
                ],
            ))
            .unwrap();
        let points = &result.result_points;
        let descent = ambient_pressure(5.0, settings.atmospheric_pressure) * 10.0
            / settings.descent_rate
            * settings.bottom_sac;
        let switch = ambient_pressure(10.0, settings.atmospheric_pressure)
            * settings.switch_time
            * settings.bottom_sac;

        let at_arrival = points[1].gas_used.as_ref().unwrap();
        assert!((at_arrival.volume(&Gas::EAN50) - descent).abs() < 1e-6);
        assert_eq!(at_arrival.volume(&Gas::AIR), 0.0);

        let at_switch = points[2].gas_used.as_ref().unwrap();
        assert!((at_switch.volume(&Gas::EAN50) - (descent + switch)).abs() < 1e-6);
        assert!((at_switch.volume(&Gas::AIR) - switch).abs() < 1e-6);
    }

    #[test]
    fn test_endpoints_forced_to_surface() {
        let result = planner()
            .compute_dive(plan(&[Gas::AIR], vec![PlanPoint::for_duration(18.0, 30.0)]))
            .unwrap();
        let points = &result.result_points;
        assert!(points.first().unwrap().is_move_point());
        assert!(points.last().unwrap().is_move_point());
        assert_eq!(points.first().unwrap().depth, 0.0);
        assert_eq!(points.last().unwrap().depth, 0.0);
        assert!(result.final_state.is_some());
    }

    #[test]
    fn test_no_breathable_gas_is_an_error() {
        let err = planner()
            .compute_dive(plan(&[Gas::AIR], vec![PlanPoint::at_time(80.0, 0.0)]))
            .unwrap_err();
        assert_eq!(
            err,
            PlanError::NoBreathableGas {
                index: 1,
                depth: 80.0
            }
        );
    }

    #[test]
    fn test_hypoxic_only_cannot_start_at_surface() {
        let err = planner()
            .compute_dive(plan(&[hypoxic()], vec![PlanPoint::at_time(60.0, 0.0)]))
            .unwrap_err();
        assert_eq!(err, PlanError::NoBreathableGas { index: 0, depth: 0.0 });
    }

    #[test]
    fn test_input_validation() {
        let empty: DivePlan<NoDecoState> =
            DivePlan::new(DiveSettings::default()).with_gases([Gas::AIR]);
        assert_eq!(planner().compute_dive(empty).unwrap_err(), PlanError::NoWaypoints);

        let no_gas = plan(&[], vec![PlanPoint::at_time(10.0, 1.0)]);
        assert_eq!(planner().compute_dive(no_gas).unwrap_err(), PlanError::NoGases);

        let negative = plan(&[Gas::AIR], vec![PlanPoint::for_duration(10.0, -1.0)]);
        assert!(matches!(
            planner().compute_dive(negative),
            Err(PlanError::InvalidWaypoint { index: 0, .. })
        ));

        let unknown_gas = plan(
            &[Gas::AIR],
            vec![
                PlanPoint::for_duration(30.0, 10.0),
                PlanPoint::for_duration(30.0, 5.0).with_gas(Gas::EAN32),
            ],
        );
        assert!(matches!(
            planner().compute_dive(unknown_gas),
            Err(PlanError::InvalidWaypoint { index: 1, .. })
        ));
    }

    #[test]
    fn test_repetitive_dive_reports_missing_surface_interval() {
        let first = planner()
            .compute_dive(plan(&[Gas::AIR], vec![PlanPoint::for_duration(18.0, 30.0)]))
            .unwrap();
        let second = plan(&[Gas::AIR], vec![PlanPoint::for_duration(12.0, 40.0)]).after(first, 60.0);
        assert_eq!(
            planner().compute_dive(second).unwrap_err(),
            PlanError::SurfaceIntervalUnsupported
        );
    }

    #[test]
    fn test_pick_start_gas_prefers_target_gas() {
        let settings = DiveSettings::default();
        let gases = [Gas::AIR, Gas::EAN50];
        assert_eq!(pick_start_gas(0.0, 15.0, &settings, &gases), Some(Gas::EAN50));
        assert_eq!(pick_start_gas(0.0, 40.0, &settings, &gases), Some(Gas::AIR));
        let gases = [Gas::EAN50, hypoxic()];
        assert_eq!(pick_start_gas(0.0, 80.0, &settings, &gases), Some(Gas::EAN50));
    }
}
