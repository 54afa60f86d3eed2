//! Nodes of a dive plan itinerary.

use std::collections::HashMap;

use crate::gas::Gas;

/// When a point happens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    /// Be at this depth by this runtime (minutes since the start of the dive).
    Time(f64),
    /// Remain at this depth for this many minutes after arriving.
    Duration(f64),
}

/// Who created a point and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Supplied by the caller.
    User,
    /// Arrival at a depth after travelling at the maximum rate.
    Arrival,
    /// End of a gas switch; carries the new gas.
    GasSwitch,
    /// End of a safety or decompression stop.
    Stop,
    /// Keeps the itinerary piecewise linear; never shown to the user.
    Move,
}

/// Physiological state tracked by a decompression strategy.
///
/// The planner never looks inside; it copies the previous point's state
/// forward before a strategy updates it, and asks which SAC rate applies.
pub trait AlgoState: Clone + std::fmt::Debug {
    /// Whether the diver is decompressing at this point.
    fn is_deco(&self) -> bool;
}

/// Cumulative volume (litres at surface pressure) breathed from each gas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GasUsage {
    volumes: HashMap<Gas, f64>,
}

impl GasUsage {
    /// Zero volume for every gas in `gases`.
    pub fn seeded<'a, I>(gases: I) -> Self
    where
        I: IntoIterator<Item = &'a Gas>,
    {
        Self {
            volumes: gases.into_iter().map(|gas| (*gas, 0.0)).collect(),
        }
    }

    /// Volume used from `gas`, zero if it has not been breathed.
    pub fn volume(&self, gas: &Gas) -> f64 {
        self.volumes.get(gas).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, gas: &Gas) -> bool {
        self.volumes.contains_key(gas)
    }

    pub fn add(&mut self, gas: Gas, litres: f64) {
        *self.volumes.entry(gas).or_insert(0.0) += litres;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Gas, &f64)> {
        self.volumes.iter()
    }

    pub fn total(&self) -> f64 {
        self.volumes.values().sum()
    }
}

/// A point in a dive plan.
///
/// `time` is the resolved runtime. For a [`Anchor::Time`] point it starts out
/// as the requested time; the planner may push it later. For a
/// [`Anchor::Duration`] point it is computed from the previous point.
#[derive(Debug, Clone)]
pub struct PlanPoint<S> {
    pub depth: f64,
    pub anchor: Anchor,
    pub time: f64,
    pub gas: Option<Gas>,
    pub origin: Origin,
    pub state: Option<S>,
    pub gas_used: Option<GasUsage>,
}

impl<S> PlanPoint<S> {
    fn with_anchor(depth: f64, anchor: Anchor, origin: Origin) -> Self {
        let time = match anchor {
            Anchor::Time(t) => t,
            Anchor::Duration(_) => 0.0,
        };
        Self {
            depth,
            anchor,
            time,
            gas: None,
            origin,
            state: None,
            gas_used: None,
        }
    }

    /// A user waypoint to be reached by runtime `time`.
    pub fn at_time(depth: f64, time: f64) -> Self {
        Self::with_anchor(depth, Anchor::Time(time), Origin::User)
    }

    /// A user waypoint held for `duration` minutes after arrival.
    pub fn for_duration(depth: f64, duration: f64) -> Self {
        Self::with_anchor(depth, Anchor::Duration(duration), Origin::User)
    }

    /// A planner-inserted point at a known runtime.
    pub fn inserted(depth: f64, time: f64, gas: Gas, origin: Origin) -> Self {
        let mut point = Self::with_anchor(depth, Anchor::Time(time), origin);
        point.gas = Some(gas);
        point
    }

    /// A planner-inserted point held for `duration` minutes.
    pub fn inserted_for(depth: f64, duration: f64, gas: Gas, origin: Origin) -> Self {
        let mut point = Self::with_anchor(depth, Anchor::Duration(duration), origin);
        point.gas = Some(gas);
        point
    }

    /// Surface endpoint added to keep the plan starting and ending at zero.
    pub(crate) fn surface_move() -> Self {
        Self::with_anchor(0.0, Anchor::Time(0.0), Origin::Move)
    }

    pub fn with_gas(mut self, gas: Gas) -> Self {
        self.gas = Some(gas);
        self
    }

    /// Re-anchor to an absolute runtime.
    pub fn set_time(&mut self, time: f64) {
        self.anchor = Anchor::Time(time);
        self.time = time;
    }

    /// Re-anchor to a duration at depth.
    pub fn set_duration(&mut self, duration: f64) {
        self.anchor = Anchor::Duration(duration);
    }

    pub fn duration(&self) -> Option<f64> {
        match self.anchor {
            Anchor::Duration(d) => Some(d),
            Anchor::Time(_) => None,
        }
    }

    pub fn is_duration_point(&self) -> bool {
        matches!(self.anchor, Anchor::Duration(_))
    }

    pub fn is_user_point(&self) -> bool {
        self.origin == Origin::User
    }

    pub fn is_move_point(&self) -> bool {
        self.origin == Origin::Move
    }
}

impl<S: AlgoState> PlanPoint<S> {
    /// Whether the state attached to this point is decompressing.
    pub fn is_deco(&self) -> bool {
        self.state.as_ref().is_some_and(AlgoState::is_deco)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Flag(bool);

    impl AlgoState for Flag {
        fn is_deco(&self) -> bool {
            self.0
        }
    }

    #[test]
    fn test_anchor_switches_are_exclusive() {
        let mut point: PlanPoint<Flag> = PlanPoint::for_duration(30.0, 20.0);
        assert!(point.is_duration_point());
        assert_eq!(point.duration(), Some(20.0));

        point.set_time(25.0);
        assert!(!point.is_duration_point());
        assert_eq!(point.duration(), None);
        assert_eq!(point.time, 25.0);

        point.set_duration(5.0);
        assert_eq!(point.anchor, Anchor::Duration(5.0));
    }

    #[test]
    fn test_provenance() {
        let user: PlanPoint<Flag> = PlanPoint::at_time(10.0, 2.0);
        assert!(user.is_user_point());
        assert!(!user.is_move_point());

        let surface: PlanPoint<Flag> = PlanPoint::surface_move();
        assert!(surface.is_move_point());
        assert_eq!(surface.depth, 0.0);

        let switch: PlanPoint<Flag> = PlanPoint::inserted(21.0, 3.0, Gas::EAN50, Origin::GasSwitch);
        assert_eq!(switch.gas, Some(Gas::EAN50));
        assert!(!switch.is_user_point());
    }

    #[test]
    fn test_is_deco_follows_state() {
        let mut point: PlanPoint<Flag> = PlanPoint::at_time(6.0, 40.0);
        assert!(!point.is_deco());
        point.state = Some(Flag(true));
        assert!(point.is_deco());
    }

    #[test]
    fn test_gas_usage_accumulates() {
        let mut usage = GasUsage::seeded(&[Gas::AIR, Gas::EAN50]);
        assert!(usage.contains(&Gas::EAN50));
        assert_eq!(usage.volume(&Gas::AIR), 0.0);

        usage.add(Gas::AIR, 120.0);
        usage.add(Gas::AIR, 30.0);
        usage.add(Gas::EAN50, 10.0);
        assert_eq!(usage.volume(&Gas::AIR), 150.0);
        assert_eq!(usage.total(), 160.0);
        assert_eq!(usage.volume(&Gas::OXYGEN), 0.0);
    }
}
