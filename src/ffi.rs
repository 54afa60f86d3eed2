//! Flat records for foreign callers.
//!
//! Mobile hosts see plain data: waypoints and gases go in as numbers and
//! notation strings, a table of steps comes out. The generic planner and
//! strategy types stay on the Rust side.

use tracing::debug;

use crate::error::{NotationError, PlanError};
use crate::gas::Gas;
use crate::notation::parse_gas;
use crate::plan::DivePlan;
use crate::planner::Planner;
use crate::point::{AlgoState, Origin, PlanPoint};
use crate::settings::DiveSettings;
use crate::strategy::{BuhlmannStrategy, NoDecoStrategy};

/// Decompression model used to plan the ascent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// No-stop diving with a safety stop.
    NoDeco,
    /// Bühlmann ZHL-16C with gradient factors.
    Buhlmann,
}

/// A waypoint as entered by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointInput {
    /// Depth in meters
    pub depth_m: f64,
    /// Runtime to be at depth by, or time to stay, in minutes
    pub time_min: f64,
    /// Whether `time_min` is a duration at depth rather than a runtime
    pub is_duration: bool,
    /// Gas notation to breathe from this point, e.g. "ean32"
    pub gas: Option<String>,
}

/// Everything needed to plan one dive.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    pub waypoints: Vec<WaypointInput>,
    /// Gas notations available on the dive
    pub gases: Vec<String>,
    pub settings: DiveSettings,
    pub algorithm: Algorithm,
    /// Gradient factor low (0.0–1.0), Bühlmann only
    pub gf_low: f64,
    /// Gradient factor high (0.0–1.0), Bühlmann only
    pub gf_high: f64,
}

/// One line of the computed dive table.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanStep {
    /// Depth in meters
    pub depth_m: f64,
    /// Minutes since the previous step
    pub duration_min: f64,
    /// Minutes since the start of the dive
    pub runtime_min: f64,
    /// Gas in use, as "O2/He" percentages
    pub gas: String,
    pub origin: Origin,
}

/// Gas consumed over the whole dive.
#[derive(Debug, Clone, PartialEq)]
pub struct GasVolume {
    /// Gas as "O2/He" percentages
    pub gas: String,
    /// Litres at surface pressure
    pub litres: f64,
}

/// A computed dive plan.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanSummary {
    pub steps: Vec<PlanStep>,
    /// One entry per requested gas, in request order
    pub gas_used: Vec<GasVolume>,
    /// Total runtime including the final ascent
    pub runtime_min: f64,
    pub max_depth_m: f64,
    /// Whether any decompression stop was scheduled
    pub deco_required: bool,
    /// Surface gradient factor (%) on surfacing, Bühlmann only
    pub final_surface_gf: Option<f64>,
}

/// Gas composition as fractions.
#[derive(Debug, Clone, PartialEq)]
pub struct GasFractions {
    pub o2_fraction: f64,
    pub he_fraction: f64,
    pub n2_fraction: f64,
}

/// Plan a dive.
pub fn plan_dive(request: PlanRequest) -> Result<PlanSummary, PlanError> {
    debug!(
        algorithm = ?request.algorithm,
        waypoints = request.waypoints.len(),
        "plan_dive"
    );
    match request.algorithm {
        Algorithm::NoDeco => {
            let plan = build_plan(&request)?;
            let plan = Planner::new(NoDecoStrategy::default()).compute_dive(plan)?;
            Ok(summarize(&plan, None))
        }
        Algorithm::Buhlmann => {
            let strategy = BuhlmannStrategy::new(request.gf_low, request.gf_high)?;
            let plan = build_plan(&request)?;
            let plan = Planner::new(strategy).compute_dive(plan)?;
            let surface_gf = plan
                .final_state
                .as_ref()
                .map(|state| state.surface_gf(plan.settings.atmospheric_pressure).0);
            Ok(summarize(&plan, surface_gf))
        }
    }
}

/// Parse a gas notation such as "tx18/45" into fractions.
pub fn parse_gas_mix(notation: String) -> Result<GasFractions, NotationError> {
    let gas = parse_gas(&notation)?;
    Ok(GasFractions {
        o2_fraction: gas.o2(),
        he_fraction: gas.he(),
        n2_fraction: gas.n2(),
    })
}

/// Settings used when the host has none of its own.
pub fn default_settings() -> DiveSettings {
    DiveSettings::default()
}

fn build_plan<S>(request: &PlanRequest) -> Result<DivePlan<S>, PlanError> {
    let gases = request
        .gases
        .iter()
        .map(|notation| parse_gas(notation))
        .collect::<Result<Vec<Gas>, _>>()?;

    let points = request
        .waypoints
        .iter()
        .map(|waypoint| {
            let point = if waypoint.is_duration {
                PlanPoint::for_duration(waypoint.depth_m, waypoint.time_min)
            } else {
                PlanPoint::at_time(waypoint.depth_m, waypoint.time_min)
            };
            Ok(match &waypoint.gas {
                Some(notation) => point.with_gas(parse_gas(notation)?),
                None => point,
            })
        })
        .collect::<Result<Vec<_>, NotationError>>()?;

    Ok(DivePlan::new(request.settings.clone())
        .with_gases(gases)
        .with_points(points))
}

fn summarize<S: AlgoState>(plan: &DivePlan<S>, final_surface_gf: Option<f64>) -> PlanSummary {
    let steps = plan
        .rows()
        .into_iter()
        .map(|row| PlanStep {
            depth_m: row.depth,
            duration_min: row.duration,
            runtime_min: row.runtime,
            gas: row.gas.map(|gas| gas.to_string()).unwrap_or_default(),
            origin: row.origin,
        })
        .collect();

    let gas_used = plan
        .gases
        .iter()
        .map(|gas| GasVolume {
            gas: gas.to_string(),
            litres: plan.gas_used().map_or(0.0, |used| used.volume(gas)),
        })
        .collect();

    PlanSummary {
        steps,
        gas_used,
        runtime_min: plan.runtime(),
        max_depth_m: plan.max_depth(),
        deco_required: plan.deco_required(),
        final_surface_gf,
    }
}
