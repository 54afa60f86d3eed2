pub mod error;
pub mod ffi;
pub mod gas;
pub mod laws;
pub mod notation;
pub mod plan;
pub mod planner;
pub mod point;
pub mod settings;
pub mod strategy;

uniffi::include_scaffolding!("diveplan");

pub use error::{GasError, NotationError, PlanError, SettingsError};
pub use ffi::{
    default_settings, parse_gas_mix, plan_dive, Algorithm, GasFractions, GasVolume, PlanRequest,
    PlanStep, PlanSummary, WaypointInput,
};
pub use gas::Gas;
pub use notation::{parse_gas, parse_waypoints, Waypoint};
pub use plan::{DivePlan, PlanRow};
pub use planner::{track_gas_used, Planner};
pub use point::{AlgoState, Anchor, GasUsage, Origin, PlanPoint};
pub use settings::DiveSettings;
pub use strategy::{BuhlmannStrategy, DecoStrategy, NoDecoState, NoDecoStrategy, TissueState};
