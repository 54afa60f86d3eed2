use thiserror::Error;

/// Error type for malformed gas compositions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GasError {
    #[error("{gas} fraction {value} is outside 0.0..=1.0")]
    FractionOutOfRange { gas: &'static str, value: f64 },

    #[error("gas mix contains no oxygen")]
    NoOxygen,

    #[error("gas fractions (O2 + He) exceed 1.0: {total}")]
    FractionsExceedOne { total: f64 },

    #[error("gas fractions must sum to 1.0, got {total}")]
    FractionsDoNotSumToOne { total: f64 },
}

/// Error type for invalid dive settings.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
    #[error("{name} must be a positive number, got {value}")]
    NotPositive { name: &'static str, value: f64 },

    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f64 },

    #[error("ppO2 bounds out of order: min {min} >= max {max}")]
    PpO2BoundsOutOfOrder { min: f64, max: f64 },

    #[error("gradient factors must satisfy 0 < low <= high <= 1, got {low}/{high}")]
    GradientFactors { low: f64, high: f64 },
}

/// Error type for gas and waypoint notation parsing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NotationError {
    #[error("parse error at position {position}: {message}")]
    ParseError { position: usize, message: String },

    #[error("invalid gas: {0}")]
    Gas(#[from] GasError),

    #[error("empty input")]
    EmptyInput,
}

/// Error type for dive plan computation.
///
/// `index` fields refer to positions in the result point sequence at the
/// time the failure was detected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error("plan has no waypoints")]
    NoWaypoints,

    #[error("plan has no gases")]
    NoGases,

    #[error("invalid waypoint {index}: {reason}")]
    InvalidWaypoint { index: usize, reason: String },

    #[error("invalid settings: {0}")]
    InvalidSettings(#[from] SettingsError),

    #[error("invalid gas: {0}")]
    InvalidGas(#[from] GasError),

    #[error("invalid notation: {0}")]
    InvalidNotation(#[from] NotationError),

    #[error("no breathable gas at {depth}m (point {index})")]
    NoBreathableGas { index: usize, depth: f64 },

    #[error("surface interval carry-over between dives is not supported")]
    SurfaceIntervalUnsupported,

    #[error("no valid ascent from {depth}m (point {index})")]
    AscentNotFound { index: usize, depth: f64 },

    #[error("point {index} is unresolved: missing {missing}")]
    UnresolvedPoint { index: usize, missing: &'static str },

    #[error("negative gas volume at point {index}")]
    NegativeVolume { index: usize },

    #[error("time runs backwards at point {index}")]
    TimeReversal { index: usize },
}
