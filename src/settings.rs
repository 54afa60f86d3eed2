//! Tunable constants shared by every dive plan computation.
//!
//! Depths are metres of seawater, times are minutes and gas volumes are
//! litres at surface pressure.

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// Settings that apply to all dives computed by a planner.
///
/// Missing fields in a serialized document fall back to [`Default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiveSettings {
    /// Surface pressure expressed as metres of seawater equivalent.
    pub atmospheric_pressure: f64,
    /// Surface air consumption during the working phase (l/min).
    pub bottom_sac: f64,
    /// Surface air consumption once decompression has started (l/min).
    pub deco_sac: f64,
    /// Maximum descent rate (m/min).
    pub descent_rate: f64,
    /// Maximum ascent rate (m/min).
    pub ascent_rate: f64,
    pub ppo2_max: f64,
    pub ppo2_min: f64,
    /// Minutes spent switching from one gas to another.
    pub switch_time: f64,
    /// Depth rounding step for operating depths and stops (m).
    pub step_size: f64,
    /// Minimum stop time (min).
    pub min_stop: f64,
    /// Shallowest depth at which a decompression stop is held (m).
    pub last_stop_depth: f64,
}

impl Default for DiveSettings {
    fn default() -> Self {
        Self {
            atmospheric_pressure: 10.1325,
            bottom_sac: 18.0,
            deco_sac: 15.0,
            descent_rate: 20.0,
            ascent_rate: 10.0,
            ppo2_max: 1.6,
            ppo2_min: 0.18,
            switch_time: 1.0,
            step_size: 3.0,
            min_stop: 1.0,
            last_stop_depth: 6.0,
        }
    }
}

impl DiveSettings {
    /// Check that every rate and step is usable by the planner.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let positive = [
            ("atmospheric_pressure", self.atmospheric_pressure),
            ("descent_rate", self.descent_rate),
            ("ascent_rate", self.ascent_rate),
            ("ppo2_max", self.ppo2_max),
            ("ppo2_min", self.ppo2_min),
            ("step_size", self.step_size),
            ("min_stop", self.min_stop),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SettingsError::NotPositive { name, value });
            }
        }

        let non_negative = [
            ("bottom_sac", self.bottom_sac),
            ("deco_sac", self.deco_sac),
            ("switch_time", self.switch_time),
            ("last_stop_depth", self.last_stop_depth),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SettingsError::Negative { name, value });
            }
        }

        if self.ppo2_min >= self.ppo2_max {
            return Err(SettingsError::PpO2BoundsOutOfOrder {
                min: self.ppo2_min,
                max: self.ppo2_max,
            });
        }
        Ok(())
    }
}
