//! Breathing gas compositions and their operating depth limits.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::GasError;
use crate::settings::DiveSettings;

/// Tolerance used when checking that fractions sum to one.
const FRACTION_EPSILON: f64 = 1e-6;

/// An open circuit breathing gas.
///
/// Equality and hashing use the composition only; operating depth
/// overrides do not change a gas's identity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "GasSpec", into = "GasSpec")]
pub struct Gas {
    o2: f64,
    he: f64,
    n2: f64,
    mod_override: Option<f64>,
    min_od_override: Option<f64>,
}

/// Serialized form of a [`Gas`]; nitrogen is implied.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GasSpec {
    o2: f64,
    #[serde(default)]
    he: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mod_depth: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min_od: Option<f64>,
}

impl TryFrom<GasSpec> for Gas {
    type Error = GasError;

    fn try_from(spec: GasSpec) -> Result<Self, Self::Error> {
        let mut gas = Gas::new(spec.o2, spec.he)?;
        gas.mod_override = spec.mod_depth;
        gas.min_od_override = spec.min_od;
        Ok(gas)
    }
}

impl From<Gas> for GasSpec {
    fn from(gas: Gas) -> Self {
        GasSpec {
            o2: gas.o2,
            he: gas.he,
            mod_depth: gas.mod_override,
            min_od: gas.min_od_override,
        }
    }
}

impl Gas {
    pub const AIR: Gas = Gas::constant(0.21, 0.0);
    pub const EAN32: Gas = Gas::constant(0.32, 0.0);
    pub const EAN50: Gas = Gas::constant(0.50, 0.0);
    pub const OXYGEN: Gas = Gas::constant(1.0, 0.0);

    const fn constant(o2: f64, he: f64) -> Gas {
        Gas {
            o2,
            he,
            n2: 1.0 - o2 - he,
            mod_override: None,
            min_od_override: None,
        }
    }

    /// Build a gas from oxygen and helium fractions; nitrogen is the rest.
    pub fn new(o2: f64, he: f64) -> Result<Self, GasError> {
        check_fraction("O2", o2)?;
        check_fraction("He", he)?;
        if o2 == 0.0 {
            return Err(GasError::NoOxygen);
        }
        let total = o2 + he;
        if total > 1.0 + FRACTION_EPSILON {
            return Err(GasError::FractionsExceedOne { total });
        }
        Ok(Gas {
            o2,
            he,
            n2: (1.0 - total).max(0.0),
            mod_override: None,
            min_od_override: None,
        })
    }

    /// Build a gas from all three fractions, which must sum to one.
    pub fn from_fractions(o2: f64, he: f64, n2: f64) -> Result<Self, GasError> {
        check_fraction("N2", n2)?;
        let total = o2 + he + n2;
        if (total - 1.0).abs() > FRACTION_EPSILON {
            return Err(GasError::FractionsDoNotSumToOne { total });
        }
        Gas::new(o2, he)
    }

    /// Build a gas from whole percentages, e.g. `from_percent(18, 45)`.
    pub fn from_percent(o2: u32, he: u32) -> Result<Self, GasError> {
        Gas::new(o2 as f64 / 100.0, he as f64 / 100.0)
    }

    /// Override the maximum operating depth.
    pub fn with_mod(mut self, depth: f64) -> Self {
        self.mod_override = Some(depth);
        self
    }

    /// Override the minimum operating depth.
    pub fn with_min_od(mut self, depth: f64) -> Self {
        self.min_od_override = Some(depth);
        self
    }

    pub fn o2(&self) -> f64 {
        self.o2
    }

    pub fn he(&self) -> f64 {
        self.he
    }

    pub fn n2(&self) -> f64 {
        self.n2
    }

    /// Maximum operating depth, rounded down to the settings' depth step.
    pub fn mod_depth(&self, settings: &DiveSettings) -> f64 {
        if let Some(depth) = self.mod_override {
            return depth;
        }
        let step = settings.step_size;
        ((settings.ppo2_max / self.o2 - 1.0) * 10.0 / step).floor() * step
    }

    /// Minimum operating depth, rounded up to the next whole metre.
    pub fn min_od(&self, settings: &DiveSettings) -> f64 {
        if let Some(depth) = self.min_od_override {
            return depth;
        }
        ((settings.ppo2_min / self.o2 - 1.0) * 10.0).ceil()
    }

    /// Whether this gas may be breathed at `depth`.
    ///
    /// Both limits are exclusive: a gas is not breathable exactly at its MOD
    /// or its MinOD.
    pub fn is_breathable(&self, depth: f64, settings: &DiveSettings) -> bool {
        self.min_od(settings) < depth && depth < self.mod_depth(settings)
    }

    /// Pick the breathable gas with the highest oxygen fraction at `depth`.
    ///
    /// On equal oxygen fractions the first candidate wins.
    pub fn pick_best<'a, I>(depth: f64, settings: &DiveSettings, candidates: I) -> Option<Gas>
    where
        I: IntoIterator<Item = &'a Gas>,
    {
        let mut best: Option<Gas> = None;
        for gas in candidates {
            if !gas.is_breathable(depth, settings) {
                continue;
            }
            match best {
                Some(current) if current.o2 >= gas.o2 => {}
                _ => best = Some(*gas),
            }
        }
        best
    }

    /// Composition key in hundredths of a percent.
    fn key(&self) -> (u32, u32) {
        (
            (self.o2 * 10_000.0).round() as u32,
            (self.he * 10_000.0).round() as u32,
        )
    }
}

fn check_fraction(gas: &'static str, value: f64) -> Result<(), GasError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(GasError::FractionOutOfRange { gas, value })
    }
}

impl PartialEq for Gas {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Gas {}

impl Hash for Gas {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Gas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            (self.o2 * 100.0).round() as u32,
            (self.he * 100.0).round() as u32
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> DiveSettings {
        DiveSettings::default()
    }

    #[test]
    fn test_mod_rounds_down_to_step() {
        let s = settings();
        // 1.6 / 0.5 = 3.2 bar -> 22m -> 21m on a 3m step
        assert_eq!(Gas::EAN50.mod_depth(&s), 21.0);
        // 1.6 / 0.21 = 7.62 bar -> 66.2m -> 66m
        assert_eq!(Gas::AIR.mod_depth(&s), 66.0);
        assert_eq!(Gas::OXYGEN.mod_depth(&s), 6.0);
    }

    #[test]
    fn test_min_od_rounds_up() {
        let s = settings();
        let hypoxic = Gas::from_percent(10, 60).unwrap();
        assert_eq!(hypoxic.min_od(&s), 8.0);
        assert_eq!(Gas::AIR.min_od(&s), -1.0);
    }

    #[test]
    fn test_breathable_limits_are_exclusive() {
        let s = settings();
        let hypoxic = Gas::from_percent(10, 60).unwrap();
        assert!(!Gas::EAN50.is_breathable(21.0, &s));
        assert!(Gas::EAN50.is_breathable(20.9, &s));
        assert!(!hypoxic.is_breathable(8.0, &s));
        assert!(hypoxic.is_breathable(8.1, &s));
        assert!(Gas::AIR.is_breathable(0.0, &s));
    }

    #[test]
    fn test_overrides_replace_computed_limits() {
        let s = settings();
        let gas = Gas::EAN50.with_mod(18.0).with_min_od(2.0);
        assert_eq!(gas.mod_depth(&s), 18.0);
        assert_eq!(gas.min_od(&s), 2.0);
        assert!(!gas.is_breathable(0.0, &s));
        // identity is the composition
        assert_eq!(gas, Gas::EAN50);
    }

    #[test]
    fn test_pick_best_prefers_oxygen() {
        let s = settings();
        let gases = [Gas::AIR, Gas::EAN50, Gas::OXYGEN];
        assert_eq!(Gas::pick_best(3.0, &s, &gases), Some(Gas::OXYGEN));
        assert_eq!(Gas::pick_best(15.0, &s, &gases), Some(Gas::EAN50));
        assert_eq!(Gas::pick_best(40.0, &s, &gases), Some(Gas::AIR));
        assert_eq!(Gas::pick_best(70.0, &s, &gases), None);
    }

    #[test]
    fn test_pick_best_tie_keeps_first() {
        let s = settings();
        let a = Gas::EAN32.with_mod(30.0);
        let b = Gas::EAN32.with_mod(33.0);
        let best = Gas::pick_best(10.0, &s, &[a, b]).unwrap();
        assert_eq!(best.mod_depth(&s), 30.0);
    }

    #[test]
    fn test_construction_rejects_bad_fractions() {
        assert_eq!(Gas::new(0.0, 0.5), Err(GasError::NoOxygen));
        assert!(matches!(
            Gas::new(0.5, 0.6),
            Err(GasError::FractionsExceedOne { .. })
        ));
        assert!(matches!(
            Gas::new(1.2, 0.0),
            Err(GasError::FractionOutOfRange { gas: "O2", .. })
        ));
        assert!(matches!(
            Gas::from_fractions(0.21, 0.0, 0.7),
            Err(GasError::FractionsDoNotSumToOne { .. })
        ));
        assert!(Gas::from_fractions(0.18, 0.45, 0.37).is_ok());
    }

    #[test]
    fn test_display() {
        assert_eq!(Gas::AIR.to_string(), "21/0");
        assert_eq!(Gas::from_percent(18, 45).unwrap().to_string(), "18/45");
    }

    #[test]
    fn test_serde_validates_composition() {
        let gas: Gas = serde_json::from_str(r#"{ "o2": 0.32 }"#).unwrap();
        assert_eq!(gas, Gas::EAN32);
        let gas: Gas = serde_json::from_str(r#"{ "o2": 0.5, "mod_depth": 18.0 }"#).unwrap();
        assert_eq!(gas.mod_depth(&settings()), 18.0);
        assert!(serde_json::from_str::<Gas>(r#"{ "o2": 0.8, "he": 0.5 }"#).is_err());
    }
}
