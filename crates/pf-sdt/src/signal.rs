use pf_core::{Error, Result};
use pf_prob::normal;
use serde::{Deserialize, Serialize};

/// Rates are clamped to this interval before inverse-normal transforms so that
/// perfect (0 or 1) rates produce finite d' and criterion values.
const RATE_FLOOR: f64 = 0.01;
const RATE_CEIL: f64 = 0.99;

/// Rate reported when a row of the contingency table is empty.
const CHANCE_RATE: f64 = 0.5;

/// Response counts for one experimental condition.
///
/// All four counts are finite and non-negative; fractional counts are allowed
/// (e.g. after weighting). Instances are immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCounts")]
pub struct SignalDetection {
    hits: f64,
    misses: f64,
    false_alarms: f64,
    correct_rejections: f64,
}

#[derive(Deserialize)]
struct RawCounts {
    hits: f64,
    misses: f64,
    false_alarms: f64,
    correct_rejections: f64,
}

impl TryFrom<RawCounts> for SignalDetection {
    type Error = Error;

    fn try_from(raw: RawCounts) -> Result<Self> {
        Self::new(raw.hits, raw.misses, raw.false_alarms, raw.correct_rejections)
    }
}

impl SignalDetection {
    /// Create a condition from its four counts.
    pub fn new(hits: f64, misses: f64, false_alarms: f64, correct_rejections: f64) -> Result<Self> {
        for (name, v) in [
            ("hits", hits),
            ("misses", misses),
            ("false_alarms", false_alarms),
            ("correct_rejections", correct_rejections),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(Error::InvalidArgument(format!(
                    "{name} must be finite and >= 0, got {v}"
                )));
            }
        }
        Ok(Self { hits, misses, false_alarms, correct_rejections })
    }

    /// Number of hits.
    pub fn hits(&self) -> f64 {
        self.hits
    }

    /// Number of misses.
    pub fn misses(&self) -> f64 {
        self.misses
    }

    /// Number of false alarms.
    pub fn false_alarms(&self) -> f64 {
        self.false_alarms
    }

    /// Number of correct rejections.
    pub fn correct_rejections(&self) -> f64 {
        self.correct_rejections
    }

    /// Correct responses: hits + correct rejections.
    pub fn n_correct(&self) -> f64 {
        self.hits + self.correct_rejections
    }

    /// Incorrect responses: misses + false alarms.
    pub fn n_incorrect(&self) -> f64 {
        self.misses + self.false_alarms
    }

    /// All trials in this condition.
    pub fn n_total(&self) -> f64 {
        self.hits + self.misses + self.false_alarms + self.correct_rejections
    }

    /// `hits / (hits + misses)`, or 0.5 when there were no signal trials.
    pub fn hit_rate(&self) -> f64 {
        rate(self.hits, self.misses)
    }

    /// `false_alarms / (false_alarms + correct_rejections)`, or 0.5 when there
    /// were no noise trials.
    pub fn false_alarm_rate(&self) -> f64 {
        rate(self.false_alarms, self.correct_rejections)
    }

    /// Sensitivity `d' = Φ⁻¹(H) - Φ⁻¹(F)` on clamped rates.
    pub fn d_prime(&self) -> Result<f64> {
        let (z_hit, z_fa) = self.z_scores()?;
        Ok(z_hit - z_fa)
    }

    /// Response bias `c = -(Φ⁻¹(H) + Φ⁻¹(F)) / 2` on clamped rates.
    pub fn criterion(&self) -> Result<f64> {
        let (z_hit, z_fa) = self.z_scores()?;
        Ok(-0.5 * (z_hit + z_fa))
    }

    fn z_scores(&self) -> Result<(f64, f64)> {
        let h = self.hit_rate().clamp(RATE_FLOOR, RATE_CEIL);
        let f = self.false_alarm_rate().clamp(RATE_FLOOR, RATE_CEIL);
        Ok((normal::quantile(h)?, normal::quantile(f)?))
    }
}

fn rate(numer: f64, other: f64) -> f64 {
    let denom = numer + other;
    if denom > 0.0 { numer / denom } else { CHANCE_RATE }
}
