//! Standard normal distribution utilities.

use pf_core::{Error, Result};
use statrs::function::erf::{erfc, erfc_inv};

/// Standard normal CDF `Φ(x)`.
///
/// Uses `erfc` for better tail behavior: `Φ(x) = 0.5 * erfc(-x / sqrt(2))`.
#[inline]
pub fn cdf(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

/// Standard normal quantile `Φ⁻¹(p)` for `p` strictly inside `(0, 1)`.
///
/// `Φ⁻¹(p) = -sqrt(2) * erfc⁻¹(2p)`.
pub fn quantile(p: f64) -> Result<f64> {
    if !(p > 0.0 && p < 1.0) {
        return Err(Error::InvalidArgument(format!("p must be in (0, 1), got {}", p)));
    }
    Ok(-std::f64::consts::SQRT_2 * erfc_inv(2.0 * p))
}
