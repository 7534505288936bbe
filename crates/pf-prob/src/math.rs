//! Small numerically-stable math utilities used across probability code.

/// Stable sigmoid (inverse logit): `1 / (1 + exp(-x))`.
///
/// Single `exp(-|x|)`, then a sign flip. Never overflows; saturates to
/// exactly `0.0` / `1.0` only where `f64` cannot represent the distance
/// from the boundary.
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    let abs_x = x.abs();
    let e = (-abs_x).exp();
    let recip = 1.0 / (1.0 + e);
    // x >= 0: sigmoid = 1/(1+exp(-x)) = recip
    // x <  0: sigmoid = exp(x)/(1+exp(x)) = e/(1+e) = e*recip
    if x >= 0.0 { recip } else { e * recip }
}

/// Stable `log(sigmoid(x))`.
///
/// Finite for every finite `x`: for very negative `x` it tends to `x`.
#[inline]
pub fn log_sigmoid(x: f64) -> f64 {
    // log(sigmoid(x)) = -log(1 + exp(-x))
    if x >= 0.0 { -(-x).exp().ln_1p() } else { x - x.exp().ln_1p() }
}

/// Logit: `log(p / (1 - p))`, inverse of [`sigmoid`].
///
/// Returns `-inf` / `+inf` at `p = 0` / `p = 1` and `NaN` outside `[0, 1]`;
/// callers validate the domain.
#[inline]
pub fn logit(p: f64) -> f64 {
    p.ln() - (-p).ln_1p()
}

/// Stable `log(exp(a) + exp(b))`.
#[inline]
pub fn log_add_exp(a: f64, b: f64) -> f64 {
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
    hi + (lo - hi).exp().ln_1p()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid_bounds_and_symmetry() {
        let xs: [f64; 7] = [-50.0, -10.0, -1.0, 0.0, 1.0, 10.0, 50.0];
        for x in xs {
            let s = sigmoid(x);
            assert!((0.0..=1.0).contains(&s), "sigmoid({})={}", x, s);
            let t = sigmoid(-x);
            assert!((s + t - 1.0).abs() < 1e-15, "sigmoid symmetry failed at {}", x);
        }
    }

    #[test]
    fn test_sigmoid_full_double_range() {
        for x in [f64::MAX, -f64::MAX, 1e308, -1e308, 800.0, -800.0] {
            let s = sigmoid(x);
            assert!(s.is_finite(), "sigmoid({}) = {}", x, s);
        }
        assert_eq!(sigmoid(f64::MAX), 1.0);
        assert_eq!(sigmoid(-f64::MAX), 0.0);
        assert_eq!(sigmoid(0.0), 0.5);
    }

    #[test]
    fn test_log_sigmoid_matches_naive_moderate_values() {
        let xs: [f64; 7] = [-10.0, -2.0, -0.1, 0.0, 0.1, 2.0, 10.0];
        for x in xs {
            let naive = sigmoid(x).ln();
            let stable = log_sigmoid(x);
            assert!((naive - stable).abs() < 1e-12, "x={}: {} vs {}", x, naive, stable);
        }
    }

    #[test]
    fn test_log_sigmoid_is_finite_extremes() {
        for x in [-1e6, -1000.0, 1000.0, 1e6] {
            assert!(log_sigmoid(x).is_finite(), "x={}", x);
        }
        assert!((log_sigmoid(-1000.0) + 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_logit_inverts_sigmoid() {
        for p in [1e-6, 0.01, 0.12, 0.5, 0.88, 0.99, 1.0 - 1e-6] {
            let z = logit(p);
            assert!((sigmoid(z) - p).abs() < 1e-12, "p={}", p);
        }
        for z in [-20.0, -2.0, 0.0, 2.0, 20.0] {
            assert!((logit(sigmoid(z)) - z).abs() < 1e-6, "z={}", z);
        }
        assert_eq!(logit(0.0), f64::NEG_INFINITY);
        assert_eq!(logit(1.0), f64::INFINITY);
        assert!(logit(1.5).is_nan());
    }

    #[test]
    fn test_log_add_exp() {
        let naive = (2.0f64.exp() + 3.0f64.exp()).ln();
        assert!((log_add_exp(2.0, 3.0) - naive).abs() < 1e-12);
        assert!((log_add_exp(3.0, 2.0) - naive).abs() < 1e-12);
        assert_eq!(log_add_exp(f64::NEG_INFINITY, -4.0), -4.0);
        assert!((log_add_exp(-2000.0, -2000.0) - (-2000.0 + 2f64.ln())).abs() < 1e-9);
    }
}
