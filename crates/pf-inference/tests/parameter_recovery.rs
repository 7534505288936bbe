//! Parameter recovery for the simplified 3PL model.
//!
//! - Expected counts (no sampling noise): the MLE must reproduce the
//!   generating parameters.
//! - Seeded binomial data: estimates must land within a few standard errors.

use approx::assert_relative_eq;
use pf_inference::{SimplifiedThreePl, ThreePlConfig};
use pf_sdt::{Experiment, SignalDetection};

use rand::SeedableRng;
use rand_distr::{Binomial, Distribution};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn true_probabilities(alpha: f64, c: f64, config: &ThreePlConfig) -> Vec<f64> {
    config
        .difficulties
        .iter()
        .map(|&b| c + (1.0 - c) / (1.0 + (-alpha * (config.ability - b)).exp()))
        .collect()
}

/// Fractional counts equal to their expectation under the model.
fn expected_experiment(alpha: f64, c: f64, trials: f64, config: &ThreePlConfig) -> Experiment {
    let half = trials / 2.0;
    Experiment::from_conditions(true_probabilities(alpha, c, config).into_iter().map(|p| {
        SignalDetection::new(half * p, half * (1.0 - p), half * (1.0 - p), half * p).unwrap()
    }))
}

/// Signal and noise trials drawn independently with the same accuracy.
fn simulated_experiment(
    alpha: f64,
    c: f64,
    trials_per_side: u64,
    config: &ThreePlConfig,
    seed: u64,
) -> Experiment {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let n = trials_per_side as f64;
    Experiment::from_conditions(true_probabilities(alpha, c, config).into_iter().map(|p| {
        let dist = Binomial::new(trials_per_side, p).unwrap();
        let hits = dist.sample(&mut rng) as f64;
        let correct_rejections = dist.sample(&mut rng) as f64;
        SignalDetection::new(hits, n - hits, n - correct_rejections, correct_rejections).unwrap()
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn recovers_parameters_from_expected_counts() {
    let config = ThreePlConfig::default();
    for (alpha, c) in [(0.8, 0.2), (1.5, 0.3), (2.5, 0.5)] {
        let exp = expected_experiment(alpha, c, 2000.0, &config);
        let mut model = SimplifiedThreePl::new(&exp).unwrap();
        model.fit().unwrap();

        assert_relative_eq!(model.discrimination().unwrap(), alpha, epsilon = 1e-2);
        assert_relative_eq!(model.base_rate().unwrap(), c, epsilon = 1e-2);
    }
}

#[test]
fn recovers_parameters_with_shifted_design() {
    let config = ThreePlConfig { difficulties: vec![1.5, 0.5, -0.5, -1.5], ability: 0.25 };
    let exp = expected_experiment(1.2, 0.25, 4000.0, &config);
    let mut model = SimplifiedThreePl::with_config(&exp, config).unwrap();
    model.fit().unwrap();

    assert_relative_eq!(model.discrimination().unwrap(), 1.2, epsilon = 1e-2);
    assert_relative_eq!(model.base_rate().unwrap(), 0.25, epsilon = 1e-2);
}

#[test]
fn recovers_parameters_from_binomial_samples() {
    // alpha = 1.5, c = 0.3 with 2000 trials per condition: SE(alpha) ~ 0.043, SE(c) ~ 0.008.
    let config = ThreePlConfig::default();
    for seed in [7, 42, 2024] {
        let exp = simulated_experiment(1.5, 0.3, 1000, &config, seed);
        let mut model = SimplifiedThreePl::new(&exp).unwrap();
        let result = model.fit().unwrap();

        assert!(result.converged, "seed {seed}: {}", result.message);
        let alpha = model.discrimination().unwrap();
        let c = model.base_rate().unwrap();
        assert!((alpha - 1.5).abs() < 0.25, "seed {seed}: alpha = {alpha}");
        assert!((c - 0.3).abs() < 0.05, "seed {seed}: c = {c}");
    }
}

#[test]
fn estimates_sharpen_with_more_trials() {
    let config = ThreePlConfig::default();
    let exp_small = expected_experiment(1.5, 0.3, 200.0, &config);
    let exp_large = expected_experiment(1.5, 0.3, 20_000.0, &config);
    let mut small = SimplifiedThreePl::new(&exp_small).unwrap();
    let mut large = SimplifiedThreePl::new(&exp_large).unwrap();
    small.fit().unwrap();
    large.fit().unwrap();

    // Same curve shape, so both land on the generating parameters.
    assert_relative_eq!(small.discrimination().unwrap(), large.discrimination().unwrap(), epsilon = 2e-2);
    let ratio = large.nll(1.0, 0.0).unwrap() / small.nll(1.0, 0.0).unwrap();
    assert_relative_eq!(ratio, 100.0, epsilon = 1e-6);
}
