//! Simplified three-parameter logistic (3PL) item-response model.
//!
//! One respondent with a fixed ability `theta` answers one item per
//! experimental condition. Condition `i` has difficulty `b_i`; all conditions
//! share a discrimination `alpha` and a guessing floor `c`:
//!
//! `P_i = c + (1 - c) * sigmoid(alpha * (theta - b_i))`
//!
//! The floor is estimated on the logit scale, `c = sigmoid(q)`, so the
//! optimizer works over `(alpha, q)` with `alpha >= 0` and `q` unbounded.
//!
//! Correct responses for a condition are `hits + correct_rejections`; the
//! likelihood is binomial in those counts.

use pf_core::{Error, Model, Result};
use pf_prob::math::{log_add_exp, log_sigmoid, logit, sigmoid};
use pf_sdt::Experiment;
use serde::{Deserialize, Serialize};

use crate::optimizer::{
    LbfgsbOptimizer, Minimizer, ObjectiveFunction, OptimizationResult, OptimizerConfig,
};

/// Fixed design of the model: one difficulty per condition and the ability level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreePlConfig {
    /// Difficulty per condition, aligned with the experiment's condition order.
    pub difficulties: Vec<f64>,
    /// Ability at which the response curve is evaluated.
    pub ability: f64,
}

impl Default for ThreePlConfig {
    fn default() -> Self {
        Self { difficulties: vec![2.0, 1.0, 0.0, -1.0, -2.0], ability: 0.0 }
    }
}

/// Guessing floor kept on both scales.
///
/// `rate == sigmoid(logit)` holds for every value; the two numbers can only be
/// produced together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BaseRate {
    logit: f64,
    rate: f64,
}

impl BaseRate {
    /// From a probability strictly inside `(0, 1)`.
    pub fn from_rate(rate: f64) -> Result<Self> {
        if !(rate > 0.0 && rate < 1.0) {
            return Err(Error::InvalidParameter(format!(
                "base rate must be strictly between 0 and 1, got {rate}"
            )));
        }
        Ok(Self { logit: logit(rate), rate })
    }

    /// From a finite logit whose rate is representable strictly inside `(0, 1)`.
    ///
    /// Above roughly 36.7 the rate rounds to exactly 1 in `f64` (below roughly
    /// -745 to exactly 0); such logits are rejected.
    pub fn from_logit(logit: f64) -> Result<Self> {
        if !logit.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "logit base rate must be finite, got {logit}"
            )));
        }
        let rate = sigmoid(logit);
        if !(rate > 0.0 && rate < 1.0) {
            return Err(Error::InvalidParameter(format!(
                "logit base rate {logit} saturates the base rate to {rate}"
            )));
        }
        Ok(Self { logit, rate })
    }

    /// Probability scale `c`.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Logit scale `q`.
    pub fn logit(&self) -> f64 {
        self.logit
    }
}

/// Aggregate response counts over all conditions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// All trials.
    pub n_total: f64,
    /// Hits plus correct rejections.
    pub n_correct: f64,
    /// Misses plus false alarms.
    pub n_incorrect: f64,
    /// Number of conditions.
    pub n_conditions: usize,
}

/// Forward model and likelihood over a borrowed experiment.
///
/// Pure: evaluating it never mutates anything, which makes it usable as an
/// [`ObjectiveFunction`] in custom optimization loops.
#[derive(Debug, Clone)]
pub struct ThreePlModel<'a> {
    experiment: &'a Experiment,
    difficulties: Vec<f64>,
    ability: f64,
}

impl<'a> ThreePlModel<'a> {
    /// Bind a model to `experiment`.
    ///
    /// The experiment must be non-empty and have exactly one condition per
    /// difficulty level.
    pub fn new(experiment: &'a Experiment, config: ThreePlConfig) -> Result<Self> {
        if experiment.is_empty() {
            return Err(Error::InvalidArgument("experiment has no conditions".to_string()));
        }
        if config.difficulties.len() != experiment.len() {
            return Err(Error::InvalidArgument(format!(
                "experiment has {} conditions but {} difficulty levels are configured",
                experiment.len(),
                config.difficulties.len()
            )));
        }
        if let Some(b) = config.difficulties.iter().find(|b| !b.is_finite()) {
            return Err(Error::InvalidArgument(format!("difficulty must be finite, got {b}")));
        }
        if !config.ability.is_finite() {
            return Err(Error::InvalidArgument(format!(
                "ability must be finite, got {}",
                config.ability
            )));
        }
        Ok(Self { experiment, difficulties: config.difficulties, ability: config.ability })
    }

    /// The bound experiment.
    pub fn experiment(&self) -> &'a Experiment {
        self.experiment
    }

    /// Difficulty levels in condition order.
    pub fn difficulties(&self) -> &[f64] {
        &self.difficulties
    }

    /// Ability level.
    pub fn ability(&self) -> f64 {
        self.ability
    }

    fn set_ability(&mut self, theta: f64) -> Result<()> {
        if !theta.is_finite() {
            return Err(Error::InvalidParameter(format!("ability must be finite, got {theta}")));
        }
        self.ability = theta;
        Ok(())
    }

    /// Probability of a correct response in each condition.
    pub fn predict(&self, alpha: f64, q: f64) -> Vec<f64> {
        let c = sigmoid(q);
        self.difficulties
            .iter()
            .map(|&b| c + (1.0 - c) / (1.0 + (-alpha * (self.ability - b)).exp()))
            .collect()
    }

    /// Negative log-likelihood of the observed counts at `(alpha, q)`.
    ///
    /// Evaluated in log space: `ln(1 - P_i) = ln(1 - c) + ln(1 - s_i)` and
    /// `ln(P_i) = logaddexp(ln c, ln(1 - c) + ln s_i)`, both finite for every
    /// finite input. Zero-count terms are skipped.
    pub fn nll(&self, alpha: f64, q: f64) -> Result<f64> {
        check_params(alpha, q)?;
        let ln_c = log_sigmoid(q);
        let ln_1mc = log_sigmoid(-q);

        let mut ll = 0.0;
        for (sdt, &b) in self.experiment.conditions().iter().zip(&self.difficulties) {
            let z = alpha * (self.ability - b);
            let n_correct = sdt.n_correct();
            let n_incorrect = sdt.n_incorrect();
            if n_correct > 0.0 {
                ll += n_correct * log_add_exp(ln_c, ln_1mc + log_sigmoid(z));
            }
            if n_incorrect > 0.0 {
                ll += n_incorrect * (ln_1mc + log_sigmoid(-z));
            }
        }

        let nll = -ll;
        if !nll.is_finite() {
            return Err(Error::NumericDomain(format!(
                "negative log-likelihood is not finite at alpha={alpha}, q={q}"
            )));
        }
        Ok(nll)
    }

    /// Analytic gradient of [`ThreePlModel::nll`] with respect to `(alpha, q)`.
    pub fn nll_gradient(&self, alpha: f64, q: f64) -> Result<[f64; 2]> {
        check_params(alpha, q)?;
        let c = sigmoid(q);
        let ln_c = log_sigmoid(q);
        let ln_1mc = log_sigmoid(-q);

        // dP/d(alpha) = (1-c) s (1-s) (theta-b),  dP/dq = c (1-c) (1-s).
        // Dividing by 1-P = (1-c)(1-s) leaves s (theta-b) and c respectively;
        // dividing by P is done in log space.
        let (mut d_alpha, mut d_q) = (0.0, 0.0);
        for (sdt, &b) in self.experiment.conditions().iter().zip(&self.difficulties) {
            let x = self.ability - b;
            let z = alpha * x;
            let s = sigmoid(z);
            let ln_s = log_sigmoid(z);
            let ln_1ms = log_sigmoid(-z);
            let ln_p = log_add_exp(ln_c, ln_1mc + ln_s);

            let n_correct = sdt.n_correct();
            let n_incorrect = sdt.n_incorrect();
            if n_correct > 0.0 {
                d_alpha += n_correct * x * (ln_1mc + ln_s + ln_1ms - ln_p).exp();
                d_q += n_correct * (ln_c + ln_1mc + ln_1ms - ln_p).exp();
            }
            if n_incorrect > 0.0 {
                d_alpha -= n_incorrect * x * s;
                d_q -= n_incorrect * c;
            }
        }

        let grad = [-d_alpha, -d_q];
        if grad.iter().any(|g| !g.is_finite()) {
            return Err(Error::NumericDomain(format!(
                "gradient is not finite at alpha={alpha}, q={q}"
            )));
        }
        Ok(grad)
    }

    /// Totals over the bound experiment.
    pub fn summary(&self) -> Summary {
        let conditions = self.experiment.conditions();
        let n_total: f64 = conditions.iter().map(|c| c.n_total()).sum();
        let n_correct: f64 = conditions.iter().map(|c| c.n_correct()).sum();
        Summary {
            n_total,
            n_correct,
            n_incorrect: n_total - n_correct,
            n_conditions: conditions.len(),
        }
    }
}

fn check_params(alpha: f64, q: f64) -> Result<()> {
    if !alpha.is_finite() || !q.is_finite() {
        return Err(Error::NumericDomain(format!(
            "parameters must be finite, got alpha={alpha}, q={q}"
        )));
    }
    Ok(())
}

fn split_params(params: &[f64]) -> Result<(f64, f64)> {
    match *params {
        [alpha, q] => Ok((alpha, q)),
        _ => Err(Error::InvalidArgument(format!("expected 2 parameters, got {}", params.len()))),
    }
}

impl Model for ThreePlModel<'_> {
    fn n_parameters(&self) -> usize {
        2
    }

    fn parameter_names(&self) -> Vec<String> {
        vec!["discrimination".to_string(), "logit_base_rate".to_string()]
    }

    fn parameter_bounds(&self) -> Vec<(f64, f64)> {
        vec![(0.0, f64::INFINITY), (f64::NEG_INFINITY, f64::INFINITY)]
    }

    fn parameter_init(&self) -> Vec<f64> {
        vec![1.0, 0.0]
    }
}

impl ObjectiveFunction for ThreePlModel<'_> {
    fn eval(&self, params: &[f64]) -> Result<f64> {
        let (alpha, q) = split_params(params)?;
        self.nll(alpha, q)
    }

    fn gradient(&self, params: &[f64]) -> Result<Vec<f64>> {
        let (alpha, q) = split_params(params)?;
        Ok(self.nll_gradient(alpha, q)?.to_vec())
    }
}

/// Maximum-likelihood fitter for the simplified 3PL model.
///
/// Holds a shared borrow of the experiment for its whole lifetime, so the
/// counts cannot change underneath a fit. All mutation goes through `&mut self`.
///
/// A failed [`fit`](SimplifiedThreePl::fit) leaves previously fitted estimates
/// in place; nothing is written before the optimizer reports convergence.
#[derive(Debug, Clone)]
pub struct SimplifiedThreePl<'a> {
    model: ThreePlModel<'a>,
    optimizer: LbfgsbOptimizer,
    discrimination: Option<f64>,
    base_rate: Option<BaseRate>,
    fitted: bool,
}

impl<'a> SimplifiedThreePl<'a> {
    /// Fitter with the default five difficulty levels and ability 0.
    pub fn new(experiment: &'a Experiment) -> Result<Self> {
        Self::with_config(experiment, ThreePlConfig::default())
    }

    /// Fitter with a custom design.
    pub fn with_config(experiment: &'a Experiment, config: ThreePlConfig) -> Result<Self> {
        Ok(Self {
            model: ThreePlModel::new(experiment, config)?,
            optimizer: LbfgsbOptimizer::default(),
            discrimination: None,
            base_rate: None,
            fitted: false,
        })
    }

    /// Replace the optimizer configuration used by [`fit`](SimplifiedThreePl::fit).
    pub fn with_optimizer_config(mut self, config: OptimizerConfig) -> Self {
        self.optimizer = LbfgsbOptimizer::new(config);
        self
    }

    /// Underlying forward model.
    pub fn model(&self) -> &ThreePlModel<'a> {
        &self.model
    }

    /// Difficulty levels in condition order.
    pub fn difficulties(&self) -> &[f64] {
        self.model.difficulties()
    }

    /// Ability level.
    pub fn ability(&self) -> f64 {
        self.model.ability()
    }

    /// Move the ability level. Clears the fitted state.
    pub fn set_ability(&mut self, theta: f64) -> Result<()> {
        self.model.set_ability(theta)?;
        self.fitted = false;
        Ok(())
    }

    /// See [`ThreePlModel::predict`].
    pub fn predict(&self, alpha: f64, q: f64) -> Vec<f64> {
        self.model.predict(alpha, q)
    }

    /// Predictions at the fitted estimates.
    pub fn predict_fitted(&self) -> Result<Vec<f64>> {
        Ok(self.model.predict(self.discrimination()?, self.logit_base_rate()?))
    }

    /// See [`ThreePlModel::nll`].
    pub fn nll(&self, alpha: f64, q: f64) -> Result<f64> {
        self.model.nll(alpha, q)
    }

    /// See [`ThreePlModel::nll_gradient`].
    pub fn nll_gradient(&self, alpha: f64, q: f64) -> Result<[f64; 2]> {
        self.model.nll_gradient(alpha, q)
    }

    /// See [`ThreePlModel::summary`].
    pub fn summary(&self) -> Summary {
        self.model.summary()
    }

    /// Estimate `(alpha, q)` with the configured L-BFGS optimizer.
    pub fn fit(&mut self) -> Result<OptimizationResult> {
        let (alpha, base_rate, result) = Self::run_fit(&self.model, &self.optimizer)?;
        self.store(alpha, base_rate);
        Ok(result)
    }

    /// Estimate `(alpha, q)` with any [`Minimizer`].
    pub fn fit_with(&mut self, minimizer: &dyn Minimizer) -> Result<OptimizationResult> {
        let (alpha, base_rate, result) = Self::run_fit(&self.model, minimizer)?;
        self.store(alpha, base_rate);
        Ok(result)
    }

    fn run_fit(
        model: &ThreePlModel<'_>,
        minimizer: &dyn Minimizer,
    ) -> Result<(f64, BaseRate, OptimizationResult)> {
        let init = model.parameter_init();
        let bounds = model.parameter_bounds();
        let result = minimizer.minimize(model, &init, &bounds).inspect_err(|e| {
            log::warn!("3PL fit failed: {e}");
        })?;

        if !result.converged {
            log::warn!("3PL fit did not converge: {}", result.message);
            return Err(Error::Optimization(format!(
                "optimization failed to converge: {}",
                result.message
            )));
        }

        let (alpha, q) = split_params(&result.parameters)
            .map_err(|e| Error::Optimization(format!("minimizer returned bad parameters: {e}")))?;
        if !alpha.is_finite() || alpha < 0.0 {
            return Err(Error::Optimization(format!(
                "minimizer returned out-of-bounds discrimination {alpha}"
            )));
        }
        if !q.is_finite() {
            return Err(Error::Optimization(format!(
                "minimizer returned non-finite logit base rate {q}"
            )));
        }
        // All-correct (or near all-incorrect) counts have no interior optimum in q.
        let base_rate = BaseRate::from_logit(q).map_err(|_| {
            log::warn!("3PL fit drove the base rate to the boundary (q={q})");
            Error::NumericDomain(format!(
                "fitted base rate is not strictly inside (0, 1) at q={q}; the counts are degenerate"
            ))
        })?;

        log::debug!(
            "3PL fit: alpha={alpha:.6}, q={q:.6}, c={:.6}, nll={:.6} ({})",
            base_rate.rate(),
            result.fval,
            result
        );
        Ok((alpha, base_rate, result))
    }

    fn store(&mut self, alpha: f64, base_rate: BaseRate) {
        self.discrimination = Some(alpha);
        self.base_rate = Some(base_rate);
        self.fitted = true;
    }

    /// `true` after a successful fit, until the next mutation.
    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    /// Fitted discrimination `alpha`.
    pub fn discrimination(&self) -> Result<f64> {
        self.fitted_value(self.discrimination)
    }

    /// Fitted base rate `c`.
    pub fn base_rate(&self) -> Result<f64> {
        self.fitted_value(self.base_rate.map(|b| b.rate()))
    }

    /// Fitted logit base rate `q`.
    pub fn logit_base_rate(&self) -> Result<f64> {
        self.fitted_value(self.base_rate.map(|b| b.logit()))
    }

    fn fitted_value(&self, value: Option<f64>) -> Result<f64> {
        match value {
            Some(v) if self.fitted => Ok(v),
            _ => Err(Error::NotFitted),
        }
    }

    /// Set `alpha` directly. Clears the fitted state.
    pub fn set_discrimination(&mut self, value: f64) -> Result<()> {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::InvalidParameter(format!(
                "discrimination must be finite and >= 0, got {value}"
            )));
        }
        self.discrimination = Some(value);
        self.fitted = false;
        Ok(())
    }

    /// Set `c` directly; `q` follows. Clears the fitted state.
    pub fn set_base_rate(&mut self, value: f64) -> Result<()> {
        self.base_rate = Some(BaseRate::from_rate(value)?);
        self.fitted = false;
        Ok(())
    }

    /// Set `q` directly; `c` follows. Clears the fitted state.
    ///
    /// Rejects logits whose rate rounds to 0 or 1, see [`BaseRate::from_logit`].
    pub fn set_logit_base_rate(&mut self, value: f64) -> Result<()> {
        self.base_rate = Some(BaseRate::from_logit(value)?);
        self.fitted = false;
        Ok(())
    }
}
