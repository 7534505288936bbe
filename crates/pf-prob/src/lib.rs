//! Probability building blocks for PsyFit.
//!
//! This crate hosts reusable probability math used by the signal-detection
//! and item-response crates:
//! - small numeric helpers (stable sigmoid, log-sigmoid, logit, log-add-exp)
//! - standard normal CDF and quantile (inverse-normal transforms)

pub mod math;
pub mod normal;
