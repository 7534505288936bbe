//! # pf-inference
//!
//! Statistical inference for PsyFit.
//!
//! This crate provides:
//! - A bounded L-BFGS optimizer behind the [`Minimizer`] trait
//! - Maximum-likelihood fitting of the simplified 3PL item-response model
//!
//! ## Architecture
//!
//! Models expose their likelihood as an [`ObjectiveFunction`] and their
//! parameter layout through `pf_core::Model`; the fitter only talks to the
//! optimizer through [`Minimizer`], so any bound-constrained method (or a test
//! double) can drive it.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Simplified three-parameter logistic item-response model.
pub mod irt;
/// Generic numerical optimizer (L-BFGS backend).
pub mod optimizer;

pub use irt::{BaseRate, SimplifiedThreePl, Summary, ThreePlConfig, ThreePlModel};
pub use optimizer::{
    LbfgsbOptimizer, Minimizer, ObjectiveFunction, OptimizationResult, OptimizerConfig,
};
