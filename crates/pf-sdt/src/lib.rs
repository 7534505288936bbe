//! # pf-sdt
//!
//! Signal-detection theory for PsyFit.
//!
//! - [`SignalDetection`]: validated hit / miss / false-alarm / correct-rejection
//!   counts with rate, d' and criterion statistics.
//! - [`Experiment`]: an ordered, optionally labelled set of conditions exposing
//!   sorted ROC points and a trapezoidal AUC.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Ordered condition sets, ROC points and AUC.
pub mod experiment;
/// Per-condition signal-detection counts and metrics.
pub mod signal;

pub use experiment::Experiment;
pub use signal::SignalDetection;
