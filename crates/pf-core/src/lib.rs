//! # pf-core
//!
//! Core error types and traits for PsyFit.
//!
//! This crate provides:
//! - The workspace-wide error type
//! - Core traits shared between model and inference crates

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod traits;

pub use error::{Error, Result};
pub use traits::Model;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
