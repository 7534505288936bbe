//! Core traits for PsyFit
//!
//! Model crates describe their free parameters through [`Model`]; the
//! inference crate reads names and bounds from it without knowing the
//! concrete likelihood.

/// Statistical model trait
pub trait Model {
    /// Number of parameters
    fn n_parameters(&self) -> usize;

    /// Parameter names
    fn parameter_names(&self) -> Vec<String>;

    /// Parameter bounds (min, max). Unbounded sides use infinities.
    fn parameter_bounds(&self) -> Vec<(f64, f64)>;

    /// Starting point for optimization
    fn parameter_init(&self) -> Vec<f64>;
}
