//! Mock ODE systems for testing
//!
//! These systems have known analytical solutions, making them
//! ideal for validating numerical solver accuracy.

use bamm_rs::solver::OdeSystem;
use nalgebra::DVector;

// =================================================================================================
// Exponential Decay: dy/dt = -k*y
// =================================================================================================

/// Exponential decay system: dy/dt = -k*y
///
/// Analytical solution: y(t) = y₀ * exp(-k*t)
pub struct ExponentialDecay {
    pub dimension: usize,
    pub decay_rate: f64,
}

impl ExponentialDecay {
    pub fn new(dimension: usize, decay_rate: f64) -> Self {
        Self {
            dimension,
            decay_rate,
        }
    }

    /// Analytical solution at time t, starting from y₀ = 1.
    pub fn analytical_solution(&self, t: f64) -> f64 {
        (-self.decay_rate * t).exp()
    }
}

impl OdeSystem for ExponentialDecay {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "exponential decay"
    }

    fn initial_state(&self) -> DVector<f64> {
        DVector::from_element(self.dimension, 1.0)
    }

    fn rhs(&self, _time: f64, state: &DVector<f64>) -> DVector<f64> {
        state * -self.decay_rate
    }
}

// =================================================================================================
// Constant Growth: dy/dt = c
// =================================================================================================

/// Constant growth system: dy/dt = c
///
/// Analytical solution: y(t) = y₀ + c*t. Every explicit solver is
/// exact for this system, so it separates accuracy from stability.
pub struct ConstantGrowth {
    pub dimension: usize,
    pub growth_rate: f64,
}

impl ConstantGrowth {
    pub fn new(dimension: usize, growth_rate: f64) -> Self {
        Self {
            dimension,
            growth_rate,
        }
    }

    /// Analytical solution at time t, starting from y₀ = 0.
    pub fn analytical_solution(&self, t: f64) -> f64 {
        self.growth_rate * t
    }
}

impl OdeSystem for ConstantGrowth {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "constant growth"
    }

    fn initial_state(&self) -> DVector<f64> {
        DVector::zeros(self.dimension)
    }

    fn rhs(&self, _time: f64, _state: &DVector<f64>) -> DVector<f64> {
        DVector::from_element(self.dimension, self.growth_rate)
    }
}
