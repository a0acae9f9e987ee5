//! Solver traits and time span type
//!
//! # Design Philosophy
//!
//! The solver layer never sees symbols, meshes or domains. Everything it
//! integrates is an [`OdeSystem`]: a flat state vector plus a right-hand
//! side. Discretization produces such systems; hand-written mock systems
//! implement the same trait for testing, so solvers are verified against
//! problems with known closed-form solutions.
//!
//! # Stability Guarantee
//!
//! - `Solver` trait: STABLE since v0.1.0
//! - `OdeSystem` trait: EXTENSIBLE (new provided methods may be added)

use nalgebra::DVector;

use crate::error::SolverError;
use crate::solver::solution::Solution;

// =================================================================================================
// Time span
// =================================================================================================

/// Integration interval `[start, end]`.
///
/// A span is cheap to construct and carries no validity guarantee of its
/// own; solvers call [`validate`](Self::validate) before stepping, so a
/// reversed or non-finite span fails with
/// [`SolverError::InvalidTimeSpan`] rather than producing garbage.
///
/// # Example
///
/// ```
/// use bamm_rs::solver::TimeSpan;
///
/// let span = TimeSpan::new(0.0, 1.0);
/// assert!(span.validate().is_ok());
/// assert_eq!(span.duration(), 1.0);
///
/// let reversed = TimeSpan::new(1.0, 0.0);
/// assert!(reversed.validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSpan {
    start: f64,
    end: f64,
}

impl TimeSpan {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn start(&self) -> f64 {
        self.start
    }

    #[inline]
    pub fn end(&self) -> f64 {
        self.end
    }

    /// Length of the interval.
    #[inline]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// The span must be finite and strictly forward in time.
    pub fn validate(&self) -> Result<(), SolverError> {
        if self.start.is_finite() && self.end.is_finite() && self.start < self.end {
            Ok(())
        } else {
            Err(SolverError::InvalidTimeSpan {
                start: self.start,
                end: self.end,
            })
        }
    }
}

// =================================================================================================
// OdeSystem trait
// =================================================================================================

/// A first-order system `dy/dt = f(t, y)` over a flat state vector,
/// optionally constrained by algebraic residuals `0 = g(t, y)`.
///
/// # Contract
///
/// - [`initial_state`](Self::initial_state) returns a vector of exactly
///   [`dimension`](Self::dimension) values.
/// - [`rhs`](Self::rhs) returns a vector of the same length as its input
///   and must not mutate anything observable; solvers call it freely at
///   trial states that never enter the trajectory.
/// - Systems with algebraic equations report them through
///   [`has_algebraic`](Self::has_algebraic) and
///   [`algebraic_residual`](Self::algebraic_residual). The explicit
///   solvers shipped here refuse such systems up front instead of
///   silently integrating the differential part alone.
pub trait OdeSystem {
    /// Length of the state vector.
    fn dimension(&self) -> usize;

    /// Human-readable system name, used in logs and solver metadata.
    fn name(&self) -> &str;

    /// The state at the start of integration.
    fn initial_state(&self) -> DVector<f64>;

    /// Time derivative of the state.
    fn rhs(&self, time: f64, state: &DVector<f64>) -> DVector<f64>;

    /// Whether the system carries algebraic constraints.
    fn has_algebraic(&self) -> bool {
        false
    }

    /// Residuals of the algebraic constraints, `None` when there are
    /// none. A consistent state has residuals of (numerically) zero.
    fn algebraic_residual(&self, _time: f64, _state: &DVector<f64>) -> Option<DVector<f64>> {
        None
    }
}

// =================================================================================================
// Solver trait
// =================================================================================================

/// A time integrator.
///
/// Implementations own their stepping policy (fixed or adaptive) and
/// their tuning knobs; `solve` takes only the system and the span. Every
/// returned [`Solution`] satisfies the same guarantees:
///
/// - sampled times are strictly increasing,
/// - the first time equals `span.start()` and the last equals
///   `span.end()` exactly,
/// - every stored state passed a finiteness check.
pub trait Solver {
    /// Integrates the system over the span.
    fn solve(&self, system: &dyn OdeSystem, span: TimeSpan) -> Result<Solution, SolverError>;

    /// Solver name, used in logs and solution metadata.
    fn name(&self) -> &'static str;
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ====== TimeSpan ======

    #[test]
    fn test_time_span_accessors() {
        let span = TimeSpan::new(1.0, 3.5);
        assert_eq!(span.start(), 1.0);
        assert_eq!(span.end(), 3.5);
        assert_eq!(span.duration(), 2.5);
    }

    #[test]
    fn test_time_span_validation() {
        assert!(TimeSpan::new(0.0, 1.0).validate().is_ok());
        assert!(TimeSpan::new(-1.0, 0.0).validate().is_ok());

        let err = TimeSpan::new(1.0, 1.0).validate().unwrap_err();
        assert_eq!(
            err,
            SolverError::InvalidTimeSpan {
                start: 1.0,
                end: 1.0
            }
        );
        assert!(TimeSpan::new(2.0, 1.0).validate().is_err());
        assert!(TimeSpan::new(0.0, f64::NAN).validate().is_err());
        assert!(TimeSpan::new(f64::NEG_INFINITY, 0.0).validate().is_err());
    }

    // ====== OdeSystem defaults ======

    struct PlainSystem;

    impl OdeSystem for PlainSystem {
        fn dimension(&self) -> usize {
            1
        }

        fn name(&self) -> &str {
            "plain"
        }

        fn initial_state(&self) -> DVector<f64> {
            DVector::from_element(1, 1.0)
        }

        fn rhs(&self, _time: f64, state: &DVector<f64>) -> DVector<f64> {
            -state
        }
    }

    #[test]
    fn test_ode_system_defaults_to_no_algebraic_part() {
        let system = PlainSystem;
        assert!(!system.has_algebraic());
        assert!(system
            .algebraic_residual(0.0, &system.initial_state())
            .is_none());
    }
}
