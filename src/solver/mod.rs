//! Time integration
//!
//! # Core Concepts
//!
//! The solver architecture separates concerns into two layers:
//!
//! 1. **System** ([`OdeSystem`]) - WHAT to integrate
//!    - flat state vector and its initial value
//!    - right-hand side `f(t, y)`
//!    - optional algebraic residuals
//!
//! 2. **Solver** ([`Solver`] trait) - HOW to integrate
//!    - stepping policy (fixed or adaptive)
//!    - tuning knobs (step counts, tolerances, budgets)
//!    - independent of where the system came from
//!
//! This separation allows the same solver to integrate discretized
//! models and hand-written test systems alike, and the same system to be
//! integrated by different methods for accuracy comparisons.
//!
//! # Available Solvers
//!
//! | Solver        | Order | Stepping  | Evals/step |
//! |---------------|-------|-----------|------------|
//! | [`EulerSolver`] | 1   | fixed     | 1          |
//! | [`RK4Solver`]   | 4   | fixed     | 4          |
//! | [`RK45Solver`]  | 5   | adaptive  | 6          |
//!
//! All three are explicit methods. Systems with algebraic constraints
//! are rejected before stepping: a consistent-but-constrained initial
//! state fails with [`SolverError::NotDaeCapable`], an inconsistent one
//! with [`SolverError::InconsistentInitialState`].
//!
//! # Quick Start Example
//!
//! ```
//! use bamm_rs::solver::{OdeSystem, RK4Solver, Solver, TimeSpan};
//! use nalgebra::DVector;
//!
//! // dy/dt = -y, y(0) = 1; the exact solution is exp(-t).
//! struct Decay;
//!
//! impl OdeSystem for Decay {
//!     fn dimension(&self) -> usize { 1 }
//!     fn name(&self) -> &str { "decay" }
//!     fn initial_state(&self) -> DVector<f64> { DVector::from_element(1, 1.0) }
//!     fn rhs(&self, _time: f64, state: &DVector<f64>) -> DVector<f64> { -state }
//! }
//!
//! let solver = RK4Solver::new(100);
//! let solution = solver.solve(&Decay, TimeSpan::new(0.0, 1.0))?;
//!
//! assert_eq!(*solution.times().first().unwrap(), 0.0);
//! assert_eq!(*solution.times().last().unwrap(), 1.0);
//! assert!((solution.final_state()[0] - (-1.0f64).exp()).abs() < 1e-8);
//! # Ok::<(), bamm_rs::error::SolverError>(())
//! ```
//!
//! # Workflow Diagram
//!
//! ```text
//! ┌──────────────────────┐
//! │ DiscretizedSystem    │  (or any OdeSystem)
//! │ y' = f(t, y), y(0)   │
//! └──────────┬───────────┘
//!            │
//! ┌──────────▼───────────┐
//! │ Solver               │  Euler / RK4 / RK45
//! │ + TimeSpan [t0, t1]  │
//! └──────────┬───────────┘
//!            │
//! ┌──────────▼───────────┐
//! │ Solution             │  times + states + metadata
//! │ .variable("name")    │  named outputs, when attached
//! └──────────────────────┘
//! ```
//!
//! # Error Handling
//!
//! Solvers fail fast with a [`SolverError`] naming the cause: invalid
//! spans and configurations before stepping, non-finite states
//! ([`SolverError::NumericalInstability`]) during stepping, exhausted
//! budgets ([`SolverError::StepBudgetExhausted`]) and vanishing adaptive
//! steps ([`SolverError::StepSizeUnderflow`]) for the adaptive method.

pub mod methods;
pub mod solution;
pub mod traits;

pub use methods::{EulerSolver, RK4Solver, RK45Solver};
pub use solution::{ProcessedData, ProcessedVariable, Solution};
pub use traits::{OdeSystem, Solver, TimeSpan};

use nalgebra::DVector;

use crate::error::SolverError;

// =================================================================================================
// Shared stepping helpers
// =================================================================================================

/// Residual tolerance below which an algebraically constrained initial
/// state counts as consistent.
const DAE_CONSISTENCY_TOLERANCE: f64 = 1e-8;

/// Checks a state for numerical breakdown.
///
/// NaN or infinite entries mean the integration has diverged; the error
/// carries the time at which it happened.
pub fn validate_state(state: &DVector<f64>, time: f64) -> Result<(), SolverError> {
    if state.iter().all(|value| value.is_finite()) {
        Ok(())
    } else {
        Err(SolverError::NumericalInstability { time })
    }
}

/// Fetches and vets the initial state of a system.
///
/// Shared by every solver so that the rejection order is uniform:
/// dimension and finiteness first, then the algebraic checks. For
/// constrained systems an inconsistent state is reported ahead of the
/// solver's own inability to handle constraints, because it is the more
/// actionable diagnosis.
pub(crate) fn check_initial_state(
    system: &dyn OdeSystem,
    solver: &str,
    start: f64,
) -> Result<DVector<f64>, SolverError> {
    let state = system.initial_state();
    if state.is_empty() {
        return Err(SolverError::invalid_initial_state(
            "the state vector is empty",
        ));
    }
    if state.len() != system.dimension() {
        return Err(SolverError::invalid_initial_state(format!(
            "expected {} values, got {}",
            system.dimension(),
            state.len()
        )));
    }
    if !state.iter().all(|value| value.is_finite()) {
        return Err(SolverError::invalid_initial_state(
            "the state vector contains non-finite values",
        ));
    }

    if system.has_algebraic() {
        if let Some(residual) = system.algebraic_residual(start, &state) {
            let norm = residual.amax();
            if norm > DAE_CONSISTENCY_TOLERANCE {
                return Err(SolverError::InconsistentInitialState {
                    residual: norm,
                    tolerance: DAE_CONSISTENCY_TOLERANCE,
                });
            }
        }
        return Err(SolverError::NotDaeCapable {
            solver: solver.to_string(),
        });
    }

    Ok(state)
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_state_accepts_finite_values() {
        let state = DVector::from_vec(vec![0.0, -1.5, 1e300]);
        assert!(validate_state(&state, 0.0).is_ok());
    }

    #[test]
    fn test_validate_state_rejects_nan_and_inf() {
        let nan = DVector::from_vec(vec![1.0, f64::NAN]);
        assert_eq!(
            validate_state(&nan, 0.25),
            Err(SolverError::NumericalInstability { time: 0.25 })
        );

        let inf = DVector::from_vec(vec![f64::INFINITY]);
        assert!(validate_state(&inf, 1.0).is_err());
    }

    // ====== Initial state checks ======

    struct Misdimensioned;

    impl OdeSystem for Misdimensioned {
        fn dimension(&self) -> usize {
            3
        }

        fn name(&self) -> &str {
            "misdimensioned"
        }

        fn initial_state(&self) -> DVector<f64> {
            DVector::from_element(2, 1.0)
        }

        fn rhs(&self, _time: f64, state: &DVector<f64>) -> DVector<f64> {
            state.clone()
        }
    }

    #[test]
    fn test_check_initial_state_dimension_mismatch() {
        let err = check_initial_state(&Misdimensioned, "test", 0.0).unwrap_err();
        assert!(matches!(err, SolverError::InvalidInitialState { .. }));
        assert!(err.to_string().contains("expected 3"));
    }

    struct NonFiniteStart;

    impl OdeSystem for NonFiniteStart {
        fn dimension(&self) -> usize {
            1
        }

        fn name(&self) -> &str {
            "non-finite start"
        }

        fn initial_state(&self) -> DVector<f64> {
            DVector::from_element(1, f64::NAN)
        }

        fn rhs(&self, _time: f64, state: &DVector<f64>) -> DVector<f64> {
            state.clone()
        }
    }

    #[test]
    fn test_check_initial_state_rejects_non_finite() {
        let err = check_initial_state(&NonFiniteStart, "test", 0.0).unwrap_err();
        assert!(matches!(err, SolverError::InvalidInitialState { .. }));
    }

    struct Constrained {
        residual: f64,
    }

    impl OdeSystem for Constrained {
        fn dimension(&self) -> usize {
            2
        }

        fn name(&self) -> &str {
            "constrained"
        }

        fn initial_state(&self) -> DVector<f64> {
            DVector::from_element(2, 1.0)
        }

        fn rhs(&self, _time: f64, state: &DVector<f64>) -> DVector<f64> {
            -state
        }

        fn has_algebraic(&self) -> bool {
            true
        }

        fn algebraic_residual(&self, _time: f64, _state: &DVector<f64>) -> Option<DVector<f64>> {
            Some(DVector::from_element(1, self.residual))
        }
    }

    #[test]
    fn test_consistent_dae_reports_missing_capability() {
        let system = Constrained { residual: 0.0 };
        let err = check_initial_state(&system, "forward Euler", 0.0).unwrap_err();
        assert_eq!(
            err,
            SolverError::NotDaeCapable {
                solver: "forward Euler".to_string()
            }
        );
    }

    #[test]
    fn test_inconsistent_dae_reports_residual_first() {
        let system = Constrained { residual: 0.5 };
        let err = check_initial_state(&system, "forward Euler", 0.0).unwrap_err();
        match err {
            SolverError::InconsistentInitialState {
                residual,
                tolerance,
            } => {
                assert_eq!(residual, 0.5);
                assert_eq!(tolerance, DAE_CONSISTENCY_TOLERANCE);
            }
            other => panic!("expected InconsistentInitialState, got {other:?}"),
        }
    }
}
