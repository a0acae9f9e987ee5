//! Forward Euler numerical solver
//!
//! # Mathematical Background
//!
//! The forward Euler method is the simplest explicit time integrator
//! for ordinary differential equations:
//!
//! ```text
//! dy/dt = f(t, y)
//! yₙ₊₁ = yₙ + dt · f(tₙ, yₙ)
//! ```
//!
//! # Characteristics
//!
//! - **Order**: first-order accurate (global error ~ O(dt))
//! - **Stability**: conditionally stable; requires small steps
//! - **Cost**: 1 function evaluation per step
//!
//! For the diffusion systems this crate produces, the explicit stability
//! limit scales with the square of the cell width, so fine meshes demand
//! many steps. Euler is kept as the baseline for convergence studies;
//! production runs use [`RK4Solver`](crate::solver::RK4Solver) or
//! [`RK45Solver`](crate::solver::RK45Solver).

use crate::error::SolverError;
use crate::solver::solution::Solution;
use crate::solver::traits::{OdeSystem, Solver, TimeSpan};
use crate::solver::{check_initial_state, validate_state};

// =================================================================================================
// Euler Solver
// =================================================================================================

/// Forward Euler integrator with a fixed number of uniform steps.
///
/// # Example
///
/// ```
/// use bamm_rs::solver::{EulerSolver, Solver};
///
/// let solver = EulerSolver::new(1000);
/// assert_eq!(solver.name(), "forward Euler");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct EulerSolver {
    steps: usize,
}

impl EulerSolver {
    /// Creates a solver dividing the span into `steps` uniform steps.
    pub fn new(steps: usize) -> Self {
        Self { steps }
    }

    #[inline]
    pub fn steps(&self) -> usize {
        self.steps
    }
}

impl Default for EulerSolver {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl Solver for EulerSolver {
    fn solve(&self, system: &dyn OdeSystem, span: TimeSpan) -> Result<Solution, SolverError> {
        // ====== Step 1: Validation ======

        span.validate()?;
        if self.steps == 0 {
            return Err(SolverError::invalid_configuration(
                "the step count must be at least 1",
            ));
        }
        let mut state = check_initial_state(system, self.name(), span.start())?;

        // ====== Step 2: Setup ======

        let dt = span.duration() / (self.steps as f64);

        let mut times = Vec::with_capacity(self.steps + 1);
        let mut states = Vec::with_capacity(self.steps + 1);
        times.push(span.start());
        states.push(state.clone());

        // ====== Step 3: Time integration ======

        for step in 0..self.steps {
            let t = span.start() + (step as f64) * dt;
            let slope = system.rhs(t, &state);
            state += slope * dt;

            // Times come from the step index, not accumulation, so
            // rounding errors do not build up; the final sample is
            // pinned to the end of the span exactly.
            let t_next = if step + 1 == self.steps {
                span.end()
            } else {
                span.start() + (step as f64 + 1.0) * dt
            };
            validate_state(&state, t_next)?;
            times.push(t_next);
            states.push(state.clone());
        }

        // ====== Step 4: Build result ======

        let mut solution = Solution::new(times, states, state);
        solution.add_metadata("solver", self.name());
        solution.add_metadata("steps", self.steps.to_string());
        solution.add_metadata("dt", dt.to_string());
        solution.add_metadata("function evaluations", self.steps.to_string());
        Ok(solution)
    }

    fn name(&self) -> &'static str {
        "forward Euler"
    }
}

// =================================================================================================
// Tests
// =================================================================================================
