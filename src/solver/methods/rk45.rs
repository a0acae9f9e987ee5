//! Runge-Kutta-Fehlberg 45 (RKF45) adaptive solver
//!
//! # Mathematical Background
//!
//! The Fehlberg method evaluates six slopes per step and combines them
//! twice: once with fifth-order weights to advance the state, and once
//! with the difference between the fifth- and fourth-order weights to
//! estimate the local error for free:
//!
//! ```text
//! y₅ = yₙ + dt · Σ bᵢ kᵢ          (propagated, fifth order)
//! e  =      dt · Σ (bᵢ - b̂ᵢ) kᵢ   (embedded error estimate)
//! ```
//!
//! The error is measured against a mixed tolerance, per component:
//!
//! ```text
//! ‖e‖ = max |eᵢ| / (atol + rtol · max(|yₙᵢ|, |y₅ᵢ|))
//! ```
//!
//! A step is accepted when `‖e‖ ≤ 1` and the next step size follows the
//! standard fifth-order controller `dt · 0.9 · ‖e‖^(-1/5)`, clamped so a
//! single noisy estimate cannot collapse or explode the step size.
//!
//! # Characteristics
//!
//! - **Order**: fifth-order propagation with a fourth-order error probe
//! - **Step control**: adaptive; samples land where the dynamics demand
//! - **Cost**: 6 function evaluations per attempted step
//!
//! Rejected steps are re-attempted with a smaller `dt` and do not
//! appear in the returned trajectory, so sampled times are always
//! strictly increasing.

use crate::error::SolverError;
use crate::solver::solution::Solution;
use crate::solver::traits::{OdeSystem, Solver, TimeSpan};
use crate::solver::{check_initial_state, validate_state};

// =================================================================================================
// Butcher tableau (Fehlberg 1969)
// =================================================================================================

const A21: f64 = 1.0 / 4.0;
const A31: f64 = 3.0 / 32.0;
const A32: f64 = 9.0 / 32.0;
const A41: f64 = 1932.0 / 2197.0;
const A42: f64 = -7200.0 / 2197.0;
const A43: f64 = 7296.0 / 2197.0;
const A51: f64 = 439.0 / 216.0;
const A52: f64 = -8.0;
const A53: f64 = 3680.0 / 513.0;
const A54: f64 = -845.0 / 4104.0;
const A61: f64 = -8.0 / 27.0;
const A62: f64 = 2.0;
const A63: f64 = -3544.0 / 2565.0;
const A64: f64 = 1859.0 / 4104.0;
const A65: f64 = -11.0 / 40.0;

const C2: f64 = 1.0 / 4.0;
const C3: f64 = 3.0 / 8.0;
const C4: f64 = 12.0 / 13.0;
const C5: f64 = 1.0;
const C6: f64 = 1.0 / 2.0;

// Fifth-order propagation weights (k₂ carries weight zero).
const B1: f64 = 16.0 / 135.0;
const B3: f64 = 6656.0 / 12825.0;
const B4: f64 = 28561.0 / 56430.0;
const B5: f64 = -9.0 / 50.0;
const B6: f64 = 2.0 / 55.0;

// Difference between the fifth- and fourth-order weights.
const E1: f64 = 1.0 / 360.0;
const E3: f64 = -128.0 / 4275.0;
const E4: f64 = -2197.0 / 75240.0;
const E5: f64 = 1.0 / 50.0;
const E6: f64 = 2.0 / 55.0;

// Step-size controller.
const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 5.0;

// =================================================================================================
// RK45 Solver
// =================================================================================================

/// Adaptive Runge-Kutta-Fehlberg integrator with embedded error control.
///
/// The step size grows through smooth stretches and shrinks where the
/// dynamics steepen, so accuracy is set by the tolerances rather than by
/// a step count chosen up front.
///
/// # Example
///
/// ```
/// use bamm_rs::solver::{RK45Solver, Solver};
///
/// let solver = RK45Solver::new().with_tolerances(1e-8, 1e-10);
/// assert_eq!(solver.name(), "Runge-Kutta-Fehlberg 45");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RK45Solver {
    rtol: f64,
    atol: f64,
    max_steps: usize,
    initial_step: Option<f64>,
}

impl RK45Solver {
    /// Creates a solver with relative tolerance `1e-6` and absolute
    /// tolerance `1e-9`.
    pub fn new() -> Self {
        Self {
            rtol: 1e-6,
            atol: 1e-9,
            max_steps: 100_000,
            initial_step: None,
        }
    }

    /// Sets the relative and absolute error tolerances.
    pub fn with_tolerances(mut self, rtol: f64, atol: f64) -> Self {
        self.rtol = rtol;
        self.atol = atol;
        self
    }

    /// Caps the number of attempted steps, rejected attempts included.
    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Overrides the first trial step size. The default is a hundredth
    /// of the span.
    pub fn initial_step(mut self, step: f64) -> Self {
        self.initial_step = Some(step);
        self
    }

    #[inline]
    pub fn rtol(&self) -> f64 {
        self.rtol
    }

    #[inline]
    pub fn atol(&self) -> f64 {
        self.atol
    }

    fn validate_configuration(&self) -> Result<(), SolverError> {
        if !self.rtol.is_finite() || self.rtol <= 0.0 {
            return Err(SolverError::invalid_configuration(
                "the relative tolerance must be positive and finite",
            ));
        }
        if !self.atol.is_finite() || self.atol <= 0.0 {
            return Err(SolverError::invalid_configuration(
                "the absolute tolerance must be positive and finite",
            ));
        }
        if self.max_steps == 0 {
            return Err(SolverError::invalid_configuration(
                "the step budget must be at least 1",
            ));
        }
        if let Some(step) = self.initial_step {
            if !step.is_finite() || step <= 0.0 {
                return Err(SolverError::invalid_configuration(
                    "the initial step size must be positive and finite",
                ));
            }
        }
        Ok(())
    }
}

impl Default for RK45Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver for RK45Solver {
    fn solve(&self, system: &dyn OdeSystem, span: TimeSpan) -> Result<Solution, SolverError> {
        // ====== Step 1: Validation ======

        span.validate()?;
        self.validate_configuration()?;
        let mut state = check_initial_state(system, self.name(), span.start())?;

        // ====== Step 2: Setup ======

        let mut t = span.start();
        let mut dt = self
            .initial_step
            .unwrap_or(span.duration() / 100.0)
            .min(span.duration());

        let mut times = vec![t];
        let mut states = vec![state.clone()];
        let mut attempted = 0usize;
        let mut accepted = 0usize;

        // ====== Step 3: Adaptive time integration ======

        while t < span.end() {
            attempted += 1;
            if attempted > self.max_steps {
                return Err(SolverError::StepBudgetExhausted {
                    max_steps: self.max_steps,
                    time: t,
                });
            }
            let min_step = t.abs().max(1.0) * f64::EPSILON * 16.0;
            if dt < min_step {
                return Err(SolverError::StepSizeUnderflow { time: t, step: dt });
            }

            let remaining = span.end() - t;
            let last = dt >= remaining;
            let step = if last { remaining } else { dt };

            // Six Fehlberg stages.
            let k1 = system.rhs(t, &state);
            let k2 = system.rhs(t + C2 * step, &(&state + &k1 * (A21 * step)));
            let k3 = system.rhs(
                t + C3 * step,
                &(&state + &k1 * (A31 * step) + &k2 * (A32 * step)),
            );
            let k4 = system.rhs(
                t + C4 * step,
                &(&state + &k1 * (A41 * step) + &k2 * (A42 * step) + &k3 * (A43 * step)),
            );
            let k5 = system.rhs(
                t + C5 * step,
                &(&state
                    + &k1 * (A51 * step)
                    + &k2 * (A52 * step)
                    + &k3 * (A53 * step)
                    + &k4 * (A54 * step)),
            );
            let k6 = system.rhs(
                t + C6 * step,
                &(&state
                    + &k1 * (A61 * step)
                    + &k2 * (A62 * step)
                    + &k3 * (A63 * step)
                    + &k4 * (A64 * step)
                    + &k5 * (A65 * step)),
            );

            let y5 = &state + (&k1 * B1 + &k3 * B3 + &k4 * B4 + &k5 * B5 + &k6 * B6) * step;
            let err = (&k1 * E1 + &k3 * E3 + &k4 * E4 + &k5 * E5 + &k6 * E6) * step;

            // Scaled max-norm of the error estimate.
            let mut err_norm = 0.0f64;
            for i in 0..err.len() {
                let scale = self.atol + self.rtol * state[i].abs().max(y5[i].abs());
                let ratio = (err[i] / scale).abs();
                if ratio.is_nan() {
                    return Err(SolverError::NumericalInstability { time: t });
                }
                err_norm = err_norm.max(ratio);
            }

            if err_norm <= 1.0 {
                // The final accepted step lands on the end of the span
                // exactly rather than within rounding of it.
                t = if last { span.end() } else { t + step };
                state = y5;
                validate_state(&state, t)?;
                times.push(t);
                states.push(state.clone());
                accepted += 1;
            }

            // An error norm of zero maps to the growth cap and an
            // infinite one to the shrink cap, so no special cases.
            let factor = (SAFETY * err_norm.powf(-0.2)).clamp(MIN_FACTOR, MAX_FACTOR);
            dt = (step * factor).min(span.duration());
        }

        log::debug!(
            "RK45 finished: {accepted} accepted of {attempted} attempted steps, final dt {dt:.3e}"
        );

        // ====== Step 4: Build result ======

        let mut solution = Solution::new(times, states, state);
        solution.add_metadata("solver", self.name());
        solution.add_metadata("steps accepted", accepted.to_string());
        solution.add_metadata("steps attempted", attempted.to_string());
        solution.add_metadata("function evaluations", (6 * attempted).to_string());
        solution.add_metadata("final step size", dt.to_string());
        Ok(solution)
    }

    fn name(&self) -> &'static str {
        "Runge-Kutta-Fehlberg 45"
    }
}

// =================================================================================================
// Tests
// =================================================================================================
