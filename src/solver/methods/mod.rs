//! Numerical methods for solving differential equations
//!
//! This module contains concrete implementations of the
//! [`Solver`](crate::solver::Solver) trait.
//!
//! # Architecture
//!
//! The separation between the abstract solver interface
//! (`solver::traits`) and the concrete implementations
//! (`solver::methods`) keeps the trait stable while new methods are
//! added alongside the existing ones.
//!
//! # Available Methods
//!
//! All three methods are explicit time steppers for non-stiff systems.
//!
//! - **[`EulerSolver`]**: forward Euler
//!   - Order: first, O(dt)
//!   - Cost: 1 function evaluation per step
//!   - Use: prototyping and convergence baselines
//!
//! - **[`RK4Solver`]**: classical fourth-order Runge-Kutta
//!   - Order: fourth, O(dt⁴)
//!   - Cost: 4 function evaluations per step
//!   - Use: fixed-cost production runs with a known safe step size
//!
//! - **[`RK45Solver`]**: Runge-Kutta-Fehlberg with adaptive steps
//!   - Order: fifth (propagated), with an embedded fourth-order error
//!     estimate
//!   - Cost: 6 function evaluations per attempted step
//!   - Use: the default choice; meets a requested tolerance without
//!     manual step-size tuning

pub mod euler;
pub mod rk4;
pub mod rk45;

pub use euler::EulerSolver;
pub use rk4::RK4Solver;
pub use rk45::RK45Solver;
