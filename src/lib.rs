//! bamm-rs: Battery Modelling Framework
//!
//! A pipeline for continuum battery models: write the governing
//! equations symbolically, discretize them over a 1-D mesh with finite
//! volumes, and integrate the resulting ODE system with Runge-Kutta
//! solvers.
//!
//! # Architecture
//!
//! bamm-rs is built on two core principles:
//!
//! 1. **Separation of Model and Numerics**
//!    - Symbolic models define equations (what to solve)
//!    - Meshes, spatial methods, and solvers provide the numerics
//!      (how to solve)
//!
//! 2. **Staged Pipeline with Staged Errors**
//!    - Each stage validates its own input and has its own error type
//!    - A broken model is reported before meshing, a broken mesh
//!      before time integration
//!
//! # Quick Start
//!
//! ```rust
//! use bamm_rs::models::SphericalDiffusion;
//! use bamm_rs::simulation::Simulation;
//! use bamm_rs::solver::{RK45Solver, Solver, TimeSpan};
//!
//! // 1. Pick a model: equations, geometry, and parameters.
//! let particle = SphericalDiffusion::new();
//!
//! // 2. Assemble the pipeline; defaults cover mesh and method choices.
//! let simulation = Simulation::new(particle.model(), particle.geometry())
//!     .with_parameter_values(particle.parameter_values())
//!     .with_points(SphericalDiffusion::COORDINATE, 20);
//!
//! // 3. Integrate over one dimensionless time unit.
//! let solver = RK45Solver::new();
//! let solution = simulation.solve(&solver, TimeSpan::new(0.0, 1.0))?;
//!
//! // 4. Pull out a named trajectory.
//! let surface = solution.variable(SphericalDiffusion::SURFACE_CONCENTRATION)?;
//! println!("sampled {} times", surface.len());
//! # Ok::<(), bamm_rs::error::BammError>(())
//! ```
//!
//! # Modules
//!
//! - [`symbolic`]: Expression trees and model definitions (equations)
//! - [`mesh`]: Geometry and 1-D submeshes
//! - [`discretization`]: Finite volume lowering to an ODE system
//! - [`solver`]: Runge-Kutta time integration
//! - [`models`]: Prebuilt battery models
//! - [`simulation`]: One-stop pipeline wiring
//! - [`output`]: Result export
//! - [`error`]: Staged error types

// Core modules
pub mod discretization;
pub mod error;
pub mod mesh;
pub mod models;
pub mod output;
pub mod simulation;
pub mod solver;
pub mod symbolic;

pub mod prelude {
    //! Convenient imports for common usage
    //!
    //! ```rust
    //!
    //! use bamm_rs::prelude::*;
    //! ```
    pub use crate::discretization::{Discretization, DiscretizedSystem, FiniteVolume};
    pub use crate::error::{BammError, BammResult};
    pub use crate::mesh::{DomainGeometry, Geometry, Mesh, SubmeshType};
    pub use crate::models::SphericalDiffusion;
    pub use crate::simulation::Simulation;
    pub use crate::solver::{
        EulerSolver, RK45Solver, RK4Solver, Solution, Solver, TimeSpan,
    };
    pub use crate::symbolic::{
        div, grad, surf, BoundaryKind, DomainSide, Expression, Model, Parameter,
        ParameterValues, Variable,
    };
}
