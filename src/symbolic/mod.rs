//! Symbolic model building
//!
//! This module provides the building blocks for writing continuum models
//! symbolically: expression trees, variables and parameters, and the
//! [`Model`] container that collects equations, boundary conditions,
//! initial conditions and named outputs.
//!
//! # Core Concepts
//!
//! - **Expression**: an immutable, reference-counted node in a shared DAG
//! - **Variable**: a named unknown field on a spatial domain, identified
//!   by a stable [`VariableId`]
//! - **Parameter**: a named scalar placeholder, bound via
//!   [`ParameterValues`] at discretization time
//! - **Model**: the keyed collections tying it all together
//!
//! # Architecture
//!
//! The symbolic layer describes **what** is modelled and knows nothing
//! about meshes or numerics:
//! - the model provides the **equations**
//! - the [discretizer](crate::discretization) lowers them onto a mesh
//! - the [solver](crate::solver) integrates the result in time
//!
//! Nothing here is validated eagerly. A model may be assembled in any
//! order, and consistency is checked once, by [`Model::validate`], when
//! discretization begins.
//!
//! # Example
//!
//! ```rust
//! use bamm_rs::symbolic::{BoundaryKind, DomainSide, Model, Parameter, Variable, div, grad};
//!
//! let c = Variable::new("c", "particle");
//! let c0 = Parameter::new("c0");
//!
//! let mut model = Model::new("diffusion");
//! model.set_rhs(&c, div(grad(&c)));
//! model.set_boundary_condition(&c, DomainSide::Left, 0.0, BoundaryKind::Neumann);
//! model.set_boundary_condition(&c, DomainSide::Right, 0.0, BoundaryKind::Neumann);
//! model.set_initial_condition(&c, &c0);
//!
//! assert_eq!(model.unknowns().len(), 1);
//! ```

// module declarations
pub mod expression;
pub mod model;
pub mod parameters;

// re-export commonly used types for convenience
pub use expression::{div, grad, surf, Expression, Parameter, Variable, VariableId};
pub use model::{
    BoundaryCondition, BoundaryConditionSet, BoundaryKind, DomainSide, Model,
};
pub use parameters::ParameterValues;
