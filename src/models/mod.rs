//! Prebuilt battery models
//!
//! Each entry bundles three things that must stay consistent: the
//! symbolic [`Model`](crate::symbolic::Model), the
//! [`Geometry`](crate::mesh::Geometry) its domains are posed on, and a
//! matching set of [`ParameterValues`](crate::symbolic::ParameterValues).
//! Building a simulation from a catalog entry takes a mesh resolution
//! and a solver; everything else is already wired.
//!
//! # Available Models
//!
//! ## [`SphericalDiffusion`] — single-particle diffusion
//!
//! Lithium transport inside one spherical electrode particle, with a
//! concentration-dependent reaction flux draining the surface. The
//! smallest model that exercises the full pipeline: spherical geometry,
//! a state-dependent boundary condition, and both profile and scalar
//! outputs.

// =================================================================================================
// Module Declarations
// =================================================================================================

pub mod spherical_diffusion;

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use spherical_diffusion::SphericalDiffusion;
