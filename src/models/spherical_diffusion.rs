//! Diffusion in a spherical particle with a reaction flux at the surface
//!
//! # Mathematical Background
//!
//! The model tracks a dimensionless concentration `c(r, t)` inside a
//! unit sphere:
//!
//! ```text
//! ∂c/∂t = -∇·N        N = -∇c          (Fickian flux)
//!
//! N = 0               at r = 0          (symmetry)
//! N = j               at r = 1          (surface reaction)
//!
//! j = j₀ √(1 - c) √c  evaluated at the surface
//! ```
//!
//! The surface flux follows Butler-Volmer-style kinetics: it vanishes
//! when the particle is empty (`c = 0`) or full (`c = 1`) and peaks at
//! half occupancy. A positive `j` drains the particle, so starting from
//! a uniform `c₀ = 0.9` the concentration decays toward the flux zero.
//!
//! # Example
//!
//! ```
//! use bamm_rs::models::SphericalDiffusion;
//!
//! let particle = SphericalDiffusion::new();
//! let model = particle.model();
//! assert_eq!(model.name(), "spherical diffusion");
//! assert!(model.validate().is_ok());
//! ```

use crate::mesh::{DomainGeometry, Geometry};
use crate::symbolic::{
    div, grad, surf, BoundaryKind, DomainSide, Expression, Model, Parameter, ParameterValues,
    Variable,
};

// =================================================================================================
// Spherical Diffusion
// =================================================================================================

/// Prebuilt single-particle diffusion model.
///
/// Bundles the symbolic equations, the spherical geometry they live on,
/// and a consistent set of parameter values, so a working simulation
/// needs nothing beyond a mesh resolution and a solver.
#[derive(Debug, Clone, Copy)]
pub struct SphericalDiffusion {
    initial_concentration: f64,
    flux_scale: f64,
}

impl SphericalDiffusion {
    /// Domain the concentration lives on.
    pub const DOMAIN: &'static str = "particle";
    /// Radial coordinate of the particle.
    pub const COORDINATE: &'static str = "r";
    /// Output name for the full concentration profile.
    pub const CONCENTRATION: &'static str = "Concentration";
    /// Output name for the concentration at the particle surface.
    pub const SURFACE_CONCENTRATION: &'static str = "Surface concentration";

    /// Creates the model with `c₀ = 0.9` and `j₀ = 0.8`.
    pub fn new() -> Self {
        Self {
            initial_concentration: 0.9,
            flux_scale: 0.8,
        }
    }

    /// Sets the uniform initial concentration `c₀`.
    ///
    /// # Panics
    ///
    /// Panics outside `[0, 1]`, where the surface flux is undefined.
    pub fn with_initial_concentration(mut self, c0: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&c0),
            "initial concentration must lie in [0, 1], got {c0}"
        );
        self.initial_concentration = c0;
        self
    }

    /// Sets the surface flux scale `j₀`.
    ///
    /// # Panics
    ///
    /// Panics when `j0` is not finite.
    pub fn with_flux_scale(mut self, j0: f64) -> Self {
        assert!(j0.is_finite(), "flux scale must be finite, got {j0}");
        self.flux_scale = j0;
        self
    }

    #[inline]
    pub fn initial_concentration(&self) -> f64 {
        self.initial_concentration
    }

    #[inline]
    pub fn flux_scale(&self) -> f64 {
        self.flux_scale
    }

    /// Builds the symbolic model: equations, boundary conditions,
    /// initial condition, and named outputs.
    pub fn model(&self) -> Model {
        let c = Variable::new("c", Self::DOMAIN);
        let j0 = Parameter::new("j0");

        let mut model = Model::new("spherical diffusion");

        let flux = -grad(&c);
        model.set_rhs(&c, -div(flux));

        // Symmetry at the centre, reaction flux at the surface. The
        // flux N = j points outward, and the Neumann value prescribes
        // the gradient of c, so the surface condition reads -j.
        let j = Expression::from(&j0) * (1.0 - surf(&c)).sqrt() * surf(&c).sqrt();
        model.set_boundary_condition(&c, DomainSide::Left, 0.0, BoundaryKind::Neumann);
        model.set_boundary_condition(&c, DomainSide::Right, -j, BoundaryKind::Neumann);

        model.set_initial_condition(&c, Parameter::new("c0"));

        model.add_output(Self::CONCENTRATION, &c);
        model.add_output(Self::SURFACE_CONCENTRATION, surf(&c));
        model
    }

    /// The unit sphere the model is posed on.
    pub fn geometry(&self) -> Geometry {
        Geometry::new().with_domain(
            Self::DOMAIN,
            DomainGeometry::spherical(Self::COORDINATE, 0.0, 1.0),
        )
    }

    /// Parameter values matching this configuration.
    pub fn parameter_values(&self) -> ParameterValues {
        ParameterValues::new()
            .with("c0", self.initial_concentration)
            .with("j0", self.flux_scale)
    }
}

impl Default for SphericalDiffusion {
    fn default() -> Self {
        Self::new()
    }
}

// =================================================================================================
// Tests
// =================================================================================================
