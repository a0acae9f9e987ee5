//! One-stop pipeline from symbolic model to solved trajectories
//!
//! [`Simulation`] wires the stages of the crate together with sensible
//! defaults: every domain gets a uniform submesh, a finite volume
//! discretization, and 20 cells per coordinate unless told otherwise.
//! Each default can be overridden per domain or per coordinate without
//! touching the rest.
//!
//! # Example
//!
//! ```
//! use bamm_rs::models::SphericalDiffusion;
//! use bamm_rs::simulation::Simulation;
//! use bamm_rs::solver::{RK45Solver, TimeSpan};
//!
//! let particle = SphericalDiffusion::new();
//! let solution = Simulation::new(particle.model(), particle.geometry())
//!     .with_parameter_values(particle.parameter_values())
//!     .with_points(SphericalDiffusion::COORDINATE, 20)
//!     .solve(&RK45Solver::new(), TimeSpan::new(0.0, 1.0))?;
//!
//! let surface = solution.variable(SphericalDiffusion::SURFACE_CONCENTRATION)?;
//! assert!((surface.as_scalars().unwrap()[0] - 0.9).abs() < 1e-12);
//! # Ok::<(), bamm_rs::error::BammError>(())
//! ```

use std::collections::HashMap;

use crate::discretization::{Discretization, DiscretizedSystem, FiniteVolume, SpatialMethod};
use crate::error::BammResult;
use crate::mesh::{Geometry, Mesh, SubmeshType};
use crate::solver::{Solution, Solver, TimeSpan};
use crate::symbolic::{Model, ParameterValues};

/// Cells per coordinate when no resolution is requested.
const DEFAULT_POINTS: usize = 20;

// =================================================================================================
// Simulation
// =================================================================================================

/// Builder assembling a mesh, a discretization, and parameter values
/// around a symbolic model.
///
/// Construction never fails; problems surface from [`build`](Self::build)
/// or [`solve`](Self::solve) as the staged error of the pipeline stage
/// that rejected the input.
pub struct Simulation {
    model: Model,
    geometry: Geometry,
    parameter_values: ParameterValues,
    submesh_types: HashMap<String, SubmeshType>,
    points: HashMap<String, usize>,
    methods: HashMap<String, Box<dyn SpatialMethod>>,
}

impl Simulation {
    pub fn new(model: Model, geometry: Geometry) -> Self {
        Self {
            model,
            geometry,
            parameter_values: ParameterValues::new(),
            submesh_types: HashMap::new(),
            points: HashMap::new(),
            methods: HashMap::new(),
        }
    }

    /// Replaces the parameter values used during discretization.
    pub fn with_parameter_values(mut self, values: ParameterValues) -> Self {
        self.parameter_values = values;
        self
    }

    /// Sets a single parameter, keeping the others.
    pub fn with_parameter(mut self, name: impl Into<String>, value: f64) -> Self {
        self.parameter_values.set(name, value);
        self
    }

    /// Overrides the submesh type for one domain.
    pub fn with_submesh_type(mut self, domain: impl Into<String>, submesh: SubmeshType) -> Self {
        self.submesh_types.insert(domain.into(), submesh);
        self
    }

    /// Overrides the cell count for one coordinate.
    pub fn with_points(mut self, coordinate: impl Into<String>, points: usize) -> Self {
        self.points.insert(coordinate.into(), points);
        self
    }

    /// Overrides the spatial method for one domain.
    pub fn with_spatial_method(
        mut self,
        domain: impl Into<String>,
        method: impl SpatialMethod + 'static,
    ) -> Self {
        self.methods.insert(domain.into(), Box::new(method));
        self
    }

    #[inline]
    pub fn model(&self) -> &Model {
        &self.model
    }

    #[inline]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[inline]
    pub fn parameter_values(&self) -> &ParameterValues {
        &self.parameter_values
    }

    /// Meshes the geometry and discretizes the model.
    ///
    /// Unset options fall back to their defaults here, not earlier, so
    /// overrides can arrive in any order.
    pub fn build(self) -> BammResult<DiscretizedSystem> {
        let mut submesh_types = self.submesh_types;
        let mut points = self.points;
        for (name, domain) in self.geometry.iter() {
            submesh_types
                .entry(name.clone())
                .or_insert(SubmeshType::Uniform1D);
            points
                .entry(domain.coordinate().name().to_string())
                .or_insert(DEFAULT_POINTS);
        }

        let mesh = Mesh::new(&self.geometry, &submesh_types, &points)?;

        let mut discretization = Discretization::new(mesh);
        let mut methods = self.methods;
        for (name, _) in self.geometry.iter() {
            let method = methods
                .remove(name)
                .unwrap_or_else(|| Box::new(FiniteVolume::new()));
            discretization.insert_method(name.clone(), method);
        }

        let system = discretization.process_model(&self.model, &self.parameter_values)?;
        Ok(system)
    }

    /// Builds the system and integrates it over `span`.
    pub fn solve(self, solver: &dyn Solver, span: TimeSpan) -> BammResult<Solution> {
        let system = self.build()?;
        let solution = system.solve(solver, span)?;
        Ok(solution)
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BammError, ModelError};
    use crate::models::SphericalDiffusion;
    use crate::solver::RK4Solver;
    use crate::symbolic::{BoundaryKind, DomainSide, Variable};
    use approx::assert_relative_eq;

    fn particle_simulation() -> Simulation {
        let particle = SphericalDiffusion::new();
        Simulation::new(particle.model(), particle.geometry())
            .with_parameter_values(particle.parameter_values())
    }

    // ====== Defaults ======

    #[test]
    fn test_defaults_fill_in() {
        let system = particle_simulation().build().unwrap();
        assert_eq!(system.state_size(), DEFAULT_POINTS);
    }

    #[test]
    fn test_points_override() {
        let system = particle_simulation()
            .with_points(SphericalDiffusion::COORDINATE, 50)
            .build()
            .unwrap();
        assert_eq!(system.state_size(), 50);
    }

    #[test]
    fn test_parameter_override() {
        let system = particle_simulation()
            .with_parameter("c0", 0.25)
            .build()
            .unwrap();
        for value in system.initial_state_vector().iter() {
            assert_eq!(*value, 0.25);
        }
    }

    // ====== Error propagation ======

    #[test]
    fn test_missing_parameter_surfaces_as_model_error() {
        let particle = SphericalDiffusion::new();
        let result = Simulation::new(particle.model(), particle.geometry()).build();
        assert!(matches!(
            result,
            Err(BammError::Model(ModelError::MissingParameter { .. }))
        ));
    }

    #[test]
    fn test_incomplete_model_rejected() {
        let particle = SphericalDiffusion::new();
        let c = Variable::new("c", SphericalDiffusion::DOMAIN);
        let mut model = Model::new("no initial condition");
        model.set_rhs(&c, 0.0);
        model.set_boundary_condition(&c, DomainSide::Left, 0.0, BoundaryKind::Neumann);
        model.set_boundary_condition(&c, DomainSide::Right, 0.0, BoundaryKind::Neumann);

        let result = Simulation::new(model, particle.geometry()).build();
        assert!(matches!(
            result,
            Err(BammError::Model(ModelError::MissingInitialCondition { .. }))
        ));
    }

    // ====== End to end ======

    #[test]
    fn test_short_solve_produces_trajectories() {
        let solver = RK4Solver::new(200);
        let solution = particle_simulation()
            .with_points(SphericalDiffusion::COORDINATE, 10)
            .solve(&solver, TimeSpan::new(0.0, 0.1))
            .unwrap();

        assert_eq!(solution.len(), 201);
        let surface = solution
            .variable(SphericalDiffusion::SURFACE_CONCENTRATION)
            .unwrap();
        let values = surface.as_scalars().unwrap();
        assert_relative_eq!(values[0], 0.9, epsilon = 1e-12);
        // The reaction flux drains the particle.
        assert!(values.last().unwrap() < &0.9);
    }
}
