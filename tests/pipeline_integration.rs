//! Integration tests: the full pipeline from symbolic model to solution
//!
//! These tests run the single-particle model through meshing,
//! discretization, and time integration together, checking the
//! structural guarantees each stage makes to the next.

use std::collections::HashMap;

use approx::assert_relative_eq;
use bamm_rs::discretization::{Discretization, DiscretizedSystem, FiniteVolume};
use bamm_rs::error::{BammError, GeometryError, ModelError};
use bamm_rs::mesh::{DomainGeometry, Geometry, Mesh, SubmeshType};
use bamm_rs::models::SphericalDiffusion;
use bamm_rs::simulation::Simulation;
use bamm_rs::solver::{OdeSystem, RK45Solver, TimeSpan};
use bamm_rs::symbolic::{grad, BoundaryKind, DomainSide, Model, Variable};

mod common;
use common::particle_simulation;

/// Builds the particle mesh by hand so tests can inspect it alongside
/// the discretized system.
fn meshed_particle(particle: &SphericalDiffusion, cells: usize) -> (Mesh, DiscretizedSystem) {
    let submeshes = HashMap::from([(
        SphericalDiffusion::DOMAIN.to_string(),
        SubmeshType::Uniform1D,
    )]);
    let points = HashMap::from([(SphericalDiffusion::COORDINATE.to_string(), cells)]);
    let mesh = Mesh::new(&particle.geometry(), &submeshes, &points).unwrap();

    let system = Discretization::new(mesh.clone())
        .with_method(SphericalDiffusion::DOMAIN, FiniteVolume::new())
        .process_model(&particle.model(), &particle.parameter_values())
        .unwrap();
    (mesh, system)
}

// =================================================================================================
// Mesh Guarantees
// =================================================================================================

#[test]
fn test_mesh_resolution_and_determinism() {
    let (mesh, system) = meshed_particle(&SphericalDiffusion::new(), 20);
    let submesh = mesh.get(SphericalDiffusion::DOMAIN).unwrap();

    assert_eq!(submesh.n_cells(), 20);
    assert_eq!(submesh.n_faces(), 21);
    assert_eq!(system.state_size(), 20);

    let edges = submesh.edges();
    assert_eq!(edges[0], 0.0);
    assert_eq!(edges[20], 1.0);
    for i in 0..20 {
        assert!(edges[i + 1] > edges[i]);
    }

    // Regenerating from the same inputs reproduces the mesh exactly.
    let (again, _) = meshed_particle(&SphericalDiffusion::new(), 20);
    let again = again.get(SphericalDiffusion::DOMAIN).unwrap();
    assert_eq!(submesh.edges(), again.edges());
    assert_eq!(submesh.cell_volumes(), again.cell_volumes());
}

// =================================================================================================
// Spatial Operator Guarantees
// =================================================================================================

#[test]
fn test_uniform_field_has_zero_laplacian() {
    // With the surface flux switched off, a spatially uniform state is
    // an equilibrium: every gradient vanishes, including at the
    // boundaries.
    let particle = SphericalDiffusion::new().with_flux_scale(0.0);
    let system = Simulation::new(particle.model(), particle.geometry())
        .with_parameter_values(particle.parameter_values())
        .with_points(SphericalDiffusion::COORDINATE, 20)
        .build()
        .unwrap();

    let state = system.initial_state_vector().clone();
    let rhs = system.rhs(0.0, &state);
    for value in rhs.iter() {
        assert!(value.abs() < 1e-12, "expected equilibrium, got {value}");
    }
}

#[test]
fn test_surface_flux_drains_exactly_what_it_injects() {
    // The finite volume divergence telescopes over the mesh, so the
    // volume-weighted sum of the rhs equals the flux through the
    // surface: -j(c_surf) with j = j0 √(1-c) √c at c = 0.9.
    let (mesh, system) = meshed_particle(&SphericalDiffusion::new(), 20);
    let submesh = mesh.get(SphericalDiffusion::DOMAIN).unwrap();

    let state = system.initial_state_vector().clone();
    let rhs = system.rhs(0.0, &state);
    let total = rhs.dot(submesh.cell_volumes());

    assert_relative_eq!(total, -0.24, epsilon = 1e-12);

    // The identity holds for any parameter values; at c0 = 0.5 the
    // flux peaks, j = 1.3 · √0.5 · √0.5 = 0.65.
    let half_full = SphericalDiffusion::new()
        .with_initial_concentration(0.5)
        .with_flux_scale(1.3);
    let (mesh, system) = meshed_particle(&half_full, 20);
    let submesh = mesh.get(SphericalDiffusion::DOMAIN).unwrap();

    let rhs = system.rhs(0.0, system.initial_state_vector());
    let total = rhs.dot(submesh.cell_volumes());

    assert_relative_eq!(total, -0.65, epsilon = 1e-12);
}

// =================================================================================================
// End-to-End Solve
// =================================================================================================

#[test]
fn test_particle_discharge_end_to_end() {
    let solution = particle_simulation(20)
        .solve(&RK45Solver::new(), TimeSpan::new(0.0, 1.0))
        .unwrap();

    // Sampled times cover the span inclusively and monotonically.
    assert_eq!(solution.times()[0], 0.0);
    assert_eq!(*solution.times().last().unwrap(), 1.0);
    for pair in solution.times().windows(2) {
        assert!(pair[1] > pair[0]);
    }

    // The surface starts at the initial concentration and drains.
    let surface = solution
        .variable(SphericalDiffusion::SURFACE_CONCENTRATION)
        .unwrap();
    let values = surface.as_scalars().unwrap();
    assert_relative_eq!(values[0], 0.9, epsilon = 1e-12);
    assert!(values.last().unwrap() < &values[0]);

    // Concentrations stay physical everywhere, within solver tolerance.
    let concentration = solution
        .variable(SphericalDiffusion::CONCENTRATION)
        .unwrap();
    for profile in concentration.as_profiles().unwrap() {
        for value in profile.iter() {
            assert!(
                (-1e-6..=1.0 + 1e-6).contains(value),
                "concentration {value} left [0, 1]"
            );
        }
    }
}

// =================================================================================================
// Failure Modes Across Stages
// =================================================================================================

#[test]
fn test_reversed_bounds_rejected_at_meshing() {
    let geometry =
        Geometry::new().with_domain("particle", DomainGeometry::spherical("r", 1.0, 0.0));
    let submeshes = HashMap::from([("particle".to_string(), SubmeshType::Uniform1D)]);
    let points = HashMap::from([("r".to_string(), 10usize)]);

    let result = Mesh::new(&geometry, &submeshes, &points);
    assert!(matches!(
        result,
        Err(GeometryError::InvalidBounds { .. })
    ));
}

#[test]
fn test_missing_initial_condition_rejected_at_discretization() {
    let particle = SphericalDiffusion::new();
    let c = Variable::new("c", SphericalDiffusion::DOMAIN);
    let mut model = Model::new("incomplete");
    model.set_rhs(&c, 1.0);

    let result = Simulation::new(model, particle.geometry()).build();
    assert!(matches!(
        result,
        Err(BammError::Model(ModelError::MissingInitialCondition { .. }))
    ));
}

#[test]
fn test_missing_boundary_conditions_rejected_at_discretization() {
    let particle = SphericalDiffusion::new();
    let c = Variable::new("c", SphericalDiffusion::DOMAIN);
    let mut model = Model::new("half bounded");
    model.set_rhs(&c, grad(&c));
    model.set_boundary_condition(&c, DomainSide::Left, 0.0, BoundaryKind::Neumann);
    model.set_initial_condition(&c, 1.0);

    let result = Simulation::new(model, particle.geometry()).build();
    assert!(matches!(
        result,
        Err(BammError::Model(ModelError::MissingBoundaryConditions { .. }))
    ));
}
