//! Finite-volume spatial method.
//!
//! # Mathematical Background
//!
//! The finite-volume method integrates a conservation law over each cell
//! and applies the divergence theorem, so the divergence of a flux N in a
//! cell i reduces to a flux balance over its faces:
//!
//! ```text
//!   (∇·N)ᵢ ≈ (A_{i+1} N_{i+1} − A_i N_i) / Vᵢ
//! ```
//!
//! with face areas A and cell volumes V taken from the mesh's coordinate
//! system (spherical: A = r², V = (r_out³ − r_in³)/3, both up to the
//! common 4π). Gradients are evaluated at faces from the two adjacent
//! cell centres:
//!
//! ```text
//!   (∇c)_{j} ≈ (c_j − c_{j−1}) / (x_j − x_{j−1})
//! ```
//!
//! Boundary faces carry no neighbouring pair, which is exactly where
//! boundary conditions enter: a Neumann condition *is* the face gradient
//! and is injected unchanged, so a prescribed surface flux appears in the
//! adjacent cell's balance without approximation. A Dirichlet condition
//! fixes the edge value and yields the face gradient through a ghost
//! point mirrored across the edge.
//!
//! Field values *at* an edge (for surface quantities and Dirichlet-free
//! post-processing) come from linear extrapolation of the two nearest
//! cell centres, which on a uniform mesh gives the familiar
//! `1.5·c_last − 0.5·c_previous`.

use nalgebra::DVector;

use crate::discretization::traits::{
    BoundaryValueStencil, DivergenceStencil, GradientStencil, SpatialMethod,
};
use crate::mesh::Mesh1D;
use crate::symbolic::DomainSide;

/// The finite-volume method.
///
/// Stateless; one instance may serve any number of domains.
#[derive(Debug, Clone, Copy, Default)]
pub struct FiniteVolume;

impl FiniteVolume {
    pub fn new() -> Self {
        Self
    }
}

impl SpatialMethod for FiniteVolume {
    fn name(&self) -> &'static str {
        "finite volume"
    }

    fn gradient(&self, mesh: &Mesh1D) -> GradientStencil {
        let nodes = mesh.nodes();
        let edges = mesh.edges();
        let n = mesh.n_cells();

        let interior_inv = DVector::from_fn(n + 1, |j, _| {
            if j == 0 || j == n {
                0.0
            } else {
                1.0 / (nodes[j] - nodes[j - 1])
            }
        });

        GradientStencil {
            interior_inv,
            left_gap_inv: 1.0 / (nodes[0] - edges[0]),
            right_gap_inv: 1.0 / (edges[n] - nodes[n - 1]),
        }
    }

    fn divergence(&self, mesh: &Mesh1D) -> DivergenceStencil {
        DivergenceStencil {
            face_areas: mesh.face_areas().clone(),
            inv_volumes: mesh.cell_volumes().map(|v| 1.0 / v),
        }
    }

    fn boundary_value(&self, mesh: &Mesh1D, side: DomainSide) -> BoundaryValueStencil {
        let nodes = mesh.nodes();
        let n = mesh.n_cells();

        if n < 2 {
            return BoundaryValueStencil {
                index_near: 0,
                index_far: 0,
                weight_near: 1.0,
                weight_far: 0.0,
            };
        }

        let (index_near, index_far, edge) = match side {
            DomainSide::Left => (0, 1, mesh.edges()[0]),
            DomainSide::Right => (n - 1, n - 2, mesh.edges()[n]),
        };
        let x_near = nodes[index_near];
        let x_far = nodes[index_far];
        let weight_near = (edge - x_far) / (x_near - x_far);

        BoundaryValueStencil {
            index_near,
            index_far,
            weight_near,
            weight_far: 1.0 - weight_near,
        }
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{CoordinateRange, CoordinateSystem, DomainGeometry, SubmeshType};
    use approx::assert_relative_eq;

    fn uniform_sphere_mesh(cells: usize) -> Mesh1D {
        let geometry = DomainGeometry::new(
            CoordinateSystem::SphericalPolar,
            CoordinateRange::new("r", 0.0, 1.0),
        );
        Mesh1D::generate("particle", &geometry, SubmeshType::Uniform1D, cells)
    }

    // ===== Gradient =====

    #[test]
    fn test_gradient_interior_spacing_on_uniform_mesh() {
        let mesh = uniform_sphere_mesh(10);
        let stencil = FiniteVolume::new().gradient(&mesh);
        // Neighbouring nodes are dr apart.
        for j in 1..10 {
            assert_relative_eq!(stencil.interior_inv[j], 10.0, epsilon = 1e-10);
        }
        assert_eq!(stencil.interior_inv[0], 0.0);
        assert_eq!(stencil.interior_inv[10], 0.0);
    }

    #[test]
    fn test_gradient_boundary_gaps() {
        let mesh = uniform_sphere_mesh(10);
        let stencil = FiniteVolume::new().gradient(&mesh);
        // First node sits half a cell from the edge.
        assert_relative_eq!(stencil.left_gap_inv, 20.0, epsilon = 1e-10);
        assert_relative_eq!(stencil.right_gap_inv, 20.0, epsilon = 1e-10);
    }

    // ===== Divergence =====

    #[test]
    fn test_divergence_measures_match_mesh() {
        let mesh = uniform_sphere_mesh(5);
        let stencil = FiniteVolume::new().divergence(&mesh);
        assert_eq!(stencil.face_areas.len(), 6);
        assert_eq!(stencil.inv_volumes.len(), 5);
        for i in 0..5 {
            assert_relative_eq!(
                stencil.inv_volumes[i] * mesh.cell_volumes()[i],
                1.0,
                epsilon = 1e-12
            );
        }
    }

    // ===== Boundary values =====

    #[test]
    fn test_boundary_value_weights_uniform_right() {
        let mesh = uniform_sphere_mesh(20);
        let stencil = FiniteVolume::new().boundary_value(&mesh, DomainSide::Right);
        assert_eq!(stencil.index_near, 19);
        assert_eq!(stencil.index_far, 18);
        assert_relative_eq!(stencil.weight_near, 1.5, epsilon = 1e-10);
        assert_relative_eq!(stencil.weight_far, -0.5, epsilon = 1e-10);
    }

    #[test]
    fn test_boundary_value_weights_uniform_left() {
        let mesh = uniform_sphere_mesh(20);
        let stencil = FiniteVolume::new().boundary_value(&mesh, DomainSide::Left);
        assert_eq!(stencil.index_near, 0);
        assert_eq!(stencil.index_far, 1);
        assert_relative_eq!(stencil.weight_near, 1.5, epsilon = 1e-10);
        assert_relative_eq!(stencil.weight_far, -0.5, epsilon = 1e-10);
    }

    #[test]
    fn test_boundary_value_exact_for_linear_field() {
        let mesh = uniform_sphere_mesh(8);
        let stencil = FiniteVolume::new().boundary_value(&mesh, DomainSide::Right);
        // Field c(r) = 2r + 1 must extrapolate to its exact edge value.
        let cells = mesh.nodes().map(|r| 2.0 * r + 1.0);
        assert_relative_eq!(stencil.apply(&cells), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_boundary_value_uniform_field_is_exact() {
        let mesh = uniform_sphere_mesh(20);
        let stencil = FiniteVolume::new().boundary_value(&mesh, DomainSide::Right);
        let cells = nalgebra::DVector::from_element(20, 0.9);
        assert_relative_eq!(stencil.apply(&cells), 0.9, epsilon = 1e-14);
    }

    #[test]
    fn test_boundary_value_single_cell_degenerates() {
        let mesh = uniform_sphere_mesh(1);
        let stencil = FiniteVolume::new().boundary_value(&mesh, DomainSide::Right);
        let cells = nalgebra::DVector::from_element(1, 0.4);
        assert_relative_eq!(stencil.apply(&cells), 0.4);
    }
}
