//! The spatial-method interface.
//!
//! A spatial method answers three questions about one mesh: how to
//! discretize a gradient (cell field → face field), how to discretize a
//! divergence (face field → cell field), and how to evaluate a cell field
//! at a domain edge. The answers are plain stencil value-objects; the
//! expression compiler owns everything else (boundary-condition wiring,
//! shape checking, evaluation), so a new method only supplies geometry
//! factors.
//!
//! Methods are selected per domain and carried as `Box<dyn SpatialMethod>`
//! by the [`Discretization`](crate::discretization::Discretization).

use nalgebra::DVector;

use crate::mesh::Mesh1D;
use crate::symbolic::DomainSide;

// =================================================================================================
// Stencils
// =================================================================================================

/// Gradient geometry for one mesh.
///
/// Interior face `j` (for `1 ≤ j ≤ n−1`) evaluates to
/// `(c[j] − c[j−1]) · interior_inv[j]`. The two boundary faces are filled
/// from boundary conditions: a Neumann value is injected directly as the
/// face gradient, a Dirichlet value uses the ghost formula
/// `(c_edge_cell − value) · gap_inv` with the sign of the side.
#[derive(Debug, Clone)]
pub struct GradientStencil {
    /// Inverse node spacing per face; entries 0 and n are unused.
    pub interior_inv: DVector<f64>,
    /// `1 / (node₀ − edge₀)`.
    pub left_gap_inv: f64,
    /// `1 / (edgeₙ − node_{n−1})`.
    pub right_gap_inv: f64,
}

/// Divergence geometry for one mesh.
///
/// Cell `i` evaluates to
/// `(A[i+1]·N[i+1] − A[i]·N[i]) · inv_volumes[i]`, which telescopes over
/// the whole domain. That telescoping is what makes the discrete
/// conservation balance exact.
#[derive(Debug, Clone)]
pub struct DivergenceStencil {
    pub face_areas: DVector<f64>,
    pub inv_volumes: DVector<f64>,
}

/// Linear extrapolation of a cell field onto a domain edge.
///
/// Evaluates to `weight_near·c[index_near] + weight_far·c[index_far]`
/// from the two nodes closest to the edge (`1.5 / −0.5` on a uniform
/// mesh). Degenerates to the single cell value on one-cell meshes.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryValueStencil {
    pub index_near: usize,
    pub index_far: usize,
    pub weight_near: f64,
    pub weight_far: f64,
}

impl BoundaryValueStencil {
    /// Applies the stencil to a cell field.
    #[inline]
    pub fn apply(&self, cells: &DVector<f64>) -> f64 {
        self.weight_near * cells[self.index_near] + self.weight_far * cells[self.index_far]
    }
}

// =================================================================================================
// Spatial method trait
// =================================================================================================

/// Per-domain discretization capability.
///
/// Implementations are stateless geometry translators; all state lives in
/// the mesh and in the compiled system.
pub trait SpatialMethod: Send + Sync {
    /// Human-readable method name for logs and metadata.
    fn name(&self) -> &'static str;

    /// Gradient geometry: cell centres → faces.
    fn gradient(&self, mesh: &Mesh1D) -> GradientStencil;

    /// Divergence geometry: faces → cell centres.
    fn divergence(&self, mesh: &Mesh1D) -> DivergenceStencil;

    /// Edge evaluation of a cell field.
    fn boundary_value(&self, mesh: &Mesh1D, side: DomainSide) -> BoundaryValueStencil;
}
