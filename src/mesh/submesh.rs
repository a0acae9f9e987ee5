//! 1-D submesh generation.
//!
//! A submesh is the discretized form of one domain: N+1 edges enclosing N
//! cells, with nodes at cell centres. Edge placement is strategy-driven
//! through [`SubmeshType`]; everything downstream (volumes, face areas,
//! spacings) is derived from the edges and the domain's coordinate
//! system, so every strategy automatically gets consistent finite-volume
//! measures.
//!
//! Generation is deterministic: the same geometry, strategy and point
//! count always reproduce the same coordinates, and both end edges land
//! exactly on the domain bounds.

use nalgebra::DVector;

use crate::mesh::geometry::{CoordinateSystem, DomainGeometry};

// =================================================================================================
// Submesh strategies
// =================================================================================================

/// Edge-placement strategy for a 1-D domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmeshType {
    /// Equally spaced edges.
    Uniform1D,
    /// Chebyshev-Gauss-Lobatto edges, clustered towards both boundaries.
    /// Useful when boundary layers need resolving without raising the
    /// global cell count.
    Chebyshev1D,
}

impl SubmeshType {
    /// Generates the `cells + 1` edge coordinates over `[min, max]`.
    fn edges(&self, min: f64, max: f64, cells: usize) -> DVector<f64> {
        let n = cells;
        DVector::from_fn(n + 1, |j, _| {
            if j == 0 {
                min
            } else if j == n {
                max
            } else {
                let fraction = match self {
                    SubmeshType::Uniform1D => j as f64 / n as f64,
                    SubmeshType::Chebyshev1D => {
                        (1.0 - (std::f64::consts::PI * j as f64 / n as f64).cos()) / 2.0
                    }
                };
                min * (1.0 - fraction) + max * fraction
            }
        })
    }
}

impl std::fmt::Display for SubmeshType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmeshType::Uniform1D => write!(f, "uniform"),
            SubmeshType::Chebyshev1D => write!(f, "chebyshev"),
        }
    }
}

// =================================================================================================
// Mesh1D
// =================================================================================================

/// The mesh of a single domain.
///
/// Beyond the raw coordinates this precomputes the geometric factors the
/// finite-volume stencils consume on every evaluation: per-face areas and
/// per-cell volumes consistent with the coordinate system.
#[derive(Debug, Clone)]
pub struct Mesh1D {
    domain: String,
    coordinate: String,
    coordinate_system: CoordinateSystem,
    edges: DVector<f64>,
    nodes: DVector<f64>,
    face_areas: DVector<f64>,
    cell_volumes: DVector<f64>,
}

impl Mesh1D {
    /// Builds a mesh from its edges.
    ///
    /// # Panics
    ///
    /// Panics if fewer than two edges are supplied or if the edges are not
    /// strictly increasing. Edge generation inside this crate upholds
    /// both; the assertions guard direct construction.
    pub fn new(
        domain: impl Into<String>,
        coordinate: impl Into<String>,
        coordinate_system: CoordinateSystem,
        edges: DVector<f64>,
    ) -> Self {
        assert!(
            edges.len() >= 2,
            "a mesh needs at least two edges (one cell), got {}",
            edges.len()
        );
        for j in 1..edges.len() {
            assert!(
                edges[j] > edges[j - 1],
                "mesh edges must be strictly increasing: edge[{}] = {} after edge[{}] = {}",
                j,
                edges[j],
                j - 1,
                edges[j - 1]
            );
        }

        let cells = edges.len() - 1;
        let nodes = DVector::from_fn(cells, |i, _| (edges[i] + edges[i + 1]) / 2.0);
        let face_areas = DVector::from_fn(cells + 1, |j, _| coordinate_system.face_area(edges[j]));
        let cell_volumes = DVector::from_fn(cells, |i, _| {
            coordinate_system.cell_volume(edges[i], edges[i + 1])
        });

        Self {
            domain: domain.into(),
            coordinate: coordinate.into(),
            coordinate_system,
            edges,
            nodes,
            face_areas,
            cell_volumes,
        }
    }

    /// Generates the mesh for one domain of a geometry.
    pub fn generate(
        domain: impl Into<String>,
        geometry: &DomainGeometry,
        submesh_type: SubmeshType,
        cells: usize,
    ) -> Self {
        let range = geometry.coordinate();
        let edges = submesh_type.edges(range.min(), range.max(), cells);
        Self::new(
            domain,
            range.name(),
            geometry.coordinate_system(),
            edges,
        )
    }

    #[inline]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    #[inline]
    pub fn coordinate(&self) -> &str {
        &self.coordinate
    }

    #[inline]
    pub fn coordinate_system(&self) -> CoordinateSystem {
        self.coordinate_system
    }

    /// Number of cells (equals the number of nodes).
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.nodes.len()
    }

    /// Number of faces (always `n_cells() + 1`).
    #[inline]
    pub fn n_faces(&self) -> usize {
        self.edges.len()
    }

    /// Cell boundary coordinates, strictly increasing.
    #[inline]
    pub fn edges(&self) -> &DVector<f64> {
        &self.edges
    }

    /// Cell centre coordinates.
    #[inline]
    pub fn nodes(&self) -> &DVector<f64> {
        &self.nodes
    }

    /// Face areas consistent with the coordinate system.
    #[inline]
    pub fn face_areas(&self) -> &DVector<f64> {
        &self.face_areas
    }

    /// Cell volumes consistent with the coordinate system.
    #[inline]
    pub fn cell_volumes(&self) -> &DVector<f64> {
        &self.cell_volumes
    }

    /// Domain extent; the length scale attached to processed variables.
    #[inline]
    pub fn length_scale(&self) -> f64 {
        self.edges[self.edges.len() - 1] - self.edges[0]
    }

    /// Volume-weighted integral of a cell field over the domain, up to
    /// the coordinate system's angular factor.
    pub fn integrate(&self, cell_values: &DVector<f64>) -> f64 {
        assert_eq!(
            cell_values.len(),
            self.n_cells(),
            "field length {} does not match the mesh's {} cells",
            cell_values.len(),
            self.n_cells()
        );
        self.cell_volumes.dot(cell_values)
    }
}

// ==================== Tests ====================
