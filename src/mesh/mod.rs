//! Geometry and mesh generation
//!
//! This module turns a symbolic [`Geometry`] — named domains with
//! coordinate bounds and a coordinate system — into per-domain 1-D
//! meshes ready for finite-volume discretization.
//!
//! # Core Concepts
//!
//! - **Geometry**: where the model lives (bounds + coordinate system),
//!   with no resolution attached
//! - **SubmeshType**: how edges are placed (uniform, Chebyshev)
//! - **Mesh1D**: N cells, N+1 edges, nodes at cell centres, precomputed
//!   face areas and cell volumes
//! - **Mesh**: the per-domain collection handed to the discretizer
//!
//! # Conventions
//!
//! A mesh of N cells always has N+1 strictly increasing edges whose first
//! and last coordinates equal the domain bounds exactly. Generation is
//! deterministic.
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use bamm_rs::mesh::{DomainGeometry, Geometry, Mesh, SubmeshType};
//!
//! let geometry = Geometry::new()
//!     .with_domain("particle", DomainGeometry::spherical("r", 0.0, 1.0));
//!
//! let submesh_types = HashMap::from([("particle".to_string(), SubmeshType::Uniform1D)]);
//! let var_points = HashMap::from([("r".to_string(), 20)]);
//!
//! let mesh = Mesh::new(&geometry, &submesh_types, &var_points).unwrap();
//! assert_eq!(mesh.get("particle").unwrap().n_cells(), 20);
//! ```

use std::collections::HashMap;

use crate::error::GeometryError;

// module declarations
pub mod geometry;
pub mod submesh;

// re-export commonly used types for convenience
pub use geometry::{CoordinateRange, CoordinateSystem, DomainGeometry, Geometry};
pub use submesh::{Mesh1D, SubmeshType};

// =================================================================================================
// Mesh collection
// =================================================================================================

/// Per-domain meshes generated from a [`Geometry`].
#[derive(Debug, Clone)]
pub struct Mesh {
    meshes: HashMap<String, Mesh1D>,
}

impl Mesh {
    /// Meshes every domain of `geometry`.
    ///
    /// `submesh_types` is keyed by domain name, `var_points` by
    /// coordinate name (so several domains sharing a coordinate name
    /// share a resolution, as in the original workflow).
    ///
    /// Fails with a [`GeometryError`] when a domain's bounds are not
    /// strictly increasing, when a domain has no submesh type, or when a
    /// coordinate has no (or a zero) point count.
    pub fn new(
        geometry: &Geometry,
        submesh_types: &HashMap<String, SubmeshType>,
        var_points: &HashMap<String, usize>,
    ) -> Result<Self, GeometryError> {
        let mut meshes = HashMap::new();

        for (name, domain) in geometry.iter() {
            let range = domain.coordinate();
            if !range.is_valid() {
                return Err(GeometryError::InvalidBounds {
                    domain: name.clone(),
                    coordinate: range.name().to_string(),
                    min: range.min(),
                    max: range.max(),
                });
            }

            let submesh_type = submesh_types
                .get(name)
                .copied()
                .ok_or_else(|| GeometryError::missing_submesh(name.clone()))?;

            let cells = var_points
                .get(range.name())
                .copied()
                .ok_or_else(|| GeometryError::missing_point_count(range.name()))?;
            if cells == 0 {
                return Err(GeometryError::InvalidPointCount {
                    coordinate: range.name().to_string(),
                });
            }

            log::debug!(
                "meshed domain '{}': {} {} cells over [{}, {}]",
                name,
                cells,
                submesh_type,
                range.min(),
                range.max()
            );
            meshes.insert(
                name.clone(),
                Mesh1D::generate(name.clone(), domain, submesh_type, cells),
            );
        }

        Ok(Self { meshes })
    }

    pub fn get(&self, domain: &str) -> Option<&Mesh1D> {
        self.meshes.get(domain)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Mesh1D)> {
        self.meshes.iter()
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

// ==================== Tests ====================
