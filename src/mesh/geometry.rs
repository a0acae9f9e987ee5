//! Geometry description: named domains, coordinate ranges, coordinate
//! systems.
//!
//! A geometry says where the model lives, nothing more. It carries no
//! resolution and no numerics; meshes are generated from it by
//! [`Mesh::new`](crate::mesh::Mesh::new) once point counts and submesh
//! types are chosen.

use std::collections::HashMap;
use std::fmt;

// =================================================================================================
// Coordinate systems
// =================================================================================================

/// Coordinate system of a 1-D domain.
///
/// The tag decides the face areas and cell volumes used by the
/// finite-volume operators: a radial coordinate in a sphere weights faces
/// by r² and cells by shell volume, so divergence telescopes exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateSystem {
    Cartesian,
    CylindricalPolar,
    SphericalPolar,
}

impl CoordinateSystem {
    /// Area of the face at radius `r`, up to the shared angular factor
    /// (4π for spheres, 2π per unit height for cylinders).
    #[inline]
    pub fn face_area(&self, r: f64) -> f64 {
        match self {
            CoordinateSystem::Cartesian => 1.0,
            CoordinateSystem::CylindricalPolar => r,
            CoordinateSystem::SphericalPolar => r * r,
        }
    }

    /// Volume of the cell between `r_in` and `r_out`, up to the same
    /// angular factor as [`face_area`](Self::face_area).
    #[inline]
    pub fn cell_volume(&self, r_in: f64, r_out: f64) -> f64 {
        match self {
            CoordinateSystem::Cartesian => r_out - r_in,
            CoordinateSystem::CylindricalPolar => (r_out * r_out - r_in * r_in) / 2.0,
            CoordinateSystem::SphericalPolar => {
                (r_out * r_out * r_out - r_in * r_in * r_in) / 3.0
            }
        }
    }
}

impl fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinateSystem::Cartesian => write!(f, "cartesian"),
            CoordinateSystem::CylindricalPolar => write!(f, "cylindrical polar"),
            CoordinateSystem::SphericalPolar => write!(f, "spherical polar"),
        }
    }
}

// =================================================================================================
// Coordinate ranges and domains
// =================================================================================================

/// A named spatial coordinate with its bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateRange {
    name: String,
    min: f64,
    max: f64,
}

impl CoordinateRange {
    pub fn new(name: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            min,
            max,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn min(&self) -> f64 {
        self.min
    }

    #[inline]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Bounds are ordered and finite. NaN bounds fail the ordering test.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min < self.max && self.min.is_finite() && self.max.is_finite()
    }
}

/// One domain of a geometry: a single coordinate range plus the
/// coordinate system it is measured in.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainGeometry {
    coordinate: CoordinateRange,
    coordinate_system: CoordinateSystem,
}

impl DomainGeometry {
    pub fn new(coordinate_system: CoordinateSystem, coordinate: CoordinateRange) -> Self {
        Self {
            coordinate,
            coordinate_system,
        }
    }

    /// A spherical-polar radial domain, the common case for particle
    /// problems.
    pub fn spherical(coordinate: impl Into<String>, min: f64, max: f64) -> Self {
        Self::new(
            CoordinateSystem::SphericalPolar,
            CoordinateRange::new(coordinate, min, max),
        )
    }

    #[inline]
    pub fn coordinate(&self) -> &CoordinateRange {
        &self.coordinate
    }

    #[inline]
    pub fn coordinate_system(&self) -> CoordinateSystem {
        self.coordinate_system
    }
}

// =================================================================================================
// Geometry
// =================================================================================================

/// Named domains → [`DomainGeometry`].
///
/// # Example
///
/// ```rust
/// use bamm_rs::mesh::{CoordinateSystem, CoordinateRange, DomainGeometry, Geometry};
///
/// let mut geometry = Geometry::new();
/// geometry.add_domain(
///     "particle",
///     DomainGeometry::new(
///         CoordinateSystem::SphericalPolar,
///         CoordinateRange::new("r", 0.0, 1.0),
///     ),
/// );
/// assert_eq!(geometry.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    domains: HashMap<String, DomainGeometry>,
}

impl Geometry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style domain insertion.
    pub fn with_domain(mut self, name: impl Into<String>, domain: DomainGeometry) -> Self {
        self.add_domain(name, domain);
        self
    }

    pub fn add_domain(&mut self, name: impl Into<String>, domain: DomainGeometry) {
        self.domains.insert(name.into(), domain);
    }

    pub fn get(&self, name: &str) -> Option<&DomainGeometry> {
        self.domains.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DomainGeometry)> {
        self.domains.iter()
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_range_validity() {
        assert!(CoordinateRange::new("r", 0.0, 1.0).is_valid());
        assert!(!CoordinateRange::new("r", 1.0, 0.0).is_valid());
        assert!(!CoordinateRange::new("r", 0.5, 0.5).is_valid());
        assert!(!CoordinateRange::new("r", f64::NAN, 1.0).is_valid());
        assert!(!CoordinateRange::new("r", 0.0, f64::INFINITY).is_valid());
    }

    #[test]
    fn test_spherical_measures() {
        let system = CoordinateSystem::SphericalPolar;
        assert_relative_eq!(system.face_area(0.5), 0.25);
        // Full unit sphere volume, up to the 4π factor.
        assert_relative_eq!(system.cell_volume(0.0, 1.0), 1.0 / 3.0);
    }

    #[test]
    fn test_cartesian_measures() {
        let system = CoordinateSystem::Cartesian;
        assert_relative_eq!(system.face_area(0.7), 1.0);
        assert_relative_eq!(system.cell_volume(0.2, 0.5), 0.3);
    }

    #[test]
    fn test_cylindrical_measures() {
        let system = CoordinateSystem::CylindricalPolar;
        assert_relative_eq!(system.face_area(2.0), 2.0);
        assert_relative_eq!(system.cell_volume(1.0, 2.0), 1.5);
    }

    #[test]
    fn test_geometry_lookup() {
        let geometry = Geometry::new()
            .with_domain("particle", DomainGeometry::spherical("r", 0.0, 1.0));
        let domain = geometry.get("particle").unwrap();
        assert_eq!(domain.coordinate().name(), "r");
        assert_eq!(
            domain.coordinate_system(),
            CoordinateSystem::SphericalPolar
        );
        assert!(geometry.get("electrolyte").is_none());
    }
}
