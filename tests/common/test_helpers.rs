//! Helper functions for integration tests

use bamm_rs::models::SphericalDiffusion;
use bamm_rs::simulation::Simulation;

/// Compute relative error: |actual - expected| / |expected|
pub fn relative_error(actual: f64, expected: f64) -> f64 {
    if expected.abs() < 1e-10 {
        (actual - expected).abs()
    } else {
        (actual - expected).abs() / expected.abs()
    }
}

/// The standard single-particle setup at a chosen mesh resolution.
pub fn particle_simulation(cells: usize) -> Simulation {
    let particle = SphericalDiffusion::new();
    Simulation::new(particle.model(), particle.geometry())
        .with_parameter_values(particle.parameter_values())
        .with_points(SphericalDiffusion::COORDINATE, cells)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_error() {
        assert!((relative_error(1.0, 1.0) - 0.0).abs() < 1e-10);
        assert!((relative_error(1.1, 1.0) - 0.1).abs() < 1e-10);
        assert!((relative_error(0.9, 1.0) - 0.1).abs() < 1e-10);
    }
}
