//! Common utilities for integration tests

pub mod mock_systems;
pub mod test_helpers;

// Re-export commonly used items
pub use mock_systems::{ConstantGrowth, ExponentialDecay};
pub use test_helpers::{particle_simulation, relative_error};
