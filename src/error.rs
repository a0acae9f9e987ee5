//! Error types for the modelling pipeline.
//!
//! Each pipeline stage owns one error enum, so a failure always names the
//! stage that produced it:
//!
//! | Stage          | Error type             |
//! |----------------|------------------------|
//! | Model building | [`ModelError`]         |
//! | Geometry/mesh  | [`GeometryError`]      |
//! | Discretization | [`DiscretizationError`]|
//! | Time stepping  | [`SolverError`]        |
//! | File export    | [`ExportError`]        |
//!
//! [`BammError`] is the umbrella type returned by code that spans stages
//! (for example [`crate::simulation::Simulation::solve`]); every staged
//! error converts into it via `From`.
//!
//! The pipeline is fail-fast: the first stage to detect an inconsistency
//! reports it and nothing downstream runs.

use thiserror::Error;

/// Convenience alias for results carrying the umbrella error.
pub type BammResult<T> = Result<T, BammError>;

// =================================================================================================
// Model errors
// =================================================================================================

/// Inconsistencies in a symbolic model.
///
/// Models are deliberately permissive while being assembled; these errors
/// surface when [`Model::validate`](crate::symbolic::Model::validate) runs,
/// which happens at discretization time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("model '{name}' contains no equations")]
    EmptyModel { name: String },

    #[error("variable '{variable}' has no initial condition")]
    MissingInitialCondition { variable: String },

    #[error("variable '{variable}' appears under a spatial gradient but has incomplete boundary conditions")]
    MissingBoundaryConditions { variable: String },

    #[error("duplicate output name '{name}'")]
    DuplicateOutput { name: String },

    #[error("expression references variable '{name}' which is not part of the model")]
    UnknownVariable { name: String },

    #[error("parameter '{name}' has no bound value")]
    MissingParameter { name: String },

    #[error("initial condition for variable '{variable}' is invalid: {reason}")]
    InvalidInitialCondition { variable: String, reason: String },

    #[error("expression is not a pure parameter/constant expression: contains {found}")]
    NonConstantExpression { found: String },

    #[error("variable '{variable}' has both a differential and an algebraic equation")]
    ConflictingEquations { variable: String },
}

impl ModelError {
    pub fn missing_initial_condition(variable: impl Into<String>) -> Self {
        Self::MissingInitialCondition {
            variable: variable.into(),
        }
    }

    pub fn missing_boundary_conditions(variable: impl Into<String>) -> Self {
        Self::MissingBoundaryConditions {
            variable: variable.into(),
        }
    }

    pub fn missing_parameter(name: impl Into<String>) -> Self {
        Self::MissingParameter { name: name.into() }
    }

    pub fn unknown_variable(name: impl Into<String>) -> Self {
        Self::UnknownVariable { name: name.into() }
    }

    pub fn invalid_initial_condition(
        variable: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidInitialCondition {
            variable: variable.into(),
            reason: reason.into(),
        }
    }
}

// =================================================================================================
// Geometry errors
// =================================================================================================

/// Failures while interpreting a geometry or generating meshes from it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("domain '{domain}': coordinate '{coordinate}' has invalid bounds [{min}, {max}] (min must be strictly below max)")]
    InvalidBounds {
        domain: String,
        coordinate: String,
        min: f64,
        max: f64,
    },

    #[error("domain '{domain}' has no submesh type assigned")]
    MissingSubmesh { domain: String },

    #[error("coordinate '{coordinate}' has no point count assigned")]
    MissingPointCount { coordinate: String },

    #[error("coordinate '{coordinate}' has a point count of zero")]
    InvalidPointCount { coordinate: String },
}

impl GeometryError {
    pub fn missing_submesh(domain: impl Into<String>) -> Self {
        Self::MissingSubmesh {
            domain: domain.into(),
        }
    }

    pub fn missing_point_count(coordinate: impl Into<String>) -> Self {
        Self::MissingPointCount {
            coordinate: coordinate.into(),
        }
    }
}

// =================================================================================================
// Discretization errors
// =================================================================================================

/// Failures while lowering symbolic expressions onto a mesh.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiscretizationError {
    #[error("domain '{domain}' has no mesh")]
    MissingMesh { domain: String },

    #[error("domain '{domain}' has no spatial method assigned")]
    MissingSpatialMethod { domain: String },

    #[error("incompatible evaluation shapes: {context}")]
    ShapeMismatch { context: String },

    #[error("boundary condition on variable '{variable}' is invalid: {reason}")]
    InvalidBoundaryValue { variable: String, reason: String },
}

impl DiscretizationError {
    pub fn missing_mesh(domain: impl Into<String>) -> Self {
        Self::MissingMesh {
            domain: domain.into(),
        }
    }

    pub fn missing_spatial_method(domain: impl Into<String>) -> Self {
        Self::MissingSpatialMethod {
            domain: domain.into(),
        }
    }

    pub fn shape_mismatch(context: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            context: context.into(),
        }
    }

    pub fn invalid_boundary_value(
        variable: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidBoundaryValue {
            variable: variable.into(),
            reason: reason.into(),
        }
    }
}

// =================================================================================================
// Solver errors
// =================================================================================================

/// Failures during time integration or solution post-processing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("invalid time span [{start}, {end}]: start must be strictly below end")]
    InvalidTimeSpan { start: f64, end: f64 },

    #[error("invalid solver configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("invalid initial state: {reason}")]
    InvalidInitialState { reason: String },

    #[error("initial state violates an algebraic constraint: residual norm {residual:.3e} exceeds tolerance {tolerance:.3e}")]
    InconsistentInitialState { residual: f64, tolerance: f64 },

    #[error("solver '{solver}' cannot integrate systems with algebraic equations; a differential-algebraic solver is required")]
    NotDaeCapable { solver: String },

    #[error("state became non-finite (NaN or infinity) at t = {time:.6e}; reduce the step size or check the model for singular expressions")]
    NumericalInstability { time: f64 },

    #[error("step budget of {max_steps} exhausted at t = {time:.6e} before reaching the end of the time span")]
    StepBudgetExhausted { max_steps: usize, time: f64 },

    #[error("step size underflowed to {step:.3e} at t = {time:.6e}; the requested tolerances may be unattainable")]
    StepSizeUnderflow { time: f64, step: f64 },

    #[error("solution has no output named '{name}'")]
    UnknownVariable { name: String },
}

impl SolverError {
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    pub fn invalid_initial_state(reason: impl Into<String>) -> Self {
        Self::InvalidInitialState {
            reason: reason.into(),
        }
    }

    pub fn unknown_variable(name: impl Into<String>) -> Self {
        Self::UnknownVariable { name: name.into() }
    }
}

// =================================================================================================
// Export errors
// =================================================================================================

/// Failures while writing solution data to disk.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("solution has no output named '{name}'")]
    UnknownVariable { name: String },

    #[error("output '{name}' is not a scalar trajectory and cannot be written as a column")]
    NonScalar { name: String },
}

// =================================================================================================
// Umbrella error
// =================================================================================================

/// Any pipeline failure, tagged by stage.
#[derive(Error, Debug)]
pub enum BammError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Discretization(#[from] DiscretizationError),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Export(#[from] ExportError),
}
