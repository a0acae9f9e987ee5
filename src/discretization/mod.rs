//! Discretization: lowering symbolic models onto meshes.
//!
//! # Core Concepts
//!
//! * **SpatialMethod**: how one domain turns `grad`, `div` and `surf`
//!   into stencils ([`traits::SpatialMethod`], implemented by
//!   [`FiniteVolume`]). Methods are assigned per domain, so different
//!   domains of one model may discretize differently.
//! * **StateLayout**: the stable mapping from model variables onto one
//!   flat state vector, grouped contiguously per domain.
//! * **DiscretizedSystem**: the solvable result. Every symbolic
//!   expression is lowered into an evaluable IR with parameters
//!   substituted and stencils baked in.
//!
//! # Workflow
//!
//! ```text
//!   Model ('symbolic')          Discretization              DiscretizedSystem
//!  ┌──────────────────┐   ┌───────────────────────┐   ┌───────────────────────┐
//!  │ rhs:  -div(N)    │   │ validate model        │   │ layout: c -> 0..20    │
//!  │ bcs:  N = -j     │──►│ build state layout    │──►│ rhs: evaluable IR     │
//!  │ ics:  c = c0     │   │ lower expressions     │   │ y(0): [0.9, .., 0.9]  │
//!  └──────────────────┘   └───────────────────────┘   └───────────────────────┘
//! ```
//!
//! Lowering substitutes parameter values, resolves every variable to its
//! state slice, attaches stencils to spatial operators and checks shape
//! compatibility (scalars broadcast; cell and face fields never mix).
//! All model inconsistencies surface here, before any time stepping.
//!
//! # Example
//!
//! ```
//! use bamm_rs::discretization::{Discretization, FiniteVolume};
//! use bamm_rs::mesh::{DomainGeometry, Geometry, Mesh, SubmeshType};
//! use bamm_rs::symbolic::{grad, div, BoundaryKind, DomainSide, Model, ParameterValues, Variable};
//! use std::collections::HashMap;
//!
//! let c = Variable::new("c", "particle");
//! let mut model = Model::new("diffusion");
//! model.set_rhs(&c, -div(-grad(&c)));
//! model.set_boundary_condition(&c, DomainSide::Left, 0.0, BoundaryKind::Neumann);
//! model.set_boundary_condition(&c, DomainSide::Right, 0.0, BoundaryKind::Neumann);
//! model.set_initial_condition(&c, 1.0);
//!
//! let geometry = Geometry::new()
//!     .with_domain("particle", DomainGeometry::spherical("r", 0.0, 1.0));
//! let types = HashMap::from([("particle".to_string(), SubmeshType::Uniform1D)]);
//! let points = HashMap::from([("r".to_string(), 10)]);
//! let mesh = Mesh::new(&geometry, &types, &points)?;
//!
//! let system = Discretization::new(mesh)
//!     .with_method("particle", FiniteVolume::new())
//!     .process_model(&model, &ParameterValues::new())?;
//! assert_eq!(system.state_size(), 10);
//! # Ok::<(), bamm_rs::error::BammError>(())
//! ```

pub mod finite_volume;
pub mod system;
pub mod traits;

pub use finite_volume::FiniteVolume;
pub use system::{DiscretizedSystem, FieldData, LayoutEntry, StateLayout};
pub use traits::{BoundaryValueStencil, DivergenceStencil, GradientStencil, SpatialMethod};

use std::collections::HashMap;
use std::fmt;

use nalgebra::DVector;

use crate::error::{BammResult, DiscretizationError, ModelError};
use crate::mesh::Mesh;
use crate::symbolic::expression::ExprNode;
use crate::symbolic::{
    BoundaryCondition, DomainSide, Expression, Model, ParameterValues,
};
use system::{CompiledBoundary, CompiledEquation, CompiledOutput, DiscreteExpr};

// =================================================================================================
// Discretization
// =================================================================================================

/// Lowers symbolic models onto meshes using per-domain spatial methods.
///
/// Construct with a [`Mesh`], assign a [`SpatialMethod`] to every meshed
/// domain, then call [`process_model`](Self::process_model). The
/// discretization is reusable: several models sharing a geometry can be
/// processed by the same instance.
pub struct Discretization {
    mesh: Mesh,
    methods: HashMap<String, Box<dyn SpatialMethod>>,
}

impl Discretization {
    pub fn new(mesh: Mesh) -> Self {
        Self {
            mesh,
            methods: HashMap::new(),
        }
    }

    /// Assigns the spatial method for a domain.
    pub fn with_method(
        mut self,
        domain: impl Into<String>,
        method: impl SpatialMethod + 'static,
    ) -> Self {
        self.methods.insert(domain.into(), Box::new(method));
        self
    }

    pub(crate) fn insert_method(&mut self, domain: String, method: Box<dyn SpatialMethod>) {
        self.methods.insert(domain, method);
    }

    #[inline]
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Validates the model and lowers it into a [`DiscretizedSystem`].
    ///
    /// Parameter values are substituted during lowering, so the result
    /// holds plain numbers and is independent of the parameter set it was
    /// built from.
    pub fn process_model(
        &self,
        model: &Model,
        parameters: &ParameterValues,
    ) -> BammResult<DiscretizedSystem> {
        model.validate()?;

        let unknowns = model.unknowns();
        let layout = StateLayout::build(&unknowns, &self.mesh)?;

        // Every domain carrying state needs a method assigned up front,
        // whether or not its equations use spatial operators.
        let mut seen: Vec<&str> = Vec::new();
        for entry in layout.entries() {
            if !seen.contains(&entry.domain()) {
                seen.push(entry.domain());
                if !self.methods.contains_key(entry.domain()) {
                    return Err(DiscretizationError::missing_spatial_method(entry.domain()).into());
                }
            }
        }

        let lowering = Lowering {
            model,
            parameters,
            layout: &layout,
            mesh: &self.mesh,
            methods: &self.methods,
        };

        let mut rhs = Vec::new();
        let mut algebraic = Vec::new();
        for entry in layout.entries() {
            if let Some(expr) = model.rhs_of(entry.id()) {
                let context = format!("right-hand side of '{}'", entry.name());
                rhs.push(lowering.lower_equation(entry, expr, &context)?);
            }
            if let Some(expr) = model.algebraic_of(entry.id()) {
                let context = format!("algebraic residual of '{}'", entry.name());
                algebraic.push(lowering.lower_equation(entry, expr, &context)?);
            }
        }

        let mut outputs = Vec::new();
        for (name, expr) in model.outputs() {
            let context = format!("output '{name}'");
            let lowered = lowering.lower(expr, &context)?;
            if let Shape::Faces(_) = lowered.shape {
                return Err(DiscretizationError::shape_mismatch(format!(
                    "{context}: face fields cannot be recorded as outputs"
                ))
                .into());
            }
            outputs.push(CompiledOutput {
                name: name.clone(),
                expr: lowered.expr,
                domain: lowered.domain,
            });
        }

        let mut initial_state = DVector::zeros(layout.len());
        for entry in layout.entries() {
            let ic = model
                .initial_condition_of(entry.id())
                .ok_or_else(|| ModelError::missing_initial_condition(entry.name()))?;
            let value = match ic.evaluate_scalar(parameters) {
                Ok(value) => value,
                Err(ModelError::NonConstantExpression { found }) => {
                    return Err(ModelError::invalid_initial_condition(
                        entry.name(),
                        format!("must be spatially uniform, found {found}"),
                    )
                    .into());
                }
                Err(err) => return Err(err.into()),
            };
            if !value.is_finite() {
                return Err(ModelError::invalid_initial_condition(
                    entry.name(),
                    format!("evaluates to the non-finite value {value}"),
                )
                .into());
            }
            for i in entry.range() {
                initial_state[i] = value;
            }
        }

        let length_scales = self
            .mesh
            .iter()
            .map(|(name, mesh1d)| (name.clone(), mesh1d.length_scale()))
            .collect();

        log::debug!(
            "discretized model '{}': {} unknowns over {} state values",
            model.name(),
            layout.entries().len(),
            layout.len()
        );

        Ok(DiscretizedSystem::new(
            model.name().to_string(),
            layout,
            rhs,
            algebraic,
            outputs,
            initial_state,
            length_scales,
        ))
    }
}

// =================================================================================================
// Expression lowering
// =================================================================================================

/// Evaluation shape of a lowered expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Scalar,
    Cells(usize),
    Faces(usize),
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Scalar => write!(f, "a scalar"),
            Shape::Cells(n) => write!(f, "{n} cell values"),
            Shape::Faces(n) => write!(f, "{n} face values"),
        }
    }
}

/// Scalars broadcast against fields; fields must share their location
/// and size.
fn combine_shapes(a: Shape, b: Shape) -> Option<Shape> {
    match (a, b) {
        (Shape::Scalar, other) | (other, Shape::Scalar) => Some(other),
        (Shape::Cells(n), Shape::Cells(m)) if n == m => Some(Shape::Cells(n)),
        (Shape::Faces(n), Shape::Faces(m)) if n == m => Some(Shape::Faces(n)),
        _ => None,
    }
}

struct Lowered {
    expr: DiscreteExpr,
    shape: Shape,
    /// Domain whose mesh the expression draws from, if any.
    domain: Option<String>,
}

fn merge_domains(
    a: Option<String>,
    b: Option<String>,
    context: &str,
) -> BammResult<Option<String>> {
    match (a, b) {
        (Some(x), Some(y)) => {
            if x == y {
                Ok(Some(x))
            } else {
                Err(DiscretizationError::shape_mismatch(format!(
                    "{context}: expression mixes fields from domains '{x}' and '{y}'"
                ))
                .into())
            }
        }
        (Some(x), None) | (None, Some(x)) => Ok(Some(x)),
        (None, None) => Ok(None),
    }
}

fn contains_grad_or_div(expr: &Expression) -> bool {
    match expr.node() {
        ExprNode::Constant(_) | ExprNode::Variable { .. } | ExprNode::Parameter(_) => false,
        ExprNode::Gradient(_) | ExprNode::Divergence(_) => true,
        ExprNode::Unary(_, inner) | ExprNode::SurfaceValue(inner) => contains_grad_or_div(inner),
        ExprNode::Binary(_, left, right) => {
            contains_grad_or_div(left) || contains_grad_or_div(right)
        }
    }
}

struct Lowering<'a> {
    model: &'a Model,
    parameters: &'a ParameterValues,
    layout: &'a StateLayout,
    mesh: &'a Mesh,
    methods: &'a HashMap<String, Box<dyn SpatialMethod>>,
}

impl Lowering<'_> {
    fn method_for(&self, domain: &str) -> BammResult<&dyn SpatialMethod> {
        self.methods
            .get(domain)
            .map(|m| m.as_ref())
            .ok_or_else(|| DiscretizationError::missing_spatial_method(domain).into())
    }

    /// Lowers an equation and binds it to its variable's state slice.
    ///
    /// An equation may evaluate to a scalar (broadcast across the
    /// variable's cells) or to a cell field of matching size, and must
    /// not draw from another variable's domain.
    fn lower_equation(
        &self,
        entry: &LayoutEntry,
        expr: &Expression,
        context: &str,
    ) -> BammResult<CompiledEquation> {
        let lowered = self.lower(expr, context)?;
        match lowered.shape {
            Shape::Scalar => {}
            Shape::Cells(n) if n == entry.len() => {}
            shape => {
                return Err(DiscretizationError::shape_mismatch(format!(
                    "{context}: expected a scalar or {} cell values, got {shape}",
                    entry.len()
                ))
                .into());
            }
        }
        if let Some(domain) = &lowered.domain {
            if domain != entry.domain() {
                return Err(DiscretizationError::shape_mismatch(format!(
                    "{context}: draws from domain '{domain}' but '{}' lives on '{}'",
                    entry.name(),
                    entry.domain()
                ))
                .into());
            }
        }
        Ok(CompiledEquation {
            offset: entry.offset(),
            len: entry.len(),
            expr: lowered.expr,
        })
    }

    fn lower(&self, expr: &Expression, context: &str) -> BammResult<Lowered> {
        match expr.node() {
            ExprNode::Constant(value) => Ok(Lowered {
                expr: DiscreteExpr::Scalar(*value),
                shape: Shape::Scalar,
                domain: None,
            }),
            ExprNode::Parameter(name) => {
                let value = self
                    .parameters
                    .get(name)
                    .ok_or_else(|| ModelError::missing_parameter(name.clone()))?;
                Ok(Lowered {
                    expr: DiscreteExpr::Scalar(value),
                    shape: Shape::Scalar,
                    domain: None,
                })
            }
            ExprNode::Variable { id, name, domain } => {
                let entry = self
                    .layout
                    .entry(*id)
                    .ok_or_else(|| ModelError::unknown_variable(name.clone()))?;
                Ok(Lowered {
                    expr: DiscreteExpr::State {
                        offset: entry.offset(),
                        len: entry.len(),
                    },
                    shape: Shape::Cells(entry.len()),
                    domain: Some(domain.clone()),
                })
            }
            ExprNode::Unary(op, inner) => {
                let lowered = self.lower(inner, context)?;
                Ok(Lowered {
                    expr: DiscreteExpr::Unary(*op, Box::new(lowered.expr)),
                    shape: lowered.shape,
                    domain: lowered.domain,
                })
            }
            ExprNode::Binary(op, left, right) => {
                let a = self.lower(left, context)?;
                let b = self.lower(right, context)?;
                let shape = combine_shapes(a.shape, b.shape).ok_or_else(|| {
                    DiscretizationError::shape_mismatch(format!(
                        "{context}: cannot combine {} with {}",
                        a.shape, b.shape
                    ))
                })?;
                let domain = merge_domains(a.domain, b.domain, context)?;
                Ok(Lowered {
                    expr: DiscreteExpr::Binary(*op, Box::new(a.expr), Box::new(b.expr)),
                    shape,
                    domain,
                })
            }
            ExprNode::Gradient(inner) => self.lower_gradient(inner, context),
            ExprNode::Divergence(inner) => {
                let lowered = self.lower(inner, context)?;
                if !matches!(lowered.shape, Shape::Faces(_)) {
                    return Err(DiscretizationError::shape_mismatch(format!(
                        "{context}: div applies to face fluxes (a grad result), got {}",
                        lowered.shape
                    ))
                    .into());
                }
                let domain = lowered.domain.ok_or_else(|| {
                    DiscretizationError::shape_mismatch(format!(
                        "{context}: div applied to an expression with no associated domain"
                    ))
                })?;
                let mesh1d = self
                    .mesh
                    .get(&domain)
                    .ok_or_else(|| DiscretizationError::missing_mesh(domain.clone()))?;
                let method = self.method_for(&domain)?;
                Ok(Lowered {
                    expr: DiscreteExpr::Divergence {
                        inner: Box::new(lowered.expr),
                        stencil: method.divergence(mesh1d),
                    },
                    shape: Shape::Cells(mesh1d.n_cells()),
                    domain: Some(domain),
                })
            }
            ExprNode::SurfaceValue(inner) => {
                let lowered = self.lower(inner, context)?;
                if !matches!(lowered.shape, Shape::Cells(_)) {
                    return Err(DiscretizationError::shape_mismatch(format!(
                        "{context}: surf applies to cell fields, got {}",
                        lowered.shape
                    ))
                    .into());
                }
                let domain = lowered.domain.ok_or_else(|| {
                    DiscretizationError::shape_mismatch(format!(
                        "{context}: surf applied to an expression with no associated domain"
                    ))
                })?;
                let mesh1d = self
                    .mesh
                    .get(&domain)
                    .ok_or_else(|| DiscretizationError::missing_mesh(domain.clone()))?;
                let method = self.method_for(&domain)?;
                Ok(Lowered {
                    expr: DiscreteExpr::BoundaryValue {
                        inner: Box::new(lowered.expr),
                        stencil: method.boundary_value(mesh1d, DomainSide::Right),
                    },
                    shape: Shape::Scalar,
                    domain: Some(domain),
                })
            }
        }
    }

    /// Gradients apply to variables directly so that the boundary
    /// conditions to inject are unambiguous.
    fn lower_gradient(&self, inner: &Expression, context: &str) -> BammResult<Lowered> {
        let ExprNode::Variable { id, name, domain } = inner.node() else {
            return Err(DiscretizationError::shape_mismatch(format!(
                "{context}: grad applies to variables directly, not to composite expressions"
            ))
            .into());
        };

        let entry = self
            .layout
            .entry(*id)
            .ok_or_else(|| ModelError::unknown_variable(name.clone()))?;
        let mesh1d = self
            .mesh
            .get(domain)
            .ok_or_else(|| DiscretizationError::missing_mesh(domain.clone()))?;
        let method = self.method_for(domain)?;

        let set = self.model.boundary_conditions_of(*id);
        let left_bc = set
            .and_then(|s| s.get(DomainSide::Left))
            .ok_or_else(|| ModelError::missing_boundary_conditions(name.clone()))?;
        let right_bc = set
            .and_then(|s| s.get(DomainSide::Right))
            .ok_or_else(|| ModelError::missing_boundary_conditions(name.clone()))?;
        let left = self.lower_boundary(name, left_bc)?;
        let right = self.lower_boundary(name, right_bc)?;

        Ok(Lowered {
            expr: DiscreteExpr::Gradient {
                inner: Box::new(DiscreteExpr::State {
                    offset: entry.offset(),
                    len: entry.len(),
                }),
                stencil: method.gradient(mesh1d),
                left,
                right,
            },
            shape: Shape::Faces(mesh1d.n_faces()),
            domain: Some(domain.clone()),
        })
    }

    /// Boundary values must lower to scalars. They may reference
    /// parameters and surface values of variables (state-dependent
    /// boundary conditions) but no further spatial operators.
    fn lower_boundary(
        &self,
        variable: &str,
        bc: &BoundaryCondition,
    ) -> BammResult<CompiledBoundary> {
        if contains_grad_or_div(bc.value()) {
            return Err(DiscretizationError::invalid_boundary_value(
                variable,
                "boundary values must not contain grad or div",
            )
            .into());
        }
        let context = format!("boundary condition on '{variable}'");
        let lowered = self.lower(bc.value(), &context)?;
        match lowered.shape {
            Shape::Scalar => Ok(CompiledBoundary {
                kind: bc.kind(),
                value: Box::new(lowered.expr),
            }),
            shape => Err(DiscretizationError::invalid_boundary_value(
                variable,
                format!("boundary values must be scalar, got {shape}"),
            )
            .into()),
        }
    }
}

// ==================== Tests ====================
