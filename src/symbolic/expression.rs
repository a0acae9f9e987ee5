//! Immutable symbolic expression trees.
//!
//! # Design
//!
//! Expressions form a directed acyclic graph: every [`Expression`] is a
//! cheap handle (`Arc`) onto an immutable node, so a subexpression used in
//! several places — a flux appearing in two boundary conditions, say — is
//! stored once and shared, never deep-copied. Cloning an `Expression`
//! bumps a reference count and nothing else.
//!
//! Variables carry a process-wide stable [`VariableId`] assigned at
//! construction. Model collections key on this identifier rather than on
//! names or object addresses, so two distinct variables may even share a
//! name without colliding.
//!
//! # Operators
//!
//! The usual arithmetic operators are overloaded for expression ⊗
//! expression and expression ⊗ `f64` operands, and the three spatial
//! operators are exposed as free functions:
//!
//! - [`grad`] — spatial gradient of a field (cell centres → faces once
//!   discretized)
//! - [`div`] — divergence of a flux (faces → cell centres)
//! - [`surf`] — evaluation of a field at the outer boundary of its domain
//!
//! ```rust
//! use bamm_rs::symbolic::{Variable, Parameter, Expression, grad, div, surf};
//!
//! let c = Variable::new("c", "particle");
//! let j0 = Parameter::new("j0");
//!
//! let flux = -grad(&c);
//! let rate = -div(flux);
//!
//! let c_surf = surf(&c);
//! let j = Expression::from(&j0) * (1.0 - c_surf.clone()).sqrt() * c_surf.sqrt();
//!
//! assert!(rate.to_string().contains("grad(c)"));
//! assert_eq!(j.parameters().len(), 1);
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::ModelError;
use crate::symbolic::parameters::ParameterValues;

// =================================================================================================
// Variables and parameters
// =================================================================================================

// Identifiers come from a shared atomic counter. Relaxed ordering is
// sufficient: uniqueness is all that matters, not ordering between threads.
static NEXT_VARIABLE_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identifier of a [`Variable`], unique within the process.
///
/// Model collections (right-hand sides, boundary conditions, initial
/// conditions) and state-vector layouts all key on this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId(u64);

/// A named unknown field, defined on a spatial domain.
#[derive(Debug, Clone)]
pub struct Variable {
    id: VariableId,
    name: String,
    domain: String,
}

impl Variable {
    /// Creates a variable on the given domain and assigns it a fresh
    /// [`VariableId`].
    pub fn new(name: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            id: VariableId(NEXT_VARIABLE_ID.fetch_add(1, Ordering::Relaxed)),
            name: name.into(),
            domain: domain.into(),
        }
    }

    #[inline]
    pub fn id(&self) -> VariableId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn domain(&self) -> &str {
        &self.domain
    }
}

/// A named scalar placeholder, bound to a value through
/// [`ParameterValues`] before discretization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    name: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

// =================================================================================================
// Expression nodes
// =================================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    pub(crate) fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::Pow => a.powf(b),
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "^",
        }
    }
}

#[derive(Debug)]
pub(crate) enum ExprNode {
    Constant(f64),
    Variable {
        id: VariableId,
        name: String,
        domain: String,
    },
    Parameter(String),
    Unary(UnaryOp, Expression),
    Binary(BinaryOp, Expression, Expression),
    /// Spatial gradient of a cell field; discretizes onto mesh faces.
    Gradient(Expression),
    /// Divergence of a face flux; discretizes onto cell centres.
    Divergence(Expression),
    /// Value of a cell field at the outer (right) edge of its domain.
    SurfaceValue(Expression),
}

/// Handle onto an immutable, reference-counted expression node.
///
/// See the [module documentation](self) for the sharing semantics and the
/// operator surface.
#[derive(Debug, Clone)]
pub struct Expression {
    node: Arc<ExprNode>,
}

impl Expression {
    fn new(node: ExprNode) -> Self {
        Self {
            node: Arc::new(node),
        }
    }

    /// A constant scalar expression.
    pub fn constant(value: f64) -> Self {
        Self::new(ExprNode::Constant(value))
    }

    pub(crate) fn node(&self) -> &ExprNode {
        &self.node
    }

    /// Whether two handles point at the very same node.
    ///
    /// Distinct from structural equality: two separately built `1.0 + c`
    /// expressions are not `ptr_eq`, while clones always are.
    pub fn ptr_eq(&self, other: &Expression) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    fn unary(op: UnaryOp, inner: Expression) -> Self {
        Self::new(ExprNode::Unary(op, inner))
    }

    fn binary(op: BinaryOp, left: Expression, right: Expression) -> Self {
        Self::new(ExprNode::Binary(op, left, right))
    }

    /// Raises the expression to a power.
    pub fn pow(self, exponent: impl Into<Expression>) -> Self {
        Self::binary(BinaryOp::Pow, self, exponent.into())
    }

    /// Square root, shorthand for `pow(0.5)`.
    pub fn sqrt(self) -> Self {
        self.pow(0.5)
    }

    // ======================================== Queries ========================================

    /// Names of all parameters referenced anywhere in the expression.
    pub fn parameters(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_parameters(&mut out);
        out
    }

    pub(crate) fn collect_parameters(&self, out: &mut BTreeSet<String>) {
        match self.node() {
            ExprNode::Constant(_) | ExprNode::Variable { .. } => {}
            ExprNode::Parameter(name) => {
                out.insert(name.clone());
            }
            ExprNode::Unary(_, inner)
            | ExprNode::Gradient(inner)
            | ExprNode::Divergence(inner)
            | ExprNode::SurfaceValue(inner) => inner.collect_parameters(out),
            ExprNode::Binary(_, left, right) => {
                left.collect_parameters(out);
                right.collect_parameters(out);
            }
        }
    }

    /// Identifiers and names of all variables referenced in the expression.
    pub(crate) fn collect_variables(&self, out: &mut BTreeMap<VariableId, String>) {
        match self.node() {
            ExprNode::Constant(_) | ExprNode::Parameter(_) => {}
            ExprNode::Variable { id, name, .. } => {
                out.insert(*id, name.clone());
            }
            ExprNode::Unary(_, inner)
            | ExprNode::Gradient(inner)
            | ExprNode::Divergence(inner)
            | ExprNode::SurfaceValue(inner) => inner.collect_variables(out),
            ExprNode::Binary(_, left, right) => {
                left.collect_variables(out);
                right.collect_variables(out);
            }
        }
    }

    /// Variables appearing directly under a spatial gradient. Those are the
    /// variables that must carry complete boundary conditions.
    pub(crate) fn collect_gradient_targets(&self, out: &mut BTreeMap<VariableId, String>) {
        match self.node() {
            ExprNode::Constant(_) | ExprNode::Variable { .. } | ExprNode::Parameter(_) => {}
            ExprNode::Gradient(inner) => {
                if let ExprNode::Variable { id, name, .. } = inner.node() {
                    out.insert(*id, name.clone());
                }
                inner.collect_gradient_targets(out);
            }
            ExprNode::Unary(_, inner)
            | ExprNode::Divergence(inner)
            | ExprNode::SurfaceValue(inner) => inner.collect_gradient_targets(out),
            ExprNode::Binary(_, left, right) => {
                left.collect_gradient_targets(out);
                right.collect_gradient_targets(out);
            }
        }
    }

    /// Whether the expression contains `grad`, `div` or `surf` anywhere.
    pub fn contains_spatial_operator(&self) -> bool {
        match self.node() {
            ExprNode::Constant(_) | ExprNode::Variable { .. } | ExprNode::Parameter(_) => false,
            ExprNode::Gradient(_) | ExprNode::Divergence(_) | ExprNode::SurfaceValue(_) => true,
            ExprNode::Unary(_, inner) => inner.contains_spatial_operator(),
            ExprNode::Binary(_, left, right) => {
                left.contains_spatial_operator() || right.contains_spatial_operator()
            }
        }
    }

    /// Evaluates a pure parameter/constant expression to a number.
    ///
    /// This is how initial conditions are turned into state values.
    /// Expressions containing variables or spatial operators are not
    /// constant and fail with [`ModelError::NonConstantExpression`];
    /// unbound parameters fail with [`ModelError::MissingParameter`].
    pub fn evaluate_scalar(&self, params: &ParameterValues) -> Result<f64, ModelError> {
        match self.node() {
            ExprNode::Constant(value) => Ok(*value),
            ExprNode::Parameter(name) => params
                .get(name)
                .ok_or_else(|| ModelError::missing_parameter(name.clone())),
            ExprNode::Variable { name, .. } => Err(ModelError::NonConstantExpression {
                found: format!("variable '{name}'"),
            }),
            ExprNode::Unary(UnaryOp::Neg, inner) => Ok(-inner.evaluate_scalar(params)?),
            ExprNode::Binary(op, left, right) => Ok(op.apply(
                left.evaluate_scalar(params)?,
                right.evaluate_scalar(params)?,
            )),
            ExprNode::Gradient(_) => Err(ModelError::NonConstantExpression {
                found: "spatial gradient".to_string(),
            }),
            ExprNode::Divergence(_) => Err(ModelError::NonConstantExpression {
                found: "divergence".to_string(),
            }),
            ExprNode::SurfaceValue(_) => Err(ModelError::NonConstantExpression {
                found: "surface evaluation".to_string(),
            }),
        }
    }
}

// =================================================================================================
// Spatial operators
// =================================================================================================

/// Spatial gradient of a field.
pub fn grad(expr: impl Into<Expression>) -> Expression {
    Expression::new(ExprNode::Gradient(expr.into()))
}

/// Divergence of a flux.
pub fn div(expr: impl Into<Expression>) -> Expression {
    Expression::new(ExprNode::Divergence(expr.into()))
}

/// Value of a field at the outer boundary of its domain.
pub fn surf(expr: impl Into<Expression>) -> Expression {
    Expression::new(ExprNode::SurfaceValue(expr.into()))
}

// =================================================================================================
// Conversions
// =================================================================================================

impl From<f64> for Expression {
    fn from(value: f64) -> Self {
        Expression::constant(value)
    }
}

impl From<&Variable> for Expression {
    fn from(var: &Variable) -> Self {
        Expression::new(ExprNode::Variable {
            id: var.id,
            name: var.name.clone(),
            domain: var.domain.clone(),
        })
    }
}

impl From<Variable> for Expression {
    fn from(var: Variable) -> Self {
        Expression::from(&var)
    }
}

impl From<&Parameter> for Expression {
    fn from(param: &Parameter) -> Self {
        Expression::new(ExprNode::Parameter(param.name.clone()))
    }
}

impl From<Parameter> for Expression {
    fn from(param: Parameter) -> Self {
        Expression::from(&param)
    }
}

// =================================================================================================
// Operator overloads
// =================================================================================================

impl std::ops::Neg for Expression {
    type Output = Expression;

    fn neg(self) -> Expression {
        Expression::unary(UnaryOp::Neg, self)
    }
}

impl std::ops::Add for Expression {
    type Output = Expression;

    fn add(self, rhs: Expression) -> Expression {
        Expression::binary(BinaryOp::Add, self, rhs)
    }
}

impl std::ops::Sub for Expression {
    type Output = Expression;

    fn sub(self, rhs: Expression) -> Expression {
        Expression::binary(BinaryOp::Sub, self, rhs)
    }
}

impl std::ops::Mul for Expression {
    type Output = Expression;

    fn mul(self, rhs: Expression) -> Expression {
        Expression::binary(BinaryOp::Mul, self, rhs)
    }
}

impl std::ops::Div for Expression {
    type Output = Expression;

    fn div(self, rhs: Expression) -> Expression {
        Expression::binary(BinaryOp::Div, self, rhs)
    }
}

impl std::ops::Add<f64> for Expression {
    type Output = Expression;

    fn add(self, rhs: f64) -> Expression {
        self + Expression::constant(rhs)
    }
}

impl std::ops::Sub<f64> for Expression {
    type Output = Expression;

    fn sub(self, rhs: f64) -> Expression {
        self - Expression::constant(rhs)
    }
}

impl std::ops::Mul<f64> for Expression {
    type Output = Expression;

    fn mul(self, rhs: f64) -> Expression {
        self * Expression::constant(rhs)
    }
}

impl std::ops::Div<f64> for Expression {
    type Output = Expression;

    fn div(self, rhs: f64) -> Expression {
        self / Expression::constant(rhs)
    }
}

impl std::ops::Add<Expression> for f64 {
    type Output = Expression;

    fn add(self, rhs: Expression) -> Expression {
        Expression::constant(self) + rhs
    }
}

impl std::ops::Sub<Expression> for f64 {
    type Output = Expression;

    fn sub(self, rhs: Expression) -> Expression {
        Expression::constant(self) - rhs
    }
}

impl std::ops::Mul<Expression> for f64 {
    type Output = Expression;

    fn mul(self, rhs: Expression) -> Expression {
        Expression::constant(self) * rhs
    }
}

impl std::ops::Div<Expression> for f64 {
    type Output = Expression;

    fn div(self, rhs: Expression) -> Expression {
        Expression::constant(self) / rhs
    }
}

// =================================================================================================
// Display
// =================================================================================================

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node() {
            ExprNode::Constant(value) => write!(f, "{value}"),
            ExprNode::Variable { name, .. } => write!(f, "{name}"),
            ExprNode::Parameter(name) => write!(f, "{name}"),
            ExprNode::Unary(UnaryOp::Neg, inner) => write!(f, "(-{inner})"),
            ExprNode::Binary(op, left, right) => {
                write!(f, "({left} {} {right})", op.symbol())
            }
            ExprNode::Gradient(inner) => write!(f, "grad({inner})"),
            ExprNode::Divergence(inner) => write!(f, "div({inner})"),
            ExprNode::SurfaceValue(inner) => write!(f, "surf({inner})"),
        }
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // ===== Construction and identity =====

    #[test]
    fn test_variable_ids_are_unique() {
        let a = Variable::new("c", "particle");
        let b = Variable::new("c", "particle");
        assert_ne!(a.id(), b.id());
        assert_eq!(a.name(), b.name());
    }

    #[test]
    fn test_clone_shares_the_node() {
        let c = Variable::new("c", "particle");
        let expr = Expression::from(&c) * 2.0;
        let copy = expr.clone();
        assert!(expr.ptr_eq(&copy));

        let rebuilt = Expression::from(&c) * 2.0;
        assert!(!expr.ptr_eq(&rebuilt));
    }

    #[test]
    fn test_subexpression_reuse_does_not_copy() {
        let c = Variable::new("c", "particle");
        let shared = surf(&c);
        let product = shared.clone() * shared.clone();

        if let ExprNode::Binary(BinaryOp::Mul, left, right) = product.node() {
            assert!(left.ptr_eq(right));
        } else {
            panic!("expected a product node");
        }
    }

    // ===== Operators =====

    #[test]
    fn test_arithmetic_display() {
        let c = Variable::new("c", "particle");
        let j0 = Parameter::new("j0");
        let expr = Expression::from(&j0) * (1.0 - Expression::from(&c));
        assert_eq!(expr.to_string(), "(j0 * (1 - c))");
    }

    #[test]
    fn test_spatial_operator_display() {
        let c = Variable::new("c", "particle");
        let rate = -div(-grad(&c));
        assert_eq!(rate.to_string(), "(-div((-grad(c))))");
        assert_eq!(surf(&c).to_string(), "surf(c)");
    }

    #[test]
    fn test_pow_and_sqrt() {
        let x = Expression::constant(9.0);
        let params = ParameterValues::new();
        assert_relative_eq!(x.clone().sqrt().evaluate_scalar(&params).unwrap(), 3.0);
        assert_relative_eq!(x.pow(2.0).evaluate_scalar(&params).unwrap(), 81.0);
    }

    // ===== Queries =====

    #[test]
    fn test_parameter_collection() {
        let c = Variable::new("c", "particle");
        let j0 = Parameter::new("j0");
        let k = Parameter::new("k");
        let expr = Expression::from(&j0) * surf(&c) + Expression::from(&k);

        let names = expr.parameters();
        assert_eq!(names.len(), 2);
        assert!(names.contains("j0"));
        assert!(names.contains("k"));
    }

    #[test]
    fn test_gradient_target_collection() {
        let c = Variable::new("c", "particle");
        let other = Variable::new("phi", "particle");
        let expr = div(grad(&c)) + surf(&other);

        let mut targets = BTreeMap::new();
        expr.collect_gradient_targets(&mut targets);
        assert_eq!(targets.len(), 1);
        assert!(targets.contains_key(&c.id()));
    }

    #[test]
    fn test_contains_spatial_operator() {
        let c = Variable::new("c", "particle");
        assert!(div(grad(&c)).contains_spatial_operator());
        assert!(!(Expression::from(&c) * 2.0).contains_spatial_operator());
    }

    // ===== Scalar evaluation =====

    #[test]
    fn test_evaluate_scalar_with_parameters() {
        let c0 = Parameter::new("c0");
        let expr = Expression::from(&c0) * 2.0 + 0.1;
        let params = ParameterValues::new().with("c0", 0.9);
        assert_relative_eq!(expr.evaluate_scalar(&params).unwrap(), 1.9);
    }

    #[test]
    fn test_evaluate_scalar_missing_parameter() {
        let c0 = Parameter::new("c0");
        let expr = Expression::from(&c0) + 1.0;
        let err = expr.evaluate_scalar(&ParameterValues::new()).unwrap_err();
        assert_eq!(err, ModelError::missing_parameter("c0"));
    }

    #[test]
    fn test_evaluate_scalar_rejects_variables() {
        let c = Variable::new("c", "particle");
        let err = Expression::from(&c)
            .evaluate_scalar(&ParameterValues::new())
            .unwrap_err();
        assert!(matches!(err, ModelError::NonConstantExpression { .. }));
    }

    #[test]
    fn test_evaluate_scalar_rejects_spatial_operators() {
        let c = Variable::new("c", "particle");
        let err = grad(&c)
            .evaluate_scalar(&ParameterValues::new())
            .unwrap_err();
        assert!(matches!(err, ModelError::NonConstantExpression { .. }));
    }

    #[test]
    fn test_negation_evaluates() {
        let expr = -Expression::constant(0.8);
        assert_relative_eq!(
            expr.evaluate_scalar(&ParameterValues::new()).unwrap(),
            -0.8
        );
    }
}
