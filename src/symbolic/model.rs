//! Model container: equations, boundary conditions, initial conditions.
//!
//! A [`Model`] is a passive collection. Assigning an equation performs no
//! checking beyond bookkeeping — the notebook-style workflow builds the
//! model piece by piece, and full consistency (every unknown has an
//! initial condition, every gradient target has complete boundary
//! conditions, output names are unique) is only enforced when the
//! discretizer calls [`Model::validate`]. Building an incomplete model is
//! therefore never an error; *using* one is.
//!
//! All collections key on [`VariableId`], so equations survive cloning of
//! the expression graph and are unaffected by variable name collisions.
//!
//! # Example
//!
//! ```rust
//! use bamm_rs::symbolic::{
//!     BoundaryKind, DomainSide, Expression, Model, Parameter, Variable, div, grad, surf,
//! };
//!
//! let c = Variable::new("c", "particle");
//! let j0 = Parameter::new("j0");
//! let c0 = Parameter::new("c0");
//!
//! let c_surf = surf(&c);
//! let j = Expression::from(&j0) * (1.0 - c_surf.clone()).sqrt() * c_surf.sqrt();
//!
//! let mut model = Model::new("spherical diffusion");
//! model.set_rhs(&c, -div(-grad(&c)));
//! model.set_boundary_condition(&c, DomainSide::Left, 0.0, BoundaryKind::Neumann);
//! model.set_boundary_condition(&c, DomainSide::Right, -j, BoundaryKind::Neumann);
//! model.set_initial_condition(&c, &c0);
//! model.add_output("Surface concentration", surf(&c));
//!
//! assert!(model.validate().is_ok());
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::ModelError;
use crate::symbolic::expression::{Expression, Variable, VariableId};

// =================================================================================================
// Boundary conditions
// =================================================================================================

/// Which edge of a 1-D domain a boundary condition applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainSide {
    /// The edge at the coordinate minimum (e.g. the particle centre).
    Left,
    /// The edge at the coordinate maximum (e.g. the particle surface).
    Right,
}

impl fmt::Display for DomainSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainSide::Left => write!(f, "left"),
            DomainSide::Right => write!(f, "right"),
        }
    }
}

/// The kind of condition imposed at a domain edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryKind {
    /// Fixes the field value at the edge.
    Dirichlet,
    /// Fixes the field gradient at the edge.
    Neumann,
}

impl fmt::Display for BoundaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryKind::Dirichlet => write!(f, "Dirichlet"),
            BoundaryKind::Neumann => write!(f, "Neumann"),
        }
    }
}

/// A single boundary condition: a value expression plus its kind.
///
/// The value may depend on parameters and on surface evaluations of model
/// variables (that is how state-dependent fluxes are written), but must
/// reduce to a scalar once discretized.
#[derive(Debug, Clone)]
pub struct BoundaryCondition {
    value: Expression,
    kind: BoundaryKind,
}

impl BoundaryCondition {
    pub fn new(value: impl Into<Expression>, kind: BoundaryKind) -> Self {
        Self {
            value: value.into(),
            kind,
        }
    }

    #[inline]
    pub fn value(&self) -> &Expression {
        &self.value
    }

    #[inline]
    pub fn kind(&self) -> BoundaryKind {
        self.kind
    }
}

/// The pair of conditions closing a variable's spatial problem.
#[derive(Debug, Clone, Default)]
pub struct BoundaryConditionSet {
    left: Option<BoundaryCondition>,
    right: Option<BoundaryCondition>,
}

impl BoundaryConditionSet {
    pub fn get(&self, side: DomainSide) -> Option<&BoundaryCondition> {
        match side {
            DomainSide::Left => self.left.as_ref(),
            DomainSide::Right => self.right.as_ref(),
        }
    }

    fn set(&mut self, side: DomainSide, condition: BoundaryCondition) {
        match side {
            DomainSide::Left => self.left = Some(condition),
            DomainSide::Right => self.right = Some(condition),
        }
    }

    /// Both sides present.
    pub fn is_complete(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }
}

// =================================================================================================
// Model
// =================================================================================================

/// A symbolic continuum model.
///
/// Holds, keyed by [`VariableId`]:
///
/// - `rhs` — differential equations `∂v/∂t = expression`
/// - `algebraic` — residual equations `0 = expression`
/// - boundary conditions per domain side
/// - initial conditions (parameter/constant expressions, evaluated at t=0)
///
/// plus an ordered named-output collection of derived expressions that a
/// [`Solution`](crate::solver::Solution) can re-evaluate over the state
/// history.
#[derive(Debug, Clone, Default)]
pub struct Model {
    name: String,
    variables: Vec<Variable>,
    rhs: HashMap<VariableId, Expression>,
    algebraic: HashMap<VariableId, Expression>,
    boundary_conditions: HashMap<VariableId, BoundaryConditionSet>,
    initial_conditions: HashMap<VariableId, Expression>,
    outputs: Vec<(String, Expression)>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn register(&mut self, var: &Variable) {
        if !self.variables.iter().any(|v| v.id() == var.id()) {
            self.variables.push(var.clone());
        }
    }

    // ======================================== Assignment ========================================

    /// Registers the differential equation `∂var/∂t = expr`.
    pub fn set_rhs(&mut self, var: &Variable, expr: impl Into<Expression>) {
        self.register(var);
        self.rhs.insert(var.id(), expr.into());
    }

    /// Registers the algebraic residual `0 = expr` for `var`.
    pub fn set_algebraic(&mut self, var: &Variable, expr: impl Into<Expression>) {
        self.register(var);
        self.algebraic.insert(var.id(), expr.into());
    }

    /// Registers one side of a variable's boundary conditions.
    pub fn set_boundary_condition(
        &mut self,
        var: &Variable,
        side: DomainSide,
        value: impl Into<Expression>,
        kind: BoundaryKind,
    ) {
        self.register(var);
        self.boundary_conditions
            .entry(var.id())
            .or_default()
            .set(side, BoundaryCondition::new(value, kind));
    }

    /// Registers the initial condition for `var`, evaluated at t=0.
    pub fn set_initial_condition(&mut self, var: &Variable, expr: impl Into<Expression>) {
        self.register(var);
        self.initial_conditions.insert(var.id(), expr.into());
    }

    /// Appends a named derived quantity.
    pub fn add_output(&mut self, name: impl Into<String>, expr: impl Into<Expression>) {
        self.outputs.push((name.into(), expr.into()));
    }

    // ========================================= Access =========================================

    /// Variables in registration order.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Variables that carry an equation (differential or algebraic), in
    /// registration order. These are the unknowns the state vector holds.
    pub fn unknowns(&self) -> Vec<&Variable> {
        self.variables
            .iter()
            .filter(|v| self.rhs.contains_key(&v.id()) || self.algebraic.contains_key(&v.id()))
            .collect()
    }

    pub fn variable(&self, id: VariableId) -> Option<&Variable> {
        self.variables.iter().find(|v| v.id() == id)
    }

    pub fn rhs_of(&self, id: VariableId) -> Option<&Expression> {
        self.rhs.get(&id)
    }

    pub fn algebraic_of(&self, id: VariableId) -> Option<&Expression> {
        self.algebraic.get(&id)
    }

    pub fn boundary_conditions_of(&self, id: VariableId) -> Option<&BoundaryConditionSet> {
        self.boundary_conditions.get(&id)
    }

    pub fn initial_condition_of(&self, id: VariableId) -> Option<&Expression> {
        self.initial_conditions.get(&id)
    }

    /// Named outputs in insertion order.
    pub fn outputs(&self) -> &[(String, Expression)] {
        &self.outputs
    }

    pub fn output(&self, name: &str) -> Option<&Expression> {
        self.outputs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, e)| e)
    }

    /// Whether any unknown is governed by an algebraic residual.
    pub fn has_algebraic(&self) -> bool {
        !self.algebraic.is_empty()
    }

    // ======================================= Validation =======================================

    /// Checks full model consistency.
    ///
    /// Called by the discretizer before any lowering happens; errors carry
    /// the offending variable or output name.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.rhs.is_empty() && self.algebraic.is_empty() {
            return Err(ModelError::EmptyModel {
                name: self.name.clone(),
            });
        }

        // A variable governed by two equation kinds is ill-posed.
        for var in &self.variables {
            if self.rhs.contains_key(&var.id()) && self.algebraic.contains_key(&var.id()) {
                return Err(ModelError::ConflictingEquations {
                    variable: var.name().to_string(),
                });
            }
        }

        let unknown_ids: HashSet<VariableId> =
            self.unknowns().iter().map(|v| v.id()).collect();

        // Every unknown needs an initial condition (algebraic unknowns use
        // theirs as the consistency check / initial guess).
        for var in self.unknowns() {
            if !self.initial_conditions.contains_key(&var.id()) {
                return Err(ModelError::missing_initial_condition(var.name()));
            }
        }

        // Every variable referenced anywhere must be an unknown of this
        // model, and every gradient target needs a complete boundary
        // condition set.
        let mut referenced = std::collections::BTreeMap::new();
        let mut gradient_targets = std::collections::BTreeMap::new();
        let equation_exprs = self.rhs.values().chain(self.algebraic.values());
        let bc_exprs = self
            .boundary_conditions
            .values()
            .flat_map(|set| [set.get(DomainSide::Left), set.get(DomainSide::Right)])
            .flatten()
            .map(BoundaryCondition::value);
        let output_exprs = self.outputs.iter().map(|(_, e)| e);

        for expr in equation_exprs.chain(bc_exprs).chain(output_exprs) {
            expr.collect_variables(&mut referenced);
            expr.collect_gradient_targets(&mut gradient_targets);
        }

        for (id, name) in &referenced {
            if !unknown_ids.contains(id) {
                return Err(ModelError::unknown_variable(name.clone()));
            }
        }

        for (id, name) in &gradient_targets {
            let complete = self
                .boundary_conditions
                .get(id)
                .map(BoundaryConditionSet::is_complete)
                .unwrap_or(false);
            if !complete {
                return Err(ModelError::missing_boundary_conditions(name.clone()));
            }
        }

        // Output names must be unique.
        let mut seen = HashSet::new();
        for (name, _) in &self.outputs {
            if !seen.insert(name.as_str()) {
                return Err(ModelError::DuplicateOutput { name: name.clone() });
            }
        }

        Ok(())
    }
}

// ==================== Tests ====================
