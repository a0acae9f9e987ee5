//! Compiled systems: the output of discretization.
//!
//! Discretization lowers every symbolic expression into a small
//! evaluable IR ([`DiscreteExpr`]) over a single flat state vector.
//! Variable references become state slices, parameters become literals,
//! and the spatial operators carry their stencils inline, so evaluating a
//! right-hand side is a pure tree walk with no lookups and no symbolic
//! machinery left.
//!
//! Shapes (scalar / cell field / face field) are fully checked while
//! compiling; evaluation trusts them. A shape violation during evaluation
//! therefore indicates a compiler bug and panics rather than returning an
//! error.

use std::collections::HashMap;

use nalgebra::DVector;

use crate::discretization::traits::{
    BoundaryValueStencil, DivergenceStencil, GradientStencil,
};
use crate::error::{DiscretizationError, SolverError};
use crate::mesh::Mesh;
use crate::solver::solution::Solution;
use crate::solver::traits::{OdeSystem, Solver, TimeSpan};
use crate::symbolic::expression::{BinaryOp, UnaryOp, Variable, VariableId};
use crate::symbolic::BoundaryKind;

// =================================================================================================
// Field data
// =================================================================================================

/// The value of a compiled expression at one state.
///
/// Cell fields live at cell centres (length N), face fields at cell
/// boundaries (length N+1); scalars broadcast against either.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldData {
    Scalar(f64),
    Cells(DVector<f64>),
    Faces(DVector<f64>),
}

impl FieldData {
    /// Number of stored values (1 for a scalar).
    pub fn len(&self) -> usize {
        match self {
            FieldData::Scalar(_) => 1,
            FieldData::Cells(v) | FieldData::Faces(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            FieldData::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_cells(&self) -> Option<&DVector<f64>> {
        match self {
            FieldData::Cells(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_faces(&self) -> Option<&DVector<f64>> {
        match self {
            FieldData::Faces(v) => Some(v),
            _ => None,
        }
    }

    fn map(self, f: impl Fn(f64) -> f64) -> FieldData {
        match self {
            FieldData::Scalar(v) => FieldData::Scalar(f(v)),
            FieldData::Cells(v) => FieldData::Cells(v.map(f)),
            FieldData::Faces(v) => FieldData::Faces(v.map(f)),
        }
    }

    /// Elementwise combination with scalar broadcasting. Location
    /// compatibility was proven at compile time.
    fn combine(op: BinaryOp, a: FieldData, b: FieldData) -> FieldData {
        match (a, b) {
            (FieldData::Scalar(x), FieldData::Scalar(y)) => FieldData::Scalar(op.apply(x, y)),
            (FieldData::Scalar(x), FieldData::Cells(v)) => {
                FieldData::Cells(v.map(|y| op.apply(x, y)))
            }
            (FieldData::Cells(v), FieldData::Scalar(y)) => {
                FieldData::Cells(v.map(|x| op.apply(x, y)))
            }
            (FieldData::Scalar(x), FieldData::Faces(v)) => {
                FieldData::Faces(v.map(|y| op.apply(x, y)))
            }
            (FieldData::Faces(v), FieldData::Scalar(y)) => {
                FieldData::Faces(v.map(|x| op.apply(x, y)))
            }
            (FieldData::Cells(a), FieldData::Cells(b)) => {
                FieldData::Cells(a.zip_map(&b, |x, y| op.apply(x, y)))
            }
            (FieldData::Faces(a), FieldData::Faces(b)) => {
                FieldData::Faces(a.zip_map(&b, |x, y| op.apply(x, y)))
            }
            _ => panic!("cell and face fields combined; shape checking should have rejected this"),
        }
    }
}

// =================================================================================================
// Compiled expression IR
// =================================================================================================

/// A boundary condition after compilation: its kind plus the compiled
/// (scalar-shaped) value expression.
#[derive(Debug, Clone)]
pub(crate) struct CompiledBoundary {
    pub(crate) kind: BoundaryKind,
    pub(crate) value: Box<DiscreteExpr>,
}

impl CompiledBoundary {
    fn scalar(&self, state: &DVector<f64>) -> f64 {
        match self.value.evaluate(state) {
            FieldData::Scalar(v) => v,
            other => panic!(
                "boundary value evaluated to a {}-element field; shape checking should have rejected this",
                other.len()
            ),
        }
    }
}

/// Evaluable lowered expression.
#[derive(Debug, Clone)]
pub(crate) enum DiscreteExpr {
    Scalar(f64),
    /// A variable's slice of the flat state vector, as a cell field.
    State { offset: usize, len: usize },
    Unary(UnaryOp, Box<DiscreteExpr>),
    Binary(BinaryOp, Box<DiscreteExpr>, Box<DiscreteExpr>),
    Gradient {
        inner: Box<DiscreteExpr>,
        stencil: GradientStencil,
        left: CompiledBoundary,
        right: CompiledBoundary,
    },
    Divergence {
        inner: Box<DiscreteExpr>,
        stencil: DivergenceStencil,
    },
    BoundaryValue {
        inner: Box<DiscreteExpr>,
        stencil: BoundaryValueStencil,
    },
}

impl DiscreteExpr {
    pub(crate) fn evaluate(&self, state: &DVector<f64>) -> FieldData {
        match self {
            DiscreteExpr::Scalar(v) => FieldData::Scalar(*v),
            DiscreteExpr::State { offset, len } => {
                FieldData::Cells(DVector::from_fn(*len, |i, _| state[offset + i]))
            }
            DiscreteExpr::Unary(UnaryOp::Neg, inner) => inner.evaluate(state).map(|x| -x),
            DiscreteExpr::Binary(op, a, b) => {
                FieldData::combine(*op, a.evaluate(state), b.evaluate(state))
            }
            DiscreteExpr::Gradient {
                inner,
                stencil,
                left,
                right,
            } => {
                let cells = match inner.evaluate(state) {
                    FieldData::Cells(v) => v,
                    _ => panic!("gradient of a non-cell field; shape checking should have rejected this"),
                };
                let n = cells.len();
                let mut faces = DVector::zeros(n + 1);
                for j in 1..n {
                    faces[j] = (cells[j] - cells[j - 1]) * stencil.interior_inv[j];
                }
                faces[0] = match left.kind {
                    BoundaryKind::Neumann => left.scalar(state),
                    BoundaryKind::Dirichlet => {
                        (cells[0] - left.scalar(state)) * stencil.left_gap_inv
                    }
                };
                faces[n] = match right.kind {
                    BoundaryKind::Neumann => right.scalar(state),
                    BoundaryKind::Dirichlet => {
                        (right.scalar(state) - cells[n - 1]) * stencil.right_gap_inv
                    }
                };
                FieldData::Faces(faces)
            }
            DiscreteExpr::Divergence { inner, stencil } => {
                let faces = match inner.evaluate(state) {
                    FieldData::Faces(v) => v,
                    _ => panic!("divergence of a non-face field; shape checking should have rejected this"),
                };
                let n = faces.len() - 1;
                FieldData::Cells(DVector::from_fn(n, |i, _| {
                    (stencil.face_areas[i + 1] * faces[i + 1] - stencil.face_areas[i] * faces[i])
                        * stencil.inv_volumes[i]
                }))
            }
            DiscreteExpr::BoundaryValue { inner, stencil } => {
                let cells = match inner.evaluate(state) {
                    FieldData::Cells(v) => v,
                    _ => panic!("surface value of a non-cell field; shape checking should have rejected this"),
                };
                FieldData::Scalar(stencil.apply(&cells))
            }
        }
    }
}

// =================================================================================================
// State layout
// =================================================================================================

/// One variable's slice of the flat state vector.
#[derive(Debug, Clone)]
pub struct LayoutEntry {
    id: VariableId,
    name: String,
    domain: String,
    offset: usize,
    len: usize,
}

impl LayoutEntry {
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

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Index range of this variable within the state vector.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// Stable mapping from model variables onto the flat state vector.
///
/// Variables are grouped contiguously per domain, domains ordered by
/// first appearance, variables within a domain by registration order.
/// The mapping is deterministic for a given model.
#[derive(Debug, Clone)]
pub struct StateLayout {
    entries: Vec<LayoutEntry>,
    total: usize,
}

impl StateLayout {
    pub(crate) fn build(
        unknowns: &[&Variable],
        mesh: &Mesh,
    ) -> Result<Self, DiscretizationError> {
        let mut domain_order: Vec<&str> = Vec::new();
        for var in unknowns {
            if !domain_order.contains(&var.domain()) {
                domain_order.push(var.domain());
            }
        }

        let mut entries = Vec::with_capacity(unknowns.len());
        let mut offset = 0;
        for domain in domain_order {
            let mesh1d = mesh
                .get(domain)
                .ok_or_else(|| DiscretizationError::missing_mesh(domain))?;
            for var in unknowns.iter().filter(|v| v.domain() == domain) {
                entries.push(LayoutEntry {
                    id: var.id(),
                    name: var.name().to_string(),
                    domain: domain.to_string(),
                    offset,
                    len: mesh1d.n_cells(),
                });
                offset += mesh1d.n_cells();
            }
        }

        Ok(Self {
            entries,
            total: offset,
        })
    }

    /// Total state vector length.
    #[inline]
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn entries(&self) -> &[LayoutEntry] {
        &self.entries
    }

    pub fn entry(&self, id: VariableId) -> Option<&LayoutEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn entry_by_name(&self, name: &str) -> Option<&LayoutEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

// =================================================================================================
// Compiled outputs and post-processing bundle
// =================================================================================================

/// A named output after compilation.
#[derive(Debug, Clone)]
pub(crate) struct CompiledOutput {
    pub(crate) name: String,
    pub(crate) expr: DiscreteExpr,
    /// Domain the output's expression draws from, if any; resolves the
    /// length scale during post-processing.
    pub(crate) domain: Option<String>,
}

/// Everything a [`Solution`] needs to re-evaluate named outputs.
#[derive(Debug, Clone)]
pub(crate) struct PostProcessing {
    pub(crate) outputs: Vec<CompiledOutput>,
    pub(crate) length_scales: HashMap<String, f64>,
}

/// A right-hand side or residual equation bound to its state slice.
#[derive(Debug, Clone)]
pub(crate) struct CompiledEquation {
    pub(crate) offset: usize,
    pub(crate) len: usize,
    pub(crate) expr: DiscreteExpr,
}

// =================================================================================================
// Discretized system
// =================================================================================================

/// A model lowered onto meshes: the solvable object.
///
/// Holds the state layout, compiled equations and outputs, and the
/// initial state evaluated at t=0. Immutable once built; solvers only
/// read from it.
#[derive(Debug, Clone)]
pub struct DiscretizedSystem {
    name: String,
    layout: StateLayout,
    rhs: Vec<CompiledEquation>,
    algebraic: Vec<CompiledEquation>,
    outputs: Vec<CompiledOutput>,
    initial_state: DVector<f64>,
    length_scales: HashMap<String, f64>,
}

impl DiscretizedSystem {
    pub(crate) fn new(
        name: String,
        layout: StateLayout,
        rhs: Vec<CompiledEquation>,
        algebraic: Vec<CompiledEquation>,
        outputs: Vec<CompiledOutput>,
        initial_state: DVector<f64>,
        length_scales: HashMap<String, f64>,
    ) -> Self {
        Self {
            name,
            layout,
            rhs,
            algebraic,
            outputs,
            initial_state,
            length_scales,
        }
    }

    #[inline]
    pub fn layout(&self) -> &StateLayout {
        &self.layout
    }

    /// Length of the flat state vector.
    #[inline]
    pub fn state_size(&self) -> usize {
        self.layout.len()
    }

    /// The state at t=0, from the model's initial conditions.
    #[inline]
    pub fn initial_state_vector(&self) -> &DVector<f64> {
        &self.initial_state
    }

    /// Names of the compiled outputs, in model order.
    pub fn output_names(&self) -> Vec<&str> {
        self.outputs.iter().map(|o| o.name.as_str()).collect()
    }

    /// Evaluates one named output at an arbitrary state.
    pub fn evaluate_output(&self, name: &str, state: &DVector<f64>) -> Option<FieldData> {
        self.outputs
            .iter()
            .find(|o| o.name == name)
            .map(|o| o.expr.evaluate(state))
    }

    /// Length scale of a domain (its extent), if the domain exists.
    pub fn length_scale(&self, domain: &str) -> Option<f64> {
        self.length_scales.get(domain).copied()
    }

    pub(crate) fn post_processing(&self) -> PostProcessing {
        PostProcessing {
            outputs: self.outputs.clone(),
            length_scales: self.length_scales.clone(),
        }
    }

    /// Integrates the system and attaches output post-processing to the
    /// returned [`Solution`], enabling named-variable extraction.
    pub fn solve(&self, solver: &dyn Solver, span: TimeSpan) -> Result<Solution, SolverError> {
        let mut solution = solver.solve(self, span)?;
        solution.attach_post_processing(self.post_processing());
        Ok(solution)
    }
}

impl OdeSystem for DiscretizedSystem {
    fn dimension(&self) -> usize {
        self.layout.len()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn initial_state(&self) -> DVector<f64> {
        self.initial_state.clone()
    }

    fn rhs(&self, _time: f64, state: &DVector<f64>) -> DVector<f64> {
        let mut out = DVector::zeros(self.layout.len());
        for eq in &self.rhs {
            match eq.expr.evaluate(state) {
                FieldData::Scalar(v) => {
                    for i in 0..eq.len {
                        out[eq.offset + i] = v;
                    }
                }
                FieldData::Cells(values) => {
                    for i in 0..eq.len {
                        out[eq.offset + i] = values[i];
                    }
                }
                FieldData::Faces(_) => {
                    panic!("face-shaped right-hand side; shape checking should have rejected this")
                }
            }
        }
        out
    }

    fn has_algebraic(&self) -> bool {
        !self.algebraic.is_empty()
    }

    fn algebraic_residual(&self, _time: f64, state: &DVector<f64>) -> Option<DVector<f64>> {
        if self.algebraic.is_empty() {
            return None;
        }
        let total: usize = self.algebraic.iter().map(|eq| eq.len).sum();
        let mut residual = DVector::zeros(total);
        let mut cursor = 0;
        for eq in &self.algebraic {
            match eq.expr.evaluate(state) {
                FieldData::Scalar(v) => {
                    for i in 0..eq.len {
                        residual[cursor + i] = v;
                    }
                }
                FieldData::Cells(values) => {
                    for i in 0..eq.len {
                        residual[cursor + i] = values[i];
                    }
                }
                FieldData::Faces(_) => {
                    panic!("face-shaped residual; shape checking should have rejected this")
                }
            }
            cursor += eq.len;
        }
        Some(residual)
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discretization::finite_volume::FiniteVolume;
    use crate::discretization::traits::SpatialMethod;
    use crate::mesh::{
        CoordinateRange, CoordinateSystem, DomainGeometry, Geometry, Mesh1D, SubmeshType,
    };
    use crate::symbolic::DomainSide;
    use approx::assert_relative_eq;
    use std::collections::HashMap as StdHashMap;

    fn sphere_mesh(cells: usize) -> Mesh1D {
        let geometry = DomainGeometry::spherical("r", 0.0, 1.0);
        Mesh1D::generate("particle", &geometry, SubmeshType::Uniform1D, cells)
    }

    fn neumann(value: f64) -> CompiledBoundary {
        CompiledBoundary {
            kind: BoundaryKind::Neumann,
            value: Box::new(DiscreteExpr::Scalar(value)),
        }
    }

    fn dirichlet(value: f64) -> CompiledBoundary {
        CompiledBoundary {
            kind: BoundaryKind::Dirichlet,
            value: Box::new(DiscreteExpr::Scalar(value)),
        }
    }

    // ===== FieldData =====

    #[test]
    fn test_field_data_broadcasting() {
        let cells = FieldData::Cells(DVector::from_vec(vec![1.0, 2.0, 3.0]));
        let sum = FieldData::combine(BinaryOp::Add, FieldData::Scalar(1.0), cells);
        assert_eq!(
            sum,
            FieldData::Cells(DVector::from_vec(vec![2.0, 3.0, 4.0]))
        );
    }

    #[test]
    fn test_field_data_elementwise_product() {
        let a = FieldData::Cells(DVector::from_vec(vec![2.0, 3.0]));
        let b = FieldData::Cells(DVector::from_vec(vec![5.0, 7.0]));
        let product = FieldData::combine(BinaryOp::Mul, a, b);
        assert_eq!(
            product,
            FieldData::Cells(DVector::from_vec(vec![10.0, 21.0]))
        );
    }

    #[test]
    #[should_panic(expected = "cell and face fields")]
    fn test_field_data_rejects_mixed_locations() {
        let cells = FieldData::Cells(DVector::from_vec(vec![1.0, 2.0]));
        let faces = FieldData::Faces(DVector::from_vec(vec![1.0, 2.0, 3.0]));
        FieldData::combine(BinaryOp::Add, cells, faces);
    }

    // ===== IR evaluation =====

    #[test]
    fn test_state_slice_evaluation() {
        let expr = DiscreteExpr::State { offset: 1, len: 2 };
        let state = DVector::from_vec(vec![10.0, 20.0, 30.0, 40.0]);
        assert_eq!(
            expr.evaluate(&state),
            FieldData::Cells(DVector::from_vec(vec![20.0, 30.0]))
        );
    }

    #[test]
    fn test_gradient_injects_neumann_values_exactly() {
        let mesh = sphere_mesh(5);
        let method = FiniteVolume::new();
        let expr = DiscreteExpr::Gradient {
            inner: Box::new(DiscreteExpr::State { offset: 0, len: 5 }),
            stencil: method.gradient(&mesh),
            left: neumann(0.0),
            right: neumann(-0.8),
        };

        let state = DVector::from_element(5, 0.9);
        let faces = expr.evaluate(&state);
        let faces = faces.as_faces().unwrap();
        assert_eq!(faces[0], 0.0);
        assert_eq!(faces[5], -0.8);
        for j in 1..5 {
            assert_eq!(faces[j], 0.0);
        }
    }

    #[test]
    fn test_laplacian_of_constant_field_is_zero() {
        let mesh = sphere_mesh(20);
        let method = FiniteVolume::new();
        let expr = DiscreteExpr::Divergence {
            inner: Box::new(DiscreteExpr::Gradient {
                inner: Box::new(DiscreteExpr::State { offset: 0, len: 20 }),
                stencil: method.gradient(&mesh),
                left: neumann(0.0),
                right: neumann(0.0),
            }),
            stencil: method.divergence(&mesh),
        };

        let state = DVector::from_element(20, 0.37);
        let cells = expr.evaluate(&state);
        for value in cells.as_cells().unwrap().iter() {
            assert_relative_eq!(*value, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_spherical_laplacian_of_r_squared_is_six() {
        // ∇·(∇ r²) = 6 in spherical polars; the finite-volume form
        // reproduces it exactly because face gradients of a quadratic
        // from centred differences are exact.
        let mesh = sphere_mesh(10);
        let method = FiniteVolume::new();
        let expr = DiscreteExpr::Divergence {
            inner: Box::new(DiscreteExpr::Gradient {
                inner: Box::new(DiscreteExpr::State { offset: 0, len: 10 }),
                stencil: method.gradient(&mesh),
                left: neumann(0.0),
                right: neumann(2.0),
            }),
            stencil: method.divergence(&mesh),
        };

        let state = mesh.nodes().map(|r| r * r);
        let cells = expr.evaluate(&state);
        for value in cells.as_cells().unwrap().iter() {
            assert_relative_eq!(*value, 6.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_dirichlet_gradient_for_linear_profile() {
        let geometry = DomainGeometry::new(
            CoordinateSystem::Cartesian,
            CoordinateRange::new("x", 0.0, 1.0),
        );
        let mesh = Mesh1D::generate("layer", &geometry, SubmeshType::Uniform1D, 4);
        let method = FiniteVolume::new();
        let expr = DiscreteExpr::Gradient {
            inner: Box::new(DiscreteExpr::State { offset: 0, len: 4 }),
            stencil: method.gradient(&mesh),
            left: dirichlet(0.0),
            right: dirichlet(1.0),
        };

        // c(x) = x: every face gradient, boundary ones included, is 1.
        let state = mesh.nodes().clone();
        let faces = expr.evaluate(&state);
        for value in faces.as_faces().unwrap().iter() {
            assert_relative_eq!(*value, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_state_dependent_boundary_value() {
        // The right boundary carries a flux depending on the surface
        // value of the field itself.
        let mesh = sphere_mesh(6);
        let method = FiniteVolume::new();
        let surface = DiscreteExpr::BoundaryValue {
            inner: Box::new(DiscreteExpr::State { offset: 0, len: 6 }),
            stencil: method.boundary_value(&mesh, DomainSide::Right),
        };
        let expr = DiscreteExpr::Gradient {
            inner: Box::new(DiscreteExpr::State { offset: 0, len: 6 }),
            stencil: method.gradient(&mesh),
            left: neumann(0.0),
            right: CompiledBoundary {
                kind: BoundaryKind::Neumann,
                value: Box::new(DiscreteExpr::Unary(UnaryOp::Neg, Box::new(surface))),
            },
        };

        let state = DVector::from_element(6, 0.5);
        let faces = expr.evaluate(&state);
        assert_relative_eq!(faces.as_faces().unwrap()[6], -0.5, epsilon = 1e-12);
    }

    // ===== Layout =====

    fn two_domain_mesh() -> Mesh {
        let geometry = Geometry::new()
            .with_domain("particle", DomainGeometry::spherical("r", 0.0, 1.0))
            .with_domain(
                "electrode",
                DomainGeometry::new(
                    CoordinateSystem::Cartesian,
                    CoordinateRange::new("x", 0.0, 1.0),
                ),
            );
        let types = StdHashMap::from([
            ("particle".to_string(), SubmeshType::Uniform1D),
            ("electrode".to_string(), SubmeshType::Uniform1D),
        ]);
        let points = StdHashMap::from([("r".to_string(), 4), ("x".to_string(), 3)]);
        Mesh::new(&geometry, &types, &points).unwrap()
    }

    #[test]
    fn test_layout_groups_by_domain() {
        let a = Variable::new("a", "particle");
        let b = Variable::new("b", "electrode");
        let c = Variable::new("c", "particle");
        let mesh = two_domain_mesh();

        let layout = StateLayout::build(&[&a, &b, &c], &mesh).unwrap();
        assert_eq!(layout.len(), 4 + 4 + 3);

        // Particle variables first (a then c, contiguous), electrode after.
        let entries = layout.entries();
        assert_eq!(entries[0].name(), "a");
        assert_eq!(entries[0].range(), 0..4);
        assert_eq!(entries[1].name(), "c");
        assert_eq!(entries[1].range(), 4..8);
        assert_eq!(entries[2].name(), "b");
        assert_eq!(entries[2].range(), 8..11);
    }

    #[test]
    fn test_layout_is_deterministic() {
        let a = Variable::new("a", "particle");
        let b = Variable::new("b", "electrode");
        let mesh = two_domain_mesh();
        let first = StateLayout::build(&[&a, &b], &mesh).unwrap();
        let second = StateLayout::build(&[&a, &b], &mesh).unwrap();
        for (x, y) in first.entries().iter().zip(second.entries()) {
            assert_eq!(x.offset(), y.offset());
            assert_eq!(x.len(), y.len());
        }
    }

    #[test]
    fn test_layout_missing_mesh() {
        let a = Variable::new("a", "nowhere");
        let mesh = two_domain_mesh();
        let err = StateLayout::build(&[&a], &mesh).unwrap_err();
        assert_eq!(err, DiscretizationError::missing_mesh("nowhere"));
    }

    #[test]
    fn test_layout_lookup() {
        let a = Variable::new("a", "particle");
        let mesh = two_domain_mesh();
        let layout = StateLayout::build(&[&a], &mesh).unwrap();
        assert!(layout.entry(a.id()).is_some());
        assert!(layout.entry_by_name("a").is_some());
        assert!(layout.entry_by_name("z").is_none());
    }

    // ===== DiscretizedSystem =====

    fn decay_system() -> DiscretizedSystem {
        // du/dt = -2 u on a 3-cell slab, initial value 1.
        let u = Variable::new("u", "slab");
        let geometry = Geometry::new().with_domain(
            "slab",
            DomainGeometry::new(
                CoordinateSystem::Cartesian,
                CoordinateRange::new("x", 0.0, 1.0),
            ),
        );
        let types = StdHashMap::from([("slab".to_string(), SubmeshType::Uniform1D)]);
        let points = StdHashMap::from([("x".to_string(), 3)]);
        let mesh = Mesh::new(&geometry, &types, &points).unwrap();
        let layout = StateLayout::build(&[&u], &mesh).unwrap();

        let rhs = vec![CompiledEquation {
            offset: 0,
            len: 3,
            expr: DiscreteExpr::Binary(
                BinaryOp::Mul,
                Box::new(DiscreteExpr::Scalar(-2.0)),
                Box::new(DiscreteExpr::State { offset: 0, len: 3 }),
            ),
        }];
        let outputs = vec![CompiledOutput {
            name: "u".to_string(),
            expr: DiscreteExpr::State { offset: 0, len: 3 },
            domain: Some("slab".to_string()),
        }];

        DiscretizedSystem::new(
            "decay".to_string(),
            layout,
            rhs,
            Vec::new(),
            outputs,
            DVector::from_element(3, 1.0),
            HashMap::from([("slab".to_string(), 1.0)]),
        )
    }

    #[test]
    fn test_system_rhs_assembly() {
        let system = decay_system();
        let state = DVector::from_vec(vec![1.0, 2.0, 3.0]);
        let rhs = system.rhs(0.0, &state);
        assert_eq!(rhs, DVector::from_vec(vec![-2.0, -4.0, -6.0]));
    }

    #[test]
    fn test_system_metadata() {
        let system = decay_system();
        assert_eq!(system.dimension(), 3);
        assert_eq!(OdeSystem::name(&system), "decay");
        assert!(!system.has_algebraic());
        assert!(system.algebraic_residual(0.0, &system.initial_state()).is_none());
        assert_eq!(system.output_names(), vec!["u"]);
        assert_eq!(system.length_scale("slab"), Some(1.0));
    }

    #[test]
    fn test_system_output_evaluation() {
        let system = decay_system();
        let state = DVector::from_vec(vec![0.1, 0.2, 0.3]);
        let out = system.evaluate_output("u", &state).unwrap();
        assert_eq!(out.as_cells().unwrap()[1], 0.2);
        assert!(system.evaluate_output("missing", &state).is_none());
    }

    #[test]
    fn test_algebraic_residual_stacking() {
        let system = decay_system();
        let algebraic = vec![CompiledEquation {
            offset: 0,
            len: 3,
            expr: DiscreteExpr::Binary(
                BinaryOp::Sub,
                Box::new(DiscreteExpr::State { offset: 0, len: 3 }),
                Box::new(DiscreteExpr::Scalar(1.0)),
            ),
        }];
        let with_algebraic = DiscretizedSystem::new(
            "constrained".to_string(),
            system.layout.clone(),
            Vec::new(),
            algebraic,
            Vec::new(),
            system.initial_state.clone(),
            HashMap::new(),
        );

        assert!(with_algebraic.has_algebraic());
        let residual = with_algebraic
            .algebraic_residual(0.0, &DVector::from_vec(vec![1.0, 1.5, 1.0]))
            .unwrap();
        assert_eq!(residual, DVector::from_vec(vec![0.0, 0.5, 0.0]));
    }
}
