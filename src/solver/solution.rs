//! Solution storage and named-output extraction.
//!
//! Solvers produce a bare trajectory: times, states and metadata. When
//! the integrated system came out of discretization, the solution also
//! carries that system's compiled outputs, so model-level names like
//! `"Surface concentration"` can be extracted as [`ProcessedVariable`]s
//! without re-running anything.

use std::collections::HashMap;

use nalgebra::DVector;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::discretization::system::{FieldData, PostProcessing};
use crate::error::SolverError;

// =================================================================================================
// Solution
// =================================================================================================

/// The result of a time integration.
///
/// Holds the sampled times (strictly increasing, spanning the requested
/// interval inclusively), the state at each sample, and free-form
/// metadata recorded by the solver (step counts, function evaluations
/// and similar). Extraction of named outputs is available once
/// post-processing has been attached, which
/// [`DiscretizedSystem::solve`](crate::discretization::DiscretizedSystem::solve)
/// does automatically.
#[derive(Debug, Clone)]
pub struct Solution {
    times: Vec<f64>,
    states: Vec<DVector<f64>>,
    final_state: DVector<f64>,
    metadata: HashMap<String, String>,
    post_processing: Option<PostProcessing>,
}

impl Solution {
    /// Creates a solution from a sampled trajectory.
    ///
    /// # Panics
    ///
    /// Panics if `times` and `states` differ in length or are empty;
    /// solvers always record at least the initial sample.
    pub fn new(times: Vec<f64>, states: Vec<DVector<f64>>, final_state: DVector<f64>) -> Self {
        assert_eq!(
            times.len(),
            states.len(),
            "every sampled time needs exactly one state"
        );
        assert!(!times.is_empty(), "a solution holds at least one sample");
        Self {
            times,
            states,
            final_state,
            metadata: HashMap::new(),
            post_processing: None,
        }
    }

    pub(crate) fn attach_post_processing(&mut self, post_processing: PostProcessing) {
        self.post_processing = Some(post_processing);
    }

    // ======== Queries ========

    #[inline]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    #[inline]
    pub fn states(&self) -> &[DVector<f64>] {
        &self.states
    }

    /// State at the end of the span.
    #[inline]
    pub fn final_state(&self) -> &DVector<f64> {
        &self.final_state
    }

    /// Number of sampled times.
    #[inline]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    pub fn add_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    // ======== Output extraction ========

    /// Extracts a named output as a trajectory over the sampled times.
    ///
    /// Fails with [`SolverError::UnknownVariable`] when no output of
    /// that name exists (or when the solution was produced from a raw
    /// system with no outputs attached).
    ///
    /// Outputs built from expressions with no associated domain have no
    /// length scale on record; extraction still succeeds, logging a
    /// warning and substituting a scale of 1.
    pub fn variable(&self, name: &str) -> Result<ProcessedVariable, SolverError> {
        let post = self
            .post_processing
            .as_ref()
            .ok_or_else(|| SolverError::unknown_variable(name))?;
        let output = post
            .outputs
            .iter()
            .find(|o| o.name == name)
            .ok_or_else(|| SolverError::unknown_variable(name))?;

        let length_scale = match &output.domain {
            Some(domain) => match post.length_scales.get(domain) {
                Some(scale) => *scale,
                None => {
                    log::warn!(
                        "no length scale recorded for domain '{domain}'; \
                         defaulting to 1 for output '{name}'"
                    );
                    1.0
                }
            },
            None => {
                log::warn!(
                    "output '{name}' has no associated domain; \
                     defaulting to a length scale of 1"
                );
                1.0
            }
        };

        #[cfg(feature = "parallel")]
        let fields: Vec<FieldData> = self
            .states
            .par_iter()
            .map(|state| output.expr.evaluate(state))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let fields: Vec<FieldData> = self
            .states
            .iter()
            .map(|state| output.expr.evaluate(state))
            .collect();

        // All samples share one shape: the expression is fixed.
        let data = match fields.first() {
            Some(FieldData::Scalar(_)) => ProcessedData::Scalars(
                fields
                    .into_iter()
                    .map(|f| match f {
                        FieldData::Scalar(v) => v,
                        _ => unreachable!("output shape changed between samples"),
                    })
                    .collect(),
            ),
            _ => ProcessedData::Profiles(
                fields
                    .into_iter()
                    .map(|f| match f {
                        FieldData::Cells(v) => v,
                        _ => unreachable!("output shape changed between samples"),
                    })
                    .collect(),
            ),
        };

        Ok(ProcessedVariable {
            name: name.to_string(),
            times: self.times.clone(),
            data,
            length_scale,
        })
    }
}

// =================================================================================================
// Processed variables
// =================================================================================================

/// Trajectory data of one extracted output.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessedData {
    /// One value per sampled time (scalar outputs such as surface values).
    Scalars(Vec<f64>),
    /// One spatial profile per sampled time (field outputs).
    Profiles(Vec<DVector<f64>>),
}

/// A named output evaluated over a solution's trajectory.
#[derive(Debug, Clone)]
pub struct ProcessedVariable {
    name: String,
    times: Vec<f64>,
    data: ProcessedData,
    length_scale: f64,
}

impl ProcessedVariable {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    #[inline]
    pub fn data(&self) -> &ProcessedData {
        &self.data
    }

    /// Spatial scale of the output's domain, 1 when it has none.
    #[inline]
    pub fn length_scale(&self) -> f64 {
        self.length_scale
    }

    /// Number of sampled times.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// The trajectory as scalars, `None` for profile outputs.
    pub fn as_scalars(&self) -> Option<&[f64]> {
        match &self.data {
            ProcessedData::Scalars(values) => Some(values),
            ProcessedData::Profiles(_) => None,
        }
    }

    /// The trajectory as spatial profiles, `None` for scalar outputs.
    pub fn as_profiles(&self) -> Option<&[DVector<f64>]> {
        match &self.data {
            ProcessedData::Profiles(profiles) => Some(profiles),
            ProcessedData::Scalars(_) => None,
        }
    }
}

// =================================================================================================
// Tests
// =================================================================================================
