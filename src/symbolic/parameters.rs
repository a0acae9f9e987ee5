//! Parameter bindings.
//!
//! A model references parameters by name only; the numbers live here and
//! are supplied to the discretizer, which substitutes them into every
//! compiled expression. Keeping values out of the expression graph means
//! the same model can be processed with different parameter sets without
//! rebuilding anything symbolic.

use std::collections::HashMap;

/// Name → value bindings for the [`Parameter`](crate::symbolic::Parameter)s
/// of a model.
///
/// # Example
///
/// ```rust
/// use bamm_rs::symbolic::ParameterValues;
///
/// let params = ParameterValues::new().with("c0", 0.9).with("j0", 0.8);
/// assert_eq!(params.get("c0"), Some(0.9));
/// assert_eq!(params.get("unknown"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParameterValues {
    values: HashMap<String, f64>,
}

impl ParameterValues {
    /// Creates an empty binding set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion.
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Inserts or overwrites a binding.
    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    /// Looks up a binding by name.
    #[inline]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Whether a binding exists for `name`.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for ParameterValues {
    fn from_iter<T: IntoIterator<Item = (S, f64)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }
}
