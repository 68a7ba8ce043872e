//! Configuration builder for tree growth.

use crate::dataset::PatternSet;
use crate::error::CartError;
use crate::impurity::ImpurityMeasure;
use crate::tree::CartTree;

/// Configuration for growing a classification tree.
///
/// Construct via [`CartConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter       | Default |
/// |-----------------|---------|
/// | `measure`       | `Gini`  |
/// | `min_node_size` | 5       |
/// | `tolerance`     | 0.001   |
#[derive(Debug, Clone)]
pub struct CartConfig {
    pub(crate) measure: ImpurityMeasure,
    pub(crate) min_node_size: usize,
    pub(crate) tolerance: f64,
}

impl CartConfig {
    /// Create a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            measure: ImpurityMeasure::Gini,
            min_node_size: 5,
            tolerance: 0.001,
        }
    }

    /// Set the impurity measure used for node scoring and split search.
    #[must_use]
    pub fn with_measure(mut self, measure: ImpurityMeasure) -> Self {
        self.measure = measure;
        self
    }

    /// Set the node size a node must exceed to be considered for a split.
    #[must_use]
    pub fn with_min_node_size(mut self, min_node_size: usize) -> Self {
        self.min_node_size = min_node_size;
        self
    }

    /// Set the impurity a node must exceed to be considered for a split.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    // --- Getters ---

    /// Return the impurity measure.
    #[must_use]
    pub fn measure(&self) -> ImpurityMeasure {
        self.measure
    }

    /// Return the minimum node size.
    #[must_use]
    pub fn min_node_size(&self) -> usize {
        self.min_node_size
    }

    /// Return the growth impurity tolerance.
    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Grow a full tree on `set`.
    ///
    /// # Errors
    ///
    /// | Variant                           | When                                  |
    /// |-----------------------------------|---------------------------------------|
    /// | [`CartError::InvalidMinNodeSize`] | `min_node_size` is zero               |
    /// | [`CartError::InvalidTolerance`]   | `tolerance` is negative or not finite |
    pub fn grow(&self, set: &PatternSet) -> Result<CartTree, CartError> {
        if self.min_node_size == 0 {
            return Err(CartError::InvalidMinNodeSize {
                min_node_size: self.min_node_size,
            });
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(CartError::InvalidTolerance {
                tolerance: self.tolerance,
            });
        }
        Ok(crate::grow::grow(self, set))
    }
}

impl Default for CartConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CartConfig::default();
        assert_eq!(config.measure(), ImpurityMeasure::Gini);
        assert_eq!(config.min_node_size(), 5);
        assert!((config.tolerance() - 0.001).abs() < f64::EPSILON);
    }

    #[test]
    fn setters_chain() {
        let config = CartConfig::new()
            .with_measure(ImpurityMeasure::Entropy)
            .with_min_node_size(1)
            .with_tolerance(0.0);
        assert_eq!(config.measure(), ImpurityMeasure::Entropy);
        assert_eq!(config.min_node_size(), 1);
        assert!(config.tolerance().abs() < f64::EPSILON);
    }
}
