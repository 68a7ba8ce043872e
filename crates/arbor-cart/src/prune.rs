//! Cost-complexity pruning against a held-out validation set.

use tracing::{debug, info, instrument};

use crate::dataset::PatternSet;
use crate::error::CartError;
use crate::tree::CartTree;

/// Pruning configuration.
///
/// Construct via [`Pruner::new`] with the complexity parameter `alpha`.
#[derive(Debug, Clone, Copy)]
pub struct Pruner {
    alpha: f64,
}

/// Summary of a pruning run.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PruneReport {
    /// Complexity parameter the run used.
    pub alpha: f64,
    /// Terminal count of the input tree.
    pub terminals_before: usize,
    /// Terminal count of the pruned tree.
    pub terminals_after: usize,
    /// Validation misclassification rate of the input tree.
    pub error_before: f64,
    /// Validation misclassification rate of the pruned tree.
    pub error_after: f64,
    /// Number of passes over the terminal set, including the final empty one.
    pub passes: usize,
    /// Number of accepted collapses.
    pub collapses: usize,
}

impl Pruner {
    /// Create a pruner with complexity parameter `alpha`.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidAlpha`] if `alpha` is negative or not finite.
    pub fn new(alpha: f64) -> Result<Self, CartError> {
        if !alpha.is_finite() || alpha < 0.0 {
            return Err(CartError::InvalidAlpha { alpha });
        }
        Ok(Self { alpha })
    }

    /// Return the complexity parameter.
    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Prune `tree` and return the smaller tree. The input is not modified.
    ///
    /// # Errors
    ///
    /// | Variant                          | When                                         |
    /// |----------------------------------|----------------------------------------------|
    /// | [`CartError::DimensionMismatch`] | validation vectors differ from the tree's    |
    pub fn prune(&self, tree: &CartTree, validation: &PatternSet) -> Result<CartTree, CartError> {
        self.prune_with_report(tree, validation).map(|(tree, _)| tree)
    }

    /// Prune `tree` and also report what the run did.
    ///
    /// Sibling terminal pairs are collapsed into their parent in repeated
    /// passes over the current terminal set until a pass accepts nothing.
    /// Every candidate is scored against the *input* tree:
    ///
    /// ```text
    /// g = (error(candidate) - error(input)) / (terminals(input) - terminals(candidate))
    /// ```
    ///
    /// and accepted when `g < alpha`, or when `g <= 0` (the collapse does
    /// not raise the validation error). An accepted candidate becomes the
    /// current tree for the rest of the pass.
    ///
    /// # Errors
    ///
    /// Same as [`prune`](Self::prune).
    #[instrument(
        skip_all,
        fields(alpha = self.alpha, n_terminals = tree.n_terminals(), n_validation = validation.len())
    )]
    pub fn prune_with_report(
        &self,
        tree: &CartTree,
        validation: &PatternSet,
    ) -> Result<(CartTree, PruneReport), CartError> {
        let error_full = tree.misclassification_rate(validation)?;
        let n_full = tree.n_terminals();

        let mut current = tree.clone();
        let mut passes = 0usize;
        let mut collapses = 0usize;

        loop {
            passes += 1;
            let mut changed = false;

            for leaf in current.terminal_ids() {
                if !current.is_terminal(leaf) {
                    continue;
                }
                let (Some(parent), Some(sibling)) = (current.parent(leaf), current.sibling(leaf))
                else {
                    continue;
                };
                if !current.is_terminal(sibling) {
                    continue;
                }

                let mut candidate = current.clone();
                candidate.collapse(parent)?;

                let error_candidate = candidate.misclassification_rate(validation)?;
                let removed = n_full - candidate.n_terminals();
                let g = (error_candidate - error_full) / removed as f64;

                if g <= 0.0 || g < self.alpha {
                    debug!(
                        node = %parent,
                        g,
                        error = error_candidate,
                        n_terminals = candidate.n_terminals(),
                        "collapsed sibling terminals"
                    );
                    current = candidate;
                    changed = true;
                    collapses += 1;
                }
            }

            if !changed {
                break;
            }
        }

        let error_after = current.misclassification_rate(validation)?;
        let report = PruneReport {
            alpha: self.alpha,
            terminals_before: n_full,
            terminals_after: current.n_terminals(),
            error_before: error_full,
            error_after,
            passes,
            collapses,
        };

        info!(
            terminals_before = report.terminals_before,
            terminals_after = report.terminals_after,
            error_before = report.error_before,
            error_after = report.error_after,
            passes,
            "pruning complete"
        );

        Ok((current, report))
    }
}

/// Prune `tree` with complexity parameter `alpha` against `validation`.
///
/// Shorthand for [`Pruner::new`] followed by [`Pruner::prune`].
///
/// # Errors
///
/// | Variant                          | When                                      |
/// |----------------------------------|-------------------------------------------|
/// | [`CartError::InvalidAlpha`]      | `alpha` is negative or not finite         |
/// | [`CartError::DimensionMismatch`] | validation vectors differ from the tree's |
pub fn prune(tree: &CartTree, alpha: f64, validation: &PatternSet) -> Result<CartTree, CartError> {
    Pruner::new(alpha)?.prune(tree, validation)
}
