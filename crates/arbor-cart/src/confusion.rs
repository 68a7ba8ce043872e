//! Confusion matrix and per-class classification metrics.

use std::collections::BTreeSet;
use std::fmt;

use crate::dataset::PatternSet;
use crate::error::CartError;
use crate::node::Prediction;
use crate::tree::CartTree;

/// A confusion matrix over class names.
///
/// Entry `matrix[t][p]` counts patterns whose true class is `classes[t]`
/// and whose prediction is `classes[p]`. Ambiguous predictions are counted
/// per true class in a separate column.
#[derive(Debug, Clone)]
pub struct ConfusionMatrix {
    classes: Vec<String>,
    matrix: Vec<Vec<usize>>,
    ambiguous: Vec<usize>,
}

/// Per-class precision, recall, and F1 score.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ClassMetrics {
    /// The class name.
    pub class: String,
    /// Precision: TP / (TP + FP). 0.0 if no predictions for this class.
    pub precision: f64,
    /// Recall: TP / (TP + FN). 0.0 if no true samples for this class.
    pub recall: f64,
    /// F1: 2 * precision * recall / (precision + recall). 0.0 if both are zero.
    pub f1: f64,
    /// Number of true samples in this class.
    pub support: usize,
}

impl ConfusionMatrix {
    /// Build a confusion matrix from `(true label, prediction)` pairs.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`CartError::EmptyDataset`] | Zero pairs provided |
    pub fn from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, &'a Prediction)>,
    ) -> Result<Self, CartError> {
        let pairs: Vec<(&str, &Prediction)> = pairs.into_iter().collect();
        if pairs.is_empty() {
            return Err(CartError::EmptyDataset);
        }

        let classes: Vec<String> = pairs
            .iter()
            .flat_map(|&(truth, predicted)| [Some(truth), predicted.class()])
            .flatten()
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let index = |name: &str| classes.binary_search_by(|c| c.as_str().cmp(name)).ok();

        let n = classes.len();
        let mut matrix = vec![vec![0usize; n]; n];
        let mut ambiguous = vec![0usize; n];
        for (truth, predicted) in pairs {
            let Some(t) = index(truth) else { continue };
            match predicted.class().and_then(index) {
                Some(p) => matrix[t][p] += 1,
                None => ambiguous[t] += 1,
            }
        }

        Ok(Self {
            classes,
            matrix,
            ambiguous,
        })
    }

    /// Classify every pattern of `set` with `tree` and tabulate the outcome.
    ///
    /// # Errors
    ///
    /// Propagates [`CartError::DimensionMismatch`] from classification.
    pub fn from_tree(tree: &CartTree, set: &PatternSet) -> Result<Self, CartError> {
        let pairs = set
            .iter()
            .map(|(_, vector, label)| Ok((label, tree.classify(vector)?)))
            .collect::<Result<Vec<_>, CartError>>()?;
        Self::from_pairs(pairs)
    }

    /// Overall accuracy: proportion of correct predictions.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let correct: usize = (0..self.classes.len()).map(|i| self.matrix[i][i]).sum();
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64
        }
    }

    /// Number of tabulated patterns, ambiguous ones included.
    #[must_use]
    pub fn total(&self) -> usize {
        self.matrix.iter().flat_map(|row| row.iter()).sum::<usize>()
            + self.ambiguous.iter().sum::<usize>()
    }

    /// Per-class precision, recall, F1, and support.
    #[must_use]
    pub fn class_metrics(&self) -> Vec<ClassMetrics> {
        let n = self.classes.len();
        (0..n)
            .map(|c| {
                let tp = self.matrix[c][c];
                let fp: usize = (0..n).filter(|&i| i != c).map(|i| self.matrix[i][c]).sum();
                let fn_: usize = (0..n)
                    .filter(|&j| j != c)
                    .map(|j| self.matrix[c][j])
                    .sum::<usize>()
                    + self.ambiguous[c];
                let support = tp + fn_;
                let precision = if tp + fp == 0 {
                    0.0
                } else {
                    tp as f64 / (tp + fp) as f64
                };
                let recall = if support == 0 {
                    0.0
                } else {
                    tp as f64 / support as f64
                };
                let f1 = if precision + recall == 0.0 {
                    0.0
                } else {
                    2.0 * precision * recall / (precision + recall)
                };
                ClassMetrics {
                    class: self.classes[c].clone(),
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect()
    }

    /// Return the class names labelling rows and columns.
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Return the underlying matrix rows.
    #[must_use]
    pub fn as_rows(&self) -> &[Vec<usize>] {
        &self.matrix
    }

    /// Return the ambiguous-prediction count of each true class.
    #[must_use]
    pub fn ambiguous(&self) -> &[usize] {
        &self.ambiguous
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(String::len)
            .max()
            .unwrap_or(0)
            .max("ambiguous".len());

        write!(f, "{:>width$}", "")?;
        for class in &self.classes {
            write!(f, " {class:>width$}")?;
        }
        writeln!(f, " {:>width$}", "ambiguous")?;

        for ((class, row), amb) in self.classes.iter().zip(&self.matrix).zip(&self.ambiguous) {
            write!(f, "{class:>width$}")?;
            for val in row {
                write!(f, " {val:>width$}")?;
            }
            writeln!(f, " {amb:>width$}")?;
        }

        Ok(())
    }
}
