//! Inference by root-to-terminal traversal.

use std::collections::BTreeMap;

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::dataset::{PatternId, PatternSet};
use crate::error::CartError;
use crate::node::{NodeId, Posterior, Prediction};
use crate::tree::CartTree;

/// Label and class proportions assigned to one query pattern.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Classification {
    /// Label stored at the terminal the pattern reached.
    pub label: Prediction,
    /// Class proportions stored at that terminal.
    pub posterior: Posterior,
}

impl CartTree {
    /// Return the terminal reached by `vector`.
    ///
    /// At each decision node the vector goes left when its value at the
    /// node's feature is greater than the threshold, right otherwise.
    ///
    /// # Errors
    ///
    /// | Variant                          | When                                          |
    /// |----------------------------------|-----------------------------------------------|
    /// | [`CartError::DimensionMismatch`] | `vector.len()` differs from the training data |
    /// | [`CartError::UnknownNode`]       | a decision node has no children recorded      |
    pub fn terminal_for(&self, vector: &[f64]) -> Result<NodeId, CartError> {
        if vector.len() != self.n_features {
            return Err(CartError::DimensionMismatch {
                expected: self.n_features,
                got: vector.len(),
            });
        }

        let mut node = NodeId::ROOT;
        while let Some(decision) = self.decision.get(&node) {
            let (left, right) = self
                .children
                .get(&node)
                .copied()
                .ok_or(CartError::UnknownNode { node })?;
            node = if decision.goes_left(vector) { left } else { right };
        }
        Ok(node)
    }

    /// Predict the label of `vector`.
    ///
    /// # Errors
    ///
    /// Same as [`terminal_for`](Self::terminal_for).
    pub fn classify(&self, vector: &[f64]) -> Result<&Prediction, CartError> {
        let node = self.terminal_for(vector)?;
        self.label.get(&node).ok_or(CartError::UnknownNode { node })
    }

    /// Return the class proportions at the terminal `vector` reaches.
    ///
    /// # Errors
    ///
    /// Same as [`terminal_for`](Self::terminal_for).
    pub fn posterior(&self, vector: &[f64]) -> Result<&Posterior, CartError> {
        let node = self.terminal_for(vector)?;
        self.posterior.get(&node).ok_or(CartError::UnknownNode { node })
    }

    /// Fraction of `set` whose predicted label differs from its true label.
    ///
    /// Ambiguous predictions always count as misses.
    ///
    /// # Errors
    ///
    /// Same as [`terminal_for`](Self::terminal_for).
    pub fn misclassification_rate(&self, set: &PatternSet) -> Result<f64, CartError> {
        if set.is_empty() {
            return Err(CartError::EmptyDataset);
        }
        let mut misses = 0usize;
        for (_, vector, label) in set.iter() {
            if !self.classify(vector)?.is(label) {
                misses += 1;
            }
        }
        Ok(misses as f64 / set.len() as f64)
    }

    /// Classify every query vector in parallel.
    ///
    /// # Errors
    ///
    /// Returns the first [`CartError::DimensionMismatch`] encountered.
    pub fn classify_batch(
        &self,
        queries: &BTreeMap<PatternId, Vec<f64>>,
    ) -> Result<BTreeMap<PatternId, Classification>, CartError> {
        queries
            .par_iter()
            .map(|(&id, vector)| {
                let node = self.terminal_for(vector)?;
                let label = self
                    .label
                    .get(&node)
                    .cloned()
                    .ok_or(CartError::UnknownNode { node })?;
                let posterior = self
                    .posterior
                    .get(&node)
                    .cloned()
                    .ok_or(CartError::UnknownNode { node })?;
                Ok((id, Classification { label, posterior }))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CartConfig;

    fn make_set(rows: &[(u64, f64, &str)]) -> PatternSet {
        let vectors = rows
            .iter()
            .map(|&(id, x, _)| (PatternId::new(id), vec![x]))
            .collect();
        let labels = rows
            .iter()
            .map(|&(id, _, l)| (PatternId::new(id), l.to_string()))
            .collect::<BTreeMap<_, _>>();
        PatternSet::new(vectors, labels).unwrap()
    }

    fn two_clusters() -> PatternSet {
        make_set(&[
            (1, 0.0, "A"),
            (2, 1.0, "A"),
            (3, 2.0, "A"),
            (4, 10.0, "B"),
            (5, 11.0, "B"),
            (6, 12.0, "B"),
        ])
    }

    fn grown() -> CartTree {
        CartConfig::new()
            .with_min_node_size(1)
            .grow(&two_clusters())
            .unwrap()
    }

    #[test]
    fn classify_two_clusters() {
        let tree = grown();
        assert!(tree.classify(&[1.0]).unwrap().is("A"));
        assert!(tree.classify(&[11.0]).unwrap().is("B"));
    }

    #[test]
    fn posterior_of_pure_terminal() {
        let tree = grown();
        let posterior = tree.posterior(&[11.0]).unwrap();
        assert!((posterior.probability("B") - 1.0).abs() < 1e-12);
        assert!(posterior.probability("A").abs() < 1e-12);
    }

    #[test]
    fn threshold_value_itself_goes_right() {
        let tree = grown();
        let threshold = tree.decision(NodeId::ROOT).unwrap().threshold;
        let (_, right) = tree.children(NodeId::ROOT).unwrap();
        assert_eq!(tree.terminal_for(&[threshold]).unwrap(), right);
    }

    #[test]
    fn training_error_is_zero_on_separable_data() {
        let tree = grown();
        let rate = tree.misclassification_rate(&two_clusters()).unwrap();
        assert!(rate.abs() < f64::EPSILON);
    }

    #[test]
    fn misclassification_rate_counts_misses() {
        let tree = grown();
        let queries = make_set(&[(1, 0.5, "A"), (2, 0.7, "B"), (3, 11.5, "B"), (4, 12.5, "A")]);
        let rate = tree.misclassification_rate(&queries).unwrap();
        assert!((rate - 0.5).abs() < 1e-12);
    }

    #[test]
    fn ambiguous_terminal_always_misses() {
        let set = make_set(&[(1, 1.0, "A"), (2, 1.0, "B")]);
        let tree = CartConfig::new().with_min_node_size(1).grow(&set).unwrap();
        assert!(tree.classify(&[1.0]).unwrap().is_ambiguous());
        let rate = tree.misclassification_rate(&set).unwrap();
        assert!((rate - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn dimension_mismatch_is_an_error() {
        let tree = grown();
        let err = tree.classify(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, CartError::DimensionMismatch { expected: 1, got: 2 }));
        assert!(tree.posterior(&[]).is_err());
    }

    #[test]
    fn batch_matches_single_classification() {
        let tree = grown();
        let queries: BTreeMap<PatternId, Vec<f64>> = [(7, 0.2), (8, 5.0), (9, 30.0)]
            .into_iter()
            .map(|(id, x)| (PatternId::new(id), vec![x]))
            .collect();
        let batch = tree.classify_batch(&queries).unwrap();
        assert_eq!(batch.len(), 3);
        for (id, vector) in &queries {
            let result = &batch[id];
            assert_eq!(&result.label, tree.classify(vector).unwrap());
            assert_eq!(&result.posterior, tree.posterior(vector).unwrap());
        }
    }

    #[test]
    fn batch_reports_dimension_mismatch() {
        let tree = grown();
        let mut queries = BTreeMap::new();
        queries.insert(PatternId::new(1), vec![1.0]);
        queries.insert(PatternId::new(2), vec![1.0, 1.0]);
        assert!(matches!(
            tree.classify_batch(&queries),
            Err(CartError::DimensionMismatch { .. })
        ));
    }
}
