//! Labeled pattern sets: the two input maps a tree is grown, pruned, and
//! evaluated on.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::CartError;

/// Caller-assigned identifier of a pattern.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct PatternId(u64);

impl PatternId {
    /// Wrap a raw pattern identifier.
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Return the raw identifier.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for PatternId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for PatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated set of feature vectors with one class label each.
///
/// Class names are interned into a sorted table; patterns refer to their
/// class by position in that table.
#[derive(Debug, Clone)]
pub struct PatternSet {
    vectors: BTreeMap<PatternId, Vec<f64>>,
    class_of: BTreeMap<PatternId, usize>,
    classes: Vec<String>,
    n_features: usize,
}

impl PatternSet {
    /// Build a pattern set from the vector map and the label map.
    ///
    /// # Errors
    ///
    /// | Variant                             | When                                             |
    /// |-------------------------------------|--------------------------------------------------|
    /// | [`CartError::EmptyDataset`]         | `vectors` is empty                               |
    /// | [`CartError::ZeroFeatures`]         | vectors have zero dimensions                     |
    /// | [`CartError::FeatureCountMismatch`] | vectors have inconsistent lengths                |
    /// | [`CartError::NonFiniteValue`]       | any value is NaN or infinite                     |
    /// | [`CartError::MissingLabel`]         | a pattern has no entry in `labels`               |
    /// | [`CartError::UnlabeledPattern`]     | `labels` names a pattern absent from `vectors`   |
    pub fn new(
        vectors: BTreeMap<PatternId, Vec<f64>>,
        labels: BTreeMap<PatternId, String>,
    ) -> Result<Self, CartError> {
        let n_features = validate_vectors(&vectors)?;

        if let Some(&pattern) = labels.keys().find(|id| !vectors.contains_key(id)) {
            return Err(CartError::UnlabeledPattern { pattern });
        }

        let classes: Vec<String> = labels
            .values()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut class_of = BTreeMap::new();
        for &pattern in vectors.keys() {
            let label = labels
                .get(&pattern)
                .ok_or(CartError::MissingLabel { pattern })?;
            // `classes` is sorted and contains every label.
            let class = classes.binary_search(label).unwrap_or_default();
            class_of.insert(pattern, class);
        }

        Ok(Self {
            vectors,
            class_of,
            classes,
            n_features,
        })
    }

    /// Return the feature vector of `pattern`.
    #[must_use]
    pub fn vector(&self, pattern: PatternId) -> Option<&[f64]> {
        self.vectors.get(&pattern).map(Vec::as_slice)
    }

    /// Return the class label of `pattern`.
    #[must_use]
    pub fn label(&self, pattern: PatternId) -> Option<&str> {
        self.class_of
            .get(&pattern)
            .map(|&class| self.classes[class].as_str())
    }

    /// Return the position of `pattern`'s label in [`classes`](Self::classes).
    pub(crate) fn class_index(&self, pattern: PatternId) -> usize {
        self.class_of[&pattern]
    }

    /// Return the sorted, de-duplicated class names.
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Return the number of distinct classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Return the number of patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Always `false`: construction rejects empty sets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Return the shared dimensionality of every vector.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Iterate pattern ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = PatternId> + '_ {
        self.vectors.keys().copied()
    }

    /// Iterate `(id, vector, label)` triples in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (PatternId, &[f64], &str)> {
        self.vectors.iter().map(|(&id, v)| {
            let class = self.class_of[&id];
            (id, v.as_slice(), self.classes[class].as_str())
        })
    }

    /// Count members of each class, indexed like [`classes`](Self::classes).
    pub(crate) fn class_counts<'a>(
        &self,
        members: impl IntoIterator<Item = &'a PatternId>,
    ) -> Vec<usize> {
        let mut counts = vec![0usize; self.classes.len()];
        for &pattern in members {
            counts[self.class_index(pattern)] += 1;
        }
        counts
    }
}

/// Check that `vectors` is non-empty, finite, and of one dimensionality.
///
/// Returns that dimensionality.
pub(crate) fn validate_vectors(
    vectors: &BTreeMap<PatternId, Vec<f64>>,
) -> Result<usize, CartError> {
    let n_features = vectors
        .values()
        .next()
        .map(Vec::len)
        .ok_or(CartError::EmptyDataset)?;

    if n_features == 0 {
        return Err(CartError::ZeroFeatures);
    }

    for (&pattern, vector) in vectors {
        if vector.len() != n_features {
            return Err(CartError::FeatureCountMismatch {
                expected: n_features,
                got: vector.len(),
                pattern,
            });
        }
        if let Some(feature_index) = vector.iter().position(|v| !v.is_finite()) {
            return Err(CartError::NonFiniteValue {
                pattern,
                feature_index,
            });
        }
    }

    Ok(n_features)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn maps(rows: &[(u64, &[f64], &str)]) -> (BTreeMap<PatternId, Vec<f64>>, BTreeMap<PatternId, String>) {
        let vectors = rows
            .iter()
            .map(|&(id, v, _)| (PatternId::new(id), v.to_vec()))
            .collect();
        let labels = rows
            .iter()
            .map(|&(id, _, l)| (PatternId::new(id), l.to_string()))
            .collect();
        (vectors, labels)
    }

    #[test]
    fn classes_are_sorted_and_unique() {
        let (v, l) = maps(&[(3, &[1.0], "b"), (1, &[2.0], "a"), (2, &[3.0], "b")]);
        let set = PatternSet::new(v, l).unwrap();
        assert_eq!(set.classes(), &["a".to_string(), "b".to_string()]);
        assert_eq!(set.label(PatternId::new(3)), Some("b"));
        assert_eq!(set.class_index(PatternId::new(1)), 0);
    }

    #[test]
    fn class_counts_follow_class_table() {
        let (v, l) = maps(&[(1, &[1.0], "b"), (2, &[2.0], "a"), (3, &[3.0], "b")]);
        let set = PatternSet::new(v, l).unwrap();
        let ids: Vec<PatternId> = set.ids().collect();
        assert_eq!(set.class_counts(&ids), vec![1, 2]);
    }

    #[test]
    fn empty_set_error() {
        let err = PatternSet::new(BTreeMap::new(), BTreeMap::new()).unwrap_err();
        assert!(matches!(err, CartError::EmptyDataset));
    }

    #[test]
    fn zero_features_error() {
        let (v, l) = maps(&[(1, &[], "a")]);
        let err = PatternSet::new(v, l).unwrap_err();
        assert!(matches!(err, CartError::ZeroFeatures));
    }

    #[test]
    fn inconsistent_dimensionality_error() {
        let (v, l) = maps(&[(1, &[1.0, 2.0], "a"), (2, &[1.0], "b")]);
        let err = PatternSet::new(v, l).unwrap_err();
        assert!(matches!(
            err,
            CartError::FeatureCountMismatch { expected: 2, got: 1, .. }
        ));
    }

    #[test]
    fn non_finite_value_error() {
        let (v, l) = maps(&[(1, &[1.0, f64::NAN], "a")]);
        let err = PatternSet::new(v, l).unwrap_err();
        assert!(matches!(
            err,
            CartError::NonFiniteValue { feature_index: 1, .. }
        ));
    }

    #[test]
    fn missing_label_error() {
        let (v, mut l) = maps(&[(1, &[1.0], "a"), (2, &[2.0], "b")]);
        l.remove(&PatternId::new(2));
        let err = PatternSet::new(v, l).unwrap_err();
        assert!(matches!(err, CartError::MissingLabel { pattern } if pattern.get() == 2));
    }

    #[test]
    fn label_for_unknown_pattern_error() {
        let (v, mut l) = maps(&[(1, &[1.0], "a")]);
        l.insert(PatternId::new(9), "a".into());
        let err = PatternSet::new(v, l).unwrap_err();
        assert!(matches!(err, CartError::UnlabeledPattern { pattern } if pattern.get() == 9));
    }
}
