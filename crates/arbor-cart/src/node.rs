use std::collections::BTreeMap;
use std::fmt;

/// Zero-based feature dimension.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct FeatureIndex(usize);

impl FeatureIndex {
    /// Create a new feature index from a zero-based dimension.
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based feature dimension.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FeatureIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a node in a [`CartTree`](crate::CartTree) arena.
///
/// Ids are dense and assigned in creation order: the root is `1`, and each
/// split allocates the next two ids for its left and right child.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct NodeId(usize);

impl NodeId {
    /// The root of every tree.
    pub const ROOT: NodeId = NodeId(1);

    /// Create a node id from its raw value.
    pub(crate) fn new(id: usize) -> Self {
        Self(id)
    }

    /// Return the raw id.
    #[must_use]
    pub fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Criterion-agnostic impurity value.
#[derive(
    Debug, Clone, Copy, PartialEq, PartialOrd,
    serde::Serialize, serde::Deserialize,
)]
pub struct Impurity(f64);

impl Impurity {
    /// Create a new impurity value.
    pub(crate) fn new(value: f64) -> Self {
        Self(value)
    }

    /// Return the raw impurity value.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Impurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

/// Split rule of a decision node.
///
/// Patterns whose value at `feature` is strictly greater than `threshold`
/// go to the left child, all others to the right child.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Decision {
    /// Feature dimension tested by this node.
    pub feature: FeatureIndex,
    /// Observed training value used as the cut point.
    pub threshold: f64,
}

impl Decision {
    /// Return `true` when `vector` is routed to the left child.
    ///
    /// Callers must ensure `vector` has more than `feature` dimensions.
    #[must_use]
    pub fn goes_left(&self, vector: &[f64]) -> bool {
        vector[self.feature.index()] > self.threshold
    }
}

/// Label stored at a terminal node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Prediction {
    /// The majority class among the node's training patterns.
    Class(String),
    /// The top two classes tied; never equal to any real class.
    Ambiguous,
}

impl Prediction {
    /// Return the class name, or `None` for an ambiguous vote.
    #[must_use]
    pub fn class(&self) -> Option<&str> {
        match self {
            Prediction::Class(name) => Some(name),
            Prediction::Ambiguous => None,
        }
    }

    /// Return `true` if this prediction names `label`.
    ///
    /// An ambiguous prediction matches nothing, so it always counts as a miss.
    #[must_use]
    pub fn is(&self, label: &str) -> bool {
        self.class() == Some(label)
    }

    /// Return `true` for the ambiguous sentinel.
    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Prediction::Ambiguous)
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prediction::Class(name) => f.write_str(name),
            Prediction::Ambiguous => f.write_str("<ambiguous>"),
        }
    }
}

/// Class proportions among the training patterns that reached a terminal.
///
/// Only classes that actually occur at the terminal are present; the
/// proportions sum to 1.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Posterior(BTreeMap<String, f64>);

impl Posterior {
    pub(crate) fn new(proportions: BTreeMap<String, f64>) -> Self {
        Self(proportions)
    }

    /// Return the proportion of `label`, or 0 when it never reached the terminal.
    #[must_use]
    pub fn probability(&self, label: &str) -> f64 {
        self.0.get(label).copied().unwrap_or(0.0)
    }

    /// Iterate `(label, proportion)` pairs in label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(label, &p)| (label.as_str(), p))
    }

    /// Return the number of classes with non-zero proportion.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return `true` if no class is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying label → proportion map.
    #[must_use]
    pub fn as_map(&self) -> &BTreeMap<String, f64> {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- NodeId ---

    #[test]
    fn root_is_one() {
        assert_eq!(NodeId::ROOT.get(), 1);
    }

    #[test]
    fn node_id_ordering_follows_creation() {
        assert!(NodeId::new(2) < NodeId::new(3));
    }

    #[test]
    fn node_id_display() {
        assert_eq!(format!("{}", NodeId::new(7)), "7");
    }

    // --- Impurity ---

    #[test]
    fn impurity_display() {
        assert_eq!(format!("{}", Impurity::new(0.333333)), "0.333333");
    }

    // --- Decision ---

    #[test]
    fn greater_than_threshold_goes_left() {
        let d = Decision {
            feature: FeatureIndex::new(1),
            threshold: 2.0,
        };
        assert!(d.goes_left(&[0.0, 2.5]));
        assert!(!d.goes_left(&[9.0, 2.0]));
    }

    // --- Prediction ---

    #[test]
    fn ambiguous_matches_no_label() {
        let p = Prediction::Ambiguous;
        assert!(!p.is("A"));
        assert!(!p.is("<ambiguous>"));
        assert!(p.class().is_none());
    }

    #[test]
    fn class_prediction_matches_its_label() {
        let p = Prediction::Class("A".into());
        assert!(p.is("A"));
        assert!(!p.is("B"));
        assert_eq!(format!("{p}"), "A");
    }

    // --- Posterior ---

    #[test]
    fn absent_class_has_zero_probability() {
        let mut map = BTreeMap::new();
        map.insert("A".to_string(), 1.0);
        let posterior = Posterior::new(map);
        assert!((posterior.probability("A") - 1.0).abs() < f64::EPSILON);
        assert!(posterior.probability("B").abs() < f64::EPSILON);
        assert_eq!(posterior.len(), 1);
    }
}
