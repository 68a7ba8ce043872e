use std::path::PathBuf;

use crate::dataset::PatternId;
use crate::node::NodeId;

/// Errors from tree growth, pruning, inference, and persistence.
#[derive(Debug, thiserror::Error)]
pub enum CartError {
    /// Returned when an impurity measure selector is not recognized.
    #[error("unknown impurity measure \"{name}\" (expected misclassification, entropy, or gini)")]
    UnknownImpurityMeasure {
        /// The selector that failed to parse.
        name: String,
    },

    /// Returned when the minimum node size is zero.
    #[error("min_node_size must be at least 1, got {min_node_size}")]
    InvalidMinNodeSize {
        /// The invalid min_node_size value provided.
        min_node_size: usize,
    },

    /// Returned when the growth impurity tolerance is negative or not finite.
    #[error("impurity tolerance must be finite and non-negative, got {tolerance}")]
    InvalidTolerance {
        /// The invalid tolerance value provided.
        tolerance: f64,
    },

    /// Returned when the pruning complexity parameter is negative or not finite.
    #[error("alpha must be finite and non-negative, got {alpha}")]
    InvalidAlpha {
        /// The invalid alpha value provided.
        alpha: f64,
    },

    /// Returned when a pattern set has zero patterns.
    #[error("pattern set is empty")]
    EmptyDataset,

    /// Returned when patterns have zero feature dimensions.
    #[error("patterns have zero feature dimensions")]
    ZeroFeatures,

    /// Returned when a pattern has a different dimensionality than the rest of its set.
    #[error("pattern {pattern} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// The expected number of features.
        expected: usize,
        /// The actual number of features in the pattern.
        got: usize,
        /// The offending pattern.
        pattern: PatternId,
    },

    /// Returned when a feature value is NaN or infinite.
    #[error("non-finite value in pattern {pattern}, feature {feature_index}")]
    NonFiniteValue {
        /// The offending pattern.
        pattern: PatternId,
        /// The zero-based feature dimension.
        feature_index: usize,
    },

    /// Returned when a pattern has no class label.
    #[error("pattern {pattern} has no class label")]
    MissingLabel {
        /// The pattern without a label.
        pattern: PatternId,
    },

    /// Returned when a label is given for a pattern that has no feature vector.
    #[error("label given for unknown pattern {pattern}")]
    UnlabeledPattern {
        /// The label's pattern identifier.
        pattern: PatternId,
    },

    /// Returned when a query vector does not match the tree's dimensionality.
    #[error("query vector has {got} features, tree was grown on {expected}")]
    DimensionMismatch {
        /// The dimensionality the tree was grown on.
        expected: usize,
        /// The dimensionality of the query vector.
        got: usize,
    },

    /// Returned when a node id is not part of the tree.
    #[error("node {node} is not part of the tree")]
    UnknownNode {
        /// The missing node.
        node: NodeId,
    },

    /// Returned when the tree's maps disagree with each other.
    #[error("tree invariant broken at node {node}: {reason}")]
    BrokenInvariant {
        /// The node where the inconsistency was detected.
        node: NodeId,
        /// Human-readable description of the violated rule.
        reason: String,
    },

    /// Returned when model serialization fails.
    #[error("failed to serialize tree")]
    SerializeModel {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when model deserialization fails.
    #[error("failed to deserialize tree from {path}")]
    DeserializeModel {
        /// Path to the model file that could not be deserialized.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when writing the model file fails.
    #[error("failed to write tree to {path}")]
    WriteModel {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading the model file fails.
    #[error("failed to read tree from {path}")]
    ReadModel {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when loading a model with an incompatible format version.
    #[error("incompatible model version in {path}: expected {expected}, found {found}")]
    IncompatibleModelVersion {
        /// The model format version this build expects.
        expected: u32,
        /// The model format version found in the file.
        found: u32,
        /// Path to the model file with the incompatible version.
        path: PathBuf,
    },
}
