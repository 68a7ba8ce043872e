//! Classification trees: grow, prune, classify.
//!
//! Grows a binary CART tree over labeled numeric patterns using a
//! misclassification, entropy, or Gini impurity measure, prunes it by
//! cost-complexity against a validation set, and classifies new patterns by
//! root-to-terminal traversal. Batch classification runs in parallel via
//! rayon, and trees serialize to a versioned bincode file.

mod classify;
mod config;
mod confusion;
mod dataset;
mod error;
mod grow;
mod impurity;
mod node;
mod prune;
mod serialize;
mod split;
mod tree;

pub use classify::Classification;
pub use config::CartConfig;
pub use confusion::{ClassMetrics, ConfusionMatrix};
pub use dataset::{PatternId, PatternSet};
pub use error::CartError;
pub use impurity::ImpurityMeasure;
pub use node::{Decision, FeatureIndex, Impurity, NodeId, Posterior, Prediction};
pub use prune::{PruneReport, Pruner, prune};
pub use split::{SplitResult, find_best_split};
pub use tree::CartTree;
