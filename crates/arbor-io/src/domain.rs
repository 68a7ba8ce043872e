//! Domain types for arbor-io.

use std::collections::BTreeMap;

use arbor_cart::{PatternId, PatternSet};

use crate::IoError;

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Labeled patterns read from a `pattern_id,label,f0,...` file.
///
/// Produced by [`PatternReader::read_labeled`](crate::PatternReader::read_labeled).
#[derive(Debug)]
pub struct LabeledPatterns {
    /// Feature column names from the CSV header.
    feature_names: Vec<String>,
    /// Validated pattern set.
    patterns: PatternSet,
}

impl LabeledPatterns {
    pub(crate) fn new(feature_names: Vec<String>, patterns: PatternSet) -> Self {
        Self {
            feature_names,
            patterns,
        }
    }

    /// Return the feature column names.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Return the pattern set.
    #[must_use]
    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    /// Consume and return the pattern set.
    #[must_use]
    pub fn into_patterns(self) -> PatternSet {
        self.patterns
    }
}

/// Query vectors read from a `pattern_id,f0,...` file.
///
/// Produced by [`PatternReader::read_unlabeled`](crate::PatternReader::read_unlabeled).
#[derive(Debug)]
pub struct QueryPatterns {
    /// Feature column names from the CSV header.
    pub feature_names: Vec<String>,
    /// Vectors keyed by pattern id.
    pub vectors: BTreeMap<PatternId, Vec<f64>>,
}

impl QueryPatterns {
    /// Return the number of query vectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Return `true` if there are no query vectors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}
