use std::fmt;
use std::str::FromStr;

use crate::error::CartError;
use crate::node::Impurity;

/// Measure of class heterogeneity used to score nodes and splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ImpurityMeasure {
    /// Misclassification rate of the majority vote: `1 - max_c(p_c)`.
    Misclassification,
    /// Information entropy in bits: `-Σ(p_c · log2(p_c))`.
    Entropy,
    /// Gini diversity: `Σ(p_c · (1 - p_c))`.
    Gini,
}

impl ImpurityMeasure {
    /// Compute the impurity of a node from its class counts.
    ///
    /// Returns [`Impurity`] 0 when `class_counts` sums to zero.
    /// Classes with zero count contribute nothing to the entropy sum.
    #[must_use]
    pub fn impurity(&self, class_counts: &[usize]) -> Impurity {
        let total: usize = class_counts.iter().sum();
        if total == 0 {
            return Impurity::new(0.0);
        }
        let n = total as f64;
        let value = match self {
            ImpurityMeasure::Misclassification => {
                let max = class_counts.iter().copied().max().unwrap_or(0);
                1.0 - max as f64 / n
            }
            ImpurityMeasure::Entropy => {
                -class_counts
                    .iter()
                    .filter(|&&c| c > 0)
                    .map(|&c| {
                        let p = c as f64 / n;
                        p * p.log2()
                    })
                    .sum::<f64>()
            }
            ImpurityMeasure::Gini => class_counts
                .iter()
                .map(|&c| {
                    let p = c as f64 / n;
                    p * (1.0 - p)
                })
                .sum(),
        };
        Impurity::new(value)
    }

    /// Return the selector name accepted by [`FromStr`].
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ImpurityMeasure::Misclassification => "misclassification",
            ImpurityMeasure::Entropy => "entropy",
            ImpurityMeasure::Gini => "gini",
        }
    }
}

impl FromStr for ImpurityMeasure {
    type Err = CartError;

    /// Parse a selector, ignoring ASCII case.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::UnknownImpurityMeasure`] for anything other than
    /// `misclassification`, `entropy`, or `gini`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "misclassification" => Ok(ImpurityMeasure::Misclassification),
            "entropy" => Ok(ImpurityMeasure::Entropy),
            "gini" => Ok(ImpurityMeasure::Gini),
            _ => Err(CartError::UnknownImpurityMeasure { name: s.to_string() }),
        }
    }
}

impl fmt::Display for ImpurityMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
