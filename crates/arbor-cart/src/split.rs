use std::collections::BTreeSet;

use crate::dataset::{PatternId, PatternSet};
use crate::impurity::ImpurityMeasure;
use crate::node::{Decision, FeatureIndex};

/// Gains closer than this to the incumbent are treated as ties.
const GAIN_EPSILON: f64 = 1e-12;

/// Result of finding the best split for a node.
#[derive(Debug, Clone)]
pub struct SplitResult {
    /// Feature and threshold of the chosen rule.
    pub decision: Decision,
    /// Parent impurity minus the size-weighted child impurities.
    pub gain: f64,
    /// Members with `value > threshold`.
    pub left: BTreeSet<PatternId>,
    /// Members with `value <= threshold`.
    pub right: BTreeSet<PatternId>,
}

/// Find the best single-feature split of `members`.
///
/// Every value observed at a feature is a candidate threshold. For each
/// feature, candidates are visited in ascending order and only one that
/// beats the best gain seen so far on that feature replaces it, so the
/// first of several equal candidates wins. Across features the largest
/// recorded gain wins, with ties going to the lowest feature index.
///
/// Returns `None` when no candidate has a positive gain (constant features,
/// a pure node, or a measure that cannot see an improvement).
#[must_use]
pub fn find_best_split(
    set: &PatternSet,
    members: &BTreeSet<PatternId>,
    measure: ImpurityMeasure,
) -> Option<SplitResult> {
    let n_samples = members.len();
    if n_samples == 0 {
        return None;
    }
    let n = n_samples as f64;

    let parent_counts = set.class_counts(members);
    let parent_impurity = measure.impurity(&parent_counts).value();

    let mut best: Option<(Decision, f64)> = None;

    for feat_idx in 0..set.n_features() {
        // (value, class) pairs sorted ascending by value.
        let mut sorted: Vec<(f64, usize)> = members
            .iter()
            .filter_map(|&id| {
                set.vector(id)
                    .map(|v| (v[feat_idx], set.class_index(id)))
            })
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        // Right (<= threshold) grows from empty, left (> threshold) shrinks from full.
        let mut right_counts = vec![0usize; parent_counts.len()];
        let mut left_counts = parent_counts.clone();
        let mut axis_best: Option<(f64, f64)> = None;

        let mut i = 0;
        while i < sorted.len() {
            let threshold = sorted[i].0;
            while i < sorted.len() && sorted[i].0 == threshold {
                let class = sorted[i].1;
                right_counts[class] += 1;
                left_counts[class] -= 1;
                i += 1;
            }

            let n_right = i;
            let n_left = n_samples - n_right;
            let weighted = (n_left as f64 / n) * measure.impurity(&left_counts).value()
                + (n_right as f64 / n) * measure.impurity(&right_counts).value();
            let gain = parent_impurity - weighted;

            let incumbent = axis_best.map_or(0.0, |(_, g)| g);
            if gain > incumbent + GAIN_EPSILON {
                axis_best = Some((threshold, gain));
            }
        }

        if let Some((threshold, gain)) = axis_best {
            let incumbent = best.map_or(0.0, |(_, g)| g);
            if gain > incumbent + GAIN_EPSILON {
                best = Some((
                    Decision {
                        feature: FeatureIndex::new(feat_idx),
                        threshold,
                    },
                    gain,
                ));
            }
        }
    }

    let (decision, gain) = best?;

    let (left, right): (BTreeSet<PatternId>, BTreeSet<PatternId>) = members
        .iter()
        .partition(|&&id| set.vector(id).is_some_and(|v| decision.goes_left(v)));

    Some(SplitResult {
        decision,
        gain,
        left,
        right,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn make_set(rows: &[(&[f64], &str)]) -> PatternSet {
        let mut vectors = BTreeMap::new();
        let mut labels = BTreeMap::new();
        for (i, (v, l)) in rows.iter().enumerate() {
            vectors.insert(PatternId::new(i as u64), v.to_vec());
            labels.insert(PatternId::new(i as u64), l.to_string());
        }
        PatternSet::new(vectors, labels).unwrap()
    }

    fn all_members(set: &PatternSet) -> BTreeSet<PatternId> {
        set.ids().collect()
    }

    #[test]
    fn separable_data_splits_at_last_value_of_lower_group() {
        let set = make_set(&[
            (&[0.0], "A"),
            (&[1.0], "A"),
            (&[2.0], "A"),
            (&[10.0], "B"),
            (&[11.0], "B"),
            (&[12.0], "B"),
        ]);
        let split = find_best_split(&set, &all_members(&set), ImpurityMeasure::Gini)
            .expect("should find a split");
        assert_eq!(split.decision.feature.index(), 0);
        assert!((split.decision.threshold - 2.0).abs() < f64::EPSILON);
        assert!((split.gain - 0.5).abs() < 1e-12);
        assert_eq!(split.left.len(), 3);
        assert_eq!(split.right.len(), 3);
        for id in &split.left {
            assert_eq!(set.label(*id), Some("B"));
        }
    }

    #[test]
    fn constant_feature_returns_none() {
        let set = make_set(&[(&[5.0], "A"), (&[5.0], "A"), (&[5.0], "B"), (&[5.0], "B")]);
        assert!(find_best_split(&set, &all_members(&set), ImpurityMeasure::Gini).is_none());
    }

    #[test]
    fn pure_node_returns_none() {
        let set = make_set(&[(&[1.0], "A"), (&[2.0], "A"), (&[3.0], "A")]);
        assert!(find_best_split(&set, &all_members(&set), ImpurityMeasure::Entropy).is_none());
    }

    #[test]
    fn informative_axis_beats_noise_axis() {
        let set = make_set(&[
            (&[7.0, 0.0], "A"),
            (&[3.0, 1.0], "A"),
            (&[5.0, 2.0], "A"),
            (&[4.0, 10.0], "B"),
            (&[6.0, 11.0], "B"),
            (&[2.0, 12.0], "B"),
        ]);
        let split = find_best_split(&set, &all_members(&set), ImpurityMeasure::Entropy).unwrap();
        assert_eq!(split.decision.feature.index(), 1);
        assert!((split.decision.threshold - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn equal_gain_ties_go_to_lowest_axis() {
        // Both axes separate the classes perfectly.
        let set = make_set(&[
            (&[0.0, 0.0], "A"),
            (&[1.0, 1.0], "A"),
            (&[5.0, 5.0], "B"),
            (&[6.0, 6.0], "B"),
        ]);
        let split = find_best_split(&set, &all_members(&set), ImpurityMeasure::Gini).unwrap();
        assert_eq!(split.decision.feature.index(), 0);
    }

    #[test]
    fn misclassification_cannot_see_hidden_improvement() {
        // Majority label is A on both sides of every cut, so the
        // misclassification gain is never positive.
        let set = make_set(&[
            (&[0.0], "A"),
            (&[1.0], "A"),
            (&[2.0], "A"),
            (&[3.0], "B"),
            (&[4.0], "A"),
            (&[5.0], "A"),
            (&[6.0], "A"),
        ]);
        let members = all_members(&set);
        assert!(find_best_split(&set, &members, ImpurityMeasure::Misclassification).is_none());
        assert!(find_best_split(&set, &members, ImpurityMeasure::Gini).is_some());
    }

    #[test]
    fn partitions_are_disjoint_and_cover_members() {
        let set = make_set(&[
            (&[0.3, 9.0], "A"),
            (&[0.1, 8.0], "B"),
            (&[0.9, 1.0], "A"),
            (&[0.5, 2.0], "B"),
            (&[0.7, 3.0], "C"),
        ]);
        let members = all_members(&set);
        let split = find_best_split(&set, &members, ImpurityMeasure::Gini).unwrap();
        assert!(split.left.is_disjoint(&split.right));
        let union: BTreeSet<PatternId> = split.left.union(&split.right).copied().collect();
        assert_eq!(union, members);
    }

    #[test]
    fn subset_of_members_only_considers_those_patterns() {
        let set = make_set(&[
            (&[0.0], "A"),
            (&[1.0], "B"),
            (&[2.0], "A"),
            (&[3.0], "B"),
        ]);
        let members: BTreeSet<PatternId> = [PatternId::new(0), PatternId::new(2)].into();
        assert!(find_best_split(&set, &members, ImpurityMeasure::Gini).is_none());
    }
}
