//! Structural property tests for arbor-cart.
//!
//! These tests grow, prune, and classify on deterministic synthetic data and
//! check the properties every tree must keep regardless of the data: the
//! parent/child maps agree, terminals partition the training patterns, and
//! pruning only ever shrinks the tree.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use arbor_cart::{CartConfig, CartTree, ImpurityMeasure, NodeId, PatternId, PatternSet, Pruner};

// ---------------------------------------------------------------------------
// Helper: deterministic synthetic classification dataset
// ---------------------------------------------------------------------------

/// Generate `n_patterns` 4-feature patterns over 3 classes.
///
/// Features 0-1 are informative (class * 2.0 + noise in [0, 2.5]), so the
/// classes overlap. Features 2-3 are pure noise in [0, 1]. Pattern ids start
/// at `first_id`.
fn make_patterns(n_patterns: usize, first_id: u64, seed: u64) -> PatternSet {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut vectors = BTreeMap::new();
    let mut labels = BTreeMap::new();
    for i in 0..n_patterns {
        let class = i % 3;
        let id = PatternId::new(first_id + i as u64);
        let row: Vec<f64> = (0..4)
            .map(|f| {
                if f < 2 {
                    class as f64 * 2.0 + rng.r#gen::<f64>() * 2.5
                } else {
                    rng.r#gen::<f64>()
                }
            })
            .collect();
        vectors.insert(id, row);
        labels.insert(id, format!("c{class}"));
    }
    PatternSet::new(vectors, labels).unwrap()
}

fn grow(measure: ImpurityMeasure) -> (PatternSet, CartTree) {
    let training = make_patterns(150, 1, 42);
    let tree = CartConfig::new()
        .with_measure(measure)
        .with_min_node_size(1)
        .grow(&training)
        .unwrap();
    (training, tree)
}

fn terminal_members(tree: &CartTree) -> Vec<BTreeSet<PatternId>> {
    tree.terminal_ids()
        .into_iter()
        .map(|leaf| tree.members(leaf).unwrap().clone())
        .collect()
}

fn assert_partitions(tree: &CartTree, training: &PatternSet) {
    let mut seen = BTreeSet::new();
    for members in terminal_members(tree) {
        for id in members {
            assert!(seen.insert(id), "pattern {id} in two terminals");
        }
    }
    assert_eq!(seen, training.ids().collect::<BTreeSet<_>>());
}

// ---------------------------------------------------------------------------
// Growth
// ---------------------------------------------------------------------------

#[test]
fn grown_tree_is_consistent_for_every_measure() {
    for measure in [
        ImpurityMeasure::Misclassification,
        ImpurityMeasure::Entropy,
        ImpurityMeasure::Gini,
    ] {
        let (training, tree) = grow(measure);
        tree.check_invariants().unwrap();
        assert_partitions(&tree, &training);
        assert_eq!(tree.n_nodes(), 2 * tree.n_terminals() - 1);
    }
}

#[test]
fn training_patterns_classify_into_their_own_terminal() {
    let (training, tree) = grow(ImpurityMeasure::Gini);
    for leaf in tree.terminal_ids() {
        for &id in tree.members(leaf).unwrap() {
            let vector = training.vector(id).unwrap();
            assert_eq!(tree.terminal_for(vector).unwrap(), leaf);
        }
    }
}

#[test]
fn entropy_tree_fits_training_data() {
    // Continuous features leave no duplicate vectors, so a full tree is pure.
    let (training, tree) = grow(ImpurityMeasure::Entropy);
    let rate = tree.misclassification_rate(&training).unwrap();
    assert!(rate.abs() < f64::EPSILON, "training error {rate}");
}

#[test]
fn larger_min_node_size_gives_smaller_tree() {
    let training = make_patterns(150, 1, 42);
    let small = CartConfig::new()
        .with_min_node_size(1)
        .grow(&training)
        .unwrap();
    let large = CartConfig::new()
        .with_min_node_size(40)
        .grow(&training)
        .unwrap();
    assert!(large.n_terminals() <= small.n_terminals());
    for leaf in large.terminal_ids() {
        let parent_size = large
            .parent(leaf)
            .map_or(training.len(), |p| large.members(p).unwrap().len());
        assert!(parent_size > 40);
    }
}

// ---------------------------------------------------------------------------
// Pruning
// ---------------------------------------------------------------------------

#[test]
fn pruned_tree_keeps_invariants() {
    let (training, tree) = grow(ImpurityMeasure::Gini);
    let validation = make_patterns(90, 1000, 7);
    for alpha in [0.0, 0.001, 0.01, 0.1] {
        let pruned = Pruner::new(alpha).unwrap().prune(&tree, &validation).unwrap();
        pruned.check_invariants().unwrap();
        assert_partitions(&pruned, &training);
        assert!(pruned.n_terminals() <= tree.n_terminals());
    }
}

#[test]
fn pruning_never_adds_validation_error_at_zero_alpha() {
    let (_, tree) = grow(ImpurityMeasure::Gini);
    let validation = make_patterns(90, 1000, 7);
    let (pruned, report) = Pruner::new(0.0)
        .unwrap()
        .prune_with_report(&tree, &validation)
        .unwrap();
    assert!(report.error_after <= report.error_before + 1e-12);
    assert_eq!(report.terminals_after, pruned.n_terminals());
    assert_eq!(
        report.terminals_before - report.terminals_after,
        report.collapses
    );
}

#[test]
fn pruning_at_zero_alpha_is_idempotent() {
    let (_, tree) = grow(ImpurityMeasure::Entropy);
    let validation = make_patterns(90, 1000, 7);
    let pruner = Pruner::new(0.0).unwrap();
    let once = pruner.prune(&tree, &validation).unwrap();
    let twice = pruner.prune(&once, &validation).unwrap();
    assert_eq!(once.node_ids(), twice.node_ids());
}

#[test]
fn huge_alpha_collapses_to_root() {
    let (training, tree) = grow(ImpurityMeasure::Gini);
    let validation = make_patterns(90, 1000, 7);
    let pruned = Pruner::new(1e9).unwrap().prune(&tree, &validation).unwrap();
    assert_eq!(pruned.n_nodes(), 1);
    assert!(pruned.is_terminal(NodeId::ROOT));
    assert_eq!(pruned.members(NodeId::ROOT).unwrap().len(), training.len());
}

#[test]
fn pruning_leaves_input_tree_untouched() {
    let (_, tree) = grow(ImpurityMeasure::Gini);
    let before = tree.node_ids();
    let validation = make_patterns(90, 1000, 7);
    let _ = Pruner::new(0.05).unwrap().prune(&tree, &validation).unwrap();
    assert_eq!(tree.node_ids(), before);
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

#[test]
fn batch_classification_matches_single() {
    let (_, tree) = grow(ImpurityMeasure::Gini);
    let queries = make_patterns(60, 5000, 99);
    let vectors: BTreeMap<PatternId, Vec<f64>> = queries
        .iter()
        .map(|(id, vector, _)| (id, vector.to_vec()))
        .collect();
    let batch = tree.classify_batch(&vectors).unwrap();
    assert_eq!(batch.len(), vectors.len());
    for (id, vector) in &vectors {
        assert_eq!(&batch[id].label, tree.classify(vector).unwrap());
        let total: f64 = batch[id].posterior.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }
}

#[test]
fn held_out_accuracy_is_reasonable() {
    let (_, tree) = grow(ImpurityMeasure::Gini);
    let test = make_patterns(90, 1000, 7);
    let rate = tree.misclassification_rate(&test).unwrap();
    assert!(rate < 0.5, "held-out error {rate}");
}
