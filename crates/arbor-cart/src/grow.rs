use std::collections::BTreeSet;

use tracing::{debug, instrument, trace};

use crate::{
    config::CartConfig,
    dataset::{PatternId, PatternSet},
    node::NodeId,
    split::{SplitResult, find_best_split},
    tree::CartTree,
};

/// Grow a full tree depth-first, left child before right.
///
/// There is no recursion: `current` walks the tree, and after a node is
/// made terminal the `parent`/`children` maps stand in for the call stack.
/// A left child hands over to its right sibling; a right child climbs to
/// its parent and repeats the check. Climbing past the root ends growth.
#[instrument(skip_all, fields(n_patterns = set.len(), measure = %config.measure))]
pub(crate) fn grow(config: &CartConfig, set: &PatternSet) -> CartTree {
    let mut tree = CartTree::with_root(set, config.measure);
    let mut current = NodeId::ROOT;
    let mut max_id = NodeId::ROOT.get();

    'grow: loop {
        let split = tree
            .members(current)
            .and_then(|members| try_split(config, set, members));

        if let Some(split) = split {
            let left = NodeId::new(max_id + 1);
            let right = NodeId::new(max_id + 2);
            trace!(
                node = %current,
                feature = %split.decision.feature,
                threshold = split.decision.threshold,
                gain = split.gain,
                n_left = split.left.len(),
                n_right = split.right.len(),
                "split node"
            );
            tree.attach_children(
                current,
                split.decision,
                (left, split.left),
                (right, split.right),
            );
            max_id += 2;
            current = left;
            continue;
        }

        tree.make_terminal(current);
        trace!(node = %current, label = ?tree.prediction(current), "terminal node");

        loop {
            let Some(parent) = tree.parent(current) else {
                break 'grow;
            };
            let Some((left, right)) = tree.children(parent) else {
                break 'grow;
            };
            if current == left {
                current = right;
                continue 'grow;
            }
            current = parent;
        }
    }

    debug!(
        n_nodes = tree.n_nodes(),
        n_terminals = tree.n_terminals(),
        depth = tree.depth(),
        "tree grown"
    );
    tree
}

/// Split `members` if the node is impure enough, large enough, and some
/// feature yields a positive gain.
fn try_split(
    config: &CartConfig,
    set: &PatternSet,
    members: &BTreeSet<PatternId>,
) -> Option<SplitResult> {
    let impurity = config.measure.impurity(&set.class_counts(members));
    if impurity.value() <= config.tolerance || members.len() <= config.min_node_size {
        return None;
    }
    find_best_split(set, members, config.measure)
}
