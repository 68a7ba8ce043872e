use std::collections::{BTreeMap, BTreeSet};

use crate::{
    CartError,
    dataset::{PatternId, PatternSet},
    impurity::ImpurityMeasure,
    node::{Decision, Impurity, NodeId, Posterior, Prediction},
};

/// A classification tree stored as parallel maps keyed by [`NodeId`].
///
/// Each node is either a decision node (present in `children` and
/// `decision`) or a terminal node (present in `label`, `impurity`, and
/// `posterior`), never both. `members` holds the training partition of
/// every node, and the members of a decision node are the disjoint union of
/// its children's members.
///
/// `Clone` is a full structural copy; the pruner relies on it to build
/// candidate trees without touching the current one.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CartTree {
    pub(crate) children: BTreeMap<NodeId, (NodeId, NodeId)>,
    pub(crate) members: BTreeMap<NodeId, BTreeSet<PatternId>>,
    pub(crate) decision: BTreeMap<NodeId, Decision>,
    pub(crate) parent: BTreeMap<NodeId, NodeId>,
    pub(crate) label: BTreeMap<NodeId, Prediction>,
    pub(crate) impurity: BTreeMap<NodeId, Impurity>,
    pub(crate) posterior: BTreeMap<NodeId, Posterior>,
    pub(crate) label_counts: BTreeMap<String, usize>,
    pub(crate) pattern_labels: BTreeMap<PatternId, String>,
    pub(crate) measure: ImpurityMeasure,
    pub(crate) n_features: usize,
}

impl CartTree {
    /// Create a tree holding only the root, whose members are every
    /// training pattern. The root is neither decision nor terminal yet.
    pub(crate) fn with_root(set: &PatternSet, measure: ImpurityMeasure) -> Self {
        let pattern_labels: BTreeMap<PatternId, String> = set
            .iter()
            .map(|(id, _, label)| (id, label.to_string()))
            .collect();

        let mut label_counts = BTreeMap::new();
        for label in pattern_labels.values() {
            *label_counts.entry(label.clone()).or_insert(0usize) += 1;
        }

        let mut members = BTreeMap::new();
        members.insert(NodeId::ROOT, set.ids().collect());

        Self {
            children: BTreeMap::new(),
            members,
            decision: BTreeMap::new(),
            parent: BTreeMap::new(),
            label: BTreeMap::new(),
            impurity: BTreeMap::new(),
            posterior: BTreeMap::new(),
            label_counts,
            pattern_labels,
            measure,
            n_features: set.n_features(),
        }
    }

    /// Turn `node` into a decision node with two fresh children.
    pub(crate) fn attach_children(
        &mut self,
        node: NodeId,
        decision: Decision,
        left: (NodeId, BTreeSet<PatternId>),
        right: (NodeId, BTreeSet<PatternId>),
    ) {
        let (left_id, left_members) = left;
        let (right_id, right_members) = right;
        self.children.insert(node, (left_id, right_id));
        self.decision.insert(node, decision);
        self.parent.insert(left_id, node);
        self.parent.insert(right_id, node);
        self.members.insert(left_id, left_members);
        self.members.insert(right_id, right_members);
    }

    /// Record `node` as terminal, deriving its label, posterior, and impurity
    /// from its training members.
    pub(crate) fn make_terminal(&mut self, node: NodeId) {
        let (prediction, posterior, impurity) = match self.members.get(&node) {
            Some(members) => self.terminal_statistics(members),
            None => (Prediction::Ambiguous, Posterior::default(), Impurity::new(0.0)),
        };
        self.label.insert(node, prediction);
        self.posterior.insert(node, posterior);
        self.impurity.insert(node, impurity);
    }

    /// Majority label (ties → [`Prediction::Ambiguous`]), class proportions,
    /// and impurity of a set of training patterns.
    fn terminal_statistics(
        &self,
        members: &BTreeSet<PatternId>,
    ) -> (Prediction, Posterior, Impurity) {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for id in members {
            if let Some(label) = self.pattern_labels.get(id) {
                *counts.entry(label.as_str()).or_insert(0) += 1;
            }
        }

        let total: usize = counts.values().sum();
        let count_vec: Vec<usize> = counts.values().copied().collect();
        let impurity = self.measure.impurity(&count_vec);

        let max = count_vec.iter().copied().max().unwrap_or(0);
        let mut leaders = counts.iter().filter(|&(_, &c)| c == max);
        let prediction = match (leaders.next(), leaders.next()) {
            (Some((label, _)), None) => Prediction::Class((*label).to_string()),
            _ => Prediction::Ambiguous,
        };

        let proportions = counts
            .iter()
            .map(|(label, &c)| ((*label).to_string(), c as f64 / total as f64))
            .collect();

        (prediction, Posterior::new(proportions), impurity)
    }

    /// Collapse the two terminal children of `node` into `node`.
    ///
    /// Both children are removed from every map and `node` becomes a
    /// terminal whose statistics are recomputed from its members, which are
    /// the union of the removed children's members.
    ///
    /// # Errors
    ///
    /// | Variant                         | When                                      |
    /// |---------------------------------|-------------------------------------------|
    /// | [`CartError::UnknownNode`]      | `node` is not a decision node of the tree |
    /// | [`CartError::BrokenInvariant`]  | a child of `node` is not terminal         |
    pub(crate) fn collapse(&mut self, node: NodeId) -> Result<(), CartError> {
        let (left, right) = self
            .children
            .get(&node)
            .copied()
            .ok_or(CartError::UnknownNode { node })?;

        for child in [left, right] {
            if !self.is_terminal(child) {
                return Err(CartError::BrokenInvariant {
                    node: child,
                    reason: "only terminal children can be collapsed".to_string(),
                });
            }
        }

        for child in [left, right] {
            self.members.remove(&child);
            self.parent.remove(&child);
            self.label.remove(&child);
            self.impurity.remove(&child);
            self.posterior.remove(&child);
        }
        self.children.remove(&node);
        self.decision.remove(&node);
        self.make_terminal(node);
        Ok(())
    }

    // --- Queries ---

    /// Return the root id.
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Return `true` if `node` is a terminal node.
    #[must_use]
    pub fn is_terminal(&self, node: NodeId) -> bool {
        self.label.contains_key(&node)
    }

    /// Return `true` if `node` is a decision node.
    #[must_use]
    pub fn is_decision(&self, node: NodeId) -> bool {
        self.decision.contains_key(&node)
    }

    /// Return every node id in ascending order.
    #[must_use]
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.decision
            .keys()
            .chain(self.label.keys())
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Return the terminal ids in ascending order.
    #[must_use]
    pub fn terminal_ids(&self) -> Vec<NodeId> {
        self.label.keys().copied().collect()
    }

    /// Return the number of terminal nodes.
    #[must_use]
    pub fn n_terminals(&self) -> usize {
        self.label.len()
    }

    /// Return the total number of nodes (decision and terminal).
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.decision.len() + self.label.len()
    }

    /// Return the maximum depth. A tree whose root is terminal has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.label
            .keys()
            .map(|&leaf| {
                let mut depth = 0;
                let mut current = leaf;
                while let Some(&up) = self.parent.get(&current) {
                    depth += 1;
                    current = up;
                }
                depth
            })
            .max()
            .unwrap_or(0)
    }

    /// Return the `(left, right)` children of a decision node.
    #[must_use]
    pub fn children(&self, node: NodeId) -> Option<(NodeId, NodeId)> {
        self.children.get(&node).copied()
    }

    /// Return the parent of `node`; `None` for the root.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.parent.get(&node).copied()
    }

    /// Return the other child of `node`'s parent.
    #[must_use]
    pub fn sibling(&self, node: NodeId) -> Option<NodeId> {
        let (left, right) = self.children(self.parent(node)?)?;
        Some(if left == node { right } else { left })
    }

    /// Return the split rule of a decision node.
    #[must_use]
    pub fn decision(&self, node: NodeId) -> Option<&Decision> {
        self.decision.get(&node)
    }

    /// Return the training patterns that reached `node`.
    #[must_use]
    pub fn members(&self, node: NodeId) -> Option<&BTreeSet<PatternId>> {
        self.members.get(&node)
    }

    /// Return the label stored at a terminal node.
    #[must_use]
    pub fn prediction(&self, node: NodeId) -> Option<&Prediction> {
        self.label.get(&node)
    }

    /// Return the impurity stored at a terminal node.
    #[must_use]
    pub fn terminal_impurity(&self, node: NodeId) -> Option<Impurity> {
        self.impurity.get(&node).copied()
    }

    /// Return the class proportions stored at a terminal node.
    #[must_use]
    pub fn terminal_posterior(&self, node: NodeId) -> Option<&Posterior> {
        self.posterior.get(&node)
    }

    /// Return the training count of every class.
    #[must_use]
    pub fn label_counts(&self) -> &BTreeMap<String, usize> {
        &self.label_counts
    }

    /// Return the impurity measure the tree was grown with.
    #[must_use]
    pub fn measure(&self) -> ImpurityMeasure {
        self.measure
    }

    /// Return the dimensionality of the training vectors.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Verify that the maps describe one consistent binary tree.
    ///
    /// Checks, for every node reachable from the root: it is exactly one of
    /// decision/terminal; a decision node has both a rule and two children
    /// that point back to it; its members are the disjoint union of its
    /// children's members. Finally, no map holds an id that is unreachable
    /// from the root.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::BrokenInvariant`] naming the first offending node.
    pub fn check_invariants(&self) -> Result<(), CartError> {
        let broken = |node: NodeId, reason: &str| CartError::BrokenInvariant {
            node,
            reason: reason.to_string(),
        };

        if self.parent.contains_key(&NodeId::ROOT) {
            return Err(broken(NodeId::ROOT, "root has a parent"));
        }

        let mut reachable = BTreeSet::new();
        let mut stack = vec![NodeId::ROOT];
        while let Some(node) = stack.pop() {
            if !reachable.insert(node) {
                return Err(broken(node, "node reached twice"));
            }

            let terminal = self.label.contains_key(&node);
            let has_stats =
                self.impurity.contains_key(&node) && self.posterior.contains_key(&node);
            let has_rule = self.decision.contains_key(&node);
            let children = self.children.get(&node).copied();

            match (terminal, has_rule, children) {
                (true, false, None) => {
                    if !has_stats {
                        return Err(broken(node, "terminal is missing impurity or posterior"));
                    }
                }
                (false, true, Some((left, right))) => {
                    if has_stats {
                        return Err(broken(node, "decision node carries terminal statistics"));
                    }
                    if self
                        .decision
                        .get(&node)
                        .is_some_and(|d| d.feature.index() >= self.n_features)
                    {
                        return Err(broken(node, "rule tests a feature the tree does not have"));
                    }
                    if left == right {
                        return Err(broken(node, "both children are the same node"));
                    }
                    for child in [left, right] {
                        if self.parent.get(&child) != Some(&node) {
                            return Err(broken(child, "child does not point back to its parent"));
                        }
                    }
                    let own = self.members.get(&node);
                    let l = self.members.get(&left);
                    let r = self.members.get(&right);
                    if let (Some(own), Some(l), Some(r)) = (own, l, r) {
                        if !l.is_disjoint(r) {
                            return Err(broken(node, "children share members"));
                        }
                        if l.len() + r.len() != own.len() || !l.union(r).all(|id| own.contains(id))
                        {
                            return Err(broken(node, "members differ from children's union"));
                        }
                    } else {
                        return Err(broken(node, "missing member set"));
                    }
                    stack.push(right);
                    stack.push(left);
                }
                (true, true, _) | (true, _, Some(_)) => {
                    return Err(broken(node, "node is both decision and terminal"));
                }
                _ => return Err(broken(node, "node is neither decision nor terminal")),
            }
        }

        let orphan = self
            .members
            .keys()
            .chain(self.parent.keys())
            .chain(self.label.keys())
            .chain(self.impurity.keys())
            .chain(self.posterior.keys())
            .chain(self.decision.keys())
            .chain(self.children.keys())
            .find(|&&id| !reachable.contains(&id));
        if let Some(&node) = orphan {
            return Err(broken(node, "entry is unreachable from the root"));
        }

        Ok(())
    }
}
