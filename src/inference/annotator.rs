use crate::as_path::PathSet;
use crate::inference::transit::TransitCounts;
use crate::relationship_graph::{EdgeAnnotation, RelationshipGraph};
use crate::shared::{Relationship, ASN};

/// Which annotation rule an adjacent pair falls under. Rules are checked in
/// declaration order and the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitRule {
    /// Both directions above the threshold.
    MutualHeavy,
    /// Both directions non-zero and at most the threshold.
    MutualLight,
    /// `curr` provides transit to `next`.
    CurrProvides,
    /// `next` provides transit to `curr`.
    NextProvides,
}

impl TransitRule {
    /// `next_served_by_curr` is the count of `(next, curr)`,
    /// `curr_served_by_next` the count of `(curr, next)`.
    pub fn select(next_served_by_curr: usize, curr_served_by_next: usize, threshold: usize) -> Self {
        let l = threshold;
        if next_served_by_curr > l && curr_served_by_next > l {
            TransitRule::MutualHeavy
        } else if next_served_by_curr <= l
            && curr_served_by_next <= l
            && next_served_by_curr > 0
            && curr_served_by_next > 0
        {
            TransitRule::MutualLight
        } else if next_served_by_curr > l || curr_served_by_next == 0 {
            TransitRule::CurrProvides
        } else {
            // Remaining cases satisfy `curr_served_by_next > l || next_served_by_curr == 0`.
            TransitRule::NextProvides
        }
    }

    /// Label of the directed entry `curr -> next`.
    pub fn relationship(&self) -> Relationship {
        match self {
            TransitRule::MutualHeavy | TransitRule::MutualLight => Relationship::SiblingToSibling,
            TransitRule::CurrProvides => Relationship::ProviderToCustomer,
            TransitRule::NextProvides => Relationship::CustomerToProvider,
        }
    }
}

/// Annotation for a single adjacent pair.
pub fn annotate_link(curr: ASN, next: ASN, counts: &TransitCounts, threshold: usize) -> EdgeAnnotation {
    let next_served_by_curr = counts.count(next, curr);
    let curr_served_by_next = counts.count(curr, next);
    let rule = TransitRule::select(next_served_by_curr, curr_served_by_next, threshold);
    log::trace!(
        "{} -> {}: counts ({}, {}) -> {:?}",
        curr,
        next,
        next_served_by_curr,
        curr_served_by_next,
        rule
    );
    EdgeAnnotation::new(curr, next, rule.relationship())
}

/// Annotations for every adjacent pair, in corpus order.
pub fn annotations<'a>(
    paths: &'a PathSet,
    counts: &'a TransitCounts,
    threshold: usize,
) -> impl Iterator<Item = EdgeAnnotation> + 'a {
    paths
        .iter()
        .flat_map(|path| path.links())
        .map(move |(curr, next)| annotate_link(curr, next, counts, threshold))
}

/// Builds the provisional relationship graph. Where different paths disagree
/// on a pair, the later path wins.
pub fn annotate(paths: &PathSet, counts: &TransitCounts, threshold: usize) -> RelationshipGraph {
    let graph = RelationshipGraph::from_annotations(annotations(paths, counts, threshold));
    log::debug!(
        "annotated {} directed relationships over {} ASes",
        graph.directed_edge_count(),
        graph.node_count()
    );
    graph
}
