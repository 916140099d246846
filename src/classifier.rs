use std::collections::{BTreeMap, BTreeSet};

use crate::relationship_graph::RelationshipGraph;
use crate::shared::{Relationship, TierLabel, ASN};

/// ASes labelled by one peeling stage and the graph left for the next one.
#[derive(Debug, Clone)]
pub struct StageOutcome {
    pub labeled: BTreeSet<ASN>,
    pub residual: RelationshipGraph,
}

/// Split of the residual core graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorePartition {
    pub dense: BTreeSet<ASN>,
    pub transit: BTreeSet<ASN>,
    pub outer: BTreeSet<ASN>,
}

/// Final tier of every AS in the classified graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierAssignment {
    tiers: BTreeMap<ASN, TierLabel>,
}

impl TierAssignment {
    pub fn new() -> Self {
        TierAssignment::default()
    }

    /// Labels every AS of `asns`. An AS already labelled keeps its first tier.
    fn label_all(&mut self, asns: &BTreeSet<ASN>, tier: TierLabel) {
        for &asn in asns {
            self.tiers.entry(asn).or_insert(tier);
        }
    }

    pub fn get(&self, asn: ASN) -> Option<TierLabel> {
        self.tiers.get(&asn).copied()
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// ASes of a tier, ascending.
    pub fn members(&self, tier: TierLabel) -> BTreeSet<ASN> {
        self.tiers
            .iter()
            .filter(|&(_, &t)| t == tier)
            .map(|(&asn, _)| asn)
            .collect()
    }

    pub fn counts(&self) -> BTreeMap<TierLabel, usize> {
        let mut counts: BTreeMap<TierLabel, usize> =
            TierLabel::ALL.iter().map(|&tier| (tier, 0)).collect();
        for tier in self.tiers.values() {
            *counts.entry(*tier).or_insert(0) += 1;
        }
        counts
    }

    /// `(asn, tier)` grouped by tier in peeling order, ascending AS within a tier.
    pub fn iter_by_tier(&self) -> impl Iterator<Item = (ASN, TierLabel)> + '_ {
        TierLabel::ALL
            .into_iter()
            .flat_map(move |tier| self.members(tier).into_iter().map(move |asn| (asn, tier)))
    }
}

/// Stubs are ASes with at most one relationship edge.
pub fn peel_stubs(graph: &RelationshipGraph) -> StageOutcome {
    let labeled: BTreeSet<ASN> = graph
        .nodes()
        .filter(|&asn| graph.edge_count_of(asn) <= 1)
        .collect();
    let residual = graph.without(&labeled);
    StageOutcome { labeled, residual }
}

/// Regional ISPs are ASes that, once stubs are gone, have no customers of
/// their own. That includes providers left with no edges at all because they
/// served only stubs, unless no AS in `graph` has an edge left: then there is
/// no interconnected core and those providers stay for the core split.
pub fn peel_regional_isps(graph: &RelationshipGraph) -> StageOutcome {
    let has_core_edges = graph.nodes().any(|asn| graph.edge_count_of(asn) > 0);
    let labeled: BTreeSet<ASN> = graph
        .nodes()
        .filter(|&asn| graph.customers_of(asn).is_empty())
        .filter(|&asn| has_core_edges || graph.edge_count_of(asn) > 0)
        .collect();
    let residual = graph.without(&labeled);
    StageOutcome { labeled, residual }
}

/// Splits the residual core.
///
/// The dense core is grown greedily from the provider-free ASes, highest
/// residual degree first: an AS joins if it has a peer or sibling edge to every
/// member so far. The transit core is every other AS adjacent to the dense
/// core that still has customers; the outer core is the rest.
pub fn partition_core(graph: &RelationshipGraph) -> CorePartition {
    if graph.is_empty() {
        return CorePartition::default();
    }

    let mut candidates: Vec<ASN> = graph
        .nodes()
        .filter(|&asn| graph.providers_of(asn).is_empty())
        .collect();
    if candidates.is_empty() {
        candidates = graph.nodes().collect();
    }
    candidates.sort_by(|&a, &b| {
        graph
            .edge_count_of(b)
            .cmp(&graph.edge_count_of(a))
            .then(a.cmp(&b))
    });

    let mut dense: BTreeSet<ASN> = BTreeSet::new();
    for asn in candidates {
        let meshed = dense.iter().all(|&member| {
            matches!(
                graph.get(asn, member),
                Some(Relationship::PeerToPeer) | Some(Relationship::SiblingToSibling)
            )
        });
        if meshed {
            dense.insert(asn);
        }
    }

    let mut transit = BTreeSet::new();
    let mut outer = BTreeSet::new();
    for asn in graph.nodes().filter(|asn| !dense.contains(asn)) {
        let touches_dense = graph
            .neighbors(asn)
            .map_or(false, |row| row.keys().any(|neighbor| dense.contains(neighbor)));
        if touches_dense && !graph.customers_of(asn).is_empty() {
            transit.insert(asn);
        } else {
            outer.insert(asn);
        }
    }

    CorePartition { dense, transit, outer }
}

/// Runs stub removal, regional-ISP removal and the core split in order.
pub fn classify(graph: &RelationshipGraph) -> TierAssignment {
    let mut assignment = TierAssignment::new();

    let stubs = peel_stubs(graph);
    log::info!(
        "removed {} stubs: {} ASes left",
        stubs.labeled.len(),
        stubs.residual.node_count()
    );
    assignment.label_all(&stubs.labeled, TierLabel::Stub);

    let isps = peel_regional_isps(&stubs.residual);
    log::info!(
        "removed {} regional ISPs: {} ASes left",
        isps.labeled.len(),
        isps.residual.node_count()
    );
    assignment.label_all(&isps.labeled, TierLabel::RegionalIsp);

    let core = partition_core(&isps.residual);
    log::info!(
        "total {} cores: {} dense cores, {} transit cores, {} outer cores",
        core.dense.len() + core.transit.len() + core.outer.len(),
        core.dense.len(),
        core.transit.len(),
        core.outer.len()
    );
    assignment.label_all(&core.dense, TierLabel::DenseCore);
    assignment.label_all(&core.transit, TierLabel::TransitCore);
    assignment.label_all(&core.outer, TierLabel::OuterCore);

    assignment
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Three meshed tier-1s (1, 2, 3), AS 4 under 1 and 2, regional ISPs
    /// 5 and 6 under 4, and stubs 7..9.
    fn hierarchy() -> RelationshipGraph {
        let mut graph = RelationshipGraph::new();
        graph.assign(1, 2, Relationship::PeerToPeer);
        graph.assign(2, 3, Relationship::PeerToPeer);
        graph.assign(1, 3, Relationship::PeerToPeer);
        graph.assign(4, 1, Relationship::CustomerToProvider);
        graph.assign(4, 2, Relationship::CustomerToProvider);
        graph.assign(5, 4, Relationship::CustomerToProvider);
        graph.assign(5, 3, Relationship::CustomerToProvider);
        graph.assign(6, 4, Relationship::CustomerToProvider);
        graph.assign(6, 5, Relationship::PeerToPeer);
        graph.assign(7, 5, Relationship::CustomerToProvider);
        graph.assign(8, 3, Relationship::CustomerToProvider);
        graph.assign(9, 6, Relationship::CustomerToProvider);
        graph
    }

    #[test]
    fn test_peel_stubs() {
        let outcome = peel_stubs(&hierarchy());
        assert_eq!(outcome.labeled, BTreeSet::from([7, 8, 9]));
        assert!(!outcome.residual.contains(7));
        assert!(outcome.residual.customers_of(5).is_empty());
    }

    #[test]
    fn test_peel_regional_isps() {
        let stubs = peel_stubs(&hierarchy());
        let isps = peel_regional_isps(&stubs.residual);
        // 5 and 6 lost their only customers with the stubs
        assert_eq!(isps.labeled, BTreeSet::from([5, 6]));
        assert_eq!(isps.residual.node_count(), 4);
    }

    #[test]
    fn test_provider_of_only_stubs_is_regional_isp() {
        let mut graph = hierarchy();
        // 50 serves only stubs and has no link to the meshed core
        graph.assign(51, 50, Relationship::CustomerToProvider);
        graph.assign(50, 52, Relationship::PeerToPeer);

        let stubs = peel_stubs(&graph);
        assert_eq!(stubs.residual.edge_count_of(50), 0);
        let isps = peel_regional_isps(&stubs.residual);
        assert_eq!(isps.labeled, BTreeSet::from([5, 6, 50]));

        let tiers = classify(&graph);
        assert_eq!(tiers.get(50), Some(TierLabel::RegionalIsp));
        assert_eq!(tiers.members(TierLabel::DenseCore), BTreeSet::from([1, 2, 3]));
    }

    #[test]
    fn test_edge_free_residual_stays_in_core() {
        // a single provider whose neighbours are all stubs
        let mut graph = RelationshipGraph::new();
        graph.assign(1, 2, Relationship::CustomerToProvider);
        graph.assign(4, 2, Relationship::CustomerToProvider);
        graph.assign(2, 3, Relationship::PeerToPeer);

        let stubs = peel_stubs(&graph);
        let isps = peel_regional_isps(&stubs.residual);
        assert!(isps.labeled.is_empty());
        assert_eq!(classify(&graph).get(2), Some(TierLabel::DenseCore));
    }

    #[test]
    fn test_partition_core() {
        let stubs = peel_stubs(&hierarchy());
        let isps = peel_regional_isps(&stubs.residual);
        let core = partition_core(&isps.residual);
        assert_eq!(core.dense, BTreeSet::from([1, 2, 3]));
        // 4 has no customers once 5 and 6 are gone
        assert_eq!(core.transit, BTreeSet::new());
        assert_eq!(core.outer, BTreeSet::from([4]));
    }

    #[test]
    fn test_transit_core_keeps_customers() {
        let mut graph = hierarchy();
        // give 4 a second-level transit customer that survives both peels
        graph.assign(10, 4, Relationship::CustomerToProvider);
        graph.assign(11, 10, Relationship::CustomerToProvider);
        graph.assign(12, 11, Relationship::CustomerToProvider);
        graph.assign(13, 11, Relationship::CustomerToProvider);

        let tiers = classify(&graph);
        assert_eq!(tiers.get(11), Some(TierLabel::RegionalIsp));
        assert_eq!(tiers.get(4), Some(TierLabel::TransitCore));
        assert_eq!(tiers.get(10), Some(TierLabel::OuterCore));
    }

    #[test]
    fn test_every_as_gets_exactly_one_tier() {
        let mut graph = hierarchy();
        graph.ensure_node(42);
        let tiers = classify(&graph);

        assert_eq!(tiers.len(), graph.node_count());
        let total: usize = tiers.counts().values().sum();
        assert_eq!(total, graph.node_count());
        assert_eq!(tiers.get(42), Some(TierLabel::Stub));
        assert_eq!(tiers.iter_by_tier().count(), graph.node_count());
    }

    #[test]
    fn test_without_provider_free_ases_all_are_candidates() {
        // a provider cycle leaves no provider-free AS
        let mut graph = RelationshipGraph::new();
        graph.assign(1, 2, Relationship::CustomerToProvider);
        graph.assign(2, 3, Relationship::CustomerToProvider);
        graph.assign(3, 1, Relationship::CustomerToProvider);

        let core = partition_core(&graph);
        assert_eq!(core.dense, BTreeSet::from([1]));
        assert_eq!(core.dense.len() + core.transit.len() + core.outer.len(), 3);
    }
}
