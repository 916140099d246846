use std::collections::{BTreeMap, BTreeSet};

use crate::shared::{Relationship, ASN};

/// One labelled edge, as produced by annotation or peer promotion. Applying
/// it sets `from -> to` to `relationship` and `to -> from` to its inverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeAnnotation {
    pub from: ASN,
    pub to: ASN,
    pub relationship: Relationship,
}

impl EdgeAnnotation {
    pub fn new(from: ASN, to: ASN, relationship: Relationship) -> Self {
        EdgeAnnotation { from, to, relationship }
    }
}

/// Sparse directed adjacency: `graph[a][b]` is the role of `a` towards `b`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipGraph {
    edges: BTreeMap<ASN, BTreeMap<ASN, Relationship>>,
}

impl RelationshipGraph {
    pub fn new() -> Self {
        RelationshipGraph::default()
    }

    /// Merges annotations in the given order. Precedence: the last
    /// annotation touching an unordered pair wins, for both directions.
    pub fn apply_in_sequence<I>(&mut self, annotations: I)
    where
        I: IntoIterator<Item = EdgeAnnotation>,
    {
        for annotation in annotations {
            self.assign(annotation.from, annotation.to, annotation.relationship);
        }
    }

    pub fn from_annotations<I>(annotations: I) -> Self
    where
        I: IntoIterator<Item = EdgeAnnotation>,
    {
        let mut graph = RelationshipGraph::new();
        graph.apply_in_sequence(annotations);
        graph
    }

    /// Labels the edge in both directions, overwriting any earlier label.
    pub fn assign(&mut self, from: ASN, to: ASN, relationship: Relationship) {
        self.edges.entry(from).or_default().insert(to, relationship);
        self.edges.entry(to).or_default().insert(from, relationship.invert());
    }

    /// Sets a single directed entry. Used when loading relationship files,
    /// where each line carries one direction.
    pub fn insert_directed(&mut self, from: ASN, to: ASN, relationship: Relationship) {
        self.edges.entry(from).or_default().insert(to, relationship);
    }

    /// Registers an AS that has no edges (it only appeared on singleton paths).
    pub fn ensure_node(&mut self, asn: ASN) {
        self.edges.entry(asn).or_default();
    }

    pub fn get(&self, from: ASN, to: ASN) -> Option<Relationship> {
        self.edges.get(&from).and_then(|row| row.get(&to)).copied()
    }

    pub fn contains(&self, asn: ASN) -> bool {
        self.edges.contains_key(&asn)
    }

    pub fn neighbors(&self, asn: ASN) -> Option<&BTreeMap<ASN, Relationship>> {
        self.edges.get(&asn)
    }

    /// Number of relationship edges of an AS (0 for unknown ASes).
    pub fn edge_count_of(&self, asn: ASN) -> usize {
        self.edges.get(&asn).map_or(0, BTreeMap::len)
    }

    fn related(&self, asn: ASN, wanted: impl Fn(Relationship) -> bool) -> BTreeSet<ASN> {
        self.edges
            .get(&asn)
            .map(|row| {
                row.iter()
                    .filter(|&(_, &rel)| wanted(rel))
                    .map(|(&neighbor, _)| neighbor)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn customers_of(&self, asn: ASN) -> BTreeSet<ASN> {
        self.related(asn, |rel| rel == Relationship::ProviderToCustomer)
    }

    pub fn providers_of(&self, asn: ASN) -> BTreeSet<ASN> {
        self.related(asn, |rel| rel == Relationship::CustomerToProvider)
    }

    /// Peers and siblings.
    pub fn peers_of(&self, asn: ASN) -> BTreeSet<ASN> {
        self.related(asn, |rel| rel.is_symmetric())
    }

    pub fn nodes(&self) -> impl Iterator<Item = ASN> + '_ {
        self.edges.keys().copied()
    }

    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    /// Directed entries, in ascending `(from, to)` order.
    pub fn iter(&self) -> impl Iterator<Item = (ASN, ASN, Relationship)> + '_ {
        self.edges
            .iter()
            .flat_map(|(&from, row)| row.iter().map(move |(&to, &rel)| (from, to, rel)))
    }

    pub fn directed_edge_count(&self) -> usize {
        self.edges.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Directed entries per label.
    pub fn label_counts(&self) -> BTreeMap<Relationship, usize> {
        let mut counts = BTreeMap::new();
        for (_, _, rel) in self.iter() {
            *counts.entry(rel).or_insert(0) += 1;
        }
        counts
    }

    /// Every directed entry whose mirror is missing or is not its inverse.
    pub fn inconsistent_edges(&self) -> Vec<(ASN, ASN)> {
        self.iter()
            .filter(|&(from, to, rel)| self.get(to, from) != Some(rel.invert()))
            .map(|(from, to, _)| (from, to))
            .collect()
    }

    /// The graph without `removed` and without any edge touching them.
    pub fn without(&self, removed: &BTreeSet<ASN>) -> RelationshipGraph {
        let edges = self
            .edges
            .iter()
            .filter(|(asn, _)| !removed.contains(*asn))
            .map(|(&asn, row)| {
                let row = row
                    .iter()
                    .filter(|(neighbor, _)| !removed.contains(*neighbor))
                    .map(|(&neighbor, &rel)| (neighbor, rel))
                    .collect();
                (asn, row)
            })
            .collect();
        RelationshipGraph { edges }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_mirrors() {
        let mut graph = RelationshipGraph::new();
        graph.assign(1, 2, Relationship::CustomerToProvider);
        graph.assign(2, 3, Relationship::PeerToPeer);

        assert_eq!(graph.get(2, 1), Some(Relationship::ProviderToCustomer));
        assert_eq!(graph.get(3, 2), Some(Relationship::PeerToPeer));
        assert!(graph.inconsistent_edges().is_empty());
        assert_eq!(graph.customers_of(2), BTreeSet::from([1]));
        assert_eq!(graph.providers_of(1), BTreeSet::from([2]));
        assert_eq!(graph.peers_of(2), BTreeSet::from([3]));
    }

    #[test]
    fn test_last_write_wins() {
        let graph = RelationshipGraph::from_annotations(vec![
            EdgeAnnotation::new(1, 2, Relationship::CustomerToProvider),
            EdgeAnnotation::new(2, 1, Relationship::CustomerToProvider),
        ]);
        assert_eq!(graph.get(1, 2), Some(Relationship::ProviderToCustomer));
        assert_eq!(graph.get(2, 1), Some(Relationship::CustomerToProvider));
        assert_eq!(graph.directed_edge_count(), 2);
    }

    #[test]
    fn test_without_drops_touching_edges() {
        let mut graph = RelationshipGraph::new();
        graph.assign(1, 2, Relationship::CustomerToProvider);
        graph.assign(2, 3, Relationship::CustomerToProvider);
        graph.ensure_node(9);

        let residual = graph.without(&BTreeSet::from([1]));
        assert!(!residual.contains(1));
        assert_eq!(residual.edge_count_of(2), 1);
        assert!(residual.contains(9));
        // the input is untouched
        assert_eq!(graph.edge_count_of(2), 2);
    }

    #[test]
    fn test_inconsistent_edges_detects_half_edges() {
        let mut graph = RelationshipGraph::new();
        graph.insert_directed(1, 2, Relationship::CustomerToProvider);
        assert_eq!(graph.inconsistent_edges(), vec![(1, 2)]);
    }
}
