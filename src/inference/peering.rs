use std::collections::HashSet;

use crate::as_graph::{degree_of, top_provider_index, DegreeMap};
use crate::as_path::{AsPath, PathSet};
use crate::relationship_graph::{EdgeAnnotation, RelationshipGraph};
use crate::shared::{InferenceError, Relationship, ASN};

/// Ordered AS pairs that may not be labelled peer-to-peer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NonPeerSet {
    pairs: HashSet<(ASN, ASN)>,
}

impl NonPeerSet {
    pub fn new() -> Self {
        NonPeerSet::default()
    }

    pub fn insert(&mut self, a: ASN, b: ASN) {
        self.pairs.insert((a, b));
    }

    /// True if `(a, b)` or `(b, a)` was marked.
    pub fn excludes(&self, a: ASN, b: ASN) -> bool {
        self.pairs.contains(&(a, b)) || self.pairs.contains(&(b, a))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

fn relationship_of(graph: &RelationshipGraph, from: ASN, to: ASN) -> Result<Relationship, InferenceError> {
    graph
        .get(from, to)
        .ok_or(InferenceError::MissingRelationship { from, to })
}

/// Marks the links of one path that cannot be peering links.
///
/// Links more than one hop away from the top provider are transit links. Of
/// the two links flanking the top provider, the one on the lower-degree side
/// is marked too, unless either flank is a sibling link. A top provider at
/// either end of the path has a single flank, which stays unmarked.
pub fn mark_path(
    path: &AsPath,
    degrees: &DegreeMap,
    graph: &RelationshipGraph,
    non_peers: &mut NonPeerSet,
) -> Result<(), InferenceError> {
    let top = match top_provider_index(path, degrees)? {
        Some(top) => top,
        None => return Ok(()),
    };

    for (idx, (curr, next)) in path.links().enumerate() {
        // idx < top - 1, without underflow
        if idx + 1 < top || idx > top {
            non_peers.insert(curr, next);
        }
    }

    let asns = path.asns();
    if top == 0 || top + 1 >= asns.len() {
        return Ok(());
    }

    let (prev, peak, next) = (asns[top - 1], asns[top], asns[top + 1]);
    let before = relationship_of(graph, prev, peak)?;
    let after = relationship_of(graph, peak, next)?;
    if before == Relationship::SiblingToSibling || after == Relationship::SiblingToSibling {
        return Ok(());
    }

    if degree_of(degrees, prev)? > degree_of(degrees, next)? {
        non_peers.insert(peak, next);
    } else {
        non_peers.insert(prev, peak);
    }
    Ok(())
}

/// Collects the non-peer pairs over the whole corpus.
pub fn mark_non_peers(
    paths: &PathSet,
    degrees: &DegreeMap,
    graph: &RelationshipGraph,
) -> Result<NonPeerSet, InferenceError> {
    let mut non_peers = NonPeerSet::new();
    for path in paths {
        mark_path(path, degrees, graph, &mut non_peers)?;
    }
    log::debug!("marked {} non-peer pairs", non_peers.len());
    Ok(non_peers)
}

/// True when `1/ratio < degree(a) / degree(b) < ratio`.
pub fn comparable_size(degree_a: usize, degree_b: usize, ratio: f64) -> bool {
    if degree_b == 0 {
        return false;
    }
    let size_ratio = degree_a as f64 / degree_b as f64;
    1.0 / ratio < size_ratio && size_ratio < ratio
}

/// Peer-to-peer annotations for every unmarked link between ASes of
/// comparable degree, in corpus order.
pub fn peer_annotations(
    paths: &PathSet,
    degrees: &DegreeMap,
    non_peers: &NonPeerSet,
    degree_size_ratio: f64,
) -> Result<Vec<EdgeAnnotation>, InferenceError> {
    let mut promoted = Vec::new();
    for (curr, next) in paths.iter().flat_map(|path| path.links()) {
        if non_peers.excludes(curr, next) {
            continue;
        }
        let curr_degree = degree_of(degrees, curr)?;
        let next_degree = degree_of(degrees, next)?;
        if comparable_size(curr_degree, next_degree, degree_size_ratio) {
            log::trace!("{} <-> {}: promoted to p2p", curr, next);
            promoted.push(EdgeAnnotation::new(curr, next, Relationship::PeerToPeer));
        }
    }
    Ok(promoted)
}

/// Refines `graph` in place: marks non-peer links, then relabels the
/// remaining comparable-size links as peer-to-peer. Promotion overrides the
/// hierarchy labels assigned during annotation.
///
/// Returns the non-peer set for reporting.
pub fn resolve_peering(
    paths: &PathSet,
    degrees: &DegreeMap,
    graph: &mut RelationshipGraph,
    degree_size_ratio: f64,
) -> Result<NonPeerSet, InferenceError> {
    let non_peers = mark_non_peers(paths, degrees, graph)?;
    let promoted = peer_annotations(paths, degrees, &non_peers, degree_size_ratio)?;
    log::debug!("promoting {} links to p2p", promoted.len());
    graph.apply_in_sequence(promoted);
    Ok(non_peers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::as_graph::NeighborIndex;
    use crate::inference::annotator::annotate;
    use crate::inference::transit::count_transit;

    fn degrees(pairs: &[(ASN, usize)]) -> DegreeMap {
        pairs.iter().copied().collect()
    }

    fn chain_graph(asns: &[ASN], rel: Relationship) -> RelationshipGraph {
        let mut graph = RelationshipGraph::new();
        for w in asns.windows(2) {
            graph.assign(w[0], w[1], rel);
        }
        graph
    }

    #[test]
    fn test_marks_links_away_from_peak() {
        // peak is AS 30 at index 2
        let path = AsPath::from(vec![10, 20, 30, 40, 50]);
        let degrees = degrees(&[(10, 1), (20, 2), (30, 9), (40, 3), (50, 1)]);
        let graph = chain_graph(path.asns(), Relationship::CustomerToProvider);

        let mut non_peers = NonPeerSet::new();
        mark_path(&path, &degrees, &graph, &mut non_peers).unwrap();

        assert!(non_peers.excludes(10, 20));
        assert!(non_peers.excludes(40, 50));
        // prev degree 2 <= next degree 3: the uphill flank is marked
        assert!(non_peers.excludes(20, 30));
        assert!(!non_peers.excludes(30, 40));
        assert_eq!(non_peers.len(), 3);
    }

    #[test]
    fn test_higher_degree_before_peak_marks_downhill_flank() {
        let path = AsPath::from(vec![20, 30, 40]);
        let degrees = degrees(&[(20, 5), (30, 9), (40, 3)]);
        let graph = chain_graph(path.asns(), Relationship::CustomerToProvider);

        let mut non_peers = NonPeerSet::new();
        mark_path(&path, &degrees, &graph, &mut non_peers).unwrap();
        assert!(non_peers.excludes(30, 40));
        assert!(!non_peers.excludes(20, 30));
    }

    #[test]
    fn test_sibling_flank_leaves_both_flanks_unmarked() {
        let path = AsPath::from(vec![20, 30, 40]);
        let degrees = degrees(&[(20, 5), (30, 9), (40, 3)]);
        let mut graph = chain_graph(path.asns(), Relationship::CustomerToProvider);
        graph.assign(30, 40, Relationship::SiblingToSibling);

        let mut non_peers = NonPeerSet::new();
        mark_path(&path, &degrees, &graph, &mut non_peers).unwrap();
        assert!(non_peers.is_empty());
    }

    #[test]
    fn test_peak_at_path_end_has_no_flank_marking() {
        let path = AsPath::from(vec![30, 20, 10]);
        let degrees = degrees(&[(10, 1), (20, 2), (30, 9)]);
        let graph = chain_graph(path.asns(), Relationship::ProviderToCustomer);

        let mut non_peers = NonPeerSet::new();
        mark_path(&path, &degrees, &graph, &mut non_peers).unwrap();
        assert!(!non_peers.excludes(30, 20));
        assert!(non_peers.excludes(20, 10));
    }

    #[test]
    fn test_missing_relationship() {
        let path = AsPath::from(vec![20, 30, 40]);
        let degrees = degrees(&[(20, 5), (30, 9), (40, 3)]);
        let graph = RelationshipGraph::new();

        let mut non_peers = NonPeerSet::new();
        assert_eq!(
            mark_path(&path, &degrees, &graph, &mut non_peers),
            Err(InferenceError::MissingRelationship { from: 20, to: 30 })
        );
    }

    #[test]
    fn test_comparable_size_bounds_are_strict() {
        assert!(comparable_size(10, 10, 2.0));
        assert!(comparable_size(19, 10, 2.0));
        assert!(!comparable_size(20, 10, 2.0));
        assert!(!comparable_size(5, 10, 2.0));
        assert!(comparable_size(6, 10, 2.0));
        assert!(!comparable_size(1, 0, 2.0));
    }

    #[test]
    fn test_promotion_skips_non_peers_for_any_ratio() {
        let paths = PathSet::from_paths(vec![
            AsPath::from(vec![1, 2, 3, 4]),
            AsPath::from(vec![5, 3, 2, 6]),
            AsPath::from(vec![7, 2]),
            AsPath::from(vec![8, 3]),
        ]);
        let degrees = NeighborIndex::from_paths(&paths).degrees();
        let counts = count_transit(&paths, &degrees).unwrap();
        let provisional = annotate(&paths, &counts, 1);

        for ratio in [1.01, 1.5, 2.0, 10.0, 1e9] {
            let mut graph = provisional.clone();
            let non_peers = resolve_peering(&paths, &degrees, &mut graph, ratio).unwrap();
            for (from, to, rel) in graph.iter() {
                if rel == Relationship::PeerToPeer {
                    assert!(!non_peers.excludes(from, to), "{} {} with ratio {}", from, to, ratio);
                }
            }
            assert!(graph.inconsistent_edges().is_empty());
        }
    }

    #[test]
    fn test_promotion_overrides_hierarchy_label() {
        // 2 and 3 both have degree 4; the 2-3 link flanks the peak on the
        // side with the higher-degree neighbour, so it stays eligible.
        let paths = PathSet::from_paths(vec![
            AsPath::from(vec![1, 2, 3, 4]),
            AsPath::from(vec![5, 2]),
            AsPath::from(vec![6, 2]),
            AsPath::from(vec![7, 3]),
            AsPath::from(vec![8, 3]),
        ]);
        let degrees = NeighborIndex::from_paths(&paths).degrees();
        let counts = count_transit(&paths, &degrees).unwrap();
        let mut graph = annotate(&paths, &counts, 1);
        assert_eq!(graph.get(3, 2), Some(Relationship::CustomerToProvider));

        let non_peers = resolve_peering(&paths, &degrees, &mut graph, 2.0).unwrap();
        assert!(!non_peers.excludes(2, 3));
        assert_eq!(graph.get(2, 3), Some(Relationship::PeerToPeer));
        assert_eq!(graph.get(3, 2), Some(Relationship::PeerToPeer));
        assert_eq!(graph.get(1, 2), Some(Relationship::CustomerToProvider));
    }

    #[test]
    fn test_peer_annotations_need_every_degree() {
        let paths = PathSet::from_paths(vec![AsPath::from(vec![1, 2]), AsPath::from(vec![2, 3])]);
        let partial = degrees(&[(1, 1), (2, 2)]);
        assert_eq!(
            peer_annotations(&paths, &partial, &NonPeerSet::new(), 60.0),
            Err(InferenceError::MissingDegree { asn: 3 })
        );

        // marked links are skipped before any degree lookup
        let mut non_peers = NonPeerSet::new();
        non_peers.insert(3, 2);
        let promoted = peer_annotations(&paths, &partial, &non_peers, 60.0).unwrap();
        assert_eq!(promoted, vec![EdgeAnnotation::new(1, 2, Relationship::PeerToPeer)]);
    }
}
