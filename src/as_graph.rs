use std::collections::{BTreeMap, BTreeSet, HashMap};

use itertools::Itertools;

use crate::as_path::{AsPath, PathSet};
use crate::shared::{InferenceError, ASN};

/// AS -> number of distinct neighbors.
pub type DegreeMap = HashMap<ASN, usize>;

/// Undirected adjacency induced by consecutive ASes over the whole corpus.
#[derive(Debug, Clone, Default)]
pub struct NeighborIndex {
    neighbors: BTreeMap<ASN, BTreeSet<ASN>>,
}

impl NeighborIndex {
    pub fn new() -> Self {
        NeighborIndex::default()
    }

    /// Paths shorter than two ASes contribute nothing.
    pub fn from_paths(paths: &PathSet) -> Self {
        let mut index = NeighborIndex::new();
        for path in paths {
            index.add_path(path);
        }
        log::debug!("neighbor index covers {} ASes", index.len());
        index
    }

    pub fn add_path(&mut self, path: &AsPath) {
        for (curr, next) in path.links() {
            self.neighbors.entry(curr).or_default().insert(next);
            self.neighbors.entry(next).or_default().insert(curr);
        }
    }

    pub fn neighbors_of(&self, asn: ASN) -> Option<&BTreeSet<ASN>> {
        self.neighbors.get(&asn)
    }

    pub fn degree(&self, asn: ASN) -> Option<usize> {
        self.neighbors.get(&asn).map(BTreeSet::len)
    }

    pub fn degrees(&self) -> DegreeMap {
        self.neighbors
            .iter()
            .map(|(&asn, neighbors)| (asn, neighbors.len()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ASN, &BTreeSet<ASN>)> {
        self.neighbors.iter()
    }

    /// The `k` ASes of largest degree, as `(asn, degree)`. Equal degrees are
    /// ranked by ascending AS number.
    pub fn top(&self, k: usize) -> Vec<(ASN, usize)> {
        self.neighbors
            .iter()
            .map(|(&asn, neighbors)| (asn, neighbors.len()))
            .sorted_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)))
            .take(k)
            .collect()
    }
}

/// Looks up a degree, failing if the AS was never indexed.
pub fn degree_of(degrees: &DegreeMap, asn: ASN) -> Result<usize, InferenceError> {
    degrees
        .get(&asn)
        .copied()
        .ok_or(InferenceError::MissingDegree { asn })
}

/// Index of the path's top provider: the first AS reaching the maximum
/// degree. Only a strict increase moves the peak, so ties keep the earliest.
///
/// Returns `None` for paths of fewer than two ASes, which carry no links.
pub fn top_provider_index(path: &AsPath, degrees: &DegreeMap) -> Result<Option<usize>, InferenceError> {
    if path.len() < 2 {
        return Ok(None);
    }

    let mut max_degree = 0;
    let mut top = None;
    for (idx, &asn) in path.asns().iter().enumerate() {
        let degree = degree_of(degrees, asn)?;
        if degree > max_degree {
            max_degree = degree;
            top = Some(idx);
        }
    }
    Ok(top)
}
