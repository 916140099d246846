use std::collections::HashMap;

use crate::as_graph::{top_provider_index, DegreeMap};
use crate::as_path::{AsPath, PathSet};
use crate::shared::{InferenceError, ASN};

/// Multiset of ordered `(customer, provider)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitCounts {
    counts: HashMap<(ASN, ASN), usize>,
}

impl TransitCounts {
    pub fn new() -> Self {
        TransitCounts::default()
    }

    pub fn add(&mut self, customer: ASN, provider: ASN) {
        *self.counts.entry((customer, provider)).or_insert(0) += 1;
    }

    /// How often `customer` was seen relying on `provider` for transit.
    pub fn count(&self, customer: ASN, provider: ASN) -> usize {
        self.counts.get(&(customer, provider)).copied().unwrap_or(0)
    }

    /// Adds every occurrence of `other`. Order does not matter.
    pub fn merge(&mut self, other: &TransitCounts) {
        for (&pair, &count) in &other.counts {
            *self.counts.entry(pair).or_insert(0) += count;
        }
    }

    /// Number of distinct ordered pairs.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total occurrences over all pairs.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = ((ASN, ASN), usize)> + '_ {
        self.counts.iter().map(|(&pair, &count)| (pair, count))
    }
}

/// Records the transit hops implied by one path: customer -> provider
/// uphill of the top provider, provider -> customer from it onwards.
pub fn count_path(
    path: &AsPath,
    degrees: &DegreeMap,
    counts: &mut TransitCounts,
) -> Result<(), InferenceError> {
    let top = match top_provider_index(path, degrees)? {
        Some(top) => top,
        None => return Ok(()),
    };

    for (idx, (curr, next)) in path.links().enumerate() {
        if idx < top {
            counts.add(curr, next);
        } else {
            counts.add(next, curr);
        }
    }
    Ok(())
}

/// Counts transit hops over the whole corpus.
pub fn count_transit(paths: &PathSet, degrees: &DegreeMap) -> Result<TransitCounts, InferenceError> {
    let mut counts = TransitCounts::new();
    for path in paths {
        count_path(path, degrees, &mut counts)?;
    }
    log::debug!(
        "counted {} transit occurrences over {} ordered pairs",
        counts.total(),
        counts.len()
    );
    Ok(counts)
}
