use std::collections::BTreeSet;
use std::fmt;

use crate::shared::ASN;

/// Attribute name that prefixes each path in raw collector dumps.
pub const ASPATH_ATTRIBUTE: &str = "ASPATH:";

/// One observed route: the ASes the announcement traversed, in order.
/// Consecutive duplicates (prepending) are already collapsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AsPath {
    asns: Vec<ASN>,
}

impl AsPath {
    /// Builds a path from already validated ASNs, collapsing prepending.
    pub fn new(mut asns: Vec<ASN>) -> Self {
        asns.dedup();
        AsPath { asns }
    }

    /// Parses a whitespace separated list of AS numbers.
    ///
    /// With `attribute_present` the line must start with `ASPATH:`, which is
    /// stripped. Lines carrying AS sets (curly braces) are rejected rather than
    /// flattened.
    pub fn parse(line: &str, attribute_present: bool) -> Result<Self, PathRejection> {
        let line = line.trim();
        if line.is_empty() {
            return Err(PathRejection::Empty);
        }
        if line.contains(['{', '}']) {
            return Err(PathRejection::ContainsAsSet);
        }

        let mut tokens = line.split_whitespace().peekable();
        if attribute_present {
            match tokens.next() {
                Some(ASPATH_ATTRIBUTE) => {}
                _ => return Err(PathRejection::MissingAttribute),
            }
            if tokens.peek().is_none() {
                return Err(PathRejection::Empty);
            }
        }

        let asns = tokens
            .map(|token| {
                if !token.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(PathRejection::NonNumericAs(token.to_string()));
                }
                token
                    .parse::<ASN>()
                    .map_err(|_| PathRejection::NonNumericAs(token.to_string()))
            })
            .collect::<Result<Vec<ASN>, _>>()?;

        Ok(AsPath::new(asns))
    }

    pub fn asns(&self) -> &[ASN] {
        &self.asns
    }

    pub fn len(&self) -> usize {
        self.asns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.asns.is_empty()
    }

    /// Consecutive `(curr, next)` pairs, in path order.
    pub fn links(&self) -> impl Iterator<Item = (ASN, ASN)> + '_ {
        self.asns.windows(2).map(|w| (w[0], w[1]))
    }
}

impl fmt::Display for AsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for asn in &self.asns {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{}", asn)?;
            first = false;
        }
        Ok(())
    }
}

impl From<Vec<ASN>> for AsPath {
    fn from(asns: Vec<ASN>) -> Self {
        AsPath::new(asns)
    }
}

/// Why a raw line was not accepted as a path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathRejection {
    #[error("AS path must contain at least 1 AS")]
    Empty,
    #[error("AS path must not contain an AS set as denoted by curly braces")]
    ContainsAsSet,
    #[error("first token of AS path must be ASPATH:")]
    MissingAttribute,
    #[error("AS must be a number, got {0:?}")]
    NonNumericAs(String),
}

/// The validated corpus, in input order.
#[derive(Debug, Clone, Default)]
pub struct PathSet {
    paths: Vec<AsPath>,
    rejected: usize,
}

impl PathSet {
    pub fn new() -> Self {
        PathSet::default()
    }

    pub fn from_paths(paths: Vec<AsPath>) -> Self {
        PathSet { paths, rejected: 0 }
    }

    /// Validates and normalises raw lines, skipping (and logging) the ones
    /// that are not usable paths.
    pub fn from_lines<I, S>(lines: I, attribute_present: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut path_set = PathSet::new();
        for (idx, line) in lines.into_iter().enumerate() {
            let line = line.as_ref();
            match AsPath::parse(line, attribute_present) {
                Ok(path) => path_set.push(path),
                Err(rejection) => {
                    log::warn!("skipping line {}: {} ({:?})", idx + 1, rejection, line);
                    path_set.rejected += 1;
                }
            }
        }
        log::debug!(
            "accepted {} AS paths, rejected {}",
            path_set.len(),
            path_set.rejected
        );
        path_set
    }

    pub fn push(&mut self, path: AsPath) {
        self.paths.push(path);
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn rejected(&self) -> usize {
        self.rejected
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AsPath> {
        self.paths.iter()
    }

    /// Every distinct AS in the corpus, singleton paths included.
    pub fn asns(&self) -> BTreeSet<ASN> {
        self.paths
            .iter()
            .flat_map(|path| path.asns().iter().copied())
            .collect()
    }
}

impl<'a> IntoIterator for &'a PathSet {
    type Item = &'a AsPath;
    type IntoIter = std::slice::Iter<'a, AsPath>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

impl FromIterator<AsPath> for PathSet {
    fn from_iter<T: IntoIterator<Item = AsPath>>(iter: T) -> Self {
        PathSet::from_paths(iter.into_iter().collect())
    }
}
