use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::as_path::PathSet;
use crate::classifier::TierAssignment;
use crate::relationship_graph::RelationshipGraph;
use crate::shared::ASN;

/// Writes one line per item, creating parent directories as needed.
pub fn write_lines<I, S>(path: &Path, lines: I) -> io::Result<usize>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut out = BufWriter::new(File::create(path)?);
    let mut written = 0;
    for line in lines {
        writeln!(out, "{}", line.as_ref())?;
        written += 1;
    }
    out.flush()?;
    log::info!("saved {} lines to {:?}", written, path);
    Ok(written)
}

pub fn relationship_lines(graph: &RelationshipGraph) -> impl Iterator<Item = String> + '_ {
    graph
        .iter()
        .map(|(from, to, rel)| format!("{} {} {}", from, to, rel))
}

pub fn tier_lines(tiers: &TierAssignment) -> impl Iterator<Item = String> + '_ {
    tiers
        .iter_by_tier()
        .map(|(asn, tier)| format!("{} {}", asn, tier))
}

pub fn ranking_lines(ranking: &[(ASN, usize)]) -> impl Iterator<Item = String> + '_ {
    ranking
        .iter()
        .map(|(asn, degree)| format!("{} {}", asn, degree))
}

pub fn write_relationships(path: &Path, graph: &RelationshipGraph) -> io::Result<usize> {
    write_lines(path, relationship_lines(graph))
}

pub fn write_tiers(path: &Path, tiers: &TierAssignment) -> io::Result<usize> {
    write_lines(path, tier_lines(tiers))
}

pub fn write_ranking(path: &Path, ranking: &[(ASN, usize)]) -> io::Result<usize> {
    write_lines(path, ranking_lines(ranking))
}

pub fn write_paths(path: &Path, paths: &PathSet) -> io::Result<usize> {
    write_lines(path, paths.iter().map(|p| p.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::Relationship;

    #[test]
    fn test_relationship_lines_are_sorted() {
        let mut graph = RelationshipGraph::new();
        graph.assign(3, 1, Relationship::CustomerToProvider);
        graph.assign(1, 2, Relationship::SiblingToSibling);

        let lines: Vec<String> = relationship_lines(&graph).collect();
        assert_eq!(lines, vec!["1 2 s2s", "1 3 p2c", "2 1 s2s", "3 1 c2p"]);
    }

    #[test]
    fn test_ranking_lines() {
        let lines: Vec<String> = ranking_lines(&[(701, 12), (1239, 9)]).collect();
        assert_eq!(lines, vec!["701 12", "1239 9"]);
    }
}
