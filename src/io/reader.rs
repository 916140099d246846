use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use bzip2::read::BzDecoder;

use crate::as_path::PathSet;
use crate::relationship_graph::RelationshipGraph;
use crate::shared::{Relationship, ASN};

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed line {line_no}: {line:?}")]
    MalformedLine { line_no: usize, line: String },
    #[error("unknown relationship label {0:?}")]
    UnknownRelationship(String),
}

/// Opens a file for buffered reading, decompressing `.bz2` files on the fly.
pub fn open(path: &Path) -> Result<Box<dyn BufRead>, ReadError> {
    let file = File::open(path)?;
    let is_bz2 = path.extension().map_or(false, |ext| ext == "bz2");
    if is_bz2 {
        Ok(Box::new(BufReader::new(BzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

pub fn read_lines(reader: impl BufRead) -> Result<Vec<String>, ReadError> {
    Ok(reader.lines().collect::<Result<Vec<String>, _>>()?)
}

/// Reads raw or preprocessed path text; unusable lines are skipped.
pub fn read_paths(reader: impl Read, attribute_present: bool) -> Result<PathSet, ReadError> {
    let lines = read_lines(BufReader::new(reader))?;
    Ok(PathSet::from_lines(lines, attribute_present))
}

pub fn read_paths_file(path: &Path, attribute_present: bool) -> Result<PathSet, ReadError> {
    let lines = read_lines(open(path)?)?;
    let paths = PathSet::from_lines(lines, attribute_present);
    log::info!(
        "loaded {} AS paths from {:?} ({} rejected)",
        paths.len(),
        path,
        paths.rejected()
    );
    Ok(paths)
}

/// Parses `<AS1> <AS2> <label>` lines, one directed entry each. Blank lines
/// and `#` comments are skipped.
pub fn read_relationships(reader: impl Read) -> Result<RelationshipGraph, ReadError> {
    let mut graph = RelationshipGraph::new();
    for (idx, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let malformed = || ReadError::MalformedLine {
            line_no: idx + 1,
            line: line.clone(),
        };
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() != 3 {
            return Err(malformed());
        }
        let from = fields[0].parse::<ASN>().map_err(|_| malformed())?;
        let to = fields[1].parse::<ASN>().map_err(|_| malformed())?;
        let rel = fields[2]
            .parse::<Relationship>()
            .map_err(ReadError::UnknownRelationship)?;
        graph.insert_directed(from, to, rel);
    }

    let inconsistent = graph.inconsistent_edges();
    if !inconsistent.is_empty() {
        log::warn!(
            "{} relationship entries have no matching inverse entry",
            inconsistent.len()
        );
    }
    Ok(graph)
}

pub fn read_relationships_file(path: &Path) -> Result<RelationshipGraph, ReadError> {
    let graph = read_relationships(open(path)?)?;
    log::info!(
        "loaded {} directed relationships over {} ASes from {:?}",
        graph.directed_edge_count(),
        graph.node_count(),
        path
    );
    Ok(graph)
}
