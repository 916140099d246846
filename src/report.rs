use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::Serialize;

use crate::as_path::PathSet;
use crate::classifier::TierAssignment;
use crate::config::InferenceConfig;
use crate::relationship_graph::RelationshipGraph;
use crate::shared::ASN;

/// Counts describing one batch run, saved next to the text outputs.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub generated_at: String,
    pub config: InferenceConfig,
    pub num_paths: usize,
    pub num_rejected_paths: usize,
    pub num_ases: usize,
    pub num_directed_relationships: usize,
    pub relationships: BTreeMap<String, usize>,
    pub num_non_peer_pairs: usize,
    pub tiers: BTreeMap<String, usize>,
    pub top_ases: Vec<(ASN, usize)>,
}

impl RunSummary {
    pub fn new(config: InferenceConfig) -> Self {
        RunSummary {
            generated_at: Utc::now().to_rfc3339(),
            config,
            num_paths: 0,
            num_rejected_paths: 0,
            num_ases: 0,
            num_directed_relationships: 0,
            relationships: BTreeMap::new(),
            num_non_peer_pairs: 0,
            tiers: BTreeMap::new(),
            top_ases: Vec::new(),
        }
    }

    /// Corpus counts: accepted and rejected paths, distinct ASes.
    pub fn record_paths(&mut self, paths: &PathSet) {
        self.num_paths = paths.len();
        self.num_rejected_paths = paths.rejected();
        self.num_ases = paths.asns().len();
    }

    pub fn record_graph(&mut self, graph: &RelationshipGraph) {
        self.num_ases = graph.node_count();
        self.num_directed_relationships = graph.directed_edge_count();
        self.relationships = graph
            .label_counts()
            .into_iter()
            .map(|(rel, count)| (rel.to_string(), count))
            .collect();
    }

    pub fn record_tiers(&mut self, tiers: &TierAssignment) {
        self.tiers = tiers
            .counts()
            .into_iter()
            .map(|(tier, count)| (tier.to_string(), count))
            .collect();
    }

    pub fn save_to_file(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("saved run summary to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::Relationship;

    #[test]
    fn test_summary_serializes_label_counts() {
        let mut graph = RelationshipGraph::new();
        graph.assign(1, 2, Relationship::CustomerToProvider);
        graph.assign(2, 3, Relationship::PeerToPeer);

        let mut summary = RunSummary::new(InferenceConfig::default());
        summary.record_graph(&graph);

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["num_ases"], 3);
        assert_eq!(value["relationships"]["p2p"], 2);
        assert_eq!(value["relationships"]["c2p"], 1);
        assert_eq!(value["config"]["degree-size-ratio"], 60.0);
    }

    #[test]
    fn test_record_paths_counts_corpus() {
        let paths = PathSet::from_lines(["1 2 3", "4 {5}", "3 2 6", "7"], false);
        let mut summary = RunSummary::new(InferenceConfig::default());
        summary.record_paths(&paths);

        assert_eq!(summary.num_paths, 3);
        assert_eq!(summary.num_rejected_paths, 1);
        assert_eq!(summary.num_ases, 5);
        assert_eq!(summary.num_directed_relationships, 0);
    }
}
