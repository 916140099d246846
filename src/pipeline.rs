use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};

use crate::as_graph::{DegreeMap, NeighborIndex};
use crate::as_path::PathSet;
use crate::classifier::{classify, TierAssignment};
use crate::config::InferenceConfig;
use crate::inference::{annotate, count_transit, resolve_peering, NonPeerSet, TransitCounts};
use crate::relationship_graph::RelationshipGraph;
use crate::report::RunSummary;
use crate::shared::{InferenceError, Relationship, ASN};

const STAGES: u64 = 6;

/// Intermediate and final structures of relationship inference.
#[derive(Debug, Clone)]
pub struct RelationshipInference {
    pub neighbors: NeighborIndex,
    pub degrees: DegreeMap,
    pub transit: TransitCounts,
    pub non_peers: NonPeerSet,
    pub relationships: RelationshipGraph,
}

/// Everything one run produces.
#[derive(Debug, Clone)]
pub struct InferenceOutput {
    pub inference: RelationshipInference,
    pub tiers: TierAssignment,
    pub ranking: Vec<(ASN, usize)>,
}

/// Runs the stages in their fixed order over one corpus.
pub struct InferenceRunner {
    pub config: InferenceConfig,

    /// Whether to draw a progress bar on stderr
    pub show_progress: bool,
}

impl InferenceRunner {
    pub fn new(config: InferenceConfig) -> Self {
        InferenceRunner {
            config,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(STAGES);
        let style = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-");
        pb.set_style(style);
        pb
    }

    /// Relationship inference only: neighbor index through peering.
    pub fn infer_relationships(
        &self,
        paths: &PathSet,
    ) -> Result<RelationshipInference, InferenceError> {
        let pb = self.progress_bar();
        let result = self.infer_with(paths, &pb);
        pb.finish_and_clear();
        result
    }

    fn infer_with(
        &self,
        paths: &PathSet,
        pb: &ProgressBar,
    ) -> Result<RelationshipInference, InferenceError> {
        pb.set_message("neighbors");
        let neighbors = NeighborIndex::from_paths(paths);
        let degrees = neighbors.degrees();
        log::info!("count node degree of {} ASes: done", degrees.len());
        pb.inc(1);

        pb.set_message("transit");
        let transit = count_transit(paths, &degrees)?;
        log::info!("count transit relationships: {} ordered pairs", transit.len());
        pb.inc(1);

        pb.set_message("annotate");
        let mut relationships = annotate(paths, &transit, self.config.threshold as usize);
        log::info!(
            "annotate relationships: {} directed entries",
            relationships.directed_edge_count()
        );
        pb.inc(1);

        pb.set_message("peering");
        let non_peers = resolve_peering(
            paths,
            &degrees,
            &mut relationships,
            self.config.degree_size_ratio,
        )?;
        log::info!(
            "resolve peering: {} non-peer pairs, {} p2p entries",
            non_peers.len(),
            relationships
                .label_counts()
                .get(&Relationship::PeerToPeer)
                .copied()
                .unwrap_or(0)
        );
        pb.inc(1);

        // ASes seen only on singleton paths still need a tier
        for asn in paths.asns() {
            relationships.ensure_node(asn);
        }
        pb.inc(1);

        Ok(RelationshipInference {
            neighbors,
            degrees,
            transit,
            non_peers,
            relationships,
        })
    }

    /// Full batch run: relationships, tiers and the degree ranking.
    pub fn run(&self, paths: &PathSet) -> Result<InferenceOutput, InferenceError> {
        let start_time = Instant::now();
        let pb = self.progress_bar();

        let inference = match self.infer_with(paths, &pb) {
            Ok(inference) => inference,
            Err(e) => {
                pb.abandon();
                return Err(e);
            }
        };

        pb.set_message("classify");
        let tiers = classify(&inference.relationships);
        let ranking = inference.neighbors.top(self.config.top_k);
        pb.inc(1);
        pb.finish_and_clear();

        log::info!(
            "inference over {} paths done in {:.2}s",
            paths.len(),
            start_time.elapsed().as_secs_f64()
        );

        Ok(InferenceOutput {
            inference,
            tiers,
            ranking,
        })
    }
}

impl InferenceOutput {
    pub fn summary(&self, config: &InferenceConfig, paths: &PathSet) -> RunSummary {
        let mut summary = RunSummary::new(config.clone());
        summary.record_paths(paths);
        summary.num_non_peer_pairs = self.inference.non_peers.len();
        summary.top_ases = self.ranking.clone();
        summary.record_graph(&self.inference.relationships);
        summary.record_tiers(&self.tiers);
        summary
    }
}
