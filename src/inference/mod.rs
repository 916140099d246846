//! Gao-style relationship inference: transit counting, annotation and
//! peering resolution over a validated path corpus.

pub mod annotator;
pub mod peering;
pub mod transit;

pub use annotator::{annotate, TransitRule};
pub use peering::{resolve_peering, NonPeerSet};
pub use transit::{count_transit, TransitCounts};
