pub mod shared;
pub mod as_path;
pub mod as_graph;
pub mod relationship_graph;
pub mod inference;
pub mod classifier;
pub mod config;
pub mod io;
pub mod report;
pub mod pipeline;

// Re-export commonly used types at the crate root
pub use as_graph::{DegreeMap, NeighborIndex};
pub use as_path::{AsPath, PathRejection, PathSet};
pub use classifier::{classify, TierAssignment};
pub use config::InferenceConfig;
pub use pipeline::{InferenceOutput, InferenceRunner, RelationshipInference};
pub use relationship_graph::{EdgeAnnotation, RelationshipGraph};
pub use report::RunSummary;
pub use shared::{ConfigError, InferenceError, Relationship, TierLabel, ASN};
