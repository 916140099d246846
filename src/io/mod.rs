pub mod reader;
pub mod writer;

pub use reader::{read_paths_file, read_relationships_file, ReadError};
pub use writer::{write_paths, write_ranking, write_relationships, write_tiers};
