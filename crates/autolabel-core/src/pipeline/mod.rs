//! Image processing pipeline components.
//!
//! - **discovery**: List a corpus directory in numeric order
//! - **decode**: Load and decode images with limits and a timeout
//! - **processor**: Orchestrates caption, tagging, detection and aggregation

pub mod decode;
pub mod discovery;
pub mod processor;

pub use decode::{ImageDecoder, LoadedImage};
pub use discovery::{order_file_names, ordering_key, CorpusDiscovery, DiscoveredFile};
pub use processor::AutoLabeler;
