//! Re-export public algorithms.

pub mod adjacency;
pub mod segmentation;

pub use adjacency::{Adjacency, ElementAdjacency, GridAdjacency};
pub use segmentation::{GroupingPolicy, Segmentation, SegmentationConfig, SegmentationEngine};
