//! Concrete filters.

pub mod create_data_array;
pub mod erode_dilate;
pub mod scalar_segment;
mod segment_features;
pub mod vector_segment;

pub use create_data_array::CreateDataArray;
pub use erode_dilate::{Direction, ErodeDilateBadData};
pub use scalar_segment::ScalarSegmentFeatures;
pub use vector_segment::VectorSegmentFeatures;
