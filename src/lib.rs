#![cfg_attr(docsrs, feature(doc_cfg))]
//! # micro-pipeline
//!
//! micro-pipeline is the in-memory core of a 3D microstructure processing
//! pipeline: a hierarchical, strongly typed data store, a two-phase filter
//! contract, a sequential pipeline runner, and the two algorithms that
//! exercise them hardest (region-growing segmentation and erode/dilate
//! cleanup of voxel grids).
//!
//! ## Features
//! - `DataContainerArray` → `DataContainer` → `AttributeMatrix` → typed
//!   `DataArray<T>`, addressed by a `container|matrix|array` path
//! - Image (voxel) and vertex/edge/triangle geometries with lazily derived,
//!   invalidatable mesh topology
//! - Filters validate against the store (preflight) before they mutate it
//!   (execute); the pipeline stops at the first negative error code
//! - Optional `rayon` parallelism for within-pass grid scans
//!
//! ## Determinism
//!
//! All randomized decisions use `SmallRng` seeds drawn from configuration, so
//! segmentations are reproducible. Unit tests fix seeds explicitly.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! micro-pipeline = "0.1"
//! # Optional features:
//! # features = ["rayon", "check-invariants"]
//! ```
//!
//! ```
//! use micro_pipeline::prelude::*;
//!
//! let mut dca = DataContainerArray::new();
//! let dc = dca
//!     .add_container(DataContainer::with_geometry(
//!         "ImageDataContainer",
//!         ImageGeom::new([3, 3, 3]),
//!     ))
//!     .unwrap();
//! dc.create_matrix("CellData", &[3, 3, 3], AttributeMatrixKind::Cell).unwrap();
//! let ids = DataArrayPath::new("ImageDataContainer", "CellData", "FeatureIds");
//! dca.create_array::<i32>(&ids, 1, &[3, 3, 3], false).unwrap().fill(5);
//! dca.array_mut::<i32>(&ids, 1).unwrap().as_mut_slice()[13] = 0;
//!
//! let mut pipeline = Pipeline::default().push(ErodeDilateBadData::new());
//! assert!(pipeline.preflight(&mut dca).is_success());
//! assert!(pipeline.execute(&mut dca).is_success());
//! assert_eq!(dca.array::<i32>(&ids, 1).unwrap().as_slice()[13], 5);
//! ```

pub mod algs;
pub mod data;
pub mod debug_invariants;
pub mod filter;
pub mod filters;
pub mod geometry;
pub mod pipeline;
pub mod pipeline_error;

pub use debug_invariants::DebugInvariants;
pub use pipeline_error::PipelineError;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::adjacency::{Adjacency, ElementAdjacency, GridAdjacency};
    pub use crate::algs::segmentation::{
        GroupingPolicy, Segmentation, SegmentationConfig, SegmentationEngine,
    };
    pub use crate::data::{
        AttributeMatrix, AttributeMatrixKind, DataArray, DataArrayPath, DataContainer,
        DataContainerArray, Element, ElementType, TaggedArray,
    };
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::filter::{
        DataArrayRequirement, Filter, FilterContext, FilterMessage, FilterParameter, FilterState,
        ParameterKind, ParameterValue, Severity,
    };
    pub use crate::filters::{
        CreateDataArray, Direction, ErodeDilateBadData, ScalarSegmentFeatures,
        VectorSegmentFeatures,
    };
    pub use crate::geometry::{
        AxisMask, EdgeGeom, Geometry, GeometryKind, ImageGeom, TriangleGeom, VertexGeom,
    };
    pub use crate::pipeline::{
        CollectingObserver, Pipeline, PipelineConfig, PipelineObserver, PipelineReport,
    };
    pub use crate::pipeline_error::{ErrorCategory, PipelineError};
}
