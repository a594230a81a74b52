//! Data module: the hierarchical, strongly typed data store.
//!
//! `DataContainerArray` → `DataContainer` → `AttributeMatrix` → typed array,
//! addressed by a [`DataArrayPath`].

pub mod attribute_matrix;
pub mod data_array;
pub mod data_container;
pub mod data_container_array;
pub mod element;
pub mod path;
pub mod storage;

pub use crate::debug_invariants::DebugInvariants;

pub use attribute_matrix::{AttributeMatrix, AttributeMatrixKind};
pub use data_array::{DataArray, TaggedArray};
pub use data_container::DataContainer;
pub use data_container_array::DataContainerArray;
pub use element::{Element, ElementType};
pub use path::DataArrayPath;
pub use storage::{Storage, VecStorage};

/// Alias for the common cell feature-id array.
pub type FeatureIds = DataArray<i32>;
