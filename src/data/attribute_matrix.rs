//! AttributeMatrix: a named set of typed arrays sharing one tuple shape.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::data_array::{DataArray, TaggedArray};
use crate::data::element::Element;
use crate::data::path::DataArrayPath;
use crate::debug_invariants::DebugInvariants;
use crate::pipeline_error::PipelineError;

/// What the tuples of an attribute matrix are attached to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum AttributeMatrixKind {
    Vertex,
    Edge,
    Face,
    Cell,
    VertexFeature,
    EdgeFeature,
    FaceFeature,
    CellFeature,
    VertexEnsemble,
    EdgeEnsemble,
    FaceEnsemble,
    CellEnsemble,
    Generic,
}

impl fmt::Display for AttributeMatrixKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Ordered, name-keyed set of arrays with a common tuple count.
///
/// # Invariants
///
/// - Every array's tuple count equals `product(tuple_dims)`.
/// - Every array's name equals its key.
///
/// The matrix never resizes arrays on its own; callers resize explicitly through
/// [`resize_attribute_arrays`](Self::resize_attribute_arrays).
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeMatrix {
    name: String,
    kind: AttributeMatrixKind,
    tuple_dims: Vec<usize>,
    arrays: BTreeMap<String, TaggedArray>,
}

impl AttributeMatrix {
    pub fn new(name: &str, tuple_dims: &[usize], kind: AttributeMatrixKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            tuple_dims: tuple_dims.to_vec(),
            arrays: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn rename(&mut self, name: &str) {
        self.name = name.to_string();
    }

    #[inline]
    pub fn kind(&self) -> AttributeMatrixKind {
        self.kind
    }

    #[inline]
    pub fn tuple_dims(&self) -> &[usize] {
        &self.tuple_dims
    }

    /// Product of the tuple dimensions.
    pub fn num_tuples(&self) -> usize {
        self.tuple_dims.iter().product()
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.arrays.contains_key(name)
    }

    /// Array names in sorted order.
    pub fn array_names(&self) -> Vec<String> {
        self.arrays.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaggedArray> + '_ {
        self.arrays.values()
    }

    /// Insert a prepared array.
    ///
    /// # Errors
    /// - `TupleCountMismatch` if the array's tuple count differs from the matrix.
    /// - `NameCollision` if the name is taken and `overwrite` is false.
    pub fn insert_array(
        &mut self,
        array: TaggedArray,
        overwrite: bool,
    ) -> Result<(), PipelineError> {
        let expected = self.num_tuples();
        if array.tuple_count() != expected {
            return Err(PipelineError::TupleCountMismatch {
                name: array.name().to_string(),
                expected,
                found: array.tuple_count(),
            });
        }
        if !overwrite && self.arrays.contains_key(array.name()) {
            return Err(PipelineError::NameCollision(format!(
                "{}/{}",
                self.name,
                array.name()
            )));
        }
        self.arrays.insert(array.name().to_string(), array);
        self.debug_assert_invariants();
        Ok(())
    }

    /// Create a zero-filled `T` array sized to this matrix.
    pub fn create_array<T: Element>(
        &mut self,
        name: &str,
        components: usize,
        overwrite: bool,
    ) -> Result<&mut DataArray<T>, PipelineError> {
        let array = DataArray::<T>::new(name, self.num_tuples(), components)?;
        self.insert_array(array.into(), overwrite)?;
        self.array_mut::<T>(name)
    }

    pub fn tagged(&self, name: &str) -> Option<&TaggedArray> {
        self.arrays.get(name)
    }

    pub fn tagged_mut(&mut self, name: &str) -> Option<&mut TaggedArray> {
        self.arrays.get_mut(name)
    }

    fn path_of(&self, name: &str) -> DataArrayPath {
        DataArrayPath::new("", &self.name, name)
    }

    /// Typed borrow of array `name`.
    pub fn array<T: Element>(&self, name: &str) -> Result<&DataArray<T>, PipelineError> {
        let tagged = self
            .arrays
            .get(name)
            .ok_or_else(|| PipelineError::ArrayNotFound(self.path_of(name)))?;
        T::unwrap(tagged).ok_or_else(|| PipelineError::TypeMismatch {
            path: self.path_of(name),
            expected: T::ELEMENT_TYPE,
            found: tagged.element_type(),
        })
    }

    /// Typed mutable borrow of array `name`.
    pub fn array_mut<T: Element>(
        &mut self,
        name: &str,
    ) -> Result<&mut DataArray<T>, PipelineError> {
        let path = self.path_of(name);
        let tagged = self
            .arrays
            .get_mut(name)
            .ok_or_else(|| PipelineError::ArrayNotFound(path.clone()))?;
        let found = tagged.element_type();
        T::unwrap_mut(tagged).ok_or(PipelineError::TypeMismatch {
            path,
            expected: T::ELEMENT_TYPE,
            found,
        })
    }

    /// Remove and return array `name`.
    pub fn remove_array(&mut self, name: &str) -> Option<TaggedArray> {
        self.arrays.remove(name)
    }

    /// Rename an array in place.
    pub fn rename_array(&mut self, old: &str, new: &str) -> Result<(), PipelineError> {
        if self.arrays.contains_key(new) {
            return Err(PipelineError::NameCollision(format!("{}/{}", self.name, new)));
        }
        let mut array = self
            .arrays
            .remove(old)
            .ok_or_else(|| PipelineError::ArrayNotFound(self.path_of(old)))?;
        array.rename(new);
        self.arrays.insert(new.to_string(), array);
        Ok(())
    }

    /// Set new tuple dimensions and resize every array to match.
    pub fn resize_attribute_arrays(&mut self, tuple_dims: &[usize]) {
        self.tuple_dims = tuple_dims.to_vec();
        let tuples = self.num_tuples();
        for array in self.arrays.values_mut() {
            array.resize_tuples(tuples);
        }
        self.debug_assert_invariants();
    }

    /// Copy tuple `src` onto tuple `dst` in every array, so each tuple record
    /// stays coherent across arrays.
    pub fn copy_tuple_all(&mut self, src: usize, dst: usize) -> Result<(), PipelineError> {
        let tuples = self.num_tuples();
        if src >= tuples || dst >= tuples {
            return Err(PipelineError::IndexOutOfBounds {
                name: self.name.clone(),
                index: src.max(dst),
                len: tuples,
            });
        }
        for array in self.arrays.values_mut() {
            array.copy_tuple(src, dst)?;
        }
        Ok(())
    }
}

impl DebugInvariants for AttributeMatrix {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "AttributeMatrix invalid");
    }

    fn validate_invariants(&self) -> Result<(), PipelineError> {
        let expected = self.num_tuples();
        for (key, array) in &self.arrays {
            array.validate_invariants()?;
            if array.name() != key {
                return Err(PipelineError::NameCollision(format!(
                    "{}/{} stored under key {}",
                    self.name,
                    array.name(),
                    key
                )));
            }
            if array.tuple_count() != expected {
                return Err(PipelineError::TupleCountMismatch {
                    name: key.clone(),
                    expected,
                    found: array.tuple_count(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell_matrix() -> AttributeMatrix {
        AttributeMatrix::new("CellData", &[2, 2, 1], AttributeMatrixKind::Cell)
    }

    #[test]
    fn create_sizes_to_matrix() {
        let mut am = cell_matrix();
        let ids = am.create_array::<i32>("FeatureIds", 1, false).unwrap();
        assert_eq!(ids.tuple_count(), 4);
        assert!(matches!(
            am.create_array::<i32>("FeatureIds", 1, false),
            Err(PipelineError::NameCollision(_))
        ));
        am.create_array::<f32>("FeatureIds", 3, true).unwrap();
        assert!(am.array::<f32>("FeatureIds").is_ok());
    }

    #[test]
    fn insert_rejects_wrong_tuple_count() {
        let mut am = cell_matrix();
        let a = DataArray::<u8>::new("Phases", 3, 1).unwrap();
        assert!(matches!(
            am.insert_array(a.into(), false),
            Err(PipelineError::TupleCountMismatch { expected: 4, found: 3, .. })
        ));
    }

    #[test]
    fn typed_view_reports_type_mismatch() {
        let mut am = cell_matrix();
        am.create_array::<i32>("FeatureIds", 1, false).unwrap();
        assert!(matches!(
            am.array::<f32>("FeatureIds"),
            Err(PipelineError::TypeMismatch { .. })
        ));
        assert!(matches!(
            am.array::<i32>("Missing"),
            Err(PipelineError::ArrayNotFound(_))
        ));
    }

    #[test]
    fn copy_tuple_all_is_consistent_across_arrays() {
        let mut am = cell_matrix();
        am.create_array::<i32>("FeatureIds", 1, false)
            .unwrap()
            .as_mut_slice()
            .copy_from_slice(&[1, 2, 3, 4]);
        am.create_array::<f32>("Conf", 2, false)
            .unwrap()
            .as_mut_slice()
            .copy_from_slice(&[0.1, 0.2, 1.1, 1.2, 2.1, 2.2, 3.1, 3.2]);
        am.copy_tuple_all(3, 0).unwrap();
        assert_eq!(am.array::<i32>("FeatureIds").unwrap().as_slice()[0], 4);
        assert_eq!(am.array::<f32>("Conf").unwrap().tuple(0).unwrap(), &[3.1, 3.2]);
    }

    #[test]
    fn explicit_resize_keeps_invariant() {
        let mut am = cell_matrix();
        am.create_array::<bool>("Active", 1, false).unwrap();
        am.resize_attribute_arrays(&[7]);
        assert_eq!(am.array::<bool>("Active").unwrap().tuple_count(), 7);
        am.validate_invariants().unwrap();
    }
}
