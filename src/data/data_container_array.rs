//! DataContainerArray: the root of the data store and the only handle filters get.
//!
//! All lookups go through [`DataArrayPath`]s and return borrowed, type-checked
//! views. The store keeps exclusive ownership of every array; a view cannot
//! outlive a mutation that resizes or removes the array it points into.

use std::collections::BTreeMap;

use crate::data::attribute_matrix::{AttributeMatrix, AttributeMatrixKind};
use crate::data::data_array::{DataArray, TaggedArray};
use crate::data::data_container::DataContainer;
use crate::data::element::Element;
use crate::data::path::DataArrayPath;
use crate::debug_invariants::DebugInvariants;
use crate::geometry::{GeometryKind, GeometryVariant};
use crate::pipeline_error::PipelineError;

// Observers may read the store from another thread while no filter runs.
static_assertions::assert_impl_all!(DataContainerArray: Send, Sync);

#[derive(Clone, Debug, Default)]
pub struct DataContainerArray {
    containers: BTreeMap<String, DataContainer>,
}

impl DataContainerArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.containers.contains_key(name)
    }

    pub fn container_names(&self) -> Vec<String> {
        self.containers.keys().cloned().collect()
    }

    /// Add a prepared container.
    ///
    /// # Errors
    /// `NameCollision` if a container with that name already exists.
    pub fn add_container(
        &mut self,
        container: DataContainer,
    ) -> Result<&mut DataContainer, PipelineError> {
        if self.containers.contains_key(container.name()) {
            return Err(PipelineError::NameCollision(container.name().to_string()));
        }
        let key = container.name().to_string();
        Ok(self.containers.entry(key).or_insert(container))
    }

    pub fn create_container(&mut self, name: &str) -> Result<&mut DataContainer, PipelineError> {
        self.add_container(DataContainer::new(name))
    }

    pub fn remove_container(&mut self, name: &str) -> Option<DataContainer> {
        self.containers.remove(name)
    }

    pub fn container(&self, name: &str) -> Result<&DataContainer, PipelineError> {
        self.containers
            .get(name)
            .ok_or_else(|| PipelineError::ContainerNotFound(name.to_string()))
    }

    pub fn container_mut(&mut self, name: &str) -> Result<&mut DataContainer, PipelineError> {
        self.containers
            .get_mut(name)
            .ok_or_else(|| PipelineError::ContainerNotFound(name.to_string()))
    }

    /// Attribute matrix named by the container and matrix parts of `path`.
    pub fn matrix(&self, path: &DataArrayPath) -> Result<&AttributeMatrix, PipelineError> {
        self.container(&path.container)?
            .matrix(&path.matrix)
            .ok_or_else(|| PipelineError::MatrixNotFound(path.matrix_key()))
    }

    pub fn matrix_mut(
        &mut self,
        path: &DataArrayPath,
    ) -> Result<&mut AttributeMatrix, PipelineError> {
        self.container_mut(&path.container)?
            .matrix_mut(&path.matrix)
            .ok_or_else(|| PipelineError::MatrixNotFound(path.matrix_key()))
    }

    /// Type-erased array at `path`.
    pub fn tagged(&self, path: &DataArrayPath) -> Result<&TaggedArray, PipelineError> {
        self.matrix(path)?
            .tagged(&path.array)
            .ok_or_else(|| PipelineError::ArrayNotFound(path.clone()))
    }

    pub fn tagged_mut(&mut self, path: &DataArrayPath) -> Result<&mut TaggedArray, PipelineError> {
        self.matrix_mut(path)?
            .tagged_mut(&path.array)
            .ok_or_else(|| PipelineError::ArrayNotFound(path.clone()))
    }

    /// Typed, shape-checked view of the array at `path`.
    ///
    /// # Errors
    /// - `ContainerNotFound`, `MatrixNotFound`, `ArrayNotFound` for a dangling path.
    /// - `TypeMismatch` if the array does not hold `T`.
    /// - `ComponentMismatch` if it does not have `components` components per tuple.
    pub fn array<T: Element>(
        &self,
        path: &DataArrayPath,
        components: usize,
    ) -> Result<&DataArray<T>, PipelineError> {
        let tagged = self.tagged(path)?;
        let array = T::unwrap(tagged).ok_or_else(|| PipelineError::TypeMismatch {
            path: path.clone(),
            expected: T::ELEMENT_TYPE,
            found: tagged.element_type(),
        })?;
        if array.components() != components {
            return Err(PipelineError::ComponentMismatch {
                path: path.clone(),
                expected: components,
                found: array.components(),
            });
        }
        Ok(array)
    }

    /// Mutable counterpart of [`array`](Self::array).
    pub fn array_mut<T: Element>(
        &mut self,
        path: &DataArrayPath,
        components: usize,
    ) -> Result<&mut DataArray<T>, PipelineError> {
        let tagged = self.tagged_mut(path)?;
        let found = tagged.element_type();
        let array = T::unwrap_mut(tagged).ok_or_else(|| PipelineError::TypeMismatch {
            path: path.clone(),
            expected: T::ELEMENT_TYPE,
            found,
        })?;
        if array.components() != components {
            return Err(PipelineError::ComponentMismatch {
                path: path.clone(),
                expected: components,
                found: array.components(),
            });
        }
        Ok(array)
    }

    /// Create a zero-filled array at `path`.
    ///
    /// # Errors
    /// - `TupleCountMismatch` if `product(tuple_dims)` differs from the matrix.
    /// - `NameCollision` if the array exists and `overwrite` is false.
    pub fn create_array<T: Element>(
        &mut self,
        path: &DataArrayPath,
        components: usize,
        tuple_dims: &[usize],
        overwrite: bool,
    ) -> Result<&mut DataArray<T>, PipelineError> {
        let matrix = self.matrix_mut(path)?;
        let requested: usize = tuple_dims.iter().product();
        if requested != matrix.num_tuples() {
            return Err(PipelineError::TupleCountMismatch {
                name: path.to_string(),
                expected: matrix.num_tuples(),
                found: requested,
            });
        }
        if !overwrite && matrix.contains(&path.array) {
            return Err(PipelineError::NameCollision(path.to_string()));
        }
        matrix.create_array::<T>(&path.array, components, true)
    }

    /// Declare an output array during a data check.
    ///
    /// Creates a zero-filled array sized to its matrix. An existing array with
    /// the same element type and component count is reused (resized to the
    /// matrix if needed), which keeps repeated checks idempotent; any other
    /// existing array under that name is a `NameCollision`.
    pub fn create_output_array<T: Element>(
        &mut self,
        path: &DataArrayPath,
        components: usize,
    ) -> Result<&mut DataArray<T>, PipelineError> {
        let matrix = self.matrix_mut(path)?;
        let tuples = matrix.num_tuples();
        let reusable = match matrix.tagged(&path.array) {
            None => false,
            Some(existing)
                if existing.element_type() == T::ELEMENT_TYPE
                    && existing.components() == components =>
            {
                true
            }
            Some(_) => return Err(PipelineError::NameCollision(path.to_string())),
        };
        if !reusable {
            return matrix.create_array::<T>(&path.array, components, false);
        }
        let array = matrix.array_mut::<T>(&path.array)?;
        if array.tuple_count() != tuples {
            array.resize_tuples(tuples);
        }
        Ok(array)
    }

    /// Declare an output attribute matrix during a data check.
    ///
    /// A new matrix is created with `tuple_dims`. An existing matrix is reused
    /// untouched only when it has the same kind and holds nothing but the
    /// array `path` names, i.e. the caller's own output from an earlier check
    /// or run. Any other existing matrix is a `NameCollision`, so a data check
    /// never resizes or truncates data it did not create.
    pub fn create_output_matrix(
        &mut self,
        path: &DataArrayPath,
        tuple_dims: &[usize],
        kind: AttributeMatrixKind,
    ) -> Result<&mut AttributeMatrix, PipelineError> {
        let container = self.container_mut(&path.container)?;
        if container.contains_matrix(&path.matrix) {
            let matrix = container
                .matrix_mut(&path.matrix)
                .ok_or_else(|| PipelineError::MatrixNotFound(path.matrix_key()))?;
            let own = matrix.kind() == kind && matrix.iter().all(|a| a.name() == path.array);
            if !own {
                return Err(PipelineError::NameCollision(path.matrix_key()));
            }
            return Ok(matrix);
        }
        container.create_matrix(&path.matrix, tuple_dims, kind)
    }

    /// Check `path` against `requirement` (geometry, matrix kind, element
    /// type, component count).
    pub fn check_requirement(
        &self,
        path: &DataArrayPath,
        requirement: &crate::filter::DataArrayRequirement,
    ) -> Result<(), PipelineError> {
        requirement.check(self, path)
    }

    /// Typed geometry of container `name`.
    ///
    /// # Errors
    /// `ContainerNotFound`, `NoGeometry` or `GeometryMismatch`.
    pub fn geometry_as<G: GeometryVariant>(&self, name: &str) -> Result<&G, PipelineError> {
        self.container(name)?.geometry_as::<G>()
    }

    pub fn geometry_as_mut<G: GeometryVariant>(
        &mut self,
        name: &str,
    ) -> Result<&mut G, PipelineError> {
        self.container_mut(name)?.geometry_as_mut::<G>()
    }

    /// Geometry kind of container `name`.
    pub fn geometry_kind(&self, name: &str) -> Result<GeometryKind, PipelineError> {
        self.container(name)?
            .geometry_kind()
            .ok_or_else(|| PipelineError::NoGeometry(name.to_string()))
    }

    pub fn containers(&self) -> impl Iterator<Item = &DataContainer> + '_ {
        self.containers.values()
    }
}

impl DebugInvariants for DataContainerArray {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "DataContainerArray invalid");
    }

    fn validate_invariants(&self) -> Result<(), PipelineError> {
        for container in self.containers.values() {
            container.validate_invariants()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ImageGeom, TriangleGeom};

    fn store() -> DataContainerArray {
        let mut dca = DataContainerArray::new();
        let dc = dca
            .add_container(DataContainer::with_geometry(
                "ImageDataContainer",
                ImageGeom::new([2, 2, 2]),
            ))
            .unwrap();
        dc.create_matrix("CellData", &[2, 2, 2], AttributeMatrixKind::Cell)
            .unwrap();
        dca
    }

    #[test]
    fn lookup_failures_are_classified() {
        let mut dca = store();
        let path = DataArrayPath::new("ImageDataContainer", "CellData", "FeatureIds");
        assert!(matches!(
            dca.array::<i32>(&path, 1),
            Err(PipelineError::ArrayNotFound(_))
        ));
        dca.create_array::<i32>(&path, 1, &[2, 2, 2], false).unwrap();
        assert!(matches!(
            dca.array::<f32>(&path, 1),
            Err(PipelineError::TypeMismatch { .. })
        ));
        assert!(matches!(
            dca.array::<i32>(&path, 3),
            Err(PipelineError::ComponentMismatch { expected: 3, found: 1, .. })
        ));
        assert!(matches!(
            dca.array::<i32>(&path.with_matrix("Nope", "x"), 1),
            Err(PipelineError::MatrixNotFound(_))
        ));
        assert!(matches!(
            dca.array::<i32>(&DataArrayPath::new("Nope", "CellData", "x"), 1),
            Err(PipelineError::ContainerNotFound(_))
        ));
    }

    #[test]
    fn create_array_collides_without_overwrite() {
        let mut dca = store();
        let path = DataArrayPath::new("ImageDataContainer", "CellData", "Phases");
        dca.create_array::<i32>(&path, 1, &[8], false).unwrap();
        assert!(matches!(
            dca.create_array::<i32>(&path, 1, &[8], false),
            Err(PipelineError::NameCollision(_))
        ));
        assert!(dca.create_array::<u8>(&path, 1, &[8], true).is_ok());
        assert!(matches!(
            dca.create_array::<u8>(&path.with_array("Other"), 1, &[3], false),
            Err(PipelineError::TupleCountMismatch { .. })
        ));
    }

    #[test]
    fn output_arrays_are_reused_when_shape_matches() {
        let mut dca = store();
        let path = DataArrayPath::new("ImageDataContainer", "CellData", "FeatureIds");
        dca.create_output_array::<i32>(&path, 1).unwrap().fill(4);
        let again = dca.create_output_array::<i32>(&path, 1).unwrap();
        assert_eq!(again.as_slice()[0], 4);
        assert!(matches!(
            dca.create_output_array::<f32>(&path, 1),
            Err(PipelineError::NameCollision(_))
        ));
    }

    #[test]
    fn geometry_lookups() {
        let mut dca = store();
        assert!(dca.geometry_as::<ImageGeom>("ImageDataContainer").is_ok());
        assert!(matches!(
            dca.geometry_as::<TriangleGeom>("ImageDataContainer"),
            Err(PipelineError::GeometryMismatch { .. })
        ));
        dca.create_container("Empty").unwrap();
        assert!(matches!(
            dca.geometry_as::<ImageGeom>("Empty"),
            Err(PipelineError::NoGeometry(_))
        ));
        assert_eq!(
            dca.geometry_kind("ImageDataContainer").unwrap(),
            GeometryKind::Image
        );
    }
}
