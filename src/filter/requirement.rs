//! Input requirements a filter declares for each array it reads.
//!
//! A requirement is data: the accepted geometry kinds, attribute-matrix kinds,
//! element types and component count of one input. It is checked against the
//! store during the data check, before any data is touched.

use serde::{Deserialize, Serialize};

use crate::data::attribute_matrix::AttributeMatrixKind;
use crate::data::data_container_array::DataContainerArray;
use crate::data::element::ElementType;
use crate::data::path::DataArrayPath;
use crate::geometry::GeometryKind;
use crate::pipeline_error::PipelineError;

/// Shape/type constraints on one input array. Empty lists accept anything.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataArrayRequirement {
    pub property_key: String,
    pub element_types: Vec<ElementType>,
    pub components: Option<usize>,
    pub matrix_kinds: Vec<AttributeMatrixKind>,
    pub geometry_kinds: Vec<GeometryKind>,
}

impl DataArrayRequirement {
    /// Requirement on a single element type and component count.
    pub fn new(
        property_key: &str,
        element_type: ElementType,
        components: usize,
        matrix_kind: AttributeMatrixKind,
        geometry_kind: GeometryKind,
    ) -> Self {
        Self {
            property_key: property_key.to_string(),
            element_types: vec![element_type],
            components: Some(components),
            matrix_kinds: vec![matrix_kind],
            geometry_kinds: vec![geometry_kind],
        }
    }

    /// Accept any of `element_types`.
    pub fn with_element_types(mut self, element_types: &[ElementType]) -> Self {
        self.element_types = element_types.to_vec();
        self
    }

    /// Resolve `path` and check every constraint.
    ///
    /// # Errors
    /// The first failure, in order: missing container, geometry, matrix kind,
    /// missing array, element type, component count.
    pub fn check(
        &self,
        dca: &DataContainerArray,
        path: &DataArrayPath,
    ) -> Result<(), PipelineError> {
        if !path.is_valid() {
            return Err(PipelineError::ArrayNotFound(path.clone()));
        }
        let container = dca.container(&path.container)?;
        if let Some(&expected) = self.geometry_kinds.first() {
            let found = container
                .geometry_kind()
                .ok_or_else(|| PipelineError::NoGeometry(path.container.clone()))?;
            if !self.geometry_kinds.contains(&found) {
                return Err(PipelineError::GeometryMismatch {
                    container: path.container.clone(),
                    expected,
                    found,
                });
            }
        }
        let matrix = dca.matrix(path)?;
        if !self.matrix_kinds.is_empty() && !self.matrix_kinds.contains(&matrix.kind()) {
            return Err(PipelineError::MatrixKindMismatch {
                matrix: path.matrix_key(),
                found: matrix.kind().to_string(),
            });
        }
        let array = dca.tagged(path)?;
        if let Some(&expected) = self.element_types.first() {
            if !self.element_types.contains(&array.element_type()) {
                return Err(PipelineError::TypeMismatch {
                    path: path.clone(),
                    expected,
                    found: array.element_type(),
                });
            }
        }
        if let Some(expected) = self.components {
            if array.components() != expected {
                return Err(PipelineError::ComponentMismatch {
                    path: path.clone(),
                    expected,
                    found: array.components(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::data_container::DataContainer;
    use crate::geometry::{ImageGeom, VertexGeom};

    fn store() -> DataContainerArray {
        let mut dca = DataContainerArray::new();
        let dc = dca
            .add_container(DataContainer::with_geometry("dc", ImageGeom::new([2, 1, 1])))
            .unwrap();
        let am = dc
            .create_matrix("CellData", &[2, 1, 1], AttributeMatrixKind::Cell)
            .unwrap();
        am.create_array::<i32>("FeatureIds", 1, false).unwrap();
        dca.add_container(DataContainer::with_geometry("verts", VertexGeom::default()))
            .unwrap();
        dca
    }

    fn ids_requirement() -> DataArrayRequirement {
        DataArrayRequirement::new(
            "FeatureIdsArrayPath",
            ElementType::Int32,
            1,
            AttributeMatrixKind::Cell,
            GeometryKind::Image,
        )
    }

    #[test]
    fn satisfied_requirement_passes() {
        let dca = store();
        let path = DataArrayPath::new("dc", "CellData", "FeatureIds");
        ids_requirement().check(&dca, &path).unwrap();
    }

    #[test]
    fn wrong_geometry_fails_first() {
        let dca = store();
        let path = DataArrayPath::new("verts", "CellData", "FeatureIds");
        assert!(matches!(
            ids_requirement().check(&dca, &path),
            Err(PipelineError::GeometryMismatch { .. })
        ));
    }

    #[test]
    fn accepts_any_listed_type() {
        let dca = store();
        let path = DataArrayPath::new("dc", "CellData", "FeatureIds");
        let req = ids_requirement().with_element_types(&[ElementType::Float32]);
        assert!(matches!(
            req.check(&dca, &path),
            Err(PipelineError::TypeMismatch { .. })
        ));
        let req = ids_requirement().with_element_types(&ElementType::NUMERIC);
        assert!(req.check(&dca, &path).is_ok());
    }
}
