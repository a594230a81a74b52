//! DataContainer: one geometry plus a name-keyed set of attribute matrices.

use std::collections::BTreeMap;

use crate::data::attribute_matrix::{AttributeMatrix, AttributeMatrixKind};
use crate::debug_invariants::DebugInvariants;
use crate::geometry::{Geometry, GeometryKind, GeometryVariant};
use crate::pipeline_error::PipelineError;

#[derive(Clone, Debug)]
pub struct DataContainer {
    name: String,
    geometry: Option<Geometry>,
    matrices: BTreeMap<String, AttributeMatrix>,
}

impl DataContainer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            geometry: None,
            matrices: BTreeMap::new(),
        }
    }

    pub fn with_geometry(name: &str, geometry: impl Into<Geometry>) -> Self {
        let mut dc = Self::new(name);
        dc.geometry = Some(geometry.into());
        dc
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    pub fn geometry_mut(&mut self) -> Option<&mut Geometry> {
        self.geometry.as_mut()
    }

    /// Attach `geometry`, returning the previous one.
    pub fn set_geometry(&mut self, geometry: impl Into<Geometry>) -> Option<Geometry> {
        self.geometry.replace(geometry.into())
    }

    pub fn geometry_kind(&self) -> Option<GeometryKind> {
        self.geometry.as_ref().map(Geometry::kind)
    }

    /// Typed geometry borrow.
    ///
    /// # Errors
    /// `NoGeometry` if none is attached, `GeometryMismatch` if it is another kind.
    pub fn geometry_as<G: GeometryVariant>(&self) -> Result<&G, PipelineError> {
        let geometry = self
            .geometry
            .as_ref()
            .ok_or_else(|| PipelineError::NoGeometry(self.name.clone()))?;
        G::from_geometry(geometry).ok_or_else(|| PipelineError::GeometryMismatch {
            container: self.name.clone(),
            expected: G::KIND,
            found: geometry.kind(),
        })
    }

    pub fn geometry_as_mut<G: GeometryVariant>(&mut self) -> Result<&mut G, PipelineError> {
        let name = self.name.clone();
        let geometry = self
            .geometry
            .as_mut()
            .ok_or_else(|| PipelineError::NoGeometry(name.clone()))?;
        let found = geometry.kind();
        G::from_geometry_mut(geometry).ok_or(PipelineError::GeometryMismatch {
            container: name,
            expected: G::KIND,
            found,
        })
    }

    pub fn contains_matrix(&self, name: &str) -> bool {
        self.matrices.contains_key(name)
    }

    pub fn matrix_names(&self) -> Vec<String> {
        self.matrices.keys().cloned().collect()
    }

    pub fn matrix(&self, name: &str) -> Option<&AttributeMatrix> {
        self.matrices.get(name)
    }

    pub fn matrix_mut(&mut self, name: &str) -> Option<&mut AttributeMatrix> {
        self.matrices.get_mut(name)
    }

    /// Create an empty attribute matrix.
    pub fn create_matrix(
        &mut self,
        name: &str,
        tuple_dims: &[usize],
        kind: AttributeMatrixKind,
    ) -> Result<&mut AttributeMatrix, PipelineError> {
        self.insert_matrix(AttributeMatrix::new(name, tuple_dims, kind))
    }

    pub fn insert_matrix(
        &mut self,
        matrix: AttributeMatrix,
    ) -> Result<&mut AttributeMatrix, PipelineError> {
        if self.matrices.contains_key(matrix.name()) {
            return Err(PipelineError::NameCollision(format!(
                "{}|{}",
                self.name,
                matrix.name()
            )));
        }
        let key = matrix.name().to_string();
        Ok(self.matrices.entry(key).or_insert(matrix))
    }

    pub fn remove_matrix(&mut self, name: &str) -> Option<AttributeMatrix> {
        self.matrices.remove(name)
    }

    pub fn rename_matrix(&mut self, old: &str, new: &str) -> Result<(), PipelineError> {
        if self.matrices.contains_key(new) {
            return Err(PipelineError::NameCollision(format!("{}|{}", self.name, new)));
        }
        let mut matrix = self
            .matrices
            .remove(old)
            .ok_or_else(|| PipelineError::MatrixNotFound(format!("{}|{}", self.name, old)))?;
        matrix.rename(new);
        self.matrices.insert(new.to_string(), matrix);
        Ok(())
    }

    pub fn matrices(&self) -> impl Iterator<Item = &AttributeMatrix> + '_ {
        self.matrices.values()
    }
}

impl DebugInvariants for DataContainer {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "DataContainer invalid");
    }

    fn validate_invariants(&self) -> Result<(), PipelineError> {
        for matrix in self.matrices.values() {
            matrix.validate_invariants()?;
        }
        Ok(())
    }
}
