//! Plumbing shared by the segment-features filters: mask and shape checks,
//! output declaration, and writing a [`Segmentation`] back into the store.

use crate::algs::segmentation::Segmentation;
use crate::data::attribute_matrix::AttributeMatrixKind;
use crate::data::data_container_array::DataContainerArray;
use crate::data::element::ElementType;
use crate::data::path::DataArrayPath;
use crate::filter::DataArrayRequirement;
use crate::geometry::GeometryKind;
use crate::geometry::image::ImageGeom;
use crate::pipeline_error::PipelineError;

/// Names of the arrays and matrix a segment-features filter creates.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SegmentOutputs {
    /// Created next to the input, in the cell matrix.
    pub feature_ids: DataArrayPath,
    /// `Active` array of the new cell-feature matrix.
    pub active: DataArrayPath,
}

impl SegmentOutputs {
    pub(crate) fn new(
        input: &DataArrayPath,
        feature_ids_name: &str,
        feature_matrix_name: &str,
        active_name: &str,
    ) -> Self {
        Self {
            feature_ids: input.with_array(feature_ids_name),
            active: input.with_matrix(feature_matrix_name, active_name),
        }
    }

    /// Reject empty output names before anything is created.
    pub(crate) fn check_names(&self) -> Result<(), PipelineError> {
        for path in [&self.feature_ids, &self.active] {
            if !path.is_valid() {
                return Err(PipelineError::InvalidPath(path.to_string()));
            }
        }
        Ok(())
    }

    /// Create the placeholder outputs: a zeroed `FeatureIds` in the cell
    /// matrix and an empty cell-feature matrix holding `Active`.
    pub(crate) fn declare(&self, dca: &mut DataContainerArray) -> Result<(), PipelineError> {
        dca.create_output_array::<i32>(&self.feature_ids, 1)?;
        dca.create_output_matrix(&self.active, &[0], AttributeMatrixKind::CellFeature)?;
        dca.create_output_array::<bool>(&self.active, 1)?;
        Ok(())
    }

    /// Store the labels and size the feature matrix to `feature_count + 1`.
    pub(crate) fn write(
        &self,
        dca: &mut DataContainerArray,
        segmentation: &Segmentation,
    ) -> Result<(), PipelineError> {
        let ids = dca.array_mut::<i32>(&self.feature_ids, 1)?;
        if ids.len() != segmentation.feature_ids.len() {
            return Err(PipelineError::TupleCountMismatch {
                name: self.feature_ids.to_string(),
                expected: segmentation.feature_ids.len(),
                found: ids.len(),
            });
        }
        ids.as_mut_slice().copy_from_slice(&segmentation.feature_ids);

        dca.matrix_mut(&self.active)?
            .resize_attribute_arrays(&[segmentation.feature_count + 1]);
        dca.array_mut::<bool>(&self.active, 1)?
            .as_mut_slice()
            .copy_from_slice(&segmentation.active());
        Ok(())
    }
}

/// Image geometry of the input's container, checked against the cell matrix
/// tuple count.
pub(crate) fn image_for_cells(
    dca: &DataContainerArray,
    input: &DataArrayPath,
) -> Result<ImageGeom, PipelineError> {
    let geom = dca.geometry_as::<ImageGeom>(&input.container)?;
    let tuples = dca.matrix(input)?.num_tuples();
    if tuples != geom.num_voxels() {
        return Err(PipelineError::TupleCountMismatch {
            name: input.matrix_key(),
            expected: geom.num_voxels(),
            found: tuples,
        });
    }
    Ok(geom.clone())
}

pub(crate) fn good_voxels_requirement() -> DataArrayRequirement {
    DataArrayRequirement::new(
        "GoodVoxelsArrayPath",
        ElementType::Bool,
        1,
        AttributeMatrixKind::Cell,
        GeometryKind::Image,
    )
}

/// Validate the optional mask: a one-component bool array with one value per cell.
pub(crate) fn check_mask(
    dca: &DataContainerArray,
    mask: &DataArrayPath,
    cells: usize,
) -> Result<(), PipelineError> {
    good_voxels_requirement().check(dca, mask)?;
    let found = dca.array::<bool>(mask, 1)?.tuple_count();
    if found != cells {
        return Err(PipelineError::TupleCountMismatch {
            name: mask.to_string(),
            expected: cells,
            found,
        });
    }
    Ok(())
}

/// Owned copy of the mask, if enabled.
pub(crate) fn read_mask(
    dca: &DataContainerArray,
    use_mask: bool,
    mask: &DataArrayPath,
) -> Result<Option<Vec<bool>>, PipelineError> {
    if !use_mask {
        return Ok(None);
    }
    Ok(Some(dca.array::<bool>(mask, 1)?.as_slice().to_vec()))
}
