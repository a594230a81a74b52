//! VectorSegmentFeatures: segment a voxel grid into features of nearly
//! parallel (or anti-parallel) cell vectors.

use std::f32::consts::PI;

use log::debug;

use crate::algs::adjacency::GridAdjacency;
use crate::algs::segmentation::{GroupingPolicy, SegmentationConfig, SegmentationEngine};
use crate::data::attribute_matrix::AttributeMatrixKind;
use crate::data::data_container_array::DataContainerArray;
use crate::data::element::ElementType;
use crate::data::path::DataArrayPath;
use crate::filter::{
    DataArrayRequirement, Filter, FilterContext, FilterParameter, ParameterConstraint,
    ParameterValue,
};
use crate::filters::segment_features::{self, SegmentOutputs};
use crate::geometry::GeometryKind;
use crate::geometry::image::AxisMask;
use crate::pipeline_error::PipelineError;

/// Warning code raised when no cell is eligible for segmentation.
pub const NO_FEATURES_WARNING: i32 = -87001;

/// Cosine of the angle between `a` and `b`; 0 when either has zero length.
fn cos_between(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm = |v: &[f32]| v.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norms = norm(a) * norm(b);
    if norms == 0.0 {
        return 0.0;
    }
    (dot / norms).clamp(-1.0, 1.0)
}

/// Groups neighbors whose vectors, taken as undirected axes, lie within a
/// tolerance angle.
#[derive(Debug)]
pub struct VectorGrouping<'a> {
    vectors: &'a [f32],
    mask: Option<&'a [bool]>,
    tolerance: f32,
}

impl<'a> VectorGrouping<'a> {
    /// `vectors` holds three components per tuple; `tolerance` is in radians.
    pub fn new(vectors: &'a [f32], mask: Option<&'a [bool]>, tolerance: f32) -> Self {
        Self {
            vectors,
            mask,
            tolerance,
        }
    }

    fn vector(&self, index: usize) -> &[f32] {
        &self.vectors[3 * index..3 * index + 3]
    }
}

impl GroupingPolicy for VectorGrouping<'_> {
    fn is_eligible(&self, index: usize) -> bool {
        self.mask.is_none_or(|mask| mask[index])
    }

    fn determine_grouping(&mut self, reference: usize, neighbor: usize, _feature_id: i32) -> bool {
        let w = cos_between(self.vector(reference), self.vector(neighbor)).acos();
        w <= self.tolerance || (PI - w) <= self.tolerance
    }
}

/// The Segment Features (Vector) filter.
#[derive(Clone, Debug, PartialEq)]
pub struct VectorSegmentFeatures {
    pub selected_vector_array_path: DataArrayPath,
    /// Degrees.
    pub angle_tolerance: f64,
    pub use_good_voxels: bool,
    pub good_voxels_array_path: DataArrayPath,
    pub feature_ids_array_name: String,
    pub cell_feature_attribute_matrix_name: String,
    pub active_array_name: String,
    pub rng_seed: i64,
    pub randomize_feature_ids: bool,
}

impl Default for VectorSegmentFeatures {
    fn default() -> Self {
        let seg = SegmentationConfig::default();
        Self {
            selected_vector_array_path: DataArrayPath::new(
                "ImageDataContainer",
                "CellData",
                "VectorData",
            ),
            angle_tolerance: 5.0,
            use_good_voxels: false,
            good_voxels_array_path: DataArrayPath::new("ImageDataContainer", "CellData", "Mask"),
            feature_ids_array_name: "FeatureIds".to_string(),
            cell_feature_attribute_matrix_name: "CellFeatureData".to_string(),
            active_array_name: "Active".to_string(),
            rng_seed: seg.rng_seed as i64,
            randomize_feature_ids: seg.randomize_feature_ids,
        }
    }
}

impl VectorSegmentFeatures {
    pub fn new() -> Self {
        Self::default()
    }

    fn vector_requirement() -> DataArrayRequirement {
        DataArrayRequirement::new(
            "SelectedVectorArrayPath",
            ElementType::Float32,
            3,
            AttributeMatrixKind::Cell,
            GeometryKind::Image,
        )
    }

    fn outputs(&self) -> SegmentOutputs {
        SegmentOutputs::new(
            &self.selected_vector_array_path,
            &self.feature_ids_array_name,
            &self.cell_feature_attribute_matrix_name,
            &self.active_array_name,
        )
    }

    fn config(&self) -> SegmentationConfig {
        SegmentationConfig {
            rng_seed: self.rng_seed as u64,
            randomize_feature_ids: self.randomize_feature_ids,
        }
    }
}

impl Filter for VectorSegmentFeatures {
    fn human_label(&self) -> &'static str {
        "Segment Features (Vector)"
    }

    fn group_name(&self) -> &'static str {
        "Reconstruction"
    }

    fn parameters(&self) -> Vec<FilterParameter> {
        let d = Self::default();
        vec![
            FilterParameter::float("Angle Tolerance", "AngleTolerance", d.angle_tolerance)
                .with_constraint(ParameterConstraint::between(0.0, 180.0)),
            FilterParameter::int("Random Seed", "RandomSeed", d.rng_seed)
                .with_constraint(ParameterConstraint::at_least(0.0)),
            FilterParameter::boolean(
                "Randomize Feature Ids",
                "RandomizeFeatureIds",
                d.randomize_feature_ids,
            ),
            FilterParameter::separator("Cell Data"),
            FilterParameter::array_path(
                "Vector Array To Segment",
                d.selected_vector_array_path,
                Self::vector_requirement(),
            ),
            FilterParameter::boolean("Use Mask Array", "UseGoodVoxels", d.use_good_voxels),
            FilterParameter::array_path(
                "Mask",
                d.good_voxels_array_path,
                segment_features::good_voxels_requirement(),
            ),
            FilterParameter::separator("Created Data"),
            FilterParameter::string(
                "Feature Ids",
                "FeatureIdsArrayName",
                &d.feature_ids_array_name,
            ),
            FilterParameter::string(
                "Cell Feature Attribute Matrix",
                "CellFeatureAttributeMatrixName",
                &d.cell_feature_attribute_matrix_name,
            ),
            FilterParameter::string("Active", "ActiveArrayName", &d.active_array_name),
        ]
    }

    fn get_parameter(&self, key: &str) -> Result<ParameterValue, PipelineError> {
        Ok(match key {
            "AngleTolerance" => ParameterValue::Float(self.angle_tolerance),
            "RandomSeed" => ParameterValue::Int(self.rng_seed),
            "RandomizeFeatureIds" => ParameterValue::Bool(self.randomize_feature_ids),
            "SelectedVectorArrayPath" => {
                ParameterValue::Path(self.selected_vector_array_path.clone())
            }
            "UseGoodVoxels" => ParameterValue::Bool(self.use_good_voxels),
            "GoodVoxelsArrayPath" => ParameterValue::Path(self.good_voxels_array_path.clone()),
            "FeatureIdsArrayName" => ParameterValue::String(self.feature_ids_array_name.clone()),
            "CellFeatureAttributeMatrixName" => {
                ParameterValue::String(self.cell_feature_attribute_matrix_name.clone())
            }
            "ActiveArrayName" => ParameterValue::String(self.active_array_name.clone()),
            _ => return Err(PipelineError::InvalidKey(key.to_string())),
        })
    }

    fn set_parameter(&mut self, key: &str, value: ParameterValue) -> Result<(), PipelineError> {
        match key {
            "AngleTolerance" => self.angle_tolerance = value.into_f64(key)?,
            "RandomSeed" => self.rng_seed = value.into_i64(key)?,
            "RandomizeFeatureIds" => self.randomize_feature_ids = value.into_bool(key)?,
            "SelectedVectorArrayPath" => self.selected_vector_array_path = value.into_path(key)?,
            "UseGoodVoxels" => self.use_good_voxels = value.into_bool(key)?,
            "GoodVoxelsArrayPath" => self.good_voxels_array_path = value.into_path(key)?,
            "FeatureIdsArrayName" => self.feature_ids_array_name = value.into_string(key)?,
            "CellFeatureAttributeMatrixName" => {
                self.cell_feature_attribute_matrix_name = value.into_string(key)?
            }
            "ActiveArrayName" => self.active_array_name = value.into_string(key)?,
            _ => return Err(PipelineError::InvalidKey(key.to_string())),
        }
        Ok(())
    }

    fn requirements(&self) -> Vec<DataArrayRequirement> {
        let mut reqs = vec![Self::vector_requirement()];
        if self.use_good_voxels {
            reqs.push(segment_features::good_voxels_requirement());
        }
        reqs
    }

    fn data_check(
        &mut self,
        dca: &mut DataContainerArray,
        _ctx: &mut FilterContext,
    ) -> Result<(), PipelineError> {
        self.check_constraints()?;
        let outputs = self.outputs();
        outputs.check_names()?;

        let input = &self.selected_vector_array_path;
        Self::vector_requirement().check(dca, input)?;
        let geom = segment_features::image_for_cells(dca, input)?;
        if self.use_good_voxels {
            segment_features::check_mask(dca, &self.good_voxels_array_path, geom.num_voxels())?;
        }

        outputs.declare(dca)
    }

    fn execute_unchecked(
        &mut self,
        dca: &mut DataContainerArray,
        ctx: &mut FilterContext,
    ) -> Result<(), PipelineError> {
        let input = &self.selected_vector_array_path;
        let geom = segment_features::image_for_cells(dca, input)?;
        let mask =
            segment_features::read_mask(dca, self.use_good_voxels, &self.good_voxels_array_path)?;
        let segmentation = {
            let vectors = dca.array::<f32>(input, 3)?;
            let mut policy = VectorGrouping::new(
                vectors.as_slice(),
                mask.as_deref(),
                (self.angle_tolerance as f32).to_radians(),
            );
            SegmentationEngine::from_config(&self.config())
                .with_interrupt(ctx.interrupt_flag())
                .segment(&GridAdjacency::new(&geom, AxisMask::ALL), &mut policy)?
        };
        debug!("{}: {} features", self.human_label(), segmentation.feature_count);
        if segmentation.feature_count == 0 {
            ctx.warning(NO_FEATURES_WARNING, "no eligible cells; every feature id is 0");
        }
        self.outputs().write(dca, &segmentation)
    }

    fn new_instance(&self, copy_parameters: bool) -> Box<dyn Filter> {
        if copy_parameters {
            Box::new(self.clone())
        } else {
            Box::new(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn antiparallel_vectors_group() {
        let vectors = [1.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let mut policy = VectorGrouping::new(&vectors, None, 5f32.to_radians());
        assert!(policy.determine_grouping(0, 1, 1));
        assert!(!policy.determine_grouping(0, 2, 1));
    }

    #[test]
    fn zero_vector_is_perpendicular_to_everything() {
        assert_eq!(cos_between(&[0.0, 0.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn mask_controls_eligibility() {
        let vectors = [1.0; 6];
        let mask = [true, false];
        let policy = VectorGrouping::new(&vectors, Some(&mask), 0.1);
        assert!(policy.is_eligible(0));
        assert!(!policy.is_eligible(1));
    }
}
