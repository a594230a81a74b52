//! ScalarSegmentFeatures: segment a voxel grid into features of similar
//! scalar value.

use log::debug;

use crate::algs::adjacency::GridAdjacency;
use crate::algs::segmentation::{GroupingPolicy, SegmentationConfig, SegmentationEngine};
use crate::data::attribute_matrix::AttributeMatrixKind;
use crate::data::data_array::TaggedArray;
use crate::data::data_container_array::DataContainerArray;
use crate::data::element::ElementType;
use crate::data::path::DataArrayPath;
use crate::filter::{
    DataArrayRequirement, Filter, FilterContext, FilterParameter, ParameterConstraint,
    ParameterValue,
};
use crate::filters::segment_features::{self, SegmentOutputs};
use crate::filters::vector_segment::NO_FEATURES_WARNING;
use crate::geometry::GeometryKind;
use crate::geometry::image::AxisMask;
use crate::pipeline_error::PipelineError;

/// Groups neighbors whose values differ by at most `tolerance`.
///
/// Values of every numeric element type are compared after widening to `f64`.
#[derive(Debug)]
pub struct ScalarGrouping<'a> {
    values: Vec<f64>,
    mask: Option<&'a [bool]>,
    tolerance: f64,
}

impl<'a> ScalarGrouping<'a> {
    pub fn new(values: Vec<f64>, mask: Option<&'a [bool]>, tolerance: f64) -> Self {
        Self {
            values,
            mask,
            tolerance,
        }
    }

    /// Widen the first component of every tuple of `array`.
    pub fn from_tagged(
        array: &TaggedArray,
        mask: Option<&'a [bool]>,
        tolerance: f64,
    ) -> Result<Self, PipelineError> {
        let values = (0..array.tuple_count())
            .map(|i| {
                array.value_as_f64(i, 0).ok_or_else(|| PipelineError::IndexOutOfBounds {
                    name: array.name().to_string(),
                    index: i,
                    len: array.tuple_count(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(values, mask, tolerance))
    }
}

impl GroupingPolicy for ScalarGrouping<'_> {
    fn is_eligible(&self, index: usize) -> bool {
        self.mask.is_none_or(|mask| mask[index])
    }

    fn determine_grouping(&mut self, reference: usize, neighbor: usize, _feature_id: i32) -> bool {
        (self.values[reference] - self.values[neighbor]).abs() <= self.tolerance
    }
}

/// The Segment Features (Scalar) filter.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarSegmentFeatures {
    pub scalar_array_path: DataArrayPath,
    pub scalar_tolerance: f64,
    pub use_good_voxels: bool,
    pub good_voxels_array_path: DataArrayPath,
    pub feature_ids_array_name: String,
    pub cell_feature_attribute_matrix_name: String,
    pub active_array_name: String,
    pub rng_seed: i64,
    pub randomize_feature_ids: bool,
}

impl Default for ScalarSegmentFeatures {
    fn default() -> Self {
        let seg = SegmentationConfig::default();
        Self {
            scalar_array_path: DataArrayPath::new("ImageDataContainer", "CellData", "Scalars"),
            scalar_tolerance: 0.0,
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

impl ScalarSegmentFeatures {
    pub fn new() -> Self {
        Self::default()
    }

    fn scalar_requirement() -> DataArrayRequirement {
        DataArrayRequirement::new(
            "ScalarArrayPath",
            ElementType::Int32,
            1,
            AttributeMatrixKind::Cell,
            GeometryKind::Image,
        )
        .with_element_types(&ElementType::NUMERIC)
    }

    fn outputs(&self) -> SegmentOutputs {
        SegmentOutputs::new(
            &self.scalar_array_path,
            &self.feature_ids_array_name,
            &self.cell_feature_attribute_matrix_name,
            &self.active_array_name,
        )
    }
}

impl Filter for ScalarSegmentFeatures {
    fn human_label(&self) -> &'static str {
        "Segment Features (Scalar)"
    }

    fn group_name(&self) -> &'static str {
        "Reconstruction"
    }

    fn parameters(&self) -> Vec<FilterParameter> {
        let d = Self::default();
        vec![
            FilterParameter::float("Scalar Tolerance", "ScalarTolerance", d.scalar_tolerance)
                .with_constraint(ParameterConstraint::at_least(0.0)),
            FilterParameter::int("Random Seed", "RandomSeed", d.rng_seed)
                .with_constraint(ParameterConstraint::at_least(0.0)),
            FilterParameter::boolean(
                "Randomize Feature Ids",
                "RandomizeFeatureIds",
                d.randomize_feature_ids,
            ),
            FilterParameter::separator("Cell Data"),
            FilterParameter::array_path(
                "Scalar Array to Segment",
                d.scalar_array_path,
                Self::scalar_requirement(),
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
            "ScalarTolerance" => ParameterValue::Float(self.scalar_tolerance),
            "RandomSeed" => ParameterValue::Int(self.rng_seed),
            "RandomizeFeatureIds" => ParameterValue::Bool(self.randomize_feature_ids),
            "ScalarArrayPath" => ParameterValue::Path(self.scalar_array_path.clone()),
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
            "ScalarTolerance" => self.scalar_tolerance = value.into_f64(key)?,
            "RandomSeed" => self.rng_seed = value.into_i64(key)?,
            "RandomizeFeatureIds" => self.randomize_feature_ids = value.into_bool(key)?,
            "ScalarArrayPath" => self.scalar_array_path = value.into_path(key)?,
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
        let mut reqs = vec![Self::scalar_requirement()];
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

        let input = &self.scalar_array_path;
        Self::scalar_requirement().check(dca, input)?;
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
        let geom = segment_features::image_for_cells(dca, &self.scalar_array_path)?;
        let mask =
            segment_features::read_mask(dca, self.use_good_voxels, &self.good_voxels_array_path)?;
        let mut policy = ScalarGrouping::from_tagged(
            dca.tagged(&self.scalar_array_path)?,
            mask.as_deref(),
            self.scalar_tolerance,
        )?;
        let config = SegmentationConfig {
            rng_seed: self.rng_seed as u64,
            randomize_feature_ids: self.randomize_feature_ids,
        };
        let segmentation = SegmentationEngine::from_config(&config)
            .with_interrupt(ctx.interrupt_flag())
            .segment(&GridAdjacency::new(&geom, AxisMask::ALL), &mut policy)?;
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
