//! ErodeDilateBadData: iterative morphological cleanup of a cell feature-id grid.
//!
//! A voxel is *bad* when its feature id is 0 and *good* when it is positive.
//! Each iteration first scans the whole grid against the state left by the
//! previous iteration and records, per voxel, the neighbor it will be copied
//! from. A separate commit pass then applies every recorded copy. The scan
//! never observes writes made by the same iteration.
//!
//! - [`Direction::Dilate`] grows good regions into bad voxels. A bad voxel
//!   takes the feature that is most common among its enabled good neighbors.
//! - [`Direction::Erode`] shrinks good regions. A good voxel touching a bad
//!   voxel is overwritten from it.
//!
//! Neighbors are the six face neighbors in the order `-Z,-Y,-X,+X,+Y,+Z`,
//! restricted to the enabled axes.

use log::debug;
use serde::{Deserialize, Serialize};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::data::attribute_matrix::{AttributeMatrix, AttributeMatrixKind};
use crate::data::data_container_array::DataContainerArray;
use crate::data::element::ElementType;
use crate::data::path::DataArrayPath;
use crate::filter::{
    DataArrayRequirement, Filter, FilterContext, FilterParameter, ParameterConstraint,
    ParameterValue,
};
use crate::geometry::GeometryKind;
use crate::geometry::image::{AxisMask, ImageGeom};
use crate::pipeline_error::PipelineError;

/// Which side of the good/bad boundary moves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Grow good regions into bad voxels.
    #[default]
    Dilate,
    /// Shrink good regions, growing the bad data.
    Erode,
}

impl Direction {
    pub const CHOICES: [&'static str; 2] = ["Dilate", "Erode"];

    fn from_choice(index: usize) -> Self {
        if index == 1 {
            Direction::Erode
        } else {
            Direction::Dilate
        }
    }

    fn as_choice(self) -> usize {
        match self {
            Direction::Dilate => 0,
            Direction::Erode => 1,
        }
    }
}

/// Source voxel of `index` for one dilate scan, if it is bad and has an
/// enabled good neighbor.
///
/// Keeps a running vote per feature id. Whenever a feature's count exceeds
/// the best count so far, the current neighbor becomes the source, so the
/// source belongs to the top-voted feature and ties go to the feature that
/// reached the top count first.
fn dilate_source(geom: &ImageGeom, ids: &[i32], axes: AxisMask, index: usize) -> Option<usize> {
    if ids[index] != 0 {
        return None;
    }
    let mut votes: [(i32, u32); 6] = [(0, 0); 6];
    let mut distinct = 0;
    let mut most = 0;
    let mut source = None;
    for neighbor in geom.face_neighbors(index, axes).into_iter().flatten() {
        let feature = ids[neighbor];
        if feature <= 0 {
            continue;
        }
        let slot = match votes[..distinct].iter().position(|&(f, _)| f == feature) {
            Some(slot) => slot,
            None => {
                votes[distinct] = (feature, 0);
                distinct += 1;
                distinct - 1
            }
        };
        votes[slot].1 += 1;
        if votes[slot].1 > most {
            most = votes[slot].1;
            source = Some(neighbor);
        }
    }
    source
}

/// Source voxel of `index` for one erode scan: the last enabled bad neighbor
/// of a good voxel.
fn erode_source(geom: &ImageGeom, ids: &[i32], axes: AxisMask, index: usize) -> Option<usize> {
    if ids[index] <= 0 {
        return None;
    }
    geom.face_neighbors(index, axes)
        .into_iter()
        .flatten()
        .rev()
        .find(|&neighbor| ids[neighbor] == 0)
}

/// Scan phase of one iteration: the copy source of every voxel, computed
/// against `ids` as given.
pub fn scan_sources(
    geom: &ImageGeom,
    ids: &[i32],
    direction: Direction,
    axes: AxisMask,
) -> Vec<Option<usize>> {
    let source = |index: usize| match direction {
        Direction::Dilate => dilate_source(geom, ids, axes, index),
        Direction::Erode => erode_source(geom, ids, axes, index),
    };
    #[cfg(feature = "rayon")]
    {
        (0..ids.len()).into_par_iter().map(source).collect()
    }
    #[cfg(not(feature = "rayon"))]
    {
        (0..ids.len()).map(source).collect()
    }
}

/// Commit phase of one iteration. Returns the number of voxels written.
///
/// With `replace_all` every array of `matrix` is copied from the source
/// tuple; otherwise only `feature_ids_name`.
pub fn commit_sources(
    matrix: &mut AttributeMatrix,
    feature_ids_name: &str,
    sources: &[Option<usize>],
    replace_all: bool,
) -> Result<usize, PipelineError> {
    let mut written = 0;
    if replace_all {
        for (dst, src) in sources.iter().enumerate() {
            if let Some(src) = *src {
                matrix.copy_tuple_all(src, dst)?;
                written += 1;
            }
        }
    } else {
        let ids = matrix.array_mut::<i32>(feature_ids_name)?.as_mut_slice();
        for (dst, src) in sources.iter().enumerate() {
            if let Some(src) = *src {
                ids[dst] = ids[src];
                written += 1;
            }
        }
    }
    Ok(written)
}

/// The Erode/Dilate Bad Data filter.
#[derive(Clone, Debug, PartialEq)]
pub struct ErodeDilateBadData {
    pub direction: Direction,
    pub num_iterations: i64,
    pub x_dir_on: bool,
    pub y_dir_on: bool,
    pub z_dir_on: bool,
    pub replace_bad_data: bool,
    pub feature_ids_array_path: DataArrayPath,
}

impl Default for ErodeDilateBadData {
    fn default() -> Self {
        Self {
            direction: Direction::Dilate,
            num_iterations: 1,
            x_dir_on: true,
            y_dir_on: true,
            z_dir_on: true,
            replace_bad_data: true,
            feature_ids_array_path: DataArrayPath::new(
                "ImageDataContainer",
                "CellData",
                "FeatureIds",
            ),
        }
    }
}

impl ErodeDilateBadData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn axes(&self) -> AxisMask {
        AxisMask::new(self.x_dir_on, self.y_dir_on, self.z_dir_on)
    }

    fn feature_ids_requirement() -> DataArrayRequirement {
        DataArrayRequirement::new(
            "FeatureIdsArrayPath",
            ElementType::Int32,
            1,
            AttributeMatrixKind::Cell,
            GeometryKind::Image,
        )
    }
}

impl Filter for ErodeDilateBadData {
    fn human_label(&self) -> &'static str {
        "Erode/Dilate Bad Data"
    }

    fn group_name(&self) -> &'static str {
        "Processing"
    }

    fn parameters(&self) -> Vec<FilterParameter> {
        let defaults = Self::default();
        vec![
            FilterParameter::choice(
                "Operation",
                "Direction",
                &Direction::CHOICES,
                defaults.direction.as_choice(),
            ),
            FilterParameter::int("Number of Iterations", "NumIterations", defaults.num_iterations)
                .with_constraint(ParameterConstraint::at_least(1.0)),
            FilterParameter::boolean("X Direction", "XDirOn", defaults.x_dir_on),
            FilterParameter::boolean("Y Direction", "YDirOn", defaults.y_dir_on),
            FilterParameter::boolean("Z Direction", "ZDirOn", defaults.z_dir_on),
            FilterParameter::boolean(
                "Replace Bad Data",
                "ReplaceBadData",
                defaults.replace_bad_data,
            ),
            FilterParameter::separator("Cell Data"),
            FilterParameter::array_path(
                "Feature Ids",
                defaults.feature_ids_array_path,
                Self::feature_ids_requirement(),
            ),
        ]
    }

    fn get_parameter(&self, key: &str) -> Result<ParameterValue, PipelineError> {
        Ok(match key {
            "Direction" => ParameterValue::Choice(self.direction.as_choice()),
            "NumIterations" => ParameterValue::Int(self.num_iterations),
            "XDirOn" => ParameterValue::Bool(self.x_dir_on),
            "YDirOn" => ParameterValue::Bool(self.y_dir_on),
            "ZDirOn" => ParameterValue::Bool(self.z_dir_on),
            "ReplaceBadData" => ParameterValue::Bool(self.replace_bad_data),
            "FeatureIdsArrayPath" => ParameterValue::Path(self.feature_ids_array_path.clone()),
            _ => return Err(PipelineError::InvalidKey(key.to_string())),
        })
    }

    fn set_parameter(&mut self, key: &str, value: ParameterValue) -> Result<(), PipelineError> {
        match key {
            "Direction" => {
                let choice = value.into_choice(key, Direction::CHOICES.len())?;
                self.direction = Direction::from_choice(choice);
            }
            "NumIterations" => self.num_iterations = value.into_i64(key)?,
            "XDirOn" => self.x_dir_on = value.into_bool(key)?,
            "YDirOn" => self.y_dir_on = value.into_bool(key)?,
            "ZDirOn" => self.z_dir_on = value.into_bool(key)?,
            "ReplaceBadData" => self.replace_bad_data = value.into_bool(key)?,
            "FeatureIdsArrayPath" => self.feature_ids_array_path = value.into_path(key)?,
            _ => return Err(PipelineError::InvalidKey(key.to_string())),
        }
        Ok(())
    }

    fn data_check(
        &mut self,
        dca: &mut DataContainerArray,
        _ctx: &mut FilterContext,
    ) -> Result<(), PipelineError> {
        self.check_constraints()?;
        let path = &self.feature_ids_array_path;
        Self::feature_ids_requirement().check(dca, path)?;
        let voxels = dca.geometry_as::<ImageGeom>(&path.container)?.num_voxels();
        let tuples = dca.matrix(path)?.num_tuples();
        if tuples != voxels {
            return Err(PipelineError::TupleCountMismatch {
                name: path.matrix_key(),
                expected: voxels,
                found: tuples,
            });
        }
        Ok(())
    }

    fn execute_unchecked(
        &mut self,
        dca: &mut DataContainerArray,
        ctx: &mut FilterContext,
    ) -> Result<(), PipelineError> {
        let path = self.feature_ids_array_path.clone();
        let geom = dca.geometry_as::<ImageGeom>(&path.container)?.clone();
        let axes = self.axes();

        for iteration in 0..self.num_iterations {
            ctx.check_canceled()?;
            let sources = {
                let ids = dca.array::<i32>(&path, 1)?;
                scan_sources(&geom, ids.as_slice(), self.direction, axes)
            };
            let matrix = dca.matrix_mut(&path)?;
            let written = commit_sources(matrix, &path.array, &sources, self.replace_bad_data)?;
            debug!(
                "{:?} iteration {}/{}: {} voxels written",
                self.direction,
                iteration + 1,
                self.num_iterations,
                written
            );
            if written == 0 {
                break;
            }
        }
        Ok(())
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
    fn dilate_prefers_majority_feature() {
        let g = ImageGeom::new([3, 3, 1]);
        #[rustfmt::skip]
        let ids = vec![
            0, 2, 0,
            7, 0, 2,
            0, 7, 0,
        ];
        // -Y: 2, -X: 7, +X: 2, +Y: 7 -> 2 reaches a count of 2 first
        let src = dilate_source(&g, &ids, AxisMask::ALL, 4);
        assert_eq!(src, Some(5));
    }

    #[test]
    fn dilate_ignores_disabled_axes() {
        let g = ImageGeom::new([3, 1, 1]);
        let ids = vec![4, 0, 4];
        assert_eq!(dilate_source(&g, &ids, AxisMask::new(false, true, true), 1), None);
        assert_eq!(dilate_source(&g, &ids, AxisMask::ALL, 1), Some(0));
    }

    #[test]
    fn erode_takes_last_bad_neighbor() {
        let g = ImageGeom::new([3, 1, 1]);
        let ids = vec![0, 9, 0];
        assert_eq!(erode_source(&g, &ids, AxisMask::ALL, 1), Some(2));
        assert_eq!(erode_source(&g, &ids, AxisMask::ALL, 0), None);
    }

    #[test]
    fn scan_sees_only_pre_iteration_state() {
        let g = ImageGeom::new([4, 1, 1]);
        let ids = vec![3, 0, 0, 0];
        let sources = scan_sources(&g, &ids, Direction::Dilate, AxisMask::ALL);
        assert_eq!(sources, vec![None, Some(0), None, None]);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let mut f = ErodeDilateBadData::new();
        assert!(matches!(
            f.set_parameter("Bogus", ParameterValue::Int(1)),
            Err(PipelineError::InvalidKey(_))
        ));
        f.set_parameter("Direction", ParameterValue::Choice(1)).unwrap();
        assert_eq!(f.direction, Direction::Erode);
    }
}
