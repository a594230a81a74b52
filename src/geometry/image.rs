//! Structured 3D image (voxel) grid.

use serde::{Deserialize, Serialize};

/// Per-axis on/off switches for neighbor queries.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct AxisMask {
    pub x: bool,
    pub y: bool,
    pub z: bool,
}

impl AxisMask {
    pub const ALL: AxisMask = AxisMask {
        x: true,
        y: true,
        z: true,
    };

    pub fn new(x: bool, y: bool, z: bool) -> Self {
        Self { x, y, z }
    }
}

impl Default for AxisMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// The six face directions, in increasing linear-offset order.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FaceDir {
    MinusZ,
    MinusY,
    MinusX,
    PlusX,
    PlusY,
    PlusZ,
}

impl FaceDir {
    pub const ALL: [FaceDir; 6] = [
        FaceDir::MinusZ,
        FaceDir::MinusY,
        FaceDir::MinusX,
        FaceDir::PlusX,
        FaceDir::PlusY,
        FaceDir::PlusZ,
    ];
}

/// Up to six face neighbors, indexed in [`FaceDir::ALL`] order.
pub type FaceNeighbors = [Option<usize>; 6];

/// Regular grid of `dims[0] * dims[1] * dims[2]` voxels, x fastest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageGeom {
    dims: [usize; 3],
    spacing: [f32; 3],
    origin: [f32; 3],
}

impl ImageGeom {
    /// Unit spacing, origin at zero.
    pub fn new(dims: [usize; 3]) -> Self {
        Self {
            dims,
            spacing: [1.0; 3],
            origin: [0.0; 3],
        }
    }

    pub fn with_spacing(mut self, spacing: [f32; 3]) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_origin(mut self, origin: [f32; 3]) -> Self {
        self.origin = origin;
        self
    }

    #[inline]
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    #[inline]
    pub fn spacing(&self) -> [f32; 3] {
        self.spacing
    }

    #[inline]
    pub fn origin(&self) -> [f32; 3] {
        self.origin
    }

    /// Tuple dims of a cell attribute matrix on this grid.
    pub fn cell_tuple_dims(&self) -> Vec<usize> {
        self.dims.to_vec()
    }

    #[inline]
    pub fn num_voxels(&self) -> usize {
        self.dims.iter().product()
    }

    /// Linear index of voxel `(i, j, k)`.
    #[inline]
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        (k * self.dims[1] + j) * self.dims[0] + i
    }

    /// Inverse of [`index`](Self::index).
    #[inline]
    pub fn ijk(&self, index: usize) -> [usize; 3] {
        let plane = self.dims[0] * self.dims[1];
        let k = index / plane;
        let rem = index % plane;
        [rem % self.dims[0], rem / self.dims[0], k]
    }

    /// Physical coordinates of the voxel center.
    pub fn voxel_center(&self, index: usize) -> [f32; 3] {
        let ijk = self.ijk(index);
        std::array::from_fn(|a| self.origin[a] + (ijk[a] as f32 + 0.5) * self.spacing[a])
    }

    /// Face neighbors of `index` in [`FaceDir::ALL`] order.
    ///
    /// A neighbor is `None` when it lies outside the grid (no wrapping) or when
    /// its axis is disabled in `axes`.
    pub fn face_neighbors(&self, index: usize, axes: AxisMask) -> FaceNeighbors {
        let [i, j, k] = self.ijk(index);
        let [dx, dy, _] = self.dims;
        let plane = dx * dy;
        let mut out = [None; 6];
        for (slot, dir) in out.iter_mut().zip(FaceDir::ALL) {
            *slot = match dir {
                FaceDir::MinusZ if axes.z && k > 0 => Some(index - plane),
                FaceDir::MinusY if axes.y && j > 0 => Some(index - dx),
                FaceDir::MinusX if axes.x && i > 0 => Some(index - 1),
                FaceDir::PlusX if axes.x && i + 1 < self.dims[0] => Some(index + 1),
                FaceDir::PlusY if axes.y && j + 1 < self.dims[1] => Some(index + dx),
                FaceDir::PlusZ if axes.z && k + 1 < self.dims[2] => Some(index + plane),
                _ => None,
            };
        }
        out
    }
}
