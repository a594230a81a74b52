//! Neighbor relations consumed by the segmentation engine.

use crate::geometry::image::{AxisMask, ImageGeom};

/// Caller-defined neighbor relation over tuples `0..len()`.
pub trait Adjacency {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append the neighbors of `index` to `out`, in a deterministic order.
    fn neighbors(&self, index: usize, out: &mut Vec<usize>);
}

/// Face (6-)connectivity on an image grid, with per-axis gating.
#[derive(Clone, Debug)]
pub struct GridAdjacency {
    geom: ImageGeom,
    axes: AxisMask,
}

impl GridAdjacency {
    pub fn new(geom: &ImageGeom, axes: AxisMask) -> Self {
        Self {
            geom: geom.clone(),
            axes,
        }
    }
}

impl Adjacency for GridAdjacency {
    fn len(&self) -> usize {
        self.geom.num_voxels()
    }

    fn neighbors(&self, index: usize, out: &mut Vec<usize>) {
        out.extend(self.geom.face_neighbors(index, self.axes).into_iter().flatten());
    }
}

/// Explicit per-element neighbor lists, e.g. triangle edge-neighbors.
#[derive(Clone, Copy, Debug)]
pub struct ElementAdjacency<'a> {
    lists: &'a [Vec<usize>],
}

impl<'a> ElementAdjacency<'a> {
    pub fn new(lists: &'a [Vec<usize>]) -> Self {
        Self { lists }
    }
}

impl Adjacency for ElementAdjacency<'_> {
    fn len(&self) -> usize {
        self.lists.len()
    }

    fn neighbors(&self, index: usize, out: &mut Vec<usize>) {
        if let Some(list) = self.lists.get(index) {
            out.extend_from_slice(list);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_adjacency_respects_axes() {
        let g = ImageGeom::new([2, 2, 2]);
        let adj = GridAdjacency::new(&g, AxisMask::new(true, true, false));
        let mut out = Vec::new();
        adj.neighbors(0, &mut out);
        assert_eq!(out, vec![1, 2]);
    }

    #[test]
    fn element_adjacency_ignores_out_of_range() {
        let lists = vec![vec![1], vec![0]];
        let adj = ElementAdjacency::new(&lists);
        let mut out = Vec::new();
        adj.neighbors(5, &mut out);
        assert!(out.is_empty());
        adj.neighbors(0, &mut out);
        assert_eq!(out, vec![1]);
    }
}
