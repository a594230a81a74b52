//! Invalidation of derived mesh topology.

use super::Geometry;

/// Geometries that hold derived arrays (vertex membership, element neighbors,
/// centroids, edge lists) computed from their connectivity.
pub trait InvalidateCache {
    /// Drop every derived array; the next `find_*` call recomputes it.
    fn invalidate_cache(&mut self);
}

/// Image grids and point clouds derive nothing, so only meshes do work here.
impl InvalidateCache for Geometry {
    fn invalidate_cache(&mut self) {
        match self {
            Geometry::Image(_) | Geometry::Vertex(_) => {}
            Geometry::Edge(g) => g.invalidate_cache(),
            Geometry::Triangle(g) => g.invalidate_cache(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ImageGeom, TriangleGeom};

    #[test]
    fn geometry_forwards_to_the_mesh() {
        let tris = TriangleGeom::new(
            vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![[0, 1, 2]],
        )
        .unwrap();
        tris.find_element_centroids();
        let mut geom = Geometry::from(tris);
        geom.invalidate_cache();
        let Geometry::Triangle(tris) = &geom else {
            panic!("variant changed");
        };
        assert!(tris.element_centroids().is_none());

        let mut image = Geometry::from(ImageGeom::new([2, 2, 2]));
        image.invalidate_cache();
        assert_eq!(image.number_of_elements(), 8);
    }
}
