//! Geometry: the spatial/topological shape of a data container's data.
//!
//! Structured grids ([`ImageGeom`]) answer index/neighbor queries in closed
//! form. Meshes ([`VertexGeom`], [`EdgeGeom`], [`TriangleGeom`]) store explicit
//! connectivity and expose derived topology (vertex→element membership,
//! element neighbors, centroids, edges) that is computed on demand and dropped
//! whenever the connectivity it was derived from changes.
//!
//! Shared mesh behaviour lives in the composable [`mesh::SharedVertexList`] and
//! [`mesh::ElementTopology`] traits rather than in a type hierarchy.

pub mod cache;
pub mod image;
pub mod mesh;

use serde::{Deserialize, Serialize};

pub use cache::InvalidateCache;
pub use image::{AxisMask, ImageGeom};
pub use mesh::{EdgeGeom, ElementTopology, SharedVertexList, TriangleGeom, VertexGeom};

/// Data-only tag naming a geometry variant.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum GeometryKind {
    Image,
    Vertex,
    Edge,
    Triangle,
}

/// Geometry attached to a data container.
#[derive(Clone, Debug)]
pub enum Geometry {
    Image(ImageGeom),
    Vertex(VertexGeom),
    Edge(EdgeGeom),
    Triangle(TriangleGeom),
}

impl Geometry {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::Image(_) => GeometryKind::Image,
            Geometry::Vertex(_) => GeometryKind::Vertex,
            Geometry::Edge(_) => GeometryKind::Edge,
            Geometry::Triangle(_) => GeometryKind::Triangle,
        }
    }

    /// Number of elements: voxels, vertices, edges or triangles.
    pub fn number_of_elements(&self) -> usize {
        match self {
            Geometry::Image(g) => g.num_voxels(),
            Geometry::Vertex(g) => g.number_of_vertices(),
            Geometry::Edge(g) => g.number_of_elements(),
            Geometry::Triangle(g) => g.number_of_elements(),
        }
    }

    /// Typed borrow, `None` if the variant differs.
    pub fn as_variant<G: GeometryVariant>(&self) -> Option<&G> {
        G::from_geometry(self)
    }

    /// Typed mutable borrow, `None` if the variant differs.
    pub fn as_variant_mut<G: GeometryVariant>(&mut self) -> Option<&mut G> {
        G::from_geometry_mut(self)
    }
}

/// Maps a concrete geometry type to its [`Geometry`] variant.
pub trait GeometryVariant: Sized {
    const KIND: GeometryKind;

    fn from_geometry(geometry: &Geometry) -> Option<&Self>;
    fn from_geometry_mut(geometry: &mut Geometry) -> Option<&mut Self>;
}

macro_rules! impl_geometry_variant {
    ($ty:ty, $variant:ident) => {
        impl GeometryVariant for $ty {
            const KIND: GeometryKind = GeometryKind::$variant;

            fn from_geometry(geometry: &Geometry) -> Option<&Self> {
                match geometry {
                    Geometry::$variant(g) => Some(g),
                    _ => None,
                }
            }

            fn from_geometry_mut(geometry: &mut Geometry) -> Option<&mut Self> {
                match geometry {
                    Geometry::$variant(g) => Some(g),
                    _ => None,
                }
            }
        }

        impl From<$ty> for Geometry {
            fn from(g: $ty) -> Self {
                Geometry::$variant(g)
            }
        }
    };
}

impl_geometry_variant!(ImageGeom, Image);
impl_geometry_variant!(VertexGeom, Vertex);
impl_geometry_variant!(EdgeGeom, Edge);
impl_geometry_variant!(TriangleGeom, Triangle);
