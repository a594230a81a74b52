//! Unstructured geometries sharing a vertex list.
//!
//! Derived topology is held in `OnceCell`s: the accessor without prefix
//! (`element_neighbors`) returns `None` until the matching `find_*` call has
//! computed it, and `delete_*` discards it. Any connectivity mutation clears
//! every derived array via [`InvalidateCache`], so a derived array is either
//! absent or consistent with the current topology.

use std::collections::BTreeMap;

use itertools::Itertools;
use once_cell::sync::OnceCell;

use crate::geometry::cache::InvalidateCache;
use crate::pipeline_error::PipelineError;

/// Access to a shared vertex coordinate list.
pub trait SharedVertexList {
    fn vertices(&self) -> &[[f32; 3]];

    fn number_of_vertices(&self) -> usize {
        self.vertices().len()
    }

    fn coords(&self, vertex: usize) -> Option<[f32; 3]> {
        self.vertices().get(vertex).copied()
    }
}

/// Fixed-arity elements defined by vertex indices.
pub trait ElementTopology: SharedVertexList {
    /// Vertices per element (2 for edges, 3 for triangles). Neighbors share
    /// one fewer than this.
    const VERTICES_PER_ELEMENT: usize;

    fn number_of_elements(&self) -> usize;

    fn element_vertices(&self, element: usize) -> &[usize];
}

/// For each vertex, the sorted list of elements that use it.
pub fn compute_elements_containing_vert<G: ElementTopology>(geom: &G) -> Vec<Vec<usize>> {
    let mut out = vec![Vec::new(); geom.number_of_vertices()];
    for e in 0..geom.number_of_elements() {
        for &v in geom.element_vertices(e) {
            out[v].push(e);
        }
    }
    for list in &mut out {
        list.dedup();
    }
    out
}

/// For each element, the sorted list of other elements sharing a facet with
/// it, i.e. at least `VERTICES_PER_ELEMENT - 1` distinct vertices.
///
/// Repeated vertices inside a degenerate element count once.
pub fn compute_element_neighbors<G: ElementTopology>(
    geom: &G,
    containing: &[Vec<usize>],
) -> Vec<Vec<usize>> {
    let shared = G::VERTICES_PER_ELEMENT.saturating_sub(1).max(1);
    let mut out = Vec::with_capacity(geom.number_of_elements());
    for e in 0..geom.number_of_elements() {
        let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
        for &v in geom.element_vertices(e).iter().sorted_unstable().dedup() {
            for &other in &containing[v] {
                if other != e {
                    *counts.entry(other).or_default() += 1;
                }
            }
        }
        out.push(
            counts
                .into_iter()
                .filter_map(|(other, n)| (n >= shared).then_some(other))
                .collect(),
        );
    }
    out
}

/// Arithmetic mean of each element's vertex coordinates.
pub fn compute_element_centroids<G: ElementTopology>(geom: &G) -> Vec<[f32; 3]> {
    let verts = geom.vertices();
    (0..geom.number_of_elements())
        .map(|e| {
            let ids = geom.element_vertices(e);
            let mut c = [0.0f32; 3];
            for &v in ids {
                for a in 0..3 {
                    c[a] += verts[v][a];
                }
            }
            let n = ids.len().max(1) as f32;
            c.map(|x| x / n)
        })
        .collect()
}

fn check_connectivity(
    elements: &[impl AsRef<[usize]>],
    num_vertices: usize,
) -> Result<(), PipelineError> {
    for (e, verts) in elements.iter().enumerate() {
        if let Some(&v) = verts.as_ref().iter().find(|&&v| v >= num_vertices) {
            return Err(PipelineError::InvalidTopology(format!(
                "element {e} references vertex {v} but only {num_vertices} vertices exist"
            )));
        }
    }
    Ok(())
}

/// Point cloud.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VertexGeom {
    vertices: Vec<[f32; 3]>,
}

impl VertexGeom {
    pub fn new(vertices: Vec<[f32; 3]>) -> Self {
        Self { vertices }
    }

    pub fn set_coords(&mut self, vertex: usize, coords: [f32; 3]) -> Result<(), PipelineError> {
        let len = self.vertices.len();
        let slot = self
            .vertices
            .get_mut(vertex)
            .ok_or(PipelineError::IndexOutOfBounds {
                name: "vertices".to_string(),
                index: vertex,
                len,
            })?;
        *slot = coords;
        Ok(())
    }
}

impl SharedVertexList for VertexGeom {
    fn vertices(&self) -> &[[f32; 3]] {
        &self.vertices
    }
}

/// Line-segment mesh.
#[derive(Clone, Debug, Default)]
pub struct EdgeGeom {
    vertices: Vec<[f32; 3]>,
    edges: Vec<[usize; 2]>,
    elements_containing_vert: OnceCell<Vec<Vec<usize>>>,
    element_neighbors: OnceCell<Vec<Vec<usize>>>,
}

impl EdgeGeom {
    pub fn new(vertices: Vec<[f32; 3]>, edges: Vec<[usize; 2]>) -> Result<Self, PipelineError> {
        check_connectivity(&edges, vertices.len())?;
        Ok(Self {
            vertices,
            edges,
            ..Default::default()
        })
    }

    pub fn edges(&self) -> &[[usize; 2]] {
        &self.edges
    }

    pub fn find_elements_containing_vert(&self) -> &[Vec<usize>] {
        self.elements_containing_vert
            .get_or_init(|| compute_elements_containing_vert(self))
    }

    pub fn elements_containing_vert(&self) -> Option<&[Vec<usize>]> {
        self.elements_containing_vert.get().map(Vec::as_slice)
    }

    pub fn delete_elements_containing_vert(&mut self) {
        self.elements_containing_vert.take();
    }

    /// Edges sharing a vertex with each edge.
    pub fn find_element_neighbors(&self) -> &[Vec<usize>] {
        self.element_neighbors.get_or_init(|| {
            let containing = self.find_elements_containing_vert();
            compute_element_neighbors(self, containing)
        })
    }

    pub fn element_neighbors(&self) -> Option<&[Vec<usize>]> {
        self.element_neighbors.get().map(Vec::as_slice)
    }

    pub fn delete_element_neighbors(&mut self) {
        self.element_neighbors.take();
    }
}

impl SharedVertexList for EdgeGeom {
    fn vertices(&self) -> &[[f32; 3]] {
        &self.vertices
    }
}

impl ElementTopology for EdgeGeom {
    const VERTICES_PER_ELEMENT: usize = 2;

    fn number_of_elements(&self) -> usize {
        self.edges.len()
    }

    fn element_vertices(&self, element: usize) -> &[usize] {
        &self.edges[element]
    }
}

impl InvalidateCache for EdgeGeom {
    fn invalidate_cache(&mut self) {
        self.delete_elements_containing_vert();
        self.delete_element_neighbors();
    }
}

/// Triangle surface mesh.
///
/// # Derived topology
///
/// | query | meaning |
/// |---|---|
/// | elements containing vert | triangles using each vertex |
/// | element neighbors | triangles sharing an edge (two vertices) |
/// | element centroids | mean of the three corner coordinates |
/// | edges | unique undirected edges, `[lo, hi]`, sorted |
/// | unshared edges | edges used by exactly one triangle (the boundary) |
#[derive(Clone, Debug, Default)]
pub struct TriangleGeom {
    vertices: Vec<[f32; 3]>,
    triangles: Vec<[usize; 3]>,
    elements_containing_vert: OnceCell<Vec<Vec<usize>>>,
    element_neighbors: OnceCell<Vec<Vec<usize>>>,
    element_centroids: OnceCell<Vec<[f32; 3]>>,
    edges: OnceCell<Vec<[usize; 2]>>,
    unshared_edges: OnceCell<Vec<[usize; 2]>>,
}

impl TriangleGeom {
    pub fn new(
        vertices: Vec<[f32; 3]>,
        triangles: Vec<[usize; 3]>,
    ) -> Result<Self, PipelineError> {
        check_connectivity(&triangles, vertices.len())?;
        Ok(Self {
            vertices,
            triangles,
            ..Default::default()
        })
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    pub fn number_of_tris(&self) -> usize {
        self.triangles.len()
    }

    pub fn verts_at_tri(&self, tri: usize) -> Option<[usize; 3]> {
        self.triangles.get(tri).copied()
    }

    /// Corner coordinates of triangle `tri`.
    pub fn vert_coords_at_tri(&self, tri: usize) -> Option<[[f32; 3]; 3]> {
        let [a, b, c] = self.verts_at_tri(tri)?;
        Some([self.vertices[a], self.vertices[b], self.vertices[c]])
    }

    /// Replace the whole connectivity.
    pub fn set_triangles(&mut self, triangles: Vec<[usize; 3]>) -> Result<(), PipelineError> {
        check_connectivity(&triangles, self.vertices.len())?;
        self.triangles = triangles;
        self.invalidate_cache();
        Ok(())
    }

    pub fn set_verts_at_tri(&mut self, tri: usize, verts: [usize; 3]) -> Result<(), PipelineError> {
        check_connectivity(&[verts], self.vertices.len())?;
        let len = self.triangles.len();
        let slot = self
            .triangles
            .get_mut(tri)
            .ok_or(PipelineError::IndexOutOfBounds {
                name: "triangles".to_string(),
                index: tri,
                len,
            })?;
        *slot = verts;
        self.invalidate_cache();
        Ok(())
    }

    /// Truncate the triangle list or pad it with degenerate `[0, 0, 0]` triangles.
    pub fn resize_tri_list(&mut self, tris: usize) -> Result<(), PipelineError> {
        if tris > self.triangles.len() && self.vertices.is_empty() {
            return Err(PipelineError::InvalidTopology(
                "cannot pad triangles on a mesh without vertices".to_string(),
            ));
        }
        self.triangles.resize(tris, [0, 0, 0]);
        self.invalidate_cache();
        Ok(())
    }

    /// Move one vertex; only geometric caches (centroids) are dropped.
    pub fn set_coords(&mut self, vertex: usize, coords: [f32; 3]) -> Result<(), PipelineError> {
        let len = self.vertices.len();
        let slot = self
            .vertices
            .get_mut(vertex)
            .ok_or(PipelineError::IndexOutOfBounds {
                name: "vertices".to_string(),
                index: vertex,
                len,
            })?;
        *slot = coords;
        self.delete_element_centroids();
        Ok(())
    }

    pub fn find_elements_containing_vert(&self) -> &[Vec<usize>] {
        self.elements_containing_vert
            .get_or_init(|| compute_elements_containing_vert(self))
    }

    pub fn elements_containing_vert(&self) -> Option<&[Vec<usize>]> {
        self.elements_containing_vert.get().map(Vec::as_slice)
    }

    pub fn delete_elements_containing_vert(&mut self) {
        self.elements_containing_vert.take();
    }

    pub fn find_element_neighbors(&self) -> &[Vec<usize>] {
        self.element_neighbors.get_or_init(|| {
            let containing = self.find_elements_containing_vert();
            compute_element_neighbors(self, containing)
        })
    }

    pub fn element_neighbors(&self) -> Option<&[Vec<usize>]> {
        self.element_neighbors.get().map(Vec::as_slice)
    }

    pub fn delete_element_neighbors(&mut self) {
        self.element_neighbors.take();
    }

    pub fn find_element_centroids(&self) -> &[[f32; 3]] {
        self.element_centroids
            .get_or_init(|| compute_element_centroids(self))
    }

    pub fn element_centroids(&self) -> Option<&[[f32; 3]]> {
        self.element_centroids.get().map(Vec::as_slice)
    }

    pub fn delete_element_centroids(&mut self) {
        self.element_centroids.take();
    }

    fn edge_use_counts(&self) -> BTreeMap<[usize; 2], usize> {
        let mut counts = BTreeMap::new();
        for &[a, b, c] in &self.triangles {
            for (u, v) in [(a, b), (b, c), (c, a)] {
                if u == v {
                    continue;
                }
                *counts.entry([u.min(v), u.max(v)]).or_default() += 1;
            }
        }
        counts
    }

    pub fn find_edges(&self) -> &[[usize; 2]] {
        self.edges
            .get_or_init(|| self.edge_use_counts().into_keys().collect())
    }

    pub fn edges(&self) -> Option<&[[usize; 2]]> {
        self.edges.get().map(Vec::as_slice)
    }

    pub fn delete_edges(&mut self) {
        self.edges.take();
    }

    pub fn find_unshared_edges(&self) -> &[[usize; 2]] {
        self.unshared_edges.get_or_init(|| {
            self.edge_use_counts()
                .into_iter()
                .filter_map(|(edge, n)| (n == 1).then_some(edge))
                .collect()
        })
    }

    pub fn unshared_edges(&self) -> Option<&[[usize; 2]]> {
        self.unshared_edges.get().map(Vec::as_slice)
    }

    pub fn delete_unshared_edges(&mut self) {
        self.unshared_edges.take();
    }
}

impl SharedVertexList for TriangleGeom {
    fn vertices(&self) -> &[[f32; 3]] {
        &self.vertices
    }
}

impl ElementTopology for TriangleGeom {
    const VERTICES_PER_ELEMENT: usize = 3;

    fn number_of_elements(&self) -> usize {
        self.triangles.len()
    }

    fn element_vertices(&self, element: usize) -> &[usize] {
        &self.triangles[element]
    }
}

impl InvalidateCache for TriangleGeom {
    fn invalidate_cache(&mut self) {
        self.delete_elements_containing_vert();
        self.delete_element_neighbors();
        self.delete_element_centroids();
        self.delete_edges();
        self.delete_unshared_edges();
    }
}
