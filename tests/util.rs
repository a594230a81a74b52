#![allow(dead_code)]
use micro_pipeline::prelude::*;

pub const DC: &str = "ImageDataContainer";
pub const CELLS: &str = "CellData";

pub fn cell_path(array: &str) -> DataArrayPath {
    DataArrayPath::new(DC, CELLS, array)
}

/// Image container with an empty cell matrix sized to `dims`.
pub fn image_store(dims: [usize; 3]) -> DataContainerArray {
    let mut dca = DataContainerArray::new();
    let dc = dca
        .add_container(DataContainer::with_geometry(DC, ImageGeom::new(dims)))
        .unwrap();
    dc.create_matrix(CELLS, &dims, AttributeMatrixKind::Cell)
        .unwrap();
    dca
}

/// Image store holding `FeatureIds` with the given values.
pub fn store_with_ids(dims: [usize; 3], ids: &[i32]) -> DataContainerArray {
    let mut dca = image_store(dims);
    dca.create_array::<i32>(&cell_path("FeatureIds"), 1, &dims, false)
        .unwrap()
        .as_mut_slice()
        .copy_from_slice(ids);
    dca
}

pub fn ids(dca: &DataContainerArray) -> Vec<i32> {
    dca.array::<i32>(&cell_path("FeatureIds"), 1)
        .unwrap()
        .as_slice()
        .to_vec()
}

/// Assert vec is a permutation of another vec (order-agnostic).
pub fn assert_permutation<T: Ord + Copy + std::fmt::Debug>(got: &[T], want: &[T]) {
    let mut a = got.to_vec();
    a.sort_unstable();
    let mut b = want.to_vec();
    b.sort_unstable();
    assert_eq!(a, b, "not a permutation\n got={:?}\nwant={:?}", got, want);
}
