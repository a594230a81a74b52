mod util;
use micro_pipeline::prelude::*;
use proptest::prelude::*;
use util::*;

#[test]
fn tuples_are_contiguous_component_runs() {
    let mut a = DataArray::<f32>::from_vec("Euler", 3, (0..12).map(|v| v as f32).collect())
        .unwrap();
    assert_eq!(a.tuple_count(), 4);
    assert_eq!(a.tuple(2).unwrap(), &[6.0, 7.0, 8.0]);
    a.copy_tuple(0, 3).unwrap();
    assert_eq!(a.tuple(3).unwrap(), &[0.0, 1.0, 2.0]);
    assert!(a.tuple(4).is_err());
    assert_eq!(a.byte_len(), 12 * 4);

    a.resize_tuples(2);
    assert_eq!(a.as_slice(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    a.resize_tuples(3);
    assert_eq!(a.tuple(2).unwrap(), &[0.0, 0.0, 0.0]);
}

#[test]
fn flat_buffer_must_divide_into_tuples() {
    assert!(matches!(
        DataArray::<i32>::from_vec("bad", 3, vec![1, 2, 3, 4]),
        Err(PipelineError::TupleLengthMismatch { .. })
    ));
    assert!(matches!(
        DataArray::<i32>::new("bad", 4, 0),
        Err(PipelineError::ZeroComponents(_))
    ));
}

#[test]
fn tagged_arrays_downcast_only_to_their_own_type() {
    let tagged: TaggedArray = DataArray::<u8>::from_vec("Phases", 1, vec![1, 2])
        .unwrap()
        .into();
    assert_eq!(tagged.element_type(), ElementType::UInt8);
    assert!(tagged.downcast::<u8>().is_some());
    assert!(tagged.downcast::<i8>().is_none());
    assert_eq!(tagged.value_as_f64(1, 0), Some(2.0));
    assert_eq!(tagged.value_as_f64(2, 0), None);
}

#[test]
fn matrix_rejects_wrong_tuple_count_and_duplicate_names() {
    let mut am = AttributeMatrix::new("CellData", &[2, 2, 1], AttributeMatrixKind::Cell);
    let short = DataArray::<i32>::new("Ids", 3, 1).unwrap();
    assert!(matches!(
        am.insert_array(short.into(), false),
        Err(PipelineError::TupleCountMismatch { expected: 4, found: 3, .. })
    ));
    am.create_array::<i32>("Ids", 1, false).unwrap();
    assert!(matches!(
        am.create_array::<f64>("Ids", 1, false),
        Err(PipelineError::NameCollision(_))
    ));
    // overwrite replaces the type
    am.create_array::<f64>("Ids", 1, true).unwrap();
    assert!(am.array::<i32>("Ids").is_err());
}

#[test]
fn copy_tuple_all_keeps_records_coherent() {
    let mut am = AttributeMatrix::new("CellData", &[3], AttributeMatrixKind::Cell);
    am.insert_array(DataArray::from_vec("A", 1, vec![1i32, 2, 3]).unwrap().into(), false)
        .unwrap();
    am.insert_array(
        DataArray::from_vec("B", 2, vec![0.5f64, 0.6, 1.5, 1.6, 2.5, 2.6])
            .unwrap()
            .into(),
        false,
    )
    .unwrap();
    am.copy_tuple_all(2, 0).unwrap();
    assert_eq!(am.array::<i32>("A").unwrap().as_slice(), &[3, 2, 3]);
    assert_eq!(am.array::<f64>("B").unwrap().tuple(0).unwrap(), &[2.5, 2.6]);
    assert!(matches!(
        am.copy_tuple_all(0, 3),
        Err(PipelineError::IndexOutOfBounds { index: 3, len: 3, .. })
    ));
}

#[test]
fn resize_applies_to_every_array() {
    let mut am = AttributeMatrix::new("CellFeatureData", &[1], AttributeMatrixKind::CellFeature);
    am.create_array::<bool>("Active", 1, false).unwrap();
    am.create_array::<f32>("Centroids", 3, false).unwrap();
    am.resize_attribute_arrays(&[5]);
    assert_eq!(am.num_tuples(), 5);
    assert!(am.iter().all(|a| a.tuple_count() == 5));
    assert_eq!(am.array_names(), vec!["Active".to_string(), "Centroids".to_string()]);
}

#[test]
fn store_lookups_report_the_missing_level() {
    let dca = image_store([2, 2, 1]);
    assert!(matches!(
        dca.tagged(&DataArrayPath::new("Nope", CELLS, "X")),
        Err(PipelineError::ContainerNotFound(_))
    ));
    assert!(matches!(
        dca.tagged(&DataArrayPath::new(DC, "Nope", "X")),
        Err(PipelineError::MatrixNotFound(_))
    ));
    assert!(matches!(
        dca.tagged(&cell_path("X")),
        Err(PipelineError::ArrayNotFound(_))
    ));
}

#[test]
fn typed_access_checks_type_and_components() {
    let mut dca = image_store([2, 2, 1]);
    dca.create_array::<f32>(&cell_path("Vec"), 3, &[4], false)
        .unwrap();
    assert!(matches!(
        dca.array::<f64>(&cell_path("Vec"), 3),
        Err(PipelineError::TypeMismatch { expected: ElementType::Float64, .. })
    ));
    assert!(matches!(
        dca.array::<f32>(&cell_path("Vec"), 1),
        Err(PipelineError::ComponentMismatch { expected: 1, found: 3, .. })
    ));
    assert!(matches!(
        dca.create_array::<f32>(&cell_path("Other"), 1, &[5], false),
        Err(PipelineError::TupleCountMismatch { .. })
    ));
}

#[test]
fn requirement_checks_follow_geometry_then_shape() {
    let mut dca = image_store([2, 1, 1]);
    dca.create_array::<i32>(&cell_path("FeatureIds"), 1, &[2], false)
        .unwrap();
    let req = DataArrayRequirement::new(
        "FeatureIdsArrayPath",
        ElementType::Int32,
        1,
        AttributeMatrixKind::Cell,
        GeometryKind::Image,
    );
    dca.check_requirement(&cell_path("FeatureIds"), &req).unwrap();

    let wants_triangles = DataArrayRequirement {
        geometry_kinds: vec![GeometryKind::Triangle],
        ..req.clone()
    };
    assert!(matches!(
        dca.check_requirement(&cell_path("FeatureIds"), &wants_triangles),
        Err(PipelineError::GeometryMismatch { .. })
    ));

    let wants_floats = req.with_element_types(&[ElementType::Float32, ElementType::Float64]);
    assert_eq!(
        dca.check_requirement(&cell_path("FeatureIds"), &wants_floats)
            .unwrap_err()
            .category(),
        ErrorCategory::TypeMismatch
    );
}

#[test]
fn output_declarations_are_reused() {
    let mut dca = image_store([3, 1, 1]);
    let path = cell_path("Out");
    dca.create_output_array::<u32>(&path, 1).unwrap().fill(7);
    // a repeat declaration keeps the existing array
    let again = dca.create_output_array::<u32>(&path, 1).unwrap();
    assert_eq!(again.as_slice(), &[7, 7, 7]);
    assert!(matches!(
        dca.create_output_array::<i64>(&path, 1),
        Err(PipelineError::NameCollision(_))
    ));

    let feature = DataArrayPath::new(DC, "CellFeatureData", "Active");
    dca.create_output_matrix(&feature, &[0], AttributeMatrixKind::CellFeature)
        .unwrap();
    dca.create_output_array::<bool>(&feature, 1).unwrap();
    dca.matrix_mut(&feature).unwrap().resize_attribute_arrays(&[4]);
    // the matrix holding only its own output is reused as-is
    dca.create_output_matrix(&feature, &[0], AttributeMatrixKind::CellFeature)
        .unwrap();
    assert_eq!(dca.matrix(&feature).unwrap().num_tuples(), 4);
    assert!(matches!(
        dca.create_output_matrix(&feature, &[4], AttributeMatrixKind::Cell),
        Err(PipelineError::NameCollision(_))
    ));

    // a foreign array makes the matrix off limits
    dca.create_array::<f32>(&feature.with_array("AvgValue"), 1, &[4], false)
        .unwrap();
    assert!(matches!(
        dca.create_output_matrix(&feature, &[0], AttributeMatrixKind::CellFeature),
        Err(PipelineError::NameCollision(_))
    ));
    assert_eq!(dca.matrix(&feature).unwrap().num_tuples(), 4);
}

fn part() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 _.-]{1,12}"
}

proptest! {
    #[test]
    fn path_string_form_round_trips(c in part(), m in part(), a in part()) {
        let path = DataArrayPath::new(&c, &m, &a);
        prop_assert!(path.is_valid());
        let parsed: DataArrayPath = path.to_string().parse().unwrap();
        prop_assert_eq!(parsed, path);
    }
}
