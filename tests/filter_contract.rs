mod util;
use micro_pipeline::filter::copy_parameters;
use micro_pipeline::prelude::*;
use util::*;

fn all_filters() -> Vec<Box<dyn Filter>> {
    vec![
        Box::new(ErodeDilateBadData::new()),
        Box::new(VectorSegmentFeatures::new()),
        Box::new(ScalarSegmentFeatures::new()),
        Box::new(CreateDataArray::default()),
    ]
}

fn store_names(dca: &DataContainerArray) -> Vec<String> {
    let mut names = Vec::new();
    for dc in dca.containers() {
        for am in dc.matrices() {
            for name in am.array_names() {
                names.push(format!("{}|{}|{} x{}", dc.name(), am.name(), name, am.num_tuples()));
            }
        }
    }
    names
}

#[test]
fn validation_is_idempotent() {
    let mut dca = image_store([4, 2, 1]);
    dca.create_array::<f32>(&cell_path("VectorData"), 3, &[4, 2, 1], false)
        .unwrap();
    let mut f = VectorSegmentFeatures::new();

    let mut first = FilterContext::new(f.human_label());
    f.preflight(&mut dca, &mut first).unwrap();
    let after_first = store_names(&dca);

    let mut second = FilterContext::new(f.human_label());
    f.preflight(&mut dca, &mut second).unwrap();
    assert_eq!(first.messages(), second.messages());
    assert_eq!(after_first, store_names(&dca));
    assert!(after_first.iter().any(|n| n.contains("CellFeatureData|Active x0")));
}

#[test]
fn failing_validation_touches_nothing() {
    let mut dca = image_store([4, 2, 1]);
    // wrong component count for the vector input
    dca.create_array::<f32>(&cell_path("VectorData"), 1, &[4, 2, 1], false)
        .unwrap();
    let before = store_names(&dca);
    let mut f = VectorSegmentFeatures::new();
    let mut ctx = FilterContext::new(f.human_label());
    let err = f.execute(&mut dca, &mut ctx).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::ComponentMismatch);
    assert_eq!(ctx.error_code(), err.code());
    assert!(!ctx.passed_validation());
    assert_eq!(before, store_names(&dca));
}

#[test]
fn every_parameter_round_trips_through_get_and_set() {
    for mut filter in all_filters() {
        for param in filter.parameters() {
            if matches!(param.kind, ParameterKind::Separator) {
                continue;
            }
            let value = filter.get_parameter(&param.property_key).unwrap();
            assert_eq!(value, param.default, "{}", param.property_key);
            filter
                .set_parameter(&param.property_key, value.clone())
                .unwrap();
            assert_eq!(filter.get_parameter(&param.property_key).unwrap(), value);
        }
        assert!(matches!(
            filter.get_parameter("NoSuchKey"),
            Err(PipelineError::InvalidKey(_))
        ));
    }
}

#[test]
fn wrong_value_kind_is_rejected() {
    let mut f = ErodeDilateBadData::new();
    assert!(matches!(
        f.set_parameter("XDirOn", ParameterValue::Int(1)),
        Err(PipelineError::InvalidValue { .. })
    ));
    assert!(matches!(
        f.set_parameter("Direction", ParameterValue::Choice(2)),
        Err(PipelineError::InvalidValue { .. })
    ));
}

#[test]
fn new_instance_optionally_carries_parameters() {
    let mut f = ErodeDilateBadData::new();
    f.set_parameter("NumIterations", ParameterValue::Int(4))
        .unwrap();
    let copy = f.new_instance(true);
    assert_eq!(copy.get_parameter("NumIterations").unwrap(), ParameterValue::Int(4));
    let fresh = f.new_instance(false);
    assert_eq!(fresh.get_parameter("NumIterations").unwrap(), ParameterValue::Int(1));

    let mut target = ErodeDilateBadData::new();
    copy_parameters(&f, &mut target).unwrap();
    assert_eq!(target, f);
}

#[test]
fn requirements_are_inspectable_as_json() {
    let f = ErodeDilateBadData::new();
    let reqs = f.requirements();
    assert_eq!(reqs.len(), 1);
    let json = serde_json::to_value(&reqs[0]).unwrap();
    assert_eq!(json["property_key"], "FeatureIdsArrayPath");
    assert_eq!(json["element_types"][0], "int32");
    assert_eq!(json["components"], 1);
    assert_eq!(json["matrix_kinds"][0], "Cell");
    assert_eq!(json["geometry_kinds"][0], "Image");

    let params = serde_json::to_string(&f.parameters()).unwrap();
    let back: Vec<FilterParameter> = serde_json::from_str(&params).unwrap();
    assert_eq!(back, f.parameters());
}

#[test]
fn mask_requirement_appears_only_when_enabled() {
    let mut f = ScalarSegmentFeatures::new();
    assert_eq!(f.requirements().len(), 1);
    f.set_parameter("UseGoodVoxels", ParameterValue::Bool(true))
        .unwrap();
    let reqs = f.requirements();
    assert_eq!(reqs.len(), 2);
    assert_eq!(reqs[1].element_types, vec![ElementType::Bool]);
}

#[test]
fn validation_never_truncates_an_existing_feature_matrix() {
    let mut dca = image_store([3, 1, 1]);
    dca.create_array::<f32>(&cell_path("VectorData"), 3, &[3, 1, 1], false)
        .unwrap();
    let avg = DataArrayPath::new(DC, "CellFeatureData", "AvgValue");
    dca.container_mut(DC)
        .unwrap()
        .create_matrix("CellFeatureData", &[3], AttributeMatrixKind::CellFeature)
        .unwrap();
    dca.create_array::<f32>(&avg, 1, &[3], false)
        .unwrap()
        .as_mut_slice()
        .copy_from_slice(&[1.0, 2.0, 3.0]);

    let mut f = VectorSegmentFeatures::new();
    let mut ctx = FilterContext::new(f.human_label());
    let err = f.preflight(&mut dca, &mut ctx).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NameCollision);
    assert_eq!(dca.array::<f32>(&avg, 1).unwrap().as_slice(), &[1.0, 2.0, 3.0]);
}

#[test]
fn validation_after_a_run_keeps_the_run_output() {
    let mut dca = image_store([2, 1, 1]);
    dca.create_array::<f32>(&cell_path("VectorData"), 3, &[2, 1, 1], false)
        .unwrap()
        .as_mut_slice()
        .copy_from_slice(&[1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    let mut f = VectorSegmentFeatures::new();
    let mut ctx = FilterContext::new(f.human_label());
    f.execute(&mut dca, &mut ctx).unwrap();

    let active = DataArrayPath::new(DC, "CellFeatureData", "Active");
    let mut ctx = FilterContext::new(f.human_label());
    f.preflight(&mut dca, &mut ctx).unwrap();
    assert_eq!(
        dca.array::<bool>(&active, 1).unwrap().as_slice(),
        &[false, true, true]
    );
}
