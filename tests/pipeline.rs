mod util;
use std::sync::Arc;

use micro_pipeline::prelude::*;
use util::*;

/// Emits a warning on every check and fails on execute if asked to.
#[derive(Clone, Default)]
struct Noisy {
    fail_execute: bool,
}

impl Filter for Noisy {
    fn human_label(&self) -> &'static str {
        "Noisy"
    }

    fn parameters(&self) -> Vec<FilterParameter> {
        vec![FilterParameter::boolean("Fail", "FailExecute", false)]
    }

    fn get_parameter(&self, key: &str) -> Result<ParameterValue, PipelineError> {
        match key {
            "FailExecute" => Ok(ParameterValue::Bool(self.fail_execute)),
            _ => Err(PipelineError::InvalidKey(key.into())),
        }
    }

    fn set_parameter(&mut self, key: &str, value: ParameterValue) -> Result<(), PipelineError> {
        match key {
            "FailExecute" => self.fail_execute = value.into_bool(key)?,
            _ => return Err(PipelineError::InvalidKey(key.into())),
        }
        Ok(())
    }

    fn data_check(
        &mut self,
        _dca: &mut DataContainerArray,
        ctx: &mut FilterContext,
    ) -> Result<(), PipelineError> {
        ctx.warning(-3000, "just so you know");
        Ok(())
    }

    fn execute_unchecked(
        &mut self,
        _dca: &mut DataContainerArray,
        _ctx: &mut FilterContext,
    ) -> Result<(), PipelineError> {
        if self.fail_execute {
            return Err(PipelineError::ExecutionFailure("asked to fail".into()));
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

#[test]
fn upstream_output_is_visible_to_downstream_validation() {
    let mut dca = image_store([3, 3, 1]);
    let mut pipeline = Pipeline::default()
        .push(CreateDataArray::new(ElementType::Int32, cell_path("FeatureIds")).with_value("1"))
        .push(ErodeDilateBadData::new());

    let report = pipeline.preflight(&mut dca);
    assert!(report.is_success(), "{:?}", report.failure);
    assert_eq!(report.completed, 2);
    assert!(
        pipeline
            .stages()
            .iter()
            .all(|s| s.state() == FilterState::ValidationPassed)
    );

    let report = pipeline.execute(&mut dca);
    assert!(report.is_success());
    assert_eq!(ids(&dca), vec![1; 9]);
    assert!(
        pipeline
            .stages()
            .iter()
            .all(|s| s.state() == FilterState::Completed)
    );
}

#[test]
fn downstream_fails_without_its_upstream() {
    let mut dca = image_store([3, 3, 1]);
    let mut pipeline = Pipeline::default().push(ErodeDilateBadData::new());
    let report = pipeline.preflight(&mut dca);
    let failure = report.failure.expect("missing FeatureIds must fail");
    assert_eq!(failure.stage, 0);
    assert_eq!(failure.error.category(), ErrorCategory::DependencyMissing);
    assert_eq!(pipeline.stages()[0].state(), FilterState::ValidationFailed);
}

#[test]
fn first_error_stops_the_run_and_keeps_warnings() {
    let mut dca = store_with_ids([2, 1, 1], &[0, 3]);
    let mut pipeline = Pipeline::new(PipelineConfig {
        name: "cleanup".into(),
    })
    .push(Noisy::default())
    .push(Noisy { fail_execute: true })
    .push(ErodeDilateBadData::new());
    let observer = Arc::new(CollectingObserver::new());
    pipeline.add_observer(observer.clone());

    let report = pipeline.execute(&mut dca);
    let failure = report.failure.clone().unwrap();
    assert_eq!(failure.stage, 1);
    assert_eq!(report.error_code(), -87000);
    assert_eq!(report.completed, 1);
    assert_eq!(report.warnings().count(), 2);
    assert!(report.messages.last().unwrap().is_error());

    // the third stage never ran
    assert_eq!(ids(&dca), vec![0, 3]);
    assert_eq!(pipeline.stages()[2].state(), FilterState::Constructed);
    assert_eq!(observer.messages(), report.messages);
    assert!(observer.messages_for(2).is_empty());
    assert!(
        observer
            .states()
            .contains(&(1, FilterState::ExecutionFailed))
    );
}

#[test]
fn failed_recheck_during_execute_is_a_validation_failure() {
    let mut dca = image_store([3, 3, 1]);
    let mut pipeline = Pipeline::default()
        .push(Noisy::default())
        .push(ErodeDilateBadData::new());
    let observer = Arc::new(CollectingObserver::new());
    pipeline.add_observer(observer.clone());

    let report = pipeline.execute(&mut dca);
    let failure = report.failure.expect("missing FeatureIds must fail");
    assert_eq!(failure.stage, 1);
    assert_eq!(failure.error.category(), ErrorCategory::DependencyMissing);
    assert_eq!(pipeline.stages()[0].state(), FilterState::Completed);
    assert_eq!(pipeline.stages()[1].state(), FilterState::ValidationFailed);
    assert!(
        !observer
            .states()
            .contains(&(1, FilterState::ExecutionFailed))
    );
}

#[test]
fn warnings_alone_never_stop_a_pipeline() {
    let mut dca = DataContainerArray::new();
    let mut pipeline = Pipeline::default().push(Noisy::default()).push(Noisy::default());
    let report = pipeline.execute(&mut dca);
    assert!(report.is_success());
    assert_eq!(report.completed, 2);
    assert_eq!(report.error_code(), 0);
}

#[test]
fn cancel_before_run_stops_at_first_stage() {
    let mut dca = DataContainerArray::new();
    let mut pipeline = Pipeline::default().push(Noisy::default());
    pipeline.cancel();
    let report = pipeline.execute(&mut dca);
    assert_eq!(report.failure.unwrap().error, PipelineError::Canceled);

    pipeline.reset_interrupt();
    assert!(pipeline.execute(&mut dca).is_success());
}

#[test]
fn stage_parameters_can_be_changed_in_place() {
    let mut dca = store_with_ids([3, 1, 1], &[0, 0, 6]);
    let mut pipeline = Pipeline::default().push(ErodeDilateBadData::new());
    let stage = pipeline.stage_mut(0).unwrap();
    stage
        .set_parameter("NumIterations", ParameterValue::Int(2))
        .unwrap();
    assert_eq!(stage.state(), FilterState::ParametersConfigured);
    assert!(pipeline.execute(&mut dca).is_success());
    assert_eq!(ids(&dca), vec![6, 6, 6]);
}
