//! CreateDataArray: add a new array of any element type to an existing
//! attribute matrix, filled with an initialization value.

use std::str::FromStr;

use crate::data::data_container_array::DataContainerArray;
use crate::data::element::{Element, ElementType};
use crate::data::path::DataArrayPath;
use crate::filter::{Filter, FilterContext, FilterParameter, ParameterConstraint, ParameterValue};
use crate::pipeline_error::PipelineError;

/// Run `$body` with `$t` bound to the Rust scalar type of `$ty`.
macro_rules! with_element_type {
    ($ty:expr, $t:ident => $body:expr) => {
        match $ty {
            ElementType::Int8 => {
                type $t = i8;
                $body
            }
            ElementType::UInt8 => {
                type $t = u8;
                $body
            }
            ElementType::Int16 => {
                type $t = i16;
                $body
            }
            ElementType::UInt16 => {
                type $t = u16;
                $body
            }
            ElementType::Int32 => {
                type $t = i32;
                $body
            }
            ElementType::UInt32 => {
                type $t = u32;
                $body
            }
            ElementType::Int64 => {
                type $t = i64;
                $body
            }
            ElementType::UInt64 => {
                type $t = u64;
                $body
            }
            ElementType::Float32 => {
                type $t = f32;
                $body
            }
            ElementType::Float64 => {
                type $t = f64;
                $body
            }
            ElementType::Bool => {
                type $t = bool;
                $body
            }
        }
    };
}

fn parse_value<T: Element + FromStr>(key: &str, text: &str) -> Result<T, PipelineError> {
    text.trim().parse::<T>().map_err(|_| PipelineError::InvalidValue {
        key: key.to_string(),
        reason: format!("`{text}` is not a valid {}", T::ELEMENT_TYPE),
    })
}

/// The Create Data Array filter.
#[derive(Clone, Debug, PartialEq)]
pub struct CreateDataArray {
    pub scalar_type: ElementType,
    pub number_of_components: i64,
    pub new_array: DataArrayPath,
    pub initialization_value: String,
}

impl Default for CreateDataArray {
    fn default() -> Self {
        Self {
            scalar_type: ElementType::Int32,
            number_of_components: 1,
            new_array: DataArrayPath::new("ImageDataContainer", "CellData", "NewArray"),
            initialization_value: "0".to_string(),
        }
    }
}

impl CreateDataArray {
    pub fn new(scalar_type: ElementType, new_array: DataArrayPath) -> Self {
        Self {
            scalar_type,
            new_array,
            ..Self::default()
        }
    }

    pub fn with_components(mut self, components: i64) -> Self {
        self.number_of_components = components;
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.initialization_value = value.to_string();
        self
    }

    fn type_choice(&self) -> usize {
        ElementType::ALL
            .iter()
            .position(|&t| t == self.scalar_type)
            .unwrap_or(0)
    }
}

impl Filter for CreateDataArray {
    fn human_label(&self) -> &'static str {
        "Create Data Array"
    }

    fn parameters(&self) -> Vec<FilterParameter> {
        let d = Self::default();
        let choices: Vec<&str> = ElementType::ALL.iter().map(|t| t.as_str()).collect();
        vec![
            FilterParameter::choice("Scalar Type", "ScalarType", &choices, d.type_choice()),
            FilterParameter::int(
                "Number of Components",
                "NumberOfComponents",
                d.number_of_components,
            )
            .with_constraint(ParameterConstraint::at_least(1.0)),
            FilterParameter::string(
                "Initialization Value",
                "InitializationValue",
                &d.initialization_value,
            ),
            FilterParameter::separator("Created Data"),
            FilterParameter::created_array_path("Created Attribute Array", "NewArray", d.new_array),
        ]
    }

    fn get_parameter(&self, key: &str) -> Result<ParameterValue, PipelineError> {
        Ok(match key {
            "ScalarType" => ParameterValue::Choice(self.type_choice()),
            "NumberOfComponents" => ParameterValue::Int(self.number_of_components),
            "InitializationValue" => ParameterValue::String(self.initialization_value.clone()),
            "NewArray" => ParameterValue::Path(self.new_array.clone()),
            _ => return Err(PipelineError::InvalidKey(key.to_string())),
        })
    }

    fn set_parameter(&mut self, key: &str, value: ParameterValue) -> Result<(), PipelineError> {
        match key {
            "ScalarType" => {
                self.scalar_type = ElementType::ALL[value.into_choice(key, ElementType::ALL.len())?]
            }
            "NumberOfComponents" => self.number_of_components = value.into_i64(key)?,
            "InitializationValue" => self.initialization_value = value.into_string(key)?,
            "NewArray" => self.new_array = value.into_path(key)?,
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
        if !self.new_array.is_valid() {
            return Err(PipelineError::InvalidPath(self.new_array.to_string()));
        }
        let components = self.number_of_components as usize;
        let text = &self.initialization_value;
        with_element_type!(self.scalar_type, T => {
            parse_value::<T>("InitializationValue", text)?;
        });

        dca.matrix(&self.new_array)?;
        with_element_type!(self.scalar_type, T => {
            dca.create_output_array::<T>(&self.new_array, components)?;
        });
        Ok(())
    }

    fn execute_unchecked(
        &mut self,
        dca: &mut DataContainerArray,
        ctx: &mut FilterContext,
    ) -> Result<(), PipelineError> {
        let components = self.number_of_components as usize;
        let text = &self.initialization_value;
        with_element_type!(self.scalar_type, T => {
            let value = parse_value::<T>("InitializationValue", text)?;
            dca.array_mut::<T>(&self.new_array, components)?.fill(value);
        });
        ctx.info(format!("created {}", self.new_array));
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
    use crate::data::attribute_matrix::AttributeMatrixKind;
    use crate::data::data_container::DataContainer;

    fn store() -> DataContainerArray {
        let mut dca = DataContainerArray::new();
        dca.create_container("dc")
            .unwrap()
            .create_matrix("am", &[4], AttributeMatrixKind::Generic)
            .unwrap();
        dca.add_container(DataContainer::new("other")).unwrap();
        dca
    }

    #[test]
    fn fills_with_parsed_value() {
        let mut dca = store();
        let path = DataArrayPath::new("dc", "am", "w");
        let mut f = CreateDataArray::new(ElementType::Float64, path.clone())
            .with_components(2)
            .with_value("2.5");
        let mut ctx = FilterContext::new(f.human_label());
        f.execute(&mut dca, &mut ctx).unwrap();
        let a = dca.array::<f64>(&path, 2).unwrap();
        assert_eq!(a.as_slice(), &[2.5; 8]);
    }

    #[test]
    fn unparsable_value_fails_before_creating() {
        let mut dca = store();
        let path = DataArrayPath::new("dc", "am", "w");
        let mut f = CreateDataArray::new(ElementType::UInt8, path.clone()).with_value("-3");
        let mut ctx = FilterContext::new(f.human_label());
        let err = f.preflight(&mut dca, &mut ctx).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidValue { .. }));
        assert!(dca.tagged(&path).is_err());
    }

    #[test]
    fn zero_components_is_out_of_range() {
        let mut dca = store();
        let mut f = CreateDataArray::new(ElementType::Int8, DataArrayPath::new("dc", "am", "w"))
            .with_components(0);
        let mut ctx = FilterContext::new(f.human_label());
        let err = f.preflight(&mut dca, &mut ctx).unwrap_err();
        assert_eq!(err.code(), -5555);
        assert_eq!(ctx.error_code(), -5555);
    }

    #[test]
    fn missing_matrix_is_dependency_error() {
        let mut dca = store();
        let mut f =
            CreateDataArray::new(ElementType::Bool, DataArrayPath::new("other", "nope", "w"));
        let mut ctx = FilterContext::new(f.human_label());
        assert!(matches!(
            f.preflight(&mut dca, &mut ctx),
            Err(PipelineError::MatrixNotFound(_))
        ));
    }
}
