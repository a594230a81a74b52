//! DataArray: a named, homogeneously typed, tuple-structured buffer.
//!
//! A `DataArray<T>` stores `tuples * components` values of `T` contiguously,
//! tuple-major. [`TaggedArray`] erases the element type so that attribute
//! matrices can hold arrays of mixed types and still perform type-independent
//! operations (resize, tuple copy) across all of them.

use crate::data::element::{Element, ElementType};
use crate::data::storage::{Storage, VecStorage};
use crate::debug_invariants::DebugInvariants;
use crate::pipeline_error::PipelineError;

/// Typed, tuple-structured array.
///
/// # Invariants
///
/// - `components >= 1`.
/// - `storage.len() == tuples * components`, hence the byte length is
///   `tuples * components * size_of::<T>()`.
#[derive(Clone, Debug, PartialEq)]
pub struct DataArray<T: Element> {
    name: String,
    components: usize,
    tuples: usize,
    storage: VecStorage<T>,
}

impl<T: Element> DataArray<T> {
    /// Allocate `tuples` tuples of `components` values, all `T::default()`.
    pub fn new(name: &str, tuples: usize, components: usize) -> Result<Self, PipelineError> {
        Self::with_value(name, tuples, components, T::default())
    }

    /// Allocate `tuples` tuples of `components` values, all equal to `value`.
    pub fn with_value(
        name: &str,
        tuples: usize,
        components: usize,
        value: T,
    ) -> Result<Self, PipelineError> {
        if components == 0 {
            return Err(PipelineError::ZeroComponents(name.to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            components,
            tuples,
            storage: VecStorage::with_len(tuples * components, value),
        })
    }

    /// Wrap an existing flat buffer.
    ///
    /// # Errors
    /// `TupleLengthMismatch` if `data.len()` is not a multiple of `components`.
    pub fn from_vec(name: &str, components: usize, data: Vec<T>) -> Result<Self, PipelineError> {
        if components == 0 {
            return Err(PipelineError::ZeroComponents(name.to_string()));
        }
        if data.len() % components != 0 {
            return Err(PipelineError::TupleLengthMismatch {
                name: name.to_string(),
                expected: components,
                found: data.len(),
            });
        }
        Ok(Self {
            name: name.to_string(),
            components,
            tuples: data.len() / components,
            storage: VecStorage::from(data),
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: &str) {
        self.name = name.to_string();
    }

    #[inline]
    pub fn element_type(&self) -> ElementType {
        T::ELEMENT_TYPE
    }

    /// Number of components per tuple.
    #[inline]
    pub fn components(&self) -> usize {
        self.components
    }

    #[inline]
    pub fn tuple_count(&self) -> usize {
        self.tuples
    }

    /// Total number of values (`tuples * components`).
    #[inline]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        self.storage.as_slice()
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.storage.as_mut_slice()
    }

    /// Size of the buffer in bytes.
    pub fn byte_len(&self) -> usize {
        self.len() * T::ELEMENT_TYPE.size_of()
    }

    /// Raw byte view of the buffer.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.as_slice())
    }

    fn check_index(&self, index: usize) -> Result<(), PipelineError> {
        if index >= self.tuples {
            return Err(PipelineError::IndexOutOfBounds {
                name: self.name.clone(),
                index,
                len: self.tuples,
            });
        }
        Ok(())
    }

    /// Borrow the components of tuple `index`.
    pub fn tuple(&self, index: usize) -> Result<&[T], PipelineError> {
        self.check_index(index)?;
        let c = self.components;
        Ok(&self.as_slice()[index * c..(index + 1) * c])
    }

    /// Mutably borrow the components of tuple `index`.
    pub fn tuple_mut(&mut self, index: usize) -> Result<&mut [T], PipelineError> {
        self.check_index(index)?;
        let c = self.components;
        Ok(&mut self.as_mut_slice()[index * c..(index + 1) * c])
    }

    /// Overwrite tuple `index` with `values`.
    pub fn set_tuple(&mut self, index: usize, values: &[T]) -> Result<(), PipelineError> {
        if values.len() != self.components {
            return Err(PipelineError::TupleLengthMismatch {
                name: self.name.clone(),
                expected: self.components,
                found: values.len(),
            });
        }
        self.check_index(index)?;
        self.storage.write_at(index * self.components, values)
    }

    /// Copy every component of tuple `src` onto tuple `dst`.
    pub fn copy_tuple(&mut self, src: usize, dst: usize) -> Result<(), PipelineError> {
        self.check_index(src)?;
        self.check_index(dst)?;
        if src == dst {
            return Ok(());
        }
        let c = self.components;
        self.storage.copy_within(src * c, dst * c, c)
    }

    /// Set every value to `value`.
    pub fn fill(&mut self, value: T) {
        self.as_mut_slice().fill(value);
    }

    pub fn initialize_with_zeros(&mut self) {
        self.fill(T::default());
    }

    /// Grow or shrink to `tuples` tuples; new tuples are `T::default()`.
    pub fn resize_tuples(&mut self, tuples: usize) {
        self.storage.resize(tuples * self.components, T::default());
        self.tuples = tuples;
        crate::debug_invariants!(self.validate_invariants(), "DataArray invalid after resize");
    }

    pub fn into_vec(self) -> Vec<T> {
        self.storage.into_inner()
    }
}

impl<T: Element> DebugInvariants for DataArray<T> {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "DataArray invalid");
    }

    fn validate_invariants(&self) -> Result<(), PipelineError> {
        if self.components == 0 {
            return Err(PipelineError::ZeroComponents(self.name.clone()));
        }
        if self.storage.len() != self.tuples * self.components {
            return Err(PipelineError::TupleLengthMismatch {
                name: self.name.clone(),
                expected: self.tuples * self.components,
                found: self.storage.len(),
            });
        }
        Ok(())
    }
}

/// Tagged, type-erased array storage.
#[derive(Clone, Debug, PartialEq)]
pub enum TaggedArray {
    Int8(DataArray<i8>),
    UInt8(DataArray<u8>),
    Int16(DataArray<i16>),
    UInt16(DataArray<u16>),
    Int32(DataArray<i32>),
    UInt32(DataArray<u32>),
    Int64(DataArray<i64>),
    UInt64(DataArray<u64>),
    Float32(DataArray<f32>),
    Float64(DataArray<f64>),
    Bool(DataArray<bool>),
}

/// Run `$body` with `$a` bound to the inner `DataArray<_>` of any variant.
macro_rules! with_array {
    ($value:expr, $a:ident => $body:expr) => {
        match $value {
            TaggedArray::Int8($a) => $body,
            TaggedArray::UInt8($a) => $body,
            TaggedArray::Int16($a) => $body,
            TaggedArray::UInt16($a) => $body,
            TaggedArray::Int32($a) => $body,
            TaggedArray::UInt32($a) => $body,
            TaggedArray::Int64($a) => $body,
            TaggedArray::UInt64($a) => $body,
            TaggedArray::Float32($a) => $body,
            TaggedArray::Float64($a) => $body,
            TaggedArray::Bool($a) => $body,
        }
    };
}

impl TaggedArray {
    /// Allocate a zero-filled array of the given element type.
    pub fn zeroed(
        element_type: ElementType,
        name: &str,
        tuples: usize,
        components: usize,
    ) -> Result<Self, PipelineError> {
        Ok(match element_type {
            ElementType::Int8 => DataArray::<i8>::new(name, tuples, components)?.into(),
            ElementType::UInt8 => DataArray::<u8>::new(name, tuples, components)?.into(),
            ElementType::Int16 => DataArray::<i16>::new(name, tuples, components)?.into(),
            ElementType::UInt16 => DataArray::<u16>::new(name, tuples, components)?.into(),
            ElementType::Int32 => DataArray::<i32>::new(name, tuples, components)?.into(),
            ElementType::UInt32 => DataArray::<u32>::new(name, tuples, components)?.into(),
            ElementType::Int64 => DataArray::<i64>::new(name, tuples, components)?.into(),
            ElementType::UInt64 => DataArray::<u64>::new(name, tuples, components)?.into(),
            ElementType::Float32 => DataArray::<f32>::new(name, tuples, components)?.into(),
            ElementType::Float64 => DataArray::<f64>::new(name, tuples, components)?.into(),
            ElementType::Bool => DataArray::<bool>::new(name, tuples, components)?.into(),
        })
    }

    pub fn name(&self) -> &str {
        with_array!(self, a => a.name())
    }

    pub fn rename(&mut self, name: &str) {
        with_array!(self, a => a.rename(name))
    }

    /// Element type tag of the wrapped array.
    pub fn element_type(&self) -> ElementType {
        with_array!(self, a => a.element_type())
    }

    pub fn components(&self) -> usize {
        with_array!(self, a => a.components())
    }

    pub fn tuple_count(&self) -> usize {
        with_array!(self, a => a.tuple_count())
    }

    pub fn byte_len(&self) -> usize {
        with_array!(self, a => a.byte_len())
    }

    pub fn as_bytes(&self) -> &[u8] {
        with_array!(self, a => a.as_bytes())
    }

    pub fn resize_tuples(&mut self, tuples: usize) {
        with_array!(self, a => a.resize_tuples(tuples))
    }

    pub fn copy_tuple(&mut self, src: usize, dst: usize) -> Result<(), PipelineError> {
        with_array!(self, a => a.copy_tuple(src, dst))
    }

    pub fn initialize_with_zeros(&mut self) {
        with_array!(self, a => a.initialize_with_zeros())
    }

    /// Typed borrow, `None` if the element type differs.
    pub fn downcast<T: Element>(&self) -> Option<&DataArray<T>> {
        T::unwrap(self)
    }

    /// Typed mutable borrow, `None` if the element type differs.
    pub fn downcast_mut<T: Element>(&mut self) -> Option<&mut DataArray<T>> {
        T::unwrap_mut(self)
    }

    /// Component `component` of tuple `index` widened to `f64`.
    ///
    /// Bools read as `0.0`/`1.0`. Returns `None` out of range.
    pub fn value_as_f64(&self, index: usize, component: usize) -> Option<f64> {
        use num_traits::ToPrimitive;
        if component >= self.components() {
            return None;
        }
        let flat = index.checked_mul(self.components())?.checked_add(component)?;
        match self {
            TaggedArray::Bool(a) => a.as_slice().get(flat).map(|&b| if b { 1.0 } else { 0.0 }),
            TaggedArray::Int8(a) => a.as_slice().get(flat).and_then(|v| v.to_f64()),
            TaggedArray::UInt8(a) => a.as_slice().get(flat).and_then(|v| v.to_f64()),
            TaggedArray::Int16(a) => a.as_slice().get(flat).and_then(|v| v.to_f64()),
            TaggedArray::UInt16(a) => a.as_slice().get(flat).and_then(|v| v.to_f64()),
            TaggedArray::Int32(a) => a.as_slice().get(flat).and_then(|v| v.to_f64()),
            TaggedArray::UInt32(a) => a.as_slice().get(flat).and_then(|v| v.to_f64()),
            TaggedArray::Int64(a) => a.as_slice().get(flat).and_then(|v| v.to_f64()),
            TaggedArray::UInt64(a) => a.as_slice().get(flat).and_then(|v| v.to_f64()),
            TaggedArray::Float32(a) => a.as_slice().get(flat).and_then(|v| v.to_f64()),
            TaggedArray::Float64(a) => a.as_slice().get(flat).copied(),
        }
    }
}

impl<T: Element> From<DataArray<T>> for TaggedArray {
    fn from(array: DataArray<T>) -> Self {
        T::wrap(array)
    }
}

impl DebugInvariants for TaggedArray {
    fn debug_assert_invariants(&self) {
        with_array!(self, a => a.debug_assert_invariants())
    }

    fn validate_invariants(&self) -> Result<(), PipelineError> {
        with_array!(self, a => a.validate_invariants())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_length_tracks_shape() {
        let a = DataArray::<f32>::new("Vectors", 4, 3).unwrap();
        assert_eq!(a.len(), 12);
        assert_eq!(a.byte_len(), 48);
        assert_eq!(a.as_bytes().len(), 48);
        let b = DataArray::<bool>::new("Mask", 5, 1).unwrap();
        assert_eq!(b.as_bytes().len(), 5);
    }

    #[test]
    fn zero_components_rejected() {
        assert!(matches!(
            DataArray::<i32>::new("bad", 3, 0),
            Err(PipelineError::ZeroComponents(_))
        ));
    }

    #[test]
    fn tuple_copy_and_bounds() {
        let mut a = DataArray::from_vec("v", 2, vec![1, 2, 3, 4, 5, 6]).unwrap();
        a.copy_tuple(2, 0).unwrap();
        assert_eq!(a.as_slice(), &[5, 6, 3, 4, 5, 6]);
        assert!(a.copy_tuple(3, 0).is_err());
        assert!(a.set_tuple(1, &[9]).is_err());
        a.set_tuple(1, &[9, 9]).unwrap();
        assert_eq!(a.tuple(1).unwrap(), &[9, 9]);
    }

    #[test]
    fn resize_keeps_prefix_and_zero_fills() {
        let mut a = DataArray::from_vec("ids", 1, vec![3, 4]).unwrap();
        a.resize_tuples(4);
        assert_eq!(a.as_slice(), &[3, 4, 0, 0]);
        a.resize_tuples(1);
        assert_eq!(a.as_slice(), &[3]);
        a.validate_invariants().unwrap();
    }

    #[test]
    fn tagged_downcast_checks_type() {
        let t: TaggedArray = DataArray::<i32>::new("ids", 2, 1).unwrap().into();
        assert!(t.downcast::<i32>().is_some());
        assert!(t.downcast::<f32>().is_none());
        assert_eq!(t.element_type(), ElementType::Int32);
        assert_eq!(t.value_as_f64(1, 0), Some(0.0));
        assert_eq!(t.value_as_f64(2, 0), None);
    }
}
