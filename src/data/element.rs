//! Element type tags and the scalar trait that backs typed array views.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;

use crate::data::data_array::{DataArray, TaggedArray};
use crate::pipeline_error::PipelineError;

// Bool arrays are byte-addressable; `as_bytes` relies on this.
const_assert_eq!(std::mem::size_of::<bool>(), 1);

/// Element type tag of a typed array.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    #[serde(rename = "float")]
    Float32,
    #[serde(rename = "double")]
    Float64,
    Bool,
}

impl ElementType {
    /// Every element type, in tag order.
    pub const ALL: [ElementType; 11] = [
        ElementType::Int8,
        ElementType::UInt8,
        ElementType::Int16,
        ElementType::UInt16,
        ElementType::Int32,
        ElementType::UInt32,
        ElementType::Int64,
        ElementType::UInt64,
        ElementType::Float32,
        ElementType::Float64,
        ElementType::Bool,
    ];

    /// Every numeric (non-bool) element type.
    pub const NUMERIC: [ElementType; 10] = [
        ElementType::Int8,
        ElementType::UInt8,
        ElementType::Int16,
        ElementType::UInt16,
        ElementType::Int32,
        ElementType::UInt32,
        ElementType::Int64,
        ElementType::UInt64,
        ElementType::Float32,
        ElementType::Float64,
    ];

    /// Returns a stable string label for the element type.
    pub fn as_str(self) -> &'static str {
        match self {
            ElementType::Int8 => "int8",
            ElementType::UInt8 => "uint8",
            ElementType::Int16 => "int16",
            ElementType::UInt16 => "uint16",
            ElementType::Int32 => "int32",
            ElementType::UInt32 => "uint32",
            ElementType::Int64 => "int64",
            ElementType::UInt64 => "uint64",
            ElementType::Float32 => "float",
            ElementType::Float64 => "double",
            ElementType::Bool => "bool",
        }
    }

    /// Size of one element in bytes.
    pub fn size_of(self) -> usize {
        match self {
            ElementType::Int8 | ElementType::UInt8 | ElementType::Bool => 1,
            ElementType::Int16 | ElementType::UInt16 => 2,
            ElementType::Int32 | ElementType::UInt32 | ElementType::Float32 => 4,
            ElementType::Int64 | ElementType::UInt64 | ElementType::Float64 => 8,
        }
    }

    /// True for every type except `Bool`.
    pub fn is_numeric(self) -> bool {
        self != ElementType::Bool
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementType {
    type Err = PipelineError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        ElementType::ALL
            .into_iter()
            .find(|t| t.as_str() == tag)
            .ok_or_else(|| PipelineError::UnknownElementType(tag.to_string()))
    }
}

/// Maps a Rust scalar to its [`ElementType`] and to the matching
/// [`TaggedArray`] variant.
pub trait Element:
    Copy + Default + PartialEq + fmt::Debug + bytemuck::NoUninit + Send + Sync + 'static
{
    /// Element type tag for this concrete type.
    const ELEMENT_TYPE: ElementType;

    /// Wrap a typed array into a tagged container.
    fn wrap(array: DataArray<Self>) -> TaggedArray;
    /// Borrow a typed array if the tag matches.
    fn unwrap(array: &TaggedArray) -> Option<&DataArray<Self>>;
    /// Mutably borrow a typed array if the tag matches.
    fn unwrap_mut(array: &mut TaggedArray) -> Option<&mut DataArray<Self>>;
}

macro_rules! impl_element {
    ($ty:ty, $tag:ident) => {
        impl Element for $ty {
            const ELEMENT_TYPE: ElementType = ElementType::$tag;

            fn wrap(array: DataArray<Self>) -> TaggedArray {
                TaggedArray::$tag(array)
            }

            fn unwrap(array: &TaggedArray) -> Option<&DataArray<Self>> {
                if let TaggedArray::$tag(array) = array {
                    Some(array)
                } else {
                    None
                }
            }

            fn unwrap_mut(array: &mut TaggedArray) -> Option<&mut DataArray<Self>> {
                if let TaggedArray::$tag(array) = array {
                    Some(array)
                } else {
                    None
                }
            }
        }
    };
}

impl_element!(i8, Int8);
impl_element!(u8, UInt8);
impl_element!(i16, Int16);
impl_element!(u16, UInt16);
impl_element!(i32, Int32);
impl_element!(u32, UInt32);
impl_element!(i64, Int64);
impl_element!(u64, UInt64);
impl_element!(f32, Float32);
impl_element!(f64, Float64);
impl_element!(bool, Bool);
