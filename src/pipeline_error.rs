//! PipelineError: Unified error type for micro-pipeline public APIs
//!
//! Every fallible store, geometry, filter and pipeline operation returns this
//! error. Each variant maps to a stable negative error code so that filters
//! can report failures on the status channel the same way regardless of where
//! the failure originated.

use thiserror::Error;

use crate::data::element::ElementType;
use crate::data::path::DataArrayPath;
use crate::geometry::GeometryKind;

/// Coarse classification of [`PipelineError`] variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// A named container, matrix or array does not exist.
    DependencyMissing,
    /// The array exists but holds a different element type.
    TypeMismatch,
    /// The array exists but has a different component count.
    ComponentMismatch,
    /// Geometry absent or of the wrong kind, or attribute matrix of the wrong kind.
    GeometryMismatch,
    /// A parameter value is outside its allowed range.
    ParameterOutOfRange,
    /// Unknown parameter key or a value of the wrong kind.
    InvalidParameter,
    /// An object with that name already exists.
    NameCollision,
    /// Algorithm-internal failure, including cancellation.
    ExecutionFailure,
    /// A structural invariant of the store or a geometry was violated.
    Invariant,
}

/// Unified error type for micro-pipeline operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    /// No data container with that name.
    #[error("data container `{0}` does not exist")]
    ContainerNotFound(String),
    /// No attribute matrix at that path.
    #[error("attribute matrix `{0}` does not exist")]
    MatrixNotFound(String),
    /// No array at that path.
    #[error("data array `{0}` does not exist")]
    ArrayNotFound(DataArrayPath),
    /// The array holds a different element type than requested.
    #[error("data array `{path}` has element type {found}, expected {expected}")]
    TypeMismatch {
        path: DataArrayPath,
        expected: ElementType,
        found: ElementType,
    },
    /// The array has a different number of components per tuple.
    #[error("data array `{path}` has {found} components per tuple, expected {expected}")]
    ComponentMismatch {
        path: DataArrayPath,
        expected: usize,
        found: usize,
    },
    /// The array's tuple count disagrees with its attribute matrix.
    #[error("`{name}` has {found} tuples but the attribute matrix holds {expected}")]
    TupleCountMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    /// The container has no geometry attached.
    #[error("data container `{0}` has no geometry")]
    NoGeometry(String),
    /// The container's geometry is not of the requested kind.
    #[error("data container `{container}` has {found:?} geometry, expected {expected:?}")]
    GeometryMismatch {
        container: String,
        expected: GeometryKind,
        found: GeometryKind,
    },
    /// The attribute matrix is not of an accepted kind.
    #[error("attribute matrix `{matrix}` has kind {found}, which the filter does not accept")]
    MatrixKindMismatch { matrix: String, found: String },
    /// A parameter value is outside its allowed range.
    #[error("parameter `{key}` is out of range: {reason}")]
    ParameterOutOfRange { key: String, reason: String },
    /// The filter has no parameter with that property key.
    #[error("unknown parameter `{0}`")]
    InvalidKey(String),
    /// The value has the wrong kind for the parameter.
    #[error("invalid value for parameter `{key}`: {reason}")]
    InvalidValue { key: String, reason: String },
    /// A container, matrix or array with that name already exists.
    #[error("`{0}` already exists")]
    NameCollision(String),
    /// A path string could not be parsed.
    #[error("malformed data array path `{0}`")]
    InvalidPath(String),
    /// An unknown element type tag was supplied.
    #[error("unknown element type `{0}`")]
    UnknownElementType(String),
    /// A tuple index past the end of an array.
    #[error("tuple index {index} out of bounds for `{name}` with {len} tuples")]
    IndexOutOfBounds {
        name: String,
        index: usize,
        len: usize,
    },
    /// Arrays need at least one component per tuple.
    #[error("data array `{0}` must have at least one component per tuple")]
    ZeroComponents(String),
    /// A slice of the wrong length was supplied for a tuple write.
    #[error("tuple for `{name}` has {found} values, expected {expected}")]
    TupleLengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
    /// Mesh connectivity references a vertex or element that does not exist.
    #[error("invalid topology: {0}")]
    InvalidTopology(String),
    /// The algorithm could not complete.
    #[error("execution failed: {0}")]
    ExecutionFailure(String),
    /// The run was interrupted through the pipeline's interrupt flag.
    #[error("execution was canceled")]
    Canceled,
}

impl PipelineError {
    /// Stable negative error code for the status channel.
    pub fn code(&self) -> i32 {
        match self {
            PipelineError::ContainerNotFound(_) => -999,
            PipelineError::MatrixNotFound(_) => -301,
            PipelineError::ArrayNotFound(_) => -90002,
            PipelineError::TypeMismatch { .. } => -90003,
            PipelineError::ComponentMismatch { .. } => -90004,
            PipelineError::TupleCountMismatch { .. } => -90005,
            PipelineError::NoGeometry(_) => -385,
            PipelineError::GeometryMismatch { .. } => -384,
            PipelineError::MatrixKindMismatch { .. } => -302,
            PipelineError::ParameterOutOfRange { .. } => -5555,
            PipelineError::InvalidKey(_) => -11000,
            PipelineError::InvalidValue { .. } => -11001,
            PipelineError::NameCollision(_) => -10014,
            PipelineError::InvalidPath(_) => -11002,
            PipelineError::UnknownElementType(_) => -11003,
            PipelineError::IndexOutOfBounds { .. } => -90006,
            PipelineError::TupleLengthMismatch { .. } => -90007,
            PipelineError::ZeroComponents(_) => -90008,
            PipelineError::InvalidTopology(_) => -390,
            PipelineError::ExecutionFailure(_) => -87000,
            PipelineError::Canceled => -1,
        }
    }

    /// Coarse taxonomy bucket of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            PipelineError::ContainerNotFound(_)
            | PipelineError::MatrixNotFound(_)
            | PipelineError::ArrayNotFound(_) => ErrorCategory::DependencyMissing,
            PipelineError::TypeMismatch { .. } => ErrorCategory::TypeMismatch,
            PipelineError::ComponentMismatch { .. } => ErrorCategory::ComponentMismatch,
            PipelineError::NoGeometry(_)
            | PipelineError::GeometryMismatch { .. }
            | PipelineError::MatrixKindMismatch { .. } => ErrorCategory::GeometryMismatch,
            PipelineError::ParameterOutOfRange { .. } => ErrorCategory::ParameterOutOfRange,
            PipelineError::InvalidKey(_)
            | PipelineError::InvalidValue { .. }
            | PipelineError::InvalidPath(_)
            | PipelineError::UnknownElementType(_) => ErrorCategory::InvalidParameter,
            PipelineError::NameCollision(_) => ErrorCategory::NameCollision,
            PipelineError::ExecutionFailure(_) | PipelineError::Canceled => {
                ErrorCategory::ExecutionFailure
            }
            PipelineError::TupleCountMismatch { .. }
            | PipelineError::IndexOutOfBounds { .. }
            | PipelineError::TupleLengthMismatch { .. }
            | PipelineError::ZeroComponents(_)
            | PipelineError::InvalidTopology(_) => ErrorCategory::Invariant,
        }
    }
}
