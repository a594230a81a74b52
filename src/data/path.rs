//! DataArrayPath: the `(container, matrix, array)` address of one typed array.

use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::pipeline_error::PipelineError;

/// Separator of the string form `container|matrix|array`.
pub const PATH_SEPARATOR: char = '|';

/// Three-part address of a typed array.
///
/// The string form is `container|matrix|array`. A path whose parts contain no
/// separator round-trips exactly through [`Display`](fmt::Display) and
/// [`FromStr`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DataArrayPath {
    pub container: String,
    pub matrix: String,
    pub array: String,
}

impl DataArrayPath {
    pub fn new(container: &str, matrix: &str, array: &str) -> Self {
        Self {
            container: container.to_string(),
            matrix: matrix.to_string(),
            array: array.to_string(),
        }
    }

    /// A path naming an attribute matrix only (empty array part).
    pub fn matrix_path(container: &str, matrix: &str) -> Self {
        Self::new(container, matrix, "")
    }

    /// Same container and matrix, different array name.
    pub fn with_array(&self, array: &str) -> Self {
        Self::new(&self.container, &self.matrix, array)
    }

    /// Same container, different matrix and array.
    pub fn with_matrix(&self, matrix: &str, array: &str) -> Self {
        Self::new(&self.container, matrix, array)
    }

    /// True when every part is empty.
    pub fn is_empty(&self) -> bool {
        self.container.is_empty() && self.matrix.is_empty() && self.array.is_empty()
    }

    /// True when all three parts are non-empty and separator-free.
    pub fn is_valid(&self) -> bool {
        [&self.container, &self.matrix, &self.array]
            .iter()
            .all(|part| !part.is_empty() && !part.contains(PATH_SEPARATOR))
    }

    /// True when container and matrix are non-empty (array may be empty).
    pub fn is_valid_matrix_path(&self) -> bool {
        [&self.container, &self.matrix]
            .iter()
            .all(|part| !part.is_empty() && !part.contains(PATH_SEPARATOR))
    }

    /// `container|matrix`, the key used in matrix-level error messages.
    pub fn matrix_key(&self) -> String {
        format!("{}{PATH_SEPARATOR}{}", self.container, self.matrix)
    }
}

impl fmt::Display for DataArrayPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            [&self.container, &self.matrix, &self.array]
                .iter()
                .join(&PATH_SEPARATOR.to_string())
        )
    }
}

impl FromStr for DataArrayPath {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(PATH_SEPARATOR).collect();
        match parts.as_slice() {
            [container, matrix, array] => Ok(Self::new(container, matrix, array)),
            _ => Err(PipelineError::InvalidPath(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_with_separator() {
        let p = DataArrayPath::new("ImageDataContainer", "CellData", "FeatureIds");
        assert_eq!(p.to_string(), "ImageDataContainer|CellData|FeatureIds");
        assert_eq!(p.matrix_key(), "ImageDataContainer|CellData");
    }

    #[test]
    fn parse_rejects_wrong_arity() {
        assert!("a|b".parse::<DataArrayPath>().is_err());
        assert!("a|b|c|d".parse::<DataArrayPath>().is_err());
        let empty: DataArrayPath = "||".parse().unwrap();
        assert!(empty.is_empty());
        assert!(!empty.is_valid());
    }

    #[test]
    fn with_array_keeps_matrix() {
        let p = DataArrayPath::new("dc", "CellData", "Phases");
        let q = p.with_array("FeatureIds");
        assert_eq!(q.matrix, "CellData");
        assert_eq!(q.array, "FeatureIds");
        assert!(q.is_valid());
    }
}
