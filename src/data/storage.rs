//! Pluggable storage for typed array buffers.
//!
//! This trait abstracts how a [`DataArray`](crate::data::data_array::DataArray)'s
//! flat buffer is stored. Only a `Vec` backend ships today; the slice-based
//! contract keeps the door open for mapped or pooled buffers without touching
//! the array API.

use core::fmt::{self, Debug};

use crate::pipeline_error::PipelineError;

/// Contiguous, indexable storage for `V` with slice access.
pub trait Storage<V>: Debug {
    /// Construct a buffer of `len`, filled with `fill`.
    fn with_len(len: usize, fill: V) -> Self
    where
        V: Clone;

    /// Current length in elements.
    fn len(&self) -> usize;

    /// Whether the buffer holds zero elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resize to `new_len`, filling new cells with `fill`.
    fn resize(&mut self, new_len: usize, fill: V)
    where
        V: Clone;

    /// Entire read-only buffer.
    fn as_slice(&self) -> &[V];

    /// Entire mutable buffer.
    fn as_mut_slice(&mut self) -> &mut [V];

    /// Copy `src` into the range `[offset .. offset + src.len())`.
    fn write_at(&mut self, offset: usize, src: &[V]) -> Result<(), PipelineError>
    where
        V: Clone,
    {
        let len = self.len();
        let dst = offset
            .checked_add(src.len())
            .and_then(|end| self.as_mut_slice().get_mut(offset..end))
            .ok_or(PipelineError::IndexOutOfBounds {
                name: "storage".to_string(),
                index: offset,
                len,
            })?;
        dst.clone_from_slice(src);
        Ok(())
    }

    /// Copy the range `[src .. src + len)` onto `[dst .. dst + len)` inside the buffer.
    fn copy_within(&mut self, src: usize, dst: usize, len: usize) -> Result<(), PipelineError>
    where
        V: Copy,
    {
        let total = self.len();
        let fits = |start: usize| start.checked_add(len).is_some_and(|end| end <= total);
        if !fits(src) || !fits(dst) {
            return Err(PipelineError::IndexOutOfBounds {
                name: "storage".to_string(),
                index: src.max(dst),
                len: total,
            });
        }
        self.as_mut_slice().copy_within(src..src + len, dst);
        Ok(())
    }
}

/// `Vec`-backed storage (default).
#[derive(Clone, PartialEq)]
pub struct VecStorage<V>(pub(crate) Vec<V>);

impl<V> Debug for VecStorage<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VecStorage")
            .field("len", &self.0.len())
            .finish()
    }
}

impl<V> Default for VecStorage<V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<V> Storage<V> for VecStorage<V> {
    fn with_len(len: usize, fill: V) -> Self
    where
        V: Clone,
    {
        Self(vec![fill; len])
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn resize(&mut self, new_len: usize, fill: V)
    where
        V: Clone,
    {
        self.0.resize(new_len, fill);
    }

    fn as_slice(&self) -> &[V] {
        &self.0
    }

    fn as_mut_slice(&mut self) -> &mut [V] {
        &mut self.0
    }
}

impl<V> From<Vec<V>> for VecStorage<V> {
    fn from(v: Vec<V>) -> Self {
        Self(v)
    }
}

impl<V> VecStorage<V> {
    pub fn into_inner(self) -> Vec<V> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_at_rejects_overflowing_range() {
        let mut s = VecStorage::with_len(4, 0i32);
        assert!(s.write_at(3, &[1, 2]).is_err());
        s.write_at(2, &[7, 8]).unwrap();
        assert_eq!(s.as_slice(), &[0, 0, 7, 8]);
    }

    #[test]
    fn copy_within_moves_ranges() {
        let mut s = VecStorage::from(vec![1u8, 2, 3, 4, 5, 6]);
        s.copy_within(0, 3, 3).unwrap();
        assert_eq!(s.as_slice(), &[1, 2, 3, 1, 2, 3]);
        assert!(s.copy_within(4, 0, 3).is_err());
    }
}
