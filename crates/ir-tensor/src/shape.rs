use crate::error::{Result, TensorError};
use std::fmt;

/// A tensor shape, wrapping a vector of dimension sizes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Create a new shape from a vector of dimensions.
    pub fn new(dims: Vec<usize>) -> Self {
        Shape { dims }
    }

    /// Create a shape from a slice of dimensions.
    pub fn from_slice(dims: &[usize]) -> Self {
        Shape {
            dims: dims.to_vec(),
        }
    }

    /// Number of dimensions (rank).
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Total number of elements (product of all dimension sizes).
    pub fn numel(&self) -> usize {
        self.dims.iter().product()
    }

    /// Returns the size of dimension `i`.
    ///
    /// # Panics
    /// Panics if `i >= ndim()`.
    pub fn dim(&self, i: usize) -> usize {
        self.dims[i]
    }

    /// Returns a reference to the underlying dimension sizes.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Computes row-major contiguous strides for this shape.
    ///
    /// For a shape [d0, d1, d2], the strides are [d1*d2, d2, 1].
    pub fn strides(&self) -> Vec<usize> {
        if self.dims.is_empty() {
            return vec![];
        }
        let mut strides = vec![0usize; self.dims.len()];
        strides[self.dims.len() - 1] = 1;
        for i in (0..self.dims.len() - 1).rev() {
            strides[i] = strides[i + 1] * self.dims[i + 1];
        }
        strides
    }

    /// Returns a copy of this shape with the last two axes exchanged, or
    /// `None` when the rank is below two.
    pub fn swap_last_two(&self) -> Option<Shape> {
        let n = self.ndim();
        if n < 2 {
            return None;
        }
        let mut dims = self.dims.clone();
        dims.swap(n - 2, n - 1);
        Some(Shape::new(dims))
    }

    /// Maps a possibly negative axis onto `0..ndim()`.
    ///
    /// A negative `axis` counts from the end, so `-1` is the last axis. The
    /// accepted range is `[-ndim, ndim - 1]`; anything else, or a rank-0
    /// shape, is an `InvalidAxis` error.
    pub fn normalize_axis(&self, axis: isize) -> Result<usize> {
        normalize_axis(axis, self.ndim())
    }

    /// Converts a flat row-major element index into per-axis coordinates.
    ///
    /// For shape [2, 3, 4], flat index 5 maps to [0, 1, 1].
    pub fn locate_index(&self, flat: usize) -> Result<Vec<usize>> {
        if flat >= self.numel() {
            return Err(TensorError::IndexOutOfBounds {
                index: flat,
                shape: self.dims.clone(),
            });
        }
        let mut index = vec![0usize; self.dims.len()];
        let mut rest = flat;
        for (slot, &d) in index.iter_mut().rev().zip(self.dims.iter().rev()) {
            *slot = rest % d;
            rest /= d;
        }
        Ok(index)
    }

    /// Converts per-axis coordinates into a flat offset using `strides`.
    ///
    /// Each coordinate is reduced modulo its axis size first, so an index
    /// computed against a broadcast output shape resolves to the right
    /// element of a size-1 axis.
    pub fn delocate_index(&self, index: &[usize], strides: &[usize]) -> Result<usize> {
        if index.len() != self.ndim() {
            return Err(TensorError::ShapeMismatch {
                expected: self.dims.clone(),
                got: index.to_vec(),
            });
        }
        if strides.len() != self.ndim() {
            return Err(TensorError::ShapeMismatch {
                expected: self.strides(),
                got: strides.to_vec(),
            });
        }
        if self.numel() == 0 {
            return Err(TensorError::IndexOutOfBounds {
                index: 0,
                shape: self.dims.clone(),
            });
        }
        Ok(index
            .iter()
            .zip(self.dims.iter())
            .zip(strides.iter())
            .map(|((&i, &d), &s)| (i % d) * s)
            .sum())
    }

    /// Compute the broadcast shape of `a` and `b` using numpy-style broadcasting rules.
    ///
    /// Rules:
    /// 1. If the shapes have different numbers of dimensions, the shorter shape is
    ///    padded with ones on the left.
    /// 2. For each dimension, sizes must either be equal, or one of them must be 1.
    ///    The output dimension is the maximum of the two.
    pub fn broadcast_shape(a: &Shape, b: &Shape) -> Result<Shape> {
        let max_ndim = a.ndim().max(b.ndim());
        let mut result = Vec::with_capacity(max_ndim);

        for i in 0..max_ndim {
            // Index from the right: dim at position (ndim - 1 - i) from the right
            let da = if i < a.ndim() {
                a.dims[a.ndim() - 1 - i]
            } else {
                1
            };
            let db = if i < b.ndim() {
                b.dims[b.ndim() - 1 - i]
            } else {
                1
            };

            if da != db && da != 1 && db != 1 {
                return Err(TensorError::BroadcastError {
                    a: a.dims.clone(),
                    b: b.dims.clone(),
                });
            }
            result.push(da.max(db));
        }

        result.reverse();
        Ok(Shape::new(result))
    }
}

/// Maps a possibly negative `axis` over a tensor of rank `ndim` onto
/// `0..ndim`.
pub fn normalize_axis(axis: isize, ndim: usize) -> Result<usize> {
    let rank = ndim as isize;
    if ndim == 0 || axis < -rank || axis >= rank {
        return Err(TensorError::InvalidAxis { axis, ndim });
    }
    Ok(if axis < 0 { (rank + axis) as usize } else { axis as usize })
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]")
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Shape::new(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Shape::from_slice(dims)
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Shape::new(dims.to_vec())
    }
}
