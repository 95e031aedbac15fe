use crate::error::{Error, Result};
use crate::shape::Shape;

// Layout — Memory layout of a tensor view (shape + strides + offset)
//
// The layout decouples the *logical* shape of a tensor from how its data
// is arranged in memory. Transposes and slices are "free" (no data copy,
// just a different layout), which is exactly why the kernels must be able
// to walk a non-contiguous index buffer.
//
// The two functions every kernel shares live here:
//
//   strided_index — maps a linear position over the logical iteration
//                   space to the physical offset in the backing buffer
//   is_contiguous — detects a fully packed row-major layout, letting
//                   kernels skip the per-element div/mod chain entirely

/// Resolve a linear index over a view's row-major iteration space into the
/// physical offset described by `dims`/`strides`.
///
/// Decomposes `i` from the last dimension backward: at each step
/// `i % dims[d]` is the coordinate in dimension `d`, accumulated as
/// `coord * strides[d]`, then `i /= dims[d]` and continue toward dim 0.
/// Pure, O(rank). `dims` and `strides` must be the same length and in the
/// same dimension order.
#[inline]
pub fn strided_index(mut i: usize, dims: &[usize], strides: &[usize]) -> usize {
    let mut offset = 0;
    for d in (0..dims.len()).rev() {
        offset += (i % dims[d]) * strides[d];
        i /= dims[d];
    }
    offset
}

/// True iff `strides` exactly match the packed row-major strides implied
/// by `dims`: stride[last] = 1 and stride[d] = stride[d+1] * dims[d+1].
///
/// When this holds, logical position == physical offset, and every kernel
/// takes the direct linear-copy path instead of resolving per element.
#[inline]
pub fn is_contiguous(dims: &[usize], strides: &[usize]) -> bool {
    if dims.len() != strides.len() {
        return false;
    }
    let mut acc = 1;
    for d in (0..dims.len()).rev() {
        if strides[d] != acc {
            return false;
        }
        acc *= dims[d];
    }
    true
}

/// Smallest buffer length (in elements) that every offset produced by
/// `strided_index` over `dims`/`strides` stays within. Used for host-side
/// buffer validation before dispatch; zero if the view is empty.
pub fn min_buffer_len(dims: &[usize], strides: &[usize]) -> usize {
    if dims.iter().any(|&d| d == 0) {
        return 0;
    }
    1 + dims
        .iter()
        .zip(strides.iter())
        .map(|(&d, &s)| (d - 1) * s)
        .sum::<usize>()
}

/// Layout describes how a view's logical shape maps to flat storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    shape: Shape,
    strides: Vec<usize>,
    /// Offset into the storage buffer where this view's data starts.
    /// Set by slicing/narrow operations; zero for a fresh buffer.
    offset: usize,
}

impl Layout {
    /// Create a new contiguous layout for the given shape.
    /// Strides are computed as row-major (C-order).
    pub fn contiguous(shape: impl Into<Shape>) -> Self {
        let shape = shape.into();
        let strides = shape.stride_contiguous();
        Layout {
            shape,
            strides,
            offset: 0,
        }
    }

    /// Create a layout with explicit strides and offset (for views).
    pub fn new(shape: impl Into<Shape>, strides: Vec<usize>, offset: usize) -> Self {
        Layout {
            shape: shape.into(),
            strides,
            offset,
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    pub fn elem_count(&self) -> usize {
        self.shape.elem_count()
    }

    /// Check if this layout is contiguous (row-major, no gaps, offset 0).
    pub fn is_contiguous(&self) -> bool {
        self.offset == 0 && is_contiguous(self.dims(), &self.strides)
    }

    /// Resolve logical position `i` to a physical offset, including the
    /// layout's base offset.
    #[inline]
    pub fn strided_index(&self, i: usize) -> usize {
        self.offset + strided_index(i, self.dims(), &self.strides)
    }

    /// Smallest backing-buffer length this layout can address into.
    pub fn min_buffer_len(&self) -> usize {
        let n = min_buffer_len(self.dims(), &self.strides);
        if n == 0 {
            0
        } else {
            self.offset + n
        }
    }

    /// Transpose two dimensions. Returns a new layout with swapped
    /// shape/strides — a "free" operation, no data movement.
    ///
    /// Example: [2, 3, 4] transpose(0, 2) → [4, 3, 2]
    ///          strides [12, 4, 1]         → [1, 4, 12]
    pub fn transpose(&self, dim0: usize, dim1: usize) -> Result<Layout> {
        let rank = self.rank();
        if dim0 >= rank || dim1 >= rank {
            return Err(Error::DimOutOfRange {
                dim: dim0.max(dim1),
                rank,
            });
        }
        let mut new_dims = self.shape.dims().to_vec();
        let mut new_strides = self.strides.clone();
        new_dims.swap(dim0, dim1);
        new_strides.swap(dim0, dim1);
        Ok(Layout::new(Shape::new(new_dims), new_strides, self.offset))
    }

    /// Narrow (slice) along a dimension. Returns a view layout with
    /// adjusted shape and offset into the same storage.
    pub fn narrow(&self, dim: usize, start: usize, len: usize) -> Result<Layout> {
        let rank = self.rank();
        if dim >= rank {
            return Err(Error::DimOutOfRange { dim, rank });
        }
        let dim_size = self.shape.dims()[dim];
        if start + len > dim_size {
            return Err(Error::NarrowOutOfBounds {
                dim,
                start,
                len,
                dim_size,
            });
        }
        let mut new_dims = self.shape.dims().to_vec();
        new_dims[dim] = len;
        let new_offset = self.offset + start * self.strides[dim];
        Ok(Layout::new(
            Shape::new(new_dims),
            self.strides.clone(),
            new_offset,
        ))
    }

    /// Iterator over all physical offsets of this layout, in logical order.
    /// The nested-coordinate reference form of [`strided_index`]; the tests
    /// hold the two implementations against each other.
    pub fn strided_indices(&self) -> StridedIter {
        StridedIter::new(self)
    }
}

// StridedIter — walks logical elements in order, yielding physical offsets
//
// For a contiguous layout this counts offset, offset+1, offset+2, ...
// For a transposed or narrowed layout it jumps following the strides.

/// Iterator that yields the physical offset of each element of a Layout.
pub struct StridedIter {
    /// Current multi-dimensional coordinate (e.g., [0, 0, 0]).
    current: Vec<usize>,
    dims: Vec<usize>,
    strides: Vec<usize>,
    offset: usize,
    remaining: usize,
    started: bool,
}

impl StridedIter {
    fn new(layout: &Layout) -> Self {
        let rank = layout.rank();
        StridedIter {
            current: vec![0; rank],
            dims: layout.dims().to_vec(),
            strides: layout.strides().to_vec(),
            offset: layout.offset(),
            remaining: layout.elem_count(),
            started: false,
        }
    }

    fn flat_index(&self) -> usize {
        let mut idx = self.offset;
        for i in 0..self.current.len() {
            idx += self.current[i] * self.strides[i];
        }
        idx
    }

    /// Advance the coordinate by one, rightmost dimension first.
    fn advance(&mut self) {
        let rank = self.dims.len();
        for i in (0..rank).rev() {
            self.current[i] += 1;
            if self.current[i] < self.dims[i] {
                return;
            }
            self.current[i] = 0;
        }
    }
}

impl Iterator for StridedIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        if self.started {
            self.advance();
        }
        self.started = true;
        self.remaining -= 1;
        Some(self.flat_index())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for StridedIter {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::Shape;

    #[test]
    fn test_contiguous_layout() {
        let layout = Layout::contiguous((2, 3));
        assert!(layout.is_contiguous());
        assert_eq!(layout.strides(), &[3, 1]);
        assert_eq!(layout.offset(), 0);
    }

    #[test]
    fn test_is_contiguous_exact() {
        // True exactly for the packed strides, false for anything else.
        assert!(is_contiguous(&[2, 3, 4], &[12, 4, 1]));
        assert!(!is_contiguous(&[2, 3, 4], &[12, 4, 2]));
        assert!(!is_contiguous(&[2, 3, 4], &[1, 4, 12]));
        assert!(!is_contiguous(&[2, 3, 4], &[12, 4]));
        // Scalar: empty dims/strides are trivially packed.
        assert!(is_contiguous(&[], &[]));
    }

    #[test]
    fn test_resolver_identity_on_contiguous() {
        let layout = Layout::contiguous((2, 3));
        for i in 0..6 {
            assert_eq!(layout.strided_index(i), i);
        }
    }

    #[test]
    fn test_resolver_matches_reference_decomposition() {
        // The div/mod resolver must agree with the nested-coordinate walk
        // on every position of a transposed (non-contiguous) view.
        let layout = Layout::contiguous((2, 3, 4)).transpose(0, 2).unwrap();
        assert!(!layout.is_contiguous());
        let reference: Vec<usize> = layout.strided_indices().collect();
        for (i, &expected) in reference.iter().enumerate() {
            assert_eq!(layout.strided_index(i), expected, "position {i}");
        }
    }

    #[test]
    fn test_resolver_with_narrow_offset() {
        // [4, 6] narrow(dim=1, start=2, len=3): offset 2, strides [6, 1].
        let layout = Layout::contiguous((4, 6)).narrow(1, 2, 3).unwrap();
        assert_eq!(layout.offset(), 2);
        let reference: Vec<usize> = layout.strided_indices().collect();
        for (i, &expected) in reference.iter().enumerate() {
            assert_eq!(layout.strided_index(i), expected, "position {i}");
        }
    }

    #[test]
    fn test_transpose_indices() {
        // Original [2,3] read transposed as [3,2] yields offsets 0,3,1,4,2,5.
        let layout = Layout::contiguous((2, 3)).transpose(0, 1).unwrap();
        let indices: Vec<usize> = layout.strided_indices().collect();
        assert_eq!(indices, vec![0, 3, 1, 4, 2, 5]);
    }

    #[test]
    fn test_narrow_out_of_bounds() {
        let layout = Layout::contiguous((4, 6));
        assert!(layout.narrow(1, 5, 3).is_err()); // 5+3 = 8 > 6
    }

    #[test]
    fn test_min_buffer_len() {
        assert_eq!(min_buffer_len(&[2, 3], &[3, 1]), 6);
        // Transposed view of the same buffer still needs all 6 elements.
        assert_eq!(min_buffer_len(&[3, 2], &[1, 3]), 6);
        // A broadcast-ish zero stride collapses the requirement.
        assert_eq!(min_buffer_len(&[5], &[0]), 1);
        assert_eq!(min_buffer_len(&[0, 3], &[3, 1]), 0);
        let narrowed = Layout::contiguous((4, 6)).narrow(1, 2, 3).unwrap();
        // Offsets reach 2 + 3*6 + 2 = 22, so 23 elements must back it.
        assert_eq!(narrowed.min_buffer_len(), 23);
    }

    #[test]
    fn test_shape_accessors() {
        let layout = Layout::new(Shape::from((2, 2)), vec![1, 2], 0);
        assert_eq!(layout.rank(), 2);
        assert_eq!(layout.elem_count(), 4);
        assert!(!layout.is_contiguous());
    }
}
