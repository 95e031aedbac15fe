use rayon::prelude::*;

use strida_core::{Error, IndexDType, Layout, Result, WithDType};

/// Generalized gather along a middle dimension, replicated across an
/// outer block.
///
/// The source is conceptually `[left_size, dim_size, right_size]`. For
/// each index entry `i` and each `j` in `[0, left_size)`, a
/// `right_size`-element block is copied from
/// `src[(j*dim_size + ids[i]) * right_size ..]` to
/// `out[(i + j*numel) * right_size ..]`, laying the output out as
/// `[left_size, numel, right_size]` — a different physical order than the
/// source. The index buffer may be a strided view; `ids_layout` resolves
/// its positions.
///
/// # Panics
///
/// An index value `>= dim_size` panics on the source slice access
/// (unchecked caller contract, as with [`crate::embedding`]).
pub fn index_select<I: IndexDType, T: WithDType>(
    ids: &[I],
    ids_layout: &Layout,
    src: &[T],
    left_size: usize,
    dim_size: usize,
    right_size: usize,
    out: &mut [T],
) -> Result<()> {
    if ids_layout.dims().len() != ids_layout.strides().len() {
        return Err(Error::StrideMismatch {
            dims: ids_layout.dims().len(),
            strides: ids_layout.strides().len(),
        });
    }
    let numel = ids_layout.elem_count();
    if ids.len() < ids_layout.min_buffer_len() {
        return Err(Error::BufferTooSmall {
            what: "index buffer",
            expected: ids_layout.min_buffer_len(),
            got: ids.len(),
        });
    }
    if src.len() != left_size * dim_size * right_size {
        return Err(Error::BufferTooSmall {
            what: "source buffer",
            expected: left_size * dim_size * right_size,
            got: src.len(),
        });
    }
    if out.len() != left_size * numel * right_size {
        return Err(Error::BufferTooSmall {
            what: "output buffer",
            expected: left_size * numel * right_size,
            got: out.len(),
        });
    }
    if out.is_empty() {
        return Ok(());
    }

    let contiguous = ids_layout.is_contiguous();
    // Output block k sits at offset k*right_size = (i + j*numel)*right_size,
    // so k decomposes as j = k / numel, i = k % numel.
    out.par_chunks_mut(right_size)
        .enumerate()
        .for_each(|(k, block)| {
            let j = k / numel;
            let i = k % numel;
            let pos = if contiguous {
                i
            } else {
                ids_layout.strided_index(i)
            };
            let id = ids[pos].as_usize();
            let start = (j * dim_size + id) * right_size;
            block.copy_from_slice(&src[start..start + right_size]);
        });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_middle_dim() {
        // src = [2, 3, 2] counted 0..12; select ids [2, 0] along dim 1.
        let src: Vec<f32> = (0..12).map(|v| v as f32).collect();
        let ids: Vec<u32> = vec![2, 0];
        let mut out = vec![0f32; 2 * 2 * 2];
        index_select(&ids, &Layout::contiguous(2), &src, 2, 3, 2, &mut out).unwrap();
        // j=0: blocks (2, 0) of the first slab; j=1: same rows of the second.
        assert_eq!(out, vec![4.0, 5.0, 0.0, 1.0, 10.0, 11.0, 6.0, 7.0]);
    }

    #[test]
    fn test_strided_ids() {
        let src: Vec<u32> = (0..4).collect();
        // ids read through a transposed [2,2] view (strides [1,2]):
        // logical order 0, 2, 1, 3.
        let ids: Vec<u8> = vec![0, 1, 2, 3];
        let ids_l = Layout::contiguous((2, 2)).transpose(0, 1).unwrap();
        let mut out = vec![0u32; 4];
        index_select(&ids, &ids_l, &src, 1, 4, 1, &mut out).unwrap();
        assert_eq!(out, vec![0, 2, 1, 3]);
    }

    #[test]
    fn test_source_size_validated() {
        let src = vec![0f32; 5]; // needs 6 for left=1, dim=3, right=2
        let ids: Vec<u32> = vec![0];
        let mut out = vec![0f32; 2];
        assert!(index_select(&ids, &Layout::contiguous(1), &src, 1, 3, 2, &mut out).is_err());
    }
}
