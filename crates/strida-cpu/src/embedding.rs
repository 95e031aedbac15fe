use rayon::prelude::*;

use strida_core::{Error, IndexDType, Layout, Result, WithDType};

/// Embedding lookup: copy one full row of `src` per index value.
///
/// `src` is a `[v_size, h_size]` table; for every output row `i` the id at
/// logical position `i` of the index buffer (resolved through
/// `ids_layout`, which may describe a strided view) selects the source
/// row, and `h_size` elements are copied into `out[i*h_size..]`. The
/// source table and output rows are assumed contiguous per row; only the
/// index buffer may be strided.
///
/// `v_size` sizes the table for host-side buffer validation; it is *not*
/// enforced against individual index values.
///
/// # Panics
///
/// An index value `>= v_size` panics on the source slice access. Index
/// ranges are the caller's contract, checked before dispatch, never here.
pub fn embedding<I: IndexDType, T: WithDType>(
    ids: &[I],
    ids_layout: &Layout,
    src: &[T],
    h_size: usize,
    v_size: usize,
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
    if src.len() != v_size * h_size {
        return Err(Error::BufferTooSmall {
            what: "source table",
            expected: v_size * h_size,
            got: src.len(),
        });
    }
    if out.len() != numel * h_size {
        return Err(Error::BufferTooSmall {
            what: "output buffer",
            expected: numel * h_size,
            got: out.len(),
        });
    }
    if out.is_empty() {
        return Ok(());
    }

    // Contiguity is hoisted out of the loop: position == offset on the
    // packed path, otherwise each row resolves its id position once.
    let contiguous = ids_layout.is_contiguous();
    out.par_chunks_mut(h_size).enumerate().for_each(|(i, row)| {
        let pos = if contiguous {
            i
        } else {
            ids_layout.strided_index(i)
        };
        let id = ids[pos].as_usize();
        row.copy_from_slice(&src[id * h_size..id * h_size + h_size]);
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_follow_ids() {
        // src [[1,2,3],[4,5,6],[7,8,9]], ids [2,0] → [[7,8,9],[1,2,3]]
        let src: Vec<f32> = (1..=9).map(|v| v as f32).collect();
        let ids: Vec<u32> = vec![2, 0];
        let mut out = vec![0f32; 6];
        embedding(&ids, &Layout::contiguous(2), &src, 3, 3, &mut out).unwrap();
        assert_eq!(out, vec![7.0, 8.0, 9.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_narrow_index_width() {
        let src: Vec<u32> = (0..8).collect();
        let ids: Vec<u8> = vec![3, 3, 0];
        let mut out = vec![0u32; 6];
        embedding(&ids, &Layout::contiguous(3), &src, 2, 4, &mut out).unwrap();
        assert_eq!(out, vec![6, 7, 6, 7, 0, 1]);
    }

    #[test]
    fn test_strided_index_buffer() {
        // ids stored as a [2, 3] buffer, read through its transpose [3, 2]:
        // logical order becomes 10,13,11,14,12,15.
        let src: Vec<f32> = (0..32).map(|v| v as f32).collect();
        let ids: Vec<u32> = vec![10, 11, 12, 13, 14, 15];
        let ids_l = Layout::contiguous((2, 3)).transpose(0, 1).unwrap();
        let mut out = vec![0f32; 6];
        embedding(&ids, &ids_l, &src, 1, 32, &mut out).unwrap();
        assert_eq!(out, vec![10.0, 13.0, 11.0, 14.0, 12.0, 15.0]);
    }

    #[test]
    fn test_output_size_validated() {
        let src = vec![0f32; 6];
        let ids: Vec<u32> = vec![0, 1];
        let mut out = vec![0f32; 5]; // needs 6
        assert!(embedding(&ids, &Layout::contiguous(2), &src, 3, 2, &mut out).is_err());
    }
}
