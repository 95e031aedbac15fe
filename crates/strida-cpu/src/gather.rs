use rayon::prelude::*;

use strida_core::{Error, IndexDType, Result, WithDType};

/// Flat single-element gather along a middle dimension.
///
/// Purely arithmetic addressing, one element per output position: for
/// output index `i`,
///
/// ```text
/// post = i % right_size
/// pre  = i / (right_size * ids_dim_size)
/// out[i] = src[(pre * src_dim_size + ids[i]) * right_size + post]
/// ```
///
/// The index buffer carries one id per output element and *must* be
/// contiguous — no descriptor is taken and no runtime check exists; a
/// strided index buffer silently produces wrong results (caller
/// contract).
///
/// # Panics
///
/// An index value `>= src_dim_size` panics on the source slice access.
pub fn gather<I: IndexDType, T: WithDType>(
    ids: &[I],
    src: &[T],
    left_size: usize,
    src_dim_size: usize,
    ids_dim_size: usize,
    right_size: usize,
    out: &mut [T],
) -> Result<()> {
    let numel = left_size * ids_dim_size * right_size;
    if ids.len() != numel {
        return Err(Error::BufferTooSmall {
            what: "index buffer",
            expected: numel,
            got: ids.len(),
        });
    }
    if src.len() != left_size * src_dim_size * right_size {
        return Err(Error::BufferTooSmall {
            what: "source buffer",
            expected: left_size * src_dim_size * right_size,
            got: src.len(),
        });
    }
    if out.len() != numel {
        return Err(Error::BufferTooSmall {
            what: "output buffer",
            expected: numel,
            got: out.len(),
        });
    }

    out.par_iter_mut().enumerate().for_each(|(i, o)| {
        let post = i % right_size;
        let idx = ids[i].as_usize();
        let pre = i / (right_size * ids_dim_size);
        *o = src[(pre * src_dim_size + idx) * right_size + post];
    });
    Ok(())
}
