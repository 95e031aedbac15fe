use half::{bf16, f16};

use strida_core::Layout;
use strida_cpu::{embedding, gather, index_select, where_cond};

// ---------------------------------------------------------------------------
// embedding
// ---------------------------------------------------------------------------

#[test]
fn embedding_rows_follow_ids() {
    // Table of 4 rows of width 3; ids [2, 0] pull rows out in id order.
    let table: Vec<f32> = (0..12).map(|v| v as f32).collect();
    let ids: Vec<u32> = vec![2, 0];
    let layout = Layout::contiguous(2);
    let mut out = vec![0f32; 6];
    embedding(&ids, &layout, &table, 3, 4, &mut out).unwrap();
    assert_eq!(out, vec![6.0, 7.0, 8.0, 0.0, 1.0, 2.0]);
}

#[test]
fn embedding_matches_row_reference() {
    let h = 5;
    let v = 7;
    let table: Vec<f64> = (0..v * h).map(|x| x as f64 * 0.5).collect();
    let ids: Vec<u8> = vec![6, 0, 3, 3, 1];
    let layout = Layout::contiguous(ids.len());
    let mut out = vec![0f64; ids.len() * h];
    embedding(&ids, &layout, &table, h, v, &mut out).unwrap();
    for (k, &id) in ids.iter().enumerate() {
        let id = id as usize;
        assert_eq!(&out[k * h..(k + 1) * h], &table[id * h..(id + 1) * h]);
    }
}

#[test]
fn embedding_strided_ids_read_in_logical_order() {
    // ids stored column-major: dims [2, 2], strides [1, 2]. Logical read
    // order is 0, 2, 1, 3 over the flat buffer.
    let table: Vec<u32> = (0..8).collect();
    let ids: Vec<u32> = vec![0, 2, 1, 3];
    let layout = Layout::new((2, 2), vec![1, 2], 0);
    let mut out = vec![0u32; 8];
    embedding(&ids, &layout, &table, 2, 4, &mut out).unwrap();
    assert_eq!(out, vec![0, 1, 2, 3, 4, 5, 6, 7]);
}

#[test]
fn embedding_narrowed_ids_view() {
    // ids [5] = [4,3,2,1,0] narrowed to positions 1..4: offset 1, reads 3,2,1.
    let table: Vec<f32> = (0..10).map(|v| v as f32 * 10.0).collect();
    let ids: Vec<u32> = vec![4, 3, 2, 1, 0];
    let layout = Layout::contiguous(5).narrow(0, 1, 3).unwrap();
    let mut out = vec![0f32; 6];
    embedding(&ids, &layout, &table, 2, 5, &mut out).unwrap();
    assert_eq!(out, vec![60.0, 70.0, 40.0, 50.0, 20.0, 30.0]);
}

// ---------------------------------------------------------------------------
// index_select
// ---------------------------------------------------------------------------

fn index_select_reference<T: Copy>(
    ids: &[usize],
    src: &[T],
    left: usize,
    dim: usize,
    right: usize,
) -> Vec<T> {
    let mut out = Vec::with_capacity(left * ids.len() * right);
    for j in 0..left {
        for &id in ids {
            let base = (j * dim + id) * right;
            out.extend_from_slice(&src[base..base + right]);
        }
    }
    out
}

#[test]
fn index_select_matches_reference_across_shapes() {
    for left in [1usize, 2, 5] {
        for dim in [1usize, 4] {
            for right in [1usize, 3] {
                let src: Vec<u32> = (0..left * dim * right).map(|x| x as u32).collect();
                let ids_usize: Vec<usize> = (0..dim).rev().chain(std::iter::once(0)).collect();
                let ids: Vec<u32> = ids_usize.iter().map(|&x| x as u32).collect();
                let layout = Layout::contiguous(ids.len());
                let mut out = vec![0u32; left * ids.len() * right];
                index_select(&ids, &layout, &src, left, dim, right, &mut out).unwrap();
                let expected = index_select_reference(&ids_usize, &src, left, dim, right);
                assert_eq!(out, expected, "left={left} dim={dim} right={right}");
            }
        }
    }
}

#[test]
fn index_select_narrow_index_width() {
    let src: Vec<i64> = (0..6).collect();
    let ids: Vec<u8> = vec![1, 1, 0];
    let layout = Layout::contiguous(3);
    let mut out = vec![0i64; 6];
    index_select(&ids, &layout, &src, 1, 3, 2, &mut out).unwrap();
    assert_eq!(out, vec![2, 3, 2, 3, 0, 1]);
}

// ---------------------------------------------------------------------------
// gather
// ---------------------------------------------------------------------------

fn gather_reference<T: Copy>(
    ids: &[usize],
    src: &[T],
    src_dim: usize,
    ids_dim: usize,
    right: usize,
) -> Vec<T> {
    ids.iter()
        .enumerate()
        .map(|(i, &idx)| {
            let post = i % right;
            let pre = i / (right * ids_dim);
            src[(pre * src_dim + idx) * right + post]
        })
        .collect()
}

#[test]
fn gather_matches_reference() {
    let (left, src_dim, ids_dim, right) = (2usize, 3usize, 2usize, 4usize);
    let src: Vec<f32> = (0..left * src_dim * right).map(|x| x as f32).collect();
    let ids_usize: Vec<usize> = (0..left * ids_dim * right).map(|i| (i * 7 + 3) % src_dim).collect();
    let ids: Vec<u32> = ids_usize.iter().map(|&x| x as u32).collect();
    let mut out = vec![0f32; ids.len()];
    gather(&ids, &src, left, src_dim, ids_dim, right, &mut out).unwrap();
    assert_eq!(out, gather_reference(&ids_usize, &src, src_dim, ids_dim, right));
}

#[test]
fn gather_narrow_index_width() {
    let src = vec![5u8, 6, 7];
    let ids: Vec<u8> = vec![2, 2, 0];
    let mut out = vec![0u8; 3];
    gather(&ids, &src, 1, 3, 3, 1, &mut out).unwrap();
    assert_eq!(out, vec![7, 7, 5]);
}

// ---------------------------------------------------------------------------
// where_cond
// ---------------------------------------------------------------------------

#[test]
fn where_contiguous_select() {
    let dims = [2usize, 2];
    let strides = [2usize, 1];
    let ids: Vec<u8> = vec![1, 0, 1, 0];
    let t = vec![10f32, 20.0, 30.0, 40.0];
    let f = vec![100f32, 200.0, 300.0, 400.0];
    let mut out = vec![0f32; 4];
    where_cond(&dims, &ids, &strides, &t, &strides, &f, &strides, &mut out).unwrap();
    assert_eq!(out, vec![10.0, 200.0, 30.0, 400.0]);
}

#[test]
fn where_cross_wired_stride_tables() {
    // The then/else operands carry *different* stride tables. The kernel
    // resolves the then operand through the else table and vice versa;
    // this pins that wiring against well-meaning "fixes".
    let dims = [2usize, 2];
    let ids: Vec<u8> = vec![1, 0, 1, 0];
    let t = vec![100i64, 101, 102, 103];
    let f = vec![200i64, 201, 202, 203];
    let t_strides = [1usize, 2]; // transposed view, non-contiguous
    let f_strides = [2usize, 1]; // contiguous
    let mut out = vec![0i64; 4];
    where_cond(&dims, &ids, &[2, 1], &t, &t_strides, &f, &f_strides, &mut out).unwrap();
    // then reads flat (else table is contiguous), else reads transposed
    // (then table): f offsets for i = 1, 3 are 2 and 3.
    assert_eq!(out, vec![100, 202, 102, 203]);
}

#[test]
fn where_fast_path_matches_general_path() {
    // dims [n, 1] with a bogus trailing stride de-triggers the contiguity
    // fast path without changing any resolved offset.
    let n = 17usize;
    let ids: Vec<u32> = (0..n as u32).map(|i| i % 3).collect();
    let t: Vec<f64> = (0..n).map(|i| i as f64 + 0.25).collect();
    let f: Vec<f64> = (0..n).map(|i| -(i as f64)).collect();

    let mut fast = vec![0f64; n];
    where_cond(&[n], &ids, &[1], &t, &[1], &f, &[1], &mut fast).unwrap();

    let mut general = vec![0f64; n];
    where_cond(&[n, 1], &ids, &[1, 5], &t, &[1, 5], &f, &[1, 5], &mut general).unwrap();

    assert_eq!(fast, general);
}

// ---------------------------------------------------------------------------
// 16-bit float payloads pass through untouched
// ---------------------------------------------------------------------------

#[test]
fn embedding_preserves_f16_bits() {
    let table = vec![
        f16::from_f32(1.5),
        f16::from_bits(0x7c01), // NaN payload
        f16::from_bits(0x0001), // subnormal
        f16::NEG_INFINITY,
    ];
    let ids: Vec<u32> = vec![1, 2, 3, 0];
    let layout = Layout::contiguous(4);
    let mut out = vec![f16::ZERO; 4];
    embedding(&ids, &layout, &table, 1, 4, &mut out).unwrap();
    let bits: Vec<u16> = out.iter().map(|v| v.to_bits()).collect();
    assert_eq!(bits, vec![0x7c01, 0x0001, 0xfc00, f16::from_f32(1.5).to_bits()]);
}

#[test]
fn where_preserves_bf16_bits() {
    let dims = [3usize];
    let strides = [1usize];
    let ids: Vec<u8> = vec![1, 0, 1];
    let t = vec![bf16::from_bits(0x7f81), bf16::ONE, bf16::from_bits(0x0001)];
    let f = vec![bf16::ZERO, bf16::from_bits(0xff80), bf16::ZERO];
    let mut out = vec![bf16::ZERO; 3];
    where_cond(&dims, &ids, &strides, &t, &strides, &f, &strides, &mut out).unwrap();
    let bits: Vec<u16> = out.iter().map(|v| v.to_bits()).collect();
    assert_eq!(bits, vec![0x7f81, 0xff80, 0x0001]);
}
