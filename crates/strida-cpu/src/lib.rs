//! # strida-cpu
//!
//! CPU backend for the strida gather kernels.
//!
//! Each operation is a stateless function over caller-owned slices: the
//! caller allocates the output, supplies the shape/stride descriptors and
//! partition sizes, and picks the concrete `(index width, element type)`
//! instantiation — the same host contract the CUDA entry points follow,
//! with Rust generics standing in for the specialized kernel names.
//!
//! Execution model: a bounded rayon worker pool where each worker owns a
//! disjoint chunk of the output. No element is written by more than one
//! worker and no synchronization is needed, mirroring the grid-stride
//! model of the GPU backend.
//!
//! Index values are never bounds-checked against the indexed dimension.
//! On this backend an out-of-range id panics on the slice access; callers
//! are expected to validate index ranges before dispatch.

pub mod embedding;
pub mod gather;
pub mod index_select;
pub mod where_cond;

pub use embedding::embedding;
pub use gather::gather;
pub use index_select::index_select;
pub use where_cond::where_cond;
