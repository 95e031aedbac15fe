//! # strida-core
//!
//! Host-side primitives shared by every strida kernel backend.
//!
//! This crate provides:
//! - [`Shape`] / [`Layout`] — dims, strides, and offset of a tensor view
//! - [`strided_index`] — the strided-index resolver mapping a linear output
//!   position to a physical source offset
//! - [`is_contiguous`] — the packed-layout check enabling the linear-copy
//!   fast path
//! - [`DType`] / [`WithDType`] / [`IndexDType`] — element and index-width
//!   types the kernel entry points are specialized over
//!
//! The kernels themselves live in the backend crates (`strida-cpu`,
//! `strida-cuda`); this crate is pure host logic with no parallelism and
//! no device dependencies.

pub mod dtype;
pub mod error;
pub mod layout;
pub mod shape;

pub use dtype::{DType, IndexDType, WithDType};
pub use error::{Error, Result};
pub use layout::{is_contiguous, min_buffer_len, strided_index, Layout, StridedIter};
pub use shape::Shape;
