use std::fmt;

// DType — Element types the kernel entry points are specialized over
//
//   F16  — 16-bit IEEE half float (stored as raw u16 bits on device)
//   BF16 — 16-bit brain float (stored as raw u16 bits on device)
//   F32  — 32-bit float
//   F64  — 64-bit float
//   U8   — unsigned byte, also the boolean-like mask type for where
//   U32  — unsigned 32-bit int
//   I64  — signed 64-bit int (ternary-select payloads only)
//
// There is no runtime dtype dispatch inside a kernel: the host picks the
// correctly specialized entry point for the live (index width, dtype)
// pair, and this enum is what it keys that choice on.

/// Enum of all supported element data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    F16,
    BF16,
    F32,
    F64,
    U8,
    U32,
    I64,
}

impl DType {
    /// Size of one element in bytes.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DType::F16 => 2,
            DType::BF16 => 2,
            DType::F32 => 4,
            DType::F64 => 8,
            DType::U8 => 1,
            DType::U32 => 4,
            DType::I64 => 8,
        }
    }

    /// The suffix used in specialized entry-point names (`emb_u32_f32`).
    pub fn suffix(&self) -> &'static str {
        match self {
            DType::F16 => "f16",
            DType::BF16 => "bf16",
            DType::F32 => "f32",
            DType::F64 => "f64",
            DType::U8 => "u8",
            DType::U32 => "u32",
            DType::I64 => "i64",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

// WithDType — bridge between Rust element types and the DType enum
//
// Implementing this for f32, half::f16, etc. lets the backends write one
// generic kernel per operation and instantiate it per concrete type, the
// same way the CUDA source instantiates one macro per (dtype, index) pair.

/// Trait implemented by Rust types that can be kernel payloads.
pub trait WithDType:
    Copy + Send + Sync + PartialEq + 'static + num_traits::NumCast + std::fmt::Debug
{
    /// The corresponding DType enum variant.
    const DTYPE: DType;
}

impl WithDType for half::f16 {
    const DTYPE: DType = DType::F16;
}

impl WithDType for half::bf16 {
    const DTYPE: DType = DType::BF16;
}

impl WithDType for f32 {
    const DTYPE: DType = DType::F32;
}

impl WithDType for f64 {
    const DTYPE: DType = DType::F64;
}

impl WithDType for u8 {
    const DTYPE: DType = DType::U8;
}

impl WithDType for u32 {
    const DTYPE: DType = DType::U32;
}

impl WithDType for i64 {
    const DTYPE: DType = DType::I64;
}

// IndexDType — the two supported index-buffer widths
//
// Index buffers are unsigned and either narrow (u8) or wide (u32); the
// width is part of every specialized entry-point name. Values are used as
// row/slot numbers, never arithmetic payloads.

/// Trait for the unsigned types an index buffer may hold.
pub trait IndexDType: WithDType {
    /// Widen an index value for addressing. No bounds check happens here
    /// or anywhere downstream; out-of-range values are a caller-contract
    /// violation.
    fn as_usize(self) -> usize;
}

impl IndexDType for u8 {
    #[inline(always)]
    fn as_usize(self) -> usize {
        self as usize
    }
}

impl IndexDType for u32 {
    #[inline(always)]
    fn as_usize(self) -> usize {
        self as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_size() {
        assert_eq!(DType::F16.size_in_bytes(), 2);
        assert_eq!(DType::BF16.size_in_bytes(), 2);
        assert_eq!(DType::F32.size_in_bytes(), 4);
        assert_eq!(DType::I64.size_in_bytes(), 8);
        assert_eq!(DType::U8.size_in_bytes(), 1);
    }

    #[test]
    fn test_suffix_matches_entry_point_naming() {
        assert_eq!(format!("emb_{}_{}", DType::U32, DType::F32), "emb_u32_f32");
        assert_eq!(
            format!("gather_{}_{}", DType::U8, DType::BF16),
            "gather_u8_bf16"
        );
        assert_eq!(
            format!("where_{}_{}", DType::U8, DType::I64),
            "where_u8_i64"
        );
    }

    #[test]
    fn test_with_dtype_tags() {
        assert_eq!(f32::DTYPE, DType::F32);
        assert_eq!(half::f16::DTYPE, DType::F16);
        assert_eq!(half::bf16::DTYPE, DType::BF16);
        assert_eq!(<u8 as WithDType>::DTYPE, DType::U8);
    }

    #[test]
    fn test_index_widening() {
        assert_eq!(IndexDType::as_usize(255u8), 255usize);
        assert_eq!(IndexDType::as_usize(70_000u32), 70_000usize);
    }
}
