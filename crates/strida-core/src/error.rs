use crate::shape::Shape;

/// All errors surfaced by the strida host layer.
///
/// These cover host-boundary validation only: descriptor consistency,
/// buffer sizing, and dtype pairing checked *before* a kernel is
/// dispatched. The kernels themselves have no error channel — an
/// out-of-range index value is undefined behavior on the CUDA backend
/// and a panic on the CPU backend, never an `Err`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A descriptor's dims and strides sequences have different lengths.
    #[error("stride mismatch: {dims} dims but {strides} strides")]
    StrideMismatch { dims: usize, strides: usize },

    /// Operation requires a specific rank (number of dimensions).
    #[error("rank mismatch: expected rank {expected}, got {got}")]
    RankMismatch { expected: usize, got: usize },

    /// Dimension index out of range for the descriptor's rank.
    #[error("dimension out of range: dim {dim} for descriptor with {rank} dimensions")]
    DimOutOfRange { dim: usize, rank: usize },

    /// Narrow/slice operation out of bounds.
    #[error("narrow out of bounds: dim {dim}, start {start}, len {len}, dim_size {dim_size}")]
    NarrowOutOfBounds {
        dim: usize,
        start: usize,
        len: usize,
        dim_size: usize,
    },

    /// A caller-owned buffer is smaller than its descriptor requires.
    #[error("buffer too small for {what}: need {expected} elements, got {got}")]
    BufferTooSmall {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    /// Element count mismatch between a buffer and its shape.
    #[error("element count mismatch: shape {shape} requires {expected} elements, got {got}")]
    ElementCountMismatch {
        shape: Shape,
        expected: usize,
        got: usize,
    },

    /// DType mismatch between operands of one launch.
    #[error("dtype mismatch: expected {expected:?}, got {got:?}")]
    DTypeMismatch {
        expected: crate::DType,
        got: crate::DType,
    },

    /// Generic message for cases not covered above.
    #[error("{0}")]
    Msg(String),
}

impl Error {
    /// Create an error from any string message.
    pub fn msg(s: impl Into<String>) -> Self {
        Error::Msg(s.into())
    }
}

/// Convenience Result type used throughout strida.
pub type Result<T> = std::result::Result<T, Error>;

/// Macro for early return with a formatted error message.
/// Usage: `bail!("something went wrong: {}", detail)`
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::Error::Msg(format!($($arg)*)))
    };
}
