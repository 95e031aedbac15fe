// CUDA Backend — GPU execution of the gather kernel family via cudarc
//
// This crate owns the device side of strida. All kernels are NVRTC-compiled
// from the string constant in `kernels` when a CudaDevice is created, then
// dispatched by composed entry-point name (<op>_<indexwidth>_<dtype>).
//
// ARCHITECTURE:
// - CudaDevice wraps cudarc's device handle; creation compiles the module
// - CudaStorage is an enum over CudaSlice<T> for each supported dtype
// - F16 and BF16 are stored as CudaSlice<u16>; the kernels never do
//   arithmetic on values, so bit patterns pass through untouched
// - Shape descriptors are flattened to one device buffer of u32
//   ([dims..., strides...]) per launch; contiguity is re-derived on device
// - Launch functions validate descriptors and buffer sizes up front, then
//   trust the kernels: out-of-range index *values* are not checked anywhere
//
// USAGE:
//   let dev = CudaDevice::new(0)?;                 // GPU ordinal 0
//   let ids = dev.htod_u32(&[2, 0])?;
//   let out = embedding(&dev, &ids, &layout, &table, 3, 4)?;

mod kernels;

use std::fmt;
use std::sync::Arc;

use cudarc::driver::{
    CudaSlice, DeviceRepr, DeviceSlice, LaunchAsync, LaunchConfig, ValidAsZeroBits,
};
use cudarc::nvrtc::{compile_ptx_with_opts, CompileOptions};
use half::{bf16, f16};

use strida_core::{bail, DType, Error, Layout, Result};

// CudaDevice — wraps a cudarc CUDA device with the compiled kernel module

/// A CUDA device handle. Clonable (uses Arc internally).
pub struct CudaDevice {
    dev: Arc<cudarc::driver::CudaDevice>,
    ordinal: usize,
}

impl CudaDevice {
    /// Create a new CUDA device for the given GPU ordinal (0, 1, ...).
    /// Compiles and loads all strida kernels on first creation.
    pub fn new(ordinal: usize) -> Result<Self> {
        let dev = cudarc::driver::CudaDevice::new(ordinal)
            .map_err(|e| Error::msg(format!("CUDA device creation failed: {e}")))?;

        // Query the device compute capability and target it with NVRTC.
        // Use sm_XX (native SASS) instead of compute_XX (PTX) to avoid
        // PTX version mismatches between toolkit and driver versions.
        let major = dev
            .attribute(cudarc::driver::sys::CUdevice_attribute_enum::CU_DEVICE_ATTRIBUTE_COMPUTE_CAPABILITY_MAJOR)
            .unwrap_or(8);
        let minor = dev
            .attribute(cudarc::driver::sys::CUdevice_attribute_enum::CU_DEVICE_ATTRIBUTE_COMPUTE_CAPABILITY_MINOR)
            .unwrap_or(9);
        let arch_str: &'static str = Box::leak(format!("sm_{major}{minor}").into_boxed_str());
        let opts = CompileOptions {
            arch: Some(arch_str),
            ..Default::default()
        };
        let ptx = compile_ptx_with_opts(kernels::KERNEL_SOURCE, opts)
            .map_err(|e| Error::msg(format!("NVRTC compilation failed: {e}")))?;
        dev.load_ptx(ptx, kernels::MODULE_NAME, kernels::KERNEL_NAMES)
            .map_err(|e| Error::msg(format!("PTX load failed: {e}")))?;

        Ok(CudaDevice { dev, ordinal })
    }

    /// Get the underlying cudarc device handle.
    pub fn device(&self) -> &Arc<cudarc::driver::CudaDevice> {
        &self.dev
    }

    /// Get a compiled kernel function by name.
    fn get_func(&self, name: &str) -> Result<cudarc::driver::CudaFunction> {
        self.dev
            .get_func(kernels::MODULE_NAME, name)
            .ok_or_else(|| Error::msg(format!("CUDA kernel '{name}' not found")))
    }

    // ── Host ↔ device transfer ───────────────────────────────────────────

    pub fn htod_f16(&self, data: &[f16]) -> Result<CudaStorage> {
        let host: Vec<u16> = data.iter().map(|v| v.to_bits()).collect();
        let s = self
            .dev
            .htod_copy(host)
            .map_err(|e| Error::msg(format!("htod f16: {e}")))?;
        Ok(CudaStorage::F16(s))
    }

    pub fn htod_bf16(&self, data: &[bf16]) -> Result<CudaStorage> {
        let host: Vec<u16> = data.iter().map(|v| v.to_bits()).collect();
        let s = self
            .dev
            .htod_copy(host)
            .map_err(|e| Error::msg(format!("htod bf16: {e}")))?;
        Ok(CudaStorage::BF16(s))
    }

    pub fn htod_f32(&self, data: &[f32]) -> Result<CudaStorage> {
        let s = self
            .dev
            .htod_copy(data.to_vec())
            .map_err(|e| Error::msg(format!("htod f32: {e}")))?;
        Ok(CudaStorage::F32(s))
    }

    pub fn htod_f64(&self, data: &[f64]) -> Result<CudaStorage> {
        let s = self
            .dev
            .htod_copy(data.to_vec())
            .map_err(|e| Error::msg(format!("htod f64: {e}")))?;
        Ok(CudaStorage::F64(s))
    }

    pub fn htod_u8(&self, data: &[u8]) -> Result<CudaStorage> {
        let s = self
            .dev
            .htod_copy(data.to_vec())
            .map_err(|e| Error::msg(format!("htod u8: {e}")))?;
        Ok(CudaStorage::U8(s))
    }

    pub fn htod_u32(&self, data: &[u32]) -> Result<CudaStorage> {
        let s = self
            .dev
            .htod_copy(data.to_vec())
            .map_err(|e| Error::msg(format!("htod u32: {e}")))?;
        Ok(CudaStorage::U32(s))
    }

    pub fn htod_i64(&self, data: &[i64]) -> Result<CudaStorage> {
        let s = self
            .dev
            .htod_copy(data.to_vec())
            .map_err(|e| Error::msg(format!("htod i64: {e}")))?;
        Ok(CudaStorage::I64(s))
    }

    pub fn dtoh_f16(&self, storage: &CudaStorage) -> Result<Vec<f16>> {
        match storage {
            CudaStorage::F16(s) => {
                let bits = self
                    .dev
                    .dtoh_sync_copy(s)
                    .map_err(|e| Error::msg(format!("dtoh f16: {e}")))?;
                Ok(bits.into_iter().map(f16::from_bits).collect())
            }
            _ => Err(Error::DTypeMismatch {
                expected: DType::F16,
                got: storage.dtype(),
            }),
        }
    }

    pub fn dtoh_bf16(&self, storage: &CudaStorage) -> Result<Vec<bf16>> {
        match storage {
            CudaStorage::BF16(s) => {
                let bits = self
                    .dev
                    .dtoh_sync_copy(s)
                    .map_err(|e| Error::msg(format!("dtoh bf16: {e}")))?;
                Ok(bits.into_iter().map(bf16::from_bits).collect())
            }
            _ => Err(Error::DTypeMismatch {
                expected: DType::BF16,
                got: storage.dtype(),
            }),
        }
    }

    pub fn dtoh_f32(&self, storage: &CudaStorage) -> Result<Vec<f32>> {
        match storage {
            CudaStorage::F32(s) => self
                .dev
                .dtoh_sync_copy(s)
                .map_err(|e| Error::msg(format!("dtoh f32: {e}"))),
            _ => Err(Error::DTypeMismatch {
                expected: DType::F32,
                got: storage.dtype(),
            }),
        }
    }

    pub fn dtoh_f64(&self, storage: &CudaStorage) -> Result<Vec<f64>> {
        match storage {
            CudaStorage::F64(s) => self
                .dev
                .dtoh_sync_copy(s)
                .map_err(|e| Error::msg(format!("dtoh f64: {e}"))),
            _ => Err(Error::DTypeMismatch {
                expected: DType::F64,
                got: storage.dtype(),
            }),
        }
    }

    pub fn dtoh_u8(&self, storage: &CudaStorage) -> Result<Vec<u8>> {
        match storage {
            CudaStorage::U8(s) => self
                .dev
                .dtoh_sync_copy(s)
                .map_err(|e| Error::msg(format!("dtoh u8: {e}"))),
            _ => Err(Error::DTypeMismatch {
                expected: DType::U8,
                got: storage.dtype(),
            }),
        }
    }

    pub fn dtoh_u32(&self, storage: &CudaStorage) -> Result<Vec<u32>> {
        match storage {
            CudaStorage::U32(s) => self
                .dev
                .dtoh_sync_copy(s)
                .map_err(|e| Error::msg(format!("dtoh u32: {e}"))),
            _ => Err(Error::DTypeMismatch {
                expected: DType::U32,
                got: storage.dtype(),
            }),
        }
    }

    pub fn dtoh_i64(&self, storage: &CudaStorage) -> Result<Vec<i64>> {
        match storage {
            CudaStorage::I64(s) => self
                .dev
                .dtoh_sync_copy(s)
                .map_err(|e| Error::msg(format!("dtoh i64: {e}"))),
            _ => Err(Error::DTypeMismatch {
                expected: DType::I64,
                got: storage.dtype(),
            }),
        }
    }
}

impl Clone for CudaDevice {
    fn clone(&self) -> Self {
        CudaDevice {
            dev: self.dev.clone(),
            ordinal: self.ordinal,
        }
    }
}

impl fmt::Debug for CudaDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CudaDevice(cuda:{})", self.ordinal)
    }
}

// Safety: cudarc's device is thread-safe (CUDA runtime is thread-safe)
unsafe impl Send for CudaDevice {}
unsafe impl Sync for CudaDevice {}

// CudaStorage — device memory for each supported dtype

/// GPU-side storage. Each variant wraps a cudarc CudaSlice for the
/// corresponding dtype. F16 and BF16 are stored as CudaSlice<u16>
/// (bit-level representation).
pub enum CudaStorage {
    F16(CudaSlice<u16>),
    BF16(CudaSlice<u16>),
    F32(CudaSlice<f32>),
    F64(CudaSlice<f64>),
    U8(CudaSlice<u8>),
    U32(CudaSlice<u32>),
    I64(CudaSlice<i64>),
}

impl CudaStorage {
    pub fn dtype(&self) -> DType {
        match self {
            CudaStorage::F16(_) => DType::F16,
            CudaStorage::BF16(_) => DType::BF16,
            CudaStorage::F32(_) => DType::F32,
            CudaStorage::F64(_) => DType::F64,
            CudaStorage::U8(_) => DType::U8,
            CudaStorage::U32(_) => DType::U32,
            CudaStorage::I64(_) => DType::I64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CudaStorage::F16(s) => s.len(),
            CudaStorage::BF16(s) => s.len(),
            CudaStorage::F32(s) => s.len(),
            CudaStorage::F64(s) => s.len(),
            CudaStorage::U8(s) => s.len(),
            CudaStorage::U32(s) => s.len(),
            CudaStorage::I64(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Clone for CudaStorage {
    fn clone(&self) -> Self {
        match self {
            CudaStorage::F16(s) => CudaStorage::F16(s.clone()),
            CudaStorage::BF16(s) => CudaStorage::BF16(s.clone()),
            CudaStorage::F32(s) => CudaStorage::F32(s.clone()),
            CudaStorage::F64(s) => CudaStorage::F64(s.clone()),
            CudaStorage::U8(s) => CudaStorage::U8(s.clone()),
            CudaStorage::U32(s) => CudaStorage::U32(s.clone()),
            CudaStorage::I64(s) => CudaStorage::I64(s.clone()),
        }
    }
}

impl fmt::Debug for CudaStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CudaStorage::{:?}(len={})", self.dtype(), self.len())
    }
}

unsafe impl Send for CudaStorage {}
unsafe impl Sync for CudaStorage {}

// Helpers

/// Standard CUDA launch configuration for N elements. The kernels are
/// grid-stride loops, so this is a sizing hint rather than a contract.
fn launch_cfg(n: usize) -> LaunchConfig {
    const BLOCK: u32 = 256;
    let grid = (n as u32).div_ceil(BLOCK);
    LaunchConfig {
        block_dim: (BLOCK, 1, 1),
        grid_dim: (grid.max(1), 1, 1),
        shared_mem_bytes: 0,
    }
}

/// Compose the entry-point name for an op and its two dtypes.
fn kernel_name(op: &str, idx: DType, dt: DType) -> String {
    format!("{op}_{}_{}", idx.suffix(), dt.suffix())
}

/// Validate an operand descriptor ahead of a launch. The kernels take a
/// base pointer without offset, so only zero-offset views are accepted.
fn check_layout(layout: &Layout, buf_len: usize, what: &'static str) -> Result<()> {
    if layout.strides().len() != layout.rank() {
        return Err(Error::StrideMismatch {
            dims: layout.rank(),
            strides: layout.strides().len(),
        });
    }
    if layout.offset() != 0 {
        bail!(
            "{what} views with a non-zero offset (got {}) are not supported on CUDA",
            layout.offset()
        );
    }
    let needed = layout.min_buffer_len();
    if buf_len < needed {
        return Err(Error::BufferTooSmall {
            what,
            expected: needed,
            got: buf_len,
        });
    }
    Ok(())
}

/// Flatten an index-buffer descriptor to the device format:
/// [dims..., strides...] as u32.
fn flatten_info(layout: &Layout) -> Vec<u32> {
    layout
        .dims()
        .iter()
        .chain(layout.strides().iter())
        .map(|&v| v as u32)
        .collect()
}

// Generic launch bodies, one per op. The public functions below are dtype
// dispatch only.

fn launch_emb<I: DeviceRepr, T: DeviceRepr + ValidAsZeroBits>(
    device: &CudaDevice,
    name: &str,
    ids: &CudaSlice<I>,
    ids_layout: &Layout,
    src: &CudaSlice<T>,
    h_size: usize,
    v_size: usize,
) -> Result<CudaSlice<T>> {
    check_layout(ids_layout, ids.len(), "index buffer")?;
    if src.len() != v_size * h_size {
        return Err(Error::BufferTooSmall {
            what: "embedding table",
            expected: v_size * h_size,
            got: src.len(),
        });
    }
    let numel = ids_layout.elem_count();
    let info = device
        .dev
        .htod_copy(flatten_info(ids_layout))
        .map_err(|e| Error::msg(format!("htod info: {e}")))?;
    let mut out: CudaSlice<T> = device
        .dev
        .alloc_zeros(numel * h_size)
        .map_err(|e| Error::msg(format!("alloc: {e}")))?;
    let func = device.get_func(name)?;
    let cfg = launch_cfg(numel);
    unsafe {
        func.launch(
            cfg,
            (
                numel as u32,
                ids_layout.rank() as u32,
                &info,
                ids,
                src,
                &mut out,
                h_size as u32,
                v_size as u32,
            ),
        )
    }
    .map_err(|e| Error::msg(format!("launch {name}: {e}")))?;
    Ok(out)
}

#[allow(clippy::too_many_arguments)]
fn launch_is<I: DeviceRepr, T: DeviceRepr + ValidAsZeroBits>(
    device: &CudaDevice,
    name: &str,
    ids: &CudaSlice<I>,
    ids_layout: &Layout,
    src: &CudaSlice<T>,
    left_size: usize,
    src_dim_size: usize,
    right_size: usize,
) -> Result<CudaSlice<T>> {
    check_layout(ids_layout, ids.len(), "index buffer")?;
    if src.len() != left_size * src_dim_size * right_size {
        return Err(Error::BufferTooSmall {
            what: "source buffer",
            expected: left_size * src_dim_size * right_size,
            got: src.len(),
        });
    }
    let ids_dim_size = ids_layout.elem_count();
    let numel = left_size * ids_dim_size * right_size;
    let info = device
        .dev
        .htod_copy(flatten_info(ids_layout))
        .map_err(|e| Error::msg(format!("htod info: {e}")))?;
    let mut out: CudaSlice<T> = device
        .dev
        .alloc_zeros(numel)
        .map_err(|e| Error::msg(format!("alloc: {e}")))?;
    let func = device.get_func(name)?;
    let cfg = launch_cfg(numel);
    unsafe {
        func.launch(
            cfg,
            (
                numel as u32,
                ids_layout.rank() as u32,
                &info,
                ids,
                src,
                &mut out,
                src_dim_size as u32,
                ids_dim_size as u32,
                right_size as u32,
            ),
        )
    }
    .map_err(|e| Error::msg(format!("launch {name}: {e}")))?;
    Ok(out)
}

#[allow(clippy::too_many_arguments)]
fn launch_gather<I: DeviceRepr, T: DeviceRepr + ValidAsZeroBits>(
    device: &CudaDevice,
    name: &str,
    ids: &CudaSlice<I>,
    src: &CudaSlice<T>,
    left_size: usize,
    src_dim_size: usize,
    ids_dim_size: usize,
    right_size: usize,
) -> Result<CudaSlice<T>> {
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
    let mut out: CudaSlice<T> = device
        .dev
        .alloc_zeros(numel)
        .map_err(|e| Error::msg(format!("alloc: {e}")))?;
    let func = device.get_func(name)?;
    let cfg = launch_cfg(numel);
    unsafe {
        func.launch(
            cfg,
            (
                numel as u32,
                ids,
                src,
                &mut out,
                src_dim_size as u32,
                ids_dim_size as u32,
                right_size as u32,
            ),
        )
    }
    .map_err(|e| Error::msg(format!("launch {name}: {e}")))?;
    Ok(out)
}

#[allow(clippy::too_many_arguments)]
fn launch_where<I: DeviceRepr, T: DeviceRepr + ValidAsZeroBits>(
    device: &CudaDevice,
    name: &str,
    ids: &CudaSlice<I>,
    ids_layout: &Layout,
    t: &CudaSlice<T>,
    t_layout: &Layout,
    f: &CudaSlice<T>,
    f_layout: &Layout,
) -> Result<CudaSlice<T>> {
    let dims = ids_layout.dims();
    for layout in [ids_layout, t_layout, f_layout] {
        if layout.dims() != dims {
            bail!(
                "where: operand shapes differ ({:?} vs {:?})",
                dims,
                layout.dims()
            );
        }
    }
    check_layout(ids_layout, ids.len(), "condition buffer")?;
    // The then/else operands are read through the opposing stride table
    // (see WHERE_OP), so each buffer is sized against the table its reads
    // actually resolve through.
    check_layout(f_layout, t.len(), "then buffer")?;
    check_layout(t_layout, f.len(), "else buffer")?;
    let numel = ids_layout.elem_count();
    // One descriptor buffer: dims then the three stride tables.
    let info: Vec<u32> = dims
        .iter()
        .chain(ids_layout.strides().iter())
        .chain(t_layout.strides().iter())
        .chain(f_layout.strides().iter())
        .map(|&v| v as u32)
        .collect();
    let info = device
        .dev
        .htod_copy(info)
        .map_err(|e| Error::msg(format!("htod info: {e}")))?;
    let mut out: CudaSlice<T> = device
        .dev
        .alloc_zeros(numel)
        .map_err(|e| Error::msg(format!("alloc: {e}")))?;
    let func = device.get_func(name)?;
    let cfg = launch_cfg(numel);
    unsafe {
        func.launch(
            cfg,
            (
                numel as u32,
                ids_layout.rank() as u32,
                &info,
                ids,
                t,
                f,
                &mut out,
            ),
        )
    }
    .map_err(|e| Error::msg(format!("launch {name}: {e}")))?;
    Ok(out)
}

// Public ops — dtype dispatch over (index width) × (value dtype)

/// Embedding lookup: one `h_size`-wide contiguous row per id.
pub fn embedding(
    device: &CudaDevice,
    ids: &CudaStorage,
    ids_layout: &Layout,
    src: &CudaStorage,
    h_size: usize,
    v_size: usize,
) -> Result<CudaStorage> {
    let name = kernel_name("emb", ids.dtype(), src.dtype());
    match (ids, src) {
        (CudaStorage::U8(i), CudaStorage::F16(s)) => Ok(CudaStorage::F16(launch_emb(device, &name, i, ids_layout, s, h_size, v_size)?)),
        (CudaStorage::U8(i), CudaStorage::BF16(s)) => Ok(CudaStorage::BF16(launch_emb(device, &name, i, ids_layout, s, h_size, v_size)?)),
        (CudaStorage::U8(i), CudaStorage::F32(s)) => Ok(CudaStorage::F32(launch_emb(device, &name, i, ids_layout, s, h_size, v_size)?)),
        (CudaStorage::U8(i), CudaStorage::F64(s)) => Ok(CudaStorage::F64(launch_emb(device, &name, i, ids_layout, s, h_size, v_size)?)),
        (CudaStorage::U8(i), CudaStorage::U8(s)) => Ok(CudaStorage::U8(launch_emb(device, &name, i, ids_layout, s, h_size, v_size)?)),
        (CudaStorage::U8(i), CudaStorage::U32(s)) => Ok(CudaStorage::U32(launch_emb(device, &name, i, ids_layout, s, h_size, v_size)?)),
        (CudaStorage::U32(i), CudaStorage::F16(s)) => Ok(CudaStorage::F16(launch_emb(device, &name, i, ids_layout, s, h_size, v_size)?)),
        (CudaStorage::U32(i), CudaStorage::BF16(s)) => Ok(CudaStorage::BF16(launch_emb(device, &name, i, ids_layout, s, h_size, v_size)?)),
        (CudaStorage::U32(i), CudaStorage::F32(s)) => Ok(CudaStorage::F32(launch_emb(device, &name, i, ids_layout, s, h_size, v_size)?)),
        (CudaStorage::U32(i), CudaStorage::F64(s)) => Ok(CudaStorage::F64(launch_emb(device, &name, i, ids_layout, s, h_size, v_size)?)),
        (CudaStorage::U32(i), CudaStorage::U8(s)) => Ok(CudaStorage::U8(launch_emb(device, &name, i, ids_layout, s, h_size, v_size)?)),
        (CudaStorage::U32(i), CudaStorage::U32(s)) => Ok(CudaStorage::U32(launch_emb(device, &name, i, ids_layout, s, h_size, v_size)?)),
        _ => bail!(
            "embedding: unsupported dtype pairing {:?} ids / {:?} values",
            ids.dtype(),
            src.dtype()
        ),
    }
}

/// Index select: gather whole rows along a middle dimension of the source.
pub fn index_select(
    device: &CudaDevice,
    ids: &CudaStorage,
    ids_layout: &Layout,
    src: &CudaStorage,
    left_size: usize,
    dim_size: usize,
    right_size: usize,
) -> Result<CudaStorage> {
    let name = kernel_name("is", ids.dtype(), src.dtype());
    match (ids, src) {
        (CudaStorage::U8(i), CudaStorage::F16(s)) => Ok(CudaStorage::F16(launch_is(device, &name, i, ids_layout, s, left_size, dim_size, right_size)?)),
        (CudaStorage::U8(i), CudaStorage::BF16(s)) => Ok(CudaStorage::BF16(launch_is(device, &name, i, ids_layout, s, left_size, dim_size, right_size)?)),
        (CudaStorage::U8(i), CudaStorage::F32(s)) => Ok(CudaStorage::F32(launch_is(device, &name, i, ids_layout, s, left_size, dim_size, right_size)?)),
        (CudaStorage::U8(i), CudaStorage::F64(s)) => Ok(CudaStorage::F64(launch_is(device, &name, i, ids_layout, s, left_size, dim_size, right_size)?)),
        (CudaStorage::U8(i), CudaStorage::U8(s)) => Ok(CudaStorage::U8(launch_is(device, &name, i, ids_layout, s, left_size, dim_size, right_size)?)),
        (CudaStorage::U8(i), CudaStorage::U32(s)) => Ok(CudaStorage::U32(launch_is(device, &name, i, ids_layout, s, left_size, dim_size, right_size)?)),
        (CudaStorage::U32(i), CudaStorage::F16(s)) => Ok(CudaStorage::F16(launch_is(device, &name, i, ids_layout, s, left_size, dim_size, right_size)?)),
        (CudaStorage::U32(i), CudaStorage::BF16(s)) => Ok(CudaStorage::BF16(launch_is(device, &name, i, ids_layout, s, left_size, dim_size, right_size)?)),
        (CudaStorage::U32(i), CudaStorage::F32(s)) => Ok(CudaStorage::F32(launch_is(device, &name, i, ids_layout, s, left_size, dim_size, right_size)?)),
        (CudaStorage::U32(i), CudaStorage::F64(s)) => Ok(CudaStorage::F64(launch_is(device, &name, i, ids_layout, s, left_size, dim_size, right_size)?)),
        (CudaStorage::U32(i), CudaStorage::U8(s)) => Ok(CudaStorage::U8(launch_is(device, &name, i, ids_layout, s, left_size, dim_size, right_size)?)),
        (CudaStorage::U32(i), CudaStorage::U32(s)) => Ok(CudaStorage::U32(launch_is(device, &name, i, ids_layout, s, left_size, dim_size, right_size)?)),
        _ => bail!(
            "index_select: unsupported dtype pairing {:?} ids / {:?} values",
            ids.dtype(),
            src.dtype()
        ),
    }
}

/// Flat single-element gather; the index buffer must be contiguous and
/// carry one id per output element.
#[allow(clippy::too_many_arguments)]
pub fn gather(
    device: &CudaDevice,
    ids: &CudaStorage,
    src: &CudaStorage,
    left_size: usize,
    src_dim_size: usize,
    ids_dim_size: usize,
    right_size: usize,
) -> Result<CudaStorage> {
    let name = kernel_name("gather", ids.dtype(), src.dtype());
    match (ids, src) {
        (CudaStorage::U8(i), CudaStorage::F16(s)) => Ok(CudaStorage::F16(launch_gather(device, &name, i, s, left_size, src_dim_size, ids_dim_size, right_size)?)),
        (CudaStorage::U8(i), CudaStorage::BF16(s)) => Ok(CudaStorage::BF16(launch_gather(device, &name, i, s, left_size, src_dim_size, ids_dim_size, right_size)?)),
        (CudaStorage::U8(i), CudaStorage::F32(s)) => Ok(CudaStorage::F32(launch_gather(device, &name, i, s, left_size, src_dim_size, ids_dim_size, right_size)?)),
        (CudaStorage::U8(i), CudaStorage::F64(s)) => Ok(CudaStorage::F64(launch_gather(device, &name, i, s, left_size, src_dim_size, ids_dim_size, right_size)?)),
        (CudaStorage::U8(i), CudaStorage::U8(s)) => Ok(CudaStorage::U8(launch_gather(device, &name, i, s, left_size, src_dim_size, ids_dim_size, right_size)?)),
        (CudaStorage::U8(i), CudaStorage::U32(s)) => Ok(CudaStorage::U32(launch_gather(device, &name, i, s, left_size, src_dim_size, ids_dim_size, right_size)?)),
        (CudaStorage::U32(i), CudaStorage::F16(s)) => Ok(CudaStorage::F16(launch_gather(device, &name, i, s, left_size, src_dim_size, ids_dim_size, right_size)?)),
        (CudaStorage::U32(i), CudaStorage::BF16(s)) => Ok(CudaStorage::BF16(launch_gather(device, &name, i, s, left_size, src_dim_size, ids_dim_size, right_size)?)),
        (CudaStorage::U32(i), CudaStorage::F32(s)) => Ok(CudaStorage::F32(launch_gather(device, &name, i, s, left_size, src_dim_size, ids_dim_size, right_size)?)),
        (CudaStorage::U32(i), CudaStorage::F64(s)) => Ok(CudaStorage::F64(launch_gather(device, &name, i, s, left_size, src_dim_size, ids_dim_size, right_size)?)),
        (CudaStorage::U32(i), CudaStorage::U8(s)) => Ok(CudaStorage::U8(launch_gather(device, &name, i, s, left_size, src_dim_size, ids_dim_size, right_size)?)),
        (CudaStorage::U32(i), CudaStorage::U32(s)) => Ok(CudaStorage::U32(launch_gather(device, &name, i, s, left_size, src_dim_size, ids_dim_size, right_size)?)),
        _ => bail!(
            "gather: unsupported dtype pairing {:?} ids / {:?} values",
            ids.dtype(),
            src.dtype()
        ),
    }
}

/// Element-wise ternary select over three equally-shaped operands, each
/// with its own stride table.
pub fn where_cond(
    device: &CudaDevice,
    ids: &CudaStorage,
    ids_layout: &Layout,
    t: &CudaStorage,
    t_layout: &Layout,
    f: &CudaStorage,
    f_layout: &Layout,
) -> Result<CudaStorage> {
    if t.dtype() != f.dtype() {
        return Err(Error::DTypeMismatch {
            expected: t.dtype(),
            got: f.dtype(),
        });
    }
    let name = kernel_name("where", ids.dtype(), t.dtype());
    match (ids, t, f) {
        (CudaStorage::U8(i), CudaStorage::F16(t), CudaStorage::F16(f)) => Ok(CudaStorage::F16(launch_where(device, &name, i, ids_layout, t, t_layout, f, f_layout)?)),
        (CudaStorage::U8(i), CudaStorage::BF16(t), CudaStorage::BF16(f)) => Ok(CudaStorage::BF16(launch_where(device, &name, i, ids_layout, t, t_layout, f, f_layout)?)),
        (CudaStorage::U8(i), CudaStorage::F32(t), CudaStorage::F32(f)) => Ok(CudaStorage::F32(launch_where(device, &name, i, ids_layout, t, t_layout, f, f_layout)?)),
        (CudaStorage::U8(i), CudaStorage::F64(t), CudaStorage::F64(f)) => Ok(CudaStorage::F64(launch_where(device, &name, i, ids_layout, t, t_layout, f, f_layout)?)),
        (CudaStorage::U8(i), CudaStorage::U8(t), CudaStorage::U8(f)) => Ok(CudaStorage::U8(launch_where(device, &name, i, ids_layout, t, t_layout, f, f_layout)?)),
        (CudaStorage::U8(i), CudaStorage::U32(t), CudaStorage::U32(f)) => Ok(CudaStorage::U32(launch_where(device, &name, i, ids_layout, t, t_layout, f, f_layout)?)),
        (CudaStorage::U8(i), CudaStorage::I64(t), CudaStorage::I64(f)) => Ok(CudaStorage::I64(launch_where(device, &name, i, ids_layout, t, t_layout, f, f_layout)?)),
        (CudaStorage::U32(i), CudaStorage::F16(t), CudaStorage::F16(f)) => Ok(CudaStorage::F16(launch_where(device, &name, i, ids_layout, t, t_layout, f, f_layout)?)),
        (CudaStorage::U32(i), CudaStorage::BF16(t), CudaStorage::BF16(f)) => Ok(CudaStorage::BF16(launch_where(device, &name, i, ids_layout, t, t_layout, f, f_layout)?)),
        (CudaStorage::U32(i), CudaStorage::F32(t), CudaStorage::F32(f)) => Ok(CudaStorage::F32(launch_where(device, &name, i, ids_layout, t, t_layout, f, f_layout)?)),
        (CudaStorage::U32(i), CudaStorage::F64(t), CudaStorage::F64(f)) => Ok(CudaStorage::F64(launch_where(device, &name, i, ids_layout, t, t_layout, f, f_layout)?)),
        (CudaStorage::U32(i), CudaStorage::U8(t), CudaStorage::U8(f)) => Ok(CudaStorage::U8(launch_where(device, &name, i, ids_layout, t, t_layout, f, f_layout)?)),
        (CudaStorage::U32(i), CudaStorage::U32(t), CudaStorage::U32(f)) => Ok(CudaStorage::U32(launch_where(device, &name, i, ids_layout, t, t_layout, f, f_layout)?)),
        (CudaStorage::U32(i), CudaStorage::I64(t), CudaStorage::I64(f)) => Ok(CudaStorage::I64(launch_where(device, &name, i, ids_layout, t, t_layout, f, f_layout)?)),
        _ => bail!(
            "where_cond: unsupported dtype pairing {:?} cond / {:?} values",
            ids.dtype(),
            t.dtype()
        ),
    }
}
