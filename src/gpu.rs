// SPDX-License-Identifier: Apache-2.0

//! CUDA support for strx
//!
//! This module contains the CUDA-facing pieces used when `has_cuda` is enabled
//! (detected by `build.rs` when `nvcc` is available).
//!
//! It provides:
//! - Helpers for allocating/copying buffers via the CUDA runtime
//! - Launch plumbing for the precompiled batch similarity kernels
//!
//! The kernel bodies live in `src/batch_kernels.cu` and are compiled to a
//! shared object by `build.rs`; this module only owns the host side: context
//! initialization, tape upload, launch serialization, and result download.

use std::ffi::c_void;
use std::ptr;
use std::sync::Mutex;

use log::debug;

use crate::similarity::SubstitutionMatrix;
use crate::tape::StringTape;
use crate::types::{Result, StrxError};

// CUDA runtime API declarations
#[cfg(has_cuda)]
unsafe extern "C" {
    pub(crate) fn cudaMalloc(ptr: *mut *mut c_void, size: usize) -> i32;
    pub(crate) fn cudaMemcpy(dst: *mut c_void, src: *const c_void, size: usize, kind: i32) -> i32;
    pub(crate) fn cudaFree(ptr: *mut c_void) -> i32;
    pub(crate) fn cudaDeviceSynchronize() -> i32;

    // Batch similarity kernel wrappers; all pointers are device pointers.
    pub(crate) fn strx_batch_levenshtein(
        d_a_data: *const u8,
        d_a_offsets: *const u64,
        d_b_data: *const u8,
        d_b_offsets: *const u64,
        count: usize,
        bound: u64,
        d_results: *mut u64,
    ) -> i32;

    pub(crate) fn strx_batch_nw_score(
        d_a_data: *const u8,
        d_a_offsets: *const u64,
        d_b_data: *const u8,
        d_b_offsets: *const u64,
        count: usize,
        d_subs: *const i8,
        gap: i32,
        d_results: *mut i64,
    ) -> i32;
}

// CUDA driver API declarations for context management
#[repr(C)]
struct CUctx_st {
    _opaque: u8,
}
type CUcontext = *mut CUctx_st;

#[cfg(has_cuda)]
unsafe extern "C" {
    fn cuInit(flags: u32) -> i32;
    fn cuDeviceGet(device: *mut i32, ordinal: i32) -> i32;
    fn cuDeviceGetCount(count: *mut i32) -> i32;
    fn cuCtxCreate_v2(ctx: *mut CUcontext, flags: u32, device: i32) -> i32;
    fn cuCtxSetCurrent(ctx: CUcontext) -> i32;
}

const CUDA_MEMCPY_HOST_TO_DEVICE: i32 = 1;
const CUDA_MEMCPY_DEVICE_TO_HOST: i32 = 2;

// Contexts are usable from any thread once created.
struct SendContext(CUcontext);
unsafe impl Send for SendContext {}

lazy_static::lazy_static! {
  static ref CUDA_INITIALIZED: Mutex<bool> = Mutex::new(false);
  static ref CUDA_CONTEXT: Mutex<Option<SendContext>> = Mutex::new(None);
  // Serialize GPU kernel launches to prevent race conditions
  static ref GPU_LAUNCH_MUTEX: Mutex<()> = Mutex::new(());
}

// Initialize CUDA if not already done
pub(crate) fn ensure_cuda_initialized() -> Result<()> {
    let mut initialized = CUDA_INITIALIZED.lock().unwrap();
    if !*initialized {
        unsafe {
            let result = cuInit(0);
            if result != 0 {
                debug!("STRX GPU: cuInit failed code={}", result);
                return Err(StrxError::Internal(format!("cuInit failed: {}", result)));
            }

            let mut count = 0;
            let result = cuDeviceGetCount(&mut count);
            if result != 0 || count == 0 {
                debug!("STRX GPU: no CUDA devices (code={}, count={})", result, count);
                return Err(StrxError::MissingGpu);
            }

            let mut device = 0;
            let result = cuDeviceGet(&mut device, 0);
            if result != 0 {
                debug!("STRX GPU: cuDeviceGet failed code={}", result);
                return Err(StrxError::Internal(format!(
                    "cuDeviceGet failed: {}",
                    result
                )));
            }

            let mut ctx = ptr::null_mut();
            let result = cuCtxCreate_v2(&mut ctx, 0, device);
            if result != 0 {
                debug!("STRX GPU: cuCtxCreate_v2 failed code={}", result);
                return Err(StrxError::Internal(format!(
                    "cuCtxCreate failed: {}",
                    result
                )));
            }

            let mut ctx_cache = CUDA_CONTEXT.lock().unwrap();
            *ctx_cache = Some(SendContext(ctx));
        }
        *initialized = true;
    }
    // Always set context current for the calling thread
    unsafe {
        if let Some(ref ctx) = *CUDA_CONTEXT.lock().unwrap() {
            let result = cuCtxSetCurrent(ctx.0);
            if result != 0 {
                debug!("STRX GPU: cuCtxSetCurrent failed code={}", result);
                return Err(StrxError::Internal(format!(
                    "cuCtxSetCurrent failed: {}",
                    result
                )));
            }
        }
    }

    Ok(())
}

// =============================================================================
//  DEVICE MEMORY HELPERS
// =============================================================================

/// RAII device allocation; freed on drop.
struct DeviceBuffer {
    ptr: *mut c_void,
}

impl DeviceBuffer {
    fn alloc(size: usize) -> Result<Self> {
        let mut ptr = ptr::null_mut();
        let result = unsafe { cudaMalloc(&mut ptr, size.max(1)) };
        if result != 0 {
            debug!("STRX GPU: cudaMalloc({}) failed code={}", size, result);
            return Err(StrxError::BadAlloc);
        }
        Ok(Self { ptr })
    }

    fn upload(size: usize, src: *const c_void) -> Result<Self> {
        let buffer = Self::alloc(size)?;
        if size > 0 {
            let result =
                unsafe { cudaMemcpy(buffer.ptr, src, size, CUDA_MEMCPY_HOST_TO_DEVICE) };
            if result != 0 {
                return Err(StrxError::Internal(format!(
                    "cudaMemcpy to device failed: {}",
                    result
                )));
            }
        }
        Ok(buffer)
    }

    fn download(&self, dst: *mut c_void, size: usize) -> Result<()> {
        let result = unsafe { cudaMemcpy(dst, self.ptr, size, CUDA_MEMCPY_DEVICE_TO_HOST) };
        if result != 0 {
            return Err(StrxError::Internal(format!(
                "cudaMemcpy from device failed: {}",
                result
            )));
        }
        Ok(())
    }
}

impl Drop for DeviceBuffer {
    fn drop(&mut self) {
        unsafe {
            cudaFree(self.ptr);
        }
    }
}

/// One side of a batch: concatenated bytes plus delimiting offsets.
struct DeviceTape {
    data: DeviceBuffer,
    offsets: DeviceBuffer,
}

fn upload_tape(tape: &StringTape<'_>) -> Result<DeviceTape> {
    let data = DeviceBuffer::upload(tape.data().len(), tape.data().as_ptr() as *const c_void)?;
    let offsets = DeviceBuffer::upload(
        tape.offsets().len() * std::mem::size_of::<u64>(),
        tape.offsets().as_ptr() as *const c_void,
    )?;
    Ok(DeviceTape { data, offsets })
}

// =============================================================================
//  BATCH KERNEL LAUNCHES
// =============================================================================

pub(crate) fn batch_levenshtein(
    a: StringTape<'_>,
    b: StringTape<'_>,
    bound: usize,
    results: &mut [u64],
) -> Result<()> {
    ensure_cuda_initialized().map_err(|_| StrxError::MissingGpu)?;

    let count = a.count();
    let d_a = upload_tape(&a)?;
    let d_b = upload_tape(&b)?;
    let d_results = DeviceBuffer::alloc(count * std::mem::size_of::<u64>())?;

    {
        let _launch_guard = GPU_LAUNCH_MUTEX.lock().unwrap();
        let result = unsafe {
            strx_batch_levenshtein(
                d_a.data.ptr as *const u8,
                d_a.offsets.ptr as *const u64,
                d_b.data.ptr as *const u8,
                d_b.offsets.ptr as *const u64,
                count,
                bound as u64,
                d_results.ptr as *mut u64,
            )
        };
        if result != 0 {
            debug!("STRX GPU: batch levenshtein kernel failed code={}", result);
            return Err(StrxError::Internal(format!(
                "batch levenshtein kernel failed: {}",
                result
            )));
        }
        let result = unsafe { cudaDeviceSynchronize() };
        if result != 0 {
            return Err(StrxError::Internal(format!(
                "cudaDeviceSynchronize failed: {}",
                result
            )));
        }
    }

    d_results.download(
        results.as_mut_ptr() as *mut c_void,
        count * std::mem::size_of::<u64>(),
    )
}

pub(crate) fn batch_nw_score(
    a: StringTape<'_>,
    b: StringTape<'_>,
    subs: &SubstitutionMatrix,
    gap: i8,
    results: &mut [i64],
) -> Result<()> {
    ensure_cuda_initialized().map_err(|_| StrxError::MissingGpu)?;

    let count = a.count();
    let d_a = upload_tape(&a)?;
    let d_b = upload_tape(&b)?;
    let d_subs = DeviceBuffer::upload(256 * 256, subs.as_ptr() as *const c_void)?;
    let d_results = DeviceBuffer::alloc(count * std::mem::size_of::<i64>())?;

    {
        let _launch_guard = GPU_LAUNCH_MUTEX.lock().unwrap();
        let result = unsafe {
            strx_batch_nw_score(
                d_a.data.ptr as *const u8,
                d_a.offsets.ptr as *const u64,
                d_b.data.ptr as *const u8,
                d_b.offsets.ptr as *const u64,
                count,
                d_subs.ptr as *const i8,
                gap as i32,
                d_results.ptr as *mut i64,
            )
        };
        if result != 0 {
            debug!("STRX GPU: batch alignment kernel failed code={}", result);
            return Err(StrxError::Internal(format!(
                "batch alignment kernel failed: {}",
                result
            )));
        }
        let result = unsafe { cudaDeviceSynchronize() };
        if result != 0 {
            return Err(StrxError::Internal(format!(
                "cudaDeviceSynchronize failed: {}",
                result
            )));
        }
    }

    d_results.download(
        results.as_mut_ptr() as *mut c_void,
        count * std::mem::size_of::<i64>(),
    )
}
