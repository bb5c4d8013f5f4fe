// SPDX-License-Identifier: Apache-2.0

//! Common constants used across implementations
//!
//! This module centralizes lane counts, thresholds, and related constants used
//! by scalar/SIMD/CUDA paths.

// =============================================================================
// PGRAM EXTRACTION
// =============================================================================

/// Width in bytes of the prefix signature ("pgram") used by the accelerated
/// sequence-sorting paths. Strings shorter than this are zero-padded; ties on
/// the full pgram fall back to a full byte comparison.
pub const PGRAM_BYTES: usize = 8;

// =============================================================================
// SIMD Lane Counts by Architecture
// =============================================================================

// AVX-512 Constants (Nightly feature only)
#[cfg(all(
    feature = "strx-nightly",
    any(target_arch = "x86", target_arch = "x86_64")
))]
pub use avx512_constants::*;
#[cfg(all(
    feature = "strx-nightly",
    any(target_arch = "x86", target_arch = "x86_64")
))]
mod avx512_constants {
    pub const LANES_AVX512_BYTES: usize = 64; // 512/8 = 64 byte elements
}

// x86/x86_64 Stable Constants (AVX2 only)
#[cfg(all(
    any(target_arch = "x86", target_arch = "x86_64"),
    not(feature = "strx-nightly")
))]
pub use x86_stable_constants::*;
#[cfg(all(
    any(target_arch = "x86", target_arch = "x86_64"),
    not(feature = "strx-nightly")
))]
mod x86_stable_constants {
    pub const LANES_AVX2_BYTES: usize = 32; // 256/8 = 32 byte elements
}

// NEON Constants (ARM64 only)
#[cfg(target_arch = "aarch64")]
pub use neon_constants::*;
#[cfg(target_arch = "aarch64")]
mod neon_constants {
    pub const LANES_NEON_BYTES: usize = 16; // 128/8 = 16 byte elements
}

// =============================================================================
// HASHING
// =============================================================================

/// Block size of the streaming hash state. Chosen to match the widest SIMD
/// register file the one-shot hash is unrolled for.
pub const HASH_BLOCK_BYTES: usize = 64;
