// SPDX-License-Identifier: Apache-2.0

//! Byte-string kernels
//!
//! Serial and hardware-accelerated implementations of the primitive string
//! operations: comparison, ordering, copying, filling, table lookup, checksum,
//! hashing, random fill, and forward/backward searching. The dispatch table in
//! [`crate::dispatch`] binds exactly one of these per operation at build time;
//! nothing in this module inspects capabilities on its own.
//!
//! ## Performance notes
//! Hot paths are written to be allocation-free. When modifying inner loops, try
//! to avoid introducing extra allocations or iterator-heavy patterns.

// Some clippy lints are noisy for low-level SIMD code; we opt out at the module level.
#![allow(unsafe_op_in_unsafe_fn)]
#![allow(clippy::manual_range_contains)]

use core::cmp::Ordering;

use crate::constants::HASH_BLOCK_BYTES;
use crate::types::ByteSet;

// x86_64 SIMD intrinsics imports - AVX2 only (not when nightly AVX-512 is enabled)
#[cfg(all(
    any(target_arch = "x86", target_arch = "x86_64"),
    not(feature = "strx-nightly")
))]
use std::arch::x86_64::{
    __m256i, _mm256_add_epi64, _mm256_and_si256, _mm256_cmpeq_epi8, _mm256_loadu_si256,
    _mm256_movemask_epi8, _mm256_sad_epu8, _mm256_set1_epi8, _mm256_setzero_si256,
    _mm256_storeu_si256,
};

// AVX-512 intrinsics (nightly only)
#[cfg(all(
    feature = "strx-nightly",
    any(target_arch = "x86", target_arch = "x86_64")
))]
use std::arch::x86_64::{
    _mm512_add_epi64, _mm512_cmpeq_epu8_mask, _mm512_mask_cmpeq_epu8_mask,
    _mm512_maskz_loadu_epi8, _mm512_reduce_add_epi64, _mm512_sad_epu8, _mm512_set1_epi8,
    _mm512_setzero_si512,
};

// ARM NEON imports
#[cfg(target_arch = "aarch64")]
use std::arch::aarch64::{
    vaddlvq_u8, vceqq_u8, vdupq_n_u8, vgetq_lane_u64, vld1q_u8, vminvq_u8,
    vreinterpretq_u64_u8,
};

#[cfg(all(
    any(target_arch = "x86", target_arch = "x86_64"),
    not(feature = "strx-nightly")
))]
use crate::constants::LANES_AVX2_BYTES;

#[cfg(all(
    feature = "strx-nightly",
    any(target_arch = "x86", target_arch = "x86_64")
))]
use crate::constants::LANES_AVX512_BYTES;

#[cfg(target_arch = "aarch64")]
use crate::constants::LANES_NEON_BYTES;

// =============================================================================
// COMPARISON AND ORDERING - SERIAL
// =============================================================================

pub fn equal_serial(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut i = 0;
    while i < a.len() {
        if a[i] != b[i] {
            return false;
        }
        i += 1;
    }
    true
}

pub fn order_serial(a: &[u8], b: &[u8]) -> Ordering {
    let shorter = a.len().min(b.len());
    let mut i = 0;
    while i < shorter {
        if a[i] != b[i] {
            return a[i].cmp(&b[i]);
        }
        i += 1;
    }
    a.len().cmp(&b.len())
}

// =============================================================================
// COPY / MOVE / FILL / LOOKUP - SERIAL ONLY
//
// These lower to `memcpy`/`memmove`/`memset` style loops the compiler already
// vectorizes optimally; no tier overrides them.
// =============================================================================

pub fn copy_serial(dst: &mut [u8], src: &[u8]) {
    debug_assert_eq!(dst.len(), src.len());
    dst.copy_from_slice(src);
}

/// Overlapping copy inside one buffer: `len` bytes from `src_idx` to `dst_idx`.
pub fn move_within_serial(buf: &mut [u8], src_idx: usize, dst_idx: usize, len: usize) {
    debug_assert!(src_idx + len <= buf.len());
    debug_assert!(dst_idx + len <= buf.len());
    buf.copy_within(src_idx..src_idx + len, dst_idx);
}

pub fn fill_serial(buf: &mut [u8], value: u8) {
    buf.fill(value);
}

/// Maps every byte of `src` through `table` into `dst`.
pub fn lookup_serial(dst: &mut [u8], src: &[u8], table: &[u8; 256]) {
    debug_assert_eq!(dst.len(), src.len());
    let mut i = 0;
    while i < src.len() {
        dst[i] = table[src[i] as usize];
        i += 1;
    }
}

// =============================================================================
// CHECKSUM - SERIAL
// =============================================================================

pub fn bytesum_serial(data: &[u8]) -> u64 {
    let mut sum = 0u64;
    let mut i = 0;
    while i < data.len() {
        sum += data[i] as u64;
        i += 1;
    }
    sum
}

// =============================================================================
// SEEDED HASHING
//
// A single portable multiply-fold construction shared by every tier, so the
// cross-tier equivalence property holds by construction. The streaming state
// consumes input in the same 8-byte word order as the one-shot function; a
// digest therefore equals the one-shot hash of the concatenated input for any
// split points.
// =============================================================================

const HASH_K1: u64 = 0xa076_1d64_78bd_642f;
const HASH_K2: u64 = 0xe703_7ed1_a0b4_28db;
const HASH_K3: u64 = 0x8ebc_6af0_9c88_c6e3;

#[inline(always)]
fn folded_multiply(a: u64, b: u64) -> u64 {
    let product = (a as u128).wrapping_mul(b as u128);
    (product as u64) ^ ((product >> 64) as u64)
}

#[inline(always)]
fn read_word_padded(bytes: &[u8]) -> u64 {
    debug_assert!(bytes.len() <= 8);
    let mut word = [0u8; 8];
    word[..bytes.len()].copy_from_slice(bytes);
    u64::from_le_bytes(word)
}

#[inline(always)]
fn hash_seed_state(seed: u64) -> u64 {
    seed ^ folded_multiply(seed ^ HASH_K1, HASH_K2)
}

#[inline(always)]
fn hash_consume_word(h: u64, word: u64) -> u64 {
    folded_multiply(h ^ word, HASH_K2)
}

#[inline(always)]
fn hash_finalize(h: u64, tail: &[u8], total_len: u64) -> u64 {
    let mut h = h;
    if !tail.is_empty() {
        h = folded_multiply(h ^ read_word_padded(tail), HASH_K3);
    }
    folded_multiply(h ^ total_len, HASH_K1)
}

pub fn hash_serial(data: &[u8], seed: u64) -> u64 {
    let mut h = hash_seed_state(seed);
    let mut chunks = data.chunks_exact(8);
    for chunk in &mut chunks {
        h = hash_consume_word(h, u64::from_le_bytes(chunk.try_into().unwrap()));
    }
    hash_finalize(h, chunks.remainder(), data.len() as u64)
}

/// Incremental variant of [`crate::hash`].
///
/// Feed bytes with [`HashState::update`]; [`HashState::digest`] is
/// non-destructive, so a running hash can be sampled mid-stream.
#[derive(Clone)]
pub struct HashState {
    pub(crate) block: [u8; HASH_BLOCK_BYTES],
    pub(crate) block_len: usize,
    pub(crate) total_len: u64,
    pub(crate) h: u64,
}

impl HashState {
    pub fn new(seed: u64) -> Self {
        Self {
            block: [0u8; HASH_BLOCK_BYTES],
            block_len: 0,
            total_len: 0,
            h: hash_seed_state(seed),
        }
    }

    /// Appends `data` to the stream; forwards to the dispatch table.
    pub fn update(&mut self, data: &[u8]) {
        crate::dispatch::hash_state_update(self, data);
    }

    /// Hash of everything fed so far; forwards to the dispatch table.
    pub fn digest(&self) -> u64 {
        crate::dispatch::hash_state_digest(self)
    }
}

pub fn hash_state_update_serial(state: &mut HashState, data: &[u8]) {
    let mut rest = data;
    state.total_len += data.len() as u64;

    while !rest.is_empty() {
        let room = HASH_BLOCK_BYTES - state.block_len;
        let take = room.min(rest.len());
        state.block[state.block_len..state.block_len + take].copy_from_slice(&rest[..take]);
        state.block_len += take;
        rest = &rest[take..];

        if state.block_len == HASH_BLOCK_BYTES {
            let mut h = state.h;
            for chunk in state.block.chunks_exact(8) {
                h = hash_consume_word(h, u64::from_le_bytes(chunk.try_into().unwrap()));
            }
            state.h = h;
            state.block_len = 0;
        }
    }
}

pub fn hash_state_digest_serial(state: &HashState) -> u64 {
    let buffered = &state.block[..state.block_len];
    let mut h = state.h;
    let mut chunks = buffered.chunks_exact(8);
    for chunk in &mut chunks {
        h = hash_consume_word(h, u64::from_le_bytes(chunk.try_into().unwrap()));
    }
    hash_finalize(h, chunks.remainder(), state.total_len)
}

// =============================================================================
// RANDOM FILL - SERIAL
// =============================================================================

#[inline(always)]
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Fills `buf` with bytes from a keyed counter generator. Deterministic for a
/// given `nonce`; distinct nonces yield independent-looking streams.
pub fn fill_random_serial(buf: &mut [u8], nonce: u64) {
    for (i, chunk) in buf.chunks_mut(8).enumerate() {
        let word = splitmix64(nonce ^ (i as u64).wrapping_mul(HASH_K1));
        let bytes = word.to_le_bytes();
        chunk.copy_from_slice(&bytes[..chunk.len()]);
    }
}

// =============================================================================
// BYTE AND SUBSTRING SEARCH - SERIAL
// =============================================================================

pub fn find_byte_serial(haystack: &[u8], needle: u8) -> Option<usize> {
    let mut i = 0;
    while i < haystack.len() {
        if haystack[i] == needle {
            return Some(i);
        }
        i += 1;
    }
    None
}

pub fn rfind_byte_serial(haystack: &[u8], needle: u8) -> Option<usize> {
    let mut i = haystack.len();
    while i > 0 {
        i -= 1;
        if haystack[i] == needle {
            return Some(i);
        }
    }
    None
}

/// First occurrence of `needle` in `haystack`. Empty needles match at 0.
pub fn find_serial(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    let first = needle[0];
    let last_start = haystack.len() - needle.len();
    let mut i = 0;
    while i <= last_start {
        if haystack[i] == first && &haystack[i..i + needle.len()] == needle {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Last occurrence of `needle` in `haystack`. Empty needles match at the end.
pub fn rfind_serial(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(haystack.len());
    }
    if needle.len() > haystack.len() {
        return None;
    }
    let first = needle[0];
    let mut i = haystack.len() - needle.len() + 1;
    while i > 0 {
        i -= 1;
        if haystack[i] == first && &haystack[i..i + needle.len()] == needle {
            return Some(i);
        }
    }
    None
}

pub fn find_byteset_serial(haystack: &[u8], set: &ByteSet) -> Option<usize> {
    let mut i = 0;
    while i < haystack.len() {
        if set.contains(haystack[i]) {
            return Some(i);
        }
        i += 1;
    }
    None
}

pub fn rfind_byteset_serial(haystack: &[u8], set: &ByteSet) -> Option<usize> {
    let mut i = haystack.len();
    while i > 0 {
        i -= 1;
        if set.contains(haystack[i]) {
            return Some(i);
        }
    }
    None
}

// =============================================================================
// AVX2 KERNELS (stable x86/x86_64)
//
// Safe wrappers around `#[target_feature]` bodies; the dispatch table installs
// a wrapper only when the corresponding tier was detected at build time.
// =============================================================================

#[cfg(all(
    any(target_arch = "x86", target_arch = "x86_64"),
    not(feature = "strx-nightly")
))]
mod avx2 {
    use super::*;

    pub fn equal_avx2(a: &[u8], b: &[u8]) -> bool {
        unsafe { equal_avx2_impl(a, b) }
    }

    #[target_feature(enable = "avx2")]
    unsafe fn equal_avx2_impl(a: &[u8], b: &[u8]) -> bool {
        if a.len() != b.len() {
            return false;
        }
        let len = a.len();
        if len < LANES_AVX2_BYTES {
            return equal_serial(a, b);
        }
        let mut i = 0;
        while i + LANES_AVX2_BYTES <= len {
            let va = _mm256_loadu_si256(a.as_ptr().add(i) as *const __m256i);
            let vb = _mm256_loadu_si256(b.as_ptr().add(i) as *const __m256i);
            let mask = _mm256_movemask_epi8(_mm256_cmpeq_epi8(va, vb));
            if mask != -1 {
                return false;
            }
            i += LANES_AVX2_BYTES;
        }
        if i < len {
            // Overlapping final window; len >= 32 guarantees it is in bounds.
            let tail = len - LANES_AVX2_BYTES;
            let va = _mm256_loadu_si256(a.as_ptr().add(tail) as *const __m256i);
            let vb = _mm256_loadu_si256(b.as_ptr().add(tail) as *const __m256i);
            let mask = _mm256_movemask_epi8(_mm256_cmpeq_epi8(va, vb));
            if mask != -1 {
                return false;
            }
        }
        true
    }

    pub fn order_avx2(a: &[u8], b: &[u8]) -> Ordering {
        unsafe { order_avx2_impl(a, b) }
    }

    #[target_feature(enable = "avx2")]
    unsafe fn order_avx2_impl(a: &[u8], b: &[u8]) -> Ordering {
        let shorter = a.len().min(b.len());
        let mut i = 0;
        while i + LANES_AVX2_BYTES <= shorter {
            let va = _mm256_loadu_si256(a.as_ptr().add(i) as *const __m256i);
            let vb = _mm256_loadu_si256(b.as_ptr().add(i) as *const __m256i);
            let eq = _mm256_movemask_epi8(_mm256_cmpeq_epi8(va, vb)) as u32;
            if eq != u32::MAX {
                let mismatch = i + (!eq).trailing_zeros() as usize;
                return a[mismatch].cmp(&b[mismatch]);
            }
            i += LANES_AVX2_BYTES;
        }
        while i < shorter {
            if a[i] != b[i] {
                return a[i].cmp(&b[i]);
            }
            i += 1;
        }
        a.len().cmp(&b.len())
    }

    pub fn bytesum_avx2(data: &[u8]) -> u64 {
        unsafe { bytesum_avx2_impl(data) }
    }

    #[target_feature(enable = "avx2")]
    unsafe fn bytesum_avx2_impl(data: &[u8]) -> u64 {
        let zero = _mm256_setzero_si256();
        let mut acc = zero;
        let mut i = 0;
        while i + LANES_AVX2_BYTES <= data.len() {
            let v = _mm256_loadu_si256(data.as_ptr().add(i) as *const __m256i);
            acc = _mm256_add_epi64(acc, _mm256_sad_epu8(v, zero));
            i += LANES_AVX2_BYTES;
        }
        let mut lanes = [0u64; 4];
        _mm256_storeu_si256(lanes.as_mut_ptr() as *mut __m256i, acc);
        let mut sum = lanes[0] + lanes[1] + lanes[2] + lanes[3];
        while i < data.len() {
            sum += data[i] as u64;
            i += 1;
        }
        sum
    }

    pub fn find_byte_avx2(haystack: &[u8], needle: u8) -> Option<usize> {
        unsafe { find_byte_avx2_impl(haystack, needle) }
    }

    #[target_feature(enable = "avx2")]
    unsafe fn find_byte_avx2_impl(haystack: &[u8], needle: u8) -> Option<usize> {
        let target = _mm256_set1_epi8(needle as i8);
        let mut i = 0;
        while i + LANES_AVX2_BYTES <= haystack.len() {
            let v = _mm256_loadu_si256(haystack.as_ptr().add(i) as *const __m256i);
            let mask = _mm256_movemask_epi8(_mm256_cmpeq_epi8(v, target)) as u32;
            if mask != 0 {
                return Some(i + mask.trailing_zeros() as usize);
            }
            i += LANES_AVX2_BYTES;
        }
        while i < haystack.len() {
            if haystack[i] == needle {
                return Some(i);
            }
            i += 1;
        }
        None
    }

    pub fn rfind_byte_avx2(haystack: &[u8], needle: u8) -> Option<usize> {
        unsafe { rfind_byte_avx2_impl(haystack, needle) }
    }

    #[target_feature(enable = "avx2")]
    unsafe fn rfind_byte_avx2_impl(haystack: &[u8], needle: u8) -> Option<usize> {
        let target = _mm256_set1_epi8(needle as i8);
        let mut end = haystack.len();
        while end >= LANES_AVX2_BYTES {
            let base = end - LANES_AVX2_BYTES;
            let v = _mm256_loadu_si256(haystack.as_ptr().add(base) as *const __m256i);
            let mask = _mm256_movemask_epi8(_mm256_cmpeq_epi8(v, target)) as u32;
            if mask != 0 {
                return Some(base + 31 - mask.leading_zeros() as usize);
            }
            end = base;
        }
        let mut i = end;
        while i > 0 {
            i -= 1;
            if haystack[i] == needle {
                return Some(i);
            }
        }
        None
    }

    pub fn find_avx2(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        unsafe { find_avx2_impl(haystack, needle) }
    }

    // First/last needle byte anchors filter candidate positions; only
    // surviving candidates pay for a full window comparison.
    #[target_feature(enable = "avx2")]
    unsafe fn find_avx2_impl(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        let n = needle.len();
        if n == 0 {
            return Some(0);
        }
        if n > haystack.len() {
            return None;
        }
        if n == 1 {
            return find_byte_avx2_impl(haystack, needle[0]);
        }
        let first = _mm256_set1_epi8(needle[0] as i8);
        let last = _mm256_set1_epi8(needle[n - 1] as i8);
        let mut i = 0;
        while i + LANES_AVX2_BYTES + n - 1 <= haystack.len() {
            let vf = _mm256_loadu_si256(haystack.as_ptr().add(i) as *const __m256i);
            let vl = _mm256_loadu_si256(haystack.as_ptr().add(i + n - 1) as *const __m256i);
            let mut mask = _mm256_movemask_epi8(_mm256_and_si256(
                _mm256_cmpeq_epi8(vf, first),
                _mm256_cmpeq_epi8(vl, last),
            )) as u32;
            while mask != 0 {
                let j = mask.trailing_zeros() as usize;
                let start = i + j;
                if &haystack[start + 1..start + n - 1] == &needle[1..n - 1] {
                    return Some(start);
                }
                mask &= mask - 1;
            }
            i += LANES_AVX2_BYTES;
        }
        find_serial(&haystack[i..], needle).map(|p| p + i)
    }

    pub fn rfind_avx2(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        unsafe { rfind_avx2_impl(haystack, needle) }
    }

    #[target_feature(enable = "avx2")]
    unsafe fn rfind_avx2_impl(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        let n = needle.len();
        if n == 0 {
            return Some(haystack.len());
        }
        if n > haystack.len() {
            return None;
        }
        if n == 1 {
            return rfind_byte_avx2_impl(haystack, needle[0]);
        }
        let first = _mm256_set1_epi8(needle[0] as i8);
        let last_start = haystack.len() - n;
        // Exclusive upper bound of candidate starts not yet scanned.
        let mut start_hi = last_start + 1;
        while start_hi >= LANES_AVX2_BYTES {
            let base = start_hi - LANES_AVX2_BYTES;
            let v = _mm256_loadu_si256(haystack.as_ptr().add(base) as *const __m256i);
            let mut mask = _mm256_movemask_epi8(_mm256_cmpeq_epi8(v, first)) as u32;
            while mask != 0 {
                let j = 31 - mask.leading_zeros() as usize;
                let start = base + j;
                if &haystack[start..start + n] == needle {
                    return Some(start);
                }
                mask &= !(1u32 << j);
            }
            start_hi = base;
        }
        if start_hi > 0 {
            return rfind_serial(&haystack[..start_hi - 1 + n], needle);
        }
        None
    }
}

#[cfg(all(
    any(target_arch = "x86", target_arch = "x86_64"),
    not(feature = "strx-nightly")
))]
pub use avx2::*;

// =============================================================================
// AVX-512 KERNELS (nightly only)
//
// Masked 64-lane loads remove the scalar tail loops entirely.
// =============================================================================

#[cfg(all(
    feature = "strx-nightly",
    any(target_arch = "x86", target_arch = "x86_64")
))]
mod avx512 {
    use super::*;

    #[inline(always)]
    fn tail_mask(len: usize) -> u64 {
        debug_assert!(len <= 64);
        if len == 64 {
            u64::MAX
        } else {
            (1u64 << len) - 1
        }
    }

    pub fn equal_avx512(a: &[u8], b: &[u8]) -> bool {
        unsafe { equal_avx512_impl(a, b) }
    }

    #[target_feature(enable = "avx512f", enable = "avx512bw")]
    unsafe fn equal_avx512_impl(a: &[u8], b: &[u8]) -> bool {
        if a.len() != b.len() {
            return false;
        }
        let len = a.len();
        let mut i = 0;
        while i + LANES_AVX512_BYTES <= len {
            let va = _mm512_maskz_loadu_epi8(u64::MAX, a.as_ptr().add(i) as *const i8);
            let vb = _mm512_maskz_loadu_epi8(u64::MAX, b.as_ptr().add(i) as *const i8);
            if _mm512_cmpeq_epu8_mask(va, vb) != u64::MAX {
                return false;
            }
            i += LANES_AVX512_BYTES;
        }
        let rem = len - i;
        if rem > 0 {
            let mask = tail_mask(rem);
            let va = _mm512_maskz_loadu_epi8(mask, a.as_ptr().add(i) as *const i8);
            let vb = _mm512_maskz_loadu_epi8(mask, b.as_ptr().add(i) as *const i8);
            if _mm512_mask_cmpeq_epu8_mask(mask, va, vb) != mask {
                return false;
            }
        }
        true
    }

    pub fn order_avx512(a: &[u8], b: &[u8]) -> Ordering {
        unsafe { order_avx512_impl(a, b) }
    }

    #[target_feature(enable = "avx512f", enable = "avx512bw")]
    unsafe fn order_avx512_impl(a: &[u8], b: &[u8]) -> Ordering {
        let shorter = a.len().min(b.len());
        let mut i = 0;
        while i < shorter {
            let rem = (shorter - i).min(LANES_AVX512_BYTES);
            let mask = tail_mask(rem);
            let va = _mm512_maskz_loadu_epi8(mask, a.as_ptr().add(i) as *const i8);
            let vb = _mm512_maskz_loadu_epi8(mask, b.as_ptr().add(i) as *const i8);
            let eq = _mm512_mask_cmpeq_epu8_mask(mask, va, vb);
            let neq = mask & !eq;
            if neq != 0 {
                let mismatch = i + neq.trailing_zeros() as usize;
                return a[mismatch].cmp(&b[mismatch]);
            }
            i += rem;
        }
        a.len().cmp(&b.len())
    }

    pub fn bytesum_avx512(data: &[u8]) -> u64 {
        unsafe { bytesum_avx512_impl(data) }
    }

    #[target_feature(enable = "avx512f", enable = "avx512bw")]
    unsafe fn bytesum_avx512_impl(data: &[u8]) -> u64 {
        let zero = _mm512_setzero_si512();
        let mut acc = zero;
        let mut i = 0;
        while i < data.len() {
            let rem = (data.len() - i).min(LANES_AVX512_BYTES);
            // Masked-off lanes load as zero and do not affect the sum.
            let v = _mm512_maskz_loadu_epi8(tail_mask(rem), data.as_ptr().add(i) as *const i8);
            acc = _mm512_add_epi64(acc, _mm512_sad_epu8(v, zero));
            i += rem;
        }
        _mm512_reduce_add_epi64(acc) as u64
    }

    pub fn find_byte_avx512(haystack: &[u8], needle: u8) -> Option<usize> {
        unsafe { find_byte_avx512_impl(haystack, needle) }
    }

    #[target_feature(enable = "avx512f", enable = "avx512bw")]
    unsafe fn find_byte_avx512_impl(haystack: &[u8], needle: u8) -> Option<usize> {
        let target = _mm512_set1_epi8(needle as i8);
        let mut i = 0;
        while i < haystack.len() {
            let rem = (haystack.len() - i).min(LANES_AVX512_BYTES);
            let mask = tail_mask(rem);
            let v = _mm512_maskz_loadu_epi8(mask, haystack.as_ptr().add(i) as *const i8);
            let hits = _mm512_mask_cmpeq_epu8_mask(mask, v, target);
            if hits != 0 {
                return Some(i + hits.trailing_zeros() as usize);
            }
            i += rem;
        }
        None
    }

    pub fn rfind_byte_avx512(haystack: &[u8], needle: u8) -> Option<usize> {
        unsafe { rfind_byte_avx512_impl(haystack, needle) }
    }

    #[target_feature(enable = "avx512f", enable = "avx512bw")]
    unsafe fn rfind_byte_avx512_impl(haystack: &[u8], needle: u8) -> Option<usize> {
        let target = _mm512_set1_epi8(needle as i8);
        let mut end = haystack.len();
        while end > 0 {
            let rem = end.min(LANES_AVX512_BYTES);
            let base = end - rem;
            let mask = tail_mask(rem);
            let v = _mm512_maskz_loadu_epi8(mask, haystack.as_ptr().add(base) as *const i8);
            let hits = _mm512_mask_cmpeq_epu8_mask(mask, v, target);
            if hits != 0 {
                return Some(base + 63 - hits.leading_zeros() as usize);
            }
            end = base;
        }
        None
    }

    pub fn find_avx512(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        unsafe { find_avx512_impl(haystack, needle) }
    }

    #[target_feature(enable = "avx512f", enable = "avx512bw")]
    unsafe fn find_avx512_impl(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        let n = needle.len();
        if n == 0 {
            return Some(0);
        }
        if n > haystack.len() {
            return None;
        }
        if n == 1 {
            return find_byte_avx512_impl(haystack, needle[0]);
        }
        let first = _mm512_set1_epi8(needle[0] as i8);
        let last = _mm512_set1_epi8(needle[n - 1] as i8);
        let last_start = haystack.len() - n;
        let mut i = 0;
        while i <= last_start {
            let rem = (last_start + 1 - i).min(LANES_AVX512_BYTES);
            let mask = tail_mask(rem);
            let vf = _mm512_maskz_loadu_epi8(mask, haystack.as_ptr().add(i) as *const i8);
            let vl =
                _mm512_maskz_loadu_epi8(mask, haystack.as_ptr().add(i + n - 1) as *const i8);
            let mut hits = _mm512_mask_cmpeq_epu8_mask(mask, vf, first)
                & _mm512_mask_cmpeq_epu8_mask(mask, vl, last);
            while hits != 0 {
                let j = hits.trailing_zeros() as usize;
                let start = i + j;
                if &haystack[start + 1..start + n - 1] == &needle[1..n - 1] {
                    return Some(start);
                }
                hits &= hits - 1;
            }
            i += rem;
        }
        None
    }
}

#[cfg(all(
    feature = "strx-nightly",
    any(target_arch = "x86", target_arch = "x86_64")
))]
pub use avx512::*;

// =============================================================================
// NEON KERNELS (aarch64)
// =============================================================================

#[cfg(target_arch = "aarch64")]
mod neon {
    use super::*;

    pub fn equal_neon(a: &[u8], b: &[u8]) -> bool {
        unsafe { equal_neon_impl(a, b) }
    }

    #[target_feature(enable = "neon")]
    unsafe fn equal_neon_impl(a: &[u8], b: &[u8]) -> bool {
        if a.len() != b.len() {
            return false;
        }
        let len = a.len();
        if len < LANES_NEON_BYTES {
            return equal_serial(a, b);
        }
        let mut i = 0;
        while i + LANES_NEON_BYTES <= len {
            let va = vld1q_u8(a.as_ptr().add(i));
            let vb = vld1q_u8(b.as_ptr().add(i));
            if vminvq_u8(vceqq_u8(va, vb)) != 0xFF {
                return false;
            }
            i += LANES_NEON_BYTES;
        }
        if i < len {
            // Overlapping final window; len >= 16 guarantees it is in bounds.
            let tail = len - LANES_NEON_BYTES;
            let va = vld1q_u8(a.as_ptr().add(tail));
            let vb = vld1q_u8(b.as_ptr().add(tail));
            if vminvq_u8(vceqq_u8(va, vb)) != 0xFF {
                return false;
            }
        }
        true
    }

    pub fn bytesum_neon(data: &[u8]) -> u64 {
        unsafe { bytesum_neon_impl(data) }
    }

    #[target_feature(enable = "neon")]
    unsafe fn bytesum_neon_impl(data: &[u8]) -> u64 {
        let mut sum = 0u64;
        let mut i = 0;
        while i + LANES_NEON_BYTES <= data.len() {
            let v = vld1q_u8(data.as_ptr().add(i));
            sum += vaddlvq_u8(v) as u64;
            i += LANES_NEON_BYTES;
        }
        while i < data.len() {
            sum += data[i] as u64;
            i += 1;
        }
        sum
    }

    pub fn find_byte_neon(haystack: &[u8], needle: u8) -> Option<usize> {
        unsafe { find_byte_neon_impl(haystack, needle) }
    }

    #[target_feature(enable = "neon")]
    unsafe fn find_byte_neon_impl(haystack: &[u8], needle: u8) -> Option<usize> {
        let target = vdupq_n_u8(needle);
        let mut i = 0;
        while i + LANES_NEON_BYTES <= haystack.len() {
            let eq = vceqq_u8(vld1q_u8(haystack.as_ptr().add(i)), target);
            let words = vreinterpretq_u64_u8(eq);
            let lo = vgetq_lane_u64::<0>(words);
            if lo != 0 {
                return Some(i + (lo.trailing_zeros() / 8) as usize);
            }
            let hi = vgetq_lane_u64::<1>(words);
            if hi != 0 {
                return Some(i + 8 + (hi.trailing_zeros() / 8) as usize);
            }
            i += LANES_NEON_BYTES;
        }
        while i < haystack.len() {
            if haystack[i] == needle {
                return Some(i);
            }
            i += 1;
        }
        None
    }

    pub fn rfind_byte_neon(haystack: &[u8], needle: u8) -> Option<usize> {
        unsafe { rfind_byte_neon_impl(haystack, needle) }
    }

    #[target_feature(enable = "neon")]
    unsafe fn rfind_byte_neon_impl(haystack: &[u8], needle: u8) -> Option<usize> {
        let target = vdupq_n_u8(needle);
        let mut end = haystack.len();
        while end >= LANES_NEON_BYTES {
            let base = end - LANES_NEON_BYTES;
            let eq = vceqq_u8(vld1q_u8(haystack.as_ptr().add(base)), target);
            let words = vreinterpretq_u64_u8(eq);
            let hi = vgetq_lane_u64::<1>(words);
            if hi != 0 {
                return Some(base + 8 + 7 - (hi.leading_zeros() / 8) as usize);
            }
            let lo = vgetq_lane_u64::<0>(words);
            if lo != 0 {
                return Some(base + 7 - (lo.leading_zeros() / 8) as usize);
            }
            end = base;
        }
        let mut i = end;
        while i > 0 {
            i -= 1;
            if haystack[i] == needle {
                return Some(i);
            }
        }
        None
    }
}

#[cfg(target_arch = "aarch64")]
pub use neon::*;
