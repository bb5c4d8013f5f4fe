// SPDX-License-Identifier: Apache-2.0

//! # strx dispatch framework
//!
//! This module contains the dispatch layer used across the crate: capability
//! probing, the per-operation function-slot table, its build/publish
//! lifecycle, and the public entry points every caller goes through.
//!
//! Selection is resolved once at table-build time, per operation, not per
//! tier-as-a-whole: a tier may accelerate searching but not sorting, and the
//! table reflects exactly that asymmetry. Call sites pay one indirect call and
//! never branch on capabilities.
//!
//! ## Notes on performance-oriented code
//! Some hot paths in this crate intentionally avoid allocations and
//! iterator-heavy patterns to help the compiler generate tight loops. These
//! are guidelines, not hard guarantees. Correctness and clarity still matter.

use core::cmp::Ordering;
use std::fmt;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering as MemOrdering};
use std::sync::Once;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::sequence;
use crate::strings;
use crate::strings::HashState;
use crate::tape::StringTape;
use crate::types::{ByteSet, Result};

// =============================================================================
//  HARDWARE DETECTION & CAPABILITY SET
// =============================================================================

/// An immutable bitset of recognized hardware tiers.
///
/// Produced by [`CapabilitySet::detect`] and consumed by
/// [`DispatchTable::build`]. A value type: callers may cache it, narrow it,
/// and feed it back through [`update`] to force a specific tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet(u32);

impl CapabilitySet {
    /// The portable baseline; always present.
    pub const SERIAL: CapabilitySet = CapabilitySet(1 << 0);
    /// ARM NEON (128-bit).
    pub const NEON: CapabilitySet = CapabilitySet(1 << 1);
    /// x86 AVX2 (256-bit).
    pub const HASWELL: CapabilitySet = CapabilitySet(1 << 2);
    /// x86 AVX-512 (512-bit, `strx-nightly` builds only).
    pub const SKYLAKE: CapabilitySet = CapabilitySet(1 << 3);
    /// A usable CUDA device.
    pub const CUDA: CapabilitySet = CapabilitySet(1 << 4);

    /// Baseline-only set; what [`detect`](Self::detect) degrades to when
    /// hardware introspection is unavailable.
    #[inline]
    pub const fn baseline() -> Self {
        Self::SERIAL
    }

    /// Probes the running hardware. Deterministic for a given machine and
    /// process; never fails — undetectable environments report baseline.
    pub fn detect() -> Self {
        let mut caps = Self::SERIAL;

        #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
        {
            #[cfg(not(feature = "strx-nightly"))]
            if is_x86_feature_detected!("avx2") {
                caps = caps.union(Self::HASWELL);
            }
            #[cfg(feature = "strx-nightly")]
            if is_x86_feature_detected!("avx512f") && is_x86_feature_detected!("avx512bw") {
                caps = caps.union(Self::SKYLAKE);
            }
        }

        #[cfg(target_arch = "aarch64")]
        if std::arch::is_aarch64_feature_detected!("neon") {
            caps = caps.union(Self::NEON);
        }

        if Self::detect_cuda() {
            caps = caps.union(Self::CUDA);
        }

        caps
    }

    fn detect_cuda() -> bool {
        // One-time detection cached in a static atomic.
        use std::sync::atomic::AtomicU8;
        static CUDA_DETECTED: AtomicU8 = AtomicU8::new(2); // 2 = unknown, 1 = true, 0 = false

        let cached = CUDA_DETECTED.load(MemOrdering::Relaxed);
        if cached != 2 {
            return cached == 1;
        }

        #[cfg(has_cuda)]
        let has_cuda = crate::gpu::ensure_cuda_initialized().is_ok();
        #[cfg(not(has_cuda))]
        let has_cuda = false;

        CUDA_DETECTED.store(if has_cuda { 1 } else { 0 }, MemOrdering::Relaxed);
        has_cuda
    }

    #[inline]
    pub const fn contains(self, other: CapabilitySet) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn union(self, other: CapabilitySet) -> CapabilitySet {
        CapabilitySet(self.0 | other.0)
    }

    #[inline]
    pub const fn intersection(self, other: CapabilitySet) -> CapabilitySet {
        CapabilitySet(self.0 & other.0)
    }

    #[inline]
    pub const fn is_subset_of(self, other: CapabilitySet) -> bool {
        other.contains(self)
    }

    /// Human-readable tier list; diagnostics only.
    pub fn describe(self) -> String {
        let mut names = Vec::new();
        if self.contains(Self::SERIAL) {
            names.push("serial");
        }
        if self.contains(Self::NEON) {
            names.push("neon");
        }
        if self.contains(Self::HASWELL) {
            names.push("haswell");
        }
        if self.contains(Self::SKYLAKE) {
            names.push("skylake");
        }
        if self.contains(Self::CUDA) {
            names.push("cuda");
        }
        names.join(",")
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Origin tier of a bound slot; ordered by specialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    Serial,
    Neon,
    Haswell,
    Skylake,
}

/// Primitive operation kinds, one per dispatch slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum Op {
    Equal,
    Order,
    Copy,
    MoveWithin,
    Fill,
    Lookup,
    Bytesum,
    Hash,
    HashStateUpdate,
    HashStateDigest,
    FillRandom,
    FindByte,
    RfindByte,
    Find,
    Rfind,
    FindByteset,
    RfindByteset,
    Argsort,
    PgramsSort,
    Intersect,
}

pub const OP_COUNT: usize = 20;

// =============================================================================
//  DISPATCH TABLE
// =============================================================================

pub type EqualFn = fn(&[u8], &[u8]) -> bool;
pub type OrderFn = fn(&[u8], &[u8]) -> Ordering;
pub type CopyFn = fn(&mut [u8], &[u8]);
pub type MoveWithinFn = fn(&mut [u8], usize, usize, usize);
pub type FillFn = fn(&mut [u8], u8);
pub type LookupFn = fn(&mut [u8], &[u8], &[u8; 256]);
pub type BytesumFn = fn(&[u8]) -> u64;
pub type HashFn = fn(&[u8], u64) -> u64;
pub type HashStateUpdateFn = fn(&mut HashState, &[u8]);
pub type HashStateDigestFn = fn(&HashState) -> u64;
pub type FillRandomFn = fn(&mut [u8], u64);
pub type FindByteFn = fn(&[u8], u8) -> Option<usize>;
pub type FindFn = fn(&[u8], &[u8]) -> Option<usize>;
pub type FindBytesetFn = fn(&[u8], &ByteSet) -> Option<usize>;
pub type ArgsortFn = fn(StringTape<'_>, &mut Vec<u64>) -> Result<()>;
pub type PgramsSortFn = fn(&mut [u64], &mut [u64]) -> Result<()>;
pub type IntersectFn =
    fn(StringTape<'_>, StringTape<'_>, u64, &mut Vec<u64>, &mut Vec<u64>) -> Result<usize>;

/// The full collection of operation slots. Exactly one instance is published
/// process-wide at a time; every slot is non-null by construction.
pub struct DispatchTable {
    pub equal: EqualFn,
    pub order: OrderFn,
    pub copy: CopyFn,
    pub move_within: MoveWithinFn,
    pub fill: FillFn,
    pub lookup: LookupFn,
    pub bytesum: BytesumFn,
    pub hash: HashFn,
    pub hash_state_update: HashStateUpdateFn,
    pub hash_state_digest: HashStateDigestFn,
    pub fill_random: FillRandomFn,
    pub find_byte: FindByteFn,
    pub rfind_byte: FindByteFn,
    pub find: FindFn,
    pub rfind: FindFn,
    pub find_byteset: FindBytesetFn,
    pub rfind_byteset: FindBytesetFn,
    pub argsort: ArgsortFn,
    pub pgrams_sort: PgramsSortFn,
    pub intersect: IntersectFn,

    caps: CapabilitySet,
    origins: [Tier; OP_COUNT],
}

impl DispatchTable {
    /// The always-correct portable table.
    fn serial() -> Self {
        Self {
            equal: strings::equal_serial,
            order: strings::order_serial,
            copy: strings::copy_serial,
            move_within: strings::move_within_serial,
            fill: strings::fill_serial,
            lookup: strings::lookup_serial,
            bytesum: strings::bytesum_serial,
            hash: strings::hash_serial,
            hash_state_update: strings::hash_state_update_serial,
            hash_state_digest: strings::hash_state_digest_serial,
            fill_random: strings::fill_random_serial,
            find_byte: strings::find_byte_serial,
            rfind_byte: strings::rfind_byte_serial,
            find: strings::find_serial,
            rfind: strings::rfind_serial,
            find_byteset: strings::find_byteset_serial,
            rfind_byteset: strings::rfind_byteset_serial,
            argsort: sequence::argsort_serial,
            pgrams_sort: sequence::pgrams_sort_serial,
            intersect: sequence::intersect_serial,
            caps: CapabilitySet::baseline(),
            origins: [Tier::Serial; OP_COUNT],
        }
    }

    /// Builds a table for `caps`: baseline first, then each tier overlay whose
    /// bit is present, in ascending specialization order. Overlays override
    /// only the slots their tier accelerates; absent tiers are skipped, never
    /// evaluated.
    pub fn build(caps: CapabilitySet) -> Self {
        let mut table = Self::serial();

        #[cfg(target_arch = "aarch64")]
        if caps.contains(CapabilitySet::NEON) {
            table.apply_neon();
        }

        #[cfg(all(
            any(target_arch = "x86", target_arch = "x86_64"),
            not(feature = "strx-nightly")
        ))]
        if caps.contains(CapabilitySet::HASWELL) {
            table.apply_haswell();
        }

        #[cfg(all(
            feature = "strx-nightly",
            any(target_arch = "x86", target_arch = "x86_64")
        ))]
        if caps.contains(CapabilitySet::SKYLAKE) {
            table.apply_skylake();
        }

        table.caps = caps;
        table
    }

    #[cfg(target_arch = "aarch64")]
    fn apply_neon(&mut self) {
        self.equal = strings::equal_neon;
        self.bytesum = strings::bytesum_neon;
        self.find_byte = strings::find_byte_neon;
        self.rfind_byte = strings::rfind_byte_neon;
        self.argsort = sequence::argsort_pgram;
        for op in [Op::Equal, Op::Bytesum, Op::FindByte, Op::RfindByte, Op::Argsort] {
            self.origins[op as usize] = Tier::Neon;
        }
    }

    #[cfg(all(
        any(target_arch = "x86", target_arch = "x86_64"),
        not(feature = "strx-nightly")
    ))]
    fn apply_haswell(&mut self) {
        self.equal = strings::equal_avx2;
        self.order = strings::order_avx2;
        self.bytesum = strings::bytesum_avx2;
        self.find_byte = strings::find_byte_avx2;
        self.rfind_byte = strings::rfind_byte_avx2;
        self.find = strings::find_avx2;
        self.rfind = strings::rfind_avx2;
        self.argsort = sequence::argsort_pgram;
        for op in [
            Op::Equal,
            Op::Order,
            Op::Bytesum,
            Op::FindByte,
            Op::RfindByte,
            Op::Find,
            Op::Rfind,
            Op::Argsort,
        ] {
            self.origins[op as usize] = Tier::Haswell;
        }
    }

    #[cfg(all(
        feature = "strx-nightly",
        any(target_arch = "x86", target_arch = "x86_64")
    ))]
    fn apply_skylake(&mut self) {
        self.equal = strings::equal_avx512;
        self.order = strings::order_avx512;
        self.bytesum = strings::bytesum_avx512;
        self.find_byte = strings::find_byte_avx512;
        self.rfind_byte = strings::rfind_byte_avx512;
        self.find = strings::find_avx512;
        self.argsort = sequence::argsort_pgram;
        for op in [
            Op::Equal,
            Op::Order,
            Op::Bytesum,
            Op::FindByte,
            Op::RfindByte,
            Op::Find,
            Op::Argsort,
        ] {
            self.origins[op as usize] = Tier::Skylake;
        }
    }

    /// The capability set this table was built for.
    #[inline]
    pub fn capabilities(&self) -> CapabilitySet {
        self.caps
    }

    /// Origin tier of the slot bound to `op`; diagnostics and tests.
    #[inline]
    pub fn origin(&self, op: Op) -> Tier {
        self.origins[op as usize]
    }
}

// =============================================================================
//  PUBLICATION & LIFECYCLE
// =============================================================================

static TABLE: AtomicPtr<DispatchTable> = AtomicPtr::new(ptr::null_mut());
static TABLE_INIT: Once = Once::new();

/// Swaps a freshly built table in. The previous table is intentionally leaked:
/// in-flight readers may still hold references, and rebuilds are a startup or
/// test-time event.
fn publish(table: DispatchTable) {
    let leaked: &'static mut DispatchTable = Box::leak(Box::new(table));
    TABLE.store(leaked, MemOrdering::Release);
}

/// Builds and publishes the table for the detected capability set.
///
/// Idempotent: later calls observe the first build (or whatever [`update`]
/// published since) and do nothing. Safe to call from concurrent threads;
/// readers only ever observe complete table snapshots.
pub fn init() {
    TABLE_INIT.call_once(|| {
        let caps = CapabilitySet::detect();
        trace!("STRX INIT: detected capabilities [{}]", caps.describe());
        publish(DispatchTable::build(caps));
    });
}

/// Rebuilds the table for a caller-chosen capability set, e.g. forcing
/// baseline for conformance testing. Concurrent `update` calls must be
/// serialized by the caller; concurrent readers are always safe.
pub fn update(caps: CapabilitySet) {
    // Mark initialization done so a later `init()` keeps the forced table.
    TABLE_INIT.call_once(|| {});
    trace!("STRX UPDATE: rebuilding for [{}]", caps.describe());
    publish(DispatchTable::build(caps));
}

/// Current table snapshot, initializing on first use.
///
/// This is the `ensure_initialized` guard every public entry point runs
/// through; after the first call it is a single atomic load.
#[inline]
pub fn table() -> &'static DispatchTable {
    let ptr = TABLE.load(MemOrdering::Acquire);
    if !ptr.is_null() {
        return unsafe { &*ptr };
    }
    init();
    unsafe { &*TABLE.load(MemOrdering::Acquire) }
}

// =============================================================================
//  PUBLIC ENTRY POINTS
//
// One function per operation, forwarding unconditionally to the current slot.
// No branching, no capability checks at call time.
// =============================================================================

/// Byte equality of `a` and `b`.
#[inline]
pub fn equal(a: &[u8], b: &[u8]) -> bool {
    (table().equal)(a, b)
}

/// Lexicographic byte order of `a` relative to `b`.
#[inline]
pub fn order(a: &[u8], b: &[u8]) -> Ordering {
    (table().order)(a, b)
}

/// Copies `src` into `dst`; the slices must have equal length.
#[inline]
pub fn copy(dst: &mut [u8], src: &[u8]) {
    (table().copy)(dst, src)
}

/// Copies `len` bytes from `src_idx` to `dst_idx` inside `buf`; the ranges may
/// overlap.
#[inline]
pub fn move_within(buf: &mut [u8], src_idx: usize, dst_idx: usize, len: usize) {
    (table().move_within)(buf, src_idx, dst_idx, len)
}

/// Fills `buf` with `value`.
#[inline]
pub fn fill(buf: &mut [u8], value: u8) {
    (table().fill)(buf, value)
}

/// Maps every byte of `src` through `lut` into `dst`.
#[inline]
pub fn lookup(dst: &mut [u8], src: &[u8], lut: &[u8; 256]) {
    (table().lookup)(dst, src, lut)
}

/// Sum of all byte values.
#[inline]
pub fn bytesum(data: &[u8]) -> u64 {
    (table().bytesum)(data)
}

/// Seeded 64-bit hash. Identical output on every tier.
#[inline]
pub fn hash(data: &[u8], seed: u64) -> u64 {
    (table().hash)(data, seed)
}

#[inline]
pub fn hash_state_update(state: &mut HashState, data: &[u8]) {
    (table().hash_state_update)(state, data)
}

#[inline]
pub fn hash_state_digest(state: &HashState) -> u64 {
    (table().hash_state_digest)(state)
}

/// Fills `buf` with deterministic pseudo-random bytes keyed by `nonce`.
#[inline]
pub fn fill_random(buf: &mut [u8], nonce: u64) {
    (table().fill_random)(buf, nonce)
}

/// Offset of the first occurrence of `needle`.
#[inline]
pub fn find_byte(haystack: &[u8], needle: u8) -> Option<usize> {
    (table().find_byte)(haystack, needle)
}

/// Offset of the last occurrence of `needle`.
#[inline]
pub fn rfind_byte(haystack: &[u8], needle: u8) -> Option<usize> {
    (table().rfind_byte)(haystack, needle)
}

/// Offset of the first occurrence of the substring `needle`.
#[inline]
pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    (table().find)(haystack, needle)
}

/// Offset of the last occurrence of the substring `needle`.
#[inline]
pub fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    (table().rfind)(haystack, needle)
}

/// Offset of the first byte belonging to `set`.
#[inline]
pub fn find_byteset(haystack: &[u8], set: &ByteSet) -> Option<usize> {
    (table().find_byteset)(haystack, set)
}

/// Offset of the last byte belonging to `set`.
#[inline]
pub fn rfind_byteset(haystack: &[u8], set: &ByteSet) -> Option<usize> {
    (table().rfind_byteset)(haystack, set)
}

/// Sorting permutation of the tape's strings, written into `indices`.
pub fn argsort_permutation(tape: StringTape<'_>, indices: &mut Vec<u64>) -> Result<()> {
    trace!("ARGSORT DISPATCH: count={}", tape.count());
    (table().argsort)(tape, indices)
}

/// Sorts caller-extracted pgrams in place, permuting `order` alongside.
pub fn pgrams_sort(pgrams: &mut [u64], order: &mut [u64]) -> Result<()> {
    trace!("PGRAMS_SORT DISPATCH: len={}", pgrams.len());
    (table().pgrams_sort)(pgrams, order)
}

/// Positions of the common strings of two tapes; see
/// [`crate::sequence::intersect_serial`] for the exact duplicate semantics.
pub fn intersect(
    a: StringTape<'_>,
    b: StringTape<'_>,
    seed: u64,
    a_positions: &mut Vec<u64>,
    b_positions: &mut Vec<u64>,
) -> Result<usize> {
    trace!(
        "INTERSECT DISPATCH: a.count()={}, b.count()={}",
        a.count(),
        b.count()
    );
    (table().intersect)(a, b, seed, a_positions, b_positions)
}

// =============================================================================
//  VERSION & CAPABILITY QUERIES
// =============================================================================

pub fn version_major() -> u32 {
    env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0)
}

pub fn version_minor() -> u32 {
    env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0)
}

pub fn version_patch() -> u32 {
    env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or(0)
}

/// Capability set of the currently published table.
pub fn capabilities() -> CapabilitySet {
    table().capabilities()
}

/// Human-readable tier list of the currently published table.
pub fn capabilities_str() -> String {
    capabilities().describe()
}
