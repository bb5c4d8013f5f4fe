// SPDX-License-Identifier: Apache-2.0

//! strx library
//!
//! Hardware-dispatched string primitives with batched similarity scoring.
//! Every primitive has a portable serial implementation and optional SIMD
//! backends; batch edit distance and alignment scoring offload to CUDA when
//! available and to a host thread pool otherwise.
//!
//! - Byte primitives (compare, order, copy, fill, lookup, checksum, hash, search)
//! - Sequence operations over columnar string tapes (argsort, pgram sort, intersection)
//! - Pairwise batch similarity (Levenshtein distance, global alignment scoring)
//!
//! ## Hardware support
//! - **AVX2 / NEON** are used on stable Rust where available
//! - **AVX-512** is available behind the `strx-nightly` feature (nightly Rust)
//! - **CUDA** is enabled when detected by `build.rs` (requires `nvcc`)
//!
//! ## Usage
//!
//! ```rust
//! use strx;
//!
//! // Primitives dispatch through one per-operation slot, bound once at init.
//! assert_eq!(strx::find(b"haystack needle haystack", b"needle"), Some(9));
//! let digest = strx::hash(b"hello world", 0);
//!
//! // The same inputs hash identically on every hardware tier.
//! strx::update(strx::CapabilitySet::baseline());
//! assert_eq!(strx::hash(b"hello world", 0), digest);
//!
//! // Check what the current table was built for.
//! println!("tiers: {}", strx::capabilities_str());
//! ```

#![allow(clippy::missing_safety_doc)]
#![cfg_attr(feature = "strx-nightly", feature(stdarch_x86_avx512))]

pub mod constants;
pub mod dispatch;
#[cfg(has_cuda)]
pub mod gpu;
pub mod sequence;
pub mod similarity;
pub mod strings;
pub mod tape;
pub mod types;

pub use dispatch::*;
pub use similarity::{
    pairwise_alignment_score, pairwise_levenshtein, unary_substitution_costs, SubstitutionMatrix,
};
pub use strings::HashState;
pub use tape::{StringTape, StringTapeBuf};
pub use types::*;

#[cfg(test)]
pub mod test_utils;

#[cfg(test)]
#[path = "tests/dispatch_tests.rs"]
mod dispatch_tests;
#[cfg(test)]
#[path = "tests/sequence_tests.rs"]
mod sequence_tests;
#[cfg(test)]
#[path = "tests/similarity_tests.rs"]
mod similarity_tests;
#[cfg(test)]
#[path = "tests/strings_tests.rs"]
mod strings_tests;
#[cfg(test)]
#[path = "tests/tape_tests.rs"]
mod tape_tests;
