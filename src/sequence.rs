// SPDX-License-Identifier: Apache-2.0

//! Sequence operations
//!
//! Batch-level algorithms over [`StringTape`]s: permutation sorting, pgram
//! sorting, and set intersection. Like the byte kernels in
//! [`crate::strings`], these are selected through the dispatch table; the
//! accelerated sorting tier replaces full string comparisons with 8-byte
//! prefix signatures ("pgrams") and touches string data only on ties.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::constants::PGRAM_BYTES;
use crate::strings::{hash_serial, order_serial};
use crate::tape::StringTape;
use crate::types::{Result, StrxError};

/// Big-endian 8-byte prefix of `bytes`, zero-padded. Integer comparison of two
/// pgrams agrees with lexicographic comparison of the underlying prefixes.
#[inline]
pub fn extract_pgram(bytes: &[u8]) -> u64 {
    let mut word = [0u8; PGRAM_BYTES];
    let take = bytes.len().min(PGRAM_BYTES);
    word[..take].copy_from_slice(&bytes[..take]);
    u64::from_be_bytes(word)
}

// =============================================================================
// ARGSORT
// =============================================================================

/// Baseline argsort: direct lexicographic comparison of every candidate pair.
pub fn argsort_serial(tape: StringTape<'_>, indices: &mut Vec<u64>) -> Result<()> {
    let count = tape.count();
    indices.clear();
    indices.try_reserve(count)?;
    indices.extend(0..count as u64);

    // Index tie-break keeps the permutation deterministic and stable.
    indices.sort_unstable_by(|&a, &b| {
        order_serial(tape.get(a as usize), tape.get(b as usize)).then(a.cmp(&b))
    });
    Ok(())
}

/// Pgram-accelerated argsort: compares 8-byte prefix signatures first and only
/// falls back to full string comparison when the signatures tie.
pub fn argsort_pgram(tape: StringTape<'_>, indices: &mut Vec<u64>) -> Result<()> {
    let count = tape.count();
    indices.clear();
    indices.try_reserve(count)?;
    indices.extend(0..count as u64);

    let mut pgrams: Vec<u64> = Vec::new();
    pgrams.try_reserve(count)?;
    for i in 0..count {
        pgrams.push(extract_pgram(tape.get(i)));
    }

    indices.sort_unstable_by(|&a, &b| {
        let (pa, pb) = (pgrams[a as usize], pgrams[b as usize]);
        pa.cmp(&pb)
            .then_with(|| {
                let (sa, sb) = (tape.get(a as usize), tape.get(b as usize));
                if sa.len() == sb.len() && sa.len() <= PGRAM_BYTES {
                    // Equal-length strings fully captured by equal pgrams.
                    std::cmp::Ordering::Equal
                } else {
                    order_serial(sa, sb)
                }
            })
            .then(a.cmp(&b))
    });
    Ok(())
}

// =============================================================================
// PGRAM SORT
// =============================================================================

/// Sorts caller-extracted pgrams in place, permuting `order` alongside.
///
/// `order` typically starts as the identity permutation and ends up mapping
/// sorted positions back to original ones.
pub fn pgrams_sort_serial(pgrams: &mut [u64], order: &mut [u64]) -> Result<()> {
    if pgrams.len() != order.len() {
        return Err(StrxError::InvalidArgument(format!(
            "pgrams and order must have the same length: {} != {}",
            pgrams.len(),
            order.len()
        )));
    }
    if pgrams.len() <= 1 {
        return Ok(());
    }

    let mut pairs: Vec<(u64, u64)> = Vec::new();
    pairs.try_reserve(pgrams.len())?;
    for i in 0..pgrams.len() {
        pairs.push((pgrams[i], order[i]));
    }
    pairs.sort_unstable();
    for (i, (pgram, idx)) in pairs.into_iter().enumerate() {
        pgrams[i] = pgram;
        order[i] = idx;
    }
    Ok(())
}

// =============================================================================
// INTERSECTION
// =============================================================================

/// Positions of the common strings of two tapes.
///
/// Matched pairs are reported ordered by the first tape's position. A string
/// duplicated within one input contributes at most one match, anchored at its
/// first occurrence on both sides.
pub fn intersect_serial(
    a: StringTape<'_>,
    b: StringTape<'_>,
    seed: u64,
    a_positions: &mut Vec<u64>,
    b_positions: &mut Vec<u64>,
) -> Result<usize> {
    a_positions.clear();
    b_positions.clear();
    if a.is_empty() || b.is_empty() {
        return Ok(0);
    }

    // Index the second tape by seeded hash; first occurrence wins on
    // duplicates. Hash collisions are resolved by byte comparison at probe
    // time, chaining through a linked list of same-hash entries.
    let mut index: HashMap<u64, Vec<u64>> = HashMap::new();
    index.try_reserve(b.count())?;
    for j in 0..b.count() {
        let key = hash_serial(b.get(j), seed);
        match index.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(vec![j as u64]);
            }
            Entry::Occupied(mut slot) => {
                let bucket = slot.get_mut();
                if !bucket
                    .iter()
                    .any(|&seen| b.get(seen as usize) == b.get(j))
                {
                    bucket.try_reserve(1)?;
                    bucket.push(j as u64);
                }
            }
        }
    }

    let mut matched = 0usize;
    let mut consumed: Vec<bool> = Vec::new();
    consumed.try_reserve(b.count())?;
    consumed.resize(b.count(), false);

    for i in 0..a.count() {
        let needle = a.get(i);
        let key = hash_serial(needle, seed);
        if let Some(bucket) = index.get(&key) {
            for &j in bucket {
                let j = j as usize;
                if !consumed[j] && b.get(j) == needle {
                    consumed[j] = true;
                    a_positions.try_reserve(1)?;
                    b_positions.try_reserve(1)?;
                    a_positions.push(i as u64);
                    b_positions.push(j as u64);
                    matched += 1;
                    break;
                }
            }
        }
    }
    Ok(matched)
}
