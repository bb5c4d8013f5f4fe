// SPDX-License-Identifier: Apache-2.0

//! Batch similarity bridge
//!
//! Pairwise edit distance and global alignment scoring over equal-count
//! [`StringTape`]s, one result per pair. Unlike the primitives in
//! [`crate::dispatch`], the backend here is fixed at build configuration time:
//! CUDA kernels when `build.rs` found `nvcc`, otherwise a rayon thread pool
//! partitioning the pairs across workers. Kernel launch overhead dominates
//! these workloads, so selection happens once per process, not per call.
//!
//! ## Bounded results
//! A nonzero `bound` lets the backend abandon a pair once its distance is
//! known to exceed the bound; such pairs report `bound + 1`, so any result
//! `<= bound` is exact.

use log::trace;
#[cfg(not(has_cuda))]
use rayon::prelude::*;

use crate::tape::StringTape;
use crate::types::{Result, StrxError};

/// Substitution-cost table for [`pairwise_alignment_score`]: `subs[a][b]` is
/// the score of aligning byte `a` against byte `b`.
pub type SubstitutionMatrix = [[i8; 256]; 256];

/// The unary matrix: 0 on matches, -1 on mismatches. With `gap = -1` the
/// resulting score equals the negated Levenshtein distance.
pub fn unary_substitution_costs() -> Box<SubstitutionMatrix> {
    let mut matrix = Box::new([[0i8; 256]; 256]);
    for a in 0..256 {
        for b in 0..256 {
            matrix[a][b] = if a == b { 0 } else { -1 };
        }
    }
    matrix
}

fn check_batch_shape(a: &StringTape<'_>, b: &StringTape<'_>, results_len: usize) -> Result<usize> {
    let count = a.count();
    if b.count() != count {
        return Err(StrxError::InvalidArgument(format!(
            "tapes must hold the same number of strings: {} != {}",
            count,
            b.count()
        )));
    }
    if results_len < count {
        return Err(StrxError::InvalidArgument(format!(
            "results buffer holds {} entries, need {}",
            results_len, count
        )));
    }
    Ok(count)
}

/// Levenshtein distance between string `i` of `a` and string `i` of `b`, for
/// every `i`, written into `results` in tape order.
///
/// `bound == 0` means unbounded. On error no result is defined; the buffer
/// contents are unspecified.
pub fn pairwise_levenshtein(
    a: StringTape<'_>,
    b: StringTape<'_>,
    bound: usize,
    results: &mut [u64],
) -> Result<()> {
    let count = check_batch_shape(&a, &b, results.len())?;
    trace!("PAIRWISE_LEVENSHTEIN: count={}, bound={}", count, bound);
    if count == 0 {
        return Ok(());
    }

    #[cfg(has_cuda)]
    {
        crate::gpu::batch_levenshtein(a, b, bound, &mut results[..count])
    }

    #[cfg(not(has_cuda))]
    {
        results[..count]
            .par_iter_mut()
            .enumerate()
            .try_for_each(|(i, out)| -> Result<()> {
                *out = levenshtein_bounded(a.get(i), b.get(i), bound)? as u64;
                Ok(())
            })
    }
}

/// Needleman-Wunsch global alignment score per pair under a caller-supplied
/// substitution matrix and linear gap cost.
pub fn pairwise_alignment_score(
    a: StringTape<'_>,
    b: StringTape<'_>,
    subs: &SubstitutionMatrix,
    gap: i8,
    results: &mut [i64],
) -> Result<()> {
    let count = check_batch_shape(&a, &b, results.len())?;
    trace!("PAIRWISE_ALIGNMENT: count={}, gap={}", count, gap);
    if count == 0 {
        return Ok(());
    }

    #[cfg(has_cuda)]
    {
        crate::gpu::batch_nw_score(a, b, subs, gap, &mut results[..count])
    }

    #[cfg(not(has_cuda))]
    {
        results[..count]
            .par_iter_mut()
            .enumerate()
            .try_for_each(|(i, out)| -> Result<()> {
                *out = nw_score(a.get(i), b.get(i), subs, gap)?;
                Ok(())
            })
    }
}

// =============================================================================
// SCALAR PAIR KERNELS
//
// Two-row DP formulations; the CUDA kernels implement the same recurrences.
// =============================================================================

/// Two-row Wagner-Fischer with optional early cut-off.
pub(crate) fn levenshtein_bounded(a: &[u8], b: &[u8], bound: usize) -> Result<usize> {
    // Keep the shorter string on the row to minimize the working set.
    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    if shorter.is_empty() {
        return Ok(if bound != 0 && longer.len() > bound {
            bound + 1
        } else {
            longer.len()
        });
    }
    if bound != 0 && longer.len() - shorter.len() > bound {
        return Ok(bound + 1);
    }

    let width = shorter.len() + 1;
    let mut previous: Vec<usize> = Vec::new();
    previous.try_reserve(width)?;
    previous.extend(0..width);
    let mut current: Vec<usize> = Vec::new();
    current.try_reserve(width)?;
    current.resize(width, 0);

    for (i, &lb) in longer.iter().enumerate() {
        current[0] = i + 1;
        let mut row_min = current[0];
        for (j, &sb) in shorter.iter().enumerate() {
            let substitution = previous[j] + usize::from(lb != sb);
            let insertion = current[j] + 1;
            let deletion = previous[j + 1] + 1;
            current[j + 1] = substitution.min(insertion).min(deletion);
            row_min = row_min.min(current[j + 1]);
        }
        if bound != 0 && row_min > bound {
            return Ok(bound + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    let distance = previous[width - 1];
    Ok(if bound != 0 && distance > bound {
        bound + 1
    } else {
        distance
    })
}

/// Two-row Needleman-Wunsch global alignment score.
pub(crate) fn nw_score(a: &[u8], b: &[u8], subs: &SubstitutionMatrix, gap: i8) -> Result<i64> {
    let gap = gap as i64;
    let width = b.len() + 1;
    let mut previous: Vec<i64> = Vec::new();
    previous.try_reserve(width)?;
    previous.extend((0..width as i64).map(|j| j * gap));
    let mut current: Vec<i64> = Vec::new();
    current.try_reserve(width)?;
    current.resize(width, 0);

    for (i, &ab) in a.iter().enumerate() {
        current[0] = (i as i64 + 1) * gap;
        for (j, &bb) in b.iter().enumerate() {
            let aligned = previous[j] + subs[ab as usize][bb as usize] as i64;
            let gap_a = previous[j + 1] + gap;
            let gap_b = current[j] + gap;
            current[j + 1] = aligned.max(gap_a).max(gap_b);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    Ok(previous[width - 1])
}
