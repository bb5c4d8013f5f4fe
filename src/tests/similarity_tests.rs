// SPDX-License-Identifier: Apache-2.0

#[cfg(test)]
mod tests {
    #[allow(unused_imports)]
    use crate::test_utils::config_test_logger;
    use crate::similarity::{levenshtein_bounded, nw_score};
    use crate::{
        pairwise_alignment_score, pairwise_levenshtein, unary_substitution_costs, StringTapeBuf,
        StrxError,
    };

    fn tape_of(strings: &[&[u8]]) -> StringTapeBuf {
        StringTapeBuf::from_strings(strings).unwrap()
    }

    // =============================================================================
    //   SCALAR PAIR KERNELS
    // =============================================================================

    #[test]
    fn levenshtein_known_distances() {
        config_test_logger();
        assert_eq!(levenshtein_bounded(b"kitten", b"sitting", 0).unwrap(), 3);
        assert_eq!(levenshtein_bounded(b"sitting", b"kitten", 0).unwrap(), 3);
        assert_eq!(levenshtein_bounded(b"", b"", 0).unwrap(), 0);
        assert_eq!(levenshtein_bounded(b"", b"abc", 0).unwrap(), 3);
        assert_eq!(levenshtein_bounded(b"abc", b"abc", 0).unwrap(), 0);
        assert_eq!(levenshtein_bounded(b"flaw", b"lawn", 0).unwrap(), 2);
        assert_eq!(levenshtein_bounded(b"abc", b"xyz", 0).unwrap(), 3);
    }

    #[test]
    fn levenshtein_bound_reports_cutoff_as_bound_plus_one() {
        // True distance 3; any smaller bound cuts off and reports bound + 1.
        assert_eq!(levenshtein_bounded(b"kitten", b"sitting", 1).unwrap(), 2);
        assert_eq!(levenshtein_bounded(b"kitten", b"sitting", 2).unwrap(), 3);
        // Bound equal to or above the distance is exact.
        assert_eq!(levenshtein_bounded(b"kitten", b"sitting", 3).unwrap(), 3);
        assert_eq!(levenshtein_bounded(b"kitten", b"sitting", 100).unwrap(), 3);
        // Length-difference early exit.
        assert_eq!(levenshtein_bounded(b"a", b"aaaaaaaa", 2).unwrap(), 3);
        assert_eq!(levenshtein_bounded(b"", b"aaaa", 2).unwrap(), 3);
    }

    #[test]
    fn alignment_score_with_unary_costs_negates_levenshtein() {
        let subs = unary_substitution_costs();
        assert_eq!(nw_score(b"kitten", b"sitting", &subs, -1).unwrap(), -3);
        assert_eq!(nw_score(b"abc", b"abc", &subs, -1).unwrap(), 0);
        assert_eq!(nw_score(b"", b"abc", &subs, -1).unwrap(), -3);
        assert_eq!(nw_score(b"", b"", &subs, -1).unwrap(), 0);
    }

    #[test]
    fn alignment_score_rewards_matches_under_custom_costs() {
        // +2 on match, -1 on mismatch, gaps at -2.
        let mut subs = unary_substitution_costs();
        for a in 0..256usize {
            for b in 0..256usize {
                subs[a][b] = if a == b { 2 } else { -1 };
            }
        }
        assert_eq!(nw_score(b"acgt", b"acgt", &subs, -2).unwrap(), 8);
        // One mismatch in the middle: three matches plus one substitution.
        assert_eq!(nw_score(b"acgt", b"acct", &subs, -2).unwrap(), 5);
        // Pure gap: four deletions.
        assert_eq!(nw_score(b"acgt", b"", &subs, -2).unwrap(), -8);
    }

    // =============================================================================
    //   BATCH BRIDGE
    // =============================================================================

    #[test]
    fn batch_single_pair_matches_the_spec_scenario() {
        let a = tape_of(&[b"kitten"]);
        let b = tape_of(&[b"sitting"]);
        let mut results = [0u64; 1];
        pairwise_levenshtein(a.as_tape(), b.as_tape(), 0, &mut results).unwrap();
        assert_eq!(results, [3]);
    }

    #[test]
    fn batch_results_follow_tape_order() {
        let a = tape_of(&[b"kitten", b"flaw", b"same", b""]);
        let b = tape_of(&[b"sitting", b"lawn", b"same", b"abc"]);
        let mut results = [0u64; 4];
        pairwise_levenshtein(a.as_tape(), b.as_tape(), 0, &mut results).unwrap();
        assert_eq!(results, [3, 2, 0, 3]);
    }

    #[test]
    fn batch_bound_applies_per_pair() {
        let a = tape_of(&[b"kitten", b"same"]);
        let b = tape_of(&[b"sitting", b"same"]);
        let mut results = [0u64; 2];
        pairwise_levenshtein(a.as_tape(), b.as_tape(), 1, &mut results).unwrap();
        assert_eq!(results[0], 2, "cut-off pair reports bound + 1");
        assert_eq!(results[1], 0, "pairs within the bound stay exact");
    }

    #[test]
    fn batch_zero_count_succeeds_without_writes() {
        let empty = tape_of(&[]);
        let mut results = [0xAAu64; 3];
        pairwise_levenshtein(empty.as_tape(), empty.as_tape(), 0, &mut results).unwrap();
        assert_eq!(results, [0xAA; 3], "zero-count batch must not touch the buffer");
    }

    #[test]
    fn batch_shape_violations_are_invalid_arguments() {
        let a = tape_of(&[b"one", b"two"]);
        let b = tape_of(&[b"one"]);
        let mut results = [0u64; 2];
        let err = pairwise_levenshtein(a.as_tape(), b.as_tape(), 0, &mut results).unwrap_err();
        assert!(matches!(err, StrxError::InvalidArgument(_)));

        // Results buffer shorter than the batch.
        let b = tape_of(&[b"one", b"two"]);
        let mut short = [0u64; 1];
        let err = pairwise_levenshtein(a.as_tape(), b.as_tape(), 0, &mut short).unwrap_err();
        assert!(matches!(err, StrxError::InvalidArgument(_)));

        let mut scores = [0i64; 1];
        let subs = unary_substitution_costs();
        let err =
            pairwise_alignment_score(a.as_tape(), b.as_tape(), &subs, -1, &mut scores).unwrap_err();
        assert!(matches!(err, StrxError::InvalidArgument(_)));
    }

    #[test]
    fn batch_alignment_scores_follow_tape_order() {
        let a = tape_of(&[b"kitten", b"acgt"]);
        let b = tape_of(&[b"sitting", b"acgt"]);
        let subs = unary_substitution_costs();
        let mut scores = [0i64; 2];
        pairwise_alignment_score(a.as_tape(), b.as_tape(), &subs, -1, &mut scores).unwrap();
        assert_eq!(scores, [-3, 0]);
    }

    #[test]
    fn batch_handles_oversized_results_buffer() {
        let a = tape_of(&[b"x"]);
        let b = tape_of(&[b"y"]);
        let mut results = [7u64; 4];
        pairwise_levenshtein(a.as_tape(), b.as_tape(), 0, &mut results).unwrap();
        assert_eq!(results[0], 1);
        assert_eq!(&results[1..], &[7, 7, 7], "entries past the batch stay untouched");
    }
}
