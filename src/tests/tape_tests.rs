// SPDX-License-Identifier: Apache-2.0

#[cfg(test)]
mod tests {
    #[allow(unused_imports)]
    use crate::test_utils::config_test_logger;
    use crate::{StringTape, StringTapeBuf, StrxError};

    #[test]
    fn round_trip_reproduces_every_string() {
        config_test_logger();
        let strings: Vec<&[u8]> = vec![b"kitten", b"", b"sitting", b"a", b"longer string here"];
        let tape = StringTapeBuf::from_strings(&strings).unwrap();
        assert_eq!(tape.count(), strings.len());

        let view = tape.as_tape();
        for (i, expected) in strings.iter().enumerate() {
            assert_eq!(view.get(i), *expected, "string {} did not round-trip", i);
        }
        assert_eq!(
            view.offsets()[view.count()],
            view.data().len() as u64,
            "last offset must equal the data length"
        );
        let collected: Vec<&[u8]> = view.iter().collect();
        assert_eq!(collected, strings);
    }

    #[test]
    fn empty_tape_has_one_offset() {
        let tape = StringTapeBuf::from_strings(Vec::<&[u8]>::new()).unwrap();
        assert_eq!(tape.count(), 0);
        assert!(tape.is_empty());
        let view = tape.as_tape();
        assert_eq!(view.offsets(), &[0]);
        assert_eq!(view.data().len(), 0);
        assert_eq!(view.iter().count(), 0);
    }

    #[test]
    fn borrowed_view_from_raw_parts() {
        let data = b"abcdef";
        let offsets = [0u64, 2, 2, 6];
        let tape = StringTape::try_new(data, &offsets).unwrap();
        assert_eq!(tape.count(), 3);
        assert_eq!(tape.get(0), b"ab");
        assert_eq!(tape.get(1), b"");
        assert_eq!(tape.get(2), b"cdef");
    }

    #[test]
    fn malformed_shapes_are_rejected() {
        let data = b"abcdef";

        let err = StringTape::try_new(data, &[]).unwrap_err();
        assert!(matches!(err, StrxError::InvalidArgument(_)));

        // First offset not zero.
        let err = StringTape::try_new(data, &[1, 6]).unwrap_err();
        assert!(matches!(err, StrxError::InvalidArgument(_)));

        // Decreasing offsets.
        let err = StringTape::try_new(data, &[0, 4, 2, 6]).unwrap_err();
        assert!(matches!(err, StrxError::InvalidArgument(_)));

        // Last offset disagrees with the data length.
        let err = StringTape::try_new(data, &[0, 5]).unwrap_err();
        assert!(matches!(err, StrxError::InvalidArgument(_)));
    }

    #[test]
    fn unchecked_constructor_accepts_valid_shapes() {
        let data = b"xyz";
        let offsets = [0u64, 1, 3];
        let tape = StringTape::from_parts_unchecked(data, &offsets);
        assert_eq!(tape.count(), 2);
        assert_eq!(tape.get(0), b"x");
        assert_eq!(tape.get(1), b"yz");
    }

    #[test]
    fn owned_tape_copies_its_input() {
        let source = vec![b"one".to_vec(), b"two".to_vec()];
        let tape = StringTapeBuf::from_strings(&source).unwrap();
        drop(source);
        assert_eq!(tape.as_tape().get(1), b"two");
    }
}
