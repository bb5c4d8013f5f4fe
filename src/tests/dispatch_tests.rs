// SPDX-License-Identifier: Apache-2.0

#[cfg(test)]
mod tests {
    #[allow(unused_imports)]
    use crate::test_utils::config_test_logger;
    use crate::test_utils::dispatch_test_lock;
    use crate::{
        capabilities, capabilities_str, init, order, update, version_major, version_minor,
        version_patch, CapabilitySet, DispatchTable, Op, Tier,
    };

    const ALL_OPS: [Op; 20] = [
        Op::Equal,
        Op::Order,
        Op::Copy,
        Op::MoveWithin,
        Op::Fill,
        Op::Lookup,
        Op::Bytesum,
        Op::Hash,
        Op::HashStateUpdate,
        Op::HashStateDigest,
        Op::FillRandom,
        Op::FindByte,
        Op::RfindByte,
        Op::Find,
        Op::Rfind,
        Op::FindByteset,
        Op::RfindByteset,
        Op::Argsort,
        Op::PgramsSort,
        Op::Intersect,
    ];

    #[test]
    fn detect_always_includes_serial() {
        config_test_logger();
        let caps = CapabilitySet::detect();
        assert!(
            caps.contains(CapabilitySet::SERIAL),
            "detection must always report the baseline tier"
        );
        assert!(CapabilitySet::baseline().is_subset_of(caps));
    }

    #[test]
    fn baseline_table_binds_serial_everywhere() {
        let table = DispatchTable::build(CapabilitySet::baseline());
        for op in ALL_OPS {
            assert_eq!(
                table.origin(op),
                Tier::Serial,
                "baseline build bound a non-serial slot for {:?}",
                op
            );
        }
        assert_eq!(table.capabilities(), CapabilitySet::baseline());
    }

    #[test]
    fn specialization_is_monotonic_in_the_capability_set() {
        let narrow = DispatchTable::build(CapabilitySet::baseline());
        let wide = DispatchTable::build(CapabilitySet::detect());
        for op in ALL_OPS {
            assert!(
                wide.origin(op) >= narrow.origin(op),
                "op {:?} lost specialization when widening the capability set: {:?} < {:?}",
                op,
                wide.origin(op),
                narrow.origin(op)
            );
        }
    }

    #[test]
    fn cross_tier_equivalence_for_every_slot() {
        let serial = DispatchTable::build(CapabilitySet::baseline());
        let best = DispatchTable::build(CapabilitySet::detect());

        // Inputs sized to cross the 16/32/64-byte SIMD chunk boundaries.
        let mut long_a = Vec::new();
        let mut long_b = Vec::new();
        for i in 0..257u32 {
            long_a.push((i % 251) as u8);
            long_b.push((i % 251) as u8);
        }
        long_b[200] = 0xEE;

        let samples: Vec<(&[u8], &[u8])> = vec![
            (b"", b""),
            (b"a", b"a"),
            (b"a", b"b"),
            (b"abc", b"abd"),
            (b"abc", b"abcd"),
            (b"same prefix, different tail AAAA", b"same prefix, different tail BBBB"),
            (&long_a, &long_a),
            (&long_a, &long_b),
        ];

        for (a, b) in &samples {
            assert_eq!(
                (serial.equal)(a, b),
                (best.equal)(a, b),
                "equal() diverged between tiers on {:?}",
                a
            );
            assert_eq!(
                (serial.order)(a, b),
                (best.order)(a, b),
                "order() diverged between tiers"
            );
            assert_eq!((serial.bytesum)(a), (best.bytesum)(a));
            assert_eq!((serial.hash)(a, 0), (best.hash)(a, 0));
            assert_eq!((serial.hash)(a, 42), (best.hash)(a, 42));
        }

        let haystack = &long_b;
        for needle in [0xEEu8, 0u8, 7u8, 0xFFu8] {
            assert_eq!(
                (serial.find_byte)(haystack, needle),
                (best.find_byte)(haystack, needle),
                "find_byte() diverged for needle {:#x}",
                needle
            );
            assert_eq!(
                (serial.rfind_byte)(haystack, needle),
                (best.rfind_byte)(haystack, needle),
                "rfind_byte() diverged for needle {:#x}",
                needle
            );
        }

        let subs: Vec<&[u8]> = vec![b"", b"\xEE", &long_b[190..210], &long_b[..3], b"missing!"];
        for needle in &subs {
            assert_eq!(
                (serial.find)(haystack, needle),
                (best.find)(haystack, needle),
                "find() diverged for needle {:?}",
                needle
            );
            assert_eq!(
                (serial.rfind)(haystack, needle),
                (best.rfind)(haystack, needle),
                "rfind() diverged for needle {:?}",
                needle
            );
        }
    }

    #[test]
    fn init_is_idempotent() {
        let _guard = dispatch_test_lock();
        init();
        let caps_first = capabilities();
        let origins_first: Vec<Tier> = {
            let table = crate::dispatch::table();
            ALL_OPS.iter().map(|&op| table.origin(op)).collect()
        };

        init();
        assert_eq!(capabilities(), caps_first, "second init() changed the capability set");
        let table = crate::dispatch::table();
        for (i, &op) in ALL_OPS.iter().enumerate() {
            assert_eq!(
                table.origin(op),
                origins_first[i],
                "second init() rebound slot {:?}",
                op
            );
        }
    }

    #[test]
    fn forced_baseline_orders_like_the_richest_tier() {
        let _guard = dispatch_test_lock();

        update(CapabilitySet::baseline());
        assert_eq!(capabilities(), CapabilitySet::baseline());
        assert_eq!(order(b"abc", b"abd"), std::cmp::Ordering::Less);

        update(CapabilitySet::detect());
        assert_eq!(order(b"abc", b"abd"), std::cmp::Ordering::Less);
    }

    #[test]
    fn capability_set_operations() {
        let a = CapabilitySet::SERIAL.union(CapabilitySet::HASWELL);
        assert!(a.contains(CapabilitySet::SERIAL));
        assert!(a.contains(CapabilitySet::HASWELL));
        assert!(!a.contains(CapabilitySet::CUDA));
        assert!(CapabilitySet::SERIAL.is_subset_of(a));
        assert_eq!(
            a.intersection(CapabilitySet::HASWELL),
            CapabilitySet::HASWELL
        );
        assert_eq!(a.describe(), "serial,haswell");
    }

    #[test]
    fn version_accessors_match_the_manifest() {
        let expected_major: u32 = env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap();
        let expected_minor: u32 = env!("CARGO_PKG_VERSION_MINOR").parse().unwrap();
        let expected_patch: u32 = env!("CARGO_PKG_VERSION_PATCH").parse().unwrap();
        assert_eq!(version_major(), expected_major);
        assert_eq!(version_minor(), expected_minor);
        assert_eq!(version_patch(), expected_patch);
    }

    #[test]
    fn capabilities_str_reports_serial_at_least() {
        let _guard = dispatch_test_lock();
        init();
        assert!(
            capabilities_str().contains("serial"),
            "capability rendering must always include the baseline tier"
        );
    }
}
