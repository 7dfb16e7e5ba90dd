//! Hash Encoder Tests
//!
//! ## Test Scopes
//! - **Determinism**: Same email, same offset, on every call.
//! - **Pinned Vectors**: Guards against accidental changes to the digest, byte order or range reduction.
//! - **Range**: Every offset fits in 31 bits, including the `i32::MIN` edge.

#[cfg(test)]
mod tests {
    use crate::hashing::encoder::offset_from_prefix;
    use crate::hashing::{Offset, email_offset, verify_digest};

    // ============================================================
    // PINNED VECTORS
    // ============================================================

    #[test]
    fn test_offsets_match_pinned_table() {
        let table: &[(&str, u32)] = &[
            ("a@x.com", 943_814_073),
            ("b@x.com", 1_451_235_118),
            ("alice@example.com", 429_428_223),
            ("bob@example.com", 1_084_164_001),
            ("user+tag@example.org", 917_862_435),
            ("ünïcödé@example.de", 279_460_247),
        ];

        for (email, expected) in table {
            assert_eq!(
                email_offset(email).get(),
                *expected,
                "offset for {} changed",
                email
            );
        }
    }

    #[test]
    fn test_no_normalization_is_applied() {
        // Case and surrounding whitespace are part of the input.
        assert_eq!(email_offset("Alice@Example.com").get(), 795_859_960);
        assert_eq!(email_offset(" alice@example.com").get(), 1_341_925_070);
        assert_ne!(
            email_offset("Alice@Example.com"),
            email_offset("alice@example.com")
        );
    }

    #[test]
    fn test_known_collision_pair() {
        // Digest prefixes are exact negatives of each other, so the absolute
        // values collide.
        let first = email_offset("collide4699@x.com");
        let second = email_offset("collide12456@x.com");

        assert_eq!(first, second);
        assert_eq!(first.get(), 225_041_564);
    }

    // ============================================================
    // DETERMINISM & RANGE
    // ============================================================

    #[test]
    fn test_offset_is_deterministic() {
        for i in 0..100 {
            let email = format!("user{}@example.com", i);
            assert_eq!(email_offset(&email), email_offset(&email));
        }
    }

    #[test]
    fn test_offset_within_31_bits() {
        for i in 0..10_000 {
            let email = format!("range{}@example.com", i);
            assert!(email_offset(&email).get() <= Offset::MAX);
        }
    }

    #[test]
    fn test_min_int_prefix_saturates() {
        // 0x80000000 little-endian is i32::MIN.
        let offset = offset_from_prefix([0x00, 0x00, 0x00, 0x80]);
        assert_eq!(offset.get(), i32::MAX as u32);

        let offset = offset_from_prefix([0xff, 0xff, 0xff, 0xff]);
        assert_eq!(offset.get(), 1);

        let offset = offset_from_prefix([0x00, 0x00, 0x00, 0x00]);
        assert_eq!(offset.get(), 0);
    }

    #[test]
    fn test_offset_construction_rejects_top_bit() {
        assert!(Offset::new(Offset::MAX).is_some());
        assert!(Offset::new(Offset::MAX + 1).is_none());

        let parsed: Result<Offset, _> = serde_json::from_str("4294967295");
        assert!(parsed.is_err());

        let parsed: Offset = serde_json::from_str("42").unwrap();
        assert_eq!(parsed.get(), 42);
    }

    #[test]
    fn test_digest_self_test_passes() {
        assert!(verify_digest().is_ok());
    }
}
