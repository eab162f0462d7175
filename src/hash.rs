//! Index and rank primitives over 64-bit hashes.
//!
//! The top `index_bits` bits of a hash select a register, and the remaining `hash_bits` bits
//! provide the rank: the length of their leading run of zeros plus one.

use crate::config::{MAX_INDEX_BITS, MIN_INDEX_BITS};

/// Return register index stored in the top `index_bits` bits of `hash`.
///
/// `index_bits` must lie in [4..16] range, as guaranteed by `Config`.
#[inline]
pub fn index(hash: u64, index_bits: u8) -> usize {
    debug_assert!((MIN_INDEX_BITS..=MAX_INDEX_BITS).contains(&index_bits));
    let hash_bits = 64 - u32::from(index_bits);
    ((hash >> hash_bits) & ((1 << index_bits) - 1)) as usize
}

/// Return number of leading zeros within the lowest `hash_bits` bits of `hash` plus one.
///
/// If all of those bits are zero, `hash_bits + 1` is returned. `hash_bits` must lie in [48..60]
/// range, that is `64 - index_bits` for a valid `index_bits`.
#[inline]
pub fn rank(hash: u64, hash_bits: u8) -> u8 {
    debug_assert!((64 - MAX_INDEX_BITS..=64 - MIN_INDEX_BITS).contains(&hash_bits));
    let w = hash & ((1 << hash_bits) - 1);
    if w == 0 {
        return hash_bits + 1;
    }
    (w.leading_zeros() - (64 - u32::from(hash_bits)) + 1) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use test_case::test_case;

    #[test_case(0x0000_0000_0000_0000 => 51; "all zeros")]
    #[test_case(0x0000_0000_0000_0001 => 50; "lowest bit")]
    #[test_case(0x0000_0000_0000_0008 => 47; "fourth bit")]
    #[test_case(0x0003_ffff_ffff_ffff => 1; "all ones")]
    #[test_case(0x0008_0000_0000_0000 => 51; "only index bits set")]
    #[test_case(0xffff_ffff_ffff_ffff => 1; "index bits ignored")]
    fn test_rank_b14(hash: u64) -> u8 {
        rank(hash, 64 - 14)
    }

    #[test_case(0x0000_0000_0000_0000, 4 => 0)]
    #[test_case(0xf000_0000_0000_0000, 4 => 15)]
    #[test_case(0x1fff_ffff_ffff_ffff, 4 => 1)]
    #[test_case(0xffff_0000_0000_0000, 16 => 65535)]
    #[test_case(0x8001_0000_0000_0000, 16 => 32769)]
    #[test_case(0xfffc_0000_0000_0000, 14 => 16383)]
    fn test_index(hash: u64, index_bits: u8) -> usize {
        index(hash, index_bits)
    }

    #[test]
    fn test_rank_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        for index_bits in 4..=16u8 {
            let hash_bits = 64 - index_bits;
            for _ in 0..1000 {
                let hash: u64 = rng.gen();
                let r = rank(hash, hash_bits);
                assert!((1..=hash_bits + 1).contains(&r));
                assert!(index(hash, index_bits) < 1 << index_bits);
            }
        }
    }

    #[test]
    fn test_rank_depends_on_leading_zero_run_only() {
        let hash_bits = 50;
        for zeros in 0..hash_bits {
            let top = 1u64 << (hash_bits - 1 - zeros);
            // any bits below the leading one must not change the rank
            let noise = top.wrapping_sub(1) & 0x5555_5555_5555_5555;
            assert_eq!(rank(top, hash_bits), zeros + 1);
            assert_eq!(rank(top | noise, hash_bits), zeros + 1);
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn test_index_rejects_zero_index_bits() {
        index(u64::MAX, 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn test_rank_rejects_full_width_hash_bits() {
        rank(u64::MAX, 64);
    }
}
