const FNV32_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV32_PRIME: u32 = 0x0100_0193;

/// 32-bit FNV-1a over `bytes`.
#[inline]
pub const fn fnv1a_32(bytes: &[u8]) -> u32 {
    let mut hash = FNV32_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u32;
        hash = hash.wrapping_mul(FNV32_PRIME);
        i += 1;
    }
    hash
}

/// Index of the shard owning `key`, in `[0, shard_count)`.
///
/// `shard_count` must be positive; the bench config refuses an empty host
/// list before anything is routed.
#[inline]
pub fn shard_of(key: &str, shard_count: usize) -> usize {
    debug_assert!(shard_count > 0, "shard_count must be positive");
    fnv1a_32(key.as_bytes()) as usize % shard_count
}

#[cfg(test)]
mod test {
    use super::{fnv1a_32, shard_of};

    #[test]
    fn fnv_reference_values() {
        assert_eq!(fnv1a_32(b""), 0x811c_9dc5);
        assert_eq!(fnv1a_32(b"a"), 0xe40c_292c);
        assert_eq!(fnv1a_32(b"foobar"), 0xbf9c_f968);
    }

    #[test]
    fn test_resolve_shard() {
        for shard_count in 1..=16 {
            for i in 0..10000 {
                let key = i.to_string();
                let shard = shard_of(&key, shard_count);
                assert!(shard < shard_count);
                assert_eq!(shard, shard_of(&key.clone(), shard_count));
            }
        }
    }

    #[test]
    fn order_sensitive() {
        assert_ne!(fnv1a_32(b"12"), fnv1a_32(b"21"));
    }

    #[test]
    fn spreads_numeric_keys() {
        let shard_count = 8;
        let mut counts = [0usize; 8];
        for i in 0..80_000u32 {
            counts[shard_of(&i.to_string(), shard_count)] += 1;
        }
        for count in counts {
            assert!((8_000..=12_000).contains(&count), "{counts:?}");
        }
    }
}
