//! Word-aligned extraction of a contiguous byte range from EVM execution memory.

use crate::tracing::primitives::word_to_u64_saturating;
use alloy_primitives::{Bytes, B256};

/// Extracts `size` bytes starting at `offset` from linear EVM memory.
///
/// `memory` is word-indexed (one 32-byte entry per EVM memory word); `offset` and `size` are
/// themselves given as 32-byte stack words, as they arrive directly off a `CALL`/`RETURN`/`LOG`
/// frame's stack. Words past the end of `memory` are treated as zero-filled, matching traces that
/// omit trailing unused memory.
///
/// Returns empty bytes if `size` is zero, regardless of `offset` or the contents of `memory`.
pub fn extract(offset: &B256, size: &B256, memory: &[B256]) -> Bytes {
    let size = word_to_u64_saturating(size) as usize;
    if size == 0 {
        return Bytes::new();
    }
    let offset = word_to_u64_saturating(offset) as usize;

    // Word containing the first byte, and one past the word containing the last byte.
    let start_word = offset / 32;
    let stop_word = (offset + size).div_ceil(32);
    // Include one extra word beyond the ceiling so cross-word reads are always covered.
    let end_word = stop_word + 1;

    let mut buf = Vec::with_capacity((end_word - start_word) * 32);
    for idx in start_word..end_word {
        match memory.get(idx) {
            Some(word) => buf.extend_from_slice(word.as_slice()),
            None => buf.extend_from_slice(&[0u8; 32]),
        }
    }

    let offset_in_word = offset % 32;
    Bytes::from(buf[offset_in_word..offset_in_word + size].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;

    #[test]
    fn zero_size_is_always_empty() {
        let offset = b256!("0000000000000000000000000000000000000000000000000000000000000040");
        let zero = B256::ZERO;
        assert!(extract(&offset, &zero, &[]).is_empty());
    }

    #[test]
    fn offset_past_end_of_memory_is_zero_filled() {
        let offset = b256!("0000000000000000000000000000000000000000000000000000000000000040");
        let size = b256!("0000000000000000000000000000000000000000000000000000000000000020");
        let result = extract(&offset, &size, &[]);
        assert_eq!(result.as_ref(), [0u8; 32].as_slice());
    }

    #[test]
    fn reads_a_single_aligned_word() {
        let word = b256!("000000000000000000000000000000000000000000000000000000004d4d2c");
        let offset = B256::ZERO;
        let size = b256!("0000000000000000000000000000000000000000000000000000000000000020");
        let result = extract(&offset, &size, &[word]);
        assert_eq!(result.as_ref(), word.as_slice());
    }

    #[test]
    fn reads_across_a_word_boundary() {
        let word0 = B256::repeat_byte(0xaa);
        let word1 = B256::repeat_byte(0xbb);
        // offset 16, size 32 -> bytes [16..48), i.e. the last 16 bytes of word0 then the first
        // 16 bytes of word1.
        let offset = b256!("0000000000000000000000000000000000000000000000000000000000000010");
        let size = b256!("0000000000000000000000000000000000000000000000000000000000000020");
        let result = extract(&offset, &size, &[word0, word1]);
        let mut expected = vec![0xaa; 16];
        expected.extend(vec![0xbb; 16]);
        assert_eq!(result.as_ref(), expected.as_slice());
    }
}
