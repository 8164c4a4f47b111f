//! ASCII case-insensitive byte comparison.

/// Clears the ASCII case bit (0x20).
const CASE_MASK: u8 = 0xDF;
const WORD_MASK: u64 = u64::from_ne_bytes([CASE_MASK; 8]);

/// Compares two byte strings, ignoring the ASCII case bit.
///
/// Both sides are folded by clearing bit 5 of every byte, so the rule is
/// applied uniformly to any byte, ASCII or not. No Unicode case folding
/// takes place. Eight bytes are compared at a time, with a bytewise pass
/// over the tail.
pub fn eq_ignore_ascii_case_bytes(lhs: &[u8], rhs: &[u8]) -> bool {
    if lhs.len() != rhs.len() {
        return false;
    }

    let mut lhs_words = lhs.chunks_exact(8);
    let mut rhs_words = rhs.chunks_exact(8);

    for (l, r) in lhs_words.by_ref().zip(rhs_words.by_ref()) {
        if (word(l) ^ word(r)) & WORD_MASK != 0 {
            return false;
        }
    }

    lhs_words
        .remainder()
        .iter()
        .zip(rhs_words.remainder())
        .all(|(l, r)| l & CASE_MASK == r & CASE_MASK)
}

/// Case-insensitive comparison of two header names.
#[inline]
pub(crate) fn name_eq(lhs: &str, rhs: &str) -> bool {
    eq_ignore_ascii_case_bytes(lhs.as_bytes(), rhs.as_bytes())
}

#[inline]
fn word(chunk: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(chunk);
    u64::from_ne_bytes(buf)
}
