use chrono::Utc;
use rand::Rng;

use crate::db_types::OrderNumber;

/// Ambiguous glyphs (0/O, 1/I/L) are left out so the number survives being read over the phone.
const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const SUFFIX_LEN: usize = 6;

/// Generates a fresh order number, e.g. `SO-20240614-K7P2QX`.
///
/// The date prefix keeps numbers roughly sortable for humans; uniqueness is enforced by the
/// database, and callers retry with a new number on a clash.
pub fn new_order_number() -> OrderNumber {
    let mut rng = rand::thread_rng();
    let suffix: String =
        (0..SUFFIX_LEN).map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char).collect();
    OrderNumber(format!("SO-{}-{suffix}", Utc::now().format("%Y%m%d")))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn order_numbers_have_the_expected_shape() {
        let number = new_order_number();
        let s = number.as_str();
        assert_eq!(s.len(), 3 + 8 + 1 + SUFFIX_LEN);
        assert!(s.starts_with("SO-"));
        let suffix = &s[12..];
        assert!(suffix.bytes().all(|b| SUFFIX_ALPHABET.contains(&b)), "unexpected glyph in {s}");
    }

    #[test]
    fn consecutive_numbers_differ() {
        let a = new_order_number();
        let b = new_order_number();
        assert_ne!(a, b);
    }
}
