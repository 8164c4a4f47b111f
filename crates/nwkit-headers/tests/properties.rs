//! Property tests for the header collection.

use nwkit_headers::{Headers, KeepAliveState};
use proptest::prelude::*;

/// Flip the case of ASCII letters according to `mask`.
fn recase(name: &str, mask: &[bool]) -> String {
    name.chars()
        .zip(mask.iter().cycle())
        .map(|(c, upper)| {
            if *upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            }
        })
        .collect()
}

fn pairs() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(("[A-Za-z][A-Za-z0-9-]{0,12}", "[ -~]{0,16}"), 0..8)
}

proptest! {
    #[test]
    fn test_lookup_ignores_case(
        name in "[a-z][a-z-]{0,15}",
        value in "[ -~]{0,24}",
        mask in prop::collection::vec(any::<bool>(), 1..8),
    ) {
        let mut h = Headers::new();
        h.add(name.clone(), value.clone()).unwrap();
        let other = recase(&name, &mask);
        prop_assert_eq!(h.get(&other), vec![value.as_str()]);
        prop_assert!(h.contains(&other));
    }

    #[test]
    fn test_replace_twice_leaves_latest(
        existing in pairs(),
        name in "[A-Za-z][A-Za-z-]{0,12}",
        first in "[ -~]{0,16}",
        second in "[ -~]{0,16}",
    ) {
        let mut h = Headers::try_from_pairs(existing).unwrap();
        h.replace_or_add(name.clone(), first).unwrap();
        h.replace_or_add(name.to_ascii_uppercase(), second.clone()).unwrap();
        prop_assert_eq!(h.get(&name), vec![second.as_str()]);
    }

    #[test]
    fn test_remove_after_add(
        existing in pairs(),
        name in "[a-z][a-z-]{0,12}",
        value in "[ -~]{0,16}",
        mask in prop::collection::vec(any::<bool>(), 1..8),
    ) {
        let mut h = Headers::try_from_pairs(existing).unwrap();
        h.add(recase(&name, &mask), value).unwrap();
        h.remove(&name.to_ascii_uppercase());
        prop_assert!(!h.contains(&name));
        prop_assert!(h.get(&name).is_empty());
    }

    #[test]
    fn test_equality_ignores_order(mut entries in pairs(), seed in any::<u64>()) {
        let original = Headers::try_from_pairs(entries.clone()).unwrap();
        if !entries.is_empty() {
            let len = entries.len();
            entries.rotate_left((seed as usize) % len);
        }
        let rotated = Headers::try_from_pairs(entries).unwrap();
        prop_assert_eq!(original, rotated);
    }

    #[test]
    fn test_canonical_pieces_have_no_commas(values in prop::collection::vec("[ -~]{0,24}", 1..4)) {
        let mut h = Headers::new();
        for value in &values {
            h.add("Accept", value.clone()).unwrap();
        }
        for piece in h.canonical_form("accept") {
            prop_assert!(!piece.contains(','));
            prop_assert!(!piece.starts_with(' ') && !piece.ends_with(' '));
        }
        prop_assert_eq!(h.canonical_form("set-cookie").len(), 0);
    }

    #[test]
    fn test_non_connection_mutations_keep_state(entries in pairs()) {
        let mut h = Headers::new();
        h.set_keep_alive_state(KeepAliveState::KeepAlive);
        for (name, value) in entries {
            if name.eq_ignore_ascii_case("connection") {
                continue;
            }
            h.add(name.clone(), value).unwrap();
            h.remove(&name);
        }
        prop_assert_eq!(h.keep_alive_state(), KeepAliveState::KeepAlive);
    }

    #[test]
    fn test_non_ascii_names_rejected(entries in pairs(), name in "[a-z]{0,4}[\u{80}-\u{7ff}][a-z]{0,4}") {
        let mut h = Headers::try_from_pairs(entries.clone()).unwrap();
        let before = h.clone();
        prop_assert!(h.add(name, "x").is_err());
        prop_assert_eq!(h.len(), before.len());
        prop_assert_eq!(h, before);
    }
}

#[test]
fn test_connection_add_resets_keep_alive() {
    for name in ["Connection", "connection", "CONNECTION"] {
        let mut h = Headers::new();
        h.set_keep_alive_state(KeepAliveState::KeepAlive);
        h.add(name, "close").unwrap();
        assert_eq!(h.keep_alive_state(), KeepAliveState::Unknown);
    }
}
