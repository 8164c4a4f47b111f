//! The header collection.
//!
//! [`Headers`] is an ordered multi-map of name/value pairs. Lookups compare
//! names ASCII case-insensitively; values are opaque and returned exactly as
//! stored. Insertion order is observable through iteration and through
//! [`Headers::first`], but does not take part in equality.

use std::collections::HashSet;
use std::fmt;
use std::iter::FusedIterator;
use std::ops::Index;

use serde::de::{Deserialize, Deserializer, Error as _};
use serde::ser::{Serialize, Serializer};

use crate::compare::name_eq;
use crate::error::InvalidHeaderName;
use crate::keep_alive::KeepAliveState;
use crate::names;

/// An ordered collection of header name/value pairs.
#[derive(Clone, Default)]
pub struct Headers {
    entries: Vec<(String, String)>,
    keep_alive_state: KeepAliveState,
}

/// Opaque position of an entry in a [`Headers`] collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HeaderIndex(usize);

fn validate_name(name: &str) -> Result<(), InvalidHeaderName> {
    if name.is_ascii() {
        Ok(())
    } else {
        Err(InvalidHeaderName::new(name))
    }
}

fn is_connection_header(name: &str) -> bool {
    name_eq(name, names::CONNECTION)
}

/// Strips spaces and horizontal tabs, nothing else.
fn trim_ows(piece: &str) -> &str {
    piece.trim_matches(|c| c == ' ' || c == '\t')
}

impl Headers {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty collection with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            keep_alive_state: KeepAliveState::Unknown,
        }
    }

    /// Create a collection holding exactly `pairs`, in order.
    pub fn try_from_pairs<I, K, V>(pairs: I) -> Result<Self, InvalidHeaderName>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut headers = Self::new();
        headers.add_all(pairs)?;
        Ok(headers)
    }

    /// Append a header.
    ///
    /// This is strictly additive: existing entries with the same name are
    /// kept. The collection is left untouched if `name` is not ASCII.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), InvalidHeaderName> {
        let name = name.into();
        validate_name(&name)?;
        self.push_validated(name, value.into());
        Ok(())
    }

    /// Append every pair of `pairs`, in order.
    ///
    /// All names are checked before anything is appended, so a rejected
    /// batch leaves the collection unmodified.
    pub fn add_all<I, K, V>(&mut self, pairs: I) -> Result<(), InvalidHeaderName>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let pairs: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect();

        for (name, _) in &pairs {
            validate_name(name)?;
        }

        self.entries.reserve(pairs.len());
        for (name, value) in pairs {
            self.push_validated(name, value);
        }
        Ok(())
    }

    /// Append all entries of `other` after the existing ones.
    ///
    /// The keep-alive state only drops back to unknown when `other`'s state
    /// is itself unknown; a resolved state on `other` leaves ours as is.
    pub fn extend_from(&mut self, other: &Headers) {
        self.entries.extend(other.entries.iter().cloned());
        if other.keep_alive_state == KeepAliveState::Unknown {
            self.keep_alive_state = KeepAliveState::Unknown;
        }
    }

    /// Replace every entry named `name` with a single `(name, value)` entry
    /// at the end of the collection.
    pub fn replace_or_add(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), InvalidHeaderName> {
        let name = name.into();
        validate_name(&name)?;
        self.remove(&name);
        self.push_validated(name, value.into());
        Ok(())
    }

    /// Remove every entry named `name`.
    pub fn remove(&mut self, name: &str) {
        if is_connection_header(name) {
            self.keep_alive_state = KeepAliveState::Unknown;
        }
        self.entries.retain(|(existing, _)| !name_eq(existing, name));
    }

    /// All values for `name`, in their original order and representation.
    ///
    /// Comma-separated lists are returned unsplit; see
    /// [`Headers::canonical_form`] for a decomposed view.
    pub fn get(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(existing, _)| name_eq(existing, name))
            .map(|(_, value)| value.as_str())
            .collect()
    }

    /// Lazily iterate over the values for `name`.
    pub fn values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(existing, _)| name_eq(existing, name))
            .map(|(_, value)| value.as_str())
    }

    /// The first stored value for `name`.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| name_eq(existing, name))
            .map(|(_, value)| value.as_str())
    }

    /// Whether at least one entry is named `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(existing, _)| name_eq(existing, name))
    }

    /// The values for `name` split on commas, with surrounding spaces and
    /// tabs removed from each piece.
    ///
    /// `Set-Cookie` values are returned whole: commas legitimately occur
    /// inside cookie expiry dates.
    pub fn canonical_form(&self, name: &str) -> Vec<&str> {
        let values = self.get(name);

        if name_eq(name, names::SET_COOKIE) {
            return values;
        }

        values
            .into_iter()
            .flat_map(|value| {
                value
                    .split(',')
                    .filter(|piece| !piece.is_empty())
                    .map(trim_ows)
            })
            .collect()
    }

    /// The cached keep-alive classification.
    pub fn keep_alive_state(&self) -> KeepAliveState {
        self.keep_alive_state
    }

    /// Record a keep-alive classification derived from the `Connection`
    /// header. It stays cached until the next mutation touching that header.
    pub fn set_keep_alive_state(&mut self, state: KeepAliveState) {
        self.keep_alive_state = state;
    }

    /// Number of entries, duplicates included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the collection has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries that fit without reallocating.
    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    /// Reserve room for at least `additional` more entries.
    pub fn reserve(&mut self, additional: usize) {
        self.entries.reserve(additional);
    }

    /// Iterate over the entry names in order, duplicates included.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.entries.iter(),
        }
    }

    /// Position of the first entry.
    pub fn start_index(&self) -> HeaderIndex {
        HeaderIndex(0)
    }

    /// Position one past the last entry.
    pub fn end_index(&self) -> HeaderIndex {
        HeaderIndex(self.entries.len())
    }

    /// The position following `index`, or `None` if `index` is the end.
    pub fn index_after(&self, index: HeaderIndex) -> Option<HeaderIndex> {
        (index.0 < self.entries.len()).then(|| HeaderIndex(index.0 + 1))
    }

    /// The position preceding `index`, or `None` if `index` is the start.
    pub fn index_before(&self, index: HeaderIndex) -> Option<HeaderIndex> {
        index.0.checked_sub(1).map(HeaderIndex)
    }

    /// The entry at `index`, if it is in bounds.
    pub fn get_at(&self, index: HeaderIndex) -> Option<(&str, &str)> {
        self.entries
            .get(index.0)
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Push an entry whose name has already been checked.
    pub(crate) fn push_validated(&mut self, name: String, value: String) {
        if is_connection_header(&name) {
            self.keep_alive_state = KeepAliveState::Unknown;
        }
        self.entries.push((name, value));
    }
}

impl Index<HeaderIndex> for Headers {
    type Output = (String, String);

    fn index(&self, index: HeaderIndex) -> &Self::Output {
        &self.entries[index.0]
    }
}

/// Iterator over the entries of a [`Headers`] collection.
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    inner: std::slice::Iter<'a, (String, String)>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner
            .next_back()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a str, &'a str);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for Headers {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K, V> TryFrom<Vec<(K, V)>> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    type Error = InvalidHeaderName;

    fn try_from(pairs: Vec<(K, V)>) -> Result<Self, Self::Error> {
        Self::try_from_pairs(pairs)
    }
}

impl<K, V, const N: usize> TryFrom<[(K, V); N]> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    type Error = InvalidHeaderName;

    fn try_from(pairs: [(K, V); N]) -> Result<Self, Self::Error> {
        Self::try_from_pairs(pairs)
    }
}

/// Equal when both hold the same names (ignoring case) and, for every
/// name, the same multiset of values. Order and keep-alive state are
/// ignored.
impl PartialEq for Headers {
    fn eq(&self, other: &Self) -> bool {
        if self.entries.len() != other.entries.len() {
            return false;
        }

        let lhs_names: HashSet<String> = self.names().map(str::to_ascii_lowercase).collect();
        let rhs_names: HashSet<String> = other.names().map(str::to_ascii_lowercase).collect();
        if lhs_names != rhs_names {
            return false;
        }

        lhs_names.iter().all(|name| {
            let mut lhs = self.get(name);
            let mut rhs = other.get(name);
            lhs.sort_unstable();
            rhs.sort_unstable();
            lhs == rhs
        })
    }
}

impl Eq for Headers {}

impl fmt::Debug for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        f.write_str("]")
    }
}

impl Serialize for Headers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for Headers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pairs = Vec::<(String, String)>::deserialize(deserializer)?;
        Self::try_from_pairs(pairs).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn headers(pairs: &[(&str, &str)]) -> Headers {
        Headers::try_from_pairs(pairs.iter().copied()).unwrap()
    }

    #[test]
    fn test_new_is_empty_and_unknown() {
        let h = Headers::new();
        assert!(h.is_empty());
        assert_eq!(h.len(), 0);
        assert_eq!(h.keep_alive_state(), KeepAliveState::Unknown);
        assert_eq!(h.first("anything"), None);
    }

    #[test]
    fn test_construction_keeps_order() {
        let h = headers(&[("B", "2"), ("A", "1"), ("b", "3")]);
        let pairs: Vec<_> = h.iter().collect();
        assert_eq!(pairs, vec![("B", "2"), ("A", "1"), ("b", "3")]);
    }

    #[test]
    fn test_add_is_additive() {
        let mut h = Headers::new();
        h.add("Accept", "text/html").unwrap();
        h.add("accept", "application/json").unwrap();
        assert_eq!(h.len(), 2);
        assert_eq!(h.get("ACCEPT"), vec!["text/html", "application/json"]);
    }

    #[test]
    fn test_add_rejects_non_ascii_name() {
        let mut h = headers(&[("A", "1")]);
        let err = h.add("İ", "x").unwrap_err();
        assert_eq!(err.name(), "İ");
        assert_eq!(h, headers(&[("A", "1")]));
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn test_add_accepts_non_ascii_value() {
        let mut h = Headers::new();
        h.add("X-Name", "Zoë").unwrap();
        assert_eq!(h.first("x-name"), Some("Zoë"));
    }

    #[test]
    fn test_add_all_rejects_whole_batch() {
        let mut h = headers(&[("A", "1")]);
        let result = h.add_all([("B", "2"), ("Ünicode", "3")]);
        assert!(result.is_err());
        assert_eq!(h.len(), 1);
        assert!(!h.contains("B"));
    }

    #[test]
    fn test_replace_or_add_leaves_single_trailing_entry() {
        let mut h = headers(&[("Location", "/a"), ("X", "1"), ("location", "/b")]);
        h.replace_or_add("LOCATION", "/c").unwrap();
        let pairs: Vec<_> = h.iter().collect();
        assert_eq!(pairs, vec![("X", "1"), ("LOCATION", "/c")]);
    }

    #[test]
    fn test_replace_or_add_rejects_without_removing() {
        let mut h = headers(&[("A", "1")]);
        assert!(h.replace_or_add("Ä", "2").is_err());
        assert_eq!(h.get("A"), vec!["1"]);
    }

    #[test]
    fn test_remove_all_case_variants() {
        let mut h = headers(&[("Cache-Control", "no-cache"), ("X", "1"), ("cache-control", "max-age=0")]);
        h.remove("CACHE-CONTROL");
        assert!(!h.contains("cache-control"));
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn test_remove_missing_name_is_noop() {
        let mut h = headers(&[("A", "1")]);
        h.remove("B");
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn test_first_uses_storage_order() {
        let h = headers(&[("X", "1"), ("Accept", "a"), ("accept", "b")]);
        assert_eq!(h.first("ACCEPT"), Some("a"));
        assert_eq!(h.first("missing"), None);
    }

    #[test_case("Accept-Encoding", "gzip, deflate", &["gzip", "deflate"]; "simple list")]
    #[test_case("Accept", "a,\tb ,c", &["a", "b", "c"]; "tabs and spaces")]
    #[test_case("Accept", "a,,b", &["a", "b"]; "empty piece dropped")]
    #[test_case("Accept", "a, ,b", &["a", "", "b"]; "whitespace piece kept empty")]
    #[test_case("Accept", "\u{a0}a", &["\u{a0}a"]; "unicode whitespace untouched")]
    #[test_case("Set-Cookie", "a=1, b=2", &["a=1, b=2"]; "cookies unsplit")]
    fn test_canonical_form_single_value(name: &str, value: &str, expected: &[&str]) {
        let h = headers(&[(name, value)]);
        assert_eq!(h.canonical_form(&name.to_ascii_lowercase()), expected);
    }

    #[test]
    fn test_canonical_form_flattens_lines_in_order() {
        let h = headers(&[("Vary", "Accept, Origin"), ("X", "y"), ("vary", "Cookie")]);
        assert_eq!(h.canonical_form("VARY"), vec!["Accept", "Origin", "Cookie"]);
        assert!(h.canonical_form("missing").is_empty());
    }

    #[test]
    fn test_canonical_form_set_cookie_case_insensitive() {
        let h = headers(&[("set-cookie", "id=1; Expires=Wed, 21 Oct 2015 07:28:00 GMT")]);
        assert_eq!(
            h.canonical_form("SET-COOKIE"),
            vec!["id=1; Expires=Wed, 21 Oct 2015 07:28:00 GMT"]
        );
    }

    #[test]
    fn test_equality_ignores_order_and_name_case() {
        assert_eq!(headers(&[("A", "1"), ("B", "2")]), headers(&[("B", "2"), ("A", "1")]));
        assert_eq!(headers(&[("x", "1")]), headers(&[("X", "1")]));
        assert_ne!(headers(&[("x", "1")]), headers(&[("x", "2")]));
    }

    #[test]
    fn test_equality_compares_value_multisets() {
        assert_eq!(
            headers(&[("A", "1"), ("a", "2")]),
            headers(&[("A", "2"), ("A", "1")])
        );
        assert_ne!(
            headers(&[("A", "1"), ("A", "1")]),
            headers(&[("A", "1"), ("B", "1")])
        );
        assert_ne!(headers(&[("A", "1")]), headers(&[("A", "1"), ("A", "1")]));
    }

    #[test]
    fn test_equality_ignores_keep_alive_state() {
        let mut lhs = headers(&[("A", "1")]);
        lhs.set_keep_alive_state(KeepAliveState::Close);
        assert_eq!(lhs, headers(&[("A", "1")]));
    }

    #[test]
    fn test_connection_mutations_reset_keep_alive() {
        let mut h = Headers::new();
        h.set_keep_alive_state(KeepAliveState::KeepAlive);
        h.add("cOnNeCtIoN", "close").unwrap();
        assert_eq!(h.keep_alive_state(), KeepAliveState::Unknown);

        h.set_keep_alive_state(KeepAliveState::Close);
        h.replace_or_add("Connection", "keep-alive").unwrap();
        assert_eq!(h.keep_alive_state(), KeepAliveState::Unknown);

        h.set_keep_alive_state(KeepAliveState::KeepAlive);
        h.remove("CONNECTION");
        assert_eq!(h.keep_alive_state(), KeepAliveState::Unknown);
    }

    #[test]
    fn test_other_mutations_keep_keep_alive() {
        let mut h = headers(&[("Connection", "close")]);
        h.set_keep_alive_state(KeepAliveState::Close);
        h.add("Accept", "*/*").unwrap();
        h.replace_or_add("Host", "example.com").unwrap();
        h.remove("Accept");
        assert_eq!(h.keep_alive_state(), KeepAliveState::Close);
    }

    #[test]
    fn test_extend_from_appends_in_order() {
        let mut h = headers(&[("A", "1")]);
        h.extend_from(&headers(&[("B", "2"), ("C", "3")]));
        let names: Vec<_> = h.names().collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    // Open question: merging only clears the state when the other side's
    // state is unknown, even if the other side carries a Connection header.
    #[test]
    fn test_extend_from_propagates_only_unknown() {
        let mut other = headers(&[("Connection", "close")]);
        other.set_keep_alive_state(KeepAliveState::Close);

        let mut h = Headers::new();
        h.set_keep_alive_state(KeepAliveState::KeepAlive);
        h.extend_from(&other);
        assert_eq!(h.keep_alive_state(), KeepAliveState::KeepAlive);

        h.extend_from(&Headers::new());
        assert_eq!(h.keep_alive_state(), KeepAliveState::Unknown);
    }

    #[test]
    fn test_index_navigation() {
        let h = headers(&[("A", "1"), ("B", "2")]);
        let start = h.start_index();
        let end = h.end_index();
        assert!(start < end);

        let second = h.index_after(start).unwrap();
        assert_eq!(h.get_at(second), Some(("B", "2")));
        assert_eq!(h[second], ("B".to_string(), "2".to_string()));
        assert_eq!(h.index_after(second), Some(end));
        assert_eq!(h.index_after(end), None);
        assert_eq!(h.get_at(end), None);

        assert_eq!(h.index_before(second), Some(start));
        assert_eq!(h.index_before(start), None);
    }

    #[test]
    fn test_iteration_both_directions() {
        let h = headers(&[("A", "1"), ("B", "2"), ("C", "3")]);
        assert_eq!(h.iter().len(), 3);
        let reversed: Vec<_> = h.iter().rev().map(|(name, _)| name).collect();
        assert_eq!(reversed, vec!["C", "B", "A"]);

        let owned: Vec<(String, String)> = h.into_iter().collect();
        assert_eq!(owned[0], ("A".to_string(), "1".to_string()));
    }

    #[test]
    fn test_reserve_is_only_a_hint() {
        let mut h = headers(&[("A", "1")]);
        h.reserve(32);
        assert!(h.capacity() >= 33);
        assert_eq!(h.len(), 1);
    }

    #[test]
    fn test_debug_and_display_list_pairs() {
        let h = headers(&[("Accept", "*/*"), ("Host", "example.com")]);
        assert_eq!(
            format!("{h:?}"),
            r#"[("Accept", "*/*"), ("Host", "example.com")]"#
        );
        assert_eq!(h.to_string(), "[Accept: */*, Host: example.com]");
    }

    #[test]
    fn test_try_from_array_and_vec() {
        let from_array = Headers::try_from([("A", "1"), ("B", "2")]).unwrap();
        let from_vec = Headers::try_from(vec![("A".to_string(), "1"), ("B".to_string(), "2")]).unwrap();
        assert_eq!(from_array, from_vec);
        assert!(Headers::try_from([("Ω", "1")]).is_err());
    }

    #[test]
    fn test_serde_as_pair_sequence() {
        let h = headers(&[("A", "1"), ("a", "2")]);
        let json = serde_json::to_string(&h).unwrap();
        assert_eq!(json, r#"[["A","1"],["a","2"]]"#);

        let back: Headers = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get("a"), vec!["1", "2"]);

        assert!(serde_json::from_str::<Headers>(r#"[["Ä","1"]]"#).is_err());
    }
}
