//! Form-encoded parameter decoding.

use std::collections::BTreeMap;

/// Request parameters merged from the query string and a form body.
///
/// Every value seen for a key is kept in arrival order. The single-value
/// accessors ([`get`](Self::get), [`iter`](Self::iter), [`to_map`](Self::to_map))
/// return the *last* value, so when the query string and the body both
/// define a key, the body wins.
///
/// Decoding is best-effort: `+` becomes a space, percent escapes are decoded,
/// invalid UTF-8 is replaced, and blank values are kept.
///
/// # Examples
///
/// ```
/// use sitekit::request::Params;
///
/// let params = Params::parse("name=Pat+Smith&tag=a&tag=b&empty=");
/// assert_eq!(params.get("name"), Some("Pat Smith"));
/// assert_eq!(params.get("tag"), Some("b"));
/// assert_eq!(params.get_all("tag"), ["a", "b"]);
/// assert_eq!(params.get("empty"), Some(""));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    values: BTreeMap<String, Vec<String>>,
}

impl Params {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `application/x-www-form-urlencoded` string.
    pub fn parse(encoded: &str) -> Self {
        let mut params = Self::new();
        params.extend_encoded(encoded);
        params
    }

    /// Appends every pair of a form-encoded string.
    pub fn extend_encoded(&mut self, encoded: &str) {
        for pair in encoded.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = decode_component(key);
            if key.is_empty() {
                tracing::debug!(pair, "skipping parameter without a name");
                continue;
            }
            self.insert(key, decode_component(value));
        }
    }

    /// Appends a value for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.entry(key.into()).or_default().push(value.into());
    }

    /// Returns the last value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .and_then(|values| values.last())
            .map(String::as_str)
    }

    /// Returns every value for `key`, oldest first.
    pub fn get_all(&self, key: &str) -> &[String] {
        self.values.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns true if `key` has at least one value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates keys in sorted order with their last value.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().filter_map(|(key, values)| {
            values.last().map(|value| (key.as_str(), value.as_str()))
        })
    }

    /// Collapses to a single value per key.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => {
            let bytes = urlencoding::decode_binary(spaced.as_bytes());
            String::from_utf8_lossy(&bytes).into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_percent_escapes_and_plus() {
        let params = Params::parse("q=rust%20%26+more&sym=%E2%9C%93");
        assert_eq!(params.get("q"), Some("rust & more"));
        assert_eq!(params.get("sym"), Some("✓"));
    }

    #[test]
    fn repeated_keys_keep_every_value() {
        let params = Params::parse("a=1&a=2&a=3");
        assert_eq!(params.len(), 1);
        assert_eq!(params.get_all("a"), ["1", "2", "3"]);
        assert_eq!(params.get("a"), Some("3"));
    }

    #[test]
    fn blank_values_and_bare_keys_are_kept() {
        let params = Params::parse("flag&empty=");
        assert_eq!(params.get("flag"), Some(""));
        assert_eq!(params.get("empty"), Some(""));
    }

    #[test]
    fn malformed_input_degrades_without_failing() {
        let params = Params::parse("&&=orphan&bad=%zz&bytes=%FF");
        assert!(!params.contains_key(""));
        assert_eq!(params.get("bad"), Some("%zz"));
        assert_eq!(params.get("bytes"), Some("\u{FFFD}"));
    }

    #[test]
    fn empty_string_yields_no_params() {
        assert!(Params::parse("").is_empty());
        assert_eq!(Params::parse("").get_all("missing"), [] as [&str; 0]);
    }

    #[test]
    fn extend_appends_after_existing_values() {
        let mut params = Params::parse("name=query");
        params.extend_encoded("name=body&other=1");
        assert_eq!(params.get_all("name"), ["query", "body"]);
        assert_eq!(params.get("name"), Some("body"));
        assert_eq!(params.to_map().len(), 2);
    }
}
