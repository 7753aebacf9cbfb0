//! Helpers endpoint wrappers use to flatten typed arguments into query values.

use std::collections::BTreeMap;

/// Joins list items with `sep`.
pub fn join_list<S: AsRef<str>>(sep: &str, items: &[S]) -> String {
    items
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(sep)
}

/// Inverse of [`join_list`]. An empty string yields an empty list.
pub fn split_list(sep: &str, joined: &str) -> Vec<String> {
    if joined.is_empty() {
        return Vec::new();
    }
    joined.split(sep).map(str::to_string).collect()
}

/// Renders a component filter as `key:value` pairs sorted by key, joined by `|`.
///
/// ```
/// use std::collections::BTreeMap;
/// let mut c = BTreeMap::new();
/// c.insert("country".to_string(), "US".to_string());
/// c.insert("postal_code".to_string(), "94043".to_string());
/// assert_eq!(geoclient::convert::components(&c), "country:US|postal_code:94043");
/// ```
pub fn components(filter: &BTreeMap<String, String>) -> String {
    filter
        .iter()
        .map(|(k, v)| format!("{}:{}", k, v))
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_then_split_recovers_list() {
        let items = vec!["street_address", "route", "locality"];
        let joined = join_list("|", &items);
        assert_eq!(joined, "street_address|route|locality");
        assert_eq!(split_list("|", &joined), items);
    }

    #[test]
    fn test_single_item_round_trip() {
        let joined = join_list("|", &["ROOFTOP"]);
        assert_eq!(joined, "ROOFTOP");
        assert_eq!(split_list("|", &joined), vec!["ROOFTOP"]);
    }

    #[test]
    fn test_split_empty() {
        assert!(split_list("|", "").is_empty());
    }

    #[test]
    fn test_components_sorted() {
        let mut filter = BTreeMap::new();
        filter.insert("route".to_string(), "Annegatan".to_string());
        filter.insert("administrative_area".to_string(), "Helsinki".to_string());
        assert_eq!(
            components(&filter),
            "administrative_area:Helsinki|route:Annegatan"
        );
    }
}
