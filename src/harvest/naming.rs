//! Output file naming for pictogram components.
//!
//! Plain components are named after themselves. Variant components carry
//! `key=value` pairs in their name and are named after their parent set, with
//! the recognized variant values appended as `-value` segments.

use std::collections::HashMap;

use crate::harvest::traits::SVG_EXTENSION;

/// Variant keys that contribute to a file name, in suffix order.
const VARIANT_KEYS: [&str; 4] = ["value", "direction", "language", "value-size"];

/// Resolves the canonical lowercase file name of a component.
///
/// `parent_name` is the name of the node directly above the component; only
/// its last `/`-separated segment is used.
pub fn resolve_file_name(raw_name: &str, parent_name: Option<&str>) -> String {
    if !raw_name.contains('=') {
        return format!("{}{}", raw_name.to_lowercase(), SVG_EXTENSION);
    }

    let lowered = raw_name.to_lowercase();
    let variant = parse_variant(&lowered);

    let stem = parent_name
        .and_then(|p| p.rsplit('/').next())
        .unwrap_or_default()
        .to_lowercase();

    let suffix: String = VARIANT_KEYS
        .iter()
        .filter_map(|key| variant.get(key))
        .map(|value| format!("-{value}"))
        .collect();

    format!("{stem}{suffix}{SVG_EXTENSION}")
}

/// Splits `key=value` tokens separated by runs of commas and spaces.
///
/// Later duplicates win. Tokens without `=` are skipped, and anything after a
/// second `=` is dropped.
fn parse_variant(name: &str) -> HashMap<&str, &str> {
    name.split([',', ' '])
        .filter(|token| !token.is_empty())
        .filter_map(|token| token.split_once('='))
        .map(|(key, rest)| (key, rest.split('=').next().unwrap_or(rest)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_name_is_lowercased() {
        assert_eq!(resolve_file_name("Home", Some("Icons")), "home.svg");
        assert_eq!(resolve_file_name("Arrow Left", None), "arrow left.svg");
    }

    #[test]
    fn test_variant_name_uses_parent_segment() {
        assert_eq!(
            resolve_file_name("direction=left, value=2", Some("Navigation/Arrow")),
            "arrow-2-left.svg"
        );
        assert_eq!(
            resolve_file_name("direction=left, value=2", Some("Arrow")),
            "arrow-2-left.svg"
        );
    }

    #[test]
    fn test_variant_suffix_order_is_fixed() {
        assert_eq!(
            resolve_file_name(
                "Value-Size=Large, Language=DE, Direction=Up, Value=10",
                Some("Signs/Speed")
            ),
            "speed-10-up-de-large.svg"
        );
    }

    #[test]
    fn test_unrecognized_keys_are_ignored() {
        assert_eq!(
            resolve_file_name("state=hover,direction=right", Some("Chevron")),
            "chevron-right.svg"
        );
        assert_eq!(resolve_file_name("state=hover", Some("Chevron")), "chevron.svg");
    }

    #[test]
    fn test_empty_value_contributes_bare_hyphen() {
        assert_eq!(
            resolve_file_name("value=, direction=up", Some("Arrow")),
            "arrow--up.svg"
        );
    }

    #[test]
    fn test_last_duplicate_key_wins() {
        assert_eq!(
            resolve_file_name("value=1, value=3", Some("Counter")),
            "counter-3.svg"
        );
    }

    #[test]
    fn test_extra_equals_are_truncated() {
        assert_eq!(resolve_file_name("value=a=b", Some("Sign")), "sign-a.svg");
    }

    #[test]
    fn test_tokens_without_equals_are_skipped() {
        assert_eq!(
            resolve_file_name("compact value=5", Some("Badge")),
            "badge-5.svg"
        );
    }

    #[test]
    fn test_variant_without_parent() {
        assert_eq!(resolve_file_name("value=1", None), "-1.svg");
    }
}
