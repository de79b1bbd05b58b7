//! URI helpers: human labels from URIs and `prefix:localName` formatting.

use crate::config::{AppConfig, NS_DCTERMS, NS_OWL, NS_RDF, NS_RDFS, NS_SKOS};
use regex::Regex;
use std::sync::OnceLock;

/// Built-in namespaces tried when the configured prefix table has no match.
const STANDARD_NAMESPACES: [(&str, &str); 6] = [
    (NS_RDFS, "rdfs"),
    (NS_RDF, "rdf"),
    (NS_OWL, "owl"),
    (NS_SKOS, "skos"),
    (NS_DCTERMS, "dcterms"),
    ("http://omeka.org/s/vocabs/o#", "omeka"),
];

/// Extract a human-readable label from a URI: the text after the last
/// `#` or `/`, with underscores turned into spaces.
pub fn extract_label_from_uri(uri: &str) -> String {
    if uri.is_empty() {
        return "Unknown".to_string();
    }
    let local = if let Some(pos) = uri.rfind('#') {
        &uri[pos + 1..]
    } else if let Some(pos) = uri.rfind('/') {
        &uri[pos + 1..]
    } else {
        uri
    };
    local.replace('_', " ")
}

/// Extract the numeric item id from an item API URI, e.g.
/// `http://ex.org/api/items/42` -> `42`.
pub fn extract_item_id(uri: &str) -> Option<String> {
    static ITEM_ID_RE: OnceLock<Regex> = OnceLock::new();
    let re = ITEM_ID_RE.get_or_init(|| Regex::new(r"api/items/(\d+)").unwrap());
    re.captures(uri)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Format a property URI as `prefix:localName`.
///
/// Resolution order: exact-case configured prefix, case-insensitive
/// configured prefix, built-in standard namespaces, then the bare local
/// name. Underscores and hyphens in the result become spaces. Hidden
/// properties yield `None` so consumers drop them entirely.
pub fn format_property_name(config: &AppConfig, property_uri: &str) -> Option<String> {
    let property_uri = property_uri.trim();
    if property_uri.is_empty() || config.is_hidden(property_uri) {
        return None;
    }

    let mut formatted: Option<String> = None;

    for (prefix, base_uri) in config.prefixes.iter() {
        if let Some(suffix) = property_uri.strip_prefix(base_uri) {
            formatted = Some(format!("{}:{}", prefix, suffix));
            break;
        }
    }

    if formatted.is_none() {
        let uri_lower = property_uri.to_lowercase();
        for (prefix, base_uri) in config.prefixes.iter() {
            if uri_lower.starts_with(&base_uri.to_lowercase()) {
                let suffix = &property_uri[base_uri.len()..];
                formatted = Some(format!("{}:{}", prefix, suffix));
                break;
            }
        }
    }

    if formatted.is_none() {
        let uri_lower = property_uri.to_lowercase();
        for (ns, prefix) in STANDARD_NAMESPACES {
            if uri_lower.starts_with(&ns.to_lowercase()) {
                let suffix = &property_uri[ns.len()..];
                formatted = Some(format!("{}:{}", prefix, suffix));
                break;
            }
        }
    }

    let formatted = formatted.unwrap_or_else(|| {
        property_uri
            .rsplit('#')
            .next()
            .unwrap_or(property_uri)
            .rsplit('/')
            .next()
            .unwrap_or(property_uri)
            .to_string()
    });

    Some(formatted.replace('_', " ").replace('-', " "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use std::collections::BTreeMap;

    fn config_with_prefix(prefix: &str, ns: &str) -> AppConfig {
        let mut entries = BTreeMap::new();
        entries.insert(prefix.to_string(), ns.to_string());
        let mut config = AppConfig::default();
        config.prefixes = crate::config::PrefixTable::new(entries);
        config
    }

    #[test]
    fn test_extract_label_from_hash_uri() {
        assert_eq!(
            extract_label_from_uri("http://ex.org/onto#Birth_Place"),
            "Birth Place"
        );
    }

    #[test]
    fn test_extract_label_from_slash_uri() {
        assert_eq!(extract_label_from_uri("http://ex.org/resource/Paris"), "Paris");
    }

    #[test]
    fn test_extract_label_from_empty() {
        assert_eq!(extract_label_from_uri(""), "Unknown");
    }

    #[test]
    fn test_extract_item_id() {
        assert_eq!(
            extract_item_id("http://ex.org/api/items/42"),
            Some("42".to_string())
        );
        assert_eq!(extract_item_id("http://ex.org/resource/42"), None);
    }

    #[test]
    fn test_format_with_configured_prefix() {
        let config = config_with_prefix("ex", "http://ex.org/onto#");
        assert_eq!(
            format_property_name(&config, "http://ex.org/onto#birth_place"),
            Some("ex:birth place".to_string())
        );
    }

    #[test]
    fn test_format_case_insensitive_prefix_match() {
        let config = config_with_prefix("ex", "http://EX.org/onto#");
        assert_eq!(
            format_property_name(&config, "http://ex.org/onto#name"),
            Some("ex:name".to_string())
        );
    }

    #[test]
    fn test_format_standard_namespace_fallback() {
        let config = AppConfig::default();
        assert_eq!(
            format_property_name(&config, "http://www.w3.org/2000/01/rdf-schema#label"),
            Some("rdfs:label".to_string())
        );
        assert_eq!(
            format_property_name(&config, "http://purl.org/dc/terms/creator"),
            Some("dcterms:creator".to_string())
        );
    }

    #[test]
    fn test_format_local_name_fallback() {
        let config = AppConfig::default();
        assert_eq!(
            format_property_name(&config, "http://unknown.example/voc/has-part"),
            Some("has part".to_string())
        );
    }

    #[test]
    fn test_format_hidden_property_returns_none() {
        let mut config = AppConfig::default();
        config
            .visualization
            .hidden_properties
            .push("http://ex.org/internalId".to_string());
        assert_eq!(format_property_name(&config, "http://ex.org/internalId"), None);
    }

    #[test]
    fn test_format_empty_uri_returns_none() {
        let config = AppConfig::default();
        assert_eq!(format_property_name(&config, ""), None);
        assert_eq!(format_property_name(&config, "   "), None);
    }
}
