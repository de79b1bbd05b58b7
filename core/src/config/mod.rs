//! Static configuration: endpoints, prefixes, label priorities, hidden
//! properties and the manual class mapping.
//!
//! Configuration is loaded once at startup from a JSON or YAML file. A
//! missing or malformed file falls back to safe defaults (no endpoints,
//! RDFS label only, no manual classes) instead of failing startup.

use crate::errors::{FederationError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::warn;

pub const NS_RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const NS_RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const NS_OWL: &str = "http://www.w3.org/2002/07/owl#";
pub const NS_SKOS: &str = "http://www.w3.org/2004/02/skos/core#";
pub const NS_XSD: &str = "http://www.w3.org/2001/XMLSchema#";
pub const NS_DCTERMS: &str = "http://purl.org/dc/terms/";

/// The RDFS label predicate, the implicit fallback of every label lookup.
pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";

/// Prefixes injected into every query when the configuration does not
/// override them.
const STANDARD_PREFIXES: [(&str, &str); 5] = [
    ("rdf", NS_RDF),
    ("rdfs", NS_RDFS),
    ("owl", NS_OWL),
    ("skos", NS_SKOS),
    ("xsd", NS_XSD),
];

/// A named remote SPARQL query service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Endpoint {
    pub name: String,
    pub url: String,
}

/// General application settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppSettings {
    pub name: String,
    pub main_namespace_uri: String,
    pub language: Option<String>,
}

/// Display-related configuration: properties to hide and the priority
/// order of label predicates.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Visualization {
    pub hidden_properties: Vec<String>,
    pub label_properties: Vec<String>,
}

impl Default for Visualization {
    fn default() -> Self {
        Self {
            hidden_properties: Vec::new(),
            label_properties: vec![RDFS_LABEL.to_string()],
        }
    }
}

/// Mapping from short prefix to namespace URI. Keys are case-sensitive.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct PrefixTable {
    entries: BTreeMap<String, String>,
}

impl PrefixTable {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }

    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.entries.get(prefix).map(String::as_str)
    }

    /// Iterate over configured (prefix, namespace) pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    /// Render the `PREFIX` preamble injected into every query.
    ///
    /// Standard prefixes (rdf, rdfs, owl, skos, xsd) are added first when
    /// the configuration does not define them itself.
    pub fn preamble(&self) -> String {
        let mut out = String::new();
        for (prefix, uri) in STANDARD_PREFIXES {
            if !self.entries.contains_key(prefix) {
                out.push_str(&format!("PREFIX {}: <{}>\n", prefix, uri));
            }
        }
        for (prefix, uri) in &self.entries {
            out.push_str(&format!("PREFIX {}: <{}>\n", prefix, uri));
        }
        out
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub app_settings: AppSettings,
    pub endpoints: Vec<Endpoint>,
    pub prefixes: PrefixTable,
    pub visualization: Visualization,
    /// Manual class mapping, label -> class URI. Authoritative: wins over
    /// discovered classes on URI collision.
    pub manual_class_mapping: BTreeMap<String, String>,
}

impl AppConfig {
    /// Strict loader: any IO or parse failure is returned to the caller.
    ///
    /// `.yaml`/`.yml` files parse as YAML, anything else as JSON.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        if is_yaml {
            Ok(serde_yaml::from_str(&raw)?)
        } else {
            Ok(serde_json::from_str(&raw)?)
        }
    }

    /// Soft loader used at startup: falls back to defaults on any failure.
    pub fn load(path: &Path) -> Self {
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Config {} unusable ({}), using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// The ordered label predicate list, never empty and always ending
    /// with the RDFS label predicate.
    pub fn label_properties(&self) -> Vec<String> {
        let mut props = self.visualization.label_properties.clone();
        if props.is_empty() {
            props.push(RDFS_LABEL.to_string());
        } else if !props.iter().any(|p| p == RDFS_LABEL) {
            props.push(RDFS_LABEL.to_string());
        }
        props
    }

    pub fn is_hidden(&self, property_uri: &str) -> bool {
        self.visualization
            .hidden_properties
            .iter()
            .any(|p| p == property_uri)
    }

    /// Resolve a class URI from a manual-mapping label.
    pub fn class_uri_for_label(&self, label: &str) -> Option<&str> {
        self.manual_class_mapping.get(label).map(String::as_str)
    }

    /// Fail when no endpoint is configured; used by callers that need at
    /// least one target rather than a silent empty result.
    pub fn require_endpoints(&self) -> Result<&[Endpoint]> {
        if self.endpoints.is_empty() {
            return Err(FederationError::Config(
                "no SPARQL endpoint configured".to_string(),
            ));
        }
        Ok(&self.endpoints)
    }
}
