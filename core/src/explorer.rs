//! High-level facade tying configuration, query construction, federated
//! execution and caching together.
//!
//! This is the surface consumers talk to: every operation here takes and
//! returns domain types, never raw SPARQL internals (the escape hatch is
//! [`SemanticExplorer::execute`] for pre-built query text).

use crate::cache::{CacheKey, CacheValue, QueryCache};
use crate::config::{AppConfig, Endpoint};
use crate::errors::{FederationError, Result};
use crate::executor::{FederatedExecutor, ResultSet};
use crate::ontology::{
    self, ClassRef, OntologyStructure, Property, ResourceClass, UniqueValue,
};
use crate::shaping::{self, WideRecord};
use crate::sparql::{
    extract_item_id, extract_label_from_uri, format_property_name, looks_like_uri, FilterLogic,
    FilterSpec, QueryBuilder,
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// One label-search match.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SearchHit {
    pub uri: String,
    pub label: String,
    #[serde(rename = "type")]
    pub type_uri: Option<String>,
    /// Numeric id when the URI follows the `api/items/{id}` pattern.
    pub item_id: Option<String>,
}

/// One edge of a neighborhood exploration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub start: String,
    pub start_label: String,
    pub predicate: String,
    pub predicate_label: String,
    pub end: String,
    pub end_label: String,
    pub direction: EdgeDirection,
    pub depth: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeDirection {
    Descendant,
    Ancestor,
}

/// Label and type summary of one resource.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMetadata {
    pub uri: String,
    pub label: String,
    pub type_uri: Option<String>,
    pub type_label: String,
}

pub struct SemanticExplorer {
    config: AppConfig,
    builder: QueryBuilder,
    executor: FederatedExecutor,
    cache: QueryCache,
}

impl SemanticExplorer {
    pub fn new(config: AppConfig) -> Result<Self> {
        let builder = QueryBuilder::new(&config);
        let executor = FederatedExecutor::new(config.endpoints.clone())?;
        Ok(Self {
            config,
            builder,
            executor,
            cache: QueryCache::new(),
        })
    }

    pub fn from_config_file(path: &std::path::Path) -> Result<Self> {
        Self::new(AppConfig::load(path))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Execute pre-built SPARQL text, federated or against one endpoint.
    pub async fn execute(&self, query: &str, endpoint: Option<&Endpoint>) -> ResultSet {
        self.executor.execute(query, endpoint).await
    }

    /// Available classes: the manual mapping merged with the classes
    /// discovered across all endpoints. Cached.
    pub async fn list_classes(&self) -> Vec<ResourceClass> {
        if let Some(CacheValue::Classes(classes)) = self.cache.get(&CacheKey::Classes) {
            debug!("Class list served from cache");
            return classes;
        }

        let rows = self.executor.execute(&self.builder.classes_query(), None).await;
        let discovered: Vec<String> = rows
            .row_indices()
            .filter_map(|i| rows.get(i, "type"))
            .map(str::to_string)
            .collect();
        let classes = shaping::merge_classes(&self.config, &discovered);
        info!(
            "{} classes ({} discovered)",
            classes.len(),
            discovered.len()
        );

        self.cache
            .insert(CacheKey::Classes, CacheValue::Classes(classes.clone()));
        classes
    }

    /// Distinct predicates in use, optionally narrowed by a URI substring.
    /// Search requests bypass the cache.
    pub async fn list_properties(&self, search: Option<&str>, limit: usize) -> Vec<Property> {
        let search = search.filter(|s| !s.is_empty());
        let key = CacheKey::Properties {
            search: search.map(str::to_string),
            limit,
        };
        if search.is_none() {
            if let Some(CacheValue::Properties(props)) = self.cache.get(&key) {
                return props;
            }
        }

        let rows = self
            .executor
            .execute(&self.builder.properties_query(search, limit), None)
            .await;
        let props = collect_properties(&rows, &self.config);

        if search.is_none() {
            self.cache.insert(key, CacheValue::Properties(props.clone()));
        }
        props
    }

    /// Distinct values of one predicate, each carrying its resolved
    /// display label. Search requests bypass the cache.
    pub async fn list_unique_values(
        &self,
        property_uri: &str,
        search: Option<&str>,
        limit: usize,
    ) -> Vec<UniqueValue> {
        let search = search.filter(|s| !s.is_empty());
        let key = CacheKey::UniqueValues {
            property_uri: property_uri.to_string(),
            search: search.map(str::to_string),
            limit,
        };
        if search.is_none() {
            if let Some(CacheValue::UniqueValues(values)) = self.cache.get(&key) {
                return values;
            }
        }

        let query = self.builder.unique_values_query(property_uri, search, limit);
        let rows = self.executor.execute(&query, None).await;
        let values = collect_unique_values(&rows);

        if search.is_none() {
            self.cache
                .insert(key, CacheValue::UniqueValues(values.clone()));
        }
        values
    }

    /// Render the filter query for a structured specification without
    /// executing it.
    pub fn build_filter_query(&self, spec: &FilterSpec, logic: FilterLogic) -> String {
        self.builder.filter_query(spec, logic)
    }

    /// Subjects matching a structured filter specification, federated.
    pub async fn filter_resources(&self, spec: &FilterSpec, logic: FilterLogic) -> ResultSet {
        let query = self.builder.filter_query(spec, logic);
        self.executor.execute(&query, None).await
    }

    /// All properties and values of one resource, with empty value labels
    /// replaced by a display form of the raw value.
    pub async fn resource_details(&self, uri: &str) -> ResultSet {
        let query = self.builder.resource_details_query(uri);
        let mut rows = self.executor.execute(&query, None).await;
        fill_value_labels(&mut rows);
        rows
    }

    /// Details of many resources at once: chunked queries dispatched
    /// concurrently, results merged and deduplicated.
    pub async fn bulk_details(&self, uris: &[String]) -> ResultSet {
        let queries = self.builder.bulk_details_queries(uris);
        let chunks = join_all(
            queries
                .iter()
                .map(|query| self.executor.execute(query, None)),
        )
        .await;

        let mut merged = ResultSet::empty();
        for chunk in chunks {
            merged.merge(chunk);
        }
        merged.dedup_rows();
        fill_value_labels(&mut merged);
        merged
    }

    /// Case-insensitive substring search over labels, optionally
    /// restricted to one class.
    pub async fn search_resources(
        &self,
        text: &str,
        limit: usize,
        type_uri: Option<&str>,
    ) -> Vec<SearchHit> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let query = self.builder.search_query(text, limit, type_uri);
        let rows = self.executor.execute(&query, None).await;
        parse_hits(&rows)
    }

    /// Fixed-depth neighborhood of one resource, both directions.
    pub async fn explore_graph(&self, uri: &str, depth: u8) -> Vec<GraphEdge> {
        let query = self.builder.graph_exploration_query(uri, depth);
        let rows = self.executor.execute(&query, None).await;
        parse_edges(&rows)
    }

    /// Label and type of one resource, with placeholder defaults when the
    /// endpoints know nothing about it.
    pub async fn resource_metadata(&self, uri: &str) -> ResourceMetadata {
        let query = self.builder.metadata_query(uri);
        let rows = self.executor.execute(&query, None).await;

        let label = rows
            .get(0, "label")
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| "Unknown".to_string());
        let type_uri = rows.get(0, "type").map(str::to_string);
        let type_label = type_uri
            .as_deref()
            .map(extract_label_from_uri)
            .unwrap_or_else(|| "Resource".to_string());

        ResourceMetadata {
            uri: uri.to_string(),
            label,
            type_uri,
            type_label,
        }
    }

    /// Instances of one class, addressed by URI, manual-mapping label or
    /// discovered class label.
    pub async fn resources_by_type(&self, class: &str) -> Result<Vec<ClassRef>> {
        let class_uri = self.resolve_class(class).await?;
        let query = self.builder.by_type_query(&class_uri);
        let rows = self.executor.execute(&query, None).await;
        Ok(rows
            .row_indices()
            .filter_map(|i| {
                let uri = rows.get(i, "r")?;
                let label = match rows.get(i, "l") {
                    Some(l) if !l.is_empty() => l.to_string(),
                    _ => extract_label_from_uri(uri),
                };
                Some(ClassRef {
                    uri: uri.to_string(),
                    label,
                })
            })
            .collect())
    }

    /// Resolve a class argument: URIs pass through, labels go through the
    /// manual mapping first and the discovered class list second.
    async fn resolve_class(&self, class: &str) -> Result<String> {
        if looks_like_uri(class) {
            return Ok(class.to_string());
        }
        if let Some(uri) = self.config.class_uri_for_label(class) {
            return Ok(uri.to_string());
        }
        let lowered = class.to_lowercase();
        let discovered = self.list_classes().await;
        discovered
            .into_iter()
            .find(|c| c.label.to_lowercase() == lowered)
            .map(|c| c.uri)
            .ok_or(FederationError::UnknownClass(class.to_string()))
    }

    /// Structure inferred from per-class instance samples across all
    /// endpoints.
    pub async fn ontology_structure(&self) -> OntologyStructure {
        let classes = self.list_classes().await;
        ontology::discover_sampled(&self.builder, &self.executor, &classes).await
    }

    /// Structure inferred from a single global pass against one endpoint.
    pub async fn ontology_structure_global(&self, endpoint: &Endpoint) -> OntologyStructure {
        let classes = self.list_classes().await;
        ontology::discover_global(&self.builder, &self.executor, endpoint, &classes).await
    }

    /// Pivot long detail rows into one record per subject.
    pub fn pivot(&self, rows: &ResultSet) -> Vec<WideRecord> {
        shaping::pivot(rows, &self.config)
    }

    /// `prefix:localName` rendering of a property URI; `None` for hidden
    /// properties.
    pub fn format_property(&self, property_uri: &str) -> Option<String> {
        format_property_name(&self.config, property_uri)
    }
}

/// Replace empty `valueLabel` cells with a display form of the raw value:
/// URIs get their extracted label, literals pass through unchanged.
fn fill_value_labels(rows: &mut ResultSet) {
    if rows.column_index("valueLabel").is_none() {
        return;
    }
    for i in rows.row_indices() {
        let needs_fill = rows.get(i, "valueLabel").map(str::is_empty).unwrap_or(true);
        if !needs_fill {
            continue;
        }
        let Some(raw) = rows.get(i, "value") else {
            continue;
        };
        let display = if looks_like_uri(raw) {
            extract_label_from_uri(raw)
        } else {
            raw.to_string()
        };
        rows.set(i, "valueLabel", Some(display));
    }
}

/// Map property rows to the visible, label-sorted property list. Hidden
/// properties are dropped here, after execution, so the exclusion also
/// applies to search results.
fn collect_properties(rows: &ResultSet, config: &AppConfig) -> Vec<Property> {
    let mut props: Vec<Property> = rows
        .row_indices()
        .filter_map(|i| rows.get(i, "property"))
        .filter(|uri| !config.is_hidden(uri))
        .map(|uri| Property {
            uri: uri.to_string(),
            label: extract_label_from_uri(uri),
        })
        .collect();
    props.sort_by(|a, b| a.label.to_lowercase().cmp(&b.label.to_lowercase()));
    props
}

/// Map value rows to unique values, deduplicated by raw value.
///
/// Two endpoints may resolve different labels (or none) for the same
/// value, so executor-level row dedup is not enough. The first non-empty
/// label wins; empty raw values are skipped.
fn collect_unique_values(rows: &ResultSet) -> Vec<UniqueValue> {
    let mut values: Vec<UniqueValue> = Vec::new();
    let mut seen: std::collections::HashMap<String, usize> = std::collections::HashMap::new();

    for i in rows.row_indices() {
        let Some(raw) = rows.get(i, "value") else {
            continue;
        };
        if raw.is_empty() {
            continue;
        }
        let label = rows.get(i, "label").filter(|l| !l.is_empty());
        match seen.get(raw) {
            Some(&idx) => {
                // Upgrade a label-less entry when a later row resolves one.
                if let Some(label) = label {
                    if values[idx].value == values[idx].uri {
                        values[idx].value = label.to_string();
                    }
                }
            }
            None => {
                seen.insert(raw.to_string(), values.len());
                values.push(UniqueValue {
                    value: label.unwrap_or(raw).to_string(),
                    uri: raw.to_string(),
                });
            }
        }
    }
    values
}

fn parse_hits(rows: &ResultSet) -> Vec<SearchHit> {
    rows.row_indices()
        .filter_map(|i| {
            let uri = rows.get(i, "subject")?;
            let label = rows
                .get(i, "label")
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| extract_label_from_uri(uri));
            Some(SearchHit {
                uri: uri.to_string(),
                label,
                type_uri: rows.get(i, "type").map(str::to_string),
                item_id: extract_item_id(uri),
            })
        })
        .collect()
}

fn parse_edges(rows: &ResultSet) -> Vec<GraphEdge> {
    rows.row_indices()
        .filter_map(|i| {
            let start = rows.get(i, "start")?.to_string();
            let predicate = rows.get(i, "predicate")?.to_string();
            let end = rows.get(i, "end")?.to_string();
            let direction = match rows.get(i, "direction") {
                Some("ancestor") => EdgeDirection::Ancestor,
                _ => EdgeDirection::Descendant,
            };
            let depth = rows
                .get(i, "depth")
                .and_then(|d| d.parse().ok())
                .unwrap_or(1);
            let label_or = |column: &str, uri: &str| match rows.get(i, column) {
                Some(l) if !l.is_empty() => l.to_string(),
                _ => extract_label_from_uri(uri),
            };
            Some(GraphEdge {
                start_label: label_or("startLabel", &start),
                predicate_label: label_or("predicateLabel", &predicate),
                end_label: label_or("endLabel", &end),
                start,
                predicate,
                end,
                direction,
                depth,
            })
        })
        .collect()
}
