//! Query construction: translates structured filter specifications and
//! high-level intents into SPARQL text.
//!
//! The builder is pure and stateless; it never executes anything. All
//! literal values pass through [`escape_literal`] so quoting is handled
//! in one place.

use crate::config::AppConfig;
use crate::sparql::labels::LabelSelection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rows fetched per chunk in bulk detail retrieval. Endpoints commonly
/// reject very large VALUES clauses, so batches stay small.
pub const BULK_CHUNK_SIZE: usize = 30;

/// Cap applied to the inner subject subquery of a filter query.
const FILTER_SUBQUERY_LIMIT: usize = 1000;

/// Hard cap on resource search results.
pub const SEARCH_LIMIT_MAX: usize = 50;

/// Comparison operator of a single filter value.
///
/// `GreaterThan`/`LessThan` compare through an explicit `xsd:decimal`
/// cast; a non-numeric operand leaves the cast unbound, so the row is
/// filtered out rather than raising an endpoint error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum FilterOperator {
    #[serde(rename = "=")]
    Equals,
    #[serde(rename = "contient", alias = "contains")]
    Contains,
    #[serde(rename = "!=")]
    NotEquals,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
}

/// One (value, operator) pair; serialized on the wire as a two-element
/// array, e.g. `["Paris", "="]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "(String, FilterOperator)", into = "(String, FilterOperator)")]
pub struct FilterValue {
    pub value: String,
    pub op: FilterOperator,
}

impl FilterValue {
    pub fn new(value: impl Into<String>, op: FilterOperator) -> Self {
        Self {
            value: value.into(),
            op,
        }
    }
}

impl From<(String, FilterOperator)> for FilterValue {
    fn from((value, op): (String, FilterOperator)) -> Self {
        Self { value, op }
    }
}

impl From<FilterValue> for (String, FilterOperator) {
    fn from(fv: FilterValue) -> Self {
        (fv.value, fv.op)
    }
}

/// Filter state of one property: OR-combined values, plus nested filters
/// expressing one additional join hop. Nesting deeper than one level is
/// not supported and is ignored by the builder.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PropertyFilter {
    pub values: Vec<FilterValue>,
    #[serde(rename = "nestedFilters")]
    pub nested: BTreeMap<String, PropertyFilter>,
}

/// Mapping from property URI to its filter state.
pub type FilterSpec = BTreeMap<String, PropertyFilter>;

/// How top-level property conditions combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FilterLogic {
    #[default]
    And,
    Or,
}

/// Escape a literal for embedding in double-quoted SPARQL strings.
pub fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out
}

/// URI-ness heuristic used when deciding between identity and string
/// comparison.
pub fn looks_like_uri(value: &str) -> bool {
    value.starts_with("http")
}

/// Wrap a URI in angle brackets unless the caller already did.
pub fn enclose_uri(uri: &str) -> String {
    if uri.starts_with('<') {
        uri.to_string()
    } else {
        format!("<{}>", uri)
    }
}

/// Stateless SPARQL text generator configured with the prefix preamble
/// and the label predicate priority list.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    preamble: String,
    labels: LabelSelection,
    label_properties: Vec<String>,
}

impl QueryBuilder {
    pub fn new(config: &AppConfig) -> Self {
        let label_properties = config.label_properties();
        Self {
            preamble: config.prefixes.preamble(),
            labels: LabelSelection::new(&label_properties),
            label_properties,
        }
    }

    pub fn labels(&self) -> &LabelSelection {
        &self.labels
    }

    /// Class discovery: every distinct `rdf:type` object found on
    /// instance data.
    pub fn classes_query(&self) -> String {
        format!(
            "{}SELECT DISTINCT ?type WHERE {{ ?s a ?type }} LIMIT 50",
            self.preamble
        )
    }

    /// Property discovery over all IRI-valued predicates, optionally
    /// narrowed by a case-insensitive substring match on the URI or on
    /// its human form (underscores and hyphens read as spaces, so
    /// "birth place" finds `...#birth_place`).
    pub fn properties_query(&self, search_text: Option<&str>, limit: usize) -> String {
        let filter_clause = match search_text.filter(|t| !t.is_empty()) {
            Some(text) => {
                let safe = escape_literal(text);
                format!(
                    "FILTER(CONTAINS(LCASE(STR(?property)), LCASE(\"{safe}\")) || CONTAINS(REPLACE(LCASE(STR(?property)), \"[_-]\", \" \"), LCASE(\"{safe}\")))"
                )
            }
            None => String::new(),
        };
        format!(
            "{}SELECT DISTINCT ?property WHERE {{ ?s ?property ?o . FILTER(isIRI(?property)) {} }} LIMIT {}",
            self.preamble, filter_clause, limit
        )
    }

    /// Distinct values of one predicate across all subjects, each joined
    /// to its resolved label.
    pub fn unique_values_query(
        &self,
        property_uri: &str,
        search_text: Option<&str>,
        limit: usize,
    ) -> String {
        let clause = self.labels.clause("?value", "_uniq");
        let filter_clause = match search_text.filter(|t| !t.is_empty()) {
            Some(text) => {
                let safe = escape_literal(text);
                format!(
                    "FILTER(CONTAINS(LCASE(?label), LCASE(\"{safe}\")) || CONTAINS(LCASE(STR(?value)), LCASE(\"{safe}\")))"
                )
            }
            None => String::new(),
        };
        format!(
            "{}SELECT DISTINCT ?value ?label WHERE {{ ?s {} ?value . {}\nBIND({} AS ?label) {} }} LIMIT {}",
            self.preamble,
            enclose_uri(property_uri),
            clause.optionals,
            clause.coalesce,
            filter_clause,
            limit
        )
    }

    /// The central filter query. Each filtered property gets a fresh
    /// variable and an OR-combined FILTER; properties combine with AND
    /// (sequential patterns) or OR (UNION blocks). The subject set is
    /// bounded by an inner subquery before the label join.
    pub fn filter_query(&self, spec: &FilterSpec, logic: FilterLogic) -> String {
        let mut conditions = Vec::new();
        let mut var_counter = 0;

        for (prop_uri, prop_filter) in spec {
            var_counter += 1;
            let val_var = format!("?val{}", var_counter);
            let mut condition = String::new();

            let or_conds = self.value_clauses(&val_var, &prop_filter.values, var_counter, 0);
            let mut nested_parts = Vec::new();
            let mut nested_counter = 0;
            for (nested_prop, nested_filter) in &prop_filter.nested {
                nested_counter += 1;
                let nested_var = format!("{}_{}", val_var, nested_counter);
                let nested_conds = self.value_clauses(
                    &nested_var,
                    &nested_filter.values,
                    var_counter,
                    nested_counter,
                );
                if nested_conds.is_empty() {
                    continue;
                }
                nested_parts.push(format!(
                    "{} {} {} . FILTER({})",
                    val_var,
                    enclose_uri(nested_prop),
                    nested_var,
                    nested_conds.join(" || ")
                ));
            }

            if or_conds.is_empty() && nested_parts.is_empty() {
                continue;
            }

            condition.push_str(&format!(
                "?subject {} {} .",
                enclose_uri(prop_uri),
                val_var
            ));
            if !or_conds.is_empty() {
                condition.push_str(&format!(" FILTER({})", or_conds.join(" || ")));
            }
            for part in nested_parts {
                condition.push(' ');
                condition.push_str(&part);
            }
            conditions.push(condition);
        }

        let clause = self.labels.clause("?subject", "_m");
        if conditions.is_empty() {
            return format!(
                "{}SELECT DISTINCT ?subject ?subjectLabel WHERE {{ ?subject a ?type . {}\nBIND({} AS ?subjectLabel) }} LIMIT 100",
                self.preamble, clause.optionals, clause.coalesce
            );
        }

        let where_body = match logic {
            FilterLogic::Or => conditions
                .iter()
                .map(|c| format!("{{ {} }}", c))
                .collect::<Vec<_>>()
                .join(" UNION "),
            FilterLogic::And => conditions.join("\n"),
        };

        format!(
            "{}SELECT DISTINCT ?subject ?subjectLabel WHERE {{ {{ SELECT DISTINCT ?subject WHERE {{ ?subject a ?type . {} }} LIMIT {} }} {}\nBIND({} AS ?subjectLabel) }} LIMIT {}",
            self.preamble,
            where_body,
            FILTER_SUBQUERY_LIMIT,
            clause.optionals,
            clause.coalesce,
            FILTER_SUBQUERY_LIMIT
        )
    }

    fn value_clauses(
        &self,
        val_var: &str,
        values: &[FilterValue],
        prop_idx: usize,
        nested_idx: usize,
    ) -> Vec<String> {
        values
            .iter()
            .enumerate()
            .map(|(i, fv)| {
                let tag = format!("{}_{}_{}", prop_idx, nested_idx, i);
                self.operator_clause(val_var, fv, &tag)
            })
            .collect()
    }

    fn operator_clause(&self, val_var: &str, fv: &FilterValue, tag: &str) -> String {
        let safe = escape_literal(&fv.value);
        match fv.op {
            FilterOperator::Equals => {
                if looks_like_uri(&fv.value) {
                    format!("{} = {}", val_var, enclose_uri(&fv.value))
                } else {
                    format!(
                        "(LCASE(STR({val_var})) = LCASE(\"{safe}\") || {})",
                        self.label_exists(val_var, tag, &format!("LCASE(STR(?lv{tag})) = LCASE(\"{safe}\")"))
                    )
                }
            }
            FilterOperator::Contains => format!(
                "(CONTAINS(LCASE(STR({val_var})), LCASE(\"{safe}\")) || {})",
                self.label_exists(
                    val_var,
                    tag,
                    &format!("CONTAINS(LCASE(STR(?lv{tag})), LCASE(\"{safe}\"))")
                )
            ),
            FilterOperator::NotEquals => {
                if looks_like_uri(&fv.value) {
                    format!("{} != {}", val_var, enclose_uri(&fv.value))
                } else {
                    format!("LCASE(STR({val_var})) != LCASE(\"{safe}\")", )
                }
            }
            FilterOperator::GreaterThan => {
                format!("xsd:decimal({val_var}) > xsd:decimal(\"{safe}\")")
            }
            FilterOperator::LessThan => {
                format!("xsd:decimal({val_var}) < xsd:decimal(\"{safe}\")")
            }
        }
    }

    /// EXISTS block matching a value through one of its labels, so a
    /// typed value can be selected by the label a user sees.
    fn label_exists(&self, val_var: &str, tag: &str, inner_filter: &str) -> String {
        let props = self
            .label_properties
            .iter()
            .map(|p| enclose_uri(p))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "EXISTS {{ {val_var} ?lp{tag} ?lv{tag} . FILTER(?lp{tag} IN ({props}) && {inner_filter}) }}"
        )
    }

    /// Fixed-depth neighborhood expansion around one node, both
    /// directions, expressed as a single UNION query. Depth is clamped
    /// to 1..=2; deeper walks are not supported.
    pub fn graph_exploration_query(&self, resource_uri: &str, depth: u8) -> String {
        let central = enclose_uri(resource_uri);
        let depth = depth.clamp(1, 2);

        let mut blocks = vec![
            "{ ?central ?predicate ?end . BIND(?central AS ?start) BIND(\"descendant\" AS ?direction) BIND(1 AS ?depth) }".to_string(),
            "{ ?start ?predicate ?central . BIND(?central AS ?end) BIND(\"ancestor\" AS ?direction) BIND(1 AS ?depth) }".to_string(),
        ];
        if depth == 2 {
            blocks.push(
                "{ ?central ?p_mid ?mid . ?mid ?predicate ?end . BIND(?mid AS ?start) BIND(\"descendant\" AS ?direction) BIND(2 AS ?depth) FILTER(isIRI(?mid)) FILTER(?p_mid != rdf:type) }".to_string(),
            );
            blocks.push(
                "{ ?start ?predicate ?mid . ?mid ?p_mid ?central . BIND(?mid AS ?end) BIND(\"ancestor\" AS ?direction) BIND(2 AS ?depth) FILTER(isIRI(?mid)) FILTER(?p_mid != rdf:type) }".to_string(),
            );
        }

        format!(
            "{}SELECT DISTINCT ?start ?startLabel ?predicate ?predicateLabel ?end ?endLabel ?direction ?depth WHERE {{ BIND({} AS ?central) {{ {} }} OPTIONAL {{ ?start rdfs:label ?startLabel }} OPTIONAL {{ ?end rdfs:label ?endLabel }} OPTIONAL {{ ?predicate rdfs:label ?predicateLabel }} FILTER(isIRI(?start) && isIRI(?end)) FILTER(?predicate != rdf:type) FILTER(!STRSTARTS(STR(?predicate), \"http://www.w3.org/2002/07/owl#\")) }} LIMIT 500",
            self.preamble,
            central,
            blocks.join(" UNION ")
        )
    }

    /// All outgoing properties and values of one subject, with per-value
    /// label resolution.
    pub fn resource_details_query(&self, uri: &str) -> String {
        let subject = enclose_uri(uri);
        let clause = self.labels.clause("?value", "_det");
        format!(
            "{}SELECT ?property ?value ?valueLabel WHERE {{ {} ?property ?value . {}\nBIND({} AS ?valueLabel) }} LIMIT 1000",
            self.preamble, subject, clause.optionals, clause.coalesce
        )
    }

    /// Detail retrieval for many subjects at once: one query per chunk of
    /// [`BULK_CHUNK_SIZE`] URIs inside a VALUES clause.
    pub fn bulk_details_queries(&self, uris: &[String]) -> Vec<String> {
        if uris.is_empty() {
            return Vec::new();
        }
        let subject_clause = self.labels.clause("?subject", "_s");
        let value_clause = self.labels.clause("?value", "_v");
        uris.chunks(BULK_CHUNK_SIZE)
            .map(|chunk| {
                let values = chunk
                    .iter()
                    .map(|u| enclose_uri(u))
                    .collect::<Vec<_>>()
                    .join(" ");
                format!(
                    "{}SELECT DISTINCT ?subject ?subjectLabel ?property ?value ?valueLabel WHERE {{ VALUES ?subject {{ {} }} ?subject ?property ?value . {}\nBIND({} AS ?subjectLabel) {}\nBIND({} AS ?valueLabel) }}",
                    self.preamble,
                    values,
                    subject_clause.optionals,
                    subject_clause.coalesce,
                    value_clause.optionals,
                    value_clause.coalesce
                )
            })
            .collect()
    }

    /// Full-text substring search over labels, optionally restricted to
    /// one class. The limit is capped at [`SEARCH_LIMIT_MAX`].
    pub fn search_query(&self, text: &str, limit: usize, type_uri: Option<&str>) -> String {
        let safe = escape_literal(text);
        let limit = limit.min(SEARCH_LIMIT_MAX);
        let type_filter = match type_uri {
            Some(uri) => format!("?subject a {} .", enclose_uri(uri)),
            None => String::new(),
        };
        format!(
            "{}SELECT DISTINCT ?subject ?label ?type WHERE {{ {{ SELECT DISTINCT ?subject ?label WHERE {{ ?subject rdfs:label ?label . FILTER(CONTAINS(LCASE(?label), LCASE(\"{}\"))) }} LIMIT {} }} {} OPTIONAL {{ ?subject a ?type }} }}",
            self.preamble, safe, limit, type_filter
        )
    }

    /// One-row type and label lookup for a resource.
    pub fn metadata_query(&self, uri: &str) -> String {
        let subject = enclose_uri(uri);
        let clause = self.labels.clause(&subject, "_meta");
        format!(
            "{}SELECT ?type ?label WHERE {{ {} a ?type . {}\nBIND({} AS ?label) }} LIMIT 1",
            self.preamble, subject, clause.optionals, clause.coalesce
        )
    }

    /// Typed-instance listing for one class.
    pub fn by_type_query(&self, class_uri: &str) -> String {
        let clause = self.labels.clause("?r", "_t");
        format!(
            "{}SELECT DISTINCT ?r ?l WHERE {{ ?r a {} . {}\nBIND({} AS ?l) }} LIMIT 500",
            self.preamble,
            enclose_uri(class_uri),
            clause.optionals,
            clause.coalesce
        )
    }

    /// A-Box sampling for one class: outgoing predicates of a bounded
    /// instance sample and the types of their objects.
    pub fn class_sample_query(&self, class_uri: &str) -> String {
        format!(
            "{}SELECT DISTINCT ?p ?rangeType WHERE {{ {{ SELECT ?s WHERE {{ ?s a {} }} LIMIT 20 }} ?s ?p ?o . FILTER(isIRI(?p)) FILTER(?p != rdf:type) OPTIONAL {{ ?o a ?rangeType }} }} LIMIT 200",
            self.preamble,
            enclose_uri(class_uri)
        )
    }

    /// Single-endpoint structure discovery: one global pass over typed
    /// subjects and their predicates, capped before it gets expensive.
    pub fn global_structure_query(&self) -> String {
        format!(
            "{}SELECT DISTINCT ?domainType ?p ?rangeType WHERE {{ {{ SELECT ?s ?p ?o WHERE {{ ?s ?p ?o . FILTER(isIRI(?p)) FILTER(?p != rdf:type) }} LIMIT 3000 }} ?s a ?domainType . OPTIONAL {{ ?o a ?rangeType }} }}",
            self.preamble
        )
    }

    /// Superclass edges from declared `rdfs:subClassOf` triples.
    pub fn subclass_query(&self) -> String {
        format!(
            "{}SELECT DISTINCT ?sub ?super WHERE {{ ?sub rdfs:subClassOf ?super . FILTER(isIRI(?sub) && isIRI(?super)) }} LIMIT 500",
            self.preamble
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn builder() -> QueryBuilder {
        QueryBuilder::new(&AppConfig::default())
    }

    fn spec_one(prop: &str, value: &str, op: FilterOperator) -> FilterSpec {
        let mut spec = FilterSpec::new();
        spec.insert(
            prop.to_string(),
            PropertyFilter {
                values: vec![FilterValue::new(value, op)],
                nested: BTreeMap::new(),
            },
        );
        spec
    }

    #[test]
    fn test_classes_query_shape() {
        let q = builder().classes_query();
        assert!(q.contains("SELECT DISTINCT ?type WHERE { ?s a ?type } LIMIT 50"));
        assert!(q.contains("PREFIX rdfs:"));
    }

    #[test]
    fn test_properties_query_with_search() {
        let q = builder().properties_query(Some("creator"), 50);
        assert!(q.contains("FILTER(isIRI(?property))"));
        assert!(q.contains("CONTAINS(LCASE(STR(?property)), LCASE(\"creator\"))"));
        assert!(q.ends_with("LIMIT 50"));
    }

    #[test]
    fn test_properties_query_search_matches_human_form() {
        // "birth place" must be able to match ...#birth_place.
        let q = builder().properties_query(Some("birth place"), 50);
        assert!(q.contains(
            "CONTAINS(REPLACE(LCASE(STR(?property)), \"[_-]\", \" \"), LCASE(\"birth place\"))"
        ));
    }

    #[test]
    fn test_unique_values_query_resolves_labels() {
        let q = builder().unique_values_query("http://ex.org/city", None, 25);
        assert!(q.contains("?s <http://ex.org/city> ?value"));
        assert!(q.contains("?l_0_uniq"));
        assert!(q.contains("BIND(COALESCE(?l_0_uniq, \"\") AS ?label)"));
        assert!(q.ends_with("LIMIT 25"));
    }

    #[test]
    fn test_numeric_comparison_uses_decimal_cast() {
        let spec = spec_one("http://ex/age", "30", FilterOperator::GreaterThan);
        let q = builder().filter_query(&spec, FilterLogic::And);
        assert!(q.contains("xsd:decimal(?val1) > xsd:decimal(\"30\")"));
    }

    #[test]
    fn test_literal_equality_matches_by_string_or_label() {
        let spec = spec_one("http://ex/city", "Paris", FilterOperator::Equals);
        let q = builder().filter_query(&spec, FilterLogic::And);
        assert!(q.contains("LCASE(STR(?val1)) = LCASE(\"Paris\")"));
        assert!(q.contains("EXISTS"));
        assert!(!q.contains("?val1 = <Paris>"));
    }

    #[test]
    fn test_uri_equality_compares_identity() {
        let spec = spec_one("http://ex/city", "http://ex.org/Paris", FilterOperator::Equals);
        let q = builder().filter_query(&spec, FilterLogic::And);
        assert!(q.contains("?val1 = <http://ex.org/Paris>"));
        assert!(!q.contains("EXISTS"));
    }

    #[test]
    fn test_contains_matches_value_or_label() {
        let spec = spec_one("http://ex/name", "mar", FilterOperator::Contains);
        let q = builder().filter_query(&spec, FilterLogic::And);
        assert!(q.contains("CONTAINS(LCASE(STR(?val1)), LCASE(\"mar\"))"));
        assert!(q.contains("EXISTS"));
    }

    #[test]
    fn test_multiple_values_combine_with_or() {
        let mut spec = FilterSpec::new();
        spec.insert(
            "http://ex/city".to_string(),
            PropertyFilter {
                values: vec![
                    FilterValue::new("Paris", FilterOperator::Equals),
                    FilterValue::new("Lyon", FilterOperator::Equals),
                ],
                nested: BTreeMap::new(),
            },
        );
        let q = builder().filter_query(&spec, FilterLogic::And);
        assert!(q.contains(" || "));
    }

    #[test]
    fn test_or_logic_produces_union() {
        let mut spec = FilterSpec::new();
        spec.insert(
            "http://ex/a".to_string(),
            PropertyFilter {
                values: vec![FilterValue::new("x", FilterOperator::Contains)],
                nested: BTreeMap::new(),
            },
        );
        spec.insert(
            "http://ex/b".to_string(),
            PropertyFilter {
                values: vec![FilterValue::new("y", FilterOperator::Contains)],
                nested: BTreeMap::new(),
            },
        );
        let and_q = builder().filter_query(&spec, FilterLogic::And);
        let or_q = builder().filter_query(&spec, FilterLogic::Or);
        assert!(!and_q.contains("UNION"));
        assert!(or_q.contains("UNION"));
    }

    #[test]
    fn test_nested_filter_adds_one_hop() {
        let mut nested = BTreeMap::new();
        nested.insert(
            "http://ex/country".to_string(),
            PropertyFilter {
                values: vec![FilterValue::new("France", FilterOperator::Equals)],
                nested: BTreeMap::new(),
            },
        );
        let mut spec = FilterSpec::new();
        spec.insert(
            "http://ex/city".to_string(),
            PropertyFilter {
                values: vec![FilterValue::new("Paris", FilterOperator::Equals)],
                nested,
            },
        );
        let q = builder().filter_query(&spec, FilterLogic::And);
        assert!(q.contains("?subject <http://ex/city> ?val1"));
        assert!(q.contains("?val1 <http://ex/country> ?val1_1"));
        assert!(q.contains("LCASE(\"France\")"));
    }

    #[test]
    fn test_empty_spec_lists_typed_subjects() {
        let q = builder().filter_query(&FilterSpec::new(), FilterLogic::And);
        assert!(q.contains("?subject a ?type"));
        assert!(q.ends_with("LIMIT 100"));
        assert!(!q.contains("FILTER("));
    }

    #[test]
    fn test_filter_query_bounds_inner_subquery() {
        let spec = spec_one("http://ex/name", "x", FilterOperator::Contains);
        let q = builder().filter_query(&spec, FilterLogic::And);
        assert!(q.contains("{ SELECT DISTINCT ?subject WHERE {"));
        assert!(q.contains("LIMIT 1000"));
    }

    #[test]
    fn test_quote_escaping_in_literals() {
        let spec = spec_one("http://ex/name", "dit \"Le Brave\"", FilterOperator::Contains);
        let q = builder().filter_query(&spec, FilterLogic::And);
        assert!(q.contains("dit \\\"Le Brave\\\""));
    }

    #[test]
    fn test_escape_literal_control_chars() {
        assert_eq!(escape_literal("a\"b\\c\nd"), "a\\\"b\\\\c\\nd");
    }

    #[test]
    fn test_graph_exploration_depth_one() {
        let q = builder().graph_exploration_query("http://ex.org/r/1", 1);
        assert!(q.contains("BIND(<http://ex.org/r/1> AS ?central)"));
        assert!(q.contains("\"descendant\" AS ?direction"));
        assert!(q.contains("\"ancestor\" AS ?direction"));
        assert!(!q.contains("BIND(2 AS ?depth)"));
        assert!(q.contains("?predicate != rdf:type"));
        assert!(q.contains("owl#"));
    }

    #[test]
    fn test_graph_exploration_depth_two_adds_blocks() {
        let q = builder().graph_exploration_query("http://ex.org/r/1", 2);
        assert!(q.contains("BIND(2 AS ?depth)"));
        assert!(q.contains("?mid"));
    }

    #[test]
    fn test_graph_exploration_depth_clamped() {
        let b = builder();
        assert_eq!(
            b.graph_exploration_query("http://ex.org/r/1", 7),
            b.graph_exploration_query("http://ex.org/r/1", 2)
        );
        assert_eq!(
            b.graph_exploration_query("http://ex.org/r/1", 0),
            b.graph_exploration_query("http://ex.org/r/1", 1)
        );
    }

    #[test]
    fn test_bulk_details_chunking() {
        let uris: Vec<String> = (0..120).map(|i| format!("http://ex.org/r/{}", i)).collect();
        let queries = builder().bulk_details_queries(&uris);
        assert_eq!(queries.len(), 4);
        for q in &queries {
            assert!(q.contains("VALUES ?subject {"));
            assert!(q.matches("<http://ex.org/r/").count() <= BULK_CHUNK_SIZE);
        }
        // All 120 subjects appear exactly once across the chunks.
        let total: usize = queries.iter().map(|q| q.matches("<http://ex.org/r/").count()).sum();
        assert_eq!(total, 120);
    }

    #[test]
    fn test_bulk_details_empty_input() {
        assert!(builder().bulk_details_queries(&[]).is_empty());
    }

    #[test]
    fn test_search_query_caps_limit() {
        let q = builder().search_query("marie", 500, None);
        assert!(q.contains("LIMIT 50"));
        assert!(q.contains("CONTAINS(LCASE(?label), LCASE(\"marie\"))"));
    }

    #[test]
    fn test_search_query_with_type_restriction() {
        let q = builder().search_query("marie", 20, Some("http://ex.org/Person"));
        assert!(q.contains("?subject a <http://ex.org/Person>"));
        assert!(q.contains("OPTIONAL { ?subject a ?type }"));
    }

    #[test]
    fn test_resource_details_query_shape() {
        let q = builder().resource_details_query("http://ex.org/r/1");
        assert!(q.contains("<http://ex.org/r/1> ?property ?value"));
        assert!(q.contains("?valueLabel"));
        assert!(q.ends_with("LIMIT 1000"));
    }

    #[test]
    fn test_metadata_query_uses_uri_subject() {
        let q = builder().metadata_query("http://ex.org/r/1");
        assert!(q.contains("<http://ex.org/r/1> a ?type"));
        assert!(q.ends_with("LIMIT 1"));
    }

    #[test]
    fn test_class_sample_query_bounds_sample() {
        let q = builder().class_sample_query("http://ex.org/Person");
        assert!(q.contains("{ SELECT ?s WHERE { ?s a <http://ex.org/Person> } LIMIT 20 }"));
        assert!(q.contains("OPTIONAL { ?o a ?rangeType }"));
        assert!(q.ends_with("LIMIT 200"));
    }

    #[test]
    fn test_filter_operator_wire_names() {
        let op: FilterOperator = serde_json::from_str("\"contient\"").unwrap();
        assert_eq!(op, FilterOperator::Contains);
        let op: FilterOperator = serde_json::from_str("\"contains\"").unwrap();
        assert_eq!(op, FilterOperator::Contains);
        let op: FilterOperator = serde_json::from_str("\">\"").unwrap();
        assert_eq!(op, FilterOperator::GreaterThan);
    }

    #[test]
    fn test_filter_value_deserializes_from_pair() {
        let fv: FilterValue = serde_json::from_str("[\"30\", \">\"]").unwrap();
        assert_eq!(fv.value, "30");
        assert_eq!(fv.op, FilterOperator::GreaterThan);
    }

    #[test]
    fn test_filter_spec_deserializes_from_wire_shape() {
        let raw = r#"{
            "http://ex/age": {"values": [["30", ">"]]},
            "http://ex/city": {
                "values": [["Paris", "="]],
                "nestedFilters": {"http://ex/country": {"values": [["France", "contient"]]}}
            }
        }"#;
        let spec: FilterSpec = serde_json::from_str(raw).unwrap();
        assert_eq!(spec.len(), 2);
        assert_eq!(spec["http://ex/city"].nested.len(), 1);
    }
}
