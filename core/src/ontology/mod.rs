//! Ontology structure inferred from instance data (A-Box discovery).
//!
//! No declared schema is read: classes come from `rdf:type` objects,
//! properties from the predicates of sampled instances, and domains and
//! ranges from the types observed on each side of those predicates.

use crate::config::{Endpoint, NS_OWL};
use crate::executor::{FederatedExecutor, ResultSet};
use crate::sparql::{extract_label_from_uri, QueryBuilder};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Where a class entry came from. Configured entries are authoritative
/// and win over discovery on URI collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassSource {
    Config,
    Auto,
}

/// A resource class usable as a navigation entry point.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResourceClass {
    pub label: String,
    pub uri: String,
    pub source: ClassSource,
}

/// A discovered predicate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Property {
    pub uri: String,
    pub label: String,
}

/// One distinct value of a predicate, with its resolved display label.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UniqueValue {
    /// Display form: the resolved label, or the raw value when no label
    /// binds.
    pub value: String,
    /// The raw value (URI or literal).
    pub uri: String,
}

/// Lightweight class reference used in domain/range/superclass lists.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClassRef {
    pub uri: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OntologyClass {
    pub uri: String,
    pub label: String,
    pub properties: Vec<Property>,
    pub super_classes: Vec<ClassRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OntologyRelation {
    pub uri: String,
    pub label: String,
    pub domains: Vec<ClassRef>,
    pub ranges: Vec<ClassRef>,
}

/// The derived, in-memory structure graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct OntologyStructure {
    pub classes: Vec<OntologyClass>,
    pub relations: Vec<OntologyRelation>,
}

impl OntologyStructure {
    /// Fallback when discovery finds nothing at all: one placeholder
    /// class so consumers always have a non-empty structure to render.
    pub fn placeholder() -> Self {
        Self {
            classes: vec![OntologyClass {
                uri: format!("{}Thing", NS_OWL),
                label: "Thing".to_string(),
                properties: Vec::new(),
                super_classes: Vec::new(),
            }],
            relations: Vec::new(),
        }
    }
}

/// Accumulates (domain, predicate, range) observations into classes and
/// relations, deduplicated by URI.
#[derive(Debug, Default)]
struct StructureAccumulator {
    classes: BTreeMap<String, OntologyClass>,
    relations: BTreeMap<String, OntologyRelation>,
}

impl StructureAccumulator {
    fn seed_classes(&mut self, classes: &[ResourceClass]) {
        for class in classes {
            self.ensure_class(&class.uri, Some(&class.label));
        }
    }

    fn ensure_class(&mut self, uri: &str, label: Option<&str>) {
        self.classes.entry(uri.to_string()).or_insert_with(|| OntologyClass {
            uri: uri.to_string(),
            label: label
                .map(str::to_string)
                .unwrap_or_else(|| extract_label_from_uri(uri)),
            properties: Vec::new(),
            super_classes: Vec::new(),
        });
    }

    fn class_ref(&self, uri: &str) -> Option<ClassRef> {
        self.classes.get(uri).map(|c| ClassRef {
            uri: c.uri.clone(),
            label: c.label.clone(),
        })
    }

    fn observe(&mut self, domain_uri: &str, property_uri: &str, range_uri: Option<&str>) {
        self.ensure_class(domain_uri, None);
        if let Some(range) = range_uri {
            self.ensure_class(range, None);
        }

        let label = extract_label_from_uri(property_uri);
        // Refs are resolved before the relations entry is taken; both
        // classes exist after ensure_class above.
        let domain_ref = self.class_ref(domain_uri);
        let range_ref = range_uri.and_then(|r| self.class_ref(r));

        let relation = self
            .relations
            .entry(property_uri.to_string())
            .or_insert_with(|| OntologyRelation {
                uri: property_uri.to_string(),
                label: label.clone(),
                domains: Vec::new(),
                ranges: Vec::new(),
            });

        if let Some(domain_ref) = domain_ref {
            if !relation.domains.iter().any(|d| d.uri == domain_uri) {
                relation.domains.push(domain_ref);
            }
        }
        if let Some(range_ref) = range_ref {
            if !relation.ranges.iter().any(|r| r.uri == range_ref.uri) {
                relation.ranges.push(range_ref);
            }
        }

        if let Some(class) = self.classes.get_mut(domain_uri) {
            if !class.properties.iter().any(|p| p.uri == property_uri) {
                class.properties.push(Property {
                    uri: property_uri.to_string(),
                    label,
                });
            }
        }
    }

    fn add_superclass(&mut self, sub_uri: &str, super_uri: &str) {
        let super_ref = ClassRef {
            uri: super_uri.to_string(),
            label: self
                .classes
                .get(super_uri)
                .map(|c| c.label.clone())
                .unwrap_or_else(|| extract_label_from_uri(super_uri)),
        };
        if let Some(class) = self.classes.get_mut(sub_uri) {
            if !class.super_classes.iter().any(|s| s.uri == super_uri) {
                class.super_classes.push(super_ref);
            }
        }
    }

    fn finish(self) -> OntologyStructure {
        if self.classes.is_empty() {
            return OntologyStructure::placeholder();
        }
        OntologyStructure {
            classes: self.classes.into_values().collect(),
            relations: self
                .relations
                .into_values()
                .filter(|r| !r.domains.is_empty())
                .collect(),
        }
    }
}

/// Federated/sampled strategy: every class's instance sample is queried
/// concurrently across the whole endpoint set.
pub async fn discover_sampled(
    builder: &QueryBuilder,
    executor: &FederatedExecutor,
    classes: &[ResourceClass],
) -> OntologyStructure {
    if classes.is_empty() {
        warn!("No class discovered, returning placeholder structure");
        return OntologyStructure::placeholder();
    }
    info!("Sampling {} classes for A-Box structure", classes.len());

    let mut acc = StructureAccumulator::default();
    acc.seed_classes(classes);

    let samples = classes.iter().map(|class| {
        let query = builder.class_sample_query(&class.uri);
        async move { (class.uri.clone(), executor.execute(&query, None).await) }
    });

    for (class_uri, rows) in join_all(samples).await {
        apply_sample_rows(&mut acc, &class_uri, &rows);
    }

    let subclasses = executor.execute(&builder.subclass_query(), None).await;
    apply_subclass_rows(&mut acc, &subclasses);

    acc.finish()
}

/// Single-endpoint/global strategy: one pass over typed triples plus a
/// separate subclass query, producing the same output shape as the
/// sampled strategy.
pub async fn discover_global(
    builder: &QueryBuilder,
    executor: &FederatedExecutor,
    endpoint: &Endpoint,
    classes: &[ResourceClass],
) -> OntologyStructure {
    let mut acc = StructureAccumulator::default();
    acc.seed_classes(classes);

    let rows = executor
        .execute(&builder.global_structure_query(), Some(endpoint))
        .await;
    for i in rows.row_indices() {
        let (Some(domain), Some(property)) = (rows.get(i, "domainType"), rows.get(i, "p")) else {
            continue;
        };
        let domain = domain.to_string();
        let property = property.to_string();
        let range = rows.get(i, "rangeType").map(str::to_string);
        acc.observe(&domain, &property, range.as_deref());
    }

    let subclasses = executor
        .execute(&builder.subclass_query(), Some(endpoint))
        .await;
    apply_subclass_rows(&mut acc, &subclasses);

    acc.finish()
}

fn apply_sample_rows(acc: &mut StructureAccumulator, class_uri: &str, rows: &ResultSet) {
    for i in rows.row_indices() {
        let Some(property) = rows.get(i, "p") else {
            continue;
        };
        let property = property.to_string();
        let range = rows.get(i, "rangeType").map(str::to_string);
        acc.observe(class_uri, &property, range.as_deref());
    }
}

fn apply_subclass_rows(acc: &mut StructureAccumulator, rows: &ResultSet) {
    for i in rows.row_indices() {
        let (Some(sub), Some(sup)) = (rows.get(i, "sub"), rows.get(i, "super")) else {
            continue;
        };
        let sub = sub.to_string();
        let sup = sup.to_string();
        acc.add_superclass(&sub, &sup);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(uri: &str, label: &str) -> ResourceClass {
        ResourceClass {
            uri: uri.to_string(),
            label: label.to_string(),
            source: ClassSource::Config,
        }
    }

    #[test]
    fn test_placeholder_is_not_empty() {
        let structure = OntologyStructure::placeholder();
        assert_eq!(structure.classes.len(), 1);
        assert_eq!(structure.classes[0].label, "Thing");
    }

    #[test]
    fn test_accumulator_attaches_properties_and_domains() {
        let mut acc = StructureAccumulator::default();
        acc.seed_classes(&[class("http://ex/Person", "Person")]);
        acc.observe("http://ex/Person", "http://ex/knows", Some("http://ex/Person"));
        acc.observe("http://ex/Person", "http://ex/knows", Some("http://ex/Person"));
        acc.observe("http://ex/Person", "http://ex/name", None);

        let structure = acc.finish();
        assert_eq!(structure.classes.len(), 1);
        let person = &structure.classes[0];
        assert_eq!(person.properties.len(), 2);

        let knows = structure
            .relations
            .iter()
            .find(|r| r.uri == "http://ex/knows")
            .unwrap();
        assert_eq!(knows.domains.len(), 1);
        assert_eq!(knows.ranges.len(), 1);
        assert_eq!(knows.domains[0].label, "Person");

        let name = structure
            .relations
            .iter()
            .find(|r| r.uri == "http://ex/name")
            .unwrap();
        assert!(name.ranges.is_empty());
    }

    #[test]
    fn test_accumulator_creates_unseen_classes() {
        let mut acc = StructureAccumulator::default();
        acc.observe("http://ex/City", "http://ex/in", Some("http://ex/Country"));
        let structure = acc.finish();
        assert_eq!(structure.classes.len(), 2);
        let city = structure.classes.iter().find(|c| c.uri == "http://ex/City").unwrap();
        assert_eq!(city.label, "City");
        // The range class created by the same observation is referenced
        // from the relation.
        let rel = &structure.relations[0];
        assert_eq!(rel.domains[0].label, "City");
        assert_eq!(rel.ranges[0].uri, "http://ex/Country");
        assert_eq!(rel.ranges[0].label, "Country");
    }

    #[test]
    fn test_superclass_edges() {
        let mut acc = StructureAccumulator::default();
        acc.seed_classes(&[
            class("http://ex/Student", "Student"),
            class("http://ex/Person", "Person"),
        ]);
        acc.add_superclass("http://ex/Student", "http://ex/Person");
        acc.add_superclass("http://ex/Student", "http://ex/Person");
        let structure = acc.finish();
        let student = structure
            .classes
            .iter()
            .find(|c| c.uri == "http://ex/Student")
            .unwrap();
        assert_eq!(student.super_classes.len(), 1);
        assert_eq!(student.super_classes[0].label, "Person");
    }

    #[test]
    fn test_empty_accumulator_falls_back_to_placeholder() {
        let acc = StructureAccumulator::default();
        assert_eq!(acc.finish(), OntologyStructure::placeholder());
    }

    #[tokio::test]
    async fn test_discover_sampled_without_classes() {
        let builder = QueryBuilder::new(&crate::config::AppConfig::default());
        let executor = FederatedExecutor::new(Vec::new()).unwrap();
        let structure = discover_sampled(&builder, &executor, &[]).await;
        assert_eq!(structure, OntologyStructure::placeholder());
    }

    #[tokio::test]
    async fn test_discover_sampled_no_endpoints_keeps_seeded_classes() {
        let builder = QueryBuilder::new(&crate::config::AppConfig::default());
        let executor = FederatedExecutor::new(Vec::new()).unwrap();
        let classes = vec![class("http://ex/Person", "Person")];
        let structure = discover_sampled(&builder, &executor, &classes).await;
        assert_eq!(structure.classes.len(), 1);
        assert!(structure.relations.is_empty());
    }
}
