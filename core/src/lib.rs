//! # Sematheque Core - Federated SPARQL Query Layer
//!
//! Builds, dispatches and merges SPARQL queries across a set of remote
//! endpoints, presenting the federation as one logical graph.
//!
//! ## Core Principle
//!
//! **Endpoints are unreliable; the federation is not**: every remote
//! failure is contained at the endpoint boundary. A dead, slow or
//! misbehaving endpoint costs its own contribution and nothing else, so
//! consumers always get a (possibly partial) result, never an error page.
//!
//! ## Key Features
//!
//! - SPARQL construction from structured filter specifications
//!   (AND/OR logic, nested one-hop filters, numeric comparison)
//! - Concurrent fan-out with union merge and row deduplication
//! - Label resolution through a configurable predicate priority list
//! - Ontology structure inferred from instance data, no schema required
//! - Bounded LRU memoization of discovery queries
//! - Long-to-wide pivoting of results into per-subject records
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   SemanticExplorer (facade)         │
//! │  classes / filters / details / ...  │
//! └─────────────────────────────────────┘
//!      │            │             │
//! ┌────┴─────┐ ┌────┴───────┐ ┌──┴───────┐
//! │ Query    │ │ Federated  │ │ Query    │
//! │ Builder  │ │ Executor   │ │ Cache    │
//! └──────────┘ └────┬───────┘ └──────────┘
//!                   │ HTTP POST, 45s timeout
//!        ┌──────────┼──────────┐
//!        ▼          ▼          ▼
//!    endpoint A  endpoint B  endpoint C
//! ```

pub mod cache;
pub mod config;
pub mod errors;
pub mod executor;
pub mod explorer;
pub mod ontology;
pub mod shaping;
pub mod sparql;

pub use cache::{CacheKey, CacheValue, QueryCache};
pub use config::{AppConfig, Endpoint, PrefixTable, Visualization, RDFS_LABEL};
pub use errors::{FederationError, Result};
pub use executor::{FederatedExecutor, ResultSet};
pub use explorer::{
    EdgeDirection, GraphEdge, ResourceMetadata, SearchHit, SemanticExplorer,
};
pub use ontology::{
    ClassRef, ClassSource, OntologyClass, OntologyRelation, OntologyStructure, Property,
    ResourceClass, UniqueValue,
};
pub use shaping::{merge_classes, pivot, WideRecord};
pub use sparql::{
    FilterLogic, FilterOperator, FilterSpec, FilterValue, PropertyFilter, QueryBuilder,
};

/// Crate version, exposed for the CLI and HTTP user agent.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
