//! SPARQL text generation: URI helpers, label-selection fragments and
//! the query builder.

pub mod builder;
pub mod labels;
pub mod uri;

pub use builder::{
    enclose_uri, escape_literal, looks_like_uri, FilterLogic, FilterOperator, FilterSpec,
    FilterValue, PropertyFilter, QueryBuilder, BULK_CHUNK_SIZE, SEARCH_LIMIT_MAX,
};
pub use labels::{LabelClause, LabelSelection};
pub use uri::{extract_item_id, extract_label_from_uri, format_property_name};
