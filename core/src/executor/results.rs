//! Tabular query results: columns are SPARQL variable names, cells are
//! optional bindings.

use crate::errors::{FederationError, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

#[derive(Deserialize, Default)]
struct SparqlJson {
    #[serde(default)]
    head: SparqlHead,
    #[serde(default)]
    results: SparqlBindings,
}

#[derive(Deserialize, Default)]
struct SparqlHead {
    #[serde(default)]
    vars: Vec<String>,
}

#[derive(Deserialize, Default)]
struct SparqlBindings {
    #[serde(default)]
    bindings: Vec<HashMap<String, SparqlTerm>>,
}

#[derive(Deserialize)]
struct SparqlTerm {
    value: String,
}

/// Column-oriented result set. Rows may have missing (None) bindings;
/// duplicate-freedom is maintained by [`ResultSet::dedup_rows`], row
/// order is not an invariant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl ResultSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Append a row, padding or truncating to the column count.
    pub fn push_row(&mut self, mut row: Vec<Option<String>>) {
        row.resize(self.columns.len(), None);
        self.rows.push(row);
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }

    /// First non-empty binding among several candidate column names;
    /// tolerates the casing differences between query variants.
    pub fn get_any(&self, row: usize, columns: &[&str]) -> Option<&str> {
        columns
            .iter()
            .find_map(|c| self.get(row, c).filter(|v| !v.trim().is_empty()))
    }

    pub fn set(&mut self, row: usize, column: &str, value: Option<String>) {
        let idx = match self.column_index(column) {
            Some(idx) => idx,
            None => {
                self.columns.push(column.to_string());
                for r in &mut self.rows {
                    r.push(None);
                }
                self.columns.len() - 1
            }
        };
        if let Some(r) = self.rows.get_mut(row) {
            r[idx] = value;
        }
    }

    /// Set `column` to the same value on every row, adding the column if
    /// missing. Used to stamp an implicit binding (e.g. the subject of a
    /// single-resource query) onto rows that never selected it.
    pub fn fill_column(&mut self, column: &str, value: &str) {
        for i in self.row_indices() {
            self.set(i, column, Some(value.to_string()));
        }
    }

    /// Union another result set into this one. Columns missing on either
    /// side become None cells; dedup is the caller's final step.
    pub fn merge(&mut self, other: ResultSet) {
        if self.columns.is_empty() {
            *self = other;
            return;
        }
        let mut mapping = Vec::with_capacity(other.columns.len());
        for column in &other.columns {
            let idx = match self.column_index(column) {
                Some(idx) => idx,
                None => {
                    self.columns.push(column.clone());
                    for r in &mut self.rows {
                        r.push(None);
                    }
                    self.columns.len() - 1
                }
            };
            mapping.push(idx);
        }
        for row in other.rows {
            let mut mapped = vec![None; self.columns.len()];
            for (src_idx, value) in row.into_iter().enumerate() {
                mapped[mapping[src_idx]] = value;
            }
            self.rows.push(mapped);
        }
    }

    /// Drop rows whose cells are identical across all columns, keeping
    /// the first occurrence.
    pub fn dedup_rows(&mut self) {
        let mut seen = HashSet::new();
        self.rows.retain(|row| seen.insert(row.clone()));
    }

    /// Row index range, for iteration with [`ResultSet::get`].
    pub fn row_indices(&self) -> std::ops::Range<usize> {
        0..self.rows.len()
    }

    /// Decode a SPARQL 1.1 JSON result document. A body that does not
    /// parse is the same failure class as a rejected query: the
    /// generated text (or the endpoint) is defective, not transient.
    pub fn from_sparql_json(endpoint: &str, body: &str) -> Result<Self> {
        let parsed: SparqlJson = serde_json::from_str(body).map_err(|e| {
            FederationError::InvalidResponse(endpoint.to_string(), e.to_string())
        })?;
        let mut set = ResultSet::new(parsed.head.vars);
        for binding in parsed.results.bindings {
            let row = set
                .columns
                .iter()
                .map(|var| binding.get(var).map(|t| t.value.clone()))
                .collect();
            set.rows.push(row);
        }
        Ok(set)
    }
}
