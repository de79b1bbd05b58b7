//! Label-selection fragments: OPTIONAL clauses plus a COALESCE over the
//! configured label predicates, first non-empty match wins.

use crate::config::RDFS_LABEL;

/// A reusable SPARQL fragment resolving a node's display label.
#[derive(Debug, Clone)]
pub struct LabelClause {
    /// One OPTIONAL graph pattern per candidate label predicate, each
    /// binding a distinct intermediate variable.
    pub optionals: String,
    /// COALESCE expression over the intermediate variables, defaulting
    /// to the empty string when none bind.
    pub coalesce: String,
}

impl LabelClause {
    /// The OPTIONAL block followed by a BIND of the coalesced label.
    pub fn bound(&self, label_var: &str) -> String {
        let label_var = normalize_var(label_var);
        format!("{}\nBIND({} AS {})", self.optionals, self.coalesce, label_var)
    }
}

/// Builds label-selection fragments for the configured label predicate
/// priority list.
#[derive(Debug, Clone)]
pub struct LabelSelection {
    properties: Vec<String>,
}

impl LabelSelection {
    /// An empty list falls back to the RDFS label predicate alone.
    pub fn new(properties: &[String]) -> Self {
        let properties = if properties.is_empty() {
            vec![RDFS_LABEL.to_string()]
        } else {
            properties.to_vec()
        };
        Self { properties }
    }

    /// Produce the fragment for `subject`.
    ///
    /// `subject` may be a bare variable name, a `?var`, or a `<uri>`
    /// literal. The `suffix` makes intermediate variables unique when the
    /// same builder is used several times inside one compound query.
    pub fn clause(&self, subject: &str, suffix: &str) -> LabelClause {
        let subject = normalize_subject(subject);
        let mut optionals = Vec::with_capacity(self.properties.len());
        let mut vars = Vec::with_capacity(self.properties.len());
        for (i, prop) in self.properties.iter().enumerate() {
            let var = format!("?l_{}{}", i, suffix);
            optionals.push(format!("OPTIONAL {{ {} <{}> {} }}", subject, prop, var));
            vars.push(var);
        }
        LabelClause {
            optionals: optionals.join("\n"),
            coalesce: format!("COALESCE({}, \"\")", vars.join(", ")),
        }
    }
}

fn normalize_subject(subject: &str) -> String {
    if subject.starts_with('?') || subject.starts_with('<') {
        subject.to_string()
    } else {
        format!("?{}", subject)
    }
}

fn normalize_var(var: &str) -> String {
    if var.starts_with('?') {
        var.to_string()
    } else {
        format!("?{}", var)
    }
}
