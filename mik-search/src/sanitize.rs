//! Compile a condition tree into a parameterized fragment.
//!
//! Each active condition becomes one parenthesized clause, each non-empty
//! relationship one parenthesized group around its own compiled clauses, and
//! the raw scope is appended last as-is. Everything is joined with `AND`.
//! Placeholders are positional `?`, matched left to right by the binds.

use crate::tree::ConditionTree;
use crate::value::Value;

/// A compiled condition: SQL template plus bind values.
#[derive(Debug, Clone, PartialEq, Default)]
#[must_use = "a fragment does nothing unless passed to a query"]
pub struct Fragment {
    /// Boolean SQL expression with `?` placeholders; empty means "no filter".
    pub template: String,
    /// One value per placeholder, in order.
    pub binds: Vec<Value>,
}

impl Fragment {
    /// Whether there is nothing to filter on.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.template.is_empty()
    }

    /// Split into `(template, binds)`.
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.template, self.binds)
    }
}

/// Compile a tree.
///
/// Pure: the same tree state always yields the same fragment.
pub fn sanitize(tree: &ConditionTree) -> Fragment {
    let mut clauses = Vec::with_capacity(tree.len());
    let mut binds = Vec::new();

    for (key, value) in tree.conditions() {
        let value = key.transform(value.clone());
        let (sql, kind_binds) = key.kind().compile(&key.wrapped_column(), &value);
        clauses.push(format!("({sql})"));
        binds.extend(kind_binds);
    }

    for (_, child) in tree.relations() {
        let fragment = sanitize(child);
        if fragment.is_empty() {
            continue;
        }
        clauses.push(format!("({})", fragment.template));
        binds.extend(fragment.binds);
    }

    if let Some(scope) = tree.scope() {
        clauses.push(scope.to_string());
    }

    Fragment {
        template: clauses.join(" AND "),
        binds,
    }
}
