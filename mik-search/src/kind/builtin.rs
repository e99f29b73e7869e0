//! Built-in condition kinds.

use super::ConditionKind;
use crate::schema::{Column, SchemaAdapter, SemanticType};
use crate::value::{Value, coerce_flag, coerce_scalar, coerce_set};
use std::sync::Arc;

/// Words ignored by [`Keywords`].
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in", "into", "is", "it",
    "no", "not", "of", "on", "or", "such", "that", "the", "their", "then", "there", "these",
    "they", "this", "to", "was", "will", "with",
];

/// Built-in kinds in resolution order.
#[must_use]
pub fn builtin_kinds() -> Vec<Arc<dyn ConditionKind>> {
    vec![
        Arc::new(EQUALS),
        Arc::new(DOES_NOT_EQUAL),
        Arc::new(CONTAINS),
        Arc::new(DOES_NOT_CONTAIN),
        Arc::new(BEGINS_WITH),
        Arc::new(ENDS_WITH),
        Arc::new(GREATER_THAN),
        Arc::new(GREATER_THAN_OR_EQUAL_TO),
        Arc::new(LESS_THAN),
        Arc::new(LESS_THAN_OR_EQUAL_TO),
        Arc::new(IS_NULL),
        Arc::new(IS_NOT_NULL),
        Arc::new(IN),
        Arc::new(NOT_IN),
        Arc::new(Keywords),
        Arc::new(Between),
    ]
}

const fn any_type(_: SemanticType) -> bool {
    true
}

const fn ordered(ty: SemanticType) -> bool {
    ty.is_ordered()
}

// ═══════════════════════════════════════════════════════════════════════════
// Binary comparisons
// ═══════════════════════════════════════════════════════════════════════════

/// `column <op> ?` comparison.
#[derive(Debug, Clone, Copy)]
pub struct Comparison {
    name: &'static str,
    aliases: &'static [&'static str],
    op: &'static str,
    applies: fn(SemanticType) -> bool,
    /// Answers to the bare column name (`first_name` means `first_name_equals`).
    bare: bool,
    /// Suffix replacing `_at` on temporal columns (`created_at` -> `created_after`).
    temporal_suffix: Option<&'static str>,
}

/// `column = ?`; also answers to the bare column name.
pub const EQUALS: Comparison = Comparison {
    name: "equals",
    aliases: &["is", "eq"],
    op: "=",
    applies: any_type,
    bare: true,
    temporal_suffix: None,
};

/// `column != ?`.
pub const DOES_NOT_EQUAL: Comparison = Comparison {
    name: "does_not_equal",
    aliases: &["is_not", "not", "ne"],
    op: "!=",
    applies: any_type,
    bare: false,
    temporal_suffix: None,
};

/// `column > ?`.
pub const GREATER_THAN: Comparison = Comparison {
    name: "greater_than",
    aliases: &["gt", "after"],
    op: ">",
    applies: ordered,
    bare: false,
    temporal_suffix: Some("after"),
};

/// `column >= ?`.
pub const GREATER_THAN_OR_EQUAL_TO: Comparison = Comparison {
    name: "greater_than_or_equal_to",
    aliases: &["gte", "at_least"],
    op: ">=",
    applies: ordered,
    bare: false,
    temporal_suffix: None,
};

/// `column < ?`.
pub const LESS_THAN: Comparison = Comparison {
    name: "less_than",
    aliases: &["lt", "before"],
    op: "<",
    applies: ordered,
    bare: false,
    temporal_suffix: Some("before"),
};

/// `column <= ?`.
pub const LESS_THAN_OR_EQUAL_TO: Comparison = Comparison {
    name: "less_than_or_equal_to",
    aliases: &["lte", "at_most"],
    op: "<=",
    applies: ordered,
    bare: false,
    temporal_suffix: None,
};

impl ConditionKind for Comparison {
    fn name(&self) -> &'static str {
        self.name
    }

    fn alias_suffixes(&self) -> &'static [&'static str] {
        self.aliases
    }

    fn applies_to(&self, ty: SemanticType) -> bool {
        (self.applies)(ty)
    }

    fn aliases_for(&self, column: &Column) -> Vec<String> {
        let mut aliases = Vec::with_capacity(self.aliases.len() + 1);
        if self.bare {
            aliases.push(column.name.clone());
        }
        aliases.extend(self.aliases.iter().map(|s| format!("{}_{s}", column.name)));
        if let Some(suffix) = self.temporal_suffix
            && column.semantic_type.is_temporal()
            && let Some(stem) = column.name.strip_suffix("_at")
            && !stem.is_empty()
        {
            aliases.push(format!("{stem}_{suffix}"));
        }
        aliases
    }

    fn compile(&self, column_ref: &str, value: &Value) -> (String, Vec<Value>) {
        (format!("{column_ref} {} ?", self.op), vec![value.clone()])
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// LIKE patterns
// ═══════════════════════════════════════════════════════════════════════════

/// `column [NOT] LIKE ?` with the value wrapped in wildcards.
#[derive(Debug, Clone, Copy)]
pub struct Pattern {
    name: &'static str,
    aliases: &'static [&'static str],
    negated: bool,
    prefix: &'static str,
    suffix: &'static str,
}

/// `column LIKE '%v%'`.
pub const CONTAINS: Pattern = Pattern {
    name: "contains",
    aliases: &["like", "has"],
    negated: false,
    prefix: "%",
    suffix: "%",
};

/// `column NOT LIKE '%v%'`.
pub const DOES_NOT_CONTAIN: Pattern = Pattern {
    name: "does_not_contain",
    aliases: &["not_like", "not_have"],
    negated: true,
    prefix: "%",
    suffix: "%",
};

/// `column LIKE 'v%'`.
pub const BEGINS_WITH: Pattern = Pattern {
    name: "begins_with",
    aliases: &["bw", "sw", "starts_with"],
    negated: false,
    prefix: "",
    suffix: "%",
};

/// `column LIKE '%v'`.
pub const ENDS_WITH: Pattern = Pattern {
    name: "ends_with",
    aliases: &["ew", "ends"],
    negated: false,
    prefix: "%",
    suffix: "",
};

impl ConditionKind for Pattern {
    fn name(&self) -> &'static str {
        self.name
    }

    fn alias_suffixes(&self) -> &'static [&'static str] {
        self.aliases
    }

    fn applies_to(&self, ty: SemanticType) -> bool {
        ty.is_textual()
    }

    fn compile(&self, column_ref: &str, value: &Value) -> (String, Vec<Value>) {
        let op = if self.negated { "NOT LIKE" } else { "LIKE" };
        let pattern = format!("{}{}{}", self.prefix, text_of(value), self.suffix);
        (format!("{column_ref} {op} ?"), vec![Value::String(pattern)])
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// NULL checks
// ═══════════════════════════════════════════════════════════════════════════

/// `column IS [NOT] NULL`, driven by a boolean flag. No binds.
#[derive(Debug, Clone, Copy)]
pub struct NullCheck {
    name: &'static str,
    aliases: &'static [&'static str],
    negated: bool,
}

/// `column IS NULL` when the flag is true.
pub const IS_NULL: NullCheck = NullCheck {
    name: "is_null",
    aliases: &["null", "nil"],
    negated: false,
};

/// `column IS NOT NULL` when the flag is true.
pub const IS_NOT_NULL: NullCheck = NullCheck {
    name: "is_not_null",
    aliases: &["not_null", "not_nil"],
    negated: true,
};

impl ConditionKind for NullCheck {
    fn name(&self) -> &'static str {
        self.name
    }

    fn alias_suffixes(&self) -> &'static [&'static str] {
        self.aliases
    }

    fn applies_to(&self, _ty: SemanticType) -> bool {
        true
    }

    fn coerce(&self, _ty: SemanticType, value: Value, _: &dyn SchemaAdapter) -> Result<Value, String> {
        coerce_flag(value)
    }

    fn compile(&self, column_ref: &str, value: &Value) -> (String, Vec<Value>) {
        let wants_null = matches!(value, Value::Bool(true)) != self.negated;
        if wants_null {
            (format!("{column_ref} IS NULL"), vec![])
        } else {
            (format!("{column_ref} IS NOT NULL"), vec![])
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Set membership
// ═══════════════════════════════════════════════════════════════════════════

/// `column [NOT] IN (?)` with the whole set as one bind.
#[derive(Debug, Clone, Copy)]
pub struct SetMembership {
    name: &'static str,
    aliases: &'static [&'static str],
    negated: bool,
}

/// `column IN (?)`.
pub const IN: SetMembership = SetMembership {
    name: "in",
    aliases: &["in_set", "one_of"],
    negated: false,
};

/// `column NOT IN (?)`.
pub const NOT_IN: SetMembership = SetMembership {
    name: "not_in",
    aliases: &["not_in_set"],
    negated: true,
};

impl ConditionKind for SetMembership {
    fn name(&self) -> &'static str {
        self.name
    }

    fn alias_suffixes(&self) -> &'static [&'static str] {
        self.aliases
    }

    fn applies_to(&self, ty: SemanticType) -> bool {
        ty != SemanticType::Binary
    }

    fn coerce(
        &self,
        ty: SemanticType,
        value: Value,
        schema: &dyn SchemaAdapter,
    ) -> Result<Value, String> {
        coerce_set(ty, value, schema)
    }

    fn compile(&self, column_ref: &str, value: &Value) -> (String, Vec<Value>) {
        let op = if self.negated { "NOT IN" } else { "IN" };
        (format!("{column_ref} {op} (?)"), vec![value.clone()])
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Keywords
// ═══════════════════════════════════════════════════════════════════════════

/// Every keyword must appear somewhere in the column.
///
/// Punctuation separates words and stop words are dropped, so
/// `"the quick, brown fox"` compiles to three `LIKE` clauses.
#[derive(Debug, Clone, Copy)]
pub struct Keywords;

impl Keywords {
    fn tokens(text: &str) -> Vec<String> {
        text.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '-'))
            .map(|w| w.trim_matches(|c| c == '\'' || c == '-'))
            .filter(|w| !w.is_empty())
            .filter(|w| !STOP_WORDS.contains(&w.to_lowercase().as_str()))
            .map(ToString::to_string)
            .collect()
    }
}

impl ConditionKind for Keywords {
    fn name(&self) -> &'static str {
        "keywords"
    }

    fn alias_suffixes(&self) -> &'static [&'static str] {
        &["kwords", "kw"]
    }

    fn applies_to(&self, ty: SemanticType) -> bool {
        ty.is_textual()
    }

    fn coerce(
        &self,
        ty: SemanticType,
        value: Value,
        schema: &dyn SchemaAdapter,
    ) -> Result<Value, String> {
        let value = coerce_scalar(ty, value, schema)?;
        if Self::tokens(&text_of(&value)).is_empty() {
            return Err("no searchable keywords".to_string());
        }
        Ok(value)
    }

    fn compile(&self, column_ref: &str, value: &Value) -> (String, Vec<Value>) {
        let tokens = Self::tokens(&text_of(value));
        let clauses: Vec<String> = tokens
            .iter()
            .map(|_| format!("{column_ref} LIKE ?"))
            .collect();
        let binds = tokens
            .into_iter()
            .map(|t| Value::String(format!("%{t}%")))
            .collect();
        (clauses.join(" AND "), binds)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Between
// ═══════════════════════════════════════════════════════════════════════════

/// `column BETWEEN ? AND ?`, inclusive on both ends.
#[derive(Debug, Clone, Copy)]
pub struct Between;

impl ConditionKind for Between {
    fn name(&self) -> &'static str {
        "between"
    }

    fn applies_to(&self, ty: SemanticType) -> bool {
        ty.is_ordered()
    }

    fn coerce(
        &self,
        ty: SemanticType,
        value: Value,
        schema: &dyn SchemaAdapter,
    ) -> Result<Value, String> {
        match value {
            Value::Array(bounds) if bounds.len() == 2 => coerce_set(ty, Value::Array(bounds), schema),
            Value::Array(bounds) => Err(format!("expected 2 bounds, got {}", bounds.len())),
            other => Err(format!("expected 2 bounds, got {}", other.type_name())),
        }
    }

    fn compile(&self, column_ref: &str, value: &Value) -> (String, Vec<Value>) {
        let binds = match value {
            Value::Array(bounds) => bounds.clone(),
            other => vec![other.clone(), other.clone()],
        };
        (format!("{column_ref} BETWEEN ? AND ?"), binds)
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COL: &str = "\"accounts\".\"name\"";

    #[test]
    fn test_comparison_compile() {
        let (sql, params) = GREATER_THAN.compile("\"accounts\".\"id\"", &Value::Int(5));
        assert_eq!(sql, "\"accounts\".\"id\" > ?");
        assert_eq!(params, vec![Value::Int(5)]);

        let (sql, _) = DOES_NOT_EQUAL.compile(COL, &Value::from("x"));
        assert_eq!(sql, "\"accounts\".\"name\" != ?");
    }

    #[test]
    fn test_equals_answers_to_bare_column() {
        let column = Column::new("first_name", SemanticType::Text);
        let aliases = EQUALS.aliases_for(&column);
        assert_eq!(aliases, vec!["first_name", "first_name_is", "first_name_eq"]);
    }

    #[test]
    fn test_temporal_after_before_aliases() {
        let created = Column::new("created_at", SemanticType::Temporal);
        assert!(GREATER_THAN.aliases_for(&created).contains(&"created_after".to_string()));
        assert!(LESS_THAN.aliases_for(&created).contains(&"created_before".to_string()));

        let total = Column::new("total_at", SemanticType::Integer);
        assert!(!GREATER_THAN.aliases_for(&total).contains(&"total_after".to_string()));
    }

    #[test]
    fn test_pattern_wraps_value() {
        let (sql, params) = CONTAINS.compile(COL, &Value::from("Binary"));
        assert_eq!(sql, "\"accounts\".\"name\" LIKE ?");
        assert_eq!(params, vec![Value::from("%Binary%")]);

        let (_, params) = BEGINS_WITH.compile(COL, &Value::from("Bin"));
        assert_eq!(params, vec![Value::from("Bin%")]);

        let (_, params) = ENDS_WITH.compile(COL, &Value::from("ary"));
        assert_eq!(params, vec![Value::from("%ary")]);

        let (sql, _) = DOES_NOT_CONTAIN.compile(COL, &Value::from("x"));
        assert_eq!(sql, "\"accounts\".\"name\" NOT LIKE ?");
    }

    #[test]
    fn test_null_checks_have_no_binds() {
        assert_eq!(
            IS_NULL.compile(COL, &Value::Bool(true)),
            ("\"accounts\".\"name\" IS NULL".to_string(), vec![])
        );
        assert_eq!(
            IS_NULL.compile(COL, &Value::Bool(false)).0,
            "\"accounts\".\"name\" IS NOT NULL"
        );
        assert_eq!(
            IS_NOT_NULL.compile(COL, &Value::Bool(true)).0,
            "\"accounts\".\"name\" IS NOT NULL"
        );
    }

    #[test]
    fn test_set_is_single_bind() {
        let set = Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let (sql, params) = IN.compile("\"accounts\".\"id\"", &set);
        assert_eq!(sql, "\"accounts\".\"id\" IN (?)");
        assert_eq!(params, vec![set.clone()]);

        let (sql, _) = NOT_IN.compile("\"accounts\".\"id\"", &set);
        assert_eq!(sql, "\"accounts\".\"id\" NOT IN (?)");
    }

    #[test]
    fn test_keywords_split_and_drop_stop_words() {
        let (sql, params) = Keywords.compile(COL, &Value::from("the quick, brown fox"));
        assert_eq!(
            sql,
            "\"accounts\".\"name\" LIKE ? AND \"accounts\".\"name\" LIKE ? AND \"accounts\".\"name\" LIKE ?"
        );
        assert_eq!(
            params,
            vec![Value::from("%quick%"), Value::from("%brown%"), Value::from("%fox%")]
        );
    }

    #[test]
    fn test_keywords_require_a_token() {
        let schema = crate::schema::StaticSchema::new();
        assert!(Keywords.coerce(SemanticType::Text, "the and of".into(), &schema).is_err());
        assert!(Keywords.coerce(SemanticType::Text, "rust".into(), &schema).is_ok());
    }

    #[test]
    fn test_between_two_binds() {
        let schema = crate::schema::StaticSchema::new();
        let bounds = Between
            .coerce(SemanticType::Integer, Value::from(vec!["1", "10"]), &schema)
            .unwrap();
        let (sql, params) = Between.compile("\"orders\".\"total\"", &bounds);
        assert_eq!(sql, "\"orders\".\"total\" BETWEEN ? AND ?");
        assert_eq!(params, vec![Value::Int(1), Value::Int(10)]);

        assert!(Between.coerce(SemanticType::Integer, Value::Int(1), &schema).is_err());
    }
}
