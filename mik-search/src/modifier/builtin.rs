//! Built-in modifiers.

use super::Modifier;
use crate::schema::SemanticType;
use crate::value::Value;
use std::sync::Arc;

/// Built-in modifiers.
#[must_use]
pub fn builtin_modifiers() -> Vec<Arc<dyn Modifier>> {
    vec![
        Arc::new(SqlFunction::text("lower", &["downcase"], "LOWER").with_transform(lowercase)),
        Arc::new(SqlFunction::text("upper", &["upcase"], "UPPER").with_transform(uppercase)),
        Arc::new(SqlFunction::text("trim", &["strip"], "TRIM").with_transform(trim)),
        Arc::new(SqlFunction::text("ltrim", &["lstrip"], "LTRIM").with_transform(trim_start)),
        Arc::new(SqlFunction::text("rtrim", &["rstrip"], "RTRIM").with_transform(trim_end)),
        Arc::new(
            SqlFunction::text("char_length", &["length"], "CHAR_LENGTH")
                .returning(SemanticType::Integer),
        ),
        Arc::new(SqlFunction::numeric("absolute", &["abs"], "ABS")),
        Arc::new(SqlFunction::numeric("ceil", &["ceiling"], "CEIL")),
        Arc::new(SqlFunction::numeric("floor", &[], "FLOOR")),
        Arc::new(SqlFunction::numeric("round", &[], "ROUND")),
        Arc::new(DatePart::new("year", &[], "YEAR")),
        Arc::new(DatePart::new("month", &[], "MONTH")),
        Arc::new(DatePart::new("day_of_month", &["dom"], "DAY")),
        Arc::new(DatePart::new("hour", &[], "HOUR")),
        Arc::new(DatePart::new("minute", &[], "MINUTE")),
        Arc::new(DatePart::new("second", &[], "SECOND")),
    ]
}

/// `FUNC(column)` over text or numeric columns.
#[derive(Debug, Clone, Copy)]
pub struct SqlFunction {
    name: &'static str,
    aliases: &'static [&'static str],
    function: &'static str,
    input: fn(SemanticType) -> bool,
    /// `None` keeps the input type.
    output: Option<SemanticType>,
    transform: Option<fn(Value) -> Value>,
}

impl SqlFunction {
    /// A text -> text function.
    #[must_use]
    pub const fn text(
        name: &'static str,
        aliases: &'static [&'static str],
        function: &'static str,
    ) -> Self {
        Self {
            name,
            aliases,
            function,
            input: SemanticType::is_textual,
            output: None,
            transform: None,
        }
    }

    /// A numeric -> numeric function.
    #[must_use]
    pub const fn numeric(
        name: &'static str,
        aliases: &'static [&'static str],
        function: &'static str,
    ) -> Self {
        Self {
            name,
            aliases,
            function,
            input: SemanticType::is_numeric,
            output: None,
            transform: None,
        }
    }

    /// Override the produced type.
    #[must_use]
    pub const fn returning(mut self, ty: SemanticType) -> Self {
        self.output = Some(ty);
        self
    }

    /// Apply the same transformation to assigned values.
    #[must_use]
    pub const fn with_transform(mut self, f: fn(Value) -> Value) -> Self {
        self.transform = Some(f);
        self
    }
}

impl Modifier for SqlFunction {
    fn name(&self) -> &'static str {
        self.name
    }

    fn aliases(&self) -> &'static [&'static str] {
        self.aliases
    }

    fn applies_to(&self, ty: SemanticType) -> bool {
        (self.input)(ty)
    }

    fn return_type(&self, input: SemanticType) -> SemanticType {
        self.output.unwrap_or(input)
    }

    fn transform(&self, value: Value) -> Value {
        match self.transform {
            Some(f) => f(value),
            None => value,
        }
    }

    fn wrap_column(&self, column_ref: &str) -> Option<String> {
        Some(format!("{}({column_ref})", self.function))
    }
}

/// `EXTRACT(PART FROM column)`: temporal -> integer.
#[derive(Debug, Clone, Copy)]
pub struct DatePart {
    name: &'static str,
    aliases: &'static [&'static str],
    part: &'static str,
}

impl DatePart {
    /// `part` is the SQL field name passed to `EXTRACT`.
    #[must_use]
    pub const fn new(name: &'static str, aliases: &'static [&'static str], part: &'static str) -> Self {
        Self {
            name,
            aliases,
            part,
        }
    }
}

impl Modifier for DatePart {
    fn name(&self) -> &'static str {
        self.name
    }

    fn aliases(&self) -> &'static [&'static str] {
        self.aliases
    }

    fn applies_to(&self, ty: SemanticType) -> bool {
        ty.is_temporal()
    }

    fn return_type(&self, _input: SemanticType) -> SemanticType {
        SemanticType::Integer
    }

    fn wrap_column(&self, column_ref: &str) -> Option<String> {
        Some(format!("EXTRACT({} FROM {column_ref})", self.part))
    }
}

/// Apply a string transformation to strings, including inside arrays.
fn map_strings(value: Value, f: fn(&str) -> String) -> Value {
    match value {
        Value::String(s) => Value::String(f(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(|v| map_strings(v, f)).collect()),
        other => other,
    }
}

fn lowercase(value: Value) -> Value {
    map_strings(value, str::to_lowercase)
}

fn uppercase(value: Value) -> Value {
    map_strings(value, str::to_uppercase)
}

fn trim(value: Value) -> Value {
    map_strings(value, |s| s.trim().to_string())
}

fn trim_start(value: Value) -> Value {
    map_strings(value, |s| s.trim_start().to_string())
}

fn trim_end(value: Value) -> Value {
    map_strings(value, |s| s.trim_end().to_string())
}
