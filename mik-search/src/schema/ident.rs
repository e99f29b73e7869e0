//! Identifier validation for schema names.
//!
//! Column and relationship names end up in condition names (split on `_`)
//! and, quoted, in compiled SQL. Both uses require a conservative alphabet.

/// Maximum length for SQL identifiers (`PostgreSQL` limit is 63).
const MAX_IDENTIFIER_LENGTH: usize = 63;

/// Validate that a string is a safe SQL identifier.
///
/// A valid SQL identifier:
/// - Starts with a letter (a-z, A-Z) or underscore
/// - Contains only letters, digits (0-9), and underscores
/// - Is not empty and not longer than 63 characters
///
/// # Examples
///
/// ```
/// use mik_search::is_valid_sql_identifier;
///
/// assert!(is_valid_sql_identifier("users"));
/// assert!(is_valid_sql_identifier("created_at"));
///
/// assert!(!is_valid_sql_identifier(""));
/// assert!(!is_valid_sql_identifier("123abc"));
/// assert!(!is_valid_sql_identifier("user; DROP"));
/// ```
#[inline]
#[must_use]
pub fn is_valid_sql_identifier(s: &str) -> bool {
    if s.is_empty() || s.len() > MAX_IDENTIFIER_LENGTH {
        return false;
    }

    let mut chars = s.chars();

    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {},
        _ => return false,
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Quote an identifier with ANSI double quotes, doubling embedded quotes.
#[must_use]
pub fn quote_ansi(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Default table name for an entity: snake_case, pluralised.
///
/// `Account` -> `accounts`, `LineItem` -> `line_items`, `Category` -> `categories`.
#[must_use]
pub fn default_table_name(entity: &str) -> String {
    let mut snake = String::with_capacity(entity.len() + 4);
    for (i, c) in entity.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 && !snake.ends_with('_') {
                snake.push('_');
            }
            snake.push(c.to_ascii_lowercase());
        } else {
            snake.push(c);
        }
    }

    if let Some(stem) = snake.strip_suffix('y')
        && !stem.ends_with(['a', 'e', 'i', 'o', 'u'])
    {
        return format!("{stem}ies");
    }
    if snake.ends_with('s') || snake.ends_with('x') || snake.ends_with("ch") || snake.ends_with("sh")
    {
        return format!("{snake}es");
    }
    snake.push('s');
    snake
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_sql_identifiers() {
        assert!(is_valid_sql_identifier("users"));
        assert!(is_valid_sql_identifier("user_id"));
        assert!(is_valid_sql_identifier("_private"));
        assert!(is_valid_sql_identifier("Table123"));
    }

    #[test]
    fn test_identifier_injection_attempts() {
        assert!(!is_valid_sql_identifier("users; DROP TABLE x"));
        assert!(!is_valid_sql_identifier("users--"));
        assert!(!is_valid_sql_identifier("users\""));
        assert!(!is_valid_sql_identifier("(SELECT 1)"));
        assert!(!is_valid_sql_identifier("usërs"));
        assert!(!is_valid_sql_identifier(&"a".repeat(64)));
    }

    #[test]
    fn test_quote_ansi() {
        assert_eq!(quote_ansi("accounts"), "\"accounts\"");
        assert_eq!(quote_ansi("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_default_table_name() {
        assert_eq!(default_table_name("Account"), "accounts");
        assert_eq!(default_table_name("User"), "users");
        assert_eq!(default_table_name("LineItem"), "line_items");
        assert_eq!(default_table_name("Category"), "categories");
        assert_eq!(default_table_name("Day"), "days");
        assert_eq!(default_table_name("Address"), "addresses");
    }
}
