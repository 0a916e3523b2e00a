//! SQL identifier and literal helpers
//!
//! Upgrade tasks build DDL from column specs at run time, so every identifier
//! and literal that reaches a statement goes through these helpers.

/// Quote a SQL identifier, doubling embedded double quotes.
///
/// # Examples
/// ```
/// use sw_core::sql_utils::quote_ident;
/// assert_eq!(quote_ident("crm_file"), r#""crm_file""#);
/// assert_eq!(quote_ident(r#"my"col"#), r#""my""col""#);
/// ```
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a potentially schema-qualified name (e.g. `sw_meta.task_log`).
///
/// # Examples
/// ```
/// use sw_core::sql_utils::quote_qualified;
/// assert_eq!(quote_qualified("sw_meta.task_log"), r#""sw_meta"."task_log""#);
/// ```
pub fn quote_qualified(name: &str) -> String {
    name.split('.')
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(".")
}

/// Split a potentially schema-qualified table name into (schema, table).
///
/// Uses the last `.` as the separator; unqualified names live in `main`.
pub fn split_qualified_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) => (&name[..pos], &name[pos + 1..]),
        None => ("main", name),
    }
}

/// Escape a value for use inside a single-quoted SQL string literal.
pub fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}

/// Render a value as a single-quoted SQL string literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", escape_sql_string(value))
}

/// Spellings of "the current timestamp" accepted in column defaults.
const NOW_ALIASES: &[&str] = &[
    "current_timestamp",
    "current_timestamp()",
    "now()",
    "get_current_timestamp()",
];

/// Return `true` if a default expression means "the current timestamp".
pub fn is_current_timestamp(expr: &str) -> bool {
    NOW_ALIASES.contains(&expr.trim().to_ascii_lowercase().as_str())
}

/// Normalise a column default expression for comparison.
///
/// Catalogs report defaults in their own spelling (`'x'`, `'x'::VARCHAR`,
/// `CAST('x' AS VARCHAR)`, `now()`), so both sides of a comparison are reduced
/// to a canonical form: casts stripped, one level of quotes removed, and every
/// current-timestamp alias mapped to `current_timestamp`.
pub fn normalize_default(expr: &str) -> String {
    let mut s = expr.trim();

    if let Some(inner) = strip_cast_call(s) {
        s = inner;
    }
    if let Some(pos) = s.rfind("::") {
        if !s[pos..].contains('\'') {
            s = s[..pos].trim();
        }
    }
    if is_current_timestamp(s) {
        return "current_timestamp".to_string();
    }
    if s.len() >= 2 && s.starts_with('\'') && s.ends_with('\'') {
        return s[1..s.len() - 1].replace("''", "'");
    }
    s.to_string()
}

/// Read a boolean default in any catalog spelling (`true`, `'t'`,
/// `CAST('t' AS BOOLEAN)`, `1`, ...). `None` if it is not a boolean literal.
pub fn parse_boolean_default(expr: &str) -> Option<bool> {
    match normalize_default(expr).to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" | "on" => Some(true),
        "false" | "f" | "0" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// `CAST(<expr> AS <type>)` -> `<expr>`.
fn strip_cast_call(s: &str) -> Option<&str> {
    let upper = s.to_ascii_uppercase();
    if !upper.starts_with("CAST(") || !s.ends_with(')') {
        return None;
    }
    let body = &s[5..s.len() - 1];
    let pos = body.to_ascii_uppercase().rfind(" AS ")?;
    Some(body[..pos].trim())
}
