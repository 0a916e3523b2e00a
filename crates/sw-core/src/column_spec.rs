//! Declarative column specifications for schema-alter tasks.
//!
//! A [`ColumnSpec`] describes the target state of one column: its SQL type,
//! the logical input type used by forms, nullability, default and an optional
//! source of enumerated values. Specs are validated when the step catalog is
//! built, so an inconsistent spec never reaches a live database.

use crate::error::{CoreError, CoreResult};
use crate::sql_utils::{
    is_current_timestamp, normalize_default, parse_boolean_default, quote_literal,
};
use crate::version::Version;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static SQL_TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)([a-z]+)\s*(?:\(\s*(\d+)\s*(?:,\s*(\d+)\s*)?\))?\s*(unsigned)?$")
        .expect("static regex is valid")
});

/// Physical SQL type of a column.
///
/// Parsed from the MySQL-flavoured spellings used in step definitions
/// (`varchar(64)`, `int unsigned`, `datetime`) and rendered for DuckDB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Varchar(Option<u32>),
    Char(u32),
    Text,
    TinyInt { unsigned: bool },
    Int { unsigned: bool },
    BigInt { unsigned: bool },
    Decimal { precision: u32, scale: u32 },
    Double,
    Boolean,
    Date,
    DateTime,
    Timestamp,
}

impl SqlType {
    /// Parse a type spelling such as `varchar(45)` or `int unsigned`.
    pub fn parse(input: &str) -> CoreResult<Self> {
        let unsupported = || CoreError::UnsupportedSqlType {
            sql_type: input.to_string(),
        };
        let caps = SQL_TYPE_RE.captures(input.trim()).ok_or_else(unsupported)?;
        let base = caps[1].to_ascii_lowercase();
        let len = caps
            .get(2)
            .map(|m| m.as_str().parse::<u32>())
            .transpose()
            .map_err(|_| unsupported())?;
        let scale = caps
            .get(3)
            .map(|m| m.as_str().parse::<u32>())
            .transpose()
            .map_err(|_| unsupported())?;
        let unsigned = caps.get(4).is_some();

        let signed_only = |t: SqlType| if unsigned { Err(unsupported()) } else { Ok(t) };

        match base.as_str() {
            "varchar" => signed_only(SqlType::Varchar(len)),
            "char" => signed_only(SqlType::Char(len.unwrap_or(1))),
            "text" | "mediumtext" | "longtext" => signed_only(SqlType::Text),
            "tinyint" => Ok(SqlType::TinyInt { unsigned }),
            "int" | "integer" => Ok(SqlType::Int { unsigned }),
            "bigint" => Ok(SqlType::BigInt { unsigned }),
            "decimal" | "numeric" => signed_only(SqlType::Decimal {
                precision: len.unwrap_or(18),
                scale: scale.unwrap_or(0),
            }),
            "double" | "float" => signed_only(SqlType::Double),
            "boolean" | "bool" => signed_only(SqlType::Boolean),
            "date" => signed_only(SqlType::Date),
            "datetime" => signed_only(SqlType::DateTime),
            "timestamp" => signed_only(SqlType::Timestamp),
            _ => Err(unsupported()),
        }
    }

    /// Type spelling used in DDL.
    pub fn ddl(&self) -> String {
        match self {
            SqlType::Varchar(Some(n)) => format!("VARCHAR({n})"),
            SqlType::Decimal { precision, scale } => format!("DECIMAL({precision},{scale})"),
            other => other.catalog_name(),
        }
    }

    /// Type name as reported by `information_schema.columns.data_type`.
    pub fn catalog_name(&self) -> String {
        match self {
            SqlType::Varchar(_) | SqlType::Char(_) | SqlType::Text => "VARCHAR".to_string(),
            SqlType::TinyInt { unsigned: false } => "TINYINT".to_string(),
            SqlType::TinyInt { unsigned: true } => "UTINYINT".to_string(),
            SqlType::Int { unsigned: false } => "INTEGER".to_string(),
            SqlType::Int { unsigned: true } => "UINTEGER".to_string(),
            SqlType::BigInt { unsigned: false } => "BIGINT".to_string(),
            SqlType::BigInt { unsigned: true } => "UBIGINT".to_string(),
            SqlType::Decimal { precision, scale } => format!("DECIMAL({precision},{scale})"),
            SqlType::Double => "DOUBLE".to_string(),
            SqlType::Boolean => "BOOLEAN".to_string(),
            SqlType::Date => "DATE".to_string(),
            SqlType::DateTime | SqlType::Timestamp => "TIMESTAMP".to_string(),
        }
    }

    /// Whether a catalog-reported type name denotes this type.
    pub fn matches_catalog(&self, data_type: &str) -> bool {
        self.catalog_name().eq_ignore_ascii_case(data_type.trim())
    }

    pub fn is_character(&self) -> bool {
        matches!(self, SqlType::Varchar(_) | SqlType::Char(_) | SqlType::Text)
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            SqlType::TinyInt { .. } | SqlType::Int { .. } | SqlType::BigInt { .. }
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || matches!(self, SqlType::Decimal { .. } | SqlType::Double)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, SqlType::Date | SqlType::DateTime | SqlType::Timestamp)
    }
}

impl FromStr for SqlType {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.ddl())
    }
}

/// Logical input type of a column, as presented by forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    Text,
    TextArea,
    RichText,
    Select,
    Radio,
    CheckBox,
    Number,
    SelectDate,
    Hidden,
}

impl InputType {
    /// Whether this input type picks from an enumerated set of values.
    pub fn is_enumerated(&self) -> bool {
        matches!(self, InputType::Select | InputType::Radio)
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InputType::Text => "Text",
            InputType::TextArea => "TextArea",
            InputType::RichText => "RichTextEditor",
            InputType::Select => "Select",
            InputType::Radio => "Radio",
            InputType::CheckBox => "CheckBox",
            InputType::Number => "Number",
            InputType::SelectDate => "Select Date",
            InputType::Hidden => "Hidden",
        };
        f.write_str(name)
    }
}

/// Where the enumerated values of a Select/Radio column come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionSource {
    /// A named provider resolved by the application at render time.
    Callback(String),
    /// A fixed list of `(value, label)` pairs.
    Static(Vec<(String, String)>),
    /// Rows of another table.
    Table {
        table: String,
        key_column: String,
        label_column: String,
    },
}

impl OptionSource {
    pub fn callback(name: impl Into<String>) -> Self {
        OptionSource::Callback(name.into())
    }

    fn is_empty(&self) -> bool {
        match self {
            OptionSource::Callback(name) => name.trim().is_empty(),
            OptionSource::Static(values) => values.is_empty(),
            OptionSource::Table { table, .. } => table.trim().is_empty(),
        }
    }
}

/// A reason a [`ColumnSpec`] is internally inconsistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecViolation {
    EmptyTitle,
    MissingOptionSource { input_type: InputType },
    InputTypeMismatch { input_type: InputType, sql_type: SqlType },
    DefaultIncompatible { default: String, sql_type: SqlType },
}

impl fmt::Display for SpecViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecViolation::EmptyTitle => write!(f, "title must not be empty"),
            SpecViolation::MissingOptionSource { input_type } => {
                write!(f, "input type '{input_type}' requires an option source")
            }
            SpecViolation::InputTypeMismatch {
                input_type,
                sql_type,
            } => write!(f, "input type '{input_type}' cannot store SQL type {sql_type}"),
            SpecViolation::DefaultIncompatible { default, sql_type } => {
                write!(f, "default '{default}' is not a valid {sql_type} value")
            }
        }
    }
}

/// Target state of a single column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub title: String,
    pub sql_type: SqlType,
    pub input_type: InputType,
    pub required: bool,
    pub default: Option<String>,
    pub description: Option<String>,
    pub option_source: Option<OptionSource>,
    pub readonly: bool,
    pub added_in: Option<Version>,
}

impl ColumnSpec {
    /// Start a nullable spec with no default.
    pub fn new(title: impl Into<String>, sql_type: SqlType, input_type: InputType) -> Self {
        Self {
            title: title.into(),
            sql_type,
            input_type,
            required: false,
            default: None,
            description: None,
            option_source: None,
            readonly: false,
            added_in: None,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn options(mut self, source: OptionSource) -> Self {
        self.option_source = Some(source);
        self
    }

    pub fn readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    pub fn added_in(mut self, version: Version) -> Self {
        self.added_in = Some(version);
        self
    }

    /// Check the spec's internal consistency, returning the first problem.
    pub fn validate(&self) -> Result<(), SpecViolation> {
        if self.title.trim().is_empty() {
            return Err(SpecViolation::EmptyTitle);
        }

        if self.input_type.is_enumerated()
            && self.option_source.as_ref().map_or(true, |s| s.is_empty())
        {
            return Err(SpecViolation::MissingOptionSource {
                input_type: self.input_type,
            });
        }

        let t = &self.sql_type;
        let type_ok = match self.input_type {
            InputType::Text | InputType::TextArea | InputType::RichText => t.is_character(),
            InputType::Number => t.is_numeric(),
            InputType::SelectDate => t.is_temporal(),
            InputType::CheckBox => matches!(t, SqlType::Boolean) || t.is_integer(),
            InputType::Select | InputType::Radio | InputType::Hidden => true,
        };
        if !type_ok {
            return Err(SpecViolation::InputTypeMismatch {
                input_type: self.input_type,
                sql_type: self.sql_type,
            });
        }

        if let Some(default) = &self.default {
            if render_default(default, &self.sql_type).is_none() {
                return Err(SpecViolation::DefaultIncompatible {
                    default: default.clone(),
                    sql_type: self.sql_type,
                });
            }
        }

        Ok(())
    }

    /// Validate and attach table/column context to any violation.
    pub fn check(&self, table: &str, column: &str) -> CoreResult<()> {
        self.validate().map_err(|v| CoreError::SpecValidation {
            table: table.to_string(),
            column: column.to_string(),
            reason: v.to_string(),
        })
    }

    /// Default rendered as a SQL expression, if one is set and valid.
    pub fn default_sql(&self) -> Option<String> {
        self.default
            .as_deref()
            .and_then(|d| render_default(d, &self.sql_type))
    }

    /// Whether a catalog-reported default expression equals this spec's default.
    pub fn default_matches(&self, catalog_default: Option<&str>) -> bool {
        match (self.default_sql(), catalog_default) {
            (None, None) => true,
            (Some(want), Some(have)) if self.sql_type == SqlType::Boolean => {
                parse_boolean_default(&want).is_some()
                    && parse_boolean_default(&want) == parse_boolean_default(have)
            }
            (Some(want), Some(have)) => normalize_default(&want) == normalize_default(have),
            _ => false,
        }
    }
}

/// Render `value` as a SQL default for `sql_type`, or `None` if it does not fit.
fn render_default(value: &str, sql_type: &SqlType) -> Option<String> {
    let v = value.trim();
    if is_current_timestamp(v) {
        return sql_type.is_temporal().then(|| "CURRENT_TIMESTAMP".to_string());
    }
    match sql_type {
        t if t.is_integer() => {
            let n = v.parse::<i64>().ok()?;
            let unsigned = matches!(
                t,
                SqlType::TinyInt { unsigned: true }
                    | SqlType::Int { unsigned: true }
                    | SqlType::BigInt { unsigned: true }
            );
            (!unsigned || n >= 0).then(|| n.to_string())
        }
        SqlType::Decimal { .. } | SqlType::Double => v.parse::<f64>().ok().map(|_| v.to_string()),
        SqlType::Boolean => match v.to_ascii_lowercase().as_str() {
            "1" | "true" => Some("true".to_string()),
            "0" | "false" => Some("false".to_string()),
            _ => None,
        },
        _ => Some(quote_literal(v)),
    }
}

#[cfg(test)]
#[path = "column_spec_test.rs"]
mod tests;
