//! Identifier newtypes for tables, columns and indexes.

use crate::newtype_string::define_identifier;

define_identifier! {
    /// Table name, optionally schema-qualified (`sw_meta.task_log`).
    pub struct TableName;
}

define_identifier! {
    /// Column name within a table.
    pub struct ColumnName;
}

define_identifier! {
    /// Index or constraint name.
    pub struct IndexName;
}

impl TableName {
    /// Split into `(schema, table)`, defaulting the schema to `main`.
    pub fn parts(&self) -> (&str, &str) {
        crate::sql_utils::split_qualified_name(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(TableName::try_new("crm_file").is_some());
        assert!(TableName::try_new("sw_meta.task_log").is_some());
        assert!(IndexName::try_new("UI_user_contact_operation").is_some());
    }

    #[test]
    fn test_invalid_names() {
        for bad in ["", "a b", "x;drop", ".t", "t.", "a..b", "quo\"te"] {
            assert!(TableName::try_new(bad).is_none(), "accepted '{bad}'");
        }
    }

    #[test]
    #[should_panic(expected = "not a valid SQL identifier")]
    fn test_new_panics_on_invalid() {
        let _ = ColumnName::new("bad name");
    }

    #[test]
    fn test_quoted_and_parts() {
        let t = TableName::new("sw_meta.task_log");
        assert_eq!(t.quoted(), r#""sw_meta"."task_log""#);
        assert_eq!(t.parts(), ("sw_meta", "task_log"));
        assert_eq!(TableName::new("crm_file").parts(), ("main", "crm_file"));
    }

    #[test]
    fn test_deserialize_rejects_invalid() {
        let ok: ColumnName = serde_yaml::from_str("upload_date").unwrap();
        assert_eq!(ok, "upload_date");
        assert!(serde_yaml::from_str::<ColumnName>("'a b'").is_err());
    }

    #[test]
    fn test_try_from_error_message() {
        let err = TableName::try_from("a b").unwrap_err();
        assert!(err.contains("TableName"));
    }
}
