//! Schema compilation: user field list → typed record + model instructions.

pub mod compiler;
pub mod prompt;
pub mod type_map;

pub use compiler::*;
pub use prompt::*;
pub use type_map::*;

use thiserror::Error;

use crate::models::Schema;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Schema has no fields; define at least one field to extract")]
    Empty,

    #[error("Field #{position} has an empty name")]
    EmptyFieldName { position: usize },

    #[error("Duplicate field name: {0}")]
    DuplicateField(String),

    #[error("Field name '{0}' is reserved for the file name column")]
    ReservedFieldName(String),

    #[error("Type '{0}' is not available in the schema editor")]
    UnsupportedEditorType(String),

    #[error("Unknown format style: {0}")]
    UnknownFormatStyle(String),

    #[error("Invalid schema JSON: {0}")]
    InvalidJson(String),
}

/// Parse the schema editor's JSON records (`[{"Field", "Type", "Description"}]`).
pub fn parse_schema_json(json: &str) -> Result<Schema, SchemaError> {
    serde_json::from_str(json).map_err(|e| SchemaError::InvalidJson(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_records() {
        let schema = parse_schema_json(r#"[{"Field": "amount", "Type": "float"}]"#).unwrap();
        assert_eq!(schema.len(), 1);
        assert_eq!(schema.fields()[0].type_label, "float");
    }

    #[test]
    fn parse_rejects_missing_type() {
        let err = parse_schema_json(r#"[{"Field": "amount"}]"#).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidJson(_)));
    }

    #[test]
    fn parse_rejects_non_array() {
        let err = parse_schema_json(r#"{"Field": "amount", "Type": "float"}"#).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidJson(_)));
    }
}
