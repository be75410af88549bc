use std::collections::HashSet;

use super::prompt::{build_instructions, ExtractionInstructions, FormatStyle};
use super::type_map::map_type;
use super::SchemaError;
use crate::models::{Schema, Value, ValueType, FILE_NAME_COLUMN};

/// Name given to the record type sent to the provider.
pub const RECORD_TYPE_NAME: &str = "ExtractedData";

/// One field of the structural record type.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordField {
    pub name: String,
    pub value_type: ValueType,
    /// Type label as written in the schema, echoed in the instructions.
    pub label: String,
    /// Always true: the model may fail to find any field.
    pub nullable: bool,
    pub default: Value,
    pub description: Option<String>,
}

/// Structural record type constraining the model's output.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordType {
    pub name: String,
    pub fields: Vec<RecordField>,
}

impl RecordType {
    pub fn field(&self, name: &str) -> Option<&RecordField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Everything needed to issue one extraction request. Rebuilt per run.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRequest {
    pub record_type: RecordType,
    pub instructions: ExtractionInstructions,
}

/// Reject schemas that cannot produce a meaningful table: no fields, blank
/// names, duplicate names, or a name colliding with the file name column.
pub fn validate_schema(schema: &Schema) -> Result<(), SchemaError> {
    if schema.is_empty() {
        return Err(SchemaError::Empty);
    }

    let mut seen = HashSet::new();
    for (position, field) in schema.fields().iter().enumerate() {
        let name = field.name.trim();
        if name.is_empty() {
            return Err(SchemaError::EmptyFieldName {
                position: position + 1,
            });
        }
        if name == FILE_NAME_COLUMN {
            return Err(SchemaError::ReservedFieldName(name.to_string()));
        }
        if !seen.insert(name) {
            return Err(SchemaError::DuplicateField(name.to_string()));
        }
    }
    Ok(())
}

/// Build the record type without validating. Field names are trimmed.
pub fn build_record_type(schema: &Schema) -> RecordType {
    RecordType {
        name: RECORD_TYPE_NAME.to_string(),
        fields: schema
            .fields()
            .iter()
            .map(|f| {
                let value_type = map_type(&f.type_label);
                let label = match f.type_label.trim() {
                    "" => value_type.as_str().to_string(),
                    label => label.to_string(),
                };
                RecordField {
                    name: f.name.trim().to_string(),
                    value_type,
                    label,
                    nullable: true,
                    default: Value::Null,
                    description: f.hint().map(str::to_string),
                }
            })
            .collect(),
    }
}

/// Compile a schema into a typed record and the matching instructions.
pub fn compile(schema: &Schema, style: FormatStyle) -> Result<CompiledRequest, SchemaError> {
    validate_schema(schema)?;

    let record_type = build_record_type(schema);
    let instructions = build_instructions(&record_type, style);

    tracing::debug!(
        fields = record_type.fields.len(),
        style = %style,
        "Compiled extraction schema"
    );

    Ok(CompiledRequest {
        record_type,
        instructions,
    })
}
