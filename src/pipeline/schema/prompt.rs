use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::compiler::RecordType;
use super::SchemaError;
use crate::models::ValueType;

const INSTRUCTION_HEADER: &str = "Extract the following information from the document:";

const INSTRUCTION_DIRECTIVE: &str = "\
Return ONLY the extracted data in a JSON format with these exact field names.
If a field cannot be found in the document, return null for that field.";

/// Instruction template variant.
///
/// Every provider currently shares one template; the variant is kept so a
/// provider-specific wording can be added without touching callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormatStyle {
    #[default]
    Default,
    Google,
}

impl FormatStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Google => "google",
        }
    }
}

impl fmt::Display for FormatStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatStyle {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "google" => Ok(Self::Google),
            _ => Err(SchemaError::UnknownFormatStyle(s.to_string())),
        }
    }
}

/// Natural-language side of a compiled request.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionInstructions {
    /// One `- name: type (description)` line per field.
    pub fields_list: String,
    pub field_names: Vec<String>,
    pub field_types: HashMap<String, ValueType>,
    /// Empty string for fields without a description.
    pub field_descriptions: HashMap<String, String>,
    pub prompt_text: String,
}

/// Format one field line of the instruction block.
pub fn format_field_line(name: &str, label: &str, description: Option<&str>) -> String {
    match description {
        Some(desc) => format!("- {name}: {label} ({desc})"),
        None => format!("- {name}: {label}"),
    }
}

/// Build the instruction block for a record type.
pub fn build_instructions(record: &RecordType, style: FormatStyle) -> ExtractionInstructions {
    let fields_list = record
        .fields
        .iter()
        .map(|f| format_field_line(&f.name, &f.label, f.description.as_deref()))
        .collect::<Vec<_>>()
        .join("\n");

    let prompt_text = match style {
        FormatStyle::Default | FormatStyle::Google => {
            format!("{INSTRUCTION_HEADER}\n{fields_list}\n\n{INSTRUCTION_DIRECTIVE}\n")
        }
    };

    ExtractionInstructions {
        field_names: record.fields.iter().map(|f| f.name.clone()).collect(),
        field_types: record
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.value_type))
            .collect(),
        field_descriptions: record
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.description.clone().unwrap_or_default()))
            .collect(),
        fields_list,
        prompt_text,
    }
}
