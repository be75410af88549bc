use crate::models::ValueType;

/// Friendly labels offered by the schema editor, in display order.
///
/// Date and time types are left out: the provider rejects them as native
/// response-schema types, so the editor does not offer them.
pub const EDITOR_LABELS: &[(&str, ValueType)] = &[
    ("text", ValueType::String),
    ("number", ValueType::Float),
    ("whole number", ValueType::Int),
    ("TRUE/FALSE", ValueType::Boolean),
];

/// Resolve a type label to its value type.
///
/// Accepts canonical labels (`string`, `float`, `int`, `boolean`, `date`,
/// `time`, `datetime`) and editor labels. Anything else falls back to
/// `string` with a warning instead of failing.
pub fn map_type(label: &str) -> ValueType {
    let normalized = label.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "string" => ValueType::String,
        "float" => ValueType::Float,
        "int" => ValueType::Int,
        "boolean" => ValueType::Boolean,
        "date" => ValueType::Date,
        "time" => ValueType::Time,
        "datetime" => ValueType::DateTime,
        other => match editor_label_to_type(other) {
            Some(ty) => ty,
            None => {
                tracing::warn!(label, "Unknown field type, falling back to string");
                ValueType::String
            }
        },
    }
}

/// Editor label lookup, case-insensitive. `None` for labels the editor does
/// not offer.
pub fn editor_label_to_type(label: &str) -> Option<ValueType> {
    let label = label.trim();
    EDITOR_LABELS
        .iter()
        .find(|(editor, _)| editor.eq_ignore_ascii_case(label))
        .map(|(_, ty)| *ty)
}

/// Expected ISO-8601 layout for temporal types, which travel as strings.
pub fn format_hint(ty: ValueType) -> Option<&'static str> {
    match ty {
        ValueType::Date => Some("ISO 8601 date, YYYY-MM-DD"),
        ValueType::Time => Some("ISO 8601 time, HH:MM:SS"),
        ValueType::DateTime => Some("ISO 8601 date-time, YYYY-MM-DDTHH:MM:SS"),
        _ => None,
    }
}
