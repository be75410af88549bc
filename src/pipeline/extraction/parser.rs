use super::ExtractionError;
use crate::models::{ExtractionResult, Value};
use crate::pipeline::schema::RecordType;

/// Parse the model's JSON reply into an extraction result.
///
/// Declared fields are coerced toward their type; absent or null fields become
/// `Value::Null`. Undeclared keys are kept untyped for the row assembler to drop.
pub fn parse_extraction_response(
    file_name: &str,
    response: &str,
    record: &RecordType,
) -> Result<ExtractionResult, ExtractionError> {
    let json_str = strip_code_fence(response);
    let parsed: serde_json::Value =
        serde_json::from_str(json_str).map_err(|e| ExtractionError::Parse(e.to_string()))?;

    let object = into_object(parsed)?;

    let mut result = ExtractionResult::new(file_name);
    for field in &record.fields {
        let value = object
            .get(&field.name)
            .map_or(Value::Null, |raw| Value::coerce(raw, field.value_type));
        result.insert(field.name.clone(), value);
    }
    for (key, raw) in &object {
        if record.field(key).is_none() {
            result.insert(key.clone(), Value::from_json(raw));
        }
    }

    Ok(result)
}

fn into_object(
    value: serde_json::Value,
) -> Result<serde_json::Map<String, serde_json::Value>, ExtractionError> {
    match value {
        serde_json::Value::Object(map) => Ok(map),
        // Some replies wrap the single record in an array.
        serde_json::Value::Array(items) if items.len() == 1 && items[0].is_object() => {
            into_object(items.into_iter().next().unwrap_or_default())
        }
        other => Err(ExtractionError::Parse(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Pull the JSON out of a Markdown code block (```json ... ```) when the
/// reply has one. Any language tag is skipped; text around the block is
/// ignored.
fn strip_code_fence(response: &str) -> &str {
    let Some(fence_start) = response.find("```") else {
        return response.trim();
    };
    let after_fence = &response[fence_start + 3..];
    let tag_len = after_fence
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(after_fence.len());
    let content = &after_fence[tag_len..];

    match content.find("```") {
        Some(end) => content[..end].trim(),
        None => content.trim(),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldSpec, Schema};
    use crate::pipeline::schema::build_record_type;

    fn record() -> RecordType {
        build_record_type(&Schema::new(vec![
            FieldSpec::new("amount", "float"),
            FieldSpec::new("vendor", "string"),
            FieldSpec::new("count", "int"),
        ]))
    }

    #[test]
    fn parses_declared_fields() {
        let result = parse_extraction_response(
            "a.pdf",
            r#"{"amount": 42.5, "vendor": "ACME", "count": 3}"#,
            &record(),
        )
        .unwrap();
        assert_eq!(result.file_name, "a.pdf");
        assert_eq!(result.get("amount"), Some(&Value::Float(42.5)));
        assert_eq!(result.get("vendor"), Some(&Value::Str("ACME".into())));
        assert_eq!(result.get("count"), Some(&Value::Int(3)));
    }

    #[test]
    fn missing_and_null_fields_become_null() {
        let result =
            parse_extraction_response("a.pdf", r#"{"amount": null}"#, &record()).unwrap();
        assert_eq!(result.get("amount"), Some(&Value::Null));
        assert_eq!(result.get("vendor"), Some(&Value::Null));
        assert_eq!(result.resolved_count(), 0);
    }

    #[test]
    fn undeclared_keys_are_kept_untyped() {
        let result =
            parse_extraction_response("a.pdf", r#"{"amount": 1, "extra": "x"}"#, &record())
                .unwrap();
        assert_eq!(result.get("extra"), Some(&Value::Str("x".into())));
        assert_eq!(result.get("amount"), Some(&Value::Float(1.0)));
    }

    #[test]
    fn fenced_reply_is_unwrapped() {
        let reply = "```json\n{\"vendor\": \"ACME\"}\n```";
        let result = parse_extraction_response("a.pdf", reply, &record()).unwrap();
        assert_eq!(result.get("vendor"), Some(&Value::Str("ACME".into())));
    }

    #[test]
    fn fence_tag_case_and_surrounding_text_ignored() {
        let reply = "Here is the data:\n```JSON\n{\"count\": 4}\n```\nLet me know if you need more.";
        let result = parse_extraction_response("a.pdf", reply, &record()).unwrap();
        assert_eq!(result.get("count"), Some(&Value::Int(4)));

        let untagged = "```\n{\"vendor\": \"Globex\"}\n```";
        let result = parse_extraction_response("a.pdf", untagged, &record()).unwrap();
        assert_eq!(result.get("vendor"), Some(&Value::Str("Globex".into())));
    }

    #[test]
    fn unclosed_fence_still_parses() {
        let result =
            parse_extraction_response("a.pdf", "```json\n{\"amount\": 2.5}", &record()).unwrap();
        assert_eq!(result.get("amount"), Some(&Value::Float(2.5)));
    }

    #[test]
    fn single_element_array_is_accepted() {
        let result =
            parse_extraction_response("a.pdf", r#"[{"count": 2}]"#, &record()).unwrap();
        assert_eq!(result.get("count"), Some(&Value::Int(2)));
    }

    #[test]
    fn non_json_is_parse_error() {
        let err = parse_extraction_response("a.pdf", "I could not read it", &record())
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Parse(_)));
    }

    #[test]
    fn non_object_is_parse_error() {
        let err = parse_extraction_response("a.pdf", "[1, 2]", &record()).unwrap_err();
        assert_eq!(
            err,
            ExtractionError::Parse("expected a JSON object, got an array".into())
        );
    }
}
