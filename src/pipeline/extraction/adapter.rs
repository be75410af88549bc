use std::sync::Arc;
use std::time::Instant;

use base64::Engine as _;

use super::gemini::GeminiClient;
use super::gemini_types::{
    Content, GenerateContentRequest, GenerationConfig, InlineData, Part, ResponseSchema,
    SchemaType, JSON_MIME_TYPE, PDF_MIME_TYPE,
};
use super::parser::parse_extraction_response;
use super::types::{Credentials, DocumentExtractor, GenerateClient};
use super::ExtractionError;
use crate::config::ExtractorConfig;
use crate::models::{ExtractionResult, ValueType};
use crate::pipeline::schema::{format_hint, CompiledRequest, RecordField, RecordType};

/// Document extractor backed by Gemini structured output.
///
/// Accepts any `GenerateClient` (GeminiClient or mock).
pub struct GeminiExtractor {
    client: Arc<dyn GenerateClient>,
    model: String,
}

impl GeminiExtractor {
    pub fn new(client: Arc<dyn GenerateClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Production extractor talking to the configured endpoint.
    pub fn from_config(config: &ExtractorConfig) -> Result<Self, ExtractionError> {
        let client = GeminiClient::new(&config.base_url, config.timeout_secs)?;
        Ok(Self::new(Arc::new(client), config.model.clone()))
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl DocumentExtractor for GeminiExtractor {
    fn provider(&self) -> &'static str {
        "google"
    }

    fn extract(
        &self,
        file_name: &str,
        file_bytes: &[u8],
        compiled: &CompiledRequest,
        credentials: &Credentials,
    ) -> Result<ExtractionResult, ExtractionError> {
        let _span = tracing::info_span!(
            "gemini_extract",
            file = %file_name,
            model = %self.model,
            size = file_bytes.len(),
        )
        .entered();
        let start = Instant::now();

        let request = build_request(file_bytes, compiled);
        let text = self
            .client
            .generate_content(&self.model, &request, credentials)?;
        let result = parse_extraction_response(file_name, &text, &compiled.record_type)?;

        tracing::info!(
            elapsed_ms = %start.elapsed().as_millis(),
            resolved = result.resolved_count(),
            fields = compiled.record_type.fields.len(),
            "Extraction complete"
        );

        Ok(result)
    }
}

/// Assemble the `generateContent` body: the PDF inline, then the instructions,
/// with output constrained to JSON matching the record type.
pub fn build_request(file_bytes: &[u8], compiled: &CompiledRequest) -> GenerateContentRequest {
    let data = base64::engine::general_purpose::STANDARD.encode(file_bytes);

    GenerateContentRequest {
        contents: vec![Content {
            role: "user".into(),
            parts: vec![
                Part::InlineData(InlineData {
                    mime_type: PDF_MIME_TYPE.into(),
                    data,
                }),
                Part::Text(compiled.instructions.prompt_text.clone()),
            ],
        }],
        generation_config: GenerationConfig {
            response_mime_type: JSON_MIME_TYPE.into(),
            response_schema: response_schema(&compiled.record_type),
        },
    }
}

/// Lower the record type into the provider's response schema.
pub fn response_schema(record: &RecordType) -> ResponseSchema {
    ResponseSchema {
        schema_type: SchemaType::Object,
        description: None,
        nullable: None,
        properties: record
            .fields
            .iter()
            .map(|f| (f.name.clone(), field_schema(f)))
            .collect(),
        property_ordering: record.fields.iter().map(|f| f.name.clone()).collect(),
    }
}

fn field_schema(field: &RecordField) -> ResponseSchema {
    let mut schema = ResponseSchema::scalar(provider_type(field.value_type));
    schema.nullable = Some(field.nullable);

    let hint = field.description.as_deref();
    schema.description = match (format_hint(field.value_type), hint) {
        (Some(format), Some(hint)) => Some(format!("{hint}. {format}")),
        (Some(format), None) => Some(format.to_string()),
        (None, hint) => hint.map(str::to_string),
    };
    schema
}

/// Provider schema type. Temporal values travel as strings.
fn provider_type(ty: ValueType) -> SchemaType {
    match ty {
        ValueType::String | ValueType::Date | ValueType::Time | ValueType::DateTime => {
            SchemaType::String
        }
        ValueType::Int => SchemaType::Integer,
        ValueType::Float => SchemaType::Number,
        ValueType::Boolean => SchemaType::Boolean,
    }
}
