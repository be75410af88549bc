use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::gemini_types::{ApiErrorEnvelope, GenerateContentRequest, GenerateContentResponse};
use super::types::{Credentials, GenerateClient};
use super::ExtractionError;

/// Public Gemini API host.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Header carrying the API key (keeps the key out of URLs and logs).
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Blocking HTTP client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    base_url: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ExtractionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                ExtractionError::Transport(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_secs,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{model}:generateContent", self.base_url)
    }
}

impl GenerateClient for GeminiClient {
    fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
        credentials: &Credentials,
    ) -> Result<String, ExtractionError> {
        if credentials.is_empty() {
            return Err(ExtractionError::Auth("no API key configured".into()));
        }

        let response = self
            .client
            .post(self.endpoint(model))
            .header(API_KEY_HEADER, credentials.api_key())
            .json(request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    ExtractionError::Transport(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else if e.is_connect() {
                    ExtractionError::Transport(format!("Cannot connect to {}", self.base_url))
                } else {
                    ExtractionError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(classify_error_response(status.as_u16(), &body));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .map_err(|e| ExtractionError::Parse(format!("Unexpected response envelope: {e}")))?;

        parsed.into_text()
    }
}

/// Map a non-2xx provider response onto the error taxonomy.
///
/// The provider reports an invalid key as `400 INVALID_ARGUMENT` with reason
/// `API_KEY_INVALID`, so auth detection also inspects the body.
pub fn classify_error_response(status: u16, body: &str) -> ExtractionError {
    let (message, api_status) = match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => (envelope.error.message, envelope.error.status),
        Err(_) => (body.trim().to_string(), String::new()),
    };
    let message = if message.is_empty() {
        format!("HTTP {status}")
    } else {
        message
    };

    let key_rejected = body.contains("API_KEY_INVALID") || message.contains("API key not valid");

    match status {
        401 | 403 => ExtractionError::Auth(message),
        400 if key_rejected => ExtractionError::Auth(message),
        429 => ExtractionError::RateLimit(message),
        _ if api_status == "RESOURCE_EXHAUSTED" => ExtractionError::RateLimit(message),
        _ => ExtractionError::Provider { status, message },
    }
}

type Responder = dyn Fn(&GenerateContentRequest) -> Result<String, ExtractionError> + Send + Sync;

/// Mock client for testing. Answers every request from a closure and keeps
/// the last request for inspection.
pub struct MockGenerateClient {
    responder: Box<Responder>,
    calls: AtomicUsize,
    last_request: Mutex<Option<GenerateContentRequest>>,
}

impl MockGenerateClient {
    /// Always reply with the same text.
    pub fn new(response: &str) -> Self {
        let response = response.to_string();
        Self::from_fn(move |_| Ok(response.clone()))
    }

    /// Always fail with the same error.
    pub fn failing(error: ExtractionError) -> Self {
        Self::from_fn(move |_| Err(error.clone()))
    }

    pub fn from_fn(
        responder: impl Fn(&GenerateContentRequest) -> Result<String, ExtractionError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<GenerateContentRequest> {
        match self.last_request.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl GenerateClient for MockGenerateClient {
    fn generate_content(
        &self,
        _model: &str,
        request: &GenerateContentRequest,
        _credentials: &Credentials,
    ) -> Result<String, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.last_request.lock() {
            Ok(mut guard) => *guard = Some(request.clone()),
            Err(poisoned) => *poisoned.into_inner() = Some(request.clone()),
        }
        (self.responder)(request)
    }
}
