use std::fmt;

use zeroize::Zeroizing;

use super::gemini_types::GenerateContentRequest;
use super::ExtractionError;
use crate::models::ExtractionResult;
use crate::pipeline::schema::CompiledRequest;

/// Provider API key. Wiped from memory on drop, never printed.
#[derive(Clone)]
pub struct Credentials {
    api_key: Zeroizing<String>,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Zeroizing::new(api_key.into()),
        }
    }

    pub fn api_key(&self) -> &str {
        self.api_key.as_str()
    }

    pub fn is_empty(&self) -> bool {
        self.api_key.trim().is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"[redacted]")
            .finish()
    }
}

/// Turns one document into one extraction result.
///
/// Implementations make exactly one provider call per `extract` and never retry.
pub trait DocumentExtractor: Send + Sync {
    /// Provider name, used in logs.
    fn provider(&self) -> &'static str;

    fn extract(
        &self,
        file_name: &str,
        file_bytes: &[u8],
        compiled: &CompiledRequest,
        credentials: &Credentials,
    ) -> Result<ExtractionResult, ExtractionError>;
}

/// Transport to the provider's generate endpoint (allows mocking).
/// Returns the concatenated text of the first candidate.
pub trait GenerateClient: Send + Sync {
    fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
        credentials: &Credentials,
    ) -> Result<String, ExtractionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_key() {
        let creds = Credentials::new("AIza-secret-key");
        let debug = format!("{creds:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn blank_key_is_empty() {
        assert!(Credentials::new("   ").is_empty());
        assert!(!Credentials::new("k").is_empty());
    }

    #[test]
    fn traits_are_object_safe() {
        fn _assert_extractor(_: &dyn DocumentExtractor) {}
        fn _assert_client(_: &dyn GenerateClient) {}
    }
}
