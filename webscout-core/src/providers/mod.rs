//! Language-model provider implementations.

pub mod gemini;

pub use gemini::GeminiClient;

use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::llm::LlmClient;
use std::sync::Arc;

/// Create an LLM client from configuration.
///
/// Routes on `config.provider`; unknown providers are rejected with
/// `LlmError::UnsupportedProvider`.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    match config.provider.as_str() {
        "gemini" => Ok(Arc::new(GeminiClient::new(config)?)),
        other => Err(LlmError::UnsupportedProvider {
            provider: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_gemini() {
        let config = LlmConfig {
            api_key: Some("test-key".to_string()),
            ..LlmConfig::default()
        };
        let client = create_client(&config).unwrap();
        assert_eq!(client.model_name(), "gemini-2.0-flash");
    }

    #[test]
    fn test_create_client_unknown_provider() {
        let config = LlmConfig {
            provider: "delphi".to_string(),
            api_key: Some("test-key".to_string()),
            ..LlmConfig::default()
        };
        let result = create_client(&config);
        match result {
            Err(LlmError::UnsupportedProvider { provider }) => assert_eq!(provider, "delphi"),
            other => panic!("Expected UnsupportedProvider, got {:?}", other.map(|_| ())),
        }
    }
}
