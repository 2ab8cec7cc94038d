//! Google Gemini API provider implementation.
//!
//! Implements the `LlmClient` trait against the native Gemini
//! `generateContent` endpoint.
//!
//! Notable API details:
//! - Auth via `?key=API_KEY` query parameter (not header-based)
//! - Generation options live in a `generationConfig` object
//! - Output text is spread across `candidates[0].content.parts[].text`

use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::llm::{CompletionOptions, LlmClient};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

/// The default Google Gemini API base URL.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini API client.
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    request_timeout_secs: u64,
}

impl GeminiClient {
    /// Create a new Gemini client from configuration.
    ///
    /// The API key is taken from `config.api_key` when set, otherwise from
    /// the environment variable named in `config.api_key_env`. Returns
    /// `LlmError::AuthFailed` if neither yields a key.
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(&config.api_key_env).ok())
            .ok_or_else(|| LlmError::AuthFailed {
                provider: format!("Gemini (env var '{}' not set)", config.api_key_env),
            })?;
        Self::new_with_key(config, api_key)
    }

    /// Create a new Gemini client with an explicitly provided API key.
    pub fn new_with_key(config: &LlmConfig, api_key: String) -> Result<Self, LlmError> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| LlmError::Connection {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url,
            api_key,
            model: config.model.clone(),
            request_timeout_secs: config.request_timeout_secs,
        })
    }

    /// Build the JSON request body for a single-prompt completion.
    fn build_request_body(prompt: &str, options: &CompletionOptions) -> Value {
        serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{"text": prompt}],
            }],
            "generationConfig": {
                "maxOutputTokens": options.max_output_tokens,
                "temperature": options.temperature,
            },
        })
    }

    /// Extract the generated text from a Gemini API response.
    ///
    /// Joins all text parts of the first candidate.
    fn extract_text(body: &Value) -> Result<String, LlmError> {
        let candidates = body["candidates"]
            .as_array()
            .ok_or_else(|| LlmError::ResponseParse {
                message: "Missing 'candidates' array in response".to_string(),
            })?;

        if candidates.is_empty() {
            return Err(LlmError::ResponseParse {
                message: "Empty 'candidates' array in response".to_string(),
            });
        }

        let parts = candidates[0]["content"]["parts"].as_array().ok_or_else(|| {
            LlmError::ResponseParse {
                message: "Missing 'parts' array in candidate content".to_string(),
            }
        })?;

        let text: Vec<&str> = parts
            .iter()
            .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
            .collect();

        Ok(text.join(""))
    }

    /// Map an HTTP status code to the appropriate `LlmError`.
    fn map_http_error(status: reqwest::StatusCode, body_text: &str) -> LlmError {
        match status.as_u16() {
            401 | 403 => LlmError::AuthFailed {
                provider: "Gemini".to_string(),
            },
            429 => LlmError::RateLimited {
                retry_after_secs: 30,
            },
            _ => LlmError::ApiRequest {
                message: format!("HTTP {} from Gemini API: {}", status, body_text),
            },
        }
    }

    fn endpoint_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        )
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, LlmError> {
        let body = Self::build_request_body(prompt, options);
        let url = self.endpoint_url();

        debug!(
            model = self.model.as_str(),
            prompt_chars = prompt.len(),
            "Sending Gemini completion request"
        );

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout {
                        timeout_secs: self.request_timeout_secs,
                    }
                } else {
                    LlmError::ApiRequest {
                        message: format!("Request to Gemini API failed: {}", e),
                    }
                }
            })?;

        let status = response.status();
        let body_text = response.text().await.map_err(|e| LlmError::ResponseParse {
            message: format!("Failed to read response body: {}", e),
        })?;

        if !status.is_success() {
            return Err(Self::map_http_error(status, &body_text));
        }

        let response_json: Value =
            serde_json::from_str(&body_text).map_err(|e| LlmError::ResponseParse {
                message: format!("Invalid JSON in response: {}", e),
            })?;

        Self::extract_text(&response_json)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(api_key_env: &str) -> LlmConfig {
        LlmConfig {
            api_key_env: api_key_env.to_string(),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn test_new_reads_env() {
        let env_var = "GEMINI_TEST_KEY_NEW_READS";
        // SAFETY: test-only env var manipulation
        unsafe { std::env::set_var(env_var, "my-gemini-api-key") };
        let config = test_config(env_var);
        let client = GeminiClient::new(&config).unwrap();
        assert_eq!(client.api_key, "my-gemini-api-key");
        assert_eq!(client.model, "gemini-2.0-flash");
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
        // SAFETY: test-only env var manipulation
        unsafe { std::env::remove_var(env_var) };
    }

    #[test]
    fn test_new_missing_env_returns_auth_failed() {
        // SAFETY: test-only env var manipulation
        unsafe { std::env::remove_var("GEMINI_MISSING_KEY_XYZ") };
        let config = test_config("GEMINI_MISSING_KEY_XYZ");
        let result = GeminiClient::new(&config);
        match result {
            Err(LlmError::AuthFailed { provider }) => {
                assert!(provider.contains("GEMINI_MISSING_KEY_XYZ"));
            }
            other => panic!("Expected AuthFailed, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_inline_key_takes_precedence() {
        let mut config = test_config("UNSET_ENV_VAR_FOR_THIS_TEST");
        config.api_key = Some("inline-key".to_string());
        let client = GeminiClient::new(&config).unwrap();
        assert_eq!(client.api_key, "inline-key");
    }

    #[test]
    fn test_new_custom_base_url() {
        let mut config = test_config("UNUSED");
        config.api_key = Some("k".to_string());
        config.base_url = Some("https://my-proxy.example.com/v1".to_string());
        let client = GeminiClient::new(&config).unwrap();
        assert_eq!(client.base_url, "https://my-proxy.example.com/v1");
    }

    #[test]
    fn test_build_request_body() {
        let options = CompletionOptions {
            temperature: 0.3,
            max_output_tokens: 512,
        };
        let body = GeminiClient::build_request_body("What is 2+2?", &options);
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "What is 2+2?");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 512);
        // The f32 temperature widens in JSON, so compare after narrowing back
        let temperature = body["generationConfig"]["temperature"].as_f64().unwrap();
        assert_eq!(temperature as f32, 0.3);
    }

    #[test]
    fn test_extract_text() {
        let response = serde_json::json!({
            "candidates": [{
                "content": {
                    "parts": [{"text": "Hello "}, {"text": "world"}],
                    "role": "model"
                },
                "finishReason": "STOP"
            }]
        });
        assert_eq!(GeminiClient::extract_text(&response).unwrap(), "Hello world");
    }

    #[test]
    fn test_extract_text_missing_candidates() {
        let response = serde_json::json!({"error": "bad request"});
        let result = GeminiClient::extract_text(&response);
        match result {
            Err(LlmError::ResponseParse { message }) => {
                assert!(message.contains("candidates"));
            }
            other => panic!("Expected ResponseParse, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_text_empty_candidates() {
        let response = serde_json::json!({"candidates": []});
        let result = GeminiClient::extract_text(&response);
        match result {
            Err(LlmError::ResponseParse { message }) => {
                assert!(message.contains("Empty"));
            }
            other => panic!("Expected ResponseParse, got {:?}", other),
        }
    }

    #[test]
    fn test_http_error_mapping() {
        let err = GeminiClient::map_http_error(
            reqwest::StatusCode::UNAUTHORIZED,
            r#"{"error":{"message":"Invalid API key"}}"#,
        );
        assert!(matches!(err, LlmError::AuthFailed { .. }));

        let err = GeminiClient::map_http_error(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"message":"Rate limited"}}"#,
        );
        match err {
            LlmError::RateLimited { retry_after_secs } => assert_eq!(retry_after_secs, 30),
            _ => panic!("Expected RateLimited, got {:?}", err),
        }

        let err = GeminiClient::map_http_error(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error":{"message":"Internal server error"}}"#,
        );
        match err {
            LlmError::ApiRequest { message } => assert!(message.contains("500")),
            _ => panic!("Expected ApiRequest, got {:?}", err),
        }
    }

    #[test]
    fn test_endpoint_url() {
        let mut config = test_config("UNUSED");
        config.api_key = Some("secret".to_string());
        let client = GeminiClient::new(&config).unwrap();
        let url = client.endpoint_url();
        assert!(url.contains("gemini-2.0-flash"));
        assert!(url.contains("generateContent"));
        assert!(url.contains("key=secret"));
    }
}
