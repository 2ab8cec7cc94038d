//! Language-model client trait and mock implementation.
//!
//! The `LlmClient` trait abstracts the model backend behind a plain
//! prompt-in/text-out contract, enabling mock-based testing of the
//! research pipeline without network access.

use crate::error::LlmError;
use async_trait::async_trait;
use std::sync::Mutex;

/// Per-request generation options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum output tokens.
    pub max_output_tokens: u32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 2048,
        }
    }
}

/// Trait abstracting a stateless text-completion backend.
///
/// Implementors include `MockLlmClient` (for tests) and `GeminiClient`
/// (the real provider in `providers::gemini`).
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Complete a single prompt and return the generated text.
    async fn complete(&self, prompt: &str, options: &CompletionOptions)
    -> Result<String, LlmError>;

    /// Return the model name used by this client.
    fn model_name(&self) -> &str;
}

/// A mock LLM client for testing. Records prompts and returns queued results.
pub struct MockLlmClient {
    model: String,
    /// Queued results consumed in order by `complete`.
    responses: Mutex<Vec<Result<String, LlmError>>>,
    /// Every prompt passed to `complete`, in call order.
    prompts: Mutex<Vec<String>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self {
            model: "mock-model".to_string(),
            responses: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Create a client that always returns the given text.
    ///
    /// Queues multiple copies of the response so it can handle multiple calls.
    pub fn with_response(text: &str) -> Self {
        let client = Self::new();
        for _ in 0..20 {
            client.queue_response(text);
        }
        client
    }

    /// Queue a successful response for the next `complete` call.
    pub fn queue_response(&self, text: &str) {
        self.responses.lock().unwrap().push(Ok(text.to_string()));
    }

    /// Queue an error for the next `complete` call.
    pub fn queue_error(&self, err: LlmError) {
        self.responses.lock().unwrap().push(Err(err));
    }

    /// Number of `complete` calls made so far.
    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// All prompts received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(
        &self,
        prompt: &str,
        _options: &CompletionOptions,
    ) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok("No queued responses available.".to_string())
        } else {
            responses.remove(0)
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
