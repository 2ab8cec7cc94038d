//! Layered configuration for webscout.
//!
//! Configuration merges, lowest precedence first:
//! 1. Built-in defaults
//! 2. User config (`~/.config/webscout/config.toml`)
//! 3. An explicit config file passed on the command line
//! 4. Environment variables prefixed with `WEBSCOUT_` (nested keys split
//!    on `__`, e.g. `WEBSCOUT_LLM__MODEL`)

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebscoutConfig {
    /// Language-model provider settings.
    #[serde(default)]
    pub llm: LlmConfig,
    /// Browser automation settings.
    #[serde(default)]
    pub browser: BrowserConfig,
    /// Research pipeline bounds.
    #[serde(default)]
    pub research: ResearchConfig,
}

/// Configuration for the language-model provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name (currently only `gemini`).
    pub provider: String,
    /// Model identifier.
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Inline API key; takes precedence over `api_key_env` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Override for the provider base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Default sampling temperature.
    pub temperature: f32,
    /// Default maximum output tokens per completion.
    pub max_output_tokens: u32,
    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            api_key: None,
            base_url: None,
            temperature: 0.7,
            max_output_tokens: 2048,
            request_timeout_secs: 30,
        }
    }
}

/// Configuration for the browser-backed content fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Path to the Chrome/Chromium binary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chrome_path: Option<String>,
    /// Persistent browser profile directory. A unique temporary profile is
    /// used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data_dir: Option<PathBuf>,
    /// Whether to run headless (no visible window).
    pub headless: bool,
    /// Extra delay after each navigation, in milliseconds. Useful for
    /// watching the browser work with `headless = false`.
    pub slow_motion_ms: u64,
    /// Viewport width in pixels.
    pub viewport_width: u32,
    /// Viewport height in pixels.
    pub viewport_height: u32,
    /// Default timeout for page operations in milliseconds.
    pub default_timeout_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            user_data_dir: None,
            headless: true,
            slow_motion_ms: 0,
            viewport_width: 1280,
            viewport_height: 720,
            default_timeout_ms: 30_000,
        }
    }
}

/// Bounds for the research pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Maximum candidate result pages tried per search term.
    pub max_candidates_per_term: usize,
    /// Maximum page content characters embedded in an extraction prompt.
    pub max_content_chars: usize,
    /// Maximum characters returned by a single page fetch.
    pub max_page_chars: usize,
    /// Word cap requested for extracted answers.
    pub extraction_word_limit: usize,
    /// Per-call timeout for fetcher and model calls, in milliseconds.
    pub call_timeout_ms: u64,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            max_candidates_per_term: 5,
            max_content_chars: 3000,
            max_page_chars: 5000,
            extraction_word_limit: 100,
            call_timeout_ms: 30_000,
        }
    }
}

impl WebscoutConfig {
    /// Validate the configuration, returning human-readable warnings.
    ///
    /// Warnings never prevent startup; questionable values are reported
    /// and used as-is.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.llm.provider.is_empty() {
            warnings.push("llm.provider is empty; no model client can be created".to_string());
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            warnings.push(format!(
                "llm.temperature {} is outside the typical range 0.0-2.0",
                self.llm.temperature
            ));
        }
        if self.research.max_candidates_per_term == 0 {
            warnings.push(
                "research.max_candidates_per_term is 0; every term will fail".to_string(),
            );
        }
        if self.research.max_candidates_per_term > 8 {
            warnings.push(format!(
                "research.max_candidates_per_term {} is high; 4-8 is the supported range",
                self.research.max_candidates_per_term
            ));
        }
        if self.research.max_content_chars > self.research.max_page_chars {
            warnings.push(
                "research.max_content_chars exceeds max_page_chars; the extra budget is unused"
                    .to_string(),
            );
        }
        if self.browser.viewport_width == 0 || self.browser.viewport_height == 0 {
            warnings.push("browser viewport dimensions must be non-zero".to_string());
        }

        warnings
    }
}

/// Load configuration with layered sources (see module docs for precedence).
pub fn load_config(config_file: Option<&Path>) -> Result<WebscoutConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(WebscoutConfig::default()));

    // User-level config
    if let Some(dirs) = directories::ProjectDirs::from("dev", "webscout", "webscout") {
        let user_config = dirs.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    // Explicit config file
    if let Some(path) = config_file {
        figment = figment.merge(Toml::file(path));
    }

    // Environment variables (WEBSCOUT_LLM__MODEL, WEBSCOUT_BROWSER__HEADLESS, etc.)
    figment = figment.merge(Env::prefixed("WEBSCOUT_").split("__"));

    figment.extract().map_err(Box::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = WebscoutConfig::default();
        assert_eq!(config.llm.provider, "gemini");
        assert_eq!(config.llm.api_key_env, "GEMINI_API_KEY");
        assert!(config.browser.headless);
        assert_eq!(config.research.max_candidates_per_term, 5);
        assert_eq!(config.research.max_content_chars, 3000);
        assert_eq!(config.research.call_timeout_ms, 30_000);
    }

    #[test]
    fn test_defaults_pass_validation() {
        let config = WebscoutConfig::default();
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_validate_flags_bad_values() {
        let mut config = WebscoutConfig::default();
        config.llm.temperature = 5.0;
        config.research.max_candidates_per_term = 0;
        config.browser.viewport_width = 0;

        let warnings = config.validate();
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].contains("temperature"));
        assert!(warnings[1].contains("max_candidates_per_term"));
        assert!(warnings[2].contains("viewport"));
    }

    #[test]
    fn test_validate_flags_high_candidate_cap() {
        let mut config = WebscoutConfig::default();
        config.research.max_candidates_per_term = 20;
        let warnings = config.validate();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("4-8"));
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let figment = Figment::from(Serialized::defaults(WebscoutConfig::default())).merge(
            Toml::string(
                r#"
                [llm]
                model = "gemini-2.5-pro"
                temperature = 0.2

                [browser]
                headless = false

                [research]
                max_candidates_per_term = 8
                "#,
            ),
        );
        let config: WebscoutConfig = figment.extract().unwrap();
        assert_eq!(config.llm.model, "gemini-2.5-pro");
        assert_eq!(config.llm.temperature, 0.2);
        assert!(!config.browser.headless);
        assert_eq!(config.research.max_candidates_per_term, 8);
        // Untouched sections keep defaults
        assert_eq!(config.llm.provider, "gemini");
        assert_eq!(config.research.max_page_chars, 5000);
    }

    #[test]
    fn test_env_overrides_toml() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("WEBSCOUT_LLM__MODEL", "from-env");
            let figment = Figment::from(Serialized::defaults(WebscoutConfig::default()))
                .merge(Toml::string("[llm]\nmodel = \"from-toml\""))
                .merge(Env::prefixed("WEBSCOUT_").split("__"));
            let config: WebscoutConfig = figment.extract()?;
            assert_eq!(config.llm.model, "from-env");
            Ok(())
        });
    }
}
