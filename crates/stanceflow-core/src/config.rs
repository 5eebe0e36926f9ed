use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StanceflowError};

/// Top-level Stanceflow configuration.
///
/// Constructed once at process start and handed to the executor and
/// collaborators as explicit dependencies rather than an ambient global.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub lookup: LookupConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StanceflowError::ConfigNotFound(path.display().to_string()));
        }
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| StanceflowError::Config(e.to_string()))
    }
}

/// Model provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model_id: default_model_id(),
            api_key: None,
            base_url: None,
            temperature: default_temperature(),
            retry: None,
        }
    }
}

fn default_provider() -> String { "ollama".to_string() }
fn default_model_id() -> String { "llama3.1:8b".to_string() }
fn default_temperature() -> f32 { 0.0 }

/// Retry and timeout policy for model requests.
///
/// Every collaborator call carries a hard timeout so a single unresponsive
/// request cannot hang a run indefinitely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_max_retries() -> u32 { 3 }
fn default_initial_backoff() -> u64 { 1000 }
fn default_max_backoff() -> u64 { 30000 }
fn default_request_timeout() -> u64 { 120 }

/// Engine defaults applied when a run request does not override them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Hard upper bound on debate iterations per run.
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
        }
    }
}

fn default_max_turns() -> usize { 3 }

/// Web lookup configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Upper bound on returned snippet length, in characters.
    #[serde(default = "default_snippet_max_chars")]
    pub snippet_max_chars: usize,
    /// Per-request timeout for search and fetch calls.
    #[serde(default = "default_lookup_timeout")]
    pub timeout_secs: u64,
    /// Preferred knowledge source, queried before the general fallback.
    #[serde(default = "default_curated_site")]
    pub curated_site: String,
    /// Result count requested from the curated-source search.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            snippet_max_chars: default_snippet_max_chars(),
            timeout_secs: default_lookup_timeout(),
            curated_site: default_curated_site(),
            max_results: default_max_results(),
        }
    }
}

fn default_snippet_max_chars() -> usize { 2000 }
fn default_lookup_timeout() -> u64 { 10 }
fn default_curated_site() -> String { "en.wikipedia.org".to_string() }
fn default_max_results() -> usize { 3 }

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.model.provider, "ollama");
        assert_eq!(config.engine.max_turns, 3);
        assert_eq!(config.lookup.snippet_max_chars, 2000);
        assert_eq!(config.lookup.curated_site, "en.wikipedia.org");
    }

    #[test]
    fn test_load_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[model]
model_id = "llama3.1:70b"
base_url = "http://10.0.0.2:11434"

[engine]
max_turns = 5
"#
        )
        .unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.model.model_id, "llama3.1:70b");
        assert_eq!(config.model.provider, "ollama"); // default kept
        assert_eq!(config.engine.max_turns, 5);
        assert_eq!(config.lookup.timeout_secs, 10); // whole section defaulted
    }

    #[test]
    fn test_load_missing_file() {
        let err = AppConfig::load("/nonexistent/stanceflow.toml").unwrap_err();
        assert!(matches!(err, StanceflowError::ConfigNotFound(_)));
    }

    #[test]
    fn test_retry_defaults() {
        let retry = RetryConfig::default();
        assert_eq!(retry.max_retries, 3);
        assert_eq!(retry.request_timeout_secs, 120);
        assert!(retry.initial_backoff_ms <= retry.max_backoff_ms);
    }
}
