pub mod ollama;
pub mod retry;
pub mod roles;
pub mod streaming;

use stanceflow_core::config::ModelConfig;
use stanceflow_core::traits::AgentInvoker;

pub use ollama::OllamaInvoker;
pub use retry::RetryingInvoker;

/// Create an invoker for the configured provider, wrapped in the retry and
/// timeout policy. Ollama and any chat endpoint speaking its NDJSON wire
/// format are covered by the same client.
pub fn create_invoker(config: &ModelConfig) -> Box<dyn AgentInvoker> {
    let retry = config.retry.clone().unwrap_or_default();
    let inner = Box::new(OllamaInvoker::new(config.clone()));
    Box::new(RetryingInvoker::new(inner, retry))
}
