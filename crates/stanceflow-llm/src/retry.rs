use std::time::Duration;

use futures::future::BoxFuture;
use tracing::warn;

use stanceflow_core::config::RetryConfig;
use stanceflow_core::error::{Result, StanceflowError};
use stanceflow_core::traits::{AgentInvoker, Bindings};
use stanceflow_core::types::RoleId;

/// An invoker that adds a per-call timeout and bounded retries with
/// exponential backoff around any inner invoker.
///
/// The engine issues collaborator calls through this wrapper so a single
/// unresponsive model call cannot hang a run indefinitely.
pub struct RetryingInvoker {
    inner: Box<dyn AgentInvoker>,
    retry_config: RetryConfig,
}

impl RetryingInvoker {
    pub fn new(inner: Box<dyn AgentInvoker>, retry_config: RetryConfig) -> Self {
        Self {
            inner,
            retry_config,
        }
    }
}

fn is_retryable(e: &StanceflowError) -> bool {
    match e {
        StanceflowError::ModelRequest(msg) => {
            msg.contains("429")
                || msg.contains("500")
                || msg.contains("502")
                || msg.contains("503")
                || msg.contains("timeout")
                || msg.contains("connection")
        }
        StanceflowError::ModelStream(_) => true,
        StanceflowError::EmptyModelResponse => true,
        _ => false,
    }
}

fn calculate_backoff(attempt: u32, config: &RetryConfig) -> Duration {
    // Clamp the exponent: the cap dominates long before 2^32, and an
    // unclamped shift would overflow for large configured retry counts.
    let factor = 2u64.pow(attempt.min(32));
    let ms = config
        .initial_backoff_ms
        .saturating_mul(factor)
        .min(config.max_backoff_ms);
    // Add jitter: 0.8x to 1.2x
    let jitter = 0.8 + rand::random::<f64>() * 0.4;
    Duration::from_millis((ms as f64 * jitter) as u64)
}

impl AgentInvoker for RetryingInvoker {
    fn invoke(&self, role: RoleId, bindings: Bindings) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move {
            let max_retries = self.retry_config.max_retries;
            let timeout = Duration::from_secs(self.retry_config.request_timeout_secs);

            let mut last_err = None;
            for attempt in 0..=max_retries {
                let call = self.inner.invoke(role, bindings.clone());
                let result = match tokio::time::timeout(timeout, call).await {
                    Ok(result) => result,
                    Err(_) => Err(StanceflowError::ModelRequest(format!(
                        "timeout after {}s",
                        timeout.as_secs()
                    ))),
                };

                match result {
                    Ok(text) => return Ok(text),
                    Err(e) => {
                        if is_retryable(&e) && attempt < max_retries {
                            let backoff = calculate_backoff(attempt, &self.retry_config);
                            warn!(
                                role = %role,
                                attempt = attempt + 1,
                                max_retries,
                                backoff_ms = backoff.as_millis() as u64,
                                error = %e,
                                "Retrying model request"
                            );
                            tokio::time::sleep(backoff).await;
                            last_err = Some(e);
                            continue;
                        }
                        return Err(e);
                    }
                }
            }

            Err(last_err
                .unwrap_or_else(|| StanceflowError::ModelRequest("retries exhausted".into())))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Fails with a retryable error N times, then succeeds.
    struct FlakyInvoker {
        failures: usize,
        attempts: Arc<AtomicUsize>,
    }

    impl AgentInvoker for FlakyInvoker {
        fn invoke(&self, _role: RoleId, _bindings: Bindings) -> BoxFuture<'_, Result<String>> {
            let n = self.attempts.fetch_add(1, Ordering::SeqCst);
            let failures = self.failures;
            Box::pin(async move {
                if n < failures {
                    Err(StanceflowError::ModelRequest("connection reset".into()))
                } else {
                    Ok("<agree>true</agree>".to_string())
                }
            })
        }
    }

    fn fast_retry(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            initial_backoff_ms: 1,
            max_backoff_ms: 2,
            request_timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let invoker = RetryingInvoker::new(
            Box::new(FlakyInvoker {
                failures: 2,
                attempts: attempts.clone(),
            }),
            fast_retry(3),
        );

        let text = invoker
            .invoke(RoleId::Debate, Bindings::new())
            .await
            .unwrap();
        assert_eq!(text, "<agree>true</agree>");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausts_retries() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let invoker = RetryingInvoker::new(
            Box::new(FlakyInvoker {
                failures: 10,
                attempts: attempts.clone(),
            }),
            fast_retry(2),
        );

        let err = invoker
            .invoke(RoleId::Debate, Bindings::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StanceflowError::ModelRequest(_)));
        // Initial attempt plus two retries.
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_non_retryable_errors() {
        assert!(!is_retryable(&StanceflowError::ModelRequest(
            "HTTP 404: no such model".into()
        )));
        assert!(!is_retryable(&StanceflowError::Cancelled));
        assert!(is_retryable(&StanceflowError::ModelRequest(
            "HTTP 503: overloaded".into()
        )));
        assert!(is_retryable(&StanceflowError::EmptyModelResponse));
    }

    #[test]
    fn test_backoff_capped() {
        let config = RetryConfig {
            max_retries: 10,
            initial_backoff_ms: 1000,
            max_backoff_ms: 4000,
            request_timeout_secs: 5,
        };
        // 2^8 * 1000ms would be 256s; the cap plus jitter bounds it.
        let backoff = calculate_backoff(8, &config);
        assert!(backoff <= Duration::from_millis(4800));
    }

    #[test]
    fn test_backoff_huge_attempt_does_not_overflow() {
        let config = RetryConfig {
            max_retries: 100,
            initial_backoff_ms: 30000,
            max_backoff_ms: 60000,
            request_timeout_secs: 5,
        };
        for attempt in [54, 63, u32::MAX] {
            let backoff = calculate_backoff(attempt, &config);
            assert!(backoff <= Duration::from_millis(72000));
        }
    }
}
