//! Bounded retries around a provider.

use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::{ChatProvider, ProviderError, ProviderResponse, ToolSpec, Transcript};

/// How many times to retry and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; zero disables retrying.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1-based), doubling each time.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Wraps a provider and retries transient failures
/// (`RateLimited`, `Network`, `Timeout`). Other errors pass straight through.
pub struct RetryingProvider<P> {
    inner: P,
    policy: RetryPolicy,
}

impl<P: ChatProvider> RetryingProvider<P> {
    pub fn new(inner: P, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: ChatProvider> ChatProvider for RetryingProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn default_model(&self) -> &str {
        self.inner.default_model()
    }

    async fn complete(
        &self,
        transcript: &Transcript,
        tools: &[ToolSpec],
        model: Option<&str>,
    ) -> Result<ProviderResponse, ProviderError> {
        let mut attempt = 0;
        loop {
            match self.inner.complete(transcript, tools, model).await {
                Err(e) if e.is_transient() && attempt < self.policy.max_retries => {
                    attempt += 1;
                    let delay = self.policy.backoff(attempt);
                    warn!(
                        provider = self.inner.name(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient provider error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Fails with the queued errors, then answers.
    struct Flaky {
        calls: AtomicU32,
        failures: Mutex<Vec<ProviderError>>,
    }

    impl Flaky {
        fn new(failures: Vec<ProviderError>) -> Self {
            Self {
                calls: AtomicU32::new(0),
                failures: Mutex::new(failures),
            }
        }
    }

    #[async_trait]
    impl ChatProvider for Flaky {
        fn name(&self) -> &str {
            "flaky"
        }

        fn default_model(&self) -> &str {
            "flaky-1"
        }

        async fn complete(
            &self,
            _transcript: &Transcript,
            _tools: &[ToolSpec],
            _model: Option<&str>,
        ) -> Result<ProviderResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut failures = self.failures.lock().unwrap();
            if failures.is_empty() {
                Ok(ProviderResponse::text("ok"))
            } else {
                Err(failures.remove(0))
            }
        }
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
        }
    }

    #[test]
    fn backoff_doubles_up_to_cap() {
        let policy = RetryPolicy {
            max_retries: 5,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(350),
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(350));
        assert_eq!(policy.backoff(40), Duration::from_millis(350));
    }

    #[tokio::test]
    async fn retries_transient_errors_then_succeeds() {
        let provider = RetryingProvider::new(
            Flaky::new(vec![
                ProviderError::RateLimited,
                ProviderError::Network("reset".into()),
            ]),
            fast_policy(2),
        );
        let response = provider
            .complete(&Transcript::new(), &[], None)
            .await
            .unwrap();
        assert_eq!(response.content.as_deref(), Some("ok"));
        assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let provider = RetryingProvider::new(
            Flaky::new(vec![
                ProviderError::Timeout,
                ProviderError::Timeout,
                ProviderError::Timeout,
            ]),
            fast_policy(1),
        );
        let err = provider
            .complete(&Transcript::new(), &[], None)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Timeout));
        assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let provider = RetryingProvider::new(
            Flaky::new(vec![ProviderError::Api {
                status: 400,
                body: "bad".into(),
            }]),
            fast_policy(3),
        );
        assert!(provider
            .complete(&Transcript::new(), &[], None)
            .await
            .is_err());
        assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.name(), "flaky");
    }
}
