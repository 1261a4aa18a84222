// src/llm/retry.rs
use std::future::Future;
use std::time::Duration;
use tracing::{warn, error};

use crate::config::RetryConfig;
use crate::error::{GatewayError, OrchestratorError, OrchestratorResult};

/// Exponential backoff for rate-limited gateway calls.
///
/// Attempt `i` (starting at 0) that fails with a rate limit is followed by a
/// pause of `base_delay * 2^i`. Any other failure ends the call immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

impl RetryPolicy {
    /// Create a policy; `max_attempts` below 1 is treated as 1
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, config.base_delay())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Pause after the failed attempt with the given zero-based index
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt_index))
    }

    /// Run `call` until it succeeds, fails with a non rate-limit error, or
    /// runs out of attempts. Failures come back as `OrchestratorError::LlmCall`.
    pub async fn execute<T, F, Fut>(&self, operation: &str, mut call: F) -> OrchestratorResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let mut attempt = 0;

        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_rate_limit() => {
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        error!("{}: rate limit persisted after {} attempts", operation, attempt);
                        return Err(OrchestratorError::LlmCall {
                            operation: operation.to_string(),
                            attempts: attempt,
                            source: e,
                        });
                    }

                    let delay = self.delay_for(attempt - 1);
                    warn!(
                        "{}: rate limit hit. Attempt {}/{}. Waiting {:?}...",
                        operation, attempt, self.max_attempts, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!("{}: LLM call failed: {}", operation, e);
                    return Err(OrchestratorError::LlmCall {
                        operation: operation.to_string(),
                        attempts: attempt + 1,
                        source: e,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;
    use std::sync::{Arc, Mutex};
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;
    use tracing::field::{Field, Visit};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    /// Collects the message of every WARN event
    #[derive(Clone, Default)]
    struct WarnRecorder(Arc<Mutex<Vec<String>>>);

    struct MessageVisitor(String);

    impl Visit for MessageVisitor {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{:?}", value);
            }
        }
    }

    impl<S: Subscriber> Layer<S> for WarnRecorder {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == Level::WARN {
                let mut visitor = MessageVisitor(String::new());
                event.record(&mut visitor);
                self.0.lock().unwrap().push(visitor.0);
            }
        }
    }

    impl WarnRecorder {
        fn messages(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    /// Fails with `error` for the first `failures` calls, then succeeds
    async fn flaky(calls: Arc<AtomicU32>, failures: u32, error: GatewayError) -> Result<&'static str, GatewayError> {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        if n < failures {
            Err(error)
        } else {
            Ok("done")
        }
    }

    fn rate_limited() -> GatewayError {
        GatewayError::RateLimited("429 Too Many Requests".to_string())
    }

    #[test]
    fn test_delay_schedule_doubles() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100));

        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for(3), Duration::from_millis(800));
    }

    #[test]
    fn test_zero_attempts_is_clamped() {
        assert_eq!(RetryPolicy::new(0, Duration::from_secs(1)).max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_rate_limits() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        let start = Instant::now();

        let result = policy
            .execute("test", || flaky(calls.clone(), 2, rate_limited()))
            .await
            .unwrap();

        assert_eq!(result, "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1s after the first failure, 2s after the second
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3));
        assert!(elapsed < Duration::from_millis(3010));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_rate_limit_becomes_llm_call_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(3, Duration::from_secs(1));

        let err = policy
            .execute("test", || flaky(calls.clone(), u32::MAX, rate_limited()))
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match err {
            OrchestratorError::LlmCall { attempts, source, .. } => {
                assert_eq!(attempts, 3);
                assert!(source.is_rate_limit());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_errors_fail_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        let start = Instant::now();

        let err = policy
            .execute("test", || flaky(calls.clone(), 1, GatewayError::Transport("connection reset".to_string())))
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() < Duration::from_millis(1));
        assert!(matches!(err, OrchestratorError::LlmCall { attempts: 1, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_never_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(1, Duration::from_secs(1));

        let err = policy
            .execute("test", || flaky(calls.clone(), 1, rate_limited()))
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, OrchestratorError::LlmCall { attempts: 1, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_warning_per_retry_with_doubling_delay() {
        let recorder = WarnRecorder::default();
        let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(recorder.clone()));

        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(3, Duration::from_secs(1));

        policy
            .execute("test", || flaky(calls.clone(), 2, rate_limited()))
            .await
            .unwrap();

        let warnings = recorder.messages();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("Attempt 1/3"));
        assert!(warnings[0].contains("Waiting 1s"));
        assert!(warnings[1].contains("Attempt 2/3"));
        assert!(warnings[1].contains("Waiting 2s"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_warning_without_retry() {
        let recorder = WarnRecorder::default();
        let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(recorder.clone()));

        let calls = Arc::new(AtomicU32::new(0));
        RetryPolicy::new(1, Duration::from_secs(1))
            .execute("test", || flaky(calls.clone(), 1, rate_limited()))
            .await
            .unwrap_err();

        let calls = Arc::new(AtomicU32::new(0));
        RetryPolicy::new(3, Duration::from_secs(1))
            .execute("test", || flaky(calls.clone(), 1, GatewayError::Http { status: 400, message: "bad".to_string() }))
            .await
            .unwrap_err();

        assert!(recorder.messages().is_empty());
    }
}
