//! Retry wrapper for embedders.

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use embindex_core::{Error, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::embedding::Embedder;
use crate::types::EmbedderId;

/// Wraps an embedder with exponential-backoff retry on transient failures.
///
/// Only errors for which [`Error::is_retryable`] holds are retried; auth,
/// rate-limit and invalid-input failures surface immediately.
pub struct RetryingEmbedder {
    inner: Arc<dyn Embedder>,
    max_retries: u32,
    initial_delay: Duration,
    max_delay: Duration,
}

impl RetryingEmbedder {
    /// Creates a new retry wrapper with default settings.
    ///
    /// Default settings:
    /// - Max retries: 3
    /// - Initial delay: 500 milliseconds
    /// - Max delay: 10 seconds
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            inner: embedder,
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }

    /// Sets the maximum number of retries after the first attempt.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the initial delay between retries.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay between retries.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.initial_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries as usize)
    }

    fn should_retry(error: &Error) -> bool {
        error.is_retryable()
    }

    fn log_retry(&self, error: &Error, delay: Duration) {
        log::warn!(
            "{} embedder call failed, retrying in {:?}: {}",
            self.inner.id(),
            delay,
            error
        );
    }
}

#[async_trait]
impl Embedder for RetryingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embedder = self.inner.clone();

        (|| async { embedder.embed(text).await })
            .retry(self.backoff())
            .when(Self::should_retry)
            .notify(|e, d| self.log_retry(e, d))
            .await
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let embedder = self.inner.clone();

        (|| async { embedder.embed_batch(texts).await })
            .retry(self.backoff())
            .when(Self::should_retry)
            .notify(|e, d| self.log_retry(e, d))
            .await
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn id(&self) -> EmbedderId {
        self.inner.id()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::embedding::MockEmbedder;
    use embindex_core::EmbedErrorKind;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails with the given kind until `failures` calls have been made.
    struct FlakyEmbedder {
        calls: AtomicU32,
        failures: u32,
        kind: EmbedErrorKind,
    }

    impl FlakyEmbedder {
        fn new(failures: u32, kind: EmbedErrorKind) -> Self {
            Self {
                calls: AtomicU32::new(0),
                failures,
                kind,
            }
        }
    }

    #[async_trait]
    impl Embedder for FlakyEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                return Err(Error::embed(self.kind, "flaky"));
            }
            Ok(vec![1.0, 0.0])
        }

        fn dimension(&self) -> usize {
            2
        }

        fn id(&self) -> EmbedderId {
            EmbedderId::Mock
        }

        fn model(&self) -> &str {
            "flaky"
        }
    }

    fn fast(inner: Arc<dyn Embedder>) -> RetryingEmbedder {
        RetryingEmbedder::new(inner)
            .with_initial_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(2))
    }

    #[tokio::test]
    async fn test_retry_passthrough() {
        let retry = fast(Arc::new(MockEmbedder::new(4)));
        assert_eq!(retry.embed("hello").await.unwrap().len(), 4);
        assert_eq!(retry.dimension(), 4);
        assert_eq!(retry.model(), "mock");
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient() {
        let flaky = Arc::new(FlakyEmbedder::new(2, EmbedErrorKind::Transient));
        let retry = fast(flaky.clone());

        let vector = retry.embed("x").await.unwrap();
        assert_eq!(vector, vec![1.0, 0.0]);
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up() {
        let flaky = Arc::new(FlakyEmbedder::new(10, EmbedErrorKind::Transient));
        let retry = fast(flaky.clone()).with_max_retries(2);

        let err = retry.embed("x").await.unwrap_err();
        assert_eq!(err.embed_kind(), Some(EmbedErrorKind::Transient));
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_no_retry_on_auth() {
        let flaky = Arc::new(FlakyEmbedder::new(1, EmbedErrorKind::Auth));
        let retry = fast(flaky.clone());

        let err = retry.embed("x").await.unwrap_err();
        assert_eq!(err.embed_kind(), Some(EmbedErrorKind::Auth));
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_retry_builder() {
        let retry = RetryingEmbedder::new(Arc::new(MockEmbedder::new(4)))
            .with_max_retries(5)
            .with_initial_delay(Duration::from_millis(250))
            .with_max_delay(Duration::from_secs(30));

        assert_eq!(retry.max_retries, 5);
        assert_eq!(retry.initial_delay, Duration::from_millis(250));
        assert_eq!(retry.max_delay, Duration::from_secs(30));
    }
}
