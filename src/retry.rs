//! Retry decorator for a [`Synthesizer`].
//!
//! Applies `vits.retry_count` around single-attempt synthesis. Only transport and
//! server errors are retried.

use std::time::Duration;

use async_trait::async_trait;

use crate::client::Synthesizer;
use crate::error::Result;
use crate::logging::{LogSink, LOG_SOURCE};
use crate::types::{AudioFile, SynthesisRequest};

/// Default pause between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Wraps a synthesizer and retries retryable failures.
pub struct RetryingSynthesizer<S> {
    inner: S,
    retries: u32,
    delay: Duration,
}

impl<S: Synthesizer> RetryingSynthesizer<S> {
    /// Retry up to `retries` extra times.
    pub fn new(inner: S, retries: u32) -> Self {
        Self {
            inner,
            retries,
            delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Set the pause between attempts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// The wrapped synthesizer.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: Synthesizer> Synthesizer for RetryingSynthesizer<S> {
    async fn try_synthesize(
        &self,
        api_url: &str,
        request: &SynthesisRequest,
        log: &dyn LogSink,
    ) -> Result<AudioFile> {
        let mut attempt = 0;
        loop {
            match self.inner.try_synthesize(api_url, request, log).await {
                Ok(file) => return Ok(file),
                Err(err) if err.is_retryable() && attempt < self.retries => {
                    attempt += 1;
                    log.log_warning(
                        LOG_SOURCE,
                        &format!(
                            "VITS call failed ({}), retrying ({}/{})",
                            err, attempt, self.retries
                        ),
                    );
                    if !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }
}
