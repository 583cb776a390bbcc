//! Bounded poll loop for asynchronous providers.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::{GenerationClient, OperationClient, OperationHandle, OperationStatus};
use crate::error::GenerationError;
use crate::media::GeneratedMedia;
use crate::request::GenerationRequest;

/// Poll cadence and budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_attempts: 45,
        }
    }
}

/// Adapts an [`OperationClient`] into a [`GenerationClient`].
///
/// The operation is polled every `interval`; after `max_attempts` checks
/// without a terminal answer the call fails with
/// [`GenerationError::PollTimeout`].
#[derive(Debug, Clone)]
pub struct PollingClient<C> {
    inner: C,
    config: PollConfig,
}

impl<C: OperationClient> PollingClient<C> {
    pub fn new(inner: C, config: PollConfig) -> Self {
        Self { inner, config }
    }

    pub fn config(&self) -> PollConfig {
        self.config
    }
}

/// Tells the provider an operation was abandoned unless it reached a
/// terminal answer. Runs on every early exit, including the future being
/// dropped by an outer deadline.
struct AbandonOnDrop<'a, C: OperationClient> {
    client: &'a C,
    handle: &'a OperationHandle,
    finished: bool,
}

impl<C: OperationClient> Drop for AbandonOnDrop<'_, C> {
    fn drop(&mut self) {
        if !self.finished {
            debug!(operation = %self.handle, "abandoning provider operation");
            self.client.abandon_operation(self.handle);
        }
    }
}

#[async_trait]
impl<C: OperationClient> GenerationClient for PollingClient<C> {
    async fn generate(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<GeneratedMedia, GenerationError> {
        let handle = self.inner.start_operation(request).await?;
        debug!(operation = %handle, output = ?request.output, "provider operation started");
        let mut guard = AbandonOnDrop {
            client: &self.inner,
            handle: &handle,
            finished: false,
        };

        for attempt in 1..=self.config.max_attempts {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(operation = %handle, attempt, "polling cancelled");
                    return Err(GenerationError::Cancelled);
                }
                _ = tokio::time::sleep(self.config.interval) => {}
            }

            let status = self.inner.poll_operation(&handle).await?;
            if !matches!(status, OperationStatus::Running) {
                guard.finished = true;
            }
            match status {
                OperationStatus::Running => continue,
                OperationStatus::Done(media) if media.is_empty() => {
                    return Err(GenerationError::EmptyMedia);
                }
                OperationStatus::Done(media) => {
                    debug!(operation = %handle, attempt, "provider operation finished");
                    return Ok(media);
                }
                OperationStatus::Failed(msg) => return Err(GenerationError::Provider(msg)),
            }
        }

        warn!(
            operation = %handle,
            attempts = self.config.max_attempts,
            "provider operation exceeded poll budget"
        );
        Err(GenerationError::PollTimeout {
            attempts: self.config.max_attempts,
        })
    }
}
