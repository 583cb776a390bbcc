use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::GenerationError;
use crate::media::GeneratedMedia;
use crate::request::GenerationRequest;

/// A provider that answers one request with media (or an error).
///
/// Implementations must stop work promptly once `cancel` fires; the caller
/// has already given up on the result at that point.
#[async_trait]
pub trait GenerationClient: Send + Sync + 'static {
    async fn generate(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<GeneratedMedia, GenerationError>;
}

#[async_trait]
impl<T> GenerationClient for Arc<T>
where
    T: GenerationClient + ?Sized,
{
    async fn generate(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<GeneratedMedia, GenerationError> {
        (**self).generate(request, cancel).await
    }
}

/// Opaque reference to a long-running provider-side operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationHandle(pub String);

impl std::fmt::Display for OperationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Snapshot of a provider-side operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationStatus {
    Running,
    Done(GeneratedMedia),
    Failed(String),
}

/// A provider that starts an operation and must be polled to completion.
///
/// Wrap it in [`crate::PollingClient`] to get a [`GenerationClient`].
#[async_trait]
pub trait OperationClient: Send + Sync + 'static {
    async fn start_operation(
        &self,
        request: &GenerationRequest,
    ) -> Result<OperationHandle, GenerationError>;

    async fn poll_operation(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationStatus, GenerationError>;

    /// The caller stopped polling `handle` before it finished.
    ///
    /// Called from a drop path, so it must not block. Providers that keep
    /// per-operation state release it here.
    fn abandon_operation(&self, _handle: &OperationHandle) {}
}

#[async_trait]
impl<T> OperationClient for Arc<T>
where
    T: OperationClient + ?Sized,
{
    async fn start_operation(
        &self,
        request: &GenerationRequest,
    ) -> Result<OperationHandle, GenerationError> {
        (**self).start_operation(request).await
    }

    async fn poll_operation(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationStatus, GenerationError> {
        (**self).poll_operation(handle).await
    }

    fn abandon_operation(&self, handle: &OperationHandle) {
        (**self).abandon_operation(handle)
    }
}
