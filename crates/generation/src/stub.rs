//! Deterministic provider for local development and demos.
//!
//! Finishes every operation after a fixed number of polls and returns small
//! placeholder payloads tagged with the prompt, so the full job lifecycle can
//! be exercised without credentials.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::json;

use crate::client::{OperationClient, OperationHandle, OperationStatus};
use crate::error::GenerationError;
use crate::media::{GeneratedMedia, MediaKind};
use crate::request::GenerationRequest;

const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
const MP4_FTYP: &[u8] = &[0, 0, 0, 0x18, b'f', b't', b'y', b'p', b'i', b's', b'o', b'm'];

#[derive(Debug)]
struct PendingOperation {
    request: GenerationRequest,
    polls: u32,
}

#[derive(Debug)]
pub struct StubProvider {
    polls_until_done: u32,
    next_id: AtomicU64,
    operations: Mutex<HashMap<OperationHandle, PendingOperation>>,
}

impl StubProvider {
    pub fn new(polls_until_done: u32) -> Self {
        Self {
            polls_until_done: polls_until_done.max(1),
            next_id: AtomicU64::new(1),
            operations: Mutex::new(HashMap::new()),
        }
    }

    /// Operations started and not yet finished or abandoned.
    pub fn pending(&self) -> usize {
        self.operations.lock().unwrap().len()
    }

    fn render(request: &GenerationRequest) -> GeneratedMedia {
        let (mime, header) = match request.output {
            MediaKind::Image => ("image/png", PNG_SIGNATURE),
            MediaKind::Video => ("video/mp4", MP4_FTYP),
        };
        let mut bytes = header.to_vec();
        bytes.extend_from_slice(request.prompt.as_bytes());

        GeneratedMedia::new(request.output, mime, bytes).with_metadata(json!({
            "provider": "stub",
            "aspect_ratio": request.options.aspect_ratio.as_str(),
            "duration_seconds": request.options.duration_seconds,
            "from_reference_image": request.options.reference_image.is_some(),
        }))
    }
}

impl Default for StubProvider {
    fn default() -> Self {
        Self::new(3)
    }
}

#[async_trait]
impl OperationClient for StubProvider {
    async fn start_operation(
        &self,
        request: &GenerationRequest,
    ) -> Result<OperationHandle, GenerationError> {
        if request.prompt.trim().is_empty() {
            return Err(GenerationError::provider("invalid argument: empty prompt"));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let handle = OperationHandle(format!("stub-op-{id}"));
        self.operations.lock().unwrap().insert(
            handle.clone(),
            PendingOperation {
                request: request.clone(),
                polls: 0,
            },
        );
        Ok(handle)
    }

    async fn poll_operation(
        &self,
        handle: &OperationHandle,
    ) -> Result<OperationStatus, GenerationError> {
        let mut ops = self.operations.lock().unwrap();
        let op = ops
            .get_mut(handle)
            .ok_or_else(|| GenerationError::provider(format!("unknown operation: {handle}")))?;

        op.polls += 1;
        if op.polls < self.polls_until_done {
            return Ok(OperationStatus::Running);
        }

        let media = Self::render(&op.request);
        ops.remove(handle);
        Ok(OperationStatus::Done(media))
    }

    fn abandon_operation(&self, handle: &OperationHandle) {
        self.operations.lock().unwrap().remove(handle);
    }
}
