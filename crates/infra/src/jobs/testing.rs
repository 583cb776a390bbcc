//! Scripted provider doubles shared by the job tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use shopreel_generation::{
    GeneratedMedia, GenerationClient, GenerationError, GenerationRequest, MediaKind,
};

#[derive(Debug, Clone)]
pub(crate) enum Step {
    Media(GeneratedMedia),
    Fail(GenerationError),
    /// Never answers (until cancelled).
    Hang,
}

impl Step {
    pub(crate) fn image() -> Self {
        Step::Media(GeneratedMedia::new(MediaKind::Image, "image/png", vec![0x89, b'P', b'N', b'G']))
    }

    pub(crate) fn video() -> Self {
        Step::Media(GeneratedMedia::new(MediaKind::Video, "video/mp4", b"ftypisom".to_vec()))
    }

    pub(crate) fn fail(msg: &str) -> Self {
        Step::Fail(GenerationError::provider(msg))
    }
}

/// Plays back `script` one step per call, then repeats `fallback`.
#[derive(Debug)]
pub(crate) struct ScriptedClient {
    script: Mutex<VecDeque<Step>>,
    fallback: Step,
    calls: AtomicUsize,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedClient {
    pub(crate) fn new(script: Vec<Step>, fallback: Step) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn always(step: Step) -> Arc<Self> {
        Self::new(Vec::new(), step)
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationClient for ScriptedClient {
    async fn generate(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<GeneratedMedia, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match step {
            Step::Media(media) => Ok(media),
            Step::Fail(err) => Err(err),
            Step::Hang => {
                cancel.cancelled().await;
                Err(GenerationError::Cancelled)
            }
        }
    }
}

/// Sends image requests to one client and video requests to another.
#[derive(Debug)]
pub(crate) struct RoutingClient {
    pub(crate) image: Arc<ScriptedClient>,
    pub(crate) video: Arc<ScriptedClient>,
}

#[async_trait]
impl GenerationClient for RoutingClient {
    async fn generate(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<GeneratedMedia, GenerationError> {
        match request.output {
            MediaKind::Image => self.image.generate(request, cancel).await,
            MediaKind::Video => self.video.generate(request, cancel).await,
        }
    }
}
