//! Kind-specific pipelines and the runner that executes one phase.
//!
//! A phase is one external generation call, wrapped (outermost first) in the
//! hard deadline, then the retry policy. The deadline covers the backoff and
//! the retry, so a phase never outlives its ceiling.

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use shopreel_generation::{GeneratedMedia, GenerationClient, GenerationError, GenerationRequest};

use super::deadline::Deadline;
use super::retry::{with_retry, RetryPolicy};
use super::types::{JobId, ResolvedInput, SinglePhaseInput, TwoPhaseInput};

/// An ordered step inside a pipeline. Not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The only call of a single-phase pipeline.
    Generate,
    /// Hero still of the two-phase pipeline.
    StillImage,
    /// Image-to-video call fed with the still.
    Animate,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Generate => "generate",
            Phase::StillImage => "still_image",
            Phase::Animate => "animate",
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Phase::Generate => "generation failed",
            Phase::StillImage => "still image generation failed",
            Phase::Animate => "video animation failed",
        }
    }
}

/// A phase that ended without media. Its message becomes the job's error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {source}", .phase.describe())]
pub struct PhaseError {
    pub phase: Phase,
    pub source: GenerationError,
}

/// Executes phases of a single job against the provider.
pub struct PhaseRunner<'a> {
    client: &'a dyn GenerationClient,
    retry: RetryPolicy,
    deadline: Deadline,
    job_id: JobId,
}

impl<'a> PhaseRunner<'a> {
    pub fn new(
        client: &'a dyn GenerationClient,
        retry: RetryPolicy,
        deadline: Deadline,
        job_id: JobId,
    ) -> Self {
        Self {
            client,
            retry,
            deadline,
            job_id,
        }
    }

    /// Run one phase to non-empty media or a terminal error.
    pub async fn run(
        &self,
        phase: Phase,
        request: &GenerationRequest,
    ) -> Result<GeneratedMedia, PhaseError> {
        let client = self.client;
        let retry = &self.retry;

        let outcome = self
            .deadline
            .run(|cancel| async move {
                let cancel = &cancel;
                with_retry(retry, phase.as_str(), move || client.generate(request, cancel)).await
            })
            .await
            .unwrap_or_else(|exceeded| Err(GenerationError::DeadlineExceeded(exceeded.0)));

        let result = match outcome {
            Ok(media) if media.is_empty() => Err(GenerationError::EmptyMedia),
            other => other,
        };

        result.map_err(|source| {
            warn!(
                job_id = %self.job_id,
                phase = phase.as_str(),
                timeout = source.is_timeout(),
                error = %source,
                "phase failed"
            );
            PhaseError { phase, source }
        })
    }
}

/// The phases of one job kind.
#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn run_phases(&self, runner: &PhaseRunner<'_>) -> Result<GeneratedMedia, PhaseError>;
}

#[async_trait]
impl Pipeline for SinglePhaseInput {
    async fn run_phases(&self, runner: &PhaseRunner<'_>) -> Result<GeneratedMedia, PhaseError> {
        runner.run(Phase::Generate, &self.request).await
    }
}

#[async_trait]
impl Pipeline for TwoPhaseInput {
    async fn run_phases(&self, runner: &PhaseRunner<'_>) -> Result<GeneratedMedia, PhaseError> {
        let still = runner.run(Phase::StillImage, &self.still).await?;

        let mut motion = self.motion.clone();
        motion.options.reference_image = Some(still.into());

        runner.run(Phase::Animate, &motion).await
    }
}

impl ResolvedInput {
    pub fn pipeline(&self) -> &dyn Pipeline {
        match self {
            ResolvedInput::ScenePhoto(input)
            | ResolvedInput::CharacterVideo(input)
            | ResolvedInput::TemplatedVideo(input) => input,
            ResolvedInput::ShopVideo(input) => input,
        }
    }
}
