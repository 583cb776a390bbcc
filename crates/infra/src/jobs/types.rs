//! Core job types and the job state machine.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use shopreel_core::{DomainError, TenantId, UserId};
use shopreel_generation::GenerationRequest;

/// Unique job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::from_str(s.trim())
            .map(Self)
            .map_err(|e| DomainError::invalid_id(format!("JobId: {e}")))
    }
}

/// Which pipeline a job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    /// Single still photo of a shop scene.
    ScenePhoto,
    /// Shop-photography video: still hero image, then animated into a clip.
    ShopVideo,
    /// Spokesperson character speaking a script.
    CharacterVideo,
    /// Video built from a promo template.
    TemplatedVideo,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::ScenePhoto => "scene-photo",
            JobKind::ShopVideo => "shop-video",
            JobKind::CharacterVideo => "character-video",
            JobKind::TemplatedVideo => "templated-video",
        }
    }

    /// Typical wall-clock time to completion; drives the progress estimate only.
    pub fn expected_duration(&self) -> Duration {
        match self {
            JobKind::ScenePhoto => Duration::from_secs(60),
            JobKind::ShopVideo => Duration::from_secs(300),
            JobKind::CharacterVideo | JobKind::TemplatedVideo => Duration::from_secs(180),
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scene-photo" => Ok(JobKind::ScenePhoto),
            "shop-video" => Ok(JobKind::ShopVideo),
            "character-video" => Ok(JobKind::CharacterVideo),
            "templated-video" => Ok(JobKind::TemplatedVideo),
            other => Err(DomainError::validation(format!("unknown job kind: {other}"))),
        }
    }
}

/// Job execution status.
///
/// Transitions only go `Pending -> Processing -> {Completed | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Created, execution not started yet
    Pending,
    /// Background execution in progress
    Processing,
    /// Finished with a stored result
    Completed,
    /// Finished with an error message
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            other => Err(DomainError::validation(format!("unknown job status: {other}"))),
        }
    }
}

/// Input of a one-call pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SinglePhaseInput {
    pub request: GenerationRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Input of the still-then-animate pipeline.
///
/// `motion` carries no reference image here; phase 2 attaches phase 1's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwoPhaseInput {
    pub still: GenerationRequest,
    pub motion: GenerationRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

/// Fully resolved, immutable input of a job (prompts built, references checked).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ResolvedInput {
    ScenePhoto(SinglePhaseInput),
    ShopVideo(TwoPhaseInput),
    CharacterVideo(SinglePhaseInput),
    TemplatedVideo(SinglePhaseInput),
}

impl ResolvedInput {
    pub fn kind(&self) -> JobKind {
        match self {
            ResolvedInput::ScenePhoto(_) => JobKind::ScenePhoto,
            ResolvedInput::ShopVideo(_) => JobKind::ShopVideo,
            ResolvedInput::CharacterVideo(_) => JobKind::CharacterVideo,
            ResolvedInput::TemplatedVideo(_) => JobKind::TemplatedVideo,
        }
    }

    pub fn caption(&self) -> Option<&str> {
        match self {
            ResolvedInput::ScenePhoto(i)
            | ResolvedInput::CharacterVideo(i)
            | ResolvedInput::TemplatedVideo(i) => i.caption.as_deref(),
            ResolvedInput::ShopVideo(i) => i.caption.as_deref(),
        }
    }
}

/// What a completed job produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSuccess {
    pub result_url: String,
    pub mime_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Provider metadata of the final media.
    #[serde(default)]
    pub metadata: JsonValue,
}

/// Outcome half of the payload; mirrors the status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobOutcome {
    Ongoing,
    Succeeded(JobSuccess),
    Failed { reason: String },
}

/// Kind-specific payload: the input needed to (re)drive execution plus the outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPayload {
    pub input: ResolvedInput,
    pub outcome: JobOutcome,
}

/// A status change requested by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum JobPatch {
    Start { at: DateTime<Utc> },
    Complete { at: DateTime<Utc>, result: JobSuccess },
    Fail { at: DateTime<Utc>, reason: String },
}

impl JobPatch {
    pub fn target(&self) -> JobStatus {
        match self {
            JobPatch::Start { .. } => JobStatus::Processing,
            JobPatch::Complete { .. } => JobStatus::Completed,
            JobPatch::Fail { .. } => JobStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid job transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: JobStatus,
    pub to: JobStatus,
}

/// The unit of trackable work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub kind: JobKind,
    pub status: JobStatus,
    pub total_items: u32,
    pub completed_items: u32,
    pub failed_items: u32,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub payload: JobPayload,
}

impl Job {
    /// Create a new pending job for a single logical unit of work.
    pub fn new(tenant_id: TenantId, user_id: UserId, input: ResolvedInput) -> Self {
        Self {
            id: JobId::new(),
            tenant_id,
            user_id,
            kind: input.kind(),
            status: JobStatus::Pending,
            total_items: 1,
            completed_items: 0,
            failed_items: 0,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            payload: JobPayload {
                input,
                outcome: JobOutcome::Ongoing,
            },
        }
    }

    pub fn result(&self) -> Option<&JobSuccess> {
        match &self.payload.outcome {
            JobOutcome::Succeeded(success) => Some(success),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.payload.outcome {
            JobOutcome::Failed { reason } => Some(reason),
            _ => None,
        }
    }

    /// Apply a status change, enforcing the one-way state machine.
    ///
    /// On error the job is left untouched.
    pub fn apply(&mut self, patch: JobPatch) -> Result<(), TransitionError> {
        let to = patch.target();
        let allowed = matches!(
            (self.status, to),
            (JobStatus::Pending, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
        );
        if !allowed {
            return Err(TransitionError {
                from: self.status,
                to,
            });
        }

        match patch {
            JobPatch::Start { at } => {
                self.started_at = Some(at);
            }
            JobPatch::Complete { at, result } => {
                self.completed_items = self.total_items;
                self.completed_at = Some(at);
                self.payload.outcome = JobOutcome::Succeeded(result);
            }
            JobPatch::Fail { at, reason } => {
                self.failed_items = self.total_items;
                self.completed_at = Some(at);
                self.payload.outcome = JobOutcome::Failed { reason };
            }
        }
        self.status = to;
        Ok(())
    }
}
