//! Job orchestrator: submission, background execution and status reads.
//!
//! `submit` persists a pending job and hands its id to a dispatcher task;
//! it never waits on the provider. The dispatcher runs every execution in
//! its own supervised task, so a panic still ends in a `failed` record.
//! The job store stays the single source of truth; callers only learn
//! outcomes by reading it back through `get_status`.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use shopreel_core::{TenantId, UserId};
use shopreel_generation::GenerationClient;

use crate::assets::AssetStore;
use crate::config::OrchestratorConfig;
use crate::content::catalog::Catalog;
use crate::requests::{ResolveError, ResolveInput};

use super::deadline::Deadline;
use super::pipeline::PhaseRunner;
use super::store::{JobStore, JobStoreError};
use super::types::{Job, JobId, JobPatch, JobStatus, JobSuccess, ResolvedInput};
use super::view::{JobHandle, JobView};

/// Error recorded when an execution task panics.
pub const PANIC_REASON: &str = "internal error: execution panicked";

pub const DEFAULT_LIST_LIMIT: usize = 20;
pub const MAX_LIST_LIMIT: usize = 100;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Store(#[from] JobStoreError),
}

/// Collaborators shared by every execution.
#[derive(Clone)]
pub struct ExecutionContext {
    pub store: Arc<dyn JobStore>,
    pub client: Arc<dyn GenerationClient>,
    pub assets: Arc<dyn AssetStore>,
    pub config: OrchestratorConfig,
}

/// Orchestrator runtime counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrchestratorStats {
    pub submitted: u64,
    pub completed: u64,
    pub failed: u64,
    pub running: usize,
}

type SharedStats = Arc<Mutex<OrchestratorStats>>;

fn with_stats(stats: &SharedStats, f: impl FnOnce(&mut OrchestratorStats)) {
    let mut guard = stats.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard);
}

/// Front door of the job system. Cheap to clone.
#[derive(Clone)]
pub struct JobOrchestrator {
    store: Arc<dyn JobStore>,
    queue: mpsc::UnboundedSender<JobId>,
    stats: SharedStats,
}

/// Handle to control the background dispatcher.
#[derive(Debug)]
pub struct OrchestratorHandle {
    shutdown: CancellationToken,
    join: Option<JoinHandle<()>>,
    stats: SharedStats,
}

impl OrchestratorHandle {
    /// Stop accepting work and wait for in-flight executions to finish.
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(join) = self.join.take() {
            if let Err(e) = join.await {
                error!(error = %e, "job dispatcher terminated abnormally");
            }
        }
    }

    pub fn stats(&self) -> OrchestratorStats {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl JobOrchestrator {
    /// Start the dispatcher on the current tokio runtime.
    pub fn spawn(ctx: ExecutionContext) -> (Self, OrchestratorHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let stats = SharedStats::default();

        let join = tokio::spawn(dispatch_loop(
            Arc::new(ctx.clone()),
            rx,
            shutdown.clone(),
            stats.clone(),
        ));

        let orchestrator = Self {
            store: ctx.store,
            queue: tx,
            stats: stats.clone(),
        };
        let handle = OrchestratorHandle {
            shutdown,
            join: Some(join),
            stats,
        };
        (orchestrator, handle)
    }

    /// Create a pending job for an already resolved input and schedule it.
    ///
    /// Returns as soon as the record exists. A scheduling failure is logged
    /// and leaves the job pending; it is not reported to the caller.
    pub async fn submit(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        input: ResolvedInput,
    ) -> Result<JobHandle, OrchestratorError> {
        let job = self.store.create(Job::new(tenant_id, user_id, input)).await?;
        with_stats(&self.stats, |s| s.submitted += 1);
        info!(job_id = %job.id, tenant_id = %tenant_id, kind = %job.kind, "job submitted");

        self.schedule(job.id);
        Ok(JobHandle::from_job(&job))
    }

    /// Resolve `request` against `catalog`, then submit it.
    ///
    /// Resolution errors surface before any job is created.
    pub async fn submit_request(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        request: &dyn ResolveInput,
        catalog: &dyn Catalog,
    ) -> Result<JobHandle, OrchestratorError> {
        let input = request.resolve(catalog)?;
        self.submit(tenant_id, user_id, input).await
    }

    fn schedule(&self, job_id: JobId) {
        if let Err(e) = self.queue.send(job_id) {
            error!(job_id = %job_id, error = %e, "failed to schedule job execution");
        }
    }

    /// Current view of a job owned by `tenant_id`. Pure read.
    pub async fn get_status(
        &self,
        tenant_id: TenantId,
        job_id: JobId,
    ) -> Result<JobView, OrchestratorError> {
        let job = self
            .store
            .find_by_id(tenant_id, job_id)
            .await?
            .ok_or(OrchestratorError::NotFound(job_id))?;
        Ok(JobView::project(&job, Utc::now()))
    }

    /// Most recent jobs of a tenant, newest first. `limit` is capped at 100.
    pub async fn list(
        &self,
        tenant_id: TenantId,
        limit: usize,
    ) -> Result<Vec<JobView>, OrchestratorError> {
        let now = Utc::now();
        let jobs = self
            .store
            .list_recent(tenant_id, limit.clamp(1, MAX_LIST_LIMIT))
            .await?;
        Ok(jobs.iter().map(|job| JobView::project(job, now)).collect())
    }

    pub fn stats(&self) -> OrchestratorStats {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

async fn dispatch_loop(
    ctx: Arc<ExecutionContext>,
    mut rx: mpsc::UnboundedReceiver<JobId>,
    shutdown: CancellationToken,
    stats: SharedStats,
) {
    info!("job dispatcher started");
    let mut running = JoinSet::new();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            next = rx.recv() => match next {
                Some(job_id) => {
                    running.spawn(supervise(ctx.clone(), job_id, stats.clone()));
                }
                None => break,
            },
            Some(_) = running.join_next(), if !running.is_empty() => {}
        }
    }

    // Jobs accepted before shutdown still run; nothing new gets in.
    rx.close();
    while let Ok(job_id) = rx.try_recv() {
        running.spawn(supervise(ctx.clone(), job_id, stats.clone()));
    }

    let draining = running.len();
    if draining > 0 {
        info!(in_flight = draining, "draining job executions");
    }
    while running.join_next().await.is_some() {}
    info!("job dispatcher stopped");
}

/// Run one execution in its own task and contain panics.
async fn supervise(ctx: Arc<ExecutionContext>, job_id: JobId, stats: SharedStats) {
    with_stats(&stats, |s| s.running += 1);

    let terminal = match tokio::spawn(execute(ctx.clone(), job_id)).await {
        Ok(terminal) => terminal,
        Err(e) => {
            error!(job_id = %job_id, error = %e, "job execution panicked");
            record_failure(ctx.store.as_ref(), job_id, PANIC_REASON.to_string()).await
        }
    };

    with_stats(&stats, |s| {
        s.running = s.running.saturating_sub(1);
        match terminal {
            Some(JobStatus::Completed) => s.completed += 1,
            Some(JobStatus::Failed) => s.failed += 1,
            _ => {}
        }
    });
}

/// Drive a job to a terminal state. Returns the recorded terminal status,
/// or `None` if the job was skipped or could not be finalized.
async fn execute(ctx: Arc<ExecutionContext>, job_id: JobId) -> Option<JobStatus> {
    let job = match ctx.store.update(job_id, JobPatch::Start { at: Utc::now() }).await {
        Ok(job) => job,
        Err(JobStoreError::NotFound(_) | JobStoreError::InvalidTransition(_)) => {
            debug!(job_id = %job_id, "job missing or already started; skipping");
            return None;
        }
        Err(e) => {
            error!(job_id = %job_id, error = %e, "failed to start job");
            return None;
        }
    };

    let span = info_span!(
        "job",
        job_id = %job.id,
        tenant_id = %job.tenant_id,
        kind = %job.kind
    );
    async move {
        debug!("job execution started");
        let patch = match run(&ctx, &job).await {
            Ok(result) => JobPatch::Complete {
                at: Utc::now(),
                result,
            },
            Err(reason) => JobPatch::Fail {
                at: Utc::now(),
                reason,
            },
        };

        let completing = matches!(patch, JobPatch::Complete { .. });
        match ctx.store.update(job.id, patch).await {
            Ok(done) => {
                info!(status = %done.status, error = done.error(), "job finished");
                Some(done.status)
            }
            Err(e) if completing => {
                warn!(error = %e, "failed to record job result");
                record_failure(
                    ctx.store.as_ref(),
                    job.id,
                    format!("failed to record result: {e}"),
                )
                .await
            }
            Err(e) => {
                error!(error = %e, "failed to record job failure; job left processing");
                None
            }
        }
    }
    .instrument(span)
    .await
}

/// Pipeline plus upload. The error is the job's human-readable reason.
async fn run(ctx: &ExecutionContext, job: &Job) -> Result<JobSuccess, String> {
    let runner = PhaseRunner::new(
        ctx.client.as_ref(),
        ctx.config.retry_policy(),
        Deadline::new(ctx.config.hard_timeout),
        job.id,
    );
    let media = job
        .payload
        .input
        .pipeline()
        .run_phases(&runner)
        .await
        .map_err(|e| e.to_string())?;

    let logical_id = job.id.to_string();
    let stored = Deadline::new(ctx.config.upload_timeout)
        .run(|_| ctx.assets.save(&media, job.tenant_id, &logical_id))
        .await
        .map_err(|exceeded| format!("asset upload timed out after {}s", exceeded.0.as_secs()))?
        .map_err(|e| format!("asset upload failed: {e}"))?;

    Ok(JobSuccess {
        result_url: stored.url,
        mime_type: media.mime_type,
        caption: job.payload.input.caption().map(str::to_owned),
        metadata: media.metadata,
    })
}

async fn record_failure(store: &dyn JobStore, job_id: JobId, reason: String) -> Option<JobStatus> {
    match store
        .update(job_id, JobPatch::Fail {
            at: Utc::now(),
            reason,
        })
        .await
    {
        Ok(job) => {
            info!(job_id = %job_id, status = %job.status, error = job.error(), "job finished");
            Some(job.status)
        }
        Err(e) => {
            error!(job_id = %job_id, error = %e, "failed to record job failure; job left processing");
            None
        }
    }
}
