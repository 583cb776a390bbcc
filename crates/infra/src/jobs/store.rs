//! Job record storage.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use shopreel_core::TenantId;

use super::types::{Job, JobId, JobPatch, TransitionError};

/// Durable job record store, the single source of truth for job status.
///
/// All reads are tenant-scoped. `update` is the only mutation and applies a
/// [`JobPatch`] atomically, rejecting transitions the state machine forbids.
#[async_trait]
pub trait JobStore: Send + Sync + 'static {
    /// Persist a freshly created job.
    async fn create(&self, job: Job) -> Result<Job, JobStoreError>;

    /// Apply a status change to a job and return the updated record.
    async fn update(&self, job_id: JobId, patch: JobPatch) -> Result<Job, JobStoreError>;

    /// Get a job by ID. Jobs owned by another tenant are reported as absent.
    async fn find_by_id(&self, tenant_id: TenantId, job_id: JobId)
        -> Result<Option<Job>, JobStoreError>;

    /// Most recent jobs of a tenant, newest first.
    async fn list_recent(&self, tenant_id: TenantId, limit: usize)
        -> Result<Vec<Job>, JobStoreError>;
}

/// Job store error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum JobStoreError {
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error("job already exists: {0}")]
    AlreadyExists(JobId),
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),
    #[error("storage error: {0}")]
    Storage(String),
}

#[async_trait]
impl<S> JobStore for Arc<S>
where
    S: JobStore + ?Sized,
{
    async fn create(&self, job: Job) -> Result<Job, JobStoreError> {
        (**self).create(job).await
    }

    async fn update(&self, job_id: JobId, patch: JobPatch) -> Result<Job, JobStoreError> {
        (**self).update(job_id, patch).await
    }

    async fn find_by_id(
        &self,
        tenant_id: TenantId,
        job_id: JobId,
    ) -> Result<Option<Job>, JobStoreError> {
        (**self).find_by_id(tenant_id, job_id).await
    }

    async fn list_recent(
        &self,
        tenant_id: TenantId,
        limit: usize,
    ) -> Result<Vec<Job>, JobStoreError> {
        (**self).list_recent(tenant_id, limit).await
    }
}

/// In-memory job store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, job: Job) -> Result<Job, JobStoreError> {
        let mut jobs = self.jobs.write().unwrap();
        if jobs.contains_key(&job.id) {
            return Err(JobStoreError::AlreadyExists(job.id));
        }
        jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn update(&self, job_id: JobId, patch: JobPatch) -> Result<Job, JobStoreError> {
        let mut jobs = self.jobs.write().unwrap();
        let job = jobs.get_mut(&job_id).ok_or(JobStoreError::NotFound(job_id))?;
        job.apply(patch)?;
        Ok(job.clone())
    }

    async fn find_by_id(
        &self,
        tenant_id: TenantId,
        job_id: JobId,
    ) -> Result<Option<Job>, JobStoreError> {
        let jobs = self.jobs.read().unwrap();
        Ok(jobs
            .get(&job_id)
            .filter(|job| job.tenant_id == tenant_id)
            .cloned())
    }

    async fn list_recent(
        &self,
        tenant_id: TenantId,
        limit: usize,
    ) -> Result<Vec<Job>, JobStoreError> {
        let jobs = self.jobs.read().unwrap();
        let mut result: Vec<_> = jobs
            .values()
            .filter(|j| j.tenant_id == tenant_id)
            .cloned()
            .collect();

        result.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.0.cmp(&a.id.0)));
        result.truncate(limit);
        Ok(result)
    }
}
