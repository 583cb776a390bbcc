//! Asynchronous generation jobs.
//!
//! ## Design
//!
//! - Jobs are tenant-scoped; reads for another tenant's job see nothing
//! - Status moves `pending -> processing -> {completed | failed}` and never back
//! - Execution is fire-and-forget from the caller's view and runs at most once per job
//! - Retries happen only around a single provider call, never for a whole job
//! - Every phase runs under a hard deadline that also bounds its retry
//!
//! ## Components
//!
//! - `Job`: record with typed input and outcome payload
//! - `JobStore`: persistence (in-memory, or Postgres behind the `postgres` feature)
//! - `Pipeline`: phases of one job kind, run by a `PhaseRunner`
//! - `JobOrchestrator`: submit / background execution / status reads

pub mod deadline;
pub mod orchestrator;
pub mod pipeline;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod progress;
pub mod retry;
pub mod store;
pub mod types;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use deadline::{Deadline, DeadlineExceeded};
pub use orchestrator::{
    ExecutionContext, JobOrchestrator, OrchestratorError, OrchestratorHandle, OrchestratorStats,
    DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT, PANIC_REASON,
};
pub use pipeline::{Phase, PhaseError, PhaseRunner, Pipeline};
pub use progress::estimate_progress;
pub use retry::{with_retry, RetryPolicy};
pub use store::{InMemoryJobStore, JobStore, JobStoreError};
pub use types::{
    Job, JobId, JobKind, JobOutcome, JobPatch, JobPayload, JobStatus, JobSuccess, ResolvedInput,
    SinglePhaseInput, TransitionError, TwoPhaseInput,
};
pub use view::{JobHandle, JobView};
