use async_trait::async_trait;
use futures_util::future::BoxFuture;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use openbroker_core::OperationKind;

/// Everything the runtime needs to launch one automation-bundle job.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub kind: OperationKind,
    pub resource_id: Uuid,
    pub namespace: String,
    pub spec_id: String,
    pub plan_id: String,
    pub payload: JsonValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Succeeded { output: Option<JsonValue> },
    Failed { cause: String },
    StillRunning,
}

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("runtime rejected job: {0}")]
    Rejected(String),
}

/// Handle on a launched job; resolves once the runtime reports a result.
pub struct JobHandle {
    outcome: BoxFuture<'static, JobOutcome>,
}

impl JobHandle {
    pub fn new(outcome: BoxFuture<'static, JobOutcome>) -> Self {
        Self { outcome }
    }

    /// Handle that is already resolved; useful for runtimes whose work
    /// completes within the launch call.
    pub fn ready(outcome: JobOutcome) -> Self {
        Self {
            outcome: Box::pin(async move { outcome }),
        }
    }

    pub async fn outcome(self) -> JobOutcome {
        self.outcome.await
    }
}

/// The cluster runtime that actually executes automation bundles. Opaque to
/// the broker: launch a job, await its outcome.
#[async_trait]
pub trait BundleRuntime: Send + Sync {
    async fn launch(&self, job: JobRequest) -> Result<JobHandle, RuntimeError>;
}

/// Stand-in runtime: every job succeeds immediately and echoes its payload
/// as output. Used by the CLI when no real runtime is wired up, and by
/// tests.
pub struct DemoRuntime;

#[async_trait]
impl BundleRuntime for DemoRuntime {
    async fn launch(&self, job: JobRequest) -> Result<JobHandle, RuntimeError> {
        Ok(JobHandle::ready(JobOutcome::Succeeded {
            output: Some(job.payload),
        }))
    }
}
