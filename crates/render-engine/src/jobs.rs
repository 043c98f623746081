//! Background render jobs that callers poll for status.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

use reelforge_common::error::{ReelError, ReelResult};
use reelforge_project_model::new_id;

use crate::export::{ExportJob, ExportProgress, FfmpegBackend, RenderBackend};

pub type JobId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Running,
    Done,
    Error,
}

/// Snapshot of one job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobStatus {
    pub state: JobState,
    /// Always within [0.0, 1.0]; 1.0 once done.
    pub progress: f64,
    pub output: Option<PathBuf>,
    pub error: Option<String>,
}

impl JobStatus {
    fn queued() -> Self {
        Self {
            state: JobState::Queued,
            progress: 0.0,
            output: None,
            error: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, JobState::Done | JobState::Error)
    }
}

type StatusMap = Arc<Mutex<HashMap<JobId, JobStatus>>>;

fn lock(map: &StatusMap) -> MutexGuard<'_, HashMap<JobId, JobStatus>> {
    map.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Handle given to a running task for progress updates.
#[derive(Clone)]
pub struct JobContext {
    id: JobId,
    statuses: StatusMap,
}

impl JobContext {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn report(&self, progress: f64) {
        let progress = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
        if let Some(status) = lock(&self.statuses).get_mut(&self.id) {
            if status.state == JobState::Running {
                status.progress = progress;
            }
        }
    }
}

pub type JobTask = Box<dyn FnOnce(JobContext) -> ReelResult<PathBuf> + Send + 'static>;

/// Submit work, poll status later.
pub trait JobStore: Send + Sync {
    fn submit(&self, task: JobTask) -> JobId;

    fn poll(&self, id: &str) -> Option<JobStatus>;
}

/// Job registry held in memory; one detached thread per job.
///
/// Nothing is queued, limited, or cancellable. Statuses live until the
/// store is dropped.
#[derive(Clone, Default)]
pub struct InMemoryJobStore {
    statuses: StatusMap,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.statuses).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn set(&self, id: &str, update: impl FnOnce(&mut JobStatus)) {
        if let Some(status) = lock(&self.statuses).get_mut(id) {
            update(status);
        }
    }
}

impl JobStore for InMemoryJobStore {
    fn submit(&self, task: JobTask) -> JobId {
        let id = new_id();
        lock(&self.statuses).insert(id.clone(), JobStatus::queued());

        let store = self.clone();
        let job_id = id.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("reelforge-job-{id}"))
            .spawn(move || {
                store.set(&job_id, |s| s.state = JobState::Running);
                tracing::info!(job = %job_id, "Job started");
                let ctx = JobContext {
                    id: job_id.clone(),
                    statuses: Arc::clone(&store.statuses),
                };
                let outcome = catch_unwind(AssertUnwindSafe(|| task(ctx))).unwrap_or_else(|payload| {
                    Err(ReelError::render(panic_message(payload.as_ref())))
                });
                match outcome {
                    Ok(output) => {
                        tracing::info!(job = %job_id, output = %output.display(), "Job finished");
                        store.set(&job_id, |s| {
                            s.state = JobState::Done;
                            s.progress = 1.0;
                            s.output = Some(output);
                        });
                    }
                    Err(e) => {
                        tracing::error!(job = %job_id, error = %e, "Job failed");
                        store.set(&job_id, |s| {
                            s.state = JobState::Error;
                            s.error = Some(e.to_string());
                        });
                    }
                }
            });

        if let Err(e) = spawned {
            tracing::error!(job = %id, error = %e, "Failed to spawn job thread");
            self.set(&id, |s| {
                s.state = JobState::Error;
                s.error = Some(format!("failed to spawn job thread: {e}"));
            });
        }
        id
    }

    fn poll(&self, id: &str) -> Option<JobStatus> {
        lock(&self.statuses).get(id).cloned()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown cause".to_string());
    format!("job panicked: {detail}")
}

/// Wrap an export job as a task that reports render progress.
pub fn render_task(job: ExportJob) -> JobTask {
    Box::new(move |ctx: JobContext| {
        let mut backend = FfmpegBackend::new();
        if !backend.is_available() {
            return Err(ReelError::unsupported(
                "No supported render backend found (expected ffmpeg in PATH)",
            ));
        }
        let progress_ctx = ctx.clone();
        let report = backend.render(
            &job,
            Some(Box::new(move |p: ExportProgress| progress_ctx.report(p.progress))),
        )?;
        if !report.skipped.is_empty() {
            tracing::warn!(job = %ctx.id(), skipped = report.skipped.len(), "Render skipped clips");
        }
        Ok(report.output)
    })
}
