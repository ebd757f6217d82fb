//! Job submission and status polling.
//!
//! # Design
//! - A job is started once, then polled until it leaves `in_progress`.
//! - The next poll is scheduled only after the previous response was handled; polls never overlap.
//! - Chains are keyed by job id; watching the same id again cancels the stale chain.
//! - Only `completed` with a message raises the shared flash; `failed` never does.
//! - A failed poll ends its chain and is returned to the caller, never retried here.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use autocompose_api_models::{JobFile, JobId, JobStatus, JobStatusReport, StartJobRequest};
use tracing::{debug, error, info, trace, warn};

use crate::core::clock::Timer;
use crate::core::error::{ApiError, JobRunError};
use crate::core::flash::{FlashCategory, FlashSink};

/// Server-side job kinds exposed as buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JobAction {
    /// Copy generated files to the mounted output volume.
    SaveToLocal,
    /// Commit generated files to the configured GitHub repository.
    UploadToGithub,
}

impl JobAction {
    /// Path segment of the start endpoint, used verbatim as `/{segment}`.
    #[must_use]
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::SaveToLocal => "save_to_local",
            Self::UploadToGithub => "upload_to_github",
        }
    }

    /// Human label used in alerts.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SaveToLocal => "save to local",
            Self::UploadToGithub => "GitHub upload",
        }
    }

    /// Every action, in button order.
    #[must_use]
    pub const fn all() -> [Self; 2] {
        [Self::SaveToLocal, Self::UploadToGithub]
    }
}

/// Network seam for job endpoints.
#[async_trait(?Send)]
pub trait JobApi {
    /// Start a job and return its id.
    async fn start_job(
        &self,
        action: JobAction,
        request: &StartJobRequest,
    ) -> Result<JobId, ApiError>;

    /// Fetch the current status of a job.
    async fn job_status(&self, job_id: &JobId) -> Result<JobStatusReport, ApiError>;
}

/// Receives every status report of a watched job.
pub trait JobObserver {
    /// Job still running; another poll follows.
    fn on_in_progress(&self, report: &JobStatusReport);
    /// Job finished successfully.
    fn on_completed(&self, report: &JobStatusReport);
    /// Job finished with an error.
    fn on_failed(&self, report: &JobStatusReport);
    /// Unknown status; polling stops.
    fn on_unrecognized(&self, report: &JobStatusReport) {
        let _ = report;
    }
}

/// How a poll chain ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Terminal `completed` report.
    Completed(JobStatusReport),
    /// Terminal `failed` report.
    Failed(JobStatusReport),
    /// Terminal report with an unknown status.
    Unrecognized(JobStatusReport),
    /// The chain was cancelled before reaching a terminal report.
    Cancelled,
}

/// Stop handle for a poll chain.
#[derive(Clone, Debug, Default)]
pub struct PollHandle {
    cancelled: Rc<Cell<bool>>,
}

impl PollHandle {
    /// Stop the chain; no further requests or observer calls happen.
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    /// Whether [`PollHandle::cancel`] was called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    fn same_chain(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cancelled, &other.cancelled)
    }
}

/// A registered poll chain waiting to be driven.
#[derive(Debug)]
pub struct JobWatch {
    job_id: JobId,
    handle: PollHandle,
}

impl JobWatch {
    /// Stop handle for this chain.
    #[must_use]
    pub fn handle(&self) -> PollHandle {
        self.handle.clone()
    }
}

/// Text and class for a job's inline status element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusLine {
    /// Text content.
    pub text: String,
    /// Class added for terminal states.
    pub class: Option<&'static str>,
}

/// Map a status report onto the inline status element.
#[must_use]
pub fn status_line(report: &JobStatusReport) -> StatusLine {
    let message = report
        .message
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty());
    let (fallback, class) = match report.status {
        JobStatus::InProgress => ("Working…", None),
        JobStatus::Completed => ("Done", Some("success")),
        JobStatus::Failed => ("Failed", Some("error")),
        JobStatus::Unrecognized(_) => ("Unknown job status", None),
    };
    StatusLine {
        text: message.unwrap_or(fallback).to_string(),
        class,
    }
}

/// Drives jobs from submission to a terminal status.
pub struct JobPoller<A, T, F> {
    api: A,
    timer: T,
    flash: F,
    interval: Duration,
    active: RefCell<HashMap<JobId, PollHandle>>,
}

impl<A, T, F> JobPoller<A, T, F>
where
    A: JobApi,
    T: Timer,
    F: FlashSink,
{
    /// Build a poller that waits `interval` between a response and the next poll.
    #[must_use]
    pub fn new(api: A, timer: T, flash: F, interval: Duration) -> Self {
        Self {
            api,
            timer,
            flash,
            interval,
            active: RefCell::new(HashMap::new()),
        }
    }

    /// Start a job.
    ///
    /// # Errors
    /// Propagates transport, status and decode failures; nothing is retried.
    pub async fn initiate_job(
        &self,
        action: JobAction,
        files: &[JobFile],
    ) -> Result<JobId, ApiError> {
        let request = StartJobRequest {
            files: files.to_vec(),
        };
        let action_name = action.path_segment();
        match self.api.start_job(action, &request).await {
            Ok(job_id) => {
                info!(action = action_name, job_id = %job_id, files = files.len(), "job started");
                Ok(job_id)
            }
            Err(err) => {
                error!(action = action_name, error = %err, detail = %err.user_message(), "job start failed");
                Err(err)
            }
        }
    }

    /// Register a poll chain for `job_id`, cancelling any chain already watching it.
    #[must_use]
    pub fn watch(&self, job_id: JobId) -> JobWatch {
        let handle = PollHandle::default();
        let stale = self
            .active
            .borrow_mut()
            .insert(job_id.clone(), handle.clone());
        if let Some(stale) = stale {
            stale.cancel();
            debug!(job_id = %job_id, "cancelled stale poll chain");
        }
        JobWatch { job_id, handle }
    }

    /// Cancel the chain watching `job_id`.
    pub fn cancel(&self, job_id: &JobId) -> bool {
        let removed = self.active.borrow_mut().remove(job_id);
        removed.is_some_and(|handle| {
            handle.cancel();
            true
        })
    }

    /// Cancel every chain, returning how many were running.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<PollHandle> = self.active.borrow_mut().drain().map(|(_, h)| h).collect();
        for handle in &drained {
            handle.cancel();
        }
        drained.len()
    }

    /// Number of chains currently registered.
    #[must_use]
    pub fn active_jobs(&self) -> usize {
        self.active.borrow().len()
    }

    /// Poll until the job reports a terminal status or the chain is cancelled.
    ///
    /// # Errors
    /// A failed status request ends the chain and is returned as-is.
    pub async fn poll_job_status<O>(
        &self,
        watch: JobWatch,
        observer: &O,
    ) -> Result<PollOutcome, ApiError>
    where
        O: JobObserver + ?Sized,
    {
        let result = self.drive(&watch, observer).await;
        self.release(watch);
        result
    }

    /// Start a job and poll it to completion.
    ///
    /// # Errors
    /// [`JobRunError::Start`] when the job could not be created,
    /// [`JobRunError::Poll`] when a status request failed.
    pub async fn run<O>(
        &self,
        action: JobAction,
        files: &[JobFile],
        observer: &O,
    ) -> Result<PollOutcome, JobRunError>
    where
        O: JobObserver + ?Sized,
    {
        let job_id = self
            .initiate_job(action, files)
            .await
            .map_err(|source| JobRunError::Start { source })?;
        let watch = self.watch(job_id);
        self.poll_job_status(watch, observer)
            .await
            .map_err(|source| JobRunError::Poll { source })
    }

    /// Drive one chain. A `completed` report flashes when its message is a
    /// non-empty string; whitespace counts as content.
    async fn drive<O>(&self, watch: &JobWatch, observer: &O) -> Result<PollOutcome, ApiError>
    where
        O: JobObserver + ?Sized,
    {
        let job_id = &watch.job_id;
        let mut polls: u32 = 0;
        loop {
            if watch.handle.is_cancelled() {
                debug!(job_id = %job_id, polls, "poll chain cancelled");
                return Ok(PollOutcome::Cancelled);
            }
            let report = self.api.job_status(job_id).await.inspect_err(|err| {
                warn!(job_id = %job_id, polls, error = %err, "job status poll failed; chain stopped");
            })?;
            polls = polls.saturating_add(1);
            if watch.handle.is_cancelled() {
                debug!(job_id = %job_id, polls, "poll chain cancelled");
                return Ok(PollOutcome::Cancelled);
            }
            trace!(job_id = %job_id, polls, status = report.status.as_str(), "job status");

            match &report.status {
                JobStatus::InProgress => {
                    observer.on_in_progress(&report);
                    self.timer.sleep(self.interval).await;
                }
                JobStatus::Completed => {
                    observer.on_completed(&report);
                    if let Some(message) = report
                        .message
                        .as_deref()
                        .filter(|text| !text.is_empty())
                    {
                        self.flash
                            .flash(message, FlashCategory::parse(report.category.as_deref()));
                    }
                    info!(job_id = %job_id, polls, "job completed");
                    return Ok(PollOutcome::Completed(report));
                }
                JobStatus::Failed => {
                    observer.on_failed(&report);
                    info!(job_id = %job_id, polls, "job failed");
                    return Ok(PollOutcome::Failed(report));
                }
                JobStatus::Unrecognized(raw) => {
                    warn!(job_id = %job_id, status = raw.as_str(), "unrecognized job status; polling stopped");
                    observer.on_unrecognized(&report);
                    return Ok(PollOutcome::Unrecognized(report));
                }
            }
        }
    }

    fn release(&self, watch: JobWatch) {
        let JobWatch { job_id, handle } = watch;
        let mut active = self.active.borrow_mut();
        if active
            .get(&job_id)
            .is_some_and(|current| current.same_chain(&handle))
        {
            active.remove(&job_id);
        }
    }
}
