//! Generation lifecycle: submit a request, then follow the job to a terminal
//! status.
//!
//! ```text
//! Idle ──► Submitting ──► Polling ──► Completed | Failed
//!   ▲          │
//!   └──────────┘ submission error
//! ```
//!
//! State lives in a `watch` channel. Background tasks (the poll loop and the
//! elapsed ticker) write to it only while their generation epoch is current,
//! so a late response from a superseded job is dropped.

use std::sync::Arc;
use std::time::Duration;

use autoshorts_models::{format_elapsed, GenerationForm, Job, JobId, JobStatus, SelectedClip};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api::JobApi;
use crate::error::{ClientError, ClientResult};
use crate::logging::JobLogger;
use crate::poller::{JobPoller, PollConfig, PollControl, PollEvent};

/// Shown when a submission fails without a server-provided detail.
pub const SUBMIT_FAILED_MESSAGE: &str = "Operation failed";

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationPhase {
    #[default]
    Idle,
    Submitting,
    Polling,
    Completed,
    Failed,
}

/// Observable controller state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationState {
    /// Incremented on every new generation and on cancel
    pub epoch: u64,
    pub phase: GenerationPhase,
    /// True from submission until a terminal status, error or cancel
    pub is_generating: bool,
    /// Latest job snapshot
    pub job: Option<Job>,
    /// Submission or polling error
    pub error: Option<String>,
    pub selected_clip: Option<SelectedClip>,
    /// Locally counted seconds, replaced by the server value when reported
    pub live_elapsed: u64,
    /// Consecutive failed status polls
    pub consecutive_failures: u32,
}

impl GenerationState {
    /// Elapsed time to display: the server value once completed, the live
    /// counter otherwise.
    pub fn display_elapsed(&self) -> String {
        match &self.job {
            Some(job) if job.status == JobStatus::Completed => format_elapsed(job.elapsed),
            _ => format_elapsed(Some(self.live_elapsed as f64)),
        }
    }

    /// Message explaining why the generation did not succeed, if it did not.
    pub fn failure_message(&self) -> Option<&str> {
        if let Some(error) = self.error.as_deref() {
            return Some(error);
        }
        match &self.job {
            Some(job) if job.status == JobStatus::Failed => {
                Some(job.message.as_deref().unwrap_or(SUBMIT_FAILED_MESSAGE))
            }
            _ => None,
        }
    }

    pub fn job_id(&self) -> Option<&JobId> {
        self.job.as_ref().map(|job| &job.job_id)
    }
}

/// Drives one generation at a time.
///
/// Transitions take `&mut self`; observers read state through
/// [`subscribe`](Self::subscribe) or [`snapshot`](Self::snapshot).
pub struct GenerationController<A: JobApi + ?Sized + 'static> {
    api: Arc<A>,
    poller: JobPoller<A>,
    ticker: Option<JoinHandle<()>>,
    state: Arc<watch::Sender<GenerationState>>,
}

impl<A: JobApi + ?Sized + 'static> GenerationController<A> {
    pub fn new(api: Arc<A>, config: PollConfig) -> Self {
        let (state, _) = watch::channel(GenerationState::default());
        Self {
            poller: JobPoller::new(Arc::clone(&api), config),
            api,
            ticker: None,
            state: Arc::new(state),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<GenerationState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> GenerationState {
        self.state.borrow().clone()
    }

    /// Submit the form and start following the job.
    ///
    /// An invalid form is reported inline without contacting the backend
    /// and without touching the running generation. Otherwise any running
    /// generation is cancelled first and all per-job state is reset.
    pub async fn generate(&mut self, form: &GenerationForm) -> ClientResult<JobId> {
        let request = match form.build_request() {
            Ok(request) => request,
            Err(e) => {
                let message = e.to_string();
                self.state.send_modify(|s| s.error = Some(message));
                return Err(e.into());
            }
        };

        self.stop_tasks();
        let epoch = self.begin_generation();

        let job = match self.api.start_generation(&request).await {
            Ok(job) => job,
            Err(e) => {
                warn!(epoch, "Generation submission failed: {}", e);
                let message = e.user_message(SUBMIT_FAILED_MESSAGE);
                update_if_current(&self.state, epoch, |s| {
                    s.phase = GenerationPhase::Idle;
                    s.is_generating = false;
                    s.error = Some(message);
                });
                return Err(e);
            }
        };

        let job_id = job.job_id.clone();
        let terminal = job.is_terminal();
        JobLogger::new(&job_id, "generate").log_start(&request.source_url);
        update_if_current(&self.state, epoch, |s| apply_job(s, job));

        if !terminal {
            self.ticker = Some(spawn_ticker(Arc::clone(&self.state), epoch));
            let state = Arc::clone(&self.state);
            self.poller.start(job_id.clone(), move |event| {
                on_poll_event(&state, epoch, event)
            });
        }

        Ok(job_id)
    }

    /// Choose a clip of the completed job for preview.
    pub fn select_clip(&mut self, clip_id: &str) -> ClientResult<SelectedClip> {
        let selected = {
            let state = self.state.borrow();
            state
                .job
                .as_ref()
                .and_then(|job| job.clips().iter().find(|c| c.clip_id == clip_id))
                .map(SelectedClip::from)
        };
        let selected =
            selected.ok_or_else(|| ClientError::input(format!("Unknown clip: {}", clip_id)))?;

        let value = selected.clone();
        self.state.send_modify(|s| s.selected_clip = Some(value));
        Ok(selected)
    }

    /// Stop following the current job. The last snapshot is kept.
    pub fn cancel(&mut self) {
        self.stop_tasks();
        self.state.send_if_modified(|s| {
            if !s.is_generating {
                return false;
            }
            s.epoch += 1;
            s.is_generating = false;
            s.phase = GenerationPhase::Idle;
            true
        });
    }

    /// Wait until no generation is in progress and return the final state.
    pub async fn wait_until_settled(&self) -> GenerationState {
        let mut rx = self.state.subscribe();
        let settled = match rx.wait_for(|s| !s.is_generating).await {
            Ok(state) => state.clone(),
            Err(_) => self.snapshot(),
        };
        settled
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_running()
    }

    /// Reset per-job state and move to `Submitting` under a fresh epoch.
    fn begin_generation(&self) -> u64 {
        let mut epoch = 0;
        self.state.send_modify(|s| {
            s.epoch += 1;
            epoch = s.epoch;
            s.phase = GenerationPhase::Submitting;
            s.is_generating = true;
            s.job = None;
            s.error = None;
            s.selected_clip = None;
            s.live_elapsed = 0;
            s.consecutive_failures = 0;
        });
        epoch
    }

    fn stop_tasks(&mut self) {
        self.poller.cancel();
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

impl<A: JobApi + ?Sized + 'static> Drop for GenerationController<A> {
    fn drop(&mut self) {
        self.stop_tasks();
    }
}

/// Apply `f` only if `epoch` is still the current generation.
///
/// Returns whether the update was applied.
fn update_if_current<F>(state: &watch::Sender<GenerationState>, epoch: u64, f: F) -> bool
where
    F: FnOnce(&mut GenerationState),
{
    state.send_if_modified(|s| {
        if s.epoch != epoch {
            return false;
        }
        f(s);
        true
    })
}

fn apply_job(state: &mut GenerationState, job: Job) {
    state.consecutive_failures = 0;
    if let Some(secs) = job.elapsed_secs() {
        state.live_elapsed = secs;
    }

    match job.status {
        JobStatus::Completed => {
            state.phase = GenerationPhase::Completed;
            state.is_generating = false;
            state.selected_clip = job.default_clip().map(SelectedClip::from);
        }
        JobStatus::Failed => {
            state.phase = GenerationPhase::Failed;
            state.is_generating = false;
        }
        JobStatus::Queued | JobStatus::Processing => {
            state.phase = GenerationPhase::Polling;
        }
    }
    state.job = Some(job);
}

fn on_poll_event(
    state: &watch::Sender<GenerationState>,
    epoch: u64,
    event: PollEvent,
) -> PollControl {
    let current = match event {
        PollEvent::Update(job) => {
            if job.is_terminal() {
                info!(job_id = %job.job_id, status = %job.status, "Generation finished");
            }
            update_if_current(state, epoch, |s| apply_job(s, job))
        }
        PollEvent::RetryScheduled { attempt, .. } => {
            update_if_current(state, epoch, |s| s.consecutive_failures = attempt)
        }
        PollEvent::GaveUp { attempts, error } => update_if_current(state, epoch, |s| {
            s.phase = GenerationPhase::Failed;
            s.is_generating = false;
            s.consecutive_failures = attempts;
            s.error = Some(format!(
                "Lost contact with job after {} failed status checks: {}",
                attempts, error
            ));
        }),
    };

    if current {
        PollControl::Continue
    } else {
        PollControl::Stop
    }
}

/// Count elapsed seconds while the job of `epoch` is queued or processing.
fn spawn_ticker(state: Arc<watch::Sender<GenerationState>>, epoch: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(TICK).await;

            let mut running = true;
            state.send_if_modified(|s| {
                let active = s.epoch == epoch
                    && s.is_generating
                    && s.job.as_ref().is_some_and(|job| job.status.is_active());
                if !active {
                    running = false;
                    return false;
                }
                s.live_elapsed += 1;
                true
            });
            if !running {
                break;
            }
        }
    })
}
