//! Cancelable job status polling.
//!
//! A poll is only scheduled after the previous one resolved, so at most one
//! status request is in flight and responses arrive in request order:
//!
//! ```text
//! fetch ──► non-terminal ──► sleep(interval) ──► fetch ...
//!   │
//!   ├─────► terminal ──────► stop
//!   └─────► error ─────────► sleep(retry_delay) ──► fetch ...
//! ```

use std::sync::Arc;
use std::time::Duration;

use autoshorts_models::{Job, JobId};
use tokio::task::JoinHandle;
use tracing::{info, Instrument};

use crate::api::JobApi;
use crate::logging::JobLogger;
use crate::retry::{PollRetry, RetryDecision};

/// Delay between polls of a job that is still queued or processing.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Delay before retrying a poll whose request failed.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Poll timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay after a non-terminal status
    pub interval: Duration,
    /// Delay after a failed request
    pub retry_delay: Duration,
    /// Stop after this many consecutive request failures; `None` retries forever
    pub max_consecutive_failures: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            retry_delay: DEFAULT_RETRY_DELAY,
            max_consecutive_failures: None,
        }
    }
}

impl PollConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            interval: Duration::from_secs(
                std::env::var("AUTOSHORTS_POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_POLL_INTERVAL.as_secs()),
            ),
            retry_delay: Duration::from_secs(
                std::env::var("AUTOSHORTS_POLL_RETRY_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_RETRY_DELAY.as_secs()),
            ),
            max_consecutive_failures: std::env::var("AUTOSHORTS_POLL_MAX_FAILURES")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0),
        }
    }
}

/// Something the poll loop observed.
#[derive(Debug, Clone)]
pub enum PollEvent {
    /// A fresh job snapshot
    Update(Job),
    /// The request failed and will be retried after `retry_delay`
    RetryScheduled { attempt: u32, error: String },
    /// The failure cap was reached; the loop has stopped
    GaveUp { attempts: u32, error: String },
}

/// Returned by the event handler to keep or end the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollControl {
    Continue,
    Stop,
}

/// Handle owning the background poll task for one job at a time.
///
/// Starting a new job cancels the previous loop. Dropping the handle cancels
/// the running loop as well.
pub struct JobPoller<A: JobApi + ?Sized> {
    api: Arc<A>,
    config: PollConfig,
    task: Option<JoinHandle<()>>,
}

impl<A: JobApi + ?Sized + 'static> JobPoller<A> {
    pub fn new(api: Arc<A>, config: PollConfig) -> Self {
        Self {
            api,
            config,
            task: None,
        }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Start polling `job_id`, replacing any running loop.
    ///
    /// The first status request is issued immediately. `on_event` runs for
    /// every observation; returning [`PollControl::Stop`] ends the loop.
    pub fn start<F>(&mut self, job_id: JobId, on_event: F)
    where
        F: FnMut(PollEvent) -> PollControl + Send + 'static,
    {
        self.cancel();

        let logger = JobLogger::new(&job_id, "poll");
        let span = logger.create_span();
        let api = Arc::clone(&self.api);
        let config = self.config.clone();

        self.task = Some(tokio::spawn(
            run_poll_loop(api, job_id, config, logger, on_event).instrument(span),
        ));
    }

    /// Cancel the running loop, if any. No event is delivered afterwards.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Whether a loop is still running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl<A: JobApi + ?Sized> Drop for JobPoller<A> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run_poll_loop<A, F>(
    api: Arc<A>,
    job_id: JobId,
    config: PollConfig,
    logger: JobLogger,
    mut on_event: F,
) where
    A: JobApi + ?Sized,
    F: FnMut(PollEvent) -> PollControl,
{
    let mut retry = PollRetry::new(&config);

    loop {
        let delay = match api.job_status(&job_id).await {
            Ok(job) => {
                if let Some(streak) = retry.on_success() {
                    info!(job_id = %job_id, "Status polling recovered after {} failed polls", streak);
                }
                logger.log_status(&job);

                let terminal = job.is_terminal();
                if terminal {
                    logger.log_completion(job.status.as_str());
                }
                if on_event(PollEvent::Update(job)) == PollControl::Stop || terminal {
                    return;
                }
                config.interval
            }
            Err(e) => match retry.on_failure() {
                RetryDecision::GiveUp { attempts } => {
                    logger.log_error(&format!("giving up after {} failed polls: {}", attempts, e));
                    on_event(PollEvent::GaveUp {
                        attempts,
                        error: e.to_string(),
                    });
                    return;
                }
                RetryDecision::Retry { attempt, delay, log } => {
                    if log {
                        logger.log_warning(&format!(
                            "status poll failed (attempt {}), retrying in {:?}: {}",
                            attempt, delay, e
                        ));
                    }
                    let event = PollEvent::RetryScheduled {
                        attempt,
                        error: e.to_string(),
                    };
                    if on_event(event) == PollControl::Stop {
                        return;
                    }
                    delay
                }
            },
        };

        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ClientError, ClientResult};
    use async_trait::async_trait;
    use autoshorts_models::{GenerationRequest, JobStatus};
    use serial_test::serial;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    /// Replays scripted status responses and records when each poll happened.
    struct ScriptedApi {
        responses: Mutex<VecDeque<ClientResult<Job>>>,
        calls: Mutex<Vec<Instant>>,
    }

    impl ScriptedApi {
        fn new(responses: Vec<ClientResult<Job>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_offsets(&self, start: Instant) -> Vec<u64> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|t| t.duration_since(start).as_secs())
                .collect()
        }
    }

    #[async_trait]
    impl JobApi for ScriptedApi {
        async fn start_generation(&self, _request: &GenerationRequest) -> ClientResult<Job> {
            unreachable!("poller never submits")
        }

        async fn job_status(&self, _job_id: &JobId) -> ClientResult<Job> {
            self.calls.lock().unwrap().push(Instant::now());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ClientError::input("script exhausted")))
        }
    }

    fn job(status: JobStatus) -> ClientResult<Job> {
        Ok(Job {
            job_id: "job-1".into(),
            status,
            message: None,
            result: None,
            elapsed: None,
        })
    }

    fn transport_error() -> ClientResult<Job> {
        Err(ClientError::from_response(503, "{}"))
    }

    fn collect_events(poller: &mut JobPoller<ScriptedApi>) -> mpsc::UnboundedReceiver<PollEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        poller.start("job-1".into(), move |event| {
            tx.send(event).ok();
            PollControl::Continue
        });
        rx
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_on_fixed_interval_until_terminal() {
        let api = ScriptedApi::new(vec![
            job(JobStatus::Queued),
            job(JobStatus::Processing),
            job(JobStatus::Completed),
        ]);
        let mut poller = JobPoller::new(Arc::clone(&api), PollConfig::default());
        let start = Instant::now();
        let mut events = collect_events(&mut poller);

        let mut statuses = Vec::new();
        while let Some(event) = events.recv().await {
            if let PollEvent::Update(job) = event {
                statuses.push(job.status);
            }
        }

        assert_eq!(
            statuses,
            vec![JobStatus::Queued, JobStatus::Processing, JobStatus::Completed]
        );
        assert_eq!(api.call_offsets(start), vec![0, 15, 30]);
        assert!(!poller.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_errors_retry_on_short_delay() {
        let api = ScriptedApi::new(vec![
            transport_error(),
            transport_error(),
            job(JobStatus::Processing),
            job(JobStatus::Failed),
        ]);
        let mut poller = JobPoller::new(Arc::clone(&api), PollConfig::default());
        let start = Instant::now();
        let mut events = collect_events(&mut poller);

        let mut retries = Vec::new();
        while let Some(event) = events.recv().await {
            if let PollEvent::RetryScheduled { attempt, .. } = event {
                retries.push(attempt);
            }
        }

        assert_eq!(retries, vec![1, 2]);
        assert_eq!(api.call_offsets(start), vec![0, 5, 10, 25]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_cap_stops_the_loop() {
        let api = ScriptedApi::new(vec![transport_error(), transport_error(), transport_error()]);
        let config = PollConfig {
            max_consecutive_failures: Some(2),
            ..Default::default()
        };
        let mut poller = JobPoller::new(Arc::clone(&api), config);
        let mut events = collect_events(&mut poller);

        let mut last = None;
        while let Some(event) = events.recv().await {
            last = Some(event);
        }

        assert!(matches!(last, Some(PollEvent::GaveUp { attempts: 2, .. })));
        assert_eq!(api.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_further_polls() {
        let api = ScriptedApi::new(vec![
            job(JobStatus::Queued),
            job(JobStatus::Queued),
            job(JobStatus::Queued),
        ]);
        let mut poller = JobPoller::new(Arc::clone(&api), PollConfig::default());
        let mut events = collect_events(&mut poller);

        assert!(matches!(events.recv().await, Some(PollEvent::Update(_))));
        poller.cancel();
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(api.calls.lock().unwrap().len(), 1);
        assert!(!poller.is_running());
        assert!(events.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_handler_can_stop_the_loop() {
        let api = ScriptedApi::new(vec![job(JobStatus::Queued), job(JobStatus::Queued)]);
        let mut poller = JobPoller::new(Arc::clone(&api), PollConfig::default());
        poller.start("job-1".into(), |_| PollControl::Stop);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(api.calls.lock().unwrap().len(), 1);
    }

    #[test]
    #[serial]
    fn test_poll_config_from_env() {
        std::env::set_var("AUTOSHORTS_POLL_INTERVAL_SECS", "3");
        std::env::set_var("AUTOSHORTS_POLL_RETRY_SECS", "0");
        std::env::set_var("AUTOSHORTS_POLL_MAX_FAILURES", "10");
        let config = PollConfig::from_env();
        std::env::remove_var("AUTOSHORTS_POLL_INTERVAL_SECS");
        std::env::remove_var("AUTOSHORTS_POLL_RETRY_SECS");
        std::env::remove_var("AUTOSHORTS_POLL_MAX_FAILURES");

        assert_eq!(config.interval, Duration::from_secs(3));
        assert_eq!(config.retry_delay, DEFAULT_RETRY_DELAY);
        assert_eq!(config.max_consecutive_failures, Some(10));
    }
}
