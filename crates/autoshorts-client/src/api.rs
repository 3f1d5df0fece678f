//! Job API seam.
//!
//! The controller and poller only need submission and status lookups, so
//! they depend on this trait rather than on the HTTP client directly.

use async_trait::async_trait;
use autoshorts_models::{GenerationRequest, Job, JobId};

use crate::error::ClientResult;

#[async_trait]
pub trait JobApi: Send + Sync {
    /// `POST /generate`: submit a request, returning the initial job.
    async fn start_generation(&self, request: &GenerationRequest) -> ClientResult<Job>;

    /// `GET /jobs/{job_id}`: fetch the current job snapshot.
    async fn job_status(&self, job_id: &JobId) -> ClientResult<Job>;
}
