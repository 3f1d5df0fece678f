//! Job snapshots returned by the generation backend.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{Clip, JobResult, JobStatus};

/// Opaque server-assigned job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A point-in-time view of a job.
///
/// The client never edits a job; every poll replaces the previous snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    pub job_id: JobId,

    pub status: JobStatus,

    /// Human-readable status text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Present once the job completes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,

    /// Server-measured processing time in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<f64>,
}

impl Job {
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Clips of a completed job, empty otherwise.
    pub fn clips(&self) -> &[Clip] {
        match (&self.status, &self.result) {
            (JobStatus::Completed, Some(result)) => &result.clips,
            _ => &[],
        }
    }

    /// The clip to preview by default: the first clip of a completed job.
    pub fn default_clip(&self) -> Option<&Clip> {
        self.clips().first()
    }

    /// Server elapsed time floored to whole seconds, when reported and non-zero.
    pub fn elapsed_secs(&self) -> Option<u64> {
        self.elapsed
            .filter(|e| e.is_finite() && *e > 0.0)
            .map(|e| e.floor() as u64)
    }
}
