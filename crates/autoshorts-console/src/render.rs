//! Plain-text rendering of account, job and generation state.

use std::fmt::Write;

use autoshorts_client::{Credential, GenerationPhase, GenerationState};
use autoshorts_models::{format_elapsed, Clip, Job, JobStatus, SelectedClip, UserProfile};

pub fn profile(user: &UserProfile, key: Option<&Credential>) -> String {
    let mut out = format!(
        "Email:   {}\nTier:    {}\nCredits: {}\nGPU:     {}",
        user.email_label(),
        user.tier_label(),
        user.credits_label(),
        if user.gpu_eligible() { "available" } else { "not available" },
    );
    if let Some(key) = key {
        let _ = write!(out, "\nKey:     {}", key.masked());
    }
    out
}

/// One progress line; changes only when something other than the elapsed
/// counter changes.
pub fn progress_key(state: &GenerationState) -> (GenerationPhase, Option<JobStatus>, Option<String>, u32) {
    (
        state.phase,
        state.job.as_ref().map(|job| job.status),
        state.job.as_ref().and_then(|job| job.message.clone()),
        state.consecutive_failures,
    )
}

pub fn progress_line(state: &GenerationState) -> String {
    let mut line = match (&state.phase, &state.job) {
        (GenerationPhase::Submitting, _) => "Submitting".to_string(),
        (_, Some(job)) => format!("[{}] {}", job.job_id, status_label(job.status)),
        _ => "Idle".to_string(),
    };
    if let Some(message) = state.job.as_ref().and_then(|job| job.message.as_deref()) {
        let _ = write!(line, ": {}", message);
    }
    let _ = write!(line, " ({})", state.display_elapsed());
    if state.consecutive_failures > 0 {
        let _ = write!(
            line,
            " - status check failed {} time(s), retrying",
            state.consecutive_failures
        );
    }
    line
}

/// Final report of a generation.
pub fn outcome(state: &GenerationState) -> String {
    let mut out = String::new();
    match state.phase {
        GenerationPhase::Completed => {
            let _ = writeln!(out, "Completed in {}", state.display_elapsed());
            if let Some(job) = &state.job {
                out.push_str(&clips(job.clips(), state.selected_clip.as_ref()));
            }
        }
        _ => {
            if let Some(message) = state.failure_message() {
                let _ = writeln!(out, "Failed: {}", message);
            } else {
                let _ = writeln!(out, "Stopped");
            }
        }
    }
    out
}

pub fn job(job: &Job) -> String {
    let mut out = format!("Job:     {}\nStatus:  {}\n", job.job_id, status_label(job.status));
    if let Some(message) = &job.message {
        let _ = writeln!(out, "Message: {}", message);
    }
    let _ = writeln!(out, "Elapsed: {}", format_elapsed(job.elapsed));
    if !job.clips().is_empty() {
        out.push_str(&clips(job.clips(), None));
    }
    out
}

fn clips(clips: &[Clip], selected: Option<&SelectedClip>) -> String {
    if clips.is_empty() {
        return "No clips were produced\n".to_string();
    }

    let mut out = String::new();
    for (i, clip) in clips.iter().enumerate() {
        let marker = if selected.is_some_and(|s| s.id == clip.clip_id) { "*" } else { " " };
        let _ = write!(out, "{} {}. {}", marker, i + 1, clip.clip_id);
        if let Some(title) = &clip.title {
            let _ = write!(out, " \"{}\"", title);
        }
        let _ = write!(out, " {}", format_elapsed(Some(clip.duration)));
        if let Some(percent) = clip.virality_percent() {
            let _ = write!(out, " virality {}%", percent);
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "     {}", clip.download_url);
    }
    out
}

fn status_label(status: JobStatus) -> &'static str {
    match status {
        JobStatus::Queued => "Queued",
        JobStatus::Processing => "Processing",
        JobStatus::Completed => "Completed",
        JobStatus::Failed => "Failed",
    }
}
