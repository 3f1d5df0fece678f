//! Shared data models for the Autoshorts console.
//!
//! This crate provides Serde-serializable types for:
//! - The generation request and its option enums
//! - The editable form that builds a request
//! - Job, clip and account snapshots returned by the backend

pub mod clip;
pub mod effects;
pub mod error;
pub mod form;
pub mod job;
pub mod job_status;
pub mod options;
pub mod request;
pub mod user;
pub mod utils;

// Re-export common types
pub use clip::{Clip, JobResult, SelectedClip};
pub use effects::EffectSet;
pub use error::{FormError, FormResult};
pub use form::GenerationForm;
pub use job::{Job, JobId};
pub use job_status::JobStatus;
pub use options::{
    CaptionAnimation, CaptionPosition, CropStrategy, Effect, Hardware, Language, OptionParseError,
    PromptStyle, QualityPreset, Resolution, TextCase, FONTS,
};
pub use request::{
    AudioConfig, BackgroundMusicConfig, CaptionConfig, ContentConfig, GenerationRequest,
    VideoConfig, VisualConfig,
};
pub use user::UserProfile;
pub use utils::format_elapsed;

/// JSON schema of the generation request body.
pub fn generation_request_schema() -> schemars::schema::RootSchema {
    schemars::schema_for!(GenerationRequest)
}

/// JSON schema of the job snapshot returned by the backend.
pub fn job_schema() -> schemars::schema::RootSchema {
    schemars::schema_for!(Job)
}
