//! Client for the Autoshorts generation API.
//!
//! This crate provides:
//! - `ApiClient`: HTTP calls for the account, generation and job endpoints
//! - `AuthGate`: credential validation, persistence and the session it unlocks
//! - `GenerationController`: submission plus cancelable status polling

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod generation;
pub mod logging;
pub mod poller;
pub mod retry;

pub use api::JobApi;
pub use auth::{AuthGate, Session, ValidationOutcome, EMPTY_KEY_MESSAGE, INVALID_KEY_MESSAGE};
pub use client::ApiClient;
pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use credential::{
    Credential, CredentialStore, FileCredentialStore, MemoryCredentialStore, CREDENTIAL_KEY,
};
pub use error::{ClientError, ClientResult};
pub use generation::{
    GenerationController, GenerationPhase, GenerationState, SUBMIT_FAILED_MESSAGE,
};
pub use logging::JobLogger;
pub use poller::{JobPoller, PollConfig, PollControl, PollEvent};
