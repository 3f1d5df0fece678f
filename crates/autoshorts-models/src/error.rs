//! Form validation errors.
//!
//! These are raised before any network call is made.

use thiserror::Error;

use crate::OptionParseError;

pub type FormResult<T> = Result<T, FormError>;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("Source URL is required")]
    MissingSourceUrl,

    #[error("Invalid form values: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unsupported caption font: {0}")]
    UnknownFont(String),

    #[error("GPU cluster is not available on the {tier} tier")]
    HardwareNotAvailable { tier: String },

    #[error(transparent)]
    UnknownOption(#[from] OptionParseError),
}
