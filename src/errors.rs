//! Errors related to interacting with a Docker registry

use thiserror::Error;

use crate::api_error::Errors;
use crate::response::Status;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors that can be raised while talking to a registry or decoding its responses
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Wire data could not be coerced into the expected model
    #[error("Validation error at `{path}`: {message}")]
    Validation {
        /// Location of the offending value, e.g. `.errors[2].detail.digest`
        path: String,
        /// What went wrong
        message: String,
    },
    /// The given value is not a valid `sha256:<hex>` digest
    #[error("Invalid digest: {0:?}")]
    InvalidDigest(String),
    /// The registry answered with a status code outside of the expected set
    #[error("Unexpected HTTP status code {0}")]
    UnexpectedStatus(u16),
    /// A lazily bound operation was called on a value that is not attached to a client
    #[error("Not attached to a registry client: {0}")]
    Detached(&'static str),
    /// The content of a streamed blob cannot be read as a whole
    #[error(
        "Cannot read the blob content directly. Make sure you are not in streaming mode."
    )]
    Unreadable,
    /// The registry reported errors for a request
    #[error("Registry answered {status}: {errors}")]
    Registry {
        /// Status code of the response
        status: Status,
        /// Error payload sent by the registry
        errors: Errors,
    },
    /// Transport level error
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),
    /// Cannot build a URL
    #[error("Error parsing URL: {0}")]
    UrlParseError(#[from] url::ParseError),
    /// A header value could not be built from the given input
    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),
    /// A model could not be serialized
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl RegistryError {
    pub(crate) fn validation(path: impl Into<String>, message: impl ToString) -> Self {
        Self::Validation {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
