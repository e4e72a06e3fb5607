//! The error payload returned by a registry alongside 4xx responses

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::coerce::null_as_default;
use crate::digest::Digest;

/// Error codes defined by the Docker registry API v2.
///
/// Codes that are not part of the specification are kept verbatim in
/// [`ErrorCode::Unknown`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The blob is unknown to the registry
    BlobUnknown,
    /// The blob upload encountered an error and can no longer proceed
    BlobUploadInvalid,
    /// The upload session is unknown to the registry
    BlobUploadUnknown,
    /// The provided digest did not match the uploaded content
    DigestInvalid,
    /// A manifest references a blob that is unknown to the registry
    ManifestBlobUnknown,
    /// The manifest is invalid
    ManifestInvalid,
    /// The manifest is unknown to the registry
    ManifestUnknown,
    /// The manifest failed signature verification
    ManifestUnverified,
    /// Invalid repository name
    NameInvalid,
    /// The repository name is not known to the registry
    NameUnknown,
    /// Invalid number of results requested
    PaginationNumberInvalid,
    /// Invalid content range
    RangeInvalid,
    /// The provided length did not match the content length
    SizeInvalid,
    /// The manifest tag did not match the URI
    TagInvalid,
    /// Authentication required
    Unauthorized,
    /// Requested access to the resource is denied
    Denied,
    /// The operation is unsupported
    Unsupported,
    /// Generic server side failure
    InternalError,
    /// A code that is not part of the specification
    Unknown(String),
}

impl ErrorCode {
    /// The wire representation of the code
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::BlobUnknown => "BLOB_UNKNOWN",
            ErrorCode::BlobUploadInvalid => "BLOB_UPLOAD_INVALID",
            ErrorCode::BlobUploadUnknown => "BLOB_UPLOAD_UNKNOWN",
            ErrorCode::DigestInvalid => "DIGEST_INVALID",
            ErrorCode::ManifestBlobUnknown => "MANIFEST_BLOB_UNKNOWN",
            ErrorCode::ManifestInvalid => "MANIFEST_INVALID",
            ErrorCode::ManifestUnknown => "MANIFEST_UNKNOWN",
            ErrorCode::ManifestUnverified => "MANIFEST_UNVERIFIED",
            ErrorCode::NameInvalid => "NAME_INVALID",
            ErrorCode::NameUnknown => "NAME_UNKNOWN",
            ErrorCode::PaginationNumberInvalid => "PAGINATION_NUMBER_INVALID",
            ErrorCode::RangeInvalid => "RANGE_INVALID",
            ErrorCode::SizeInvalid => "SIZE_INVALID",
            ErrorCode::TagInvalid => "TAG_INVALID",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Denied => "DENIED",
            ErrorCode::Unsupported => "UNSUPPORTED",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::Unknown(code) => code,
        }
    }
}

impl From<&str> for ErrorCode {
    fn from(code: &str) -> Self {
        match code {
            "BLOB_UNKNOWN" => ErrorCode::BlobUnknown,
            "BLOB_UPLOAD_INVALID" => ErrorCode::BlobUploadInvalid,
            "BLOB_UPLOAD_UNKNOWN" => ErrorCode::BlobUploadUnknown,
            "DIGEST_INVALID" => ErrorCode::DigestInvalid,
            "MANIFEST_BLOB_UNKNOWN" => ErrorCode::ManifestBlobUnknown,
            "MANIFEST_INVALID" => ErrorCode::ManifestInvalid,
            "MANIFEST_UNKNOWN" => ErrorCode::ManifestUnknown,
            "MANIFEST_UNVERIFIED" => ErrorCode::ManifestUnverified,
            "NAME_INVALID" => ErrorCode::NameInvalid,
            "NAME_UNKNOWN" => ErrorCode::NameUnknown,
            "PAGINATION_NUMBER_INVALID" => ErrorCode::PaginationNumberInvalid,
            "RANGE_INVALID" => ErrorCode::RangeInvalid,
            "SIZE_INVALID" => ErrorCode::SizeInvalid,
            "TAG_INVALID" => ErrorCode::TagInvalid,
            "UNAUTHORIZED" => ErrorCode::Unauthorized,
            "DENIED" => ErrorCode::Denied,
            "UNSUPPORTED" => ErrorCode::Unsupported,
            "INTERNAL_ERROR" => ErrorCode::InternalError,
            other => ErrorCode::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Ok(ErrorCode::from(code.as_str()))
    }
}

/// Extra information attached to a registry error
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detail {
    /// Repository name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Tag
    #[serde(
        default,
        rename = "Tag",
        alias = "tag",
        deserialize_with = "null_as_default"
    )]
    pub tag: String,
    /// Digest of the content the error relates to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<Digest>,
}

/// A single error reported by the registry
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Error {
    /// The error code, `None` when the registry did not send one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    /// Human readable message
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    /// Free-form details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Detail>,
}

impl Error {
    /// Build an error carrying only a code
    pub fn with_code(code: ErrorCode) -> Self {
        Self {
            code: Some(code),
            ..Default::default()
        }
    }
}

/// The list of errors carried by a failed response
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Errors {
    /// Errors in the order the registry reported them
    #[serde(default, deserialize_with = "null_as_default")]
    pub errors: Vec<Error>,
}

impl Errors {
    /// The payload substituted for every 5xx response, whatever the server sent
    pub fn internal() -> Self {
        Self {
            errors: vec![Error::with_code(ErrorCode::InternalError)],
        }
    }

    /// Whether any of the errors has the given code
    pub fn contains(&self, code: &ErrorCode) -> bool {
        self.errors.iter().any(|e| e.code.as_ref() == Some(code))
    }
}

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .errors
            .iter()
            .map(|e| match &e.code {
                Some(code) if e.message.is_empty() => code.to_string(),
                Some(code) => format!("{code}: {}", e.message),
                None => e.message.clone(),
            })
            .collect();
        write!(f, "[{}]", rendered.join(", "))
    }
}
