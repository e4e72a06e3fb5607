//! Types for working with registry access secrets

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use http::header::{HeaderValue, AUTHORIZATION};

use crate::errors::Result;

/// A method for authenticating to a registry
#[derive(Clone, PartialEq, Eq)]
pub enum RegistryAuth {
    /// Access the registry anonymously
    Anonymous,

    /// Access the registry using HTTP Basic authentication
    Basic(String, String),
}

impl RegistryAuth {
    /// Credentials from an optional user id and password.
    ///
    /// Anything but two non-empty values means anonymous access.
    pub fn from_parts(user_id: Option<&str>, password: Option<&str>) -> Self {
        match (user_id, password) {
            (Some(user_id), Some(password)) if !user_id.is_empty() && !password.is_empty() => {
                RegistryAuth::Basic(user_id.to_string(), password.to_string())
            }
            _ => RegistryAuth::Anonymous,
        }
    }

    /// The `Authorization` header value, `None` for anonymous access or
    /// incomplete credentials
    pub(crate) fn header_value(&self) -> Result<Option<HeaderValue>> {
        match self {
            RegistryAuth::Basic(user_id, password)
                if !user_id.is_empty() && !password.is_empty() =>
            {
                let encoded = STANDARD.encode(format!("{user_id}:{password}"));
                let mut value = HeaderValue::from_str(&format!("Basic {encoded}"))?;
                value.set_sensitive(true);
                Ok(Some(value))
            }
            _ => Ok(None),
        }
    }
}

impl std::fmt::Debug for RegistryAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryAuth::Anonymous => f.write_str("Anonymous"),
            RegistryAuth::Basic(user_id, _) => f
                .debug_tuple("Basic")
                .field(user_id)
                .field(&"<redacted>")
                .finish(),
        }
    }
}

pub(crate) trait Authenticable {
    fn apply_authentication(self, header: Option<&HeaderValue>) -> Self;
}

impl Authenticable for reqwest::RequestBuilder {
    fn apply_authentication(self, header: Option<&HeaderValue>) -> Self {
        match header {
            Some(value) => self.header(AUTHORIZATION, value.clone()),
            None => self,
        }
    }
}
