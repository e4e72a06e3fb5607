//! The envelope wrapping every answer of the registry

use std::fmt;

use crate::api_error::Errors;
use crate::client::{Client, ClientRef};
use crate::errors::{RegistryError, Result};
use crate::headers::Headers;

/// The closed set of HTTP status codes a registry is expected to answer with
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
#[allow(missing_docs)]
pub enum Status {
    Ok = 200,
    Created = 201,
    Accepted = 202,
    NonAuthoritativeInformation = 203,
    NoContent = 204,
    ResetContent = 205,
    PartialContent = 206,
    Found = 302,
    TemporaryRedirect = 307,
    BadRequest = 400,
    Unauthorized = 401,
    Forbidden = 403,
    NotFound = 404,
    MethodNotAllowed = 405,
    TooManyRequests = 429,
    InternalServerError = 500,
    NotImplemented = 501,
    BadGateway = 502,
    ServiceUnavailable = 503,
    GatewayTimeout = 504,
    HttpVersionNotSupported = 505,
    VariantAlsoNegotiates = 506,
    InsufficientStorage = 507,
    LoopDetected = 508,
    NotExtended = 510,
    NetworkAuthenticationRequired = 511,
}

impl Status {
    /// The numeric code
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// 4xx
    pub fn is_client_error(self) -> bool {
        (400..500).contains(&self.as_u16())
    }

    /// 5xx
    pub fn is_server_error(self) -> bool {
        self.as_u16() >= 500
    }
}

impl TryFrom<u16> for Status {
    type Error = RegistryError;

    fn try_from(code: u16) -> Result<Self> {
        let status = match code {
            200 => Status::Ok,
            201 => Status::Created,
            202 => Status::Accepted,
            203 => Status::NonAuthoritativeInformation,
            204 => Status::NoContent,
            205 => Status::ResetContent,
            206 => Status::PartialContent,
            302 => Status::Found,
            307 => Status::TemporaryRedirect,
            400 => Status::BadRequest,
            401 => Status::Unauthorized,
            403 => Status::Forbidden,
            404 => Status::NotFound,
            405 => Status::MethodNotAllowed,
            429 => Status::TooManyRequests,
            500 => Status::InternalServerError,
            501 => Status::NotImplemented,
            502 => Status::BadGateway,
            503 => Status::ServiceUnavailable,
            504 => Status::GatewayTimeout,
            505 => Status::HttpVersionNotSupported,
            506 => Status::VariantAlsoNegotiates,
            507 => Status::InsufficientStorage,
            508 => Status::LoopDetected,
            510 => Status::NotExtended,
            511 => Status::NetworkAuthenticationRequired,
            other => return Err(RegistryError::UnexpectedStatus(other)),
        };
        Ok(status)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = http::StatusCode::from_u16(self.as_u16())
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or_default();
        write!(f, "{} {}", self.as_u16(), reason)
    }
}

/// The body of a registry response
#[derive(Debug)]
pub enum ResponseBody<T> {
    /// Nothing was requested, or the registry sent nothing
    Empty,
    /// The requested model
    Model(T),
    /// The errors reported by the registry
    Errors(Errors),
}

impl<T> ResponseBody<T> {
    /// The model, if the request succeeded and produced one
    pub fn model(&self) -> Option<&T> {
        match self {
            ResponseBody::Model(model) => Some(model),
            _ => None,
        }
    }

    /// Mutable access to the model
    pub fn model_mut(&mut self) -> Option<&mut T> {
        match self {
            ResponseBody::Model(model) => Some(model),
            _ => None,
        }
    }

    /// The registry errors, if the request failed
    pub fn errors(&self) -> Option<&Errors> {
        match self {
            ResponseBody::Errors(errors) => Some(errors),
            _ => None,
        }
    }

    /// Whether the body is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, ResponseBody::Empty)
    }
}

/// Lets a response body receive the back-references of the client that produced it.
///
/// Bodies that hold nothing able to call back into the registry keep the
/// default, which does nothing.
pub trait Attach {
    /// Hand the client and the repository name the request targeted
    fn attach(&mut self, _client: &ClientRef, _name: Option<&str>) {}
}

impl Attach for () {}

/// A status code, the parsed headers and a body
#[derive(Debug)]
pub struct RegistryResponse<T> {
    /// Status of the response
    pub status: Status,
    /// Parsed headers
    pub headers: Headers,
    /// Model, registry errors or nothing
    pub body: ResponseBody<T>,
}

impl<T> RegistryResponse<T> {
    /// Assemble a response without any back-reference
    pub fn new(status: Status, headers: Headers, body: ResponseBody<T>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// The model, turning registry errors into [`RegistryError::Registry`].
    ///
    /// `Ok(None)` is returned for successful responses without a body.
    pub fn into_model(self) -> Result<Option<T>> {
        match self.body {
            ResponseBody::Model(model) => Ok(Some(model)),
            ResponseBody::Empty => Ok(None),
            ResponseBody::Errors(errors) => Err(RegistryError::Registry {
                status: self.status,
                errors,
            }),
        }
    }
}

impl<T: Attach> RegistryResponse<T> {
    /// Assemble a response and wire the back-references of `client` into the
    /// body and the `Location` header.
    ///
    /// `name` is the repository the request targeted, if any.
    pub fn with_client(
        status: Status,
        mut headers: Headers,
        mut body: ResponseBody<T>,
        client: &Client,
        name: Option<&str>,
    ) -> Self {
        let client = client.downgrade();
        if let Some(location) = headers.location.as_mut() {
            location.attach(&client, name);
        }
        if let ResponseBody::Model(model) = &mut body {
            model.attach(&client, name);
        }
        Self::new(status, headers, body)
    }
}

/// A non-owning link from a nested value to the client and repository it came from
#[derive(Clone, Debug)]
pub(crate) struct Backref {
    pub(crate) client: ClientRef,
    pub(crate) name: String,
}

impl Backref {
    pub(crate) fn new(client: &ClientRef, name: &str) -> Self {
        Self {
            client: client.clone(),
            name: name.to_string(),
        }
    }
}

/// Resolve an optional back-reference into a live client and repository name
pub(crate) fn resolve<'a>(
    origin: Option<&'a Backref>,
    what: &'static str,
) -> Result<(Client, &'a str)> {
    let origin = origin.ok_or(RegistryError::Detached(what))?;
    let client = origin
        .client
        .upgrade()
        .ok_or(RegistryError::Detached("the client has been dropped"))?;
    Ok((client, origin.name.as_str()))
}
