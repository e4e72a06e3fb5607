//! A client for the Docker Registry HTTP API v2.
//!
//! Responses are decoded into validated models wrapped in a
//! [`RegistryResponse`]. Values that need to call back into the registry, such
//! as the layers of a manifest or a `Location` header, keep a weak handle on
//! the [`Client`] that produced them.
#![deny(missing_docs)]

pub mod api_error;
pub mod blob;
pub mod catalog;
pub mod client;
mod coerce;
pub mod digest;
pub mod errors;
pub mod headers;
pub mod manifest;
pub mod media_type;
mod regexp;
pub mod response;
pub mod secrets;

#[doc(inline)]
pub use blob::Blob;
#[doc(inline)]
pub use client::{Client, ClientConfig};
#[doc(inline)]
pub use coerce::from_slice;
#[doc(inline)]
pub use digest::Digest;
#[doc(inline)]
pub use errors::{RegistryError, Result};
#[doc(inline)]
pub use manifest::{Manifest, ManifestV1, ManifestV2};
#[doc(inline)]
pub use media_type::MediaType;
#[doc(inline)]
pub use response::{RegistryResponse, ResponseBody, Status};
#[doc(inline)]
pub use secrets::RegistryAuth;

#[macro_use]
extern crate lazy_static;
