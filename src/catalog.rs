//! Repository listing payloads

use serde::{Deserialize, Serialize};

use crate::coerce::null_as_default;
use crate::response::Attach;

/// The data returned by a successful `_catalog` request
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Repository names hosted by the registry
    #[serde(default, deserialize_with = "null_as_default")]
    pub repositories: Vec<String>,
}

/// The data returned by a successful `tags/list` request
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tags {
    /// Repository name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Tags of the repository
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

impl Attach for Catalog {}

impl Attach for Tags {}
