//! Content digests and their validation

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::Digest as _;

use crate::errors::{RegistryError, Result};
use crate::regexp;

/// Name of the response header carrying the digest of the returned content
pub const DOCKER_DIGEST_HEADER: &str = "Docker-Content-Digest";

/// A validated `sha256:<64 hex>` content digest.
///
/// The hexadecimal part is accepted in any case and stored lowercased, so two
/// digests that only differ by case compare equal.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest(String);

impl Digest {
    /// Validate and normalize a digest string
    pub fn new(digest: &str) -> Result<Self> {
        let normalized = digest.to_ascii_lowercase();
        if regexp::DIGEST.is_match(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(RegistryError::InvalidDigest(digest.to_string()))
        }
    }

    /// Compute the sha256 digest of some content.
    ///
    /// Handy for completing an upload, which requires the digest of the whole blob.
    pub fn from_content(content: impl AsRef<[u8]>) -> Self {
        Self(format!("sha256:{:x}", sha2::Sha256::digest(content)))
    }

    /// The digest algorithm, always `sha256`
    pub fn algorithm(&self) -> &str {
        "sha256"
    }

    /// The hexadecimal part of the digest
    pub fn hex(&self) -> &str {
        &self.0["sha256:".len()..]
    }

    /// The full digest string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Digest {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<&str> for Digest {
    type Error = RegistryError;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl AsRef<str> for Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Digest::new(&raw).map_err(serde::de::Error::custom)
    }
}
