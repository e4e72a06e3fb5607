//! Image manifests, schema 1 and schema 2
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::blob::Blob;
use crate::client::{Client, ClientRef};
use crate::coerce::{from_slice, null_as_default};
use crate::digest::Digest;
use crate::errors::{RegistryError, Result};
use crate::media_type::MediaType;
use crate::response::{resolve, Attach, Backref, RegistryResponse};

const SCHEMA1_DEPRECATION: &str = "Manifest schema 1 should not be used for purposes other \
    than backward compatibility. \
    See https://docs.docker.com/registry/spec/manifest-v2-1/ to learn more.";

/// The image configuration referenced by a schema 2 manifest
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Media type of the configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    /// Size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Digest of the configuration blob
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<Digest>,
}

/// A layer of a schema 2 manifest.
///
/// Layers of a manifest obtained through a [`Client`] remember the client and
/// the repository they came from, so that [`Layer::get_blob`] needs no
/// argument. Equality only considers the wire fields.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    /// Media type of the layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    /// Size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Digest of the layer blob
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<Digest>,
    #[serde(skip)]
    origin: Option<Backref>,
}

impl Layer {
    /// A layer descriptor, typically to build a manifest to upload
    pub fn new(media_type: MediaType, size: u64, digest: Digest) -> Self {
        Self {
            media_type: Some(media_type),
            size: Some(size),
            digest: Some(digest),
            origin: None,
        }
    }

    /// The repository this layer was fetched from
    pub fn repository_name(&self) -> Option<&str> {
        self.origin.as_ref().map(|origin| origin.name.as_str())
    }

    /// Whether this layer was produced by `client`
    pub fn is_attached_to(&self, client: &Client) -> bool {
        self.origin
            .as_ref()
            .is_some_and(|origin| origin.client.points_to(client))
    }

    /// Fetch the blob of this layer from the repository it was fetched from
    pub async fn get_blob(&self, stream: bool) -> Result<RegistryResponse<Blob>> {
        let (client, name) = resolve(self.origin.as_ref(), "layer was not fetched by a client")?;
        let digest = self
            .digest
            .as_ref()
            .ok_or(RegistryError::Detached("layer has no digest"))?;
        client.get_blob(name, digest.as_str(), stream).await
    }
}

impl PartialEq for Layer {
    fn eq(&self, other: &Self) -> bool {
        self.media_type == other.media_type
            && self.size == other.size
            && self.digest == other.digest
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("media_type", &self.media_type)
            .field("size", &self.size)
            .field("digest", &self.digest)
            .field("repository", &self.repository_name())
            .finish()
    }
}

/// Schema 2 image manifest
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestV2 {
    /// Always `2`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<u32>,
    /// Media type of the manifest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    /// The image configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Config>,
    /// Layers, base layer first
    #[serde(default, deserialize_with = "null_as_default")]
    pub layers: Vec<Layer>,
}

impl ManifestV2 {
    /// The sum of the sizes of the current layers. Layers without a size count as zero.
    pub fn total_size(&self) -> u64 {
        self.layers.iter().filter_map(|layer| layer.size).sum()
    }
}

impl Attach for ManifestV2 {
    fn attach(&mut self, client: &ClientRef, name: Option<&str>) {
        let Some(name) = name else { return };
        let origin = Backref::new(client, name);
        for layer in &mut self.layers {
            layer.origin = Some(origin.clone());
        }
    }
}

/// A layer of a schema 1 manifest
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct FsLayer {
    /// Digest of the layer blob
    #[serde(rename = "blobSum", default, skip_serializing_if = "Option::is_none")]
    pub blob_sum: Option<Digest>,
    #[serde(skip)]
    origin: Option<Backref>,
}

impl FsLayer {
    /// A layer identified by the digest of its blob
    pub fn new(blob_sum: Digest) -> Self {
        Self {
            blob_sum: Some(blob_sum),
            origin: None,
        }
    }

    /// The repository this layer was fetched from
    pub fn repository_name(&self) -> Option<&str> {
        self.origin.as_ref().map(|origin| origin.name.as_str())
    }

    /// Whether this layer was produced by `client`
    pub fn is_attached_to(&self, client: &Client) -> bool {
        self.origin
            .as_ref()
            .is_some_and(|origin| origin.client.points_to(client))
    }

    /// Fetch the blob of this layer from the repository named by its manifest
    pub async fn get_blob(&self, stream: bool) -> Result<RegistryResponse<Blob>> {
        let (client, name) = resolve(self.origin.as_ref(), "layer was not fetched by a client")?;
        let digest = self
            .blob_sum
            .as_ref()
            .ok_or(RegistryError::Detached("layer has no digest"))?;
        client.get_blob(name, digest.as_str(), stream).await
    }
}

impl PartialEq for FsLayer {
    fn eq(&self, other: &Self) -> bool {
        self.blob_sum == other.blob_sum
    }
}

impl fmt::Debug for FsLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FsLayer")
            .field("blob_sum", &self.blob_sum)
            .field("repository", &self.repository_name())
            .finish()
    }
}

/// A free-form history statement of a schema 1 manifest
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    /// Raw JSON of the legacy v1 image
    #[serde(
        rename = "v1Compatibility",
        default,
        deserialize_with = "null_as_default"
    )]
    pub v1_compatibility: String,
}

/// JSON web key of a manifest signature
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Jwk {
    #[serde(default, deserialize_with = "null_as_default")]
    pub crv: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub kid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub kty: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub x: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub y: String,
}

/// JWS header of a manifest signature
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// The signing key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwk: Option<Jwk>,
    /// Signing algorithm, e.g. `ES256`
    #[serde(default, deserialize_with = "null_as_default")]
    pub alg: String,
}

/// JWS signature block of a schema 1 manifest
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Unprotected header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<Header>,
    /// Base64url encoded signature
    #[serde(default, deserialize_with = "null_as_default")]
    pub signature: String,
    /// Base64url encoded protected header
    #[serde(default, deserialize_with = "null_as_default")]
    pub protected: String,
}

/// Emits the schema 1 deprecation warning whenever it is created
#[derive(Clone, Copy, PartialEq, Eq)]
struct Schema1Notice;

impl Default for Schema1Notice {
    fn default() -> Self {
        warn!(target: "drav2::deprecation", "{}", SCHEMA1_DEPRECATION);
        Schema1Notice
    }
}

/// Schema 1 image manifest.
///
/// Deprecated by the registry itself: every construction, including
/// deserialization and [`Default`], logs a deprecation warning. Build one
/// from [`ManifestV1::default`] and set its fields.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestV1 {
    /// Always `1`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<u32>,
    /// Repository name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Tag
    #[serde(default, deserialize_with = "null_as_default")]
    pub tag: String,
    /// Host architecture
    #[serde(default, deserialize_with = "null_as_default")]
    pub architecture: String,
    /// Layers, most recent first
    #[serde(default, deserialize_with = "null_as_default")]
    pub fs_layers: Vec<FsLayer>,
    /// One entry per layer
    #[serde(default, deserialize_with = "null_as_default")]
    pub history: Vec<HistoryItem>,
    /// JWS signatures
    #[serde(default, deserialize_with = "null_as_default")]
    pub signatures: Vec<Signature>,
    #[serde(skip)]
    notice: Schema1Notice,
}

impl ManifestV1 {
    /// Whether there is exactly one history entry per layer. Registries are
    /// expected to guarantee it but nothing enforces it.
    pub fn history_matches_layers(&self) -> bool {
        self.history.len() == self.fs_layers.len()
    }
}

impl Attach for ManifestV1 {
    fn attach(&mut self, client: &ClientRef, name: Option<&str>) {
        let name = match (self.name.as_str(), name) {
            ("", Some(requested)) => requested,
            ("", None) => return,
            (own, _) => own,
        };
        let origin = Backref::new(client, name);
        for layer in &mut self.fs_layers {
            layer.origin = Some(origin.clone());
        }
    }
}

impl fmt::Debug for ManifestV1 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManifestV1")
            .field("schema_version", &self.schema_version)
            .field("name", &self.name)
            .field("tag", &self.tag)
            .field("architecture", &self.architecture)
            .field("fs_layers", &self.fs_layers)
            .field("history", &self.history)
            .field("signatures", &self.signatures)
            .finish()
    }
}

/// A manifest of either schema
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Manifest {
    /// Schema 1
    V1(ManifestV1),
    /// Schema 2
    V2(ManifestV2),
}

impl Manifest {
    /// Decode `bytes` as the schema implied by `media_type`
    pub fn from_slice(bytes: &[u8], media_type: MediaType) -> Result<Self> {
        if media_type.is_schema1() {
            from_slice(bytes).map(Manifest::V1)
        } else {
            from_slice(bytes).map(Manifest::V2)
        }
    }

    /// Decode `bytes` according to their `schemaVersion`, for payloads of unknown origin
    pub fn sniff(bytes: &[u8]) -> Result<Self> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Versioned {
            #[serde(default)]
            schema_version: Option<u32>,
        }

        let versioned: Versioned = from_slice(bytes)?;
        match versioned.schema_version {
            Some(1) => from_slice(bytes).map(Manifest::V1),
            _ => from_slice(bytes).map(Manifest::V2),
        }
    }

    /// The media type to announce when uploading this manifest
    pub fn media_type(&self) -> MediaType {
        match self {
            Manifest::V1(_) => MediaType::ManifestV1Signed,
            Manifest::V2(manifest) => manifest.media_type.unwrap_or(MediaType::ManifestV2),
        }
    }

    /// The schema 2 manifest, if that is the schema
    pub fn as_v2(&self) -> Option<&ManifestV2> {
        match self {
            Manifest::V2(manifest) => Some(manifest),
            Manifest::V1(_) => None,
        }
    }

    /// The schema 1 manifest, if that is the schema
    pub fn as_v1(&self) -> Option<&ManifestV1> {
        match self {
            Manifest::V1(manifest) => Some(manifest),
            Manifest::V2(_) => None,
        }
    }
}

impl Attach for Manifest {
    fn attach(&mut self, client: &ClientRef, name: Option<&str>) {
        match self {
            Manifest::V1(manifest) => manifest.attach(client, name),
            Manifest::V2(manifest) => manifest.attach(client, name),
        }
    }
}

impl From<ManifestV2> for Manifest {
    fn from(manifest: ManifestV2) -> Self {
        Manifest::V2(manifest)
    }
}

impl From<ManifestV1> for Manifest {
    fn from(manifest: ManifestV1) -> Self {
        Manifest::V1(manifest)
    }
}
