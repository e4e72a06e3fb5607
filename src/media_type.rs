//! Media types understood by the Docker registry API v2

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::RegistryError;

/// The media type of a schema 1 signed manifest
pub const MANIFEST_V1_SIGNED_MEDIA_TYPE: &str =
    "application/vnd.docker.distribution.manifest.v1+prettyjws";
/// The media type of a schema 1 manifest
pub const MANIFEST_V1_MEDIA_TYPE: &str = "application/vnd.docker.distribution.manifest.v1+json";
/// The media type of a schema 2 manifest
pub const MANIFEST_V2_MEDIA_TYPE: &str = "application/vnd.docker.distribution.manifest.v2+json";
/// The media type of a manifest list (fat manifest)
pub const MANIFEST_LIST_V2_MEDIA_TYPE: &str =
    "application/vnd.docker.distribution.manifest.list.v2+json";
/// The media type of a container configuration
pub const CONTAINER_CONFIG_V1_MEDIA_TYPE: &str = "application/vnd.docker.container.image.v1+json";
/// The media type of a gzipped tar layer
pub const LAYER_TAR_GZIP_MEDIA_TYPE: &str = "application/vnd.docker.image.rootfs.diff.tar.gzip";
/// The media type of a gzipped tar layer that must be pulled from a remote location
pub const FOREIGN_LAYER_TAR_GZIP_MEDIA_TYPE: &str =
    "application/vnd.docker.image.rootfs.foreign.diff.tar.gzip";
/// The media type of a plugin configuration
pub const PLUGIN_CONFIG_V1_MEDIA_TYPE: &str = "application/vnd.docker.plugin.v1+json";

/// The closed set of content types recognized in manifests, configs and layers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    /// Schema 1 signed manifest (deprecated)
    #[serde(rename = "application/vnd.docker.distribution.manifest.v1+prettyjws")]
    ManifestV1Signed,
    /// Schema 1 manifest (deprecated)
    #[serde(rename = "application/vnd.docker.distribution.manifest.v1+json")]
    ManifestV1,
    /// Schema 2 manifest
    #[default]
    #[serde(rename = "application/vnd.docker.distribution.manifest.v2+json")]
    ManifestV2,
    /// Manifest list
    #[serde(rename = "application/vnd.docker.distribution.manifest.list.v2+json")]
    ManifestListV2,
    /// Container configuration
    #[serde(rename = "application/vnd.docker.container.image.v1+json")]
    ContainerConfigV1,
    /// Gzipped tar layer
    #[serde(rename = "application/vnd.docker.image.rootfs.diff.tar.gzip")]
    LayerTarGzip,
    /// Foreign gzipped tar layer
    #[serde(rename = "application/vnd.docker.image.rootfs.foreign.diff.tar.gzip")]
    ForeignLayerTarGzip,
    /// Plugin configuration
    #[serde(rename = "application/vnd.docker.plugin.v1+json")]
    PluginConfigV1,
}

impl MediaType {
    /// All the recognized media types
    pub const ALL: [MediaType; 8] = [
        MediaType::ManifestV1Signed,
        MediaType::ManifestV1,
        MediaType::ManifestV2,
        MediaType::ManifestListV2,
        MediaType::ContainerConfigV1,
        MediaType::LayerTarGzip,
        MediaType::ForeignLayerTarGzip,
        MediaType::PluginConfigV1,
    ];

    /// The wire representation of the media type
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::ManifestV1Signed => MANIFEST_V1_SIGNED_MEDIA_TYPE,
            MediaType::ManifestV1 => MANIFEST_V1_MEDIA_TYPE,
            MediaType::ManifestV2 => MANIFEST_V2_MEDIA_TYPE,
            MediaType::ManifestListV2 => MANIFEST_LIST_V2_MEDIA_TYPE,
            MediaType::ContainerConfigV1 => CONTAINER_CONFIG_V1_MEDIA_TYPE,
            MediaType::LayerTarGzip => LAYER_TAR_GZIP_MEDIA_TYPE,
            MediaType::ForeignLayerTarGzip => FOREIGN_LAYER_TAR_GZIP_MEDIA_TYPE,
            MediaType::PluginConfigV1 => PLUGIN_CONFIG_V1_MEDIA_TYPE,
        }
    }

    /// Whether this is one of the legacy schema 1 manifest types
    pub fn is_schema1(&self) -> bool {
        matches!(self, MediaType::ManifestV1Signed | MediaType::ManifestV1)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MediaType::ALL
            .into_iter()
            .find(|media_type| media_type.as_str() == s)
            .ok_or_else(|| RegistryError::validation(".", format!("unknown media type {s:?}")))
    }
}
