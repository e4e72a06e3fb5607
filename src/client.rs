//! Docker registry HTTP API v2 client
//!
//! Every operation maps to one request. Whatever the outcome, as long as the
//! registry answered with an expected status code the answer is returned as a
//! [`RegistryResponse`]: errors reported by the registry are data, found in
//! [`ResponseBody::Errors`], and only transport failures, unexpected status
//! codes and undecodable payloads surface as a [`RegistryError`].

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use bytes::Bytes;
use futures_util::TryStreamExt;
use http::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::api_error::Errors;
use crate::blob::Blob;
use crate::catalog::{Catalog, Tags};
use crate::coerce::from_slice;
use crate::digest::Digest;
use crate::errors::{RegistryError, Result};
use crate::headers::{Headers, Location};
use crate::manifest::Manifest;
use crate::media_type::MediaType;
use crate::response::{Attach, RegistryResponse, ResponseBody, Status};
use crate::secrets::{Authenticable, RegistryAuth};

const OCTET_STREAM: &str = "application/octet-stream";

/// The user agent sent when none is configured
pub const DEFAULT_USER_AGENT: &str = concat!("drav2/", env!("CARGO_PKG_VERSION"));

/// The encoding of the certificate
#[derive(Debug, Clone)]
pub enum CertificateEncoding {
    #[allow(missing_docs)]
    Der,
    #[allow(missing_docs)]
    Pem,
}

/// A x509 certificate
#[derive(Debug, Clone)]
pub struct Certificate {
    /// Which encoding is used by the certificate
    pub encoding: CertificateEncoding,

    /// Actual certificate
    pub data: Vec<u8>,
}

/// The protocol used when the base URL given to [`Client::new`] has no scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClientProtocol {
    #[allow(missing_docs)]
    Http,
    #[allow(missing_docs)]
    #[default]
    Https,
}

impl ClientProtocol {
    fn scheme(&self) -> &'static str {
        match self {
            ClientProtocol::Https => "https",
            ClientProtocol::Http => "http",
        }
    }
}

/// A client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Which protocol the client should use when the base URL does not say
    pub protocol: ClientProtocol,

    /// Accept invalid hostname. Defaults to false
    #[cfg(feature = "native-tls")]
    pub accept_invalid_hostnames: bool,

    /// Accept invalid certificates. Defaults to false
    pub accept_invalid_certificates: bool,

    /// A list of extra root certificate to trust. This can be used to connect
    /// to servers using self-signed certificates
    pub extra_root_certificates: Vec<Certificate>,

    /// Timeout applied to every request, from connection to the end of the
    /// body. Streamed blobs must be consumed within it. Defaults to none.
    pub timeout: Option<Duration>,

    /// The `User-Agent` header. Defaults to [`DEFAULT_USER_AGENT`]
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            protocol: ClientProtocol::default(),
            #[cfg(feature = "native-tls")]
            accept_invalid_hostnames: false,
            accept_invalid_certificates: false,
            extra_root_certificates: Vec::new(),
            timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

struct ClientInner {
    base_url: Url,
    auth_header: Option<HeaderValue>,
    client: reqwest::Client,
}

/// A client for a single registry.
///
/// Cloning is cheap and clones share the same connection pool.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

/// A non-owning handle on a [`Client`].
///
/// Values returned by a client keep one of these to call back into it, so
/// they never keep the client alive on their own.
#[derive(Clone, Default)]
pub struct ClientRef(Weak<ClientInner>);

impl ClientRef {
    /// The client, unless every handle on it has been dropped
    pub fn upgrade(&self) -> Option<Client> {
        self.0.upgrade().map(|inner| Client { inner })
    }

    /// Whether this handle refers to `client` or one of its clones
    pub fn points_to(&self, client: &Client) -> bool {
        std::ptr::eq(self.0.as_ptr(), Arc::as_ptr(&client.inner))
    }
}

impl fmt::Debug for ClientRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.upgrade() {
            Some(inner) => write!(f, "ClientRef({})", inner.base_url),
            None => f.write_str("ClientRef(<dropped>)"),
        }
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.inner.base_url.as_str())
            .field("authenticated", &self.inner.auth_header.is_some())
            .finish()
    }
}

/// Make `base_url` absolute and ensure it ends with a `/` so that it can be joined
fn normalize_base_url(base_url: &str, protocol: ClientProtocol) -> Result<Url> {
    let base_url = base_url.trim();
    let mut url = if base_url.contains("://") {
        Url::parse(base_url)?
    } else {
        Url::parse(&format!("{}://{}", protocol.scheme(), base_url))?
    };
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn build_http_client(config: &ClientConfig) -> Result<reqwest::Client> {
    #[allow(unused_mut)]
    let mut client_builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
    #[cfg(not(target_arch = "wasm32"))]
    let mut client_builder =
        client_builder.danger_accept_invalid_certs(config.accept_invalid_certificates);

    client_builder = match () {
        #[cfg(all(feature = "native-tls", not(target_arch = "wasm32")))]
        () => client_builder.danger_accept_invalid_hostnames(config.accept_invalid_hostnames),
        #[cfg(any(not(feature = "native-tls"), target_arch = "wasm32"))]
        () => client_builder,
    };

    #[cfg(not(target_arch = "wasm32"))]
    for c in &config.extra_root_certificates {
        let cert = match c.encoding {
            CertificateEncoding::Der => reqwest::Certificate::from_der(c.data.as_slice())?,
            CertificateEncoding::Pem => reqwest::Certificate::from_pem(c.data.as_slice())?,
        };
        client_builder = client_builder.add_root_certificate(cert);
    }

    #[cfg(not(target_arch = "wasm32"))]
    if let Some(timeout) = config.timeout {
        client_builder = client_builder.timeout(timeout);
    }

    Ok(client_builder.build()?)
}

async fn no_body<T>(_response: reqwest::Response) -> Result<Option<T>> {
    Ok(None)
}

async fn json_body<T: DeserializeOwned>(response: reqwest::Response) -> Result<Option<T>> {
    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Ok(None);
    }
    from_slice(&bytes).map(Some)
}

async fn manifest_body(
    response: reqwest::Response,
    media_type: MediaType,
) -> Result<Option<Manifest>> {
    let bytes = response.bytes().await?;
    if bytes.is_empty() {
        return Ok(None);
    }
    Manifest::from_slice(&bytes, media_type).map(Some)
}

async fn blob_body(response: reqwest::Response, stream: bool) -> Result<Option<Blob>> {
    if !stream {
        return Ok(Some(Blob::buffered(response.bytes().await?)));
    }
    let content_length = response.content_length();
    let bytes = response
        .bytes_stream()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
    Ok(Some(Blob::from_stream(bytes, content_length)))
}

fn pagination(n: Option<u64>, last: Option<&str>) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(n) = n {
        query.push(("n", n.to_string()));
    }
    if let Some(last) = last {
        query.push(("last", last.to_string()));
    }
    query
}

impl Client {
    /// Create a client for the registry rooted at `base_url`, e.g.
    /// `https://registry.example.com/v2/`.
    ///
    /// The `Authorization` header is computed once here; incomplete
    /// credentials mean anonymous access.
    pub fn new(base_url: &str, auth: RegistryAuth, config: ClientConfig) -> Result<Self> {
        let base_url = normalize_base_url(base_url, config.protocol)?;
        let auth_header = auth.header_value()?;
        debug!(%base_url, authenticated = auth_header.is_some(), "Creating registry client");
        Ok(Self {
            inner: Arc::new(ClientInner {
                base_url,
                auth_header,
                client: build_http_client(&config)?,
            }),
        })
    }

    /// The `/v2/` root of the registry
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// A non-owning handle on this client
    pub fn downgrade(&self) -> ClientRef {
        ClientRef(Arc::downgrade(&self.inner))
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// Send `request` and classify the answer.
    ///
    /// 5xx bodies are never read and are replaced by a generic internal error.
    async fn respond<T, F, Fut>(
        &self,
        request: RequestBuilder,
        name: Option<&str>,
        decode: F,
    ) -> Result<RegistryResponse<T>>
    where
        T: Attach,
        F: FnOnce(reqwest::Response) -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        let response = request
            .apply_authentication(self.inner.auth_header.as_ref())
            .send()
            .await?;
        trace!(headers = ?response.headers(), "Got Headers");

        let status = Status::try_from(response.status().as_u16())?;
        let headers = Headers::from_header_map(response.headers(), Some(response.url()))?;
        let body = if status.is_server_error() {
            debug!(%status, "Registry failed, discarding the response body");
            ResponseBody::Errors(Errors::internal())
        } else if status.is_client_error() {
            let bytes = response.bytes().await?;
            let body = String::from_utf8_lossy(&bytes);
            debug!(%status, %body, "Registry rejected the request");
            if bytes.is_empty() {
                ResponseBody::Errors(Errors::default())
            } else {
                ResponseBody::Errors(from_slice(&bytes)?)
            }
        } else {
            match decode(response).await? {
                Some(model) => ResponseBody::Model(model),
                None => ResponseBody::Empty,
            }
        };
        Ok(RegistryResponse::with_client(status, headers, body, self, name))
    }

    /// Check that the endpoint implements the registry API v2
    pub async fn check_version(&self) -> Result<RegistryResponse<()>> {
        let url = self.inner.base_url.clone();
        debug!(%url, "Checking API version");
        self.respond(self.inner.client.get(url), None, no_body).await
    }

    /// List the repositories of the registry, `n` at a time, starting after `last`
    pub async fn get_catalog(
        &self,
        n: Option<u64>,
        last: Option<&str>,
    ) -> Result<RegistryResponse<Catalog>> {
        let url = self.url("_catalog")?;
        debug!(%url, ?n, ?last, "Listing repositories");
        let request = self.inner.client.get(url).query(&pagination(n, last));
        self.respond(request, None, json_body).await
    }

    /// List the tags of repository `name`, `n` at a time, starting after `last`
    pub async fn get_tags(
        &self,
        name: &str,
        n: Option<u64>,
        last: Option<&str>,
    ) -> Result<RegistryResponse<Tags>> {
        let url = self.url(&format!("{name}/tags/list"))?;
        debug!(%url, ?n, ?last, "Listing tags");
        let request = self.inner.client.get(url).query(&pagination(n, last));
        self.respond(request, Some(name), json_body).await
    }

    /// Fetch the manifest of `name` identified by a tag or a digest.
    ///
    /// `media_type`, [`MediaType::ManifestV2`] when `None`, is sent as `Accept`
    /// and selects the schema the payload is decoded with: schema 1 for both
    /// schema 1 media types, schema 2 otherwise. The layers of the returned
    /// manifest can fetch their own blob.
    pub async fn get_manifest(
        &self,
        name: &str,
        reference: &str,
        media_type: Option<MediaType>,
    ) -> Result<RegistryResponse<Manifest>> {
        let media_type = media_type.unwrap_or_default();
        let url = self.url(&format!("{name}/manifests/{reference}"))?;
        debug!(%url, %media_type, "Pulling manifest");
        let request = self.inner.client.get(url).header(ACCEPT, media_type.as_str());
        self.respond(request, Some(name), move |response| {
            manifest_body(response, media_type)
        })
        .await
    }

    /// Upload `manifest` to `name` under a tag or a digest
    pub async fn put_manifest(
        &self,
        name: &str,
        reference: &str,
        manifest: &Manifest,
    ) -> Result<RegistryResponse<()>> {
        let url = self.url(&format!("{name}/manifests/{reference}"))?;
        let content_type = manifest.media_type();
        debug!(%url, %content_type, "Pushing manifest");
        let request = self
            .inner
            .client
            .put(url)
            .header(CONTENT_TYPE, content_type.as_str())
            .body(serde_json::to_vec(manifest)?);
        self.respond(request, Some(name), no_body).await
    }

    /// Delete the manifest of `name` identified by `reference`
    pub async fn delete_manifest(
        &self,
        name: &str,
        reference: &str,
    ) -> Result<RegistryResponse<()>> {
        let url = self.url(&format!("{name}/manifests/{reference}"))?;
        debug!(%url, "Deleting manifest");
        self.respond(self.inner.client.delete(url), Some(name), no_body).await
    }

    /// Fetch the blob `digest` of repository `name`.
    ///
    /// With `stream`, the body is left on the wire and the returned blob can
    /// only be consumed through [`Blob::iter_bytes`].
    pub async fn get_blob(
        &self,
        name: &str,
        digest: &str,
        stream: bool,
    ) -> Result<RegistryResponse<Blob>> {
        let digest = Digest::new(digest)?;
        let url = self.url(&format!("{name}/blobs/{digest}"))?;
        debug!(%url, stream, "Pulling blob");
        self.respond(self.inner.client.get(url), Some(name), move |response| {
            blob_body(response, stream)
        })
        .await
    }

    /// Delete the blob `digest` of repository `name`
    pub async fn delete_blob(&self, name: &str, digest: &str) -> Result<RegistryResponse<()>> {
        let digest = Digest::new(digest)?;
        let url = self.url(&format!("{name}/blobs/{digest}"))?;
        debug!(%url, "Deleting blob");
        self.respond(self.inner.client.delete(url), Some(name), no_body).await
    }

    /// Open an upload session in repository `name`.
    ///
    /// Given the `digest` of the whole blob and its `content`, the upload is
    /// done in this single request. The session id and location are found in
    /// the headers of the response.
    pub async fn initiate_blob_upload(
        &self,
        name: &str,
        digest: Option<&str>,
        content: Option<Bytes>,
    ) -> Result<RegistryResponse<()>> {
        let digest = digest.map(Digest::new).transpose()?;
        let url = self.url(&format!("{name}/blobs/uploads/"))?;
        debug!(%url, monolithic = digest.is_some(), "Initiating blob upload");
        let mut request = self.inner.client.post(url);
        if let Some(digest) = &digest {
            request = request.query(&[("digest", digest.as_str())]);
        }
        if let Some(content) = content {
            request = request.header(CONTENT_TYPE, OCTET_STREAM).body(content);
        }
        self.respond(request, Some(name), no_body).await
    }

    /// Retrieve the state of upload session `uuid`, the received range is in
    /// the headers of the response
    pub async fn get_blob_upload(&self, name: &str, uuid: &str) -> Result<RegistryResponse<()>> {
        let url = self.url(&format!("{name}/blobs/uploads/{uuid}"))?;
        debug!(%url, "Checking blob upload");
        self.respond(self.inner.client.get(url), Some(name), no_body).await
    }

    /// Append `chunk` to upload session `uuid`
    pub async fn patch_blob_upload(
        &self,
        name: &str,
        uuid: &str,
        chunk: Bytes,
    ) -> Result<RegistryResponse<()>> {
        let url = self.url(&format!("{name}/blobs/uploads/{uuid}"))?;
        debug!(%url, size = chunk.len(), "Uploading blob chunk");
        let request = self
            .inner
            .client
            .patch(url)
            .header(CONTENT_TYPE, OCTET_STREAM)
            .body(chunk);
        self.respond(request, Some(name), no_body).await
    }

    /// Close upload session `uuid`, optionally with a last chunk, declaring the
    /// `digest` of the whole blob
    pub async fn complete_blob_upload(
        &self,
        name: &str,
        uuid: &str,
        digest: &str,
        content: Option<Bytes>,
    ) -> Result<RegistryResponse<()>> {
        let digest = Digest::new(digest)?;
        let url = self.url(&format!("{name}/blobs/uploads/{uuid}"))?;
        debug!(%url, %digest, "Completing blob upload");
        let mut request = self
            .inner
            .client
            .put(url)
            .query(&[("digest", digest.as_str())]);
        if let Some(content) = content {
            request = request.header(CONTENT_TYPE, OCTET_STREAM).body(content);
        }
        self.respond(request, Some(name), no_body).await
    }

    /// Abort upload session `uuid`
    pub async fn cancel_blob_upload(&self, name: &str, uuid: &str) -> Result<RegistryResponse<()>> {
        let url = self.url(&format!("{name}/blobs/uploads/{uuid}"))?;
        debug!(%url, "Cancelling blob upload");
        self.respond(self.inner.client.delete(url), Some(name), no_body).await
    }

    /// GET a location previously returned by the registry
    pub(crate) async fn follow(&self, location: &Location) -> Result<RegistryResponse<()>> {
        let url = Url::parse(&location.target())?;
        debug!(%url, "Following location");
        let request = self.inner.client.get(url).query(&location.query);
        self.respond(request, None, no_body).await
    }
}
