//! Typed view over the headers of a registry response

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use http::header::HeaderMap;
use tracing::debug;
use url::Url;

use crate::client::ClientRef;
use crate::digest::{Digest, DOCKER_DIGEST_HEADER};
use crate::errors::{RegistryError, Result};
use crate::regexp;
use crate::response::{Attach, RegistryResponse};

/// Format of the `Date` header, e.g. `Sat, 01 Apr 2023 23:18:26 GMT`
const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Pagination cursor extracted from a `Link` header
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
    /// Last entry of the current page, where the next page starts after
    pub last: String,
    /// Page size
    pub size: u64,
}

impl Link {
    /// Parse a `<uri?last=X&n=Y>; rel="next"` header value
    pub fn parse(value: &str) -> Option<Self> {
        let uri = regexp::LINK_URI.captures(value)?.name("uri")?.as_str();
        // the uri is usually relative to the registry root
        let url = Url::parse("http://registry.invalid/").ok()?.join(uri).ok()?;
        let mut last = None;
        let mut size = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "last" if last.is_none() => last = Some(value.into_owned()),
                "n" if size.is_none() => size = value.parse().ok(),
                _ => {}
            }
        }
        Some(Self {
            last: last?,
            size: size?,
        })
    }
}

/// A byte interval from a `Range` or `Content-Range` header
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Range {
    /// First byte of the interval
    pub start: u64,
    /// Last byte of the interval
    pub offset: u64,
}

impl Range {
    /// Parse `bytes=<start>-<offset>` or `<start>-<offset>`
    pub fn parse(value: &str) -> Option<Self> {
        let captures = regexp::RANGE.captures(value)?;
        Some(Self {
            start: captures.name("start")?.as_str().parse().ok()?,
            offset: captures.name("offset")?.as_str().parse().ok()?,
        })
    }

    /// The unit of the interval, always `bytes`
    pub fn unit(&self) -> &'static str {
        "bytes"
    }
}

/// A decomposed `Location` header.
///
/// A location that came with a response issued by a [`crate::Client`] can be
/// followed with [`Location::go`].
#[derive(Clone, Debug, Default)]
pub struct Location {
    /// The absolute URL
    pub url: String,
    /// `http` or `https`
    pub scheme: String,
    /// `<host>[:<port>]`
    pub netloc: String,
    /// Path, without its parameters
    pub path: String,
    /// `;` separated parameters of the last path segment
    pub params: BTreeMap<String, String>,
    /// Query string, first value of each key
    pub query: BTreeMap<String, String>,
    /// Fragment
    pub fragment: String,
    client: Option<ClientRef>,
}

impl Location {
    /// Parse a `Location` value, resolving relative references against `base`
    pub fn parse(value: &str, base: Option<&Url>) -> Option<Self> {
        let url = match (Url::parse(value), base) {
            (Ok(url), _) => url,
            (Err(url::ParseError::RelativeUrlWithoutBase), Some(base)) => base.join(value).ok()?,
            (Err(e), _) => {
                debug!(location = value, error = %e, "Ignoring unparsable location");
                return None;
            }
        };
        Some(Self::from_url(url))
    }

    fn from_url(url: Url) -> Self {
        let netloc = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        };

        let (path, params) = split_params(url.path());
        let params = params
            .map(|params| {
                params
                    .split(';')
                    .flat_map(|pair| url::form_urlencoded::parse(pair.as_bytes()))
                    .filter(|(_, value)| !value.is_empty())
                    .fold(BTreeMap::new(), |mut map, (key, value)| {
                        map.entry(key.into_owned()).or_insert(value.into_owned());
                        map
                    })
            })
            .unwrap_or_default();

        let query = url
            .query_pairs()
            .filter(|(_, value)| !value.is_empty())
            .fold(BTreeMap::new(), |mut map, (key, value)| {
                map.entry(key.into_owned()).or_insert(value.into_owned());
                map
            });

        Self {
            scheme: url.scheme().to_string(),
            netloc,
            path: path.to_string(),
            params,
            query,
            fragment: url.fragment().unwrap_or_default().to_string(),
            url: url.to_string(),
            client: None,
        }
    }

    /// `scheme://netloc/path`, what [`Location::go`] requests
    pub fn target(&self) -> String {
        format!("{}://{}{}", self.scheme, self.netloc, self.path)
    }

    /// Issue a GET request to this location with the client that received it
    pub async fn go(&self) -> Result<RegistryResponse<()>> {
        let client = self
            .client
            .as_ref()
            .ok_or(RegistryError::Detached("location was not received by a client"))?
            .upgrade()
            .ok_or(RegistryError::Detached("the client has been dropped"))?;
        client.follow(self).await
    }
}

/// Split `;`-separated parameters from the last segment of a path
fn split_params(path: &str) -> (&str, Option<&str>) {
    let segment_start = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match path[segment_start..].find(';') {
        Some(i) => (
            &path[..segment_start + i],
            Some(&path[segment_start + i + 1..]),
        ),
        None => (path, None),
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
            && self.scheme == other.scheme
            && self.netloc == other.netloc
            && self.path == other.path
            && self.params == other.params
            && self.query == other.query
            && self.fragment == other.fragment
    }
}

impl Attach for Location {
    fn attach(&mut self, client: &ClientRef, _name: Option<&str>) {
        self.client = Some(client.clone());
    }
}

/// The headers of a registry response.
///
/// Text headers default to empty strings and structured ones to `None` when
/// absent or malformed; only an invalid `Docker-Content-Digest` is an error.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Headers {
    /// Media type of the body
    pub content_type: String,
    /// API version marker, `registry/2.0`
    pub docker_distribution_api_version: String,
    /// Content type sniffing marker
    pub x_content_type_options: String,
    /// Authentication challenge
    pub www_authenticate: String,
    /// Digest of the targeted content
    pub docker_content_digest: Option<Digest>,
    /// Upload session id
    pub docker_upload_uuid: String,
    /// Version of the resource
    pub etag: String,
    /// Origin date of the response
    pub date: Option<DateTime<Utc>>,
    /// Bytes received so far by an upload session
    pub range: Option<Range>,
    /// Where the resource, or the upload session, lives
    pub location: Option<Location>,
    /// Size of the body
    pub content_length: Option<u64>,
    /// Bytes interval of an uploaded chunk
    pub content_range: Option<Range>,
    /// Accepted range unit
    pub accept_ranges: String,
    /// Next page of a paginated listing
    pub link: Option<Link>,
}

impl Headers {
    /// Parse raw response headers.
    ///
    /// `request_url` is used to resolve a relative `Location`.
    pub fn from_header_map(map: &HeaderMap, request_url: Option<&Url>) -> Result<Self> {
        let text = |name: &str| {
            map.get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };
        let owned = |name: &str| text(name).map(str::to_string).unwrap_or_default();

        let docker_content_digest = text(DOCKER_DIGEST_HEADER)
            .map(Digest::new)
            .transpose()
            .map_err(|e| RegistryError::validation(".docker-content-digest", e))?;

        Ok(Self {
            content_type: owned("content-type"),
            docker_distribution_api_version: owned("docker-distribution-api-version"),
            x_content_type_options: owned("x-content-type-options"),
            www_authenticate: owned("www-authenticate"),
            docker_content_digest,
            docker_upload_uuid: owned("docker-upload-uuid"),
            etag: owned("etag"),
            date: text("date").and_then(parse_date),
            range: text("range").and_then(Range::parse),
            location: text("location").and_then(|value| Location::parse(value, request_url)),
            content_length: text("content-length").and_then(|value| value.parse().ok()),
            content_range: text("content-range").and_then(Range::parse),
            accept_ranges: owned("accept-ranges"),
            link: text("link").and_then(Link::parse),
        })
    }
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, DATE_FORMAT)
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}
