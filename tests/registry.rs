// Tests against a fake registry speaking the Docker registry HTTP API v2
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use drav2::{
    api_error::ErrorCode,
    client::ClientProtocol,
    headers::Range,
    media_type::{
        LAYER_TAR_GZIP_MEDIA_TYPE, MANIFEST_V1_SIGNED_MEDIA_TYPE, MANIFEST_V2_MEDIA_TYPE,
    },
    Blob, Client, ClientConfig, Digest, Manifest, MediaType, RegistryAuth, RegistryError,
    ResponseBody, Status,
};
use futures_util::StreamExt;
use tokio::{net::TcpListener, task::JoinHandle};

static BLOB: &[u8] = b"hello world!";
const UPLOAD_UUID: &str = "6a2ed7e4-0d5d-4a1b-9a2b-0d1d6a3bd1f2";

lazy_static::lazy_static! {
    static ref BLOB_DIGEST: String = Digest::from_content(BLOB).to_string();
    static ref MANIFEST_V2: String = format!(
        r#"{{
            "schemaVersion": 2,
            "mediaType": "{MANIFEST_V2_MEDIA_TYPE}",
            "config": {{
                "mediaType": "application/vnd.docker.container.image.v1+json",
                "size": 7023,
                "digest": "sha256:b5b2b2c507a0944348e0303114d8d93aaaa081732b86451d9bce1f432a537bc7"
            }},
            "layers": [
                {{"mediaType": "{LAYER_TAR_GZIP_MEDIA_TYPE}", "size": 12, "digest": "{}"}},
                {{"mediaType": "{LAYER_TAR_GZIP_MEDIA_TYPE}", "size": 30, "digest": null}}
            ]
        }}"#,
        BLOB_DIGEST.as_str()
    );
    static ref MANIFEST_V1: String = format!(
        r#"{{
            "schemaVersion": 1,
            "name": "python",
            "tag": "2.7",
            "architecture": "amd64",
            "fsLayers": [{{"blobSum": "{}"}}],
            "history": [{{"v1Compatibility": "{{}}"}}],
            "signatures": null
        }}"#,
        BLOB_DIGEST.as_str()
    );
}

#[derive(Default)]
struct Recorder {
    blob_hits: AtomicUsize,
    authorizations: Mutex<Vec<Option<String>>>,
    upload_queries: Mutex<Vec<HashMap<String, String>>>,
}

impl Recorder {
    fn record_auth(&self, headers: &HeaderMap) {
        let auth = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.authorizations.lock().unwrap().push(auth);
    }

    fn last_auth(&self) -> Option<String> {
        self.authorizations.lock().unwrap().last().cloned().flatten()
    }
}

type AppState = Arc<Recorder>;

fn registry_errors(status: StatusCode, code: &str, message: &str) -> Response {
    let body = format!(
        r#"{{"errors": [{{"code": "{code}", "message": "{message}", "detail": null}}]}}"#
    );
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

fn upload_location(name: &str) -> String {
    format!("/v2/{name}/blobs/uploads/{UPLOAD_UUID}?_state=opaque")
}

async fn version_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    state.record_auth(&headers);
    (
        StatusCode::OK,
        [("Docker-Distribution-API-Version", "registry/2.0")],
        "{}",
    )
        .into_response()
}

async fn catalog_handler(Query(query): Query<HashMap<String, String>>) -> Response {
    let n = query.get("n").cloned().unwrap_or_else(|| "100".into());
    let last = query.get("last").cloned().unwrap_or_default();
    (
        [(
            header::LINK,
            format!(r#"</v2/_catalog?last=debian&n={n}>; rel="next""#),
        )],
        format!(r#"{{"repositories": ["{last}-next", "debian"]}}"#),
    )
        .into_response()
}

async fn tags_handler(Path(name): Path<String>) -> Response {
    match name.as_str() {
        "secret" => registry_errors(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "authentication required",
        ),
        "teapot" => StatusCode::IM_A_TEAPOT.into_response(),
        _ => format!(r#"{{"name": "{name}", "tags": null}}"#).into_response(),
    }
}

async fn get_manifest_handler(
    Path((_name, reference)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if reference == "broken" {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            "<html><body>upstream connect error</body></html>",
        )
            .into_response();
    }
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if accept == MANIFEST_V1_SIGNED_MEDIA_TYPE {
        ([(header::CONTENT_TYPE, accept.to_string())], MANIFEST_V1.clone()).into_response()
    } else if accept != MANIFEST_V2_MEDIA_TYPE {
        registry_errors(StatusCode::BAD_REQUEST, "UNSUPPORTED", "unsupported media type")
    } else {
        (
            [
                (header::CONTENT_TYPE, MANIFEST_V2_MEDIA_TYPE.to_string()),
                (
                    header::HeaderName::from_static("docker-content-digest"),
                    Digest::from_content(MANIFEST_V2.as_bytes()).to_string(),
                ),
            ],
            MANIFEST_V2.clone(),
        )
            .into_response()
    }
}

async fn put_manifest_handler(
    Path((name, reference)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if content_type != MANIFEST_V2_MEDIA_TYPE
        || serde_json::from_slice::<serde_json::Value>(&body).is_err()
    {
        return registry_errors(StatusCode::BAD_REQUEST, "MANIFEST_INVALID", "manifest invalid");
    }
    (
        StatusCode::CREATED,
        [
            (header::LOCATION, format!("/v2/{name}/manifests/{reference}")),
            (
                header::HeaderName::from_static("docker-content-digest"),
                Digest::from_content(&body).to_string(),
            ),
        ],
    )
        .into_response()
}

async fn delete_manifest_handler() -> StatusCode {
    StatusCode::ACCEPTED
}

async fn blob_handler(
    State(state): State<AppState>,
    Path((_name, digest)): Path<(String, String)>,
) -> Response {
    state.blob_hits.fetch_add(1, Ordering::SeqCst);
    if digest == BLOB_DIGEST.as_str() {
        ([(header::CONTENT_TYPE, "application/octet-stream")], BLOB).into_response()
    } else {
        registry_errors(StatusCode::NOT_FOUND, "BLOB_UNKNOWN", "blob unknown to registry")
    }
}

async fn delete_blob_handler(Path((_name, digest)): Path<(String, String)>) -> Response {
    if digest == BLOB_DIGEST.as_str() {
        StatusCode::ACCEPTED.into_response()
    } else {
        registry_errors(StatusCode::NOT_FOUND, "BLOB_UNKNOWN", "blob unknown to registry")
    }
}

async fn initiate_upload_handler(
    Path(name): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    match query.get("digest") {
        Some(digest) if Digest::from_content(&body).as_str() == digest.as_str() => (
            StatusCode::CREATED,
            [
                (header::LOCATION, format!("/v2/{name}/blobs/{digest}")),
                (
                    header::HeaderName::from_static("docker-content-digest"),
                    digest.clone(),
                ),
            ],
        )
            .into_response(),
        Some(_) => registry_errors(StatusCode::BAD_REQUEST, "DIGEST_INVALID", "digest mismatch"),
        None => (
            StatusCode::ACCEPTED,
            [
                (header::LOCATION, upload_location(&name)),
                (header::RANGE, "0-0".to_string()),
                (
                    header::HeaderName::from_static("docker-upload-uuid"),
                    UPLOAD_UUID.to_string(),
                ),
            ],
        )
            .into_response(),
    }
}

async fn upload_status_handler(
    State(state): State<AppState>,
    Path((name, uuid)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    state.record_auth(&headers);
    state.upload_queries.lock().unwrap().push(query);
    if uuid != UPLOAD_UUID {
        return registry_errors(StatusCode::NOT_FOUND, "BLOB_UPLOAD_UNKNOWN", "upload unknown");
    }
    (
        StatusCode::NO_CONTENT,
        [
            (header::LOCATION, upload_location(&name)),
            (header::RANGE, "0-11".to_string()),
            (
                header::HeaderName::from_static("docker-upload-uuid"),
                uuid,
            ),
        ],
    )
        .into_response()
}

async fn patch_upload_handler(
    Path((name, _uuid)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    (
        StatusCode::ACCEPTED,
        [
            (header::LOCATION, upload_location(&name)),
            (header::RANGE, format!("0-{}", body.len().saturating_sub(1))),
        ],
    )
        .into_response()
}

async fn complete_upload_handler(
    Path((name, _uuid)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let digest = query.get("digest").cloned().unwrap_or_default();
    (
        StatusCode::CREATED,
        [
            (header::LOCATION, format!("/v2/{name}/blobs/{digest}")),
            (
                header::HeaderName::from_static("docker-content-digest"),
                digest,
            ),
        ],
    )
        .into_response()
}

async fn cancel_upload_handler() -> StatusCode {
    StatusCode::NO_CONTENT
}

struct FakeRegistry {
    handle: JoinHandle<()>,
    state: AppState,
    pub base_url: String,
}

impl Drop for FakeRegistry {
    fn drop(&mut self) {
        self.handle.abort()
    }
}

impl FakeRegistry {
    pub async fn new() -> Self {
        let state = AppState::default();
        let app = Router::new()
            .route("/v2/", get(version_handler))
            .route("/v2/_catalog", get(catalog_handler))
            .route("/v2/{name}/tags/list", get(tags_handler))
            .route(
                "/v2/{name}/manifests/{reference}",
                get(get_manifest_handler)
                    .put(put_manifest_handler)
                    .delete(delete_manifest_handler),
            )
            .route(
                "/v2/{name}/blobs/{digest}",
                get(blob_handler).delete(delete_blob_handler),
            )
            .route(
                "/v2/{name}/blobs/uploads/",
                axum::routing::post(initiate_upload_handler),
            )
            .route(
                "/v2/{name}/blobs/uploads/{uuid}",
                get(upload_status_handler)
                    .patch(patch_upload_handler)
                    .put(complete_upload_handler)
                    .delete(cancel_upload_handler),
            )
            .with_state(state.clone());

        let addr = SocketAddr::from(([127, 0, 0, 1], 0));
        let listener = TcpListener::bind(addr).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let base_url = format!("127.0.0.1:{}/v2/", port);
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            handle,
            state,
            base_url,
        }
    }

    fn client(&self, auth: RegistryAuth) -> Client {
        Client::new(
            &self.base_url,
            auth,
            ClientConfig {
                protocol: ClientProtocol::Http,
                ..Default::default()
            },
        )
        .expect("failed to create client")
    }
}

async fn collect(blob: Blob, chunk_size: usize) -> Vec<u8> {
    let mut stream = blob.iter_bytes(chunk_size);
    let mut content = Vec::new();
    while let Some(chunk) = stream.next().await {
        content.extend_from_slice(&chunk.expect("chunk"));
    }
    content
}

#[tokio::test]
async fn test_check_version_sends_basic_auth() {
    let registry = FakeRegistry::new().await;

    let client = registry.client(RegistryAuth::Basic("user".into(), "pass".into()));
    let response = client.check_version().await.expect("request failed");
    assert_eq!(response.status, Status::Ok);
    assert_eq!(response.headers.docker_distribution_api_version, "registry/2.0");
    assert!(response.body.is_empty());
    assert_eq!(registry.state.last_auth().as_deref(), Some("Basic dXNlcjpwYXNz"));

    let anonymous = registry.client(RegistryAuth::from_parts(Some("user"), None));
    anonymous.check_version().await.expect("request failed");
    assert_eq!(registry.state.last_auth(), None);
}

#[tokio::test]
async fn test_catalog_pagination() {
    let registry = FakeRegistry::new().await;
    let client = registry.client(RegistryAuth::Anonymous);

    let response = client
        .get_catalog(Some(2), Some("alpine"))
        .await
        .expect("request failed");
    assert_eq!(response.status, Status::Ok);
    let link = response.headers.link.clone().expect("missing link");
    assert_eq!((link.last.as_str(), link.size), ("debian", 2));
    let catalog = response.into_model().unwrap().unwrap();
    assert_eq!(catalog.repositories, vec!["alpine-next", "debian"]);
}

#[tokio::test]
async fn test_tags_null_list_is_empty() {
    let registry = FakeRegistry::new().await;
    let client = registry.client(RegistryAuth::Anonymous);

    let tags = client
        .get_tags("python", None, None)
        .await
        .unwrap()
        .into_model()
        .unwrap()
        .unwrap();
    assert_eq!(tags.name, "python");
    assert!(tags.tags.is_empty());
}

#[tokio::test]
async fn test_client_errors_are_decoded() {
    let registry = FakeRegistry::new().await;
    let client = registry.client(RegistryAuth::Anonymous);

    let response = client.get_tags("secret", None, None).await.unwrap();
    assert_eq!(response.status, Status::Unauthorized);
    let errors = response.body.errors().expect("expected registry errors");
    assert_eq!(errors.errors.len(), 1);
    assert_eq!(errors.errors[0].code, Some(ErrorCode::Unauthorized));
    assert_eq!(errors.errors[0].message, "authentication required");

    match response.into_model() {
        Err(RegistryError::Registry { status, errors }) => {
            assert_eq!(status, Status::Unauthorized);
            assert!(errors.contains(&ErrorCode::Unauthorized));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_server_errors_are_synthesized() {
    let registry = FakeRegistry::new().await;
    let client = registry.client(RegistryAuth::Anonymous);

    let response = client
        .get_manifest("python", "broken", None)
        .await
        .unwrap();
    assert_eq!(response.status, Status::ServiceUnavailable);
    assert_eq!(
        response.body.errors(),
        Some(&drav2::api_error::Errors::internal())
    );
}

#[tokio::test]
async fn test_manifest_defaults_to_schema_2() {
    let registry = FakeRegistry::new().await;
    let client = registry.client(RegistryAuth::Anonymous);

    let response = client.get_manifest("python", "latest", None).await.unwrap();
    assert_eq!(response.status, Status::Ok);
    let manifest = response.into_model().unwrap().unwrap();
    assert_eq!(manifest.media_type(), MediaType::ManifestV2);
    assert_eq!(manifest.as_v2().unwrap().layers.len(), 2);

    let response = client
        .get_manifest("python", "latest", Some(MediaType::ManifestListV2))
        .await
        .unwrap();
    assert_eq!(response.status, Status::BadRequest);
    assert!(response.body.errors().unwrap().contains(&ErrorCode::Unsupported));
}

#[tokio::test]
async fn test_unexpected_status_is_rejected() {
    let registry = FakeRegistry::new().await;
    let client = registry.client(RegistryAuth::Anonymous);

    assert!(matches!(
        client.get_tags("teapot", None, None).await,
        Err(RegistryError::UnexpectedStatus(418))
    ));
}

#[tokio::test]
async fn test_manifest_v2_layers_fetch_their_blob() {
    let registry = FakeRegistry::new().await;
    let client = registry.client(RegistryAuth::Anonymous);

    let response = client
        .get_manifest("python", "latest", Some(MediaType::ManifestV2))
        .await
        .unwrap();
    assert_eq!(response.status, Status::Ok);
    assert_eq!(
        response.headers.docker_content_digest,
        Some(Digest::from_content(MANIFEST_V2.as_bytes()))
    );
    let manifest = match response.body {
        ResponseBody::Model(Manifest::V2(manifest)) => manifest,
        other => panic!("unexpected body: {other:?}"),
    };
    assert_eq!(manifest.total_size(), 42);
    for layer in &manifest.layers {
        assert_eq!(layer.repository_name(), Some("python"));
        assert!(layer.is_attached_to(&client));
    }

    let blob = manifest.layers[0]
        .get_blob(false)
        .await
        .unwrap()
        .into_model()
        .unwrap()
        .unwrap();
    assert_eq!(blob.content().unwrap().as_ref(), BLOB);
    assert_eq!(registry.state.blob_hits.load(Ordering::SeqCst), 1);

    // the second layer has no digest, nothing is requested
    assert!(matches!(
        manifest.layers[1].get_blob(false).await,
        Err(RegistryError::Detached(_))
    ));
    assert_eq!(registry.state.blob_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_layers_outlive_their_client() {
    let registry = FakeRegistry::new().await;
    let client = registry.client(RegistryAuth::Anonymous);

    let manifest = client
        .get_manifest("python", "latest", Some(MediaType::ManifestV2))
        .await
        .unwrap()
        .into_model()
        .unwrap()
        .unwrap();
    drop(client);

    let manifest = manifest.as_v2().unwrap();
    assert!(matches!(
        manifest.layers[0].get_blob(false).await,
        Err(RegistryError::Detached(_))
    ));
    assert_eq!(registry.state.blob_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_manifest_v1_layers_use_manifest_name() {
    let registry = FakeRegistry::new().await;
    let client = registry.client(RegistryAuth::Anonymous);

    let manifest = client
        .get_manifest("library-python", "2.7", Some(MediaType::ManifestV1Signed))
        .await
        .unwrap()
        .into_model()
        .unwrap()
        .unwrap();
    let manifest = manifest.as_v1().expect("expected a schema 1 manifest");
    assert_eq!(manifest.tag, "2.7");
    assert!(manifest.signatures.is_empty());
    assert!(manifest.history_matches_layers());
    assert_eq!(manifest.fs_layers[0].repository_name(), Some("python"));

    let blob = manifest.fs_layers[0]
        .get_blob(true)
        .await
        .unwrap()
        .into_model()
        .unwrap()
        .unwrap();
    assert_eq!(collect(blob, 5).await, BLOB);
}

#[tokio::test]
async fn test_streamed_blob() {
    let registry = FakeRegistry::new().await;
    let client = registry.client(RegistryAuth::Anonymous);

    let response = client
        .get_blob("python", &BLOB_DIGEST.to_uppercase().replace("SHA256", "sha256"), true)
        .await
        .unwrap();
    assert_eq!(response.status, Status::Ok);
    assert_eq!(response.headers.content_length, Some(BLOB.len() as u64));
    let blob = response.into_model().unwrap().unwrap();
    assert!(blob.is_streamed());
    assert!(matches!(blob.content(), Err(RegistryError::Unreadable)));
    assert_eq!(collect(blob, 4).await, BLOB);
}

#[tokio::test]
async fn test_unknown_blob() {
    let registry = FakeRegistry::new().await;
    let client = registry.client(RegistryAuth::Anonymous);

    let response = client
        .get_blob("python", &Digest::from_content(b"nope").to_string(), false)
        .await
        .unwrap();
    assert_eq!(response.status, Status::NotFound);
    assert!(response.body.errors().unwrap().contains(&ErrorCode::BlobUnknown));
}

#[tokio::test]
async fn test_delete_blob() {
    let registry = FakeRegistry::new().await;
    let client = registry.client(RegistryAuth::Anonymous);

    let response = client.delete_blob("python", &BLOB_DIGEST).await.unwrap();
    assert_eq!(response.status, Status::Accepted);
    assert!(response.body.is_empty());

    let response = client
        .delete_blob("python", &Digest::from_content(b"nope").to_string())
        .await
        .unwrap();
    assert_eq!(response.status, Status::NotFound);
    assert!(response.body.errors().unwrap().contains(&ErrorCode::BlobUnknown));

    assert!(matches!(
        client.delete_blob("python", "sha256:abc").await,
        Err(RegistryError::InvalidDigest(_))
    ));
}

#[tokio::test]
async fn test_put_and_delete_manifest() {
    let registry = FakeRegistry::new().await;
    let client = registry.client(RegistryAuth::Anonymous);

    let manifest = Manifest::from_slice(MANIFEST_V2.as_bytes(), MediaType::ManifestV2).unwrap();
    let response = client.put_manifest("python", "latest", &manifest).await.unwrap();
    assert_eq!(response.status, Status::Created);
    assert!(response.headers.docker_content_digest.is_some());
    let location = response.headers.location.as_ref().unwrap();
    assert_eq!(location.path, "/v2/python/manifests/latest");

    let response = client.delete_manifest("python", "latest").await.unwrap();
    assert_eq!(response.status, Status::Accepted);
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn test_chunked_upload_flow() {
    let registry = FakeRegistry::new().await;
    let client = registry.client(RegistryAuth::Basic("user".into(), "pass".into()));

    let response = client
        .initiate_blob_upload("python", None, None)
        .await
        .unwrap();
    assert_eq!(response.status, Status::Accepted);
    assert_eq!(response.headers.docker_upload_uuid, UPLOAD_UUID);
    assert_eq!(response.headers.range, Some(Range { start: 0, offset: 0 }));
    let location = response.headers.location.clone().expect("missing location");
    assert_eq!(location.query.get("_state").map(String::as_str), Some("opaque"));

    // following the location reuses the client and its credentials
    let status = location.go().await.unwrap();
    assert_eq!(status.status, Status::NoContent);
    assert_eq!(status.headers.range, Some(Range { start: 0, offset: 11 }));
    assert_eq!(registry.state.last_auth().as_deref(), Some("Basic dXNlcjpwYXNz"));
    assert_eq!(
        registry.state.upload_queries.lock().unwrap()[0]
            .get("_state")
            .map(String::as_str),
        Some("opaque")
    );

    let response = client.get_blob_upload("python", UPLOAD_UUID).await.unwrap();
    assert_eq!(response.status, Status::NoContent);

    let response = client
        .patch_blob_upload("python", UPLOAD_UUID, Bytes::from_static(BLOB))
        .await
        .unwrap();
    assert_eq!(response.status, Status::Accepted);
    assert_eq!(response.headers.range, Some(Range { start: 0, offset: 11 }));

    let response = client
        .complete_blob_upload("python", UPLOAD_UUID, &BLOB_DIGEST, None)
        .await
        .unwrap();
    assert_eq!(response.status, Status::Created);
    assert_eq!(
        response.headers.docker_content_digest.as_ref().map(Digest::as_str),
        Some(BLOB_DIGEST.as_str())
    );

    let response = client.cancel_blob_upload("python", UPLOAD_UUID).await.unwrap();
    assert_eq!(response.status, Status::NoContent);

    let response = client.get_blob_upload("python", "unknown").await.unwrap();
    assert_eq!(response.status, Status::NotFound);
    assert!(response
        .body
        .errors()
        .unwrap()
        .contains(&ErrorCode::BlobUploadUnknown));
}

#[tokio::test]
async fn test_monolithic_upload() {
    let registry = FakeRegistry::new().await;
    let client = registry.client(RegistryAuth::Anonymous);

    let response = client
        .initiate_blob_upload("python", Some(BLOB_DIGEST.as_str()), Some(Bytes::from_static(BLOB)))
        .await
        .unwrap();
    assert_eq!(response.status, Status::Created);
    assert_eq!(
        response.headers.location.as_ref().map(|l| l.path.clone()),
        Some(format!("/v2/python/blobs/{}", BLOB_DIGEST.as_str()))
    );

    let wrong = Digest::from_content(b"something else").to_string();
    let response = client
        .initiate_blob_upload("python", Some(wrong.as_str()), Some(Bytes::from_static(BLOB)))
        .await
        .unwrap();
    assert_eq!(response.status, Status::BadRequest);
    assert!(response.body.errors().unwrap().contains(&ErrorCode::DigestInvalid));
}
