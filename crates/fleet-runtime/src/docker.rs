//! Docker Engine adapter.
//!
//! Speaks the Engine HTTP API over a unix socket (the default
//! `/var/run/docker.sock`) or a plain TCP endpoint. Each call opens a fresh
//! HTTP/1 connection, issues one request, and drives the connection in the
//! background until the response body has been read.
//!
//! # Endpoints used
//!
//! | Call | Engine endpoint |
//! |---|---|
//! | `list_running_units` | `GET /containers/json` |
//! | `list_networks` | `GET /networks` |
//! | `run_unit` | `POST /containers/create?name=` + `POST /containers/{id}/start` |
//! | `connect_network` | `POST /networks/{id}/connect` |
//! | `stop_unit` | `POST /containers/{id}/stop` |
//! | `remove_unit` | `DELETE /containers/{id}` |

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HOST, USER_AGENT};
use http::{Method, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1::SendRequest;
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};
use url::form_urlencoded;

use crate::adapter::{RuntimeAdapter, RuntimeFuture};
use crate::error::{RuntimeError, RuntimeResult};
use crate::types::{Network, Unit};

/// Default engine address when `DOCKER_HOST` is not set.
pub const DEFAULT_DOCKER_HOST: &str = "unix:///var/run/docker.sock";

/// Where the Docker Engine API listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DockerEndpoint {
    Unix(PathBuf),
    Tcp(String),
}

impl DockerEndpoint {
    /// Parse a `DOCKER_HOST`-style address (`unix:///path` or `tcp://host:port`).
    pub fn parse(host: &str) -> RuntimeResult<Self> {
        if let Some(path) = host.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(RuntimeError::Connect(format!("empty socket path in {host}")));
            }
            Ok(Self::Unix(PathBuf::from(path)))
        } else if let Some(addr) = host.strip_prefix("tcp://") {
            let addr = addr.trim_end_matches('/');
            if addr.is_empty() {
                return Err(RuntimeError::Connect(format!("empty address in {host}")));
            }
            Ok(Self::Tcp(addr.to_string()))
        } else {
            Err(RuntimeError::Connect(format!(
                "unsupported docker host {host:?} (expected unix:// or tcp://)"
            )))
        }
    }
}

impl fmt::Display for DockerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix(path) => write!(f, "unix://{}", path.display()),
            Self::Tcp(addr) => write!(f, "tcp://{addr}"),
        }
    }
}

/// Runtime adapter backed by a Docker Engine.
#[derive(Debug, Clone)]
pub struct DockerEngine {
    endpoint: DockerEndpoint,
}

impl DockerEngine {
    pub fn new(endpoint: DockerEndpoint) -> Self {
        Self { endpoint }
    }

    /// Build an engine client from a `DOCKER_HOST`-style address.
    pub fn from_host(host: &str) -> RuntimeResult<Self> {
        Ok(Self::new(DockerEndpoint::parse(host)?))
    }

    pub fn endpoint(&self) -> &DockerEndpoint {
        &self.endpoint
    }

    async fn connect(&self) -> RuntimeResult<SendRequest<Full<Bytes>>> {
        match &self.endpoint {
            #[cfg(unix)]
            DockerEndpoint::Unix(path) => {
                let stream = tokio::net::UnixStream::connect(path)
                    .await
                    .map_err(|e| RuntimeError::Connect(format!("{}: {e}", path.display())))?;
                handshake(stream).await
            }
            #[cfg(not(unix))]
            DockerEndpoint::Unix(path) => Err(RuntimeError::Connect(format!(
                "unix sockets are not supported on this platform: {}",
                path.display()
            ))),
            DockerEndpoint::Tcp(addr) => {
                let stream = tokio::net::TcpStream::connect(addr.as_str())
                    .await
                    .map_err(|e| RuntimeError::Connect(format!("{addr}: {e}")))?;
                handshake(stream).await
            }
        }
    }

    /// Issue one request and return the raw status and body.
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> RuntimeResult<(StatusCode, Bytes)> {
        let mut sender = self.connect().await?;

        let mut builder = Request::builder()
            .method(method.clone())
            .uri(path)
            .header(HOST, "docker")
            .header(USER_AGENT, "fleet-runtime/0.1");
        let body = match body {
            Some(bytes) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Full::new(Bytes::from(bytes))
            }
            None => Full::new(Bytes::new()),
        };
        let req = builder
            .body(body)
            .map_err(|e| RuntimeError::Transport(e.to_string()))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| RuntimeError::Transport(e.to_string()))?;
        let status = resp.status();
        let bytes = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| RuntimeError::Transport(e.to_string()))?
            .to_bytes();

        debug!(%method, path, status = status.as_u16(), "docker api call");
        Ok((status, bytes))
    }

    /// Issue one request, mapping non-2xx responses to `RuntimeError::Api`.
    ///
    /// `304 Not Modified` counts as success: the engine returns it when a
    /// unit is already in the requested state.
    async fn call(&self, method: Method, path: &str, body: Option<Vec<u8>>) -> RuntimeResult<Bytes> {
        let (status, bytes) = self.request(method, path, body).await?;
        if status.is_success() || status == StatusCode::NOT_MODIFIED {
            Ok(bytes)
        } else {
            Err(api_error(status, &bytes))
        }
    }

    /// Pull an image the engine does not have locally.
    ///
    /// Without a `tag` the engine pulls every tag of the repository, so one
    /// is always sent.
    async fn pull_image(&self, image: &str) -> RuntimeResult<()> {
        let (name, tag) = split_image_reference(image);
        info!(image, name, tag, "pulling image");
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("fromImage", name)
            .append_pair("tag", tag)
            .finish();
        let path = format!("/images/create?{query}");
        let bytes = self.call(Method::POST, &path, None).await?;

        // Pull progress is a stream of JSON lines; failures arrive in-band.
        for line in bytes.split(|b| *b == b'\n').filter(|l| !l.is_empty()) {
            if let Ok(progress) = serde_json::from_slice::<PullProgress>(line)
                && let Some(error) = progress.error
            {
                return Err(RuntimeError::Rejected(error));
            }
        }
        Ok(())
    }

    /// Create a unit and start it, pulling the image once if the engine
    /// does not have it.
    ///
    /// Not atomic: when create succeeds and start fails, the created
    /// (stopped) container is left in place and the start error is returned.
    async fn create_and_start(
        &self,
        image: &str,
        name: &str,
        network: Option<&str>,
    ) -> RuntimeResult<Unit> {
        let path = format!("/containers/create?name={name}");
        let mut spec = serde_json::json!({ "Image": image });
        if let Some(network) = network {
            spec["HostConfig"] = serde_json::json!({ "NetworkMode": network });
        }
        let body = serde_json::to_vec(&spec).map_err(|e| RuntimeError::Decode(e.to_string()))?;

        let created = match self.call(Method::POST, &path, Some(body.clone())).await {
            Err(RuntimeError::Api { status: 404, .. }) => {
                self.pull_image(image).await?;
                self.call(Method::POST, &path, Some(body)).await?
            }
            other => other?,
        };
        let created: CreateResponse = decode(&created)?;

        self.call(Method::POST, &format!("/containers/{}/start", created.id), None)
            .await?;

        let networks = network
            .map(|n| BTreeMap::from([(n.to_string(), Vec::new())]))
            .unwrap_or_default();
        Ok(Unit {
            id: created.id,
            name: name.to_string(),
            image: image.to_string(),
            networks,
        })
    }
}

impl RuntimeAdapter for DockerEngine {
    fn list_running_units(&self) -> RuntimeFuture<'_, Vec<Unit>> {
        Box::pin(async move {
            let bytes = self.call(Method::GET, "/containers/json", None).await?;
            let summaries: Vec<ContainerSummary> = decode(&bytes)?;
            Ok(summaries.into_iter().map(ContainerSummary::into_unit).collect())
        })
    }

    fn list_networks(&self) -> RuntimeFuture<'_, Vec<Network>> {
        Box::pin(async move {
            let bytes = self.call(Method::GET, "/networks", None).await?;
            let summaries: Vec<NetworkSummary> = decode(&bytes)?;
            Ok(summaries
                .into_iter()
                .map(|n| Network {
                    id: n.id,
                    name: n.name,
                })
                .collect())
        })
    }

    fn run_unit<'a>(
        &'a self,
        image: &'a str,
        name: &'a str,
        network: Option<&'a str>,
    ) -> RuntimeFuture<'a, Unit> {
        Box::pin(self.create_and_start(image, name, network))
    }

    fn connect_network<'a>(
        &'a self,
        unit_id: &'a str,
        network_id: &'a str,
        aliases: &'a [String],
    ) -> RuntimeFuture<'a, ()> {
        Box::pin(async move {
            let body = serde_json::json!({
                "Container": unit_id,
                "EndpointConfig": { "Aliases": aliases },
            });
            let body = serde_json::to_vec(&body).map_err(|e| RuntimeError::Decode(e.to_string()))?;
            self.call(
                Method::POST,
                &format!("/networks/{network_id}/connect"),
                Some(body),
            )
            .await?;
            Ok(())
        })
    }

    fn stop_unit<'a>(&'a self, unit_id: &'a str) -> RuntimeFuture<'a, ()> {
        Box::pin(async move {
            self.call(Method::POST, &format!("/containers/{unit_id}/stop"), None)
                .await?;
            Ok(())
        })
    }

    fn remove_unit<'a>(&'a self, unit_id: &'a str) -> RuntimeFuture<'a, ()> {
        Box::pin(async move {
            self.call(Method::DELETE, &format!("/containers/{unit_id}"), None)
                .await?;
            Ok(())
        })
    }
}

async fn handshake<T>(stream: T) -> RuntimeResult<SendRequest<Full<Bytes>>>
where
    T: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    let io = TokioIo::new(stream);
    let (sender, conn) = hyper::client::conn::http1::handshake(io)
        .await
        .map_err(|e| RuntimeError::Connect(e.to_string()))?;

    // Drive the connection in the background.
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            debug!(error = %e, "docker connection closed with error");
        }
    });

    Ok(sender)
}

/// Split an image reference into the `fromImage` and `tag` pull parameters.
///
/// A digest (`name@sha256:..`) is passed as the tag. A `:` only marks a tag
/// after the last `/`, so `registry:5000/app` has no tag and gets `latest`.
fn split_image_reference(image: &str) -> (&str, &str) {
    if let Some((name, digest)) = image.split_once('@') {
        return (name, digest);
    }
    let repo_start = image.rfind('/').map_or(0, |i| i + 1);
    match image[repo_start..].rfind(':') {
        Some(i) => (&image[..repo_start + i], &image[repo_start + i + 1..]),
        None => (image, "latest"),
    }
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> RuntimeResult<T> {
    serde_json::from_slice(bytes).map_err(|e| RuntimeError::Decode(e.to_string()))
}

/// Map an engine error response to `RuntimeError::Api`, keeping its message verbatim.
fn api_error(status: StatusCode, bytes: &[u8]) -> RuntimeError {
    let message = serde_json::from_slice::<ErrorBody>(bytes)
        .map(|b| b.message)
        .unwrap_or_else(|_| {
            let text = String::from_utf8_lossy(bytes).trim().to_string();
            if text.is_empty() {
                status.to_string()
            } else {
                text
            }
        });
    RuntimeError::Api {
        status: status.as_u16(),
        message,
    }
}

// ── Engine wire types ──────────────────────────────────────────

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Deserialize)]
struct PullProgress {
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateResponse {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NetworkSummary {
    id: String,
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerSummary {
    id: String,
    #[serde(default)]
    names: Vec<String>,
    #[serde(default)]
    image: String,
    #[serde(rename = "ImageID", default)]
    image_id: String,
    #[serde(default)]
    network_settings: Option<SummaryNetworkSettings>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SummaryNetworkSettings {
    #[serde(default)]
    networks: Option<HashMap<String, SummaryEndpoint>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SummaryEndpoint {
    #[serde(default)]
    aliases: Option<Vec<String>>,
}

impl ContainerSummary {
    fn into_unit(self) -> Unit {
        let name = self
            .names
            .first()
            .map(|n| n.trim_start_matches('/').to_string())
            .unwrap_or_default();
        // The engine reports the reference the unit was created from; fall
        // back to the image id for units created from an untagged image.
        let image = if self.image.is_empty() {
            self.image_id
        } else {
            self.image
        };
        let networks = self
            .network_settings
            .and_then(|s| s.networks)
            .unwrap_or_default()
            .into_iter()
            .map(|(net, ep)| (net, ep.aliases.unwrap_or_default()))
            .collect();

        Unit {
            id: self.id,
            name,
            image,
            networks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    #[test]
    fn parse_unix_endpoint() {
        let ep = DockerEndpoint::parse("unix:///var/run/docker.sock").unwrap();
        assert_eq!(ep, DockerEndpoint::Unix(PathBuf::from("/var/run/docker.sock")));
        assert_eq!(ep.to_string(), "unix:///var/run/docker.sock");
    }

    #[test]
    fn parse_tcp_endpoint() {
        let ep = DockerEndpoint::parse("tcp://127.0.0.1:2375/").unwrap();
        assert_eq!(ep, DockerEndpoint::Tcp("127.0.0.1:2375".to_string()));
    }

    #[test]
    fn parse_rejects_unknown_scheme() {
        assert!(DockerEndpoint::parse("ssh://host").is_err());
        assert!(DockerEndpoint::parse("unix://").is_err());
    }

    #[test]
    fn container_summary_maps_to_unit() {
        let json = r#"[{
            "Id": "8dfafdbc3a40aaaabbbbcccc",
            "Names": ["/distributed-systems-demo-backend-1"],
            "Image": "distributed-systems-demo-backend",
            "ImageID": "sha256:abc",
            "State": "running",
            "NetworkSettings": {
                "Networks": {
                    "demo_private_net": { "Aliases": ["backend", "8dfafdbc3a40"] },
                    "bridge": { "Aliases": null }
                }
            }
        }]"#;
        let summaries: Vec<ContainerSummary> = decode(json.as_bytes()).unwrap();
        let unit = summaries.into_iter().next().unwrap().into_unit();

        assert_eq!(unit.name, "distributed-systems-demo-backend-1");
        assert_eq!(unit.image, "distributed-systems-demo-backend");
        assert!(unit.has_alias("demo_private_net", "backend"));
        assert_eq!(unit.networks["bridge"], Vec::<String>::new());
    }

    #[test]
    fn untagged_image_falls_back_to_image_id() {
        let json = r#"[{"Id": "abc", "Names": ["/x"], "Image": "", "ImageID": "sha256:def"}]"#;
        let summaries: Vec<ContainerSummary> = decode(json.as_bytes()).unwrap();
        let unit = summaries.into_iter().next().unwrap().into_unit();
        assert_eq!(unit.image, "sha256:def");
        assert!(unit.networks.is_empty());
    }

    #[test]
    fn api_error_keeps_engine_message() {
        let err = api_error(
            StatusCode::CONFLICT,
            br#"{"message":"Conflict. The container name is already in use"}"#,
        );
        match err {
            RuntimeError::Api { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "Conflict. The container name is already in use");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn api_error_falls_back_to_raw_body() {
        let err = api_error(StatusCode::INTERNAL_SERVER_ERROR, b"boom");
        assert_eq!(err.to_string(), "boom");
    }

    /// Read one request: its head, then as much body as `content-length` says.
    async fn read_request(socket: &mut TcpStream) -> (String, String) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let head_end = loop {
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break buf.len();
            }
            buf.extend_from_slice(&chunk[..n]);
        };

        let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
        let length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);

        while buf.len() < head_end + length {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
        let body = String::from_utf8_lossy(&buf[head_end..]).to_string();
        (head, body)
    }

    /// Fake engine: answer one connection per canned response, in order, and
    /// return each request's head and body.
    async fn serve_sequence(
        responses: Vec<(&'static str, &'static str)>,
    ) -> (String, tokio::task::JoinHandle<Vec<(String, String)>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let handle = tokio::spawn(async move {
            let mut requests = Vec::new();
            for (status_line, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                requests.push(read_request(&mut socket).await);
                let response = format!(
                    "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
            requests
        });

        (format!("tcp://{addr}"), handle)
    }

    /// Serve exactly one canned HTTP response and return the request head.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let (host, server) = serve_sequence(vec![(status_line, body)]).await;
        let handle = tokio::spawn(async move {
            let mut requests = server.await.unwrap();
            requests.remove(0).0
        });
        (host, handle)
    }

    #[tokio::test]
    async fn list_running_units_over_tcp() {
        let (host, server) = serve_once(
            "200 OK",
            r#"[{"Id":"abc123","Names":["/backend-auto-1"],"Image":"demo-backend"}]"#,
        )
        .await;

        let engine = DockerEngine::from_host(&host).unwrap();
        let units = engine.list_running_units().await.unwrap();

        assert_eq!(units.len(), 1);
        assert_eq!(units[0].name, "backend-auto-1");

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /containers/json HTTP/1.1"));
    }

    #[tokio::test]
    async fn stop_unit_surfaces_engine_error() {
        let (host, server) =
            serve_once("404 Not Found", r#"{"message":"No such container: nope"}"#).await;

        let engine = DockerEngine::from_host(&host).unwrap();
        let err = engine.stop_unit("nope").await.unwrap_err();

        assert_eq!(err.to_string(), "No such container: nope");
        let request = server.await.unwrap();
        assert!(request.starts_with("POST /containers/nope/stop HTTP/1.1"));
    }

    #[tokio::test]
    async fn unreachable_engine_is_a_connect_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let engine = DockerEngine::from_host(&format!("tcp://{addr}")).unwrap();
        let err = engine.list_networks().await.unwrap_err();
        assert!(matches!(err, RuntimeError::Connect(_)));
    }

    #[test]
    fn image_reference_defaults_to_latest() {
        assert_eq!(split_image_reference("demo-backend"), ("demo-backend", "latest"));
        assert_eq!(split_image_reference("demo-backend:v2"), ("demo-backend", "v2"));
        assert_eq!(
            split_image_reference("registry.local:5000/demo/backend"),
            ("registry.local:5000/demo/backend", "latest")
        );
        assert_eq!(
            split_image_reference("registry.local:5000/demo/backend:v2"),
            ("registry.local:5000/demo/backend", "v2")
        );
        assert_eq!(
            split_image_reference("demo-backend@sha256:4f2a"),
            ("demo-backend", "sha256:4f2a")
        );
    }

    #[tokio::test]
    async fn run_unit_creates_detached_then_starts() {
        let (host, server) = serve_sequence(vec![
            ("201 Created", r#"{"Id":"abc123def4567890","Warnings":[]}"#),
            ("204 No Content", ""),
        ])
        .await;

        let engine = DockerEngine::from_host(&host).unwrap();
        let unit = engine
            .run_unit("demo-backend", "backend-auto-1", None)
            .await
            .unwrap();

        assert_eq!(unit.id, "abc123def4567890");
        assert_eq!(unit.name, "backend-auto-1");
        assert!(unit.networks.is_empty());

        let requests = server.await.unwrap();
        assert_eq!(requests.len(), 2);

        let (create_head, create_body) = &requests[0];
        assert!(create_head.starts_with("POST /containers/create?name=backend-auto-1 HTTP/1.1"));
        let create_body: serde_json::Value = serde_json::from_str(create_body).unwrap();
        assert_eq!(create_body, serde_json::json!({ "Image": "demo-backend" }));
        assert!(create_body.get("HostConfig").is_none());

        assert!(requests[1].0.starts_with("POST /containers/abc123def4567890/start HTTP/1.1"));
    }

    #[tokio::test]
    async fn run_unit_on_network_sets_network_mode() {
        let (host, server) = serve_sequence(vec![
            ("201 Created", r#"{"Id":"abc123"}"#),
            ("204 No Content", ""),
        ])
        .await;

        let engine = DockerEngine::from_host(&host).unwrap();
        let unit = engine
            .run_unit("demo-backend", "backend-auto-2", Some("demo_private_net"))
            .await
            .unwrap();
        assert!(unit.networks.contains_key("demo_private_net"));

        let requests = server.await.unwrap();
        let create_body: serde_json::Value = serde_json::from_str(&requests[0].1).unwrap();
        assert_eq!(create_body["HostConfig"]["NetworkMode"], "demo_private_net");
    }

    #[tokio::test]
    async fn run_unit_pulls_missing_image_then_creates_again() {
        let (host, server) = serve_sequence(vec![
            ("404 Not Found", r#"{"message":"No such image: registry.local:5000/demo/backend:v2"}"#),
            ("200 OK", "{\"status\":\"Pulling from demo/backend\"}\n{\"status\":\"Status: Downloaded newer image\"}\n"),
            ("201 Created", r#"{"Id":"fresh0001"}"#),
            ("204 No Content", ""),
        ])
        .await;

        let engine = DockerEngine::from_host(&host).unwrap();
        let unit = engine
            .run_unit("registry.local:5000/demo/backend:v2", "backend-auto-3", None)
            .await
            .unwrap();
        assert_eq!(unit.id, "fresh0001");
        assert_eq!(unit.image, "registry.local:5000/demo/backend:v2");

        let requests = server.await.unwrap();
        let lines: Vec<&str> = requests
            .iter()
            .map(|(head, _)| head.lines().next().unwrap_or_default())
            .collect();
        assert_eq!(
            lines,
            vec![
                "POST /containers/create?name=backend-auto-3 HTTP/1.1",
                "POST /images/create?fromImage=registry.local%3A5000%2Fdemo%2Fbackend&tag=v2 HTTP/1.1",
                "POST /containers/create?name=backend-auto-3 HTTP/1.1",
                "POST /containers/fresh0001/start HTTP/1.1",
            ]
        );
        assert_eq!(requests[0].1, requests[2].1);
    }

    #[tokio::test]
    async fn pull_of_untagged_image_requests_latest() {
        let (host, server) = serve_sequence(vec![
            ("404 Not Found", r#"{"message":"No such image: demo-backend:latest"}"#),
            ("200 OK", "{\"error\":\"pull access denied for demo-backend\"}\n"),
        ])
        .await;

        let engine = DockerEngine::from_host(&host).unwrap();
        let err = engine
            .run_unit("demo-backend", "backend-auto-4", None)
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Rejected(ref m) if m == "pull access denied for demo-backend"));

        let requests = server.await.unwrap();
        assert!(
            requests[1]
                .0
                .starts_with("POST /images/create?fromImage=demo-backend&tag=latest HTTP/1.1")
        );
    }

    #[tokio::test]
    async fn failed_start_reports_error_after_create() {
        let (host, server) = serve_sequence(vec![
            ("201 Created", r#"{"Id":"stuck0001"}"#),
            ("500 Internal Server Error", r#"{"message":"driver failed programming external connectivity"}"#),
        ])
        .await;

        let engine = DockerEngine::from_host(&host).unwrap();
        let err = engine
            .run_unit("demo-backend", "backend-auto-5", None)
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Api { status: 500, .. }));
        assert_eq!(err.to_string(), "driver failed programming external connectivity");

        // Create then start; no cleanup request follows.
        let requests = server.await.unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].0.starts_with("POST /containers/stuck0001/start HTTP/1.1"));
    }

    #[tokio::test]
    async fn connect_network_sends_aliases() {
        let (host, server) = serve_sequence(vec![("200 OK", "")]).await;

        let engine = DockerEngine::from_host(&host).unwrap();
        engine
            .connect_network("abc123", "net-private", &["backend".to_string()])
            .await
            .unwrap();

        let requests = server.await.unwrap();
        let (head, body) = &requests[0];
        assert!(head.starts_with("POST /networks/net-private/connect HTTP/1.1"));
        let body: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "Container": "abc123",
                "EndpointConfig": { "Aliases": ["backend"] },
            })
        );
    }
}
