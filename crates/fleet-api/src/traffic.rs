//! Traffic probe — forwards one request through the load balancer.
//!
//! Lets a dashboard show which worker served a request. The control plane
//! never routes application traffic itself; this is a single diagnostic
//! GET with a short timeout.

use std::time::Duration;

use bytes::Bytes;
use http::Uri;
use http::header::{HOST, USER_AGENT};
use http_body_util::{BodyExt, Empty};
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tracing::debug;

/// Why a traffic request through the load balancer failed.
#[derive(Debug, Error)]
pub enum TrafficError {
    #[error("invalid load balancer url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("load balancer unreachable: {0}")]
    Connect(String),

    #[error("timed out after {0}ms")]
    Timeout(u128),

    #[error("non-JSON reply ({status}): {reason}")]
    Decode { status: u16, reason: String },
}

fn invalid_url(url: &str, reason: impl ToString) -> TrafficError {
    TrafficError::InvalidUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

/// Probes the load balancer's application endpoint.
#[derive(Debug, Clone)]
pub struct TrafficProbe {
    uri: Uri,
    authority: String,
    timeout: Duration,
}

impl TrafficProbe {
    /// Build a probe for a plain `http://host[:port]/path` URL.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, TrafficError> {
        let uri: Uri = url.parse().map_err(|e| invalid_url(url, e))?;
        if uri.scheme_str() != Some("http") {
            return Err(invalid_url(url, "scheme must be http://"));
        }
        let host = uri.host().ok_or_else(|| invalid_url(url, "missing host"))?;
        let authority = format!("{host}:{}", uri.port_u16().unwrap_or(80));

        Ok(Self {
            uri,
            authority,
            timeout,
        })
    }

    pub fn url(&self) -> String {
        self.uri.to_string()
    }

    /// Issue one GET and return the JSON body.
    pub async fn fetch(&self) -> Result<serde_json::Value, TrafficError> {
        match tokio::time::timeout(self.timeout, self.fetch_inner()).await {
            Ok(result) => result,
            Err(_) => Err(TrafficError::Timeout(self.timeout.as_millis())),
        }
    }

    fn connect_error(&self, e: impl std::fmt::Display) -> TrafficError {
        TrafficError::Connect(format!("{}: {e}", self.authority))
    }

    async fn fetch_inner(&self) -> Result<serde_json::Value, TrafficError> {
        let stream = tokio::net::TcpStream::connect(&self.authority)
            .await
            .map_err(|e| self.connect_error(e))?;

        let io = TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| self.connect_error(e))?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let path = self
            .uri
            .path_and_query()
            .map(|p| p.as_str())
            .unwrap_or("/");
        let req = http::Request::builder()
            .method("GET")
            .uri(path)
            .header(HOST, self.authority.as_str())
            .header(USER_AGENT, "fleet-api/0.1")
            .body(Empty::<Bytes>::new())
            .map_err(|e| invalid_url(&self.url(), e))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| self.connect_error(e))?;
        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| self.connect_error(e))?
            .to_bytes();
        debug!(%status, uri = %self.uri, "traffic probe answered");

        serde_json::from_slice(&body).map_err(|e| TrafficError::Decode {
            status: status.as_u16(),
            reason: e.to_string(),
        })
    }
}
