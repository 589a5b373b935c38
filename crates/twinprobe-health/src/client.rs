//! Named HTTP clients.
//!
//! Probes never build URLs themselves: they ask a [`ClientFactory`] for a
//! client by name and issue GETs with paths relative to that client's
//! base address. [`HyperClientFactory`] is the production implementation;
//! tests substitute recording fakes.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use http::{StatusCode, Uri};
use http_body_util::Empty;
use hyper_util::rt::TokioIo;
use thiserror::Error;
use tracing::debug;

use crate::probe::{BoxFuture, FailureKind};

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no client registered under name: {0}")]
    UnknownClient(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl ClientError {
    /// Log classification for this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            ClientError::Connect(_) | ClientError::Request(_) => FailureKind::Connection,
            ClientError::UnknownClient(_) | ClientError::InvalidUrl(_) => FailureKind::Unexpected,
        }
    }
}

/// A client bound to one upstream base address.
pub trait HttpClient: Send + Sync {
    /// GET `path` (relative to the base address) and return the status.
    fn get<'a>(&'a self, path: &'a str) -> BoxFuture<'a, ClientResult<StatusCode>>;
}

/// Resolves client names to clients.
pub trait ClientFactory: Send + Sync {
    fn create_client(&self, name: &str) -> ClientResult<Arc<dyn HttpClient>>;
}

/// Client factory backed by hyper HTTP/1.1 connections.
#[derive(Debug, Clone, Default)]
pub struct HyperClientFactory {
    base_urls: HashMap<String, String>,
}

impl HyperClientFactory {
    /// Factory over `(client name, base URL)` pairs.
    pub fn new<I, N, U>(registrations: I) -> Self
    where
        I: IntoIterator<Item = (N, U)>,
        N: Into<String>,
        U: Into<String>,
    {
        let base_urls = registrations
            .into_iter()
            .map(|(n, u)| (n.into(), u.into()))
            .collect();
        Self { base_urls }
    }

    /// Add or replace a named client.
    pub fn register(&mut self, name: impl Into<String>, base_url: impl Into<String>) {
        self.base_urls.insert(name.into(), base_url.into());
    }

    /// Whether `name` has a base URL.
    pub fn is_registered(&self, name: &str) -> bool {
        self.base_urls.contains_key(name)
    }
}

impl ClientFactory for HyperClientFactory {
    fn create_client(&self, name: &str) -> ClientResult<Arc<dyn HttpClient>> {
        let base = self
            .base_urls
            .get(name)
            .ok_or_else(|| ClientError::UnknownClient(name.to_string()))?;
        Ok(Arc::new(HyperClient::new(name, base)?))
    }
}

/// HTTP/1.1 client for a single base address.
#[derive(Debug, Clone)]
pub struct HyperClient {
    /// Name the client was registered under.
    name: String,
    /// Base URL that request paths are joined onto.
    base: String,
    /// `host:port` to connect to.
    authority: String,
}

impl HyperClient {
    /// Client for `base_url`, which must be an `http://` URL with a host.
    /// The port defaults to 80.
    pub fn new(name: &str, base_url: &str) -> ClientResult<Self> {
        let uri: Uri = base_url
            .parse()
            .map_err(|e| ClientError::InvalidUrl(format!("{base_url}: {e}")))?;

        match uri.scheme_str() {
            Some("http") => {}
            other => {
                return Err(ClientError::InvalidUrl(format!(
                    "{base_url}: unsupported scheme {}",
                    other.unwrap_or("<none>")
                )));
            }
        }

        let authority = uri
            .authority()
            .ok_or_else(|| ClientError::InvalidUrl(format!("{base_url}: missing host")))?;
        let port = authority.port_u16().unwrap_or(80);

        Ok(Self {
            name: name.to_string(),
            base: base_url.to_string(),
            authority: format!("{}:{port}", authority.host()),
        })
    }

    /// Registered client name.
    pub fn name(&self) -> &str {
        &self.name
    }

    async fn send_get(&self, path: &str) -> ClientResult<StatusCode> {
        let uri = join_url(&self.base, path)?;

        let stream = tokio::net::TcpStream::connect(&self.authority)
            .await
            .map_err(|e| ClientError::Connect(format!("{}: {e}", self.authority)))?;

        let io = TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| ClientError::Connect(format!("handshake: {e}")))?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let origin = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        let req = http::Request::builder()
            .method("GET")
            .uri(origin)
            .header("host", &self.authority)
            .header("user-agent", "twinprobe/0.1")
            .header("accept", "application/json")
            .body(Empty::<Bytes>::new())
            .map_err(|e| ClientError::Request(e.to_string()))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| ClientError::Request(e.to_string()))?;

        debug!(client = %self.name, %uri, status = %resp.status(), "GET completed");
        Ok(resp.status())
    }
}

impl HttpClient for HyperClient {
    fn get<'a>(&'a self, path: &'a str) -> BoxFuture<'a, ClientResult<StatusCode>> {
        Box::pin(self.send_get(path))
    }
}

/// Resolve `path` relative to `base`, treating `base` as a directory.
///
/// `http://h/api` + `shells?limit=1` → `http://h/api/shells?limit=1`.
pub fn join_url(base: &str, path: &str) -> ClientResult<Uri> {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    let joined = format!("{base}/{path}");
    joined
        .parse()
        .map_err(|e| ClientError::InvalidUrl(format!("{joined}: {e}")))
}
