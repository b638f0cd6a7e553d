//! Mutable request snapshot handed to interception hooks.
//!
//! # Responsibilities
//! - Expose method, scheme, host, path, query, headers and body as plain data
//! - Detect whether anything was touched with a single comparison
//! - Rebuffer the body on read so the original request stays replayable
//! - Rebuild an outbound request carrying every edit
//!
//! # Design Decisions
//! - The port is taken from the original request only; it is not editable
//! - Reading the body counts as a modification even if nothing changed
//! - `host`, `content-length` and `transfer-encoding` lines are not replayed
//!   on rebuild; the client derives them from the new URL and body
//! - Snapshot header names are lowercase as received (`x-a: 1`); names added
//!   through `set_header` keep the caller's case
//! - Header values that are not valid UTF-8 are shown lossily; a line left
//!   as snapshotted is rebuilt from the original bytes
//! - A body over the read limit is not read; the original stream still
//!   carries every byte

use axum::body::Body;
use axum::http::header::{HeaderName, HeaderValue, CONTENT_TYPE, HOST};
use axum::http::request::Parts;
use axum::http::{Method, Request, Uri, Version};
use indexmap::IndexMap;
use std::fmt::Write;
use std::net::SocketAddr;
use thiserror::Error;

use crate::http::body::BodySource;
use crate::http::form;
use crate::http::headers::HeaderBlock;

/// Default cap on how much of a body `read_body` buffers (2MB).
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Header lines recomputed by the client rather than replayed.
const DERIVED_HEADERS: [&str; 3] = ["host", "content-length", "transfer-encoding"];

/// Errors raised while rebuilding an outbound request.
#[derive(Debug, Error)]
pub enum RebuildError {
    #[error("invalid method {0:?}")]
    Method(String),

    #[error("invalid target url {url:?}: {source}")]
    Uri {
        url: String,
        #[source]
        source: axum::http::uri::InvalidUri,
    },

    #[error("invalid header name {0:?}")]
    HeaderName(String),

    #[error("invalid value for header {0:?}")]
    HeaderValue(String),
}

/// Summary of every observable field, compared as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Fingerprint(String);

/// A request under interception.
#[derive(Debug)]
pub struct MutableRequest {
    client: String,

    pub method: String,
    pub version: String,
    pub scheme: String,
    pub hostname: String,
    pub path: String,
    pub query: String,
    pub content_type: String,
    pub headers: HeaderBlock,

    body: String,
    body_consumed: bool,
    body_overridden: bool,
    body_limit: usize,
    reference: Fingerprint,

    parts: Parts,
    port: Option<u16>,
    source: BodySource,
}

impl MutableRequest {
    /// Snapshot an inbound request received from `peer`.
    ///
    /// The body is not read.
    pub fn new(peer: SocketAddr, request: Request<Body>) -> Self {
        let (parts, body) = request.into_parts();

        let mut headers = HeaderBlock::new();
        let mut content_type = String::new();
        for (name, value) in parts.headers.iter() {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            if *name == CONTENT_TYPE {
                content_type = value.clone();
            }
            headers.append(name.as_str(), value);
        }

        let (hostname, port) = target_host(&parts);

        let mut request = Self {
            client: peer.ip().to_string(),
            method: parts.method.to_string(),
            version: version_string(parts.version).to_string(),
            scheme: parts.uri.scheme_str().unwrap_or("http").to_string(),
            hostname,
            path: parts.uri.path().to_string(),
            query: parts.uri.query().unwrap_or_default().to_string(),
            content_type,
            headers,
            body: String::new(),
            body_consumed: false,
            body_overridden: false,
            body_limit: DEFAULT_BODY_LIMIT,
            reference: Fingerprint(String::new()),
            parts,
            port,
            source: BodySource::from(body),
        };
        request.update_hash();

        tracing::debug!(
            client = %request.client,
            method = %request.method,
            host = %request.hostname,
            path = %request.path,
            "Request snapshot taken"
        );

        request
    }

    /// Cap how many body bytes `read_body` will buffer.
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Originating IP address, without port.
    pub fn client(&self) -> &str {
        &self.client
    }

    /// Port of the original request target, if it had one.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Body text. Empty until read or set.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Replace the body sent on rebuild. An empty string sends an empty body.
    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
        self.body_overridden = true;
    }

    /// Whether the original body stream has been drained.
    pub fn body_consumed(&self) -> bool {
        self.body_consumed
    }

    fn fingerprint(&self) -> Fingerprint {
        let fields = [
            self.client.as_str(),
            self.method.as_str(),
            self.version.as_str(),
            self.scheme.as_str(),
            self.hostname.as_str(),
            self.path.as_str(),
            self.query.as_str(),
            self.content_type.as_str(),
        ];
        let headers = self.headers.to_string();

        let mut out = String::new();
        for field in fields.iter().copied().chain([headers.as_str(), self.body.as_str()]) {
            // Length prefix keeps a '.' inside a value from shifting fields.
            let _ = write!(out, "{}:{}.", field.len(), field);
        }
        Fingerprint(out)
    }

    /// Take the current fields as the new unmodified baseline.
    pub fn update_hash(&mut self) {
        self.reference = self.fingerprint();
    }

    /// True if the body was read or any field differs from the baseline.
    pub fn was_modified(&self) -> bool {
        if self.body_consumed {
            return true;
        }
        self.fingerprint() != self.reference
    }

    pub fn get_header(&self, name: &str, default: &str) -> String {
        self.headers.get(name, default)
    }

    /// Replace the first line named `name`, or append one.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.set(name, value);
    }

    pub fn remove_header(&mut self, name: &str) {
        self.headers.remove(name);
    }

    /// Drain the body into `body` and leave the original replayable.
    ///
    /// A failed read, including a body over the limit, yields an empty string
    /// and leaves the request untouched. Bytes pulled before the failure are
    /// put back in front of the stream.
    pub async fn read_body(&mut self) -> String {
        match self.source.drain(self.body_limit).await {
            Ok(bytes) => {
                self.body = String::from_utf8_lossy(&bytes).into_owned();
                self.body_consumed = true;
                self.body.clone()
            }
            Err(error) => {
                tracing::warn!(
                    client = %self.client,
                    path = %self.path,
                    error = %error,
                    "Failed to read request body"
                );
                String::new()
            }
        }
    }

    /// A fresh stream over the original body, once it has been read.
    pub fn replay_body(&self) -> Option<Body> {
        self.source.replay()
    }

    /// Decode the body as a urlencoded form, reading it first if needed.
    pub async fn parse_form(&mut self) -> IndexMap<String, String> {
        if self.body.is_empty() {
            self.body = self.read_body().await;
        }
        form::parse_form(&self.body)
    }

    /// `scheme://host[:port]path[?query]` of the rebuilt request.
    pub fn target_url(&self) -> String {
        let mut url = format!("{}://{}", self.scheme, self.hostname);
        if let Some(port) = self.port {
            let _ = write!(url, ":{}", port);
        }
        url.push_str(&self.path);
        if !self.query.is_empty() {
            url.push('?');
            url.push_str(&self.query);
        }
        url
    }

    /// Build an outbound request from the current fields.
    pub fn to_request(self) -> Result<Request<Body>, RebuildError> {
        let method = Method::from_bytes(self.method.as_bytes())
            .map_err(|_| RebuildError::Method(self.method.clone()))?;
        let url = self.target_url();
        let uri: Uri = url
            .parse()
            .map_err(|source| RebuildError::Uri { url: url.clone(), source })?;

        let mut request = Request::new(Body::empty());
        *request.method_mut() = method;
        *request.uri_mut() = uri;

        let mut had_type = false;
        let outbound = request.headers_mut();
        for (name, value) in self.headers.iter() {
            if DERIVED_HEADERS.iter().any(|derived| name.eq_ignore_ascii_case(derived)) {
                continue;
            }
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| RebuildError::HeaderName(name.to_string()))?;
            let header_value = match original_value(&self.parts, name, value) {
                Some(raw) => raw,
                None => HeaderValue::from_str(value)
                    .map_err(|_| RebuildError::HeaderValue(name.to_string()))?,
            };
            if header_name == CONTENT_TYPE {
                had_type = true;
            }
            outbound.append(header_name, header_value);
        }
        if !had_type && !self.content_type.is_empty() {
            let value = HeaderValue::from_str(&self.content_type)
                .map_err(|_| RebuildError::HeaderValue(CONTENT_TYPE.to_string()))?;
            outbound.insert(CONTENT_TYPE, value);
        }

        let unchanged_read = matches!(
            self.source.buffered(),
            Some(bytes) if self.body == String::from_utf8_lossy(bytes)
        );
        *request.body_mut() = if unchanged_read {
            self.source.into_body()
        } else if self.body_consumed || self.body_overridden {
            Body::from(self.body)
        } else {
            self.source.into_body()
        };

        Ok(request)
    }

    /// The original request, with its body rebuffered if it was read.
    pub fn into_original(self) -> Request<Body> {
        Request::from_parts(self.parts, self.source.into_body())
    }

    /// The rebuilt request if anything changed, otherwise the original.
    pub fn into_outbound(self) -> Result<Request<Body>, RebuildError> {
        if self.was_modified() {
            self.to_request()
        } else {
            Ok(self.into_original())
        }
    }
}

/// The inbound value of `name` whose lossy text is `text`.
fn original_value(parts: &Parts, name: &str, text: &str) -> Option<HeaderValue> {
    parts
        .headers
        .get_all(name)
        .iter()
        .find(|raw| String::from_utf8_lossy(raw.as_bytes()) == text)
        .cloned()
}

/// Hostname without port, and the port, of the request target.
fn target_host(parts: &Parts) -> (String, Option<u16>) {
    if let Some(host) = parts.uri.host() {
        return (host.to_string(), parts.uri.port_u16());
    }
    parts
        .headers
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<axum::http::uri::Authority>().ok())
        .map(|authority| (authority.host().to_string(), authority.port_u16()))
        .unwrap_or_default()
}

fn version_string(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2.0",
        Version::HTTP_3 => "3.0",
        _ => "1.1",
    }
}
