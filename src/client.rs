//! Wire client seam for the harness.
//!
//! The runner never talks to `reqwest` directly; it issues [`WireRequest`]s
//! through the [`WireClient`] trait and receives raw status/headers/body. The
//! production implementation is [`HttpWireClient`]; tests substitute a
//! scripted in-memory transport.

use std::future::Future;
use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// HTTP verbs the SCIM protocol surface uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verb {
    Get,
    Post,
    Patch,
    Put,
    Delete,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Patch => "PATCH",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One outbound request: verb, absolute URL, optional JSON body.
#[derive(Debug, Clone)]
pub struct WireRequest {
    pub verb: Verb,
    pub url: String,
    pub body: Option<String>,
}

impl WireRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            verb: Verb::Get,
            url: url.into(),
            body: None,
        }
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self {
            verb: Verb::Delete,
            url: url.into(),
            body: None,
        }
    }

    pub fn with_body(verb: Verb, url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            verb,
            url: url.into(),
            body: Some(body.into()),
        }
    }
}

/// One received response: status, headers in arrival order, body text.
#[derive(Debug, Clone, Default)]
pub struct WireResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl WireResponse {
    /// First header value matching `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn location(&self) -> Option<&str> {
        self.header("Location")
    }
}

/// Transport abstraction the runner is constructed over.
///
/// Implementations perform exactly one blocking round trip per call; the
/// harness adds no concurrency, retries or timeouts of its own.
pub trait WireClient: Send + Sync {
    fn execute(
        &self,
        request: WireRequest,
    ) -> impl Future<Output = Result<WireResponse, TransportError>> + Send;
}

impl<C: WireClient> WireClient for &C {
    async fn execute(&self, request: WireRequest) -> Result<WireResponse, TransportError> {
        (**self).execute(request).await
    }
}

/// Optional basic-auth credentials for the target.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Anonymous access; no `Authorization` header is sent.
    pub fn none() -> Self {
        Self::default()
    }

    fn is_empty(&self) -> bool {
        self.username.is_empty() && self.password.is_empty()
    }

    /// `Basic base64(username:password)`, or `None` when both parts are empty.
    fn authorization_header(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let raw = format!("{}:{}", self.username, self.password);
        Some(format!("Basic {}", BASE64.encode(raw.as_bytes())))
    }
}

/// Production wire client over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpWireClient {
    http: reqwest::Client,
    credentials: Credentials,
}

impl HttpWireClient {
    /// Build a client with the given connect/read timeout. Automatic retries
    /// stay disabled; a failed round trip is reported as-is.
    pub fn new(credentials: Credentials, timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("scim-compliance/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::InvalidRequest {
                url: String::new(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { http, credentials })
    }

    /// Wrap a pre-built `reqwest::Client` (for tests and custom TLS setups).
    pub fn with_http_client(credentials: Credentials, http: reqwest::Client) -> Self {
        Self { http, credentials }
    }
}

impl WireClient for HttpWireClient {
    async fn execute(&self, request: WireRequest) -> Result<WireResponse, TransportError> {
        let method = match request.verb {
            Verb::Get => reqwest::Method::GET,
            Verb::Post => reqwest::Method::POST,
            Verb::Patch => reqwest::Method::PATCH,
            Verb::Put => reqwest::Method::PUT,
            Verb::Delete => reqwest::Method::DELETE,
        };
        log::debug!("{} {}", request.verb, request.url);

        let mut builder = self
            .http
            .request(method, &request.url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(auth) = self.credentials.authorization_header() {
            builder = builder.header(reqwest::header::AUTHORIZATION, auth);
        }
        if let Some(body) = request.body {
            builder = builder
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::connection(&request.url, e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::connection(&request.url, e.to_string()))?;

        Ok(WireResponse {
            status,
            headers,
            body,
        })
    }
}
