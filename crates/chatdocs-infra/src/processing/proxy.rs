//! Authenticated pass-through to the processing service.
//!
//! The frontend queries the processing service directly for chat and
//! retrieval. The gateway replays those requests upstream with the caller's
//! verified identity in `X-User-Id`, `X-User-Username` and `X-User-Scope`.
//! Identity headers sent by the client are never forwarded.

use std::time::Duration;

use bytes::Bytes;
use chatdocs_types::error::UpstreamError;
use chatdocs_types::user::UserId;
use reqwest::Method;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

const USER_ID: HeaderName = HeaderName::from_static("x-user-id");
const USER_USERNAME: HeaderName = HeaderName::from_static("x-user-username");
const USER_SCOPE: HeaderName = HeaderName::from_static("x-user-scope");

/// Lowercase prefix shared by every identity header.
const IDENTITY_PREFIX: &str = "x-user-";

/// Connection-scoped headers that must not cross the proxy, plus the
/// gateway's own credentials.
const STRIPPED_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "host",
    "content-length",
    "transfer-encoding",
    "te",
    "trailer",
    "upgrade",
    "proxy-authorization",
    "proxy-authenticate",
    "authorization",
];

/// The verified caller a request is forwarded on behalf of.
#[derive(Debug, Clone)]
pub struct ProxyIdentity {
    pub user_id: UserId,
    pub username: String,
    /// Space-separated role names, e.g. `"ADMIN USER"`.
    pub scope: String,
}

/// An inbound request, already stripped of the gateway's route prefix.
#[derive(Debug)]
pub struct ProxyRequest {
    pub method: Method,
    /// Upstream path, starting with `/`.
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// The upstream answer, relayed to the client as-is.
#[derive(Debug)]
pub struct ProxiedResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

pub struct ProcessingProxy {
    http: reqwest::Client,
    base_url: String,
}

impl ProcessingProxy {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::InvalidRequest(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn upstream_url(&self, path: &str, query: Option<&str>) -> String {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        match query.filter(|q| !q.is_empty()) {
            Some(query) => format!("{}{path}?{query}", self.base_url),
            None => format!("{}{path}", self.base_url),
        }
    }

    /// Forward `request` upstream as `identity`.
    ///
    /// Any upstream status is returned as a response; only transport
    /// failures are errors.
    pub async fn forward(
        &self,
        request: ProxyRequest,
        identity: &ProxyIdentity,
    ) -> Result<ProxiedResponse, UpstreamError> {
        let endpoint = self.upstream_url(&request.path, request.query.as_deref());
        let headers = forwarded_headers(&request.headers, identity)?;

        let response = self
            .http
            .request(request.method.clone(), &endpoint)
            .headers(headers)
            .body(request.body)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport {
                endpoint: endpoint.clone(),
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let mut headers = response.headers().clone();
        strip_connection_headers(&mut headers);
        let body = response.bytes().await.map_err(|e| UpstreamError::Transport {
            endpoint: endpoint.clone(),
            message: format!("failed to read response body: {e}"),
        })?;
        debug!(
            method = %request.method,
            endpoint = %endpoint,
            status,
            user_id = %identity.user_id,
            "Proxied request to processing service"
        );

        Ok(ProxiedResponse {
            status,
            headers,
            body,
        })
    }
}

/// Headers sent upstream: the client's headers minus connection-scoped and
/// identity headers, plus the verified identity.
pub fn forwarded_headers(
    incoming: &HeaderMap,
    identity: &ProxyIdentity,
) -> Result<HeaderMap, UpstreamError> {
    let mut headers = incoming.clone();
    strip_connection_headers(&mut headers);
    let spoofed: Vec<HeaderName> = headers
        .keys()
        .filter(|name| name.as_str().starts_with(IDENTITY_PREFIX))
        .cloned()
        .collect();
    for name in spoofed {
        headers.remove(name);
    }

    let value = |raw: &str| {
        HeaderValue::from_str(raw).map_err(|e| {
            UpstreamError::InvalidRequest(format!("identity header value '{raw}' is invalid: {e}"))
        })
    };
    headers.insert(USER_ID, value(&identity.user_id.to_string())?);
    if !identity.username.is_empty() {
        headers.insert(USER_USERNAME, value(&identity.username)?);
    }
    if !identity.scope.is_empty() {
        headers.insert(USER_SCOPE, value(&identity.scope)?);
    }
    Ok(headers)
}

fn strip_connection_headers(headers: &mut HeaderMap) {
    for name in STRIPPED_HEADERS {
        headers.remove(*name);
    }
}
