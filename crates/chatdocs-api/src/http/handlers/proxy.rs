//! `/python-api/*` pass-through to the processing service.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};

use chatdocs_infra::processing::proxy::{ProxyIdentity, ProxyRequest};
use chatdocs_types::user::format_roles;

use crate::http::error::AppError;
use crate::http::extractors::auth::Caller;
use crate::state::AppState;

/// Route prefix removed before forwarding.
pub const PROXY_PREFIX: &str = "/python-api";

/// ANY /python-api/{*path} - Forward to the processing service as the caller.
pub async fn forward(
    State(state): State<AppState>,
    caller: Caller,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let path = match uri.path().strip_prefix(PROXY_PREFIX) {
        Some("") | None => "/".to_string(),
        Some(rest) => rest.to_string(),
    };
    let identity = ProxyIdentity {
        user_id: caller.user_id,
        username: caller.username,
        scope: format_roles(&caller.roles),
    };
    let request = ProxyRequest {
        method,
        path,
        query: uri.query().map(str::to_string),
        headers,
        body,
    };

    let proxied = state.proxy.forward(request, &identity).await?;
    let status = StatusCode::from_u16(proxied.status).unwrap_or(StatusCode::BAD_GATEWAY);
    Ok((status, proxied.headers, proxied.body).into_response())
}
