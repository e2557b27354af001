//! Envelope response format for all API responses.
//!
//! ```json
//! {
//!   "data": { ... },
//!   "meta": { "request_id": "...", "timestamp": "...", "response_time_ms": 5 },
//!   "errors": [],
//!   "_links": { "self": "..." }
//! }
//! ```

use std::collections::HashMap;
use std::time::Instant;

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    pub meta: ApiMeta,

    /// Empty on success.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ApiErrorDetail>,

    #[serde(rename = "_links", skip_serializing_if = "HashMap::is_empty")]
    pub links: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct ApiMeta {
    pub request_id: String,
    /// RFC 3339.
    pub timestamp: String,
    pub response_time_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    /// Machine-readable code, e.g. `CREATION_ROLLED_BACK`.
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiMeta {
    /// Fresh metadata with a UUIDv7 request id.
    pub fn now(response_time_ms: u64) -> Self {
        Self {
            request_id: uuid::Uuid::now_v7().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            response_time_ms,
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// Success envelope; `started` is when the handler began.
    pub fn success(data: T, started: Instant) -> Self {
        Self {
            data: Some(data),
            meta: ApiMeta::now(started.elapsed().as_millis() as u64),
            errors: Vec::new(),
            links: HashMap::new(),
        }
    }

    pub fn with_link(mut self, rel: &str, href: &str) -> Self {
        self.links.insert(rel.to_string(), href.to_string());
        self
    }
}

impl ApiResponse<()> {
    pub fn failure(detail: ApiErrorDetail) -> Self {
        Self {
            data: None,
            meta: ApiMeta::now(0),
            errors: vec![detail],
            links: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_shape() {
        let resp = ApiResponse::success(serde_json::json!({"id": 1}), Instant::now())
            .with_link("self", "/chatbots/1");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["data"]["id"], 1);
        assert_eq!(json["_links"]["self"], "/chatbots/1");
        assert!(json.get("errors").is_none());
        assert_eq!(json["meta"]["request_id"].as_str().unwrap().len(), 36);
    }

    #[test]
    fn test_failure_envelope_has_no_data() {
        let resp = ApiResponse::failure(ApiErrorDetail {
            code: "NOT_FOUND".to_string(),
            message: "chatbot not found".to_string(),
            details: None,
        });
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("data").is_none());
        assert_eq!(json["errors"][0]["code"], "NOT_FOUND");
    }
}
