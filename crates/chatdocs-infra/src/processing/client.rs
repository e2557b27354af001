//! reqwest implementation of `ProcessingService`.
//!
//! Both endpoints take multipart forms and identify the acting owner with the
//! `X-User-Id` header only. Any status outside 2xx is an error.

use std::time::Duration;

use chatdocs_core::processing::ProcessingService;
use chatdocs_types::chatbot::{ChatbotId, DocumentUpload, ProcessingAck};
use chatdocs_types::error::UpstreamError;
use chatdocs_types::user::UserId;
use reqwest::multipart::{Form, Part};
use tracing::debug;

/// Header carrying the verified owner id.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Upstream error bodies are kept up to this many bytes.
const MAX_ERROR_BODY: usize = 2048;

pub struct HttpProcessingClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpProcessingClient {
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

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_form(
        &self,
        path: &str,
        owner_id: UserId,
        form: Form,
    ) -> Result<ProcessingAck, UpstreamError> {
        let endpoint = format!("{}{path}", self.base_url);
        let response = self
            .http
            .post(&endpoint)
            .header(USER_ID_HEADER, owner_id.to_string())
            .multipart(form)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport {
                endpoint: endpoint.clone(),
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| UpstreamError::Transport {
            endpoint: endpoint.clone(),
            message: format!("failed to read response body: {e}"),
        })?;
        debug!(endpoint = %endpoint, status, "Processing service responded");

        if !(200..300).contains(&status) {
            return Err(UpstreamError::Status {
                endpoint,
                status,
                body: truncate(text),
            });
        }

        let body = if text.trim().is_empty() {
            None
        } else {
            serde_json::from_str(&text).ok()
        };
        Ok(ProcessingAck { status, body })
    }
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}

impl ProcessingService for HttpProcessingClient {
    async fn submit_documents(
        &self,
        chatbot_id: ChatbotId,
        owner_id: UserId,
        name: &str,
        documents: &[DocumentUpload],
    ) -> Result<ProcessingAck, UpstreamError> {
        let mut form = Form::new()
            .text("name", name.to_string())
            .text("chatbot_id", chatbot_id.to_string());
        for doc in documents {
            let part = Part::stream(doc.content.clone())
                .file_name(doc.filename.clone())
                .mime_str(doc.content_type_or_default())
                .map_err(|e| {
                    UpstreamError::InvalidRequest(format!(
                        "invalid content type for '{}': {e}",
                        doc.filename
                    ))
                })?;
            form = form.part("files", part);
        }
        self.post_form("/chatbots", owner_id, form).await
    }

    async fn delete_chatbot_data(
        &self,
        chatbot_id: ChatbotId,
        owner_id: UserId,
    ) -> Result<ProcessingAck, UpstreamError> {
        let form = Form::new().text("chatbot_id", chatbot_id.to_string());
        self.post_form("/delete", owner_id, form).await
    }
}
