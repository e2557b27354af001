//! External document-processing service port.
//!
//! The service ingests a chatbot's documents and can discard them again.
//! Its internal behaviour is opaque; only the HTTP status matters. The
//! reqwest client lives in chatdocs-infra.

use chatdocs_types::chatbot::{ChatbotId, DocumentUpload, ProcessingAck};
use chatdocs_types::error::UpstreamError;
use chatdocs_types::user::UserId;

/// Client for the processing service.
///
/// The owner id is always sent out-of-band (a header) and never in the
/// request body. Calls are not idempotent upstream; callers must not retry
/// without compensating.
pub trait ProcessingService: Send + Sync {
    /// Submit documents for ingestion under `chatbot_id`.
    fn submit_documents(
        &self,
        chatbot_id: ChatbotId,
        owner_id: UserId,
        name: &str,
        documents: &[DocumentUpload],
    ) -> impl std::future::Future<Output = Result<ProcessingAck, UpstreamError>> + Send;

    /// Discard everything the service holds for `chatbot_id`.
    fn delete_chatbot_data(
        &self,
        chatbot_id: ChatbotId,
        owner_id: UserId,
    ) -> impl std::future::Future<Output = Result<ProcessingAck, UpstreamError>> + Send;
}
