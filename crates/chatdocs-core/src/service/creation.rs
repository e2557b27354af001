//! Chatbot creation saga.
//!
//! Creation touches three systems that share no transaction: the record
//! store, the object store and the processing service. The record is written
//! first so there is always a durable anchor for anything uploaded after it.
//! Documents are uploaded one at a time, in input order, and only then handed
//! to the processing service. If any step fails, the keys uploaded so far and
//! the record are removed again on a best-effort basis.

use std::sync::Arc;

use chatdocs_types::chatbot::{
    Chatbot, ChatbotCreated, CreateChatbotRequest, DocumentUpload, document_key,
};
use chatdocs_types::error::{ChatbotError, UpstreamError};
use chatdocs_types::lifecycle::{CompensationOutcome, CompensationReport, CreationState};
use chatdocs_types::user::UserId;
use tracing::{debug, error, info, warn};

use crate::processing::ProcessingService;
use crate::repository::chatbot::ChatbotRepository;
use crate::storage::ObjectStore;

/// Progress of one creation run.
struct CreationSaga {
    state: CreationState,
    owner_id: UserId,
    record: Option<Chatbot>,
    /// Keys whose upload succeeded, in upload order.
    uploaded_keys: Vec<String>,
}

impl CreationSaga {
    fn new(owner_id: UserId) -> Self {
        Self {
            state: CreationState::Start,
            owner_id,
            record: None,
            uploaded_keys: Vec::new(),
        }
    }

    fn advance(&mut self, next: CreationState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal creation transition {} -> {}",
            self.state,
            next
        );
        debug!(owner_id = %self.owner_id, from = %self.state, to = %next, "Creation state advanced");
        self.state = next;
    }
}

/// Runs the creation saga against the three subsystems.
pub struct CreationOrchestrator<C, O, P> {
    chatbots: Arc<C>,
    objects: Arc<O>,
    processing: Arc<P>,
}

impl<C, O, P> CreationOrchestrator<C, O, P>
where
    C: ChatbotRepository,
    O: ObjectStore,
    P: ProcessingService,
{
    pub fn new(chatbots: Arc<C>, objects: Arc<O>, processing: Arc<P>) -> Self {
        Self {
            chatbots,
            objects,
            processing,
        }
    }

    /// Create a chatbot owned by `owner_id`.
    ///
    /// Validation failures are returned as `ChatbotError::Validation` before
    /// anything is written. Every later failure is reported as
    /// `ChatbotError::CreationRolledBack`, carrying the state reached, the
    /// original cause and what compensation managed to undo.
    pub async fn create(
        &self,
        owner_id: UserId,
        request: CreateChatbotRequest,
    ) -> Result<ChatbotCreated, ChatbotError> {
        validate(&request)?;
        let name = request.name.trim();
        let mut saga = CreationSaga::new(owner_id);

        let record = match self.chatbots.create(name, owner_id).await {
            Ok(record) => record,
            Err(e) => return Err(self.compensate(saga, e.into()).await),
        };
        info!(chatbot_id = %record.id, owner_id = %owner_id, "Chatbot record created");
        saga.record = Some(record.clone());
        saga.advance(CreationState::RecordCreated);

        if let Err(e) = self.upload_all(&mut saga, &record, &request.documents).await {
            return Err(self.compensate(saga, e).await);
        }
        saga.advance(CreationState::ObjectsUploaded);

        let ack = match self
            .processing
            .submit_documents(record.id, owner_id, &record.name, &request.documents)
            .await
        {
            Ok(ack) if (200..300).contains(&ack.status) => ack,
            Ok(ack) => {
                let err = UpstreamError::Status {
                    endpoint: "/chatbots".to_string(),
                    status: ack.status,
                    body: ack.body.map(|b| b.to_string()).unwrap_or_default(),
                };
                return Err(self.compensate(saga, err.into()).await);
            }
            Err(e) => return Err(self.compensate(saga, e.into()).await),
        };
        saga.advance(CreationState::Submitted);

        info!(
            chatbot_id = %record.id,
            documents = request.documents.len(),
            status = ack.status,
            "Chatbot created"
        );
        Ok(ChatbotCreated {
            chatbot: record,
            processing: ack,
        })
    }

    /// Upload documents sequentially, stopping at the first failure.
    async fn upload_all(
        &self,
        saga: &mut CreationSaga,
        record: &Chatbot,
        documents: &[DocumentUpload],
    ) -> Result<(), ChatbotError> {
        for doc in documents {
            let key = document_key(record.owner_id, record.id, &doc.filename);
            let stored = self
                .objects
                .put(&key, doc.content.clone(), doc.content_type.as_deref())
                .await
                .map_err(|e| {
                    warn!(chatbot_id = %record.id, key = %key, error = %e, "Document upload failed");
                    e
                })?;
            debug!(chatbot_id = %record.id, key = %stored, "Document uploaded");
            saga.uploaded_keys.push(stored);
        }
        Ok(())
    }

    /// Undo whatever the saga has done so far. Never fails; the outcome of
    /// each compensating action is recorded in the returned error.
    async fn compensate(&self, mut saga: CreationSaga, cause: ChatbotError) -> ChatbotError {
        let failed_at = saga.state;
        warn!(owner_id = %saga.owner_id, state = %failed_at, error = %cause, "Chatbot creation failed, compensating");

        let objects = if saga.uploaded_keys.is_empty() {
            CompensationOutcome::Skipped
        } else {
            match self.objects.delete_many(&saga.uploaded_keys).await {
                Ok(()) => {
                    info!(keys = saga.uploaded_keys.len(), "Rolled back uploaded documents");
                    CompensationOutcome::Succeeded
                }
                Err(e) => {
                    error!(
                        keys = ?saga.uploaded_keys,
                        error = %e,
                        "Failed to delete uploaded documents during rollback; objects are orphaned"
                    );
                    CompensationOutcome::Failed(e.to_string())
                }
            }
        };

        let record = match saga.record.as_ref() {
            None => CompensationOutcome::Skipped,
            Some(record) => match self.chatbots.delete(record.id).await {
                Ok(()) => {
                    info!(chatbot_id = %record.id, "Rolled back chatbot record");
                    CompensationOutcome::Succeeded
                }
                Err(e) => {
                    error!(
                        chatbot_id = %record.id,
                        error = %e,
                        "Failed to delete chatbot record during rollback"
                    );
                    CompensationOutcome::Failed(e.to_string())
                }
            },
        };

        saga.advance(CreationState::RolledBack);
        ChatbotError::CreationRolledBack {
            failed_at,
            cause: Box::new(cause),
            compensation: CompensationReport {
                uploaded_keys: saga.uploaded_keys,
                objects,
                record,
            },
        }
    }
}

fn validate(request: &CreateChatbotRequest) -> Result<(), ChatbotError> {
    if request.name.trim().is_empty() {
        return Err(ChatbotError::Validation("name cannot be empty".to_string()));
    }
    if let Some(position) = request
        .documents
        .iter()
        .position(|d| d.filename.trim().is_empty())
    {
        return Err(ChatbotError::Validation(format!(
            "document #{} has no filename",
            position + 1
        )));
    }
    Ok(())
}
