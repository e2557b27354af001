//! Chatbot deletion pipeline.
//!
//! Deletion runs a fixed sequence with no rollback: purge the chatbot's
//! object prefix, ask the processing service to drop its data, then delete
//! the record. The record goes last so a failed deletion can always be found
//! and retried from it.

use std::sync::Arc;

use chatdocs_types::chatbot::{ChatbotDeleted, ChatbotId, chatbot_prefix};
use chatdocs_types::error::{ChatbotError, ConsistencyError, RepositoryError};
use chatdocs_types::lifecycle::DeletionStage;
use chatdocs_types::user::UserId;
use tracing::{debug, error, info, warn};

use crate::processing::ProcessingService;
use crate::repository::chatbot::ChatbotRepository;
use crate::storage::ObjectStore;

pub struct DeletionOrchestrator<C, O, P> {
    chatbots: Arc<C>,
    objects: Arc<O>,
    processing: Arc<P>,
}

impl<C, O, P> DeletionOrchestrator<C, O, P>
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

    /// Delete chatbot `chatbot_id` owned by `owner_id`.
    ///
    /// Returns `NotFound` without side effects when the chatbot does not exist
    /// or belongs to someone else. A failure while purging objects or
    /// deleting processing data is `DeletionAborted`; a failure deleting the
    /// record after both succeeded is `ConsistencyError::DanglingRecord`.
    pub async fn delete(
        &self,
        chatbot_id: ChatbotId,
        owner_id: UserId,
    ) -> Result<ChatbotDeleted, ChatbotError> {
        match self.chatbots.find_by_id(chatbot_id).await? {
            Some(record) if record.owner_id == owner_id => {}
            _ => return Err(ChatbotError::NotFound),
        }

        let prefix = chatbot_prefix(owner_id, chatbot_id);
        let objects_deleted = self
            .objects
            .delete_by_prefix(&prefix)
            .await
            .map_err(|e| abort(chatbot_id, DeletionStage::PurgeObjects, e.into()))?;
        debug!(chatbot_id = %chatbot_id, objects_deleted, "Purged chatbot objects");

        self.processing
            .delete_chatbot_data(chatbot_id, owner_id)
            .await
            .map_err(|e| abort(chatbot_id, DeletionStage::DeleteProcessingData, e.into()))?;
        debug!(chatbot_id = %chatbot_id, "Processing data deleted");

        match self.chatbots.delete(chatbot_id).await {
            Ok(()) => {}
            Err(RepositoryError::NotFound) => {
                // Deleted concurrently between lookup and now; the end state is the same.
                debug!(chatbot_id = %chatbot_id, "Record already gone");
            }
            Err(source) => {
                error!(
                    chatbot_id = %chatbot_id,
                    owner_id = %owner_id,
                    error = %source,
                    "Chatbot record is dangling: objects and processing data were deleted but the record was not"
                );
                return Err(ConsistencyError::DanglingRecord { chatbot_id, source }.into());
            }
        }

        info!(chatbot_id = %chatbot_id, owner_id = %owner_id, objects_deleted, "Chatbot deleted");
        Ok(ChatbotDeleted {
            chatbot_id,
            objects_deleted,
        })
    }
}

fn abort(chatbot_id: ChatbotId, stage: DeletionStage, cause: ChatbotError) -> ChatbotError {
    warn!(chatbot_id = %chatbot_id, stage = %stage, error = %cause, "Chatbot deletion aborted");
    ChatbotError::DeletionAborted {
        chatbot_id,
        stage,
        cause: Box::new(cause),
    }
}
