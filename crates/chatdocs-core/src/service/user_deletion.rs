//! Cascading user deletion.

use std::sync::Arc;

use chatdocs_types::error::{ChatbotError, ConsistencyError};
use chatdocs_types::user::{UserDeleted, UserId};
use tracing::{error, info};

use crate::processing::ProcessingService;
use crate::repository::chatbot::ChatbotRepository;
use crate::repository::user::UserRepository;
use crate::service::deletion::DeletionOrchestrator;
use crate::storage::ObjectStore;

/// Deletes a user after tearing down every chatbot they own.
///
/// Chatbots are deleted one at a time in ascending id order. The first
/// failure stops the cascade: chatbots already deleted stay deleted, the
/// remaining ones and the user record are left untouched.
pub struct UserDeletionOrchestrator<U, C, O, P> {
    users: Arc<U>,
    chatbots: Arc<C>,
    deletion: DeletionOrchestrator<C, O, P>,
}

impl<U, C, O, P> UserDeletionOrchestrator<U, C, O, P>
where
    U: UserRepository,
    C: ChatbotRepository,
    O: ObjectStore,
    P: ProcessingService,
{
    pub fn new(users: Arc<U>, chatbots: Arc<C>, objects: Arc<O>, processing: Arc<P>) -> Self {
        Self {
            users,
            deletion: DeletionOrchestrator::new(chatbots.clone(), objects, processing),
            chatbots,
        }
    }

    pub async fn delete_user(&self, user_id: UserId) -> Result<UserDeleted, ChatbotError> {
        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(ChatbotError::OwnerNotFound(user_id));
        }

        let ids = self.chatbots.list_ids_by_owner(user_id).await?;
        info!(user_id = %user_id, chatbots = ids.len(), "Deleting user and owned chatbots");

        let mut deleted = Vec::with_capacity(ids.len());
        for chatbot_id in ids {
            if let Err(e) = self.deletion.delete(chatbot_id, user_id).await {
                error!(
                    user_id = %user_id,
                    chatbot_id = %chatbot_id,
                    already_deleted = ?deleted,
                    error = %e,
                    "User deletion aborted"
                );
                return Err(ConsistencyError::CascadeAborted {
                    user_id,
                    chatbot_id,
                    deleted,
                    source: Box::new(e),
                }
                .into());
            }
            deleted.push(chatbot_id);
        }

        // Access tokens go with the user row (ON DELETE CASCADE).
        self.users.delete(user_id).await?;
        info!(user_id = %user_id, "User deleted");

        Ok(UserDeleted {
            user_id,
            chatbots_deleted: deleted,
        })
    }
}
