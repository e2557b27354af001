//! Read-side chatbot queries, always scoped to the owner.

use std::sync::Arc;

use chatdocs_types::chatbot::{Chatbot, ChatbotId};
use chatdocs_types::error::ChatbotError;
use chatdocs_types::user::UserId;

use crate::repository::chatbot::ChatbotRepository;

pub struct ChatbotQueries<C> {
    chatbots: Arc<C>,
}

impl<C: ChatbotRepository> ChatbotQueries<C> {
    pub fn new(chatbots: Arc<C>) -> Self {
        Self { chatbots }
    }

    pub async fn list_for_owner(&self, owner_id: UserId) -> Result<Vec<Chatbot>, ChatbotError> {
        Ok(self.chatbots.find_by_owner(owner_id).await?)
    }

    /// Fetch one chatbot. Someone else's chatbot is reported as `NotFound`
    /// so ids of other users are not disclosed.
    pub async fn get_for_owner(
        &self,
        id: ChatbotId,
        owner_id: UserId,
    ) -> Result<Chatbot, ChatbotError> {
        match self.chatbots.find_by_id(id).await? {
            Some(chatbot) if chatbot.owner_id == owner_id => Ok(chatbot),
            _ => Err(ChatbotError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeChatbots, Journal};

    #[tokio::test]
    async fn test_queries_are_owner_scoped() {
        let repo = Arc::new(FakeChatbots::new(Journal::default()));
        let mine = repo.seed(UserId(1), "mine");
        let theirs = repo.seed(UserId(2), "theirs");
        let queries = ChatbotQueries::new(repo);

        let listed = queries.list_for_owner(UserId(1)).await.unwrap();
        assert_eq!(listed, vec![mine.clone()]);

        assert_eq!(queries.get_for_owner(mine.id, UserId(1)).await.unwrap(), mine);
        assert!(matches!(
            queries.get_for_owner(theirs.id, UserId(1)).await,
            Err(ChatbotError::NotFound)
        ));
        assert!(matches!(
            queries.get_for_owner(ChatbotId(77), UserId(1)).await,
            Err(ChatbotError::NotFound)
        ));
    }
}
