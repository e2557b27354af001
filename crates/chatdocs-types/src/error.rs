use thiserror::Error;

use crate::chatbot::ChatbotId;
use crate::lifecycle::{CompensationReport, CreationState, DeletionStage};
use crate::user::UserId;

/// Errors from repository operations (used by trait definitions in chatdocs-core).
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Object-store failures.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("object store transport error during {operation}: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    #[error("object store denied {operation}: {message}")]
    PermissionDenied {
        operation: &'static str,
        message: String,
    },

    #[error("object store rejected {operation}: {message}")]
    Rejected {
        operation: &'static str,
        message: String,
    },

    #[error("invalid object store request: {0}")]
    InvalidRequest(String),
}

/// Failures talking to the external processing service.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    #[error("processing service returned status {status} for {endpoint}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("processing service request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    #[error("invalid processing request: {0}")]
    InvalidRequest(String),
}

/// The system was left in a partially torn-down state.
#[derive(Debug, Error)]
pub enum ConsistencyError {
    /// Objects and processing data are gone but the record survived.
    #[error(
        "chatbot {chatbot_id} is dangling: stored objects and processing data were deleted but the record delete failed: {source}"
    )]
    DanglingRecord {
        chatbot_id: ChatbotId,
        #[source]
        source: RepositoryError,
    },

    /// A user cascade stopped at `chatbot_id`; `deleted` were already removed.
    #[error("deletion of user {user_id} aborted at chatbot {chatbot_id} (already deleted: {deleted:?}): {source}")]
    CascadeAborted {
        user_id: UserId,
        chatbot_id: ChatbotId,
        deleted: Vec<ChatbotId>,
        #[source]
        source: Box<ChatbotError>,
    },
}

/// Errors related to chatbot lifecycle operations.
#[derive(Debug, Error)]
pub enum ChatbotError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("chatbot not found")]
    NotFound,

    #[error("user {0} not found")]
    OwnerNotFound(UserId),

    #[error("record store error: {0}")]
    Record(#[from] RepositoryError),

    #[error("object storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("processing service error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Creation failed and compensation ran. `failed_at` is the last state
    /// reached before the failing step.
    #[error("chatbot creation failed at {failed_at} and was rolled back ({compensation}): {cause}")]
    CreationRolledBack {
        failed_at: CreationState,
        #[source]
        cause: Box<ChatbotError>,
        compensation: CompensationReport,
    },

    /// Deletion stopped before touching the record.
    #[error("deletion of chatbot {chatbot_id} aborted at {stage}: {cause}")]
    DeletionAborted {
        chatbot_id: ChatbotId,
        stage: DeletionStage,
        #[source]
        cause: Box<ChatbotError>,
    },

    #[error(transparent)]
    Consistency(#[from] ConsistencyError),
}

/// Errors related to accounts and authentication.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found")]
    NotFound,

    #[error("email '{0}' is already registered")]
    EmailTaken(String),

    #[error("{0}")]
    InvalidRole(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("credential hashing failed: {0}")]
    Hashing(String),

    #[error("record store error: {0}")]
    Record(#[from] RepositoryError),
}
