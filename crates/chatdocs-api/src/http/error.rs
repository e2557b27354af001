//! Application error type mapping domain errors to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use chatdocs_types::error::{
    ChatbotError, ConsistencyError, RepositoryError, UpstreamError, UserError,
};

use crate::http::response::{ApiErrorDetail, ApiResponse};

/// Unified error type for REST handlers.
#[derive(Debug)]
pub enum AppError {
    Chatbot(ChatbotError),
    User(UserError),
    Upstream(UpstreamError),
    Unauthorized(String),
    Forbidden(String),
    Validation(String),
    Internal(String),
}

impl From<ChatbotError> for AppError {
    fn from(e: ChatbotError) -> Self {
        AppError::Chatbot(e)
    }
}

impl From<UserError> for AppError {
    fn from(e: UserError) -> Self {
        AppError::User(e)
    }
}

impl From<UpstreamError> for AppError {
    fn from(e: UpstreamError) -> Self {
        AppError::Upstream(e)
    }
}

impl AppError {
    /// Status, code, message and optional details for the envelope.
    fn parts(&self) -> (StatusCode, &'static str, String, Option<serde_json::Value>) {
        match self {
            AppError::Chatbot(e) => chatbot_parts(e),
            AppError::User(e) => user_parts(e),
            AppError::Upstream(UpstreamError::InvalidRequest(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None)
            }
            AppError::Upstream(e) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", e.to_string(), None),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone(), None),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone(), None),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None),
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone(), None)
            }
        }
    }
}

fn chatbot_parts(e: &ChatbotError) -> (StatusCode, &'static str, String, Option<serde_json::Value>) {
    let message = e.to_string();
    match e {
        ChatbotError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message, None),
        ChatbotError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message, None),
        ChatbotError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND", message, None),
        ChatbotError::OwnerNotFound(_) => (StatusCode::NOT_FOUND, "USER_NOT_FOUND", message, None),
        ChatbotError::Record(repo) => {
            let (status, code) = repository_status(repo);
            (status, code, message, None)
        }
        ChatbotError::Storage(_) => (StatusCode::SERVICE_UNAVAILABLE, "STORAGE_UNAVAILABLE", message, None),
        ChatbotError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", message, None),
        ChatbotError::CreationRolledBack {
            failed_at,
            cause,
            compensation,
        } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "CREATION_ROLLED_BACK",
            message,
            Some(json!({
                "failed_at": failed_at,
                "cause": cause.to_string(),
                "compensation": compensation,
                "clean": compensation.is_clean(),
            })),
        ),
        ChatbotError::DeletionAborted {
            chatbot_id,
            stage,
            cause,
        } => {
            let status = match cause.as_ref() {
                ChatbotError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
                ChatbotError::Upstream(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (
                status,
                "DELETION_ABORTED",
                message,
                Some(json!({
                    "chatbot_id": chatbot_id,
                    "stage": stage,
                    "objects_purged": stage.objects_purged(),
                })),
            )
        }
        ChatbotError::Consistency(consistency) => {
            let details = match consistency {
                ConsistencyError::DanglingRecord { chatbot_id, .. } => json!({
                    "kind": "dangling_record",
                    "chatbot_id": chatbot_id,
                }),
                ConsistencyError::CascadeAborted {
                    user_id,
                    chatbot_id,
                    deleted,
                    ..
                } => json!({
                    "kind": "cascade_aborted",
                    "user_id": user_id,
                    "failed_chatbot_id": chatbot_id,
                    "deleted": deleted,
                }),
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONSISTENCY_ERROR",
                message,
                Some(details),
            )
        }
    }
}

fn user_parts(e: &UserError) -> (StatusCode, &'static str, String, Option<serde_json::Value>) {
    let message = e.to_string();
    match e {
        UserError::NotFound => (StatusCode::NOT_FOUND, "USER_NOT_FOUND", message, None),
        UserError::EmailTaken(_) => (StatusCode::CONFLICT, "CONFLICT", message, None),
        UserError::InvalidRole(_) | UserError::Validation(_) => {
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message, None)
        }
        UserError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message, None),
        UserError::Hashing(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message, None),
        UserError::Record(repo) => {
            let (status, code) = repository_status(repo);
            (status, code, message, None)
        }
    }
}

fn repository_status(e: &RepositoryError) -> (StatusCode, &'static str) {
    match e {
        RepositoryError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        RepositoryError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
        RepositoryError::Connection | RepositoryError::Query(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR")
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.parts();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), code, error = %message, "Request failed");
        }

        let body = ApiResponse::failure(ApiErrorDetail {
            code: code.to_string(),
            message,
            details,
        });
        let body = serde_json::to_string(&body).unwrap_or_else(|_| {
            r#"{"errors":[{"code":"SERIALIZATION_ERROR","message":"Failed to serialize response"}]}"#
                .to_string()
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatdocs_types::chatbot::ChatbotId;
    use chatdocs_types::error::{StorageError, UpstreamError};
    use chatdocs_types::lifecycle::{
        CompensationOutcome, CompensationReport, CreationState, DeletionStage,
    };
    use chatdocs_types::user::UserId;

    fn status_of(err: AppError) -> (StatusCode, &'static str) {
        let (status, code, _, _) = err.parts();
        (status, code)
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::from(ChatbotError::Validation("x".into())), StatusCode::BAD_REQUEST),
            (AppError::from(ChatbotError::NotFound), StatusCode::NOT_FOUND),
            (AppError::from(UserError::InvalidCredentials), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("admin only".into()), StatusCode::FORBIDDEN),
            (AppError::from(UserError::EmailTaken("a@b.c".into())), StatusCode::CONFLICT),
            (
                AppError::from(ChatbotError::Upstream(UpstreamError::InvalidRequest("x".into()))),
                StatusCode::BAD_GATEWAY,
            ),
            (
                AppError::from(ChatbotError::Storage(StorageError::InvalidRequest("x".into()))),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AppError::from(UpstreamError::Transport {
                    endpoint: "http://py:8000/ask".into(),
                    message: "refused".into(),
                }),
                StatusCode::BAD_GATEWAY,
            ),
            (
                AppError::from(UpstreamError::InvalidRequest("bad header".into())),
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(status_of(err).0, expected);
        }
    }

    #[test]
    fn test_rollback_carries_compensation_details() {
        let err = AppError::from(ChatbotError::CreationRolledBack {
            failed_at: CreationState::RecordCreated,
            cause: Box::new(ChatbotError::Storage(StorageError::PermissionDenied {
                operation: "put_object",
                message: "AccessDenied".into(),
            })),
            compensation: CompensationReport {
                uploaded_keys: vec!["users/user1/chatbot1/documents/a.txt".into()],
                objects: CompensationOutcome::Succeeded,
                record: CompensationOutcome::Failed("locked".into()),
            },
        });
        let (status, code, _, details) = err.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "CREATION_ROLLED_BACK");
        let details = details.unwrap();
        assert_eq!(details["failed_at"], "record_created");
        assert_eq!(details["compensation"]["record"]["outcome"], "failed");
        assert_eq!(details["clean"], false);
    }

    #[test]
    fn test_deletion_abort_status_follows_cause() {
        let err = AppError::from(ChatbotError::DeletionAborted {
            chatbot_id: ChatbotId(4),
            stage: DeletionStage::DeleteProcessingData,
            cause: Box::new(ChatbotError::Upstream(UpstreamError::Transport {
                endpoint: "/delete".into(),
                message: "refused".into(),
            })),
        });
        let (status, code, _, details) = err.parts();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(code, "DELETION_ABORTED");
        assert_eq!(details.unwrap()["objects_purged"], true);
    }

    #[test]
    fn test_consistency_errors_are_flagged() {
        let err = AppError::from(ChatbotError::from(ConsistencyError::CascadeAborted {
            user_id: UserId(2),
            chatbot_id: ChatbotId(6),
            deleted: vec![ChatbotId(5)],
            source: Box::new(ChatbotError::NotFound),
        }));
        let (status, code, _, details) = err.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "CONSISTENCY_ERROR");
        assert_eq!(details.unwrap()["deleted"], json!([5]));
    }
}
