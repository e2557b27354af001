//! Chatbot lifecycle handlers.
//!
//! Creation and deletion are spawned onto the runtime and awaited through
//! their `JoinHandle`: axum drops a handler future when the client
//! disconnects, and a half-run orchestration must still finish its steps
//! (or its rollback).

use std::time::Instant;

use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;

use chatdocs_types::chatbot::{
    Chatbot, ChatbotCreated, ChatbotDeleted, ChatbotId, CreateChatbotRequest, DocumentUpload,
};

use crate::http::error::AppError;
use crate::http::extractors::auth::Caller;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Multipart field carrying the chatbot name.
const NAME_FIELD: &str = "name";
/// Multipart field carrying documents; may repeat.
const FILES_FIELD: &str = "files";

/// GET /chatbots/my - Chatbots owned by the caller.
pub async fn list_my_chatbots(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<ApiResponse<Vec<Chatbot>>>, AppError> {
    let start = Instant::now();
    let chatbots = state.chatbots.list_for_owner(caller.user_id).await?;
    Ok(Json(
        ApiResponse::success(chatbots, start).with_link("self", "/chatbots/my"),
    ))
}

/// POST /chatbots - Create a chatbot from uploaded documents.
pub async fn create_chatbot(
    State(state): State<AppState>,
    caller: Caller,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<ChatbotCreated>>), AppError> {
    let start = Instant::now();
    let request = read_create_request(multipart).await?;

    let creation = state.creation.clone();
    let owner_id = caller.user_id;
    let created = tokio::spawn(async move { creation.create(owner_id, request).await })
        .await
        .map_err(|e| AppError::Internal(format!("creation task failed: {e}")))??;

    let link = format!("/chatbots/{}", created.chatbot.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(created, start).with_link("self", &link)),
    ))
}

/// GET /chatbots/{id}
pub async fn get_chatbot(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Chatbot>>, AppError> {
    let start = Instant::now();
    let id = parse_chatbot_id(&id)?;
    let chatbot = state.chatbots.get_for_owner(id, caller.user_id).await?;
    let link = format!("/chatbots/{id}");
    Ok(Json(ApiResponse::success(chatbot, start).with_link("self", &link)))
}

/// DELETE /chatbots/{id} (and the legacy DELETE /chatbots/delete/{id}).
pub async fn delete_chatbot(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ChatbotDeleted>>, AppError> {
    let start = Instant::now();
    let id = parse_chatbot_id(&id)?;

    let deletion = state.deletion.clone();
    let owner_id = caller.user_id;
    let deleted = tokio::spawn(async move { deletion.delete(id, owner_id).await })
        .await
        .map_err(|e| AppError::Internal(format!("deletion task failed: {e}")))??;

    Ok(Json(
        ApiResponse::success(deleted, start).with_link("chatbots", "/chatbots/my"),
    ))
}

fn parse_chatbot_id(raw: &str) -> Result<ChatbotId, AppError> {
    raw.parse()
        .map_err(|_| AppError::Validation(format!("invalid chatbot id '{raw}'")))
}

/// Collect the `name` field and every `files` part. Other fields are ignored.
async fn read_create_request(mut multipart: Multipart) -> Result<CreateChatbotRequest, AppError> {
    let mut request = CreateChatbotRequest::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(NAME_FIELD) => {
                request.name = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("unreadable name field: {e}")))?;
            }
            Some(FILES_FIELD) => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let content = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("unreadable file '{filename}': {e}")))?;
                request
                    .documents
                    .push(DocumentUpload::new(filename, content_type.as_deref(), content));
            }
            other => {
                tracing::debug!(field = ?other, "Ignoring unexpected multipart field");
            }
        }
    }

    Ok(request)
}
