use std::{collections::HashSet, sync::Arc};

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{chatdb::ChatExt, userdb::UserExt},
    dtos::{
        chatdtos::{
            ConversationParticipant, CreateConversationDto, DeleteMessageQuery, SendMessageDto,
        },
        RequestQueryDto,
    },
    error::{ErrorMessage, HttpError},
    middleware::JWTAuthMiddeware,
    models::chatmodels::{Conversation, DeleteMode},
    service::notification_service::EmailJob,
    utils::media::message_preview,
    AppState,
};

pub fn conversations_handler() -> Router {
    Router::new()
        .route("/", post(create_conversation).get(get_conversations))
        .route("/:id", get(get_conversation))
}

pub fn messages_handler() -> Router {
    Router::new()
        .route("/", post(send_message))
        // GET takes a conversation id, DELETE a message id.
        .route("/:id", get(get_messages).delete(delete_message))
}

/// Caller plus requested ids, deduplicated, in request order.
fn participant_set(caller: Uuid, requested: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    std::iter::once(caller)
        .chain(requested.iter().copied())
        .filter(|id| seen.insert(*id))
        .collect()
}

async fn load_conversation_for(
    app_state: &AppState,
    conversation_id: Uuid,
    user_id: Uuid,
) -> Result<Conversation, HttpError> {
    let conversation = app_state
        .db_client
        .get_conversation(conversation_id)
        .await
        .map_err(HttpError::database)?
        .ok_or_else(|| HttpError::not_found("Conversation not found"))?;

    if !conversation.has_participant(user_id) {
        return Err(HttpError::forbidden(ErrorMessage::PermissionDenied.to_string()));
    }

    Ok(conversation)
}

pub async fn create_conversation(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateConversationDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let participants = participant_set(auth.user.id, &body.participant_ids);
    if participants.len() < 2 {
        return Err(HttpError::bad_request(
            "A conversation needs at least one other participant",
        ));
    }

    let users = app_state
        .db_client
        .get_users_by_ids(&participants)
        .await
        .map_err(HttpError::database)?;
    if users.len() != participants.len() {
        return Err(HttpError::not_found("One or more participants do not exist"));
    }

    if let Some(existing) = app_state
        .db_client
        .find_conversation_by_participants(&participants)
        .await
        .map_err(HttpError::database)?
    {
        return Ok((
            StatusCode::OK,
            Json(serde_json::json!({"status": "success", "data": existing})),
        ));
    }

    let conversation = app_state
        .db_client
        .create_conversation(&participants)
        .await
        .map_err(HttpError::database)?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({"status": "success", "data": conversation})),
    ))
}

pub async fn get_conversations(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let conversations = app_state
        .db_client
        .get_user_conversations(auth.user.id)
        .await
        .map_err(HttpError::database)?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "results": conversations.len(),
        "data": conversations
    })))
}

pub async fn get_conversation(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(conversation_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let conversation = load_conversation_for(&app_state, conversation_id, auth.user.id).await?;

    let participants: Vec<ConversationParticipant> = app_state
        .db_client
        .get_users_by_ids(&conversation.participant_ids)
        .await
        .map_err(HttpError::database)?
        .into_iter()
        .map(|user| ConversationParticipant {
            id: user.id,
            username: user.username,
            img: user.img,
        })
        .collect();

    Ok(Json(serde_json::json!({
        "status": "success",
        "data": {
            "conversation": conversation,
            "participants": participants
        }
    })))
}

pub async fn send_message(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Json(body): Json<SendMessageDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let conversation =
        load_conversation_for(&app_state, body.conversation_id, auth.user.id).await?;

    let text = body.text.filter(|t| !t.trim().is_empty());
    let media = body.media.filter(|m| !m.trim().is_empty());
    let (media_type, preview) = message_preview(text.as_deref(), media.as_deref());

    let message = app_state
        .db_client
        .send_message(
            conversation.id,
            auth.user.id,
            text,
            media,
            media_type,
            &preview,
        )
        .await
        .map_err(HttpError::database)?;

    let recipients = app_state
        .db_client
        .get_users_by_ids(&conversation.other_participants(auth.user.id))
        .await
        .map_err(HttpError::database)?;

    for recipient in recipients {
        app_state.outbox.enqueue(EmailJob::NewMessage {
            email: recipient.email,
            username: recipient.username,
            sender: auth.user.username.clone(),
            preview: preview.clone(),
            conversation_id: conversation.id,
        });
    }

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({"status": "success", "data": message})),
    ))
}

pub async fn get_messages(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(conversation_id): Path<Uuid>,
    Query(query_params): Query<RequestQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    query_params
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    load_conversation_for(&app_state, conversation_id, auth.user.id).await?;

    let messages = app_state
        .db_client
        .get_messages(
            conversation_id,
            auth.user.id,
            query_params.limit() as i64,
            query_params.offset(),
        )
        .await
        .map_err(HttpError::database)?;

    Ok(Json(serde_json::json!({
        "status": "success",
        "results": messages.len(),
        "data": messages
    })))
}

pub async fn delete_message(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(message_id): Path<Uuid>,
    Query(query): Query<DeleteMessageQuery>,
) -> Result<impl IntoResponse, HttpError> {
    let message = app_state
        .db_client
        .get_message(message_id)
        .await
        .map_err(HttpError::database)?
        .ok_or_else(|| HttpError::not_found("Message not found"))?;

    load_conversation_for(&app_state, message.conversation_id, auth.user.id).await?;

    match query.mode {
        DeleteMode::Me => {
            app_state
                .db_client
                .soft_delete_message(message.id, auth.user.id)
                .await
                .map_err(HttpError::database)?;
        }
        DeleteMode::Everyone => {
            if !message.can_delete_for_everyone(auth.user.id) {
                return Err(HttpError::forbidden(
                    "Only the sender can delete a message for everyone",
                ));
            }
            app_state
                .db_client
                .hard_delete_message(&message)
                .await
                .map_err(HttpError::database)?;
        }
    }

    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "Message deleted"
    })))
}
