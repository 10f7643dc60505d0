//! Symptom chatbot endpoints.
//!
//! `POST /api/chat` — send a message, get the assistant reply plus
//! doctor recommendations
//! `GET /api/chat/conversations` — list the caller's conversations
//! `GET /api/chat/conversations/:id` — full message history

use axum::extract::{Path, State};
use axum::{Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthContext};
use crate::db::repository::{conversation, doctor};
use crate::llm::prompt;
use crate::llm::triage::{self, Triage};
use crate::llm::LlmGenerate;
use crate::models::enums::{MessageSender, Role};
use crate::models::{Conversation, DoctorListing, Message};

const MAX_MESSAGE_LEN: usize = 2000;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub conversation_id: Option<Uuid>,
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub conversation_id: Uuid,
    pub reply: String,
    pub triage: Triage,
    /// Doctors matching the triaged specialty. Empty when the reply
    /// failed to parse or nobody matches.
    pub recommended_doctors: Vec<DoctorListing>,
}

/// `POST /api/chat`
pub async fn send(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<AuthContext>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if caller.role != Role::Patient {
        return Err(ApiError::Forbidden);
    }
    let message = req.message.trim().to_string();
    if message.is_empty() {
        return Err(ApiError::BadRequest("Message cannot be empty".into()));
    }
    if message.len() > MAX_MESSAGE_LEN {
        return Err(ApiError::BadRequest(format!(
            "Message too long (max {MAX_MESSAGE_LEN} chars)"
        )));
    }

    let conn = ctx.open_db()?;

    // Create or reuse the conversation; history feeds the prompt.
    let (conv_id, history) = match req.conversation_id {
        Some(id) => {
            let conv = conversation::get_conversation(&conn, &id)?
                .ok_or_else(|| ApiError::NotFound("Conversation not found".into()))?;
            if conv.patient_id != caller.user_id {
                return Err(ApiError::Forbidden);
            }
            let history = conversation::list_messages(&conn, &id)?;
            (id, history)
        }
        None => {
            let conv = Conversation {
                id: Uuid::new_v4(),
                patient_id: caller.user_id,
                title: conversation_title(&message),
                started_at: Utc::now(),
            };
            conversation::insert_conversation(&conn, &conv)?;
            (conv.id, Vec::new())
        }
    };

    conversation::insert_message(
        &conn,
        &Message {
            id: Uuid::new_v4(),
            conversation_id: conv_id,
            sender: MessageSender::Patient,
            content: message.clone(),
            sent_at: Utc::now(),
        },
    )?;

    // The Ollama client blocks; hop off the async runtime for the call.
    let llm = ctx.llm.clone();
    let user_prompt = prompt::triage_prompt(&history, &message);
    let raw_reply = tokio::task::spawn_blocking(move || {
        llm.generate(prompt::TRIAGE_SYSTEM, &user_prompt)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("triage task: {e}")))?
    .map_err(ApiError::from)?;

    let triage = triage::parse_triage_response(&raw_reply);

    let recommended_doctors = match &triage.specialty {
        Some(specialty) => doctor::find_doctors_by_specialty(&conn, specialty)?,
        None => Vec::new(),
    };

    conversation::insert_message(
        &conn,
        &Message {
            id: Uuid::new_v4(),
            conversation_id: conv_id,
            sender: MessageSender::Assistant,
            content: triage.reply.clone(),
            sent_at: Utc::now(),
        },
    )?;

    Ok(Json(ChatResponse {
        conversation_id: conv_id,
        reply: triage.reply.clone(),
        triage,
        recommended_doctors,
    }))
}

/// First words of the opening message, used as the conversation title.
fn conversation_title(message: &str) -> String {
    let title: String = message.chars().take(48).collect();
    if title.len() < message.len() {
        format!("{title}…")
    } else {
        title
    }
}

#[derive(Serialize)]
pub struct ConversationsResponse {
    pub conversations: Vec<Conversation>,
}

/// `GET /api/chat/conversations`
pub async fn conversations(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<AuthContext>,
) -> Result<Json<ConversationsResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let conversations = conversation::list_conversations(&conn, &caller.user_id)?;
    Ok(Json(ConversationsResponse { conversations }))
}

#[derive(Serialize)]
pub struct ConversationDetailResponse {
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}

/// `GET /api/chat/conversations/:id`
pub async fn conversation_detail(
    State(ctx): State<ApiContext>,
    Extension(caller): Extension<AuthContext>,
    Path(conversation_id): Path<Uuid>,
) -> Result<Json<ConversationDetailResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let conv = conversation::get_conversation(&conn, &conversation_id)?
        .ok_or_else(|| ApiError::NotFound("Conversation not found".into()))?;
    if conv.patient_id != caller.user_id && caller.role != Role::Admin {
        return Err(ApiError::Forbidden);
    }

    let messages = conversation::list_messages(&conn, &conversation_id)?;
    Ok(Json(ConversationDetailResponse {
        conversation: conv,
        messages,
    }))
}
