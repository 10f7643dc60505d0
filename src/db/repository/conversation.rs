use std::str::FromStr;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::MessageSender;
use crate::models::{Conversation, Message};

pub fn insert_conversation(conn: &Connection, conv: &Conversation) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO conversations (id, patient_id, title, started_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            conv.id.to_string(),
            conv.patient_id.to_string(),
            conv.title,
            conv.started_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_conversation(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<Conversation>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, patient_id, title, started_at FROM conversations WHERE id = ?1",
            params![id.to_string()],
            conversation_from_row,
        )
        .optional()?;
    Ok(row)
}

pub fn list_conversations(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Conversation>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, title, started_at FROM conversations
         WHERE patient_id = ?1 ORDER BY started_at DESC",
    )?;
    let rows = stmt.query_map(params![patient_id.to_string()], conversation_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn insert_message(conn: &Connection, msg: &Message) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO messages (id, conversation_id, sender, content, sent_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            msg.id.to_string(),
            msg.conversation_id.to_string(),
            msg.sender.as_str(),
            msg.content,
            msg.sent_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn list_messages(
    conn: &Connection,
    conversation_id: &Uuid,
) -> Result<Vec<Message>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, conversation_id, sender, content, sent_at FROM messages
         WHERE conversation_id = ?1 ORDER BY sent_at",
    )?;
    let rows = stmt.query_map(params![conversation_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut messages = Vec::new();
    for row in rows {
        let (id, conversation_id, sender, content, sent_at) = row?;
        messages.push(Message {
            id: Uuid::parse_str(&id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            conversation_id: Uuid::parse_str(&conversation_id)
                .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
            sender: MessageSender::from_str(&sender)?,
            content,
            sent_at: DateTime::parse_from_rfc3339(&sent_at)
                .map(|d| d.with_timezone(&Utc))
                .unwrap_or_default(),
        });
    }
    Ok(messages)
}

fn conversation_from_row(row: &rusqlite::Row<'_>) -> Result<Conversation, rusqlite::Error> {
    Ok(Conversation {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap_or_default(),
        patient_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap_or_default(),
        title: row.get(2)?,
        started_at: DateTime::parse_from_rfc3339(&row.get::<_, String>(3)?)
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_default(),
    })
}
