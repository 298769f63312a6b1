// models/chatmodels.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::media::MediaType;

#[derive(Debug, Serialize, Clone, Deserialize, sqlx::FromRow)]
pub struct Conversation {
    pub id: Uuid,
    pub participant_ids: Vec<Uuid>,
    pub last_message_text: Option<String>,
    pub last_message_media_type: Option<MediaType>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.participant_ids.contains(&user_id)
    }

    pub fn other_participants(&self, user_id: Uuid) -> Vec<Uuid> {
        self.participant_ids
            .iter()
            .copied()
            .filter(|id| *id != user_id)
            .collect()
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub text: Option<String>,
    pub media: Option<String>,
    pub media_type: MediaType,
    #[serde(skip_serializing)]
    pub deleted_by: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn can_delete_for_everyone(&self, user_id: Uuid) -> bool {
        self.sender_id == user_id
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeleteMode {
    /// Hide for the requester only.
    #[default]
    Me,
    /// Remove the message for all participants.
    Everyone,
}

pub const CONVERSATION_COLUMNS: &str = r#"
    id, participant_ids, last_message_text, last_message_media_type,
    last_message_at, created_at
"#;

pub const MESSAGE_COLUMNS: &str = r#"
    id, conversation_id, sender_id, text, media, media_type, deleted_by, created_at
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn message(sender: Uuid, deleted_by: Vec<Uuid>) -> Message {
        Message {
            id: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
            sender_id: sender,
            text: Some("hi".to_string()),
            media: None,
            media_type: MediaType::Text,
            deleted_by,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_only_sender_deletes_for_everyone() {
        let sender = Uuid::new_v4();
        let other = Uuid::new_v4();
        let msg = message(sender, vec![]);
        assert!(msg.can_delete_for_everyone(sender));
        assert!(!msg.can_delete_for_everyone(other));
    }

    #[test]
    fn test_other_participants_excludes_caller() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let conversation = Conversation {
            id: Uuid::new_v4(),
            participant_ids: vec![a, b, c],
            last_message_text: None,
            last_message_media_type: None,
            last_message_at: None,
            created_at: Utc::now(),
        };
        assert_eq!(conversation.other_participants(a), vec![b, c]);
        assert!(conversation.has_participant(c));
        assert!(!conversation.has_participant(Uuid::new_v4()));
    }
}
