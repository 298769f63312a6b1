// dtos/chatdtos.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::chatmodels::DeleteMode;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateConversationDto {
    #[validate(length(min = 1, max = 20, message = "Between 1 and 20 other participants"))]
    pub participant_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_message_content"))]
pub struct SendMessageDto {
    pub conversation_id: Uuid,
    #[validate(length(min = 1, max = 5000))]
    pub text: Option<String>,
    #[validate(length(min = 1, max = 2048))]
    pub media: Option<String>,
}

fn validate_message_content(dto: &SendMessageDto) -> Result<(), ValidationError> {
    let has_text = dto.text.as_deref().map(|t| !t.trim().is_empty()).unwrap_or(false);
    let has_media = dto.media.as_deref().map(|m| !m.trim().is_empty()).unwrap_or(false);
    if has_text || has_media {
        Ok(())
    } else {
        let mut err = ValidationError::new("empty_message");
        err.message = Some("A message needs text or media".into());
        Err(err)
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct DeleteMessageQuery {
    #[serde(default)]
    pub mode: DeleteMode,
}

#[derive(Debug, Serialize, Clone)]
pub struct ConversationParticipant {
    pub id: Uuid,
    pub username: String,
    pub img: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_needs_text_or_media() {
        let empty = SendMessageDto {
            conversation_id: Uuid::new_v4(),
            text: Some("   ".to_string()),
            media: None,
        };
        assert!(empty.validate().is_err());

        let media_only = SendMessageDto {
            conversation_id: Uuid::new_v4(),
            text: None,
            media: Some("photo.png".to_string()),
        };
        assert!(media_only.validate().is_ok());
    }

    #[test]
    fn test_delete_mode_defaults_to_me() {
        let query: DeleteMessageQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.mode, DeleteMode::Me);

        let query: DeleteMessageQuery = serde_json::from_str(r#"{"mode":"everyone"}"#).unwrap();
        assert_eq!(query.mode, DeleteMode::Everyone);
    }
}
