// db/chatdb.rs
use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::{
    models::chatmodels::{Conversation, Message, CONVERSATION_COLUMNS, MESSAGE_COLUMNS},
    utils::media::{message_preview, MediaType},
};

#[async_trait]
pub trait ChatExt {
    // Conversations
    async fn find_conversation_by_participants(
        &self,
        participant_ids: &[Uuid],
    ) -> Result<Option<Conversation>, Error>;

    async fn create_conversation(&self, participant_ids: &[Uuid]) -> Result<Conversation, Error>;

    async fn get_conversation(&self, conversation_id: Uuid) -> Result<Option<Conversation>, Error>;

    async fn get_user_conversations(&self, user_id: Uuid) -> Result<Vec<Conversation>, Error>;

    // Messages
    async fn send_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        text: Option<String>,
        media: Option<String>,
        media_type: MediaType,
        preview: &str,
    ) -> Result<Message, Error>;

    async fn get_messages(
        &self,
        conversation_id: Uuid,
        viewer_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>, Error>;

    async fn get_message(&self, message_id: Uuid) -> Result<Option<Message>, Error>;

    async fn soft_delete_message(&self, message_id: Uuid, user_id: Uuid) -> Result<(), Error>;

    async fn hard_delete_message(&self, message: &Message) -> Result<(), Error>;
}

#[async_trait]
impl ChatExt for DBClient {
    async fn find_conversation_by_participants(
        &self,
        participant_ids: &[Uuid],
    ) -> Result<Option<Conversation>, Error> {
        // Set equality: each array contains the other.
        let sql = format!(
            r#"
            SELECT {} FROM conversations
            WHERE participant_ids @> $1 AND participant_ids <@ $1
            LIMIT 1
            "#,
            CONVERSATION_COLUMNS
        );

        sqlx::query_as::<_, Conversation>(&sql)
            .bind(participant_ids)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_conversation(&self, participant_ids: &[Uuid]) -> Result<Conversation, Error> {
        let sql = format!(
            "INSERT INTO conversations (participant_ids) VALUES ($1) RETURNING {}",
            CONVERSATION_COLUMNS
        );

        sqlx::query_as::<_, Conversation>(&sql)
            .bind(participant_ids)
            .fetch_one(&self.pool)
            .await
    }

    async fn get_conversation(&self, conversation_id: Uuid) -> Result<Option<Conversation>, Error> {
        let sql = format!("SELECT {} FROM conversations WHERE id = $1", CONVERSATION_COLUMNS);
        sqlx::query_as::<_, Conversation>(&sql)
            .bind(conversation_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_user_conversations(&self, user_id: Uuid) -> Result<Vec<Conversation>, Error> {
        let sql = format!(
            r#"
            SELECT {} FROM conversations
            WHERE $1 = ANY(participant_ids)
            ORDER BY last_message_at DESC NULLS LAST, created_at DESC
            "#,
            CONVERSATION_COLUMNS
        );
        sqlx::query_as::<_, Conversation>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
    }

    async fn send_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        text: Option<String>,
        media: Option<String>,
        media_type: MediaType,
        preview: &str,
    ) -> Result<Message, Error> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO messages (conversation_id, sender_id, text, media, media_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            MESSAGE_COLUMNS
        );

        let message = sqlx::query_as::<_, Message>(&sql)
            .bind(conversation_id)
            .bind(sender_id)
            .bind(text)
            .bind(media)
            .bind(media_type)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE conversations
            SET last_message_text = $2,
                last_message_media_type = $3,
                last_message_at = $4
            WHERE id = $1
            "#,
        )
        .bind(conversation_id)
        .bind(preview)
        .bind(media_type)
        .bind(message.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(message)
    }

    async fn get_messages(
        &self,
        conversation_id: Uuid,
        viewer_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Message>, Error> {
        let sql = format!(
            r#"
            SELECT {} FROM messages
            WHERE conversation_id = $1 AND NOT ($2 = ANY(deleted_by))
            ORDER BY created_at ASC
            LIMIT $3 OFFSET $4
            "#,
            MESSAGE_COLUMNS
        );

        sqlx::query_as::<_, Message>(&sql)
            .bind(conversation_id)
            .bind(viewer_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
    }

    async fn get_message(&self, message_id: Uuid) -> Result<Option<Message>, Error> {
        let sql = format!("SELECT {} FROM messages WHERE id = $1", MESSAGE_COLUMNS);
        sqlx::query_as::<_, Message>(&sql)
            .bind(message_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn soft_delete_message(&self, message_id: Uuid, user_id: Uuid) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE messages
            SET deleted_by = array_append(deleted_by, $2)
            WHERE id = $1 AND NOT ($2 = ANY(deleted_by))
            "#,
        )
        .bind(message_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn hard_delete_message(&self, message: &Message) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(message.id)
            .execute(&mut *tx)
            .await?;

        // Preview falls back to the newest remaining message.
        let latest: Option<(Option<String>, Option<String>, MediaType, chrono::DateTime<chrono::Utc>)> =
            sqlx::query_as(
                r#"
                SELECT text, media, media_type, created_at FROM messages
                WHERE conversation_id = $1
                ORDER BY created_at DESC
                LIMIT 1
                "#,
            )
            .bind(message.conversation_id)
            .fetch_optional(&mut *tx)
            .await?;

        let (text, media_type, at) = match latest {
            Some((text, media, _, created_at)) => {
                let (media_type, preview) = message_preview(text.as_deref(), media.as_deref());
                (Some(preview), Some(media_type), Some(created_at))
            }
            None => (None, None, None),
        };

        sqlx::query(
            r#"
            UPDATE conversations
            SET last_message_text = $2,
                last_message_media_type = $3,
                last_message_at = $4
            WHERE id = $1
            "#,
        )
        .bind(message.conversation_id)
        .bind(text)
        .bind(media_type)
        .bind(at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use super::*;
    use crate::db::fixtures::seed_user;

    async fn send(
        db: &DBClient,
        conversation_id: Uuid,
        sender_id: Uuid,
        text: Option<&str>,
        media: Option<&str>,
    ) -> Message {
        let (media_type, preview) = message_preview(text, media);
        db.send_message(
            conversation_id,
            sender_id,
            text.map(str::to_string),
            media.map(str::to_string),
            media_type,
            &preview,
        )
        .await
        .unwrap()
    }

    #[sqlx::test]
    async fn test_conversation_lookup_ignores_participant_order(pool: PgPool) {
        let db = DBClient::new(pool);
        let ada = seed_user(&db, "ada").await;
        let bola = seed_user(&db, "bola").await;

        let created = db.create_conversation(&[ada.id, bola.id]).await.unwrap();
        let found = db
            .find_conversation_by_participants(&[bola.id, ada.id])
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.id, created.id);
        assert_eq!(db.get_user_conversations(bola.id).await.unwrap().len(), 1);
    }

    #[sqlx::test]
    async fn test_send_updates_conversation_preview(pool: PgPool) {
        let db = DBClient::new(pool);
        let ada = seed_user(&db, "ada").await;
        let bola = seed_user(&db, "bola").await;
        let conversation = db.create_conversation(&[ada.id, bola.id]).await.unwrap();

        let message = send(
            &db,
            conversation.id,
            ada.id,
            Some("see attached"),
            Some("https://cdn.gighub.test/brief.pdf"),
        )
        .await;
        assert_eq!(message.media_type, MediaType::Document);

        let conversation = db.get_conversation(conversation.id).await.unwrap().unwrap();
        assert_eq!(conversation.last_message_text.as_deref(), Some("Document"));
        assert_eq!(conversation.last_message_media_type, Some(MediaType::Document));
        assert_eq!(conversation.last_message_at, Some(message.created_at));
    }

    #[sqlx::test]
    async fn test_soft_delete_hides_message_only_for_deleter(pool: PgPool) {
        let db = DBClient::new(pool);
        let ada = seed_user(&db, "ada").await;
        let bola = seed_user(&db, "bola").await;
        let conversation = db.create_conversation(&[ada.id, bola.id]).await.unwrap();
        let message = send(&db, conversation.id, bola.id, Some("hello"), None).await;

        db.soft_delete_message(message.id, ada.id).await.unwrap();
        db.soft_delete_message(message.id, ada.id).await.unwrap();

        assert!(db.get_messages(conversation.id, ada.id, 50, 0).await.unwrap().is_empty());
        let for_bola = db.get_messages(conversation.id, bola.id, 50, 0).await.unwrap();
        assert_eq!(for_bola.len(), 1);
        assert_eq!(for_bola[0].id, message.id);

        let stored = db.get_message(message.id).await.unwrap().unwrap();
        assert_eq!(stored.deleted_by, vec![ada.id]);
    }

    #[sqlx::test]
    async fn test_hard_delete_removes_for_everyone_and_rolls_back_preview(pool: PgPool) {
        let db = DBClient::new(pool);
        let ada = seed_user(&db, "ada").await;
        let bola = seed_user(&db, "bola").await;
        let conversation = db.create_conversation(&[ada.id, bola.id]).await.unwrap();

        let first = send(&db, conversation.id, bola.id, Some("first draft"), None).await;
        let second = send(
            &db,
            conversation.id,
            ada.id,
            None,
            Some("https://cdn.gighub.test/photo.png"),
        )
        .await;

        let before = db.get_conversation(conversation.id).await.unwrap().unwrap();
        assert_eq!(before.last_message_text.as_deref(), Some("Photo"));
        assert_eq!(before.last_message_media_type, Some(MediaType::Image));

        db.hard_delete_message(&second).await.unwrap();

        for viewer in [ada.id, bola.id] {
            let visible = db.get_messages(conversation.id, viewer, 50, 0).await.unwrap();
            assert_eq!(visible.len(), 1);
            assert_eq!(visible[0].id, first.id);
        }
        assert!(db.get_message(second.id).await.unwrap().is_none());

        let after = db.get_conversation(conversation.id).await.unwrap().unwrap();
        assert_eq!(after.last_message_text.as_deref(), Some("first draft"));
        assert_eq!(after.last_message_media_type, Some(MediaType::Text));
        assert_eq!(after.last_message_at, Some(first.created_at));

        db.hard_delete_message(&first).await.unwrap();

        let emptied = db.get_conversation(conversation.id).await.unwrap().unwrap();
        assert!(emptied.last_message_text.is_none());
        assert!(emptied.last_message_media_type.is_none());
        assert!(emptied.last_message_at.is_none());
    }
}
