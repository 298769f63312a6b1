// db/userdb.rs
use async_trait::async_trait;
use sqlx::types::Json;
use uuid::Uuid;

use super::db::DBClient;

use crate::models::{
    registrationmodel::NewUser,
    usermodel::{User, USER_COLUMNS},
};

/// Postgres' default names for the UNIQUE constraints on `users`.
pub const USERNAME_CONSTRAINT: &str = "users_username_key";
pub const EMAIL_CONSTRAINT: &str = "users_email_key";

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub description: Option<String>,
    pub img: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
}

#[async_trait]
pub trait UserExt {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error>;

    async fn get_users(&self, page: u32, limit: usize) -> Result<Vec<User>, sqlx::Error>;

    async fn get_users_by_ids(&self, user_ids: &[Uuid]) -> Result<Vec<User>, sqlx::Error>;

    /// Persists a user whose email has been verified.
    async fn save_user(&self, new_user: NewUser) -> Result<User, sqlx::Error>;

    async fn get_user_count(&self) -> Result<i64, sqlx::Error>;

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<User, sqlx::Error>;

    async fn delete_user(&self, user_id: Uuid) -> Result<u64, sqlx::Error>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut user: Option<User> = None;

        if let Some(user_id) = user_id {
            let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
            user = sqlx::query_as::<_, User>(&sql)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        } else if let Some(username) = username {
            let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
            user = sqlx::query_as::<_, User>(&sql)
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        } else if let Some(email) = email {
            let sql = format!("SELECT {} FROM users WHERE LOWER(email) = LOWER($1)", USER_COLUMNS);
            user = sqlx::query_as::<_, User>(&sql)
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        }

        Ok(user)
    }

    async fn get_users(&self, page: u32, limit: usize) -> Result<Vec<User>, sqlx::Error> {
        let offset = (page.max(1) - 1) as i64 * limit as i64;
        let sql = format!(
            "SELECT {} FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(limit as i64)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
    }

    async fn get_users_by_ids(&self, user_ids: &[Uuid]) -> Result<Vec<User>, sqlx::Error> {
        let sql = format!("SELECT {} FROM users WHERE id = ANY($1)", USER_COLUMNS);
        sqlx::query_as::<_, User>(&sql)
            .bind(user_ids)
            .fetch_all(&self.pool)
            .await
    }

    async fn save_user(&self, new_user: NewUser) -> Result<User, sqlx::Error> {
        let sql = format!(
            r#"
            INSERT INTO users (
                username, email, password, is_seller, is_verified,
                role, tier, country, phone, organization, next_of_kin
            )
            VALUES ($1, $2, $3, $4, TRUE, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(new_user.username)
            .bind(new_user.email)
            .bind(new_user.hashed_password)
            .bind(new_user.is_seller)
            .bind(new_user.role)
            .bind(new_user.tier)
            .bind(new_user.country)
            .bind(new_user.phone)
            .bind(new_user.organization.map(Json))
            .bind(new_user.next_of_kin.map(Json))
            .fetch_one(&self.pool)
            .await
    }

    async fn get_user_count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
    }

    async fn update_user_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<User, sqlx::Error> {
        let sql = format!(
            r#"
            UPDATE users
            SET description = COALESCE($2, description),
                img = COALESCE($3, img),
                phone = COALESCE($4, phone),
                country = COALESCE($5, country),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .bind(update.description)
            .bind(update.img)
            .bind(update.phone)
            .bind(update.country)
            .fetch_one(&self.pool)
            .await
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use super::*;
    use crate::{
        db::fixtures::{new_user, seed_user},
        error::unique_violation_constraint,
    };

    #[sqlx::test]
    async fn test_duplicate_username_names_its_constraint(pool: PgPool) {
        let db = DBClient::new(pool);
        seed_user(&db, "ada").await;

        let mut rival = new_user("ada");
        rival.email = "someone.else@gighub.test".to_string();
        let err = db.save_user(rival).await.unwrap_err();

        assert_eq!(unique_violation_constraint(&err), Some(USERNAME_CONSTRAINT));
    }

    #[sqlx::test]
    async fn test_duplicate_email_names_its_constraint(pool: PgPool) {
        let db = DBClient::new(pool);
        seed_user(&db, "ada").await;

        let mut rival = new_user("ada_two");
        rival.email = "ada@gighub.test".to_string();
        let err = db.save_user(rival).await.unwrap_err();

        assert_eq!(unique_violation_constraint(&err), Some(EMAIL_CONSTRAINT));
    }

    #[sqlx::test]
    async fn test_saved_user_is_verified(pool: PgPool) {
        let db = DBClient::new(pool);
        let user = seed_user(&db, "ada").await;

        assert!(user.is_verified);
        assert_eq!(db.get_user_count().await.unwrap(), 1);
        let found = db.get_users_by_ids(&[user.id]).await.unwrap();
        assert_eq!(found[0].email, "ada@gighub.test");
    }
}
