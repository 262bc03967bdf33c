use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::instrument;
use uuid::Uuid;

use crate::users::repo_types::{NewUser, User};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("email already registered")]
    EmailTaken,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Data access for the `users` table.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<User, RepoError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
    async fn set_verification_code(&self, id: Uuid, code: Option<&str>) -> Result<(), RepoError>;
    /// Marks the owner of `code` verified and clears the code in one step.
    async fn verify_by_code(&self, code: &str) -> Result<Option<User>, RepoError>;
    async fn set_password_reset(
        &self,
        id: Uuid,
        token: Option<&str>,
        expires_at: Option<OffsetDateTime>,
    ) -> Result<(), RepoError>;
    /// Replaces the password of the owner of a reset token that is still
    /// valid at `now`, clearing the token in the same statement.
    async fn reset_password_by_token(
        &self,
        token: &str,
        password_hash: &str,
        now: OffsetDateTime,
    ) -> Result<Option<User>, RepoError>;
    async fn update_username(&self, id: Uuid, username: &str) -> Result<Option<User>, RepoError>;
}

const USER_COLUMNS: &str = "id, username, email, password, verified, verification_code, \
     password_reset_token, password_reset_at, role, notification, created_at, updated_at";

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn create(&self, user: NewUser) -> Result<User, RepoError> {
        let sql = format!(
            "INSERT INTO users (username, email, password, verification_code)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.verification_code)
            .fetch_one(&self.db)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => RepoError::EmailTaken,
                other => RepoError::Database(other),
            })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn set_verification_code(&self, id: Uuid, code: Option<&str>) -> Result<(), RepoError> {
        sqlx::query("UPDATE users SET verification_code = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(code)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn verify_by_code(&self, code: &str) -> Result<Option<User>, RepoError> {
        let sql = format!(
            "UPDATE users
                SET verified = TRUE, verification_code = NULL, updated_at = now()
              WHERE verification_code = $1
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(code)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn set_password_reset(
        &self,
        id: Uuid,
        token: Option<&str>,
        expires_at: Option<OffsetDateTime>,
    ) -> Result<(), RepoError> {
        sqlx::query(
            "UPDATE users
                SET password_reset_token = $2, password_reset_at = $3, updated_at = now()
              WHERE id = $1",
        )
        .bind(id)
        .bind(token)
        .bind(expires_at)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn reset_password_by_token(
        &self,
        token: &str,
        password_hash: &str,
        now: OffsetDateTime,
    ) -> Result<Option<User>, RepoError> {
        let sql = format!(
            "UPDATE users
                SET password = $2,
                    password_reset_token = NULL,
                    password_reset_at = NULL,
                    updated_at = now()
              WHERE password_reset_token = $1 AND password_reset_at > $3
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(token)
            .bind(password_hash)
            .bind(now)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn update_username(&self, id: Uuid, username: &str) -> Result<Option<User>, RepoError> {
        let sql = format!(
            "UPDATE users SET username = $2, updated_at = now() WHERE id = $1
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(username)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }
}
