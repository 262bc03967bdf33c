use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "role_enum_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,               // stored lowercase
    pub password: String,            // Argon2 PHC string
    pub verified: bool,
    pub verification_code: Option<String>,    // sha256 hex
    pub password_reset_token: Option<String>, // sha256 hex
    pub password_reset_at: Option<OffsetDateTime>,
    pub role: Role,
    pub notification: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Insert payload; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub verification_code: Option<String>,
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub notification: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            role: u.role,
            notification: u.notification,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// What the navigation bar needs to know about the current user.
#[derive(Debug, Clone, Serialize)]
pub struct UserInformations {
    pub role: Role,
    pub username: String,
}

impl From<&User> for UserInformations {
    fn from(u: &User) -> Self {
        Self {
            role: u.role,
            username: u.username.clone(),
        }
    }
}
