use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::{
    repo::{RepoError, UserStore},
    repo_types::{NewUser, Role, User},
};

/// `UserStore` kept in a map, with the same uniqueness and single-use rules
/// as the Postgres schema.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn delete(&self, id: Uuid) {
        self.users.lock().unwrap().remove(&id);
    }

    pub fn get(&self, id: Uuid) -> Option<User> {
        self.users.lock().unwrap().get(&id).cloned()
    }

    pub fn update(&self, id: Uuid, f: impl FnOnce(&mut User)) {
        if let Some(u) = self.users.lock().unwrap().get_mut(&id) {
            f(u);
        }
    }

    fn modify<F>(&self, pred: impl Fn(&User) -> bool, f: F) -> Option<User>
    where
        F: FnOnce(&mut User),
    {
        let mut users = self.users.lock().unwrap();
        let user = users.values_mut().find(|u| pred(u))?;
        f(user);
        user.updated_at = OffsetDateTime::now_utc();
        Some(user.clone())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, new: NewUser) -> Result<User, RepoError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == new.email) {
            return Err(RepoError::EmailTaken);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            password: new.password_hash,
            verified: false,
            verification_code: new.verification_code,
            password_reset_token: None,
            password_reset_at: None,
            role: Role::User,
            notification: false,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.get(id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn set_verification_code(&self, id: Uuid, code: Option<&str>) -> Result<(), RepoError> {
        self.modify(|u| u.id == id, |u| u.verification_code = code.map(str::to_string));
        Ok(())
    }

    async fn verify_by_code(&self, code: &str) -> Result<Option<User>, RepoError> {
        Ok(self.modify(
            |u| u.verification_code.as_deref() == Some(code),
            |u| {
                u.verified = true;
                u.verification_code = None;
            },
        ))
    }

    async fn set_password_reset(
        &self,
        id: Uuid,
        token: Option<&str>,
        expires_at: Option<OffsetDateTime>,
    ) -> Result<(), RepoError> {
        self.modify(
            |u| u.id == id,
            |u| {
                u.password_reset_token = token.map(str::to_string);
                u.password_reset_at = expires_at;
            },
        );
        Ok(())
    }

    async fn reset_password_by_token(
        &self,
        token: &str,
        password_hash: &str,
        now: OffsetDateTime,
    ) -> Result<Option<User>, RepoError> {
        Ok(self.modify(
            |u| {
                u.password_reset_token.as_deref() == Some(token)
                    && u.password_reset_at.is_some_and(|at| at > now)
            },
            |u| {
                u.password = password_hash.to_string();
                u.password_reset_token = None;
                u.password_reset_at = None;
            },
        ))
    }

    async fn update_username(&self, id: Uuid, username: &str) -> Result<Option<User>, RepoError> {
        Ok(self.modify(|u| u.id == id, |u| u.username = username.to_string()))
    }
}
