//! Credential store port and an in-memory adapter.
//!
//! The auth service only talks to user records through `UserStore`, so the
//! backing store (MongoDB in production, memory in tests and local runs) can be
//! swapped without touching the service.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use ulid::Ulid;

use super::models::{NewUser, UserRecord, UserUpdate};
use crate::{errors::AppError, shared::validation::normalize_email};

pub const EMAIL_IN_USE: &str = "Email already in use";

/// Conflict on the unique email constraint, reported as a field validation error.
#[must_use]
pub fn email_in_use() -> AppError {
    AppError::field(EMAIL_IN_USE, "email", EMAIL_IN_USE)
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Lookup by email (normalized). Absent users are `Ok(None)`.
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError>;

    /// Lookup by id. Malformed ids are treated as absent.
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, AppError>;

    /// Insert a new user; fails with `email_in_use()` when the email is taken.
    async fn create(&self, user: NewUser) -> Result<UserRecord, AppError>;

    /// Merge the set fields of `update` into the stored record.
    async fn update(&self, id: &str, update: UserUpdate) -> Result<UserRecord, AppError>;

    /// Remove a user; unknown ids are `NotFound("User")`.
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        let email = normalize_email(email);
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, AppError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord, AppError> {
        let email = normalize_email(&user.email);
        // Check and insert under one write lock so concurrent creates cannot both pass.
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email == email) {
            return Err(email_in_use());
        }

        let now = Utc::now();
        let record = UserRecord {
            id: Ulid::new().to_string(),
            email,
            password_hash: user.password_hash,
            name: user.name.trim().to_string(),
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        users.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn update(&self, id: &str, update: UserUpdate) -> Result<UserRecord, AppError> {
        let mut users = self.users.write().await;
        let email = update.email.as_deref().map(normalize_email);
        if let Some(email) = &email {
            if users
                .values()
                .any(|existing| existing.id != id && &existing.email == email)
            {
                return Err(email_in_use());
            }
        }

        let record = users.get_mut(id).ok_or_else(|| AppError::not_found("User"))?;
        if let Some(email) = email {
            record.email = email;
        }
        if let Some(name) = update.name {
            record.name = name.trim().to_string();
        }
        if let Some(hash) = update.password_hash {
            record.password_hash = hash;
        }
        if let Some(role) = update.role {
            record.role = role;
        }
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.users
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::not_found("User"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::auth::models::Role;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            name: " Grace Hopper ".to_string(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn create_normalizes_and_finds() {
        let store = InMemoryUserStore::new();
        let created = store.create(new_user(" Grace@Example.com ")).await.unwrap();
        assert_eq!(created.email, "grace@example.com");
        assert_eq!(created.name, "Grace Hopper");

        let by_email = store.find_by_email("GRACE@example.com").await.unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(created.id.clone()));
        let by_id = store.find_by_id(&created.id).await.unwrap();
        assert_eq!(by_id.map(|u| u.email), Some(created.email));
    }

    #[tokio::test]
    async fn absent_lookups_return_none() {
        let store = InMemoryUserStore::new();
        assert!(store.find_by_email("nobody@example.com").await.unwrap().is_none());
        assert!(store.find_by_id("not-an-id").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email() {
        let store = InMemoryUserStore::new();
        store.create(new_user("dup@example.com")).await.unwrap();
        let err = store.create(new_user("DUP@example.com")).await.unwrap_err();
        assert!(err.field_errors().is_some_and(|e| e.contains_key("email")));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn update_merges_fields() {
        let store = InMemoryUserStore::new();
        let created = store.create(new_user("a@example.com")).await.unwrap();
        let updated = store
            .update(
                &created.id,
                UserUpdate {
                    name: Some("Grace B. Hopper".to_string()),
                    role: Some(Role::Guide),
                    ..UserUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Grace B. Hopper");
        assert_eq!(updated.role, Role::Guide);
        assert_eq!(updated.email, "a@example.com");
        assert_eq!(updated.password_hash, "hash");
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn update_rejects_taken_email_and_unknown_id() {
        let store = InMemoryUserStore::new();
        let first = store.create(new_user("first@example.com")).await.unwrap();
        store.create(new_user("second@example.com")).await.unwrap();

        let taken = UserUpdate {
            email: Some("second@example.com".to_string()),
            ..UserUpdate::default()
        };
        assert!(store.update(&first.id, taken.clone()).await.is_err());
        let unchanged = store.find_by_id(&first.id).await.unwrap().unwrap();
        assert_eq!(unchanged.email, "first@example.com");

        let err = store.update("missing", taken).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_removes_once() {
        let store = InMemoryUserStore::new();
        let user = store.create(new_user("gone@example.com")).await.unwrap();
        store.delete(&user.id).await.unwrap();
        assert!(store.is_empty().await);
        assert!(matches!(
            store.delete(&user.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_to_own_email_is_allowed() {
        let store = InMemoryUserStore::new();
        let user = store.create(new_user("me@example.com")).await.unwrap();
        let same = UserUpdate {
            email: Some("ME@example.com".to_string()),
            ..UserUpdate::default()
        };
        assert!(store.update(&user.id, same).await.is_ok());
    }
}
