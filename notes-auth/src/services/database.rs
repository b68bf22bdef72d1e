//! User storage. The issuer only needs lookup by username; listing and
//! insertion back the protected users endpoint and seeding.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    error::{ErrorKind, WriteFailure},
    options::IndexOptions,
    Client as MongoClient, Collection, Database, IndexModel,
};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::models::{Role, User};
use crate::services::ServiceError;
use crate::utils::{hash_password, Password};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ServiceError>;
    async fn list(&self) -> Result<Vec<User>, ServiceError>;
    async fn insert(&self, user: &User) -> Result<(), ServiceError>;
    async fn health_check(&self) -> Result<(), ServiceError>;
}

#[derive(Clone)]
pub struct MongoUserRepository {
    db: Database,
}

impl MongoUserRepository {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, ServiceError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            ServiceError::Database(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Connected to MongoDB");
        Ok(Self { db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), ServiceError> {
        let username_index = IndexModel::builder()
            .keys(doc! { "username": 1 })
            .options(
                IndexOptions::builder()
                    .name("username_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        self.users()
            .create_index(username_index, None)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create username index on users collection: {}", e);
                ServiceError::Database(e)
            })?;
        tracing::info!("Created unique index on users.username");
        Ok(())
    }

    fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == 11000
    )
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ServiceError> {
        Ok(self
            .users()
            .find_one(doc! { "username": username }, None)
            .await?)
    }

    async fn list(&self) -> Result<Vec<User>, ServiceError> {
        let cursor = self.users().find(None, None).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert(&self, user: &User) -> Result<(), ServiceError> {
        match self.users().insert_one(user, None).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(ServiceError::DuplicateUsername),
            Err(e) => Err(ServiceError::Database(e)),
        }
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        self.db.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }
}

/// Process-local repository for tests and database-less local runs.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an active user, hashing `password`.
    pub fn with_user(self, username: &str, password: &str, roles: Vec<Role>) -> Result<Self, anyhow::Error> {
        let hash = hash_password(&Password::new(password.to_string()))?;
        let user = User::new(username.to_string(), hash.into_string(), roles);
        self.put(user)?;
        Ok(self)
    }

    /// Insert or replace a user, keyed by username.
    pub fn put(&self, user: User) -> Result<(), anyhow::Error> {
        self.users
            .write()
            .map_err(|e| anyhow::anyhow!("User store lock poisoned: {}", e))?
            .insert(user.username.clone(), user);
        Ok(())
    }

    pub fn remove(&self, username: &str) -> Result<Option<User>, anyhow::Error> {
        Ok(self
            .users
            .write()
            .map_err(|e| anyhow::anyhow!("User store lock poisoned: {}", e))?
            .remove(username))
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, ServiceError> {
        let users = self
            .users
            .read()
            .map_err(|e| anyhow::anyhow!("User store lock poisoned: {}", e))?;
        Ok(users.get(username).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, ServiceError> {
        let users = self
            .users
            .read()
            .map_err(|e| anyhow::anyhow!("User store lock poisoned: {}", e))?;
        let mut all: Vec<User> = users.values().cloned().collect();
        all.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(all)
    }

    async fn insert(&self, user: &User) -> Result<(), ServiceError> {
        let mut users = self
            .users
            .write()
            .map_err(|e| anyhow::anyhow!("User store lock poisoned: {}", e))?;
        if users.contains_key(&user.username) {
            return Err(ServiceError::DuplicateUsername);
        }
        users.insert(user.username.clone(), user.clone());
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_rejects_duplicate_username() {
        let repo = InMemoryUserRepository::new();
        let user = User::new("alice".to_string(), "hash".to_string(), vec![]);

        repo.insert(&user).await.unwrap();
        let err = repo.insert(&user).await.unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateUsername));
    }

    #[tokio::test]
    async fn in_memory_lists_sorted_by_username() {
        let repo = InMemoryUserRepository::new();
        repo.put(User::new("zed".to_string(), "h".to_string(), vec![])).unwrap();
        repo.put(User::new("amy".to_string(), "h".to_string(), vec![])).unwrap();

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|u| u.username).collect();
        assert_eq!(names, vec!["amy", "zed"]);
    }

    #[tokio::test]
    async fn seeded_user_is_found() {
        let repo = InMemoryUserRepository::new()
            .with_user("alice", "correct", vec![Role::Admin])
            .unwrap();

        let user = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(user.roles, vec![Role::Admin]);
        assert!(repo.find_by_username("bob").await.unwrap().is_none());
    }
}
