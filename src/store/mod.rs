//! Storage abstraction for memberships, servers, and the user directory.
//!
//! The engine depends only on the traits here; production code injects the
//! SQLite backend while tests inject the memory backend with the same
//! contract. Both backends enforce the one-row-per-(user, server)
//! uniqueness invariant on their own write path, so concurrent callers
//! racing on the same pair cannot produce a duplicate.

use crate::config::{StorageBackend, StorageConfig};
use crate::id::{ServerId, UserId};
use crate::model::{Membership, Role, Server, User};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Storage backend errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed row does not exist (zero rows affected or fetched).
    #[error("not found: {0}")]
    NotFound(String),
    /// The row to create already exists.
    #[error("already exists: {0}")]
    Conflict(String),
    /// Underlying database failure.
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    /// Schema migration failure.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    /// Corrupted or otherwise uninterpretable stored data.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Durable mapping of servers and (user, server) → role rows.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Persist a new server record. Duplicate id → conflict.
    async fn create_server(&self, server: &Server) -> Result<(), StoreError>;

    /// Fetch a server by id.
    async fn server_by_id(&self, id: &ServerId) -> Result<Option<Server>, StoreError>;

    /// All servers where the user holds a membership, in id (creation)
    /// order.
    async fn servers_by_user(&self, user_id: &UserId) -> Result<Vec<Server>, StoreError>;

    /// Update a server's display name. Not found if no rows affected.
    async fn update_server_name(&self, id: &ServerId, name: &str) -> Result<(), StoreError>;

    /// Delete a server and cascade all its membership rows. Not found if
    /// no rows affected.
    async fn delete_server(&self, id: &ServerId) -> Result<(), StoreError>;

    /// Persist a membership row exactly as given (used by server creation
    /// for the owner row). Duplicate (user, server) → conflict.
    async fn create_membership(&self, membership: &Membership) -> Result<(), StoreError>;

    /// Fetch one membership row.
    async fn membership(
        &self,
        user_id: &UserId,
        server_id: &ServerId,
    ) -> Result<Option<Membership>, StoreError>;

    /// All membership rows of a server, in join order (then user id).
    async fn server_memberships(
        &self,
        server_id: &ServerId,
    ) -> Result<Vec<Membership>, StoreError>;

    /// Insert a membership with a fresh join timestamp. Fails not-found if
    /// the user or server is missing, conflict if the row already exists.
    async fn add_membership(
        &self,
        user_id: &UserId,
        server_id: &ServerId,
        role: Role,
    ) -> Result<Membership, StoreError>;

    /// Delete one membership row. Not found if no rows affected.
    async fn remove_membership(
        &self,
        user_id: &UserId,
        server_id: &ServerId,
    ) -> Result<(), StoreError>;

    /// Overwrite the role of one membership row, leaving the join
    /// timestamp untouched. Not found if no rows affected.
    async fn update_membership_role(
        &self,
        user_id: &UserId,
        server_id: &ServerId,
        role: Role,
    ) -> Result<(), StoreError>;
}

/// Directory of known users.
///
/// Credentials live with the identity collaborator; the engine only ever
/// checks existence before mutating memberships.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Provision a user. Duplicate id or username (case-insensitive) →
    /// conflict.
    async fn create_user(&self, user: &User) -> Result<(), StoreError>;

    /// Fetch a user by id.
    async fn user_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError>;
}

/// Combined storage surface: membership rows plus the user directory.
pub trait Store: MembershipStore + UserDirectory {}

impl<T: MembershipStore + UserDirectory> Store for T {}

/// Build the storage backend selected by configuration.
pub async fn connect(config: &StorageConfig) -> Result<Arc<dyn Store>, StoreError> {
    match config.backend {
        StorageBackend::Sqlite => Ok(Arc::new(SqliteStore::connect(&config.path).await?)),
        StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}
