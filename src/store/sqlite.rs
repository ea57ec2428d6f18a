//! SQLite-backed storage using SQLx.
//!
//! The schema (see `migrations/`) carries the invariants the engine relies
//! on: the composite primary key on memberships makes duplicate rows a
//! unique-constraint violation, foreign keys cascade membership rows when
//! a server is deleted, and a partial unique index admits exactly one
//! `owner` row per server.

use super::{MembershipStore, StoreError, UserDirectory};
use crate::id::{ServerId, UserId};
use crate::model::{Membership, Role, Server, User};
use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::info;

static MEMDB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// SQLite store with a connection pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connection acquire timeout - prevents connection storms from blocking indefinitely.
    const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Maximum time a connection can remain idle before being closed.
    const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Open (or create) the database at `path` and run migrations.
    ///
    /// `":memory:"` opens a private in-memory database. Foreign keys are
    /// enabled through the connect options so every pooled connection gets
    /// them; cascade deletes depend on it.
    pub async fn connect(path: &str) -> Result<Self, StoreError> {
        let pool = if path == ":memory:" {
            // Use a uniquely named shared-cache memory database per call.
            // `file::memory:` is global-ish and will collide across parallel tests.
            let id = MEMDB_COUNTER.fetch_add(1, Ordering::Relaxed);
            let memdb_uri = format!(
                "file:roster-memdb-{}-{}?mode=memory&cache=shared",
                std::process::id(),
                id
            );

            let options = SqliteConnectOptions::new()
                .filename(&memdb_uri)
                .shared_cache(true)
                .create_if_missing(true)
                .foreign_keys(true);

            SqlitePoolOptions::new()
                .max_connections(1)
                .acquire_timeout(Self::ACQUIRE_TIMEOUT)
                .idle_timeout(Some(Self::IDLE_TIMEOUT))
                .test_before_acquire(true)
                .connect_with(options)
                .await?
        } else {
            if let Some(parent) = Path::new(path).parent()
                && !parent.as_os_str().is_empty()
                && let Err(e) = std::fs::create_dir_all(parent)
            {
                tracing::warn!(path = %parent.display(), error = %e, "Failed to create database directory");
            }

            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .foreign_keys(true)
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal);

            SqlitePoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Self::ACQUIRE_TIMEOUT)
                .idle_timeout(Some(Self::IDLE_TIMEOUT))
                .test_before_acquire(true)
                .connect_with(options)
                .await?
        };

        sqlx::migrate!("./migrations").run(&pool).await?;

        info!(path = %path, "membership store connected");
        Ok(Self { pool })
    }
}

fn decode_role(raw: &str) -> Result<Role, StoreError> {
    // The CHECK constraint keeps unknown names out; reaching this error
    // means the database was edited out of band.
    raw.parse::<Role>()
        .map_err(|e| StoreError::Internal(e.to_string()))
}

fn decode_membership(row: (String, String, String, i64)) -> Result<Membership, StoreError> {
    let (user_id, server_id, role, joined_at) = row;
    Ok(Membership {
        user_id: UserId::from(user_id),
        server_id: ServerId::from(server_id),
        role: decode_role(&role)?,
        joined_at,
    })
}

fn decode_server(row: (String, String, String, i64)) -> Server {
    let (id, name, owner_id, created_at) = row;
    Server {
        id: ServerId::from(id),
        name,
        owner_id: UserId::from(owner_id),
        created_at,
    }
}

#[async_trait]
impl MembershipStore for SqliteStore {
    async fn create_server(&self, server: &Server) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO servers (id, name, owner_id, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(server.id.as_str())
        .bind(&server.name)
        .bind(server.owner_id.as_str())
        .bind(server.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return StoreError::Conflict(format!("server {}", server.id));
                }
                if db_err.is_foreign_key_violation() {
                    return StoreError::NotFound(format!("user {}", server.owner_id));
                }
            }
            StoreError::from(e)
        })?;
        Ok(())
    }

    async fn server_by_id(&self, id: &ServerId) -> Result<Option<Server>, StoreError> {
        let row = sqlx::query_as::<_, (String, String, String, i64)>(
            r#"
            SELECT id, name, owner_id, created_at
            FROM servers
            WHERE id = ?
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(decode_server))
    }

    async fn servers_by_user(&self, user_id: &UserId) -> Result<Vec<Server>, StoreError> {
        let rows = sqlx::query_as::<_, (String, String, String, i64)>(
            r#"
            SELECT s.id, s.name, s.owner_id, s.created_at
            FROM servers s
            JOIN memberships m ON m.server_id = s.id
            WHERE m.user_id = ?
            ORDER BY s.id
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(decode_server).collect())
    }

    async fn update_server_name(&self, id: &ServerId, name: &str) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE servers SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("server {id}")));
        }
        Ok(())
    }

    async fn delete_server(&self, id: &ServerId) -> Result<(), StoreError> {
        // Memberships go with it via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM servers WHERE id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("server {id}")));
        }
        Ok(())
    }

    async fn create_membership(&self, membership: &Membership) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO memberships (user_id, server_id, role, joined_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(membership.user_id.as_str())
        .bind(membership.server_id.as_str())
        .bind(membership.role.as_str())
        .bind(membership.joined_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return StoreError::Conflict(format!(
                        "membership of {} in {}",
                        membership.user_id, membership.server_id
                    ));
                }
                if db_err.is_foreign_key_violation() {
                    return StoreError::NotFound(format!(
                        "user {} or server {}",
                        membership.user_id, membership.server_id
                    ));
                }
            }
            StoreError::from(e)
        })?;
        Ok(())
    }

    async fn membership(
        &self,
        user_id: &UserId,
        server_id: &ServerId,
    ) -> Result<Option<Membership>, StoreError> {
        let row = sqlx::query_as::<_, (String, String, String, i64)>(
            r#"
            SELECT user_id, server_id, role, joined_at
            FROM memberships
            WHERE user_id = ? AND server_id = ?
            "#,
        )
        .bind(user_id.as_str())
        .bind(server_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(decode_membership).transpose()
    }

    async fn server_memberships(
        &self,
        server_id: &ServerId,
    ) -> Result<Vec<Membership>, StoreError> {
        let rows = sqlx::query_as::<_, (String, String, String, i64)>(
            r#"
            SELECT user_id, server_id, role, joined_at
            FROM memberships
            WHERE server_id = ?
            ORDER BY joined_at, user_id
            "#,
        )
        .bind(server_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(decode_membership).collect()
    }

    async fn add_membership(
        &self,
        user_id: &UserId,
        server_id: &ServerId,
        role: Role,
    ) -> Result<Membership, StoreError> {
        let membership = Membership {
            user_id: user_id.clone(),
            server_id: server_id.clone(),
            role,
            joined_at: chrono::Utc::now().timestamp(),
        };
        self.create_membership(&membership).await?;
        Ok(membership)
    }

    async fn remove_membership(
        &self,
        user_id: &UserId,
        server_id: &ServerId,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM memberships WHERE user_id = ? AND server_id = ?")
            .bind(user_id.as_str())
            .bind(server_id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!(
                "membership of {user_id} in {server_id}"
            )));
        }
        Ok(())
    }

    async fn update_membership_role(
        &self,
        user_id: &UserId,
        server_id: &ServerId,
        role: Role,
    ) -> Result<(), StoreError> {
        let result =
            sqlx::query("UPDATE memberships SET role = ? WHERE user_id = ? AND server_id = ?")
                .bind(role.as_str())
                .bind(user_id.as_str())
                .bind(server_id.as_str())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!(
                "membership of {user_id} in {server_id}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for SqliteStore {
    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(user.id.as_str())
        .bind(&user.username)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return StoreError::Conflict(format!("user {} ({})", user.id, user.username));
            }
            StoreError::from(e)
        })?;
        Ok(())
    }

    async fn user_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, (String, String, i64)>(
            r#"
            SELECT id, username, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, username, created_at)| User {
            id: UserId::from(id),
            username,
            created_at,
        }))
    }
}
