//! In-memory storage on concurrent maps.
//!
//! Honors the same contract as the SQLite backend: per-key uniqueness is
//! enforced through the map entry API, so two callers racing to create the
//! same membership see exactly one success. Doubles as the injected test
//! double for the engine.

use super::{MembershipStore, StoreError, UserDirectory};
use crate::id::{ServerId, UserId};
use crate::model::{Membership, Role, Server, User};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Process-local store; all data is lost on drop.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<UserId, User>,
    /// Lowercased username → id, the case-insensitive uniqueness arbiter.
    usernames: DashMap<String, UserId>,
    servers: DashMap<ServerId, Server>,
    memberships: DashMap<(UserId, ServerId), Membership>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MembershipStore for MemoryStore {
    async fn create_server(&self, server: &Server) -> Result<(), StoreError> {
        match self.servers.entry(server.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!("server {}", server.id))),
            Entry::Vacant(slot) => {
                slot.insert(server.clone());
                Ok(())
            }
        }
    }

    async fn server_by_id(&self, id: &ServerId) -> Result<Option<Server>, StoreError> {
        Ok(self.servers.get(id).map(|s| s.clone()))
    }

    async fn servers_by_user(&self, user_id: &UserId) -> Result<Vec<Server>, StoreError> {
        let mut servers: Vec<Server> = self
            .memberships
            .iter()
            .filter(|entry| &entry.key().0 == user_id)
            .filter_map(|entry| self.servers.get(&entry.key().1).map(|s| s.clone()))
            .collect();
        servers.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(servers)
    }

    async fn update_server_name(&self, id: &ServerId, name: &str) -> Result<(), StoreError> {
        match self.servers.get_mut(id) {
            Some(mut server) => {
                server.name = name.to_string();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("server {id}"))),
        }
    }

    async fn delete_server(&self, id: &ServerId) -> Result<(), StoreError> {
        if self.servers.remove(id).is_none() {
            return Err(StoreError::NotFound(format!("server {id}")));
        }
        // Cascade, as the SQLite schema does through foreign keys.
        self.memberships.retain(|(_, server_id), _| server_id != id);
        Ok(())
    }

    async fn create_membership(&self, membership: &Membership) -> Result<(), StoreError> {
        let key = (membership.user_id.clone(), membership.server_id.clone());
        match self.memberships.entry(key) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!(
                "membership of {} in {}",
                membership.user_id, membership.server_id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(membership.clone());
                Ok(())
            }
        }
    }

    async fn membership(
        &self,
        user_id: &UserId,
        server_id: &ServerId,
    ) -> Result<Option<Membership>, StoreError> {
        let key = (user_id.clone(), server_id.clone());
        Ok(self.memberships.get(&key).map(|m| m.clone()))
    }

    async fn server_memberships(
        &self,
        server_id: &ServerId,
    ) -> Result<Vec<Membership>, StoreError> {
        let mut rows: Vec<Membership> = self
            .memberships
            .iter()
            .filter(|entry| &entry.key().1 == server_id)
            .map(|entry| entry.value().clone())
            .collect();
        rows.sort_by(|a, b| {
            a.joined_at
                .cmp(&b.joined_at)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        Ok(rows)
    }

    async fn add_membership(
        &self,
        user_id: &UserId,
        server_id: &ServerId,
        role: Role,
    ) -> Result<Membership, StoreError> {
        if !self.users.contains_key(user_id) {
            return Err(StoreError::NotFound(format!("user {user_id}")));
        }
        if !self.servers.contains_key(server_id) {
            return Err(StoreError::NotFound(format!("server {server_id}")));
        }

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
        let key = (user_id.clone(), server_id.clone());
        if self.memberships.remove(&key).is_none() {
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
        let key = (user_id.clone(), server_id.clone());
        match self.memberships.get_mut(&key) {
            Some(mut membership) => {
                membership.role = role;
                Ok(())
            }
            None => Err(StoreError::NotFound(format!(
                "membership of {user_id} in {server_id}"
            ))),
        }
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        let handle = user.username.to_lowercase();
        match self.usernames.entry(handle.clone()) {
            Entry::Occupied(_) => {
                return Err(StoreError::Conflict(format!(
                    "username {} is taken",
                    user.username
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert(user.id.clone());
            }
        }
        match self.users.entry(user.id.clone()) {
            Entry::Occupied(_) => {
                // Roll back the handle reservation made above.
                self.usernames.remove(&handle);
                Err(StoreError::Conflict(format!("user {}", user.id)))
            }
            Entry::Vacant(slot) => {
                slot.insert(user.clone());
                Ok(())
            }
        }
    }

    async fn user_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(id).map(|u| u.clone()))
    }
}
