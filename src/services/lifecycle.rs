//! Server lifecycle operations: create, get, list, rename, delete.

use super::{ServerService, record_outcome};
use crate::error::{EngineResult, Error};
use crate::id::{ServerId, UserId};
use crate::model::{Membership, Role, Server, normalize_server_name};
use tracing::{info, warn};

impl ServerService {
    /// Create a server owned by the caller.
    ///
    /// Two writes: the server record, then the caller's `owner` membership.
    /// They are not atomic across arbitrary backends; if the second write
    /// fails the operation surfaces [`Error::Inconsistent`] and is never
    /// retried automatically, since re-running the first write would
    /// duplicate the server.
    pub async fn create_server(&self, caller: &UserId, raw_name: &str) -> EngineResult<Server> {
        let result: EngineResult<Server> = async {
            let name = normalize_server_name(raw_name)?;
            self.require_user(caller).await?;

            let now = chrono::Utc::now().timestamp();
            let server = Server {
                id: ServerId::generate(),
                name,
                owner_id: caller.clone(),
                created_at: now,
            };
            self.store.create_server(&server).await?;

            let owner_membership = Membership {
                user_id: caller.clone(),
                server_id: server.id.clone(),
                role: Role::Owner,
                joined_at: now,
            };
            if let Err(e) = self.store.create_membership(&owner_membership).await {
                warn!(server = %server.id, owner = %caller, error = %e,
                      "owner membership write failed after server write");
                return Err(Error::Inconsistent(format!(
                    "server {} was created without an owner membership: {e}",
                    server.id
                )));
            }

            info!(server = %server.id, name = %server.name, owner = %caller, "server created");
            Ok(server)
        }
        .await;
        record_outcome("create_server", &result);
        result
    }

    /// Fetch a server the caller is a member of.
    pub async fn get_server(&self, caller: &UserId, server_id: &ServerId) -> EngineResult<Server> {
        let result: EngineResult<Server> = async {
            let server = self.require_server(server_id).await?;
            self.require_membership(caller, server_id).await?;
            Ok(server)
        }
        .await;
        record_outcome("get_server", &result);
        result
    }

    /// All servers the caller is a member of, in creation order.
    ///
    /// An empty result is valid, not an error.
    pub async fn list_servers(&self, caller: &UserId) -> EngineResult<Vec<Server>> {
        let result: EngineResult<Vec<Server>> = async {
            if caller.as_str().is_empty() {
                return Err(Error::InvalidInput("user id is required".into()));
            }
            Ok(self.store.servers_by_user(caller).await?)
        }
        .await;
        record_outcome("list_servers", &result);
        result
    }

    /// Rename a server. Owner or admin only; the name is validated exactly
    /// as at creation.
    pub async fn update_server_name(
        &self,
        caller: &UserId,
        server_id: &ServerId,
        raw_name: &str,
    ) -> EngineResult<Server> {
        let result: EngineResult<Server> = async {
            let name = normalize_server_name(raw_name)?;
            let mut server = self.require_server(server_id).await?;
            let membership = self.require_membership(caller, server_id).await?;
            if !matches!(membership.role, Role::Owner | Role::Admin) {
                return Err(Error::Forbidden(
                    "only the owner or an admin may rename the server".into(),
                ));
            }

            self.store.update_server_name(server_id, &name).await?;
            info!(server = %server_id, name = %name, by = %caller, "server renamed");
            server.name = name;
            Ok(server)
        }
        .await;
        record_outcome("update_server_name", &result);
        result
    }

    /// Delete a server and all its memberships. Owner only.
    pub async fn delete_server(&self, caller: &UserId, server_id: &ServerId) -> EngineResult<()> {
        let result: EngineResult<()> = async {
            let membership = self.require_membership(caller, server_id).await?;
            if membership.role != Role::Owner {
                return Err(Error::Forbidden(
                    "only the owner may delete the server".into(),
                ));
            }

            self.store.delete_server(server_id).await?;
            info!(server = %server_id, by = %caller, "server deleted");
            Ok(())
        }
        .await;
        record_outcome("delete_server", &result);
        result
    }
}
