//! Server lifecycle and membership management.
//!
//! One service struct, its operations split across files:
//! - [`lifecycle`]: create / get / list / rename / delete server
//! - [`membership`]: add member, remove member, change role, list members
//!
//! Every operation receives the authenticated caller id from the identity
//! collaborator and trusts it. Operations re-derive caller and target
//! roles from the store on each call and apply the role policy before
//! mutating anything.

mod lifecycle;
mod membership;

use crate::error::{EngineResult, Error};
use crate::id::{ServerId, UserId};
use crate::metrics;
use crate::model::{Membership, Server, User};
use crate::store::Store;
use std::sync::Arc;

/// The membership engine: server lifecycle plus membership management.
pub struct ServerService {
    store: Arc<dyn Store>,
}

impl ServerService {
    /// Create a service over the given storage backend.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Fetch a server or fail `NotFound`.
    async fn require_server(&self, server_id: &ServerId) -> EngineResult<Server> {
        self.store
            .server_by_id(server_id)
            .await
            .map_err(Error::Store)?
            .ok_or_else(|| Error::NotFound(format!("server {server_id}")))
    }

    /// Fetch a directory user or fail `NotFound`.
    async fn require_user(&self, user_id: &UserId) -> EngineResult<User> {
        self.store
            .user_by_id(user_id)
            .await
            .map_err(Error::Store)?
            .ok_or_else(|| Error::NotFound(format!("user {user_id}")))
    }

    /// Fetch the caller's membership or fail `Forbidden`.
    ///
    /// Membership existence is the sole test of "is this user part of this
    /// server", so an absent server and a non-member caller look the same
    /// from here: the caller has no standing.
    async fn require_membership(
        &self,
        caller: &UserId,
        server_id: &ServerId,
    ) -> EngineResult<Membership> {
        self.store
            .membership(caller, server_id)
            .await
            .map_err(Error::Store)?
            .ok_or_else(|| {
                Error::Forbidden(format!("user {caller} is not a member of server {server_id}"))
            })
    }
}

/// Record the operation and, on failure, its error code.
fn record_outcome<T>(operation: &'static str, result: &EngineResult<T>) {
    metrics::record_operation(operation);
    if let Err(e) = result {
        metrics::record_operation_error(operation, e.error_code());
    }
}
