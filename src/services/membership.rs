//! Membership operations: add, remove, change role, list.
//!
//! Every mutation follows the same shape: derive the caller's standing,
//! derive the target's, apply the role policy, and only then touch the
//! store. The `owner` role never moves through these paths; it is assigned
//! at server creation and leaves only with the server.

use super::{ServerService, record_outcome};
use crate::error::{EngineResult, Error};
use crate::id::{ServerId, UserId};
use crate::model::{Membership, Role};
use crate::policy;
use tracing::info;

impl ServerService {
    /// Add a user to a server with the requested role.
    ///
    /// Granting `admin` to a new member takes the owner; `moderator` and
    /// `member` may be granted by any member. Adding someone who already
    /// holds a membership is policy-checked against their current role and
    /// then rejected by the store's duplicate check, never silently
    /// duplicated.
    pub async fn add_member(
        &self,
        caller: &UserId,
        server_id: &ServerId,
        target: &UserId,
        role: Role,
    ) -> EngineResult<Membership> {
        let result: EngineResult<Membership> = async {
            let caller_membership = self.require_membership(caller, server_id).await?;
            self.require_user(target).await?;

            if target == caller {
                return Err(Error::InvalidInput("cannot add yourself".into()));
            }
            if !role.is_assignable() {
                return Err(Error::InvalidInput(
                    "the owner role is assigned at server creation only".into(),
                ));
            }

            match self.store.membership(target, server_id).await? {
                Some(existing) => {
                    // The policy governs whether the caller may affect a
                    // member already at that role; if it passes, the
                    // store's uniqueness check still makes this a conflict.
                    if !policy::can_act_on(caller_membership.role, existing.role, caller, target) {
                        return Err(Error::Forbidden(format!(
                            "{} may not act on {}",
                            caller_membership.role, existing.role
                        )));
                    }
                }
                None => {
                    if role == Role::Admin && caller_membership.role != Role::Owner {
                        return Err(Error::Forbidden(
                            "only the owner may grant the admin role".into(),
                        ));
                    }
                }
            }

            let membership = self.store.add_membership(target, server_id, role).await?;
            info!(server = %server_id, user = %target, role = %role, by = %caller, "member added");
            Ok(membership)
        }
        .await;
        record_outcome("add_member", &result);
        result
    }

    /// Remove a member from a server.
    ///
    /// The owner can never be removed, by anyone, including themself; a
    /// non-owner removing themself passes the policy's self shortcut, which
    /// is how members leave a server.
    pub async fn remove_member(
        &self,
        caller: &UserId,
        server_id: &ServerId,
        target: &UserId,
    ) -> EngineResult<()> {
        let result: EngineResult<()> = async {
            let caller_membership = self.require_membership(caller, server_id).await?;
            self.require_user(target).await?;

            let target_membership = self
                .store
                .membership(target, server_id)
                .await?
                .ok_or_else(|| {
                    Error::NotFound(format!(
                        "user {target} is not a member of server {server_id}"
                    ))
                })?;

            if target_membership.role == Role::Owner {
                return Err(Error::Forbidden("the owner cannot be removed".into()));
            }
            // Independent of owner immunity above: an owner does not leave
            // their own server through this path.
            if caller == target && caller_membership.role == Role::Owner {
                return Err(Error::Forbidden(
                    "the owner cannot remove themself".into(),
                ));
            }

            if !policy::can_act_on(
                caller_membership.role,
                target_membership.role,
                caller,
                target,
            ) {
                return Err(Error::Forbidden(format!(
                    "{} may not act on {}",
                    caller_membership.role, target_membership.role
                )));
            }

            self.store.remove_membership(target, server_id).await?;
            info!(server = %server_id, user = %target, by = %caller, "member removed");
            Ok(())
        }
        .await;
        record_outcome("remove_member", &result);
        result
    }

    /// Change a member's role.
    ///
    /// Never produces `owner`: ownership does not transfer through role
    /// changes, and the owner cannot change their own role. The join
    /// timestamp is untouched.
    pub async fn change_member_role(
        &self,
        caller: &UserId,
        server_id: &ServerId,
        target: &UserId,
        new_role: Role,
    ) -> EngineResult<Membership> {
        let result: EngineResult<Membership> = async {
            let caller_membership = self.require_membership(caller, server_id).await?;
            let target_membership = self
                .store
                .membership(target, server_id)
                .await?
                .ok_or_else(|| {
                    Error::NotFound(format!(
                        "user {target} is not a member of server {server_id}"
                    ))
                })?;

            if caller == target && caller_membership.role == Role::Owner {
                return Err(Error::Forbidden(
                    "the owner cannot change their own role".into(),
                ));
            }
            if !policy::can_act_on(
                caller_membership.role,
                target_membership.role,
                caller,
                target,
            ) {
                return Err(Error::Forbidden(format!(
                    "{} may not act on {}",
                    caller_membership.role, target_membership.role
                )));
            }
            if !new_role.is_assignable() {
                return Err(Error::InvalidInput(
                    "ownership does not transfer through role changes".into(),
                ));
            }

            self.store
                .update_membership_role(target, server_id, new_role)
                .await?;
            info!(server = %server_id, user = %target, role = %new_role, by = %caller,
                  "member role changed");
            Ok(Membership {
                role: new_role,
                ..target_membership
            })
        }
        .await;
        record_outcome("change_member_role", &result);
        result
    }

    /// All memberships of a server, in join order. Members only.
    pub async fn list_members(
        &self,
        caller: &UserId,
        server_id: &ServerId,
    ) -> EngineResult<Vec<Membership>> {
        let result: EngineResult<Vec<Membership>> = async {
            self.require_server(server_id).await?;
            self.require_membership(caller, server_id).await?;
            Ok(self.store.server_memberships(server_id).await?)
        }
        .await;
        record_outcome("list_members", &result);
        result
    }
}
