//! Role policy: the rules deciding who may act on whom.
//!
//! The policy is a pure function of two roles and the actor/target
//! identities. It holds no state and consults no storage; the managers in
//! [`crate::services`] fetch current membership rows and hand the roles in.

use crate::id::UserId;
use crate::model::Role;

impl Role {
    /// Strict-hierarchy check: whether this role outranks `target` enough
    /// to act on it.
    ///
    /// `owner` acts on anything; `admin` on moderators and members;
    /// `moderator` on members; `member` on nothing. Equal roles never
    /// qualify, so the hierarchy is irreflexive below the top.
    pub fn can_target(self, target: Role) -> bool {
        match self {
            Role::Owner => true,
            Role::Admin => matches!(target, Role::Moderator | Role::Member),
            Role::Moderator => target == Role::Member,
            Role::Member => false,
        }
    }
}

/// Whether `actor` may perform a membership action against `target`.
///
/// Acting on oneself is always permitted here; operations with destructive
/// self-variants (an owner removing themself, an owner changing their own
/// role) reject those cases before consulting the policy, and those
/// operation-level rejections take precedence over this shortcut.
pub fn can_act_on(
    actor_role: Role,
    target_role: Role,
    actor_id: &UserId,
    target_id: &UserId,
) -> bool {
    if actor_id == target_id {
        return true;
    }
    actor_role.can_target(target_role)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROLES: [Role; 4] = [Role::Owner, Role::Admin, Role::Moderator, Role::Member];

    #[test]
    fn full_permission_table() {
        let actor = UserId::from("actor");
        let target = UserId::from("target");

        let allowed = [
            (Role::Owner, Role::Owner),
            (Role::Owner, Role::Admin),
            (Role::Owner, Role::Moderator),
            (Role::Owner, Role::Member),
            (Role::Admin, Role::Moderator),
            (Role::Admin, Role::Member),
            (Role::Moderator, Role::Member),
        ];

        for a in ROLES {
            for t in ROLES {
                let expected = allowed.contains(&(a, t));
                assert_eq!(
                    can_act_on(a, t, &actor, &target),
                    expected,
                    "actor {a} vs target {t}"
                );
            }
        }
    }

    #[test]
    fn self_action_is_always_permitted() {
        let me = UserId::from("me");
        for a in ROLES {
            for t in ROLES {
                assert!(can_act_on(a, t, &me, &me), "self as {a} vs {t}");
            }
        }
    }

    #[test]
    fn hierarchy_is_irreflexive_below_owner() {
        let actor = UserId::from("a");
        let target = UserId::from("b");
        for role in [Role::Admin, Role::Moderator, Role::Member] {
            assert!(!can_act_on(role, role, &actor, &target), "{role} on {role}");
        }
    }

    #[test]
    fn hierarchy_is_transitive_downward() {
        // If an actor can act on role R, it can act on everything below R.
        for a in ROLES {
            for r in ROLES {
                if a.can_target(r) {
                    for below in ROLES.iter().filter(|b| **b < r) {
                        assert!(a.can_target(*below), "{a} reaches {r} but not {below}");
                    }
                }
            }
        }
    }
}
