//! Core domain records: roles, servers, memberships, directory users.

use crate::error::Error;
use crate::id::{ServerId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error as ThisError;

/// Minimum server name length, counted after trimming and escaping.
pub const NAME_MIN_LEN: usize = 3;

/// Maximum server name length, counted after trimming and escaping.
pub const NAME_MAX_LEN: usize = 100;

/// Membership role, ordered from least to most privileged.
///
/// The derived ordering is the permission hierarchy:
/// `Member < Moderator < Admin < Owner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Ordinary member.
    Member,
    /// May act on members.
    Moderator,
    /// May act on moderators and members.
    Admin,
    /// The creator of record. Exactly one per server, assigned at creation.
    Owner,
}

impl Role {
    /// Roles that may be granted through membership operations.
    ///
    /// `Owner` is excluded: it is assigned once, at server creation, and
    /// leaves only with the server.
    pub const ASSIGNABLE: [Role; 3] = [Role::Admin, Role::Moderator, Role::Member];

    /// Whether this role may be granted through membership operations.
    pub fn is_assignable(self) -> bool {
        self != Role::Owner
    }

    /// Canonical lowercase name, as stored and serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Moderator => "moderator",
            Role::Member => "member",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role name.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "owner" => Ok(Role::Owner),
            "admin" => Ok(Role::Admin),
            "moderator" => Ok(Role::Moderator),
            "member" => Ok(Role::Member),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}

/// A community server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    /// Time-ordered unique id.
    pub id: ServerId,
    /// Display name, stored trimmed and HTML-escaped.
    pub name: String,
    /// The creator of record; holder of the single `owner` membership.
    pub owner_id: UserId,
    /// Creation time, unix seconds.
    pub created_at: i64,
}

/// A user's membership in one server.
///
/// At most one row exists per (user, server) pair; existence of the row is
/// the sole test of "is this user part of this server".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    /// The member.
    pub user_id: UserId,
    /// The server joined.
    pub server_id: ServerId,
    /// Role held within the server.
    pub role: Role,
    /// Join time, unix seconds. Role changes never touch it.
    pub joined_at: i64,
}

/// A directory user.
///
/// Credentials and profile live with the identity system; only the fields
/// membership checks need are visible here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Opaque stable id issued by the identity system.
    pub id: UserId,
    /// Unique (case-insensitive) handle.
    pub username: String,
    /// Provisioning time, unix seconds.
    pub created_at: i64,
}

/// Normalize and validate a server display name.
///
/// Trims surrounding whitespace, escapes HTML-significant characters, then
/// enforces the length bounds on the escaped result. Escaping can push a
/// name past the maximum; that is rejected like any other oversized name.
pub fn normalize_server_name(raw: &str) -> Result<String, Error> {
    let name = escape_html(raw.trim());
    if name.is_empty() {
        return Err(Error::InvalidInput("server name is required".into()));
    }
    let len = name.chars().count();
    if !(NAME_MIN_LEN..=NAME_MAX_LEN).contains(&len) {
        return Err(Error::InvalidInput(format!(
            "server name must be between {NAME_MIN_LEN} and {NAME_MAX_LEN} characters"
        )));
    }
    Ok(name)
}

/// Escape the five HTML-significant characters.
fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ordering_matches_hierarchy() {
        assert!(Role::Member < Role::Moderator);
        assert!(Role::Moderator < Role::Admin);
        assert!(Role::Admin < Role::Owner);
    }

    #[test]
    fn role_parse_and_display_round_trip() {
        for role in [Role::Owner, Role::Admin, Role::Moderator, Role::Member] {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
            assert_eq!(role.to_string(), role.as_str());
        }
    }

    #[test]
    fn role_parse_is_strict() {
        assert!("Owner".parse::<Role>().is_err());
        assert!("root".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn only_owner_is_unassignable() {
        assert!(!Role::Owner.is_assignable());
        for role in Role::ASSIGNABLE {
            assert!(role.is_assignable());
        }
    }

    #[test]
    fn name_is_trimmed() {
        assert_eq!(normalize_server_name("  The Lounge  ").unwrap(), "The Lounge");
    }

    #[test]
    fn name_escapes_html_characters() {
        assert_eq!(
            normalize_server_name("a <b> & \"c\" 'd'").unwrap(),
            "a &lt;b&gt; &amp; &#34;c&#34; &#39;d&#39;"
        );
    }

    #[test]
    fn name_length_bounds_apply_after_escaping() {
        assert!(normalize_server_name("ab").is_err());
        assert!(normalize_server_name("abc").is_ok());
        assert!(normalize_server_name(&"x".repeat(100)).is_ok());
        assert!(normalize_server_name(&"x".repeat(101)).is_err());

        // "ab<" is three characters raw but six once escaped.
        assert_eq!(normalize_server_name("ab<").unwrap(), "ab&lt;");

        // 97 plain characters plus one that escapes to four: 101, rejected.
        let expanding = format!("{}<", "x".repeat(97));
        assert!(normalize_server_name(&expanding).is_err());
    }

    #[test]
    fn blank_name_is_required_not_short() {
        let err = normalize_server_name("   ").unwrap_err();
        assert!(err.to_string().contains("required"));
    }
}
