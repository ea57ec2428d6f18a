//! # roster
//!
//! A membership and role-based access-control engine for multi-tenant
//! community platforms: users join servers, each membership carries a role
//! from the closed hierarchy `owner > admin > moderator > member`, and the
//! role decides which actions a user may perform against other members and
//! the server itself.
//!
//! ## Features
//!
//! - Stateless role policy deciding any (actor, target, action) triple
//! - Server lifecycle: create, rename, delete, list — ownership-enforced
//! - Membership lifecycle: add, remove, change role — policy-gated
//! - Pluggable storage behind async traits: SQLite (SQLx) or in-memory
//! - Typed error taxonomy with stable codes for metrics labeling
//!
//! Transport, credentials, and token handling are external collaborators:
//! embed this crate behind your own HTTP layer and hand every operation an
//! already-authenticated caller id.
//!
//! ## Quick start
//!
//! ```
//! use roster::store::{MemoryStore, UserDirectory};
//! use roster::{ServerService, User, UserId};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anyhow::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! store
//!     .create_user(&User {
//!         id: UserId::from("u-ada"),
//!         username: "ada".into(),
//!         created_at: 0,
//!     })
//!     .await?;
//!
//! let service = ServerService::new(store);
//! let owner = UserId::from("u-ada");
//! let server = service.create_server(&owner, "Analytical Engines").await?;
//! assert_eq!(server.owner_id, owner);
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod id;
pub mod metrics;
pub mod model;
pub mod policy;
pub mod services;
pub mod store;

pub use config::{Config, ConfigError, StorageBackend, StorageConfig};
pub use error::{EngineResult, Error};
pub use id::{ServerId, UserId};
pub use model::{Membership, Role, Server, User};
pub use services::ServerService;
pub use store::{MembershipStore, Store, StoreError, UserDirectory};
