//! Shared harness for integration tests.
//!
//! Builds engines over fresh stores (one per backend) with a handful of
//! seeded directory users, so scenario tests can exercise every backend
//! through the same code path.

#![allow(dead_code)]

use roster::store::{MemoryStore, SqliteStore, Store};
use roster::{ServerService, User, UserId};
use std::sync::{Arc, Once};

static TRACING: Once = Once::new();

/// Initialize tracing once per test binary; `RUST_LOG` controls verbosity.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// An engine over a fresh store, plus a handle to the store itself for
/// direct inspection.
pub struct TestEngine {
    /// Backend name, for assertion messages.
    pub backend: &'static str,
    pub service: ServerService,
    pub store: Arc<dyn Store>,
}

/// Users seeded into every fresh store.
pub const USERS: [(&str, &str); 4] = [
    ("u-olivia", "olivia"),
    ("u-alice", "alice"),
    ("u-bob", "bob"),
    ("u-mallory", "mallory"),
];

/// Shorthand for building a [`UserId`] in assertions.
pub fn uid(raw: &str) -> UserId {
    UserId::from(raw)
}

async fn seed(store: &Arc<dyn Store>) -> anyhow::Result<()> {
    for (id, username) in USERS {
        store
            .create_user(&User {
                id: UserId::from(id),
                username: username.to_string(),
                created_at: 0,
            })
            .await?;
    }
    Ok(())
}

fn engine_over(backend: &'static str, store: Arc<dyn Store>) -> TestEngine {
    TestEngine {
        backend,
        service: ServerService::new(store.clone()),
        store,
    }
}

/// Engine over the in-memory backend.
pub async fn memory_engine() -> anyhow::Result<TestEngine> {
    init_tracing();
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    seed(&store).await?;
    Ok(engine_over("memory", store))
}

/// Engine over a private in-memory SQLite database.
pub async fn sqlite_engine() -> anyhow::Result<TestEngine> {
    init_tracing();
    let store: Arc<dyn Store> = Arc::new(SqliteStore::connect(":memory:").await?);
    seed(&store).await?;
    Ok(engine_over("sqlite", store))
}

/// One engine per backend; scenario tests run against each in turn.
pub async fn engines() -> anyhow::Result<Vec<TestEngine>> {
    Ok(vec![memory_engine().await?, sqlite_engine().await?])
}
