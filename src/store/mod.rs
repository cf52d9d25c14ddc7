//! Storage subsystem.
//!
//! # Data Flow
//! ```text
//! DatabaseConfig
//!     → connect() (pooled driver: size, acquire timeout, recycle)
//!     → init_schema() (tables + UNIQUE constraints)
//!     → users.rs / orders.rs (parameterized queries)
//! ```
//!
//! # Design Decisions
//! - Every filter value reaches the engine as a bound parameter
//! - Uniqueness is enforced by the engine (UNIQUE constraints), so the
//!   duplicate pre-check in the handlers is a courtesy, not a guarantee
//! - Timestamps are set by the application and stored as RFC 3339 text

pub mod orders;
pub mod users;

use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::config::DatabaseConfig;

pub type DbPool = SqlitePool;

/// Build the connection pool from configuration.
pub async fn connect(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .connect(&config.url)
        .await
}

/// Create tables and indexes if they do not exist yet.
pub async fn init_schema(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            name       TEXT    NOT NULL,
            email      TEXT    NOT NULL UNIQUE,
            username   TEXT,
            role       TEXT    NOT NULL DEFAULT 'user',
            bio        TEXT,
            is_active  INTEGER NOT NULL DEFAULT 1,
            created_at TEXT    NOT NULL,
            updated_at TEXT    NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS orders (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            order_number TEXT    NOT NULL UNIQUE,
            user_id      INTEGER NOT NULL REFERENCES users(id),
            status       TEXT    NOT NULL DEFAULT 'pending',
            total_cents  INTEGER NOT NULL,
            notes        TEXT,
            created_at   TEXT    NOT NULL,
            updated_at   TEXT    NOT NULL,
            shipped_at   TEXT,
            delivered_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_created_at ON users (created_at)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_orders_user_status ON orders (user_id, status)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_orders_created_at ON orders (created_at)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Liveness probe for the health endpoint.
pub async fn ping(pool: &DbPool) -> bool {
    sqlx::query("SELECT 1").execute(pool).await.is_ok()
}

#[cfg(test)]
pub(crate) async fn test_pool() -> DbPool {
    // Each in-memory SQLite connection is its own database; one connection
    // keeps all queries on shared state.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    init_schema(&pool).await.expect("schema");
    pool
}
