mod from_row;
pub mod queries;
mod schema;

pub use schema::init_db;

use std::sync::Arc;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::Pricing;
use crate::email::NotificationChannel;
use crate::gateway::{OrderGateway, SignatureVerifier};

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state holding the database pool and injected collaborators.
///
/// Everything the confirmation pipeline touches comes in through here:
/// no ambient globals, so tests can swap the gateway and notification
/// channel for doubles.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    /// Order-creation client for the payment gateway.
    pub gateway: Arc<dyn OrderGateway>,
    /// Signature verification for both confirmation schemes.
    pub verifier: SignatureVerifier,
    /// Outbound notification channel (email).
    pub notifier: Arc<dyn NotificationChannel>,
    /// Base URL for document links (e.g. https://api.janhit.example)
    pub base_url: String,
    /// Public gateway key id handed to the checkout widget.
    pub gateway_key_id: String,
    /// Civic department inbox for filed complaints.
    pub department_email: Option<String>,
    pub pricing: Pricing,
}

fn set_busy_timeout(conn: &mut rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.busy_timeout(Duration::from_secs(5))
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path).with_init(set_busy_timeout);
    Pool::builder().max_size(10).build(manager)
}

/// Pool over a shared in-memory database, for tests. Each call gets its
/// own database; the pool's idle connections keep it alive.
pub fn create_memory_pool() -> Result<DbPool, r2d2::Error> {
    let name = format!(
        "file:memdb_{}?mode=memory&cache=shared",
        uuid::Uuid::new_v4().as_simple()
    );
    let manager = SqliteConnectionManager::file(name)
        .with_flags(
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )
        .with_init(set_busy_timeout);
    Pool::builder().max_size(10).build(manager)
}
