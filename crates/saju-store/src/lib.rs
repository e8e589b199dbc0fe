pub mod billing;
pub mod classics;
pub mod db;
pub mod error;
pub mod history;
pub mod interests;
pub mod pending;
pub mod pillar_cache;
pub mod profiles;
pub mod pushlog;
pub mod usage;

pub use error::{Result, StoreError};

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

/// Shared handle to the single SQLite database. Every store takes a clone —
/// one connection, short-lived lock per operation.
pub type Db = Arc<Mutex<Connection>>;

/// Open (or create) the database and initialise the schema.
pub fn open_db(path: &str) -> Result<Db> {
    let conn = if path.is_empty() {
        Connection::open_in_memory()?
    } else {
        if let Some(parent) = std::path::Path::new(path).parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        Connection::open(path)?
    };
    db::init_db(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// In-memory database for tests and persistence-less deployments.
pub fn open_memory_db() -> Result<Db> {
    open_db("")
}
