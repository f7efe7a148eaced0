use crate::storage::migrations::run_migrations;
use crate::DbConnection;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Open (creating if needed) the database at `db_path` and migrate it.
pub fn initialize_database(db_path: &Path) -> anyhow::Result<DbConnection> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(db_path)?;
    prepare(conn)
}

/// Fresh migrated database that lives as long as the connection.
pub fn open_in_memory() -> anyhow::Result<DbConnection> {
    prepare(Connection::open_in_memory()?)
}

fn prepare(mut conn: Connection) -> anyhow::Result<DbConnection> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    run_migrations(&mut conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}
