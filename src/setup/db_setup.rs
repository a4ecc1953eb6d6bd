use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, Result as RusqliteResult};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Rusqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
    #[error("Password hashing error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
}

/// SQLite leaves foreign keys off unless asked, per connection.
pub fn enable_foreign_keys(conn: &mut Connection) -> RusqliteResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
}

/// Pool manager for the users database with foreign keys enforced on every connection.
pub fn connection_manager(db_path: &Path) -> SqliteConnectionManager {
    SqliteConnectionManager::file(db_path).with_init(enable_foreign_keys)
}

pub fn open_connection(db_path: &Path) -> RusqliteResult<Connection> {
    let mut conn = Connection::open(db_path)?;
    enable_foreign_keys(&mut conn)?;
    Ok(conn)
}

pub fn setup_users_db(conn: &mut Connection) -> Result<(), SetupError> {
    let tx = conn.transaction()?;
    log::info!("Creating 'users' table");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            administrator TEXT NOT NULL DEFAULT '0' CHECK(administrator IN ('0', '1'))
        )",
        [],
    )?;
    tx.execute("CREATE INDEX IF NOT EXISTS ix_users_email ON users (email)", [])?;
    tx.execute("CREATE INDEX IF NOT EXISTS ix_users_username ON users (username)", [])?;

    log::info!("Creating 'blog_post' table");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS blog_post (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            date TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            title TEXT NOT NULL CHECK(length(title) <= 140),
            text TEXT NOT NULL,
            summary TEXT NOT NULL CHECK(length(summary) <= 140),
            featured_image TEXT CHECK(featured_image IS NULL OR length(featured_image) <= 140),
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        )",
        [],
    )?;

    tx.commit()?;
    Ok(())
}

/// Drops both tables and creates them again, empty.
pub fn reset_users_db(conn: &mut Connection) -> Result<(), SetupError> {
    {
        let tx = conn.transaction()?;
        log::warn!("Dropping 'blog_post' and 'users' tables");
        tx.execute("DROP TABLE IF EXISTS blog_post", [])?;
        tx.execute("DROP TABLE IF EXISTS users", [])?;
        tx.commit()?;
    }
    setup_users_db(conn)
}

/// Sample accounts: (email, username, password, administrator).
pub const SEED_USERS: [(&str, &str, &str, bool); 2] = [
    ("admin_user1@test.com", "Admin User1", "111", true),
    ("test_user1@test.com", "Test User1", "111", false),
];

/// Inserts the sample accounts in one transaction and returns their ids.
pub fn seed_users(conn: &mut Connection, hash_cost: u32) -> Result<Vec<i64>, SetupError> {
    let tx = conn.transaction()?;
    let mut ids = Vec::with_capacity(SEED_USERS.len());
    for (email, username, password, administrator) in SEED_USERS {
        let hashed_password = bcrypt::hash(password, hash_cost)?;
        ids.push(crate::models::db_operations::users_db_operations::create_user(
            &tx, email, username, &hashed_password, administrator,
        )?);
    }
    tx.commit()?;
    Ok(ids)
}

#[cfg(test)]
pub(crate) fn test_connection() -> Connection {
    let mut conn = Connection::open_in_memory().expect("in-memory database");
    enable_foreign_keys(&mut conn).expect("foreign keys");
    setup_users_db(&mut conn).expect("schema");
    conn
}
