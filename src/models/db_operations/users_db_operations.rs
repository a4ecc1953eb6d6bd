use crate::models::{User, UserSummary};
use rusqlite::{params, Connection, OptionalExtension, Error as RusqliteError, Row};

fn administrator_flag(is_admin: bool) -> &'static str {
    if is_admin { "1" } else { "0" }
}

fn user_from_row(row: &Row) -> Result<User, RusqliteError> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        password_hash: row.get(3)?,
        administrator: row.get::<_, String>(4)? == "1",
    })
}

/// Inserts a user and returns the new row id. `password_hash` must already be hashed.
pub fn create_user(
    conn: &Connection,
    email: &str,
    username: &str,
    password_hash: &str,
    administrator: bool,
) -> Result<i64, RusqliteError> {
    conn.execute(
        "INSERT INTO users (email, username, password_hash, administrator) VALUES (?1, ?2, ?3, ?4)",
        params![email, username, password_hash, administrator_flag(administrator)],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_user_by_id(conn: &Connection, user_id: i64) -> Result<Option<User>, RusqliteError> {
    conn.query_row(
        "SELECT id, email, username, password_hash, administrator FROM users WHERE id = ?1",
        [user_id],
        user_from_row,
    ).optional()
}

pub fn read_all_users(conn: &Connection) -> Result<Vec<User>, RusqliteError> {
    let mut stmt = conn.prepare("SELECT id, email, username, password_hash, administrator FROM users ORDER BY id")?;
    let rows = stmt.query_map([], user_from_row)?;
    rows.collect()
}

pub fn count_users(conn: &Connection) -> Result<u64, RusqliteError> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    Ok(count.max(0) as u64)
}

/// One listing page ordered by id, with each user's blog post count.
pub fn read_users_page(conn: &Connection, limit: u32, offset: u64) -> Result<Vec<UserSummary>, RusqliteError> {
    let mut stmt = conn.prepare(
        "SELECT u.id, u.email, u.username, u.administrator, COUNT(p.id)
         FROM users u LEFT JOIN blog_post p ON p.user_id = u.id
         GROUP BY u.id
         ORDER BY u.id
         LIMIT ?1 OFFSET ?2"
    )?;
    let rows = stmt.query_map(params![limit, offset as i64], |row| {
        Ok(UserSummary {
            id: row.get(0)?,
            email: row.get(1)?,
            username: row.get(2)?,
            administrator: row.get::<_, String>(3)? == "1",
            post_count: row.get(4)?,
        })
    })?;
    rows.collect()
}

/// True when another user already has `username`. `exclude_id` skips the record being edited.
pub fn username_taken(conn: &Connection, username: &str, exclude_id: Option<i64>) -> Result<bool, RusqliteError> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1 AND (?2 IS NULL OR id != ?2))",
        params![username, exclude_id],
        |row| row.get(0),
    )
}

pub fn email_taken(conn: &Connection, email: &str, exclude_id: Option<i64>) -> Result<bool, RusqliteError> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1 AND (?2 IS NULL OR id != ?2))",
        params![email, exclude_id],
        |row| row.get(0),
    )
}

/// Updates identity fields; the stored hash is replaced only when `new_password_hash` is given.
pub fn update_user(
    conn: &Connection,
    user_id: i64,
    username: &str,
    email: &str,
    new_password_hash: Option<&str>,
) -> Result<usize, RusqliteError> {
    match new_password_hash {
        Some(hashed_password) => conn.execute(
            "UPDATE users SET username = ?1, email = ?2, password_hash = ?3 WHERE id = ?4",
            params![username, email, hashed_password, user_id],
        ),
        None => conn.execute(
            "UPDATE users SET username = ?1, email = ?2 WHERE id = ?3",
            params![username, email, user_id],
        ),
    }
}

pub fn delete_user(conn: &Connection, user_id: i64) -> Result<usize, RusqliteError> {
    conn.execute("DELETE FROM users WHERE id = ?1", [user_id])
}
