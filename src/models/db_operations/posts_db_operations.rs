use crate::models::{BlogPost, NewBlogPost};
use chrono::Utc;
use rusqlite::{params, Connection, Error as RusqliteError};

/// Inserts a post owned by `post.user_id`. The timestamp is taken per row at insert time.
/// Fails with a foreign key violation when the owner does not exist.
pub fn create_post(conn: &Connection, post: &NewBlogPost) -> Result<i64, RusqliteError> {
    conn.execute(
        "INSERT INTO blog_post (user_id, date, title, text, summary, featured_image) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![post.user_id, Utc::now(), post.title, post.text, post.summary, post.featured_image],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_posts_by_user(conn: &Connection, user_id: i64) -> Result<Vec<BlogPost>, RusqliteError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, date, title, text, summary, featured_image FROM blog_post WHERE user_id = ?1 ORDER BY id"
    )?;
    let rows = stmt.query_map([user_id], |row| {
        Ok(BlogPost {
            id: row.get(0)?,
            user_id: row.get(1)?,
            date: row.get(2)?,
            title: row.get(3)?,
            text: row.get(4)?,
            summary: row.get(5)?,
            featured_image: row.get(6)?,
        })
    })?;
    rows.collect()
}

pub fn count_posts_by_user(conn: &Connection, user_id: i64) -> Result<i64, RusqliteError> {
    conn.query_row("SELECT COUNT(*) FROM blog_post WHERE user_id = ?1", [user_id], |row| row.get(0))
}
