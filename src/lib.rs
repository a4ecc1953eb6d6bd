use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
pub type DbPool = Pool<SqliteConnectionManager>;

pub mod config;
pub mod helper;
pub mod models;
pub mod routes;
pub mod setup;
