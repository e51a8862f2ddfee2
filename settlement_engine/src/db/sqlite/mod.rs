pub mod db;

pub mod carts;
pub mod orders;
pub mod payments;
pub mod shipments;

use std::env;

use log::info;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

pub use db::SqliteDatabase;

const SQLITE_DB_URL: &str = "sqlite://data/settlements.db";

pub fn db_url() -> String {
    let result = env::var("MSS_DATABASE_URL").unwrap_or_else(|_| {
        info!("MSS_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("Using database URL: {result}");
    result
}

/// Open a connection pool against `url` and apply the schema. Every statement in the schema is a
/// `CREATE .. IF NOT EXISTS`, so opening an existing database is harmless.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    for statement in include_str!("schema.sql").split(';').map(str::trim).filter(|s| !s.is_empty()) {
        sqlx::query(statement).execute(&pool).await?;
    }
    Ok(pool)
}
