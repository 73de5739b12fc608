// src/db.rs
use sqlx::{
    SqlitePool,
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use std::str::FromStr;
use std::time::Duration;

use crate::errors::TaxiResult;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Opens the pool and applies pending migrations.
///
/// An in-memory database lives only as long as its connection, so those get
/// a single connection that is never recycled.
pub async fn connect(database_url: &str) -> TaxiResult<SqlitePool> {
    let in_memory = database_url.contains(":memory:");

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5))
        .journal_mode(if in_memory {
            SqliteJournalMode::Memory
        } else {
            SqliteJournalMode::Wal
        });

    let pool = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?
    };

    MIGRATOR.run(&pool).await?;
    tracing::info!(database_url, "Database ready");
    Ok(pool)
}

/// Builds a `LIKE` pattern matching `term` anywhere, with the wildcard
/// characters in `term` escaped. Use with `ESCAPE '\'`.
pub fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
