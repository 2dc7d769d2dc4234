pub mod group;
pub mod ride;
pub mod user;

use std::str::FromStr;
use std::time::Duration;

use log::info;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use crate::DbPool;

/// Opens the SQLite database behind `db_url`, creating the file when it is
/// missing, and applies the embedded migrations.
pub async fn init_db_pool(db_url: &str) -> Result<DbPool, sqlx::Error> {
    info!("database url: {}", db_url);
    let options = SqliteConnectOptions::from_str(db_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(10));
    let pool: DbPool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("connected to sqlite, migrations applied");
    Ok(pool)
}
