use std::path::Path;

use dioxus::fullstack::Lazy;
use jiff::civil::Date;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use types::{Error, Result, err};

use crate::CONFIG;
pub use session::Session;

mod cabs;
mod drivers;
mod expenses;
mod session;
mod sub_admins;

pub static STORAGE: Lazy<Storage> = Lazy::new(|| async {
    std::fs::create_dir_all(&CONFIG.data_dir)?;
    Storage::open(&CONFIG.data_dir.join("cabdesk.sqlite")).await
});

/// Local SQLite store for sessions and the records managed from the dashboard.
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub async fn open(path: &Path) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options).await?;
        Self::migrate(pool).await
    }

    #[cfg(test)]
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        // One long-lived connection, otherwise every connection sees its own empty database.
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::migrate(pool).await
    }

    async fn migrate(pool: SqlitePool) -> Result<Self, sqlx::Error> {
        sqlx::migrate!("../migrations").run(&pool).await?;
        tracing::debug!("storage migrations applied");
        Ok(Self { pool })
    }
}

fn parse_date(column: &str, value: Option<String>) -> Result<Option<Date>> {
    value
        .map(|v| {
            v.parse()
                .map_err(|e| err!("bad date {v:?} in column {column}: {e}"))
        })
        .transpose()
}

/// Turn a uniqueness violation into a 400 with a readable message.
fn map_conflict(error: sqlx::Error, message: &str) -> Error {
    match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => Error::bad_request(message),
        _ => error.into(),
    }
}

fn expect_one(rows_affected: u64, what: &str) -> Result<()> {
    if rows_affected == 0 {
        return Err(Error::not_found(format!("{what} not found")));
    }
    Ok(())
}
