#![allow(dead_code)]

use sqlforge_command::{Connection, ConnectionConfig, DialectKind};
use sqlforge_core::{column, ColumnType};
use sqlforge_sqlite::SqliteDriver;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn config() -> ConnectionConfig {
    ConnectionConfig::new("sqlite::memory:", DialectKind::Sqlite)
}

pub async fn open(config: ConnectionConfig) -> Connection<SqliteDriver> {
    init_tracing();
    SqliteDriver::open(config)
        .await
        .unwrap_or_else(|e| panic!("Failed to open in-memory SQLite: {e}"))
}

/// Opens an in-memory database with an empty `user` table.
pub async fn with_users() -> Connection<SqliteDriver> {
    let mut conn = open(config()).await;
    let mut command = conn.create_command("");
    command
        .build(|b| {
            b.create_table(
                "user",
                [
                    ("id", ColumnType::from(column::primary_key())),
                    ("name", column::varchar(64).not_null().into()),
                    ("email", column::varchar(255).unique().into()),
                    ("visits", column::integer().not_null().default_value(0).into()),
                    ("avatar", column::blob().into()),
                ],
                None,
            )
        })
        .unwrap();
    command.execute().await.unwrap();
    drop(command);
    conn
}
