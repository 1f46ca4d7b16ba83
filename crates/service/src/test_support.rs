#![cfg(test)]
use sea_orm::DatabaseConnection;
use tempfile::TempDir;

use configs::DatabaseConfig;
use models::db::connect_with_config;

use crate::session::Session;

/// A throwaway SQLite database with the demo schema, one per test.
pub struct TestDb {
    db: DatabaseConnection,
    _dir: TempDir,
}

impl TestDb {
    pub async fn new() -> Result<Self, anyhow::Error> {
        common::utils::logging::init_logging_test();
        let dir = tempfile::tempdir()?;
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("service.db").display());
        let cfg = DatabaseConfig { url, max_connections: 5, ..DatabaseConfig::default() };
        let db = connect_with_config(&cfg).await?;
        models::schema::create_tables(&db).await?;
        Ok(Self { db, _dir: dir })
    }

    /// A fresh session on the shared pool.
    pub fn session(&self) -> Session {
        Session::new(self.db.clone())
    }
}
