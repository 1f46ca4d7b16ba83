//! DDL for the demo `team` / `player` tables.
//!
//! `player.team_id` uses a deferred foreign key so a dangling team reference
//! is only rejected when the transaction commits.
use sea_orm::{ConnectionTrait, DatabaseBackend, DbErr};
use tracing::debug;

const SQLITE: [&str; 2] = [
    "CREATE TABLE IF NOT EXISTS team (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS player (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        score INTEGER NOT NULL DEFAULT 0,
        team_id INTEGER NULL REFERENCES team (id) DEFERRABLE INITIALLY DEFERRED
    )",
];

const POSTGRES: [&str; 2] = [
    "CREATE TABLE IF NOT EXISTS team (
        id SERIAL PRIMARY KEY,
        name VARCHAR(128) NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS player (
        id SERIAL PRIMARY KEY,
        name VARCHAR(128) NOT NULL,
        score INTEGER NOT NULL DEFAULT 0,
        team_id INTEGER NULL REFERENCES team (id) DEFERRABLE INITIALLY DEFERRED
    )",
];

/// Create the demo tables if they do not exist yet.
pub async fn create_tables<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let statements: &[&str] = match backend {
        DatabaseBackend::Sqlite => &SQLITE,
        DatabaseBackend::Postgres => &POSTGRES,
        other => return Err(DbErr::Custom(format!("demo schema is not available for {other:?}"))),
    };
    for sql in statements {
        db.execute_unprepared(sql).await?;
    }
    debug!(?backend, "demo schema ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_with_config;
    use crate::{player, team};
    use configs::DatabaseConfig;
    use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel};

    #[tokio::test]
    async fn creates_tables_idempotently() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("schema.db").display());
        let db = connect_with_config(&DatabaseConfig { url, ..DatabaseConfig::default() }).await?;

        create_tables(&db).await?;
        create_tables(&db).await?;

        let red = team::TeamCreate { name: "Red".into() }.into_active_model().insert(&db).await?;
        let p = player::PlayerCreate { name: "Ann".into(), score: 3, team_id: Some(red.id) }
            .into_active_model()
            .insert(&db)
            .await?;
        assert_eq!(p.score, 3);

        let (found, its_team) = player::Entity::find_by_id(p.id)
            .find_also_related(team::Entity)
            .one(&db)
            .await?
            .expect("player row");
        assert_eq!(found, p);
        assert_eq!(its_team, Some(red));
        Ok(())
    }
}
