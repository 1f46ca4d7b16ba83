use std::process::ExitCode;

use dotenvy::dotenv;
use sea_orm::{ColumnTrait, Order};
use tracing::{error, info, warn};

use configs::{AppConfig, LogFormat};
use models::player::{self, PlayerCreate, PlayerUpdate};
use models::team::TeamCreate;
use service::player_service::PlayerService;
use service::team_service::TeamService;
use service::{Batch, ServiceError, Session};

fn init_logging(format: LogFormat) {
    match format {
        LogFormat::Compact => common::utils::logging::init_logging_default(),
        LogFormat::Json => common::utils::logging::init_logging_json(),
    }
    info!(service = "demo", event = "logger_init", "tracing subscriber initialized");
}

fn load_config() -> anyhow::Result<AppConfig> {
    // config.toml 优先，其次环境变量 DATABASE_URL
    AppConfig::load_and_validate().or_else(|_| AppConfig::from_env())
}

async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let db = models::db::connect_with_config(&cfg.database).await?;
    models::schema::create_tables(&db).await?;

    let mut teams = TeamService::new(Session::new(db.clone()));
    let red = match teams.find_by_name("Red").await? {
        Some(team) => team,
        None => teams.create(TeamCreate { name: "Red".into() }).await?,
    };

    let mut players = PlayerService::new(Session::new(db.clone()));
    let staged = players
        .add_to_session(
            Batch::create([
                PlayerCreate { name: "Ann".into(), score: 3, team_id: Some(red.id) },
                PlayerCreate { name: "Bob".into(), score: 1, team_id: None },
            ]),
            false,
        )
        .await?;
    players.add_to_session(Batch::create([PlayerCreate::named("Cid")]), true).await?;
    info!(event = "players_created", count = staged.len() + 1, "players committed");

    let ann = players.one(player::Column::Name.eq("Ann")).await?;
    let ann = players.update(ann.id, PlayerUpdate { score: Some(ann.score + 10), ..Default::default() }).await?;
    info!(event = "player_updated", id = ann.id, score = ann.score, "score bumped");

    for (p, team) in players.with_teams().await? {
        info!(event = "roster", player = %p.name, team = %team.name, "player on team");
    }

    // 悬空的 team_id 在提交时被拒绝，整个事务回滚
    match players.create(PlayerCreate { name: "Ghost".into(), score: 0, team_id: Some(-1) }).await {
        Err(ServiceError::CommitFailed { message, source }) => {
            warn!(event = "commit_failed", %message, error = %source, "write rolled back as expected");
        }
        Err(e) => return Err(e.into()),
        Ok(p) => warn!(event = "unexpected_insert", id = p.id, "dangling team reference was accepted"),
    }

    for p in players.all(None, &[(player::Column::Score, Order::Desc)]).await? {
        info!(event = "standing", player = %p.name, score = p.score, "standing");
        players.delete_by_pk(p.id).await?;
    }
    info!(event = "cleanup", remaining = players.get_all().await?.len(), "players removed");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    let cfg = match load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            common::utils::logging::init_logging_default();
            error!(service = "demo", event = "config_invalid", error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    init_logging(cfg.log.format);

    match run(cfg).await {
        Ok(()) => {
            info!(service = "demo", event = "done", "demo finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(service = "demo", event = "run_failed", error = %e, "demo failed");
            ExitCode::FAILURE
        }
    }
}
