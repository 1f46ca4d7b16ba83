use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, IntoActiveModel, Order};

use models::player::{self, PlayerCreate, PlayerUpdate};
use models::team;

use crate::crud::{Service, ServiceModel};
use crate::errors::ServiceError;
use crate::selection::joined_alias;

pub struct Players;

impl ServiceModel for Players {
    type Entity = player::Entity;
    type Create = PlayerCreate;
    type Update = PlayerUpdate;
    type PrimaryKey = i32;

    /// Names are stored trimmed.
    fn prepare_for_create(data: PlayerCreate) -> player::ActiveModel {
        PlayerCreate { name: data.name.trim().to_string(), ..data }.into_active_model()
    }

    fn prepare_for_update(data: PlayerUpdate) -> player::ActiveModel {
        PlayerUpdate { name: data.name.map(|n| n.trim().to_string()), ..data }.into_active_model()
    }
}

pub type PlayerService = Service<Players>;

impl Service<Players> {
    /// Players with exactly this name, oldest first.
    pub async fn get_by_name(&self, name: &str) -> Result<Vec<player::Model>, ServiceError> {
        let selection = self
            .select()
            .filter(player::Column::Name.eq(name))
            .order_by(player::Column::Id, Order::Asc);
        Ok(self.exec(selection).await?.all())
    }

    /// Players that belong to a team, paired with it, ordered by team then player name.
    pub async fn with_teams(&self) -> Result<Vec<(player::Model, team::Model)>, ServiceError> {
        let selection = self
            .select()
            .join::<team::Entity>()
            .filter(Expr::col((player::Entity, player::Column::TeamId)).equals((team::Entity, team::Column::Id)))
            .order_by(team::Column::Name, Order::Asc)
            .order_by(player::Column::Name, Order::Asc);
        Ok(self.exec(selection).await?.all())
    }

    /// Every ordered pair of distinct players sharing a team, with the team.
    pub async fn teammates(&self) -> Result<Vec<(player::Model, team::Model, player::Model)>, ServiceError> {
        let mate = joined_alias(2);
        let selection = self
            .select()
            .join::<team::Entity>()
            .join::<player::Entity>()
            .filter(Expr::col((player::Entity, player::Column::TeamId)).equals((team::Entity, team::Column::Id)))
            .filter(Expr::col((mate.clone(), player::Column::TeamId)).equals((team::Entity, team::Column::Id)))
            .filter(Expr::col((mate.clone(), player::Column::Id)).ne(Expr::col((player::Entity, player::Column::Id))))
            .order_by(player::Column::Name, Order::Asc)
            .order_by_expr(Expr::col((mate, player::Column::Name)), Order::Asc);
        Ok(self.exec(selection).await?.all())
    }
}
