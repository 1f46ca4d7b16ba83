use sea_orm::entity::prelude::*;
use sea_orm::{DeriveIntoActiveModel, IntoActiveModel, NotSet, Set};
use serde::{Deserialize, Serialize};

use crate::team;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "player")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub score: i32,
    pub team_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Team,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self { Relation::Team => Entity::belongs_to(team::Entity).from(Column::TeamId).to(team::Column::Id).into() }
    }
}

impl Related<team::Entity> for Entity {
    fn to() -> RelationDef { Relation::Team.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// Creation input; the id is assigned by the database.
#[derive(Clone, Debug, DeriveIntoActiveModel)]
pub struct PlayerCreate {
    pub name: String,
    pub score: i32,
    pub team_id: Option<i32>,
}

impl PlayerCreate {
    pub fn named(name: &str) -> Self {
        Self { name: name.to_string(), score: 0, team_id: None }
    }
}

/// Partial update. `None` means "not provided" and leaves the column as is;
/// `team_id: Some(None)` clears the team.
#[derive(Clone, Debug, Default)]
pub struct PlayerUpdate {
    pub name: Option<String>,
    pub score: Option<i32>,
    pub team_id: Option<Option<i32>>,
}

impl IntoActiveModel<ActiveModel> for PlayerUpdate {
    fn into_active_model(self) -> ActiveModel {
        ActiveModel {
            id: NotSet,
            name: self.name.map_or(NotSet, Set),
            score: self.score.map_or(NotSet, Set),
            team_id: self.team_id.map_or(NotSet, Set),
        }
    }
}
