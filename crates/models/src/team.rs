use sea_orm::entity::prelude::*;
use sea_orm::{DeriveIntoActiveModel, IntoActiveModel, NotSet, Set};
use serde::{Deserialize, Serialize};

use crate::player;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "team")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Player,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self { Relation::Player => Entity::has_many(player::Entity).into() }
    }
}

impl Related<player::Entity> for Entity {
    fn to() -> RelationDef { Relation::Player.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// Creation input; the id is assigned by the database.
#[derive(Clone, Debug, DeriveIntoActiveModel)]
pub struct TeamCreate {
    pub name: String,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Clone, Debug, Default)]
pub struct TeamUpdate {
    pub name: Option<String>,
}

impl IntoActiveModel<ActiveModel> for TeamUpdate {
    fn into_active_model(self) -> ActiveModel {
        ActiveModel { id: NotSet, name: self.name.map_or(NotSet, Set) }
    }
}
