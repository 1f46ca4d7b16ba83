use sea_orm::{ColumnTrait, Order};

use models::team::{self, TeamCreate, TeamUpdate};

use crate::crud::{Service, ServiceModel};
use crate::errors::ServiceError;

pub struct Teams;

impl ServiceModel for Teams {
    type Entity = team::Entity;
    type Create = TeamCreate;
    type Update = TeamUpdate;
    type PrimaryKey = i32;
}

pub type TeamService = Service<Teams>;

impl Service<Teams> {
    /// Team names are unique.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<team::Model>, ServiceError> {
        self.one_or_none(team::Column::Name.eq(name)).await
    }

    pub async fn list(&self) -> Result<Vec<team::Model>, ServiceError> {
        self.all(None, &[(team::Column::Name, Order::Asc)]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestDb;

    #[tokio::test]
    async fn team_crud_service() -> Result<(), anyhow::Error> {
        let db = TestDb::new().await?;
        let mut svc = TeamService::new(db.session());

        let red = svc.create(TeamCreate { name: "Red".into() }).await?;
        svc.create(TeamCreate { name: "Blue".into() }).await?;
        assert_eq!(svc.find_by_name("Red").await?, Some(red.clone()));

        let renamed = svc.update(red.id, TeamUpdate { name: Some("Crimson".into()) }).await?;
        assert_eq!(renamed.name, "Crimson");
        let names: Vec<String> = svc.list().await?.into_iter().map(|t| t.name).collect();
        assert_eq!(names, ["Blue", "Crimson"]);

        svc.delete_by_pk(red.id).await?;
        assert!(svc.get_by_pk(red.id).await?.is_none());
        assert!(svc.find_by_name("Red").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_name_fails_and_rolls_back() -> Result<(), anyhow::Error> {
        let db = TestDb::new().await?;
        let mut svc = TeamService::new(db.session());
        svc.create(TeamCreate { name: "Red".into() }).await?;

        let err = svc.create(TeamCreate { name: "Red".into() }).await.unwrap_err();
        assert!(matches!(err, ServiceError::CommitFailed { .. }), "{err:?}");
        assert!(!svc.session().in_transaction());
        assert_eq!(svc.get_all().await?.len(), 1);
        Ok(())
    }
}
