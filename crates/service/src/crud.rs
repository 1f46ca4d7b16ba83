//! Generic CRUD service bound to one entity and one [`Session`].
//!
//! Each entity opts in through [`ServiceModel`], naming its create/update
//! inputs and key type. Mutations commit right away and are rolled back when
//! the write or the commit fails; [`Service::add_to_session`] can defer the
//! commit so that several batches land together.

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use sea_orm::sea_query::IntoCondition;
use sea_orm::{
    ActiveModelTrait, ActiveValue, Condition, EntityTrait, IdenStatic, IntoActiveModel, Iterable, ModelTrait, Order,
    PrimaryKeyToColumn, PrimaryKeyTrait,
};
use tracing::{debug, instrument};

use crate::errors::ServiceError;
use crate::pagination::Pagination;
use crate::primary_key::{format_named_key, format_primary_key, KeyFormatError};
use crate::selection::{Joined, Rows, Selection};
use crate::session::Session;
use crate::utils::{rollback_after, safe_commit};

pub type ModelOf<M> = <<M as ServiceModel>::Entity as EntityTrait>::Model;
pub type ActiveModelOf<M> = <<M as ServiceModel>::Entity as EntityTrait>::ActiveModel;
pub type ColumnOf<M> = <<M as ServiceModel>::Entity as EntityTrait>::Column;
type KeyValueOf<M> = <<<M as ServiceModel>::Entity as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType;

const COMMIT_FAILED: &str = "Commit failed.";
const DELETE_FAILED: &str = "Failed to delete item.";

/// Binds an entity to its service inputs.
///
/// The `prepare_*` hooks turn caller input into the active model that gets
/// written. Override them to normalise or enrich data.
pub trait ServiceModel {
    type Entity: EntityTrait;
    type Create: IntoActiveModel<ActiveModelOf<Self>>;
    /// Partial update; only `Set` columns of its active model are applied.
    type Update: IntoActiveModel<ActiveModelOf<Self>>;
    type PrimaryKey: Clone + fmt::Debug + Into<KeyValueOf<Self>>;

    fn prepare_for_create(data: Self::Create) -> ActiveModelOf<Self> {
        data.into_active_model()
    }

    fn prepare_for_update(data: Self::Update) -> ActiveModelOf<Self> {
        data.into_active_model()
    }
}

/// Which kind of items a [`Batch`] carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => f.write_str("create"),
            Operation::Update => f.write_str("update"),
        }
    }
}

impl FromStr for Operation {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Operation::Create),
            "update" => Ok(Operation::Update),
            other => Err(ServiceError::Unsupported(format!("unsupported operation: {other}"))),
        }
    }
}

/// Items for [`Service::add_to_session`], all of one operation.
pub enum Batch<M: ServiceModel> {
    Create(Vec<M::Create>),
    /// Loaded rows paired with the changes to apply to them.
    Update(Vec<(ModelOf<M>, M::Update)>),
}

impl<M: ServiceModel> Batch<M> {
    pub fn create(items: impl IntoIterator<Item = M::Create>) -> Self {
        Batch::Create(items.into_iter().collect())
    }

    pub fn update(items: impl IntoIterator<Item = (ModelOf<M>, M::Update)>) -> Self {
        Batch::Update(items.into_iter().collect())
    }

    pub fn empty(operation: Operation) -> Self {
        match operation {
            Operation::Create => Batch::Create(Vec::new()),
            Operation::Update => Batch::Update(Vec::new()),
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            Batch::Create(_) => Operation::Create,
            Batch::Update(_) => Operation::Update,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Batch::Create(items) => items.len(),
            Batch::Update(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct Service<M: ServiceModel> {
    session: Session,
    _model: PhantomData<fn() -> M>,
}

impl<M> Service<M>
where
    M: ServiceModel,
    ModelOf<M>: IntoActiveModel<ActiveModelOf<M>>,
    ActiveModelOf<M>: Send,
{
    pub fn new(session: Session) -> Self {
        Self { session, _model: PhantomData }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Gives the session back, e.g. to hand it to another service.
    pub fn into_session(self) -> Session {
        self.session
    }

    /// Inserts one item and commits.
    ///
    /// # Errors
    /// `CommitFailed` if the insert or the commit fails; nothing is persisted.
    #[instrument(skip_all)]
    pub async fn create(&mut self, data: M::Create) -> Result<ModelOf<M>, ServiceError> {
        let item = M::prepare_for_create(data);
        let mut created = self.stage_insert(item, COMMIT_FAILED).await?;
        safe_commit(&mut self.session, COMMIT_FAILED).await?;
        self.refresh(&mut created).await?;
        debug!("item created");
        Ok(created)
    }

    pub async fn get_by_pk(&self, pk: M::PrimaryKey) -> Result<Option<ModelOf<M>>, ServiceError> {
        Ok(self.session.get::<M::Entity, _>(pk).await?)
    }

    /// Applies the provided fields of `data` to the row at `pk` and commits.
    ///
    /// # Errors
    /// `NotFound` with the formatted key when there is no such row,
    /// `CommitFailed` when the write or the commit fails.
    #[instrument(skip(self, data))]
    pub async fn update(&mut self, pk: M::PrimaryKey, data: M::Update) -> Result<ModelOf<M>, ServiceError> {
        let key = format_key::<M>(pk.clone())?;
        let current = self
            .get_by_pk(pk)
            .await?
            .ok_or_else(|| ServiceError::NotFound(key.clone()))?;

        let item = apply_changes(current.into_active_model(), &M::prepare_for_update(data));
        let message = format!("Failed to update {key}.");
        let mut updated = self.stage_update(item, &message).await?;
        safe_commit(&mut self.session, &message).await?;
        self.refresh(&mut updated).await?;
        debug!("item updated");
        Ok(updated)
    }

    /// # Errors
    /// `NotFound` with the formatted key when there is no such row,
    /// `CommitFailed` when the delete or the commit fails.
    #[instrument(skip(self))]
    pub async fn delete_by_pk(&mut self, pk: M::PrimaryKey) -> Result<(), ServiceError> {
        let item = match self.get_by_pk(pk.clone()).await? {
            Some(item) => item,
            None => return Err(ServiceError::NotFound(format_key::<M>(pk)?)),
        };
        self.stage_delete(item.into_active_model(), DELETE_FAILED).await?;
        safe_commit(&mut self.session, DELETE_FAILED).await?;
        debug!("item deleted");
        Ok(())
    }

    /// Stages every item of `batch` in this session, committing only when
    /// `commit` is set. Returns the staged rows as the session sees them.
    ///
    /// Work staged by earlier uncommitted calls is committed along with this
    /// batch, so an empty batch with `commit = true` flushes pending work.
    ///
    /// # Errors
    /// `CommitFailed` if a write or the commit fails; everything pending in the
    /// session is rolled back.
    #[instrument(skip(self, batch), fields(operation = %batch.operation(), items = batch.len()))]
    pub async fn add_to_session(&mut self, batch: Batch<M>, commit: bool) -> Result<Vec<ModelOf<M>>, ServiceError> {
        let mut staged = Vec::with_capacity(batch.len());
        match batch {
            Batch::Create(items) => {
                for data in items {
                    let item = M::prepare_for_create(data);
                    staged.push(self.stage_insert(item, COMMIT_FAILED).await?);
                }
            }
            Batch::Update(items) => {
                for (current, data) in items {
                    let item = apply_changes(current.into_active_model(), &M::prepare_for_update(data));
                    staged.push(self.stage_update(item, COMMIT_FAILED).await?);
                }
            }
        }
        if commit {
            safe_commit(&mut self.session, COMMIT_FAILED).await?;
        }
        debug!(staged = staged.len(), commit, "batch added to session");
        Ok(staged)
    }

    /// Rows matching `filter`, sorted by `order_by` in the given priority.
    pub async fn all(
        &self,
        filter: Option<Condition>,
        order_by: &[(ColumnOf<M>, Order)],
    ) -> Result<Vec<ModelOf<M>>, ServiceError> {
        Ok(self.exec(self.query(filter, order_by)).await?.all())
    }

    /// One page of [`Service::all`].
    pub async fn all_paginated(
        &self,
        filter: Option<Condition>,
        order_by: &[(ColumnOf<M>, Order)],
        pagination: Pagination,
    ) -> Result<Vec<ModelOf<M>>, ServiceError> {
        let (limit, offset) = pagination.limit_offset();
        let selection = self.query(filter, order_by).limit(limit).offset(offset);
        Ok(self.exec(selection).await?.all())
    }

    pub async fn get_all(&self) -> Result<Vec<ModelOf<M>>, ServiceError> {
        self.all(None, &[]).await
    }

    /// The single row matching `filter`.
    ///
    /// # Errors
    /// `NotFound` when nothing matches, `MultipleResultsFound` when several do.
    pub async fn one<C: IntoCondition>(&self, filter: C) -> Result<ModelOf<M>, ServiceError> {
        self.exec(self.select().filter(filter).limit(2)).await?.one()
    }

    /// # Errors
    /// `MultipleResultsFound` when more than one row matches.
    pub async fn one_or_none<C: IntoCondition>(&self, filter: C) -> Result<Option<ModelOf<M>>, ServiceError> {
        self.exec(self.select().filter(filter).limit(2)).await?.one_or_none()
    }

    /// A selection over this service's entity, to be refined and passed to
    /// [`Service::exec`].
    pub fn select(&self) -> Selection<M::Entity> {
        Selection::new()
    }

    /// Runs any selection through this service's session.
    pub async fn exec<E, J>(&self, selection: Selection<E, J>) -> Result<Rows<J::Row>, ServiceError>
    where
        E: EntityTrait,
        J: Joined<E>,
    {
        let rows = self.session.fetch(&selection).await?;
        Ok(Rows::new(rows))
    }

    /// Reloads `instance` from the store.
    ///
    /// # Errors
    /// `NotFound` when the row is gone.
    pub async fn refresh(&self, instance: &mut ModelOf<M>) -> Result<(), ServiceError> {
        if self.session.refresh::<M::Entity>(instance).await? {
            return Ok(());
        }
        let key = format_named_key(<M::Entity as EntityTrait>::PrimaryKey::iter().map(|key| {
            let column = key.into_column();
            (column.as_str().to_owned(), instance.get(column))
        }))?;
        Err(ServiceError::NotFound(key))
    }

    fn query(&self, filter: Option<Condition>, order_by: &[(ColumnOf<M>, Order)]) -> Selection<M::Entity> {
        let mut selection = self.select();
        if let Some(condition) = filter {
            selection = selection.filter(condition);
        }
        for (column, order) in order_by {
            selection = selection.order_by(*column, order.clone());
        }
        selection
    }

    async fn stage_insert(&mut self, item: ActiveModelOf<M>, message: &str) -> Result<ModelOf<M>, ServiceError> {
        match self.session.insert(item).await {
            Ok(model) => Ok(model),
            Err(err) => Err(rollback_after(&mut self.session, message, err).await),
        }
    }

    async fn stage_update(&mut self, item: ActiveModelOf<M>, message: &str) -> Result<ModelOf<M>, ServiceError> {
        match self.session.update(item).await {
            Ok(model) => Ok(model),
            Err(err) => Err(rollback_after(&mut self.session, message, err).await),
        }
    }

    async fn stage_delete(&mut self, item: ActiveModelOf<M>, message: &str) -> Result<(), ServiceError> {
        match self.session.delete(item).await {
            Ok(()) => Ok(()),
            Err(err) => Err(rollback_after(&mut self.session, message, err).await),
        }
    }
}

impl<M: ServiceModel> fmt::Debug for Service<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service").field("session", &self.session).finish()
    }
}

fn format_key<M: ServiceModel>(pk: M::PrimaryKey) -> Result<String, KeyFormatError> {
    let value: KeyValueOf<M> = pk.into();
    format_primary_key(value)
}

/// Copies the `Set` columns of `changes` onto `target`.
fn apply_changes<A: ActiveModelTrait>(mut target: A, changes: &A) -> A {
    for column in <<A::Entity as EntityTrait>::Column as Iterable>::iter() {
        if let ActiveValue::Set(value) = changes.get(column) {
            target.set(column, value);
        }
    }
    target
}
