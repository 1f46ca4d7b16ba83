//! Unit-of-work handle over a SeaORM connection.
//!
//! Writes autobegin a transaction that stays open until [`Session::commit`] or
//! [`Session::rollback`]. Reads run inside that transaction when one is open,
//! so staged changes are visible to the session that made them, and straight
//! on the pool otherwise.

use sea_orm::{
    ActiveModelBehavior, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbBackend, DbErr, EntityTrait, IntoActiveModel, Iterable, ModelTrait, PrimaryKeyToColumn,
    PrimaryKeyTrait, QueryFilter, TransactionTrait,
};
use tracing::{debug, trace};

use crate::selection::{Joined, Selection};

/// Runs `$body` with `$conn` bound to the open transaction, or to the pool.
macro_rules! on_conn {
    ($session:expr, $conn:ident => $body:expr) => {
        match $session.txn.as_ref() {
            Some($conn) => $body,
            None => {
                let $conn = &$session.db;
                $body
            }
        }
    };
}

pub struct Session {
    db: DatabaseConnection,
    txn: Option<DatabaseTransaction>,
}

impl Session {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db, txn: None }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn backend(&self) -> DbBackend {
        self.db.get_database_backend()
    }

    /// Whether staged, uncommitted work is pending.
    pub fn in_transaction(&self) -> bool {
        self.txn.is_some()
    }

    async fn transaction(&mut self) -> Result<&DatabaseTransaction, DbErr> {
        let txn = match self.txn.take() {
            Some(txn) => txn,
            None => {
                trace!("begin transaction");
                self.db.begin().await?
            }
        };
        let txn: &DatabaseTransaction = self.txn.insert(txn);
        Ok(txn)
    }

    /// Stages an insert and returns the row as the store sees it.
    pub async fn insert<A>(&mut self, item: A) -> Result<<A::Entity as EntityTrait>::Model, DbErr>
    where
        A: ActiveModelBehavior + Send,
        <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    {
        let txn = self.transaction().await?;
        item.insert(txn).await
    }

    /// Stages an update of the `Set` columns of `item`.
    pub async fn update<A>(&mut self, item: A) -> Result<<A::Entity as EntityTrait>::Model, DbErr>
    where
        A: ActiveModelBehavior + Send,
        <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    {
        let txn = self.transaction().await?;
        item.update(txn).await
    }

    /// Stages a delete of the row identified by `item`'s primary key.
    pub async fn delete<A>(&mut self, item: A) -> Result<(), DbErr>
    where
        A: ActiveModelBehavior + Send,
    {
        let txn = self.transaction().await?;
        let res = item.delete(txn).await?;
        trace!(rows_affected = res.rows_affected, "staged delete");
        Ok(())
    }

    /// Point lookup by primary key.
    pub async fn get<E, K>(&self, pk: K) -> Result<Option<E::Model>, DbErr>
    where
        E: EntityTrait,
        K: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
    {
        let select = E::find_by_id(pk);
        on_conn!(self, conn => select.one(conn).await)
    }

    /// Runs a selection and decodes every row.
    pub async fn fetch<E, J>(&self, selection: &Selection<E, J>) -> Result<Vec<J::Row>, DbErr>
    where
        E: EntityTrait,
        J: Joined<E>,
    {
        let stmt = self.backend().build(selection.statement());
        let rows = on_conn!(self, conn => conn.query_all(stmt).await)?;
        rows.iter().map(|row| J::decode(row)).collect()
    }

    /// Reloads `model` in place. Returns `false` when the row no longer exists.
    pub async fn refresh<E: EntityTrait>(&self, model: &mut E::Model) -> Result<bool, DbErr> {
        let select = E::find().filter(primary_key_condition::<E>(model));
        let found = on_conn!(self, conn => select.one(conn).await)?;
        match found {
            Some(fresh) => {
                *model = fresh;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Commits staged work. A no-op when nothing is pending.
    ///
    /// A failed commit drops the transaction, which rolls it back.
    pub async fn commit(&mut self) -> Result<(), DbErr> {
        match self.txn.take() {
            Some(txn) => {
                txn.commit().await?;
                debug!("transaction committed");
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Discards staged work. A no-op when nothing is pending.
    pub async fn rollback(&mut self) -> Result<(), DbErr> {
        match self.txn.take() {
            Some(txn) => {
                txn.rollback().await?;
                debug!("transaction rolled back");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

/// `pk_col_1 = v1 AND pk_col_2 = v2 ...` for the key of a loaded model.
pub(crate) fn primary_key_condition<E: EntityTrait>(model: &E::Model) -> Condition {
    E::PrimaryKey::iter().fold(Condition::all(), |cond, key| {
        let column = key.into_column();
        cond.add(column.eq(model.get(column)))
    })
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("backend", &self.backend())
            .field("in_transaction", &self.in_transaction())
            .finish()
    }
}
