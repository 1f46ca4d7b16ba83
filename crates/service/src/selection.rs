//! Select statements over one entity, optionally widened with joined entities.
//!
//! A [`Selection<E, J>`] selects every column of `E` plus every column of each
//! entity in the tuple `J`. Joined entities are added to the `FROM` list; the
//! join predicate is whatever the caller passes to [`Selection::filter`].
//! Columns are aliased `t{n}_{column}` so that each entity's model decodes from
//! its own slice of the row. At most six entities can be joined.
//!
//! An entity whose table is already in the `FROM` list is aliased `t{n}`, `n`
//! being its position in the row; refer to its columns through
//! [`joined_alias`].

use std::marker::PhantomData;

use sea_orm::sea_query::{Alias, DynIden, Expr, IntoCondition, IntoIden, Query, SelectStatement, SimpleExpr};
use sea_orm::{ColumnTrait, DbErr, EntityTrait, FromQueryResult, IdenStatic, Iterable, Order, QueryResult};

use crate::errors::ServiceError;

fn prefix(index: usize) -> String {
    format!("t{index}_")
}

/// Table alias of the entity at `index` in a row, used when that entity's
/// table already appears earlier in the selection.
pub fn joined_alias(index: usize) -> Alias {
    Alias::new(format!("t{index}"))
}

fn select_columns<E: EntityTrait>(stmt: &mut SelectStatement, index: usize, source: Option<DynIden>) {
    let prefix = prefix(index);
    for column in E::Column::iter() {
        let alias = Alias::new(format!("{prefix}{}", column.as_str()));
        let table = source.clone().unwrap_or_else(|| column.entity_name());
        stmt.expr_as(column.select_as(Expr::col((table, column))), alias);
    }
}

fn decode_model<E: EntityTrait>(res: &QueryResult, index: usize) -> Result<E::Model, DbErr> {
    <E::Model as FromQueryResult>::from_query_result(res, &prefix(index))
}

/// Row shape produced by a selection over `E` joined with `Self`.
pub trait Joined<E: EntityTrait> {
    type Row;
    /// Number of joined entities.
    const ARITY: usize;

    fn decode(res: &QueryResult) -> Result<Self::Row, DbErr>;
}

/// Appends `F` to a tuple of joined entities.
pub trait JoinWith<F> {
    type Output;
}

impl<E: EntityTrait> Joined<E> for () {
    type Row = E::Model;
    const ARITY: usize = 0;

    fn decode(res: &QueryResult) -> Result<Self::Row, DbErr> {
        decode_model::<E>(res, 0)
    }
}

macro_rules! joined_tuple {
    ($arity:literal; $($name:ident = $index:literal),+) => {
        impl<E: EntityTrait, $($name: EntityTrait),+> Joined<E> for ($($name,)+) {
            type Row = (E::Model, $(<$name as EntityTrait>::Model,)+);
            const ARITY: usize = $arity;

            fn decode(res: &QueryResult) -> Result<Self::Row, DbErr> {
                Ok((decode_model::<E>(res, 0)?, $(decode_model::<$name>(res, $index)?,)+))
            }
        }
    };
}

joined_tuple!(1; A = 1);
joined_tuple!(2; A = 1, B = 2);
joined_tuple!(3; A = 1, B = 2, C = 3);
joined_tuple!(4; A = 1, B = 2, C = 3, D = 4);
joined_tuple!(5; A = 1, B = 2, C = 3, D = 4, F = 5);
joined_tuple!(6; A = 1, B = 2, C = 3, D = 4, F = 5, G = 6);

impl<Next> JoinWith<Next> for () {
    type Output = (Next,);
}

macro_rules! join_with {
    ($($name:ident),+) => {
        impl<$($name,)+ Next> JoinWith<Next> for ($($name,)+) {
            type Output = ($($name,)+ Next,);
        }
    };
}

// No impl for six-tuples: a seventh join does not compile.
join_with!(A);
join_with!(A, B);
join_with!(A, B, C);
join_with!(A, B, C, D);
join_with!(A, B, C, D, F);

/// An unexecuted select statement; run it with [`crate::Service::exec`].
pub struct Selection<E, J = ()> {
    stmt: SelectStatement,
    tables: Vec<String>,
    _marker: PhantomData<fn() -> (E, J)>,
}

impl<E: EntityTrait> Selection<E> {
    pub fn new() -> Self {
        let entity = E::default();
        let mut stmt = Query::select();
        stmt.from(entity.table_ref());
        select_columns::<E>(&mut stmt, 0, None);
        Self { stmt, tables: vec![entity.table_name().to_owned()], _marker: PhantomData }
    }
}

impl<E: EntityTrait> Default for Selection<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, J> Selection<E, J>
where
    E: EntityTrait,
    J: Joined<E>,
{
    /// Adds `F`'s columns to each result row.
    pub fn join<F>(mut self) -> Selection<E, <J as JoinWith<F>>::Output>
    where
        F: EntityTrait,
        J: JoinWith<F>,
    {
        let index = J::ARITY + 1;
        let entity = F::default();
        let table = entity.table_name().to_owned();
        let source = if self.tables.contains(&table) {
            self.stmt.from_as(entity.table_ref(), joined_alias(index));
            Some(joined_alias(index).into_iden())
        } else {
            self.stmt.from(entity.table_ref());
            None
        };
        select_columns::<F>(&mut self.stmt, index, source);
        self.tables.push(table);
        Selection { stmt: self.stmt, tables: self.tables, _marker: PhantomData }
    }

    pub fn filter<C: IntoCondition>(mut self, condition: C) -> Self {
        self.stmt.cond_where(condition.into_condition());
        self
    }

    pub fn order_by<C: ColumnTrait>(mut self, column: C, order: Order) -> Self {
        self.stmt.order_by_expr(Expr::col((column.entity_name(), column)).into(), order);
        self
    }

    /// Orders by an arbitrary expression, e.g. a column of an aliased entity.
    pub fn order_by_expr<X: Into<SimpleExpr>>(mut self, expr: X, order: Order) -> Self {
        self.stmt.order_by_expr(expr.into(), order);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.stmt.limit(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.stmt.offset(offset);
        self
    }

    pub fn statement(&self) -> &SelectStatement {
        &self.stmt
    }
}

/// Result of an executed selection.
#[derive(Debug)]
pub struct Rows<R> {
    rows: Vec<R>,
}

impl<R> Rows<R> {
    pub(crate) fn new(rows: Vec<R>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn all(self) -> Vec<R> {
        self.rows
    }

    pub fn first(self) -> Option<R> {
        self.rows.into_iter().next()
    }

    /// Exactly one row, or `NotFound` / `MultipleResultsFound`.
    pub fn one(self) -> Result<R, ServiceError> {
        self.one_or_none()?
            .ok_or_else(|| ServiceError::NotFound("no row matched the query".into()))
    }

    /// At most one row, or `MultipleResultsFound`.
    pub fn one_or_none(self) -> Result<Option<R>, ServiceError> {
        let mut rows = self.rows.into_iter();
        match (rows.next(), rows.next()) {
            (Some(_), Some(_)) => Err(ServiceError::MultipleResultsFound(
                "expected at most one row, the query matched several".into(),
            )),
            (row, _) => Ok(row),
        }
    }
}

impl<R> IntoIterator for Rows<R> {
    type Item = R;
    type IntoIter = std::vec::IntoIter<R>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestDb;
    use models::{player, team};
    use sea_orm::sea_query::SqliteQueryBuilder;
    use sea_orm::IntoActiveModel;

    #[test]
    fn aliases_base_columns() {
        let sql = Selection::<player::Entity>::new().statement().to_string(SqliteQueryBuilder);
        assert!(sql.contains(r#""player"."id" AS "t0_id""#), "{sql}");
        assert!(sql.contains(r#""player"."team_id" AS "t0_team_id""#), "{sql}");
        assert!(sql.ends_with(r#"FROM "player""#), "{sql}");
    }

    #[test]
    fn join_widens_select_and_from_list() {
        let selection = Selection::<player::Entity>::new()
            .join::<team::Entity>()
            .filter(Expr::col((player::Entity, player::Column::TeamId)).equals((team::Entity, team::Column::Id)))
            .order_by(team::Column::Name, Order::Desc)
            .limit(5);
        let sql = selection.statement().to_string(SqliteQueryBuilder);
        assert!(sql.contains(r#""team"."name" AS "t1_name""#), "{sql}");
        assert!(sql.contains(r#"FROM "player", "team""#), "{sql}");
        assert!(sql.contains(r#"WHERE "player"."team_id" = "team"."id""#), "{sql}");
        assert!(sql.contains(r#"ORDER BY "team"."name" DESC"#), "{sql}");
        assert!(sql.contains("LIMIT 5"), "{sql}");
    }

    #[test]
    fn repeated_entity_is_aliased() {
        let sql = Selection::<player::Entity>::new()
            .join::<team::Entity>()
            .join::<team::Entity>()
            .statement()
            .to_string(SqliteQueryBuilder);
        assert!(sql.contains(r#""team"."id" AS "t1_id""#), "{sql}");
        assert!(sql.contains(r#""t2"."id" AS "t2_id""#), "{sql}");
        assert!(sql.contains(r#"FROM "player", "team", "team" AS "t2""#), "{sql}");
    }

    #[tokio::test]
    async fn decodes_every_joined_entity() -> Result<(), anyhow::Error> {
        let db = TestDb::new().await?;
        let mut session = db.session();
        let red = session.insert(team::TeamCreate { name: "Red".into() }.into_active_model()).await?;
        let blue = session.insert(team::TeamCreate { name: "Blue".into() }.into_active_model()).await?;
        let ann = session
            .insert(player::PlayerCreate { name: "Ann".into(), score: 4, team_id: Some(red.id) }.into_active_model())
            .await?;
        session.commit().await?;

        let other = joined_alias(2);
        let selection = Selection::<player::Entity>::new()
            .join::<team::Entity>()
            .join::<team::Entity>()
            .filter(Expr::col((player::Entity, player::Column::TeamId)).equals((team::Entity, team::Column::Id)))
            .filter(Expr::col((other.clone(), team::Column::Id)).ne(Expr::col((team::Entity, team::Column::Id))));
        let rows = session.fetch(&selection).await?;
        assert_eq!(rows, vec![(ann, red, blue)]);
        Ok(())
    }

    #[test]
    fn arity_tracks_join_count() {
        assert_eq!(<() as Joined<player::Entity>>::ARITY, 0);
        assert_eq!(<(team::Entity,) as Joined<player::Entity>>::ARITY, 1);
        assert_eq!(
            <(team::Entity, team::Entity, team::Entity, team::Entity, team::Entity, team::Entity) as Joined<player::Entity>>::ARITY,
            6
        );
    }

    #[test]
    fn rows_disambiguate_cardinality() {
        assert!(matches!(Rows::<i32>::new(vec![]).one(), Err(ServiceError::NotFound(_))));
        assert!(matches!(Rows::<i32>::new(vec![]).one_or_none(), Ok(None)));
        assert_eq!(Rows::new(vec![7]).one().unwrap(), 7);
        assert_eq!(Rows::new(vec![7]).one_or_none().unwrap(), Some(7));
        assert!(matches!(Rows::new(vec![1, 2]).one(), Err(ServiceError::MultipleResultsFound(_))));
        assert!(matches!(Rows::new(vec![1, 2]).one_or_none(), Err(ServiceError::MultipleResultsFound(_))));
        assert_eq!(Rows::new(vec![3, 4]).first(), Some(3));
    }
}
