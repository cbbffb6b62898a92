//! Keyed reads and writes over the relational store.
//!
//! Every helper takes any [`ConnectionTrait`], so the same code runs inside a
//! [`DatabaseTransaction`](sea_orm::DatabaseTransaction) or on a bare
//! connection for read-only queries.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ConnectionTrait, IntoActiveModel, QueryFilter,
    prelude::*,
    sea_query::{Expr, OnConflict},
};

use crate::{
    EngineError, MoneyCents, ResultEngine, masks, pharmacy_cash, purchases,
    transform::MaskKey,
    users,
};

/// Generates a `require_*` lookup failing with `KeyNotFound` when the row is
/// missing.
macro_rules! impl_require_by_id {
    ($name:ident, $entity:ident, $err_msg:literal) => {
        pub(crate) async fn $name<C: ConnectionTrait>(
            db: &C,
            id: i32,
        ) -> ResultEngine<$entity::Model> {
            $entity::Entity::find_by_id(id)
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!($err_msg, id)))
        }
    };
}

impl_require_by_id!(require_user, users, "user {} not exists");
impl_require_by_id!(require_mask, masks, "mask {} not exists");
impl_require_by_id!(require_cash_account, pharmacy_cash, "pharmacy {} not exists");

/// Inserts a row, reporting a natural-key collision as `ExistingKey`.
pub(crate) async fn insert<A, C>(
    db: &C,
    model: A,
    key: impl FnOnce() -> String,
) -> ResultEngine<<A::Entity as EntityTrait>::Model>
where
    A: ActiveModelTrait + ActiveModelBehavior + Send,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    C: ConnectionTrait,
{
    model
        .insert(db)
        .await
        .map_err(|err| EngineError::from_insert(err, key))
}

pub(crate) async fn find_user_by_name<C: ConnectionTrait>(
    db: &C,
    name: &str,
) -> ResultEngine<Option<users::Model>> {
    Ok(users::Entity::find()
        .filter(users::Column::Name.eq(name))
        .one(db)
        .await?)
}

/// The account created at ingestion, the one with no `sold_item`.
pub(crate) async fn find_base_cash_account<C: ConnectionTrait>(
    db: &C,
    pharmacy_name: &str,
) -> ResultEngine<Option<pharmacy_cash::Model>> {
    Ok(pharmacy_cash::Entity::find()
        .filter(pharmacy_cash::Column::Name.eq(pharmacy_name))
        .filter(pharmacy_cash::Column::SoldItem.is_null())
        .one(db)
        .await?)
}

pub(crate) async fn find_cash_account<C: ConnectionTrait>(
    db: &C,
    pharmacy_name: &str,
    mask_id: i32,
) -> ResultEngine<Option<pharmacy_cash::Model>> {
    Ok(pharmacy_cash::Entity::find()
        .filter(pharmacy_cash::Column::Name.eq(pharmacy_name))
        .filter(pharmacy_cash::Column::SoldItem.eq(mask_id))
        .one(db)
        .await?)
}

/// Resolves a history reference. Price is not part of the reference, so the
/// first matching catalog line wins.
pub(crate) async fn find_mask<C: ConnectionTrait>(
    db: &C,
    key: &MaskKey,
) -> ResultEngine<Option<masks::Model>> {
    Ok(masks::Entity::find()
        .filter(masks::Column::Name.eq(key.pharmacy_name.as_str()))
        .filter(masks::Column::MaskName.eq(key.mask_name.as_str()))
        .filter(masks::Column::Color.eq(key.color.as_str()))
        .filter(masks::Column::PackQuantity.eq(key.pack_quantity))
        .one(db)
        .await?)
}

pub(crate) async fn find_purchase<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    mask_id: i32,
    trn_date: DateTime<Utc>,
) -> ResultEngine<Option<purchases::Model>> {
    Ok(purchases::Entity::find()
        .filter(purchases::Column::UserId.eq(user_id))
        .filter(purchases::Column::MaskId.eq(mask_id))
        .filter(purchases::Column::TrnDate.eq(trn_date))
        .one(db)
        .await?)
}

pub(crate) async fn find_purchase_by_key<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    idempotency_key: &str,
) -> ResultEngine<Option<purchases::Model>> {
    Ok(purchases::Entity::find()
        .filter(purchases::Column::UserId.eq(user_id))
        .filter(purchases::Column::IdempotencyKey.eq(idempotency_key))
        .one(db)
        .await?)
}

/// No-op write on the user row, run first in a purchase.
///
/// SQLite will not promote a transaction that has already read into a writer
/// while another connection writes; it fails with `SQLITE_BUSY` at once.
/// Writing first makes the transaction wait on the busy timeout for the write
/// lock instead, so concurrent purchases queue. Returns `false` when the user
/// does not exist.
pub(crate) async fn claim_user<C: ConnectionTrait>(db: &C, user_id: i32) -> ResultEngine<bool> {
    let result = users::Entity::update_many()
        .col_expr(
            users::Column::CashBalance,
            Expr::col(users::Column::CashBalance).add(0),
        )
        .filter(users::Column::Id.eq(user_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

/// Subtracts `amount` from the user balance unless it would go negative.
///
/// The guard is evaluated by the store on the row it updates, so two
/// concurrent debits can never both read the same old balance. Returns
/// `false` when the guard rejected the update.
pub(crate) async fn debit_user<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    amount: MoneyCents,
) -> ResultEngine<bool> {
    let result = users::Entity::update_many()
        .col_expr(
            users::Column::CashBalance,
            Expr::col(users::Column::CashBalance).sub(amount.cents()),
        )
        .filter(users::Column::Id.eq(user_id))
        .filter(users::Column::CashBalance.gte(amount.cents()))
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

/// Adds `amount` to the `(pharmacy, mask)` account, creating it on first
/// sale.
pub(crate) async fn credit_cash_account<C: ConnectionTrait>(
    db: &C,
    pharmacy_name: &str,
    mask_id: i32,
    amount: MoneyCents,
) -> ResultEngine<()> {
    let account = pharmacy_cash::ActiveModel {
        name: sea_orm::ActiveValue::Set(pharmacy_name.to_string()),
        sold_item: sea_orm::ActiveValue::Set(Some(mask_id)),
        cash_balance: sea_orm::ActiveValue::Set(amount.cents()),
        ..Default::default()
    };
    pharmacy_cash::Entity::insert(account)
        .on_conflict(
            OnConflict::columns([pharmacy_cash::Column::Name, pharmacy_cash::Column::SoldItem])
                .value(
                    pharmacy_cash::Column::CashBalance,
                    Expr::col((pharmacy_cash::Entity, pharmacy_cash::Column::CashBalance))
                        .add(amount.cents()),
                )
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(())
}
