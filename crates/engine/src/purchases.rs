//! Purchase ledger.
//!
//! A [`PurchaseRecord`] documents one completed balance transfer between a
//! user and a pharmacy. Rows are only ever inserted: the engine exposes no
//! update or delete for them.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::MoneyCents;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub id: i32,
    pub user_id: i32,
    pub pharmacy_name: String,
    pub mask_id: i32,
    pub trn_amount: MoneyCents,
    pub trn_date: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "purchases")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub pharmacy_name: String,
    pub mask_id: i32,
    pub trn_amount: i64,
    pub trn_date: DateTimeUtc,
    pub idempotency_key: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::masks::Entity",
        from = "Column::MaskId",
        to = "super::masks::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Masks,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::masks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Masks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Fields of a ledger entry before the store assigns its id.
#[derive(Clone, Debug)]
pub(crate) struct NewPurchase {
    pub user_id: i32,
    pub pharmacy_name: String,
    pub mask_id: i32,
    pub trn_amount: MoneyCents,
    pub trn_date: DateTime<Utc>,
    pub idempotency_key: Option<String>,
}

impl From<&NewPurchase> for ActiveModel {
    fn from(value: &NewPurchase) -> Self {
        Self {
            id: ActiveValue::NotSet,
            user_id: ActiveValue::Set(value.user_id),
            pharmacy_name: ActiveValue::Set(value.pharmacy_name.clone()),
            mask_id: ActiveValue::Set(value.mask_id),
            trn_amount: ActiveValue::Set(value.trn_amount.cents()),
            trn_date: ActiveValue::Set(value.trn_date),
            idempotency_key: ActiveValue::Set(value.idempotency_key.clone()),
        }
    }
}

impl From<Model> for PurchaseRecord {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            pharmacy_name: model.pharmacy_name,
            mask_id: model.mask_id,
            trn_amount: MoneyCents::new(model.trn_amount),
            trn_date: model.trn_date,
        }
    }
}
