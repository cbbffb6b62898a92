//! Pharmacy cash accounts.
//!
//! Ingestion creates one account per pharmacy with no `sold_item`. Every
//! purchase credits the account keyed by `(name, sold_item)`, creating it on
//! first sale of that mask.

use sea_orm::{ActiveValue, entity::prelude::*};

use crate::transform::CashRow;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "pharmacy_cash")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub sold_item: Option<i32>,
    /// Balance in cents, never negative.
    pub cash_balance: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::masks::Entity",
        from = "Column::SoldItem",
        to = "super::masks::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Masks,
}

impl Related<super::masks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Masks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&CashRow> for ActiveModel {
    fn from(row: &CashRow) -> Self {
        Self {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(row.name.clone()),
            sold_item: ActiveValue::Set(None),
            cash_balance: ActiveValue::Set(row.cash_balance.cents()),
        }
    }
}
