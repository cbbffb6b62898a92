//! Users table.

use sea_orm::{ActiveValue, entity::prelude::*};

use crate::transform::UserRow;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    /// Balance in cents, never negative.
    pub cash_balance: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::purchases::Entity")]
    Purchases,
}

impl Related<super::purchases::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Purchases.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&UserRow> for ActiveModel {
    fn from(row: &UserRow) -> Self {
        Self {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(row.name.clone()),
            cash_balance: ActiveValue::Set(row.cash_balance.cents()),
        }
    }
}
