//! Mask catalog lines. A line is identified by every field but the id.

use sea_orm::{ActiveValue, entity::prelude::*};

use crate::transform::MaskRow;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "masks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Name of the pharmacy selling the mask.
    pub name: String,
    pub mask_name: String,
    pub color: String,
    pub pack_quantity: i32,
    /// Price in cents.
    pub price: i64,
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

impl From<&MaskRow> for ActiveModel {
    fn from(row: &MaskRow) -> Self {
        Self {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(row.name.clone()),
            mask_name: ActiveValue::Set(row.mask_name.clone()),
            color: ActiveValue::Set(row.color.clone()),
            pack_quantity: ActiveValue::Set(row.pack_quantity),
            price: ActiveValue::Set(row.price.cents()),
        }
    }
}
