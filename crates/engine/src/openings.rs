//! Weekly opening intervals, one row per (pharmacy, day, open, close).

use sea_orm::{ActiveValue, entity::prelude::*};

use crate::{normalize::TIME_FORMAT, transform::OpeningRow};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "pharmacy_openings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub opening_day: String,
    pub open_time: String,
    pub close_time: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&OpeningRow> for ActiveModel {
    fn from(row: &OpeningRow) -> Self {
        Self {
            id: ActiveValue::NotSet,
            name: ActiveValue::Set(row.name.clone()),
            opening_day: ActiveValue::Set(row.hours.day.as_str().to_string()),
            open_time: ActiveValue::Set(row.hours.open_time.format(TIME_FORMAT).to_string()),
            close_time: ActiveValue::Set(row.hours.close_time.format(TIME_FORMAT).to_string()),
        }
    }
}
