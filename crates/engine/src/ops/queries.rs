use std::str::FromStr;

use sea_orm::{QueryFilter, QueryOrder, Select, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    EngineError, MoneyCents, PurchaseRecord, ResultEngine, gateway, masks, pharmacy_cash,
    purchases,
};

use super::Engine;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: i32,
    pub name: String,
    pub cash_balance: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskView {
    pub id: i32,
    pub pharmacy_name: String,
    pub mask_name: String,
    pub color: String,
    pub pack_quantity: i32,
    pub price: MoneyCents,
}

impl From<masks::Model> for MaskView {
    fn from(model: masks::Model) -> Self {
        Self {
            id: model.id,
            pharmacy_name: model.name,
            mask_name: model.mask_name,
            color: model.color,
            pack_quantity: model.pack_quantity,
            price: MoneyCents::new(model.price),
        }
    }
}

/// Sort keys accepted for mask listings.
///
/// Each key maps to a fixed ordering; request input never reaches the
/// query as a column name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskSort {
    #[default]
    Name,
    Price,
}

impl MaskSort {
    fn apply(self, select: Select<masks::Entity>) -> Select<masks::Entity> {
        let select = match self {
            Self::Name => select
                .order_by_asc(masks::Column::MaskName)
                .order_by_asc(masks::Column::Color),
            Self::Price => select.order_by_asc(masks::Column::Price),
        };
        select.order_by_asc(masks::Column::Id)
    }
}

impl FromStr for MaskSort {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "price" => Ok(Self::Price),
            other => Err(EngineError::Parse(format!("unknown sort key: {other}"))),
        }
    }
}

impl Engine {
    pub async fn user(&self, user_id: i32) -> ResultEngine<UserView> {
        let user = gateway::require_user(&self.database, user_id).await?;
        Ok(UserView {
            id: user.id,
            name: user.name,
            cash_balance: MoneyCents::new(user.cash_balance),
        })
    }

    /// Mask catalog of a pharmacy.
    pub async fn pharmacy_masks(
        &self,
        pharmacy_name: &str,
        sort: MaskSort,
    ) -> ResultEngine<Vec<MaskView>> {
        if gateway::find_base_cash_account(&self.database, pharmacy_name)
            .await?
            .is_none()
        {
            return Err(EngineError::KeyNotFound(format!(
                "pharmacy {pharmacy_name} not exists"
            )));
        }
        let select = masks::Entity::find().filter(masks::Column::Name.eq(pharmacy_name));
        let models = sort.apply(select).all(&self.database).await?;
        Ok(models.into_iter().map(MaskView::from).collect())
    }

    /// Ledger entries of a user, oldest first.
    pub async fn user_purchases(&self, user_id: i32) -> ResultEngine<Vec<PurchaseRecord>> {
        gateway::require_user(&self.database, user_id).await?;
        let models = purchases::Entity::find()
            .filter(purchases::Column::UserId.eq(user_id))
            .order_by_asc(purchases::Column::TrnDate)
            .order_by_asc(purchases::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(PurchaseRecord::from).collect())
    }

    /// Total cash of a pharmacy across all its accounts.
    pub async fn pharmacy_cash_balance(&self, pharmacy_name: &str) -> ResultEngine<MoneyCents> {
        let accounts = pharmacy_cash::Entity::find()
            .filter(pharmacy_cash::Column::Name.eq(pharmacy_name))
            .all(&self.database)
            .await?;
        if accounts.is_empty() {
            return Err(EngineError::KeyNotFound(format!(
                "pharmacy {pharmacy_name} not exists"
            )));
        }
        Ok(accounts
            .iter()
            .map(|account| MoneyCents::new(account.cash_balance))
            .fold(MoneyCents::ZERO, |total, balance| total + balance))
    }

    /// Balance of the account crediting sales of one mask, zero before its
    /// first sale.
    pub async fn mask_sales_balance(
        &self,
        pharmacy_name: &str,
        mask_id: i32,
    ) -> ResultEngine<MoneyCents> {
        let account = gateway::find_cash_account(&self.database, pharmacy_name, mask_id).await?;
        Ok(account
            .map(|account| MoneyCents::new(account.cash_balance))
            .unwrap_or(MoneyCents::ZERO))
    }

    /// Id of the pharmacy account created at ingestion; purchases target it.
    pub async fn pharmacy_account_id(&self, pharmacy_name: &str) -> ResultEngine<i32> {
        gateway::find_base_cash_account(&self.database, pharmacy_name)
            .await?
            .map(|account| account.id)
            .ok_or_else(|| EngineError::KeyNotFound(format!("pharmacy {pharmacy_name} not exists")))
    }

    /// Id of a user by name.
    pub async fn user_id(&self, name: &str) -> ResultEngine<i32> {
        gateway::find_user_by_name(&self.database, name)
            .await?
            .map(|user| user.id)
            .ok_or_else(|| EngineError::KeyNotFound(format!("user {name} not exists")))
    }
}
