use chrono::Utc;
use sea_orm::{DatabaseTransaction, TransactionTrait};

use crate::{
    EngineError, MoneyCents, PurchaseCmd, PurchaseRecord, ResultEngine, gateway,
    purchases::{self, NewPurchase},
};

use super::{Engine, normalize_optional_text, with_tx};

impl Engine {
    /// Buys one mask: debits the user, credits the pharmacy account for that
    /// mask and appends a ledger entry, all in one DB transaction.
    ///
    /// Fails with `KeyNotFound` when the user, the pharmacy account or the
    /// mask is missing (or the mask is sold by another pharmacy), and with
    /// `InsufficientFunds` when the user cannot afford it. Reusing an
    /// idempotency key for a different mask or pharmacy is `ExistingKey`. On
    /// any error nothing is written.
    pub async fn purchase(&self, cmd: PurchaseCmd) -> ResultEngine<PurchaseRecord> {
        let PurchaseCmd {
            user_id,
            pharmacy_id,
            mask_id,
            idempotency_key,
        } = cmd;
        let idempotency_key = normalize_optional_text(idempotency_key.as_deref());
        with_tx!(self, |db_tx| {
            self.execute_purchase(&db_tx, user_id, pharmacy_id, mask_id, idempotency_key)
                .await
        })
    }

    async fn execute_purchase(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: i32,
        pharmacy_id: i32,
        mask_id: i32,
        idempotency_key: Option<String>,
    ) -> ResultEngine<PurchaseRecord> {
        if !gateway::claim_user(db_tx, user_id).await? {
            return Err(EngineError::KeyNotFound(format!("user {user_id} not exists")));
        }
        let user = gateway::require_user(db_tx, user_id).await?;
        let account = gateway::require_cash_account(db_tx, pharmacy_id).await?;
        let mask = gateway::require_mask(db_tx, mask_id).await?;
        if mask.name != account.name {
            return Err(EngineError::KeyNotFound(format!(
                "mask {mask_id} not sold by pharmacy {pharmacy_id}"
            )));
        }

        if let Some(key) = idempotency_key.as_deref()
            && let Some(existing) = gateway::find_purchase_by_key(db_tx, user.id, key).await?
        {
            if existing.mask_id != mask.id || existing.pharmacy_name != account.name {
                return Err(EngineError::ExistingKey(format!(
                    "idempotency key {key} of user {} used for another purchase",
                    user.id
                )));
            }
            tracing::debug!("purchase replay for user {} with key {key}", user.id);
            return Ok(existing.into());
        }

        let price = MoneyCents::new(mask.price);
        if user.cash_balance < price.cents() {
            return Err(EngineError::InsufficientFunds(format!(
                "user {} has {}, mask costs {price}",
                user.id,
                MoneyCents::new(user.cash_balance)
            )));
        }

        // Another purchase may have committed since the read above; the
        // guarded update re-checks the balance on the row itself.
        if !gateway::debit_user(db_tx, user.id, price).await? {
            return Err(EngineError::InsufficientFunds(format!(
                "user {} cannot afford {price}",
                user.id
            )));
        }
        gateway::credit_cash_account(db_tx, &account.name, mask.id, price).await?;

        let purchase = NewPurchase {
            user_id: user.id,
            pharmacy_name: account.name.clone(),
            mask_id: mask.id,
            trn_amount: price,
            trn_date: Utc::now(),
            idempotency_key,
        };
        let model = gateway::insert(db_tx, purchases::ActiveModel::from(&purchase), || {
            format!("purchase key for user {}", user.id)
        })
        .await?;

        tracing::info!(
            "user {} bought mask {} from {} for {price}",
            user.id,
            mask.id,
            account.name
        );
        Ok(model.into())
    }
}
