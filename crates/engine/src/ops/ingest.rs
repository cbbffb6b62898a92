//! Bulk load of normalized documents.
//!
//! Each document is stored in its own DB transaction. A record that cannot
//! be parsed or resolved is reported in [`IngestReport::rejected`] and the
//! batch moves on; a row whose natural key is already stored is skipped, so
//! loading the same documents twice is harmless.

use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, DatabaseTransaction, IntoActiveModel,
    TransactionTrait, prelude::*,
};
use serde::Serialize;

use crate::{
    EngineError, ResultEngine, gateway, masks, openings, pharmacy_cash,
    purchases::{self, NewPurchase},
    transform::{
        PharmacyDocument, PurchaseIntent, UserDocument, normalize_pharmacy, normalize_user,
    },
    users,
};

use super::{Engine, with_tx};

/// A record left out of the load, and why.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecordError {
    pub record: String,
    pub reason: String,
}

/// Outcome of a bulk load, counted in rows.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub inserted: usize,
    pub skipped: usize,
    pub rejected: Vec<RecordError>,
}

impl IngestReport {
    fn reject(&mut self, record: impl Into<String>, err: &EngineError) {
        let record = record.into();
        tracing::warn!("rejected {record}: {err}");
        self.rejected.push(RecordError {
            record,
            reason: err.to_string(),
        });
    }

    fn count(&mut self, inserted: bool) {
        if inserted {
            self.inserted += 1;
        } else {
            self.skipped += 1;
        }
    }

    /// Adds the counts of `other` to `self`.
    pub fn merge(&mut self, other: IngestReport) {
        self.inserted += other.inserted;
        self.skipped += other.skipped;
        self.rejected.extend(other.rejected);
    }
}

/// Inserts `model`, treating a natural-key collision as already ingested.
async fn insert_or_skip<A>(
    db_tx: &DatabaseTransaction,
    model: A,
    key: impl FnOnce() -> String,
) -> ResultEngine<bool>
where
    A: ActiveModelTrait + ActiveModelBehavior + Send,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
{
    match gateway::insert(db_tx, model, key).await {
        Ok(_) => Ok(true),
        Err(EngineError::ExistingKey(key)) => {
            tracing::debug!("skipping {key}: already ingested");
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

impl Engine {
    /// Loads pharmacy documents: opening rows, the base cash account and the
    /// mask catalog.
    ///
    /// Only storage failures abort the load.
    pub async fn ingest_pharmacies(&self, docs: &[PharmacyDocument]) -> ResultEngine<IngestReport> {
        let mut report = IngestReport::default();
        for doc in docs {
            let records = match normalize_pharmacy(doc) {
                Ok(records) => records,
                Err(err) => {
                    report.reject(format!("pharmacy \"{}\"", doc.name), &err);
                    continue;
                }
            };

            let doc_report = with_tx!(self, |db_tx| {
                let mut doc_report = IngestReport::default();
                for row in &records.openings {
                    let inserted = insert_or_skip(&db_tx, openings::ActiveModel::from(row), || {
                        format!("opening {} {}", row.name, row.hours.day)
                    })
                    .await?;
                    doc_report.count(inserted);
                }

                let inserted =
                    insert_or_skip(&db_tx, pharmacy_cash::ActiveModel::from(&records.cash), || {
                        format!("cash account {}", records.cash.name)
                    })
                    .await?;
                doc_report.count(inserted);

                for (index, mask) in records.masks.iter().enumerate() {
                    match mask {
                        Ok(row) => {
                            let inserted =
                                insert_or_skip(&db_tx, masks::ActiveModel::from(row), || {
                                    format!("mask {} of {}", row.mask_name, row.name)
                                })
                                .await?;
                            doc_report.count(inserted);
                        }
                        Err(err) => doc_report.reject(
                            format!("mask #{index} of pharmacy \"{}\"", records.cash.name),
                            err,
                        ),
                    }
                }
                Ok::<_, EngineError>(doc_report)
            })?;
            report.merge(doc_report);
        }

        tracing::info!(
            "pharmacies loaded: {} inserted, {} skipped, {} rejected",
            report.inserted,
            report.skipped,
            report.rejected.len()
        );
        Ok(report)
    }

    /// Loads user documents and their purchase histories.
    ///
    /// History entries are resolved by name: the mask by pharmacy, name,
    /// color and pack size. An entry already on the ledger (same user, mask
    /// and date) is skipped.
    pub async fn ingest_users(&self, docs: &[UserDocument]) -> ResultEngine<IngestReport> {
        let mut report = IngestReport::default();
        for doc in docs {
            let (row, intents) = match normalize_user(doc) {
                Ok(normalized) => normalized,
                Err(err) => {
                    report.reject(format!("user \"{}\"", doc.name), &err);
                    continue;
                }
            };

            let doc_report = with_tx!(self, |db_tx| {
                let mut doc_report = IngestReport::default();
                let inserted = insert_or_skip(&db_tx, users::ActiveModel::from(&row), || {
                    format!("user {}", row.name)
                })
                .await?;
                doc_report.count(inserted);
                let user = gateway::find_user_by_name(&db_tx, &row.name)
                    .await?
                    .ok_or_else(|| EngineError::KeyNotFound(format!("user {}", row.name)))?;

                for (index, intent) in intents.enumerate() {
                    let label = || format!("purchase #{index} of user \"{}\"", row.name);
                    let intent = match intent {
                        Ok(intent) if intent.is_placeholder() => continue,
                        Ok(intent) => intent,
                        Err(err) => {
                            doc_report.reject(label(), &err);
                            continue;
                        }
                    };
                    match self.store_purchase_intent(&db_tx, user.id, intent).await {
                        Ok(inserted) => doc_report.count(inserted),
                        Err(err @ EngineError::Database(_)) => return Err(err),
                        Err(err) => doc_report.reject(label(), &err),
                    }
                }
                Ok::<_, EngineError>(doc_report)
            })?;
            report.merge(doc_report);
        }

        tracing::info!(
            "users loaded: {} inserted, {} skipped, {} rejected",
            report.inserted,
            report.skipped,
            report.rejected.len()
        );
        Ok(report)
    }

    async fn store_purchase_intent(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: i32,
        intent: PurchaseIntent,
    ) -> ResultEngine<bool> {
        let (Some(pharmacy_name), Some(key), Some(trn_amount), Some(trn_date)) = (
            intent.pharmacy_name,
            intent.mask,
            intent.trn_amount,
            intent.trn_date,
        ) else {
            return Err(EngineError::Parse("incomplete purchase history".to_string()));
        };

        let mask = gateway::find_mask(db_tx, &key).await?.ok_or_else(|| {
            EngineError::KeyNotFound(format!(
                "mask {} ({}) ({} per pack) of {}",
                key.mask_name, key.color, key.pack_quantity, key.pharmacy_name
            ))
        })?;
        if gateway::find_purchase(db_tx, user_id, mask.id, trn_date)
            .await?
            .is_some()
        {
            return Ok(false);
        }

        let purchase = NewPurchase {
            user_id,
            pharmacy_name,
            mask_id: mask.id,
            trn_amount,
            trn_date,
            idempotency_key: None,
        };
        gateway::insert(db_tx, purchases::ActiveModel::from(&purchase), || {
            format!("purchase of user {user_id}")
        })
        .await?;
        Ok(true)
    }
}
