//! Turns raw pharmacy and user documents into rows ready for storage.
//!
//! Nothing here touches the database: names are kept as names, resolving
//! them to ids is the ingestion driver's job.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    EngineError, MoneyCents, ResultEngine,
    normalize::{MaskDescriptor, OpeningHours, parse_mask_descriptor, parse_opening_hours},
};

/// Format of `transactionDate` in user documents.
pub const TRANSACTION_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PharmacyDocument {
    pub name: String,
    pub cash_balance: MoneyCents,
    pub opening_hours: String,
    #[serde(default)]
    pub masks: Vec<MaskDocument>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MaskDocument {
    pub name: String,
    pub price: MoneyCents,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    pub name: String,
    pub cash_balance: MoneyCents,
    #[serde(default)]
    pub purchase_histories: Vec<PurchaseHistoryDocument>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseHistoryDocument {
    pub pharmacy_name: String,
    pub mask_name: String,
    pub transaction_amount: MoneyCents,
    pub transaction_date: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpeningRow {
    pub name: String,
    pub hours: OpeningHours,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CashRow {
    pub name: String,
    pub cash_balance: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaskRow {
    pub name: String,
    pub mask_name: String,
    pub color: String,
    pub pack_quantity: i32,
    pub price: MoneyCents,
}

/// Natural key of a mask, as referenced by purchase histories.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaskKey {
    pub pharmacy_name: String,
    pub mask_name: String,
    pub color: String,
    pub pack_quantity: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserRow {
    pub name: String,
    pub cash_balance: MoneyCents,
}

/// A purchase to be recorded, still expressed by names.
///
/// A user without history yields one intent where every reference is `None`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PurchaseIntent {
    pub user_name: String,
    pub pharmacy_name: Option<String>,
    pub mask: Option<MaskKey>,
    pub trn_amount: Option<MoneyCents>,
    pub trn_date: Option<DateTime<Utc>>,
}

impl PurchaseIntent {
    fn placeholder(user_name: &str) -> Self {
        Self {
            user_name: user_name.to_string(),
            pharmacy_name: None,
            mask: None,
            trn_amount: None,
            trn_date: None,
        }
    }

    /// `true` for the row standing in for an empty history.
    pub fn is_placeholder(&self) -> bool {
        self.pharmacy_name.is_none() && self.mask.is_none()
    }
}

/// Everything a pharmacy document normalizes to.
///
/// Masks are parsed one by one so a single bad descriptor does not hide the
/// others.
#[derive(Debug)]
pub struct PharmacyRecords {
    pub openings: Vec<OpeningRow>,
    pub cash: CashRow,
    pub masks: Vec<ResultEngine<MaskRow>>,
}

/// Normalizes a pharmacy document. Fails only on a malformed schedule or a
/// negative balance.
pub fn normalize_pharmacy(doc: &PharmacyDocument) -> ResultEngine<PharmacyRecords> {
    let name = doc.name.trim();
    if name.is_empty() {
        return Err(EngineError::Parse("pharmacy name must not be empty".to_string()));
    }
    doc.cash_balance.non_negative(name)?;

    let openings = parse_opening_hours(&doc.opening_hours)?
        .into_iter()
        .map(|hours| OpeningRow {
            name: name.to_string(),
            hours,
        })
        .collect();

    let masks = doc
        .masks
        .iter()
        .map(|mask| {
            mask.price.non_negative(&mask.name)?;
            let descriptor = parse_mask_descriptor(&mask.name, Some(mask.price))?;
            Ok(MaskRow::new(name, descriptor, mask.price))
        })
        .collect();

    Ok(PharmacyRecords {
        openings,
        cash: CashRow {
            name: name.to_string(),
            cash_balance: doc.cash_balance,
        },
        masks,
    })
}

impl MaskRow {
    fn new(pharmacy_name: &str, descriptor: MaskDescriptor, price: MoneyCents) -> Self {
        Self {
            name: pharmacy_name.to_string(),
            mask_name: descriptor.mask_name,
            color: descriptor.color,
            pack_quantity: descriptor.pack_quantity,
            price,
        }
    }
}

/// Normalizes a user document into its row and its purchase intents.
pub fn normalize_user(doc: &UserDocument) -> ResultEngine<(UserRow, PurchaseIntents<'_>)> {
    let name = doc.name.trim();
    if name.is_empty() {
        return Err(EngineError::Parse("user name must not be empty".to_string()));
    }
    doc.cash_balance.non_negative(name)?;

    Ok((
        UserRow {
            name: name.to_string(),
            cash_balance: doc.cash_balance,
        },
        PurchaseIntents::new(doc),
    ))
}

/// Lazily parses purchase histories, one [`PurchaseIntent`] per entry.
///
/// Each call to [`normalize_user`] starts a fresh sequence.
#[derive(Debug)]
pub struct PurchaseIntents<'a> {
    user_name: &'a str,
    histories: std::slice::Iter<'a, PurchaseHistoryDocument>,
    placeholder_pending: bool,
}

impl<'a> PurchaseIntents<'a> {
    fn new(doc: &'a UserDocument) -> Self {
        Self {
            user_name: doc.name.trim(),
            histories: doc.purchase_histories.iter(),
            placeholder_pending: doc.purchase_histories.is_empty(),
        }
    }

    fn parse(&self, history: &PurchaseHistoryDocument) -> ResultEngine<PurchaseIntent> {
        let pharmacy_name = history.pharmacy_name.trim().to_string();
        let descriptor = parse_mask_descriptor(&history.mask_name, None)?;
        let trn_date =
            NaiveDateTime::parse_from_str(history.transaction_date.trim(), TRANSACTION_DATE_FORMAT)
                .map_err(|_| {
                    EngineError::Parse(format!(
                        "invalid transaction date: \"{}\"",
                        history.transaction_date
                    ))
                })?
                .and_utc();

        Ok(PurchaseIntent {
            user_name: self.user_name.to_string(),
            mask: Some(MaskKey {
                pharmacy_name: pharmacy_name.clone(),
                mask_name: descriptor.mask_name,
                color: descriptor.color,
                pack_quantity: descriptor.pack_quantity,
            }),
            pharmacy_name: Some(pharmacy_name),
            trn_amount: Some(history.transaction_amount),
            trn_date: Some(trn_date),
        })
    }
}

impl Iterator for PurchaseIntents<'_> {
    type Item = ResultEngine<PurchaseIntent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.placeholder_pending {
            self.placeholder_pending = false;
            return Some(Ok(PurchaseIntent::placeholder(self.user_name)));
        }
        let history = self.histories.next()?;
        Some(self.parse(history))
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::normalize::Weekday;

    fn pharmacy() -> PharmacyDocument {
        serde_json::from_str(
            r#"{
                "name": "DFW Wellness",
                "cashBalance": 328.41,
                "openingHours": "Mon, Wed, Fri 08:00 - 12:00 / Tue, Thu 14:00 - 18:00",
                "masks": [
                    {"name": "True Barrier (green) (3 per pack)", "price": 13.7},
                    {"name": "MaskT (green) (10 per pack)", "price": 41.86},
                    {"name": "Broken mask", "price": 1}
                ]
            }"#,
        )
        .unwrap()
    }

    fn user(histories: &str) -> UserDocument {
        serde_json::from_str(&format!(
            r#"{{"name": "Yvonne Guerrero", "cashBalance": 191.83, "purchaseHistories": {histories}}}"#
        ))
        .unwrap()
    }

    #[test]
    fn pharmacy_document_normalizes_to_rows() {
        let records = normalize_pharmacy(&pharmacy()).unwrap();

        assert_eq!(records.openings.len(), 5);
        assert!(records.openings.iter().all(|row| row.name == "DFW Wellness"));
        assert_eq!(records.openings[1].hours.day, Weekday::Wed);
        assert_eq!(
            records.cash,
            CashRow {
                name: "DFW Wellness".to_string(),
                cash_balance: MoneyCents::new(32841),
            }
        );

        assert_eq!(records.masks.len(), 3);
        assert_eq!(
            records.masks[0].as_ref().unwrap(),
            &MaskRow {
                name: "DFW Wellness".to_string(),
                mask_name: "True Barrier".to_string(),
                color: "green".to_string(),
                pack_quantity: 3,
                price: MoneyCents::new(1370),
            }
        );
        assert!(matches!(records.masks[2], Err(EngineError::Parse(_))));
    }

    #[test]
    fn malformed_schedule_rejects_pharmacy() {
        let mut doc = pharmacy();
        doc.opening_hours = "Mon, Thur 08:00 - 12:00".to_string();
        assert!(matches!(normalize_pharmacy(&doc), Err(EngineError::Parse(_))));
    }

    #[test]
    fn empty_history_yields_one_placeholder() {
        let doc = user("[]");
        let (row, intents) = normalize_user(&doc).unwrap();
        let intents: Vec<_> = intents.collect();

        assert_eq!(row.cash_balance, MoneyCents::new(19183));
        assert_eq!(intents.len(), 1);
        let intent = intents[0].as_ref().unwrap();
        assert!(intent.is_placeholder());
        assert_eq!(intent.user_name, "Yvonne Guerrero");
        assert_eq!(intent.trn_amount, None);
        assert_eq!(intent.trn_date, None);
    }

    #[test]
    fn history_entries_keep_names() {
        let doc = user(
            r#"[
                {"pharmacyName": "DFW Wellness", "maskName": "True Barrier (green) (3 per pack)",
                 "transactionAmount": 12.35, "transactionDate": "2021-01-04 15:18:51"},
                {"pharmacyName": "Caremark", "maskName": "bad", "transactionAmount": 1,
                 "transactionDate": "2021-01-04 15:18:51"}
            ]"#,
        );
        let (_, intents) = normalize_user(&doc).unwrap();
        let intents: Vec<_> = intents.collect();

        assert_eq!(intents.len(), 2);
        let first = intents[0].as_ref().unwrap();
        assert_eq!(first.pharmacy_name.as_deref(), Some("DFW Wellness"));
        assert_eq!(
            first.mask,
            Some(MaskKey {
                pharmacy_name: "DFW Wellness".to_string(),
                mask_name: "True Barrier".to_string(),
                color: "green".to_string(),
                pack_quantity: 3,
            })
        );
        assert_eq!(first.trn_amount, Some(MoneyCents::new(1235)));
        assert_eq!(
            first.trn_date,
            Some(Utc.with_ymd_and_hms(2021, 1, 4, 15, 18, 51).unwrap())
        );
        assert!(matches!(intents[1], Err(EngineError::Parse(_))));
    }

    #[test]
    fn intents_restart_per_call() {
        let doc = user("[]");
        let first: Vec<_> = normalize_user(&doc).unwrap().1.collect();
        let second: Vec<_> = normalize_user(&doc).unwrap().1.collect();
        assert_eq!(first.len(), second.len());
    }

    #[test]
    fn negative_balance_is_rejected() {
        let mut doc = user("[]");
        doc.cash_balance = MoneyCents::new(-1);
        assert!(matches!(
            normalize_user(&doc),
            Err(EngineError::InvalidAmount(_))
        ));
    }
}
