use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserResponse {
        pub id: i32,
        pub name: String,
        /// Decimal string with two fraction digits, e.g. `"191.83"`.
        pub cash_balance: String,
    }
}

pub mod mask {
    use super::*;

    /// Query string of `GET /pharmacies/{name}/masks`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct MaskListQuery {
        /// `name` (default) or `price`.
        pub sort: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Mask {
        pub id: i32,
        pub pharmacy_name: String,
        pub mask_name: String,
        pub color: String,
        pub pack_quantity: i32,
        pub price: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MaskListResponse {
        pub masks: Vec<Mask>,
    }
}

pub mod purchase {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PurchaseNew {
        pub user_id: i32,
        /// Id of the pharmacy account, as listed by the catalog loader.
        pub pharmacy_id: i32,
        pub mask_id: i32,
        /// Optional key making client retries safe.
        pub idempotency_key: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PurchaseCreated {
        pub id: i32,
        pub user_id: i32,
        pub pharmacy_name: String,
        pub mask_id: i32,
        pub trn_amount: String,
        pub trn_date: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PurchaseListResponse {
        pub purchases: Vec<PurchaseCreated>,
    }
}
