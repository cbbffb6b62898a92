//! Command structs for engine write operations.

/// Buy one mask from a pharmacy.
#[derive(Clone, Debug)]
pub struct PurchaseCmd {
    pub user_id: i32,
    /// Id of the pharmacy cash account the request targets.
    pub pharmacy_id: i32,
    pub mask_id: i32,
    /// When set, replaying the command returns the first purchase instead of
    /// debiting again.
    pub idempotency_key: Option<String>,
}

impl PurchaseCmd {
    #[must_use]
    pub fn new(user_id: i32, pharmacy_id: i32, mask_id: i32) -> Self {
        Self {
            user_id,
            pharmacy_id,
            mask_id,
            idempotency_key: None,
        }
    }

    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}
