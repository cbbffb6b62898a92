//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`Parse`] thrown when an opening-hours expression or a mask descriptor is
//!   malformed.
//! - [`KeyNotFound`] thrown when a user, pharmacy or mask is missing.
//! - [`InsufficientFunds`] thrown when a user cannot afford a purchase.
//! - [`ExistingKey`] thrown when a natural key is already stored.
//! - [`Database`] thrown when the store fails; the surrounding transaction is
//!   rolled back and the caller may retry.
//!
//!  [`Parse`]: EngineError::Parse
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`Database`]: EngineError::Database
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// `true` when the failure came from the store and not from the request.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Database(_))
    }

    /// Turns a unique-constraint violation into [`EngineError::ExistingKey`].
    ///
    /// Any other database error is kept as is.
    pub(crate) fn from_insert(err: DbErr, key: impl FnOnce() -> String) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::ExistingKey(key()),
            _ => Self::Database(err),
        }
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Parse(a), Self::Parse(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
