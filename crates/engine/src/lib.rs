//! Pharmacy mask catalog and purchase ledger.
//!
//! The crate covers three concerns:
//!
//! - [`normalize`]: parsers for opening-hours expressions and mask
//!   descriptors.
//! - [`transform`]: raw pharmacy/user documents to storage rows.
//! - [`Engine`]: bulk ingestion, read queries and the atomic purchase.

pub use commands::PurchaseCmd;
pub use error::EngineError;
pub use money::MoneyCents;
pub use ops::{Engine, EngineBuilder, IngestReport, MaskSort, MaskView, RecordError, UserView};
pub use purchases::PurchaseRecord;

mod commands;
mod error;
mod gateway;
mod masks;
mod money;
pub mod normalize;
mod openings;
mod ops;
mod pharmacy_cash;
mod purchases;
pub mod transform;
mod users;

pub type ResultEngine<T> = Result<T, EngineError>;
