//! Data models for draft transactions and configuration.

pub mod config;
pub mod transaction;

pub use config::ReciboConfig;
pub use transaction::{
    Amount, Category, DraftOverrides, DraftTransaction, Installment, TransactionKind,
};
