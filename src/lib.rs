#![doc(test(attr(deny(warnings))))]

//! Pocket Ledger keeps an append-only record of income and expense entries
//! and derives balances, per-category spending and per-month totals from it.
//!
//! The [`ledger::LedgerStore`] owns the transaction sequence and its durable
//! snapshot; [`core::services::SummaryService`] turns a snapshot into
//! display-ready views.

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod ledger;
pub mod storage;
pub mod utils;

use std::sync::Once;

pub use crate::core::errors::{LedgerError, ValidationError};
pub use crate::core::services::{MonthBucketing, SummaryService};
pub use crate::domain::{Category, Transaction, TransactionDraft, TransactionKind};
pub use crate::ledger::{LedgerStore, StoreOptions};

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Pocket Ledger tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
