use std::collections::HashSet;

use crate::core::errors::{LedgerError, Result};
use crate::domain::Transaction;

/// Serializes the whole sequence as a JSON array in insertion order.
pub fn encode_snapshot(transactions: &[Transaction]) -> Result<String> {
    Ok(serde_json::to_string_pretty(transactions)?)
}

/// Parses a persisted payload and checks the ledger invariants on the result.
///
/// Any payload that fails to parse, or parses into records with empty
/// descriptions, non-positive amounts or repeated ids, is reported as
/// [`LedgerError::MalformedSnapshot`].
pub fn decode_snapshot(payload: &str) -> Result<Vec<Transaction>> {
    let transactions: Vec<Transaction> = serde_json::from_str(payload)
        .map_err(|err| LedgerError::MalformedSnapshot(err.to_string()))?;

    let mut seen = HashSet::with_capacity(transactions.len());
    for txn in &transactions {
        if let Some(problem) = txn.invariant_violation() {
            return Err(LedgerError::MalformedSnapshot(problem));
        }
        if !seen.insert(txn.id()) {
            return Err(LedgerError::MalformedSnapshot(format!(
                "transaction id {} appears more than once",
                txn.id()
            )));
        }
    }
    Ok(transactions)
}
