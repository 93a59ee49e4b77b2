use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::clock::{Clock, SystemClock};
use crate::core::errors::{LedgerError, Result};
use crate::domain::{Transaction, TransactionDraft};
use crate::storage::StorageBackend;

use super::{decode_snapshot, encode_snapshot, DEFAULT_STORAGE_KEY};

/// What to do when the persisted snapshot cannot be trusted.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Quarantine the payload, warn, and start from an empty ledger.
    #[default]
    Reset,
    /// Refuse to open the store.
    Fail,
}

/// Settings applied when opening a [`LedgerStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    pub storage_key: String,
    pub on_malformed: MalformedPolicy,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            on_malformed: MalformedPolicy::default(),
        }
    }
}

/// How the initial load went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// Nothing was stored yet.
    Empty,
    Loaded {
        records: usize,
    },
    /// The stored payload was unusable and the store started empty.
    Recovered {
        reason: String,
        quarantined: Option<String>,
    },
}

/// Outcome of opening a store, including anything the caller should surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub status: LoadStatus,
    pub warnings: Vec<String>,
}

impl LoadReport {
    fn clean(status: LoadStatus) -> Self {
        Self {
            status,
            warnings: Vec::new(),
        }
    }

    pub fn recovered(&self) -> bool {
        matches!(self.status, LoadStatus::Recovered { .. })
    }
}

/// Owns the ordered transaction sequence and its durable round-trip.
///
/// The sequence only grows: [`LedgerStore::append`] is the single mutation and
/// it re-persists the entire snapshot before returning. Appends need `&mut
/// self`, so concurrent writers must go through a lock that serializes them.
pub struct LedgerStore {
    transactions: Vec<Transaction>,
    ids: HashSet<Uuid>,
    storage: Box<dyn StorageBackend>,
    clock: Box<dyn Clock>,
    options: StoreOptions,
    load_report: LoadReport,
}

impl LedgerStore {
    /// Opens the store with the system clock.
    pub fn open(storage: Box<dyn StorageBackend>, options: StoreOptions) -> Result<Self> {
        Self::open_with_clock(storage, Box::new(SystemClock), options)
    }

    /// Opens the store, loading whatever snapshot `storage` holds under the configured key.
    pub fn open_with_clock(
        storage: Box<dyn StorageBackend>,
        clock: Box<dyn Clock>,
        options: StoreOptions,
    ) -> Result<Self> {
        let mut store = Self {
            transactions: Vec::new(),
            ids: HashSet::new(),
            storage,
            clock,
            options,
            load_report: LoadReport::clean(LoadStatus::Empty),
        };
        store.load_report = store.load()?;
        Ok(store)
    }

    fn load(&mut self) -> Result<LoadReport> {
        let key = self.options.storage_key.clone();
        let Some(payload) = self.storage.read(&key)? else {
            tracing::debug!(key = %key, "no stored snapshot, starting empty");
            return Ok(LoadReport::clean(LoadStatus::Empty));
        };

        match decode_snapshot(&payload) {
            Ok(transactions) => {
                let records = transactions.len();
                self.ids = transactions.iter().map(Transaction::id).collect();
                self.transactions = transactions;
                tracing::debug!(key = %key, records, "snapshot loaded");
                Ok(LoadReport::clean(LoadStatus::Loaded { records }))
            }
            Err(LedgerError::MalformedSnapshot(reason)) => self.recover(&key, reason),
            Err(other) => Err(other),
        }
    }

    fn recover(&mut self, key: &str, reason: String) -> Result<LoadReport> {
        if self.options.on_malformed == MalformedPolicy::Fail {
            return Err(LedgerError::MalformedSnapshot(reason));
        }

        let mut warnings = vec![format!(
            "Stored ledger could not be read ({reason}); starting with an empty ledger."
        )];
        let quarantined = match self.storage.quarantine(key) {
            Ok(target) => {
                if let Some(target) = target.as_deref() {
                    warnings.push(format!("The unreadable data was preserved under `{target}`."));
                    // Replace the bad payload so later opens do not quarantine it again.
                    if let Err(err) = self.persist() {
                        warnings.push(format!(
                            "The empty ledger could not be saved ({err}); the warning will repeat next time."
                        ));
                    }
                }
                target
            }
            Err(err) => {
                warnings.push(format!(
                    "The unreadable data could not be preserved ({err}); the next entry will overwrite it."
                ));
                None
            }
        };
        tracing::warn!(key = %key, reason = %reason, quarantined = ?quarantined, "malformed snapshot replaced by empty ledger");

        Ok(LoadReport {
            status: LoadStatus::Recovered {
                reason,
                quarantined,
            },
            warnings,
        })
    }

    /// Validates `draft`, appends the new transaction and persists the full sequence.
    ///
    /// On a validation or persistence error the in-memory sequence is left as it was.
    pub fn append(&mut self, draft: TransactionDraft) -> Result<Transaction> {
        let valid = draft.validate()?;
        let txn = Transaction::new(self.fresh_id(), valid, self.clock.now());

        self.transactions.push(txn.clone());
        if let Err(err) = self.persist() {
            self.transactions.pop();
            tracing::warn!(error = %err, "append rolled back after failed persist");
            return Err(err);
        }
        self.ids.insert(txn.id());

        tracing::debug!(
            id = %txn.id(),
            kind = %txn.kind(),
            category = %txn.category(),
            records = self.transactions.len(),
            "transaction appended"
        );
        Ok(txn)
    }

    /// Read-only view of every transaction in insertion order.
    pub fn snapshot(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Transaction> {
        if !self.ids.contains(&id) {
            return None;
        }
        self.transactions.iter().find(|txn| txn.id() == id)
    }

    pub fn storage_key(&self) -> &str {
        &self.options.storage_key
    }

    pub fn load_report(&self) -> &LoadReport {
        &self.load_report
    }

    fn persist(&self) -> Result<()> {
        let payload = encode_snapshot(&self.transactions)?;
        self.storage.write(&self.options.storage_key, &payload)
    }

    fn fresh_id(&self) -> Uuid {
        loop {
            let candidate = Uuid::new_v4();
            if !self.ids.contains(&candidate) {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::FixedClock;
    use crate::domain::{Category, TransactionKind};
    use crate::storage::MemoryStorage;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn open(storage: &MemoryStorage) -> LedgerStore {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap());
        LedgerStore::open_with_clock(
            Box::new(storage.clone()),
            Box::new(clock),
            StoreOptions::default(),
        )
        .expect("open store")
    }

    #[test]
    fn empty_storage_opens_empty() {
        let store = open(&MemoryStorage::new());
        assert!(store.is_empty());
        assert_eq!(store.load_report().status, LoadStatus::Empty);
    }

    #[test]
    fn append_records_fields_and_persists() {
        let storage = MemoryStorage::new();
        let mut store = open(&storage);

        let txn = store
            .append(TransactionDraft::expense("Rent", "1000", Category::Housing))
            .expect("append");

        assert_eq!(store.len(), 1);
        assert_eq!(txn.description(), "Rent");
        assert_eq!(txn.amount(), dec!(1000));
        assert_eq!(txn.kind(), TransactionKind::Expense);
        assert_eq!(txn.category(), Category::Housing);
        assert_eq!(
            txn.occurred_at(),
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
        );
        assert_eq!(store.get(txn.id()), Some(&txn));

        let reopened = open(&storage);
        assert_eq!(reopened.snapshot(), store.snapshot());
    }

    #[test]
    fn invalid_draft_leaves_store_untouched() {
        let storage = MemoryStorage::new();
        let mut store = open(&storage);

        let err = store
            .append(TransactionDraft::expense("", "abc", Category::Food))
            .unwrap_err();

        assert!(err.is_validation());
        assert!(store.is_empty());
        assert!(storage.keys().is_empty(), "nothing should be persisted");
    }

    #[test]
    fn failed_persist_rolls_back_append() {
        let storage = MemoryStorage::new();
        let mut store = open(&storage);
        store
            .append(TransactionDraft::income("Salary", "3000"))
            .unwrap();

        storage.set_fail_writes(true);
        let err = store
            .append(TransactionDraft::expense("Lunch", "12", Category::Food))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Persistence(_)));
        assert_eq!(store.len(), 1);

        storage.set_fail_writes(false);
        store
            .append(TransactionDraft::expense("Lunch", "12", Category::Food))
            .expect("append after recovery");
        assert_eq!(open(&storage).len(), 2);
    }

    #[test]
    fn malformed_snapshot_resets_and_quarantines() {
        let storage = MemoryStorage::with_payload(DEFAULT_STORAGE_KEY, "{oops");
        let store = open(&storage);

        assert!(store.is_empty());
        assert!(store.load_report().recovered());
        assert!(!store.load_report().warnings.is_empty());
        let quarantined: Vec<_> = storage
            .keys()
            .into_iter()
            .filter(|key| key.starts_with("transactions.corrupt-"))
            .collect();
        assert_eq!(quarantined.len(), 1);
    }

    #[test]
    fn malformed_snapshot_is_quarantined_only_once() {
        let storage = MemoryStorage::with_payload(DEFAULT_STORAGE_KEY, "{oops");
        let first = open(&storage);
        assert!(first.load_report().recovered());
        drop(first);

        let second = open(&storage);
        assert!(!second.load_report().recovered());
        assert_eq!(
            second.load_report().status,
            LoadStatus::Loaded { records: 0 }
        );
        assert!(second.load_report().warnings.is_empty());
        let quarantined = storage
            .keys()
            .into_iter()
            .filter(|key| key.starts_with("transactions.corrupt-"))
            .count();
        assert_eq!(quarantined, 1);
    }

    #[test]
    fn malformed_snapshot_fails_under_strict_policy() {
        let storage = MemoryStorage::with_payload(DEFAULT_STORAGE_KEY, "{oops");
        let options = StoreOptions {
            on_malformed: MalformedPolicy::Fail,
            ..StoreOptions::default()
        };
        let result = LedgerStore::open(Box::new(storage), options);
        assert!(matches!(result, Err(LedgerError::MalformedSnapshot(_))));
    }

    #[test]
    fn ids_are_unique_across_appends() {
        let mut store = open(&MemoryStorage::new());
        for idx in 0..50 {
            store
                .append(TransactionDraft::income(format!("Gig {idx}"), "1"))
                .unwrap();
        }
        let unique: HashSet<_> = store.snapshot().iter().map(Transaction::id).collect();
        assert_eq!(unique.len(), 50);
    }
}
