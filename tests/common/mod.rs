#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{TimeZone, Utc};
use once_cell::sync::Lazy;
use pocket_ledger::{
    core::clock::FixedClock,
    storage::{JsonStorage, MemoryStorage},
    LedgerStore, StoreOptions,
};
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates a unique directory that outlives the calling test.
pub fn temp_root() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// Clock pinned to 2024-03-01 09:00 UTC.
pub fn fixed_clock() -> FixedClock {
    FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap())
}

pub fn memory_store(storage: &MemoryStorage, clock: &FixedClock) -> LedgerStore {
    LedgerStore::open_with_clock(
        Box::new(storage.clone()),
        Box::new(clock.clone()),
        StoreOptions::default(),
    )
    .expect("open memory store")
}

pub fn json_store(root: &Path, clock: &FixedClock) -> LedgerStore {
    let storage = JsonStorage::new(root.to_path_buf()).expect("create json storage");
    LedgerStore::open_with_clock(
        Box::new(storage),
        Box::new(clock.clone()),
        StoreOptions::default(),
    )
    .expect("open json store")
}
