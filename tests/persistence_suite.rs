mod common;

use std::fs;
use std::path::{Path, PathBuf};

use pocket_ledger::{
    ledger::{LoadStatus, MalformedPolicy},
    storage::{JsonStorage, StorageBackend},
    Category, LedgerError, LedgerStore, StoreOptions, TransactionDraft,
};

use common::{fixed_clock, json_store, temp_root};

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.tmp", existing),
        None => String::from("tmp"),
    };
    tmp.set_extension(ext);
    tmp
}

fn snapshot_path(root: &Path) -> PathBuf {
    JsonStorage::new(root.to_path_buf())
        .unwrap()
        .path_for("transactions")
}

#[test]
fn atomic_write_failure_preserves_original_file() {
    let root = temp_root();
    let clock = fixed_clock();
    let mut store = json_store(&root, &clock);
    store
        .append(TransactionDraft::expense("Rent", "1000", Category::Housing))
        .expect("initial append");

    let path = snapshot_path(&root);
    let original = fs::read_to_string(&path).expect("read original file");

    // A directory at the temp file path makes File::create fail.
    fs::create_dir_all(tmp_path_for(&path)).unwrap();

    let err = store
        .append(TransactionDraft::income("Salary", "3000"))
        .unwrap_err();
    assert!(matches!(err, LedgerError::Persistence(_)));
    assert_eq!(store.len(), 1, "failed append must not stay in memory");

    let current = fs::read_to_string(&path).expect("read after failure");
    assert_eq!(
        current, original,
        "atomic write failure must not corrupt the original file"
    );
}

#[test]
fn malformed_file_is_quarantined_and_store_starts_empty() {
    let root = temp_root();
    let path = snapshot_path(&root);
    fs::write(&path, "{ not a ledger").unwrap();

    let mut store = json_store(&root, &fixed_clock());
    assert!(store.is_empty());
    let report = store.load_report();
    assert!(report.recovered());
    assert!(!report.warnings.is_empty());

    let LoadStatus::Recovered { quarantined, .. } = &report.status else {
        panic!("expected recovered status, got {:?}", report.status);
    };
    let key = quarantined.clone().expect("quarantine key");
    let storage = JsonStorage::new(root.clone()).unwrap();
    assert_eq!(
        storage.read(&key).unwrap().as_deref(),
        Some("{ not a ledger")
    );

    store
        .append(TransactionDraft::income("Salary", "3000"))
        .unwrap();
    let reopened = json_store(&root, &fixed_clock());
    assert_eq!(reopened.len(), 1);
    assert_eq!(reopened.load_report().status, LoadStatus::Loaded { records: 1 });
}

#[test]
fn invalid_record_counts_as_malformed() {
    let root = temp_root();
    let path = snapshot_path(&root);
    fs::write(
        &path,
        r#"[{"id":"6f1c5a52-0c7b-4b8e-9a51-2f8f0b0a9b11","description":"Rent","amount":-10,"kind":"expense","category":"Housing","occurredAt":"2024-03-01T09:00:00Z"}]"#,
    )
    .unwrap();

    let store = json_store(&root, &fixed_clock());
    assert!(store.is_empty());
    assert!(store.load_report().recovered());
}

#[test]
fn fail_policy_refuses_to_open() {
    let root = temp_root();
    fs::write(snapshot_path(&root), "[1, 2, 3]").unwrap();

    let options = StoreOptions {
        on_malformed: MalformedPolicy::Fail,
        ..StoreOptions::default()
    };
    let storage = JsonStorage::new(root.clone()).unwrap();
    let result = LedgerStore::open(Box::new(storage), options);
    assert!(matches!(result, Err(LedgerError::MalformedSnapshot(_))));

    let untouched = fs::read_to_string(snapshot_path(&root)).unwrap();
    assert_eq!(untouched, "[1, 2, 3]");
}

#[test]
fn custom_storage_key_uses_its_own_file() {
    let root = temp_root();
    let options = StoreOptions {
        storage_key: "household".into(),
        ..StoreOptions::default()
    };
    let storage = JsonStorage::new(root.clone()).unwrap();
    let mut store = LedgerStore::open(Box::new(storage.clone()), options).unwrap();
    store
        .append(TransactionDraft::expense("Power bill", "120", Category::Utilities))
        .unwrap();

    assert!(storage.path_for("household").exists());
    assert!(!snapshot_path(&root).exists());
}

#[test]
fn reopening_after_recovery_does_not_quarantine_again() {
    let root = temp_root();
    fs::write(snapshot_path(&root), "{ not a ledger").unwrap();

    let first = json_store(&root, &fixed_clock());
    assert!(first.load_report().recovered());
    drop(first);

    let second = json_store(&root, &fixed_clock());
    assert_eq!(
        second.load_report().status,
        LoadStatus::Loaded { records: 0 }
    );
    assert!(second.load_report().warnings.is_empty());

    let corrupt_files = fs::read_dir(&root)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .map(|name| name.starts_with("transactions_corrupt-"))
                .unwrap_or(false)
        })
        .count();
    assert_eq!(corrupt_files, 1);
}
