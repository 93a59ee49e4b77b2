//! The append-only transaction store and its snapshot codec.

pub mod snapshot;
pub mod store;

pub use snapshot::{decode_snapshot, encode_snapshot};
pub use store::{LedgerStore, LoadReport, LoadStatus, MalformedPolicy, StoreOptions};

/// Storage key the ledger snapshot lives under unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "transactions";
