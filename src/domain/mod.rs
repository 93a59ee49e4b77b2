pub mod category;
pub mod money;
pub mod transaction;

pub use category::Category;
pub use transaction::{Transaction, TransactionDraft, TransactionKind, ValidDraft};
