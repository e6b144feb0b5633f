mod entry;
mod store;

pub use entry::{LedgerEntry, RawLedgerEntry};
pub use store::LedgerStore;
