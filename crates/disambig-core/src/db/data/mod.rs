mod key;
mod row;
mod store;

pub use key::{DataKey, RawDataKey};
pub use row::RawRow;
pub use store::DataStore;

pub(crate) use row::MAX_ROW_BYTES;
