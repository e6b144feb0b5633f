//! Storage and disambiguation: row and ledger stores, the type registry,
//! the renumbering engine, and the session that ties them together.

pub mod commit;
pub mod data;
pub mod engine;
pub mod identity;
pub mod ledger;
pub mod registry;
pub mod session;
pub mod traits;

pub use commit::CommitWindow;
pub use data::{DataKey, DataStore};
pub use engine::{Engine, LedgerOp, RenumberReport, disambiguator_of, duplicates_of};
pub use identity::{EntityName, RecordId};
pub use ledger::{LedgerEntry, LedgerStore};
pub use registry::{ConfigError, DisambiguationModel, EntityRegistry};
pub use session::{DbSession, SaveMode};
pub use traits::{FieldClause, LedgerAccess, RecordSource};
