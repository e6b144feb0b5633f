//! ## Crate layout
//! - `core`: host traits, values, row and ledger stores, the renumbering
//!   engine, sessions, and observability.
//! - `error`: public error type with a stable kind + origin taxonomy.
//!
//! The `prelude` module carries what host types and calling code need.

pub use disambig_core as core;

pub mod error;

/// re-exports
///
/// host crates can reach the storage memory types without naming
/// canic-cdk in their own Cargo.toml
pub mod __reexports {
    pub use canic_cdk;
}

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use disambig_core::{MAX_DISAMBIGUATION_FIELDS, db, obs};
pub use error::Error;

///
/// Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::core::{
        db::{DbSession, RenumberReport, SaveMode},
        error::HookError,
        prelude::*,
    };
    pub use serde::{Deserialize, Serialize};
}
