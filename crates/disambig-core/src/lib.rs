//! Core runtime for Disambig: host traits, values, row and ledger stores,
//! the renumbering engine, sessions, and observability.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod db;
pub mod error;
pub mod obs;
pub mod serialize;
pub mod traits;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// CONSTANTS
///

/// Maximum number of disambiguation fields allowed on a host type.
///
/// Groups are resolved by exact match over every declared field, so the
/// declaration is kept short and checked at registration.
pub const MAX_DISAMBIGUATION_FIELDS: usize = 4;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, stores, serializers, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        db::identity::RecordId,
        traits::{Disambiguatable, FieldValues, HostRecord, Path},
        value::Value,
    };
}
