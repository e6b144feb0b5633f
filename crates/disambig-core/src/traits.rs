pub use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{db::identity::RecordId, error::HookError, value::Value};

// ============================================================================
// FOUNDATIONAL KINDS
// ============================================================================

///
/// Path
/// Fully-qualified type path, used for diagnostics and metrics.
///

pub trait Path {
    const PATH: &'static str;
}

///
/// FieldValues
///
/// Read access to a record's fields by name.
/// Returns `None` only for names the type does not declare; an unset
/// declared field is `Some(Value::Null)`.
///

pub trait FieldValues {
    fn get_value(&self, field: &str) -> Option<Value>;
}

// ============================================================================
// HOST RECORDS
// ============================================================================

///
/// HostRecord
///
/// A persisted record type the row store can hold.
///
/// ## Semantics
/// - `ENTITY_NAME` is the stable discriminator written into ledger keys and
///   SHOULD remain unchanged across type renames.
/// - `FIELDS` lists every field `get_value` answers for.
/// - `id()` is the record's stable identity; group order is ascending by it.
///

pub trait HostRecord: Path + FieldValues + Clone + Serialize + DeserializeOwned + 'static {
    const ENTITY_NAME: &'static str;
    const PRIMARY_KEY: &'static str;
    const FIELDS: &'static [&'static str];

    fn id(&self) -> RecordId;
}

///
/// Disambiguatable
///
/// Opt-in capability for host records that receive a disambiguator when
/// they duplicate another record of the same type.
///
/// `DISAMBIGUATION_FIELDS` has no default, so every implementor must
/// declare it; an empty or inconsistent declaration is rejected when the
/// type is registered, before any record of the type can be written.
///

pub trait Disambiguatable: HostRecord {
    /// Fields whose values, taken together, form the duplicate key.
    const DISAMBIGUATION_FIELDS: &'static [&'static str];

    /// Report index 0 for records that have no duplicates.
    const ALWAYS_DISAMBIGUATE: bool = false;

    /// Completion hook, run once per group member after a renumbering pass
    /// that leaves the group with two or more members.
    fn after_disambiguated(&self, _disambiguator: u32) -> Result<(), HookError> {
        Ok(())
    }
}
