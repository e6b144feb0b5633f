use crate::{
    db::{data::DataKey, identity::EntityName, ledger::LedgerEntry},
    error::InternalError,
    traits::HostRecord,
    value::Value,
};

///
/// FieldClause
///
/// One `field = value` term of an exact-match query.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldClause {
    pub field: &'static str,
    pub value: Value,
}

impl FieldClause {
    /// Whether the record's value for this field equals the clause value.
    #[must_use]
    pub fn matches<E: HostRecord>(&self, record: &E) -> bool {
        record.get_value(self.field).as_ref() == Some(&self.value)
    }
}

///
/// RecordSource
///
/// Exact-match query primitive over persisted host records.
///
/// Implementations must return matches ascending by record id; group
/// members are numbered in the order returned here.
///

pub trait RecordSource {
    fn find_where<E: HostRecord>(
        &self,
        entity: EntityName,
        clauses: &[FieldClause],
    ) -> Result<Vec<E>, InternalError>;
}

///
/// LedgerAccess
///
/// Create/update/delete/lookup primitives for ledger entries, keyed by the
/// data key of the host row each entry belongs to.
///

pub trait LedgerAccess {
    fn get_entry(&self, key: DataKey) -> Result<Option<LedgerEntry>, InternalError>;

    /// Fails with a conflict if an entry already exists for `key`.
    fn create_entry(&mut self, key: DataKey, index: u32) -> Result<LedgerEntry, InternalError>;

    /// Fails with not-found if no entry exists for `key`.
    fn update_entry(&mut self, key: DataKey, index: u32) -> Result<LedgerEntry, InternalError>;

    /// Returns whether an entry was removed.
    fn delete_entry(&mut self, key: DataKey) -> Result<bool, InternalError>;
}
