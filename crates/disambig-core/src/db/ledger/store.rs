use crate::{
    db::{
        data::{DataKey, RawDataKey},
        identity::EntityName,
        ledger::{LedgerEntry, RawLedgerEntry},
        traits::LedgerAccess,
    },
    error::InternalError,
};
use canic_cdk::{
    structures::{BTreeMap, DefaultMemoryImpl, memory::VirtualMemory},
    utils::time::now_millis,
};
use derive_more::{Deref, DerefMut};

///
/// LedgerStore
///
/// One ledger for every host type, keyed by the host row's data key.
/// The map key is the uniqueness constraint: a second `create` for the
/// same (entity, id) pair is a conflict, never a second row.
///

#[derive(Deref, DerefMut)]
pub struct LedgerStore(BTreeMap<RawDataKey, RawLedgerEntry, VirtualMemory<DefaultMemoryImpl>>);

impl LedgerStore {
    #[must_use]
    /// Initialize a ledger store with the provided backing memory.
    pub fn init(memory: VirtualMemory<DefaultMemoryImpl>) -> Self {
        Self(BTreeMap::init(memory))
    }

    /// Clear all ledger entries.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Look up the entry for one host, validating that it targets that host.
    pub fn entry(&self, key: DataKey) -> Result<Option<LedgerEntry>, InternalError> {
        self.get(&key.to_raw())
            .map(|raw| decode_checked(&key, &raw))
            .transpose()
    }

    /// All entries for one host type, ascending by target id.
    pub fn entries_for(&self, entity: EntityName) -> Result<Vec<LedgerEntry>, InternalError> {
        let lower = DataKey::lower_bound(entity).to_raw();
        let upper = DataKey::upper_bound(entity).to_raw();

        self.range(lower..=upper)
            .map(|entry| {
                let key = DataKey::try_from_raw(entry.key()).map_err(|err| {
                    InternalError::ledger_corruption(format!(
                        "ledger scan encountered corrupted key: {err}"
                    ))
                })?;

                decode_checked(&key, &entry.value())
            })
            .collect()
    }

    /// Insert a new entry stamped with `now`.
    pub fn create_at(
        &mut self,
        key: DataKey,
        index: u32,
        now: u64,
    ) -> Result<LedgerEntry, InternalError> {
        let raw_key = key.to_raw();
        if self.contains_key(&raw_key) {
            return Err(InternalError::ledger_conflict(key.to_string()));
        }

        let entry = LedgerEntry::new(key, index, now);
        self.insert(raw_key, RawLedgerEntry::try_from_entry(&entry)?);

        Ok(entry)
    }

    /// Overwrite the index of an existing entry in place.
    /// `created_at` is kept; `updated_at` becomes `now`.
    pub fn update_at(
        &mut self,
        key: DataKey,
        index: u32,
        now: u64,
    ) -> Result<LedgerEntry, InternalError> {
        let Some(mut entry) = self.entry(key)? else {
            return Err(InternalError::ledger_not_found(key.to_string()));
        };

        entry.index = index;
        entry.updated_at = now;
        self.insert(key.to_raw(), RawLedgerEntry::try_from_entry(&entry)?);

        Ok(entry)
    }

    /// Remove the entry for one host, if any.
    pub fn remove_entry(&mut self, key: DataKey) -> bool {
        self.remove(&key.to_raw()).is_some()
    }

    // Raw access for commit-window snapshots and rollback.

    pub(crate) fn get_raw(&self, key: &DataKey) -> Option<RawLedgerEntry> {
        self.get(&key.to_raw())
    }

    pub(crate) fn restore_raw(&mut self, key: &DataKey, prior: Option<RawLedgerEntry>) {
        match prior {
            Some(raw) => {
                self.insert(key.to_raw(), raw);
            }
            None => {
                self.remove(&key.to_raw());
            }
        }
    }
}

impl LedgerAccess for LedgerStore {
    fn get_entry(&self, key: DataKey) -> Result<Option<LedgerEntry>, InternalError> {
        self.entry(key)
    }

    fn create_entry(&mut self, key: DataKey, index: u32) -> Result<LedgerEntry, InternalError> {
        self.create_at(key, index, now_millis())
    }

    fn update_entry(&mut self, key: DataKey, index: u32) -> Result<LedgerEntry, InternalError> {
        self.update_at(key, index, now_millis())
    }

    fn delete_entry(&mut self, key: DataKey) -> Result<bool, InternalError> {
        Ok(self.remove_entry(key))
    }
}

// An entry stored under one host's key but naming another host means two
// keys resolve to the same host, which the ledger must never hold.
fn decode_checked(key: &DataKey, raw: &RawLedgerEntry) -> Result<LedgerEntry, InternalError> {
    let entry = raw.try_decode()?;
    if !entry.targets(key) {
        return Err(InternalError::ledger_invariant(format!(
            "ledger entry under {key} targets {}#{}",
            entry.target_type, entry.target_id
        )));
    }

    Ok(entry)
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::identity::RecordId,
        error::{ErrorClass, ErrorOrigin},
        test_support::test_memory,
    };

    fn key(name: &str, id: u64) -> DataKey {
        DataKey::new(EntityName::try_from_str(name).unwrap(), RecordId(id))
    }

    #[test]
    fn create_then_lookup_returns_entry() {
        let mut ledger = LedgerStore::init(test_memory(20));
        let created = ledger.create_at(key("dummy", 1), 3, 100).unwrap();

        assert_eq!(created.index, 3);
        assert_eq!(created.target_type, "dummy");
        assert_eq!(ledger.entry(key("dummy", 1)).unwrap(), Some(created));
        assert_eq!(ledger.entry(key("dummy", 2)).unwrap(), None);
    }

    #[test]
    fn second_create_on_same_key_is_conflict() {
        let mut ledger = LedgerStore::init(test_memory(21));
        ledger.create_at(key("dummy", 1), 0, 100).unwrap();

        let err = ledger.create_at(key("dummy", 1), 1, 200).unwrap_err();
        assert_eq!(err.class, ErrorClass::Conflict);
        assert_eq!(err.origin, ErrorOrigin::Ledger);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.entry(key("dummy", 1)).unwrap().unwrap().index, 0);
    }

    #[test]
    fn same_id_under_different_types_does_not_conflict() {
        let mut ledger = LedgerStore::init(test_memory(22));
        ledger.create_at(key("dummy", 1), 0, 100).unwrap();
        ledger.create_at(key("other", 1), 0, 100).unwrap();

        assert_eq!(ledger.len(), 2);
        let dummy = EntityName::try_from_str("dummy").unwrap();
        assert_eq!(ledger.entries_for(dummy).unwrap().len(), 1);
    }

    #[test]
    fn update_keeps_created_at_and_refreshes_updated_at() {
        let mut ledger = LedgerStore::init(test_memory(23));
        ledger.create_at(key("dummy", 1), 0, 100).unwrap();

        let updated = ledger.update_at(key("dummy", 1), 4, 250).unwrap();
        assert_eq!(updated.index, 4);
        assert_eq!(updated.created_at, 100);
        assert_eq!(updated.updated_at, 250);
    }

    #[test]
    fn update_of_missing_entry_is_not_found() {
        let mut ledger = LedgerStore::init(test_memory(24));
        let err = ledger.update_at(key("dummy", 9), 1, 100).unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(err.origin, ErrorOrigin::Ledger);
    }

    #[test]
    fn delete_of_missing_entry_is_a_noop() {
        let mut ledger = LedgerStore::init(test_memory(25));

        assert!(!ledger.delete_entry(key("dummy", 1)).unwrap());
        ledger.create_at(key("dummy", 1), 0, 100).unwrap();
        assert!(ledger.delete_entry(key("dummy", 1)).unwrap());
        assert!(ledger.is_empty());
    }

    #[test]
    fn entry_stored_under_foreign_key_is_invariant_violation() {
        let mut ledger = LedgerStore::init(test_memory(26));
        let foreign = LedgerEntry::new(key("dummy", 2), 0, 100);
        ledger.insert(
            key("dummy", 1).to_raw(),
            RawLedgerEntry::try_from_entry(&foreign).unwrap(),
        );

        let err = ledger.entry(key("dummy", 1)).unwrap_err();
        assert_eq!(err.class, ErrorClass::InvariantViolation);
        assert_eq!(err.origin, ErrorOrigin::Ledger);
    }
}
