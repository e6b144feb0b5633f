use crate::{
    db::{
        data::{DataKey, RawDataKey, RawRow},
        identity::EntityName,
        traits::{FieldClause, RecordSource},
    },
    error::InternalError,
    traits::HostRecord,
};
use canic_cdk::structures::{BTreeMap, DefaultMemoryImpl, memory::VirtualMemory};
use derive_more::{Deref, DerefMut};

///
/// DataStore
///
/// Host row store. Rows of every host type share one map; each type owns
/// the contiguous key range `[lower_bound(entity), upper_bound(entity)]`.
///

#[derive(Deref, DerefMut)]
pub struct DataStore(BTreeMap<RawDataKey, RawRow, VirtualMemory<DefaultMemoryImpl>>);

impl DataStore {
    #[must_use]
    /// Initialize a data store with the provided backing memory.
    pub fn init(memory: VirtualMemory<DefaultMemoryImpl>) -> Self {
        Self(BTreeMap::init(memory))
    }

    /// Clear all stored rows from the data store.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Load and decode one row, checking the decoded identity against its key.
    pub fn load<E: HostRecord>(&self, key: &DataKey) -> Result<Option<E>, InternalError> {
        let Some(row) = self.get(&key.to_raw()) else {
            return Ok(None);
        };

        let record = row.try_decode::<E>()?;
        ensure_row_identity(key, &record)?;

        Ok(Some(record))
    }

    /// Number of rows stored for one host type.
    #[must_use]
    pub fn count_for(&self, entity: EntityName) -> u64 {
        let lower = DataKey::lower_bound(entity).to_raw();
        let upper = DataKey::upper_bound(entity).to_raw();

        self.range(lower..=upper).count() as u64
    }

    /// Exact-match scan over one host type, ascending by record id.
    pub fn find_where<E: HostRecord>(
        &self,
        entity: EntityName,
        clauses: &[FieldClause],
    ) -> Result<Vec<E>, InternalError> {
        let lower = DataKey::lower_bound(entity).to_raw();
        let upper = DataKey::upper_bound(entity).to_raw();
        let mut out = Vec::new();

        for entry in self.range(lower..=upper) {
            let data_key = DataKey::try_from_raw(entry.key()).map_err(|err| {
                InternalError::store_corruption(format!(
                    "exact-match scan encountered corrupted data key: {err}"
                ))
            })?;
            let record = entry.value().try_decode::<E>()?;
            ensure_row_identity(&data_key, &record)?;

            if clauses.iter().all(|clause| clause.matches(&record)) {
                out.push(record);
            }
        }

        Ok(out)
    }
}

impl RecordSource for DataStore {
    fn find_where<E: HostRecord>(
        &self,
        entity: EntityName,
        clauses: &[FieldClause],
    ) -> Result<Vec<E>, InternalError> {
        Self::find_where(self, entity, clauses)
    }
}

// A decoded row must carry the id it is stored under.
fn ensure_row_identity<E: HostRecord>(key: &DataKey, record: &E) -> Result<(), InternalError> {
    if record.id() == key.id() {
        return Ok(());
    }

    Err(InternalError::store_corruption(format!(
        "row key mismatch: expected {key}, found id {}",
        record.id()
    )))
}

///
/// TESTS
///
