use crate::{
    db::{
        data::{DataKey, DataStore, RawRow},
        identity::EntityName,
        ledger::{LedgerEntry, LedgerStore, RawLedgerEntry},
        traits::{FieldClause, LedgerAccess, RecordSource},
    },
    error::InternalError,
    obs::sink::{self, MetricsEvent},
    traits::HostRecord,
};

///
/// UndoOp
///
/// Prior value of one touched key. Replaying it writes the value back, or
/// removes the key if it was absent.
///

enum UndoOp {
    Row {
        key: DataKey,
        prior: Option<RawRow>,
    },
    Ledger {
        key: DataKey,
        prior: Option<RawLedgerEntry>,
    },
}

///
/// CommitWindow
///
/// Scope of one session write. Every row and ledger mutation made through
/// the window first snapshots the key it touches; `rollback` replays the
/// snapshots in reverse write order.
///

pub struct CommitWindow<'a> {
    data: &'a mut DataStore,
    ledger: &'a mut LedgerStore,
    undo: Vec<UndoOp>,
}

impl<'a> CommitWindow<'a> {
    #[must_use]
    pub(crate) const fn new(data: &'a mut DataStore, ledger: &'a mut LedgerStore) -> Self {
        Self {
            data,
            ledger,
            undo: Vec::new(),
        }
    }

    /// Number of mutations made so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.undo.len()
    }

    // ======================================================================
    // Rows
    // ======================================================================

    pub fn load_row<E: HostRecord>(&self, key: &DataKey) -> Result<Option<E>, InternalError> {
        self.data.load(key)
    }

    /// Encode and store `record` under `key`.
    pub fn put_row<E: HostRecord>(&mut self, key: DataKey, record: &E) -> Result<(), InternalError> {
        let row = RawRow::try_from_record(record)?;
        let prior = self.data.insert(key.to_raw(), row);
        self.undo.push(UndoOp::Row { key, prior });

        Ok(())
    }

    /// Remove the row under `key`, returning whether one was present.
    pub fn remove_row(&mut self, key: DataKey) -> bool {
        let prior = self.data.remove(&key.to_raw());
        let removed = prior.is_some();
        self.undo.push(UndoOp::Row { key, prior });

        removed
    }

    // ======================================================================
    // Outcome
    // ======================================================================

    /// Keep every mutation, returning how many were made.
    pub fn commit(self) -> usize {
        self.undo.len()
    }

    /// Undo every mutation in reverse write order.
    pub fn rollback(self, entity_path: &'static str, cause: &InternalError) {
        let ops = self.undo.len();
        if ops == 0 {
            return;
        }

        tracing::warn!(
            "rolling back {ops} write(s) for {entity_path}: {}",
            cause.display_with_class()
        );

        for op in self.undo.into_iter().rev() {
            match op {
                UndoOp::Row { key, prior } => match prior {
                    Some(row) => {
                        self.data.insert(key.to_raw(), row);
                    }
                    None => {
                        self.data.remove(&key.to_raw());
                    }
                },
                UndoOp::Ledger { key, prior } => self.ledger.restore_raw(&key, prior),
            }
        }

        sink::record(MetricsEvent::Rollback {
            entity_path,
            ops: ops as u64,
        });
    }
}

impl RecordSource for CommitWindow<'_> {
    fn find_where<E: HostRecord>(
        &self,
        entity: EntityName,
        clauses: &[FieldClause],
    ) -> Result<Vec<E>, InternalError> {
        self.data.find_where(entity, clauses)
    }
}

// Snapshots are taken before the call and kept only when it succeeds; the
// ledger store leaves a key untouched when it rejects a write.
impl LedgerAccess for CommitWindow<'_> {
    fn get_entry(&self, key: DataKey) -> Result<Option<LedgerEntry>, InternalError> {
        self.ledger.entry(key)
    }

    fn create_entry(&mut self, key: DataKey, index: u32) -> Result<LedgerEntry, InternalError> {
        let prior = self.ledger.get_raw(&key);
        let entry = self.ledger.create_entry(key, index)?;
        self.undo.push(UndoOp::Ledger { key, prior });

        Ok(entry)
    }

    fn update_entry(&mut self, key: DataKey, index: u32) -> Result<LedgerEntry, InternalError> {
        let prior = self.ledger.get_raw(&key);
        let entry = self.ledger.update_entry(key, index)?;
        self.undo.push(UndoOp::Ledger { key, prior });

        Ok(entry)
    }

    fn delete_entry(&mut self, key: DataKey) -> Result<bool, InternalError> {
        let prior = self.ledger.get_raw(&key);
        let removed = self.ledger.delete_entry(key)?;
        if removed {
            self.undo.push(UndoOp::Ledger { key, prior });
        }

        Ok(removed)
    }
}

///
/// TESTS
///
