use crate::{
    db::{
        commit::CommitWindow,
        data::{DataKey, DataStore},
        engine::{self, Engine, RenumberReport},
        identity::RecordId,
        ledger::LedgerStore,
        registry::{DisambiguationModel, EntityRegistry},
    },
    error::InternalError,
    obs::sink::{EventBuffer, ExecKind, Span, with_metrics_sink},
    traits::{Disambiguatable, Path},
};
use canic_cdk::structures::{DefaultMemoryImpl, memory::VirtualMemory};

///
/// SaveMode
///
/// Create-versus-update semantics of one save.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SaveMode {
    /// Fails with a conflict if the row exists.
    #[default]
    Insert,
    /// Fails with not-found if the row is missing.
    Update,
    /// Inserts or overwrites.
    Replace,
}

///
/// DbSession
///
/// Owns the row store, the ledger and the registry. Every write runs in its
/// own commit window together with the renumbering it triggers, so a failed
/// save or delete leaves both stores as they were.
///

pub struct DbSession {
    data: DataStore,
    ledger: LedgerStore,
    registry: EntityRegistry,
    debug: bool,
}

impl DbSession {
    #[must_use]
    pub fn new(data: DataStore, ledger: LedgerStore) -> Self {
        Self {
            data,
            ledger,
            registry: EntityRegistry::new(),
            debug: false,
        }
    }

    /// Build a session over fresh stores in the given memories.
    #[must_use]
    pub fn init(
        data_memory: VirtualMemory<DefaultMemoryImpl>,
        ledger_memory: VirtualMemory<DefaultMemoryImpl>,
    ) -> Self {
        Self::new(
            DataStore::init(data_memory),
            LedgerStore::init(ledger_memory),
        )
    }

    /// Log per-write detail through `tracing::debug!`.
    #[must_use]
    pub const fn debug(mut self) -> Self {
        self.debug = true;
        self
    }

    fn debug_log(&self, s: impl Into<String>) {
        if self.debug {
            tracing::debug!("{}", s.into());
        }
    }

    // ======================================================================
    // Configuration
    // ======================================================================

    /// Register a host type. Required before any save or delete of it.
    pub fn register<E: Disambiguatable>(&mut self) -> Result<DisambiguationModel, InternalError> {
        let model = self.registry.register::<E>()?;
        self.debug_log(format!(
            "registered {} as '{}' on {:?}",
            model.path(),
            model.entity(),
            model.fields()
        ));

        Ok(model)
    }

    #[must_use]
    pub const fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn data(&self) -> &DataStore {
        &self.data
    }

    #[must_use]
    pub const fn ledger(&self) -> &LedgerStore {
        &self.ledger
    }

    // ======================================================================
    // Reads
    // ======================================================================

    pub fn load<E: Disambiguatable>(&self, id: RecordId) -> Result<Option<E>, InternalError> {
        let mut span = Span::<E>::new(ExecKind::Load);
        let record = self.data.load(&DataKey::try_for::<E>(id)?)?;
        span.set_rows(u64::from(record.is_some()));

        Ok(record)
    }

    /// Disambiguator of the stored record `id`.
    pub fn disambiguator<E: Disambiguatable>(
        &self,
        id: RecordId,
    ) -> Result<Option<u32>, InternalError> {
        let model = self.registry.try_get::<E>()?;
        let key = DataKey::new(model.entity(), id);
        let record = self
            .data
            .load::<E>(&key)?
            .ok_or_else(|| InternalError::store_not_found(key.to_string()))?;

        engine::disambiguator_of(&self.ledger, &model, &record)
    }

    /// Disambiguator of `record`, by its id.
    pub fn disambiguator_of<E: Disambiguatable>(
        &self,
        record: &E,
    ) -> Result<Option<u32>, InternalError> {
        let model = self.registry.try_get::<E>()?;

        engine::disambiguator_of(&self.ledger, &model, record)
    }

    /// Stored records sharing `record`'s disambiguation values, by id.
    pub fn duplicates_of<E: Disambiguatable>(&self, record: &E) -> Result<Vec<E>, InternalError> {
        let model = self.registry.try_get::<E>()?;

        engine::duplicates_of(&self.data, &model, record)
    }

    // ======================================================================
    // Writes
    // ======================================================================

    /// Insert a new record (errors if the id is taken).
    pub fn insert<E: Disambiguatable>(&mut self, record: E) -> Result<E, InternalError> {
        self.save(SaveMode::Insert, record)
    }

    /// Update an existing record (errors if it does not exist).
    pub fn update<E: Disambiguatable>(&mut self, record: E) -> Result<E, InternalError> {
        self.save(SaveMode::Update, record)
    }

    /// Insert or overwrite a record.
    pub fn replace<E: Disambiguatable>(&mut self, record: E) -> Result<E, InternalError> {
        self.save(SaveMode::Replace, record)
    }

    /// Persist `record` and renumber every group the write touched.
    pub fn save<E: Disambiguatable>(
        &mut self,
        mode: SaveMode,
        record: E,
    ) -> Result<E, InternalError> {
        let model = self.registry.try_get::<E>()?;
        let mut span = Span::<E>::new(ExecKind::Save);
        let key = DataKey::new(model.entity(), record.id());
        let debug = self.debug;

        let reports = self.in_window::<E, _>(|window| {
            let previous = window.load_row::<E>(&key)?;
            match (mode, &previous) {
                (SaveMode::Insert, Some(_)) => {
                    return Err(InternalError::store_conflict(key.to_string()));
                }
                (SaveMode::Update, None) => {
                    return Err(InternalError::store_not_found(key.to_string()));
                }
                _ => {}
            }

            window.put_row(key, &record)?;

            Engine::new(window, debug).after_save(&model, &record, previous.as_ref())
        })?;

        span.set_rows(1);
        self.debug_log(format!(
            "saved {key} ({mode:?}); {} group pass(es), {} ledger write(s)",
            reports.len(),
            reports.iter().map(RenumberReport::writes).sum::<usize>()
        ));

        Ok(record)
    }

    /// Delete the record `id`, returning it.
    pub fn delete<E: Disambiguatable>(&mut self, id: RecordId) -> Result<E, InternalError> {
        let model = self.registry.try_get::<E>()?;
        let mut span = Span::<E>::new(ExecKind::Delete);
        let key = DataKey::new(model.entity(), id);
        let debug = self.debug;

        let (removed, report) = self.in_window::<E, _>(|window| {
            let removed = window
                .load_row::<E>(&key)?
                .ok_or_else(|| InternalError::store_not_found(key.to_string()))?;

            Engine::new(window, debug).before_delete(&model, &removed)?;
            window.remove_row(key);
            let report = Engine::new(window, debug).after_delete(&model, &removed)?;

            Ok((removed, report))
        })?;

        span.set_rows(1);
        self.debug_log(format!(
            "deleted {key}; {} member(s) left, {} ledger write(s)",
            report.members,
            report.writes()
        ));

        Ok(removed)
    }

    /// Renumber the group holding `record`'s values without writing a row.
    pub fn renumber<E: Disambiguatable>(
        &mut self,
        record: &E,
    ) -> Result<RenumberReport, InternalError> {
        let model = self.registry.try_get::<E>()?;
        let _span = Span::<E>::new(ExecKind::Renumber);
        let debug = self.debug;

        self.in_window::<E, _>(|window| Engine::new(window, debug).renumber(&model, record))
    }

    // Run `f` in a fresh commit window, rolling back on error. Metrics
    // raised inside the window are published only if it commits.
    fn in_window<E: Path, T>(
        &mut self,
        f: impl FnOnce(&mut CommitWindow<'_>) -> Result<T, InternalError>,
    ) -> Result<T, InternalError> {
        let mut window = CommitWindow::new(&mut self.data, &mut self.ledger);
        let events = EventBuffer::default();

        match with_metrics_sink(&events, || f(&mut window)) {
            Ok(out) => {
                window.commit();
                events.flush();
                Ok(out)
            }
            Err(err) => {
                window.rollback(E::PATH, &err);
                Err(err)
            }
        }
    }
}
